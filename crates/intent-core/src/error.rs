use thiserror::Error;

/// Rejections raised before any keyword is processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("no keywords to analyze")]
    NoKeywords,
    #[error("query cannot be empty")]
    EmptyQuery,
    #[error("too many keywords ({count}); the limit is {limit}")]
    TooManyKeywords { count: usize, limit: usize },
}
