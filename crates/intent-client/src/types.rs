use serde::{Deserialize, Serialize};

/// A single search hit together with its scraped page bodies.
///
/// Every field is optional because providers omit whatever they could not fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Main content rendered as markdown.
    #[serde(default)]
    pub markdown: Option<String>,
    /// Raw page HTML.
    #[serde(default)]
    pub html: Option<String>,
}

impl ResultItem {
    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    pub fn markdown(&self) -> &str {
        self.markdown.as_deref().unwrap_or_default()
    }

    pub fn html(&self) -> &str {
        self.html.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub limit: u32,
    /// ISO country code, e.g. `US`.
    pub country: String,
    pub location: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: 10,
            country: "US".to_string(),
            location: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchPayload<'a> {
    pub query: &'a str,
    pub limit: u32,
    #[serde(skip_serializing_if = "is_blank")]
    pub country: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<&'a str>,
    pub sources: [&'static str; 1],
    pub scrape_options: ScrapeOptions,
}

fn is_blank(value: &&str) -> bool {
    value.trim().is_empty()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScrapeOptions {
    pub formats: [&'static str; 2],
    pub only_main_content: bool,
    pub store_in_cache: bool,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            formats: ["markdown", "html"],
            only_main_content: true,
            store_in_cache: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub data: Option<SearchData>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchData {
    #[serde(default)]
    pub web: Option<Vec<ResultItem>>,
}

impl SearchResponse {
    pub fn into_items(self) -> Vec<ResultItem> {
        self.data.and_then(|data| data.web).unwrap_or_default()
    }
}

/// Model advertised by the local generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GeneratePayload<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub options: &'a crate::GenerationOptions,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    pub response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_response_tolerates_missing_sections() {
        let empty: SearchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.into_items().is_empty());

        let no_web: SearchResponse = serde_json::from_value(json!({ "data": {} })).unwrap();
        assert!(no_web.into_items().is_empty());
    }

    #[test]
    fn search_response_reads_web_items() {
        let response: SearchResponse = serde_json::from_value(json!({
            "success": true,
            "data": {
                "web": [
                    {
                        "url": "https://www.reddit.com/r/smarthome",
                        "title": "Can I use HomeKit with Alexa?",
                        "markdown": "## FAQ",
                        "html": null
                    },
                    { "url": "https://github.com/homebridge" }
                ]
            }
        }))
        .unwrap();

        let items = response.into_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title(), "Can I use HomeKit with Alexa?");
        assert_eq!(items[0].html(), "");
        assert_eq!(items[1].markdown(), "");
    }

    #[test]
    fn payload_omits_blank_location() {
        let payload = SearchPayload {
            query: "alexa homekit",
            limit: 10,
            country: "US",
            location: None,
            sources: ["web"],
            scrape_options: ScrapeOptions::default(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("location").is_none());
        assert_eq!(value["scrapeOptions"]["formats"], json!(["markdown", "html"]));
        assert_eq!(value["scrapeOptions"]["onlyMainContent"], json!(true));
        assert_eq!(value["sources"], json!(["web"]));
    }
}
