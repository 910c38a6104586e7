use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use indicatif::ProgressBar;
use intent_client::{OllamaClient, OllamaConfig};
use intent_core::{
    export::{default_export_name, write_analysis_csv, write_llm_csv},
    hybrid_pipeline, llm_analyzer, prepare_keywords, process_queries,
    report::{sort_for_display, summarize, BatchOverview, ResultFilter},
    rules::classify,
    AnalysisResult, Intent, LlmBatchRow, TextGenerator, AVAILABLE_MODELS,
};
use output::{OutputFormat, Renderer};
use progress::{spinner, BatchProgress};
use settings::Overrides;
use time::OffsetDateTime;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "search-intent",
    version,
    about = "Classify the search intent behind keywords using live SERP data or a local LLM."
)]
struct Cli {
    /// Preferred renderer for command output.
    #[arg(long, global = true, value_enum, default_value = "table")]
    format: OutputFormat,
    /// TOML file with analyzer settings (weights, lexicon, search, llm).
    #[arg(long, global = true, env = "SEARCH_INTENT_CONFIG")]
    config: Option<PathBuf>,
    /// Disable ANSI colors in CLI output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Suppress non-critical CLI output.
    #[arg(long, global = true)]
    quiet: bool,
    /// Disable progress indicators for long-running tasks.
    #[arg(long, global = true)]
    no_progress: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, Clone)]
enum Command {
    /// Hybrid analysis: live SERP, page bodies, query modifiers and URL/title rules.
    Analyze(AnalyzeArgs),
    /// Ask a local model to classify each keyword.
    Llm(LlmArgs),
    /// List the models served by the local model endpoint.
    Models {
        /// Model endpoint (defaults to the configured one).
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Run the URL/title rule classifier offline.
    Classify {
        /// Result URL (may be repeated).
        #[arg(long = "url")]
        urls: Vec<String>,
        /// Result title (may be repeated).
        #[arg(long = "title")]
        titles: Vec<String>,
    },
    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args, Clone)]
struct KeywordArgs {
    /// Keywords to analyze.
    keywords: Vec<String>,
    /// Read additional keywords from a file, one per line.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Write results as CSV to this file (or into this directory).
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
struct FilterArgs {
    /// Only show rows with this primary intent (may be repeated).
    #[arg(long = "intent", value_enum)]
    intents: Vec<IntentArg>,
    /// Hide rows below this confidence (percent).
    #[arg(long, default_value_t = 0.0)]
    min_confidence: f64,
    /// Only show keywords containing this text (case-insensitive).
    #[arg(long)]
    search: Option<String>,
}

#[derive(Debug, Args, Clone)]
struct AnalyzeArgs {
    #[command(flatten)]
    input: KeywordArgs,
    /// Firecrawl API key.
    #[arg(long, env = "FIRECRAWL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Results requested per keyword (1-20).
    #[arg(long)]
    limit: Option<u32>,
    /// Search country code.
    #[arg(long)]
    country: Option<String>,
    /// Search location, e.g. "San Francisco, California".
    #[arg(long)]
    location: Option<String>,
    /// Pages inspected for calls to action and structured data.
    #[arg(long)]
    max_pages: Option<usize>,
    /// Weight of SERP-wide cues (0-100).
    #[arg(long)]
    w_serp: Option<f64>,
    /// Weight of query modifier rules (0-100).
    #[arg(long)]
    w_rules: Option<f64>,
    /// Weight of page signals (0-100).
    #[arg(long)]
    w_pages: Option<f64>,
    /// Share of the URL/title classifier (0-100, 0 disables it).
    #[arg(long)]
    w_classifier: Option<f64>,
    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Debug, Args, Clone)]
struct LlmArgs {
    #[command(flatten)]
    input: KeywordArgs,
    /// Model to use (see `search-intent models`).
    #[arg(long)]
    model: Option<String>,
    /// Model endpoint.
    #[arg(long)]
    base_url: Option<String>,
    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum IntentArg {
    Informational,
    Transactional,
    Navigational,
    Commercial,
}

impl From<IntentArg> for Intent {
    fn from(value: IntentArg) -> Self {
        match value {
            IntentArg::Informational => Intent::Informational,
            IntentArg::Transactional => Intent::Transactional,
            IntentArg::Navigational => Intent::Navigational,
            IntentArg::Commercial => Intent::CommercialInvestigation,
        }
    }
}

impl FilterArgs {
    fn to_filter(&self) -> ResultFilter {
        ResultFilter {
            intents: self.intents.iter().copied().map(Intent::from).collect(),
            min_confidence: self.min_confidence,
            search_text: self.search.clone().unwrap_or_default(),
        }
    }
}

impl Cli {
    fn progress_enabled(&self) -> bool {
        !self.quiet && !self.no_progress
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    let renderer = Renderer::new(cli.format);
    match &cli.command {
        Command::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(*shell, &mut command, "search-intent", &mut std::io::stdout());
            Ok(())
        }
        Command::Analyze(args) => handle_analyze(args, &cli, &renderer).await,
        Command::Llm(args) => handle_llm(args, &cli, &renderer).await,
        Command::Models { base_url } => handle_models(base_url.clone(), &cli, &renderer).await,
        Command::Classify { urls, titles } => {
            if urls.is_empty() && titles.is_empty() {
                anyhow::bail!("provide at least one --url or --title");
            }
            let classification = classify(urls.as_slice(), titles.as_slice());
            if !cli.quiet {
                renderer.classification(&classification)?;
            }
            Ok(())
        }
    }
}

async fn handle_analyze(args: &AnalyzeArgs, cli: &Cli, renderer: &Renderer) -> Result<()> {
    let keywords = collect_keywords(&args.input)?;
    let overrides = Overrides {
        limit: args.limit,
        country: args.country.clone(),
        location: args.location.clone(),
        max_pages: args.max_pages,
        w_serp: args.w_serp,
        w_rules: args.w_rules,
        w_pages: args.w_pages,
        w_classifier: args.w_classifier,
        ..Overrides::default()
    };
    let config = Arc::new(settings::load(cli.config.as_deref(), &overrides)?);
    let pipeline = hybrid_pipeline(config, args.api_key.clone())?;

    info!(target: "search_intent_cli", keywords = keywords.len(), "Running hybrid analysis");
    let progress = BatchProgress::new(cli.progress_enabled(), keywords.len());
    let results = pipeline.run_batch(&keywords, &progress).await;
    progress.finish(format!("Analyzed {} keywords", results.len()));

    if let Some(path) = &args.input.export {
        let path = export_path(path, "intent_results")?;
        let file = fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        write_analysis_csv(file, &results)?;
        info!(target: "search_intent_cli", path = %path.display(), "Exported results");
    }

    if cli.quiet {
        return Ok(());
    }
    let filter = args.filter.to_filter();
    let mut visible: Vec<&AnalysisResult> = filter.apply(&results);
    sort_for_display(&mut visible);
    let overview = BatchOverview::from_rows(&visible);
    renderer.analysis(&visible, &overview)
}

async fn handle_llm(args: &LlmArgs, cli: &Cli, renderer: &Renderer) -> Result<()> {
    let keywords = collect_keywords(&args.input)?;
    let overrides = Overrides {
        model: args.model.clone(),
        base_url: args.base_url.clone(),
        ..Overrides::default()
    };
    let config = settings::load(cli.config.as_deref(), &overrides)?;
    if !AVAILABLE_MODELS.contains(&config.llm.model.as_str()) {
        tracing::warn!(
            target: "search_intent_cli",
            model = %config.llm.model,
            "Model is not in the suggested list; make sure it is pulled"
        );
    }

    let connecting = spinner(
        cli.progress_enabled(),
        format!("Connecting to {}...", config.llm.base_url),
    );
    let analyzer = llm_analyzer(&config).await;
    finish_spinner(connecting, None);
    let analyzer = analyzer?;

    let progress = BatchProgress::new(cli.progress_enabled(), keywords.len());
    let rows = process_queries(&analyzer, &keywords, &progress).await?;
    progress.finish(format!("Analyzed {} keywords with {}", rows.len(), analyzer.model()));

    if let Some(path) = &args.input.export {
        let path = export_path(path, "llm_intent_analysis")?;
        let file = fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        write_llm_csv(file, &rows)?;
        info!(target: "search_intent_cli", path = %path.display(), "Exported results");
    }

    if cli.quiet {
        return Ok(());
    }
    let filter = args.filter.to_filter();
    let mut visible: Vec<&LlmBatchRow> = filter.apply(&rows);
    sort_for_display(&mut visible);
    renderer.llm_rows(&visible, &summarize(&rows))
}

async fn handle_models(base_url: Option<String>, cli: &Cli, renderer: &Renderer) -> Result<()> {
    let overrides = Overrides {
        base_url,
        ..Overrides::default()
    };
    let config = settings::load(cli.config.as_deref(), &overrides)?;
    let client = OllamaClient::with_config(OllamaConfig {
        base_url: config.llm.base_url.clone(),
        model: config.llm.model.clone(),
        ..OllamaConfig::default()
    })?;

    let spinner = spinner(cli.progress_enabled(), "Probing model endpoint...");
    let models = TextGenerator::list_models(&client).await;
    finish_spinner(spinner, None);
    let models = models.with_context(|| {
        format!(
            "cannot connect to the model endpoint at {}; is the server running?",
            config.llm.base_url
        )
    })?;

    if !cli.quiet {
        renderer.models(&models)?;
    }
    Ok(())
}

fn collect_keywords(input: &KeywordArgs) -> Result<Vec<String>> {
    let mut lines = input.keywords.clone();
    if let Some(path) = &input.file {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        lines.extend(contents.lines().map(str::to_string));
    }
    Ok(prepare_keywords(lines)?)
}

fn export_path(path: &std::path::Path, prefix: &str) -> Result<PathBuf> {
    if path.is_dir() {
        Ok(path.join(default_export_name(prefix, OffsetDateTime::now_utc())?))
    } else {
        Ok(path.to_path_buf())
    }
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,search_intent_cli=info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .without_time()
        .with_ansi(!cli.no_color)
        .compact()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to initialize logging: {error}"))
}

fn finish_spinner(spinner: Option<ProgressBar>, message: Option<String>) {
    if let Some(progress) = spinner {
        if let Some(msg) = message {
            progress.finish_with_message(msg);
        } else {
            progress.finish_and_clear();
        }
    }
}

mod output {
    use std::fmt::Write;

    use anyhow::Result;
    use clap::ValueEnum;
    use intent_client::ModelInfo;
    use intent_core::{
        report::{BatchOverview, IntentSummary},
        rules::{RuleClassification, RuleLabel},
        AnalysisResult, Intent, LlmBatchRow, ScoreVector, AVAILABLE_MODELS,
    };
    use serde_json::{self, json, Value};

    #[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
    pub enum OutputFormat {
        Json,
        Markdown,
        Table,
        Text,
    }

    #[derive(Copy, Clone, Debug)]
    pub struct Renderer {
        format: OutputFormat,
    }

    impl Renderer {
        pub fn new(format: OutputFormat) -> Self {
            Self { format }
        }

        pub fn analysis(&self, rows: &[&AnalysisResult], overview: &BatchOverview) -> Result<()> {
            match self.format {
                OutputFormat::Json => {
                    let payload = json!({ "results": rows, "overview": overview });
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                }
                OutputFormat::Markdown => {
                    println!("| Keyword | Primary | Secondary | Confidence | Branching | Top URL |");
                    println!("| --- | --- | --- | ---: | --- | --- |");
                    for row in rows {
                        println!(
                            "| {} | {} | {} | {} | {} | {} |",
                            sanitize(&row.keyword),
                            intent_or_dash(row.primary_intent),
                            intent_or_dash(row.secondary_intent),
                            percent(row.confidence_pct),
                            row.branching,
                            row.top_urls.first().map_or("—", String::as_str)
                        );
                    }
                    println!();
                    print_overview(overview);
                }
                OutputFormat::Table => {
                    let table: Vec<Vec<String>> = rows
                        .iter()
                        .map(|row| {
                            vec![
                                truncate(&sanitize(&row.keyword), 40),
                                intent_or_dash(row.primary_intent),
                                intent_or_dash(row.secondary_intent),
                                percent(row.confidence_pct),
                                row.branching.to_string(),
                            ]
                        })
                        .collect();
                    render_table(
                        &["Keyword", "Primary", "Secondary", "Confidence", "Branching"],
                        &table,
                    );
                    println!();
                    print_overview(overview);
                }
                OutputFormat::Text => {
                    for row in rows {
                        println!(
                            "• {} — {} ({}, {})",
                            row.keyword,
                            intent_or_dash(row.primary_intent),
                            percent(row.confidence_pct),
                            row.branching
                        );
                        if let Some(secondary) = row.secondary_intent {
                            println!("  secondary: {secondary}");
                        }
                        if !row.top_urls.is_empty() {
                            let head: Vec<&str> =
                                row.top_urls.iter().take(3).map(String::as_str).collect();
                            println!("  urls: {}", head.join(", "));
                        }
                        println!("  scores: {}", format_scores(&row.scores));
                    }
                    println!();
                    print_overview(overview);
                }
            }
            Ok(())
        }

        pub fn llm_rows(&self, rows: &[&LlmBatchRow], summary: &[IntentSummary]) -> Result<()> {
            match self.format {
                OutputFormat::Json => {
                    let results: Vec<Value> = rows
                        .iter()
                        .map(|row| {
                            json!({
                                "keyword": row.keyword(),
                                "status": row.status().label(),
                                "primary_intent": row.primary_intent(),
                                "secondary_intent": row.secondary_intent(),
                                "confidence": row.confidence(),
                                "reasoning": row.reasoning(),
                                "scores": row.scores(),
                            })
                        })
                        .collect();
                    let payload = json!({ "results": results, "summary": summary });
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                }
                OutputFormat::Markdown => {
                    println!("| Keyword | Primary | Secondary | Confidence | Status | Reasoning |");
                    println!("| --- | --- | --- | ---: | --- | --- |");
                    for row in rows {
                        println!(
                            "| {} | {} | {} | {} | {} | {} |",
                            sanitize(row.keyword()),
                            intent_or_dash(row.primary_intent()),
                            intent_or_dash(row.secondary_intent()),
                            percent(row.confidence()),
                            row.status(),
                            sanitize(&row.reasoning())
                        );
                    }
                    println!();
                    print_summary(summary);
                }
                OutputFormat::Table => {
                    let table: Vec<Vec<String>> = rows
                        .iter()
                        .map(|row| {
                            vec![
                                truncate(&sanitize(row.keyword()), 40),
                                intent_or_dash(row.primary_intent()),
                                intent_or_dash(row.secondary_intent()),
                                percent(row.confidence()),
                                row.status().to_string(),
                                truncate(&sanitize(&row.reasoning()), 60),
                            ]
                        })
                        .collect();
                    render_table(
                        &["Keyword", "Primary", "Secondary", "Confidence", "Status", "Reasoning"],
                        &table,
                    );
                    println!();
                    print_summary(summary);
                }
                OutputFormat::Text => {
                    for row in rows {
                        println!(
                            "• {} — {} ({})",
                            row.keyword(),
                            intent_or_dash(row.primary_intent()),
                            percent(row.confidence())
                        );
                        println!("  {}", row.reasoning());
                        println!("  scores: {}", format_scores(&row.scores()));
                    }
                    println!();
                    print_summary(summary);
                }
            }
            Ok(())
        }

        pub fn models(&self, models: &[ModelInfo]) -> Result<()> {
            let suggested = |name: &str| AVAILABLE_MODELS.contains(&name);
            match self.format {
                OutputFormat::Json => {
                    let payload = json!({ "models": models, "suggested": AVAILABLE_MODELS });
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                }
                OutputFormat::Markdown => {
                    println!("| Model | Size | Suggested |");
                    println!("| --- | ---: | --- |");
                    for model in models {
                        println!(
                            "| `{}` | {} | {} |",
                            model.name,
                            format_size(model.size),
                            suggested(&model.name)
                        );
                    }
                }
                OutputFormat::Table => {
                    let rows: Vec<Vec<String>> = models
                        .iter()
                        .map(|model| {
                            vec![
                                model.name.clone(),
                                format_size(model.size),
                                suggested(&model.name).to_string(),
                            ]
                        })
                        .collect();
                    render_table(&["Model", "Size", "Suggested"], &rows);
                }
                OutputFormat::Text => {
                    if models.is_empty() {
                        println!("No models installed. Suggested: {}", AVAILABLE_MODELS.join(", "));
                    }
                    for model in models {
                        let marker = if suggested(&model.name) { " (suggested)" } else { "" };
                        println!("• {}{marker}", model.name);
                    }
                }
            }
            Ok(())
        }

        pub fn classification(&self, result: &RuleClassification) -> Result<()> {
            let canonical = result.canonical();
            match self.format {
                OutputFormat::Json => {
                    let payload = json!({
                        "primary": result.primary,
                        "intent": result.primary.canonical(),
                        "scores": result.normalized,
                        "canonical": canonical,
                    });
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                }
                OutputFormat::Markdown => {
                    println!(
                        "**Primary:** `{}` ({})",
                        result.primary,
                        result.primary.canonical()
                    );
                    println!();
                    println!("| Label | Score |");
                    println!("| --- | ---: |");
                    for label in RuleLabel::ALL {
                        println!("| {} | {} |", label, percent(result.normalized[label]));
                    }
                }
                OutputFormat::Table => {
                    let rows: Vec<Vec<String>> = RuleLabel::ALL
                        .iter()
                        .map(|label| {
                            vec![
                                label.to_string(),
                                percent(result.normalized[*label]),
                                label.canonical().to_string(),
                            ]
                        })
                        .collect();
                    render_table(&["Label", "Score", "Intent"], &rows);
                }
                OutputFormat::Text => {
                    println!(
                        "Primary: {} ({})",
                        result.primary,
                        result.primary.canonical()
                    );
                    println!("Folded scores: {}", format_fractions(&canonical));
                }
            }
            Ok(())
        }
    }

    fn print_overview(overview: &BatchOverview) {
        println!(
            "Keywords: {} • Avg confidence: {} • Mixed: {} • Clear: {}",
            overview.keywords,
            overview
                .average_confidence
                .map_or_else(|| "—".to_string(), percent),
            overview.mixed,
            overview.clear
        );
        if !overview.distribution.is_empty() {
            let parts: Vec<String> = overview
                .distribution
                .iter()
                .map(|(intent, count)| format!("{intent}: {count}"))
                .collect();
            println!("Distribution: {}", parts.join(", "));
        }
    }

    fn print_summary(summary: &[IntentSummary]) {
        if summary.is_empty() {
            println!("No successful analyses to summarize.");
            return;
        }
        let rows: Vec<Vec<String>> = summary
            .iter()
            .map(|entry| {
                vec![
                    entry.intent.to_string(),
                    percent(entry.average),
                    percent(entry.min),
                    percent(entry.max),
                    entry.count.to_string(),
                ]
            })
            .collect();
        render_table(&["Intent", "Avg", "Min", "Max", "Count"], &rows);
    }

    fn intent_or_dash(intent: Option<Intent>) -> String {
        intent.map_or_else(|| "—".to_string(), |intent| intent.to_string())
    }

    fn percent(value: f64) -> String {
        format!("{value:.1}%")
    }

    fn format_scores(scores: &ScoreVector) -> String {
        scores
            .iter()
            .map(|(intent, value)| format!("{intent} {value:.2}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn format_fractions(scores: &ScoreVector) -> String {
        scores
            .iter()
            .map(|(intent, value)| format!("{intent} {:.1}%", value * 100.0))
            .collect::<Vec<_>>()
            .join(", ")
    }

    #[allow(clippy::cast_precision_loss)]
    fn format_size(size: Option<u64>) -> String {
        size.map_or_else(
            || "n/a".to_string(),
            |bytes| format!("{:.1} GB", bytes as f64 / 1_000_000_000.0),
        )
    }

    fn render_table(headers: &[&str], rows: &[Vec<String>]) {
        let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
        for row in rows {
            for (idx, cell) in row.iter().enumerate() {
                widths[idx] = widths[idx].max(cell.chars().count());
            }
        }

        fn render_line(columns: &[&str], widths: &[usize]) -> String {
            let mut line = String::new();
            for (idx, value) in columns.iter().enumerate() {
                let width = widths[idx];
                let _ = write!(line, "| {:width$} ", value, width = width);
            }
            line.push('|');
            line
        }

        let header_line = render_line(headers, &widths);
        println!("{header_line}");
        let separator: String = widths
            .iter()
            .map(|width| format!("|{:-^1$}", "", width + 2))
            .collect::<Vec<_>>()
            .join("");
        println!("{separator}|");

        for row in rows {
            let cols: Vec<&str> = row.iter().map(String::as_str).collect();
            println!("{}", render_line(&cols, &widths));
        }
    }

    fn sanitize(value: &str) -> String {
        value
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .replace('|', "\\|")
    }

    fn truncate(value: &str, max: usize) -> String {
        if value.chars().count() <= max {
            value.to_string()
        } else {
            let mut truncated = value
                .chars()
                .take(max.saturating_sub(1))
                .collect::<String>();
            truncated.push('…');
            truncated
        }
    }
}

mod progress {
    use std::time::Duration;

    use indicatif::{ProgressBar, ProgressStyle};
    use intent_core::ProgressObserver;

    pub fn spinner(message_enabled: bool, message: impl Into<String>) -> Option<ProgressBar> {
        if !message_enabled {
            return None;
        }
        let progress = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        progress.set_style(style);
        progress.set_message(message.into());
        progress.enable_steady_tick(Duration::from_millis(80));
        Some(progress)
    }

    /// Bar advanced by the pipelines after each keyword.
    pub struct BatchProgress {
        bar: Option<ProgressBar>,
    }

    impl BatchProgress {
        pub fn new(enabled: bool, total: usize) -> Self {
            let bar = enabled.then(|| {
                let bar = ProgressBar::new(total as u64);
                let style = ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar());
                bar.set_style(style);
                bar.enable_steady_tick(Duration::from_millis(120));
                bar
            });
            Self { bar }
        }

        pub fn finish(&self, message: String) {
            if let Some(bar) = &self.bar {
                bar.finish_with_message(message);
            }
        }
    }

    impl ProgressObserver for BatchProgress {
        fn on_progress(&self, current: usize, _total: usize, keyword: &str) {
            if let Some(bar) = &self.bar {
                bar.set_position(current as u64);
                bar.set_message(format!("Processed: {keyword}"));
            }
        }
    }
}

mod settings {
    use std::path::{Path, PathBuf};

    use anyhow::{Context, Result};
    use config::{Config, Environment, File, FileFormat};
    use directories::ProjectDirs;
    use intent_core::AnalyzerConfig;
    use tracing::debug;

    const ENV_PREFIX: &str = "SEARCH_INTENT";
    const CONFIG_FILE_NAME: &str = "config.toml";

    /// Flag values layered on top of file and environment settings.
    #[derive(Debug, Clone, Default)]
    pub struct Overrides {
        pub limit: Option<u32>,
        pub country: Option<String>,
        pub location: Option<String>,
        pub max_pages: Option<usize>,
        pub w_serp: Option<f64>,
        pub w_rules: Option<f64>,
        pub w_pages: Option<f64>,
        pub w_classifier: Option<f64>,
        pub model: Option<String>,
        pub base_url: Option<String>,
    }

    impl Overrides {
        fn apply(&self, config: &mut AnalyzerConfig) {
            if let Some(limit) = self.limit {
                config.search.limit = limit;
            }
            if let Some(country) = &self.country {
                config.search.country.clone_from(country);
            }
            if let Some(location) = &self.location {
                config.search.location.clone_from(location);
            }
            if let Some(max_pages) = self.max_pages {
                config.search.max_pages = max_pages;
            }
            if let Some(weight) = self.w_serp {
                config.weights.serp = weight;
            }
            if let Some(weight) = self.w_rules {
                config.weights.rules = weight;
            }
            if let Some(weight) = self.w_pages {
                config.weights.pages = weight;
            }
            if let Some(weight) = self.w_classifier {
                config.weights.classifier = weight;
            }
            if let Some(model) = &self.model {
                config.llm.model.clone_from(model);
            }
            if let Some(base_url) = &self.base_url {
                config.llm.base_url.clone_from(base_url);
            }
        }
    }

    fn default_config_file() -> Option<PathBuf> {
        ProjectDirs::from("com", "SearchIntent", "search-intent")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    fn layered(explicit: Option<&Path>) -> Result<Config> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&AnalyzerConfig::default()).context("failed to encode defaults")?,
        );

        match explicit {
            Some(path) => {
                builder = builder.add_source(File::from(path).format(FileFormat::Toml));
            }
            None => {
                if let Some(path) = default_config_file() {
                    debug!(target: "search_intent_cli", path = %path.display(), "Looking for config file");
                    builder = builder
                        .add_source(File::from(path).format(FileFormat::Toml).required(false));
                }
            }
        }

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to load analyzer settings")
    }

    /// Defaults, then the TOML file, then `SEARCH_INTENT__*` variables, then flags.
    pub fn load(explicit: Option<&Path>, overrides: &Overrides) -> Result<AnalyzerConfig> {
        let mut config: AnalyzerConfig = layered(explicit)?
            .try_deserialize()
            .context("invalid analyzer settings")?;
        overrides.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

}
