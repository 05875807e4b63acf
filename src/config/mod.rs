pub mod toml_config;

use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use self::toml_config::FileConfig;

/// Hard cap on the number of listings shown for one query.
pub const MAX_LISTINGS: usize = 10;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_MODEL_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Scrape the marketplace listing page
    Html,
    /// Marketplace JSON search API (`results` array)
    Json,
    /// Shopping-search API (`shopping_results` array)
    Shopping,
}

impl SourceKind {
    pub fn default_endpoint(self) -> &'static str {
        match self {
            SourceKind::Html => "https://listado.mercadolibre.com.ar",
            SourceKind::Json => "https://api.mercadolibre.com/sites/MLA/search",
            SourceKind::Shopping => "https://serpapi.com/search.json",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Html => "html",
            SourceKind::Json => "json",
            SourceKind::Shopping => "shopping",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RankingPolicy {
    /// Sort by price, cheapest first
    #[default]
    PriceAscending,
    /// Keep the order the source returned
    Upstream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// CSS selectors for the marketplace listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlSelectors {
    pub item: String,
    pub title: String,
    pub price: String,
    pub link: String,
}

impl Default for HtmlSelectors {
    fn default() -> Self {
        Self {
            item: "li.ui-search-layout__item".to_string(),
            title: "h2.ui-search-item__title".to_string(),
            price: "span.andes-money-amount__fraction".to_string(),
            link: "a".to_string(),
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "price-advisor")]
#[command(about = "Compare marketplace prices and get an AI price recommendation")]
pub struct CliConfig {
    /// Product to search for; omit to enter queries interactively
    pub query: Vec<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub source: Option<SourceKind>,

    /// Override the search endpoint of the selected source
    #[arg(long)]
    pub endpoint: Option<String>,

    #[arg(long, value_enum)]
    pub ranking: Option<RankingPolicy>,

    #[arg(long)]
    pub max_results: Option<usize>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Preferred language model identifier
    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub model_endpoint: Option<String>,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "SERPAPI_API_KEY", hide_env_values = true)]
    pub serpapi_api_key: Option<String>,

    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write the listings of each search to this CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl CliConfig {
    /// The positional words joined into one query, if any were given.
    pub fn query(&self) -> Option<String> {
        let joined = self.query.join(" ");
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub kind: SourceKind,
    pub endpoint: String,
    pub timeout: Duration,
    pub max_results: usize,
    pub ranking: RankingPolicy,
    pub user_agent: String,
    pub api_key: Option<String>,
    pub selectors: HtmlSelectors,
}

impl SourceSettings {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            endpoint: kind.default_endpoint().to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_results: MAX_LISTINGS,
            ranking: RankingPolicy::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            api_key: None,
            selectors: HtmlSelectors::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub name: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_MODEL_ENDPOINT.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutputSettings {
    pub format: OutputFormat,
    pub export_path: Option<PathBuf>,
}

/// Resolved settings, built once at startup and only read afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: SourceSettings,
    pub model: ModelSettings,
    pub output: OutputSettings,
}

impl AppConfig {
    /// Merges defaults, the optional TOML file and the command line, in that order.
    pub fn resolve(cli: &CliConfig) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::merge(file, cli))
    }

    pub fn merge(file: FileConfig, cli: &CliConfig) -> Self {
        let kind = cli.source.or(file.source.kind).unwrap_or(SourceKind::Html);
        let mut source = SourceSettings::new(kind);

        if let Some(endpoint) = cli.endpoint.clone().or(file.source.endpoint) {
            source.endpoint = endpoint;
        }
        if let Some(secs) = cli.timeout_secs.or(file.source.timeout_seconds) {
            source.timeout = Duration::from_secs(secs);
        }
        if let Some(max) = cli.max_results.or(file.source.max_results) {
            source.max_results = max;
        }
        if let Some(ranking) = cli.ranking.or(file.source.ranking) {
            source.ranking = ranking;
        }
        if let Some(user_agent) = file.source.user_agent {
            source.user_agent = user_agent;
        }
        if let Some(selectors) = file.source.selectors {
            source.selectors = selectors;
        }
        source.api_key = cli.serpapi_api_key.clone().or(file.source.api_key);

        let mut model = ModelSettings::default();
        if let Some(name) = cli.model.clone().or(file.model.name) {
            model.name = name;
        }
        if let Some(endpoint) = cli.model_endpoint.clone().or(file.model.endpoint) {
            model.endpoint = endpoint;
        }
        if let Some(secs) = file.model.timeout_seconds {
            model.timeout = Duration::from_secs(secs);
        }
        model.api_key = cli.gemini_api_key.clone().or(file.model.api_key);

        let output = OutputSettings {
            format: cli.format.or(file.output.format).unwrap_or_default(),
            export_path: cli.export.clone().or(file.output.export_path),
        };

        Self {
            source,
            model,
            output,
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("source.endpoint", &self.source.endpoint)?;
        validation::validate_url("model.endpoint", &self.model.endpoint)?;
        validation::validate_range("source.max_results", self.source.max_results, 1, MAX_LISTINGS)?;
        validation::validate_range("source.timeout_seconds", self.source.timeout.as_secs(), 1, 300)?;
        validation::validate_non_empty_string("model.name", &self.model.name)?;

        if self.source.kind == SourceKind::Shopping {
            let key = validation::validate_required_field("SERPAPI_API_KEY", &self.source.api_key)?;
            validation::validate_non_empty_string("SERPAPI_API_KEY", key)?;
        }

        Ok(())
    }
}
