use crate::config::{HtmlSelectors, OutputFormat, RankingPolicy, SourceKind};
use crate::utils::error::{AdvisorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Optional on-disk configuration. Every field may be omitted; command-line
/// flags take precedence over anything set here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub source: SourceSection,
    #[serde(default)]
    pub model: ModelSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceSection {
    pub kind: Option<SourceKind>,
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_results: Option<usize>,
    pub ranking: Option<RankingPolicy>,
    pub user_agent: Option<String>,
    pub api_key: Option<String>,
    pub selectors: Option<HtmlSelectors>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSection {
    pub name: Option<String>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    pub format: Option<OutputFormat>,
    pub export_path: Option<PathBuf>,
}

impl FileConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AdvisorError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AdvisorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AdvisorError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[source]
kind = "shopping"
endpoint = "https://serpapi.example.com/search.json"
timeout_seconds = 5
max_results = 8
ranking = "upstream"

[model]
name = "gemini-1.5-pro"

[output]
format = "json"
export_path = "./prices.csv"
"#;

        let config = FileConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.source.kind, Some(SourceKind::Shopping));
        assert_eq!(config.source.timeout_seconds, Some(5));
        assert_eq!(config.source.max_results, Some(8));
        assert_eq!(config.source.ranking, Some(RankingPolicy::Upstream));
        assert_eq!(config.model.name.as_deref(), Some("gemini-1.5-pro"));
        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert_eq!(config.output.export_path, Some(PathBuf::from("./prices.csv")));
    }

    #[test]
    fn test_empty_file_is_valid() {
        let config = FileConfig::from_toml_str("").unwrap();
        assert!(config.source.kind.is_none());
        assert!(config.model.api_key.is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PRICE_ADVISOR_TEST_KEY", "secret-123");

        let toml_content = r#"
[model]
api_key = "${PRICE_ADVISOR_TEST_KEY}"

[source]
api_key = "${PRICE_ADVISOR_UNSET_VAR}"
"#;

        let config = FileConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.model.api_key.as_deref(), Some("secret-123"));
        assert_eq!(
            config.source.api_key.as_deref(),
            Some("${PRICE_ADVISOR_UNSET_VAR}")
        );

        std::env::remove_var("PRICE_ADVISOR_TEST_KEY");
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        let result = FileConfig::from_toml_str("[pipeline]\nname = \"x\"\n");
        assert!(matches!(
            result,
            Err(AdvisorError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[source]\nkind = \"html\"\n[source.selectors]\nitem = \"div.card\"\ntitle = \"h3\"\nprice = \"span.amount\"\nlink = \"a.more\"\n")
            .unwrap();

        let config = FileConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.source.kind, Some(SourceKind::Html));
        assert_eq!(config.source.selectors.unwrap().item, "div.card");
    }
}
