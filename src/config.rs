use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file looked up in the current directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = ".commit-lines.toml";

/// Environment variable consulted when the config file carries no token.
pub const PAT_ENV_VAR: &str = "AZURE_DEVOPS_PAT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("devops.base_url is not configured")]
    MissingBaseUrl,

    #[error("Personal access token not found in config or {PAT_ENV_VAR}")]
    MissingToken,
}

/// Top-level configuration loaded from .commit-lines.toml.
///
/// Read once before any repository is processed and passed around by
/// reference afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Connection settings for the DevOps REST API
    #[serde(default)]
    pub devops: DevOpsConfig,

    /// Which repositories to scan and from when
    #[serde(default)]
    pub repositories: RepositoriesConfig,

    /// Which changed files take part in line counting
    #[serde(default)]
    pub file_extensions: FileExtensionsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DevOpsConfig {
    /// Organization/project API root, e.g. https://dev.azure.com/org/project/_apis/
    #[serde(default)]
    pub base_url: String,
    /// Personal access token. If None, falls back to AZURE_DEVOPS_PAT.
    pub pat: Option<String>,
    /// Page size used for skip/top pagination
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for DevOpsConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            pat: None,
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoriesConfig {
    /// Repository names to scan; everything else is ignored
    #[serde(default)]
    pub names: Vec<String>,
    /// Pull requests closed before this day (UTC) are dropped
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
    /// Branch the pull requests were merged into
    #[serde(default = "default_target_branch")]
    pub target_branch: String,
}

impl Default for RepositoriesConfig {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            start_date: default_start_date(),
            target_branch: default_target_branch(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileExtensionsConfig {
    /// Extensions counted, e.g. [".cs", ".ts"]
    #[serde(default)]
    pub admissible: Vec<String>,
    /// Generated-file basenames never counted (case-insensitive)
    #[serde(default = "default_excluded_files")]
    pub excluded_files: Vec<String>,
}

impl Default for FileExtensionsConfig {
    fn default() -> Self {
        Self {
            admissible: Vec::new(),
            excluded_files: default_excluded_files(),
        }
    }
}

fn default_page_size() -> usize {
    100
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default()
}

fn default_target_branch() -> String {
    "master".to_string()
}

fn default_excluded_files() -> Vec<String> {
    vec!["designer.cs".to_string(), "reference.cs".to_string()]
}

impl Config {
    /// Load configuration from `path`, or from .commit-lines.toml in the
    /// current directory when no path is given.
    ///
    /// A missing default file yields the default config; a missing explicit
    /// file is an error. The token falls back to AZURE_DEVOPS_PAT.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from(default_path)?
                } else {
                    Config::default()
                }
            }
        };

        if config.devops.pat.is_none() {
            if let Ok(token) = std::env::var(PAT_ENV_VAR) {
                config.devops.pat = Some(token);
            }
        }

        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// API root with a guaranteed trailing slash.
    pub fn base_url(&self) -> Result<String, ConfigError> {
        let base = self.devops.base_url.trim();
        if base.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        if base.ends_with('/') {
            Ok(base.to_string())
        } else {
            Ok(format!("{base}/"))
        }
    }

    pub fn token(&self) -> Result<String, ConfigError> {
        self.devops
            .pat
            .clone()
            .filter(|pat| !pat.is_empty())
            .ok_or(ConfigError::MissingToken)
    }

    /// Page size, never below one so pagination always advances.
    pub fn page_size(&self) -> usize {
        self.devops.page_size.max(1)
    }
}
