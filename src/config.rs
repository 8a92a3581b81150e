//! Configuration management for supplygraph
//!
//! Configuration is loaded from `./config/supplygraph.toml` unless another
//! path is given on the command line. The defaults live in the config
//! template embedded below, not in source code.

use serde::Deserialize;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration file path relative to working directory
pub const CONFIG_PATH: &str = "./config/supplygraph.toml";

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = include_str!("../config/supplygraph.toml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found at {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid URL in '{field}': {url}")]
    InvalidUrl { field: String, url: String },

    #[error("Configuration field '{field}' cannot be empty")]
    EmptyRequired { field: String },

    #[error("Configuration field '{field}' is out of range: {value}")]
    OutOfRange { field: String, value: String },
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub analysis: AnalysisConfig,
    pub fields: FieldsConfig,
}

/// Vendor API connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    #[serde(default)]
    pub app_key: Option<String>,
    #[serde(default = "default_search_top")]
    pub search_top: u32,
}

fn default_search_top() -> u32 {
    10
}

/// How identifiers on the frontier become identifiers to fetch
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FrontierResolution {
    /// Pass frontier identifiers through the organisation name search
    NameSearch,
    /// Use frontier identifiers directly
    Identifier,
}

impl std::fmt::Display for FrontierResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrontierResolution::NameSearch => write!(f, "name-search"),
            FrontierResolution::Identifier => write!(f, "identifier"),
        }
    }
}

/// Expansion settings
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum relationship confidence score kept
    pub min_confidence: f64,
    /// Hard cap on identifiers known to the expansion loop
    pub max_identifiers: usize,
    pub frontier_resolution: FrontierResolution,
    #[serde(default)]
    pub deduplicate: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldsConfig {
    pub firm: FirmFields,
    pub relationship: RelationshipFields,
}

/// Vendor field codes requested for firm rows
#[derive(Debug, Clone, Deserialize)]
pub struct FirmFields {
    pub common_name: String,
    pub ric: String,
    pub headquarters_country: String,
    pub market_cap: String,
    pub revenue: String,
}

impl FirmFields {
    /// Field list in request order
    pub fn request_fields(&self) -> Vec<String> {
        vec![
            self.common_name.clone(),
            self.ric.clone(),
            self.headquarters_country.clone(),
            self.market_cap.clone(),
            self.revenue.clone(),
        ]
    }
}

/// Vendor field codes requested for relationship rows
#[derive(Debug, Clone, Deserialize)]
pub struct RelationshipFields {
    pub buyer: String,
    pub relationship: String,
    pub supplier: String,
    pub confidence: String,
    /// Display title the vendor gives the confidence column
    #[serde(default)]
    pub confidence_title: Option<String>,
}

impl RelationshipFields {
    pub fn request_fields(&self) -> Vec<String> {
        vec![
            self.buyer.clone(),
            self.relationship.clone(),
            self.supplier.clone(),
            self.confidence.clone(),
        ]
    }
}

impl AppConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(Path::new(CONFIG_PATH))
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// The embedded default configuration
    pub fn default_config() -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(DEFAULT_CONFIG)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        match url::Url::parse(&self.api.base_url) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
            _ => {
                return Err(ConfigError::InvalidUrl {
                    field: "api.base_url".to_string(),
                    url: self.api.base_url.clone(),
                })
            }
        }
        if self.api.user_agent.trim().is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "api.user_agent".to_string(),
            });
        }
        if self.api.request_timeout_secs == 0 {
            return Err(ConfigError::OutOfRange {
                field: "api.request_timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        if self.api.search_top == 0 {
            return Err(ConfigError::OutOfRange {
                field: "api.search_top".to_string(),
                value: "0".to_string(),
            });
        }

        let confidence = self.analysis.min_confidence;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ConfigError::OutOfRange {
                field: "analysis.min_confidence".to_string(),
                value: confidence.to_string(),
            });
        }
        if self.analysis.max_identifiers == 0 {
            return Err(ConfigError::OutOfRange {
                field: "analysis.max_identifiers".to_string(),
                value: "0".to_string(),
            });
        }

        let firm = &self.fields.firm;
        let rel = &self.fields.relationship;
        let required = [
            ("fields.firm.common_name", &firm.common_name),
            ("fields.firm.ric", &firm.ric),
            ("fields.firm.headquarters_country", &firm.headquarters_country),
            ("fields.firm.market_cap", &firm.market_cap),
            ("fields.firm.revenue", &firm.revenue),
            ("fields.relationship.buyer", &rel.buyer),
            ("fields.relationship.relationship", &rel.relationship),
            ("fields.relationship.supplier", &rel.supplier),
            ("fields.relationship.confidence", &rel.confidence),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyRequired {
                    field: field.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Write the default configuration file to `path`
    pub fn create_default_config_at(path: &Path) -> Result<PathBuf, ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        file.write_all(DEFAULT_CONFIG.as_bytes())?;

        Ok(path.to_path_buf())
    }

    pub fn create_default_config() -> Result<PathBuf, ConfigError> {
        Self::create_default_config_at(Path::new(CONFIG_PATH))
    }

    /// Check if stdin is a TTY (interactive terminal)
    pub fn is_interactive() -> bool {
        io::stdin().is_terminal()
    }

    /// Prompt user to create default config (only in interactive mode)
    pub fn prompt_create_config(path: &Path) -> Result<Option<PathBuf>, ConfigError> {
        if !Self::is_interactive() {
            return Ok(None);
        }

        print!("Configuration file not found. Create default config? [Y/n] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input.is_empty() || input == "y" || input == "yes" {
            let path = Self::create_default_config_at(path)?;
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }
}
