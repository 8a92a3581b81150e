use clap::Parser;
use std::path::PathBuf;

use crate::config::{AppConfig, FrontierResolution};

#[derive(Parser, Debug)]
#[command(name = "supplygraph")]
#[command(about = "Collects supplier-buyer relationship graphs from a market data platform")]
#[command(version)]
pub struct Cli {
    /// Create default configuration file at ./config/supplygraph.toml
    #[arg(long)]
    pub init: bool,

    /// Configuration file to load instead of ./config/supplygraph.toml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Seed company common name (repeatable, matched exactly)
    #[arg(short = 'c', long = "company", value_name = "NAME")]
    pub companies: Vec<String>,

    /// File of seed company names (.csv, .json or .txt)
    #[arg(short = 'i', long, value_name = "FILE")]
    pub input_file: Option<PathBuf>,

    /// Directory the output tables and graph are written to
    #[arg(short = 'o', long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Minimum relationship confidence score (overrides config)
    #[arg(long, value_name = "SCORE")]
    pub min_confidence: Option<f64>,

    /// Maximum number of identifiers to query (overrides config)
    #[arg(long, value_name = "N")]
    pub max_firms: Option<usize>,

    /// How newly discovered identifiers are fed into the next round (overrides config)
    #[arg(long, value_enum)]
    pub frontier_mode: Option<FrontierResolution>,

    /// Keep one firm row per identifier and one relationship per buyer-supplier pair
    #[arg(long)]
    pub dedupe: bool,

    /// Skip building the network matrix and graph
    #[arg(long)]
    pub no_graph: bool,

    /// Verbose logging (use -v for per-round details, -vv for DEBUG)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors and the final summary
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also write log messages to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<String>,
}

impl Cli {
    pub fn validate(&self) -> Result<(), String> {
        if !self.init && self.companies.is_empty() && self.input_file.is_none() {
            return Err("At least one company is required (use --company or --input-file)".to_string());
        }

        if self.companies.iter().any(|c| c.trim().is_empty()) {
            return Err("Company name cannot be empty".to_string());
        }

        if let Some(path) = &self.input_file {
            if !path.exists() {
                return Err(format!("Input file does not exist: {}", path.display()));
            }
        }

        if let Some(score) = self.min_confidence {
            if !(0.0..=1.0).contains(&score) {
                return Err("Minimum confidence must be between 0 and 1".to_string());
            }
        }

        if self.max_firms == Some(0) {
            return Err("Max firms must be greater than 0".to_string());
        }

        if self.output_dir.exists() && !self.output_dir.is_dir() {
            return Err(format!("Output path is not a directory: {}", self.output_dir.display()));
        }

        Ok(())
    }

    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(score) = self.min_confidence {
            config.analysis.min_confidence = score;
        }
        if let Some(max) = self.max_firms {
            config.analysis.max_identifiers = max;
        }
        if let Some(mode) = self.frontier_mode {
            config.analysis.frontier_resolution = mode;
        }
        if self.dedupe {
            config.analysis.deduplicate = true;
        }
    }
}
