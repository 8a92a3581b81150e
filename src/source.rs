//! Vendor data source: organisation search and batched data-grid requests.
//!
//! The [`DataSource`] trait is what the collection pipeline talks to.
//! [`RefinitivClient`] implements it over HTTP against Refinitiv Data Platform
//! style endpoints; tests substitute in-memory sources or a wiremock server.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ApiConfig;

/// Environment variable that overrides `api.app_key` from the config file
pub const APP_KEY_ENV: &str = "SUPPLYGRAPH_APP_KEY";

/// Header carrying the application key on every vendor request
pub const APP_KEY_HEADER: &str = "x-tr-applicationid";

const SEARCH_PATH: &str = "discovery/search/v1/";
const DATAGRID_PATH: &str = "data/datagrid/beta1/";

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Vendor API returned HTTP {status} for {url}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("Failed to decode vendor response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Vendor response is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Invalid vendor base URL '{0}'")]
    InvalidBaseUrl(String),
}

/// One organisation search hit. Only the primary identifier is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "PrimaryRIC", default)]
    pub primary_ric: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "Hits", default)]
    hits: Vec<SearchHit>,
}

/// Column descriptor of a data-grid response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridHeader {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl GridHeader {
    pub fn new(name: impl Into<String>, title: Option<&str>) -> Self {
        Self {
            name: name.into(),
            title: title.map(str::to_string),
        }
    }

    /// Whether this header answers to `key`, either by field name or by title.
    ///
    /// Field names are compared case-insensitively, with and without their
    /// parenthesized parameters: `TR.CompanyMarketCapitalization(Curn=USD)`
    /// matches a header named `TR.CompanyMarketCapitalization`.
    pub fn matches(&self, key: &str) -> bool {
        let name = self.name.as_str();
        if name.eq_ignore_ascii_case(key)
            || strip_parameters(name).eq_ignore_ascii_case(strip_parameters(key))
        {
            return true;
        }
        self.title
            .as_deref()
            .map(|t| t.eq_ignore_ascii_case(key))
            .unwrap_or(false)
    }
}

fn strip_parameters(field: &str) -> &str {
    match field.find('(') {
        Some(idx) => field[..idx].trim_end(),
        None => field,
    }
}

/// Tabular vendor response: ordered headers plus rows of JSON cells
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataGrid {
    #[serde(default)]
    pub headers: Vec<GridHeader>,
    #[serde(default, rename = "data")]
    pub rows: Vec<Vec<Value>>,
}

impl DataGrid {
    pub fn new(headers: Vec<GridHeader>, rows: Vec<Vec<Value>>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column answering to any of `keys`
    pub fn find_column(&self, keys: &[&str]) -> Option<usize> {
        keys.iter()
            .find_map(|key| self.headers.iter().position(|h| h.matches(key)))
    }

    /// Like [`find_column`](Self::find_column) but a missing column is an error
    pub fn require_column(&self, keys: &[&str]) -> Result<usize, SourceError> {
        self.find_column(keys)
            .ok_or_else(|| SourceError::MissingColumn(keys.first().copied().unwrap_or("").to_string()))
    }

    /// Keep only rows whose cell in `column` satisfies `predicate`
    pub fn retain_rows<F>(&mut self, column: usize, mut predicate: F)
    where
        F: FnMut(&Value) -> bool,
    {
        self.rows
            .retain(|row| row.get(column).map(&mut predicate).unwrap_or(false));
    }

    /// Drop the leading column from headers and every row
    pub fn without_first_column(mut self) -> Self {
        if !self.headers.is_empty() {
            self.headers.remove(0);
        }
        for row in &mut self.rows {
            if !row.is_empty() {
                row.remove(0);
            }
        }
        self
    }
}

/// Cell as text; numbers are rendered, null and empty strings are missing
pub fn cell_text(cell: Option<&Value>) -> Option<String> {
    match cell? {
        Value::Null => None,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Cell as a number; numeric strings are parsed, anything else is missing
pub fn cell_number(cell: Option<&Value>) -> Option<f64> {
    match cell? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Access to the vendor's organisation search and data grid
#[allow(async_fn_in_trait)]
pub trait DataSource {
    /// Organisation search on exact common name
    async fn search_organisations(&self, common_name: &str) -> Result<Vec<SearchHit>, SourceError>;

    /// One batched request for `fields` over `universe`
    async fn get_data(&self, universe: &[String], fields: &[String]) -> Result<DataGrid, SourceError>;
}

/// HTTP client for the vendor API, opened once per run
#[derive(Debug, Clone)]
pub struct RefinitivClient {
    client: Client,
    base_url: url::Url,
    app_key: Option<String>,
    search_top: u32,
}

impl RefinitivClient {
    /// Build the client from `[api]` settings.
    /// The application key comes from [`APP_KEY_ENV`] if set, else the config.
    pub fn open(config: &ApiConfig) -> Result<Self, SourceError> {
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url =
            url::Url::parse(&base).map_err(|_| SourceError::InvalidBaseUrl(config.base_url.clone()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SourceError::Transport {
                url: base_url.to_string(),
                source: e,
            })?;

        let app_key = std::env::var(APP_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| config.app_key.clone().filter(|k| !k.trim().is_empty()));

        debug!("Opened vendor session against {}", base_url);

        Ok(Self {
            client,
            base_url,
            app_key,
            search_top: config.search_top,
        })
    }

    fn endpoint(&self, path: &str) -> Result<url::Url, SourceError> {
        self.base_url
            .join(path)
            .map_err(|_| SourceError::InvalidBaseUrl(self.base_url.to_string()))
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, SourceError> {
        let url = self.endpoint(path)?;
        let url_str = url.to_string();

        let mut request = self.client.post(url).json(body);
        if let Some(key) = &self.app_key {
            request = request.header(APP_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(|e| SourceError::Transport {
            url: url_str.clone(),
            source: e,
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| SourceError::Transport {
            url: url_str.clone(),
            source: e,
        })?;

        if !status.is_success() {
            warn!("Vendor API returned status {} for {}", status, url_str);
            return Err(SourceError::Status {
                url: url_str,
                status: status.as_u16(),
                body: text.chars().take(500).collect(),
            });
        }

        serde_json::from_str::<T>(&text).map_err(|e| SourceError::Decode {
            url: url_str,
            message: e.to_string(),
        })
    }
}

/// Filter expression for an exact common-name match
pub fn common_name_filter(common_name: &str) -> String {
    format!("CommonName xeq '{}'", common_name)
}

impl DataSource for RefinitivClient {
    async fn search_organisations(&self, common_name: &str) -> Result<Vec<SearchHit>, SourceError> {
        let body = serde_json::json!({
            "View": "Organisations",
            "Filter": common_name_filter(common_name),
            "Select": "PrimaryRIC",
            "Top": self.search_top,
        });
        let response: SearchResponse = self.post_json(SEARCH_PATH, &body).await?;
        debug!("Organisation search for '{}' returned {} hits", common_name, response.hits.len());
        Ok(response.hits)
    }

    async fn get_data(&self, universe: &[String], fields: &[String]) -> Result<DataGrid, SourceError> {
        let body = serde_json::json!({
            "universe": universe,
            "fields": fields,
        });
        let grid: DataGrid = self.post_json(DATAGRID_PATH, &body).await?;
        debug!(
            "Data grid for {} instruments returned {} rows x {} columns",
            universe.len(),
            grid.len(),
            grid.headers.len()
        );
        Ok(grid)
    }
}
