//! In-memory vendor data for exercising the collection loop without HTTP.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

use supplygraph::config::{AppConfig, FrontierResolution};
use supplygraph::expansion::ExpansionSettings;
use supplygraph::source::{DataGrid, DataSource, GridHeader, SearchHit, SourceError};

/// A small supplier network held in memory.
///
/// Relationship queries return one row per link touching each requested
/// identifier, echoing that identifier in the leading column the way the
/// vendor grid does.
#[derive(Default)]
pub struct MemorySource {
    names: HashMap<String, String>,
    firms: HashMap<String, String>,
    links: Vec<(String, String, f64)>,
    pub searches: Mutex<Vec<String>>,
    pub universes: Mutex<Vec<Vec<String>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a searchable common name together with its firm row
    pub fn with_company(mut self, name: &str, ric: &str) -> Self {
        self.names.insert(name.to_string(), ric.to_string());
        self.firms.insert(ric.to_string(), name.to_string());
        self
    }

    /// Firm row only, not reachable through the name search
    pub fn with_firm(mut self, ric: &str, name: &str) -> Self {
        self.firms.insert(ric.to_string(), name.to_string());
        self
    }

    pub fn with_link(mut self, buyer: &str, supplier: &str, confidence: f64) -> Self {
        self.links.push((buyer.to_string(), supplier.to_string(), confidence));
        self
    }

    pub fn searched(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    /// Universes of relationship queries, in call order
    pub fn relationship_universes(&self) -> Vec<Vec<String>> {
        self.universes.lock().unwrap().clone()
    }

    fn firm_grid(&self, universe: &[String]) -> DataGrid {
        let rows = universe
            .iter()
            .filter_map(|ric| {
                self.firms.get(ric).map(|name| {
                    vec![json!(ric), json!(name), json!(ric), json!("United States"), json!(1.0e9), json!(5.0e8)]
                })
            })
            .collect();
        DataGrid::new(firm_headers(), rows)
    }

    fn relationship_grid(&self, universe: &[String]) -> DataGrid {
        let mut rows: Vec<Vec<Value>> = Vec::new();
        for ric in universe {
            for (buyer, supplier, confidence) in &self.links {
                if buyer == ric || supplier == ric {
                    rows.push(vec![json!(ric), json!(buyer), json!("Supplier"), json!(supplier), json!(confidence)]);
                }
            }
        }
        DataGrid::new(relationship_headers(), rows)
    }
}

impl DataSource for MemorySource {
    async fn search_organisations(&self, common_name: &str) -> Result<Vec<SearchHit>, SourceError> {
        self.searches.lock().unwrap().push(common_name.to_string());
        Ok(self
            .names
            .get(common_name)
            .map(|ric| vec![SearchHit { primary_ric: Some(ric.clone()) }])
            .unwrap_or_default())
    }

    async fn get_data(&self, universe: &[String], fields: &[String]) -> Result<DataGrid, SourceError> {
        if fields.iter().any(|f| f.starts_with("TR.SCRelationship")) {
            self.universes.lock().unwrap().push(universe.to_vec());
            Ok(self.relationship_grid(universe))
        } else {
            Ok(self.firm_grid(universe))
        }
    }
}

pub fn firm_headers() -> Vec<GridHeader> {
    vec![
        GridHeader::new("instrument", Some("Instrument")),
        GridHeader::new("TR.CommonName", Some("Company Common Name")),
        GridHeader::new("TR.RIC", Some("RIC")),
        GridHeader::new("TR.HeadquartersCountry", Some("Country of Headquarters")),
        GridHeader::new("TR.CompanyMarketCapitalization", Some("Company Market Capitalization")),
        GridHeader::new("TR.F.RevGoodsSrvc5YrAvg", Some("Revenue from Goods & Services - 5 Yr Avg")),
    ]
}

pub fn relationship_headers() -> Vec<GridHeader> {
    vec![
        GridHeader::new("instrument", Some("Instrument")),
        GridHeader::new("TR.SCRelationship.ScorgIDOut", Some("Buyer Identifier")),
        GridHeader::new("TR.SCRelationship", Some("Relationship")),
        GridHeader::new("TR.SCRelationship.instrument", Some("Supplier Identifier")),
        GridHeader::new("TR.SCRelationshipConfidenceScore", Some("Value Chains Relationship Confidence Score")),
    ]
}

pub fn settings(mode: FrontierResolution, max_identifiers: usize) -> ExpansionSettings {
    let config = AppConfig::default_config().unwrap();
    let mut settings = ExpansionSettings::from_config(&config.analysis, &config.fields);
    settings.frontier_resolution = mode;
    settings.max_identifiers = max_identifiers;
    settings
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
