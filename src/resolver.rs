//! Company name to vendor identifier resolution.
//!
//! Each name is looked up independently. A failed lookup is logged and the
//! name skipped; it never aborts the batch.

use std::collections::HashMap;
use tracing::debug;

use crate::source::DataSource;

/// A name whose lookup failed, with the reason
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionFailure {
    pub name: String,
    pub reason: String,
}

/// Result of resolving a batch of names.
///
/// Resolved pairs keep the order in which names were first seen. A name
/// given twice keeps its first position and its most recent identifier.
#[derive(Debug, Clone, Default)]
pub struct NameResolution {
    resolved: Vec<(String, String)>,
    positions: HashMap<String, usize>,
    pub failures: Vec<ResolutionFailure>,
    /// Names whose search returned no hits
    pub unmatched: Vec<String>,
}

impl NameResolution {
    fn insert(&mut self, name: &str, identifier: String) {
        match self.positions.get(name) {
            Some(&idx) => self.resolved[idx].1 = identifier,
            None => {
                self.positions.insert(name.to_string(), self.resolved.len());
                self.resolved.push((name.to_string(), identifier));
            }
        }
    }

    /// Identifier resolved for `name`, if any
    pub fn get(&self, name: &str) -> Option<&str> {
        self.positions
            .get(name)
            .map(|&idx| self.resolved[idx].1.as_str())
    }

    /// Resolved identifiers in first-seen order
    pub fn identifiers(&self) -> Vec<String> {
        self.resolved.iter().map(|(_, id)| id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

/// Resolve each company name to the primary identifier of its first search hit
pub async fn resolve_identifiers<S: DataSource>(source: &S, company_names: &[String]) -> NameResolution {
    let mut resolution = NameResolution::default();

    for company in company_names {
        match source.search_organisations(company).await {
            Ok(hits) => match hits.first() {
                Some(hit) => match &hit.primary_ric {
                    Some(ric) if !ric.trim().is_empty() => {
                        debug!("Resolved '{}' to {}", company, ric);
                        resolution.insert(company, ric.trim().to_string());
                    }
                    _ => {
                        debug!("Error fetching identifier for {}: first search hit has no PrimaryRIC", company);
                        resolution.failures.push(ResolutionFailure {
                            name: company.clone(),
                            reason: "first search hit has no PrimaryRIC".to_string(),
                        });
                    }
                },
                None => {
                    debug!("No organisation found for '{}'", company);
                    resolution.unmatched.push(company.clone());
                }
            },
            Err(e) => {
                debug!("Error fetching identifier for {}: {}", company, e);
                resolution.failures.push(ResolutionFailure {
                    name: company.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    resolution
}
