//! Iterative supplier-buyer graph expansion.
//!
//! Starting from resolved seed firms, each round fetches firm rows and
//! relationships for newly discovered identifiers, joins names, and derives
//! the next frontier from the relationships fetched in that round.

use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

use crate::config::{AnalysisConfig, FieldsConfig, FrontierResolution};
use crate::fetch::{fetch_firm_data, fetch_relationships};
use crate::logger::CollectionLogger;
use crate::model::{Firm, Relationship};
use crate::resolver::{resolve_identifiers, NameResolution};
use crate::source::DataSource;

/// Everything accumulated over one collection run
#[derive(Debug, Clone, Default)]
pub struct CollectionState {
    /// Every identifier queried so far, in discovery order
    pub known_identifiers: Vec<String>,
    pub firms: Vec<Firm>,
    pub relationships: Vec<Relationship>,
    /// Expansion rounds run after the seed fetch
    pub rounds: u32,
    /// True when expansion stopped because the identifier cap was reached
    pub capped: bool,
}

/// Loop parameters
#[derive(Debug, Clone)]
pub struct ExpansionSettings {
    pub min_confidence: f64,
    pub max_identifiers: usize,
    pub frontier_resolution: FrontierResolution,
    pub fields: FieldsConfig,
}

impl ExpansionSettings {
    pub fn from_config(analysis: &AnalysisConfig, fields: &FieldsConfig) -> Self {
        Self {
            min_confidence: analysis.min_confidence,
            max_identifiers: analysis.max_identifiers,
            frontier_resolution: analysis.frontier_resolution,
            fields: fields.clone(),
        }
    }
}

/// Fill in supplier and buyer names from the firm table.
///
/// A later firm row overrides an earlier one with the same identifier.
/// Identifiers with no firm row get no name.
pub fn match_names(relationships: &mut [Relationship], firms: &[Firm]) {
    let mut names: HashMap<&str, &str> = HashMap::new();
    for firm in firms {
        if let (Some(ric), Some(name)) = (firm.ric.as_deref(), firm.common_name.as_deref()) {
            names.insert(ric, name);
        }
    }

    for rel in relationships.iter_mut() {
        rel.supplier_name = rel
            .supplier_id
            .as_deref()
            .and_then(|id| names.get(id))
            .map(|n| n.to_string());
        rel.buyer_name = rel
            .buyer_id
            .as_deref()
            .and_then(|id| names.get(id))
            .map(|n| n.to_string());
    }
}

/// Identifiers referenced by `relationships` that are not yet in `known`, sorted
pub fn expand_frontier(known: &[String], relationships: &[Relationship]) -> Vec<String> {
    let known: BTreeSet<&str> = known.iter().map(String::as_str).collect();

    relationships
        .iter()
        .flat_map(|r| [r.buyer_id.as_deref(), r.supplier_id.as_deref()])
        .flatten()
        .filter(|id| !id.is_empty() && !known.contains(id))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Fetch one batch of identifiers and join its relationships against its own firms
async fn fetch_batch<S: DataSource>(
    source: &S,
    identifiers: &[String],
    settings: &ExpansionSettings,
) -> Result<(Vec<Firm>, Vec<Relationship>)> {
    let firms = fetch_firm_data(source, identifiers, &settings.fields.firm)
        .await
        .context("Failed to fetch firm data")?;
    let mut relationships = fetch_relationships(
        source,
        identifiers,
        &settings.fields.relationship,
        settings.min_confidence,
    )
    .await
    .context("Failed to fetch supplier-buyer relationships")?;

    match_names(&mut relationships, &firms);
    Ok((firms, relationships))
}

fn report_failures(logger: &CollectionLogger, resolution: &NameResolution) {
    for failure in &resolution.failures {
        logger.log_resolution_failure(&failure.name, &failure.reason);
    }
}

/// Resolve company names, then expand the graph until no new identifiers
/// appear or `max_identifiers` is reached.
pub async fn collect<S: DataSource>(
    source: &S,
    company_names: &[String],
    settings: &ExpansionSettings,
    logger: &CollectionLogger,
) -> Result<CollectionState> {
    let cap = settings.max_identifiers;
    let mut state = CollectionState::default();

    let seeds = resolve_identifiers(source, company_names).await;
    report_failures(logger, &seeds);
    logger.record_resolution(company_names.len(), seeds.len(), seeds.failures.len());

    let mut seed_ids = seeds.identifiers();
    if seed_ids.is_empty() {
        logger.warn("None of the company names resolved to an identifier");
        return Ok(state);
    }
    if seed_ids.len() > cap {
        logger.warn(&format!(
            "{} seed identifiers exceed the limit of {}; extra seeds dropped",
            seed_ids.len(),
            cap
        ));
        seed_ids.truncate(cap);
        state.capped = true;
    }
    info!("Resolved {} of {} company names", seed_ids.len(), company_names.len());

    state.known_identifiers.extend(seed_ids.iter().cloned());
    logger.set_progress_position(state.known_identifiers.len() as u64).await;
    logger.update_progress("Fetching seed firms...").await;

    let (firms, relationships) = fetch_batch(source, &seed_ids, settings).await?;
    logger.log_round_complete(0, firms.len(), relationships.len());

    let mut frontier = expand_frontier(&state.known_identifiers, &relationships);
    state.firms.extend(firms);
    state.relationships.extend(relationships);
    logger.record_round(0, state.known_identifiers.len());

    while !frontier.is_empty() {
        if state.known_identifiers.len() >= cap {
            state.capped = true;
            logger.info(&format!("Identifier limit of {} reached; stopping expansion", cap));
            break;
        }

        state.rounds += 1;
        let round = state.rounds;
        logger.log_round_start(round, frontier.len(), state.known_identifiers.len());
        logger
            .update_progress(&format!("Round {}: {} new firms", round, frontier.len()))
            .await;

        let mut new_ids = match settings.frontier_resolution {
            FrontierResolution::NameSearch => {
                warn!(
                    "Round {}: resolving {} frontier identifiers through the organisation name search",
                    round,
                    frontier.len()
                );
                let resolution = resolve_identifiers(source, &frontier).await;
                report_failures(logger, &resolution);
                logger.record_frontier_resolution(frontier.len(), resolution.len(), resolution.failures.len());
                resolution.identifiers()
            }
            FrontierResolution::Identifier => frontier.clone(),
        };

        let room = cap - state.known_identifiers.len();
        if new_ids.len() > room {
            debug!("Round {}: truncating {} new identifiers to {}", round, new_ids.len(), room);
            new_ids.truncate(room);
            state.capped = true;
        }
        state.known_identifiers.extend(new_ids.iter().cloned());
        logger.set_progress_position(state.known_identifiers.len() as u64).await;

        let (firms, relationships) = fetch_batch(source, &new_ids, settings).await?;
        logger.log_round_complete(round, firms.len(), relationships.len());

        // Only this round's relationships feed the next frontier
        frontier = expand_frontier(&state.known_identifiers, &relationships);
        state.firms.extend(firms);
        state.relationships.extend(relationships);
        logger.record_round(round, state.known_identifiers.len());
    }

    logger.record_tables(state.firms.len(), state.relationships.len());
    Ok(state)
}
