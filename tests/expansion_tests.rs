//! Collection loop behaviour over an in-memory supplier network.

mod common;

use common::fixtures::{names, settings, MemorySource};
use supplygraph::config::FrontierResolution;
use supplygraph::expansion::collect;
use supplygraph::logger::{CollectionLogger, VerbosityLevel};

fn logger() -> CollectionLogger {
    CollectionLogger::new(VerbosityLevel::Silent)
}

/// Alpha buys from Beta, Beta from Gamma, Gamma from Delta
fn chain() -> MemorySource {
    MemorySource::new()
        .with_company("Alpha Inc", "A.N")
        .with_firm("B.N", "Beta Corp")
        .with_firm("C.N", "Gamma Ltd")
        .with_firm("D.N", "Delta AG")
        .with_link("A.N", "B.N", 0.9)
        .with_link("B.N", "C.N", 0.8)
        .with_link("C.N", "D.N", 0.7)
}

#[tokio::test]
async fn test_identifier_mode_walks_whole_chain() {
    let source = chain();
    let state = collect(
        &source,
        &names(&["Alpha Inc"]),
        &settings(FrontierResolution::Identifier, 1000),
        &logger(),
    )
    .await
    .unwrap();

    assert_eq!(state.known_identifiers, names(&["A.N", "B.N", "C.N", "D.N"]));
    assert_eq!(state.rounds, 3);
    assert!(!state.capped);
    assert_eq!(
        source.relationship_universes(),
        vec![names(&["A.N"]), names(&["B.N"]), names(&["C.N"]), names(&["D.N"])]
    );
    assert_eq!(state.firms.len(), 4);
}

#[tokio::test]
async fn test_names_are_joined_within_each_batch() {
    let source = chain();
    let state = collect(
        &source,
        &names(&["Alpha Inc"]),
        &settings(FrontierResolution::Identifier, 1000),
        &logger(),
    )
    .await
    .unwrap();

    // Seed batch only knows Alpha's firm row
    let first = &state.relationships[0];
    assert_eq!(first.buyer_name.as_deref(), Some("Alpha Inc"));
    assert_eq!(first.supplier_name, None);

    // Beta's batch has Beta's row but not Alpha's
    let beta_rows: Vec<_> = state
        .relationships
        .iter()
        .skip(1)
        .take(2)
        .collect();
    assert_eq!(beta_rows[0].supplier_name.as_deref(), Some("Beta Corp"));
    assert_eq!(beta_rows[0].buyer_name, None);
}

#[tokio::test]
async fn test_name_search_mode_feeds_identifiers_to_search() {
    let source = chain();
    let logger = logger();
    let state = collect(
        &source,
        &names(&["Alpha Inc"]),
        &settings(FrontierResolution::NameSearch, 1000),
        &logger,
    )
    .await
    .unwrap();

    // "B.N" is not a common name, so the frontier dies after one round
    assert_eq!(source.searched(), names(&["Alpha Inc", "B.N"]));
    assert_eq!(state.known_identifiers, names(&["A.N"]));
    assert_eq!(state.rounds, 1);
    assert_eq!(source.relationship_universes(), vec![names(&["A.N"])]);
    assert_eq!(state.relationships.len(), 1);

    // Frontier lookups are tracked apart from the requested company names
    let metadata = logger.metadata();
    assert_eq!(metadata.names_requested, 1);
    assert_eq!(metadata.names_resolved, 1);
    assert_eq!(metadata.frontier_lookups, 1);
    assert_eq!(metadata.frontier_resolved, 0);
}

#[tokio::test]
async fn test_cap_is_never_exceeded() {
    let source = MemorySource::new()
        .with_company("Hub Co", "HUB.N")
        .with_link("HUB.N", "S1.N", 0.9)
        .with_link("HUB.N", "S2.N", 0.9)
        .with_link("HUB.N", "S3.N", 0.9)
        .with_link("HUB.N", "S4.N", 0.9)
        .with_link("S1.N", "T1.N", 0.9);

    let state = collect(
        &source,
        &names(&["Hub Co"]),
        &settings(FrontierResolution::Identifier, 3),
        &logger(),
    )
    .await
    .unwrap();

    assert_eq!(state.known_identifiers, names(&["HUB.N", "S1.N", "S2.N"]));
    assert!(state.capped);
    for universe in source.relationship_universes() {
        assert!(universe.len() <= 3);
    }
}

#[tokio::test]
async fn test_loop_stops_once_cap_reached() {
    let source = chain();
    let state = collect(
        &source,
        &names(&["Alpha Inc"]),
        &settings(FrontierResolution::Identifier, 2),
        &logger(),
    )
    .await
    .unwrap();

    assert_eq!(state.known_identifiers, names(&["A.N", "B.N"]));
    assert!(state.capped);
    assert_eq!(source.relationship_universes().len(), 2);
}

#[tokio::test]
async fn test_low_confidence_links_are_not_followed() {
    let source = MemorySource::new()
        .with_company("Alpha Inc", "A.N")
        .with_link("A.N", "B.N", 0.3)
        .with_link("A.N", "C.N", 0.5);

    let state = collect(
        &source,
        &names(&["Alpha Inc"]),
        &settings(FrontierResolution::Identifier, 1000),
        &logger(),
    )
    .await
    .unwrap();

    assert_eq!(state.known_identifiers, names(&["A.N", "C.N"]));
    assert!(state
        .relationships
        .iter()
        .all(|r| r.confidence.unwrap_or(0.0) >= 0.5));
}

#[tokio::test]
async fn test_unresolved_seeds_give_empty_state() {
    let source = chain();
    let state = collect(
        &source,
        &names(&["Nobody Plc"]),
        &settings(FrontierResolution::Identifier, 1000),
        &logger(),
    )
    .await
    .unwrap();

    assert!(state.known_identifiers.is_empty());
    assert!(state.relationships.is_empty());
    assert!(source.relationship_universes().is_empty());
}

#[tokio::test]
async fn test_cycle_terminates() {
    let source = MemorySource::new()
        .with_company("Alpha Inc", "A.N")
        .with_link("A.N", "B.N", 0.9)
        .with_link("B.N", "A.N", 0.9);

    let state = collect(
        &source,
        &names(&["Alpha Inc"]),
        &settings(FrontierResolution::Identifier, 1000),
        &logger(),
    )
    .await
    .unwrap();

    assert_eq!(state.known_identifiers, names(&["A.N", "B.N"]));
    assert_eq!(state.rounds, 1);
}
