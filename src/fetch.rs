//! Batched firm and relationship fetches.

use tracing::debug;

use crate::config::{FirmFields, RelationshipFields};
use crate::model::{confidence_keys, Firm, Relationship};
use crate::source::{cell_number, DataSource, SourceError};

/// Fetch firm attributes for `identifiers` in one vendor call
pub async fn fetch_firm_data<S: DataSource>(
    source: &S,
    identifiers: &[String],
    fields: &FirmFields,
) -> Result<Vec<Firm>, SourceError> {
    if identifiers.is_empty() {
        return Ok(Vec::new());
    }

    let grid = source.get_data(identifiers, &fields.request_fields()).await?;
    let firms = Firm::from_grid(&grid, fields)?;
    debug!("Fetched {} firm rows for {} identifiers", firms.len(), identifiers.len());
    Ok(firms)
}

/// Fetch supplier-buyer links for `identifiers` in one vendor call.
///
/// Rows scoring below `min_confidence` are dropped, as are rows with no
/// numeric score. The leading column is then discarded as the echo of the
/// requested identifier.
pub async fn fetch_relationships<S: DataSource>(
    source: &S,
    identifiers: &[String],
    fields: &RelationshipFields,
    min_confidence: f64,
) -> Result<Vec<Relationship>, SourceError> {
    if identifiers.is_empty() {
        return Ok(Vec::new());
    }

    let mut grid = source.get_data(identifiers, &fields.request_fields()).await?;
    let total = grid.len();

    let confidence = grid.require_column(&confidence_keys(fields))?;
    grid.retain_rows(confidence, |cell| {
        cell_number(Some(cell))
            .map(|score| score >= min_confidence)
            .unwrap_or(false)
    });

    let grid = grid.without_first_column();
    let relationships = Relationship::from_grid(&grid, fields)?;

    debug!(
        "Kept {} of {} relationship rows at confidence >= {}",
        relationships.len(),
        total,
        min_confidence
    );
    Ok(relationships)
}
