use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::{FirmFields, RelationshipFields};
use crate::source::{cell_number, cell_text, DataGrid, SourceError};

/// Header name the vendor uses for the universe echo column
pub const INSTRUMENT_COLUMN: &str = "instrument";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Firm {
    pub instrument: Option<String>,
    pub common_name: Option<String>,
    pub ric: Option<String>,
    pub headquarters_country: Option<String>,
    pub market_cap: Option<f64>,
    pub revenue_5y_avg: Option<f64>,
}

impl Firm {
    pub fn new(ric: &str, common_name: &str) -> Self {
        Firm {
            instrument: Some(ric.to_string()),
            common_name: Some(common_name.to_string()),
            ric: Some(ric.to_string()),
            headquarters_country: None,
            market_cap: None,
            revenue_5y_avg: None,
        }
    }

    /// Type every row of a firm data grid.
    /// All configured columns must be present; the instrument echo is optional.
    pub fn from_grid(grid: &DataGrid, fields: &FirmFields) -> Result<Vec<Firm>, SourceError> {
        let instrument = grid.find_column(&[INSTRUMENT_COLUMN]);
        let name = grid.require_column(&[fields.common_name.as_str()])?;
        let ric = grid.require_column(&[fields.ric.as_str()])?;
        let country = grid.require_column(&[fields.headquarters_country.as_str()])?;
        let market_cap = grid.require_column(&[fields.market_cap.as_str()])?;
        let revenue = grid.require_column(&[fields.revenue.as_str()])?;

        Ok(grid
            .rows
            .iter()
            .map(|row| Firm {
                instrument: instrument.and_then(|i| cell_text(row.get(i))),
                common_name: cell_text(row.get(name)),
                ric: cell_text(row.get(ric)),
                headquarters_country: cell_text(row.get(country)),
                market_cap: cell_number(row.get(market_cap)),
                revenue_5y_avg: cell_number(row.get(revenue)),
            })
            .collect())
    }
}

/// A directed supplier -> buyer link reported by the vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub buyer_id: Option<String>,
    pub relationship_type: Option<String>,
    pub supplier_id: Option<String>,
    pub confidence: Option<f64>,
    pub supplier_name: Option<String>,
    pub buyer_name: Option<String>,
}

impl Relationship {
    pub fn new(buyer_id: &str, supplier_id: &str, confidence: f64) -> Self {
        Relationship {
            buyer_id: Some(buyer_id.to_string()),
            relationship_type: None,
            supplier_id: Some(supplier_id.to_string()),
            confidence: Some(confidence),
            supplier_name: None,
            buyer_name: None,
        }
    }

    pub fn from_grid(grid: &DataGrid, fields: &RelationshipFields) -> Result<Vec<Relationship>, SourceError> {
        let buyer = grid.require_column(&[fields.buyer.as_str()])?;
        let kind = grid.require_column(&[fields.relationship.as_str()])?;
        let supplier = grid.require_column(&[fields.supplier.as_str()])?;
        let confidence = grid.require_column(&confidence_keys(fields))?;

        Ok(grid
            .rows
            .iter()
            .map(|row| Relationship {
                buyer_id: cell_text(row.get(buyer)),
                relationship_type: cell_text(row.get(kind)),
                supplier_id: cell_text(row.get(supplier)),
                confidence: cell_number(row.get(confidence)),
                supplier_name: None,
                buyer_name: None,
            })
            .collect())
    }

    /// Node label for the supplier end: the resolved name, else the identifier
    pub fn supplier_label(&self) -> Option<&str> {
        self.supplier_name.as_deref().or(self.supplier_id.as_deref())
    }

    pub fn buyer_label(&self) -> Option<&str> {
        self.buyer_name.as_deref().or(self.buyer_id.as_deref())
    }
}

/// Lookup keys for the confidence column: field code first, then display title
pub fn confidence_keys(fields: &RelationshipFields) -> Vec<&str> {
    let mut keys = vec![fields.confidence.as_str()];
    if let Some(title) = fields.confidence_title.as_deref() {
        keys.push(title);
    }
    keys
}

/// Keep the first firm seen for each identifier. Firms without one are kept.
pub fn deduplicate_firms(firms: &[Firm]) -> Vec<Firm> {
    let mut seen = HashSet::new();
    firms
        .iter()
        .filter(|f| match &f.ric {
            Some(ric) => seen.insert(ric.clone()),
            None => true,
        })
        .cloned()
        .collect()
}

/// Keep the first relationship seen for each (buyer, supplier) pair
pub fn deduplicate_relationships(relationships: &[Relationship]) -> Vec<Relationship> {
    let mut seen = HashSet::new();
    relationships
        .iter()
        .filter(|r| seen.insert((r.buyer_id.clone(), r.supplier_id.clone())))
        .cloned()
        .collect()
}
