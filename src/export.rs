use crate::model::{Firm, Relationship};
use anyhow::{Context, Result};
use csv::Writer;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

pub const FIRM_DATA_FILE: &str = "firm_data.csv";
pub const RELATIONSHIP_DATA_FILE: &str = "relationship_data.csv";
pub const NETWORK_MATRIX_FILE: &str = "network_matrix.csv";
pub const NETWORK_GRAPH_FILE: &str = "network_graph.dot";

fn optional(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn optional_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn create_writer(output_path: &Path) -> Result<Writer<File>> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    Ok(Writer::from_writer(file))
}

pub fn export_firms_csv(firms: &[Firm], output_path: &Path) -> Result<()> {
    debug!("Exporting {} firms to CSV: {}", firms.len(), output_path.display());

    let mut wtr = create_writer(output_path)?;

    wtr.write_record([
        "Instrument",
        "Company Common Name",
        "RIC",
        "Country of Headquarters",
        "Company Market Capitalization",
        "Revenue 5 Year Average",
    ])?;

    for firm in firms {
        wtr.write_record([
            optional(&firm.instrument),
            optional(&firm.common_name),
            optional(&firm.ric),
            optional(&firm.headquarters_country),
            optional_number(firm.market_cap),
            optional_number(firm.revenue_5y_avg),
        ])?;
    }

    wtr.flush()?;
    info!("Successfully exported {} firms to CSV: {}", firms.len(), output_path.display());

    Ok(())
}

pub fn export_relationships_csv(relationships: &[Relationship], output_path: &Path) -> Result<()> {
    debug!("Exporting {} relationships to CSV: {}", relationships.len(), output_path.display());

    let mut wtr = create_writer(output_path)?;

    wtr.write_record([
        "Buyer Identifier",
        "Relationship",
        "Supplier Identifier",
        "Confidence Score",
        "SupplierName",
        "BuyerName",
    ])?;

    for rel in relationships {
        wtr.write_record([
            optional(&rel.buyer_id),
            optional(&rel.relationship_type),
            optional(&rel.supplier_id),
            optional_number(rel.confidence),
            optional(&rel.supplier_name),
            optional(&rel.buyer_name),
        ])?;
    }

    wtr.flush()?;
    info!("Successfully exported {} relationships to CSV: {}", relationships.len(), output_path.display());

    Ok(())
}

pub fn print_collection_summary(firms: &[Firm], relationships: &[Relationship]) {
    if relationships.is_empty() && firms.is_empty() {
        println!("No firms or relationships collected.");
        return;
    }

    let unique_firms: HashSet<_> = firms.iter().filter_map(|f| f.ric.as_deref()).collect();
    let suppliers: HashSet<_> = relationships.iter().filter_map(|r| r.supplier_id.as_deref()).collect();
    let buyers: HashSet<_> = relationships.iter().filter_map(|r| r.buyer_id.as_deref()).collect();
    let unnamed = relationships
        .iter()
        .filter(|r| r.supplier_name.is_none() || r.buyer_name.is_none())
        .count();

    println!("\n=== Supply Chain Summary ===");
    println!("Firm rows: {} ({} unique identifiers)", firms.len(), unique_firms.len());
    println!("Relationship rows: {}", relationships.len());
    println!("Distinct suppliers: {}", suppliers.len());
    println!("Distinct buyers: {}", buyers.len());
    if unnamed > 0 {
        println!("Rows with an unresolved firm name: {}", unnamed);
    }

    for (country, count) in top_countries(firms, 5) {
        println!("  {}: {} firms", country, count);
    }

    println!("============================\n");
}

/// Headquarters countries by firm count, most common first, ties by name
fn top_countries(firms: &[Firm], limit: usize) -> Vec<(&str, usize)> {
    let mut country_counts: HashMap<&str, usize> = HashMap::new();
    for firm in firms {
        let country = firm.headquarters_country.as_deref().unwrap_or("Unknown");
        *country_counts.entry(country).or_insert(0) += 1;
    }

    let mut countries: Vec<_> = country_counts.into_iter().collect();
    countries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    countries.truncate(limit);
    countries
}
