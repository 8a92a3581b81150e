//! Undirected supply network built from relationship rows, with Graphviz
//! rendering and a dense adjacency-matrix export for statistical tooling.

use anyhow::{Context, Result};
use csv::Writer;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::model::Relationship;

pub struct SupplyNetwork {
    graph: UnGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
    skipped_rows: usize,
}

impl SupplyNetwork {
    /// Add one (supplier, buyer) edge per relationship row, in row order.
    ///
    /// Node labels are firm names, falling back to identifiers. Rows with no
    /// usable label on either end are skipped. Repeated pairs collapse into
    /// one edge; a firm linked to itself gets a self-loop.
    pub fn from_relationships(relationships: &[Relationship]) -> Self {
        let mut network = SupplyNetwork {
            graph: UnGraph::new_undirected(),
            index: HashMap::new(),
            skipped_rows: 0,
        };

        for rel in relationships {
            match (rel.supplier_label(), rel.buyer_label()) {
                (Some(supplier), Some(buyer)) => {
                    let a = network.node(supplier);
                    let b = network.node(buyer);
                    network.graph.update_edge(a, b, ());
                }
                _ => network.skipped_rows += 1,
            }
        }

        if network.skipped_rows > 0 {
            debug!("Skipped {} relationship rows with no supplier or buyer label", network.skipped_rows);
        }
        network
    }

    fn node(&mut self, label: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(label) {
            return idx;
        }
        let idx = self.graph.add_node(label.to_string());
        self.index.insert(label.to_string(), idx);
        idx
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Node labels in insertion order
    pub fn labels(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .map(|i| self.graph[i].as_str())
            .collect()
    }

    /// Dense symmetric matrix, 1.0 where an edge exists, in node insertion order
    pub fn adjacency_matrix(&self) -> Vec<Vec<f64>> {
        let n = self.graph.node_count();
        let mut matrix = vec![vec![0.0; n]; n];
        for edge in self.graph.raw_edges() {
            let (a, b) = (edge.source().index(), edge.target().index());
            matrix[a][b] = 1.0;
            matrix[b][a] = 1.0;
        }
        matrix
    }

    /// Graphviz DOT rendering of the network
    pub fn to_dot(&self) -> String {
        format!("{:?}", Dot::with_config(&self.graph, &[Config::EdgeNoLabel]))
    }
}

/// Write the adjacency matrix as CSV: a header of column positions, then one
/// row per node, with no index column.
pub fn export_adjacency_matrix(network: &SupplyNetwork, output_path: &Path) -> Result<()> {
    debug!("Exporting {}x{} adjacency matrix: {}", network.node_count(), network.node_count(), output_path.display());

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    let mut wtr = Writer::from_writer(file);

    let n = network.node_count();
    wtr.write_record((0..n).map(|i| i.to_string()))?;
    for row in network.adjacency_matrix() {
        wtr.write_record(row.iter().map(|v| format!("{:.1}", v)))?;
    }

    wtr.flush()?;
    info!("Exported adjacency matrix for {} firms: {}", n, output_path.display());
    Ok(())
}

/// Write the Graphviz rendering, e.g. for `dot -Tsvg`
pub fn export_dot(network: &SupplyNetwork, output_path: &Path) -> Result<()> {
    std::fs::write(output_path, network.to_dot())
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    info!(
        "Exported network graph ({} nodes, {} edges): {}",
        network.node_count(),
        network.edge_count(),
        output_path.display()
    );
    Ok(())
}
