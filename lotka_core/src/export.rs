//! Node, edge and generation tables for external graph and plotting tools.
//!
//! Nodes are labelled `h_<id>` for growers and `c_<id>` for decliners. Each
//! interacting pair becomes one edge row: if exactly one direction harms
//! its target the pair is a directed predator edge oriented from the
//! predator (the harming side), otherwise it is an undirected "both" edge.

use crate::integrator::Generations;
use crate::matrix::EcosystemPopulations;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// One species in the node table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRow {
    pub id: usize,
    pub label: String,
    /// Magnitude of the growth rate
    pub growth: f64,
    /// Whether the growth rate is positive
    pub grower: bool,
}

/// Relation between the two species of an edge row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Exactly one direction is harmful
    Predator,
    /// Both directions share a sign
    Both,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Predator => "predator",
            Self::Both => "both",
        }
    }

    /// Graph edge type for this relation.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Predator => "directed",
            Self::Both => "undirected",
        }
    }
}

/// One interacting pair in the edge table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRow {
    pub source: usize,
    pub target: usize,
    /// `|prey| + |pred|`
    pub weight: f64,
    /// Effect of `source` on `target`
    pub prey: f64,
    /// Effect of `target` on `source`
    pub pred: f64,
    pub relation: Relation,
}

/// Node table for an ecosystem.
pub fn node_rows(populations: &EcosystemPopulations) -> Vec<NodeRow> {
    populations
        .growth_rates
        .iter()
        .enumerate()
        .map(|(id, &growth)| {
            let grower = growth > 0.0;
            NodeRow {
                id,
                label: if grower { format!("h_{id}") } else { format!("c_{id}") },
                growth: growth.abs(),
                grower,
            }
        })
        .collect()
}

/// Edge table for an ecosystem, one row per interacting pair.
pub fn edge_rows(populations: &EcosystemPopulations) -> Vec<EdgeRow> {
    let c = &populations.coefficients;
    let n = populations.species_count();
    let mut rows = Vec::new();

    for source in 0..n {
        for target in (source + 1)..n {
            let prey = c[(target, source)];
            let pred = c[(source, target)];
            if prey == 0.0 && pred == 0.0 {
                continue;
            }
            let weight = prey.abs() + pred.abs();
            let row = if prey < 0.0 && pred >= 0.0 {
                EdgeRow { source, target, weight, prey, pred, relation: Relation::Predator }
            } else if pred < 0.0 && prey >= 0.0 {
                EdgeRow {
                    source: target,
                    target: source,
                    weight,
                    prey: pred,
                    pred: prey,
                    relation: Relation::Predator,
                }
            } else {
                EdgeRow { source, target, weight, prey, pred, relation: Relation::Both }
            };
            rows.push(row);
        }
    }
    rows
}

/// Writes the node table as CSV.
pub fn write_nodes_csv<W: Write>(rows: &[NodeRow], mut out: W) -> io::Result<()> {
    writeln!(out, "id,label,growth,grower")?;
    for row in rows {
        writeln!(out, "{},{},{},{}", row.id, row.label, row.growth, row.grower)?;
    }
    out.flush()
}

/// Writes the edge table as CSV.
pub fn write_edges_csv<W: Write>(rows: &[EdgeRow], mut out: W) -> io::Result<()> {
    writeln!(out, "source,target,weight,prey,pred,relation,type")?;
    for row in rows {
        writeln!(
            out,
            "{},{},{},{},{},{},{}",
            row.source,
            row.target,
            row.weight,
            row.prey,
            row.pred,
            row.relation.as_str(),
            row.relation.kind()
        )?;
    }
    out.flush()
}

/// Writes generations as CSV, one line per coarse step and one column per
/// species.
pub fn write_generations_csv<W: Write>(generations: &Generations, mut out: W) -> io::Result<()> {
    let header: Vec<String> = (0..generations.species_count()).map(|i| format!("p_{i}")).collect();
    writeln!(out, "time,{}", header.join(","))?;
    for (step, column) in generations.matrix().column_iter().enumerate() {
        let values: Vec<String> = column.iter().map(|p| p.to_string()).collect();
        writeln!(out, "{},{}", step as f64 * generations.coarse_step(), values.join(","))?;
    }
    out.flush()
}
