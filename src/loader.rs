use crate::error::{GraphError, Result};
use csv::{ReaderBuilder, Trim};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Vertex {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Edge {
    pub src: String,
    pub dst: String,
    #[serde(default = "default_weight", deserialize_with = "weight_or_default")]
    pub weight: f64,
}

impl Edge {
    pub fn new(src: impl Into<String>, dst: impl Into<String>, weight: f64) -> Self {
        Edge {
            src: src.into(),
            dst: dst.into(),
            weight,
        }
    }
}

fn default_weight() -> f64 {
    1.0
}

// An empty `weight` cell counts as an unweighted edge.
fn weight_or_default<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let weight: Option<f64> = Option::deserialize(deserializer)?;
    Ok(weight.unwrap_or_else(default_weight))
}

fn reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    Ok(ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)?)
}

/// Reads the vertex table. The `id` column is required and must be unique.
pub fn load_vertices(path: impl AsRef<Path>) -> Result<Vec<Vertex>> {
    let path = path.as_ref();
    let vertices = reader(path)?
        .into_deserialize::<Vertex>()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut seen = HashSet::with_capacity(vertices.len());
    for vertex in &vertices {
        if !seen.insert(vertex.id.as_str()) {
            return Err(GraphError::DuplicateVertex(vertex.id.clone()));
        }
    }

    info!("Loaded {} vertices from {}", vertices.len(), path.display());
    Ok(vertices)
}

/// Reads the edge table (`src`, `dst`, optional `weight`).
pub fn load_edges(path: impl AsRef<Path>) -> Result<Vec<Edge>> {
    let path = path.as_ref();
    let edges = reader(path)?
        .into_deserialize::<Edge>()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    validate_weights(&edges)?;

    info!("Loaded {} edges from {}", edges.len(), path.display());
    debug!(
        "Total input weight {}",
        edges.par_iter().map(|e| e.weight).sum::<f64>()
    );
    Ok(edges)
}

pub(crate) fn validate_weights(edges: &[Edge]) -> Result<()> {
    match edges
        .par_iter()
        .find_first(|e| !e.weight.is_finite() || e.weight < 0.0)
    {
        Some(bad) => Err(GraphError::InvalidWeight {
            src: bad.src.clone(),
            dst: bad.dst.clone(),
            weight: bad.weight,
        }),
        None => Ok(()),
    }
}
