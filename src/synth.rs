use crate::error::{GraphError, Result};
use rand::seq::SliceRandom;
use rand::{Rng, thread_rng};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

pub const VERTEX_FILE: &str = "vertex.csv";
pub const EDGE_FILE: &str = "edge.csv";

// Share of generated edges that stay inside one planted group.
const INTRA_GROUP_RATIO: f64 = 0.8;

pub struct NameGenerator {
    prefixes: Vec<&'static str>,
    suffixes: Vec<&'static str>,
    used_names: Mutex<HashSet<String>>,
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl NameGenerator {
    pub fn new() -> Self {
        NameGenerator {
            prefixes: vec![
                "amber", "birch", "cedar", "delta", "ember", "fjord", "granite", "harbor",
                "iris", "juniper", "kestrel", "lumen", "maple", "north", "onyx", "prairie",
            ],
            suffixes: vec![
                "hub", "relay", "node", "bridge", "anchor", "beacon", "gate", "point",
                "spire", "vertex", "link", "crest", "field", "ridge", "port", "mesa",
            ],
            used_names: Mutex::new(HashSet::new()),
        }
    }

    // Parallel generation; collisions are dropped, so the batch may be short
    pub fn generate_unique_batch(&self, count: usize) -> Vec<String> {
        (0..count)
            .into_par_iter()
            .map_init(thread_rng, |rng, _| {
                let prefix = self.prefixes.choose(rng).copied().unwrap_or("user");
                let suffix = self.suffixes.choose(rng).copied().unwrap_or("node");
                let num = rng.gen_range(1..1000);
                format!("{}{}{}", prefix, suffix, num)
            })
            .filter(|name| match self.used_names.lock() {
                Ok(mut used) => used.insert(name.clone()),
                Err(_) => false,
            })
            .collect()
    }

    /// Keeps drawing until exactly `count` unique names exist.
    pub fn generate_unique(&self, count: usize) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(count);
        let mut counter = 0usize;
        while names.len() < count {
            if self.used_names.is_poisoned() {
                return Err(GraphError::Generator {
                    message: "name set lock poisoned".to_string(),
                });
            }
            let batch = self.generate_unique_batch(count - names.len());
            if batch.is_empty() {
                // Name space exhausted; fall back to numbered ids.
                counter += 1;
                let fallback = format!("vertex{}", counter);
                let mut used = self.used_names.lock().map_err(|_| GraphError::Generator {
                    message: "name set lock poisoned".to_string(),
                })?;
                if used.insert(fallback.clone()) {
                    names.push(fallback);
                }
                continue;
            }
            names.extend(batch);
        }
        Ok(names)
    }
}

/// Writes `vertex.csv` and `edge.csv` into `dir` with `groups` planted
/// communities. Returns the two paths.
pub fn generate_test_data(
    dir: impl AsRef<Path>,
    num_vertices: usize,
    num_edges: usize,
    groups: usize,
) -> Result<(PathBuf, PathBuf)> {
    if num_vertices == 0 || groups == 0 || groups > num_vertices {
        return Err(GraphError::Config {
            message: format!(
                "need 0 < groups <= vertices, got {} groups for {} vertices",
                groups, num_vertices
            ),
        });
    }

    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let names = NameGenerator::new().generate_unique(num_vertices)?;

    let vertex_path = dir.join(VERTEX_FILE);
    let mut vertex_writer = csv::Writer::from_path(&vertex_path)?;
    vertex_writer.write_record(["id", "name", "group"])?;
    for (i, name) in names.iter().enumerate() {
        let group = (i % groups).to_string();
        vertex_writer.write_record([name.as_str(), name.as_str(), group.as_str()])?;
    }
    vertex_writer.flush()?;

    let by_group: Vec<Vec<&String>> = (0..groups)
        .map(|g| names.iter().skip(g).step_by(groups).collect())
        .collect();

    let edge_path = dir.join(EDGE_FILE);
    let writer = Mutex::new(BufWriter::new(File::create(&edge_path)?));
    if let Ok(mut w) = writer.lock() {
        writeln!(w, "src,dst,weight")?;
    }

    (0..num_edges)
        .into_par_iter()
        .map_init(thread_rng, |rng, _| {
            let home = &by_group[rng.gen_range(0..groups)];
            let user1 = home[rng.gen_range(0..home.len())];
            let user2 = if rng.gen_bool(INTRA_GROUP_RATIO) {
                home[rng.gen_range(0..home.len())]
            } else {
                &names[rng.gen_range(0..names.len())]
            };
            let weight = rng.gen_range(1..=20);
            format!("{},{},{}", user1, user2, weight)
        })
        .try_for_each(|line| -> std::io::Result<()> {
            let mut w = writer
                .lock()
                .map_err(|_| std::io::Error::other("edge writer poisoned"))?;
            writeln!(w, "{}", line)
        })?;

    writer
        .into_inner()
        .map_err(|_| std::io::Error::other("edge writer poisoned"))?
        .flush()?;

    info!(
        "Generated {} vertices and {} edges in {} groups under {}",
        num_vertices,
        num_edges,
        groups,
        dir.display()
    );
    Ok((vertex_path, edge_path))
}
