use crate::error::{GraphError, Result};
use crate::louvain::DEFAULT_RESOLUTION;
use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_VERTEX_PATH: &str = "test_data/vertex.csv";
pub const DEFAULT_EDGE_PATH: &str = "test_data/edge.csv";
pub const DEFAULT_HIERARCHY_LEVELS: usize = 3;
pub const DEFAULT_DETECTION_RUNS: usize = 4;

#[derive(Parser, Debug, Clone)]
#[command(name = "community-driver")]
#[command(about = "Coarsens a graph into community levels and runs detection on the top level")]
pub struct DriverConfig {
    /// Vertex CSV (`id` column, optional `name`)
    #[arg(long = "vertices", default_value = DEFAULT_VERTEX_PATH)]
    pub vertex_path: PathBuf,

    /// Edge CSV (`src`, `dst`, optional `weight`)
    #[arg(long = "edges", default_value = DEFAULT_EDGE_PATH)]
    pub edge_path: PathBuf,

    /// Number of hierarchy levels; the graph is coarsened `levels - 1` times
    #[arg(long = "levels", default_value_t = DEFAULT_HIERARCHY_LEVELS)]
    pub hierarchy_levels: usize,

    /// How many times detection runs on the final graph
    #[arg(long = "runs", default_value_t = DEFAULT_DETECTION_RUNS)]
    pub detection_runs: usize,

    /// Modularity resolution; higher values give smaller communities
    #[arg(long, default_value_t = DEFAULT_RESOLUTION)]
    pub resolution: f64,

    /// Seed for reproducible node visiting order
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the last detection result as a Graphviz DOT file
    #[arg(long = "dot")]
    pub dot_output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            vertex_path: PathBuf::from(DEFAULT_VERTEX_PATH),
            edge_path: PathBuf::from(DEFAULT_EDGE_PATH),
            hierarchy_levels: DEFAULT_HIERARCHY_LEVELS,
            detection_runs: DEFAULT_DETECTION_RUNS,
            resolution: DEFAULT_RESOLUTION,
            seed: None,
            dot_output: None,
            verbose: false,
        }
    }
}

impl DriverConfig {
    /// Coarsening steps before detection; zero for one level or fewer.
    pub fn aggregation_steps(&self) -> usize {
        self.hierarchy_levels.saturating_sub(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.detection_runs == 0 {
            return Err(GraphError::Config {
                message: "--runs must be at least 1".to_string(),
            });
        }
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(GraphError::Config {
                message: format!("--resolution must be positive, got {}", self.resolution),
            });
        }
        Ok(())
    }
}
