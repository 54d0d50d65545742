use crate::config::DriverConfig;
use crate::error::Result;
use crate::graph::GraphWrapper;
use crate::loader::{load_edges, load_vertices};
use crate::louvain::Louvain;
use crate::model::CommunityModel;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng, thread_rng};
use tracing::info;

#[derive(Debug, Clone)]
pub struct DriverReport {
    pub graph: GraphWrapper,
    pub aggregations: usize,
    pub models: Vec<CommunityModel>,
    pub seed: u64,
}

impl DriverReport {
    /// All results on one line, space separated.
    pub fn output_line(&self) -> String {
        self.models
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Load, coarsen `hierarchy_levels - 1` times, then detect `detection_runs` times.
pub fn run(config: &DriverConfig) -> Result<DriverReport> {
    config.validate()?;

    let seed = config.seed.unwrap_or_else(|| thread_rng().next_u64());
    let mut rng = StdRng::seed_from_u64(seed);
    info!("Using seed {}", seed);

    let vertices = load_vertices(&config.vertex_path)?;
    let edges = load_edges(&config.edge_path)?;
    let mut gw = GraphWrapper::new(vertices, edges)?
        .with_louvain(Louvain::new().with_resolution(config.resolution));

    let aggregations = config.aggregation_steps();
    for _ in 0..aggregations {
        gw = gw.get_community_gw_with(&mut rng);
    }

    let models: Vec<CommunityModel> = (0..config.detection_runs)
        .map(|run| {
            let model = gw.find_communities_with(&mut rng);
            info!(
                "Run {}: {} (largest community holds {} vertices)",
                run + 1,
                model,
                model.largest_community()
            );
            model
        })
        .collect();

    if let (Some(path), Some(last)) = (&config.dot_output, models.last()) {
        gw.save_dot(last, path)?;
        info!("Wrote DOT graph to {}", path.display());
    }

    Ok(DriverReport {
        graph: gw,
        aggregations,
        models,
        seed,
    })
}
