pub mod config;
pub mod driver;
pub mod error;
pub mod graph;
pub mod loader;
pub mod logger;
pub mod louvain;
pub mod model;
pub mod synth;

pub use config::DriverConfig;
pub use driver::{DriverReport, run};
pub use error::{GraphError, Result};
pub use graph::{GraphWrapper, Node};
pub use loader::{Edge, Vertex, load_edges, load_vertices};
pub use louvain::{Adjacency, Louvain, Partition};
pub use model::CommunityModel;
pub use synth::{NameGenerator, generate_test_data};
