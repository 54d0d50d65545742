use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("duplicate vertex id `{0}`")]
    DuplicateVertex(String),

    #[error("edge {src} -> {dst} references unknown vertex `{missing}`")]
    UnknownVertex {
        src: String,
        dst: String,
        missing: String,
    },

    #[error("edge {src} -> {dst} has invalid weight {weight}")]
    InvalidWeight { src: String, dst: String, weight: f64 },

    #[error("model covers {got} nodes but the graph has {expected}")]
    ModelMismatch { expected: usize, got: usize },

    #[error("model assigns community {community} but only has {count}")]
    UnknownCommunity { community: usize, count: usize },

    #[error("Generator error: {message}")]
    Generator { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

pub type Result<T> = std::result::Result<T, GraphError>;
