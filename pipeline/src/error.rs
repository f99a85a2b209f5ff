use thiserror::Error;
use image_source::SourceError;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to collect input images")]
    Source(#[from] SourceError),

    #[error("Reconstruction model failed")]
    Model(#[from] ModelError),

    #[error("Unsupported configuration: {0}")]
    Unsupported(String),

    #[error("Pipeline stopped before reporting a result")]
    Interrupted,
}

/// Anything that goes wrong inside the reconstruction backend.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to load model '{name}': {reason}")]
    Load { name: String, reason: String },

    #[error("Inference exited with {status}")]
    Inference { status: String },

    #[error("Failed to encode inference request")]
    Encode(#[from] serde_json::Error),

    #[error("IO error while running the model")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
#[error("Invalid {kind} '{value}'. Expected one of: {expected}")]
pub struct OptionError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}
