use thiserror::Error;

pub type Result<T> = std::result::Result<T, SourceError>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Invalid image pattern '{pattern}': {reason}")]
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },

    #[error("No image patterns configured")]
    NoPatterns,

    #[error("max_images must be at least 1, leave it unset to keep every image")]
    ZeroMaxImages,
}
