use std::path::PathBuf;
use async_trait::async_trait;
use image_source::ImageSet;
use serde::Serialize;
use crate::error::ModelError;
use crate::export::{ExportFormat, ExportToken, InferenceResult};
use crate::options::{Device, RefViewStrategy};

/// Everything a single joint inference over a set of views needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceRequest {
    pub images: Vec<PathBuf>,
    pub export_dir: PathBuf,
    pub export_format: ExportFormat,
    /// Run the Gaussian splat head.
    pub infer_gs: bool,
    /// Scale the prediction to the metric scale of the input extrinsics.
    pub align_to_input_ext_scale: bool,
    pub ref_view_strategy: RefViewStrategy,
}

impl InferenceRequest {
    pub fn new(images: ImageSet, export_dir: PathBuf) -> Self {
        Self {
            images: images.into_paths(),
            export_dir,
            export_format: ExportFormat::from(ExportToken::GsPly),
            infer_gs: true,
            align_to_input_ext_scale: true,
            ref_view_strategy: RefViewStrategy::default(),
        }
    }
}

/// Something that can produce a loaded model by name.
#[async_trait]
pub trait ReconstructionModel: Send + Sync {
    type Handle: ModelHandle;

    /// Loads (and downloads if needed) the named weights onto `device`.
    async fn load(&self, name: &str, device: &Device) -> Result<Self::Handle, ModelError>;
}

/// A model bound to a device. Consumed by its one inference call.
#[async_trait]
pub trait ModelHandle: Send {
    async fn infer(self, request: InferenceRequest) -> Result<InferenceResult, ModelError>;
}
