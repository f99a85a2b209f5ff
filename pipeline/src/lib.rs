use std::path::{Path, PathBuf};
use async_fn_stream::{try_fn_stream, TryStreamEmitter};
use futures::{Stream, StreamExt};
use image_source::LoadConfig;
use crate::error::Result;

pub use crate::bridge::{Da3Handle, Da3Python};
pub use crate::config::{BridgeConfig, PipelineConfig};
pub use crate::error::{ModelError, OptionError, PipelineError};
pub use crate::export::{ExportFormat, ExportSnapshot, ExportToken, InferenceResult};
pub use crate::message::{PipelineMessage, RunOutcome};
pub use crate::model::{InferenceRequest, ModelHandle, ReconstructionModel};
pub use crate::options::{Device, RefViewStrategy};
pub use crate::variant::{check_capability, ModelVariant};

mod bridge;
mod config;
mod error;
mod export;
mod message;
mod model;
mod options;
mod variant;

/// Finds the input views and reconstructs them in one inference call.
pub struct Pipeline<M> {
    config: PipelineConfig,
    load_config: LoadConfig,
    model: M,
}

impl<M: ReconstructionModel> Pipeline<M> {
    pub fn new(config: PipelineConfig, load_config: LoadConfig, model: M) -> Self {
        Self {
            config,
            load_config,
            model,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn request(&self, images: image_source::ImageSet) -> InferenceRequest {
        InferenceRequest {
            images: images.into_paths(),
            export_dir: PathBuf::from(&self.config.export_dir),
            export_format: self.config.export_format.clone(),
            infer_gs: self.config.infer_gs,
            align_to_input_ext_scale: self.config.align_to_input_ext_scale,
            ref_view_strategy: self.config.ref_view_strategy,
        }
    }

    /// Runs the pipeline, reporting each stage as it starts.
    ///
    /// The stream ends after [`PipelineMessage::NoImages`] or [`PipelineMessage::Finished`], or
    /// with the first error.
    pub fn launch(&self) -> impl Stream<Item = Result<PipelineMessage>> + '_ {
        try_fn_stream(|emitter: TryStreamEmitter<PipelineMessage, PipelineError>| async move {
            let input_dir = Path::new(&self.config.input_dir);
            let images = image_source::discover(input_dir, &self.load_config)?;

            if images.is_empty() {
                log::debug!("No images found in {}", input_dir.display());
                emitter
                    .emit(PipelineMessage::NoImages {
                        dir: input_dir.to_path_buf(),
                    })
                    .await;
                return Ok(());
            }

            log::debug!("Found {} images in {}", images.len(), input_dir.display());
            emitter
                .emit(PipelineMessage::Discovered {
                    count: images.len(),
                })
                .await;

            let request = self.request(images);
            if self.config.check_capability {
                check_capability(&self.config.model_name, request.infer_gs, &request.export_format)?;
            }

            emitter
                .emit(PipelineMessage::LoadingModel {
                    name: self.config.model_name.clone(),
                    device: self.config.device,
                })
                .await;
            let handle = self
                .model
                .load(&self.config.model_name, &self.config.device)
                .await?;

            emitter.emit(PipelineMessage::Running).await;
            log::debug!(
                "Running {} on {} views, exporting {} to {}",
                self.config.model_name,
                request.images.len(),
                request.export_format,
                request.export_dir.display()
            );
            // Only files this call creates or rewrites count as its output.
            let before = ExportSnapshot::take(&request.export_dir);
            let result = handle.infer(request).await?.since(&before);

            log::debug!(
                "Inference wrote {} artifacts ({} already present before)",
                result.artifacts.len(),
                before.len()
            );
            emitter.emit(PipelineMessage::Finished(result)).await;
            Ok(())
        })
    }

    /// Drives [`Pipeline::launch`] to the end and returns how it finished.
    pub async fn run(&self) -> Result<RunOutcome> {
        let mut stream = std::pin::pin!(self.launch());
        let mut outcome = None;

        while let Some(message) = stream.next().await {
            match message? {
                PipelineMessage::NoImages { .. } => outcome = Some(RunOutcome::NoImages),
                PipelineMessage::Finished(result) => outcome = Some(RunOutcome::Completed(result)),
                other => log::debug!("Pipeline: {other:?}"),
            }
        }

        outcome.ok_or(PipelineError::Interrupted)
    }
}
