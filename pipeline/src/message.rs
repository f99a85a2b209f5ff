use std::path::PathBuf;
use crate::export::InferenceResult;
use crate::options::Device;

#[derive(Debug)]
pub enum PipelineMessage {
    /// Input views were found and will be reconstructed jointly.
    Discovered {
        count: usize,
    },
    /// Nothing matched in the input directory. Nothing further happens.
    NoImages {
        dir: PathBuf,
    },
    LoadingModel {
        name: String,
        device: Device,
    },
    Running,
    Finished(InferenceResult),
}

/// How a run ended.
#[derive(Debug, PartialEq, Eq)]
pub enum RunOutcome {
    NoImages,
    Completed(InferenceResult),
}
