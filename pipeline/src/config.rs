use burn::prelude::Config;
use crate::export::{ExportFormat, ExportToken};
use crate::options::{Device, RefViewStrategy};

#[derive(Config, Debug)]
pub struct PipelineConfig {
    /// Directory scanned (non-recursively) for input views.
    #[config(default = "String::from(\"/workspace/datasets/small_batch/images/\")")]
    pub input_dir: String,

    /// Location the model writes its exports to. Handed to the model exactly as given.
    #[config(default = "String::from(\"/workspace/output/instant_splat_giant\")")]
    pub export_dir: String,

    /// Checkpoint to run. Only the giant variants can produce Gaussian splats.
    #[config(default = "String::from(\"da3-giant\")")]
    pub model_name: String,

    #[config(default = "Device::Cuda(None)")]
    pub device: Device,

    /// Which files to export, `-` separated for several (`gs_ply-gs_video`).
    #[config(default = "ExportFormat::from(ExportToken::GsPly)")]
    pub export_format: ExportFormat,

    /// Enables the Gaussian splat head.
    #[config(default = true)]
    pub infer_gs: bool,

    #[config(default = true)]
    pub align_to_input_ext_scale: bool,

    #[config(default = "RefViewStrategy::SaddleBalanced")]
    pub ref_view_strategy: RefViewStrategy,

    /// Refuse known model / export combinations that cannot work before loading anything.
    #[config(default = true)]
    pub check_capability: bool,
}

#[derive(Config, Debug)]
pub struct BridgeConfig {
    /// Interpreter that has `depth_anything_3` installed.
    #[config(default = "String::from(\"python3\")")]
    pub python: String,

    /// Extra import root put in front of `PYTHONPATH`, for source checkouts of the model library.
    pub python_path: Option<String>,
}
