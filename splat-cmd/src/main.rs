use std::num::NonZeroUsize;
use std::path::PathBuf;
use anyhow::Context;
use burn::config::Config;
use clap::Parser;
use futures::StreamExt;
use image_source::LoadConfig;
use pipeline::{
    BridgeConfig, Da3Python, Device, ExportFormat, InferenceResult, Pipeline, PipelineConfig,
    PipelineMessage, RefViewStrategy,
};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Feed-forward Gaussian splatting: reconstruct a folder of images in one model call.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// JSON pipeline config to start from. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective pipeline config to this file before running
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Directory containing the input images
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory the model exports to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Model checkpoint, e.g. da3-giant
    #[arg(short, long)]
    model: Option<String>,

    /// Compute device: cuda, cuda:<index>, mps or cpu
    #[arg(long)]
    device: Option<Device>,

    /// Export format, `-` separated for several (gs_ply-gs_video)
    #[arg(long)]
    export_format: Option<ExportFormat>,

    /// Disable the Gaussian splat head
    #[arg(long)]
    no_gs: bool,

    /// Don't align the prediction scale to the input extrinsics
    #[arg(long)]
    no_align: bool,

    /// Reference view strategy: first, middle, saddle_balanced, saddle_sim_range
    #[arg(long)]
    ref_view_strategy: Option<RefViewStrategy>,

    /// Skip the model capability check
    #[arg(long)]
    allow_unsupported: bool,

    /// Drop images matched by more than one pattern
    #[arg(long)]
    dedup: bool,

    /// Only use the first N images (after sorting), N >= 1
    #[arg(long)]
    max_images: Option<NonZeroUsize>,

    /// Python interpreter with depth_anything_3 installed
    #[arg(long, default_value = "python3")]
    python: String,

    /// Extra directory to put in front of PYTHONPATH
    #[arg(long)]
    python_path: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?,
            None => PipelineConfig::new(),
        };

        if let Some(input) = &self.input {
            config.input_dir = input.to_string_lossy().into_owned();
        }
        if let Some(output) = &self.output {
            config.export_dir = output.to_string_lossy().into_owned();
        }
        if let Some(model) = &self.model {
            config.model_name = model.clone();
        }
        if let Some(device) = self.device {
            config.device = device;
        }
        if let Some(format) = &self.export_format {
            config.export_format = format.clone();
        }
        if let Some(strategy) = self.ref_view_strategy {
            config.ref_view_strategy = strategy;
        }
        if self.no_gs {
            config.infer_gs = false;
        }
        if self.no_align {
            config.align_to_input_ext_scale = false;
        }
        if self.allow_unsupported {
            config.check_capability = false;
        }
        Ok(config)
    }

    fn load_config(&self) -> LoadConfig {
        LoadConfig::new()
            .with_dedup(self.dedup)
            .with_max_images(self.max_images.map(NonZeroUsize::get))
    }

    fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig::new()
            .with_python(self.python.clone())
            .with_python_path(self.python_path.clone())
    }
}

/// The console line for a progress message. A finished run is reported by [`report`] instead.
fn progress_line(message: &PipelineMessage) -> Option<(Level, String)> {
    match message {
        PipelineMessage::NoImages { dir } => {
            Some((Level::WARN, format!("No images found in {}", dir.display())))
        }
        PipelineMessage::Discovered { count } => Some((Level::INFO, format!("Found {count} images."))),
        PipelineMessage::LoadingModel { name, device } => {
            Some((Level::INFO, format!("Loading model {name} on {device}...")))
        }
        PipelineMessage::Running => {
            Some((Level::INFO, "Running Feed-Forward Gaussian Splatting...".to_string()))
        }
        PipelineMessage::Finished(_) => None,
    }
}

fn report(result: &InferenceResult) {
    info!("✅ Success! Results saved to: {}", result.export_dir.display());
    for artifact in &result.artifacts {
        info!("   {}", artifact.display());
    }
    if result.splat_files().next().is_none() {
        warn!("No .ply file was written, check the export format");
    } else {
        info!("   Look for 'scene.ply' or similar .ply files.");
        info!("   Upload the .ply file to https://superspl.at/ to view it.");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    let config = args.pipeline_config()?;
    if let Some(path) = &args.save_config {
        config
            .save(path)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        info!("Saved config to {}", path.display());
    }

    let model = Da3Python::new(args.bridge_config());
    let pipeline = Pipeline::new(config, args.load_config(), model);

    let mut stream = std::pin::pin!(pipeline.launch());
    while let Some(message) = stream.next().await {
        let message = message?;
        match progress_line(&message) {
            Some((level, line)) if level == Level::WARN => warn!("{line}"),
            Some((_, line)) => info!("{line}"),
            None => {}
        }
        if let PipelineMessage::Finished(result) = &message {
            report(result);
        }
    }

    Ok(())
}
