use crate::error::{PipelineError, Result};
use crate::export::ExportFormat;

/// Published Depth Anything 3 checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelVariant {
    Giant,
    NestedGiantLarge,
    Large,
    Base,
    Small,
    MetricLarge,
    MonoLarge,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 7] = [
        ModelVariant::Giant,
        ModelVariant::NestedGiantLarge,
        ModelVariant::Large,
        ModelVariant::Base,
        ModelVariant::Small,
        ModelVariant::MetricLarge,
        ModelVariant::MonoLarge,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ModelVariant::Giant => "da3-giant",
            ModelVariant::NestedGiantLarge => "da3nested-giant-large",
            ModelVariant::Large => "da3-large",
            ModelVariant::Base => "da3-base",
            ModelVariant::Small => "da3-small",
            ModelVariant::MetricLarge => "da3metric-large",
            ModelVariant::MonoLarge => "da3mono-large",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|variant| variant.name() == name)
    }

    /// Only the giant checkpoints ship the Gaussian splat head.
    pub fn supports_gs(&self) -> bool {
        matches!(self, ModelVariant::Giant | ModelVariant::NestedGiantLarge)
    }
}

/// Rejects option combinations the model cannot serve before anything is loaded.
///
/// Unknown model names are let through with a warning, the library is the final judge for those.
pub fn check_capability(model_name: &str, infer_gs: bool, export_format: &ExportFormat) -> Result<()> {
    if export_format.requires_gs() && !infer_gs {
        return Err(PipelineError::Unsupported(format!(
            "export format '{export_format}' needs the Gaussian splat head but infer_gs is disabled"
        )));
    }

    if !infer_gs {
        return Ok(());
    }

    match ModelVariant::from_name(model_name) {
        Some(variant) if !variant.supports_gs() => {
            let capable: Vec<_> = ModelVariant::ALL
                .iter()
                .filter(|v| v.supports_gs())
                .map(|v| v.name())
                .collect();
            Err(PipelineError::Unsupported(format!(
                "model '{}' has no Gaussian splat head, use one of: {}",
                variant.name(),
                capable.join(", ")
            )))
        }
        Some(_) => Ok(()),
        None => {
            log::warn!("Unknown model '{model_name}', cannot verify Gaussian splat support");
            Ok(())
        }
    }
}
