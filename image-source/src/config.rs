use burn::prelude::Config;

/// The five case variants the capture rigs produce.
pub const DEFAULT_PATTERNS: [&str; 5] = ["*.jpg", "*.jpeg", "*.png", "*.JPG", "*.PNG"];

fn default_patterns() -> Vec<String> {
    DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect()
}

#[derive(Config, Debug)]
pub struct LoadConfig {
    /// File name globs of the form `*.<ext>`, scanned one pass per pattern in this order.
    #[config(default = "default_patterns()")]
    pub patterns: Vec<String>,

    /// Drop paths found by more than one pattern. Off by default, so every pattern pass
    /// contributes its matches as-is.
    #[config(default = false)]
    pub dedup: bool,

    /// Max nr. of images to keep, taken from the front of the sorted list.
    pub max_images: Option<usize>,
}
