use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;
use crate::error::OptionError;

/// One kind of file the model library writes after inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportToken {
    MiniNpz,
    Npz,
    Glb,
    Ply,
    GsPly,
    GsVideo,
    FeatVis,
    DepthVis,
    Colmap,
}

impl ExportToken {
    pub const ALL: [ExportToken; 9] = [
        ExportToken::MiniNpz,
        ExportToken::Npz,
        ExportToken::Glb,
        ExportToken::Ply,
        ExportToken::GsPly,
        ExportToken::GsVideo,
        ExportToken::FeatVis,
        ExportToken::DepthVis,
        ExportToken::Colmap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportToken::MiniNpz => "mini_npz",
            ExportToken::Npz => "npz",
            ExportToken::Glb => "glb",
            ExportToken::Ply => "ply",
            ExportToken::GsPly => "gs_ply",
            ExportToken::GsVideo => "gs_video",
            ExportToken::FeatVis => "feat_vis",
            ExportToken::DepthVis => "depth_vis",
            ExportToken::Colmap => "colmap",
        }
    }

    /// Whether the token can only be produced by the Gaussian splat head.
    pub fn requires_gs(&self) -> bool {
        matches!(self, ExportToken::GsPly | ExportToken::GsVideo)
    }
}

impl fmt::Display for ExportToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `-` joined list of export tokens, e.g. `gs_ply-gs_video`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExportFormat {
    tokens: Vec<ExportToken>,
}

impl ExportFormat {
    pub const DELIMITER: char = '-';

    pub fn new(tokens: Vec<ExportToken>) -> Option<Self> {
        (!tokens.is_empty()).then_some(Self { tokens })
    }

    pub fn tokens(&self) -> &[ExportToken] {
        &self.tokens
    }

    pub fn contains(&self, token: ExportToken) -> bool {
        self.tokens.contains(&token)
    }

    pub fn requires_gs(&self) -> bool {
        self.tokens.iter().any(ExportToken::requires_gs)
    }
}

impl From<ExportToken> for ExportFormat {
    fn from(token: ExportToken) -> Self {
        Self {
            tokens: vec![token],
        }
    }
}

impl FromStr for ExportFormat {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |value: &str| OptionError {
            kind: "export format",
            value: value.to_owned(),
            expected: ExportToken::ALL.map(|t| t.as_str()).join(", "),
        };

        let tokens = s
            .split(Self::DELIMITER)
            .map(|part| {
                ExportToken::ALL
                    .into_iter()
                    .find(|token| token.as_str() == part)
                    .ok_or_else(|| invalid(part))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(tokens).ok_or_else(|| invalid(s))
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<_> = self.tokens.iter().map(ExportToken::as_str).collect();
        f.write_str(&joined.join(&Self::DELIMITER.to_string()))
    }
}

impl TryFrom<String> for ExportFormat {
    type Error = OptionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExportFormat> for String {
    fn from(format: ExportFormat) -> Self {
        format.to_string()
    }
}

/// Extensions of the files a reconstruction leaves behind.
const ARTIFACT_EXTENSIONS: [&str; 4] = ["ply", "npz", "glb", "mp4"];

// The library nests some outputs one or two levels down (e.g. `gs_ply/0000.ply`).
const ARTIFACT_SEARCH_DEPTH: usize = 3;

fn artifact_paths(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .max_depth(ARTIFACT_SEARCH_DEPTH)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ARTIFACT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .map(|entry| entry.into_path())
        .collect()
}

type FileStamp = (Option<SystemTime>, u64);

fn stamp(path: &Path) -> Option<FileStamp> {
    let meta = std::fs::metadata(path).ok()?;
    Some((meta.modified().ok(), meta.len()))
}

/// Artifacts present in an export dir at some point, with their mtime and size.
#[derive(Debug, Clone, Default)]
pub struct ExportSnapshot {
    files: HashMap<PathBuf, FileStamp>,
}

impl ExportSnapshot {
    pub fn take(export_dir: &Path) -> Self {
        let files = artifact_paths(export_dir)
            .into_iter()
            .filter_map(|path| stamp(&path).map(|s| (path, s)))
            .collect();
        Self { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// True if `path` is new since the snapshot or was rewritten with a new mtime or size.
    pub fn changed(&self, path: &Path) -> bool {
        match self.files.get(path) {
            None => true,
            Some(before) => stamp(path).as_ref() != Some(before),
        }
    }
}

/// What a finished inference left on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceResult {
    pub export_dir: PathBuf,
    pub artifacts: Vec<PathBuf>,
}

impl InferenceResult {
    /// Lists the artifacts currently under `export_dir`, sorted by path.
    pub fn collect(export_dir: &Path) -> Self {
        let mut artifacts = artifact_paths(export_dir);
        artifacts.sort();

        Self {
            export_dir: export_dir.to_path_buf(),
            artifacts,
        }
    }

    /// Drops artifacts that were already on disk, unchanged, when `before` was taken.
    pub fn since(mut self, before: &ExportSnapshot) -> Self {
        self.artifacts.retain(|path| before.changed(path));
        self
    }

    /// Gaussian splat files, the ones a viewer wants.
    pub fn splat_files(&self) -> impl Iterator<Item = &Path> {
        self.artifacts
            .iter()
            .filter(|path| path.extension().is_some_and(|ext| ext == "ply"))
            .map(PathBuf::as_path)
    }
}
