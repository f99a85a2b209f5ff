use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use crate::pattern::ImagePattern;

/// A single flat directory of input images.
#[derive(Clone, Debug)]
pub struct Filesystem {
    root: PathBuf,
}

impl Filesystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Regular files directly under the root whose name matches `pattern`.
    ///
    /// Subdirectories are not visited. Entries that cannot be read, including a missing root,
    /// are skipped, so an unreadable directory looks the same as an empty one.
    pub fn files_matching<'a>(
        &'a self,
        pattern: &'a ImagePattern,
    ) -> impl Iterator<Item = PathBuf> + 'a {
        WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    log::debug!("Skipping entry in {}: {err}", self.root.display());
                    None
                }
            })
            .filter_map(move |entry| {
                let name = entry.file_name().to_str()?;
                // `Path::is_file` follows symlinks, the walk entry itself does not.
                (pattern.matches(name) && entry.path().is_file())
                    .then(|| self.root.join(name))
            })
    }
}
