use std::path::{Path, PathBuf};
use crate::error::Result;

mod config;
mod error;
mod filesystem;
mod pattern;

pub use config::{LoadConfig, DEFAULT_PATTERNS};
pub use error::SourceError;
pub use filesystem::Filesystem;
pub use pattern::ImagePattern;

/// Input images for one reconstruction, in ascending path order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSet {
    paths: Vec<PathBuf>,
}

impl ImageSet {
    /// Builds a set from arbitrary paths, sorting them by their raw bytes.
    ///
    /// That is codepoint order for UTF-8 names, so `B.jpg` < `a.png` < `c.JPG` < `c.jpg`.
    pub fn from_paths(mut paths: Vec<PathBuf>) -> Self {
        paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        Self { paths }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn into_paths(self) -> Vec<PathBuf> {
        self.paths
    }
}

impl IntoIterator for ImageSet {
    type Item = PathBuf;
    type IntoIter = std::vec::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

/// Collects the images directly inside `dir`.
///
/// Each configured pattern is scanned in turn and the matches are concatenated before sorting.
/// Nothing found, including `dir` not existing, is an empty set rather than an error; only a
/// malformed pattern or `max_images == Some(0)` fails.
pub fn discover(dir: &Path, config: &LoadConfig) -> Result<ImageSet> {
    if config.patterns.is_empty() {
        return Err(SourceError::NoPatterns);
    }
    // Truncating to nothing would look the same as an empty directory.
    if config.max_images == Some(0) {
        return Err(SourceError::ZeroMaxImages);
    }
    let patterns = config
        .patterns
        .iter()
        .map(|p| ImagePattern::parse(p))
        .collect::<Result<Vec<_>>>()?;

    if !dir.is_dir() {
        log::debug!("Image directory {} is not readable", dir.display());
    }

    let fs = Filesystem::new(dir);
    let mut paths = vec![];
    for pattern in &patterns {
        let before = paths.len();
        paths.extend(fs.files_matching(pattern));
        log::debug!("{pattern} matched {} files", paths.len() - before);
    }

    let mut images = ImageSet::from_paths(paths);

    if config.dedup {
        let count = images.paths.len();
        images.paths.dedup();
        if images.paths.len() != count {
            log::info!("Dropped {} duplicate image paths", count - images.paths.len());
        }
    }

    if let Some(max) = config.max_images {
        images.paths.truncate(max);
    }

    Ok(images)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};
    use super::{discover, ImageSet, LoadConfig, SourceError};

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), b"").expect("write image");
        }
    }

    fn names(images: &ImageSet) -> Vec<String> {
        images
            .iter()
            .map(|p| p.file_name().expect("file name").to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_empty_dir() {
        let dir = tempfile::tempdir().expect("temp dir");
        touch(dir.path(), &["notes.txt", "model.ply"]);

        let images = discover(dir.path(), &LoadConfig::new()).expect("discover");
        assert!(images.is_empty());
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let images = discover(&dir.path().join("nope"), &LoadConfig::new()).expect("discover");
        assert!(images.is_empty());
    }

    #[test]
    fn test_sorted_by_codepoint() {
        let dir = tempfile::tempdir().expect("temp dir");
        touch(dir.path(), &["c.JPG", "b.jpg", "a.png"]);

        let images = discover(dir.path(), &LoadConfig::new()).expect("discover");
        let expected: Vec<PathBuf> = ["a.png", "b.jpg", "c.JPG"]
            .iter()
            .map(|n| dir.path().join(n))
            .collect();
        assert_eq!(images.paths(), expected.as_slice());
    }

    #[test]
    fn test_uppercase_sorts_first() {
        let dir = tempfile::tempdir().expect("temp dir");
        touch(dir.path(), &["a.png", "B.jpg", "c.jpeg", "D.PNG"]);

        let images = discover(dir.path(), &LoadConfig::new()).expect("discover");
        assert_eq!(names(&images), ["B.jpg", "D.PNG", "a.png", "c.jpeg"]);
    }

    #[test]
    fn test_all_extensions_counted() {
        let dir = tempfile::tempdir().expect("temp dir");
        touch(
            dir.path(),
            &["1.jpg", "2.jpeg", "3.png", "4.JPG", "5.PNG", "6.JPEG", "7.gif", "8.Png"],
        );

        let images = discover(dir.path(), &LoadConfig::new()).expect("discover");
        // `.JPEG` and `.Png` have no pattern of their own.
        assert_eq!(names(&images), ["1.jpg", "2.jpeg", "3.png", "4.JPG", "5.PNG"]);
    }

    #[test]
    fn test_zero_byte_files_accepted() {
        let dir = tempfile::tempdir().expect("temp dir");
        touch(dir.path(), &["x.png"]);

        let images = discover(dir.path(), &LoadConfig::new()).expect("discover");
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn test_overlapping_patterns_keep_duplicates() {
        let dir = tempfile::tempdir().expect("temp dir");
        touch(dir.path(), &["a.jpg", "b.jpg"]);

        let config = LoadConfig::new().with_patterns(vec!["*.jpg".into(), "*.jpg".into()]);
        let images = discover(dir.path(), &config).expect("discover");
        assert_eq!(names(&images), ["a.jpg", "a.jpg", "b.jpg", "b.jpg"]);

        let images = discover(dir.path(), &config.with_dedup(true)).expect("discover");
        assert_eq!(names(&images), ["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_max_images_keeps_front() {
        let dir = tempfile::tempdir().expect("temp dir");
        touch(dir.path(), &["d.jpg", "c.jpg", "b.jpg", "a.jpg"]);

        let config = LoadConfig::new().with_max_images(Some(2));
        let images = discover(dir.path(), &config).expect("discover");
        assert_eq!(names(&images), ["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_zero_max_images_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        touch(dir.path(), &["a.jpg"]);

        let config = LoadConfig::new().with_max_images(Some(0));
        assert!(matches!(discover(dir.path(), &config), Err(SourceError::ZeroMaxImages)));
    }

    #[test]
    fn test_bad_pattern() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = LoadConfig::new().with_patterns(vec!["*.jpg".into(), "photo?.png".into()]);
        assert!(matches!(
            discover(dir.path(), &config),
            Err(SourceError::InvalidPattern { .. })
        ));

        let config = LoadConfig::new().with_patterns(vec![]);
        assert!(matches!(discover(dir.path(), &config), Err(SourceError::NoPatterns)));
    }
}
