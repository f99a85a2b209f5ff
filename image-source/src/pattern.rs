use std::fmt;
use std::str::FromStr;
use crate::error::Result;
use crate::SourceError;

/// A `*.<ext>` file name glob.
///
/// Matching is case-sensitive, so `*.jpg` and `*.JPG` are distinct patterns. Like a shell glob,
/// the leading `*` never matches a name starting with `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePattern {
    suffix: String,
}

impl ImagePattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason| SourceError::InvalidPattern {
            pattern: pattern.to_owned(),
            reason,
        };

        let ext = pattern
            .strip_prefix("*.")
            .ok_or_else(|| invalid("expected the form '*.<ext>'"))?;

        if ext.is_empty() {
            return Err(invalid("extension is empty"));
        }
        if ext.contains(['*', '?', '[', '/', '\\']) {
            return Err(invalid("extension may not contain wildcards or separators"));
        }

        Ok(Self {
            suffix: format!(".{ext}"),
        })
    }

    /// The extension without the leading dot.
    pub fn extension(&self) -> &str {
        &self.suffix[1..]
    }

    pub fn matches(&self, file_name: &str) -> bool {
        !file_name.starts_with('.') && file_name.ends_with(&self.suffix)
    }
}

impl FromStr for ImagePattern {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ImagePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*{}", self.suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::ImagePattern;

    #[test]
    fn test_match_is_case_sensitive() {
        let lower = ImagePattern::parse("*.jpg").expect("valid pattern");
        let upper = ImagePattern::parse("*.JPG").expect("valid pattern");

        assert!(lower.matches("frame_001.jpg"));
        assert!(!lower.matches("frame_001.JPG"));
        assert!(upper.matches("frame_001.JPG"));
        assert!(!upper.matches("frame_001.jpeg"));
    }

    #[test]
    fn test_hidden_files_skipped() {
        let pattern = ImagePattern::parse("*.png").expect("valid pattern");
        assert!(!pattern.matches(".thumb.png"));
        assert!(!pattern.matches(".png"));
        // Only the dot is required in front of the extension, same as a shell glob.
        assert!(pattern.matches("x.png"));
        assert!(!pattern.matches("png"));
    }

    #[test]
    fn test_rejects_other_globs() {
        for bad in ["jpg", "*.", "**.jpg", "img_*.jpg", "*.j?g", "*.a/b", ""] {
            assert!(ImagePattern::parse(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_display() {
        let pattern: ImagePattern = "*.jpeg".parse().expect("valid pattern");
        assert_eq!(pattern.to_string(), "*.jpeg");
        assert_eq!(pattern.extension(), "jpeg");
    }
}
