//! Conflict marker patterns.
//!
//! Git delimits an unresolved conflict with runs of a single character at the
//! start of a line:
//!
//! ```text
//! <<<<<<< HEAD
//! our side
//! ||||||| merged common ancestors
//! base (diff3 style only)
//! =======
//! their side
//! >>>>>>> topic-branch
//! ```
//!
//! The run length is `conflict-marker-size` (7 by default). A run must be
//! exactly that long and be followed by end of line or whitespace, so longer
//! runs like reStructuredText heading underlines are not mistaken for markers.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Git's default `conflict-marker-size`.
pub const DEFAULT_MARKER_SIZE: usize = 7;

/// Largest accepted marker size.
pub const MAX_MARKER_SIZE: usize = 64;

/// The role of a conflict marker line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Opens a block and introduces our side (`<<<<<<<`).
    Ours,
    /// Introduces the common ancestor in diff3 style (`|||||||`).
    Base,
    /// Separates the two sides (`=======`).
    Separator,
    /// Closes a block after their side (`>>>>>>>`).
    Theirs,
}

impl MarkerKind {
    /// All marker kinds, in block order.
    pub const ALL: [MarkerKind; 4] = [Self::Ours, Self::Base, Self::Separator, Self::Theirs];

    /// The character repeated to form this marker.
    #[must_use]
    pub fn marker_char(self) -> char {
        match self {
            Self::Ours => '<',
            Self::Base => '|',
            Self::Separator => '=',
            Self::Theirs => '>',
        }
    }

    /// The literal marker of the given size, e.g. `<<<<<<<`.
    #[must_use]
    pub fn literal(self, size: usize) -> String {
        self.marker_char().to_string().repeat(size)
    }
}

impl std::fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ours => write!(f, "ours"),
            Self::Base => write!(f, "base"),
            Self::Separator => write!(f, "separator"),
            Self::Theirs => write!(f, "theirs"),
        }
    }
}

/// Check that a marker size is usable.
///
/// # Errors
///
/// Returns [`Error::ConfigValidation`] if `size` is zero or larger than
/// [`MAX_MARKER_SIZE`].
pub fn validate_marker_size(size: usize) -> Result<()> {
    if size == 0 || size > MAX_MARKER_SIZE {
        return Err(Error::config(format!(
            "marker_size must be between 1 and {MAX_MARKER_SIZE}, got {size}"
        )));
    }
    Ok(())
}

/// A compiled pattern recognizing one kind of marker line.
#[derive(Debug, Clone)]
pub struct MarkerPattern {
    /// Which marker this pattern recognizes.
    pub kind: MarkerKind,

    regex: Regex,
}

impl MarkerPattern {
    /// Compile the pattern for `kind` at the given marker size.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker size is out of range.
    pub fn new(kind: MarkerKind, size: usize) -> Result<Self> {
        validate_marker_size(size)?;
        let marker = regex::escape(&kind.marker_char().to_string());
        let regex = Regex::new(&format!(r"^{marker}{{{size}}}(?:[ \t](.*))?$"))?;
        Ok(Self { kind, regex })
    }

    /// Check whether `line` is a marker of this kind.
    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        self.regex.is_match(strip_cr(line))
    }

    /// Parse `line` as a marker of this kind.
    ///
    /// Returns `None` if the line is not a marker, `Some(None)` for a bare
    /// marker and `Some(Some(label))` when a label follows it.
    #[must_use]
    pub fn parse<'a>(&self, line: &'a str) -> Option<Option<&'a str>> {
        let caps = self.regex.captures(strip_cr(line))?;
        let label = caps
            .get(1)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty());
        Some(label)
    }
}

/// Compile the patterns for all four marker kinds.
///
/// # Errors
///
/// Returns an error if the marker size is out of range.
pub fn builtin_markers(size: usize) -> Result<Vec<MarkerPattern>> {
    MarkerKind::ALL
        .iter()
        .map(|&kind| MarkerPattern::new(kind, size))
        .collect()
}

/// The full set of marker patterns for one marker size.
#[derive(Debug, Clone)]
pub struct MarkerSet {
    size: usize,
    patterns: Vec<MarkerPattern>,
}

impl MarkerSet {
    /// Build a marker set for the given size.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker size is out of range.
    pub fn new(size: usize) -> Result<Self> {
        Ok(Self {
            size,
            patterns: builtin_markers(size)?,
        })
    }

    /// The marker size in use.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Classify a line, returning its marker kind and label if it is one.
    #[must_use]
    pub fn classify<'a>(&self, line: &'a str) -> Option<(MarkerKind, Option<&'a str>)> {
        // Cheap reject: nearly every line fails here.
        let first = line.chars().next()?;
        self.patterns
            .iter()
            .filter(|p| p.kind.marker_char() == first)
            .find_map(|p| p.parse(line).map(|label| (p.kind, label)))
    }
}

fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> MarkerSet {
        MarkerSet::new(DEFAULT_MARKER_SIZE).unwrap()
    }

    #[test]
    fn test_marker_kind_literal() {
        assert_eq!(MarkerKind::Ours.literal(7), "<<<<<<<");
        assert_eq!(MarkerKind::Base.literal(3), "|||");
        assert_eq!(MarkerKind::Separator.literal(7), "=======");
        assert_eq!(MarkerKind::Theirs.literal(7), ">>>>>>>");
    }

    #[test]
    fn test_marker_kind_display() {
        assert_eq!(MarkerKind::Ours.to_string(), "ours");
        assert_eq!(MarkerKind::Separator.to_string(), "separator");
    }

    #[test]
    fn test_classify_labelled_markers() {
        let set = set();
        assert_eq!(
            set.classify("<<<<<<< HEAD"),
            Some((MarkerKind::Ours, Some("HEAD")))
        );
        assert_eq!(
            set.classify(">>>>>>> ids-cameras"),
            Some((MarkerKind::Theirs, Some("ids-cameras")))
        );
        assert_eq!(
            set.classify("||||||| merged common ancestors"),
            Some((MarkerKind::Base, Some("merged common ancestors")))
        );
    }

    #[test]
    fn test_classify_bare_markers() {
        let set = set();
        assert_eq!(set.classify("======="), Some((MarkerKind::Separator, None)));
        assert_eq!(set.classify("<<<<<<<"), Some((MarkerKind::Ours, None)));
        assert_eq!(set.classify("<<<<<<<   "), Some((MarkerKind::Ours, None)));
    }

    #[test]
    fn test_classify_crlf() {
        let set = set();
        assert_eq!(
            set.classify("<<<<<<< HEAD\r"),
            Some((MarkerKind::Ours, Some("HEAD")))
        );
        assert_eq!(set.classify("=======\r"), Some((MarkerKind::Separator, None)));
    }

    #[test]
    fn test_wrong_length_is_not_a_marker() {
        let set = set();
        // reStructuredText underlines are usually longer or shorter than 7
        assert_eq!(set.classify("=================="), None);
        assert_eq!(set.classify("======"), None);
        assert_eq!(set.classify("<<<<<<<<"), None);
        assert_eq!(set.classify(">>>>>>>>> x"), None);
    }

    #[test]
    fn test_marker_must_start_line() {
        let set = set();
        assert_eq!(set.classify("  <<<<<<< HEAD"), None);
        assert_eq!(set.classify("x ======="), None);
        assert_eq!(set.classify(""), None);
    }

    #[test]
    fn test_marker_needs_whitespace_before_label() {
        let set = set();
        assert_eq!(set.classify("<<<<<<<HEAD"), None);
        assert_eq!(
            set.classify("<<<<<<<\tHEAD"),
            Some((MarkerKind::Ours, Some("HEAD")))
        );
    }

    #[test]
    fn test_custom_marker_size() {
        let set = MarkerSet::new(10).unwrap();
        assert_eq!(set.size(), 10);
        assert_eq!(set.classify("<<<<<<< HEAD"), None);
        assert_eq!(
            set.classify("<<<<<<<<<< HEAD"),
            Some((MarkerKind::Ours, Some("HEAD")))
        );
    }

    #[test]
    fn test_invalid_marker_size() {
        assert!(MarkerSet::new(0).is_err());
        assert!(MarkerSet::new(MAX_MARKER_SIZE + 1).is_err());
        assert!(validate_marker_size(MAX_MARKER_SIZE).is_ok());
    }

    #[test]
    fn test_pattern_matches() {
        let pattern = MarkerPattern::new(MarkerKind::Separator, 7).unwrap();
        assert!(pattern.matches("======="));
        assert!(!pattern.matches("<<<<<<<"));
        assert_eq!(pattern.kind, MarkerKind::Separator);
    }

    #[test]
    fn test_builtin_markers_cover_all_kinds() {
        let markers = builtin_markers(7).unwrap();
        assert_eq!(markers.len(), 4);
        for kind in MarkerKind::ALL {
            assert!(markers.iter().any(|m| m.kind == kind));
        }
    }
}
