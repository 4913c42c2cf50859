//! Conflict block detection.
//!
//! Walks the lines of a document once, pairing marker lines into complete
//! conflict blocks. Markers that cannot be paired are reported as strays.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::marker::{MarkerKind, MarkerSet, DEFAULT_MARKER_SIZE};
use super::section::{find_headings, section_for};
use crate::error::Result;

/// A complete, unresolved conflict block. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictBlock {
    /// Line of the opening `<<<<<<<` marker.
    pub start_line: usize,

    /// Line of the `|||||||` marker, for diff3-style conflicts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_line: Option<usize>,

    /// Line of the `=======` marker.
    pub separator_line: usize,

    /// Line of the closing `>>>>>>>` marker.
    pub end_line: usize,

    /// Label after the opening marker, usually `HEAD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ours_label: Option<String>,

    /// Label after the base marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_label: Option<String>,

    /// Label after the closing marker, usually the merged branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theirs_label: Option<String>,

    /// Title of the nearest section heading above the block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl ConflictBlock {
    /// Lines of our side, as a half-open range of 1-based line numbers.
    #[must_use]
    pub fn ours_lines(&self) -> Range<usize> {
        self.start_line + 1..self.base_line.unwrap_or(self.separator_line)
    }

    /// Lines of the base section, if this is a diff3-style conflict.
    #[must_use]
    pub fn base_lines(&self) -> Option<Range<usize>> {
        self.base_line.map(|base| base + 1..self.separator_line)
    }

    /// Lines of their side.
    #[must_use]
    pub fn theirs_lines(&self) -> Range<usize> {
        self.separator_line + 1..self.end_line
    }

    /// Total lines spanned, markers included.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }

    /// Check whether a 1-based line falls inside this block.
    #[must_use]
    pub fn contains(&self, line: usize) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }
}

/// A marker line that is not part of a well-formed conflict block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrayMarker {
    /// 1-based line number.
    pub line: usize,

    /// Which marker was found.
    pub kind: MarkerKind,

    /// Label after the marker, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Something the scanner reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Finding {
    /// A complete unresolved conflict.
    Conflict(ConflictBlock),

    /// A marker outside any complete conflict.
    Stray(StrayMarker),
}

impl Finding {
    /// The first line of this finding.
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Self::Conflict(block) => block.start_line,
            Self::Stray(stray) => stray.line,
        }
    }

    /// Check if this finding is a complete conflict block.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Options controlling what counts as a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Length of a marker run.
    pub marker_size: usize,

    /// Report `=======` lines outside a conflict block.
    ///
    /// Off by default: a seven-character heading underline looks exactly
    /// like a separator.
    pub strict_separators: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            marker_size: DEFAULT_MARKER_SIZE,
            strict_separators: false,
        }
    }
}

/// A block that has been opened but not yet closed.
#[derive(Debug)]
struct OpenBlock {
    start_line: usize,
    ours_label: Option<String>,
    base: Option<(usize, Option<String>)>,
    separator_line: Option<usize>,
}

impl OpenBlock {
    fn into_strays(self) -> Vec<StrayMarker> {
        let mut strays = vec![StrayMarker {
            line: self.start_line,
            kind: MarkerKind::Ours,
            label: self.ours_label,
        }];
        if let Some((line, label)) = self.base {
            strays.push(StrayMarker {
                line,
                kind: MarkerKind::Base,
                label,
            });
        }
        if let Some(line) = self.separator_line {
            strays.push(StrayMarker {
                line,
                kind: MarkerKind::Separator,
                label: None,
            });
        }
        strays
    }
}

/// Scanner for unresolved merge conflicts in text.
#[derive(Debug, Clone)]
pub struct ConflictScanner {
    options: ScanOptions,
    markers: MarkerSet,
}

impl ConflictScanner {
    /// Create a scanner with the given options.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker size is out of range.
    pub fn new(options: ScanOptions) -> Result<Self> {
        Ok(Self {
            options,
            markers: MarkerSet::new(options.marker_size)?,
        })
    }

    /// The options this scanner was built with.
    #[must_use]
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scan text and return all findings in line order.
    #[must_use]
    pub fn scan_text(&self, text: &str) -> Vec<Finding> {
        let lines: Vec<&str> = text.lines().collect();
        let mut blocks: Vec<ConflictBlock> = Vec::new();
        let mut strays: Vec<StrayMarker> = Vec::new();
        let mut open: Option<OpenBlock> = None;
        let mut marker_lines: Vec<usize> = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            let line_no = idx + 1;
            let Some((kind, label)) = self.markers.classify(line) else {
                continue;
            };
            trace!(line = line_no, %kind, "marker line");
            let label = label.map(str::to_string);

            match kind {
                MarkerKind::Ours => {
                    if let Some(previous) = open.take() {
                        debug!(line = previous.start_line, "conflict reopened before closing");
                        strays.extend(previous.into_strays());
                    }
                    open = Some(OpenBlock {
                        start_line: line_no,
                        ours_label: label,
                        base: None,
                        separator_line: None,
                    });
                }
                MarkerKind::Base => match open.as_mut() {
                    Some(block) if block.base.is_none() && block.separator_line.is_none() => {
                        block.base = Some((line_no, label));
                    }
                    _ => strays.push(StrayMarker {
                        line: line_no,
                        kind,
                        label,
                    }),
                },
                MarkerKind::Separator => match open.take() {
                    Some(mut block) if block.separator_line.is_none() => {
                        block.separator_line = Some(line_no);
                        open = Some(block);
                    }
                    Some(ambiguous) => {
                        // The sides cannot be told apart, so nothing is paired.
                        debug!(line = line_no, "second separator in conflict");
                        strays.extend(ambiguous.into_strays());
                        strays.push(StrayMarker {
                            line: line_no,
                            kind,
                            label,
                        });
                    }
                    None => {
                        // Most likely a heading underline; it still counts as
                        // one when looking up sections.
                        if self.options.strict_separators {
                            strays.push(StrayMarker {
                                line: line_no,
                                kind,
                                label,
                            });
                        }
                        continue;
                    }
                },
                MarkerKind::Theirs => match open.take() {
                    Some(OpenBlock {
                        start_line,
                        ours_label,
                        base,
                        separator_line: Some(separator_line),
                    }) => {
                        let (base_line, base_label) = match base {
                            Some((line, label)) => (Some(line), label),
                            None => (None, None),
                        };
                        blocks.push(ConflictBlock {
                            start_line,
                            base_line,
                            separator_line,
                            end_line: line_no,
                            ours_label,
                            base_label,
                            theirs_label: label,
                            section: None,
                        });
                    }
                    Some(unfinished) => {
                        strays.extend(unfinished.into_strays());
                        strays.push(StrayMarker {
                            line: line_no,
                            kind,
                            label,
                        });
                    }
                    None => strays.push(StrayMarker {
                        line: line_no,
                        kind,
                        label,
                    }),
                },
            }
            marker_lines.push(line_no);
        }

        if let Some(unterminated) = open {
            debug!(line = unterminated.start_line, "conflict not terminated");
            strays.extend(unterminated.into_strays());
        }

        if !blocks.is_empty() {
            let headings = find_headings(&lines, |n| {
                marker_lines.binary_search(&n).is_ok() || blocks.iter().any(|b| b.contains(n))
            });
            for block in &mut blocks {
                block.section = section_for(&headings, block.start_line).map(|h| h.title.clone());
            }
        }

        let mut findings: Vec<Finding> = blocks
            .into_iter()
            .map(Finding::Conflict)
            .chain(strays.into_iter().map(Finding::Stray))
            .collect();
        findings.sort_by_key(Finding::line);
        findings
    }

    /// Scan text and return only the complete conflict blocks.
    #[must_use]
    pub fn conflicts(&self, text: &str) -> Vec<ConflictBlock> {
        self.scan_text(text)
            .into_iter()
            .filter_map(|finding| match finding {
                Finding::Conflict(block) => Some(block),
                Finding::Stray(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUPPORTED_DEVICES: &str = "\
Supported Devices
*****************

Cameras
=======

<<<<<<< HEAD
* Andor (:class:`microscope.cameras.andorsdk3.AndorSDK3`)
* Hamamatsu (:class:`microscope.cameras.hamamatsu.HamamatsuCamera`)
* Ximea (:class:`microscope.cameras.ximea.XimeaCamera`)
=======
* Andor (:class:`microscope.cameras.andorsdk3.AndorSDK3`)
* IDS (:class:`microscope.cameras.ids.IDSuEye`)
* Ximea (:class:`microscope.cameras.ximea.XimeaCamera`)
>>>>>>> ids-cameras

Deformable Mirrors
==================

* Alpao (:class:`microscope.mirror.alpao.AlpaoDeformableMirror`)
";

    fn scanner() -> ConflictScanner {
        ConflictScanner::new(ScanOptions::default()).unwrap()
    }

    #[test]
    fn test_detects_camera_section_conflict() {
        let findings = scanner().scan_text(SUPPORTED_DEVICES);
        assert_eq!(findings.len(), 1);

        let Finding::Conflict(block) = &findings[0] else {
            panic!("Expected a conflict block");
        };
        assert_eq!(block.start_line, 7);
        assert_eq!(block.separator_line, 11);
        assert_eq!(block.end_line, 15);
        assert_eq!(block.ours_label.as_deref(), Some("HEAD"));
        assert_eq!(block.theirs_label.as_deref(), Some("ids-cameras"));
        assert_eq!(block.section.as_deref(), Some("Cameras"));
        assert!(block.base_line.is_none());

        let strict = ConflictScanner::new(ScanOptions {
            strict_separators: true,
            ..ScanOptions::default()
        })
        .unwrap();
        let blocks = strict.conflicts(SUPPORTED_DEVICES);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].section.as_deref(), Some("Cameras"));
    }

    #[test]
    fn test_second_separator_makes_block_ambiguous() {
        let text = "<<<<<<< HEAD\nCameras\n=======\n* Andor\n=======\n* IDS\n>>>>>>> ids-cameras\n";
        let findings = scanner().scan_text(text);

        assert!(findings.iter().all(|f| !f.is_conflict()));
        let lines: Vec<usize> = findings.iter().map(Finding::line).collect();
        assert_eq!(lines, vec![1, 3, 5, 7]);
    }

    #[test]
    fn test_block_line_ranges() {
        let blocks = scanner().conflicts(SUPPORTED_DEVICES);
        let block = &blocks[0];
        assert_eq!(block.ours_lines(), 8..11);
        assert_eq!(block.theirs_lines(), 12..15);
        assert!(block.base_lines().is_none());
        assert_eq!(block.line_count(), 9);
        assert!(block.contains(7));
        assert!(block.contains(15));
        assert!(!block.contains(16));
    }

    #[test]
    fn test_clean_text_has_no_findings() {
        let text = "Cameras\n=======\n\n* Andor\n* IDS\n\nDeformable Mirrors\n==================\n";
        assert!(scanner().scan_text(text).is_empty());
    }

    #[test]
    fn test_heading_underline_ignored_unless_strict() {
        let text = "Cameras\n=======\n";
        assert!(scanner().scan_text(text).is_empty());

        let strict = ConflictScanner::new(ScanOptions {
            strict_separators: true,
            ..ScanOptions::default()
        })
        .unwrap();
        let findings = strict.scan_text(text);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0],
            Finding::Stray(StrayMarker {
                line: 2,
                kind: MarkerKind::Separator,
                label: None,
            })
        );
    }

    #[test]
    fn test_diff3_conflict() {
        let text = "<<<<<<< ours\na\n||||||| base\nb\n=======\nc\n>>>>>>> theirs\n";
        let blocks = scanner().conflicts(text);
        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.base_line, Some(3));
        assert_eq!(block.base_label.as_deref(), Some("base"));
        assert_eq!(block.ours_lines(), 2..3);
        assert_eq!(block.base_lines(), Some(4..5));
        assert_eq!(block.theirs_lines(), 6..7);
    }

    #[test]
    fn test_multiple_conflicts() {
        let text = "<<<<<<< A\n1\n=======\n2\n>>>>>>> B\nmid\n<<<<<<< A\n3\n=======\n4\n>>>>>>> B\n";
        let findings = scanner().scan_text(text);
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(Finding::is_conflict));
        assert_eq!(findings[0].line(), 1);
        assert_eq!(findings[1].line(), 7);
    }

    #[test]
    fn test_unterminated_block_reports_strays() {
        let text = "<<<<<<< HEAD\nours\n=======\ntheirs\n";
        let findings = scanner().scan_text(text);
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| !f.is_conflict()));
        assert_eq!(findings[0].line(), 1);
        assert_eq!(findings[1].line(), 3);
    }

    #[test]
    fn test_stray_closing_marker() {
        let findings = scanner().scan_text("text\n>>>>>>> branch\n");
        assert_eq!(
            findings,
            vec![Finding::Stray(StrayMarker {
                line: 2,
                kind: MarkerKind::Theirs,
                label: Some("branch".to_string()),
            })]
        );
    }

    #[test]
    fn test_closing_without_separator() {
        let findings = scanner().scan_text("<<<<<<< HEAD\nx\n>>>>>>> b\n");
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| !f.is_conflict()));
    }

    #[test]
    fn test_reopened_block() {
        let text = "<<<<<<< HEAD\nx\n<<<<<<< HEAD\ny\n=======\nz\n>>>>>>> b\n";
        let findings = scanner().scan_text(text);
        assert_eq!(findings.len(), 2);
        assert!(!findings[0].is_conflict());
        assert_eq!(findings[0].line(), 1);
        let Finding::Conflict(block) = &findings[1] else {
            panic!("Expected a conflict block");
        };
        assert_eq!(block.start_line, 3);
    }

    #[test]
    fn test_crlf_text() {
        let text = "<<<<<<< HEAD\r\na\r\n=======\r\nb\r\n>>>>>>> topic\r\n";
        let blocks = scanner().conflicts(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].theirs_label.as_deref(), Some("topic"));
    }

    #[test]
    fn test_invalid_marker_size() {
        let result = ConflictScanner::new(ScanOptions {
            marker_size: 0,
            ..ScanOptions::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_finding_serializes_with_type_tag() {
        let findings = scanner().scan_text(SUPPORTED_DEVICES);
        let json = serde_json::to_string(&findings[0]).unwrap();
        assert!(json.contains(r#""type":"conflict""#));
        assert!(json.contains(r#""section":"Cameras""#));
        assert!(!json.contains("base_line"));
    }
}
