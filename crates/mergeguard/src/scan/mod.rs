//! Detection of unresolved merge conflicts in text.
//!
//! - **Markers**: exact-width `<<<<<<<`, `|||||||`, `=======` and `>>>>>>>`
//!   lines, with their optional labels.
//! - **Blocks**: markers paired into complete conflicts with line ranges.
//!   Unpaired markers are reported as strays.
//! - **Sections**: each block is tagged with the nearest heading above it.
//!
//! # Example
//!
//! ```
//! use mergeguard::scan::{ConflictScanner, Finding, ScanOptions};
//!
//! let text = "Cameras\n-------\n<<<<<<< HEAD\n* Andor\n=======\n* IDS\n>>>>>>> ids-cameras\n";
//! let scanner = ConflictScanner::new(ScanOptions::default()).unwrap();
//!
//! for finding in scanner.scan_text(text) {
//!     if let Finding::Conflict(block) = finding {
//!         assert_eq!(block.start_line, 3);
//!         assert_eq!(block.end_line, 7);
//!         assert_eq!(block.section.as_deref(), Some("Cameras"));
//!     }
//! }
//! ```

mod marker;
mod scanner;
mod section;

pub use marker::{
    builtin_markers, validate_marker_size, MarkerKind, MarkerPattern, MarkerSet,
    DEFAULT_MARKER_SIZE, MAX_MARKER_SIZE,
};
pub use scanner::{ConflictBlock, ConflictScanner, Finding, ScanOptions, StrayMarker};
pub use section::{find_headings, section_for, Heading};
