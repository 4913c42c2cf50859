//! `mergeguard` - A content-integrity check for unresolved merge conflicts
//!
//! This library finds leftover conflict markers in text files, reports the
//! file and line range of each unresolved block, and can resolve blocks
//! mechanically by picking a side.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod check;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod resolve;
pub mod scan;
pub mod walk;

pub use check::{scan_paths, FileReport, ScanReport};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use report::{render, ReportFormat};
pub use resolve::{resolve_file, resolve_text, Resolution, Strategy};
pub use scan::{ConflictBlock, ConflictScanner, Finding, ScanOptions};
