//! Mechanical resolution of conflict blocks.
//!
//! Replaces each complete conflict block with one side (or both) and drops
//! the marker lines. Everything outside a block, including stray markers and
//! line endings, is copied through unchanged.

use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::scan::{ConflictBlock, ConflictScanner, ScanOptions};

/// Which side of each conflict to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Keep the side between `<<<<<<<` and the base or separator marker.
    Ours,
    /// Keep the side between `=======` and `>>>>>>>`.
    Theirs,
    /// Keep ours followed by theirs.
    Union,
    /// Keep the common ancestor (diff3-style conflicts only).
    Base,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ours => write!(f, "ours"),
            Self::Theirs => write!(f, "theirs"),
            Self::Union => write!(f, "union"),
            Self::Base => write!(f, "base"),
        }
    }
}

/// Outcome of resolving one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// The resolved file.
    pub path: PathBuf,
    /// Strategy applied.
    pub strategy: Strategy,
    /// Number of conflict blocks replaced.
    pub blocks_resolved: usize,
    /// Whether the file content changed (or would change, for a dry run).
    pub changed: bool,
    /// True if nothing was written.
    pub dry_run: bool,
}

fn kept_ranges(block: &ConflictBlock, strategy: Strategy) -> Result<Vec<Range<usize>>> {
    Ok(match strategy {
        Strategy::Ours => vec![block.ours_lines()],
        Strategy::Theirs => vec![block.theirs_lines()],
        Strategy::Union => vec![block.ours_lines(), block.theirs_lines()],
        Strategy::Base => vec![block.base_lines().ok_or(Error::MissingBase {
            line: block.start_line,
        })?],
    })
}

/// Copy 1-based `lines` from `segments` into `out`.
fn copy_lines(out: &mut String, segments: &[&str], lines: Range<usize>) -> Result<()> {
    if lines.is_empty() {
        return Ok(());
    }
    let chunk = segments
        .get(lines.start - 1..lines.end - 1)
        .ok_or_else(|| Error::internal(format!("lines {lines:?} outside text")))?;
    chunk.iter().for_each(|s| out.push_str(s));
    Ok(())
}

/// Resolve `blocks` in `text` with the given strategy.
///
/// `blocks` must come from scanning this same `text`.
///
/// # Errors
///
/// Returns [`Error::MissingBase`] for the base strategy on a block without a
/// base section, or an internal error if the blocks overlap or fall outside
/// the text.
pub fn resolve_text(text: &str, blocks: &[ConflictBlock], strategy: Strategy) -> Result<String> {
    let segments: Vec<&str> = text.split_inclusive('\n').collect();
    let mut ordered: Vec<&ConflictBlock> = blocks.iter().collect();
    ordered.sort_by_key(|b| b.start_line);

    let mut out = String::with_capacity(text.len());
    let mut next = 1;

    for block in ordered {
        if block.start_line < next {
            return Err(Error::internal(format!(
                "overlapping conflict blocks at line {}",
                block.start_line
            )));
        }
        copy_lines(&mut out, &segments, next..block.start_line)?;
        for range in kept_ranges(block, strategy)? {
            copy_lines(&mut out, &segments, range)?;
        }
        next = block.end_line + 1;
    }
    copy_lines(&mut out, &segments, next..segments.len() + 1)?;

    Ok(out)
}

fn read_text(path: &Path) -> Result<(String, blake3::Hash)> {
    let bytes = std::fs::read(path).map_err(|source| Error::file_read(path, source))?;
    let hash = blake3::hash(&bytes);
    let text = String::from_utf8(bytes).map_err(|_| Error::NotText {
        path: path.to_path_buf(),
    })?;
    Ok((text, hash))
}

/// Write `contents` to `path` only if the file still hashes to `expected`.
///
/// # Errors
///
/// Returns [`Error::FileChanged`] if the content on disk no longer matches,
/// or an I/O error if the file cannot be read or written.
pub fn write_if_unchanged(path: &Path, expected: &blake3::Hash, contents: &str) -> Result<()> {
    let bytes = std::fs::read(path).map_err(|source| Error::file_read(path, source))?;
    if blake3::hash(&bytes) != *expected {
        return Err(Error::FileChanged {
            path: path.to_path_buf(),
        });
    }
    std::fs::write(path, contents).map_err(|source| Error::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve every complete conflict block in a file.
///
/// The file is re-read just before writing; if its content changed in the
/// meantime nothing is written.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written, is not UTF-8, has
/// changed on disk, or cannot be resolved with `strategy`.
pub fn resolve_file(
    path: &Path,
    strategy: Strategy,
    options: ScanOptions,
    dry_run: bool,
) -> Result<Resolution> {
    let scanner = ConflictScanner::new(options)?;
    let (text, hash) = read_text(path)?;
    let blocks = scanner.conflicts(&text);
    debug!(path = %path.display(), blocks = blocks.len(), "conflicts to resolve");

    let mut resolution = Resolution {
        path: path.to_path_buf(),
        strategy,
        blocks_resolved: blocks.len(),
        changed: false,
        dry_run,
    };
    if blocks.is_empty() {
        return Ok(resolution);
    }

    let resolved = resolve_text(&text, &blocks, strategy)?;
    resolution.changed = resolved != text;
    if dry_run || !resolution.changed {
        return Ok(resolution);
    }

    write_if_unchanged(path, &hash, &resolved)?;
    info!(
        path = %path.display(),
        blocks = resolution.blocks_resolved,
        %strategy,
        "conflicts resolved"
    );
    Ok(resolution)
}
