//! Rendering of scan reports.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::check::{FileReport, ScanReport};
use crate::error::Result;
use crate::scan::{ConflictBlock, Finding, StrayMarker};

/// Output format for scan reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// One line per finding, `path:line: message`.
    #[default]
    Plain,
    /// The full report as pretty JSON.
    Json,
    /// GitHub Actions workflow annotations.
    Github,
}

/// Write `report` to `out` in the given format.
///
/// # Errors
///
/// Returns an error if writing or JSON serialization fails.
pub fn render<W: Write>(report: &ScanReport, format: ReportFormat, out: &mut W) -> Result<()> {
    match format {
        ReportFormat::Plain => render_plain(report, out),
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)?;
            Ok(())
        }
        ReportFormat::Github => render_github(report, out),
    }
}

fn render_plain<W: Write>(report: &ScanReport, out: &mut W) -> Result<()> {
    for file in &report.files {
        for finding in &file.findings {
            writeln!(out, "{}", plain_line(file, finding))?;
        }
    }
    writeln!(out, "{}", summary(report))?;
    Ok(())
}

fn plain_line(file: &FileReport, finding: &Finding) -> String {
    let path = file.path.display();
    match finding {
        Finding::Conflict(block) => format!(
            "{path}:{}-{}: {}",
            block.start_line,
            block.end_line,
            conflict_message(block)
        ),
        Finding::Stray(stray) => format!("{path}:{}: {}", stray.line, stray_message(stray)),
    }
}

fn conflict_message(block: &ConflictBlock) -> String {
    let ours = block.ours_label.as_deref().unwrap_or("ours");
    let theirs = block.theirs_label.as_deref().unwrap_or("theirs");
    let mut message = format!("unresolved conflict ({ours} vs {theirs})");
    if let Some(section) = &block.section {
        message.push_str(&format!(" in section \"{section}\""));
    }
    message
}

fn stray_message(stray: &StrayMarker) -> String {
    match &stray.label {
        Some(label) => format!("stray {} marker \"{label}\"", stray.kind),
        None => format!("stray {} marker", stray.kind),
    }
}

/// One-line summary of a report.
#[must_use]
pub fn summary(report: &ScanReport) -> String {
    let mut line = if report.is_clean() {
        format!(
            "no conflict markers found in {} {}",
            report.files_scanned,
            plural(report.files_scanned, "file", "files")
        )
    } else {
        let conflicts = report.conflict_count();
        let strays = report.stray_count();
        format!(
            "found {conflicts} {} and {strays} stray {} in {} of {} {}",
            plural(conflicts, "conflict", "conflicts"),
            plural(strays, "marker", "markers"),
            report.files.len(),
            report.files_scanned,
            plural(report.files_scanned, "file", "files")
        )
    };
    if !report.skipped.is_empty() {
        line.push_str(&format!(" ({} skipped)", report.skipped.len()));
    }
    line
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

fn render_github<W: Write>(report: &ScanReport, out: &mut W) -> Result<()> {
    for file in &report.files {
        let path = escape_property(&file.path.to_string_lossy());
        for finding in &file.findings {
            match finding {
                Finding::Conflict(block) => writeln!(
                    out,
                    "::error file={path},line={},endLine={},title=Unresolved merge conflict::{}",
                    block.start_line,
                    block.end_line,
                    escape_data(&conflict_message(block))
                )?,
                Finding::Stray(stray) => writeln!(
                    out,
                    "::error file={path},line={},title=Stray conflict marker::{}",
                    stray.line,
                    escape_data(&stray_message(stray))
                )?,
            }
        }
    }
    Ok(())
}

/// Escape a workflow command message.
fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a workflow command property value.
fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}
