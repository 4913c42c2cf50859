//! Section heading detection.
//!
//! Used to tell the reader *where* in a document a conflict sits, e.g.
//! "in section Cameras". Recognizes reStructuredText titles (a title line
//! followed by an adornment underline) and Markdown ATX headings.

/// A heading found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// 1-based line number of the title text.
    pub line: usize,
    /// The title text.
    pub title: String,
}

/// Characters reStructuredText accepts as section adornment.
const ADORNMENT_CHARS: &str = "=-`:'\"~^_*+#<>.";

/// Find all headings in `lines`.
///
/// `skip(line_no)` marks 1-based lines that must not take part in a heading,
/// such as conflict markers and the lines inside a conflict block.
pub fn find_headings<F>(lines: &[&str], skip: F) -> Vec<Heading>
where
    F: Fn(usize) -> bool,
{
    let mut headings = Vec::new();

    for (idx, raw) in lines.iter().enumerate() {
        let line_no = idx + 1;
        if skip(line_no) {
            continue;
        }
        let line = raw.trim_end();

        if let Some(title) = atx_title(line) {
            headings.push(Heading {
                line: line_no,
                title: title.to_string(),
            });
            continue;
        }

        let Some(next) = lines.get(idx + 1) else {
            continue;
        };
        if skip(line_no + 1) {
            continue;
        }
        if is_rst_title(line) && is_underline_for(next.trim_end(), line) {
            headings.push(Heading {
                line: line_no,
                title: line.trim().to_string(),
            });
        }
    }

    headings
}

/// The nearest heading whose title is above `line`.
#[must_use]
pub fn section_for(headings: &[Heading], line: usize) -> Option<&Heading> {
    headings.iter().take_while(|h| h.line < line).last()
}

fn atx_title(line: &str) -> Option<&str> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let title = rest.trim().trim_end_matches('#').trim_end();
    (!title.is_empty()).then_some(title)
}

fn is_rst_title(line: &str) -> bool {
    !line.trim().is_empty() && !line.starts_with([' ', '\t']) && !is_adornment(line)
}

fn is_adornment(line: &str) -> bool {
    let mut chars = line.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    ADORNMENT_CHARS.contains(first) && line.len() >= 2 && chars.all(|c| c == first)
}

fn is_underline_for(underline: &str, title: &str) -> bool {
    is_adornment(underline) && underline.chars().count() >= title.trim().chars().count()
}
