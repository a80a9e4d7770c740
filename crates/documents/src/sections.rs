//! Structural header detection and page estimation.

use std::sync::OnceLock;

use regex::Regex;

/// Header patterns: keyword headers and bare numeric headings such as
/// `3.2 CONCRETE MIXES`.
const HEADER_PATTERNS: [&str; 5] = [
    r"(?im)^[ \t]*SECTION[ \t]+\d+(?:[.\- ]\d+)*\b[^\n]*",
    r"(?im)^[ \t]*PART[ \t]+\d+\b[^\n]*",
    r"(?im)^[ \t]*ARTICLE[ \t]+\d+(?:\.\d+)*\b[^\n]*",
    r"(?im)^[ \t]*DIVISION[ \t]+\d+\b[^\n]*",
    r"(?m)^[ \t]*\d+\.\d+(?:\.\d+)*[ \t]+[A-Z][A-Z0-9 ,&/\-]+[ \t]*$",
];

const MAX_TITLE_CHARS: usize = 120;

fn header_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        HEADER_PATTERNS
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect()
    })
}

/// A detected section. `start` is a char offset into the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub content: String,
    pub start: usize,
}

/// Find every structural header and split the text into sections.
///
/// Sections are ordered by offset; each runs to the next header or the end of
/// the text. Text before the first header belongs to no section.
pub fn detect_sections(text: &str) -> Vec<Section> {
    let mut headers: Vec<(usize, String)> = header_patterns()
        .iter()
        .flat_map(|re| re.find_iter(text))
        .filter_map(|m| {
            let raw = m.as_str();
            let title = raw.trim();
            if title.is_empty() {
                return None;
            }
            let leading = raw.len() - raw.trim_start().len();
            Some((m.start() + leading, truncate(title, MAX_TITLE_CHARS)))
        })
        .collect();

    headers.sort_by_key(|(byte_offset, _)| *byte_offset);
    headers.dedup_by_key(|(byte_offset, _)| *byte_offset);

    let mut sections = Vec::with_capacity(headers.len());
    for (i, (byte_start, title)) in headers.iter().enumerate() {
        let byte_end = headers
            .get(i + 1)
            .map(|(next, _)| *next)
            .unwrap_or(text.len());
        sections.push(Section {
            title: title.clone(),
            content: text[*byte_start..byte_end].to_string(),
            start: text[..*byte_start].chars().count(),
        });
    }

    sections
}

/// The section whose span contains the char offset, if any.
pub fn section_for_offset(sections: &[Section], offset: usize) -> Option<&Section> {
    sections.iter().take_while(|s| s.start <= offset).last()
}

/// Linear page estimate for a char offset: `ceil(offset / (chars / pages))`,
/// clamped to `1..=total_pages`.
pub fn estimate_page(offset: usize, total_chars: usize, total_pages: i64) -> i64 {
    if total_pages <= 1 || total_chars == 0 {
        return 1;
    }
    let chars_per_page = total_chars as f64 / total_pages as f64;
    let page = (offset as f64 / chars_per_page).ceil() as i64;
    page.clamp(1, total_pages)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}
