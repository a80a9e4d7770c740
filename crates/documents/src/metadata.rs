//! Chunk metadata detectors: construction keywords and content type.

use std::sync::OnceLock;

use database::{ChunkMetadata, ContentType};
use regex::Regex;

/// Construction vocabulary matched case-insensitively against chunk text.
pub const KEYWORDS: &[&str] = &[
    "concrete",
    "steel",
    "rebar",
    "reinforcement",
    "asphalt",
    "aggregate",
    "base course",
    "subgrade",
    "compaction",
    "excavation",
    "backfill",
    "embankment",
    "formwork",
    "foundation",
    "footing",
    "slab",
    "beam",
    "column",
    "girder",
    "bridge",
    "pavement",
    "drainage",
    "culvert",
    "pipe",
    "grading",
    "masonry",
    "mortar",
    "grout",
    "weld",
    "curing",
    "compressive strength",
    "testing",
    "inspection",
    "submittal",
    "warranty",
    "traffic control",
    "erosion control",
    "schedule",
    "milestone",
    "critical path",
    "change order",
    "bid item",
    "payment",
    "measurement",
];

/// Content type patterns in priority order; the first match wins.
const CONTENT_PATTERNS: [(ContentType, &str); 5] = [
    (
        ContentType::Schedule,
        r"(?i)\b(schedule|milestone|duration|critical path|start date|finish date|completion date|working days|total float|gantt)\b",
    ),
    (
        ContentType::Specification,
        r"(?i)\b(shall|must|specifications?|conform(s|ing)? to|comply with|in accordance with|minimum|maximum)\b",
    ),
    (
        ContentType::Measurement,
        r"(?i)\b\d+(?:[.,]\d+)*\s*(psi|ksi|mpa|ft|feet|foot|in|inch|inches|mm|cm|m|yd|cy|sf|sy|lf|lbs?|kg|tons?|gal|cubic yards?|square feet|linear feet)\b",
    ),
    (
        ContentType::SectionHeader,
        r"(?m)^[ \t]*(SECTION|PART|ARTICLE|DIVISION)[ \t]+\d+",
    ),
    (
        ContentType::Reference,
        r"(?i)\b(see|refer to|reference|per|as shown on|as indicated on)\s+(the\s+)?(section|sheet|drawing|detail|article|plans?|standard|specification)",
    ),
];

fn content_patterns() -> &'static [(ContentType, Regex)] {
    static PATTERNS: OnceLock<Vec<(ContentType, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        CONTENT_PATTERNS
            .iter()
            .filter_map(|(content_type, pattern)| {
                Regex::new(pattern).ok().map(|re| (*content_type, re))
            })
            .collect()
    })
}

/// Keywords from [`KEYWORDS`] present in `text`, in list order.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    KEYWORDS
        .iter()
        .filter(|keyword| lower.contains(*keyword))
        .map(|keyword| keyword.to_string())
        .collect()
}

/// Classify text by the first matching content pattern.
pub fn detect_content_type(text: &str) -> ContentType {
    content_patterns()
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(content_type, _)| *content_type)
        .unwrap_or(ContentType::General)
}

/// Keywords and content type for one chunk.
pub fn chunk_metadata(text: &str) -> ChunkMetadata {
    ChunkMetadata {
        keywords: extract_keywords(text),
        content_type: detect_content_type(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_case_insensitive() {
        let keywords =
            extract_keywords("Concrete shall have minimum Compressive Strength of 4000 psi.");
        assert_eq!(keywords, vec!["concrete", "compressive strength"]);
        assert!(extract_keywords("Nothing relevant here.").is_empty());
    }

    #[test]
    fn test_content_type_priority() {
        assert_eq!(
            detect_content_type("Milestone 3 shall be reached within 90 working days."),
            ContentType::Schedule
        );
        assert_eq!(
            detect_content_type("Concrete shall have minimum compressive strength of 4000 psi."),
            ContentType::Specification
        );
        assert_eq!(
            detect_content_type("Place 6 inches of aggregate over the prepared grade."),
            ContentType::Measurement
        );
        assert_eq!(
            detect_content_type("SECTION 02 EARTHWORK"),
            ContentType::SectionHeader
        );
        assert_eq!(
            detect_content_type("Drainage details appear elsewhere; see sheet C-4."),
            ContentType::Reference
        );
        assert_eq!(
            detect_content_type("The contractor office is located downtown."),
            ContentType::General
        );
    }

    #[test]
    fn test_chunk_metadata_combines_detectors() {
        let meta = chunk_metadata("Backfill compaction per the specification.");
        assert_eq!(meta.content_type, ContentType::Specification);
        assert!(meta.keywords.contains(&"backfill".to_string()));
        assert!(meta.keywords.contains(&"compaction".to_string()));
    }
}
