//! Parsers for the three suggestion documents.

use super::markdown::{MarkdownParser, Section};
use super::tree::{self, TreeNode};
use crate::core::{ChecklistEntry, Improvement, Priority, ProposedDirectory, ProposedStructure};
use crate::errors::{Error, Result};
use crate::io;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Hours assumed when an improvement carries no estimate.
pub const DEFAULT_IMPROVEMENT_HOURS: f64 = 4.0;
/// Hours assumed when a checklist item carries no estimate.
pub const DEFAULT_CHECKLIST_HOURS: f64 = 1.0;

static NUMBERED_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\d+[.)]|#\d+[.:]?)\s*").expect("numbering regex is valid"));

static LABEL_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*[-*]?\s*\**\s*([a-z][a-z ]*?)\s*\**\s*:\s*\**\s*(.*?)\s*\**\s*$")
        .expect("label regex is valid")
});

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d+(?:\.\d+)?)(?:\s*(?:-|–|to)\s*(\d+(?:\.\d+)?))?\s*(hours?|hrs?|h\b|days?|d\b|weeks?|wks?|w\b|minutes?|mins?|m\b)?",
    )
    .expect("duration regex is valid")
});

static TOKEN_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\s`'"()\[\]{},;*<>|]+"#).expect("token regex is valid"));

static DIR_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\-]*(?:/[A-Za-z0-9_.\-]+)*/$").expect("dir regex is valid")
});

/// Which of the three input documents a file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Improvements,
    Structure,
    Checklist,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::Improvements,
        DocumentKind::Structure,
        DocumentKind::Checklist,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Improvements => "improvement suggestions",
            DocumentKind::Structure => "proposed structure",
            DocumentKind::Checklist => "quick action checklist",
        }
    }
}

/// Structured result of parsing one document.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedDocument {
    Improvements(Vec<Improvement>),
    Structure(ProposedStructure),
    Checklist(Vec<ChecklistEntry>),
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SuggestionParser {
    markdown: MarkdownParser,
}

impl SuggestionParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `path` as the given document kind.
    pub fn parse_document(&self, kind: DocumentKind, path: &Path) -> Result<ParsedDocument> {
        match kind {
            DocumentKind::Improvements => self
                .parse_improvement_suggestions(path)
                .map(ParsedDocument::Improvements),
            DocumentKind::Structure => self
                .parse_proposed_structure(path)
                .map(ParsedDocument::Structure),
            DocumentKind::Checklist => self.parse_checklist(path).map(ParsedDocument::Checklist),
        }
    }

    pub fn parse_improvement_suggestions(&self, path: &Path) -> Result<Vec<Improvement>> {
        let content = io::read_file(path)?;
        self.improvements_from_str(&content).map_err(|message| Error::DocumentParse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn parse_proposed_structure(&self, path: &Path) -> Result<ProposedStructure> {
        let content = io::read_file(path)?;
        Ok(self.structure_from_str(&content))
    }

    pub fn parse_checklist(&self, path: &Path) -> Result<Vec<ChecklistEntry>> {
        let content = io::read_file(path)?;
        Ok(self.checklist_from_str(&content))
    }

    pub fn extract_directory_tree(&self, text: &str) -> BTreeMap<String, TreeNode> {
        tree::extract_directory_tree(text)
    }

    /// One improvement per `##` category heading.
    ///
    /// When any `##` heading is numbered (`## 1. Title`), only numbered
    /// headings start improvements and other `##` headings are part of the
    /// body. Otherwise every `##` heading is an improvement.
    pub fn improvements_from_str(&self, content: &str) -> std::result::Result<Vec<Improvement>, String> {
        let sections = self.markdown.sections_in_order(content);
        let numbered = sections
            .iter()
            .any(|s| s.level == 2 && NUMBERED_HEADING.is_match(&s.heading));

        let is_start = |s: &Section| s.level == 2 && (!numbered || NUMBERED_HEADING.is_match(&s.heading));

        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        for section in &sections {
            if is_start(section) {
                groups.push((section.heading.clone(), vec![section.body.clone()]));
            } else if section.level == 1 {
                // A top-level heading closes the current category
                continue;
            } else if let Some((_, bodies)) = groups.last_mut() {
                bodies.push(format!("{} {}\n{}", "#".repeat(section.level), section.heading, section.body));
            }
        }

        let mut seen = HashSet::new();
        let mut ids: HashMap<String, String> = HashMap::new();
        let mut improvements = Vec::with_capacity(groups.len());
        for (heading, bodies) in groups {
            let improvement = build_improvement(&heading, &bodies.join("\n\n"));
            if !seen.insert(improvement.category.clone()) {
                return Err(format!("duplicate improvement category '{}'", improvement.category));
            }
            // Status entries are keyed by id, so distinct categories must not share one
            if let Some(other) = ids.insert(improvement.id(), improvement.category.clone()) {
                return Err(format!(
                    "improvement categories '{}' and '{}' share the id '{}'",
                    other,
                    improvement.category,
                    improvement.id()
                ));
            }
            improvements.push(improvement);
        }

        log::debug!("Parsed {} improvements", improvements.len());
        Ok(improvements)
    }

    /// Directories from every tree-shaped code block; if there is none, from
    /// lines drawn with tree glyphs anywhere in the document.
    pub fn structure_from_str(&self, content: &str) -> ProposedStructure {
        let blocks: Vec<String> = self
            .markdown
            .extract_code_blocks(content)
            .into_iter()
            .filter(|block| tree::looks_like_tree(block))
            .collect();

        let sources = if blocks.is_empty() {
            let drawn: Vec<&str> = content
                .lines()
                .filter(|line| line.contains("├") || line.contains("└"))
                .collect();
            if drawn.is_empty() {
                Vec::new()
            } else {
                vec![drawn.join("\n")]
            }
        } else {
            blocks
        };

        let mut structure = ProposedStructure::default();
        for source in &sources {
            for (path, dir) in tree::proposed_directories(source) {
                match structure.directories.get_mut(&path) {
                    Some(existing) => merge_directory(existing, dir),
                    None => {
                        structure.directories.insert(path, dir);
                    }
                }
            }
        }

        log::debug!(
            "Parsed proposed structure with {} directories",
            structure.directories.len()
        );
        structure
    }

    /// Checklist items with the nearest priority heading and category heading.
    pub fn checklist_from_str(&self, content: &str) -> Vec<ChecklistEntry> {
        let mut entries = Vec::new();
        let mut priority = String::from("Unspecified");
        let mut category = String::from("General");
        let mut heading_hours: Option<f64> = None;
        let mut in_fence = false;

        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
                in_fence = !in_fence;
                continue;
            }
            if in_fence {
                continue;
            }

            if let Some(heading) = heading_text(line) {
                if heading.to_lowercase().contains("priority") {
                    priority = heading;
                    category = String::from("General");
                } else {
                    category = heading;
                }
                heading_hours = parse_explicit_duration(line);
                continue;
            }

            if let Some(item) = self.markdown.parse_checklist_items(line).into_iter().next() {
                let estimated_hours = parse_explicit_duration(&item.text)
                    .or(heading_hours)
                    .unwrap_or(DEFAULT_CHECKLIST_HOURS);
                entries.push(ChecklistEntry {
                    text: item.text,
                    checked: item.checked,
                    priority: priority.clone(),
                    category: category.clone(),
                    estimated_hours,
                    line_number: index + 1,
                });
            }
        }

        entries
    }
}

fn heading_text(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &trimmed[hashes..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim().trim_end_matches('#').trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn merge_directory(existing: &mut ProposedDirectory, other: ProposedDirectory) {
    for sub in other.subdirectories {
        if !existing.subdirectories.contains(&sub) {
            existing.subdirectories.push(sub);
        }
    }
    for file in other.required_files {
        if !existing.required_files.contains(&file) {
            existing.required_files.push(file);
        }
    }
    existing.is_new |= other.is_new;
    if existing.purpose.is_empty() {
        existing.purpose = other.purpose;
    }
}

fn build_improvement(heading: &str, body: &str) -> Improvement {
    let title = clean_heading(heading);
    let labels = labels(body);

    let category = labels
        .get("category")
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| title.clone());

    let priority = labels
        .get("priority")
        .and_then(|v| parse_priority_text(v))
        .or_else(|| priority_subsection(body))
        .or_else(|| priority_keyword(body))
        .unwrap_or(Priority::Medium);

    let estimated_hours = labels
        .iter()
        .filter(|(key, _)| is_estimate_label(key))
        .find_map(|(_, value)| parse_duration_hours(value))
        .unwrap_or(DEFAULT_IMPROVEMENT_HOURS);

    let description = description_of(body);

    Improvement {
        category,
        description: if description.is_empty() { title.clone() } else { description },
        title,
        priority,
        estimated_hours,
        related_directories: extract_related_directories(body),
    }
}

/// Strip numbering, bold markers and backticks from a heading.
pub fn clean_heading(heading: &str) -> String {
    let without_number = NUMBERED_HEADING.replace(heading, "");
    let cleaned = without_number.replace("**", "").replace('`', "");
    let cleaned = cleaned.trim().trim_end_matches(':').trim();
    if cleaned.is_empty() {
        heading.trim().to_string()
    } else {
        cleaned.to_string()
    }
}

/// `**Label:** value` lines, lowercase label to value.
fn labels(body: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for line in body.lines() {
        if let Some(caps) = LABEL_LINE.captures(line) {
            let key = caps[1].trim().to_lowercase();
            if key.split_whitespace().count() <= 3 {
                map.entry(key).or_insert_with(|| caps[2].trim().to_string());
            }
        }
    }
    map
}

fn is_estimate_label(key: &str) -> bool {
    key.contains("estimat") || key.contains("effort") || key == "time" || key.contains("hours")
}

fn is_metadata_line(line: &str) -> bool {
    LABEL_LINE.captures(line).is_some_and(|caps| {
        let key = caps[1].trim().to_lowercase();
        key == "priority" || key == "category" || is_estimate_label(&key)
    })
}

fn description_of(body: &str) -> String {
    body.lines()
        .filter(|line| !is_metadata_line(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Pure: map free text such as "High", "P1" or "critical" to a tier.
pub fn parse_priority_text(text: &str) -> Option<Priority> {
    let lowered = text.to_lowercase();
    let first = lowered
        .split(|c: char| !c.is_alphanumeric())
        .find(|w| !w.is_empty())?;
    match first {
        "high" | "critical" | "urgent" | "p0" | "p1" | "1" => Some(Priority::High),
        "medium" | "moderate" | "normal" | "p2" | "2" => Some(Priority::Medium),
        "low" | "minor" | "p3" | "3" => Some(Priority::Low),
        _ => None,
    }
}

/// First line under a `Priority` sub-heading inside the body.
fn priority_subsection(body: &str) -> Option<Priority> {
    let mut lines = body.lines();
    while let Some(line) = lines.next() {
        if heading_text(line).is_some_and(|h| h.eq_ignore_ascii_case("priority")) {
            return lines
                .find(|l| !l.trim().is_empty())
                .and_then(priority_keyword_or_text);
        }
    }
    None
}

fn priority_keyword_or_text(text: &str) -> Option<Priority> {
    parse_priority_text(text).or_else(|| priority_keyword(text))
}

/// Priority phrases anywhere in free text.
fn priority_keyword(text: &str) -> Option<Priority> {
    let lowered = text.to_lowercase();
    if lowered.contains("critical") || lowered.contains("high priority") {
        Some(Priority::High)
    } else if lowered.contains("medium priority") {
        Some(Priority::Medium)
    } else if lowered.contains("low priority") {
        Some(Priority::Low)
    } else {
        None
    }
}

/// Pure: first duration with an explicit unit, converted to hours. Ranges
/// use their midpoint, days count 8 hours and weeks 40.
pub fn parse_explicit_duration(text: &str) -> Option<f64> {
    DURATION.captures_iter(text).find_map(|caps| {
        let low = caps[1].parse::<f64>().ok()?;
        let high = caps
            .get(2)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(low);
        let unit = caps.get(3)?.as_str().to_lowercase();
        let value = (low + high) / 2.0;

        let hours = if unit.starts_with('d') {
            value * 8.0
        } else if unit.starts_with('w') {
            value * 40.0
        } else if unit.starts_with('m') {
            value / 60.0
        } else {
            value
        };
        (hours > 0.0 && hours.is_finite()).then_some(hours)
    })
}

/// Like [`parse_explicit_duration`], but a bare number counts as hours.
pub fn parse_duration_hours(text: &str) -> Option<f64> {
    parse_explicit_duration(text).or_else(|| {
        DURATION
            .captures_iter(text)
            .filter_map(|caps| {
                let low = caps[1].parse::<f64>().ok()?;
                let high = caps
                    .get(2)
                    .and_then(|m| m.as_str().parse::<f64>().ok())
                    .unwrap_or(low);
                Some((low + high) / 2.0)
            })
            .find(|hours| *hours > 0.0 && hours.is_finite())
    })
}

/// Path-like tokens ending in `/`, deduplicated in order of appearance.
pub fn extract_related_directories(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dirs = Vec::new();
    for raw in TOKEN_SPLIT.split(body) {
        let token = raw.trim_end_matches(['.', ':', '!', '?']);
        let token = token.strip_prefix("./").unwrap_or(token);
        if token.len() < 2 || token.contains("//") || !DIR_TOKEN.is_match(token) {
            continue;
        }
        if seen.insert(token.to_string()) {
            dirs.push(token.to_string());
        }
    }
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    const SUGGESTIONS: &str = indoc! {"
        # SDLC Improvement Suggestions

        ## 1. **Clean Up & Organize lib Directory**

        **Priority:** High
        **Estimated Effort:** 2-4 hours

        Move vendored packages out of `lib/` and pin them in `requirements.txt`.

        ## Issue
        The `lib/` folder holds copies of `numpy/`.

        ## 2. Add Documentation Layer

        **Category:** Documentation
        **Priority:** Medium
        **Estimated Time:** 1 day

        Create docs/api/ and docs/guides/ with an index page.

        ## 3. Logging
        This is a low priority task.
    "};

    #[test]
    fn test_improvements_from_numbered_headings() {
        let improvements = SuggestionParser::new()
            .improvements_from_str(SUGGESTIONS)
            .unwrap();
        assert_eq!(improvements.len(), 3);

        let first = &improvements[0];
        assert_eq!(first.category, "Clean Up & Organize lib Directory");
        assert_eq!(first.title, "Clean Up & Organize lib Directory");
        assert_eq!(first.priority, Priority::High);
        assert_eq!(first.estimated_hours, 3.0);
        assert_eq!(first.related_directories, vec!["lib/", "numpy/"]);
        assert!(first.description.contains("requirements.txt"));
        assert!(first.description.contains("## Issue"));
        assert!(!first.description.contains("**Priority:**"));

        let second = &improvements[1];
        assert_eq!(second.category, "Documentation");
        assert_eq!(second.title, "Add Documentation Layer");
        assert_eq!(second.priority, Priority::Medium);
        assert_eq!(second.estimated_hours, 8.0);
        assert_eq!(second.related_directories, vec!["docs/api/", "docs/guides/"]);

        let third = &improvements[2];
        assert_eq!(third.priority, Priority::Low);
        assert_eq!(third.estimated_hours, DEFAULT_IMPROVEMENT_HOURS);
        assert!(third.related_directories.is_empty());
    }

    #[test]
    fn test_priority_subsection() {
        let doc = "## 1. **Examples**\n\n## Recommendation\nCreate `examples/`\n\n## Priority\nHigh priority task.\n";
        let improvements = SuggestionParser::new().improvements_from_str(doc).unwrap();
        assert_eq!(improvements.len(), 1);
        assert_eq!(improvements[0].priority, Priority::High);
        assert_eq!(improvements[0].related_directories, vec!["examples/"]);
    }

    #[test]
    fn test_duplicate_categories_rejected() {
        let doc = "## 1. Testing\nbody\n## 2. Testing\nbody\n";
        let err = SuggestionParser::new().improvements_from_str(doc).unwrap_err();
        assert!(err.contains("Testing"));
    }

    #[test]
    fn test_categories_with_same_id_rejected() {
        let doc = "## 1. CI/CD\nbody\n## 2. CI-CD\nbody\n";
        let err = SuggestionParser::new().improvements_from_str(doc).unwrap_err();
        assert!(err.contains("CI/CD"));
        assert!(err.contains("CI-CD"));
        assert!(err.contains("'ci-cd'"));
    }

    #[test]
    fn test_unnumbered_sections_are_improvements() {
        let doc = "## Testing\n**Priority:** Low\n\n## Tooling\nUse `scripts/`\n";
        let improvements = SuggestionParser::new().improvements_from_str(doc).unwrap();
        assert_eq!(improvements.len(), 2);
        assert_eq!(improvements[0].priority, Priority::Low);
        assert_eq!(improvements[1].related_directories, vec!["scripts/"]);
    }

    #[test]
    fn test_parse_duration_hours() {
        assert_eq!(parse_duration_hours("2-4 hours"), Some(3.0));
        assert_eq!(parse_duration_hours("(30 min)"), Some(0.5));
        assert_eq!(parse_duration_hours("2 days"), Some(16.0));
        assert_eq!(parse_duration_hours("1 week"), Some(40.0));
        assert_eq!(parse_duration_hours("6"), Some(6.0));
        assert_eq!(parse_duration_hours("Step 1: do it in 2h"), Some(2.0));
        assert_eq!(parse_duration_hours("no numbers"), None);
        assert_eq!(parse_explicit_duration("Priority 1: Critical"), None);
        assert_eq!(parse_duration_hours("3 to 5"), Some(4.0));
    }

    #[test]
    fn test_extract_related_directories_skips_urls_and_files() {
        let body = "See https://example.com/docs/ and ./src/utils/, plus `README.md`, /usr/lib/ and src/utils/.";
        assert_eq!(extract_related_directories(body), vec!["src/utils/"]);
        assert!(extract_related_directories("CI/CD and/or things").is_empty());
    }

    #[test]
    fn test_structure_from_code_block() {
        let doc = indoc! {"
            # Proposed Structure

            ```
            project/
            ├── docs/        # Documentation (new)
            │   └── api/
            ├── tests/
            │   ├── unit/
            │   └── conftest.py
            └── setup.py
            ```

            ```bash
            pip install -e .
            ```
        "};
        let structure = SuggestionParser::new().structure_from_str(doc);
        let keys: Vec<_> = structure.directories.keys().cloned().collect();
        assert_eq!(keys, vec!["docs/", "docs/api/", "tests/", "tests/unit/"]);
        assert!(structure.directories["docs/"].is_new);
        assert_eq!(structure.directories["tests/"].required_files, vec!["conftest.py"]);
        assert!(structure.improvements.is_empty());
    }

    #[test]
    fn test_checklist_context() {
        let doc = indoc! {"
            # Quick Action Checklist

            ## Priority 1: Critical (This Week)

            ### Clean up lib/ (2 hours)
            - [ ] Back up lib/
            - [x] Remove vendored packages (30 min)

            ## Priority 2: Important

            - [ ] Write docs index
        "};
        let items = SuggestionParser::new().checklist_from_str(doc);
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].priority, "Priority 1: Critical (This Week)");
        assert_eq!(items[0].category, "Clean up lib/ (2 hours)");
        assert_eq!(items[0].estimated_hours, 2.0);
        assert!(!items[0].checked);
        assert_eq!(items[0].line_number, 6);

        assert_eq!(items[1].estimated_hours, 0.5);
        assert!(items[1].checked);

        assert_eq!(items[2].priority, "Priority 2: Important");
        assert_eq!(items[2].category, "General");
        assert_eq!(items[2].estimated_hours, DEFAULT_CHECKLIST_HOURS);
    }

    #[test]
    fn test_parse_document_dispatch_and_missing_file() {
        let parser = SuggestionParser::new();
        let err = parser
            .parse_document(DocumentKind::Checklist, Path::new("/no/such/file.md"))
            .unwrap_err();
        assert!(matches!(err, Error::FileSystem { .. }));

        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "- [ ] one\n").unwrap();
        match parser.parse_document(DocumentKind::Checklist, temp.path()).unwrap() {
            ParsedDocument::Checklist(items) => assert_eq!(items.len(), 1),
            other => panic!("unexpected document {:?}", other),
        }
    }
}
