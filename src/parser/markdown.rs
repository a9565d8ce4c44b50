use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+?)(?:\s+#+)?\s*$").expect("header regex is valid"));

static CHECKBOX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*-\s+\[([ xX])\]\s*(.*)$").expect("checkbox regex is valid"));

/// A markdown header with the body that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: String,
    pub level: usize,
    pub body: String,
    /// 1-based line of the header.
    pub line_number: usize,
}

/// A `- [ ]` / `- [x]` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    pub checked: bool,
    pub line_number: usize,
}

/// Stateless markdown extraction helpers.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownParser;

impl MarkdownParser {
    pub fn new() -> Self {
        Self
    }

    /// Header text to trimmed body. A repeated header keeps its last body.
    pub fn extract_sections(&self, content: &str) -> BTreeMap<String, String> {
        self.sections_in_order(content)
            .into_iter()
            .map(|section| (section.heading, section.body))
            .collect()
    }

    /// Every header in document order, including duplicates.
    ///
    /// A section's body runs until the next header of any level. Lines inside
    /// fenced code blocks are never treated as headers.
    pub fn sections_in_order(&self, content: &str) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut current: Option<(Section, Vec<&str>)> = None;
        let mut fence: Option<&str> = None;

        for (index, line) in content.lines().enumerate() {
            if let Some(marker) = fence_marker(line) {
                fence = match fence {
                    Some(open) if open == marker => None,
                    Some(open) => Some(open),
                    None => Some(marker),
                };
            } else if fence.is_none() {
                if let Some(caps) = HEADER.captures(line) {
                    if let Some((section, body)) = current.take() {
                        sections.push(finish_section(section, &body));
                    }
                    current = Some((
                        Section {
                            heading: caps[2].trim().to_string(),
                            level: caps[1].len(),
                            body: String::new(),
                            line_number: index + 1,
                        },
                        Vec::new(),
                    ));
                    continue;
                }
            }

            if let Some((_, body)) = current.as_mut() {
                body.push(line);
            }
        }

        if let Some((section, body)) = current.take() {
            sections.push(finish_section(section, &body));
        }
        sections
    }

    /// Bodies of closed fenced blocks, trimmed, in order. The language tag
    /// is dropped and an unterminated fence yields nothing.
    pub fn extract_code_blocks(&self, content: &str) -> Vec<String> {
        let mut blocks = Vec::new();
        let mut open: Option<(&str, Vec<&str>)> = None;

        for line in content.lines() {
            let marker = fence_marker(line);
            match open.take() {
                Some((opened, body)) if marker == Some(opened) => {
                    blocks.push(body.join("\n").trim().to_string());
                }
                Some((opened, mut body)) => {
                    body.push(line);
                    open = Some((opened, body));
                }
                None => open = marker.map(|m| (m, Vec::new())),
            }
        }

        blocks
    }

    /// Checkbox lines with 1-based line numbers; continuation lines are ignored.
    pub fn parse_checklist_items(&self, content: &str) -> Vec<ChecklistItem> {
        content
            .lines()
            .enumerate()
            .filter_map(|(index, line)| {
                CHECKBOX.captures(line).map(|caps| ChecklistItem {
                    text: caps[2].trim().to_string(),
                    checked: !caps[1].trim().is_empty(),
                    line_number: index + 1,
                })
            })
            .collect()
    }
}

fn finish_section(mut section: Section, body: &[&str]) -> Section {
    section.body = body.join("\n").trim().to_string();
    section
}

/// "```" or "~~~" when the trimmed line opens or closes a fence.
fn fence_marker(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("```") {
        Some("```")
    } else if trimmed.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nested_headers_are_separate_sections() {
        let content = indoc! {"
            # Main Section
            Main content

            ## Subsection
            Subsection content

            ### Sub-subsection
            Deep content
        "};
        let sections = MarkdownParser::new().extract_sections(content);
        assert_eq!(sections.len(), 3);
        assert_eq!(sections["Main Section"], "Main content");
        assert_eq!(sections["Subsection"], "Subsection content");
        assert_eq!(sections["Sub-subsection"], "Deep content");
    }

    #[test]
    fn test_section_preserves_inner_indentation_and_code() {
        let content = "# Section\nLine 1\n    Indented line\n\n```python\n# not a header\n```\n\n# Next\nx";
        let sections = MarkdownParser::new().extract_sections(content);
        assert_eq!(sections.len(), 2);
        assert!(sections["Section"].contains("    Indented line"));
        assert!(sections["Section"].contains("```python"));
        assert!(sections["Section"].contains("# not a header"));
    }

    #[test]
    fn test_repeated_header_last_wins() {
        let content = "# Notes\nfirst\n# Notes\nsecond";
        let parser = MarkdownParser::new();
        assert_eq!(parser.extract_sections(content)["Notes"], "second");
        assert_eq!(parser.sections_in_order(content).len(), 2);
    }

    #[test]
    fn test_closing_hashes_need_leading_space() {
        let content = "## C#\nsharp\n## F# ##\nfunctional\n## Closed ##\nbody";
        let sections = MarkdownParser::new().extract_sections(content);
        let headings: Vec<&str> = sections.keys().map(|k| k.as_str()).collect();
        assert_eq!(headings, vec!["C#", "Closed", "F#"]);
        assert_eq!(sections["C#"], "sharp");
    }

    #[test]
    fn test_no_headers() {
        let parser = MarkdownParser::new();
        assert!(parser.extract_sections("").is_empty());
        assert!(parser.extract_sections("plain text\nmore").is_empty());
    }

    #[test]
    fn test_code_blocks() {
        let content = "```python\nprint('hello')\n```\n\ntext\n\n```\n```\n```js\nunterminated";
        let blocks = MarkdownParser::new().extract_code_blocks(content);
        assert_eq!(blocks, vec!["print('hello')".to_string(), String::new()]);
    }

    #[test]
    fn test_checklist_items() {
        let content = indoc! {"
            Some text before
            - [ ] Task 1
              continuation line
            - [x] Task 2
                - [X] Indented task
        "};
        let items = MarkdownParser::new().parse_checklist_items(content);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].text, "Task 1");
        assert!(!items[0].checked);
        assert_eq!(items[0].line_number, 2);
        assert!(items[1].checked);
        assert_eq!(items[1].line_number, 4);
        assert_eq!(items[2].text, "Indented task");
        assert!(items[2].checked);
    }
}
