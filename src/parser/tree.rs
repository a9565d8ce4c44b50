//! ASCII directory-tree diagrams (`├──`, `└──`, `│`, plain indentation).

use crate::core::ProposedDirectory;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Characters that make up tree drawing prefixes.
const GLYPHS: &[char] = &['│', '├', '└', '─', '|', '`', '+', '-', ' ', '\t', '\u{a0}'];

static NEW_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i:\(new\)|\*\*new\*\*|\[new\])|\bNEW\b").expect("new-marker regex is valid")
});

/// One node of [`extract_directory_tree`]'s output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub children: BTreeMap<String, TreeNode>,
}

/// One line of a tree diagram after glyphs and comments are removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Width of the drawing prefix, used to infer nesting.
    pub indent: usize,
    /// Entry name; directories keep their trailing `/`.
    pub name: String,
    pub comment: String,
    pub is_new: bool,
}

impl TreeEntry {
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }
}

/// A tree entry with its resolved path, relative to the stripped root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub entry: TreeEntry,
    /// Full path; directories end with `/`.
    pub path: String,
    /// Path of the containing directory, `None` at top level.
    pub parent: Option<String>,
}

/// Parse every tree-looking line of `text` into entries.
pub fn parse_tree_entries(text: &str) -> Vec<TreeEntry> {
    text.lines().filter_map(parse_tree_line).collect()
}

fn parse_tree_line(line: &str) -> Option<TreeEntry> {
    if line.trim().is_empty() {
        return None;
    }

    let indent = line.chars().take_while(|c| GLYPHS.contains(c)).count();
    let rest: String = line.chars().skip(indent).collect();
    if rest.starts_with('#') {
        return None;
    }

    let (name_part, comment) = split_comment(&rest);
    let is_new = NEW_MARKER.is_match(&rest);

    let mut tokens = name_part.split_whitespace();
    let name = tokens
        .next()?
        .trim_matches(|c| c == '*' || c == '`')
        .to_string();
    if name.is_empty() || name.starts_with("...") || name.starts_with('…') {
        return None;
    }

    let trailing: Vec<&str> = tokens.collect();
    let mut purpose_parts = Vec::new();
    let leftover = NEW_MARKER.replace_all(&trailing.join(" "), "").trim().to_string();
    if !leftover.is_empty() {
        purpose_parts.push(leftover);
    }
    let comment = NEW_MARKER.replace_all(comment, "").trim().to_string();
    if !comment.is_empty() {
        purpose_parts.push(comment);
    }

    Some(TreeEntry {
        indent,
        name,
        comment: purpose_parts.join(" ").trim_matches(['-', ':', ' ']).to_string(),
        is_new,
    })
}

/// Split `name  # comment`, `name ← comment` and `name <- comment`.
fn split_comment(rest: &str) -> (&str, &str) {
    [" #", "\t#", "←", "<-"]
        .iter()
        .filter_map(|marker| rest.find(marker).map(|pos| (pos, marker.len())))
        .min_by_key(|(pos, _)| *pos)
        .map(|(pos, len)| (&rest[..pos], &rest[pos + len..]))
        .unwrap_or((rest, ""))
}

/// Resolve nesting by indentation. A single top-level directory is treated
/// as the project root and dropped from every path.
pub fn resolve_entries(entries: &[TreeEntry]) -> Vec<ResolvedEntry> {
    let Some(min_indent) = entries.iter().map(|e| e.indent).min() else {
        return Vec::new();
    };

    let top_level: Vec<&TreeEntry> = entries.iter().filter(|e| e.indent == min_indent).collect();
    let strip_root = top_level.len() == 1 && top_level[0].is_dir() && entries.len() > 1;

    let mut resolved = Vec::new();
    // (indent, directory path) of currently open directories
    let mut stack: Vec<(usize, String)> = Vec::new();

    for entry in entries {
        if strip_root && entry.indent == min_indent {
            continue;
        }

        while stack
            .last()
            .is_some_and(|(indent, _)| *indent >= entry.indent)
        {
            stack.pop();
        }

        let parent = stack.last().map(|(_, path)| path.clone());
        let path = format!("{}{}", parent.as_deref().unwrap_or(""), entry.name);
        if entry.is_dir() {
            stack.push((entry.indent, path.clone()));
        }

        resolved.push(ResolvedEntry {
            entry: entry.clone(),
            path,
            parent,
        });
    }

    resolved
}

/// Directory-only nested map of a tree diagram. Files are excluded.
pub fn extract_directory_tree(text: &str) -> BTreeMap<String, TreeNode> {
    let mut tree: BTreeMap<String, TreeNode> = BTreeMap::new();

    for resolved in resolve_entries(&parse_tree_entries(text)) {
        if !resolved.entry.is_dir() {
            continue;
        }
        let segments: Vec<String> = resolved
            .path
            .trim_end_matches('/')
            .split('/')
            .map(|s| format!("{}/", s))
            .collect();

        let mut level = &mut tree;
        for segment in segments {
            level = &mut level.entry(segment).or_default().children;
        }
    }

    tree
}

/// Proposed directories described by a tree diagram, keyed by path.
pub fn proposed_directories(text: &str) -> BTreeMap<String, ProposedDirectory> {
    let mut directories: BTreeMap<String, ProposedDirectory> = BTreeMap::new();

    for resolved in resolve_entries(&parse_tree_entries(text)) {
        let entry = &resolved.entry;
        if entry.is_dir() {
            let dir = directories
                .entry(resolved.path.clone())
                .or_insert_with(|| ProposedDirectory::new(resolved.path.clone(), ""));
            if dir.purpose.is_empty() {
                dir.purpose = entry.comment.clone();
            }
            dir.is_new |= entry.is_new;
        }

        if let Some(parent) = &resolved.parent {
            let parent_dir = directories
                .entry(parent.clone())
                .or_insert_with(|| ProposedDirectory::new(parent.clone(), ""));
            let child = entry.name.trim_end_matches('/').to_string();
            let list = if entry.is_dir() {
                &mut parent_dir.subdirectories
            } else {
                &mut parent_dir.required_files
            };
            if !list.contains(&child) {
                list.push(child);
            }
        }
    }

    directories
}

/// Whether a code block looks like a directory diagram.
pub fn looks_like_tree(block: &str) -> bool {
    if block.contains('├') || block.contains('└') || block.contains('│') {
        return true;
    }
    let entries = parse_tree_entries(block);
    entries.len() >= 2 && entries.iter().any(|e| e.is_dir())
        && block.lines().filter(|l| !l.trim().is_empty()).count() == entries.len()
}
