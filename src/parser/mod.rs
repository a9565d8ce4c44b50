pub mod markdown;
pub mod suggestions;
pub mod tree;

pub use markdown::{ChecklistItem, MarkdownParser, Section};
pub use suggestions::{
    clean_heading, extract_related_directories, parse_duration_hours, parse_explicit_duration,
    parse_priority_text, DocumentKind, ParsedDocument, SuggestionParser,
};
pub use tree::{extract_directory_tree, TreeNode};
