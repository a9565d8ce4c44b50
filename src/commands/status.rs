use anyhow::Result;
use colored::*;
use std::path::Path;

use crate::cli::StatusAction;
use crate::status::{ImplementationStatus, StatusEntry, StatusTracker};

pub fn handle_status(file: &Path, action: StatusAction) -> Result<()> {
    let mut tracker = StatusTracker::new(file)?;

    match action {
        StatusAction::List { skipped } => {
            let entries: Vec<&StatusEntry> = if skipped {
                tracker.get_skipped_improvements()
            } else {
                tracker.entries().values().collect()
            };
            if entries.is_empty() {
                println!("No status entries in {}", file.display());
            }
            for entry in entries {
                println!("{}", format_entry(entry));
            }
        }
        StatusAction::Set {
            id,
            status,
            category,
            reason,
        } => {
            let category = resolve_category(&tracker, &id, category);
            let entry = tracker.update_improvement_status(
                &id,
                &category,
                ImplementationStatus::from(status),
                reason.as_deref(),
            )?;
            println!("{}", format_entry(&entry));
        }
        StatusAction::Skip {
            id,
            reason,
            category,
        } => {
            let category = resolve_category(&tracker, &id, category);
            let entry = tracker.mark_as_skipped(&id, &category, &reason)?;
            println!("{}", format_entry(&entry));
        }
        StatusAction::Reason { id, reason } => {
            let entry = tracker.update_skip_reason(&id, &reason)?;
            println!("{}", format_entry(&entry));
        }
    }
    Ok(())
}

/// Explicit category, else the existing entry's, else the id.
fn resolve_category(tracker: &StatusTracker, id: &str, category: Option<String>) -> String {
    category
        .or_else(|| tracker.get_entry(id).map(|e| e.category.clone()))
        .unwrap_or_else(|| id.to_string())
}

fn format_entry(entry: &StatusEntry) -> String {
    let status = match entry.status {
        ImplementationStatus::Implemented => entry.status.to_string().green(),
        ImplementationStatus::Partial => entry.status.to_string().yellow(),
        ImplementationStatus::NotYetImplemented => entry.status.to_string().red(),
        ImplementationStatus::IntentionallySkipped => entry.status.to_string().dimmed(),
    };
    let mut line = format!("{} [{}] {}", entry.improvement_id.bold(), entry.category, status);
    if let Some(date) = &entry.completion_date {
        line.push_str(&format!(" (completed {})", date));
    }
    if let Some(reason) = &entry.skip_reason {
        line.push_str(&format!(" (reason: {})", reason));
    }
    line
}
