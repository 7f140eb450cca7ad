//! Command handlers for the CLI.

mod backups;
mod completions;
mod list;
mod maintenance;
mod notes;

use anyhow::{Context, Result};
use std::io::Read;

use crate::cli::output::{NoteListing, Output, OutputFormat};
use crate::domain::{NoteName, Tag, parse_tags};
use crate::index::IndexEntry;

// Re-export public items
pub use backups::{handle_backups, handle_prune, handle_restore};
pub use completions::handle_completions;
pub use list::{handle_list, handle_search};
pub use maintenance::{handle_check, handle_reindex, handle_summary};
pub use notes::{handle_add, handle_rm, handle_show, handle_update};

// ===========================================
// Shared Utilities
// ===========================================

/// Parses a note name, accepting the `note://` form too.
pub(crate) fn parse_name(s: &str) -> Result<NoteName> {
    NoteName::parse_ref(s).with_context(|| format!("invalid note name '{}'", s))
}

pub(crate) fn parse_tag_args(raw: &[String]) -> Result<Vec<Tag>> {
    parse_tags(raw).with_context(|| "invalid tag: tags must contain only alphanumeric characters, hyphens, and underscores")
}

/// Resolves a content argument: `-` reads stdin, anything else is literal.
pub(crate) fn resolve_content(arg: &str, stdin: impl Read) -> Result<String> {
    if arg == "-" {
        return read_all(stdin);
    }
    Ok(arg.to_string())
}

pub(crate) fn read_all(mut input: impl Read) -> Result<String> {
    let mut buf = String::new();
    input
        .read_to_string(&mut buf)
        .with_context(|| "failed to read content from stdin")?;
    Ok(buf)
}

/// Truncates a string to a maximum display width, adding ellipsis if needed.
pub(crate) fn truncate_str(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}

/// Prints index entries as a table or JSON.
pub(crate) fn print_entries(entries: &[IndexEntry], format: OutputFormat, empty: &str) -> Result<()> {
    match format {
        OutputFormat::Human => {
            if entries.is_empty() {
                println!("{}", empty);
                return Ok(());
            }
            println!("{:<24}  {:<30}  {:>16}", "Name", "Tags", "Modified");
            println!(
                "{:<24}  {:<30}  {:>16}",
                "------------------------",
                "------------------------------",
                "----------------"
            );
            for entry in entries {
                let tags: Vec<_> = entry.tags().iter().map(Tag::as_str).collect();
                println!(
                    "{:<24}  {:<30}  {:>16}",
                    truncate_str(entry.name().as_str(), 24),
                    truncate_str(&tags.join(", "), 30),
                    entry.modified_at().format("%Y-%m-%d %H:%M")
                );
            }
            println!();
            println!("{} note(s)", entries.len());
        }
        OutputFormat::Json => {
            let listings: Vec<NoteListing> = entries.iter().map(NoteListing::from).collect();
            println!("{}", serde_json::to_string_pretty(&Output::new(listings))?);
        }
    }
    Ok(())
}
