//! Plain-text digest of every note.

use crate::domain::Tag;
use crate::index::IndexEntry;
use std::fmt::Write;

/// Characters of content shown per note in a brief summary.
const BRIEF_CHARS: usize = 50;

/// How much of each note a summary includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SummaryStyle {
    /// One line per note.
    #[default]
    Brief,
    /// Full content and metadata per note.
    Detailed,
}

/// A note as it appears in a detailed summary.
pub(crate) enum SummaryItem<'a> {
    Brief(&'a IndexEntry),
    Detailed {
        entry: &'a IndexEntry,
        content: Result<String, String>,
    },
}

pub(crate) fn render(style: SummaryStyle, items: &[SummaryItem<'_>]) -> String {
    if items.is_empty() {
        return "No notes to summarize.".to_string();
    }

    let heading = match style {
        SummaryStyle::Brief => "Brief summary",
        SummaryStyle::Detailed => "Detailed summary",
    };
    let blocks: Vec<String> = items.iter().map(render_item).collect();
    let separator = match style {
        SummaryStyle::Brief => "\n",
        SummaryStyle::Detailed => "\n\n",
    };
    format!(
        "{} of {} notes:\n\n{}",
        heading,
        items.len(),
        blocks.join(separator)
    )
}

fn render_item(item: &SummaryItem<'_>) -> String {
    match item {
        SummaryItem::Brief(entry) => {
            let head: String = entry.preview().chars().take(BRIEF_CHARS).collect();
            let head = head.replace('\n', " ");
            if entry.preview().chars().count() > BRIEF_CHARS {
                format!("- {}: {}...", entry.name(), head)
            } else {
                format!("- {}: {}", entry.name(), head)
            }
        }
        SummaryItem::Detailed { entry, content } => {
            let mut out = String::new();
            let _ = writeln!(out, "Note: {}", entry.name());
            match content {
                Ok(content) => {
                    let _ = writeln!(out, "Content: {}", content);
                }
                Err(reason) => {
                    let _ = writeln!(out, "Content: <unavailable: {}>", reason);
                }
            }
            let _ = writeln!(out, "Tags: {}", join_tags(entry.tags()));
            let _ = writeln!(out, "Created: {}", entry.created_at().to_rfc3339());
            let _ = write!(
                out,
                "Description: {}",
                entry.description().unwrap_or("No description")
            );
            out
        }
    }
}

fn join_tags(tags: &[Tag]) -> String {
    if tags.is_empty() {
        return "-".to_string();
    }
    tags.iter().map(Tag::as_str).collect::<Vec<_>>().join(", ")
}
