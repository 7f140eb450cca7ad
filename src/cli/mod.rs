//! CLI command definitions and handlers

pub mod config;
pub mod handlers;
pub mod logging;
pub mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::index::SearchField;
use crate::store::SummaryStyle;
use output::OutputFormat;

/// pin - durable notes with backups and integrity checks
#[derive(Parser, Debug)]
#[command(name = "pin", version, about, long_about = None)]
pub struct Cli {
    /// Storage root (overrides config file)
    #[arg(short = 'd', long, global = true)]
    pub dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new note
    Add(AddArgs),

    /// Show a note's contents
    Show(ShowArgs),

    /// Change a note's content, tags, or description
    Update(UpdateArgs),

    /// Delete a note (a backup is kept)
    Rm(RmArgs),

    /// List all notes
    Ls(ListArgs),

    /// Search notes by tag and text
    Search(SearchArgs),

    /// Restore a note from a backup
    Restore(RestoreArgs),

    /// List a note's backups
    Backups(BackupsArgs),

    /// Delete old backups of a note
    Prune(PruneArgs),

    /// Check the index against the note files
    Check(CheckArgs),

    /// Rebuild the index from the note files
    Reindex,

    /// Summarize all notes
    Summary(SummaryArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `add` command
#[derive(Parser, Debug)]
pub struct AddArgs {
    /// Note name (letters, digits, '-' and '_')
    pub name: String,

    /// Note content ('-' or omitted reads stdin)
    pub content: Option<String>,

    /// Tag to attach (can be specified multiple times)
    #[arg(short, long = "tag", action = ArgAction::Append)]
    pub tags: Vec<String>,

    /// Short description
    #[arg(short = 'D', long)]
    pub description: Option<String>,
}

/// Arguments for the `show` command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Note name or note:// URI
    pub name: String,

    /// Print only the content
    #[arg(long, conflicts_with = "format")]
    pub raw: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `update` command
#[derive(Parser, Debug)]
pub struct UpdateArgs {
    /// Note name or note:// URI
    pub name: String,

    /// New content ('-' reads stdin; omitted leaves content unchanged)
    pub content: Option<String>,

    /// Replace the tags (can be specified multiple times)
    #[arg(short, long = "tag", action = ArgAction::Append)]
    pub tags: Vec<String>,

    /// Remove all tags
    #[arg(long, conflicts_with = "tags")]
    pub clear_tags: bool,

    /// New description (empty string clears it)
    #[arg(short = 'D', long)]
    pub description: Option<String>,
}

/// Arguments for the `rm` command
#[derive(Parser, Debug)]
pub struct RmArgs {
    /// Note name or note:// URI
    pub name: String,
}

/// Arguments for the `ls` command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Field the search text is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchFieldArg {
    Content,
    Tags,
    Description,
}

impl From<SearchFieldArg> for SearchField {
    fn from(arg: SearchFieldArg) -> Self {
        match arg {
            SearchFieldArg::Content => SearchField::Content,
            SearchFieldArg::Tags => SearchField::Tags,
            SearchFieldArg::Description => SearchField::Description,
        }
    }
}

/// Arguments for the `search` command
#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Text to look for in name, description, tags, and content
    pub query: Option<String>,

    /// Only look for the text in these fields (comma-separated)
    #[arg(long = "in", value_enum, value_delimiter = ',')]
    pub fields: Vec<SearchFieldArg>,

    /// Filter by tag (can be specified multiple times)
    #[arg(short, long = "tag", action = ArgAction::Append)]
    pub tags: Vec<String>,

    /// Match notes with any of the tags instead of all of them
    #[arg(long)]
    pub any: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `restore` command
#[derive(Parser, Debug)]
pub struct RestoreArgs {
    /// Note name or note:// URI
    pub name: String,

    /// Backup to restore: 'latest', a backup label, or an RFC 3339 time
    #[arg(long, default_value = "latest")]
    pub at: String,
}

/// Arguments for the `backups` command
#[derive(Parser, Debug)]
pub struct BackupsArgs {
    /// Note name or note:// URI
    pub name: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `prune` command
#[derive(Parser, Debug)]
pub struct PruneArgs {
    /// Note name or note:// URI
    pub name: String,

    /// Number of newest backups to keep
    #[arg(short, long)]
    pub keep: usize,
}

/// Arguments for the `check` command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Summary detail level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SummaryStyleArg {
    /// One line per note
    #[default]
    Brief,
    /// Full content and metadata
    Detailed,
}

impl From<SummaryStyleArg> for SummaryStyle {
    fn from(arg: SummaryStyleArg) -> Self {
        match arg {
            SummaryStyleArg::Brief => SummaryStyle::Brief,
            SummaryStyleArg::Detailed => SummaryStyle::Detailed,
        }
    }
}

/// Arguments for the `summary` command
#[derive(Parser, Debug)]
pub struct SummaryArgs {
    /// How much of each note to include
    #[arg(short, long, value_enum, default_value_t = SummaryStyleArg::Brief)]
    pub style: SummaryStyleArg,
}

/// Arguments for the `completions` command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for (bash, zsh, fish)
    #[arg(value_enum)]
    pub shell: Shell,
}
