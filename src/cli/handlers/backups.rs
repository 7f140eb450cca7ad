//! restore / backups / prune handlers.

use anyhow::{Context, Result};

use super::parse_name;
use crate::cli::output::{BackupListing, Output, OutputFormat};
use crate::cli::{BackupsArgs, PruneArgs, RestoreArgs};
use crate::infra::BackupSelector;
use crate::store::NoteStore;

pub fn handle_restore(args: &RestoreArgs, store: &NoteStore) -> Result<()> {
    let name = parse_name(&args.name)?;
    let selector: BackupSelector = args.at.parse()?;

    let note = store
        .restore(&name, selector)
        .with_context(|| format!("failed to restore note '{}'", name))?;

    println!("Restored: {} from {}", note.name().uri(), selector);
    Ok(())
}

pub fn handle_backups(args: &BackupsArgs, store: &NoteStore) -> Result<()> {
    let name = parse_name(&args.name)?;
    let records = store
        .backups(&name)
        .with_context(|| format!("failed to list backups of '{}'", name))?;

    match args.format {
        OutputFormat::Human => {
            if records.is_empty() {
                println!("No backups of '{}'.", name);
                return Ok(());
            }
            for record in &records {
                println!(
                    "{}  {}",
                    record.label(),
                    record.timestamp().format("%Y-%m-%d %H:%M:%S")
                );
            }
            println!();
            println!("{} backup(s)", records.len());
        }
        OutputFormat::Json => {
            let listings: Vec<BackupListing> = records.iter().map(BackupListing::from).collect();
            println!("{}", serde_json::to_string_pretty(&Output::new(listings))?);
        }
    }
    Ok(())
}

pub fn handle_prune(args: &PruneArgs, store: &NoteStore) -> Result<()> {
    let name = parse_name(&args.name)?;
    let removed = store
        .prune_backups(&name, args.keep)
        .with_context(|| format!("failed to prune backups of '{}'", name))?;

    println!("Removed {} backup(s) of '{}'", removed.len(), name);
    Ok(())
}
