//! check / reindex / summary handlers.

use anyhow::{Context, Result, bail};

use crate::cli::output::{Output, OutputFormat};
use crate::cli::{CheckArgs, SummaryArgs};
use crate::store::NoteStore;

pub fn handle_check(args: &CheckArgs, store: &NoteStore) -> Result<()> {
    let report = store.check();

    match args.format {
        OutputFormat::Human => {
            if report.is_ok() {
                println!("All {} note(s) OK.", report.checked);
                return Ok(());
            }
            for issue in &report.issues {
                println!("error: {}", issue);
            }
            println!();
            println!("Found {} issue(s)", report.issues.len());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&Output::new(&report))?);
        }
    }

    if !report.is_ok() {
        bail!("check failed");
    }
    Ok(())
}

pub fn handle_reindex(store: &NoteStore) -> Result<()> {
    let result = store
        .rebuild_index()
        .with_context(|| "failed to rebuild index")?;

    for error in &result.errors {
        eprintln!("  {}", error);
    }
    if result.errors.is_empty() {
        println!("Indexed {} notes", result.entries.len());
    } else {
        println!(
            "Indexed {} notes with {} errors",
            result.entries.len(),
            result.errors.len()
        );
    }
    Ok(())
}

pub fn handle_summary(args: &SummaryArgs, store: &NoteStore) -> Result<()> {
    println!("{}", store.summarize(args.style.into()));
    Ok(())
}
