//! add / show / update / rm handlers.

use anyhow::{Context, Result};

use super::{parse_name, parse_tag_args, read_all, resolve_content};
use crate::cli::output::{NoteView, Output, OutputFormat};
use crate::cli::{AddArgs, RmArgs, ShowArgs, UpdateArgs};
use crate::domain::{NoteChanges, Tag};
use crate::store::NoteStore;

pub fn handle_add(args: &AddArgs, store: &NoteStore) -> Result<()> {
    let name = parse_name(&args.name)?;
    let tags = parse_tag_args(&args.tags)?;
    let content = match &args.content {
        Some(arg) => resolve_content(arg, std::io::stdin())?,
        None => read_all(std::io::stdin())?,
    };

    let note = store
        .create(&name, content, tags, args.description.clone())
        .with_context(|| format!("failed to create note '{}'", name))?;

    println!("Created: {}", note.name().uri());
    Ok(())
}

pub fn handle_show(args: &ShowArgs, store: &NoteStore) -> Result<()> {
    let name = parse_name(&args.name)?;
    let note = store
        .read(&name)
        .with_context(|| format!("failed to read note '{}'", name))?;

    if args.raw {
        print!("{}", note.content());
        return Ok(());
    }

    match args.format {
        OutputFormat::Human => {
            println!("# {}", note.name());
            println!();

            if let Some(desc) = note.description() {
                println!("{}", desc);
                println!();
            }

            println!(
                "Created: {}  Modified: {}  Checksum: {}",
                note.created_at().format("%Y-%m-%d %H:%M"),
                note.modified_at().format("%Y-%m-%d %H:%M"),
                note.checksum().short()
            );

            if !note.tags().is_empty() {
                let tags: Vec<_> = note.tags().iter().map(Tag::as_str).collect();
                println!("Tags: {}", tags.join(", "));
            }

            println!();
            if !note.content().is_empty() {
                println!("{}", note.content());
            }
        }
        OutputFormat::Json => {
            let output = Output::new(NoteView::from(&note));
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

pub fn handle_update(args: &UpdateArgs, store: &NoteStore) -> Result<()> {
    let name = parse_name(&args.name)?;

    let tags = if args.clear_tags {
        Some(Vec::new())
    } else if args.tags.is_empty() {
        None
    } else {
        Some(parse_tag_args(&args.tags)?)
    };
    let content = args
        .content
        .as_deref()
        .map(|arg| resolve_content(arg, std::io::stdin()))
        .transpose()?;

    let changes = NoteChanges {
        content,
        tags,
        description: args.description.clone(),
    };
    if changes.is_empty() {
        anyhow::bail!("nothing to update: pass new content, --tag, --clear-tags, or --description");
    }

    store
        .update(&name, changes)
        .with_context(|| format!("failed to update note '{}'", name))?;

    println!("Updated: {}", name.uri());
    Ok(())
}

pub fn handle_rm(args: &RmArgs, store: &NoteStore) -> Result<()> {
    let name = parse_name(&args.name)?;
    let backup = store
        .delete(&name)
        .with_context(|| format!("failed to delete note '{}'", name))?;

    match backup {
        Some(record) => println!("Deleted: {} (backup {})", name.uri(), record.label()),
        None => println!("Deleted: {} (file was already missing)", name.uri()),
    }
    Ok(())
}
