//! pinthepiece - durable file-backed notes with backups, checksums, and a searchable index

pub mod cli;
pub mod domain;
pub mod index;
pub mod infra;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{
    Cli, Command,
    config::Config,
    handlers::{
        handle_add, handle_backups, handle_check, handle_completions, handle_list, handle_prune,
        handle_reindex, handle_restore, handle_rm, handle_search, handle_show, handle_summary,
        handle_update,
    },
};
use store::NoteStore;

/// Main entry point for the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    cli::logging::init(cli.verbose);

    if let Command::Completions(args) = &cli.command {
        return handle_completions(args);
    }

    let config = Config::load()?;
    let options = config.store_options(cli.dir.as_ref());
    let root = options.root.clone();
    let store = NoteStore::open(options)
        .with_context(|| format!("failed to open note store at {}", root.display()))?;

    match &cli.command {
        Command::Add(args) => handle_add(args, &store),
        Command::Show(args) => handle_show(args, &store),
        Command::Update(args) => handle_update(args, &store),
        Command::Rm(args) => handle_rm(args, &store),
        Command::Ls(args) => handle_list(args, &store),
        Command::Search(args) => handle_search(args, &store),
        Command::Restore(args) => handle_restore(args, &store),
        Command::Backups(args) => handle_backups(args, &store),
        Command::Prune(args) => handle_prune(args, &store),
        Command::Check(args) => handle_check(args, &store),
        Command::Reindex => handle_reindex(&store),
        Command::Summary(args) => handle_summary(args, &store),
        Command::Completions(args) => handle_completions(args),
    }
}
