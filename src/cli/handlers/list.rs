//! ls / search handlers.

use anyhow::Result;

use super::{parse_tag_args, print_entries};
use crate::cli::{ListArgs, SearchArgs};
use crate::index::SearchQuery;
use crate::store::NoteStore;

pub fn handle_list(args: &ListArgs, store: &NoteStore) -> Result<()> {
    print_entries(&store.list(), args.format, "No notes found.")
}

pub fn handle_search(args: &SearchArgs, store: &NoteStore) -> Result<()> {
    let mut query = SearchQuery::new()
        .tags(parse_tag_args(&args.tags)?)
        .match_any_tags(args.any)
        .fields(args.fields.iter().copied().map(Into::into).collect());
    if let Some(text) = &args.query {
        query = query.text(text.as_str());
    }

    print_entries(&store.search(&query), args.format, "No matching notes found.")
}
