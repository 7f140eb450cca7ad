//! Core types: Note, NoteName, Tag

mod note;
mod note_name;
mod tag;

pub use note::{FORMAT_VERSION, Note, NoteChanges, NoteMetadata};
pub use note_name::{MAX_NAME_LEN, NOTE_URI_SCHEME, NoteName, ParseNoteNameError};
pub use tag::{ParseTagError, Tag, normalize_tags, parse_tags};
