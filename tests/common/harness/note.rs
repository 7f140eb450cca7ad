//! Builder for test notes with sensible defaults.

// Allow dead code since not every test binary uses every builder method
#![allow(dead_code)]

use pinthepiece::domain::{NoteName, Tag};

/// Builder for creating test notes with sensible defaults.
#[derive(Debug, Clone)]
pub struct TestNote {
    name: NoteName,
    content: String,
    tags: Vec<Tag>,
    description: Option<String>,
}

impl TestNote {
    /// Creates a new test note with the given name and empty content.
    pub fn new(name: &str) -> Self {
        Self {
            name: NoteName::new(name).expect("Invalid note name"),
            content: String::new(),
            tags: Vec::new(),
            description: None,
        }
    }

    /// Sets the content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Adds a tag to the note.
    pub fn tag(mut self, tag: impl AsRef<str>) -> Self {
        self.tags.push(Tag::new(tag.as_ref()).expect("Invalid tag"));
        self
    }

    /// Sets the description.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn name(&self) -> &NoteName {
        &self.name
    }

    pub fn get_content(&self) -> &str {
        &self.content
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_builder_fluent() {
        let note = TestNote::new("todo")
            .content("buy milk")
            .tag("Home")
            .description("groceries");

        assert_eq!(note.name().as_str(), "todo");
        assert_eq!(note.get_content(), "buy milk");
        assert_eq!(note.tags()[0].as_str(), "home");
        assert_eq!(note.get_description(), Some("groceries"));
    }
}
