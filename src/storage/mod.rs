//! Durable section-structured storage for the token file.
//!
//! # Data Flow
//! ```text
//! tokens.ini
//!     → ini.rs (parse into SectionDocument)
//!     → acl::store (hydrate user index)
//!
//! On every committed mutation:
//!     acl::store renders a full SectionDocument
//!     → SectionStore::save (whole-file write)
//! ```
//!
//! # Design Decisions
//! - The store only knows about sections, keys, values and per-key comments
//! - Saves are whole-document; there is no incremental patching
//! - Section order is preserved; keys inside a section are kept sorted

pub mod ini;
pub mod memory;

use std::collections::BTreeMap;
use thiserror::Error;

pub use ini::IniFile;
pub use memory::MemoryStore;

/// Errors raised by a [`SectionStore`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not valid section syntax.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The backend refused the write.
    #[error("save rejected: {0}")]
    Rejected(String),
}

/// A backend able to load and save a whole [`SectionDocument`].
pub trait SectionStore: Send + Sync {
    /// Read the full document.
    fn load(&self) -> Result<SectionDocument, StorageError>;

    /// Replace the stored document with `doc`.
    fn save(&self, doc: &SectionDocument) -> Result<(), StorageError>;

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}

/// A single key's value plus its attached comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub value: String,
    pub comment: Option<String>,
}

/// A named group of keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    name: String,
    entries: BTreeMap<String, Entry>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Insert or replace a key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>, comment: Option<String>) {
        self.entries.insert(
            key.into(),
            Entry {
                value: value.into(),
                comment,
            },
        );
    }

    /// Remove a key, returning the old entry if it was present.
    pub fn delete(&mut self, key: &str) -> Option<Entry> {
        self.entries.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An ordered collection of sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionDocument {
    sections: Vec<Section>,
}

impl SectionDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Get a section for writing, appending an empty one if it does not exist.
    pub fn section_mut(&mut self, name: &str) -> &mut Section {
        let idx = match self.sections.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        };
        &mut self.sections[idx]
    }

    /// Shorthand for looking up a key inside a section.
    pub fn get(&self, section: &str, key: &str) -> Option<&Entry> {
        self.get_section(section).and_then(|s| s.get(key))
    }

    pub fn set(&mut self, section: &str, key: impl Into<String>, value: impl Into<String>, comment: Option<String>) {
        self.section_mut(section).set(key, value, comment);
    }

    pub fn delete(&mut self, section: &str, key: &str) -> Option<Entry> {
        self.sections
            .iter_mut()
            .find(|s| s.name == section)
            .and_then(|s| s.delete(key))
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_mut_creates_once() {
        let mut doc = SectionDocument::new();
        doc.section_mut("users").set("alice", "tok", None);
        doc.section_mut("users").set("bob", "tok2", None);
        doc.section_mut("ports");

        let names: Vec<_> = doc.sections().map(|s| s.name()).collect();
        assert_eq!(names, vec!["users", "ports"]);
        assert_eq!(doc.get_section("users").unwrap().len(), 2);
    }

    #[test]
    fn test_delete_missing_section() {
        let mut doc = SectionDocument::new();
        assert!(doc.delete("ports", "alice").is_none());

        doc.set("ports", "alice", "80", None);
        assert_eq!(doc.delete("ports", "alice").unwrap().value, "80");
        assert!(doc.get("ports", "alice").is_none());
    }
}
