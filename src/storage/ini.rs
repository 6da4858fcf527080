//! INI-backed section store.
//!
//! Layout matches the frps multi-user token file:
//!
//! ```text
//! [users]
//! ; office gateway
//! alice = 3f9a1c
//!
//! [ports]
//! ; user alice allowed ports
//! alice = 6000-6010,8080
//! ```
//!
//! Comment lines (`;` or `#`) attach to the key that follows them. Blank lines
//! reset a pending comment. One pair of surrounding double quotes is stripped
//! from values, so `render` adds a pair to any value that would otherwise lose
//! its own.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::storage::{SectionDocument, SectionStore, StorageError};

/// A token file on disk.
#[derive(Debug, Clone)]
pub struct IniFile {
    path: PathBuf,
    create_if_missing: bool,
}

impl IniFile {
    pub fn new(path: impl Into<PathBuf>, create_if_missing: bool) -> Self {
        Self {
            path: path.into(),
            create_if_missing,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl SectionStore for IniFile {
    fn load(&self) -> Result<SectionDocument, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && self.create_if_missing => {
                tracing::warn!(path = %self.path.display(), "Token file not found, starting empty");
                Ok(SectionDocument::new())
            }
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, doc: &SectionDocument) -> Result<(), StorageError> {
        let rendered = render(doc);

        // Write a sibling file first so a crash never leaves a truncated token file.
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = fs::File::create(&tmp).map_err(|e| self.io_error(e))?;
        file.write_all(rendered.as_bytes()).map_err(|e| self.io_error(e))?;
        file.sync_all().map_err(|e| self.io_error(e))?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Parse INI text into a document.
pub fn parse(content: &str) -> Result<SectionDocument, StorageError> {
    let mut doc = SectionDocument::new();
    let mut current: Option<String> = None;
    let mut pending_comment: Vec<String> = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        let line_no = idx + 1;

        if line.is_empty() {
            pending_comment.clear();
            continue;
        }

        let body = raw.trim_start();
        if let Some(text) = body.strip_prefix(';').or_else(|| body.strip_prefix('#')) {
            // Only the separator space written by `render` is dropped.
            pending_comment.push(text.strip_prefix(' ').unwrap_or(text).to_string());
            continue;
        }

        if line.starts_with('[') {
            let name = line
                .strip_prefix('[')
                .and_then(|l| l.strip_suffix(']'))
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| StorageError::Parse {
                    line: line_no,
                    message: format!("malformed section header '{}'", line),
                })?;
            doc.section_mut(name);
            current = Some(name.to_string());
            pending_comment.clear();
            continue;
        }

        let (key, value) = line.split_once('=').ok_or_else(|| StorageError::Parse {
            line: line_no,
            message: format!("expected 'key = value', got '{}'", line),
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(StorageError::Parse {
                line: line_no,
                message: "empty key".to_string(),
            });
        }

        let section = current.as_deref().ok_or_else(|| StorageError::Parse {
            line: line_no,
            message: format!("key '{}' outside of any section", key),
        })?;

        let comment = if pending_comment.is_empty() {
            None
        } else {
            Some(pending_comment.join(" "))
        };
        pending_comment.clear();

        doc.set(section, key, unquote(value.trim()), comment);
    }

    Ok(doc)
}

/// Render a document back to INI text.
pub fn render(doc: &SectionDocument) -> String {
    let mut out = String::new();
    for (i, section) in doc.sections().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push('[');
        out.push_str(section.name());
        out.push_str("]\n");
        for (key, entry) in section.iter() {
            if let Some(comment) = entry.comment.as_deref().filter(|c| !c.is_empty()) {
                out.push_str("; ");
                out.push_str(comment);
                out.push('\n');
            }
            out.push_str(key);
            out.push_str(" = ");
            if is_quoted(&entry.value) {
                out.push('"');
                out.push_str(&entry.value);
                out.push('"');
            } else {
                out.push_str(&entry.value);
            }
            out.push('\n');
        }
    }
    out
}

fn is_quoted(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('"') && value.ends_with('"')
}

fn unquote(value: &str) -> &str {
    if is_quoted(value) {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
[users]
; office gateway
alice = tok123
bob = \"tok456\"

[ports]
# user alice allowed ports
alice = 8080,8081

[disabled]
bob = disable
";

    #[test]
    fn test_parse_sections_and_comments() {
        let doc = parse(SAMPLE).unwrap();

        let alice = doc.get("users", "alice").unwrap();
        assert_eq!(alice.value, "tok123");
        assert_eq!(alice.comment.as_deref(), Some("office gateway"));

        let bob = doc.get("users", "bob").unwrap();
        assert_eq!(bob.value, "tok456");
        assert!(bob.comment.is_none());

        assert_eq!(doc.get("ports", "alice").unwrap().value, "8080,8081");
        assert!(doc.get("disabled", "bob").is_some());
    }

    #[test]
    fn test_parse_rejects_orphan_key() {
        let err = parse("alice = tok\n").unwrap_err();
        assert!(matches!(err, StorageError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_bad_header() {
        let err = parse("[users\nalice = tok\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_render_then_parse_keeps_comments() {
        let doc = parse(SAMPLE).unwrap();
        let again = parse(&render(&doc)).unwrap();
        assert_eq!(doc, again);
    }

    #[test]
    fn test_file_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = IniFile::new(dir.path().join("tokens.ini"), true);

        // Missing file starts empty.
        assert_eq!(store.load().unwrap(), SectionDocument::new());

        let mut doc = SectionDocument::new();
        doc.set("users", "alice", "tok", Some("first user".into()));
        store.save(&doc).unwrap();

        assert_eq!(store.load().unwrap(), doc);
        assert!(!dir.path().join("tokens.ini.tmp").exists());
    }

    #[test]
    fn test_file_keeps_quoted_values_and_comment_spacing() {
        let dir = tempfile::tempdir().unwrap();
        let store = IniFile::new(dir.path().join("tokens.ini"), true);

        let mut doc = SectionDocument::new();
        doc.set("users", "alice", "\"s3cr3t\"", Some("  office  ".into()));
        doc.set("users", "bob", "\"half", None);
        doc.set("users", "carol", "\"\"", None);
        store.save(&doc).unwrap();

        let loaded = store.load().unwrap();
        let alice = loaded.get("users", "alice").unwrap();
        assert_eq!(alice.value, "\"s3cr3t\"");
        assert_eq!(alice.comment.as_deref(), Some("  office  "));
        assert_eq!(loaded.get("users", "bob").unwrap().value, "\"half");
        assert_eq!(loaded.get("users", "carol").unwrap().value, "\"\"");
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_parse_hand_written_comment_without_space() {
        let doc = parse("[users]\n;gateway\n  #  lab box\nalice = tok\n").unwrap();
        assert_eq!(doc.get("users", "alice").unwrap().comment.as_deref(), Some("gateway  lab box"));
    }

    #[test]
    fn test_missing_file_is_error_when_not_creating() {
        let dir = tempfile::tempdir().unwrap();
        let store = IniFile::new(dir.path().join("absent.ini"), false);
        assert!(matches!(store.load(), Err(StorageError::Io { .. })));
    }
}
