//! In-memory record store, for tests and ephemeral sessions.

use super::RecordStore;
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Record store that keeps file contents in a map.
///
/// Writes can be made to fail on demand to exercise save-error paths.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    files: HashMap<String, Vec<String>>,
    fail_writes: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file from raw text, split into lines.
    pub fn with_file(mut self, name: &str, contents: &str) -> Self {
        self.files.insert(
            name.to_string(),
            contents.lines().map(str::to_string).collect(),
        );
        self
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Raw lines of a file, header included.
    pub fn file(&self, name: &str) -> Option<&[String]> {
        self.files.get(name).map(Vec::as_slice)
    }
}

impl RecordStore for InMemoryStore {
    fn read_lines(&self, name: &str) -> Result<Option<Vec<String>>> {
        Ok(self.files.get(name).cloned())
    }

    fn write_lines(&mut self, name: &str, header: &str, lines: &[String]) -> Result<()> {
        if self.fail_writes {
            return Err(Error::Storage(format!("Write to {} refused", name)));
        }
        let mut contents = Vec::with_capacity(lines.len() + 1);
        contents.push(header.to_string());
        contents.extend_from_slice(lines);
        self.files.insert(name.to_string(), contents);
        Ok(())
    }
}
