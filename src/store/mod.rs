//! Record store implementations.
//!
//! A record store keeps one named file per entity type, each a header line
//! followed by one encoded record per line. Stores deal in raw lines only;
//! decoding belongs to [`crate::codec`] and collection fix-ups to
//! [`crate::gateway`].

use crate::error::Result;

pub mod file;
pub mod inmemory;

pub use file::FileStore;
pub use inmemory::InMemoryStore;

/// Trait for record store implementations.
///
/// Writes are whole-file: every save replaces the previous contents.
pub trait RecordStore {
    /// Read every line of a file, header included.
    ///
    /// # Returns
    /// - `Ok(Some(lines))` - File present
    /// - `Ok(None)` - File absent (not an error)
    ///
    /// # Errors
    /// Returns `Err` if the file exists but cannot be read
    fn read_lines(&self, name: &str) -> Result<Option<Vec<String>>>;

    /// Replace a file with `header` followed by `lines`.
    ///
    /// # Errors
    /// Returns `Err` if the file cannot be written
    fn write_lines(&mut self, name: &str, header: &str, lines: &[String]) -> Result<()>;

    /// Check if a file exists.
    ///
    /// # Errors
    /// Returns `Err` if the store cannot be inspected
    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.read_lines(name)?.is_some())
    }
}

/// Strip the header from a file's lines.
///
/// The first line is a header only when at least one more line follows, or
/// when it is exactly the expected header (a save of an empty collection).
/// Otherwise a lone line is data. Blank lines are discarded.
pub fn data_lines(lines: Vec<String>, header: &str) -> Vec<String> {
    let mut lines: Vec<String> = lines
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect();

    let first_is_header = match lines.len() {
        0 => false,
        1 => lines[0].trim().eq_ignore_ascii_case(header),
        _ => true,
    };
    if first_is_header {
        lines.remove(0);
    }
    lines
}
