//! File-backed record store (default).
//!
//! Each named file lives directly under a data directory. Saves write to a
//! sibling temporary file and rename it over the target, so a failed save
//! leaves the previous file intact.
//!
//! Files are decoded line by line: a line that is not valid UTF-8 is
//! dropped with a warning and the rest of the file still loads.

use super::RecordStore;
use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Record store over plain CSV files in one directory.
///
/// # Example
///
/// ```no_run
/// use retail_ledger::store::{FileStore, RecordStore};
///
/// # fn main() -> retail_ledger::Result<()> {
/// let mut store = FileStore::new("./data");
/// store.write_lines("customers.csv", "CustomerID,Phone,Name,Email,LoyaltyPoints", &[
///     "1,555-0100,Ada,ada@example.com,0".to_string(),
/// ])?;
/// assert!(store.exists("customers.csv")?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        FileStore {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl RecordStore for FileStore {
    fn read_lines(&self, name: &str) -> Result<Option<Vec<String>>> {
        let path = self.path_of(name);
        match fs::read(&path) {
            Ok(contents) => {
                debug!("✓ File READ {} ({} bytes)", path.display(), contents.len());
                Ok(Some(decode_lines(&path, &contents)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("File READ {} -> absent", path.display());
                Ok(None)
            }
            Err(e) => Err(Error::Storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn write_lines(&mut self, name: &str, header: &str, lines: &[String]) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| {
            Error::Storage(format!(
                "Failed to create data directory {}: {}",
                self.root.display(),
                e
            ))
        })?;

        let path = self.path_of(name);
        let temp_path = path.with_extension("tmp");
        let write = || -> std::io::Result<()> {
            let mut writer = BufWriter::new(File::create(&temp_path)?);
            writeln!(writer, "{}", header)?;
            for line in lines {
                writeln!(writer, "{}", line)?;
            }
            writer.flush()?;
            writer.get_ref().sync_all()?;
            drop(writer);
            fs::rename(&temp_path, &path)
        };

        write().map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            Error::Storage(format!("Failed to write {}: {}", path.display(), e))
        })?;
        debug!("✓ File WRITE {} ({} records)", path.display(), lines.len());
        Ok(())
    }
}

/// Split raw file contents into lines, accepting `\n` and `\r\n` endings.
fn decode_lines(path: &Path, contents: &[u8]) -> Vec<String> {
    let body = contents.strip_suffix(b"\n").unwrap_or(contents);
    if body.is_empty() {
        return Vec::new();
    }

    body.split(|byte| *byte == b'\n')
        .enumerate()
        .filter_map(|(index, raw)| {
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            match std::str::from_utf8(raw) {
                Ok(line) => Some(line.to_string()),
                Err(e) => {
                    warn!(
                        "Dropping line {} of {}: not valid UTF-8 ({})",
                        index + 1,
                        path.display(),
                        e
                    );
                    None
                }
            }
        })
        .collect()
}
