//! JSON-lines file store.
//!
//! Each append opens the file in append mode, writes the whole line with a
//! single `write_all`, and closes it again. There is no lock: concurrent
//! appends may land in any order, and per-line integrity relies on the OS
//! treating small `O_APPEND` writes atomically. The file is never rotated
//! or truncated.

use crate::VisitStore;
use async_trait::async_trait;
use honeypot_core::{HoneypotError, LogEntry, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl VisitStore for FileStore {
    async fn append(&self, entry: &LogEntry) -> Result<()> {
        let line = entry.to_json_line()?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_line(&path, line.as_bytes()))
            .await
            .map_err(|e| HoneypotError::Store(format!("append task failed: {e}")))??;
        debug!(path = %self.path.display(), "Visit appended");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn append_line(path: &Path, line: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line)
}
