//! File modification times and snapshots of generated artifacts.

use std::fs::{File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Modification time of `path`. Fails if the file is missing.
pub fn modified_time(path: &Path) -> io::Result<SystemTime> {
  std::fs::metadata(path)?.modified()
}

/// Modification time of `path`, or `None` if it cannot be read.
pub fn modified_time_opt(path: &Path) -> Option<SystemTime> {
  modified_time(path).ok()
}

/// True iff `path` was modified strictly after `baseline`.
pub fn is_newer_than(baseline: SystemTime, path: &Path) -> io::Result<bool> {
  Ok(modified_time(path)? > baseline)
}

/// Set access and modification times of an existing file.
pub fn set_times(path: &Path, accessed: SystemTime, modified: SystemTime) -> io::Result<()> {
  let file = File::options().write(true).open(path)?;
  file.set_times(FileTimes::new().set_accessed(accessed).set_modified(modified))
}

/// Content and timestamps of a file captured before it gets regenerated.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
  pub path: PathBuf,
  pub content: Vec<u8>,
  pub accessed: SystemTime,
  pub modified: SystemTime,
}

impl FileSnapshot {
  /// Capture `path`. Returns `Ok(None)` if it does not exist.
  pub fn capture(path: &Path) -> io::Result<Option<Self>> {
    let metadata = match std::fs::metadata(path) {
      Ok(m) => m,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(e),
    };
    let modified = metadata.modified()?;
    let accessed = metadata.accessed().unwrap_or(modified);
    let content = std::fs::read(path)?;

    Ok(Some(Self {
      path: path.to_path_buf(),
      content,
      accessed,
      modified,
    }))
  }

  /// True if the file currently on disk has exactly the captured content.
  pub fn content_unchanged(&self) -> bool {
    std::fs::read(&self.path).map(|now| now == self.content).unwrap_or(false)
  }

  /// Put the captured timestamps back on the current file.
  pub fn restore_times(&self) -> io::Result<()> {
    set_times(&self.path, self.accessed, self.modified)
  }

  /// Rewrite the captured content and timestamps.
  pub fn restore(&self) -> io::Result<()> {
    if let Some(parent) = self.path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&self.path, &self.content)?;
    self.restore_times()
  }
}
