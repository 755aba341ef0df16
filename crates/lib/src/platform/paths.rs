use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
  #[error("{filename} not found in {} or any parent directory; {hint}", start.display())]
  NotFound {
    start: PathBuf,
    filename: String,
    hint: String,
  },

  #[error("failed to resolve {}: {source}", path.display())]
  Canonicalize { path: PathBuf, source: std::io::Error },
}

/// Canonicalize without producing `\\?\` prefixed paths on Windows.
pub fn canonical(path: &Path) -> Result<PathBuf, PathError> {
  dunce::canonicalize(path).map_err(|source| PathError::Canonicalize {
    path: path.to_path_buf(),
    source,
  })
}

/// Walk upward from `start` until a directory containing `filename` is found.
///
/// Returns the path of the file itself. Stops at the filesystem root, where the
/// parent of a directory resolves to the directory itself.
pub fn find_ancestor_file(start: &Path, filename: &str, hint: &str) -> Result<PathBuf, PathError> {
  let mut dir = start;
  loop {
    let candidate = dir.join(filename);
    if candidate.is_file() {
      return Ok(candidate);
    }
    match dir.parent() {
      Some(parent) if parent != dir => dir = parent,
      _ => {
        return Err(PathError::NotFound {
          start: start.to_path_buf(),
          filename: filename.to_string(),
          hint: hint.to_string(),
        });
      }
    }
  }
}

/// Relative path leading from directory `from` to `to`.
///
/// Both paths are expected to be absolute and normalized.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
  let from: Vec<Component> = from.components().collect();
  let to: Vec<Component> = to.components().collect();

  let common = from.iter().zip(to.iter()).take_while(|(a, b)| a == b).count();

  let mut rel = PathBuf::new();
  for _ in common..from.len() {
    rel.push("..");
  }
  for component in &to[common..] {
    rel.push(component.as_os_str());
  }
  if rel.as_os_str().is_empty() {
    rel.push(".");
  }
  rel
}

/// Render a relative path with forward slashes, as expected inside JSON config files.
pub fn to_slash(path: &Path) -> String {
  path
    .components()
    .map(|c| c.as_os_str().to_string_lossy().into_owned())
    .collect::<Vec<_>>()
    .join("/")
}
