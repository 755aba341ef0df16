//! Structural merge and containment over JSON values.
//!
//! Config files are never rewritten blindly: generated files are produced by
//! merging a required fragment over a base template, and existing files are
//! checked for containment of that fragment.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum JsonFileError {
  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error("failed to parse {}: {source}", path.display())]
  Parse { path: PathBuf, source: serde_json::Error },

  #[error("failed to write {}: {source}", path.display())]
  Write { path: PathBuf, source: io::Error },
}

/// A location where a value does not contain a required fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
  /// Dotted path to the offending key, with `[n]` for array elements.
  pub path: String,
  pub expected: Value,
  pub actual: Option<Value>,
}

impl fmt::Display for Mismatch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let path = if self.path.is_empty() { "(root)" } else { &self.path };
    match &self.actual {
      Some(actual) => write!(f, "{}: expected {}, found {}", path, self.expected, actual),
      None => write!(f, "{}: expected {}, found nothing", path, self.expected),
    }
  }
}

/// Merge `source` into `target`. Objects merge recursively; everything else in
/// `source` replaces what `target` had.
pub fn merge(target: &mut Value, source: &Value) {
  match (target, source) {
    (Value::Object(target), Value::Object(source)) => {
      for (key, value) in source {
        match target.get_mut(key) {
          Some(existing) => merge(existing, value),
          None => {
            target.insert(key.clone(), value.clone());
          }
        }
      }
    }
    (target, source) => *target = source.clone(),
  }
}

/// Return `base` with `overlay` merged on top.
pub fn merged(base: &Value, overlay: &Value) -> Value {
  let mut out = base.clone();
  merge(&mut out, overlay);
  out
}

/// Every place where `actual` fails to structurally contain `required`.
///
/// Objects are contained key by key. Each element of a required array must be
/// contained by some element of the actual array. Scalars must be equal.
pub fn mismatches(actual: &Value, required: &Value) -> Vec<Mismatch> {
  let mut out = Vec::new();
  collect(Some(actual), required, String::new(), &mut out);
  out
}

pub fn contains(actual: &Value, required: &Value) -> bool {
  mismatches(actual, required).is_empty()
}

fn collect(actual: Option<&Value>, required: &Value, path: String, out: &mut Vec<Mismatch>) {
  match (actual, required) {
    (Some(Value::Object(actual)), Value::Object(required)) => {
      for (key, value) in required {
        let child = if path.is_empty() { key.clone() } else { format!("{}.{}", path, key) };
        collect(actual.get(key), value, child, out);
      }
    }
    (Some(Value::Array(actual)), Value::Array(required)) => {
      for (idx, item) in required.iter().enumerate() {
        if !actual.iter().any(|candidate| contains(candidate, item)) {
          out.push(Mismatch {
            path: format!("{}[{}]", path, idx),
            expected: item.clone(),
            actual: None,
          });
        }
      }
    }
    (actual, required) if required.is_object() || required.is_array() || actual != Some(required) => {
      out.push(Mismatch {
        path,
        expected: required.clone(),
        actual: actual.cloned(),
      });
    }
    _ => {}
  }
}

/// Read and parse a JSON file. Returns `Ok(None)` if the file does not exist.
pub fn read_json(path: &Path) -> Result<Option<Value>, JsonFileError> {
  let content = match std::fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
    Err(source) => {
      return Err(JsonFileError::Read {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  serde_json::from_str(&content).map(Some).map_err(|source| JsonFileError::Parse {
    path: path.to_path_buf(),
    source,
  })
}

/// Write `value` pretty-printed with a trailing newline.
pub fn write_json(path: &Path, value: &Value) -> Result<(), JsonFileError> {
  let mut content = serde_json::to_string_pretty(value).map_err(|e| JsonFileError::Write {
    path: path.to_path_buf(),
    source: io::Error::other(e),
  })?;
  content.push('\n');

  debug!(path = %path.display(), "writing json");
  std::fs::write(path, content).map_err(|source| JsonFileError::Write {
    path: path.to_path_buf(),
    source,
  })
}
