//! Development root discovery and the root marker configuration.
//!
//! The development root is the nearest ancestor directory holding a
//! `treebuild.json` file. Its content is merged over [`ROOT_TEMPLATE`] and
//! describes the external tools and the files generated into every module.

mod filter;
mod templates;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::consts::ROOT_MARKER;
use crate::platform::paths::{PathError, canonical, find_ancestor_file};
use crate::util::json::{JsonFileError, Mismatch, merged, read_json};

pub use filter::{FileCondition, ModuleFilter};
pub use templates::{NOT_IN_TREE_HINT, ROOT_TEMPLATE};

/// Errors in the root marker, generated config files or module manifests.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("not in a development root: {0}")]
  NotInTree(#[from] PathError),

  #[error(transparent)]
  File(#[from] JsonFileError),

  #[error("invalid {}: {source}", path.display())]
  Invalid { path: PathBuf, source: serde_json::Error },

  #[error("{}: `{key}` must be a non-empty command", path.display())]
  EmptyCommand { path: PathBuf, key: &'static str },

  #[error("malformed filter in {}: {reason}", path.display())]
  MalformedFilter { path: PathBuf, reason: String },

  #[error("{} does not match the required settings: {}", path.display(), describe(mismatches))]
  Mismatch { path: PathBuf, mismatches: Vec<Mismatch> },

  #[error("invalid manifest {}: {reason}", path.display())]
  InvalidManifest { path: PathBuf, reason: String },

  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to write {}: {source}", path.display())]
  Write { path: PathBuf, source: std::io::Error },
}

fn describe(mismatches: &[Mismatch]) -> String {
  match mismatches {
    [] => "no details".to_string(),
    [only] => only.to_string(),
    [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
  }
}

/// Content written for a default file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DefaultFile {
  /// Written line by line.
  Lines(Vec<String>),
  /// Name of a file, relative to the development root, to copy.
  CopyFrom(String),
  /// Written as pretty-printed JSON.
  Json(serde_json::Map<String, Value>),
}

/// Parsed root marker, with built-in defaults filled in.
#[derive(Debug, Clone, Deserialize)]
pub struct RootConfig {
  /// Generate `.gitignore` files.
  pub gitignore: bool,
  /// Set the `svn:ignore` property on module directories.
  pub svnignore: bool,
  pub compiler: Vec<String>,
  pub installer: Vec<String>,
  pub runtime: Vec<String>,
  /// Files written into qualifying modules when missing, keyed by relative path.
  pub defaults: BTreeMap<String, DefaultFile>,
  pub filter: Value,
}

impl RootConfig {
  /// Parse root marker content layered over [`ROOT_TEMPLATE`].
  pub fn from_value(user: &Value, path: &Path) -> Result<Self, ConfigError> {
    let template: Value = serde_json::from_str(ROOT_TEMPLATE).map_err(|source| ConfigError::Invalid {
      path: path.to_path_buf(),
      source,
    })?;
    if !user.is_object() {
      return Err(ConfigError::InvalidManifest {
        path: path.to_path_buf(),
        reason: "root marker must be a JSON object".to_string(),
      });
    }

    let config: RootConfig =
      serde_json::from_value(merged(&template, user)).map_err(|source| ConfigError::Invalid {
        path: path.to_path_buf(),
        source,
      })?;

    for (key, argv) in [
      ("compiler", &config.compiler),
      ("installer", &config.installer),
      ("runtime", &config.runtime),
    ] {
      if argv.is_empty() || argv[0].is_empty() {
        return Err(ConfigError::EmptyCommand {
          path: path.to_path_buf(),
          key,
        });
      }
    }

    Ok(config)
  }
}

/// A located development root.
#[derive(Debug, Clone)]
pub struct DevRoot {
  /// Directory containing the root marker.
  pub dir: PathBuf,
  pub config: RootConfig,
  /// Filter for default files; `None` applies defaults to every module.
  pub filter: Option<ModuleFilter>,
}

impl DevRoot {
  /// Find the development root enclosing `start` (a file or directory).
  pub fn locate(start: &Path) -> Result<Self, ConfigError> {
    let start = canonical(start)?;
    let start_dir = if start.is_dir() {
      start.as_path()
    } else {
      start.parent().unwrap_or(&start)
    };
    let marker = find_ancestor_file(start_dir, ROOT_MARKER, NOT_IN_TREE_HINT)?;
    Self::load(&marker)
  }

  /// Load the root marker at `marker`.
  pub fn load(marker: &Path) -> Result<Self, ConfigError> {
    let user = read_json(marker)?.unwrap_or_else(|| Value::Object(Default::default()));
    let config = RootConfig::from_value(&user, marker)?;
    let filter = ModuleFilter::parse(&config.filter).map_err(|reason| ConfigError::MalformedFilter {
      path: marker.to_path_buf(),
      reason,
    })?;

    let dir = marker.parent().map(Path::to_path_buf).unwrap_or_default();
    debug!(root = %dir.display(), "loaded development root");

    Ok(Self {
      dir,
      config,
      filter,
    })
  }

  /// Directory of a sibling module named `name`, if it exists directly under the root.
  pub fn sibling(&self, name: &str) -> Option<PathBuf> {
    let mut components = Path::new(name).components();
    let single = matches!(
      (components.next(), components.next()),
      (Some(std::path::Component::Normal(_)), None)
    );
    if !single {
      return None;
    }
    let dir = self.dir.join(name);
    dir.is_dir().then_some(dir)
  }

  /// True if default files apply to the module at `module_dir`.
  pub fn defaults_apply_to(&self, module_dir: &Path) -> bool {
    self.filter.as_ref().is_none_or(|f| f.accepts(module_dir))
  }
}
