//! Generated and validated per-module files.
//!
//! Each module needs a compiler config and a manifest containing the settings
//! the build relies on. Missing files are generated; existing files are
//! checked and never rewritten when they conflict. The compiler config also
//! carries search-path entries mapping each local dependency to its
//! declaration, which the tidy stage strips again.

mod ignore;
mod templates;

use std::path::{Component, Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::build::ModuleConfig;
use crate::devroot::{ConfigError, DefaultFile, DevRoot};
use crate::util::json::{merged, mismatches, read_json, write_json};

pub use ignore::{GIT_IGNORE, NPM_IGNORE, set_svn_ignore, write_ignore_files};
pub use templates::{base_config, base_manifest, required_config, required_manifest};

const COMPILER_OPTIONS: &str = "compilerOptions";
const PATHS: &str = "paths";

/// Make sure `module` has all of its generated files.
///
/// Returns the files written. Default files come first so the root filter
/// sees the module as its author left it.
pub fn materialize(root: &DevRoot, module: &ModuleConfig) -> Result<Vec<PathBuf>, ConfigError> {
  let mut written = Vec::new();

  if !module.is_test_variant && root.defaults_apply_to(&module.module_path) {
    written.extend(write_defaults(root, &module.module_path)?);
  }

  let config = module.config_file();
  let config_generated = ensure_json_file(&config, &base_config(), &required_config(module))?;
  if config_generated {
    written.push(config);
  }

  let manifest = module.manifest_file();
  if ensure_json_file(&manifest, &base_manifest(), &required_manifest(module))? {
    written.push(manifest);
  }

  written.extend(write_ignore_files(root, module)?);
  if config_generated && root.config.svnignore {
    set_svn_ignore(&module.module_path);
  }

  if !written.is_empty() {
    info!(module = %module.label(), files = written.len(), "generated module files");
  }
  Ok(written)
}

/// Write `base` merged with `required` to `path` if it is missing; otherwise
/// check that the file contains `required`.
///
/// Returns true if the file was written.
pub fn ensure_json_file(path: &Path, base: &Value, required: &Value) -> Result<bool, ConfigError> {
  match read_json(path)? {
    None => {
      write_json(path, &merged(base, required))?;
      Ok(true)
    }
    Some(actual) => {
      let found = mismatches(&actual, required);
      if found.is_empty() {
        Ok(false)
      } else {
        Err(ConfigError::Mismatch {
          path: path.to_path_buf(),
          mismatches: found,
        })
      }
    }
  }
}

/// Point `compilerOptions.paths` at each dependency's declaration.
///
/// `entries` maps a dependency name to a path relative to the module. The
/// file is written only if something changed. Returns true if it was.
pub fn inject_search_paths(config_file: &Path, entries: &[(String, String)]) -> Result<bool, ConfigError> {
  if entries.is_empty() {
    return Ok(false);
  }
  let Some(mut config) = read_json(config_file)? else {
    return Ok(false);
  };

  let paths = paths_object(&mut config, config_file)?;
  let mut changed = false;
  for (name, target) in entries {
    let value = Value::Array(vec![Value::String(target.clone())]);
    if paths.get(name) != Some(&value) {
      paths.insert(name.clone(), value);
      changed = true;
    }
  }

  if changed {
    debug!(path = %config_file.display(), "updating search paths");
    write_json(config_file, &config)?;
  }
  Ok(changed)
}

/// Remove the search-path entries for `names`, and `paths` itself once empty.
///
/// Entries left over from dependencies that were dropped since are removed
/// too: any entry whose targets all resolve into another module under
/// `root_dir`. Returns true if the file was rewritten.
pub fn tidy_search_paths(config_file: &Path, names: &[String], root_dir: &Path) -> Result<bool, ConfigError> {
  let module_dir = config_file.parent().unwrap_or(root_dir);
  let Some(mut config) = read_json(config_file)? else {
    return Ok(false);
  };
  let Some(options) = config.get_mut(COMPILER_OPTIONS).and_then(Value::as_object_mut) else {
    return Ok(false);
  };
  let Some(paths) = options.get_mut(PATHS).and_then(Value::as_object_mut) else {
    return Ok(false);
  };

  let before = paths.len();
  for name in names {
    paths.shift_remove(name);
  }
  paths.retain(|_, targets| !points_at_sibling(targets, module_dir, root_dir));
  let mut changed = paths.len() != before;
  if paths.is_empty() {
    options.shift_remove(PATHS);
    changed = true;
  }

  if changed {
    debug!(path = %config_file.display(), "tidying search paths");
    write_json(config_file, &config)?;
  }
  Ok(changed)
}

/// True if every target in `targets` lies under `root_dir` but outside `module_dir`.
fn points_at_sibling(targets: &Value, module_dir: &Path, root_dir: &Path) -> bool {
  let Some(targets) = targets.as_array() else {
    return false;
  };
  !targets.is_empty()
    && targets.iter().all(|target| {
      target.as_str().is_some_and(|target| {
        let resolved = resolve_lexically(module_dir, target);
        resolved.starts_with(root_dir) && !resolved.starts_with(module_dir)
      })
    })
}

/// Join `target` onto `base`, folding `.` and `..` without touching the filesystem.
fn resolve_lexically(base: &Path, target: &str) -> PathBuf {
  let mut resolved = base.to_path_buf();
  for component in Path::new(target).components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        resolved.pop();
      }
      Component::Normal(part) => resolved.push(part),
      Component::RootDir | Component::Prefix(_) => resolved.push(component.as_os_str()),
    }
  }
  resolved
}

fn paths_object<'a>(config: &'a mut Value, path: &Path) -> Result<&'a mut Map<String, Value>, ConfigError> {
  let invalid = |reason: &str| ConfigError::InvalidManifest {
    path: path.to_path_buf(),
    reason: reason.to_string(),
  };

  let options = config
    .as_object_mut()
    .ok_or_else(|| invalid("config must be an object"))?
    .entry(COMPILER_OPTIONS)
    .or_insert_with(|| Value::Object(Map::new()))
    .as_object_mut()
    .ok_or_else(|| invalid("`compilerOptions` must be an object"))?;

  options
    .entry(PATHS)
    .or_insert_with(|| Value::Object(Map::new()))
    .as_object_mut()
    .ok_or_else(|| invalid("`compilerOptions.paths` must be an object"))
}

/// Write the root's default files that are missing from `module_dir`.
pub fn write_defaults(root: &DevRoot, module_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
  let mut written = Vec::new();
  for (relative, content) in &root.config.defaults {
    let path = module_dir.join(relative);
    if path.exists() {
      continue;
    }
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    match content {
      DefaultFile::Json(object) => write_json(&path, &Value::Object(object.clone()))?,
      DefaultFile::Lines(lines) => {
        let mut text = lines.join("\n");
        text.push('\n');
        std::fs::write(&path, text).map_err(|source| ConfigError::Write {
          path: path.clone(),
          source,
        })?;
      }
      DefaultFile::CopyFrom(name) => {
        let source_path = root.dir.join(name);
        let bytes = std::fs::read(&source_path).map_err(|source| ConfigError::Read {
          path: source_path,
          source,
        })?;
        std::fs::write(&path, bytes).map_err(|source| ConfigError::Write {
          path: path.clone(),
          source,
        })?;
      }
    }
    debug!(path = %path.display(), "wrote default file");
    written.push(path);
  }
  Ok(written)
}
