//! Timestamp-based staleness.
//!
//! A module is up to date when its compiled output exists (plus its
//! declaration, for libraries), is strictly newer than the source, config and
//! manifest files, and no transitive dependency's interface changed after it.

use std::path::Path;
use super::module::{ModuleConfig, ModuleRegistry};
use super::types::{BuildError, StaleReason};
use crate::util::mtime::{is_newer_than, modified_time, modified_time_opt};

/// Return the first reason `module` must be rebuilt, or `None` if it is up to date.
///
/// Dependencies are looked up in `registry`; they must have been visited so
/// their `changed_at` is known.
pub fn check_stale(module: &ModuleConfig, registry: &ModuleRegistry) -> Result<Option<StaleReason>, BuildError> {
  let output = module.output_artifact();
  let Some(built) = modified_time_opt(&output) else {
    return Ok(Some(StaleReason::MissingOutput));
  };

  if let Some(declaration) = module.declaration_artifact()
    && !declaration.is_file()
  {
    return Ok(Some(StaleReason::MissingDeclaration));
  }

  let inputs = [
    (module.entry_file.clone(), StaleReason::SourceNewer),
    (module.config_file(), StaleReason::ConfigNewer),
    (module.manifest_file(), StaleReason::ManifestNewer),
  ];
  for (input, reason) in inputs {
    if !output_is_newer(&output, &input)? {
      return Ok(Some(reason));
    }
  }

  for dep in &module.all_dependencies {
    let changed = registry.by_path(dep).and_then(|m| m.changed_at);
    if let Some(changed) = changed
      && changed > built
    {
      return Ok(Some(StaleReason::DependencyChanged(dep.clone())));
    }
  }

  Ok(None)
}

fn output_is_newer(output: &Path, input: &Path) -> Result<bool, BuildError> {
  match modified_time(input) {
    Ok(modified) => is_newer_than(modified, output).map_err(|e| BuildError::io(output, e)),
    // Inputs that don't exist can't be newer.
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
    Err(e) => Err(BuildError::io(input, e)),
  }
}
