//! Dependency linking.
//!
//! Every dependency declared in a module's manifest is either a sibling module
//! directly under the development root (local) or a package from the
//! registry (external). Local dependencies are linked into the module's
//! `node_modules`; external ones are installed once, when nothing exists at
//! their link path yet.

use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::build::ModuleConfig;
use crate::devroot::{ConfigError, DevRoot};
use crate::execute::{ToolCommand, ToolOutcome, run_tool};
use crate::platform::link::{entry_exists, link_dir};
use crate::util::json::read_json;

#[derive(Debug, Error)]
pub enum LinkError {
  #[error(transparent)]
  Manifest(#[from] ConfigError),

  #[error("failed to link {} -> {}: {source}", link.display(), target.display())]
  CreateLink {
    link: PathBuf,
    target: PathBuf,
    source: std::io::Error,
  },

  #[error("installing {package} for {} failed: {outcome}", module.display())]
  InstallFailed {
    module: PathBuf,
    package: String,
    outcome: ToolOutcome,
  },
}

/// A dependency as declared in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declared {
  pub name: String,
  pub version: String,
}

/// Dependencies listed under `dependencies` in `manifest`, in declaration order.
///
/// A missing manifest declares nothing.
pub fn declared_dependencies(manifest: &Path) -> Result<Vec<Declared>, ConfigError> {
  let Some(value) = read_json(manifest)? else {
    return Ok(Vec::new());
  };
  let invalid = |reason: String| ConfigError::InvalidManifest {
    path: manifest.to_path_buf(),
    reason,
  };

  match value.get("dependencies") {
    None | Some(Value::Null) => Ok(Vec::new()),
    Some(Value::Object(deps)) => deps
      .iter()
      .map(|(name, version)| match version {
        Value::String(version) => Ok(Declared {
          name: name.clone(),
          version: version.clone(),
        }),
        other => Err(invalid(format!("version of `{}` must be a string, found {}", name, other))),
      })
      .collect(),
    Some(other) => Err(invalid(format!("`dependencies` must be an object, found {}", other))),
  }
}

/// Link and install the dependencies of `module`, returning its local ones.
///
/// `parent` is the library module a test submodule belongs to: it is always
/// linked, and never reported as a local dependency.
pub fn link_dependencies(
  root: &DevRoot,
  module: &ModuleConfig,
  parent: Option<&Path>,
) -> Result<IndexSet<PathBuf>, LinkError> {
  let link_root = module.link_dir();

  if let Some(parent) = parent {
    ensure_link(parent, &link_root.join(&module.name))?;
  }

  let mut locals = IndexSet::new();
  for dep in declared_dependencies(&module.manifest_file())? {
    let link = link_root.join(&dep.name);
    match classify(root, module, parent, &dep) {
      Resolved::Skip => {}
      Resolved::Local(target) => {
        ensure_link(&target, &link)?;
        locals.insert(target);
      }
      Resolved::External if entry_exists(&link) => {
        debug!(package = %dep.name, "already installed");
      }
      Resolved::External => install(root, module, &dep)?,
    }
  }

  Ok(locals)
}

/// Local dependencies of `module` without touching the filesystem.
pub fn local_dependencies(
  root: &DevRoot,
  module: &ModuleConfig,
  parent: Option<&Path>,
) -> Result<IndexSet<PathBuf>, LinkError> {
  let mut locals = IndexSet::new();
  for dep in declared_dependencies(&module.manifest_file())? {
    if let Resolved::Local(target) = classify(root, module, parent, &dep) {
      locals.insert(target);
    }
  }
  Ok(locals)
}

enum Resolved {
  Local(PathBuf),
  External,
  /// The module itself, or a test submodule's parent.
  Skip,
}

fn classify(root: &DevRoot, module: &ModuleConfig, parent: Option<&Path>, dep: &Declared) -> Resolved {
  match root.sibling(&dep.name) {
    Some(target) if parent == Some(target.as_path()) || target == module.module_path => Resolved::Skip,
    Some(target) => Resolved::Local(target),
    None => Resolved::External,
  }
}

fn ensure_link(target: &Path, link: &Path) -> Result<(), LinkError> {
  if entry_exists(link) {
    return Ok(());
  }
  link_dir(target, link).map_err(|source| LinkError::CreateLink {
    link: link.to_path_buf(),
    target: target.to_path_buf(),
    source,
  })
}

fn install(root: &DevRoot, module: &ModuleConfig, dep: &Declared) -> Result<(), LinkError> {
  let package = format!("{}@{}", dep.name, dep.version);
  let cmd = ToolCommand::from_argv(&root.config.installer, &module.module_path).arg(&package);
  info!(module = %module.label(), %package, "installing");

  let outcome = run_tool(&cmd);
  if outcome.is_success() {
    Ok(())
  } else {
    Err(LinkError::InstallFailed {
      module: module.module_path.clone(),
      package,
      outcome,
    })
  }
}
