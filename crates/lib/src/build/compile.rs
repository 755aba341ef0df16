//! Running the compiler for one module.
//!
//! The declaration artifact of a library is snapshotted before the compiler
//! runs. A successful compile that produces an identical declaration gets the
//! old timestamps back, so dependents see no interface change. A failed
//! compile, or one that leaves an expected output missing, removes everything
//! it may have produced and puts the snapshot back.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info, warn};

use super::module::{ModuleConfig, source_map};
use super::types::BuildError;
use crate::devroot::DevRoot;
use crate::execute::{ToolCommand, run_tool};
use crate::util::mtime::{FileSnapshot, modified_time};

/// Timestamps recorded by a successful compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compiled {
  pub built_at: SystemTime,
  pub changed_at: SystemTime,
  /// The declaration came out identical and kept its previous timestamps.
  pub interface_unchanged: bool,
}

/// Compile `module` with the root's compiler, in the module directory.
pub fn compile(root: &DevRoot, module: &ModuleConfig) -> Result<Compiled, BuildError> {
  let snapshots = snapshot_declaration(module)?;

  let cmd = ToolCommand::from_argv(&root.config.compiler, &module.module_path);
  info!(module = %module.label(), command = %cmd.command_line(), "compiling");
  let outcome = run_tool(&cmd);

  if !outcome.is_success() {
    return Err(roll_back(
      module,
      &snapshots,
      BuildError::CompileFailed {
        module: module.module_path.clone(),
        outcome,
      },
    ));
  }

  finish(module, &snapshots).map_err(|e| roll_back(module, &snapshots, e))
}

/// Rename the outputs of a successful compiler run and record their times.
fn finish(module: &ModuleConfig, snapshots: &[FileSnapshot]) -> Result<Compiled, BuildError> {
  rename_output(module)?;
  let output = module.output_artifact();
  let built_at = modified_time(&output).map_err(|e| BuildError::io(&output, e))?;

  let Some(declaration) = module.declaration_artifact() else {
    return Ok(Compiled {
      built_at,
      changed_at: built_at,
      interface_unchanged: false,
    });
  };
  if !declaration.is_file() {
    return Err(BuildError::MissingOutput { path: declaration });
  }

  let mut interface_unchanged = false;
  for snapshot in snapshots {
    if snapshot.content_unchanged() {
      snapshot.restore_times().map_err(|e| BuildError::io(&snapshot.path, e))?;
      interface_unchanged |= snapshot.path == declaration;
    }
  }
  if interface_unchanged {
    info!(module = %module.label(), "declaration unchanged; kept previous timestamps");
  }

  let changed_at = modified_time(&declaration).map_err(|e| BuildError::io(&declaration, e))?;
  Ok(Compiled {
    built_at,
    changed_at,
    interface_unchanged,
  })
}

/// Remove whatever the compiler left behind and put the snapshots back.
///
/// Returns `cause` unless the cleanup itself fails. Snapshots are restored
/// even when removing an output fails.
fn roll_back(module: &ModuleConfig, snapshots: &[FileSnapshot], cause: BuildError) -> BuildError {
  let mut cleanup = discard_outputs(module).err();
  for snapshot in snapshots {
    match snapshot.restore() {
      Ok(()) => debug!(path = %snapshot.path.display(), "restored declaration"),
      Err(e) => {
        cleanup.get_or_insert_with(|| BuildError::io(&snapshot.path, e));
      }
    }
  }
  if let Some(e) = cleanup {
    warn!(error = %e, "cleanup after failed compile was incomplete");
  }
  cause
}

fn snapshot_declaration(module: &ModuleConfig) -> Result<Vec<FileSnapshot>, BuildError> {
  let Some(declaration) = module.declaration_artifact() else {
    return Ok(Vec::new());
  };
  let map = source_map(&declaration);

  let mut snapshots = Vec::new();
  for path in [declaration, map] {
    if let Some(snapshot) = FileSnapshot::capture(&path).map_err(|e| BuildError::io(&path, e))? {
      snapshots.push(snapshot);
    }
  }
  Ok(snapshots)
}

/// Move the compiler's default output (and its map) to the canonical name.
fn rename_output(module: &ModuleConfig) -> Result<(), BuildError> {
  let produced = module.compiler_output();
  let canonical = module.output_artifact();
  if !produced.is_file() {
    return Err(BuildError::MissingOutput { path: produced });
  }
  if produced == canonical {
    return Ok(());
  }

  rename(&produced, &canonical)?;
  let produced_map = source_map(&produced);
  if produced_map.is_file() {
    rename(&produced_map, &source_map(&canonical))?;
  }
  Ok(())
}

fn rename(from: &Path, to: &Path) -> Result<(), BuildError> {
  debug!(from = %from.display(), to = %to.display(), "renaming output");
  std::fs::rename(from, to).map_err(|e| BuildError::io(from, e))
}

fn discard_outputs(module: &ModuleConfig) -> Result<(), BuildError> {
  let mut outputs: Vec<PathBuf> = vec![module.compiler_output(), module.output_artifact()];
  outputs.extend(module.declaration_artifact());

  for output in outputs {
    for path in [source_map(&output), output] {
      match std::fs::remove_file(&path) {
        Ok(()) => debug!(path = %path.display(), "removed output"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(BuildError::io(&path, e)),
      }
    }
  }
  Ok(())
}
