//! Version control ignore files.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::build::ModuleConfig;
use crate::consts::{GITIGNORE_FILE, NPMIGNORE_FILE};
use crate::devroot::{ConfigError, DevRoot};
use crate::execute::{ToolCommand, run_tool};

pub const GIT_IGNORE: &[&str] = &["node_modules/", "runtime/", "declaration/"];
pub const NPM_IGNORE: &[&str] = &["node_modules/", "testing/", "tsconfig.json", "*.ts", "!*.d.ts"];

/// Write the ignore files `module` is missing. Existing files are left alone.
pub fn write_ignore_files(root: &DevRoot, module: &ModuleConfig) -> Result<Vec<PathBuf>, ConfigError> {
  let mut written = Vec::new();
  if root.config.gitignore {
    let path = module.module_path.join(GITIGNORE_FILE);
    if write_lines_if_missing(&path, GIT_IGNORE)? {
      written.push(path);
    }
  }
  if !module.is_test_variant {
    let path = module.module_path.join(NPMIGNORE_FILE);
    if write_lines_if_missing(&path, NPM_IGNORE)? {
      written.push(path);
    }
  }
  Ok(written)
}

fn write_lines_if_missing(path: &Path, lines: &[&str]) -> Result<bool, ConfigError> {
  if path.exists() {
    return Ok(false);
  }
  let mut content = lines.join("\n");
  content.push('\n');
  debug!(path = %path.display(), "writing ignore file");
  std::fs::write(path, content).map_err(|source| ConfigError::Write {
    path: path.to_path_buf(),
    source,
  })?;
  Ok(true)
}

/// Set `svn:ignore` on `dir`. Failures are logged and otherwise ignored.
pub fn set_svn_ignore(dir: &Path) {
  let patterns = GIT_IGNORE
    .iter()
    .map(|p| p.trim_end_matches('/'))
    .collect::<Vec<_>>()
    .join("\n");
  let cmd = ToolCommand::from_argv(&["svn".to_string()], dir)
    .args(["propset", "svn:ignore"])
    .arg(patterns)
    .arg(".")
    .quiet();

  let outcome = run_tool(&cmd);
  if outcome.is_success() {
    debug!(dir = %dir.display(), "set svn:ignore");
  } else {
    warn!(dir = %dir.display(), %outcome, "could not set svn:ignore");
  }
}
