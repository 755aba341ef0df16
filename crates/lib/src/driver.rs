//! Top-level invocation: locate the root, build the invoked module, and
//! optionally run it.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::build::{BuildError, BuildOptions, BuildReport, Engine, StageSet};
use crate::consts::TESTING_DIR;
use crate::devroot::DevRoot;
use crate::execute::{InvocationContext, ToolOutcome, run_entry};
use crate::platform::paths::canonical;

/// One request to build (and maybe run) a module.
#[derive(Debug, Clone)]
pub struct Invocation {
  /// Module directory or a file inside it.
  pub path: PathBuf,
  pub options: BuildOptions,
  /// Run the module's artifact after building it.
  pub run: bool,
  /// Arguments forwarded to the program; only valid with `run`.
  pub args: Vec<String>,
  /// Working directory the program runs in.
  pub cwd: PathBuf,
}

#[derive(Debug)]
pub struct InvocationResult {
  pub root: PathBuf,
  pub module: PathBuf,
  pub report: BuildReport,
  /// The program's outcome, when it was run and succeeded.
  pub program: Option<ToolOutcome>,
}

impl Invocation {
  /// A plain build of `path` with default options.
  pub fn new(path: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      options: BuildOptions::default(),
      run: false,
      args: Vec::new(),
      cwd: cwd.into(),
    }
  }

  /// Stages actually run: an explicit run builds without testing.
  pub fn effective_options(&self) -> BuildOptions {
    let mut options = self.options;
    if self.run && options.stages == StageSet::Full {
      options.stages = StageSet::Build;
    }
    options
  }

  pub fn invoke(&self) -> Result<InvocationResult, BuildError> {
    if !self.run && !self.args.is_empty() {
      return Err(BuildError::Usage(
        "arguments can only be passed to a module run with --run".to_string(),
      ));
    }

    let root = DevRoot::locate(&self.path)?;
    let path = canonical(&self.path)?;
    let module_dir = if path.is_dir() {
      path
    } else {
      path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.clone())
    };

    if self.run && module_dir.file_name() == Some(OsStr::new(TESTING_DIR)) && module_dir.parent() != Some(root.dir.as_path()) {
      return Err(BuildError::Usage(
        "test submodules run through the test stage, not --run".to_string(),
      ));
    }

    let options = self.effective_options();
    info!(module = %module_dir.display(), ?options, "building");
    let mut engine = Engine::new(&root, options);
    let target = engine.visit_target(&module_dir)?;

    let program = if self.run {
      let module = &engine.registry()[target];
      let artifact = module.output_artifact();
      if !artifact.is_file() {
        return Err(if options.stages.builds() {
          BuildError::MissingOutput { path: artifact }
        } else {
          BuildError::NotBuilt {
            module: module.module_path.clone(),
          }
        });
      }

      let ctx = InvocationContext {
        cwd: self.cwd.clone(),
        args: self.args.clone(),
      };
      let outcome = run_entry(&root.config.runtime, &artifact, &module.module_path, &ctx);
      if !outcome.is_success() {
        return Err(BuildError::ProgramFailed {
          program: artifact,
          outcome,
        });
      }
      Some(outcome)
    } else {
      None
    };

    Ok(InvocationResult {
      root: root.dir.clone(),
      module: module_dir,
      report: engine.into_report(),
      program,
    })
  }
}
