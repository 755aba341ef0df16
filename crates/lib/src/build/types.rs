//! Errors, options and results of a build invocation.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::consts::EXIT_USAGE;
use crate::devroot::ConfigError;
use crate::execute::ToolOutcome;
use crate::link::LinkError;
use crate::platform::paths::PathError;

/// Errors that abort a build invocation.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The invocation itself is malformed.
  #[error("{0}")]
  Usage(String),

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Link(#[from] LinkError),

  #[error(transparent)]
  Path(#[from] PathError),

  #[error("missing entry source file {}", path.display())]
  MissingEntry { path: PathBuf },

  #[error("dependency cycle detected: {}", chain.join(" -> "))]
  Cycle { chain: Vec<String> },

  #[error("compiling {} failed: {outcome}", module.display())]
  CompileFailed { module: PathBuf, outcome: ToolOutcome },

  #[error("compiler reported success but did not produce {}", path.display())]
  MissingOutput { path: PathBuf },

  #[error("tests in {} failed: {outcome}", module.display())]
  TestsFailed { module: PathBuf, outcome: ToolOutcome },

  #[error("{} has not been built; run without --configure first", module.display())]
  NotBuilt { module: PathBuf },

  #[error("{}: {outcome}", program.display())]
  ProgramFailed { program: PathBuf, outcome: ToolOutcome },

  #[error("io error on {}: {source}", path.display())]
  Io { path: PathBuf, source: std::io::Error },
}

impl BuildError {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    BuildError::Io {
      path: path.into(),
      source,
    }
  }

  /// The distinguished exit code carried by this error, if any.
  ///
  /// Errors without one are unexpected failures: callers print their full
  /// diagnostic chain and exit with 1.
  pub fn exit_code(&self) -> Option<i32> {
    match self {
      BuildError::Usage(_) => Some(EXIT_USAGE),
      BuildError::Config(_)
      | BuildError::Link(LinkError::Manifest(_))
      | BuildError::MissingEntry { .. }
      | BuildError::Cycle { .. }
      | BuildError::NotBuilt { .. } => Some(1),
      BuildError::Link(LinkError::InstallFailed { outcome, .. }) => Some(outcome.exit_code()),
      BuildError::CompileFailed { outcome, .. } | BuildError::TestsFailed { outcome, .. } => Some(outcome.exit_code()),
      BuildError::ProgramFailed { outcome, .. } => match outcome {
        ToolOutcome::SpawnFailure(_) => None,
        outcome => Some(outcome.exit_code()),
      },
      BuildError::Link(LinkError::CreateLink { .. })
      | BuildError::Path(_)
      | BuildError::MissingOutput { .. }
      | BuildError::Io { .. } => None,
    }
  }
}

/// Which stages an invocation runs. Configuration always runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageSet {
  /// Configure only.
  Configure,
  /// Configure and build.
  Build,
  /// Configure, build and tidy.
  Tidy,
  /// Configure, build and test.
  #[default]
  Full,
}

impl StageSet {
  pub fn builds(self) -> bool {
    !matches!(self, StageSet::Configure)
  }

  pub fn tidies(self) -> bool {
    matches!(self, StageSet::Tidy)
  }

  pub fn tests(self) -> bool {
    matches!(self, StageSet::Full)
  }
}

/// Which modules an invocation is allowed to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildScope {
  /// The invoked module and its whole transitive dependency set.
  #[default]
  All,
  /// Only the invoked module; dependencies are configured but not built.
  Target,
  /// Only the invoked module; dependencies are read as they are on disk
  /// without generating files, linking or installing.
  TargetNoResolve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildOptions {
  pub stages: StageSet,
  pub scope: BuildScope,
}

/// Why a module needs compiling. The first failing check wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
  MissingOutput,
  MissingDeclaration,
  SourceNewer,
  ConfigNewer,
  ManifestNewer,
  DependencyChanged(PathBuf),
}

impl fmt::Display for StaleReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StaleReason::MissingOutput => write!(f, "output missing"),
      StaleReason::MissingDeclaration => write!(f, "declaration missing"),
      StaleReason::SourceNewer => write!(f, "source changed"),
      StaleReason::ConfigNewer => write!(f, "config changed"),
      StaleReason::ManifestNewer => write!(f, "manifest changed"),
      StaleReason::DependencyChanged(dep) => write!(f, "dependency {} changed", dep.display()),
    }
  }
}

/// What an invocation did, in visitation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
  pub configured: Vec<PathBuf>,
  pub compiled: Vec<PathBuf>,
  pub up_to_date: Vec<PathBuf>,
  pub tested: Vec<PathBuf>,
  pub tidied: Vec<PathBuf>,
}
