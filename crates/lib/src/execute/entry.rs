//! Entry-point execution contract.
//!
//! A built module is executed by handing its runtime artifact to the runtime
//! command together with the invocation context: the caller's working
//! directory and the forwarded arguments. The program's own exit status is
//! carried back as the exit code of the failure.

use std::path::{Path, PathBuf};

use tracing::info;

use super::tool::{ToolCommand, ToolOutcome, run_tool};

/// Environment variable telling the program which module it was loaded from.
pub const MODULE_ENV: &str = "TREEBUILD_MODULE";

/// What an entry point receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
  pub cwd: PathBuf,
  pub args: Vec<String>,
}

/// Run `artifact` with the runtime argv prefix `runtime`.
///
/// Returns the raw [`ToolOutcome`]; callers decide which error it becomes.
pub fn run_entry(runtime: &[String], artifact: &Path, module_dir: &Path, ctx: &InvocationContext) -> ToolOutcome {
  info!(artifact = %artifact.display(), args = ?ctx.args, "invoking entry point");

  let cmd = ToolCommand::from_argv(runtime, &ctx.cwd)
    .arg(artifact.to_string_lossy())
    .args(ctx.args.iter().cloned())
    .env(MODULE_ENV, module_dir.to_string_lossy());

  run_tool(&cmd)
}
