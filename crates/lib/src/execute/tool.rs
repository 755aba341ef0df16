//! External tool invocation.
//!
//! The compiler, the package installer, test runs, explicitly invoked programs
//! and the `svn` ignore property all run through [`run_tool`]. Tools run
//! synchronously with inherited stdio and no timeout; a hung tool hangs the
//! build.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use tracing::{debug, info};

/// How an external tool finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
  Success,
  /// Exited with a non-zero status.
  NonZeroExit(i32),
  /// Killed by a signal (Unix only).
  Signaled(i32),
  /// Could not be started at all.
  SpawnFailure(String),
}

impl ToolOutcome {
  pub fn is_success(&self) -> bool {
    matches!(self, ToolOutcome::Success)
  }

  /// Process exit code this outcome maps to.
  ///
  /// Signals map to `128 + signal`, as shells report them.
  pub fn exit_code(&self) -> i32 {
    match self {
      ToolOutcome::Success => 0,
      ToolOutcome::NonZeroExit(code) => *code,
      ToolOutcome::Signaled(signal) => 128 + signal,
      ToolOutcome::SpawnFailure(_) => 1,
    }
  }
}

impl fmt::Display for ToolOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ToolOutcome::Success => write!(f, "exited successfully"),
      ToolOutcome::NonZeroExit(code) => write!(f, "exit code {}", code),
      ToolOutcome::Signaled(signal) => write!(f, "terminated by signal {}", signal),
      ToolOutcome::SpawnFailure(message) => write!(f, "failed to start: {}", message),
    }
  }
}

/// A command line plus the directory and environment it runs in.
#[derive(Debug, Clone)]
pub struct ToolCommand {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: PathBuf,
  pub env: BTreeMap<String, String>,
  /// Discard stdout and only log stderr.
  pub quiet: bool,
}

impl ToolCommand {
  /// Build a command from an argv prefix such as `["tsc", "--project", "tsconfig.json"]`.
  pub fn from_argv(argv: &[String], cwd: &Path) -> Self {
    let (program, args) = match argv.split_first() {
      Some((program, args)) => (program.clone(), args.to_vec()),
      None => (String::new(), Vec::new()),
    };
    Self {
      program,
      args,
      cwd: cwd.to_path_buf(),
      env: BTreeMap::new(),
      quiet: false,
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  pub fn quiet(mut self) -> Self {
    self.quiet = true;
    self
  }

  /// The command line as a single string, for logs and messages.
  pub fn command_line(&self) -> String {
    std::iter::once(self.program.as_str())
      .chain(self.args.iter().map(String::as_str))
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// Run a tool to completion.
pub fn run_tool(cmd: &ToolCommand) -> ToolOutcome {
  info!(cmd = %cmd.command_line(), cwd = %cmd.cwd.display(), "running tool");

  if cmd.program.is_empty() {
    return ToolOutcome::SpawnFailure("empty command".to_string());
  }

  let mut command = Command::new(&cmd.program);
  command.args(&cmd.args).current_dir(&cmd.cwd).envs(&cmd.env);

  let status = if cmd.quiet {
    command.stdin(Stdio::null());
    command.output().map(|output| {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if !stderr.is_empty() {
        debug!(stderr = %stderr.trim(), "tool stderr");
      }
      output.status
    })
  } else {
    command.status()
  };

  match status {
    Ok(status) => outcome_of(status),
    Err(e) => ToolOutcome::SpawnFailure(format!("{}: {}", cmd.program, e)),
  }
}

fn outcome_of(status: ExitStatus) -> ToolOutcome {
  if status.success() {
    return ToolOutcome::Success;
  }
  if let Some(code) = status.code() {
    return ToolOutcome::NonZeroExit(code);
  }

  #[cfg(unix)]
  {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = status.signal() {
      return ToolOutcome::Signaled(signal);
    }
  }

  ToolOutcome::NonZeroExit(1)
}
