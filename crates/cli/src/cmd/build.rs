//! Implementation of the default `tbuild` command.
//!
//! Builds the module at PATH after its local dependencies, runs its tests,
//! and with `--run` executes it with the trailing arguments.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{ArgGroup, Args};
use tracing::debug;

use treebuild_lib::build::{BuildOptions, BuildReport, BuildScope, StageSet};
use treebuild_lib::driver::Invocation;

use crate::output::{format_duration, print_info, print_stat, print_success, relative_names};

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("stage").args(["configure", "build", "tidy"])))]
pub struct BuildArgs {
  /// Module directory, or a file inside it
  #[arg(default_value = ".")]
  pub path: PathBuf,

  /// Arguments passed to the program (requires --run)
  #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
  pub args: Vec<String>,

  /// Only generate config files and link dependencies
  #[arg(long)]
  pub configure: bool,

  /// Configure and build, but don't run tests
  #[arg(long)]
  pub build: bool,

  /// Build, then strip dependency search paths from config files
  #[arg(long)]
  pub tidy: bool,

  /// Build only the invoked module, not its dependencies
  #[arg(long)]
  pub only: bool,

  /// With --only, use dependencies as they are without configuring them
  #[arg(long, requires = "only")]
  pub fast: bool,

  /// Run the module after building it
  #[arg(short, long)]
  pub run: bool,
}

impl BuildArgs {
  pub fn options(&self) -> BuildOptions {
    let stages = if self.configure {
      StageSet::Configure
    } else if self.build {
      StageSet::Build
    } else if self.tidy {
      StageSet::Tidy
    } else {
      StageSet::Full
    };
    let scope = match (self.only, self.fast) {
      (true, true) => BuildScope::TargetNoResolve,
      (true, false) => BuildScope::Target,
      (false, _) => BuildScope::All,
    };
    BuildOptions { stages, scope }
  }
}

pub fn cmd_build(args: BuildArgs) -> Result<()> {
  let cwd = std::env::current_dir().context("Failed to read the current directory")?;
  let invocation = Invocation {
    path: cwd.join(&args.path),
    options: args.options(),
    run: args.run,
    args: args.args,
    cwd,
  };
  debug!(?invocation, "starting");

  let start = Instant::now();
  let result = invocation.invoke()?;

  // Keep stdout to the program when it runs.
  if result.program.is_none() {
    print_summary(&result.root, &result.report, start.elapsed());
  }
  Ok(())
}

fn print_summary(root: &Path, report: &BuildReport, elapsed: Duration) {
  let elapsed = format_duration(elapsed);
  if !report.compiled.is_empty() {
    print_success(&format!("Compiled {} module(s) in {}", report.compiled.len(), elapsed));
  } else if !report.up_to_date.is_empty() || !report.tested.is_empty() {
    print_info(&format!("Up to date ({})", elapsed));
  } else {
    print_info(&format!("Configured {} module(s) in {}", report.configured.len(), elapsed));
  }

  for (label, paths) in [
    ("Compiled", &report.compiled),
    ("Up to date", &report.up_to_date),
    ("Tested", &report.tested),
    ("Tidied", &report.tidied),
  ] {
    if !paths.is_empty() {
      print_stat(label, &relative_names(root, paths).join(", "));
    }
  }
}
