//! tbuild: incremental builds for a tree of sibling modules.

mod cmd;
mod output;

use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use tracing_subscriber::EnvFilter;

use treebuild_lib::build::BuildError;
use treebuild_lib::consts::EXIT_USAGE;

use crate::cmd::BuildArgs;
use crate::output::print_error;

/// Build a module and its local dependencies, then run its tests
#[derive(Parser)]
#[command(name = "tbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging (RUST_LOG takes precedence)
  #[arg(short, long)]
  verbose: bool,

  #[command(flatten)]
  build: BuildArgs,
}

fn main() -> ExitCode {
  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    Err(err) => {
      let _ = err.print();
      return match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
        _ => exit_code(EXIT_USAGE),
      };
    }
  };

  init_logging(cli.verbose);

  match cmd::cmd_build(cli.build) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => match err.downcast_ref::<BuildError>().and_then(BuildError::exit_code) {
      Some(code) => {
        print_error(&err.to_string());
        exit_code(code)
      }
      None => {
        print_error(&format!("{:?}", err));
        ExitCode::FAILURE
      }
    },
  }
}

fn init_logging(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn exit_code(code: i32) -> ExitCode {
  match u8::try_from(code) {
    Ok(0) | Err(_) => ExitCode::FAILURE,
    Ok(code) => ExitCode::from(code),
  }
}
