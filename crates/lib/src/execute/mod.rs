//! Running external tools and built programs.
//!
//! - [`tool`] - the single "run external tool" capability and its outcome type
//! - [`entry`] - the entry-point execution contract for built modules

pub mod entry;
pub mod tool;

pub use entry::{InvocationContext, run_entry};
pub use tool::{ToolCommand, ToolOutcome, run_tool};
