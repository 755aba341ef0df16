//! The incremental build engine.
//!
//! Modules are visited depth first: every local dependency is configured and
//! built before the module that needs it. A module is recompiled only when it
//! is stale (see [`check_stale`]), and a dependent only sees a dependency as
//! changed when its declaration artifact changed.
//!
//! # Submodules
//!
//! - `module` - per-module configuration and the registry owning it
//! - `stale` - timestamp-based staleness
//! - `compile` - compiler invocation with declaration snapshot/restore
//! - `engine` - the graph visitor

mod compile;
mod engine;
mod module;
mod stale;
mod types;

pub use compile::{Compiled, compile};
pub use engine::Engine;
pub use module::{ModuleConfig, ModuleId, ModuleRegistry, VisitState, source_map};
pub use stale::check_stale;
pub use types::*;
