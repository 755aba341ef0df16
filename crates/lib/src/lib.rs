//! treebuild-lib: incremental builds for a tree of sibling modules
//!
//! A development root is a directory holding a `treebuild.json` marker and
//! a set of module directories. Each module compiles on its own and may
//! depend on its siblings. This crate provides:
//! - `devroot`: locating the root and reading its configuration
//! - `materialize`: generated and validated per-module files
//! - `link`: linking local dependencies and installing external ones
//! - `build`: the depth-first incremental build engine
//! - `driver`: a single build-and-maybe-run invocation

pub mod build;
pub mod consts;
pub mod devroot;
pub mod driver;
pub mod execute;
pub mod link;
pub mod materialize;
pub mod platform;
pub mod util;
