//! Filesystem helpers: ancestor lookup, relative paths and directory links.

pub mod link;
pub mod paths;
