//! Shared utilities.
//!
//! Structural JSON helpers, file timestamp handling and test helpers.

pub mod json;
pub mod mtime;

#[cfg(test)]
pub mod testutil;
