//! End-to-end tests for treebuild-lib against a fake toolchain.

#![cfg(unix)]

mod common;
mod engine_tests;
