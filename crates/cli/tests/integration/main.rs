//! CLI integration tests for tbuild.

#![cfg(unix)]

mod build_tests;
