//! Names and file conventions shared across the crate.

/// File marking the top of a development root.
pub const ROOT_MARKER: &str = "treebuild.json";

pub const CONFIG_FILE: &str = "tsconfig.json";
pub const MANIFEST_FILE: &str = "package.json";
pub const LINK_DIR: &str = "node_modules";

/// Reserved subdirectory holding a module's test submodule.
pub const TESTING_DIR: &str = "testing";

pub const RUNTIME_DIR: &str = "runtime";
pub const DECLARATION_DIR: &str = "declaration";

pub const SOURCE_EXT: &str = "ts";
pub const RUNTIME_EXT: &str = "js";
pub const DECLARATION_EXT: &str = "d.ts";
pub const MAP_EXT: &str = "map";

pub const LIBRARY_EXEC: &str = "main";
pub const TEST_EXEC: &str = "test";
pub const TEST_PREFIX: &str = "test-";

pub const GITIGNORE_FILE: &str = ".gitignore";
pub const NPMIGNORE_FILE: &str = ".npmignore";

/// Exit code for invalid invocations (BSD `EX_USAGE`).
pub const EXIT_USAGE: i32 = 64;
