//! Build engine scenarios: ordering, incrementality and failure recovery.

use serde_json::json;
use treebuild_lib::build::{BuildError, BuildScope, StageSet};

use super::common::Tree;

fn simple_and_chain() -> Tree {
  let tree = Tree::new();
  tree.module("simple", "export SIMPLE=1\necho simple\n", &[]);
  tree.module("chain-a", "export CHAIN=1\necho chain-a\n", &["simple"]);
  tree
}

#[test]
fn first_build_compiles_dependencies_first() {
  let tree = simple_and_chain();

  let result = tree.build("chain-a").unwrap();

  assert_eq!(tree.take_compiled(), vec!["simple", "chain-a"]);
  assert!(tree.path("chain-a/runtime/chain-a.js").is_file());
  assert!(tree.path("chain-a/runtime/chain-a.js.map").is_file());
  assert!(!tree.path("chain-a/runtime/main.js").exists());
  assert!(tree.path("simple/declaration/main.d.ts").is_file());
  assert_eq!(
    std::fs::read_link(tree.path("chain-a/node_modules/simple")).unwrap(),
    std::path::Path::new("../../simple")
  );
  assert_eq!(result.report.compiled, vec![tree.path("simple"), tree.path("chain-a")]);
}

#[test]
fn generated_config_points_at_dependency_declarations() {
  let tree = simple_and_chain();

  tree.build("chain-a").unwrap();

  let config = tree.read_json("chain-a/tsconfig.json");
  assert_eq!(
    config["compilerOptions"]["paths"],
    json!({ "simple": ["../simple/declaration/main.d.ts"] })
  );
  assert_eq!(config["files"], json!(["main.ts"]));
  assert!(tree.path("chain-a/.gitignore").is_file());
  assert!(tree.path("chain-a/.npmignore").is_file());
}

#[test]
fn rebuild_without_changes_is_a_no_op() {
  let tree = simple_and_chain();
  tree.build("chain-a").unwrap();
  tree.take_compiled();
  let simple = tree.mtime("simple/runtime/simple.js");
  let chain = tree.mtime("chain-a/runtime/chain-a.js");
  let config = tree.mtime("chain-a/tsconfig.json");

  let result = tree.build("chain-a").unwrap();

  assert!(tree.take_compiled().is_empty());
  assert!(result.report.compiled.is_empty());
  assert_eq!(result.report.up_to_date, vec![tree.path("simple"), tree.path("chain-a")]);
  assert_eq!(tree.mtime("simple/runtime/simple.js"), simple);
  assert_eq!(tree.mtime("chain-a/runtime/chain-a.js"), chain);
  assert_eq!(tree.mtime("chain-a/tsconfig.json"), config);
}

#[test]
fn unchanged_interface_does_not_cascade() {
  let tree = simple_and_chain();
  tree.build("chain-a").unwrap();
  tree.take_compiled();
  let declaration = tree.mtime("simple/declaration/main.d.ts");

  tree.write("simple/main.ts", "export SIMPLE=1\necho simple, edited\n");
  tree.build("chain-a").unwrap();

  assert_eq!(tree.take_compiled(), vec!["simple"]);
  assert_eq!(tree.mtime("simple/declaration/main.d.ts"), declaration);
}

#[test]
fn changed_interface_rebuilds_dependents() {
  let tree = simple_and_chain();
  tree.build("chain-a").unwrap();
  tree.take_compiled();

  tree.write("simple/main.ts", "export SIMPLE=1\nexport EXTRA=2\n");
  tree.build("chain-a").unwrap();

  assert_eq!(tree.take_compiled(), vec!["simple", "chain-a"]);
}

#[test]
fn change_propagates_through_transitive_dependencies() {
  let tree = simple_and_chain();
  tree.module("chain-b", "export B=1\n", &["chain-a"]);
  tree.build("chain-b").unwrap();
  tree.take_compiled();

  tree.write("simple/main.ts", "export SIMPLE=2\n");
  tree.build("chain-b").unwrap();

  // chain-a's own declaration is unchanged, but chain-b also depends on simple.
  assert_eq!(tree.take_compiled(), vec!["simple", "chain-a", "chain-b"]);
}

#[test]
fn failed_compile_restores_declaration() {
  let tree = simple_and_chain();
  tree.build("chain-a").unwrap();
  tree.take_compiled();
  let content = tree.read("simple/declaration/main.d.ts");
  let mtime = tree.mtime("simple/declaration/main.d.ts");

  tree.write("simple/main.ts", "export BROKEN=1\nCOMPILE_ERROR\n");
  let err = tree.build("chain-a").unwrap_err();

  assert!(matches!(err, BuildError::CompileFailed { .. }));
  assert_eq!(err.exit_code(), Some(2));
  assert_eq!(tree.take_compiled(), vec!["simple"]);
  assert_eq!(tree.read("simple/declaration/main.d.ts"), content);
  assert_eq!(tree.mtime("simple/declaration/main.d.ts"), mtime);
  assert!(!tree.path("simple/runtime/simple.js").exists());
  assert!(!tree.path("simple/runtime/main.js").exists());
  assert!(tree.path("chain-a/runtime/chain-a.js").is_file());
}

#[test]
fn cycle_is_detected_before_compiling() {
  let tree = Tree::new();
  tree.module("a", "export A=1\n", &["b"]);
  tree.module("b", "export B=1\n", &["c"]);
  tree.module("c", "export C=1\n", &["a"]);

  let err = tree.build("a").unwrap_err();

  assert_eq!(err.to_string(), "dependency cycle detected: a -> b -> c -> a");
  assert_eq!(err.exit_code(), Some(1));
  assert!(tree.take_compiled().is_empty());
}

#[test]
fn conflicting_manifest_is_a_configuration_error() {
  let tree = Tree::new();
  let dir = tree.module("simple", "export X=1\n", &[]);
  std::fs::write(dir.join("package.json"), json!({ "name": "other" }).to_string()).unwrap();

  let err = tree.build("simple").unwrap_err();

  assert!(err.to_string().contains("name: expected \"simple\", found \"other\""));
  assert_eq!(err.exit_code(), Some(1));
  assert!(tree.take_compiled().is_empty());
}

#[test]
fn configure_stage_never_compiles() {
  let tree = simple_and_chain();

  let result = tree
    .invocation("chain-a", StageSet::Configure, BuildScope::All)
    .invoke()
    .unwrap();

  assert!(tree.take_compiled().is_empty());
  assert_eq!(result.report.configured, vec![tree.path("simple"), tree.path("chain-a")]);
  assert!(tree.path("chain-a/tsconfig.json").is_file());
  assert!(tree.path("chain-a/node_modules/simple").exists());
}

#[test]
fn tidy_strips_search_paths() {
  let tree = simple_and_chain();

  let result = tree.invocation("chain-a", StageSet::Tidy, BuildScope::All).invoke().unwrap();

  assert_eq!(result.report.tidied, vec![tree.path("chain-a/tsconfig.json")]);
  let config = tree.read_json("chain-a/tsconfig.json");
  assert!(config["compilerOptions"].get("paths").is_none());
  assert_eq!(config["compilerOptions"]["outDir"], json!("runtime"));
}

#[test]
fn tidy_strips_entries_of_dropped_dependencies() {
  let tree = simple_and_chain();
  tree.build("chain-a").unwrap();
  let config = tree.read_json("chain-a/tsconfig.json");
  assert_eq!(
    config["compilerOptions"]["paths"]["simple"],
    json!(["../simple/declaration/main.d.ts"])
  );

  tree.module("chain-a", "export CHAIN=1\necho chain-a\n", &[]);
  tree.invocation("chain-a", StageSet::Tidy, BuildScope::All).invoke().unwrap();

  let config = tree.read_json("chain-a/tsconfig.json");
  assert!(config["compilerOptions"].get("paths").is_none());
}

#[test]
fn target_scope_builds_only_the_invoked_module() {
  let tree = simple_and_chain();

  tree
    .invocation("chain-a", StageSet::Build, BuildScope::Target)
    .invoke()
    .unwrap();

  assert_eq!(tree.take_compiled(), vec!["chain-a"]);
  assert!(tree.path("simple/tsconfig.json").is_file());
  assert!(!tree.path("simple/runtime/simple.js").exists());
}

#[test]
fn no_resolve_scope_leaves_dependencies_untouched() {
  let tree = simple_and_chain();

  tree
    .invocation("chain-a", StageSet::Build, BuildScope::TargetNoResolve)
    .invoke()
    .unwrap();

  assert_eq!(tree.take_compiled(), vec!["chain-a"]);
  assert!(!tree.path("simple/tsconfig.json").exists());
  assert!(!tree.path("simple/.gitignore").exists());
  assert!(tree.path("chain-a/node_modules/simple").exists());
}

#[test]
fn external_dependency_failure_surfaces_installer_code() {
  let tree = Tree::new();
  tree.write(
    "treebuild.json",
    &json!({ "installer": ["/bin/sh", "-c", "exit 9"] }).to_string(),
  );
  tree.module("app", "export APP=1\n", &["left-pad"]);

  let err = tree
    .invocation("app", StageSet::Configure, BuildScope::All)
    .invoke()
    .unwrap_err();

  assert!(err.to_string().contains("left-pad@*"));
  assert_eq!(err.exit_code(), Some(9));
}
