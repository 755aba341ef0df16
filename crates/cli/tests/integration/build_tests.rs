//! Build, configure, tidy and test-stage integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

fn simple_and_chain() -> TestEnv {
  let env = TestEnv::new();
  env.module("simple", "export SIMPLE=1\n", &[]);
  env.module("chain-a", "export CHAIN=1\n", &["simple"]);
  env
}

#[test]
fn builds_module_and_dependencies() {
  let env = simple_and_chain();

  env
    .tbuild_cmd()
    .arg("chain-a")
    .assert()
    .success()
    .stdout(predicate::str::contains("Compiled 2 module(s)"))
    .stdout(predicate::str::contains("Compiled: simple, chain-a"));

  assert!(env.path("chain-a/runtime/chain-a.js").is_file());
  assert!(env.path("simple/declaration/main.d.ts").is_file());
  assert!(env.path("chain-a/node_modules/simple").exists());
  assert!(env.path("simple/package.json").is_file());
}

#[test]
fn second_build_is_up_to_date() {
  let env = simple_and_chain();
  env.tbuild_cmd().arg("chain-a").assert().success();

  env
    .tbuild_cmd()
    .arg("chain-a")
    .assert()
    .success()
    .stdout(predicate::str::contains("Up to date"))
    .stdout(predicate::str::contains("Up to date: simple, chain-a"));
}

#[test]
fn builds_module_in_current_directory() {
  let env = simple_and_chain();

  env
    .tbuild_cmd()
    .current_dir(env.path("simple"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Compiled: simple"));
}

#[test]
fn compile_failure_exits_with_compiler_code() {
  let env = simple_and_chain();
  env.tbuild_cmd().arg("chain-a").assert().success();
  let declaration = std::fs::read_to_string(env.path("simple/declaration/main.d.ts")).unwrap();

  env.write_file("simple/main.ts", "export OTHER=1\nCOMPILE_ERROR\n");
  env
    .tbuild_cmd()
    .arg("chain-a")
    .assert()
    .code(2)
    .stderr(predicate::str::contains("error in main.ts"))
    .stderr(predicate::str::contains("exit code 2"));

  assert_eq!(
    std::fs::read_to_string(env.path("simple/declaration/main.d.ts")).unwrap(),
    declaration
  );
  assert!(!env.path("simple/runtime/simple.js").exists());
}

#[test]
fn cycle_exits_with_one() {
  let env = TestEnv::new();
  env.module("a", "export A=1\n", &["b"]);
  env.module("b", "export B=1\n", &["a"]);

  env
    .tbuild_cmd()
    .arg("a")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("dependency cycle detected: a -> b -> a"));
  assert!(!env.path("a/runtime").exists());
}

#[test]
fn configure_only_generates_files() {
  let env = simple_and_chain();

  env
    .tbuild_cmd()
    .args(["--configure", "chain-a"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Configured 2 module(s)"));

  assert!(env.path("chain-a/tsconfig.json").is_file());
  assert!(env.path("chain-a/.gitignore").is_file());
  assert!(!env.path("chain-a/runtime").exists());
}

#[test]
fn tidy_strips_search_paths() {
  let env = simple_and_chain();

  env
    .tbuild_cmd()
    .args(["--tidy", "chain-a"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Tidied: chain-a/tsconfig.json"));

  let config = std::fs::read_to_string(env.path("chain-a/tsconfig.json")).unwrap();
  assert!(!config.contains("\"paths\""));
}

#[test]
fn only_skips_dependency_builds() {
  let env = simple_and_chain();

  env
    .tbuild_cmd()
    .args(["--only", "chain-a"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Compiled: chain-a"));

  assert!(!env.path("simple/runtime").exists());
}

#[test]
fn tests_run_by_default() {
  let env = TestEnv::new();
  env.module("simple", "export SIMPLE=1\n", &[]);
  env.write_file("simple/testing/test.ts", "echo 'tests passed' >&2\n");

  env
    .tbuild_cmd()
    .arg("simple")
    .assert()
    .success()
    .stderr(predicate::str::contains("tests passed"))
    .stdout(predicate::str::contains("Tested: simple/testing"));
}

#[test]
fn failing_tests_exit_with_their_code() {
  let env = TestEnv::new();
  env.module("simple", "export SIMPLE=1\n", &[]);
  env.write_file("simple/testing/test.ts", "exit 3\n");

  env
    .tbuild_cmd()
    .arg("simple")
    .assert()
    .code(3)
    .stderr(predicate::str::contains("tests in"));

  env.tbuild_cmd().args(["--build", "simple"]).assert().success();
}

#[test]
fn verbose_logs_to_stderr() {
  let env = simple_and_chain();

  env
    .tbuild_cmd()
    .args(["-v", "simple"])
    .assert()
    .success()
    .stderr(predicate::str::contains("configured"));
}
