//! Fixture builder for development roots driven by a fake toolchain.
//!
//! The compiler is a shell script that copies `main.ts` (or `test.ts`) to
//! `runtime/`, writes the `export` lines of a library as its declaration, logs
//! the directory it ran in and fails on `COMPILE_ERROR`. The runtime is
//! `/bin/sh`, so module sources are shell scripts.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde_json::{Value, json};
use tempfile::TempDir;
use treebuild_lib::build::{BuildError, BuildOptions, BuildScope, StageSet};
use treebuild_lib::driver::{Invocation, InvocationResult};

const FAKE_COMPILER: &str = r#"sleep 0.05
echo "$PWD" >> "$TREEBUILD_TEST_LOG"
if [ -f main.ts ]; then exe=main; else exe=test; fi
mkdir -p runtime
cp "$exe.ts" "runtime/$exe.js"
echo '{}' > "runtime/$exe.js.map"
if [ "$exe" = main ]; then
  mkdir -p declaration
  grep '^export' main.ts > declaration/main.d.ts || true
  echo '{}' > declaration/main.d.ts.map
fi
if grep -q COMPILE_ERROR "$exe.ts"; then exit 2; fi
exit 0
"#;

pub struct Tree {
  _temp: TempDir,
  pub dir: PathBuf,
  pub log: PathBuf,
}

impl Tree {
  /// An empty development root wired to the fake toolchain.
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let dir = dunce::canonicalize(temp.path()).unwrap();
    let log = dir.join("compile.log");
    let script = dir.join("fakec.sh");
    std::fs::write(&script, FAKE_COMPILER).unwrap();

    let marker = json!({
      "compiler": ["/bin/sh", "-c", format!("TREEBUILD_TEST_LOG='{}' exec /bin/sh '{}'", log.display(), script.display())],
      "installer": ["/bin/sh", "-c", "exit 0", "install"],
      "runtime": ["/bin/sh"],
    });
    std::fs::write(dir.join("treebuild.json"), marker.to_string()).unwrap();

    Self { _temp: temp, dir, log }
  }

  /// Add a library module with a manifest declaring `deps`.
  pub fn module(&self, name: &str, source: &str, deps: &[&str]) -> PathBuf {
    let dir = self.dir.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("main.ts"), source).unwrap();

    let dependencies: serde_json::Map<String, Value> = deps.iter().map(|d| (d.to_string(), json!("*"))).collect();
    let manifest = json!({
      "name": name,
      "main": format!("runtime/{}.js", name),
      "types": "declaration/main.d.ts",
      "dependencies": dependencies,
    });
    std::fs::write(dir.join("package.json"), manifest.to_string()).unwrap();
    dir
  }

  /// Give `module` a test submodule with `source` as its test script.
  pub fn tests(&self, module: &str, source: &str) -> PathBuf {
    let dir = self.dir.join(module).join("testing");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("test.ts"), source).unwrap();
    dir
  }

  pub fn path(&self, relative: &str) -> PathBuf {
    self.dir.join(relative)
  }

  pub fn write(&self, relative: &str, content: &str) {
    std::fs::write(self.path(relative), content).unwrap();
  }

  pub fn invocation(&self, module: &str, stages: StageSet, scope: BuildScope) -> Invocation {
    let mut invocation = Invocation::new(self.path(module), &self.dir);
    invocation.options = BuildOptions { stages, scope };
    invocation
  }

  pub fn build(&self, module: &str) -> Result<InvocationResult, BuildError> {
    self.invocation(module, StageSet::Build, BuildScope::All).invoke()
  }

  /// Modules the compiler ran for, relative to the root, then clear the log.
  pub fn take_compiled(&self) -> Vec<String> {
    let log = std::fs::read_to_string(&self.log).unwrap_or_default();
    let _ = std::fs::remove_file(&self.log);
    log
      .lines()
      .map(|line| {
        Path::new(line)
          .strip_prefix(&self.dir)
          .unwrap_or(Path::new(line))
          .to_string_lossy()
          .into_owned()
      })
      .collect()
  }

  pub fn mtime(&self, relative: &str) -> SystemTime {
    std::fs::metadata(self.path(relative)).unwrap().modified().unwrap()
  }

  pub fn read(&self, relative: &str) -> String {
    std::fs::read_to_string(self.path(relative)).unwrap()
  }

  pub fn read_json(&self, relative: &str) -> Value {
    serde_json::from_str(&self.read(relative)).unwrap()
  }
}
