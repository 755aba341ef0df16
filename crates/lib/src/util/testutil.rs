//! Test utilities for treebuild-lib.
//!
//! A development root in tests is driven by a fake toolchain: `/bin/sh`
//! stands in for the runtime, and the "compiler" is a shell script that copies
//! sources into the runtime directory.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde_json::{Value, json};

use super::mtime::set_times;

/// Move a file's timestamps `secs` seconds into the past.
pub fn backdate(path: &Path, secs: u64) {
  let when = SystemTime::now() - Duration::from_secs(secs);
  set_times(path, when, when).unwrap();
}

/// Script body of the fake compiler.
///
/// Copies `main.ts` (or `test.ts`) to `runtime/<exec>.js`, writes the
/// `export` lines of a library source as its declaration, appends the module
/// directory to `log`, and exits 2 after writing outputs when the source
/// contains `COMPILE_ERROR`.
pub fn fake_compiler_script(log: &Path) -> String {
  format!(
    r#"sleep 0.05
echo "$PWD" >> '{log}'
if [ -f main.ts ]; then exe=main; else exe=test; fi
mkdir -p runtime
cp "$exe.ts" "runtime/$exe.js"
echo '{{}}' > "runtime/$exe.js.map"
if [ "$exe" = main ]; then
  mkdir -p declaration
  grep '^export' main.ts > declaration/main.d.ts || true
  echo '{{}}' > declaration/main.d.ts.map
fi
if grep -q COMPILE_ERROR "$exe.ts"; then exit 2; fi
exit 0
"#,
    log = log.display()
  )
}

/// Create a development root in `dir` wired to the fake toolchain.
///
/// Returns the path of the compile log.
pub fn fake_root(dir: &Path) -> PathBuf {
  let log = dir.join("compile.log");
  let script = dir.join("fakec.sh");
  std::fs::write(&script, fake_compiler_script(&log)).unwrap();

  let marker = json!({
    "gitignore": true,
    "compiler": ["/bin/sh", script.to_string_lossy()],
    "installer": ["/bin/sh", "-c", "exit 0", "install"],
    "runtime": ["/bin/sh"],
  });
  std::fs::write(dir.join(crate::consts::ROOT_MARKER), marker.to_string()).unwrap();
  log
}

/// Create a library module with `main.ts` and optional dependencies.
pub fn add_module(root: &Path, name: &str, source: &str, deps: &[&str]) -> PathBuf {
  let dir = root.join(name);
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

/// Directories the fake compiler ran in, in order.
pub fn compile_log(log: &Path) -> Vec<PathBuf> {
  std::fs::read_to_string(log)
    .unwrap_or_default()
    .lines()
    .map(PathBuf::from)
    .collect()
}
