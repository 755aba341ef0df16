//! Base templates and required fragments for generated module files.
//!
//! A missing file is written as the base template merged with the required
//! fragment. An existing file only has to contain the required fragment.

use serde_json::{Value, json};

use crate::build::ModuleConfig;
use crate::consts::{DECLARATION_DIR, RUNTIME_DIR, RUNTIME_EXT, SOURCE_EXT};

pub fn base_config() -> Value {
  json!({
    "compilerOptions": {
      "target": "es2020",
      "module": "commonjs",
      "moduleResolution": "node",
      "strict": true,
      "esModuleInterop": true,
    }
  })
}

pub fn base_manifest() -> Value {
  json!({
    "version": "0.0.0",
    "license": "UNLICENSED",
    "dependencies": {},
  })
}

/// Compiler settings the build relies on.
pub fn required_config(module: &ModuleConfig) -> Value {
  let source = format!("{}.{}", module.exec_name(), SOURCE_EXT);
  if module.is_test_variant {
    json!({
      "compilerOptions": {
        "outDir": RUNTIME_DIR,
        "declaration": false,
        "sourceMap": true,
        "rootDir": ".",
      },
      "files": [source],
    })
  } else {
    json!({
      "compilerOptions": {
        "outDir": RUNTIME_DIR,
        "declaration": true,
        "declarationDir": DECLARATION_DIR,
        "declarationMap": true,
        "sourceMap": true,
        "rootDir": ".",
      },
      "files": [source],
    })
  }
}

/// Manifest entries that point consumers at the built artifacts.
pub fn required_manifest(module: &ModuleConfig) -> Value {
  if module.is_test_variant {
    json!({
      "name": module.output_name(),
      "private": true,
    })
  } else {
    let declaration = module
      .declaration_artifact()
      .and_then(|d| d.strip_prefix(&module.module_path).ok().map(crate::platform::paths::to_slash))
      .unwrap_or_default();
    json!({
      "name": module.name,
      "main": format!("{}/{}.{}", RUNTIME_DIR, module.name, RUNTIME_EXT),
      "types": declaration,
    })
  }
}
