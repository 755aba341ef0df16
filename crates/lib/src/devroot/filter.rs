//! Module filter deciding which modules receive default files.

use std::path::Path;

use serde_json::Value;

use crate::util::json::{contains, read_json};

#[derive(Debug, Clone, PartialEq)]
pub enum FileCondition {
  /// The file must exist.
  Exists,
  /// The file must not exist.
  Absent,
  /// The file must exist, parse as JSON and contain this fragment.
  Contains(Value),
}

/// Conditions on files inside a module, all of which must hold.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModuleFilter {
  conditions: Vec<(String, FileCondition)>,
}

impl ModuleFilter {
  /// Parse the `filter` value of the root marker.
  ///
  /// `null` means no filter. Anything else must be an object mapping relative
  /// file paths to `true`, `false` or a JSON object/array fragment.
  pub fn parse(value: &Value) -> Result<Option<Self>, String> {
    let map = match value {
      Value::Null => return Ok(None),
      Value::Object(map) => map,
      other => return Err(format!("expected an object, found {}", other)),
    };

    let mut conditions = Vec::with_capacity(map.len());
    for (file, condition) in map {
      if file.is_empty() || Path::new(file).is_absolute() {
        return Err(format!("`{}` is not a relative file path", file));
      }
      let condition = match condition {
        Value::Bool(true) => FileCondition::Exists,
        Value::Bool(false) => FileCondition::Absent,
        Value::Object(_) | Value::Array(_) => FileCondition::Contains(condition.clone()),
        other => return Err(format!("condition for `{}` must be a boolean, object or array, found {}", file, other)),
      };
      conditions.push((file.clone(), condition));
    }

    Ok(Some(Self { conditions }))
  }

  /// True if the module at `module_dir` satisfies every condition.
  pub fn accepts(&self, module_dir: &Path) -> bool {
    self.conditions.iter().all(|(file, condition)| {
      let path = module_dir.join(file);
      match condition {
        FileCondition::Exists => path.exists(),
        FileCondition::Absent => !path.exists(),
        FileCondition::Contains(fragment) => match read_json(&path) {
          Ok(Some(actual)) => contains(&actual, fragment),
          _ => false,
        },
      }
    })
  }
}
