//! Built-in defaults for the root marker file.

/// Values used for every key the root marker leaves out.
pub const ROOT_TEMPLATE: &str = r#"{
  "gitignore": true,
  "svnignore": false,
  "compiler": ["tsc", "--project", "tsconfig.json"],
  "installer": ["npm", "install", "--no-save"],
  "runtime": ["node"],
  "defaults": {},
  "filter": null
}
"#;

/// Remediation text shown when no root marker can be found.
pub const NOT_IN_TREE_HINT: &str =
  "run from inside a development root, or create an empty `{}` treebuild.json at the top of your module tree";
