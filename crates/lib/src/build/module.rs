//! Per-module configuration and the registry owning it for one invocation.

use std::collections::HashMap;
use std::ops::{Index, IndexMut};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use indexmap::IndexSet;

use crate::consts::{
  CONFIG_FILE, DECLARATION_DIR, DECLARATION_EXT, LIBRARY_EXEC, LINK_DIR, MANIFEST_FILE, MAP_EXT, RUNTIME_DIR,
  RUNTIME_EXT, SOURCE_EXT, TEST_EXEC, TEST_PREFIX, TESTING_DIR,
};

/// Index of a module in a [`ModuleRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(usize);

/// Progress of a module through one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitState {
  #[default]
  Unvisited,
  /// Dependencies are being resolved; seeing this again means a cycle.
  Configuring,
  /// Configured; building, tidying or testing is in progress.
  Configured,
  /// The compiler is running for this module.
  Building,
  Done,
}

#[derive(Debug, Clone)]
pub struct ModuleConfig {
  /// Absolute path of the module directory; the module's identity.
  pub module_path: PathBuf,
  /// Directory name, or the parent's name for a test submodule.
  pub name: String,
  pub is_test_variant: bool,
  pub entry_file: PathBuf,
  /// Sibling modules declared as dependencies, in declaration order.
  pub local_dependencies: IndexSet<PathBuf>,
  /// Transitive closure of `local_dependencies`, first-seen order.
  pub all_dependencies: IndexSet<PathBuf>,
  pub built_at: Option<SystemTime>,
  /// When the module's externally visible artifact last changed.
  pub changed_at: Option<SystemTime>,
  pub testing_config: Option<ModuleId>,
  /// The library module a test submodule belongs to.
  pub parent: Option<ModuleId>,
  pub building: bool,
  pub state: VisitState,
}

impl ModuleConfig {
  /// A library module at `module_path`.
  pub fn library(module_path: PathBuf) -> Self {
    let name = module_path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    let entry_file = module_path.join(format!("{}.{}", LIBRARY_EXEC, SOURCE_EXT));
    Self::new(module_path, name, false, entry_file, None)
  }

  /// The test submodule of `parent`, living in its `testing` directory.
  pub fn test_variant(parent: &ModuleConfig, parent_id: ModuleId) -> Self {
    let module_path = parent.testing_dir();
    let entry_file = module_path.join(format!("{}.{}", TEST_EXEC, SOURCE_EXT));
    Self::new(module_path, parent.name.clone(), true, entry_file, Some(parent_id))
  }

  fn new(module_path: PathBuf, name: String, is_test_variant: bool, entry_file: PathBuf, parent: Option<ModuleId>) -> Self {
    Self {
      module_path,
      name,
      is_test_variant,
      entry_file,
      local_dependencies: IndexSet::new(),
      all_dependencies: IndexSet::new(),
      built_at: None,
      changed_at: None,
      testing_config: None,
      parent,
      building: false,
      state: VisitState::Unvisited,
    }
  }

  /// Name used for the compiled artifact and the package.
  pub fn output_name(&self) -> String {
    if self.is_test_variant {
      format!("{}{}", TEST_PREFIX, self.name)
    } else {
      self.name.clone()
    }
  }

  pub fn exec_name(&self) -> &'static str {
    if self.is_test_variant { TEST_EXEC } else { LIBRARY_EXEC }
  }

  /// Label used in logs and cycle reports.
  pub fn label(&self) -> String {
    if self.is_test_variant {
      format!("{}/{}", self.name, TESTING_DIR)
    } else {
      self.name.clone()
    }
  }

  pub fn config_file(&self) -> PathBuf {
    self.module_path.join(CONFIG_FILE)
  }

  pub fn manifest_file(&self) -> PathBuf {
    self.module_path.join(MANIFEST_FILE)
  }

  pub fn link_dir(&self) -> PathBuf {
    self.module_path.join(LINK_DIR)
  }

  pub fn testing_dir(&self) -> PathBuf {
    self.module_path.join(TESTING_DIR)
  }

  /// True if this library module has a test source in its `testing` directory.
  pub fn has_tests(&self) -> bool {
    !self.is_test_variant
      && self
        .testing_dir()
        .join(format!("{}.{}", TEST_EXEC, SOURCE_EXT))
        .is_file()
  }

  /// Where the compiler writes its runtime output.
  pub fn compiler_output(&self) -> PathBuf {
    self
      .module_path
      .join(RUNTIME_DIR)
      .join(format!("{}.{}", self.exec_name(), RUNTIME_EXT))
  }

  /// The canonical compiled artifact.
  pub fn output_artifact(&self) -> PathBuf {
    self
      .module_path
      .join(RUNTIME_DIR)
      .join(format!("{}.{}", self.output_name(), RUNTIME_EXT))
  }

  /// The public interface artifact; test submodules have none.
  pub fn declaration_artifact(&self) -> Option<PathBuf> {
    (!self.is_test_variant).then(|| {
      self
        .module_path
        .join(DECLARATION_DIR)
        .join(format!("{}.{}", LIBRARY_EXEC, DECLARATION_EXT))
    })
  }
}

/// Path of the source map belonging to `artifact`.
pub fn source_map(artifact: &Path) -> PathBuf {
  let mut name = artifact.as_os_str().to_owned();
  name.push(".");
  name.push(MAP_EXT);
  PathBuf::from(name)
}

/// All modules seen by one invocation, keyed by path.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
  modules: Vec<ModuleConfig>,
  by_path: HashMap<PathBuf, ModuleId>,
}

impl ModuleRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn lookup(&self, path: &Path) -> Option<ModuleId> {
    self.by_path.get(path).copied()
  }

  pub fn by_path(&self, path: &Path) -> Option<&ModuleConfig> {
    self.lookup(path).map(|id| &self[id])
  }

  /// Register `module`, or return the id already held for its path.
  pub fn insert(&mut self, module: ModuleConfig) -> ModuleId {
    if let Some(id) = self.lookup(&module.module_path) {
      return id;
    }
    let id = ModuleId(self.modules.len());
    self.by_path.insert(module.module_path.clone(), id);
    self.modules.push(module);
    id
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }
}

impl Index<ModuleId> for ModuleRegistry {
  type Output = ModuleConfig;

  fn index(&self, id: ModuleId) -> &ModuleConfig {
    &self.modules[id.0]
  }
}

impl IndexMut<ModuleId> for ModuleRegistry {
  fn index_mut(&mut self, id: ModuleId) -> &mut ModuleConfig {
    &mut self.modules[id.0]
  }
}
