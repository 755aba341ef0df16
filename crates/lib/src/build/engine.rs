//! Depth-first visitation of the module graph.
//!
//! A visit configures a module (generated files, links, dependency lists),
//! visits each local dependency to completion, then decides whether the module
//! itself is stale. Because dependencies finish first, their `changed_at` is
//! final by the time a dependent compares against it.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use tracing::{debug, info};

use super::compile::compile;
use super::module::{ModuleConfig, ModuleId, ModuleRegistry, VisitState};
use super::stale::check_stale;
use super::types::{BuildError, BuildOptions, BuildReport, BuildScope};
use crate::consts::{SOURCE_EXT, TEST_EXEC, TESTING_DIR};
use crate::devroot::DevRoot;
use crate::execute::{InvocationContext, run_entry};
use crate::link;
use crate::materialize::{inject_search_paths, materialize, tidy_search_paths};
use crate::platform::paths::{relative_path, to_slash};
use crate::util::mtime::modified_time_opt;

/// One build invocation over a development root.
pub struct Engine<'r> {
  root: &'r DevRoot,
  options: BuildOptions,
  registry: ModuleRegistry,
  target: Option<ModuleId>,
  /// Modules currently being visited, outermost first.
  stack: Vec<ModuleId>,
  report: BuildReport,
}

impl<'r> Engine<'r> {
  pub fn new(root: &'r DevRoot, options: BuildOptions) -> Self {
    Self {
      root,
      options,
      registry: ModuleRegistry::new(),
      target: None,
      stack: Vec::new(),
      report: BuildReport::default(),
    }
  }

  pub fn registry(&self) -> &ModuleRegistry {
    &self.registry
  }

  pub fn into_report(self) -> BuildReport {
    self.report
  }

  /// Visit the module at `path` as the invoked module.
  ///
  /// A library's test submodule is visited afterwards when the build stage
  /// runs. `path` must be absolute and canonical.
  pub fn visit_target(&mut self, path: &Path) -> Result<ModuleId, BuildError> {
    let id = self.resolve(path)?;
    self.target = Some(id);
    self.visit(id)?;

    if self.options.stages.builds()
      && let Some(tests) = self.testing_config(id)
    {
      self.visit(tests)?;
    }
    Ok(id)
  }

  /// Registry id for the module at `path`, creating it on first sight.
  ///
  /// A `testing` directory below a module resolves to that module's test
  /// submodule.
  pub fn resolve(&mut self, path: &Path) -> Result<ModuleId, BuildError> {
    if let Some(id) = self.registry.lookup(path) {
      return Ok(id);
    }

    if path.file_name() == Some(OsStr::new(TESTING_DIR))
      && let Some(parent) = path.parent()
      && parent != self.root.dir
    {
      let parent_id = self.resolve(parent)?;
      return self.testing_config(parent_id).ok_or_else(|| BuildError::MissingEntry {
        path: path.join(format!("{}.{}", TEST_EXEC, SOURCE_EXT)),
      });
    }

    Ok(self.registry.insert(ModuleConfig::library(path.to_path_buf())))
  }

  fn testing_config(&mut self, id: ModuleId) -> Option<ModuleId> {
    let module = &self.registry[id];
    if module.testing_config.is_some() {
      return module.testing_config;
    }
    if !module.has_tests() {
      return None;
    }

    let variant = ModuleConfig::test_variant(module, id);
    let tests = self.registry.insert(variant);
    self.registry[id].testing_config = Some(tests);
    Some(tests)
  }

  fn visit(&mut self, id: ModuleId) -> Result<(), BuildError> {
    match self.registry[id].state {
      VisitState::Done => return Ok(()),
      VisitState::Unvisited => {}
      VisitState::Configuring | VisitState::Configured | VisitState::Building => return Err(self.cycle(id)),
    }

    if let Some(parent) = self.registry[id].parent {
      self.visit(parent)?;
    }

    self.stack.push(id);
    let result = self.visit_module(id);
    self.stack.pop();
    result
  }

  fn visit_module(&mut self, id: ModuleId) -> Result<(), BuildError> {
    self.configure(id)?;

    let in_boundary = self.in_boundary(id);
    if self.options.stages.builds() && in_boundary {
      self.build_if_stale(id)?;
    } else {
      self.observe(id);
    }

    if self.options.stages.tidies() && in_boundary {
      self.tidy(id)?;
    }
    if self.options.stages.tests() && in_boundary && self.registry[id].is_test_variant {
      self.run_tests(id)?;
    }

    self.registry[id].state = VisitState::Done;
    Ok(())
  }

  fn configure(&mut self, id: ModuleId) -> Result<(), BuildError> {
    self.registry[id].state = VisitState::Configuring;
    let read_only = self.is_read_only(id);

    let module = &self.registry[id];
    if !module.entry_file.is_file() {
      return Err(BuildError::MissingEntry {
        path: module.entry_file.clone(),
      });
    }
    let parent = module.parent.map(|p| self.registry[p].module_path.clone());

    let (locals, regenerated) = if read_only {
      (link::local_dependencies(self.root, module, parent.as_deref())?, false)
    } else {
      let written = materialize(self.root, module)?;
      let locals = link::link_dependencies(self.root, module, parent.as_deref())?;
      (locals, !written.is_empty())
    };

    let mut all = IndexSet::new();
    if let Some(parent) = self.registry[id].parent {
      all.insert(self.registry[parent].module_path.clone());
      all.extend(self.registry[parent].all_dependencies.iter().cloned());
    }
    for dep in &locals {
      let dep_id = self.resolve(dep)?;
      self.visit(dep_id)?;
      all.insert(dep.clone());
      all.extend(self.registry[dep_id].all_dependencies.iter().cloned());
    }
    all.shift_remove(&self.registry[id].module_path);

    if !read_only {
      let entries = self.search_path_entries(id, &all);
      inject_search_paths(&self.registry[id].config_file(), &entries)?;
    }

    let module = &mut self.registry[id];
    info!(
      module = %module.label(),
      local = locals.len(),
      transitive = all.len(),
      regenerated,
      "configured"
    );
    module.local_dependencies = locals;
    module.all_dependencies = all;
    module.state = VisitState::Configured;
    self.report.configured.push(module.module_path.clone());
    Ok(())
  }

  /// Search-path entries from `id` to the declaration of each of `deps`.
  fn search_path_entries(&self, id: ModuleId, deps: &IndexSet<PathBuf>) -> Vec<(String, String)> {
    let from = &self.registry[id].module_path;
    deps
      .iter()
      .filter_map(|dep| {
        let dep = self.registry.by_path(dep)?;
        let declaration = dep.declaration_artifact()?;
        Some((dep.name.clone(), to_slash(&relative_path(from, &declaration))))
      })
      .collect()
  }

  fn build_if_stale(&mut self, id: ModuleId) -> Result<(), BuildError> {
    let module = &self.registry[id];
    match check_stale(module, &self.registry)? {
      None => {
        debug!(module = %module.label(), "up to date");
        let path = module.module_path.clone();
        self.observe(id);
        self.report.up_to_date.push(path);
        Ok(())
      }
      Some(reason) => {
        info!(module = %module.label(), %reason, "stale");
        self.rebuild(id)
      }
    }
  }

  fn rebuild(&mut self, id: ModuleId) -> Result<(), BuildError> {
    if self.registry[id].building {
      return Err(self.cycle(id));
    }
    let module = &mut self.registry[id];
    module.building = true;
    module.state = VisitState::Building;

    let result = compile(self.root, &self.registry[id]);

    let module = &mut self.registry[id];
    module.building = false;
    module.state = VisitState::Configured;
    let compiled = result?;

    module.built_at = Some(compiled.built_at);
    module.changed_at = Some(compiled.changed_at);
    self.report.compiled.push(module.module_path.clone());
    Ok(())
  }

  /// Record timestamps from the artifacts already on disk.
  fn observe(&mut self, id: ModuleId) {
    let module = &mut self.registry[id];
    module.built_at = modified_time_opt(&module.output_artifact());
    module.changed_at = match module.declaration_artifact() {
      Some(declaration) => modified_time_opt(&declaration),
      None => module.built_at,
    };
  }

  fn tidy(&mut self, id: ModuleId) -> Result<(), BuildError> {
    let module = &self.registry[id];
    let names: Vec<String> = module
      .all_dependencies
      .iter()
      .filter_map(|dep| self.registry.by_path(dep))
      .map(|dep| dep.name.clone())
      .collect();

    let config = module.config_file();
    if tidy_search_paths(&config, &names, &self.root.dir)? {
      info!(module = %module.label(), "tidied search paths");
      self.report.tidied.push(config);
    }
    Ok(())
  }

  fn run_tests(&mut self, id: ModuleId) -> Result<(), BuildError> {
    let module = &self.registry[id];
    let artifact = module.output_artifact();
    if !artifact.is_file() {
      return Err(BuildError::NotBuilt {
        module: module.module_path.clone(),
      });
    }

    info!(module = %module.label(), "running tests");
    let ctx = InvocationContext {
      cwd: module.module_path.clone(),
      args: Vec::new(),
    };
    let outcome = run_entry(&self.root.config.runtime, &artifact, &module.module_path, &ctx);
    if !outcome.is_success() {
      return Err(BuildError::TestsFailed {
        module: module.module_path.clone(),
        outcome,
      });
    }

    self.report.tested.push(module.module_path.clone());
    Ok(())
  }

  fn in_boundary(&self, id: ModuleId) -> bool {
    match self.options.scope {
      BuildScope::All => true,
      BuildScope::Target | BuildScope::TargetNoResolve => {
        self.target.is_some() && (self.target == Some(id) || self.registry[id].parent == self.target)
      }
    }
  }

  fn is_read_only(&self, id: ModuleId) -> bool {
    self.options.scope == BuildScope::TargetNoResolve && !self.in_boundary(id)
  }

  fn cycle(&self, id: ModuleId) -> BuildError {
    let start = self.stack.iter().position(|&m| m == id).unwrap_or(0);
    let mut chain: Vec<String> = self.stack[start..].iter().map(|&m| self.registry[m].label()).collect();
    chain.push(self.registry[id].label());
    BuildError::Cycle { chain }
  }
}
