//! The project coordinator.
//!
//! [`ProjectContext`] owns everything a build needs: the component graph,
//! the toolset, the global option lists and the process-wide caches. The
//! lifecycle is configure -> (clean) -> build over a selection of component
//! names (or `*` for all).

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::builder::configure::configure_component;
use crate::builder::scheduler::run_compile_jobs;
use crate::builder::stale::MtimeCache;
use crate::builder::{artifact, GlobalOptions, Toolset};
use crate::core::component::{Component, ComponentId, ComponentKind};
use crate::core::graph::ComponentGraph;
use crate::error::BuildError;
use crate::util::fs::ensure_dir;
use crate::util::shell::Shell;

/// Subdirectory of the output tree holding per-component build files.
const COMPONENTS_DIR: &str = "components";

/// Extensions removed by `clean`; sentinels and final artifacts survive.
const CLEAN_EXTENSIONS: &[&str] = &["o", "obj", "dep"];

/// Owned project state threaded through configure and build.
#[derive(Debug)]
pub struct ProjectContext {
    project_path: PathBuf,
    output_path: PathBuf,
    pub globals: GlobalOptions,
    toolset: Toolset,
    graph: ComponentGraph,
    parallelism: usize,
    shell: Shell,
    mtime_cache: MtimeCache,
    fs_lock: Mutex<()>,
}

impl ProjectContext {
    /// Create a project rooted at `project_path`, with build files under
    /// `output_path` (created if missing).
    pub fn new(
        project_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        toolset: Toolset,
    ) -> Result<Self> {
        let project_path = project_path.into();
        let output_path = output_path.into();
        ensure_dir(&output_path)?;

        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Ok(ProjectContext {
            project_path,
            output_path,
            globals: GlobalOptions::default(),
            toolset,
            graph: ComponentGraph::new(),
            parallelism,
            shell: Shell::default(),
            mtime_cache: MtimeCache::new(),
            fs_lock: Mutex::new(()),
        })
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn toolset(&self) -> &Toolset {
        &self.toolset
    }

    pub fn toolset_mut(&mut self) -> &mut Toolset {
        &mut self.toolset
    }

    pub fn graph(&self) -> &ComponentGraph {
        &self.graph
    }

    /// Number of compile workers; defaults to the hardware concurrency.
    pub fn set_parallelism(&mut self, parallelism: usize) {
        self.parallelism = parallelism.max(1);
    }

    pub fn set_shell(&mut self, shell: Shell) {
        self.shell = shell;
    }

    /// Register a component. Its output directory is keyed by the unique
    /// component name, so output paths never collide.
    pub fn add_component(
        &mut self,
        kind: ComponentKind,
        name: &str,
        script_origin: impl Into<PathBuf>,
        root_path: impl Into<PathBuf>,
    ) -> Result<ComponentId, BuildError> {
        let output = self.output_path.join(COMPONENTS_DIR).join(name);
        self.graph.add(kind, name, script_origin, root_path, output)
    }

    pub fn component(&self, id: ComponentId) -> &Component {
        self.graph.get(id)
    }

    pub fn component_mut(&mut self, id: ComponentId) -> &mut Component {
        self.graph.get_mut(id)
    }

    pub fn add_library(
        &mut self,
        target: ComponentId,
        library: ComponentId,
    ) -> Result<(), BuildError> {
        self.graph.add_library(target, library)
    }

    /// Resolve sources and build the compile-job list for every component,
    /// in registration order.
    pub fn configure(&mut self) -> Result<()> {
        let started = Instant::now();
        for id in self.graph.ids() {
            let name = self.graph.get(id).name().to_string();
            self.shell.phase(format!("Configure [{}]", name));
            let component_started = Instant::now();

            let (jobs, objects) = configure_component(
                &self.graph,
                id,
                &self.toolset,
                &self.globals,
                &self.mtime_cache,
                &self.fs_lock,
            )
            .with_context(|| format!("failed to configure component `{}`", name))?;

            tracing::debug!(
                "[{}] {} stale of {} sources ({:.3}s)",
                name,
                jobs.len(),
                objects.len(),
                component_started.elapsed().as_secs_f64()
            );
            self.graph.get_mut(id).set_configure_results(jobs, objects);
        }
        tracing::info!(
            "project configure done in {:.3}s",
            started.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// Build the selected components (name list, or `*` for all in reverse
    /// registration order).
    pub fn build(&self, selection: &[String]) -> Result<()> {
        let started = Instant::now();
        let selected = self.select(selection, true)?;

        for id in selected {
            self.build_component(id)
                .with_context(|| format!("failed to build component `{}`", self.graph.get(id).name()))?;
        }

        let (hits, misses) = self.mtime_cache.stats();
        tracing::info!(
            "project build done in {:.3}s (file time cache {}/{})",
            started.elapsed().as_secs_f64(),
            hits,
            hits + misses
        );
        Ok(())
    }

    fn build_component(&self, id: ComponentId) -> Result<(), BuildError> {
        let component = self.graph.get(id);
        let artifact_path =
            artifact::artifact_path(component, &self.toolset.archiver, &self.toolset.linker);

        // Nothing stale and an artifact on disk: nothing to do. The artifact
        // itself is never compared against its inputs.
        if component.compile_jobs().is_empty() && artifact_path.exists() {
            tracing::debug!("[{}] up to date", component.name());
            return Ok(());
        }

        if !component.compile_jobs().is_empty() {
            self.shell.phase(format!("Build [{}]", component.name()));
            run_compile_jobs(
                component.name(),
                component.compile_jobs(),
                self.parallelism,
                &self.shell,
            )?;
        }

        artifact::assemble_component(
            &self.graph,
            id,
            &self.toolset.archiver,
            &self.toolset.linker,
            &self.globals.link_options,
            &self.shell,
        )
    }

    /// Remove object and dependency files of the selected components.
    /// Sentinels and final artifacts are kept so the next configure can
    /// reuse them.
    pub fn clean(&self, selection: &[String]) -> Result<()> {
        let selected = self.select(selection, false)?;
        for id in selected {
            let component = self.graph.get(id);
            self.shell.phase(format!(
                "Clean [{}] @ {}",
                component.name(),
                component.output_path().display()
            ));
            if !component.output_path().exists() {
                continue;
            }

            for entry in WalkDir::new(component.output_path()) {
                let entry = entry.map_err(|e| BuildError::FileSystemError {
                    path: component.output_path().to_path_buf(),
                    message: e.to_string(),
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let extension = entry
                    .path()
                    .extension()
                    .map(|e| e.to_string_lossy().to_lowercase())
                    .unwrap_or_default();
                if CLEAN_EXTENSIONS.contains(&extension.as_str()) {
                    tracing::trace!(" - delete {}", entry.path().display());
                    std::fs::remove_file(entry.path())
                        .map_err(|e| BuildError::fs(entry.path(), e))?;
                }
            }
        }
        Ok(())
    }

    /// Resolve a selection to component ids. `*` selects every component;
    /// with `reverse` set the wildcard order is reversed so that libraries
    /// declared after their users build first.
    fn select(&self, selection: &[String], reverse: bool) -> Result<Vec<ComponentId>, BuildError> {
        if selection.iter().any(|s| s == "*") {
            let ids: Vec<_> = if reverse {
                self.graph.ids().rev().collect()
            } else {
                self.graph.ids().collect()
            };
            return Ok(ids);
        }

        selection
            .iter()
            .map(|name| {
                self.graph
                    .by_name(name)
                    .ok_or_else(|| BuildError::ComponentNotFound { name: name.clone() })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::standard::{CStandard, Standard};
    use crate::toolchain::{Archiver, Compiler, Linker};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn known_toolset() -> Toolset {
        let mut toolset = Toolset::new(
            Archiver::with_known_version("ar", "GNU ar 2.41").unwrap(),
            Linker::with_known_version("gcc", "gcc (GNU) 13.2.0").unwrap(),
        );
        toolset.c = Some(Arc::new(
            Compiler::with_known_version("gcc", Standard::C(CStandard::C11), "gcc (GNU) 13.2.0")
                .unwrap(),
        ));
        toolset
    }

    fn project(tmp: &TempDir) -> ProjectContext {
        ProjectContext::new(tmp.path(), tmp.path().join("build"), known_toolset()).unwrap()
    }

    #[test]
    fn test_output_paths_are_unique_per_component() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = project(&tmp);
        let a = ctx
            .add_component(ComponentKind::Library, "a", tmp.path(), tmp.path())
            .unwrap();
        let b = ctx
            .add_component(ComponentKind::Library, "b", tmp.path(), tmp.path())
            .unwrap();
        assert_ne!(
            ctx.component(a).output_path(),
            ctx.component(b).output_path()
        );
    }

    #[test]
    fn test_wildcard_build_selection_is_reversed() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = project(&tmp);
        let app = ctx
            .add_component(ComponentKind::Executable, "app", tmp.path(), tmp.path())
            .unwrap();
        let lib = ctx
            .add_component(ComponentKind::Library, "lib", tmp.path(), tmp.path())
            .unwrap();

        let selected = ctx.select(&["*".to_string()], true).unwrap();
        assert_eq!(selected, vec![lib, app]);

        let cleaned = ctx.select(&["*".to_string()], false).unwrap();
        assert_eq!(cleaned, vec![app, lib]);
    }

    #[test]
    fn test_unknown_component_selection_fails() {
        let tmp = TempDir::new().unwrap();
        let ctx = project(&tmp);
        let err = ctx.select(&["ghost".to_string()], true).unwrap_err();
        assert!(matches!(err, BuildError::ComponentNotFound { .. }));
    }

    #[test]
    fn test_clean_removes_objects_keeps_sentinels() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = project(&tmp);
        let id = ctx
            .add_component(ComponentKind::Library, "demo", tmp.path(), tmp.path())
            .unwrap();

        let out = ctx.component(id).output_path().to_path_buf();
        std::fs::create_dir_all(&out).unwrap();
        for file in ["a.c.o", "a.c.dep", "a.c.tmp", "a.c.dep.tmp", "demo.a"] {
            std::fs::write(out.join(file), "x").unwrap();
        }

        ctx.clean(&["demo".to_string()]).unwrap();

        assert!(!out.join("a.c.o").exists());
        assert!(!out.join("a.c.dep").exists());
        assert!(out.join("a.c.tmp").exists());
        assert!(out.join("a.c.dep.tmp").exists());
        assert!(out.join("demo.a").exists());
    }
}
