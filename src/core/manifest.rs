//! The `Caravel.toml` manifest front-end.
//!
//! The manifest is one way to populate a [`ProjectContext`]; embedders can
//! also construct the component graph programmatically. Relative paths in
//! the manifest resolve against the manifest's directory.
//!
//! ```toml
//! [toolchain]
//! c = { path = "arm-none-eabi-gcc", std = "11" }
//! cpp = { path = "arm-none-eabi-g++", std = "17" }
//! linker = "arm-none-eabi-g++"
//! archiver = "arm-none-eabi-ar"
//!
//! [[components]]
//! name = "firmware"
//! kind = "executable"
//! sources = ["src/**.cpp", "!_test"]
//! libraries = ["hal"]
//!
//! [[components]]
//! name = "hal"
//! kind = "library"
//! sources = ["hal/**.c"]
//! public_include_paths = ["hal/include"]
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::builder::Toolset;
use crate::core::component::{ComponentKind, Visibility};
use crate::core::standard::{CStandard, CppStandard, Standard};
use crate::ops::project::ProjectContext;
use crate::toolchain::{Archiver, Compiler, Linker};
use crate::util::fs::normalize_under;

/// Default output directory, relative to the manifest.
const DEFAULT_OUTPUT_DIR: &str = "build";

/// Parsed `Caravel.toml`.
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub project: ProjectTable,
    pub toolchain: ToolchainTable,
    #[serde(default)]
    pub globals: GlobalsTable,
    #[serde(default)]
    pub components: Vec<ComponentTable>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectTable {
    pub name: Option<String>,
    /// Output directory, relative to the manifest. Defaults to `build`.
    pub output: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct ToolchainTable {
    pub c: Option<CompilerSpec>,
    pub cpp: Option<CompilerSpec>,
    pub asm: Option<CompilerSpec>,
    pub linker: ToolSpec,
    pub archiver: ToolSpec,
}

/// A compiler declaration: program plus language standard. A known
/// `version` banner skips the `--version` probe.
#[derive(Debug, Deserialize)]
pub struct CompilerSpec {
    pub path: String,
    pub std: Option<String>,
    pub version: Option<String>,
}

/// A linker/archiver declaration: either a bare program string or a table
/// with an optional known version banner.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ToolSpec {
    Path(String),
    Detailed {
        path: String,
        #[serde(default)]
        version: Option<String>,
    },
}

impl ToolSpec {
    fn path(&self) -> &str {
        match self {
            ToolSpec::Path(path) => path,
            ToolSpec::Detailed { path, .. } => path,
        }
    }

    fn version(&self) -> Option<&str> {
        match self {
            ToolSpec::Path(_) => None,
            ToolSpec::Detailed { version, .. } => version.as_deref(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GlobalsTable {
    pub include_paths: Vec<PathBuf>,
    pub definitions: Vec<String>,
    pub c_options: Vec<String>,
    pub cpp_options: Vec<String>,
    pub asm_options: Vec<String>,
    pub link_options: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ComponentTable {
    pub name: String,
    pub kind: ComponentKind,
    /// Component root, relative to the manifest. Defaults to the manifest
    /// directory.
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Source patterns; `!substring` entries register filters.
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub public_include_paths: Vec<PathBuf>,
    #[serde(default)]
    pub private_include_paths: Vec<PathBuf>,
    #[serde(default)]
    pub public_definitions: Vec<String>,
    #[serde(default)]
    pub private_definitions: Vec<String>,
    #[serde(default)]
    pub public_compile_options: Vec<String>,
    #[serde(default)]
    pub private_compile_options: Vec<String>,
    #[serde(default)]
    pub link_options: Vec<String>,
    #[serde(default)]
    pub linker_script: Option<PathBuf>,
    /// Names of other components in this manifest; forward references are
    /// allowed.
    #[serde(default)]
    pub libraries: Vec<String>,
}

/// Load a project from a manifest file on disk.
pub fn load_project(manifest_path: &Path) -> Result<ProjectContext> {
    let contents = std::fs::read_to_string(manifest_path)
        .with_context(|| format!("failed to read manifest: {}", manifest_path.display()))?;
    let manifest: Manifest = toml::from_str(&contents)
        .with_context(|| format!("failed to parse manifest: {}", manifest_path.display()))?;
    project_from_manifest(manifest, manifest_path)
}

/// Turn a parsed manifest into a fully populated project.
pub fn project_from_manifest(manifest: Manifest, manifest_path: &Path) -> Result<ProjectContext> {
    // A bare `Caravel.toml` has an empty parent; resolve to an absolute
    // path first so component roots and prefix tests stay meaningful.
    let manifest_path = crate::util::fs::normalize_path(manifest_path);
    let manifest_dir = match manifest_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::env::current_dir().context("failed to get current directory")?,
    };
    let output = manifest_dir.join(
        manifest
            .project
            .output
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
    );

    let toolset = build_toolset(&manifest.toolchain)?;
    let mut ctx = ProjectContext::new(&manifest_dir, output, toolset)?;

    ctx.globals.include_paths = manifest
        .globals
        .include_paths
        .iter()
        .map(|p| normalize_under(&manifest_dir, p))
        .collect();
    ctx.globals.definitions = manifest.globals.definitions;
    ctx.globals.c_options = manifest.globals.c_options;
    ctx.globals.cpp_options = manifest.globals.cpp_options;
    ctx.globals.asm_options = manifest.globals.asm_options;
    ctx.globals.link_options = manifest.globals.link_options;

    // First pass registers every component so library references can point
    // forward in the file.
    let mut ids = Vec::new();
    for table in &manifest.components {
        let root = match &table.root {
            Some(root) => normalize_under(&manifest_dir, root),
            None => manifest_dir.clone(),
        };
        let id = ctx
            .add_component(table.kind, &table.name, manifest_path.as_path(), root)
            .with_context(|| format!("invalid component `{}`", table.name))?;

        let component = ctx.component_mut(id);
        component.add_sources(&table.sources);
        for dir in &table.public_include_paths {
            component.add_include_path(Visibility::PUBLIC, dir);
        }
        for dir in &table.private_include_paths {
            component.add_include_path(Visibility::PRIVATE, dir);
        }
        for def in &table.public_definitions {
            component.add_definition(Visibility::PUBLIC, def);
        }
        for def in &table.private_definitions {
            component.add_definition(Visibility::PRIVATE, def);
        }
        for opt in &table.public_compile_options {
            component.add_compile_option(Visibility::PUBLIC, opt);
        }
        for opt in &table.private_compile_options {
            component.add_compile_option(Visibility::PRIVATE, opt);
        }
        for opt in &table.link_options {
            component.add_link_option(opt);
        }
        if let Some(script) = &table.linker_script {
            component.set_linker_script(script);
        }
        ids.push(id);
    }

    for (table, &id) in manifest.components.iter().zip(&ids) {
        for library_name in &table.libraries {
            let Some(library) = ctx.graph().by_name(library_name) else {
                bail!(
                    "component `{}` references unknown library `{}`",
                    table.name,
                    library_name
                );
            };
            ctx.add_library(id, library)
                .with_context(|| format!("invalid library list of `{}`", table.name))?;
        }
    }

    Ok(ctx)
}

fn build_toolset(table: &ToolchainTable) -> Result<Toolset> {
    let archiver = match table.archiver.version() {
        Some(version) => Archiver::with_known_version(table.archiver.path(), version)?,
        None => Archiver::new(table.archiver.path())?,
    };
    let linker = match table.linker.version() {
        Some(version) => Linker::with_known_version(table.linker.path(), version)?,
        None => Linker::new(table.linker.path())?,
    };
    let mut toolset = Toolset::new(archiver, linker);

    if let Some(spec) = &table.c {
        let Some(std) = &spec.std else {
            bail!("toolchain.c requires a `std` field (e.g. std = \"11\")");
        };
        let standard = Standard::C(std.parse::<CStandard>()?);
        toolset.c = Some(Arc::new(make_compiler(spec, standard)?));
    }
    if let Some(spec) = &table.cpp {
        let Some(std) = &spec.std else {
            bail!("toolchain.cpp requires a `std` field (e.g. std = \"17\")");
        };
        let standard = Standard::Cpp(std.parse::<CppStandard>()?);
        toolset.cpp = Some(Arc::new(make_compiler(spec, standard)?));
    }
    if let Some(spec) = &table.asm {
        toolset.asm = Some(Arc::new(make_compiler(spec, Standard::Asm)?));
    }

    Ok(toolset)
}

fn make_compiler(spec: &CompilerSpec, standard: Standard) -> Result<Compiler> {
    let compiler = match &spec.version {
        Some(version) => Compiler::with_known_version(&spec.path, standard, version)?,
        None => Compiler::new(&spec.path, standard)?,
    };
    Ok(compiler)
}
