//! The component data model.
//!
//! A component is a named buildable unit (static library or executable) with
//! scoped properties, source requests, and library edges. Properties
//! accumulate append-only during configuration-script evaluation; `configure`
//! then turns the component into a list of [`CompileJob`]s.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::toolchain::Compiler;
use crate::util::fs::{normalize_path, normalize_under};

/// What kind of artifact a component produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// Static library (.a / .lib)
    #[serde(alias = "lib", alias = "staticlib")]
    Library,
    /// Executable
    #[serde(alias = "exe", alias = "bin")]
    Executable,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Library => "library",
            ComponentKind::Executable => "executable",
        }
    }
}

/// Visibility bit set for scoped properties.
///
/// A property carries one or both bits. When compiling a component, all of
/// its own properties apply; from a depended-on library only properties with
/// the PUBLIC bit propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Visibility(u8);

impl Visibility {
    pub const NONE: Visibility = Visibility(0);
    pub const PRIVATE: Visibility = Visibility(0b01);
    pub const PUBLIC: Visibility = Visibility(0b10);

    /// Whether any bit of `other` is set in `self`.
    pub fn intersects(self, other: Visibility) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for Visibility {
    type Output = Visibility;

    fn bitor(self, rhs: Visibility) -> Visibility {
        Visibility(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Visibility {
    fn bitor_assign(&mut self, rhs: Visibility) {
        self.0 |= rhs.0;
    }
}

/// A property value paired with its visibility.
#[derive(Debug, Clone)]
pub struct ScopedValue<T> {
    pub visibility: Visibility,
    pub value: T,
}

/// One resolved source file, with the external flag derived from the
/// component root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFilePath {
    pub path: PathBuf,
    /// True iff the parent directory is not inside the component root.
    pub is_external: bool,
}

/// An immutable compile invocation, queued during `configure` and consumed
/// during `build`.
#[derive(Debug, Clone)]
pub struct CompileJob {
    pub compiler: Arc<Compiler>,
    pub source: PathBuf,
    pub object: PathBuf,
    pub dep_file: PathBuf,
    pub argv: Vec<String>,
}

/// Handle to a component inside a [`crate::core::graph::ComponentGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(pub(crate) usize);

/// A named buildable unit.
#[derive(Debug)]
pub struct Component {
    kind: ComponentKind,
    name: String,
    script_origin: PathBuf,
    root_path: PathBuf,
    output_path: PathBuf,

    requested_sources: Vec<String>,
    source_filters: Vec<String>,

    include_paths: Vec<ScopedValue<PathBuf>>,
    definitions: Vec<ScopedValue<String>>,
    compile_options: Vec<ScopedValue<String>>,
    include_path_mask: Visibility,
    definition_mask: Visibility,
    compile_option_mask: Visibility,

    link_options: Vec<String>,
    linker_script: Option<PathBuf>,

    pub(crate) libraries: Vec<ComponentId>,
    pub(crate) users: Vec<ComponentId>,

    compile_jobs: Vec<CompileJob>,
    output_objects: Vec<PathBuf>,
}

impl Component {
    pub(crate) fn new(
        kind: ComponentKind,
        name: impl Into<String>,
        script_origin: impl Into<PathBuf>,
        root_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Component {
            kind,
            name: name.into(),
            script_origin: normalize_path(&script_origin.into()),
            root_path: normalize_path(&root_path.into()),
            output_path: normalize_path(&output_path.into()),
            requested_sources: Vec::new(),
            source_filters: Vec::new(),
            include_paths: Vec::new(),
            definitions: Vec::new(),
            compile_options: Vec::new(),
            include_path_mask: Visibility::NONE,
            definition_mask: Visibility::NONE,
            compile_option_mask: Visibility::NONE,
            link_options: Vec::new(),
            linker_script: None,
            libraries: Vec::new(),
            users: Vec::new(),
            compile_jobs: Vec::new(),
            output_objects: Vec::new(),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn script_origin(&self) -> &Path {
        &self.script_origin
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Add a requested source pattern. Entries starting with `!` register a
    /// substring filter instead.
    pub fn add_source(&mut self, source: impl AsRef<str>) {
        let source = source.as_ref();
        if let Some(filter) = source.strip_prefix('!') {
            tracing::trace!("[{}] add source filter: {}", self.name, filter);
            self.source_filters.push(filter.to_string());
        } else {
            tracing::trace!("[{}] add source: {}", self.name, source);
            self.requested_sources.push(source.to_string());
        }
    }

    pub fn add_sources<I, S>(&mut self, sources: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for source in sources {
            self.add_source(source);
        }
    }

    pub fn requested_sources(&self) -> &[String] {
        &self.requested_sources
    }

    pub fn source_filters(&self) -> &[String] {
        &self.source_filters
    }

    /// Add an include directory. Relative paths resolve against the
    /// component root and the stored value is canonical.
    pub fn add_include_path(&mut self, visibility: Visibility, dir: impl AsRef<Path>) {
        let dir = normalize_under(&self.root_path, dir.as_ref());
        self.include_path_mask |= visibility;
        self.include_paths.push(ScopedValue {
            visibility,
            value: dir,
        });
    }

    /// Add a preprocessor definition (`NAME` or `NAME=VALUE`).
    pub fn add_definition(&mut self, visibility: Visibility, spec: impl Into<String>) {
        self.definition_mask |= visibility;
        self.definitions.push(ScopedValue {
            visibility,
            value: spec.into(),
        });
    }

    /// Add a raw compile option string (split on unescaped spaces later).
    pub fn add_compile_option(&mut self, visibility: Visibility, option: impl Into<String>) {
        self.compile_option_mask |= visibility;
        self.compile_options.push(ScopedValue {
            visibility,
            value: option.into(),
        });
    }

    pub fn add_link_option(&mut self, option: impl Into<String>) {
        self.link_options.push(option.into());
    }

    pub fn set_linker_script(&mut self, script: impl Into<PathBuf>) {
        self.linker_script = Some(script.into());
    }

    pub fn include_paths(&self) -> &[ScopedValue<PathBuf>] {
        &self.include_paths
    }

    pub fn definitions(&self) -> &[ScopedValue<String>] {
        &self.definitions
    }

    pub fn compile_options(&self) -> &[ScopedValue<String>] {
        &self.compile_options
    }

    /// Aggregate visibility masks, for O(1) "does this library propagate
    /// anything" checks.
    pub fn include_path_mask(&self) -> Visibility {
        self.include_path_mask
    }

    pub fn definition_mask(&self) -> Visibility {
        self.definition_mask
    }

    pub fn compile_option_mask(&self) -> Visibility {
        self.compile_option_mask
    }

    pub fn link_options(&self) -> &[String] {
        &self.link_options
    }

    pub fn linker_script(&self) -> Option<&Path> {
        self.linker_script.as_deref()
    }

    pub fn libraries(&self) -> &[ComponentId] {
        &self.libraries
    }

    pub fn users(&self) -> &[ComponentId] {
        &self.users
    }

    pub fn compile_jobs(&self) -> &[CompileJob] {
        &self.compile_jobs
    }

    /// All object files of the component (stale and up-to-date alike), in
    /// source resolution order. Populated by `configure`.
    pub fn output_objects(&self) -> &[PathBuf] {
        &self.output_objects
    }

    pub(crate) fn set_configure_results(
        &mut self,
        jobs: Vec<CompileJob>,
        objects: Vec<PathBuf>,
    ) {
        self.compile_jobs = jobs;
        self.output_objects = objects;
    }
}
