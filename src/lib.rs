//! Caravel - a declarative build driver for C, C++, and assembly projects.
//!
//! A project is a graph of components (static libraries and executables)
//! with scoped properties that propagate across library edges under
//! visibility rules. Caravel resolves the graph into per-translation-unit
//! compile jobs, runs them on a bounded worker pool against an abstracted
//! toolchain (GNU, Clang, MSVC, IAR), and tracks mtime-based staleness for
//! incremental rebuilds.

pub mod builder;
pub mod core;
pub mod error;
pub mod ops;
pub mod toolchain;
pub mod util;

pub use crate::builder::{GlobalOptions, Toolset};
pub use crate::core::component::{
    CompileJob, Component, ComponentId, ComponentKind, SourceFilePath, Visibility,
};
pub use crate::core::graph::ComponentGraph;
pub use crate::core::manifest::{self, load_project};
pub use crate::core::standard::{CStandard, CppStandard, Language, Standard};
pub use crate::error::BuildError;
pub use crate::ops::ProjectContext;
pub use crate::toolchain::{Archiver, Compiler, Linker, ToolFamily};
