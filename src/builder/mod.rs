//! Build machinery: source resolution, staleness, job construction,
//! parallel compilation and artifact assembly.

pub mod artifact;
pub mod configure;
pub mod scheduler;
pub mod sources;
pub mod stale;

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::standard::Language;
use crate::toolchain::{Archiver, Compiler, Linker};

/// The tools a project builds with: one optional compiler per language plus
/// the archiver and linker.
#[derive(Debug)]
pub struct Toolset {
    pub c: Option<Arc<Compiler>>,
    pub cpp: Option<Arc<Compiler>>,
    pub asm: Option<Arc<Compiler>>,
    pub archiver: Archiver,
    pub linker: Linker,
}

impl Toolset {
    /// Create a toolset with no compilers configured yet.
    pub fn new(archiver: Archiver, linker: Linker) -> Self {
        Toolset {
            c: None,
            cpp: None,
            asm: None,
            archiver,
            linker,
        }
    }

    /// The compiler slot for a source language.
    pub fn compiler_for(&self, language: Language) -> Option<&Arc<Compiler>> {
        match language {
            Language::C => self.c.as_ref(),
            Language::Cpp => self.cpp.as_ref(),
            Language::Asm => self.asm.as_ref(),
        }
    }
}

/// Project-wide option lists merged into every compile command after the
/// component's own properties. Order-preserving, never deduplicated.
#[derive(Debug, Default)]
pub struct GlobalOptions {
    pub include_paths: Vec<PathBuf>,
    pub definitions: Vec<String>,
    pub c_options: Vec<String>,
    pub cpp_options: Vec<String>,
    pub asm_options: Vec<String>,
    pub link_options: Vec<String>,
}

impl GlobalOptions {
    /// The per-language compile option list.
    pub fn options_for(&self, language: Language) -> &[String] {
        match language {
            Language::C => &self.c_options,
            Language::Cpp => &self.cpp_options,
            Language::Asm => &self.asm_options,
        }
    }
}
