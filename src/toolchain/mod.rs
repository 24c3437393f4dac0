//! Toolchain abstraction for C/C++/assembly compilers, archivers and linkers.
//!
//! Each supported family (GNU, Clang, MSVC, IAR) implements [`FamilyOps`],
//! a single interface for flag construction, dependency-file parsing, and
//! filename conventions. Tool wrappers ([`Compiler`], [`Archiver`],
//! [`Linker`]) pair a program location with its detected family.

use std::path::Path;

pub mod detect;
mod gnu;
mod iar;
mod msvc;
mod tools;

pub use tools::{Archiver, Compiler, Linker};

use crate::core::standard::{Language, Standard};
use crate::error::BuildError;
use gnu::GnuOps;
use iar::IarOps;
use msvc::MsvcOps;

/// The family of a toolchain program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolFamily {
    /// GNU Compiler Collection
    Gnu,
    /// Clang/LLVM
    Clang,
    /// Microsoft Visual C++
    Msvc,
    /// IAR Embedded Workbench
    Iar,
}

static GNU_OPS: GnuOps = GnuOps {
    family: ToolFamily::Gnu,
};
static CLANG_OPS: GnuOps = GnuOps {
    family: ToolFamily::Clang,
};
static MSVC_OPS: MsvcOps = MsvcOps;
static IAR_OPS: IarOps = IarOps;

impl ToolFamily {
    /// Get the family name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolFamily::Gnu => "GNU",
            ToolFamily::Clang => "Clang",
            ToolFamily::Msvc => "MSVC",
            ToolFamily::Iar => "IAR",
        }
    }

    /// The flag-construction backend for this family.
    pub fn ops(&self) -> &'static dyn FamilyOps {
        match self {
            ToolFamily::Gnu => &GNU_OPS,
            ToolFamily::Clang => &CLANG_OPS,
            ToolFamily::Msvc => &MSVC_OPS,
            ToolFamily::Iar => &IAR_OPS,
        }
    }
}

impl std::fmt::Display for ToolFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-family command construction and file conventions.
///
/// One implementation per family; every per-family decision the driver makes
/// goes through this trait.
pub trait FamilyOps: Send + Sync + std::fmt::Debug {
    /// The family these operations belong to.
    fn family(&self) -> ToolFamily;

    /// Flags every compile command starts with: diagnostics directives plus
    /// the language-standard flag, where the family takes one.
    fn base_flags(&self, standard: Standard) -> Vec<String>;

    /// Append an include-directory flag.
    fn push_include_path(&self, args: &mut Vec<String>, dir: &str);

    /// Append a preprocessor definition (`NAME` or `NAME=VALUE`).
    fn push_definition(&self, args: &mut Vec<String>, spec: &str);

    /// Append compile-only mode, the source path and the object output path.
    fn push_compile_and_output(
        &self,
        args: &mut Vec<String>,
        language: Language,
        source: &Path,
        object: &Path,
    );

    /// Append header-dependency generation flags.
    fn push_dependency_flags(&self, args: &mut Vec<String>, language: Language, dep_file: &Path);

    /// Whether a compile of `language` produces a parseable dependency file.
    fn emits_dep_file(&self, language: Language) -> bool;

    /// Parse a dependency file, calling `visit` for every referenced path.
    /// The visitor returns `true` to stop the scan early. The compiled
    /// source itself may appear and must be excluded by the visitor.
    fn parse_dependency_file(
        &self,
        dep_file: &Path,
        visit: &mut dyn FnMut(&str) -> bool,
    ) -> Result<(), BuildError>;

    /// Object file extension, including the dot.
    fn object_extension(&self) -> &'static str;

    /// Dependency file extension, including the dot.
    fn dependency_extension(&self) -> &'static str;

    /// Static archive extension, including the dot.
    fn archive_extension(&self) -> &'static str;

    /// Executable extension, including the dot (may be empty).
    fn executable_extension(&self) -> &'static str;

    /// Append archiver mode flags and the archive output path.
    fn push_archive_flags(&self, args: &mut Vec<String>, output: &Path);

    /// Whether the family's tools accept an `@file`-style argument file.
    fn supports_argfile(&self) -> bool {
        true
    }

    /// Append an argument-file reference.
    fn push_input_argfile(&self, args: &mut Vec<String>, argfile: &Path);

    /// Append linker output flags and the optional linker script.
    fn push_link_flags(&self, args: &mut Vec<String>, output: &Path, script: Option<&Path>);
}

/// Quote a directory for embedding in a single flag argument, using
/// backslash-escaped quotes when it contains a space.
pub(crate) fn quote_dir(dir: &str) -> String {
    if dir.contains(' ') {
        format!("\\\"{}\\\"", dir)
    } else {
        dir.to_string()
    }
}

/// Normalize a definition spec: double backslashes, and when the value side
/// of `NAME=VALUE` contains a space, wrap it in escaped quotes.
pub(crate) fn escape_definition(spec: &str) -> String {
    let escaped = spec.replace('\\', "\\\\");
    if let Some((name, value)) = escaped.split_once('=') {
        if value.contains(' ') {
            return format!("{}=\\\"{}\\\"", name, value);
        }
    }
    escaped
}
