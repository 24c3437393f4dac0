//! GNU and Clang toolchain operations.
//!
//! The two families share their entire command-line surface; a family tag
//! keeps them distinguishable for reporting.

use std::fs;
use std::path::Path;

use crate::core::standard::{Language, Standard};
use crate::error::BuildError;

use super::{escape_definition, quote_dir, FamilyOps, ToolFamily};

#[derive(Debug)]
pub(crate) struct GnuOps {
    pub(crate) family: ToolFamily,
}

impl FamilyOps for GnuOps {
    fn family(&self) -> ToolFamily {
        self.family
    }

    fn base_flags(&self, standard: Standard) -> Vec<String> {
        let mut flags = vec!["-fdiagnostics-color=always".to_string()];
        if let Some(value) = standard.flag_value() {
            flags.push(format!("-std={}", value));
        }
        flags
    }

    fn push_include_path(&self, args: &mut Vec<String>, dir: &str) {
        args.push(format!("-I{}", quote_dir(dir)));
    }

    fn push_definition(&self, args: &mut Vec<String>, spec: &str) {
        args.push(format!("-D{}", escape_definition(spec)));
    }

    fn push_compile_and_output(
        &self,
        args: &mut Vec<String>,
        _language: Language,
        source: &Path,
        object: &Path,
    ) {
        args.push("-c".to_string());
        args.push(source.to_string_lossy().into_owned());
        args.push("-o".to_string());
        args.push(object.to_string_lossy().into_owned());
    }

    fn push_dependency_flags(&self, args: &mut Vec<String>, _language: Language, dep_file: &Path) {
        // -MMD tracks user headers only; system headers never invalidate.
        args.push("-MMD".to_string());
        args.push("-MF".to_string());
        args.push(dep_file.to_string_lossy().into_owned());
    }

    fn emits_dep_file(&self, _language: Language) -> bool {
        true
    }

    fn parse_dependency_file(
        &self,
        dep_file: &Path,
        visit: &mut dyn FnMut(&str) -> bool,
    ) -> Result<(), BuildError> {
        // Format:
        //   object/path/obj.o: \
        //    dep/path/a.cpp \
        //    dep/path/b.hpp
        // The first line is the object header; every following line holds one
        // path with a continuation backslash. The compiled source appears too
        // and is left to the visitor to skip.
        let contents =
            fs::read_to_string(dep_file).map_err(|e| BuildError::fs(dep_file, e))?;
        for line in contents.lines().skip(1) {
            let entry = line.trim_start();
            let entry = entry.strip_suffix('\\').unwrap_or(entry).trim_end();
            if entry.is_empty() {
                continue;
            }
            if visit(entry) {
                return Ok(());
            }
        }
        Ok(())
    }

    fn object_extension(&self) -> &'static str {
        ".o"
    }

    fn dependency_extension(&self) -> &'static str {
        ".dep"
    }

    fn archive_extension(&self) -> &'static str {
        ".a"
    }

    fn executable_extension(&self) -> &'static str {
        ".elf"
    }

    fn push_archive_flags(&self, args: &mut Vec<String>, output: &Path) {
        args.push("rcs".to_string());
        args.push(output.to_string_lossy().into_owned());
    }

    fn push_input_argfile(&self, args: &mut Vec<String>, argfile: &Path) {
        args.push(format!("@{}", argfile.to_string_lossy()));
    }

    fn push_link_flags(&self, args: &mut Vec<String>, output: &Path, script: Option<&Path>) {
        args.push("-o".to_string());
        args.push(output.to_string_lossy().into_owned());
        if let Some(script) = script {
            args.push("-T".to_string());
            args.push(script.to_string_lossy().into_owned());
        }
    }
}
