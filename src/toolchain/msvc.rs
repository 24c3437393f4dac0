//! MSVC toolchain operations.
//!
//! Dependency tracking is not supported for this family: `/showIncludes`
//! output has no parse contract here yet, so MSVC builds degrade to
//! object + link only.

use std::path::Path;

use crate::core::standard::{Language, Standard};
use crate::error::BuildError;

use super::{escape_definition, quote_dir, FamilyOps, ToolFamily};

#[derive(Debug)]
pub(crate) struct MsvcOps;

impl FamilyOps for MsvcOps {
    fn family(&self) -> ToolFamily {
        ToolFamily::Msvc
    }

    fn base_flags(&self, standard: Standard) -> Vec<String> {
        match standard.flag_value() {
            Some(value) => vec![format!("/std:{}", value)],
            None => Vec::new(),
        }
    }

    fn push_include_path(&self, args: &mut Vec<String>, dir: &str) {
        args.push("/I".to_string());
        args.push(quote_dir(dir));
    }

    fn push_definition(&self, args: &mut Vec<String>, spec: &str) {
        args.push("/D".to_string());
        args.push(escape_definition(spec));
    }

    fn push_compile_and_output(
        &self,
        args: &mut Vec<String>,
        _language: Language,
        source: &Path,
        object: &Path,
    ) {
        args.push("/c".to_string());
        args.push(source.to_string_lossy().into_owned());
        args.push("/Fo".to_string());
        args.push(object.to_string_lossy().into_owned());
    }

    fn push_dependency_flags(&self, args: &mut Vec<String>, _language: Language, _dep_file: &Path) {
        args.push("/showIncludes".to_string());
    }

    fn emits_dep_file(&self, _language: Language) -> bool {
        false
    }

    fn parse_dependency_file(
        &self,
        dep_file: &Path,
        _visit: &mut dyn FnMut(&str) -> bool,
    ) -> Result<(), BuildError> {
        // No `/showIncludes` parse contract yet; the staleness engine never
        // asks for MSVC dependency files (`emits_dep_file` is false).
        tracing::warn!(
            "MSVC dependency files are not supported, ignoring {}",
            dep_file.display()
        );
        Ok(())
    }

    fn object_extension(&self) -> &'static str {
        ".obj"
    }

    fn dependency_extension(&self) -> &'static str {
        ".dep"
    }

    fn archive_extension(&self) -> &'static str {
        ".lib"
    }

    fn executable_extension(&self) -> &'static str {
        ".exe"
    }

    fn push_archive_flags(&self, args: &mut Vec<String>, output: &Path) {
        args.push(format!("/OUT:{}", output.to_string_lossy()));
    }

    fn supports_argfile(&self) -> bool {
        false
    }

    fn push_input_argfile(&self, _args: &mut Vec<String>, argfile: &Path) {
        // lib.exe/link.exe inputs are passed directly; callers check
        // `supports_argfile` first.
        tracing::warn!(
            "MSVC tools take inputs directly, ignoring argument file {}",
            argfile.display()
        );
    }

    fn push_link_flags(&self, args: &mut Vec<String>, output: &Path, script: Option<&Path>) {
        args.push(format!("/OUT:{}", output.to_string_lossy()));
        if let Some(script) = script {
            tracing::warn!(
                "linker scripts are not supported for MSVC, ignoring {}",
                script.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::standard::{CppStandard, CStandard};

    fn ops() -> &'static dyn FamilyOps {
        ToolFamily::Msvc.ops()
    }

    #[test]
    fn test_base_flags() {
        assert_eq!(
            ops().base_flags(Standard::C(CStandard::C17)),
            vec!["/std:c17"]
        );
        assert_eq!(
            ops().base_flags(Standard::Cpp(CppStandard::Cpp20)),
            vec!["/std:c++20"]
        );
        assert!(ops().base_flags(Standard::Asm).is_empty());
    }

    #[test]
    fn test_include_and_definition_are_two_arguments() {
        let mut args = Vec::new();
        ops().push_include_path(&mut args, "C:/include");
        ops().push_definition(&mut args, "VERSION=1");
        assert_eq!(args, vec!["/I", "C:/include", "/D", "VERSION=1"]);
    }

    #[test]
    fn test_compile_flags() {
        let mut args = Vec::new();
        ops().push_compile_and_output(
            &mut args,
            Language::C,
            Path::new("a.c"),
            Path::new("out/a.c.obj"),
        );
        assert_eq!(args, vec!["/c", "a.c", "/Fo", "out/a.c.obj"]);
    }

    #[test]
    fn test_no_dep_file_support() {
        assert!(!ops().emits_dep_file(Language::C));
        assert!(!ops().supports_argfile());
    }

    #[test]
    fn test_archive_and_link_output() {
        let mut args = Vec::new();
        ops().push_archive_flags(&mut args, Path::new("out/x.lib"));
        assert_eq!(args, vec!["/OUT:out/x.lib"]);

        let mut args = Vec::new();
        ops().push_link_flags(&mut args, Path::new("out/app.exe"), None);
        assert_eq!(args, vec!["/OUT:out/app.exe"]);
    }
}
