//! IAR Embedded Workbench toolchain operations.

use std::fs;
use std::path::Path;

use crate::core::standard::{Language, Standard};
use crate::error::BuildError;

use super::{escape_definition, quote_dir, FamilyOps, ToolFamily};

/// IAR installation headers live under this prefix and never invalidate.
const IAR_SYSTEM_PREFIX: &str = "C:\\Program Files (x86)\\IAR Systems";

#[derive(Debug)]
pub(crate) struct IarOps;

impl FamilyOps for IarOps {
    fn family(&self) -> ToolFamily {
        ToolFamily::Iar
    }

    fn base_flags(&self, standard: Standard) -> Vec<String> {
        // IAR C takes no standard flag; C++ mode is a single switch.
        match standard {
            Standard::Cpp(_) => vec!["--c++".to_string()],
            Standard::C(_) | Standard::Asm => Vec::new(),
        }
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
        language: Language,
        source: &Path,
        object: &Path,
    ) {
        if language != Language::Asm {
            args.push("--silent".to_string());
        }
        args.push(source.to_string_lossy().into_owned());
        args.push("-o".to_string());
        args.push(object.to_string_lossy().into_owned());
    }

    fn push_dependency_flags(&self, args: &mut Vec<String>, language: Language, dep_file: &Path) {
        if language == Language::Asm {
            return;
        }
        args.push("--dependencies".to_string());
        args.push(dep_file.to_string_lossy().into_owned());
    }

    fn emits_dep_file(&self, language: Language) -> bool {
        language != Language::Asm
    }

    fn parse_dependency_file(
        &self,
        dep_file: &Path,
        visit: &mut dyn FnMut(&str) -> bool,
    ) -> Result<(), BuildError> {
        // One path per line; installation headers are skipped.
        let contents =
            fs::read_to_string(dep_file).map_err(|e| BuildError::fs(dep_file, e))?;
        for line in contents.lines() {
            let entry = line.trim_end();
            if entry.is_empty() || entry.starts_with(IAR_SYSTEM_PREFIX) {
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
        args.push("-o".to_string());
        args.push(output.to_string_lossy().into_owned());
    }

    fn push_input_argfile(&self, args: &mut Vec<String>, argfile: &Path) {
        args.push("-f".to_string());
        args.push(argfile.to_string_lossy().into_owned());
    }

    fn push_link_flags(&self, args: &mut Vec<String>, output: &Path, script: Option<&Path>) {
        args.push("-o".to_string());
        args.push(output.to_string_lossy().into_owned());
        if let Some(script) = script {
            args.push("--config".to_string());
            args.push(script.to_string_lossy().into_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::standard::{CStandard, CppStandard};
    use std::io::Write;

    fn ops() -> &'static dyn FamilyOps {
        ToolFamily::Iar.ops()
    }

    #[test]
    fn test_base_flags() {
        assert!(ops().base_flags(Standard::C(CStandard::C99)).is_empty());
        assert_eq!(
            ops().base_flags(Standard::Cpp(CppStandard::Cpp14)),
            vec!["--c++"]
        );
        assert!(ops().base_flags(Standard::Asm).is_empty());
    }

    #[test]
    fn test_compile_flags_silent_for_c_only() {
        let mut args = Vec::new();
        ops().push_compile_and_output(
            &mut args,
            Language::C,
            Path::new("a.c"),
            Path::new("out/a.c.o"),
        );
        assert_eq!(args, vec!["--silent", "a.c", "-o", "out/a.c.o"]);

        let mut args = Vec::new();
        ops().push_compile_and_output(
            &mut args,
            Language::Asm,
            Path::new("boot.s"),
            Path::new("out/boot.s.o"),
        );
        assert_eq!(args, vec!["boot.s", "-o", "out/boot.s.o"]);
    }

    #[test]
    fn test_dependency_flags_skip_asm() {
        let mut args = Vec::new();
        ops().push_dependency_flags(&mut args, Language::Asm, Path::new("out/boot.s.dep"));
        assert!(args.is_empty());
        assert!(!ops().emits_dep_file(Language::Asm));

        ops().push_dependency_flags(&mut args, Language::C, Path::new("out/a.c.dep"));
        assert_eq!(args, vec!["--dependencies", "out/a.c.dep"]);
        assert!(ops().emits_dep_file(Language::C));
    }

    #[test]
    fn test_parse_dependency_file_skips_system_headers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "src/a.c").unwrap();
        writeln!(file, "C:\\Program Files (x86)\\IAR Systems\\inc\\stdio.h").unwrap();
        writeln!(file, "include/board.h").unwrap();

        let mut seen = Vec::new();
        ops()
            .parse_dependency_file(file.path(), &mut |entry| {
                seen.push(entry.to_string());
                false
            })
            .unwrap();
        assert_eq!(seen, vec!["src/a.c", "include/board.h"]);
    }

    #[test]
    fn test_archive_and_link_flags() {
        let mut args = Vec::new();
        ops().push_archive_flags(&mut args, Path::new("out/x.a"));
        ops().push_input_argfile(&mut args, Path::new("out/x_ar_args.txt"));
        assert_eq!(args, vec!["-o", "out/x.a", "-f", "out/x_ar_args.txt"]);

        let mut args = Vec::new();
        ops().push_link_flags(
            &mut args,
            Path::new("out/app.elf"),
            Some(Path::new("board.icf")),
        );
        assert_eq!(args, vec!["-o", "out/app.elf", "--config", "board.icf"]);
    }
}
