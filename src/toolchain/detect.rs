//! Toolchain detection.
//!
//! A tool binary is classified by spawning it with `--version` and matching
//! substrings of the combined output. A caller that already knows the
//! version banner can pass it in and skip the probe.

use std::path::{Path, PathBuf};

use crate::error::BuildError;
use crate::util::process::{find_executable, ProcessBuilder, SpawnError};

use super::ToolFamily;

/// Spawn `<location> --version` and capture the combined output.
///
/// Bare tool names are resolved through PATH first, so a missing tool is
/// reported without a spawn attempt.
pub fn probe_version_text(location: &str) -> Result<String, BuildError> {
    let program = resolve_program(location)?;
    let out = ProcessBuilder::new(&program)
        .arg("--version")
        .exec()
        .map_err(|e| match e {
            SpawnError::NotFound => BuildError::ToolNotFound {
                location: location.to_string(),
            },
            SpawnError::Other(e) => BuildError::ToolProbeFailed {
                location: location.to_string(),
                message: e.to_string(),
            },
        })?;
    Ok(out.output)
}

/// Resolve a bare tool name through PATH; explicit paths pass through.
fn resolve_program(location: &str) -> Result<PathBuf, BuildError> {
    let path = Path::new(location);
    if path.components().count() > 1 {
        return Ok(path.to_path_buf());
    }
    match find_executable(location) {
        Some(resolved) => {
            tracing::trace!("resolved `{}` to {}", location, resolved.display());
            Ok(resolved)
        }
        None => Err(BuildError::ToolNotFound {
            location: location.to_string(),
        }),
    }
}

/// Classify a tool family from its version banner.
pub fn classify_family(location: &str, version_text: &str) -> Result<ToolFamily, BuildError> {
    let family = if version_text.contains("GNU") {
        ToolFamily::Gnu
    } else if version_text.contains("clang") || version_text.contains("LLVM") {
        ToolFamily::Clang
    } else if version_text.contains("Microsoft") {
        ToolFamily::Msvc
    } else if version_text.contains("IAR") {
        ToolFamily::Iar
    } else {
        return Err(BuildError::ToolNotRecognized {
            location: location.to_string(),
            version_text: version_text.to_string(),
        });
    };
    tracing::trace!("{} classified as {}", location, family);
    Ok(family)
}

/// Probe and classify a tool in one step.
pub fn detect_family(location: &str) -> Result<ToolFamily, BuildError> {
    let text = probe_version_text(location)?;
    classify_family(location, &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_gnu() {
        let banner = "gcc (GNU Toolchain for the A-profile) 12.2.0\nCopyright (C) 2022";
        assert_eq!(classify_family("gcc", banner).unwrap(), ToolFamily::Gnu);
    }

    #[test]
    fn test_classify_clang() {
        let banner = "clang version 17.0.6\nTarget: x86_64-unknown-linux-gnu";
        assert_eq!(classify_family("clang", banner).unwrap(), ToolFamily::Clang);
        let banner = "Homebrew LLVM version 17.0.6";
        assert_eq!(classify_family("ld.lld", banner).unwrap(), ToolFamily::Clang);
    }

    #[test]
    fn test_classify_msvc_and_iar() {
        let banner = "Microsoft (R) C/C++ Optimizing Compiler Version 19.38";
        assert_eq!(classify_family("cl", banner).unwrap(), ToolFamily::Msvc);
        let banner = "IAR ANSI C/C++ Compiler V9.40.1.364/W64 for ARM";
        assert_eq!(classify_family("iccarm", banner).unwrap(), ToolFamily::Iar);
    }

    #[test]
    fn test_classify_priority_prefers_gnu() {
        // gcc banners routinely mention both GNU and other vendors.
        let banner = "arm-none-eabi-gcc (GNU Arm Embedded, built with LLVM bits) 10.3";
        assert_eq!(classify_family("gcc", banner).unwrap(), ToolFamily::Gnu);
    }

    #[test]
    fn test_unrecognized_tool() {
        let err = classify_family("mystery", "Mystery Compiler 1.0").unwrap_err();
        assert!(matches!(err, BuildError::ToolNotRecognized { .. }));
    }

    #[test]
    fn test_probe_missing_tool() {
        let err = probe_version_text("caravel-no-such-tool-xyz").unwrap_err();
        assert!(matches!(err, BuildError::ToolNotFound { .. }));
    }

    #[test]
    fn test_resolve_program_passes_explicit_paths_through() {
        let path = resolve_program("/no/such/dir/tool").unwrap();
        assert_eq!(path, PathBuf::from("/no/such/dir/tool"));
    }

    #[test]
    fn test_resolve_program_finds_bare_names_on_path() {
        let path = resolve_program("sh").unwrap();
        assert!(path.is_absolute());
    }
}
