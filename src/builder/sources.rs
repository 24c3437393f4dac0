//! Source resolution.
//!
//! Expands a component's requested source patterns into concrete file paths,
//! applies substring filters, and classifies files by extension. The
//! wildcard language is deliberately small: `DIR/*.EXT` (one directory) and
//! `DIR/**.EXT` (recursive, only inside the component root).

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::core::component::{Component, SourceFilePath};
use crate::core::standard::Language;
use crate::error::BuildError;
use crate::util::fs::normalize_under;

static WILDCARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^*]+\*\*?\.[^\s]+$").expect("valid regex"));

/// Check a pattern against the allowed wildcard forms.
pub fn is_valid_wildcard(pattern: &str) -> bool {
    WILDCARD_RE.is_match(pattern)
}

/// Classify a source file by its lower-cased extension.
pub fn classify_language(path: &Path) -> Result<Language, BuildError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "c" => Ok(Language::C),
        "cpp" | "cc" | "cxx" | "c++" => Ok(Language::Cpp),
        "asm" | "s" => Ok(Language::Asm),
        _ => Err(BuildError::UnsupportedExtension {
            source_path: path.to_path_buf(),
        }),
    }
}

/// Expand a component's requested sources and apply its filters.
pub fn resolve_sources(component: &Component) -> Result<Vec<SourceFilePath>, BuildError> {
    let root = component.root_path();
    let mut resolved = Vec::new();

    for request in component.requested_sources() {
        if request.contains('*') {
            expand_wildcard(component, request, &mut resolved)?;
        } else {
            let path = normalize_under(root, Path::new(request));
            if !path.exists() {
                return Err(BuildError::SourceMissing {
                    component: component.name().to_string(),
                    source_path: path,
                });
            }
            let is_external = path.parent().is_some_and(|p| !p.starts_with(root));
            resolved.push(SourceFilePath { path, is_external });
        }
    }

    for filter in component.source_filters() {
        resolved.retain(|sfp| {
            let drop = sfp.path.to_string_lossy().contains(filter.as_str());
            if drop {
                tracing::trace!("remove {} [filter = {}]", sfp.path.display(), filter);
            }
            !drop
        });
    }

    Ok(resolved)
}

fn expand_wildcard(
    component: &Component,
    pattern: &str,
    resolved: &mut Vec<SourceFilePath>,
) -> Result<(), BuildError> {
    if !is_valid_wildcard(pattern) {
        return Err(BuildError::BadWildcard {
            pattern: pattern.to_string(),
        });
    }

    let root = component.root_path();
    let recursive = pattern.matches('*').count() == 2;
    let normalized = normalize_under(root, Path::new(pattern));
    let dir = normalized.parent().unwrap_or(root).to_path_buf();
    let extension = normalized.extension().map(|e| e.to_os_string());
    let is_inside_root = dir.starts_with(root);

    if recursive {
        if !is_inside_root {
            return Err(BuildError::ExternalRecursiveDenied {
                component: component.name().to_string(),
                pattern: pattern.to_string(),
            });
        }

        tracing::trace!(
            "[{}] recursively add {:?} sources from {}",
            component.name(),
            extension,
            dir.display()
        );
        for entry in WalkDir::new(&dir) {
            let entry = entry.map_err(|e| BuildError::FileSystemError {
                path: dir.clone(),
                message: e.to_string(),
            })?;
            if entry.file_type().is_file()
                && entry.path().extension() == extension.as_deref()
            {
                resolved.push(SourceFilePath {
                    path: entry.into_path(),
                    is_external: false,
                });
            }
        }
    } else {
        tracing::trace!(
            "[{}] add {:?} sources from {}",
            component.name(),
            extension,
            dir.display()
        );
        let entries = fs::read_dir(&dir).map_err(|e| BuildError::fs(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| BuildError::fs(&dir, e))?;
            let path = entry.path();
            if path.is_file() && path.extension() == extension.as_deref() {
                resolved.push(SourceFilePath {
                    path,
                    is_external: !is_inside_root,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::component::ComponentKind;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn component_at(root: &Path) -> Component {
        Component::new(
            ComponentKind::Library,
            "demo",
            root.join("Caravel.toml"),
            root,
            root.join("build/components/demo"),
        )
    }

    fn touch_all(root: &Path, files: &[&str]) {
        for file in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "").unwrap();
        }
    }

    #[test]
    fn test_wildcard_validation() {
        assert!(is_valid_wildcard("src/*.c"));
        assert!(is_valid_wildcard("src/**.cpp"));
        assert!(is_valid_wildcard("/abs/path/**.hpp"));
        assert!(!is_valid_wildcard("*.c"));
        assert!(!is_valid_wildcard("src/*"));
        assert!(!is_valid_wildcard("src/*/nested/*.c"));
        assert!(!is_valid_wildcard("src/***.c"));
    }

    #[test]
    fn test_classify_language() {
        assert_eq!(classify_language(Path::new("a.c")).unwrap(), Language::C);
        assert_eq!(classify_language(Path::new("a.CPP")).unwrap(), Language::Cpp);
        assert_eq!(classify_language(Path::new("a.cxx")).unwrap(), Language::Cpp);
        assert_eq!(classify_language(Path::new("boot.S")).unwrap(), Language::Asm);
        assert_eq!(classify_language(Path::new("x.asm")).unwrap(), Language::Asm);
        assert!(matches!(
            classify_language(Path::new("readme.txt")),
            Err(BuildError::UnsupportedExtension { .. })
        ));
    }

    #[test]
    fn test_literal_source_must_exist() {
        let tmp = TempDir::new().unwrap();
        touch_all(tmp.path(), &["src/a.c"]);

        let mut c = component_at(tmp.path());
        c.add_source("src/a.c");
        c.add_source("src/missing.c");
        let err = resolve_sources(&c).unwrap_err();
        assert!(matches!(err, BuildError::SourceMissing { .. }));
    }

    #[test]
    fn test_single_star_is_not_recursive() {
        let tmp = TempDir::new().unwrap();
        touch_all(tmp.path(), &["src/a.c", "src/b.c", "src/sub/c.c", "src/d.h"]);

        let mut c = component_at(tmp.path());
        c.add_source("src/*.c");
        let mut names: Vec<_> = resolve_sources(&c)
            .unwrap()
            .iter()
            .map(|s| s.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.c", "b.c"]);
    }

    #[test]
    fn test_double_star_recurses_and_filters_apply() {
        let tmp = TempDir::new().unwrap();
        touch_all(
            tmp.path(),
            &["src/a.cpp", "src/a_test.cpp", "src/sub/b.cpp"],
        );

        let mut c = component_at(tmp.path());
        c.add_sources(["src/**.cpp", "!_test"]);
        let mut names: Vec<_> = resolve_sources(&c)
            .unwrap()
            .iter()
            .map(|s| s.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.cpp", "b.cpp"]);
    }

    #[test]
    fn test_empty_wildcard_match_is_ok() {
        let tmp = TempDir::new().unwrap();
        touch_all(tmp.path(), &["src/readme.md"]);

        let mut c = component_at(tmp.path());
        c.add_source("src/*.c");
        assert!(resolve_sources(&c).unwrap().is_empty());
    }

    #[test]
    fn test_external_recursive_denied() {
        let tmp = TempDir::new().unwrap();
        let external = TempDir::new().unwrap();
        touch_all(external.path(), &["vendor/x.c"]);

        let mut c = component_at(tmp.path());
        c.add_source(format!("{}/vendor/**.c", external.path().display()));
        let err = resolve_sources(&c).unwrap_err();
        assert!(matches!(err, BuildError::ExternalRecursiveDenied { .. }));
    }

    #[test]
    fn test_external_single_star_allowed_and_flagged() {
        let tmp = TempDir::new().unwrap();
        let external = TempDir::new().unwrap();
        touch_all(external.path(), &["vendor/x.c"]);

        let mut c = component_at(tmp.path());
        c.add_source(format!("{}/vendor/*.c", external.path().display()));
        let resolved = resolve_sources(&c).unwrap();
        assert_eq!(resolved.len(), 1);
        assert!(resolved[0].is_external);
    }

    #[test]
    fn test_bad_wildcards_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut c = component_at(tmp.path());
        c.add_source("src/*");
        let err = resolve_sources(&c).unwrap_err();
        assert!(matches!(err, BuildError::BadWildcard { .. }));
    }

    #[test]
    fn test_wildcard_determinism() {
        let tmp = TempDir::new().unwrap();
        touch_all(tmp.path(), &["src/a.h", "src/sub/b.h", "src/sub/deep/c.h"]);

        let mut c = component_at(tmp.path());
        c.add_source("src/**.h");
        let collect = |c: &Component| {
            let mut v: Vec<PathBuf> = resolve_sources(c)
                .unwrap()
                .into_iter()
                .map(|s| s.path)
                .collect();
            v.sort();
            v
        };
        assert_eq!(collect(&c), collect(&c));
        assert_eq!(collect(&c).len(), 3);
    }
}
