//! Filesystem utilities.

use std::fs;
use std::path::{Component as PathComponent, Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};

/// Ensure a directory exists, creating it if necessary.
///
/// Creation racing with another thread is treated as success; only a missing
/// directory after the attempt is an error.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        match fs::create_dir_all(path) {
            Ok(()) => {}
            Err(_) if path.is_dir() => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to create directory: {}", path.display()));
            }
        }
    }
    Ok(())
}

/// Canonicalize a path, but don't fail if it doesn't exist yet.
///
/// Existing paths are canonicalized through the OS; everything else gets a
/// lexical cleanup (`.` removed, `..` popped) so that paths built from
/// patterns and not-yet-created outputs still compare by prefix.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| lexical_normalize(path))
}

/// Resolve `path` against `base` if it is relative, then normalize.
pub fn normalize_under(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        normalize_path(&base.join(path))
    } else {
        normalize_path(path)
    }
}

/// Lexically remove `.` segments and resolve `..` against preceding segments.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            PathComponent::CurDir => {}
            PathComponent::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Check if a path is inside another path.
pub fn is_inside(path: &Path, parent: &Path) -> bool {
    path.starts_with(parent)
}

/// Quote a path string if it contains a space.
pub fn quote_if_spaces(s: &str) -> String {
    if !s.is_empty() && !s.starts_with('"') && s.contains(' ') {
        format!("\"{}\"", s)
    } else {
        s.to_string()
    }
}

/// Write a tool argument file: one shell-quoted path per line, UTF-8.
/// Parent directories are created as needed.
pub fn write_argfile(path: &Path, entries: &[PathBuf]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut contents = String::new();
    for entry in entries {
        contents.push_str(&quote_if_spaces(&entry.to_string_lossy()));
        contents.push('\n');
    }
    fs::write(path, contents)
        .with_context(|| format!("failed to write argument file: {}", path.display()))
}

/// Read a file's modification time.
pub fn modified_time(path: &Path) -> std::io::Result<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified())
}

/// Create (or truncate) an empty file, bumping its mtime to now.
pub fn touch(path: &Path) -> std::io::Result<()> {
    fs::File::create(path).map(|_| ())
}

/// Set a file's modification time, retrying once on failure.
///
/// Sentinel writes can race with another invocation targeting the same
/// output directory; a single retry absorbs the transient case.
pub fn set_modified_time(path: &Path, time: SystemTime) -> std::io::Result<()> {
    let set = || {
        let file = fs::OpenOptions::new().write(true).open(path)?;
        file.set_modified(time)
    };
    set().or_else(|_| set())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("a/b/c");
        ensure_dir(&dir).unwrap();
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_lexical_normalize() {
        assert_eq!(
            lexical_normalize(Path::new("/a/b/./c/../d")),
            PathBuf::from("/a/b/d")
        );
        assert_eq!(lexical_normalize(Path::new("./x/y")), PathBuf::from("x/y"));
    }

    #[test]
    fn test_quote_if_spaces() {
        assert_eq!(quote_if_spaces("plain"), "plain");
        assert_eq!(quote_if_spaces("with space"), "\"with space\"");
        assert_eq!(quote_if_spaces("\"already quoted\""), "\"already quoted\"");
    }

    #[test]
    fn test_write_argfile_one_entry_per_line() {
        let tmp = TempDir::new().unwrap();
        let argfile = tmp.path().join("args.txt");
        write_argfile(
            &argfile,
            &[PathBuf::from("/out/a.o"), PathBuf::from("/out/b c.o")],
        )
        .unwrap();

        let contents = fs::read_to_string(&argfile).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines, vec!["/out/a.o", "\"/out/b c.o\""]);
    }

    #[test]
    fn test_set_modified_time() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("mark");
        touch(&file).unwrap();

        let past = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
        set_modified_time(&file, past).unwrap();
        assert_eq!(modified_time(&file).unwrap(), past);
    }
}
