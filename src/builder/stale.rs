//! The staleness engine.
//!
//! Per-source rebuild decisions are mtime-only. Every translation unit owns
//! two sentinel files next to its object:
//!
//! - `<src>.tmp` mirrors the last-observed source mtime,
//! - `<src>.dep.tmp` is bumped whenever a fresher header dependency is seen.
//!
//! The two marks decouple "source changed" from "header changed": a
//! regenerated dependency file does not make unrelated sources look
//! modified, and a clean pass that compiles nothing still records fresh
//! state for the next run.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use crate::core::component::SourceFilePath;
use crate::error::BuildError;
use crate::toolchain::Compiler;
use crate::util::fs;

/// Process-wide cache of header modification times.
///
/// Headers are shared across many translation units; their mtimes are read
/// once and held for the process lifetime.
#[derive(Debug, Default)]
pub struct MtimeCache {
    map: Mutex<HashMap<u64, SystemTime>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MtimeCache {
    pub fn new() -> Self {
        MtimeCache::default()
    }

    /// The cached modification time of `path`, reading it on first access.
    pub fn modified(&self, path: &Path) -> std::io::Result<SystemTime> {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        let key = hasher.finish();

        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(&time) = map.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(time);
        }
        let time = fs::modified_time(path)?;
        map.insert(key, time);
        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(time)
    }

    /// (hits, misses) counters.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

/// All per-unit files derived from (output directory, source file name,
/// compiler family).
#[derive(Debug, Clone)]
pub struct UnitPaths {
    /// `<src>.tmp` - source mtime mark.
    pub source_mark: PathBuf,
    /// `<src>.dep.tmp` - header mtime mark.
    pub header_mark: PathBuf,
    /// `<src>.<dep_ext>` - compiler-emitted dependency file.
    pub dep_file: PathBuf,
    /// `<src>.<obj_ext>` - object file.
    pub object: PathBuf,
}

impl UnitPaths {
    pub fn new(output_dir: &Path, source_file_name: &str, compiler: &Compiler) -> Self {
        let ops = compiler.ops();
        UnitPaths {
            source_mark: output_dir.join(format!("{}.tmp", source_file_name)),
            header_mark: output_dir.join(format!("{}.dep.tmp", source_file_name)),
            dep_file: output_dir.join(format!("{}{}", source_file_name, ops.dependency_extension())),
            object: output_dir.join(format!("{}{}", source_file_name, ops.object_extension())),
        }
    }
}

/// Decide whether a translation unit needs recompilation, updating its
/// sentinels along the way.
///
/// `fs_lock` guards sentinel creation against concurrent workers targeting
/// the same output directory.
pub fn check_stale(
    component: &str,
    source: &SourceFilePath,
    paths: &UnitPaths,
    compiler: &Compiler,
    cache: &MtimeCache,
    fs_lock: &Mutex<()>,
) -> Result<bool, BuildError> {
    let wants_dep_file = compiler.emits_dep_file();

    let missing = !paths.source_mark.exists()
        || !paths.header_mark.exists()
        || !paths.object.exists()
        || (wants_dep_file && !paths.dep_file.exists());

    if missing {
        let _guard = fs_lock.lock().unwrap_or_else(PoisonError::into_inner);
        fs::touch(&paths.source_mark).map_err(|e| BuildError::fs(&paths.source_mark, e))?;
        fs::touch(&paths.header_mark).map_err(|e| BuildError::fs(&paths.header_mark, e))?;
        return Ok(true);
    }

    let source_time =
        fs::modified_time(&source.path).map_err(|e| BuildError::fs(&source.path, e))?;
    let mark_time =
        fs::modified_time(&paths.source_mark).map_err(|e| BuildError::fs(&paths.source_mark, e))?;

    if source_time > mark_time {
        let _guard = fs_lock.lock().unwrap_or_else(PoisonError::into_inner);
        fs::set_modified_time(&paths.source_mark, source_time)
            .map_err(|e| BuildError::fs(&paths.source_mark, e))?;
        return Ok(true);
    }

    if !wants_dep_file {
        return Ok(false);
    }

    let header_mark_time =
        fs::modified_time(&paths.header_mark).map_err(|e| BuildError::fs(&paths.header_mark, e))?;

    let mut stale = false;
    let mut sentinel_error: Option<BuildError> = None;
    compiler.ops().parse_dependency_file(&paths.dep_file, &mut |entry| {
        let header = Path::new(entry);
        if header == source.path || !header.exists() {
            return false;
        }
        let header_time = match cache.modified(header) {
            Ok(t) => t,
            Err(_) => return false,
        };
        if header_time > header_mark_time {
            tracing::trace!(
                "[{}] {} invalidated by {}",
                component,
                source.path.display(),
                header.display()
            );
            let _guard = fs_lock.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = fs::touch(&paths.header_mark) {
                sentinel_error = Some(BuildError::fs(&paths.header_mark, e));
            }
            stale = true;
            return true;
        }
        false
    })?;

    if let Some(err) = sentinel_error {
        return Err(err);
    }
    Ok(stale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::standard::{CStandard, Standard};
    use std::fs as stdfs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn gnu_compiler() -> Compiler {
        Compiler::with_known_version("gcc", Standard::C(CStandard::C11), "gcc (GNU) 13.2.0")
            .unwrap()
    }

    fn unit(tmp: &TempDir, compiler: &Compiler) -> (SourceFilePath, UnitPaths) {
        let src = tmp.path().join("a.c");
        stdfs::write(&src, "int a;\n").unwrap();
        let out = tmp.path().join("out");
        stdfs::create_dir_all(&out).unwrap();
        let paths = UnitPaths::new(&out, "a.c", compiler);
        (
            SourceFilePath {
                path: src,
                is_external: false,
            },
            paths,
        )
    }

    fn materialize_outputs(paths: &UnitPaths) {
        stdfs::write(&paths.object, "obj").unwrap();
        stdfs::write(&paths.dep_file, "out/a.c.o: \\\n a.c\n").unwrap();
    }

    fn set_time(path: &Path, time: SystemTime) {
        fs::set_modified_time(path, time).unwrap();
    }

    #[test]
    fn test_unit_paths_naming() {
        let compiler = gnu_compiler();
        let paths = UnitPaths::new(Path::new("/out"), "a.c", &compiler);
        assert_eq!(paths.source_mark, Path::new("/out/a.c.tmp"));
        assert_eq!(paths.header_mark, Path::new("/out/a.c.dep.tmp"));
        assert_eq!(paths.dep_file, Path::new("/out/a.c.dep"));
        assert_eq!(paths.object, Path::new("/out/a.c.o"));
    }

    #[test]
    fn test_missing_outputs_mark_stale_and_create_sentinels() {
        let tmp = TempDir::new().unwrap();
        let compiler = gnu_compiler();
        let (src, paths) = unit(&tmp, &compiler);
        let cache = MtimeCache::new();
        let lock = Mutex::new(());

        assert!(check_stale("t", &src, &paths, &compiler, &cache, &lock).unwrap());
        assert!(paths.source_mark.exists());
        assert!(paths.header_mark.exists());
    }

    #[test]
    fn test_up_to_date_unit_is_not_stale() {
        let tmp = TempDir::new().unwrap();
        let compiler = gnu_compiler();
        let (src, paths) = unit(&tmp, &compiler);
        let cache = MtimeCache::new();
        let lock = Mutex::new(());

        // First pass creates sentinels; pretend the build then ran.
        check_stale("t", &src, &paths, &compiler, &cache, &lock).unwrap();
        materialize_outputs(&paths);
        // Source mark must not predate the source.
        let now = SystemTime::now();
        set_time(&paths.source_mark, now);
        set_time(&paths.header_mark, now);

        assert!(!check_stale("t", &src, &paths, &compiler, &cache, &lock).unwrap());
    }

    #[test]
    fn test_source_newer_than_mark_is_stale() {
        let tmp = TempDir::new().unwrap();
        let compiler = gnu_compiler();
        let (src, paths) = unit(&tmp, &compiler);
        let cache = MtimeCache::new();
        let lock = Mutex::new(());

        check_stale("t", &src, &paths, &compiler, &cache, &lock).unwrap();
        materialize_outputs(&paths);

        let past = SystemTime::now() - Duration::from_secs(3600);
        set_time(&paths.source_mark, past);
        set_time(&paths.header_mark, SystemTime::now());

        assert!(check_stale("t", &src, &paths, &compiler, &cache, &lock).unwrap());
        // The mark was advanced to the source mtime: a second check is clean.
        assert!(!check_stale("t", &src, &paths, &compiler, &cache, &lock).unwrap());
    }

    #[test]
    fn test_fresh_header_marks_stale() {
        let tmp = TempDir::new().unwrap();
        let compiler = gnu_compiler();
        let (src, paths) = unit(&tmp, &compiler);
        let cache = MtimeCache::new();
        let lock = Mutex::new(());

        let header = tmp.path().join("a.h");
        stdfs::write(&header, "#pragma once\n").unwrap();

        check_stale("t", &src, &paths, &compiler, &cache, &lock).unwrap();
        stdfs::write(&paths.object, "obj").unwrap();
        stdfs::write(
            &paths.dep_file,
            format!(
                "out/a.c.o: \\\n {} \\\n {}\n",
                src.path.display(),
                header.display()
            ),
        )
        .unwrap();

        let now = SystemTime::now();
        set_time(&paths.source_mark, now);
        // Header mark older than the header itself.
        set_time(&paths.header_mark, now - Duration::from_secs(3600));

        assert!(check_stale("t", &src, &paths, &compiler, &cache, &lock).unwrap());
    }

    #[test]
    fn test_dep_entries_for_the_source_itself_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let compiler = gnu_compiler();
        let (src, paths) = unit(&tmp, &compiler);
        let cache = MtimeCache::new();
        let lock = Mutex::new(());

        check_stale("t", &src, &paths, &compiler, &cache, &lock).unwrap();
        stdfs::write(&paths.object, "obj").unwrap();
        stdfs::write(
            &paths.dep_file,
            format!("out/a.c.o: \\\n {}\n", src.path.display()),
        )
        .unwrap();

        let now = SystemTime::now();
        set_time(&paths.source_mark, now);
        // Even with an ancient header mark, the source entry alone does not
        // count as a header dependency.
        set_time(&paths.header_mark, now - Duration::from_secs(3600));

        assert!(!check_stale("t", &src, &paths, &compiler, &cache, &lock).unwrap());
    }

    #[test]
    fn test_mtime_cache_counts_hits() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("h.h");
        stdfs::write(&file, "x").unwrap();

        let cache = MtimeCache::new();
        cache.modified(&file).unwrap();
        cache.modified(&file).unwrap();
        cache.modified(&file).unwrap();
        assert_eq!(cache.stats(), (2, 1));
    }
}
