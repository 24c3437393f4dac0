//! Per-component configuration: resolve sources, decide staleness, and
//! assemble the immutable compile jobs.

use std::path::PathBuf;
use std::sync::Mutex;

use crate::builder::sources::{classify_language, resolve_sources};
use crate::builder::stale::{check_stale, MtimeCache, UnitPaths};
use crate::builder::{GlobalOptions, Toolset};
use crate::core::component::{CompileJob, Component, ComponentId, Visibility};
use crate::core::graph::ComponentGraph;
use crate::error::BuildError;
use crate::util::fs::ensure_dir;
use crate::util::hash::short_path_hash;

/// Output subdirectory for sources outside the component root.
const EXTERNAL_DIR: &str = "External_";

/// Split a raw option string on unescaped spaces, honoring `\` escapes, and
/// append the pieces.
pub fn push_split_options(args: &mut Vec<String>, option: &str) {
    let mut current = String::new();
    let mut escape_next = false;
    for ch in option.chars() {
        if escape_next {
            current.push(ch);
            escape_next = false;
        } else if ch == '\\' {
            escape_next = true;
        } else if ch == ' ' {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        args.push(current);
    }
}

/// Resolve a component into its compile jobs and full object list.
///
/// Returns `(jobs, objects)`: jobs cover only the stale units; `objects`
/// lists every unit's object path in resolution order, for archiving and
/// linking.
pub fn configure_component(
    graph: &ComponentGraph,
    id: ComponentId,
    toolset: &Toolset,
    globals: &GlobalOptions,
    cache: &MtimeCache,
    fs_lock: &Mutex<()>,
) -> Result<(Vec<CompileJob>, Vec<PathBuf>), BuildError> {
    let component = graph.get(id);
    let sources = resolve_sources(component)?;

    let mut jobs = Vec::new();
    let mut objects = Vec::new();

    for source in &sources {
        let language = classify_language(&source.path)?;
        let compiler = toolset.compiler_for(language).ok_or_else(|| {
            BuildError::CompilerNotConfigured {
                language,
                source_path: source.path.clone(),
            }
        })?;

        let parent = source.path.parent().unwrap_or(component.root_path());
        let output_dir = if source.is_external {
            component
                .output_path()
                .join(EXTERNAL_DIR)
                .join(short_path_hash(parent))
        } else {
            let relative = parent
                .strip_prefix(component.root_path())
                .unwrap_or(parent);
            component.output_path().join(relative)
        };
        ensure_dir(&output_dir).map_err(|e| BuildError::FileSystemError {
            path: output_dir.clone(),
            message: e.to_string(),
        })?;

        let file_name = source
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let paths = UnitPaths::new(&output_dir, &file_name, compiler);
        objects.push(paths.object.clone());

        if !check_stale(component.name(), source, &paths, compiler, cache, fs_lock)? {
            continue;
        }

        let argv = build_argv(graph, component, compiler, globals, source, &paths);
        jobs.push(CompileJob {
            compiler: compiler.clone(),
            source: source.path.clone(),
            object: paths.object,
            dep_file: paths.dep_file,
            argv,
        });
    }

    Ok((jobs, objects))
}

/// Assemble the argv of one compile job.
///
/// Ordering: base flags, compile + output, dependency flags, the
/// component's own properties, PUBLIC properties of its direct libraries,
/// then the global lists.
fn build_argv(
    graph: &ComponentGraph,
    component: &Component,
    compiler: &crate::toolchain::Compiler,
    globals: &GlobalOptions,
    source: &crate::core::component::SourceFilePath,
    paths: &UnitPaths,
) -> Vec<String> {
    let ops = compiler.ops();
    let language = compiler.language();
    let mut argv = compiler.base_flags().to_vec();

    ops.push_compile_and_output(&mut argv, language, &source.path, &paths.object);
    ops.push_dependency_flags(&mut argv, language, &paths.dep_file);

    for inc in component.include_paths() {
        ops.push_include_path(&mut argv, &inc.value.to_string_lossy());
    }
    for def in component.definitions() {
        ops.push_definition(&mut argv, &def.value);
    }
    for opt in component.compile_options() {
        push_split_options(&mut argv, &opt.value);
    }

    for &lib_id in component.libraries() {
        merge_library_public(&mut argv, graph.get(lib_id), ops);
    }

    for inc in &globals.include_paths {
        ops.push_include_path(&mut argv, &inc.to_string_lossy());
    }
    for def in &globals.definitions {
        ops.push_definition(&mut argv, def);
    }
    for opt in globals.options_for(language) {
        push_split_options(&mut argv, opt);
    }

    argv
}

/// Merge a library's PUBLIC-visible properties into a consumer's argv.
fn merge_library_public(
    argv: &mut Vec<String>,
    library: &Component,
    ops: &dyn crate::toolchain::FamilyOps,
) {
    if library.include_path_mask().intersects(Visibility::PUBLIC) {
        for inc in library.include_paths() {
            if inc.visibility.intersects(Visibility::PUBLIC) {
                ops.push_include_path(argv, &inc.value.to_string_lossy());
            }
        }
    }
    if library.definition_mask().intersects(Visibility::PUBLIC) {
        for def in library.definitions() {
            if def.visibility.intersects(Visibility::PUBLIC) {
                ops.push_definition(argv, &def.value);
            }
        }
    }
    if library.compile_option_mask().intersects(Visibility::PUBLIC) {
        for opt in library.compile_options() {
            if opt.visibility.intersects(Visibility::PUBLIC) {
                push_split_options(argv, &opt.value);
            }
        }
    }
}
