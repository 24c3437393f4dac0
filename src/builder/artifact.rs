//! Artifact assembly: archive for libraries, link for executables.

use std::path::PathBuf;

use crate::builder::configure::push_split_options;
use crate::core::component::{Component, ComponentId, ComponentKind};
use crate::core::graph::ComponentGraph;
use crate::error::BuildError;
use crate::toolchain::{Archiver, Linker};
use crate::util::fs::{normalize_under, write_argfile};
use crate::util::process::{ProcessBuilder, SpawnError};
use crate::util::shell::Shell;

/// The final artifact path of a component.
pub fn artifact_path(component: &Component, archiver: &Archiver, linker: &Linker) -> PathBuf {
    let extension = match component.kind() {
        ComponentKind::Library => archiver.ops().archive_extension(),
        ComponentKind::Executable => linker.ops().executable_extension(),
    };
    component
        .output_path()
        .join(format!("{}{}", component.name(), extension))
}

/// Assemble a component's final artifact from its objects (and, for
/// executables, its transitive libraries).
pub fn assemble_component(
    graph: &ComponentGraph,
    id: ComponentId,
    archiver: &Archiver,
    linker: &Linker,
    global_link_options: &[String],
    shell: &Shell,
) -> Result<(), BuildError> {
    match graph.get(id).kind() {
        ComponentKind::Library => archive(graph.get(id), archiver, shell),
        ComponentKind::Executable => {
            link(graph, id, archiver, linker, global_link_options, shell)
        }
    }
}

fn archive(component: &Component, archiver: &Archiver, shell: &Shell) -> Result<(), BuildError> {
    let name = component.name();
    shell.phase(format!("Archive [{}]", name));

    let ops = archiver.ops();
    let output = component
        .output_path()
        .join(format!("{}{}", name, ops.archive_extension()));
    let argfile = component
        .output_path()
        .join(format!("{}_ar_args.txt", name));

    let mut args = Vec::new();
    ops.push_archive_flags(&mut args, &output);
    if ops.supports_argfile() {
        write_argfile(&argfile, component.output_objects()).map_err(|e| {
            BuildError::FileSystemError {
                path: argfile.clone(),
                message: e.to_string(),
            }
        })?;
        ops.push_input_argfile(&mut args, &argfile);
    } else {
        for object in component.output_objects() {
            args.push(object.to_string_lossy().into_owned());
        }
    }

    let (success, tool_output) =
        run_tool(archiver.location(), &args).map_err(|message| BuildError::ArchiveFailed {
            component: name.to_string(),
            output: message,
        })?;
    if !success {
        return Err(BuildError::ArchiveFailed {
            component: name.to_string(),
            output: tool_output,
        });
    }
    Ok(())
}

fn link(
    graph: &ComponentGraph,
    id: ComponentId,
    archiver: &Archiver,
    linker: &Linker,
    global_link_options: &[String],
    shell: &Shell,
) -> Result<(), BuildError> {
    let component = graph.get(id);
    let name = component.name();
    shell.phase(format!("Link [{}]", name));

    let ops = linker.ops();
    let output = artifact_path(component, archiver, linker);

    // Relative linker scripts resolve against the component root; a
    // configured script must exist.
    let script = match component.linker_script() {
        Some(script) => {
            let script = normalize_under(component.root_path(), script);
            if !script.exists() {
                return Err(BuildError::LinkerScriptMissing {
                    component: name.to_string(),
                    script,
                });
            }
            Some(script)
        }
        None => None,
    };

    // Pre-order of first visit; group flags for order-sensitive linkers are
    // the configuration's responsibility.
    let libraries = graph.transitive_archives(id, archiver.ops().archive_extension())?;

    let mut args = Vec::new();
    ops.push_link_flags(&mut args, &output, script.as_deref());

    let argfile = component
        .output_path()
        .join(format!("{}_link_args.txt", name));
    if ops.supports_argfile() {
        write_argfile(&argfile, component.output_objects()).map_err(|e| {
            BuildError::FileSystemError {
                path: argfile.clone(),
                message: e.to_string(),
            }
        })?;
        ops.push_input_argfile(&mut args, &argfile);
    } else {
        for object in component.output_objects() {
            args.push(object.to_string_lossy().into_owned());
        }
    }

    for library in &libraries {
        args.push(library.to_string_lossy().into_owned());
    }
    for option in component.link_options() {
        push_split_options(&mut args, option);
    }
    for option in global_link_options {
        push_split_options(&mut args, option);
    }

    let (success, tool_output) =
        run_tool(linker.location(), &args).map_err(|message| BuildError::LinkFailed {
            component: name.to_string(),
            output: message,
        })?;
    if !success {
        return Err(BuildError::LinkFailed {
            component: name.to_string(),
            output: tool_output,
        });
    }
    Ok(())
}

/// Run an archiver/linker invocation, capturing combined output.
fn run_tool(location: &str, args: &[String]) -> Result<(bool, String), String> {
    let command = ProcessBuilder::new(location).args(args);
    tracing::debug!("run: {}", command.display_command());
    match command.exec() {
        Ok(out) => Ok((out.success(), out.output)),
        Err(SpawnError::NotFound) => Err(format!("`{}` not found", location)),
        Err(SpawnError::Other(e)) => Err(e.to_string()),
    }
}
