//! The component graph.
//!
//! A set of uniquely named components with directed library edges, built by
//! append-only operations from the configuration phase. Cycles are not
//! rejected at construction; they surface during the transitive library walk.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::component::{Component, ComponentId, ComponentKind};
use crate::error::BuildError;

static COMPONENT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_\- ]+$").expect("valid regex"));

/// Check a component name against the allowed character set.
pub fn is_valid_component_name(name: &str) -> bool {
    COMPONENT_NAME_RE.is_match(name)
}

/// Arena of components with name lookup and library edges.
#[derive(Debug, Default)]
pub struct ComponentGraph {
    components: Vec<Component>,
    names: HashMap<String, ComponentId>,
}

impl ComponentGraph {
    pub fn new() -> Self {
        ComponentGraph::default()
    }

    /// Register a new component. Names must be unique and restricted to
    /// alphanumerics, dashes and underscores.
    pub fn add(
        &mut self,
        kind: ComponentKind,
        name: &str,
        script_origin: impl Into<PathBuf>,
        root_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Result<ComponentId, BuildError> {
        if !is_valid_component_name(name) {
            return Err(BuildError::InvalidComponentName {
                name: name.to_string(),
            });
        }
        if self.names.contains_key(name) {
            return Err(BuildError::ComponentNameTaken {
                name: name.to_string(),
            });
        }

        let id = ComponentId(self.components.len());
        self.components
            .push(Component::new(kind, name, script_origin, root_path, output_path));
        self.names.insert(name.to_string(), id);
        tracing::debug!("register {} [{}]", kind.as_str(), name);
        Ok(id)
    }

    pub fn get(&self, id: ComponentId) -> &Component {
        &self.components[id.0]
    }

    pub fn get_mut(&mut self, id: ComponentId) -> &mut Component {
        &mut self.components[id.0]
    }

    pub fn by_name(&self, name: &str) -> Option<ComponentId> {
        self.names.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component ids in registration order.
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = ComponentId> {
        (0..self.components.len()).map(ComponentId)
    }

    /// Add a library edge from `target` to `library`.
    ///
    /// Duplicate edges are ignored; direct self-edges and edges to
    /// non-library components are rejected. The back-edge on the library's
    /// user list is maintained symmetrically.
    pub fn add_library(
        &mut self,
        target: ComponentId,
        library: ComponentId,
    ) -> Result<(), BuildError> {
        if target == library {
            return Err(BuildError::SelfDependency {
                component: self.get(target).name().to_string(),
            });
        }
        if self.get(library).kind() != ComponentKind::Library {
            return Err(BuildError::NotALibrary {
                component: self.get(target).name().to_string(),
                library: self.get(library).name().to_string(),
            });
        }
        if self.get(target).libraries.contains(&library) {
            return Ok(());
        }

        tracing::debug!(
            "[{}] add library [{}]",
            self.get(target).name(),
            self.get(library).name()
        );
        self.get_mut(target).libraries.push(library);
        if !self.get(library).users.contains(&target) {
            self.get_mut(library).users.push(target);
        }
        Ok(())
    }

    /// Resolve the transitive library archives of `start`, depth-first,
    /// emitting each archive once in pre-order of first visit.
    ///
    /// `archive_ext` is the archiver's extension including the dot.
    pub fn transitive_archives(
        &self,
        start: ComponentId,
        archive_ext: &str,
    ) -> Result<Vec<PathBuf>, BuildError> {
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        let mut archives = Vec::new();
        self.walk_libraries(start, archive_ext, &mut visited, &mut stack, &mut archives)?;
        Ok(archives)
    }

    fn walk_libraries(
        &self,
        id: ComponentId,
        archive_ext: &str,
        visited: &mut HashSet<ComponentId>,
        stack: &mut Vec<ComponentId>,
        archives: &mut Vec<PathBuf>,
    ) -> Result<(), BuildError> {
        for &lib in self.get(id).libraries() {
            if let Some(pos) = stack.iter().position(|&c| c == lib) {
                let mut chain: Vec<String> = stack[pos..]
                    .iter()
                    .map(|&c| self.get(c).name().to_string())
                    .collect();
                chain.push(self.get(lib).name().to_string());
                return Err(BuildError::LibraryCycle { chain });
            }
            if !visited.insert(lib) {
                continue;
            }

            let library = self.get(lib);
            archives.push(
                library
                    .output_path()
                    .join(format!("{}{}", library.name(), archive_ext)),
            );

            stack.push(lib);
            self.walk_libraries(lib, archive_ext, visited, stack, archives)?;
            stack.pop();
        }
        Ok(())
    }
}
