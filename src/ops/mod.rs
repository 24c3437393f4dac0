//! High-level operations: the project lifecycle.

pub mod project;

pub use project::ProjectContext;
