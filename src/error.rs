//! Build error types.
//!
//! Every failure the driver can surface is a [`BuildError`] variant; the ops
//! layer wraps them in `anyhow` context on the way to the user.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::standard::Language;

/// Error raised while configuring or building a project.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("tool not found: `{location}`")]
    ToolNotFound { location: String },

    #[error("tool `{location}` is not a recognized compiler family")]
    ToolNotRecognized {
        location: String,
        version_text: String,
    },

    #[error("failed to probe `{location}`: {message}")]
    ToolProbeFailed { location: String, message: String },

    #[error("no {language} compiler configured (required by `{}`)", source_path.display())]
    CompilerNotConfigured {
        language: Language,
        source_path: PathBuf,
    },

    #[error("unsupported source extension: `{}`", source_path.display())]
    UnsupportedExtension { source_path: PathBuf },

    #[error("invalid source wildcard: `{pattern}`")]
    BadWildcard { pattern: String },

    #[error("[{component}] recursive wildcards are not allowed outside the component root: `{pattern}`")]
    ExternalRecursiveDenied { component: String, pattern: String },

    #[error("[{component}] source not found: `{}`", source_path.display())]
    SourceMissing {
        component: String,
        source_path: PathBuf,
    },

    #[error("filesystem error at `{}`: {message}", path.display())]
    FileSystemError { path: PathBuf, message: String },

    #[error("[{component}] failed to compile `{}`", source_path.display())]
    CompileFailed {
        component: String,
        source_path: PathBuf,
        command: String,
    },

    #[error("[{component}] failed to archive:\n{output}")]
    ArchiveFailed { component: String, output: String },

    #[error("[{component}] failed to link:\n{output}")]
    LinkFailed { component: String, output: String },

    #[error("[{component}] linker script not found: `{}`", script.display())]
    LinkerScriptMissing { component: String, script: PathBuf },

    #[error("library cycle detected: {}", chain.join(" -> "))]
    LibraryCycle { chain: Vec<String> },

    #[error("component `{name}` does not exist")]
    ComponentNotFound { name: String },

    #[error("component name `{name}` is already taken")]
    ComponentNameTaken { name: String },

    #[error("invalid component name `{name}` - only alphanumeric characters, dashes and underscores are allowed")]
    InvalidComponentName { name: String },

    #[error("[{component}] `{library}` is not a library")]
    NotALibrary { component: String, library: String },

    #[error("[{component}] a component cannot list itself as a library")]
    SelfDependency { component: String },

    #[error("failed to start compile worker pool: {message}")]
    WorkerPoolFailed { message: String },
}

impl BuildError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn fs(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        BuildError::FileSystemError {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display_joins_chain() {
        let err = BuildError::LibraryCycle {
            chain: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(err.to_string(), "library cycle detected: a -> b -> a");
    }

    #[test]
    fn test_fs_error_carries_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = BuildError::fs("/tmp/out", io);
        let text = err.to_string();
        assert!(text.contains("/tmp/out"));
        assert!(text.contains("denied"));
    }
}
