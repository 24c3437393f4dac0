//! Tool wrappers: compiler, archiver, linker.
//!
//! Each wrapper pairs a program location with its detected family. The
//! compiler additionally carries the source language, the language standard,
//! and the base flags seeded from family defaults plus the standard flag.

use crate::core::standard::{Language, Standard};
use crate::error::BuildError;

use super::detect::{classify_family, probe_version_text};
use super::{FamilyOps, ToolFamily};

/// A configured compiler for one source language.
#[derive(Debug)]
pub struct Compiler {
    location: String,
    family: ToolFamily,
    standard: Standard,
    base_flags: Vec<String>,
}

impl Compiler {
    /// Create a compiler, probing `--version` to detect the family.
    pub fn new(location: impl Into<String>, standard: Standard) -> Result<Self, BuildError> {
        let location = location.into();
        let version_text = probe_version_text(&location)?;
        Self::from_version_text(location, standard, &version_text)
    }

    /// Create a compiler from an already-known version banner, skipping the
    /// `--version` probe.
    pub fn with_known_version(
        location: impl Into<String>,
        standard: Standard,
        version_text: &str,
    ) -> Result<Self, BuildError> {
        Self::from_version_text(location.into(), standard, version_text)
    }

    fn from_version_text(
        location: String,
        standard: Standard,
        version_text: &str,
    ) -> Result<Self, BuildError> {
        let family = classify_family(&location, version_text)?;
        let base_flags = family.ops().base_flags(standard);
        tracing::debug!(
            "create {} compiler \"{}\" [{}] standard {}",
            standard.language(),
            location,
            family,
            standard
        );
        Ok(Compiler {
            location,
            family,
            standard,
            base_flags,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn family(&self) -> ToolFamily {
        self.family
    }

    pub fn language(&self) -> Language {
        self.standard.language()
    }

    pub fn standard(&self) -> Standard {
        self.standard
    }

    /// Flags every compile command of this compiler starts with.
    pub fn base_flags(&self) -> &[String] {
        &self.base_flags
    }

    /// The family's flag-construction backend.
    pub fn ops(&self) -> &'static dyn FamilyOps {
        self.family.ops()
    }

    /// Whether compiles emit a dependency file worth parsing.
    pub fn emits_dep_file(&self) -> bool {
        self.ops().emits_dep_file(self.language())
    }
}

/// A configured archiver.
#[derive(Debug)]
pub struct Archiver {
    location: String,
    family: ToolFamily,
}

impl Archiver {
    /// Create an archiver, probing `--version` to detect the family.
    pub fn new(location: impl Into<String>) -> Result<Self, BuildError> {
        let location = location.into();
        let version_text = probe_version_text(&location)?;
        Self::with_known_version(location, &version_text)
    }

    /// Create an archiver from an already-known version banner.
    pub fn with_known_version(
        location: impl Into<String>,
        version_text: &str,
    ) -> Result<Self, BuildError> {
        let location = location.into();
        let family = classify_family(&location, version_text)?;
        tracing::debug!("create archiver \"{}\" [{}]", location, family);
        Ok(Archiver { location, family })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn family(&self) -> ToolFamily {
        self.family
    }

    pub fn ops(&self) -> &'static dyn FamilyOps {
        self.family.ops()
    }
}

/// A configured linker.
#[derive(Debug)]
pub struct Linker {
    location: String,
    family: ToolFamily,
}

impl Linker {
    /// Create a linker, probing `--version` to detect the family.
    pub fn new(location: impl Into<String>) -> Result<Self, BuildError> {
        let location = location.into();
        let version_text = probe_version_text(&location)?;
        Self::with_known_version(location, &version_text)
    }

    /// Create a linker from an already-known version banner.
    pub fn with_known_version(
        location: impl Into<String>,
        version_text: &str,
    ) -> Result<Self, BuildError> {
        let location = location.into();
        let family = classify_family(&location, version_text)?;
        tracing::debug!("create linker \"{}\" [{}]", location, family);
        Ok(Linker { location, family })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn family(&self) -> ToolFamily {
        self.family
    }

    pub fn ops(&self) -> &'static dyn FamilyOps {
        self.family.ops()
    }
}
