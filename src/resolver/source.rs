//! Pluggable archive backends for type definitions.
//!
//! The resolver does not care how type definitions are stored on disk; it
//! talks to a [`TypeDefinitionSource`], which knows how to recognize an
//! archive file, list the type names it contributes, and load one
//! definition out of it. One production backend ships with the crate:
//! [`JsonArchiveSource`], reading `*.types.json` manifests.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ResolutionError;
use crate::graph::TypeDescriptor;

/// Interface for archive formats that contribute type definitions.
///
/// Implementors provide structural metadata only; no code is ever loaded
/// or executed from an archive.
pub trait TypeDefinitionSource: Send + Sync + fmt::Debug {
    /// Returns true if this backend understands the given file.
    fn matches(&self, path: &Path) -> bool;

    /// Lists the type names the archive defines, for the index build.
    fn index(&self, path: &Path) -> Result<Vec<String>, ResolutionError>;

    /// Loads one type definition out of the archive.
    fn load(&self, path: &Path, type_name: &str) -> Result<TypeDescriptor, ResolutionError>;
}

/// File name suffix recognized by [`JsonArchiveSource`].
pub const JSON_ARCHIVE_SUFFIX: &str = ".types.json";

#[derive(Debug, Deserialize)]
struct ArchiveManifest {
    #[serde(default)]
    types: Vec<TypeDescriptor>,
}

/// The production archive backend: a JSON manifest listing the types an
/// archive defines together with their declared field order.
///
/// ```json
/// {
///   "types": [
///     {
///       "name": "com.example.User",
///       "fields": [
///         { "name": "age", "type": "int", "primitive": true },
///         { "name": "login", "type": "java.lang.String" }
///       ]
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct JsonArchiveSource;

impl JsonArchiveSource {
    fn read_manifest(&self, path: &Path) -> Result<ArchiveManifest, ResolutionError> {
        let raw = fs::read_to_string(path).map_err(|e| ResolutionError::LoadFailed {
            archive: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| ResolutionError::LoadFailed {
            archive: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

impl TypeDefinitionSource for JsonArchiveSource {
    fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(JSON_ARCHIVE_SUFFIX))
    }

    fn index(&self, path: &Path) -> Result<Vec<String>, ResolutionError> {
        let manifest = self.read_manifest(path)?;
        Ok(manifest.types.into_iter().map(|t| t.name).collect())
    }

    fn load(&self, path: &Path, type_name: &str) -> Result<TypeDescriptor, ResolutionError> {
        let manifest = self.read_manifest(path)?;
        manifest
            .types
            .into_iter()
            .find(|t| t.name == type_name)
            .ok_or_else(|| ResolutionError::NotFound(type_name.to_string()))
    }
}
