//! Centralized error handling for serview.
//!
//! All failure conditions are represented as `Result` values; the crate
//! bans panicking paths through `#![deny(clippy::unwrap_used)]` and
//! `#![deny(clippy::panic)]`. Errors are grouped by failure domain because
//! the session boundary reports each domain differently: resolution
//! failures during indexing are logged and skipped, decode failures replace
//! the rendered text with a diagnostic, and encode failures leave the
//! original message bytes untouched.
//!
//! Where an error is caused by a lower-level one, the cause is preserved
//! through [`std::error::Error::source`] so the session boundary can render
//! the full chain.

use std::fmt;
use std::path::PathBuf;

/// Failure to resolve a type name to a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// No configured archive defines the requested type.
    NotFound(String),

    /// An archive that the index attributes the type to could not be read
    /// or did not parse.
    LoadFailed {
        /// Path of the offending archive.
        archive: PathBuf,
        /// Human-readable description of what went wrong.
        detail: String,
    },
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(name) => {
                write!(f, "type '{name}' is not defined by any configured archive")
            }
            Self::LoadFailed { archive, detail } => {
                write!(f, "archive '{}' failed to load: {detail}", archive.display())
            }
        }
    }
}

impl std::error::Error for ResolutionError {}

/// Failure while decoding a binary payload into a tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The stream does not start with the expected 4-byte header.
    BadHeader,

    /// The stream ended before a tag's content was fully consumed.
    Truncated {
        /// Bytes the current read needed.
        needed: usize,
        /// Bytes actually remaining in the stream.
        remaining: usize,
    },

    /// A tag byte outside the recognized set.
    UnknownTag(u8),

    /// A back-reference to a wire handle that was never assigned.
    DanglingReference(u32),

    /// A type referenced by the stream could not be resolved.
    UnresolvedType {
        /// The type name as it appeared on the wire.
        name: String,
        /// The underlying resolution failure.
        source: ResolutionError,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadHeader => write!(f, "payload does not start with the expected stream header"),
            Self::Truncated { needed, remaining } => write!(
                f,
                "payload truncated: needed {needed} more byte(s), {remaining} remaining"
            ),
            Self::UnknownTag(tag) => write!(f, "unrecognized value tag 0x{tag:02X}"),
            Self::DanglingReference(handle) => {
                write!(f, "back-reference to unassigned wire handle 0x{handle:08X}")
            }
            Self::UnresolvedType { name, .. } => {
                write!(f, "cannot decode object of unresolved type '{name}'")
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnresolvedType { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure while encoding a tree back into a binary payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// An object node's type name does not match any known descriptor,
    /// typically because the user edited it to something unknown.
    UnresolvedType {
        /// The offending type name.
        name: String,
        /// The underlying resolution failure.
        source: ResolutionError,
    },

    /// The tree contains a shape the wire format cannot express, such as a
    /// field set that disagrees with the type's descriptor or a reference
    /// to a label that no earlier node defines.
    UnsupportedVariant(String),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedType { name, .. } => {
                write!(f, "cannot encode object of unresolved type '{name}'")
            }
            Self::UnsupportedVariant(detail) => write!(f, "unencodable tree: {detail}"),
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnresolvedType { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure while parsing edited text back into a tree.
///
/// Produced by [`crate::view::EditableView::parse`] implementations. Render
/// is total, so only the parse direction carries an error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based line the failure was detected on.
    pub line: usize,
    /// What was expected or found.
    pub message: String,
}

impl ParseError {
    /// Creates a parse error pinned to a line.
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}
