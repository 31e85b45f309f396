//! # Serview
//!
//! A byte-exact codec for viewing and editing binary object-graph payloads
//! embedded inside larger opaque byte streams (HTTP message bodies).
//!
//! ## Overview
//!
//! Some messages carry, somewhere in their body, a binary-encoded object
//! graph: a length-implicit, self-describing stream with typed objects,
//! primitive and string encodings, arrays, and back-references expressing
//! shared substructure and cycles. Serview makes those payloads editable:
//!
//! 1. **Locate.** [`MessageSplicer`] scans the buffer for the 2-byte magic
//!    marker. Bytes between the body start and the marker are kept as an
//!    opaque prefix; everything from the marker on is the payload.
//! 2. **Decode.** [`GraphDecoder`] parses the payload into a tree of
//!    [`GraphNode`]s in one forward pass, consulting a [`TypeResolver`]
//!    for the positional field layout of every object type the stream
//!    mentions. Cycles come out as integer-handle back-references, not
//!    native pointers.
//! 3. **Edit.** An [`EditableView`] renders the tree as structured text
//!    and parses the edited text back. The built-in [`TextView`] grammar
//!    is lossless for every node variant, escaping newlines and arbitrary
//!    bytes inside string literals.
//! 4. **Encode and splice.** [`GraphEncoder`] re-serializes the tree with
//!    freshly assigned handles, and the splicer recombines prefix and new
//!    payload into a body the transport layer can reattach headers to.
//!
//! The [`EditSession`] ties the four steps together for one displayed
//! message and converts every failure into a diagnostic instead of a
//! crash: undecodable payloads render as an error description, and edits
//! that no longer encode fall back to the original bytes unchanged.
//!
//! ## Type resolution
//!
//! The payload does not describe field layouts; those come from
//! type-definition archives on disk. [`TypeResolver`] scans the configured
//! search paths once, lazily, and is shared process-wide across sessions
//! ([`TypeResolver::shared`]). Archive formats are pluggable through
//! [`resolver::source::TypeDefinitionSource`]; the production backend
//! reads `*.types.json` manifests.
//!
//! ## Safety and error handling
//!
//! * **No panics:** no `unwrap()` or `panic!()` in the library (enforced
//!   by clippy lints). Hostile payloads can only produce typed errors.
//! * **Bounded reads:** every decoder read is bounds checked; truncated
//!   input fails with [`error::DecodeError::Truncated`].
//! * **Byte fidelity:** prefix bytes are replayed verbatim; only the
//!   payload region is ever rewritten.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

// --- PUBLIC API MODULES ---
pub mod decode;
pub mod encode;
pub mod error;
pub mod graph;
pub mod resolver;
pub mod session;
pub mod splice;
pub mod view;
pub mod wire;

// --- RE-EXPORTS ---

pub use decode::GraphDecoder;
pub use encode::GraphEncoder;
pub use error::{DecodeError, EncodeError, ParseError, ResolutionError};
pub use graph::{structurally_equal, GraphNode, Handle, PrimitiveValue, TypeDescriptor};
pub use resolver::{ResolverConfig, TypeResolver};
pub use session::{EditSession, LoadOutcome, RebuildOutcome};
pub use splice::{MessageSplicer, PayloadSplit};
pub use view::{EditableView, TextView};
