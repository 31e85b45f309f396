//! The in-memory object-graph model shared by the decoder, encoder and
//! text views.
//!
//! A decoded payload becomes a tree of [`GraphNode`]s. Sharing and cycles
//! are expressed with integer [`Handle`]s instead of native references:
//! every object and array carries the handle it was assigned, and a
//! [`GraphNode::BackRef`] holds the handle of the node it aliases. This
//! keeps the tree plainly owned by one session with no shared-ownership
//! machinery, while still representing arbitrary reference topology.

/// Defines the `Handle` type.
pub mod id;
/// Defines the node tree and type descriptors.
pub mod node;

pub use id::Handle;
pub use node::{
    structurally_equal, FieldDescriptor, GraphNode, PrimitiveValue, TypeDescriptor,
};
