use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::id::Handle;
use crate::wire::PrimitiveKind;

/// A fixed-width primitive value.
///
/// Float variants compare by bit pattern in [`structurally_equal`] so that
/// a round-trip through the wire format is an identity even for NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimitiveValue {
    /// One-byte truth value.
    Boolean(bool),
    /// Signed 8-bit integer.
    Byte(i8),
    /// Signed 16-bit integer.
    Short(i16),
    /// Unsigned 16-bit code unit.
    Char(u16),
    /// Signed 32-bit integer.
    Int(i32),
    /// Signed 64-bit integer.
    Long(i64),
    /// IEEE-754 single precision.
    Float(f32),
    /// IEEE-754 double precision.
    Double(f64),
}

impl PrimitiveValue {
    /// Returns the wire kind of this value.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Boolean(_) => PrimitiveKind::Boolean,
            Self::Byte(_) => PrimitiveKind::Byte,
            Self::Short(_) => PrimitiveKind::Short,
            Self::Char(_) => PrimitiveKind::Char,
            Self::Int(_) => PrimitiveKind::Int,
            Self::Long(_) => PrimitiveKind::Long,
            Self::Float(_) => PrimitiveKind::Float,
            Self::Double(_) => PrimitiveKind::Double,
        }
    }

    fn bitwise_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

/// One field of a resolved type, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Name of the field's type ("int", "java.lang.String", ...).
    #[serde(rename = "type")]
    pub type_name: String,
    /// Whether the field holds a fixed-width primitive.
    #[serde(default)]
    pub primitive: bool,
}

/// The resolved field layout of a named type.
///
/// The binary format stores object field values positionally, so the field
/// order here is load-bearing: it must be identical between the decode and
/// encode of any payload mentioning the type. Descriptors come from one
/// archive and are cached for the process lifetime, which pins that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Fully qualified type name.
    pub name: String,
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

/// A node in a decoded (or edited) object graph.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphNode {
    /// The null value.
    Null,

    /// A fixed-width primitive.
    Primitive(PrimitiveValue),

    /// A length-prefixed byte run. Not required to be valid UTF-8.
    Str(Vec<u8>),

    /// An ordered sequence of values.
    Array {
        /// Element type name carried on the wire, preserved verbatim.
        element_type: String,
        /// Handle label assigned when the node was decoded or parsed.
        /// `None` for freshly built nodes that nothing references.
        handle: Option<Handle>,
        /// The elements.
        elements: Vec<GraphNode>,
    },

    /// A typed object with positionally encoded fields.
    Object {
        /// Fully qualified type name; resolved to a descriptor on encode.
        type_name: String,
        /// Handle label, as for arrays.
        handle: Option<Handle>,
        /// Field name and value pairs in the descriptor's declared order.
        fields: Vec<(String, GraphNode)>,
    },

    /// Denotes "the same node as the object/array labeled with this
    /// handle", expressing shared substructure and cycles.
    BackRef(Handle),
}

/// Compares two graphs by shape, value and reference topology, ignoring
/// the concrete handle numbering.
///
/// Handle labels are matched up via a bijection built as both trees are
/// walked in lockstep; two graphs are equal when every back-reference on
/// one side aliases the node at the same position as its counterpart.
pub fn structurally_equal(a: &GraphNode, b: &GraphNode) -> bool {
    let mut forward: HashMap<Handle, Handle> = HashMap::new();
    let mut reverse: HashMap<Handle, Handle> = HashMap::new();
    eq_walk(a, b, &mut forward, &mut reverse)
}

fn bind(
    a: Handle,
    b: Handle,
    forward: &mut HashMap<Handle, Handle>,
    reverse: &mut HashMap<Handle, Handle>,
) -> bool {
    match (forward.get(&a), reverse.get(&b)) {
        (None, None) => {
            forward.insert(a, b);
            reverse.insert(b, a);
            true
        }
        (Some(bound_b), Some(bound_a)) => *bound_b == b && *bound_a == a,
        _ => false,
    }
}

fn eq_walk(
    a: &GraphNode,
    b: &GraphNode,
    forward: &mut HashMap<Handle, Handle>,
    reverse: &mut HashMap<Handle, Handle>,
) -> bool {
    match (a, b) {
        (GraphNode::Null, GraphNode::Null) => true,
        (GraphNode::Primitive(x), GraphNode::Primitive(y)) => x.bitwise_eq(y),
        (GraphNode::Str(x), GraphNode::Str(y)) => x == y,
        (
            GraphNode::Array {
                element_type: et_a,
                handle: h_a,
                elements: el_a,
            },
            GraphNode::Array {
                element_type: et_b,
                handle: h_b,
                elements: el_b,
            },
        ) => {
            if et_a != et_b || el_a.len() != el_b.len() {
                return false;
            }
            if let (Some(ha), Some(hb)) = (h_a, h_b) {
                if !bind(*ha, *hb, forward, reverse) {
                    return false;
                }
            }
            el_a
                .iter()
                .zip(el_b)
                .all(|(x, y)| eq_walk(x, y, forward, reverse))
        }
        (
            GraphNode::Object {
                type_name: tn_a,
                handle: h_a,
                fields: f_a,
            },
            GraphNode::Object {
                type_name: tn_b,
                handle: h_b,
                fields: f_b,
            },
        ) => {
            if tn_a != tn_b || f_a.len() != f_b.len() {
                return false;
            }
            if let (Some(ha), Some(hb)) = (h_a, h_b) {
                if !bind(*ha, *hb, forward, reverse) {
                    return false;
                }
            }
            f_a.iter().zip(f_b).all(|((name_a, val_a), (name_b, val_b))| {
                name_a == name_b && eq_walk(val_a, val_b, forward, reverse)
            })
        }
        (GraphNode::BackRef(ha), GraphNode::BackRef(hb)) => {
            // Both labels must already be bound to each other; a reference
            // into unvisited territory has no meaning in pre-order.
            forward.get(ha) == Some(hb) && reverse.get(hb) == Some(ha)
        }
        _ => false,
    }
}
