//! The encode side of the codec: [`GraphNode`] tree to binary payload.
//!
//! The encoder is a fresh forward pass over the (possibly edited) tree.
//! It does not reuse the handle numbers the tree was decoded with: every
//! object and array is assigned a new handle in pre-order, and the node's
//! recorded label is remapped so back-references land on the new number.
//! Object fields are emitted positionally in the order of the freshly
//! resolved descriptor, which by the resolver's caching is the same order
//! the decoder used for that type name.

use std::collections::HashMap;

use crate::error::EncodeError;
use crate::graph::{GraphNode, Handle, PrimitiveValue};
use crate::resolver::TypeResolver;
use crate::wire::{
    put_u16, put_u32, HANDLE_BASE, STREAM_HEADER, TAG_ARRAY, TAG_BACKREF, TAG_NULL, TAG_OBJECT,
    TAG_STRING,
};

/// Serializes trees into binary payloads.
#[derive(Debug)]
pub struct GraphEncoder;

impl GraphEncoder {
    /// Encodes a tree into a complete payload, header included.
    ///
    /// The resolver must be the same registry the tree was decoded with;
    /// field order is taken from it and the encoder cannot independently
    /// verify that the order matches what a downstream consumer expects.
    pub fn encode(tree: &GraphNode, resolver: &TypeResolver) -> Result<Vec<u8>, EncodeError> {
        let mut state = EncodeState {
            out: Vec::with_capacity(256),
            resolver,
            next_handle: 0,
            remap: HashMap::new(),
        };
        state.out.extend_from_slice(&STREAM_HEADER);
        state.write_value(tree)?;
        Ok(state.out)
    }
}

struct EncodeState<'a> {
    out: Vec<u8>,
    resolver: &'a TypeResolver,
    next_handle: u32,
    /// Old handle label (from decode or parse) to freshly assigned index.
    remap: HashMap<u32, u32>,
}

impl<'a> EncodeState<'a> {
    fn assign_handle(&mut self, label: Option<Handle>) {
        let fresh = self.next_handle;
        self.next_handle += 1;
        if let Some(label) = label {
            self.remap.insert(label.index(), fresh);
        }
    }

    fn write_type_name(&mut self, name: &str) -> Result<(), EncodeError> {
        let bytes = name.as_bytes();
        let len = u16::try_from(bytes.len()).map_err(|_| {
            EncodeError::UnsupportedVariant(format!("type name longer than 65535 bytes: '{name}'"))
        })?;
        put_u16(&mut self.out, len);
        self.out.extend_from_slice(bytes);
        Ok(())
    }

    fn write_value(&mut self, node: &GraphNode) -> Result<(), EncodeError> {
        match node {
            GraphNode::Null => {
                self.out.push(TAG_NULL);
                Ok(())
            }

            GraphNode::BackRef(label) => {
                let mapped = self.remap.get(&label.index()).copied().ok_or_else(|| {
                    EncodeError::UnsupportedVariant(format!(
                        "back-reference to label {label} which no earlier node defines"
                    ))
                })?;
                self.out.push(TAG_BACKREF);
                put_u32(&mut self.out, HANDLE_BASE + mapped);
                Ok(())
            }

            GraphNode::Primitive(value) => {
                self.write_primitive(value);
                Ok(())
            }

            GraphNode::Str(bytes) => {
                let len = u32::try_from(bytes.len()).map_err(|_| {
                    EncodeError::UnsupportedVariant("string longer than u32 range".to_string())
                })?;
                self.out.push(TAG_STRING);
                put_u32(&mut self.out, len);
                self.out.extend_from_slice(bytes);
                Ok(())
            }

            GraphNode::Array {
                element_type,
                handle,
                elements,
            } => {
                let count = u32::try_from(elements.len()).map_err(|_| {
                    EncodeError::UnsupportedVariant("array longer than u32 range".to_string())
                })?;
                self.out.push(TAG_ARRAY);
                self.write_type_name(element_type)?;
                put_u32(&mut self.out, count);
                self.assign_handle(*handle);
                for element in elements {
                    self.write_value(element)?;
                }
                Ok(())
            }

            GraphNode::Object {
                type_name,
                handle,
                fields,
            } => {
                let descriptor =
                    self.resolver
                        .resolve(type_name)
                        .map_err(|source| EncodeError::UnresolvedType {
                            name: type_name.clone(),
                            source,
                        })?;
                if fields.len() != descriptor.fields.len() {
                    return Err(EncodeError::UnsupportedVariant(format!(
                        "object '{type_name}' carries {} field(s), descriptor declares {}",
                        fields.len(),
                        descriptor.fields.len()
                    )));
                }
                self.out.push(TAG_OBJECT);
                self.write_type_name(type_name)?;
                self.assign_handle(*handle);
                // Positional emission: descriptor order, values matched by
                // field name from the node.
                for declared in &descriptor.fields {
                    let (_, value) = fields
                        .iter()
                        .find(|(name, _)| *name == declared.name)
                        .ok_or_else(|| {
                            EncodeError::UnsupportedVariant(format!(
                                "object '{type_name}' is missing field '{}'",
                                declared.name
                            ))
                        })?;
                    self.write_value(value)?;
                }
                Ok(())
            }
        }
    }

    fn write_primitive(&mut self, value: &PrimitiveValue) {
        self.out.push(value.kind().tag());
        match value {
            PrimitiveValue::Boolean(v) => self.out.push(u8::from(*v)),
            PrimitiveValue::Byte(v) => self.out.push(*v as u8),
            PrimitiveValue::Short(v) => self.out.extend_from_slice(&v.to_be_bytes()),
            PrimitiveValue::Char(v) => self.out.extend_from_slice(&v.to_be_bytes()),
            PrimitiveValue::Int(v) => self.out.extend_from_slice(&v.to_be_bytes()),
            PrimitiveValue::Long(v) => self.out.extend_from_slice(&v.to_be_bytes()),
            PrimitiveValue::Float(v) => self.out.extend_from_slice(&v.to_bits().to_be_bytes()),
            PrimitiveValue::Double(v) => self.out.extend_from_slice(&v.to_bits().to_be_bytes()),
        }
    }
}
