//! The decode side of the codec: binary payload to [`GraphNode`] tree.
//!
//! The payload is consumed in a single forward pass. Every read goes
//! through a bounds-checked cursor, so a truncated or hostile payload can
//! only ever produce [`DecodeError::Truncated`], never a panic or an
//! out-of-bounds read. Handles are assigned to objects and arrays before
//! their contents are read, which is what lets a node reference itself.

use tracing::debug;

use crate::error::DecodeError;
use crate::graph::{GraphNode, Handle, PrimitiveValue};
use crate::resolver::TypeResolver;
use crate::wire::{
    PrimitiveKind, HANDLE_BASE, STREAM_HEADER, TAG_ARRAY, TAG_BACKREF, TAG_NULL, TAG_OBJECT,
    TAG_STRING,
};

/// Upper bound on speculative pre-allocation from untrusted counts.
const MAX_PREALLOC: usize = 1024;

/// A forward-only cursor over the payload. All reads are fallible.
#[derive(Debug)]
struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::Truncated {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let bytes = self.read_bytes(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(raw))
    }
}

/// Parses binary payloads into trees.
#[derive(Debug)]
pub struct GraphDecoder;

impl GraphDecoder {
    /// Decodes one payload into its root node.
    ///
    /// Types referenced by the stream are resolved through `resolver`;
    /// the positional field layout of every object comes from there.
    /// Trailing bytes after the root value are ignored, matching the
    /// one-object-per-payload shape this codec splices.
    pub fn decode(
        payload: &[u8],
        resolver: &TypeResolver,
    ) -> Result<GraphNode, DecodeError> {
        let mut state = DecodeState {
            cursor: ByteReader::new(payload),
            resolver,
            assigned: 0,
        };

        let header = state
            .cursor
            .read_bytes(STREAM_HEADER.len())
            .map_err(|_| DecodeError::BadHeader)?;
        if header != &STREAM_HEADER[..] {
            return Err(DecodeError::BadHeader);
        }

        let root = state.read_value()?;
        if state.cursor.remaining() > 0 {
            debug!(
                trailing = state.cursor.remaining(),
                "payload carries bytes after the root value, ignored"
            );
        }
        Ok(root)
    }
}

struct DecodeState<'a> {
    cursor: ByteReader<'a>,
    resolver: &'a TypeResolver,
    assigned: u32,
}

impl<'a> DecodeState<'a> {
    /// Assigns the next handle. Called the moment an object or array's
    /// shape is known, before recursing into its contents.
    fn assign_handle(&mut self) -> Handle {
        let handle = Handle::new(self.assigned);
        self.assigned += 1;
        handle
    }

    fn read_type_name(&mut self) -> Result<String, DecodeError> {
        let len = self.cursor.read_u16()? as usize;
        let bytes = self.cursor.read_bytes(len)?;
        // A mangled name can never match an archive-defined type, so it
        // surfaces later as an UnresolvedType for the lossy rendering.
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn read_value(&mut self) -> Result<GraphNode, DecodeError> {
        let tag = self.cursor.read_u8()?;
        match tag {
            TAG_NULL => Ok(GraphNode::Null),

            TAG_BACKREF => {
                let wire_handle = self.cursor.read_u32()?;
                let index = wire_handle
                    .checked_sub(HANDLE_BASE)
                    .filter(|index| *index < self.assigned)
                    .ok_or(DecodeError::DanglingReference(wire_handle))?;
                Ok(GraphNode::BackRef(Handle::new(index)))
            }

            TAG_STRING => {
                let len = self.cursor.read_u32()? as usize;
                let bytes = self.cursor.read_bytes(len)?;
                Ok(GraphNode::Str(bytes.to_vec()))
            }

            TAG_ARRAY => {
                let element_type = self.read_type_name()?;
                let count = self.cursor.read_u32()? as usize;
                let handle = self.assign_handle();
                let mut elements = Vec::with_capacity(count.min(MAX_PREALLOC));
                for _ in 0..count {
                    elements.push(self.read_value()?);
                }
                Ok(GraphNode::Array {
                    element_type,
                    handle: Some(handle),
                    elements,
                })
            }

            TAG_OBJECT => {
                let type_name = self.read_type_name()?;
                let descriptor = self.resolver.resolve(&type_name).map_err(|source| {
                    DecodeError::UnresolvedType {
                        name: type_name.clone(),
                        source,
                    }
                })?;
                let handle = self.assign_handle();
                let mut fields = Vec::with_capacity(descriptor.fields.len().min(MAX_PREALLOC));
                for field in &descriptor.fields {
                    let value = self.read_value()?;
                    fields.push((field.name.clone(), value));
                }
                Ok(GraphNode::Object {
                    type_name,
                    handle: Some(handle),
                    fields,
                })
            }

            other => match PrimitiveKind::from_tag(other) {
                Some(kind) => Ok(GraphNode::Primitive(self.read_primitive(kind)?)),
                None => Err(DecodeError::UnknownTag(other)),
            },
        }
    }

    fn read_primitive(&mut self, kind: PrimitiveKind) -> Result<PrimitiveValue, DecodeError> {
        Ok(match kind {
            PrimitiveKind::Boolean => PrimitiveValue::Boolean(self.cursor.read_u8()? != 0),
            PrimitiveKind::Byte => PrimitiveValue::Byte(self.cursor.read_u8()? as i8),
            PrimitiveKind::Short => PrimitiveValue::Short(self.cursor.read_u16()? as i16),
            PrimitiveKind::Char => PrimitiveValue::Char(self.cursor.read_u16()?),
            PrimitiveKind::Int => PrimitiveValue::Int(self.cursor.read_u32()? as i32),
            PrimitiveKind::Long => PrimitiveValue::Long(self.cursor.read_u64()? as i64),
            PrimitiveKind::Float => PrimitiveValue::Float(f32::from_bits(self.cursor.read_u32()?)),
            PrimitiveKind::Double => {
                PrimitiveValue::Double(f64::from_bits(self.cursor.read_u64()?))
            }
        })
    }
}
