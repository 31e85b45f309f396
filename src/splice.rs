//! Locating and splicing the payload within a larger message buffer.
//!
//! A message is eligible for decoding iff the 2-byte magic marker occurs
//! somewhere in its buffer. Everything between the body start and the
//! marker is opaque "prefix" bytes: never interpreted, only stored and
//! replayed verbatim when the edited payload is spliced back in. Header
//! bytes before the body start are owned by the transport layer and never
//! pass through this module.
//!
//! These operations are purely mechanical and cannot fail; absence of the
//! marker is a normal "not eligible" outcome, not an error.

use crate::wire::MAGIC_MARKER;

/// The body split of one eligible message: opaque prefix bytes followed by
/// the binary payload starting at the magic marker.
///
/// Invariant: `prefix ++ payload` equals the original buffer from the body
/// start to the end. A split lives exactly as long as one edit session for
/// one displayed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadSplit {
    /// Bytes between the body start and the marker, preserved verbatim.
    pub prefix: Vec<u8>,
    /// The payload, from the marker to the end of the buffer.
    pub payload: Vec<u8>,
}

/// Splits message buffers around the magic marker and recombines them.
#[derive(Debug)]
pub struct MessageSplicer;

impl MessageSplicer {
    /// Returns the index of the first occurrence of the magic marker, or
    /// `None` when the buffer carries no payload.
    ///
    /// This runs on every message the host shows, so it stays a plain
    /// allocation-free forward scan.
    pub fn locate(buffer: &[u8]) -> Option<usize> {
        Self::locate_from(buffer, 0)
    }

    /// Like [`MessageSplicer::locate`], scanning forward from `start`
    /// (typically the body-start offset supplied by the transport layer).
    pub fn locate_from(buffer: &[u8], start: usize) -> Option<usize> {
        if start >= buffer.len() {
            return None;
        }
        buffer[start..]
            .windows(MAGIC_MARKER.len())
            .position(|window| window == MAGIC_MARKER)
            .map(|pos| pos + start)
    }

    /// Splits `buffer[body_start..]` into prefix and payload at
    /// `magic_offset`. Content is copied, not validated; offsets are
    /// clamped into the buffer so a stale offset cannot slice out of
    /// bounds.
    pub fn split(buffer: &[u8], body_start: usize, magic_offset: usize) -> PayloadSplit {
        let body_start = body_start.min(buffer.len());
        let magic_offset = magic_offset.clamp(body_start, buffer.len());
        PayloadSplit {
            prefix: buffer[body_start..magic_offset].to_vec(),
            payload: buffer[magic_offset..].to_vec(),
        }
    }

    /// Byte-exact concatenation of a prefix with a freshly encoded
    /// payload. The result is the new message body, to be combined with
    /// the untouched header bytes by the transport layer.
    pub fn recombine(prefix: &[u8], new_payload: &[u8]) -> Vec<u8> {
        let mut body = Vec::with_capacity(prefix.len() + new_payload.len());
        body.extend_from_slice(prefix);
        body.extend_from_slice(new_payload);
        body
    }
}
