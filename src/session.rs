//! One edit session for one displayed message.
//!
//! The session is the boundary between the codec core and the host: it
//! runs the read pipeline (locate, split, decode, render) when a message
//! is shown and the write pipeline (parse, encode, recombine) when edited
//! text is committed. Both pipelines are synchronous and complete before
//! returning; a session owns its split and is never shared.
//!
//! Errors are never fatal here. Any decode failure turns into a
//! human-readable diagnostic (with the whole cause chain) shown in place
//! of the content, and any failure to re-encode edited text falls back to
//! the original body bytes, so a bad edit can never corrupt the outgoing
//! message.

use std::error::Error;
use std::fmt::Write as _;
use std::sync::Arc;

use tracing::debug;

use crate::decode::GraphDecoder;
use crate::encode::GraphEncoder;
use crate::resolver::TypeResolver;
use crate::splice::{MessageSplicer, PayloadSplit};
use crate::view::EditableView;

/// Result of loading a message into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The buffer carries no magic marker; this codec does not apply.
    NotEligible,

    /// The payload decoded; `text` is the editable rendering.
    Rendered {
        /// Structured text for the host's editor widget.
        text: String,
    },

    /// The payload failed to decode. The diagnostic replaces the content
    /// and the view should stay read-only until a valid message loads.
    Failed {
        /// Human-readable failure description with its cause chain.
        diagnostic: String,
    },
}

/// Result of rebuilding the message body from edited text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// Edited text re-encoded cleanly; `body` is prefix plus new payload,
    /// ready for the transport layer to reattach headers to.
    Reassembled {
        /// The new message body.
        body: Vec<u8>,
    },

    /// The edit could not be re-encoded. `body` is the original body,
    /// byte for byte, so the outgoing message stays intact.
    Fallback {
        /// The unchanged original body bytes.
        body: Vec<u8>,
        /// Why the edit was rejected.
        diagnostic: String,
    },
}

struct LoadedMessage {
    split: PayloadSplit,
    /// `buffer[body_start..]` verbatim, kept for the fallback path.
    original_body: Vec<u8>,
}

/// Decode-edit-encode pipeline for a single displayed message.
pub struct EditSession {
    resolver: Arc<TypeResolver>,
    view: Box<dyn EditableView>,
    loaded: Option<LoadedMessage>,
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("view", &self.view)
            .field("loaded", &self.loaded.is_some())
            .finish()
    }
}

impl EditSession {
    /// Creates a session over a shared resolver and a view implementation.
    pub fn new(resolver: Arc<TypeResolver>, view: Box<dyn EditableView>) -> Self {
        Self {
            resolver,
            view,
            loaded: None,
        }
    }

    /// Fast check whether a message can be displayed by this codec at
    /// all. Runs on every message the host shows, so it is nothing more
    /// than the marker scan.
    pub fn is_eligible(content: &[u8]) -> bool {
        MessageSplicer::locate(content).is_some()
    }

    /// Loads a message, replacing whatever was loaded before.
    ///
    /// `body_start` is the header/body boundary supplied by the transport
    /// layer; header bytes are never touched here.
    pub fn load(&mut self, content: &[u8], body_start: usize) -> LoadOutcome {
        self.loaded = None;

        let Some(magic_offset) = MessageSplicer::locate_from(content, body_start) else {
            return LoadOutcome::NotEligible;
        };
        let split = MessageSplicer::split(content, body_start, magic_offset);
        let original_body = content[body_start.min(content.len())..].to_vec();

        match GraphDecoder::decode(&split.payload, &self.resolver) {
            Ok(tree) => {
                debug!(payload = split.payload.len(), "message decoded");
                let text = self.view.render(&tree);
                self.loaded = Some(LoadedMessage {
                    split,
                    original_body,
                });
                LoadOutcome::Rendered { text }
            }
            Err(error) => {
                debug!(%error, "message failed to decode");
                LoadOutcome::Failed {
                    diagnostic: diagnostic_chain(
                        "Failed to decode the serialized payload",
                        &error,
                    ),
                }
            }
        }
    }

    /// Rebuilds the message body from edited text.
    ///
    /// On success the body is the preserved prefix followed by the newly
    /// encoded payload. On any parse or encode failure the original body
    /// is returned unchanged as the safe fallback.
    pub fn rebuild_body(&self, edited_text: &str) -> RebuildOutcome {
        let Some(loaded) = &self.loaded else {
            return RebuildOutcome::Fallback {
                body: Vec::new(),
                diagnostic: "no decodable message is loaded".to_string(),
            };
        };

        let tree = match self.view.parse(edited_text) {
            Ok(tree) => tree,
            Err(error) => {
                return RebuildOutcome::Fallback {
                    body: loaded.original_body.clone(),
                    diagnostic: diagnostic_chain("Edited text does not parse", &error),
                };
            }
        };

        match GraphEncoder::encode(&tree, &self.resolver) {
            Ok(payload) => RebuildOutcome::Reassembled {
                body: MessageSplicer::recombine(&loaded.split.prefix, &payload),
            },
            Err(error) => RebuildOutcome::Fallback {
                body: loaded.original_body.clone(),
                diagnostic: diagnostic_chain("Edited tree cannot be re-encoded", &error),
            },
        }
    }
}

/// Formats an error and its full `source()` chain into the diagnostic
/// text shown to the user in place of the decoded content.
pub fn diagnostic_chain(context: &str, error: &dyn Error) -> String {
    let mut text = format!("{context}: {error}");
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(text, "\ncaused by: {cause}");
        source = cause.source();
    }
    text
}
