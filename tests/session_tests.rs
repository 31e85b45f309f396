//! End-to-end session behavior over a realistic message buffer, plus the
//! splice-level properties the session relies on.

use serview::wire::{STREAM_HEADER, TAG_NULL, TAG_OBJECT, TAG_STRING};
use serview::{
    structurally_equal, EditSession, EditableView, GraphDecoder, LoadOutcome, MessageSplicer,
    RebuildOutcome, ResolverConfig, TextView, TypeResolver,
};
use std::sync::Arc;
use tempfile::TempDir;

// --- FIXTURES ---

const DEMO_ARCHIVE: &str = r#"{
  "types": [
    {
      "name": "com.demo.User",
      "fields": [
        { "name": "login", "type": "java.lang.String" },
        { "name": "age", "type": "int", "primitive": true },
        { "name": "friend", "type": "com.demo.User" }
      ]
    }
  ]
}"#;

fn demo_resolver() -> (Arc<TypeResolver>, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("demo.types.json"), DEMO_ARCHIVE).expect("write archive");
    let resolver = Arc::new(TypeResolver::new(ResolverConfig {
        search_paths: vec![dir.path().to_path_buf()],
    }));
    (resolver, dir)
}

fn user_payload() -> Vec<u8> {
    let mut p = STREAM_HEADER.to_vec();
    p.push(TAG_OBJECT);
    let name = b"com.demo.User";
    p.extend_from_slice(&(name.len() as u16).to_be_bytes());
    p.extend_from_slice(name);
    p.push(TAG_STRING);
    p.extend_from_slice(&3u32.to_be_bytes());
    p.extend_from_slice(b"bob");
    p.push(b'I');
    p.extend_from_slice(&42i32.to_be_bytes());
    p.push(TAG_NULL);
    p
}

const HEADERS: &[u8] = b"POST /api HTTP/1.1\r\nHost: demo.example\r\n\r\n";
const BODY_PREFIX: &[u8] = b"frame-junk:";

/// Headers, opaque body prefix, then the payload.
fn message() -> (Vec<u8>, usize) {
    let mut content = HEADERS.to_vec();
    content.extend_from_slice(BODY_PREFIX);
    content.extend_from_slice(&user_payload());
    (content, HEADERS.len())
}

fn session(resolver: &Arc<TypeResolver>) -> EditSession {
    EditSession::new(resolver.clone(), Box::new(TextView))
}

// --- SPLICE PROPERTIES ---

#[test]
fn locate_finds_first_occurrence_only() {
    let mut buffer = b"xx".to_vec();
    buffer.extend_from_slice(&[0xAC, 0xED]);
    buffer.extend_from_slice(b"middle");
    buffer.extend_from_slice(&[0xAC, 0xED]);

    assert_eq!(MessageSplicer::locate(&buffer), Some(2));
}

#[test]
fn locate_misses_cleanly() {
    assert_eq!(MessageSplicer::locate(b"plain old body"), None);
    assert_eq!(MessageSplicer::locate(&[]), None);
    assert_eq!(MessageSplicer::locate(&[0xAC]), None);
}

#[test]
fn split_and_recombine_are_inverse() {
    let (content, body_start) = message();
    let magic = MessageSplicer::locate_from(&content, body_start).expect("marker");
    let split = MessageSplicer::split(&content, body_start, magic);

    assert_eq!(
        MessageSplicer::recombine(&split.prefix, &split.payload),
        content[body_start..].to_vec()
    );
    assert_eq!(split.prefix, BODY_PREFIX.to_vec());
}

// --- SESSION: READ PATH ---

#[test]
fn eligibility_is_marker_presence() {
    let (content, _) = message();
    assert!(EditSession::is_eligible(&content));
    assert!(!EditSession::is_eligible(b"GET / HTTP/1.1\r\n\r\nhello"));
}

#[test]
fn load_renders_editable_text() {
    let (resolver, _dir) = demo_resolver();
    let (content, body_start) = message();
    let mut session = session(&resolver);

    match session.load(&content, body_start) {
        LoadOutcome::Rendered { text } => {
            assert!(text.contains("object com.demo.User"));
            assert!(text.contains("login: string \"bob\""));
            assert!(text.contains("age: int 42"));
        }
        other => panic!("expected Rendered, got {other:?}"),
    }
}

#[test]
fn load_without_marker_is_not_eligible() {
    let (resolver, _dir) = demo_resolver();
    let mut session = session(&resolver);
    assert_eq!(
        session.load(b"POST / HTTP/1.1\r\n\r\nplain", 19),
        LoadOutcome::NotEligible
    );
}

#[test]
fn undecodable_payload_reports_diagnostic() {
    let (resolver, _dir) = demo_resolver();
    let mut session = session(&resolver);

    // Marker present but the version byte is wrong.
    let mut content = HEADERS.to_vec();
    content.extend_from_slice(&[0xAC, 0xED, 0x00, 0x99]);

    match session.load(&content, HEADERS.len()) {
        LoadOutcome::Failed { diagnostic } => {
            assert!(diagnostic.contains("header"), "got: {diagnostic}");
        }
        other => panic!("expected Failed, got {other:?}"),
    }

    // Nothing is loaded, so there is nothing to rebuild.
    match session.rebuild_body("null") {
        RebuildOutcome::Fallback { body, .. } => assert!(body.is_empty()),
        other => panic!("expected Fallback, got {other:?}"),
    }
}

#[test]
fn unresolved_type_diagnostic_includes_cause_chain() {
    let (resolver, _dir) = demo_resolver();
    let mut session = session(&resolver);

    let mut content = HEADERS.to_vec();
    content.extend_from_slice(&STREAM_HEADER);
    content.push(TAG_OBJECT);
    let name = b"com.demo.Ghost";
    content.extend_from_slice(&(name.len() as u16).to_be_bytes());
    content.extend_from_slice(name);

    match session.load(&content, HEADERS.len()) {
        LoadOutcome::Failed { diagnostic } => {
            assert!(diagnostic.contains("com.demo.Ghost"), "got: {diagnostic}");
            assert!(diagnostic.contains("caused by:"), "got: {diagnostic}");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

// --- SESSION: WRITE PATH ---

#[test]
fn unedited_text_rebuilds_identical_body() {
    let (resolver, _dir) = demo_resolver();
    let (content, body_start) = message();
    let mut session = session(&resolver);

    let text = match session.load(&content, body_start) {
        LoadOutcome::Rendered { text } => text,
        other => panic!("expected Rendered, got {other:?}"),
    };

    match session.rebuild_body(&text) {
        RebuildOutcome::Reassembled { body } => {
            assert_eq!(body, content[body_start..].to_vec());
        }
        other => panic!("expected Reassembled, got {other:?}"),
    }
}

#[test]
fn edited_value_lands_in_rebuilt_payload() {
    let (resolver, _dir) = demo_resolver();
    let (content, body_start) = message();
    let mut session = session(&resolver);

    let text = match session.load(&content, body_start) {
        LoadOutcome::Rendered { text } => text,
        other => panic!("expected Rendered, got {other:?}"),
    };
    let edited = text.replace("age: int 42", "age: int 7");

    let body = match session.rebuild_body(&edited) {
        RebuildOutcome::Reassembled { body } => body,
        other => panic!("expected Reassembled, got {other:?}"),
    };

    // Prefix bytes are replayed verbatim, payload re-decodes with the edit.
    assert_eq!(&body[..BODY_PREFIX.len()], BODY_PREFIX);
    let tree = GraphDecoder::decode(&body[BODY_PREFIX.len()..], &resolver).expect("decode edited");
    let rendered = TextView.render(&tree);
    assert!(rendered.contains("age: int 7"));
}

#[test]
fn unknown_type_edit_falls_back_to_original_bytes() {
    let (resolver, _dir) = demo_resolver();
    let (content, body_start) = message();
    let mut session = session(&resolver);

    let text = match session.load(&content, body_start) {
        LoadOutcome::Rendered { text } => text,
        other => panic!("expected Rendered, got {other:?}"),
    };
    let edited = text.replace("com.demo.User", "com.demo.Unknown");

    match session.rebuild_body(&edited) {
        RebuildOutcome::Fallback { body, diagnostic } => {
            assert_eq!(body, content[body_start..].to_vec());
            assert!(diagnostic.contains("com.demo.Unknown"), "got: {diagnostic}");
        }
        other => panic!("expected Fallback, got {other:?}"),
    }
}

#[test]
fn malformed_edit_falls_back_with_line_diagnostic() {
    let (resolver, _dir) = demo_resolver();
    let (content, body_start) = message();
    let mut session = session(&resolver);

    match session.load(&content, body_start) {
        LoadOutcome::Rendered { .. } => {}
        other => panic!("expected Rendered, got {other:?}"),
    }

    match session.rebuild_body("this is not a tree") {
        RebuildOutcome::Fallback { body, diagnostic } => {
            assert_eq!(body, content[body_start..].to_vec());
            assert!(diagnostic.contains("line 1"), "got: {diagnostic}");
        }
        other => panic!("expected Fallback, got {other:?}"),
    }
}

#[test]
fn structural_roundtrip_through_the_whole_session() {
    let (resolver, _dir) = demo_resolver();
    let (content, body_start) = message();
    let mut session = session(&resolver);

    let text = match session.load(&content, body_start) {
        LoadOutcome::Rendered { text } => text,
        other => panic!("expected Rendered, got {other:?}"),
    };
    let body = match session.rebuild_body(&text) {
        RebuildOutcome::Reassembled { body } => body,
        other => panic!("expected Reassembled, got {other:?}"),
    };

    let original = GraphDecoder::decode(&user_payload(), &resolver).expect("decode original");
    let rebuilt =
        GraphDecoder::decode(&body[BODY_PREFIX.len()..], &resolver).expect("decode rebuilt");
    assert!(structurally_equal(&original, &rebuilt));
}
