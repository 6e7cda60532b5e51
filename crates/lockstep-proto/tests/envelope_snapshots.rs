//! Snapshot tests for wire format stability.
//!
//! Envelopes are rendered as hex and compared against inline snapshots. If
//! the header layout ever changes, these fail before a peer notices.

use bytes::Bytes;
use insta::assert_snapshot;
use lockstep_proto::{Envelope, RequestId};

fn envelope_to_hex(envelope: &Envelope) -> String {
    hex::encode(envelope.as_bytes())
}

#[test]
fn snapshot_single_byte_request() {
    let envelope = Envelope::new(RequestId::new(0x1234_5679), b"A");
    assert_snapshot!(envelope_to_hex(&envelope), @"9234567941");
}

#[test]
fn snapshot_empty_request() {
    let envelope = Envelope::new(RequestId::new(0), b"");
    assert_snapshot!(envelope_to_hex(&envelope), @"80000000");
}

#[test]
fn snapshot_max_request_id() {
    let envelope = Envelope::new(RequestId::MAX, b"ping");
    assert_snapshot!(envelope_to_hex(&envelope), @"ffffffff70696e67");
}

#[test]
fn snapshot_masked_seed() {
    // Top bit of the raw value never leaks into the id space
    let envelope = Envelope::new(RequestId::new(0xFFFF_FFFE), b"");
    assert_snapshot!(envelope_to_hex(&envelope), @"fffffffe");
}

#[test]
fn decoded_reply_matches_encoded_request() {
    let request = Envelope::new(RequestId::new(42), b"hello");
    let reply = Envelope::decode(Bytes::copy_from_slice(request.as_bytes()))
        .expect("encoded envelope must decode");

    assert_eq!(reply, request);
    assert_eq!(reply.payload(), b"hello");
}
