//! Arbitrary-input fuzzer for envelope decoding
//!
//! Any byte string either decodes or is rejected with a protocol error;
//! decoding never panics. Accepted envelopes must re-encode to the exact
//! input bytes and carry the marker bit.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use lockstep_proto::{Envelope, EnvelopeHeader, ProtocolError};

fuzz_target!(|data: &[u8]| {
    match Envelope::decode(Bytes::copy_from_slice(data)) {
        Ok(envelope) => {
            // INVARIANT 1: Decoded frames carry the marker
            assert_ne!(envelope.header().raw() & EnvelopeHeader::MARKER, 0);

            // INVARIANT 2: Re-encoding is the identity
            let rebuilt = Envelope::new(envelope.request_id(), envelope.payload());
            assert_eq!(rebuilt.as_bytes(), data);
            assert_eq!(envelope.payload().len(), data.len() - EnvelopeHeader::SIZE);
        },
        Err(ProtocolError::EnvelopeTooShort { actual, .. }) => {
            assert!(actual < EnvelopeHeader::SIZE);
        },
        Err(ProtocolError::MissingMarker { header }) => {
            assert_eq!(header & EnvelopeHeader::MARKER, 0);
            assert_eq!(&header.to_be_bytes()[..], &data[..EnvelopeHeader::SIZE]);
        },
    }
});
