//! Owned request/reply envelope.
//!
//! An `Envelope` is the unit the REQ socket stores, sends and accepts:
//! `[EnvelopeHeader: 4 bytes] + [payload: opaque bytes]`.
//!
//! The whole wire image lives in one [`Bytes`] buffer. Retransmission hands
//! the same buffer to the transport again, so resent frames are
//! byte-identical by construction, and dropping the envelope releases it.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{EnvelopeHeader, RequestId, errors::Result};

/// A validated envelope (header + payload) backed by a single buffer.
///
/// # Invariants
///
/// - `wire.len() >= EnvelopeHeader::SIZE`
/// - `wire[..4]` is the big-endian encoding of `header`, marker bit set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    header: EnvelopeHeader,
    wire: Bytes,
}

impl Envelope {
    /// Tag `payload` with `id`, copying it into a freshly allocated buffer.
    #[must_use]
    pub fn new(id: RequestId, payload: &[u8]) -> Self {
        let header = EnvelopeHeader::new(id);

        let mut wire = BytesMut::with_capacity(EnvelopeHeader::SIZE + payload.len());
        wire.put_slice(&header.to_bytes());
        wire.put_slice(payload);

        Self { header, wire: wire.freeze() }
    }

    /// Validate a received frame and take ownership of it.
    ///
    /// # Errors
    ///
    /// Propagates [`EnvelopeHeader::from_bytes`] errors: short frames and
    /// frames without the marker bit.
    pub fn decode(frame: Bytes) -> Result<Self> {
        let header = *EnvelopeHeader::from_bytes(&frame)?;
        Ok(Self { header, wire: frame })
    }

    /// Envelope header
    #[must_use]
    pub fn header(&self) -> &EnvelopeHeader {
        &self.header
    }

    /// Correlation id carried by the header
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.header.request_id()
    }

    /// Payload bytes following the header
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.wire[EnvelopeHeader::SIZE..]
    }

    /// Payload as a shared buffer (no copy)
    #[must_use]
    pub fn into_payload(self) -> Bytes {
        self.wire.slice(EnvelopeHeader::SIZE..)
    }

    /// Full wire image, header included
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.wire
    }

    /// Length of the full wire image
    #[must_use]
    pub fn len(&self) -> usize {
        self.wire.len()
    }

    /// Always false: an envelope carries at least its header
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::ProtocolError;

    #[test]
    fn encode_layout() {
        let envelope = Envelope::new(RequestId::new(0x1234_5679), b"A");
        assert_eq!(envelope.as_bytes(), &[0x92, 0x34, 0x56, 0x79, b'A']);
        assert_eq!(envelope.payload(), b"A");
        assert_eq!(envelope.len(), 5);
    }

    #[test]
    fn empty_payload() {
        let envelope = Envelope::new(RequestId::new(1), b"");
        assert_eq!(envelope.len(), EnvelopeHeader::SIZE);
        assert!(envelope.payload().is_empty());
    }

    #[test]
    fn decode_keeps_payload() {
        let frame = Bytes::from_static(&[0x92, 0x34, 0x56, 0x79, b'B']);
        let envelope = Envelope::decode(frame).expect("valid reply");
        assert_eq!(envelope.request_id().get(), 0x1234_5679);
        assert_eq!(envelope.into_payload(), Bytes::from_static(b"B"));
    }

    #[test]
    fn decode_rejects_header_only_prefix() {
        let result = Envelope::decode(Bytes::from_static(&[0x92]));
        assert!(matches!(result, Err(ProtocolError::EnvelopeTooShort { actual: 1, .. })));
    }
}
