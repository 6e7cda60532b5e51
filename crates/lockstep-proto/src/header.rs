//! Envelope header with zero-copy parsing.
//!
//! The header is a single big-endian `u32`:
//!
//! ```text
//!  31 30                                                     0
//! ┌──┬────────────────────────────────────────────────────────┐
//! │ M│                 correlation id (31 bits)               │
//! └──┴────────────────────────────────────────────────────────┘
//! ```
//!
//! `M` is the marker bit. It is always set on frames this protocol produces
//! and a frame without it is never accepted as a reply.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    RequestId,
    errors::{ProtocolError, Result},
};

/// Fixed 4-byte envelope header (Big Endian network byte order)
///
/// Stored as a raw byte array so that any 4 bytes of network input can be
/// viewed as a header without copying. Validation of the marker bit happens
/// in [`EnvelopeHeader::from_bytes`], not in the layout.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct EnvelopeHeader {
    tag: [u8; 4],
}

impl EnvelopeHeader {
    /// Size of the serialized header (4 bytes)
    pub const SIZE: usize = 4;

    /// Marker bit flagging frames of the tagged request/reply protocol
    pub const MARKER: u32 = 0x8000_0000;

    /// Create a marked header carrying `id`.
    #[must_use]
    pub fn new(id: RequestId) -> Self {
        Self { tag: (id.get() | Self::MARKER).to_be_bytes() }
    }

    /// Parse a header from the front of `bytes` (zero-copy).
    ///
    /// Trailing bytes are ignored; they are the payload.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::EnvelopeTooShort`] if fewer than 4 bytes are given
    /// - [`ProtocolError::MissingMarker`] if the top bit is clear
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        let (header, _payload) = Self::ref_from_prefix(bytes).map_err(|_| {
            ProtocolError::EnvelopeTooShort { expected: Self::SIZE, actual: bytes.len() }
        })?;

        if header.raw() & Self::MARKER == 0 {
            return Err(ProtocolError::MissingMarker { header: header.raw() });
        }

        Ok(header)
    }

    /// Serialize header to bytes
    #[must_use]
    #[allow(clippy::wrong_self_convention)]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(IntoBytes::as_bytes(self));
        arr
    }

    /// Raw header value, marker included
    #[must_use]
    pub fn raw(&self) -> u32 {
        u32::from_be_bytes(self.tag)
    }

    /// Correlation id with the marker stripped
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        RequestId::new(self.raw())
    }
}

impl std::fmt::Debug for EnvelopeHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeHeader")
            .field("marker", &(self.raw() & Self::MARKER != 0))
            .field("request_id", &self.request_id().to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn header_size() {
        assert_eq!(std::mem::size_of::<EnvelopeHeader>(), EnvelopeHeader::SIZE);
    }

    #[test]
    fn new_sets_marker() {
        let header = EnvelopeHeader::new(RequestId::new(0x1234_5679));
        assert_eq!(header.to_bytes(), [0x92, 0x34, 0x56, 0x79]);
        assert_eq!(header.request_id().get(), 0x1234_5679);
    }

    #[test]
    fn reject_short_buffer() {
        let result = EnvelopeHeader::from_bytes(&[0x80, 0x00, 0x01]);
        assert_eq!(result, Err(ProtocolError::EnvelopeTooShort { expected: 4, actual: 3 }));
    }

    #[test]
    fn reject_unmarked_header() {
        let result = EnvelopeHeader::from_bytes(&[0x12, 0x34, 0x56, 0x79, b'B']);
        assert_eq!(result, Err(ProtocolError::MissingMarker { header: 0x1234_5679 }));
    }

    #[test]
    fn payload_bytes_are_ignored() {
        let header = EnvelopeHeader::from_bytes(&[0x80, 0x00, 0x00, 0x07, 1, 2, 3])
            .expect("marked header should parse");
        assert_eq!(header.request_id().get(), 7);
    }

    proptest! {
        #[test]
        fn marked_header_round_trip(raw in any::<u32>()) {
            let header = EnvelopeHeader::new(RequestId::new(raw));
            let bytes = header.to_bytes();
            let parsed = EnvelopeHeader::from_bytes(&bytes).expect("should parse");
            prop_assert_eq!(parsed, &header);
            prop_assert_eq!(parsed.request_id().get(), raw & RequestId::MASK);
        }

        #[test]
        fn parse_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..16)) {
            let _ = EnvelopeHeader::from_bytes(&bytes);
        }
    }
}
