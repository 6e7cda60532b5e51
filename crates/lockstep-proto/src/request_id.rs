//! 31-bit correlation identifiers.

use std::fmt;

/// Correlation id carried in bits 0–30 of the envelope header.
///
/// The top bit of the header is reserved for the marker, so a `RequestId`
/// can never hold a value above [`RequestId::MAX`]. Every constructor masks
/// its input instead of rejecting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u32);

impl RequestId {
    /// Mask selecting the id bits of a header
    pub const MASK: u32 = 0x7FFF_FFFF;

    /// Largest representable id
    pub const MAX: Self = Self(Self::MASK);

    /// Build an id from any `u32`, discarding the top bit.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw & Self::MASK)
    }

    /// Raw 31-bit value
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The id following this one, wrapping from [`RequestId::MAX`] to zero.
    #[must_use]
    pub const fn next(self) -> Self {
        Self::new(self.0.wrapping_add(1))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl From<RequestId> for u32 {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_masks_top_bit() {
        assert_eq!(RequestId::new(0xFFFF_FFFF), RequestId::MAX);
        assert_eq!(RequestId::new(0x9234_5678).get(), 0x1234_5678);
    }

    #[test]
    fn next_wraps_to_zero() {
        assert_eq!(RequestId::MAX.next(), RequestId::new(0));
        assert_eq!(RequestId::new(0x1234_5678).next().get(), 0x1234_5679);
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(RequestId::new(0x1234_5679).to_string(), "0x12345679");
    }
}
