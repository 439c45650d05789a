//! Defines the physical byte layout of a Shapecode frame.
//!
//! # Frame Layout
//! ```text
//! [ Int32 total length ] [ root node ]
//! ```
//! The total length covers the whole frame, header included, and is patched after the
//! traversal finishes.
//!
//! ## Node Anatomy
//! Every presence-bearing node (nullable wrappers, text, arrays, collections and
//! composites) is laid out as:
//! ```text
//! [ PresenceTag (1) ] [ Fingerprint (16) ] [ payload... ]
//! ```
//! The fingerprint slot is always reserved, even when the tag says the value is absent;
//! in that case it is zero-filled and the payload is empty. Fixed-layout nodes carry
//! only their raw little-endian bytes.

use crate::error::{Result, ShapecodeError};

/// Width in bytes of a type fingerprint.
pub const FINGERPRINT_WIDTH: usize = 16;

/// Size of the root length header.
pub const HEADER_SIZE: usize = 4;

/// Presence tag for an absent (null) node.
pub const PRESENCE_ABSENT: u8 = 0x0;

/// Presence tag for a present node.
pub const PRESENCE_PRESENT: u8 = 0x1;

/// Bytes every presence-bearing node spends before its payload.
pub const NODE_OVERHEAD: usize = 1 + FINGERPRINT_WIDTH;

/// Size of one `Int32` length, count or dimension field.
pub const LEN_SIZE: usize = 4;

/// The single byte preceding every presence-bearing node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceTag {
    /// The node is null; only the zeroed fingerprint slot follows.
    Absent,
    /// The node is present; fingerprint and payload follow.
    Present,
}

impl PresenceTag {
    /// Decodes the tag, rejecting anything other than `0x0` and `0x1`.
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            PRESENCE_ABSENT => Ok(Self::Absent),
            PRESENCE_PRESENT => Ok(Self::Present),
            other => Err(ShapecodeError::Format(format!(
                "Invalid presence tag 0x{other:02x}"
            ))),
        }
    }

    /// Returns the raw byte representation.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Absent => PRESENCE_ABSENT,
            Self::Present => PRESENCE_PRESENT,
        }
    }
}

/// Converts an in-memory length into its `Int32` wire form.
pub fn len_to_wire(len: usize, what: &str) -> Result<i32> {
    i32::try_from(len)
        .map_err(|_| ShapecodeError::Format(format!("{what} {len} exceeds Int32 range")))
}

/// Converts an `Int32` read from the wire into a length, rejecting negatives.
pub fn len_from_wire(raw: i32, what: &str) -> Result<usize> {
    usize::try_from(raw).map_err(|_| ShapecodeError::Format(format!("Negative {what}: {raw}")))
}

/// Reads the root length header from the start of a frame without advancing anything.
///
/// Useful for callers that pack frames back-to-back and want to skip one unread.
pub fn peek_frame_len(buffer: &[u8]) -> Result<usize> {
    let bytes: [u8; HEADER_SIZE] = buffer
        .get(..HEADER_SIZE)
        .and_then(|b| b.try_into().ok())
        .ok_or(ShapecodeError::Bounds {
            offset: 0,
            needed: HEADER_SIZE,
            available: buffer.len(),
        })?;
    let total = len_from_wire(i32::from_le_bytes(bytes), "frame length")?;
    if total < HEADER_SIZE {
        return Err(ShapecodeError::Format(format!(
            "Frame length {total} is smaller than its own header"
        )));
    }
    Ok(total)
}

/// Checks that a frame pulled from a stream delivered all `total` bytes its header claims.
pub(crate) fn expect_complete(frame: &[u8], total: usize) -> Result<()> {
    if frame.len() == total {
        return Ok(());
    }
    Err(ShapecodeError::Bounds {
        offset: frame.len(),
        needed: total.saturating_sub(frame.len()),
        available: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_tag_rejects_garbage() {
        assert_eq!(PresenceTag::from_byte(0).ok(), Some(PresenceTag::Absent));
        assert_eq!(PresenceTag::from_byte(1).ok(), Some(PresenceTag::Present));
        assert!(matches!(
            PresenceTag::from_byte(7),
            Err(ShapecodeError::Format(_))
        ));
    }

    #[test]
    fn negative_wire_length_is_format_error() {
        assert!(matches!(
            len_from_wire(-1, "count"),
            Err(ShapecodeError::Format(_))
        ));
        assert_eq!(len_from_wire(6, "count").ok(), Some(6));
    }

    #[test]
    fn peek_frame_len_validates_header() {
        assert_eq!(peek_frame_len(&31i32.to_le_bytes()).ok(), Some(31));
        assert!(matches!(
            peek_frame_len(&[1, 0]),
            Err(ShapecodeError::Bounds { .. })
        ));
        assert!(matches!(
            peek_frame_len(&2i32.to_le_bytes()),
            Err(ShapecodeError::Format(_))
        ));
    }
}
