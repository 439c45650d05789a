//! Type fingerprints: the fixed-width stamp that self-describes a node's type.
//!
//! Layout (16 bytes):
//! ```text
//! [kind tag (1)] [rank (1)] [arity u16 (2)] [fixed width u32 (4)] [shape hash u64 (8)]
//! ```
//! The shape hash is XxHash64 over the canonical bincode encoding of the whole shape
//! descriptor, so member order, member names and primitive widths all participate.
//! Fingerprints are computed once per distinct shape and cached for the life of the
//! process. Two shapes that share a name but differ in structure get different stamps.

use std::fmt;
use std::hash::Hasher;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use twox_hash::XxHash64;

use crate::error::{Result, ShapecodeError};
use crate::format::FINGERPRINT_WIDTH;
use crate::shape::Shape;

/// Process-wide fingerprint cache keyed by the full shape. Never invalidated.
static FINGERPRINTS: Lazy<DashMap<Shape, Fingerprint>> = Lazy::new(DashMap::new);

/// A fixed-width binary stamp identifying a type's declared shape.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; FINGERPRINT_WIDTH]);

impl Fingerprint {
    /// Wraps raw bytes read from a stream.
    pub const fn from_bytes(bytes: [u8; FINGERPRINT_WIDTH]) -> Self {
        Self(bytes)
    }

    /// Raw bytes as written to a stream.
    pub const fn as_bytes(&self) -> &[u8; FINGERPRINT_WIDTH] {
        &self.0
    }

    /// The all-zero stamp written into the slot of an absent node.
    pub const fn zero() -> Self {
        Self([0u8; FINGERPRINT_WIDTH])
    }

    /// Kind tag stamped in the first byte.
    pub const fn kind_tag(&self) -> u8 {
        self.0[0]
    }

    /// Returns the fingerprint of `shape`, computing and caching it on first use.
    ///
    /// Concurrent first computations for the same shape race benignly: the value is a
    /// pure function of the shape, so whichever insert lands last stores the same bytes.
    pub fn of(shape: &Shape) -> Result<Self> {
        if let Some(hit) = FINGERPRINTS.get(shape) {
            return Ok(*hit);
        }
        let computed = Self::compute(shape)?;
        tracing::trace!(
            type_name = %shape.type_name(),
            fingerprint = %computed,
            "fingerprint cached"
        );
        FINGERPRINTS.insert(shape.clone(), computed);
        Ok(computed)
    }

    /// Computes the fingerprint without touching the cache.
    pub fn compute(shape: &Shape) -> Result<Self> {
        let canonical = bincode::serde::encode_to_vec(shape, bincode::config::standard())
            .map_err(|e| ShapecodeError::Serialization(e.to_string()))?;
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&canonical);
        let digest = hasher.finish();

        let rank = match shape {
            Shape::Array { rank, .. } => *rank,
            _ => 0,
        };
        let arity = u16::try_from(shape.arity()).unwrap_or(u16::MAX);
        let width = shape
            .fixed_width()
            .map_or(0, |w| u32::try_from(w).unwrap_or(u32::MAX));

        let mut bytes = [0u8; FINGERPRINT_WIDTH];
        bytes[0] = shape.kind_tag();
        bytes[1] = rank;
        bytes[2..4].copy_from_slice(&arity.to_le_bytes());
        bytes[4..8].copy_from_slice(&width.to_le_bytes());
        bytes[8..16].copy_from_slice(&digest.to_le_bytes());
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
