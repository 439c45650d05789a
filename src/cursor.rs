//! Bounds-checked read/write cursors over caller-provided byte buffers.
//!
//! A cursor is exclusively owned by one write or read invocation and only ever moves
//! forward. Running past the end of the buffer is a [`ShapecodeError::Bounds`] error;
//! the cursors never grow or reallocate the buffer.

use crate::error::{Result, ShapecodeError};

/// Generates little-endian write methods for primitive types.
macro_rules! impl_write_le {
    ($($name:ident => $type:ty),* $(,)?) => {
        $(
            #[doc = concat!("Writes a little-endian `", stringify!($type), "`.")]
            pub fn $name(&mut self, value: $type) -> Result<()> {
                self.write_bytes(&value.to_le_bytes())
            }
        )*
    };
}

/// Generates little-endian read methods for primitive types.
macro_rules! impl_read_le {
    ($($name:ident => $type:ty),* $(,)?) => {
        $(
            #[doc = concat!("Reads a little-endian `", stringify!($type), "`.")]
            pub fn $name(&mut self) -> Result<$type> {
                Ok(<$type>::from_le_bytes(self.read_array()?))
            }
        )*
    };
}

/// Mutable cursor for writing.
#[derive(Debug)]
pub struct WriteCursor<'a> {
    buffer: &'a mut [u8],
    offset: usize,
}

impl<'a> WriteCursor<'a> {
    /// Creates a cursor positioned at the start of `buffer`.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    /// Current write position.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Bytes left before the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    fn reserve(&mut self, len: usize) -> Result<&mut [u8]> {
        let start = self.offset;
        let available = self.remaining();
        let slot = self
            .buffer
            .get_mut(start..start.saturating_add(len))
            .filter(|s| s.len() == len)
            .ok_or(ShapecodeError::Bounds {
                offset: start,
                needed: len,
                available,
            })?;
        self.offset += len;
        Ok(slot)
    }

    /// Copies `data` verbatim.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.reserve(data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// Writes `len` zero bytes.
    pub fn write_zeros(&mut self, len: usize) -> Result<()> {
        self.reserve(len)?.fill(0);
        Ok(())
    }

    impl_write_le!(
        write_u8 => u8,
        write_i8 => i8,
        write_u16 => u16,
        write_i16 => i16,
        write_u32 => u32,
        write_i32 => i32,
        write_u64 => u64,
        write_i64 => i64,
        write_u128 => u128,
        write_i128 => i128,
        write_f32 => f32,
        write_f64 => f64,
    );

    /// Overwrites an `Int32` at an absolute position already written past.
    pub fn patch_i32(&mut self, at: usize, value: i32) -> Result<()> {
        let available = self.offset.saturating_sub(at);
        let written = at.saturating_add(4) <= self.offset;
        let slot = self
            .buffer
            .get_mut(at..at.saturating_add(4))
            .filter(|_| written)
            .ok_or(ShapecodeError::Bounds {
                offset: at,
                needed: 4,
                available,
            })?;
        slot.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}

/// Immutable cursor for reading.
#[derive(Debug, Clone)]
pub struct ReadCursor<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> ReadCursor<'a> {
    /// Creates a cursor positioned at the start of `buffer`.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    /// Current read position.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Bytes left before the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    /// Borrows the next `len` bytes and advances past them.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let slice = self.peek_bytes(0, len)?;
        self.offset += len;
        Ok(slice)
    }

    /// Borrows `len` bytes starting `ahead` bytes past the cursor, without advancing.
    pub fn peek_bytes(&self, ahead: usize, len: usize) -> Result<&'a [u8]> {
        let start = self.offset.saturating_add(ahead);
        self.buffer
            .get(start..start.saturating_add(len))
            .filter(|s| s.len() == len)
            .ok_or(ShapecodeError::Bounds {
                offset: start,
                needed: len,
                available: self.buffer.len().saturating_sub(start),
            })
    }

    /// Reads a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Advances past `len` bytes without looking at them.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    impl_read_le!(
        read_u8 => u8,
        read_i8 => i8,
        read_u16 => u16,
        read_i16 => i16,
        read_u32 => u32,
        read_i32 => i32,
        read_u64 => u64,
        read_i64 => i64,
        read_u128 => u128,
        read_i128 => i128,
        read_f32 => f32,
        read_f64 => f64,
    );
}
