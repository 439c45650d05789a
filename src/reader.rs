//! The read-side engine.
//!
//! Mirrors the writer node for node: presence tag, fingerprint check, then the payload
//! laid out by the same shape rules. An absent node still consumes its zeroed slot.
//! Decoded counts are never trusted for allocation beyond the bytes actually left.

use crate::config::CodecOptions;
use crate::cursor::ReadCursor;
use crate::error::{Result, ShapecodeError};
use crate::fingerprint::Fingerprint;
use crate::format::{FINGERPRINT_WIDTH, HEADER_SIZE, PresenceTag, len_from_wire, peek_frame_len};
use crate::shape::{Primitive, Shape};
use crate::sizer::check_width;
use crate::strategy::StrategyRegistry;
use crate::value::Value;

/// Decodes one frame from the start of `buffer`. Returns the value and the bytes consumed.
pub(crate) fn read_frame(
    registry: &StrategyRegistry,
    options: &CodecOptions,
    buffer: &[u8],
    shape: &Shape,
) -> Result<(Value, usize)> {
    let total = peek_frame_len(buffer)?;
    if total > buffer.len() {
        return Err(ShapecodeError::Bounds {
            offset: 0,
            needed: total,
            available: buffer.len(),
        });
    }
    let scope = if options.strict_framing {
        &buffer[..total]
    } else {
        buffer
    };

    let mut reader = NodeReader {
        registry,
        options,
        cursor: ReadCursor::new(scope),
    };
    reader.cursor.skip(HEADER_SIZE)?;
    let value = reader.read_node(shape)?;
    let consumed = reader.cursor.position();

    if options.strict_framing && consumed != total {
        tracing::warn!(
            type_name = %shape.type_name(),
            header = total,
            consumed,
            "frame length disagrees with bytes consumed"
        );
        return Err(ShapecodeError::Format(format!(
            "Frame header declares {total} bytes but {consumed} were consumed"
        )));
    }
    Ok((value, consumed))
}

struct NodeReader<'r, 'b> {
    registry: &'r StrategyRegistry,
    options: &'r CodecOptions,
    cursor: ReadCursor<'b>,
}

impl NodeReader<'_, '_> {
    /// Reads the presence tag and fingerprint slot. Returns `false` for an absent node.
    fn begin(&mut self, shape: &Shape) -> Result<bool> {
        match PresenceTag::from_byte(self.cursor.read_u8()?)? {
            PresenceTag::Absent => {
                self.cursor.skip(FINGERPRINT_WIDTH)?;
                Ok(false)
            }
            PresenceTag::Present => {
                let found = Fingerprint::from_bytes(self.cursor.read_array()?);
                let expected = Fingerprint::of(shape)?;
                if found != expected {
                    return Err(mismatch(shape, expected, found));
                }
                Ok(true)
            }
        }
    }

    fn count(&mut self, what: &str) -> Result<usize> {
        let n = len_from_wire(self.cursor.read_i32()?, what)?;
        self.check_limit(n, what)
    }

    fn check_limit(&self, n: usize, what: &str) -> Result<usize> {
        if n > self.options.max_elements {
            return Err(ShapecodeError::Format(format!(
                "{what} {n} exceeds the limit of {}",
                self.options.max_elements
            )));
        }
        Ok(n)
    }

    /// Refuses a count whose elements could not fit in the bytes left.
    fn check_fits(&self, count: usize, element_width: usize, what: &str) -> Result<()> {
        let remaining = self.cursor.remaining();
        if element_width > 0 && count > remaining / element_width {
            return Err(ShapecodeError::Format(format!(
                "{what} {count} needs at least {element_width} bytes each, {remaining} left"
            )));
        }
        Ok(())
    }

    /// Capacity hint, then element count. Pre-sizing is clamped to the bytes left.
    fn counts(&mut self, element_width: usize) -> Result<(usize, usize)> {
        let hint = self.count("capacity hint")?;
        let count = self.count("element count")?;
        self.check_fits(count, element_width, "element count")?;
        Ok((hint.min(self.cursor.remaining()), count))
    }

    fn read_node(&mut self, shape: &Shape) -> Result<Value> {
        match shape {
            Shape::Primitive(p) => self.read_primitive(*p),
            Shape::Blittable { name, width } => {
                check_width(name, *width)?;
                Ok(Value::Blob(self.cursor.read_bytes(*width)?.to_vec()))
            }
            Shape::Nullable(inner) => {
                if !self.begin(shape)? {
                    return Ok(Value::Null);
                }
                self.read_node(inner)
            }
            Shape::Text => {
                if !self.begin(shape)? {
                    return Ok(Value::Null);
                }
                let len = len_from_wire(self.cursor.read_i32()?, "string length")?;
                let bytes = self.cursor.read_bytes(len)?;
                let s = std::str::from_utf8(bytes)
                    .map_err(|e| ShapecodeError::Format(format!("Invalid UTF-8 in string: {e}")))?;
                Ok(Value::Text(s.to_owned()))
            }
            Shape::Array { element, rank } => {
                if !self.begin(shape)? {
                    return Ok(Value::Null);
                }
                let mut dims = Vec::with_capacity(usize::from(*rank));
                for _ in 0..*rank {
                    dims.push(self.count("array dimension")?);
                }
                let product = dims
                    .iter()
                    .try_fold(1usize, |acc, d| acc.checked_mul(*d))
                    .ok_or_else(|| {
                        ShapecodeError::Format(format!("Array dimensions {dims:?} overflow"))
                    })?;
                self.check_limit(product, "array element count")?;
                self.check_fits(product, element.min_encoded_width(), "array element count")?;
                let mut items = Vec::with_capacity(product.min(self.cursor.remaining()));
                for _ in 0..product {
                    items.push(self.read_node(element)?);
                }
                Ok(Value::Array { dims, items })
            }
            Shape::Sequence { element } => {
                if !self.begin(shape)? {
                    return Ok(Value::Null);
                }
                let (capacity, count) = self.counts(element.min_encoded_width())?;
                let mut items = Vec::with_capacity(capacity);
                for _ in 0..count {
                    items.push(self.read_node(element)?);
                }
                Ok(Value::Sequence(items))
            }
            Shape::Associative { key, value } => {
                if !self.begin(shape)? {
                    return Ok(Value::Null);
                }
                let pair_width = key.min_encoded_width() + value.min_encoded_width();
                let (capacity, count) = self.counts(pair_width)?;
                let mut entries = Vec::with_capacity(capacity);
                for _ in 0..count {
                    let k = self.read_node(key)?;
                    let v = self.read_node(value)?;
                    entries.push((k, v));
                }
                Ok(Value::Map(entries))
            }
            Shape::Composite { members, .. } => {
                if !self.begin(shape)? {
                    return Ok(Value::Null);
                }
                let mut fields = Vec::with_capacity(members.len());
                for member in members {
                    fields.push(self.read_node(&member.shape)?);
                }
                Ok(Value::Composite(fields))
            }
            Shape::Custom { name } => {
                let strategy = self.registry.require(name)?;
                let start = self.cursor.position();
                let value = strategy.deserialize(&mut self.cursor)?;
                tracing::trace!(
                    type_name = %name,
                    bytes = self.cursor.position() - start,
                    "custom strategy read node"
                );
                Ok(value)
            }
            Shape::Union { variants, .. } => self.read_union(shape, variants),
        }
    }

    /// Peeks the variant's own stamp and dispatches on it.
    fn read_union(&mut self, shape: &Shape, variants: &[Shape]) -> Result<Value> {
        let tag = self.cursor.peek_bytes(0, 1)?[0];
        if PresenceTag::from_byte(tag)? == PresenceTag::Absent {
            self.cursor.skip(1 + FINGERPRINT_WIDTH)?;
            return Ok(Value::Null);
        }
        let mut stamp = [0u8; FINGERPRINT_WIDTH];
        stamp.copy_from_slice(self.cursor.peek_bytes(1, FINGERPRINT_WIDTH)?);
        let found = Fingerprint::from_bytes(stamp);

        for (index, variant) in variants.iter().enumerate() {
            if Fingerprint::of(variant)? == found {
                let inner = self.read_node(variant)?;
                return Ok(Value::Variant(index, Box::new(inner)));
            }
        }
        Err(mismatch(shape, Fingerprint::of(shape)?, found))
    }

    fn read_primitive(&mut self, p: Primitive) -> Result<Value> {
        let c = &mut self.cursor;
        Ok(match p {
            Primitive::Bool => match c.read_u8()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => {
                    return Err(ShapecodeError::Format(format!(
                        "Invalid bool byte 0x{other:02x}"
                    )));
                }
            },
            Primitive::U8 => Value::U8(c.read_u8()?),
            Primitive::I8 => Value::I8(c.read_i8()?),
            Primitive::U16 => Value::U16(c.read_u16()?),
            Primitive::I16 => Value::I16(c.read_i16()?),
            Primitive::U32 => Value::U32(c.read_u32()?),
            Primitive::I32 => Value::I32(c.read_i32()?),
            Primitive::U64 => Value::U64(c.read_u64()?),
            Primitive::I64 => Value::I64(c.read_i64()?),
            Primitive::U128 => Value::U128(c.read_u128()?),
            Primitive::I128 => Value::I128(c.read_i128()?),
            Primitive::F32 => Value::F32(c.read_f32()?),
            Primitive::F64 => Value::F64(c.read_f64()?),
            Primitive::Char => {
                let raw = c.read_u32()?;
                Value::Char(char::from_u32(raw).ok_or_else(|| {
                    ShapecodeError::Format(format!("Invalid char code point 0x{raw:x}"))
                })?)
            }
        })
    }
}

fn mismatch(shape: &Shape, expected: Fingerprint, found: Fingerprint) -> ShapecodeError {
    let type_name = shape.type_name().into_owned();
    tracing::warn!(%type_name, %expected, %found, "fingerprint mismatch");
    ShapecodeError::FingerprintMismatch {
        type_name,
        expected,
        found,
    }
}
