//! The writer: value plus shape to bytes in a caller-sized buffer.
//!
//! One recursive function, [`write_node`], walks the shape tag and mirrors the size
//! calculator rule for rule. The root frame is an `Int32` length placeholder followed by
//! the root node; the placeholder is patched once the root is complete.

use crate::cursor::WriteCursor;
use crate::error::{Result, ShapecodeError};
use crate::fingerprint::Fingerprint;
use crate::format::{FINGERPRINT_WIDTH, HEADER_SIZE, PresenceTag, len_to_wire};
use crate::shape::{Primitive, Shape};
use crate::sizer::{
    array_parts, blob, check_primitive, composite_fields, map_entries, pick_variant,
    sequence_items, text,
};
use crate::strategy::StrategyRegistry;
use crate::value::Value;

/// Writes a complete frame at the start of `buffer` and returns the bytes written.
pub(crate) fn write_frame(
    registry: &StrategyRegistry,
    buffer: &mut [u8],
    shape: &Shape,
    value: &Value,
) -> Result<usize> {
    let mut cursor = WriteCursor::new(buffer);
    cursor.write_zeros(HEADER_SIZE)?;
    write_node(registry, &mut cursor, shape, value)?;
    let total = cursor.position();
    cursor.patch_i32(0, len_to_wire(total, "frame length")?)?;
    Ok(total)
}

/// Writes the presence tag and fingerprint slot. Returns `false` for an absent node,
/// whose payload must then be skipped.
fn begin_node(cursor: &mut WriteCursor<'_>, shape: &Shape, value: &Value) -> Result<bool> {
    if value.is_null() {
        cursor.write_u8(PresenceTag::Absent.as_u8())?;
        cursor.write_zeros(FINGERPRINT_WIDTH)?;
        return Ok(false);
    }
    cursor.write_u8(PresenceTag::Present.as_u8())?;
    cursor.write_bytes(Fingerprint::of(shape)?.as_bytes())?;
    Ok(true)
}

/// Writes one node and everything below it.
pub(crate) fn write_node(
    registry: &StrategyRegistry,
    cursor: &mut WriteCursor<'_>,
    shape: &Shape,
    value: &Value,
) -> Result<()> {
    match shape {
        Shape::Primitive(p) => write_primitive(cursor, *p, value),
        Shape::Blittable { name, width } => cursor.write_bytes(blob(name, *width, value)?),
        Shape::Nullable(inner) => {
            if begin_node(cursor, shape, value)? {
                write_node(registry, cursor, inner, value)?;
            }
            Ok(())
        }
        Shape::Text => {
            if value.is_null() {
                return begin_node(cursor, shape, value).map(|_| ());
            }
            let s = text(value)?;
            begin_node(cursor, shape, value)?;
            cursor.write_i32(len_to_wire(s.len(), "string length")?)?;
            cursor.write_bytes(s.as_bytes())
        }
        Shape::Array { element, rank } => {
            if value.is_null() {
                return begin_node(cursor, shape, value).map(|_| ());
            }
            let (dims, items) = array_parts(shape, *rank, value)?;
            begin_node(cursor, shape, value)?;
            for dim in dims {
                cursor.write_i32(len_to_wire(*dim, "array dimension")?)?;
            }
            for item in items {
                write_node(registry, cursor, element, item)?;
            }
            Ok(())
        }
        Shape::Sequence { element } => {
            if value.is_null() {
                return begin_node(cursor, shape, value).map(|_| ());
            }
            let items = sequence_items(shape, value)?;
            begin_node(cursor, shape, value)?;
            write_counts(cursor, items.len())?;
            for item in items {
                write_node(registry, cursor, element, item)?;
            }
            Ok(())
        }
        Shape::Associative { key, value: val } => {
            if value.is_null() {
                return begin_node(cursor, shape, value).map(|_| ());
            }
            let entries = map_entries(shape, value)?;
            begin_node(cursor, shape, value)?;
            write_counts(cursor, entries.len())?;
            for (k, v) in entries {
                write_node(registry, cursor, key, k)?;
                write_node(registry, cursor, val, v)?;
            }
            Ok(())
        }
        Shape::Composite { members, .. } => {
            if value.is_null() {
                return begin_node(cursor, shape, value).map(|_| ());
            }
            let fields = composite_fields(shape, members.len(), value)?;
            begin_node(cursor, shape, value)?;
            for (member, field) in members.iter().zip(fields) {
                write_node(registry, cursor, &member.shape, field)?;
            }
            Ok(())
        }
        Shape::Custom { name } => {
            let strategy = registry.require(name)?;
            let start = cursor.position();
            strategy.serialize(value, cursor)?;
            tracing::trace!(
                type_name = %name,
                bytes = cursor.position() - start,
                "custom strategy wrote node"
            );
            Ok(())
        }
        Shape::Union { variants, .. } => {
            if value.is_null() {
                cursor.write_u8(PresenceTag::Absent.as_u8())?;
                return cursor.write_zeros(FINGERPRINT_WIDTH);
            }
            let (variant, inner) = pick_variant(shape, variants, value)?;
            if !variant.is_presence_bearing() {
                return Err(ShapecodeError::UnsupportedShape(format!(
                    "Union variant '{}' carries no presence tag",
                    variant.type_name()
                )));
            }
            write_node(registry, cursor, variant, inner)
        }
    }
}

/// Sequence and map header: capacity hint, then element count. Both carry the count.
fn write_counts(cursor: &mut WriteCursor<'_>, count: usize) -> Result<()> {
    let wire = len_to_wire(count, "element count")?;
    cursor.write_i32(wire)?;
    cursor.write_i32(wire)
}

fn write_primitive(cursor: &mut WriteCursor<'_>, p: Primitive, value: &Value) -> Result<()> {
    check_primitive(p, value)?;
    match value {
        Value::Bool(v) => cursor.write_u8(u8::from(*v)),
        Value::U8(v) => cursor.write_u8(*v),
        Value::I8(v) => cursor.write_i8(*v),
        Value::U16(v) => cursor.write_u16(*v),
        Value::I16(v) => cursor.write_i16(*v),
        Value::U32(v) => cursor.write_u32(*v),
        Value::I32(v) => cursor.write_i32(*v),
        Value::U64(v) => cursor.write_u64(*v),
        Value::I64(v) => cursor.write_i64(*v),
        Value::U128(v) => cursor.write_u128(*v),
        Value::I128(v) => cursor.write_i128(*v),
        Value::F32(v) => cursor.write_f32(*v),
        Value::F64(v) => cursor.write_f64(*v),
        Value::Char(v) => cursor.write_u32(u32::from(*v)),
        other => Err(ShapecodeError::value_mismatch(
            p.name(),
            format!("expected {}, found {}", p.name(), other.kind_name()),
        )),
    }
}
