//! Runtime utilities for generated code (Macros).
//! Do not use directly.

use std::vec::IntoIter;

use crate::error::{Result, ShapecodeError};
use crate::shaped::{FixedLayout, Shaped};
use crate::value::Value;

/// Unpacks a composite value with exactly `arity` members.
pub fn composite_fields(value: Value, type_name: &str, arity: usize) -> Result<IntoIter<Value>> {
    match value {
        Value::Composite(fields) if fields.len() == arity => Ok(fields.into_iter()),
        Value::Composite(fields) => Err(ShapecodeError::value_mismatch(
            type_name,
            format!("{} member values for {arity} declared members", fields.len()),
        )),
        other => Err(ShapecodeError::value_mismatch(
            type_name,
            format!("expected composite, found {}", other.kind_name()),
        )),
    }
}

/// Converts the next member value.
pub fn next_field<T: Shaped>(
    fields: &mut IntoIter<Value>,
    type_name: &str,
    member: &str,
) -> Result<T> {
    let value = fields.next().ok_or_else(|| {
        ShapecodeError::value_mismatch(type_name, format!("missing member '{member}'"))
    })?;
    T::from_value(value)
}

/// Packs a fixed-layout value into a blob.
pub fn to_blob<T: FixedLayout>(value: &T) -> Value {
    let mut out = Vec::with_capacity(T::WIDTH);
    value.put_le(&mut out);
    Value::Blob(out)
}

/// Unpacks a blob of exactly `T::WIDTH` bytes.
pub fn from_blob<T: FixedLayout>(value: Value, type_name: &str) -> Result<T> {
    match value {
        Value::Blob(bytes) if bytes.len() == T::WIDTH => T::get_le(&bytes),
        Value::Blob(bytes) => Err(ShapecodeError::value_mismatch(
            type_name,
            format!("blob of {} bytes for a {}-byte layout", bytes.len(), T::WIDTH),
        )),
        other => Err(ShapecodeError::value_mismatch(
            type_name,
            format!("expected blob, found {}", other.kind_name()),
        )),
    }
}

/// Sequential reader over the members of a fixed-layout payload.
#[derive(Debug)]
pub struct FixedSlice<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> FixedSlice<'a> {
    /// Starts at the first byte.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Decodes the next member.
    pub fn take<T: FixedLayout>(&mut self) -> Result<T> {
        let rest = self.bytes.get(self.offset..).unwrap_or_default();
        let value = T::get_le(rest)?;
        self.offset += T::WIDTH;
        Ok(value)
    }
}

/// Unpacks a union value into its variant index and payload.
pub fn variant(value: Value, type_name: &str) -> Result<(usize, Value)> {
    match value {
        Value::Variant(index, inner) => Ok((index, *inner)),
        other => Err(ShapecodeError::value_mismatch(
            type_name,
            format!("expected variant, found {}", other.kind_name()),
        )),
    }
}

/// Error for a variant index the enum does not declare.
pub fn unknown_variant(type_name: &str, index: usize) -> ShapecodeError {
    ShapecodeError::value_mismatch(type_name, format!("no variant at index {index}"))
}
