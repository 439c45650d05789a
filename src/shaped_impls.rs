//! [`Shaped`] and [`FixedLayout`] for standard library types.
//!
//! - Scalars are fixed-layout primitives.
//! - `String` is text.
//! - `Vec`/`VecDeque` are sequences, `HashMap`/`BTreeMap` associative.
//! - `Box<[T]>` is a rank-1 array, so nesting it gives jagged arrays.
//! - `Option<T>` adds a nullable wrapper only when `T` has no presence tag of its own.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::Hash;

use crate::error::{Result, ShapecodeError};
use crate::multi_array::MultiArray;
use crate::shape::{Primitive, Shape};
use crate::shaped::{FixedLayout, Shaped};
use crate::value::Value;

fn wrong(expected: impl Into<String>, found: &Value) -> ShapecodeError {
    let expected = expected.into();
    let reason = format!("expected {expected}, found {}", found.kind_name());
    ShapecodeError::value_mismatch(expected, reason)
}

/// First `N` bytes of `bytes` as an array.
pub(crate) fn head<const N: usize>(bytes: &[u8]) -> Result<[u8; N]> {
    bytes
        .get(..N)
        .and_then(|b| b.try_into().ok())
        .ok_or(ShapecodeError::Bounds {
            offset: 0,
            needed: N,
            available: bytes.len(),
        })
}

macro_rules! impl_primitive {
    ($($t:ty => $kind:ident),* $(,)?) => {
        $(
            impl Shaped for $t {
                fn shape() -> Shape {
                    Shape::Primitive(Primitive::$kind)
                }

                fn to_value(&self) -> Value {
                    Value::$kind(*self)
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::$kind(v) => Ok(v),
                        other => Err(wrong(Primitive::$kind.name(), &other)),
                    }
                }
            }

            impl FixedLayout for $t {
                const WIDTH: usize = Primitive::$kind.width();

                fn put_le(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn get_le(bytes: &[u8]) -> Result<Self> {
                    Ok(<$t>::from_le_bytes(head(bytes)?))
                }
            }
        )*
    };
}

impl_primitive!(
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    u128 => U128,
    i128 => I128,
    f32 => F32,
    f64 => F64,
);

impl Shaped for bool {
    fn shape() -> Shape {
        Shape::Primitive(Primitive::Bool)
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(wrong("bool", &other)),
        }
    }
}

impl FixedLayout for bool {
    const WIDTH: usize = 1;

    fn put_le(&self, out: &mut Vec<u8>) {
        out.push(u8::from(*self));
    }

    fn get_le(bytes: &[u8]) -> Result<Self> {
        match head::<1>(bytes)? {
            [0] => Ok(false),
            [1] => Ok(true),
            [other] => Err(ShapecodeError::Format(format!(
                "Invalid bool byte 0x{other:02x}"
            ))),
        }
    }
}

impl Shaped for char {
    fn shape() -> Shape {
        Shape::Primitive(Primitive::Char)
    }

    fn to_value(&self) -> Value {
        Value::Char(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Char(v) => Ok(v),
            other => Err(wrong("char", &other)),
        }
    }
}

impl FixedLayout for char {
    const WIDTH: usize = 4;

    fn put_le(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&u32::from(*self).to_le_bytes());
    }

    fn get_le(bytes: &[u8]) -> Result<Self> {
        let raw = u32::from_le_bytes(head(bytes)?);
        char::from_u32(raw)
            .ok_or_else(|| ShapecodeError::Format(format!("Invalid char code point 0x{raw:x}")))
    }
}

impl Shaped for String {
    fn shape() -> Shape {
        Shape::Text
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(wrong("string", &other)),
        }
    }
}

impl<T: Shaped> Shaped for Option<T> {
    fn shape() -> Shape {
        let inner = T::shape();
        if inner.is_presence_bearing() || matches!(inner, Shape::Union { .. }) {
            inner
        } else {
            Shape::nullable(inner)
        }
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, Shaped::to_value)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            present => T::from_value(present).map(Some),
        }
    }
}

impl<T: Shaped> Shaped for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn to_value(&self) -> Value {
        self.as_ref().to_value()
    }

    fn from_value(value: Value) -> Result<Self> {
        T::from_value(value).map(Box::new)
    }
}

fn items_from<T: Shaped, C: FromIterator<T>>(items: Vec<Value>) -> Result<C> {
    items.into_iter().map(T::from_value).collect()
}

impl<T: Shaped> Shaped for Vec<T> {
    fn shape() -> Shape {
        Shape::sequence(T::shape())
    }

    fn to_value(&self) -> Value {
        Value::Sequence(self.iter().map(Shaped::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Sequence(items) => items_from::<T, _>(items),
            other => Err(wrong(Self::shape().type_name(), &other)),
        }
    }
}

impl<T: Shaped> Shaped for VecDeque<T> {
    fn shape() -> Shape {
        Shape::sequence(T::shape())
    }

    fn to_value(&self) -> Value {
        Value::Sequence(self.iter().map(Shaped::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Sequence(items) => items_from::<T, _>(items),
            other => Err(wrong(Self::shape().type_name(), &other)),
        }
    }
}

impl<T: Shaped> Shaped for Box<[T]> {
    fn shape() -> Shape {
        Shape::array(T::shape(), 1)
    }

    fn to_value(&self) -> Value {
        Value::array1(self.iter().map(Shaped::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array { dims, items } if dims.len() == 1 => items_from::<T, _>(items),
            other => Err(wrong(Self::shape().type_name(), &other)),
        }
    }
}

impl<T: Shaped, const R: usize> Shaped for MultiArray<T, R> {
    fn shape() -> Shape {
        Shape::array(T::shape(), Self::RANK)
    }

    fn to_value(&self) -> Value {
        Value::Array {
            dims: self.dims().to_vec(),
            items: self.items().iter().map(Shaped::to_value).collect(),
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        let (dims, items) = match value {
            Value::Array { dims, items } => (dims, items),
            other => return Err(wrong(Self::shape().type_name(), &other)),
        };
        let dims: [usize; R] = dims.try_into().map_err(|d: Vec<usize>| {
            ShapecodeError::value_mismatch(
                Self::shape().type_name(),
                format!("{} dimensions for a rank-{R} array", d.len()),
            )
        })?;
        Self::new(dims, items_from::<T, _>(items)?)
    }
}

fn entries_from<K: Shaped, V: Shaped, C: FromIterator<(K, V)>>(
    entries: Vec<(Value, Value)>,
) -> Result<C> {
    entries
        .into_iter()
        .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
        .collect()
}

impl<K: Shaped + Eq + Hash, V: Shaped> Shaped for HashMap<K, V> {
    fn shape() -> Shape {
        Shape::associative(K::shape(), V::shape())
    }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(entries) => entries_from::<K, V, _>(entries),
            other => Err(wrong(Self::shape().type_name(), &other)),
        }
    }
}

impl<K: Shaped + Ord, V: Shaped> Shaped for BTreeMap<K, V> {
    fn shape() -> Shape {
        Shape::associative(K::shape(), V::shape())
    }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(entries) => entries_from::<K, V, _>(entries),
            other => Err(wrong(Self::shape().type_name(), &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_wraps_only_fixed_layouts() {
        assert_eq!(
            <Option<f64>>::shape(),
            Shape::nullable(Shape::Primitive(Primitive::F64))
        );
        assert_eq!(<Option<String>>::shape(), Shape::Text);
        assert_eq!(<Option<u8>>::from_value(Value::Null).unwrap(), None);
    }

    #[test]
    fn jagged_and_rectangular_names() {
        assert_eq!(<Box<[Box<[i32]>]>>::shape().type_name(), "i32[][]");
        assert_eq!(<MultiArray<i32, 3>>::shape().type_name(), "i32[,,]");
    }

    #[test]
    fn fixed_layout_primitives() {
        let mut out = Vec::new();
        0x0102u16.put_le(&mut out);
        true.put_le(&mut out);
        'z'.put_le(&mut out);
        assert_eq!(out.len(), u16::WIDTH + bool::WIDTH + char::WIDTH);
        assert_eq!(u16::get_le(&out).unwrap(), 0x0102);
        assert!(bool::get_le(&out[2..]).unwrap());
        assert_eq!(char::get_le(&out[3..]).unwrap(), 'z');
        assert!(bool::get_le(&[9]).is_err());
        assert!(u32::get_le(&[1, 2]).is_err());
    }

    #[test]
    fn wrong_variant_is_value_mismatch() {
        assert!(matches!(
            <Vec<u8>>::from_value(Value::Text("x".into())),
            Err(ShapecodeError::ValueMismatch { .. })
        ));
        assert!(matches!(
            <MultiArray<u8, 2>>::from_value(Value::array1(vec![Value::U8(1)])),
            Err(ShapecodeError::ValueMismatch { .. })
        ));
    }
}
