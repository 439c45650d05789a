//! The dynamic value graph walked alongside a [`Shape`](crate::Shape).

use crate::shape::Primitive;

/// One node of a value graph.
///
/// Which variants are accepted depends on the shape the value is encoded with: a
/// [`Shape::Primitive`](crate::Shape::Primitive) takes the matching scalar variant, a
/// [`Shape::Blittable`](crate::Shape::Blittable) takes a [`Value::Blob`] of exactly its
/// width, and every presence-bearing shape also accepts [`Value::Null`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An absent reference, string, collection or nullable scalar.
    Null,
    /// `bool`
    Bool(bool),
    /// `u8`
    U8(u8),
    /// `i8`
    I8(i8),
    /// `u16`
    U16(u16),
    /// `i16`
    I16(i16),
    /// `u32`
    U32(u32),
    /// `i32`
    I32(i32),
    /// `u64`
    U64(u64),
    /// `i64`
    I64(i64),
    /// `u128`
    U128(u128),
    /// `i128`
    I128(i128),
    /// `f32`
    F32(f32),
    /// `f64`
    F64(f64),
    /// `char`
    Char(char),
    /// Raw payload of a fixed-layout composite, little-endian member by member.
    Blob(Vec<u8>),
    /// A string.
    Text(String),
    /// A rectangular array; `items.len()` equals the product of `dims`.
    Array {
        /// Length of each dimension, outermost first.
        dims: Vec<usize>,
        /// Elements in row-major order.
        items: Vec<Value>,
    },
    /// Elements of a sequence in enumeration order.
    Sequence(Vec<Value>),
    /// Key/value pairs in enumeration order.
    Map(Vec<(Value, Value)>),
    /// Member values in declaration order.
    Composite(Vec<Value>),
    /// A concrete variant of a union, by index into the union's variant list.
    Variant(usize, Box<Value>),
}

impl Value {
    /// Short description of the variant, used in mismatch diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::U8(_) => "u8",
            Self::I8(_) => "i8",
            Self::U16(_) => "u16",
            Self::I16(_) => "i16",
            Self::U32(_) => "u32",
            Self::I32(_) => "i32",
            Self::U64(_) => "u64",
            Self::I64(_) => "i64",
            Self::U128(_) => "u128",
            Self::I128(_) => "i128",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Char(_) => "char",
            Self::Blob(_) => "blob",
            Self::Text(_) => "text",
            Self::Array { .. } => "array",
            Self::Sequence(_) => "sequence",
            Self::Map(_) => "map",
            Self::Composite(_) => "composite",
            Self::Variant(..) => "variant",
        }
    }

    /// The primitive kind of a scalar variant, `None` for everything else.
    pub fn primitive(&self) -> Option<Primitive> {
        Some(match self {
            Self::Bool(_) => Primitive::Bool,
            Self::U8(_) => Primitive::U8,
            Self::I8(_) => Primitive::I8,
            Self::U16(_) => Primitive::U16,
            Self::I16(_) => Primitive::I16,
            Self::U32(_) => Primitive::U32,
            Self::I32(_) => Primitive::I32,
            Self::U64(_) => Primitive::U64,
            Self::I64(_) => Primitive::I64,
            Self::U128(_) => Primitive::U128,
            Self::I128(_) => Primitive::I128,
            Self::F32(_) => Primitive::F32,
            Self::F64(_) => Primitive::F64,
            Self::Char(_) => Primitive::Char,
            _ => return None,
        })
    }

    /// True for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Builds a rank-1 array.
    pub fn array1(items: Vec<Value>) -> Self {
        Self::Array {
            dims: vec![items.len()],
            items,
        }
    }
}

macro_rules! impl_value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_value_from!(
    bool => Bool,
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
    char => Char,
    String => Text,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
