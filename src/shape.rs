//! Shape descriptors: how a type decomposes for encoding.
//!
//! A [`Shape`] is the classification the planner hands the codec for one type. It is
//! read-only metadata: the size calculator, writer and reader are each a single recursive
//! function keyed on the shape tag, so a type never needs generated per-type code to be
//! encoded. Shapes for Rust types are produced by [`Shaped::shape`](crate::Shaped::shape)
//! (usually through `#[derive(ShapecodeObject)]`); shapes can also be built by hand.
//!
//! ```rust
//! use shapecode::{Member, Primitive, Shape};
//!
//! let person = Shape::composite(
//!     "Person",
//!     vec![
//!         Member::new("name", Shape::Text),
//!         Member::new("age", Shape::Primitive(Primitive::I32)),
//!     ],
//! );
//! assert_eq!(Shape::array(person.clone(), 2).type_name(), "Person[,]");
//! assert_eq!(Shape::sequence(person).type_name(), "List<Person>");
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::format::NODE_OVERHEAD;

/// Fixed-width scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    /// One byte, `0` or `1`.
    Bool,
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 32-bit integer.
    I32,
    /// Unsigned 64-bit integer.
    U64,
    /// Signed 64-bit integer.
    I64,
    /// Unsigned 128-bit integer.
    U128,
    /// Signed 128-bit integer.
    I128,
    /// IEEE-754 single precision.
    F32,
    /// IEEE-754 double precision.
    F64,
    /// Unicode scalar value stored as a 4-byte code point.
    Char,
}

impl Primitive {
    /// Encoded width in bytes.
    pub const fn width(self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 | Self::Char => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
            Self::U128 | Self::I128 => 16,
        }
    }

    /// Canonical type name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::U128 => "u128",
            Self::I128 => "i128",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Char => "char",
        }
    }
}

/// One declared member of a composite, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    /// Member name. Only used for fingerprinting and diagnostics; never written.
    pub name: String,
    /// Shape of the member's declared type.
    pub shape: Shape,
}

impl Member {
    /// Creates a member.
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }
}

/// The classification of one type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    /// A non-nullable scalar, written as its raw little-endian bytes.
    Primitive(Primitive),
    /// A fixed-layout composite whose payload is bulk-copied as `width` raw bytes.
    Blittable {
        /// Declared type name.
        name: String,
        /// Exact payload width in bytes.
        width: usize,
    },
    /// A fixed-layout shape that may be absent.
    Nullable(Box<Shape>),
    /// A UTF-8 string.
    Text,
    /// A rectangular array of `rank` dimensions, stored row-major.
    Array {
        /// Element shape.
        element: Box<Shape>,
        /// Number of dimensions.
        rank: u8,
    },
    /// A growable collection supporting add and iterate.
    Sequence {
        /// Element shape.
        element: Box<Shape>,
    },
    /// A key/value collection.
    Associative {
        /// Key shape.
        key: Box<Shape>,
        /// Value shape.
        value: Box<Shape>,
    },
    /// A composite with an ordered member list.
    Composite {
        /// Declared type name.
        name: String,
        /// Members in declaration order.
        members: Vec<Member>,
    },
    /// A type encoded entirely by a registered [`Strategy`](crate::Strategy).
    Custom {
        /// Declared type name, also the registry key.
        name: String,
    },
    /// A polymorphic root: a closed set of permitted concrete shapes.
    Union {
        /// Declared type name of the root.
        name: String,
        /// Permitted concrete shapes; each must be presence-bearing.
        variants: Vec<Shape>,
    },
}

impl Shape {
    /// Shorthand for [`Shape::Nullable`].
    pub fn nullable(inner: Shape) -> Self {
        Self::Nullable(Box::new(inner))
    }

    /// Shorthand for [`Shape::Array`].
    pub fn array(element: Shape, rank: u8) -> Self {
        Self::Array {
            element: Box::new(element),
            rank,
        }
    }

    /// Shorthand for [`Shape::Sequence`].
    pub fn sequence(element: Shape) -> Self {
        Self::Sequence {
            element: Box::new(element),
        }
    }

    /// Shorthand for [`Shape::Associative`].
    pub fn associative(key: Shape, value: Shape) -> Self {
        Self::Associative {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Shorthand for [`Shape::Composite`].
    pub fn composite(name: impl Into<String>, members: Vec<Member>) -> Self {
        Self::Composite {
            name: name.into(),
            members,
        }
    }

    /// Shorthand for [`Shape::Blittable`].
    pub fn blittable(name: impl Into<String>, width: usize) -> Self {
        Self::Blittable {
            name: name.into(),
            width,
        }
    }

    /// Shorthand for [`Shape::Custom`].
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom { name: name.into() }
    }

    /// Shorthand for [`Shape::Union`].
    pub fn union(name: impl Into<String>, variants: Vec<Shape>) -> Self {
        Self::Union {
            name: name.into(),
            variants,
        }
    }

    /// Canonical type name. This is the key of the process-wide fingerprint cache.
    pub fn type_name(&self) -> Cow<'_, str> {
        match self {
            Self::Primitive(p) => Cow::Borrowed(p.name()),
            Self::Text => Cow::Borrowed("string"),
            Self::Blittable { name, .. }
            | Self::Composite { name, .. }
            | Self::Custom { name }
            | Self::Union { name, .. } => Cow::Borrowed(name),
            Self::Nullable(inner) => Cow::Owned(format!("{}?", inner.type_name())),
            Self::Array { element, rank } => {
                let commas = ",".repeat(usize::from(*rank).saturating_sub(1));
                Cow::Owned(format!("{}[{commas}]", element.type_name()))
            }
            Self::Sequence { element } => Cow::Owned(format!("List<{}>", element.type_name())),
            Self::Associative { key, value } => Cow::Owned(format!(
                "Map<{},{}>",
                key.type_name(),
                value.type_name()
            )),
        }
    }

    /// Stable numeric tag of the shape kind, stamped into fingerprints.
    pub const fn kind_tag(&self) -> u8 {
        match self {
            Self::Primitive(_) => 1,
            Self::Blittable { .. } => 2,
            Self::Nullable(_) => 3,
            Self::Text => 4,
            Self::Array { .. } => 5,
            Self::Sequence { .. } => 6,
            Self::Associative { .. } => 7,
            Self::Composite { .. } => 8,
            Self::Custom { .. } => 9,
            Self::Union { .. } => 10,
        }
    }

    /// Byte width of a fixed-layout shape, `None` for everything else.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            Self::Primitive(p) => Some(p.width()),
            Self::Blittable { width, .. } => Some(*width),
            _ => None,
        }
    }

    /// True for shapes written as raw bytes with no presence tag.
    pub fn is_fixed(&self) -> bool {
        self.fixed_width().is_some()
    }

    /// True for shapes that start with a presence tag and fingerprint slot.
    pub fn is_presence_bearing(&self) -> bool {
        matches!(
            self,
            Self::Nullable(_)
                | Self::Text
                | Self::Array { .. }
                | Self::Sequence { .. }
                | Self::Associative { .. }
                | Self::Composite { .. }
        )
    }

    /// Number of members (composite), variants (union), type arguments (containers).
    pub fn arity(&self) -> usize {
        match self {
            Self::Composite { members, .. } => members.len(),
            Self::Union { variants, .. } => variants.len(),
            Self::Associative { .. } => 2,
            Self::Nullable(_) | Self::Array { .. } | Self::Sequence { .. } => 1,
            Self::Primitive(_) | Self::Blittable { .. } | Self::Text | Self::Custom { .. } => 0,
        }
    }

    /// Fewest bytes any encoding of this shape occupies, absent nodes included.
    ///
    /// Zero only for custom shapes, whose strategies may write nothing.
    pub fn min_encoded_width(&self) -> usize {
        match self {
            Self::Primitive(p) => p.width(),
            Self::Blittable { width, .. } => *width,
            Self::Custom { .. } => 0,
            _ => NODE_OVERHEAD,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}
