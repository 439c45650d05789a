//! The typed layer: how Rust types describe themselves to the codec.
//!
//! A [`Shaped`] type hands out its [`Shape`] and converts to and from the dynamic
//! [`Value`] graph. `#[derive(ShapecodeObject)]` implements it for structs and enums;
//! the standard library types are covered in `shaped_impls`.

use std::any::TypeId;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::error::Result;
use crate::shape::Shape;
use crate::value::Value;

/// Process-wide shape cache. A type's shape is resolved once and never invalidated.
static SHAPES: Lazy<DashMap<TypeId, Arc<Shape>>> = Lazy::new(DashMap::new);

/// A type the codec can walk.
pub trait Shaped: Sized + 'static {
    /// The type's shape descriptor. Prefer [`shape_of`], which caches the result.
    fn shape() -> Shape;

    /// Converts `self` into its value graph.
    fn to_value(&self) -> Value;

    /// Rebuilds the type from a decoded value graph.
    ///
    /// # Errors
    /// [`ShapecodeError::ValueMismatch`](crate::ShapecodeError::ValueMismatch) when the
    /// value does not have the form [`to_value`](Self::to_value) produces.
    fn from_value(value: Value) -> Result<Self>;
}

/// A type with a fixed little-endian byte layout, bulk-copied without per-member dispatch.
pub trait FixedLayout: Sized {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Appends exactly [`WIDTH`](Self::WIDTH) bytes.
    fn put_le(&self, out: &mut Vec<u8>);

    /// Decodes from the first [`WIDTH`](Self::WIDTH) bytes of `bytes`.
    fn get_le(bytes: &[u8]) -> Result<Self>;
}

/// Returns the shape of `T`, computing it on first use.
pub fn shape_of<T: Shaped>() -> Arc<Shape> {
    let id = TypeId::of::<T>();
    if let Some(hit) = SHAPES.get(&id) {
        return Arc::clone(hit.value());
    }
    let shape = Arc::new(T::shape());
    tracing::trace!(type_name = %shape.type_name(), "shape resolved");
    Arc::clone(SHAPES.entry(id).or_insert(shape).value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Primitive;

    #[test]
    fn shape_is_cached_per_type() {
        let a = shape_of::<Vec<String>>();
        let b = shape_of::<Vec<String>>();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*a, Shape::sequence(Shape::Text));
        assert_eq!(*shape_of::<u16>(), Shape::Primitive(Primitive::U16));
    }
}
