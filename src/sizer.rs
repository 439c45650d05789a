//! The size calculator: value to exact byte count, without touching a buffer.
//!
//! Every rule here is mirrored one-for-one by the writer, so that for any value `v`
//! `expected_size(v)` equals the bytes `write` produces for it, at every node. The
//! destructuring helpers at the bottom are shared with the writer for that reason.

use crate::error::{Result, ShapecodeError};
use crate::format::{HEADER_SIZE, LEN_SIZE, NODE_OVERHEAD};
use crate::shape::{Primitive, Shape};
use crate::strategy::StrategyRegistry;
use crate::value::Value;

/// Size of a whole frame: the root length header plus the root node.
pub(crate) fn frame_size(registry: &StrategyRegistry, shape: &Shape, value: &Value) -> Result<usize> {
    Ok(HEADER_SIZE + node_size(registry, shape, value)?)
}

/// Size of one node and everything below it.
pub(crate) fn node_size(registry: &StrategyRegistry, shape: &Shape, value: &Value) -> Result<usize> {
    match shape {
        Shape::Primitive(p) => {
            check_primitive(*p, value)?;
            Ok(p.width())
        }
        Shape::Blittable { name, width } => blob(name, *width, value).map(<[u8]>::len),
        Shape::Nullable(inner) => match value {
            Value::Null => Ok(NODE_OVERHEAD),
            present => Ok(NODE_OVERHEAD + node_size(registry, inner, present)?),
        },
        Shape::Text => match value {
            Value::Null => Ok(NODE_OVERHEAD),
            other => Ok(NODE_OVERHEAD + LEN_SIZE + text(other)?.len()),
        },
        Shape::Array { element, rank } => {
            if value.is_null() {
                return Ok(NODE_OVERHEAD);
            }
            let (_, items) = array_parts(shape, *rank, value)?;
            let mut total = NODE_OVERHEAD + LEN_SIZE * usize::from(*rank);
            for item in items {
                total += node_size(registry, element, item)?;
            }
            Ok(total)
        }
        Shape::Sequence { element } => {
            if value.is_null() {
                return Ok(NODE_OVERHEAD);
            }
            let mut total = NODE_OVERHEAD + 2 * LEN_SIZE;
            for item in sequence_items(shape, value)? {
                total += node_size(registry, element, item)?;
            }
            Ok(total)
        }
        Shape::Associative { key, value: val } => {
            if value.is_null() {
                return Ok(NODE_OVERHEAD);
            }
            let mut total = NODE_OVERHEAD + 2 * LEN_SIZE;
            for (k, v) in map_entries(shape, value)? {
                total += node_size(registry, key, k)? + node_size(registry, val, v)?;
            }
            Ok(total)
        }
        Shape::Composite { members, .. } => {
            if value.is_null() {
                return Ok(NODE_OVERHEAD);
            }
            let fields = composite_fields(shape, members.len(), value)?;
            let mut total = NODE_OVERHEAD;
            for (member, field) in members.iter().zip(fields) {
                total += node_size(registry, &member.shape, field)?;
            }
            Ok(total)
        }
        Shape::Custom { name } => registry.require(name)?.expected_size(value),
        Shape::Union { variants, .. } => match value {
            Value::Null => Ok(NODE_OVERHEAD),
            other => {
                let (variant, inner) = pick_variant(shape, variants, other)?;
                node_size(registry, variant, inner)
            }
        },
    }
}

fn mismatch(shape: &Shape, reason: impl Into<String>) -> ShapecodeError {
    ShapecodeError::value_mismatch(shape.type_name(), reason)
}

fn unexpected(shape: &Shape, expected: &str, value: &Value) -> ShapecodeError {
    mismatch(
        shape,
        format!("expected {expected}, found {}", value.kind_name()),
    )
}

pub(crate) fn check_primitive(p: Primitive, value: &Value) -> Result<()> {
    if value.primitive() == Some(p) {
        Ok(())
    } else {
        Err(unexpected(&Shape::Primitive(p), p.name(), value))
    }
}

/// Rejects a zero-width fixed layout, which would let a count stand in for data.
pub(crate) fn check_width(name: &str, width: usize) -> Result<()> {
    if width == 0 {
        return Err(ShapecodeError::UnsupportedShape(format!(
            "Fixed layout '{name}' has zero width"
        )));
    }
    Ok(())
}

pub(crate) fn blob<'v>(name: &str, width: usize, value: &'v Value) -> Result<&'v [u8]> {
    check_width(name, width)?;
    match value {
        Value::Blob(bytes) if bytes.len() == width => Ok(bytes),
        Value::Blob(bytes) => Err(ShapecodeError::value_mismatch(
            name,
            format!("blob of {} bytes for a {width}-byte layout", bytes.len()),
        )),
        other => Err(ShapecodeError::value_mismatch(
            name,
            format!("expected blob, found {}", other.kind_name()),
        )),
    }
}

pub(crate) fn text(value: &Value) -> Result<&str> {
    match value {
        Value::Text(s) => Ok(s),
        other => Err(unexpected(&Shape::Text, "text", other)),
    }
}

pub(crate) fn array_parts<'v>(
    shape: &Shape,
    rank: u8,
    value: &'v Value,
) -> Result<(&'v [usize], &'v [Value])> {
    let Value::Array { dims, items } = value else {
        return Err(unexpected(shape, "array", value));
    };
    if dims.len() != usize::from(rank) {
        return Err(mismatch(
            shape,
            format!("{} dimensions for a rank-{rank} array", dims.len()),
        ));
    }
    let product = dims
        .iter()
        .try_fold(1usize, |acc, d| acc.checked_mul(*d))
        .ok_or_else(|| mismatch(shape, "dimension product overflows"))?;
    if product != items.len() {
        return Err(mismatch(
            shape,
            format!("dimensions {dims:?} describe {product} items, found {}", items.len()),
        ));
    }
    Ok((dims, items))
}

pub(crate) fn sequence_items<'v>(shape: &Shape, value: &'v Value) -> Result<&'v [Value]> {
    match value {
        Value::Sequence(items) => Ok(items),
        other => Err(unexpected(shape, "sequence", other)),
    }
}

pub(crate) fn map_entries<'v>(shape: &Shape, value: &'v Value) -> Result<&'v [(Value, Value)]> {
    match value {
        Value::Map(entries) => Ok(entries),
        other => Err(unexpected(shape, "map", other)),
    }
}

pub(crate) fn composite_fields<'v>(
    shape: &Shape,
    arity: usize,
    value: &'v Value,
) -> Result<&'v [Value]> {
    match value {
        Value::Composite(fields) if fields.len() == arity => Ok(fields),
        Value::Composite(fields) => Err(mismatch(
            shape,
            format!("{} member values for {arity} declared members", fields.len()),
        )),
        other => Err(unexpected(shape, "composite", other)),
    }
}

pub(crate) fn pick_variant<'s, 'v>(
    shape: &Shape,
    variants: &'s [Shape],
    value: &'v Value,
) -> Result<(&'s Shape, &'v Value)> {
    let Value::Variant(index, inner) = value else {
        return Err(unexpected(shape, "variant", value));
    };
    let variant = variants.get(*index).ok_or_else(|| {
        mismatch(
            shape,
            format!("variant index {index} out of {} variants", variants.len()),
        )
    })?;
    if inner.is_null() {
        return Err(mismatch(shape, "a selected variant cannot be null"));
    }
    Ok((variant, inner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FINGERPRINT_WIDTH;
    use crate::shape::Member;

    fn reg() -> StrategyRegistry {
        StrategyRegistry::new()
    }

    #[test]
    fn text_frame_size() {
        let size = frame_size(&reg(), &Shape::Text, &Value::from("Foobar")).unwrap();
        assert_eq!(size, 4 + 1 + FINGERPRINT_WIDTH + 4 + 6);
    }

    #[test]
    fn zero_width_layout_is_unsupported() {
        let shape = Shape::sequence(Shape::blittable("sizer_tests::Marker", 0));
        let value = Value::Sequence(vec![Value::Blob(Vec::new())]);
        assert!(matches!(
            frame_size(&reg(), &shape, &value),
            Err(ShapecodeError::UnsupportedShape(_))
        ));
    }

    #[test]
    fn absent_nodes_still_cost_the_slot() {
        let shape = Shape::composite(
            "sizer_tests::Holder",
            vec![
                Member::new("name", Shape::Text),
                Member::new("id", Shape::Primitive(Primitive::U16)),
            ],
        );
        let value = Value::Composite(vec![Value::Null, Value::U16(7)]);
        assert_eq!(
            node_size(&reg(), &shape, &value).unwrap(),
            NODE_OVERHEAD + NODE_OVERHEAD + 2
        );
    }

    #[test]
    fn multi_rank_array_counts_each_dimension() {
        let shape = Shape::array(Shape::Primitive(Primitive::I32), 2);
        let value = Value::Array {
            dims: vec![2, 3],
            items: (0..6).map(Value::I32).collect(),
        };
        assert_eq!(
            node_size(&reg(), &shape, &value).unwrap(),
            NODE_OVERHEAD + 2 * LEN_SIZE + 6 * 4
        );
    }

    #[test]
    fn sequence_and_map_headers() {
        let seq = Shape::sequence(Shape::Text);
        let value = Value::Sequence(vec![Value::from("a"), Value::Null]);
        assert_eq!(
            node_size(&reg(), &seq, &value).unwrap(),
            NODE_OVERHEAD + 8 + (NODE_OVERHEAD + 4 + 1) + NODE_OVERHEAD
        );

        let map = Shape::associative(Shape::Primitive(Primitive::U8), Shape::Text);
        let value = Value::Map(vec![(Value::U8(1), Value::from("xy"))]);
        assert_eq!(
            node_size(&reg(), &map, &value).unwrap(),
            NODE_OVERHEAD + 8 + 1 + NODE_OVERHEAD + 4 + 2
        );
    }

    #[test]
    fn mismatched_values_are_rejected() {
        let shape = Shape::array(Shape::Primitive(Primitive::I32), 2);
        let ragged = Value::Array {
            dims: vec![2, 2],
            items: vec![Value::I32(1)],
        };
        assert!(matches!(
            node_size(&reg(), &shape, &ragged),
            Err(ShapecodeError::ValueMismatch { .. })
        ));
        assert!(matches!(
            node_size(&reg(), &Shape::Primitive(Primitive::U8), &Value::I8(1)),
            Err(ShapecodeError::ValueMismatch { .. })
        ));
        assert!(matches!(
            node_size(&reg(), &Shape::blittable("sizer_tests::V", 4), &Value::Blob(vec![0; 3])),
            Err(ShapecodeError::ValueMismatch { .. })
        ));
    }

    #[test]
    fn custom_without_strategy_is_unsupported() {
        assert!(matches!(
            node_size(&reg(), &Shape::custom("sizer_tests::Nope"), &Value::Null),
            Err(ShapecodeError::UnsupportedShape(_))
        ));
    }
}
