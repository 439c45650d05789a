//! Rectangular arrays of any rank.

use crate::error::{Result, ShapecodeError};
use crate::validate::MAX_ARRAY_RANK;

/// A rank-`R` rectangular array stored row-major, encoded as a rank-`R` array shape.
///
/// `MultiArray<Person, 2>` is the rectangular `Person[,]`, as opposed to the jagged
/// `Box<[Box<[Person]>]>` (`Person[][]`).
///
/// `R` may not exceed [`MAX_ARRAY_RANK`]; encoding a higher rank fails to compile.
/// Rank 0 compiles but is reported by [`validate`](fn@crate::validate).
///
/// ```rust
/// use shapecode::MultiArray;
///
/// let grid = MultiArray::new([2, 3], vec![0, 1, 2, 10, 11, 12]).unwrap();
/// assert_eq!(grid.get([1, 2]), Some(&12));
/// assert_eq!(grid.get([2, 0]), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiArray<T, const R: usize> {
    dims: [usize; R],
    items: Vec<T>,
}

impl<T, const R: usize> MultiArray<T, R> {
    /// The rank as stamped on the wire.
    pub const RANK: u8 = {
        assert!(
            R <= MAX_ARRAY_RANK as usize,
            "MultiArray rank exceeds MAX_ARRAY_RANK"
        );
        R as u8
    };

    /// Wraps `items` (row-major) with the given dimension lengths.
    ///
    /// # Errors
    /// Returns [`ShapecodeError::ValueMismatch`] if the dimensions do not multiply to
    /// `items.len()`.
    pub fn new(dims: [usize; R], items: Vec<T>) -> Result<Self> {
        let product = dims.iter().try_fold(1usize, |acc, d| acc.checked_mul(*d));
        if product != Some(items.len()) {
            return Err(ShapecodeError::value_mismatch(
                "MultiArray",
                format!("dimensions {dims:?} do not hold {} items", items.len()),
            ));
        }
        Ok(Self { dims, items })
    }

    /// Length of each dimension, outermost first.
    pub fn dims(&self) -> &[usize; R] {
        &self.dims
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if any dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Element at `index`, or `None` when any coordinate is out of range.
    pub fn get(&self, index: [usize; R]) -> Option<&T> {
        let mut flat = 0usize;
        for (i, d) in index.iter().zip(&self.dims) {
            if i >= d {
                return None;
            }
            flat = flat * d + i;
        }
        self.items.get(flat)
    }

    /// Elements in row-major order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Consumes the array, returning the row-major elements.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
