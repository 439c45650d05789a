//! Pluggable custom encodings.
//!
//! A [`Strategy`] replaces the shape-driven case split for one type. Whenever the codec
//! meets a [`Shape::Custom`](crate::Shape::Custom) node it looks the type name up in a
//! [`StrategyRegistry`] and delegates sizing, writing and reading entirely to it.
//!
//! The three operations must agree with each other: `expected_size` has to return
//! exactly the number of bytes `serialize` writes, and `deserialize` has to consume
//! exactly that many. The engine cannot check this in general; a disagreement is a
//! latent bug in the strategy.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use once_cell::sync::Lazy;

use crate::cursor::{ReadCursor, WriteCursor};
use crate::error::{Result, ShapecodeError};
use crate::value::Value;

static GLOBAL: Lazy<Arc<StrategyRegistry>> = Lazy::new(|| Arc::new(StrategyRegistry::new()));

/// User-supplied encode/decode/size logic for one type.
pub trait Strategy: Send + Sync + fmt::Debug {
    /// Exact number of bytes [`serialize`](Self::serialize) writes for `value`.
    fn expected_size(&self, value: &Value) -> Result<usize>;

    /// Writes `value` at the cursor.
    fn serialize(&self, value: &Value, cursor: &mut WriteCursor<'_>) -> Result<()>;

    /// Reads one value at the cursor.
    fn deserialize(&self, cursor: &mut ReadCursor<'_>) -> Result<Value>;
}

/// A [`Strategy`] assembled from three closures.
pub struct FnStrategy<S, D, Z> {
    serialize: S,
    deserialize: D,
    expected_size: Z,
}

impl<S, D, Z> FnStrategy<S, D, Z>
where
    S: Fn(&Value, &mut WriteCursor<'_>) -> Result<()> + Send + Sync,
    D: Fn(&mut ReadCursor<'_>) -> Result<Value> + Send + Sync,
    Z: Fn(&Value) -> Result<usize> + Send + Sync,
{
    /// Bundles the `(serialize, deserialize, expected_size)` triple.
    pub fn new(serialize: S, deserialize: D, expected_size: Z) -> Self {
        Self {
            serialize,
            deserialize,
            expected_size,
        }
    }
}

impl<S, D, Z> fmt::Debug for FnStrategy<S, D, Z> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnStrategy")
    }
}

impl<S, D, Z> Strategy for FnStrategy<S, D, Z>
where
    S: Fn(&Value, &mut WriteCursor<'_>) -> Result<()> + Send + Sync,
    D: Fn(&mut ReadCursor<'_>) -> Result<Value> + Send + Sync,
    Z: Fn(&Value) -> Result<usize> + Send + Sync,
{
    fn expected_size(&self, value: &Value) -> Result<usize> {
        (self.expected_size)(value)
    }

    fn serialize(&self, value: &Value, cursor: &mut WriteCursor<'_>) -> Result<()> {
        (self.serialize)(value, cursor)
    }

    fn deserialize(&self, cursor: &mut ReadCursor<'_>) -> Result<Value> {
        (self.deserialize)(cursor)
    }
}

/// Lookup table from type name to its [`Strategy`].
///
/// At most one entry may exist per type. Registration is expected to happen once at
/// startup; lookups afterwards are lock-free reads.
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    entries: DashMap<String, Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// The process-wide registry used by [`Shapecode::new`](crate::Shapecode::new).
    pub fn global() -> Arc<StrategyRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Registers `strategy` for `type_name`.
    ///
    /// # Errors
    /// Returns [`ShapecodeError::Strategy`] if the type already has an entry.
    pub fn register(&self, type_name: impl Into<String>, strategy: Arc<dyn Strategy>) -> Result<()> {
        match self.entries.entry(type_name.into()) {
            Entry::Occupied(slot) => Err(ShapecodeError::Strategy(format!(
                "A strategy is already registered for '{}'",
                slot.key()
            ))),
            Entry::Vacant(slot) => {
                tracing::debug!(type_name = %slot.key(), "custom strategy registered");
                slot.insert(strategy);
                Ok(())
            }
        }
    }

    /// Registers a strategy built from a `(serialize, deserialize, expected_size)` triple.
    pub fn register_fns<S, D, Z>(
        &self,
        type_name: impl Into<String>,
        serialize: S,
        deserialize: D,
        expected_size: Z,
    ) -> Result<()>
    where
        S: Fn(&Value, &mut WriteCursor<'_>) -> Result<()> + Send + Sync + 'static,
        D: Fn(&mut ReadCursor<'_>) -> Result<Value> + Send + Sync + 'static,
        Z: Fn(&Value) -> Result<usize> + Send + Sync + 'static,
    {
        self.register(
            type_name,
            Arc::new(FnStrategy::new(serialize, deserialize, expected_size)),
        )
    }

    /// Retrieves the strategy for `type_name`, if any.
    pub fn lookup(&self, type_name: &str) -> Option<Arc<dyn Strategy>> {
        self.entries.get(type_name).map(|e| Arc::clone(e.value()))
    }

    /// Retrieves the strategy for `type_name`, treating absence as a hard error.
    ///
    /// # Errors
    /// Returns [`ShapecodeError::UnsupportedShape`] when nothing is registered.
    pub fn require(&self, type_name: &str) -> Result<Arc<dyn Strategy>> {
        self.lookup(type_name).ok_or_else(|| {
            ShapecodeError::UnsupportedShape(format!(
                "No strategy registered for custom type '{type_name}'"
            ))
        })
    }

    /// True if `type_name` has an entry.
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// Number of registered strategies.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
