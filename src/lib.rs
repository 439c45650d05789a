//! # Shapecode
//!
//! A binary object-graph codec driven by shape descriptors. Given a possibly nested,
//! possibly polymorphic value graph (composites, arrays of any rank, collections,
//! strings, nullable references, primitives), Shapecode produces a compact
//! self-describing byte encoding and reconstructs an equivalent graph from it.
//!
//! ## Overview
//!
//! Every type is classified once into a [`Shape`]. The size calculator, the writer and
//! the reader are each a single recursive walk keyed on that shape, so they stay in
//! lock-step by construction:
//!
//! *   **Exact pre-flight sizing:** [`Shapecode::expected_size`] returns exactly the
//!     number of bytes [`Shapecode::write`] produces, at every node of the graph.
//! *   **Self-describing nodes:** every reference-like node carries a presence tag and a
//!     16-byte type [`Fingerprint`]; the reader rejects a stamp it does not expect.
//! *   **Fixed-layout fast path:** scalars and `#[shapecode(fixed)]` structs are bulk
//!     copied with no tag and no per-member dispatch.
//! *   **Pluggable encodings:** a [`Strategy`] registered for a type replaces the shape
//!     walk for that type entirely.
//! *   **Chaining:** reads report bytes consumed, so frames can be packed back-to-back.
//!
//! ## Wire Format
//!
//! ```text
//! [ Int32 total length ] [ root node ]
//!
//! presence-bearing node:  [ tag (1) ] [ fingerprint (16) ] [ payload... ]
//! text payload:           [ Int32 byte length ] [ UTF-8 bytes ]
//! array payload:          [ Int32 per dimension ] [ elements, row-major ]
//! sequence payload:       [ Int32 capacity hint ] [ Int32 count ] [ elements ]
//! associative payload:    [ Int32 capacity hint ] [ Int32 count ] [ key, value pairs ]
//! composite payload:      [ members in declaration order ]
//! fixed-layout node:      [ raw little-endian bytes ]
//! ```
//!
//! See [`format`] for the constants.
//!
//! ## Usage
//!
//! ```rust
//! use shapecode::{Shapecode, ShapecodeObject};
//!
//! #[derive(Debug, PartialEq, ShapecodeObject)]
//! struct Person {
//!     name: Option<String>,
//!     age: i32,
//!     tags: Vec<String>,
//! }
//!
//! let codec = Shapecode::new();
//! let person = Person { name: Some("Ada".into()), age: 36, tags: vec!["math".into()] };
//!
//! let bytes = codec.encode(&person)?;
//! assert_eq!(bytes.len(), codec.expected_size_of(&person)?);
//!
//! let (back, read): (Person, usize) = codec.decode(&bytes)?;
//! assert_eq!(back, person);
//! assert_eq!(read, bytes.len());
//! # Ok::<(), shapecode::ShapecodeError>(())
//! ```
//!
//! ### Safety and Error Handling
//!
//! * **Encapsulated Unsafe:** the only `unsafe` call is the memory map in the file loader.
//! * **No Panics:** No `unwrap()` or `panic!()` calls in the library (enforced by clippy lints).
//! * **Comprehensive Errors:** All failures correspond to a [`ShapecodeError`] variant.
//! * **Bounded Decoding:** decoded counts never drive allocation beyond the bytes present.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

extern crate self as shapecode;

// --- PUBLIC API MODULES ---
pub mod api;
pub mod config;
pub mod cursor;
pub mod error;
pub mod fingerprint;
pub mod format;
pub mod multi_array;
pub mod shape;
pub mod shaped;
pub mod strategy;
pub mod validate;
pub mod value;

#[cfg(feature = "async")]
mod async_io;

// --- INTERNAL IMPLEMENTATION MODULES ---
mod executor;
mod io;
mod reader;
mod shaped_impls;
mod sizer;
mod writer;

// --- MACRO SUPPORT MODULES ---

/// Runtime utilities used by the derived code.
#[doc(hidden)]
pub mod rt;

// --- RE-EXPORTS ---

pub use api::{Shapecode, ShapecodeBuilder};
pub use config::CodecOptions;
pub use cursor::{ReadCursor, WriteCursor};
pub use error::{Result, ShapecodeError};
pub use fingerprint::Fingerprint;
pub use multi_array::MultiArray;
pub use shape::{Member, Primitive, Shape};
pub use shaped::{FixedLayout, Shaped, shape_of};
pub use strategy::{FnStrategy, Strategy, StrategyRegistry};
pub use validate::{Violation, ViolationKind, validate};
pub use value::Value;

// Re-export the derive macro so it is accessible as `shapecode::ShapecodeObject`
pub use shapecode_derive::ShapecodeObject;
