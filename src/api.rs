//! The public codec handle.
//!
//! [`Shapecode`] bundles the strategy registry with the decoding options and exposes the
//! buffer, stream and typed entry points. File and async entry points are added in
//! their own modules.

use std::io::{Read, Write};
use std::sync::Arc;

use crate::config::CodecOptions;
use crate::error::{Result, ShapecodeError};
use crate::executor::{self, contract};
use crate::format::{HEADER_SIZE, expect_complete, peek_frame_len};
use crate::reader::read_frame;
use crate::shape::Shape;
use crate::shaped::{Shaped, shape_of};
use crate::sizer::frame_size;
use crate::strategy::StrategyRegistry;
use crate::validate::{Violation, validate};
use crate::value::Value;
use crate::writer::write_frame;

/// The main entry point: a strategy registry plus decoding options.
///
/// Cheap to clone; clones share the registry.
#[derive(Debug, Clone)]
pub struct Shapecode {
    registry: Arc<StrategyRegistry>,
    options: CodecOptions,
}

impl Default for Shapecode {
    fn default() -> Self {
        Self::new()
    }
}

impl Shapecode {
    /// A codec over the process-wide registry with default options.
    pub fn new() -> Self {
        Self {
            registry: StrategyRegistry::global(),
            options: CodecOptions::default(),
        }
    }

    /// Starts configuring a codec.
    pub fn builder() -> ShapecodeBuilder {
        ShapecodeBuilder::default()
    }

    /// The registry consulted for custom shapes.
    pub fn registry(&self) -> &Arc<StrategyRegistry> {
        &self.registry
    }

    /// The decoding options in effect.
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Runs the static shape checks against this codec's registry.
    pub fn validate(&self, shape: &Shape) -> Vec<Violation> {
        validate(shape, &self.registry)
    }

    /// Exact size in bytes of the frame [`write`](Self::write) produces for `value`,
    /// root length header included.
    pub fn expected_size(&self, shape: &Shape, value: &Value) -> Result<usize> {
        let size = frame_size(&self.registry, shape, value)?;
        tracing::debug!(type_name = %shape.type_name(), bytes = size, "sized value");
        Ok(size)
    }

    /// Writes one frame at the start of `buffer` and returns the bytes written.
    ///
    /// The buffer is never grown. Size it with [`expected_size`](Self::expected_size).
    pub fn write(&self, buffer: &mut [u8], shape: &Shape, value: &Value) -> Result<usize> {
        let written = write_frame(&self.registry, buffer, shape, value)?;
        tracing::debug!(type_name = %shape.type_name(), bytes = written, "wrote frame");
        Ok(written)
    }

    /// Reads one frame from the start of `buffer`. Returns the value and the bytes
    /// consumed, so frames packed back-to-back can be read in sequence.
    pub fn read(&self, buffer: &[u8], shape: &Shape) -> Result<(Value, usize)> {
        let (value, read) = read_frame(&self.registry, &self.options, buffer, shape)?;
        tracing::debug!(type_name = %shape.type_name(), bytes = read, "read frame");
        Ok((value, read))
    }

    /// Sizes, allocates and writes in one step.
    ///
    /// # Errors
    /// [`ShapecodeError::StrategyContract`] if the bytes written disagree with the
    /// computed size, which can only happen through a misbehaving custom strategy.
    pub fn serialize(&self, shape: &Shape, value: &Value) -> Result<Vec<u8>> {
        let expected = self.expected_size(shape, value)?;
        let mut buffer = vec![0u8; expected];
        match write_frame(&self.registry, &mut buffer, shape, value) {
            Ok(written) if written == expected => {}
            Ok(written) => return Err(contract(shape, expected, written)),
            Err(ShapecodeError::Bounds { offset, needed, .. }) => {
                return Err(contract(shape, expected, offset + needed));
            }
            Err(e) => return Err(e),
        }
        tracing::debug!(type_name = %shape.type_name(), bytes = expected, "serialized value");
        Ok(buffer)
    }

    /// Encodes many values as back-to-back frames, in parallel.
    ///
    /// Returns the buffer and the length of each frame, in input order.
    pub fn serialize_batch(&self, shape: &Shape, values: &[Value]) -> Result<(Vec<u8>, Vec<usize>)> {
        executor::serialize_batch(&self.registry, shape, values)
    }

    /// Serializes one frame into `writer`. Returns the bytes written.
    pub fn write_to<W: Write>(&self, mut writer: W, shape: &Shape, value: &Value) -> Result<usize> {
        let frame = self.serialize(shape, value)?;
        writer.write_all(&frame)?;
        writer.flush()?;
        Ok(frame.len())
    }

    /// Reads exactly one frame from `reader`: the length header, then the framed bytes.
    pub fn read_from<R: Read>(&self, mut reader: R, shape: &Shape) -> Result<(Value, usize)> {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;
        let frame = read_framed_rest(&mut reader, header)?;
        self.read(&frame, shape)
    }

    /// [`serialize`](Self::serialize) for a [`Shaped`] type.
    pub fn encode<T: Shaped>(&self, value: &T) -> Result<Vec<u8>> {
        self.serialize(&shape_of::<T>(), &value.to_value())
    }

    /// [`read`](Self::read) for a [`Shaped`] type.
    pub fn decode<T: Shaped>(&self, buffer: &[u8]) -> Result<(T, usize)> {
        let (value, read) = self.read(buffer, &shape_of::<T>())?;
        Ok((T::from_value(value)?, read))
    }

    /// [`expected_size`](Self::expected_size) for a [`Shaped`] type.
    pub fn expected_size_of<T: Shaped>(&self, value: &T) -> Result<usize> {
        self.expected_size(&shape_of::<T>(), &value.to_value())
    }

    /// [`write`](Self::write) for a [`Shaped`] type.
    pub fn write_value<T: Shaped>(&self, buffer: &mut [u8], value: &T) -> Result<usize> {
        self.write(buffer, &shape_of::<T>(), &value.to_value())
    }
}

/// Reads the rest of a frame whose header has already been read.
///
/// The buffer grows with the bytes actually delivered, so a corrupt header cannot
/// force a large allocation up front.
fn read_framed_rest<R: Read>(reader: &mut R, header: [u8; HEADER_SIZE]) -> Result<Vec<u8>> {
    let total = peek_frame_len(&header)?;
    let mut frame = header.to_vec();
    reader
        .take((total - HEADER_SIZE) as u64)
        .read_to_end(&mut frame)?;
    expect_complete(&frame, total)?;
    Ok(frame)
}

/// Builder for [`Shapecode`].
#[derive(Debug, Default)]
pub struct ShapecodeBuilder {
    registry: Option<Arc<StrategyRegistry>>,
    options: CodecOptions,
}

impl ShapecodeBuilder {
    /// Uses `registry` instead of the process-wide one.
    #[must_use]
    pub fn registry(mut self, registry: Arc<StrategyRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replaces all options at once.
    #[must_use]
    pub fn options(mut self, options: CodecOptions) -> Self {
        self.options = options;
        self
    }

    /// See [`CodecOptions::strict_framing`].
    #[must_use]
    pub fn strict_framing(mut self, strict: bool) -> Self {
        self.options.strict_framing = strict;
        self
    }

    /// See [`CodecOptions::max_elements`].
    #[must_use]
    pub fn max_elements(mut self, max: usize) -> Self {
        self.options.max_elements = max;
        self
    }

    /// Finishes the codec.
    pub fn build(self) -> Shapecode {
        Shapecode {
            registry: self.registry.unwrap_or_else(StrategyRegistry::global),
            options: self.options,
        }
    }
}
