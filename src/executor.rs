//! The parallel batch executor.
//!
//! Encodes many values into one contiguous buffer of back-to-back frames. Sizing runs
//! in parallel first; the exact-size buffer is then split into disjoint frame slots and
//! every slot is written by its own Rayon task. The first failure aborts the rest.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::error::{Result, ShapecodeError};
use crate::shape::Shape;
use crate::sizer::frame_size;
use crate::strategy::StrategyRegistry;
use crate::value::Value;
use crate::writer::write_frame;

/// Context shared among all worker threads.
struct BatchContext<'a> {
    registry: &'a StrategyRegistry,
    shape: &'a Shape,
    abort_flag: AtomicBool,
    error_capture: Mutex<Option<ShapecodeError>>,
}

impl BatchContext<'_> {
    fn signal_error(&self, err: ShapecodeError) {
        let mut guard = self.error_capture.lock().unwrap_or_else(|p| p.into_inner());
        if guard.is_none() {
            *guard = Some(err);
            self.abort_flag.store(true, Ordering::SeqCst);
        }
    }

    fn should_abort(&self) -> bool {
        self.abort_flag.load(Ordering::Relaxed)
    }

    fn write_slot(&self, slot: &mut [u8], value: &Value) {
        if self.should_abort() {
            return;
        }
        let expected = slot.len();
        match write_frame(self.registry, slot, self.shape, value) {
            Ok(written) if written == expected => {}
            Ok(written) => self.signal_error(contract(self.shape, expected, written)),
            Err(ShapecodeError::Bounds {
                offset, needed, ..
            }) => self.signal_error(contract(self.shape, expected, offset + needed)),
            Err(e) => self.signal_error(e),
        }
    }
}

pub(crate) fn contract(shape: &Shape, expected: usize, written: usize) -> ShapecodeError {
    ShapecodeError::StrategyContract {
        type_name: shape.type_name().into_owned(),
        expected,
        written,
    }
}

/// Sizes every value, then writes all frames in parallel into one buffer.
///
/// Returns the buffer and the length of each frame, in input order.
pub(crate) fn serialize_batch(
    registry: &StrategyRegistry,
    shape: &Shape,
    values: &[Value],
) -> Result<(Vec<u8>, Vec<usize>)> {
    let sizes = values
        .par_iter()
        .map(|v| frame_size(registry, shape, v))
        .collect::<Result<Vec<usize>>>()?;
    let total = sizes
        .iter()
        .try_fold(0usize, |acc, s| acc.checked_add(*s))
        .ok_or_else(|| ShapecodeError::Format("Batch size overflows usize".into()))?;

    let mut buffer = vec![0u8; total];
    let mut slots = Vec::with_capacity(sizes.len());
    let mut rest = buffer.as_mut_slice();
    for size in &sizes {
        let (slot, tail) = rest.split_at_mut(*size);
        slots.push(slot);
        rest = tail;
    }

    let ctx = BatchContext {
        registry,
        shape,
        abort_flag: AtomicBool::new(false),
        error_capture: Mutex::new(None),
    };
    rayon::scope(|s| {
        let ctx_ref = &ctx;
        for (slot, value) in slots.into_iter().zip(values) {
            s.spawn(move |_| ctx_ref.write_slot(slot, value));
        }
    });

    if ctx.should_abort() {
        let guard = ctx.error_capture.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(err) = guard.as_ref() {
            return Err(err.clone());
        }
        return Err(ShapecodeError::Format("Batch aborted without an error".into()));
    }

    tracing::debug!(
        type_name = %shape.type_name(),
        frames = sizes.len(),
        bytes = total,
        "batch serialized"
    );
    Ok((buffer, sizes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecOptions;
    use crate::reader::read_frame;

    #[test]
    fn frames_are_back_to_back() {
        let reg = StrategyRegistry::new();
        let values: Vec<Value> = (0..64)
            .map(|i| {
                if i % 5 == 0 {
                    Value::Null
                } else {
                    Value::Text("x".repeat(i))
                }
            })
            .collect();
        let (buf, sizes) = serialize_batch(&reg, &Shape::Text, &values).unwrap();
        assert_eq!(sizes.iter().sum::<usize>(), buf.len());

        let mut offset = 0;
        for expected in &values {
            let (value, read) =
                read_frame(&reg, &CodecOptions::default(), &buf[offset..], &Shape::Text).unwrap();
            assert_eq!(&value, expected);
            offset += read;
        }
        assert_eq!(offset, buf.len());
    }

    #[test]
    fn first_error_is_reported() {
        let reg = StrategyRegistry::new();
        let values = vec![Value::from("ok"), Value::U8(3)];
        assert!(matches!(
            serialize_batch(&reg, &Shape::Text, &values),
            Err(ShapecodeError::ValueMismatch { .. })
        ));
    }
}
