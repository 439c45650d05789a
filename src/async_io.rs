//! Asynchronous stream entry points (feature `async`).
//!
//! A frame is always encoded or decoded whole, in memory. The only suspension points
//! are the byte transfers to or from the stream, so cancellation never lands mid-node:
//! a cancelled write leaves a truncated stream, a cancelled read leaves nothing decoded.

use std::future::Future;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::api::Shapecode;
use crate::error::{Result, ShapecodeError};
use crate::format::{HEADER_SIZE, expect_complete, peek_frame_len};
use crate::shape::Shape;
use crate::value::Value;

impl Shapecode {
    /// Serializes one frame into `writer`. Returns the bytes written.
    pub async fn write_async<W>(&self, writer: &mut W, shape: &Shape, value: &Value) -> Result<usize>
    where
        W: AsyncWrite + Unpin,
    {
        let frame = self.serialize(shape, value)?;
        writer.write_all(&frame).await?;
        writer.flush().await?;
        Ok(frame.len())
    }

    /// Reads exactly one frame from `reader`.
    pub async fn read_async<R>(&self, reader: &mut R, shape: &Shape) -> Result<(Value, usize)>
    where
        R: AsyncRead + Unpin,
    {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header).await?;
        let total = peek_frame_len(&header)?;
        let mut frame = header.to_vec();
        (&mut *reader)
            .take((total - HEADER_SIZE) as u64)
            .read_to_end(&mut frame)
            .await?;
        expect_complete(&frame, total)?;
        self.read(&frame, shape)
    }

    /// [`write_async`](Self::write_async), abandoned with [`ShapecodeError::Cancelled`]
    /// as soon as `cancel` completes.
    pub async fn write_async_cancellable<W, C>(
        &self,
        writer: &mut W,
        shape: &Shape,
        value: &Value,
        cancel: C,
    ) -> Result<usize>
    where
        W: AsyncWrite + Unpin,
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            () = cancel => {
                tracing::debug!(type_name = %shape.type_name(), "async write cancelled");
                Err(ShapecodeError::Cancelled)
            }
            result = self.write_async(writer, shape, value) => result,
        }
    }

    /// [`read_async`](Self::read_async), abandoned with [`ShapecodeError::Cancelled`]
    /// as soon as `cancel` completes.
    pub async fn read_async_cancellable<R, C>(
        &self,
        reader: &mut R,
        shape: &Shape,
        cancel: C,
    ) -> Result<(Value, usize)>
    where
        R: AsyncRead + Unpin,
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            () = cancel => {
                tracing::debug!(type_name = %shape.type_name(), "async read cancelled");
                Err(ShapecodeError::Cancelled)
            }
            result = self.read_async(reader, shape) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::StrategyRegistry;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn codec() -> Shapecode {
        Shapecode::builder()
            .registry(Arc::new(StrategyRegistry::new()))
            .build()
    }

    #[tokio::test]
    async fn async_matches_buffer_bytes() {
        let codec = codec();
        let value = Value::from("Foobar");
        let mut sink = Vec::new();
        let written = codec.write_async(&mut sink, &Shape::Text, &value).await.unwrap();
        assert_eq!(sink, codec.serialize(&Shape::Text, &value).unwrap());

        let mut source = sink.as_slice();
        let (back, read) = codec.read_async(&mut source, &Shape::Text).await.unwrap();
        assert_eq!((back, read), (value, written));
    }

    #[tokio::test]
    async fn stalled_read_is_cancelled() {
        let codec = codec();
        let (mut client, _server) = tokio::io::duplex(64);
        let result = codec
            .read_async_cancellable(&mut client, &Shape::Text, std::future::ready(()))
            .await;
        assert!(matches!(result, Err(ShapecodeError::Cancelled)));
    }

    #[tokio::test]
    async fn cancelled_write_leaves_a_strict_prefix() {
        let codec = codec();
        let value = Value::Text("z".repeat(1000));
        let frame = codec.serialize(&Shape::Text, &value).unwrap();

        // The peer never drains the pipe, so the write stalls once 64 bytes are buffered.
        let (mut client, mut server) = tokio::io::duplex(64);
        let cancel = Arc::new(Notify::new());
        let trigger = Arc::clone(&cancel);
        let (result, ()) = tokio::join!(
            codec.write_async_cancellable(&mut client, &Shape::Text, &value, cancel.notified()),
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                trigger.notify_one();
            }
        );
        assert!(matches!(result, Err(ShapecodeError::Cancelled)));
        drop(client);

        let mut delivered = Vec::new();
        server.read_to_end(&mut delivered).await.unwrap();
        assert!(!delivered.is_empty());
        assert!(delivered.len() < frame.len());
        assert_eq!(delivered.as_slice(), &frame[..delivered.len()]);

        // The truncated stream is refused rather than half-decoded.
        let mut source = delivered.as_slice();
        assert!(matches!(
            codec.read_async(&mut source, &Shape::Text).await,
            Err(ShapecodeError::Bounds { .. })
        ));
    }
}
