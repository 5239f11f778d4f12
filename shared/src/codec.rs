//! Framing for a bare TCP stream of JSON objects.
//!
//! There is no length prefix: a frame ends where its JSON value ends. The
//! reader buffers bytes until exactly one value can be parsed and keeps any
//! trailing bytes for the next call. The writer emits compact JSON followed
//! by a newline.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a single buffered frame.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

const READ_CHUNK: usize = 4096;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("connection closed")]
    Closed,
    #[error("connection closed in the middle of a frame")]
    Truncated,
    #[error("frame exceeds {} bytes", MAX_FRAME_LEN)]
    TooLarge,
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// True for an orderly close between frames.
    pub fn is_closed(&self) -> bool {
        matches!(self, FrameError::Closed)
    }
}

pub struct FrameReader<R> {
    inner: R,
    buffer: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: Vec::with_capacity(READ_CHUNK),
        }
    }

    /// Reads exactly one JSON value from the stream.
    pub async fn read_frame<T: DeserializeOwned>(&mut self) -> Result<T, FrameError> {
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            if let Some(frame) = self.try_parse()? {
                return Ok(frame);
            }

            if self.buffer.len() > MAX_FRAME_LEN {
                return Err(FrameError::TooLarge);
            }

            let n = self.inner.read(&mut chunk).await?;
            if n == 0 {
                return if self.is_blank() {
                    Err(FrameError::Closed)
                } else {
                    Err(FrameError::Truncated)
                };
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    fn try_parse<T: DeserializeOwned>(&mut self) -> Result<Option<T>, FrameError> {
        if self.is_blank() {
            self.buffer.clear();
            return Ok(None);
        }

        let mut values = serde_json::Deserializer::from_slice(&self.buffer).into_iter::<T>();
        match values.next() {
            Some(Ok(frame)) => {
                let consumed = values.byte_offset();
                self.buffer.drain(..consumed);
                Ok(Some(frame))
            }
            Some(Err(e)) if e.is_eof() => Ok(None),
            Some(Err(e)) => Err(FrameError::Malformed(e)),
            None => Ok(None),
        }
    }

    fn is_blank(&self) -> bool {
        self.buffer.iter().all(u8::is_ascii_whitespace)
    }
}

pub struct FrameWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub async fn write_frame<T: Serialize>(&mut self, frame: &T) -> Result<(), FrameError> {
        let mut bytes = serde_json::to_vec(frame).map_err(FrameError::Encode)?;
        bytes.push(b'\n');
        self.inner.write_all(&bytes).await?;
        self.inner.flush().await?;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), FrameError> {
        self.inner.shutdown().await?;
        Ok(())
    }
}
