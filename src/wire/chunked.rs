//! Chunked transfer-coding decoder.
//!
//! Repeatedly reads `<hex-size>[;ext]CRLF`, then that many bytes + CRLF,
//! until a zero-size chunk, then optional trailer headers, then the
//! terminating CRLF. Header lines tolerate a bare LF terminator, but
//! chunk framing itself requires strict CRLF.

use bytes::Bytes;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::Error;
use crate::header::HeaderMap;

/// Maximum accepted chunk size, guarding against a maliciously large
/// `hex-size` line overflowing `usize`/allocating unboundedly.
const MAX_CHUNK_SIZE: u64 = 1024 * 1024 * 1024; // 1 GiB

pub struct ChunkedReader<'a, R> {
    inner: &'a mut R,
    done: bool,
}

impl<'a, R: AsyncBufRead + Unpin> ChunkedReader<'a, R> {
    pub fn new(inner: &'a mut R) -> Self {
        ChunkedReader { inner, done: false }
    }

    /// Read the next chunk's payload, or `None` once the terminating
    /// zero-size chunk (and any trailers) has been consumed.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        if self.done {
            return Ok(None);
        }

        let size = self.read_chunk_size_line().await?;
        if size == 0 {
            self.consume_trailers().await?;
            self.done = true;
            return Ok(None);
        }

        let mut buf = vec![0u8; size as usize];
        self.inner.read_exact(&mut buf).await.map_err(Error::read)?;
        self.expect_crlf().await?;

        Ok(Some(Bytes::from(buf)))
    }

    /// Drain the entire remaining chunked body into one buffer (materialized
    /// mode).
    pub async fn read_to_end(&mut self) -> Result<Bytes, Error> {
        let mut out = Vec::new();
        while let Some(chunk) = self.next_chunk().await? {
            out.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(out))
    }

    async fn read_chunk_size_line(&mut self) -> Result<u64, Error> {
        let mut line = Vec::new();
        let n = self
            .inner
            .read_until(b'\n', &mut line)
            .await
            .map_err(Error::read)?;
        if n == 0 {
            return Err(Error::protocol("connection closed mid-chunk"));
        }
        if !line.ends_with(b"\n") {
            return Err(Error::protocol("unterminated chunk size line"));
        }
        // Strict CRLF for chunk framing.
        if line.len() < 2 || line[line.len() - 2] != b'\r' {
            return Err(Error::protocol("chunk size line must end in CRLF"));
        }
        line.truncate(line.len() - 2);

        let line = String::from_utf8(line).map_err(|_| Error::protocol("non-UTF-8 chunk size"))?;
        let size_str = line.split(';').next().unwrap_or("").trim();
        let size = u64::from_str_radix(size_str, 16)
            .map_err(|_| Error::protocol(format!("bad chunk size: {size_str}")))?;

        if size > MAX_CHUNK_SIZE {
            return Err(Error::protocol("chunk size overflow"));
        }
        Ok(size)
    }

    async fn expect_crlf(&mut self) -> Result<(), Error> {
        let mut crlf = [0u8; 2];
        self.inner.read_exact(&mut crlf).await.map_err(Error::read)?;
        if &crlf != b"\r\n" {
            return Err(Error::protocol("expected CRLF after chunk data"));
        }
        Ok(())
    }

    async fn consume_trailers(&mut self) -> Result<HeaderMap, Error> {
        crate::wire::response::parse_headers(self.inner).await
    }
}
