//! Request/response body representations. A request body is either a
//! finite byte block or an async producer of chunks; a response body is
//! either fully materialized bytes or a lazily-read async chunk stream.

use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures_core::Stream;
use tokio::sync::Mutex;

use crate::error::Error;

/// A boxed async byte-chunk producer, used for request bodies of unknown
/// length (driving `Transfer-Encoding: chunked` on the wire) and for
/// streaming response bodies.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, Error>> + Send>>;

/// The body a caller attaches to an outgoing request.
pub enum RequestBody {
    /// No body at all (GET, HEAD, ...).
    Empty,
    /// A body whose full length is known up front: serialized with
    /// `Content-Length`.
    Bytes(Bytes),
    /// A body of unknown length: serialized with `Transfer-Encoding:
    /// chunked` unless the caller set `Transfer-Encoding` explicitly.
    ///
    /// Wrapped in a `Mutex<Option<..>>` so the transport can drain it
    /// through a shared `&Request` (requests travel the middleware chain
    /// as `Arc<Request>`); the stream is taken out once, on first write,
    /// same as a real TCP body can only be sent once.
    Stream(Arc<Mutex<Option<ChunkStream>>>),
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    /// The size to use for `Content-Length`, if statically known.
    pub fn known_length(&self) -> Option<u64> {
        match self {
            RequestBody::Empty => Some(0),
            RequestBody::Bytes(b) => Some(b.len() as u64),
            RequestBody::Stream(_) => None,
        }
    }

    /// Clone this body for a replayed request (retry, redirect, or
    /// auth-retry). A `Stream` body becomes `Empty`: it is drained at most
    /// once, so a second attempt sends no body rather than replaying it.
    pub fn shallow_clone(&self) -> RequestBody {
        match self {
            RequestBody::Empty => RequestBody::Empty,
            RequestBody::Bytes(b) => RequestBody::Bytes(b.clone()),
            RequestBody::Stream(_) => RequestBody::Empty,
        }
    }
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestBody::Empty => write!(f, "RequestBody::Empty"),
            RequestBody::Bytes(b) => write!(f, "RequestBody::Bytes({} bytes)", b.len()),
            RequestBody::Stream(_) => write!(f, "RequestBody::Stream(..)"),
        }
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(v: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(v))
    }
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::Bytes(Bytes::from(s))
    }
}

impl From<&'static [u8]> for RequestBody {
    fn from(v: &'static [u8]) -> Self {
        RequestBody::Bytes(Bytes::from_static(v))
    }
}

impl From<ChunkStream> for RequestBody {
    fn from(stream: ChunkStream) -> Self {
        RequestBody::Stream(Arc::new(Mutex::new(Some(stream))))
    }
}
