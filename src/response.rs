//! The `Response` value object: materialized or streaming.

use std::sync::Arc;

use bytes::Bytes;

use crate::body::ChunkStream;
use crate::header::HeaderMap;
use crate::request::Request;

/// A response with its body already read into memory.
pub struct MaterializedResponse {
    pub status: u16,
    pub status_message: String,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub request: Arc<Request>,
}

/// A response whose body is exposed as a lazy chunk stream rather than a
/// single buffer. Dropping the stream before it's drained simply closes
/// the connection it owns, rather than returning it to the pool — see
/// `transport::make_chunk_stream`.
pub struct StreamingResponse {
    pub status: u16,
    pub status_message: String,
    pub headers: HeaderMap,
    pub request: Arc<Request>,
    pub body: ChunkStream,
}

/// Either response shape the transport can hand back.
pub enum Response {
    Materialized(MaterializedResponse),
    Streaming(StreamingResponse),
}

impl Response {
    pub fn status(&self) -> u16 {
        match self {
            Response::Materialized(r) => r.status,
            Response::Streaming(r) => r.status,
        }
    }

    pub fn status_message(&self) -> &str {
        match self {
            Response::Materialized(r) => &r.status_message,
            Response::Streaming(r) => &r.status_message,
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        match self {
            Response::Materialized(r) => &r.headers,
            Response::Streaming(r) => &r.headers,
        }
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        match self {
            Response::Materialized(r) => &mut r.headers,
            Response::Streaming(r) => &mut r.headers,
        }
    }

    pub fn request(&self) -> &Request {
        match self {
            Response::Materialized(r) => &r.request,
            Response::Streaming(r) => &r.request,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status())
    }

    /// Body bytes, for the common case of a materialized response.
    /// Returns `None` for a streaming response — callers must iterate
    /// `StreamingResponse::body` instead.
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Response::Materialized(r) => Some(&r.body),
            Response::Streaming(_) => None,
        }
    }

    pub fn into_materialized(self) -> Option<MaterializedResponse> {
        match self {
            Response::Materialized(r) => Some(r),
            Response::Streaming(_) => None,
        }
    }

    pub fn into_streaming(self) -> Option<StreamingResponse> {
        match self {
            Response::Streaming(r) => Some(r),
            Response::Materialized(_) => None,
        }
    }
}
