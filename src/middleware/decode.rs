//! Applies `Content-Encoding` decompression to a response body after the
//! transport hands back raw wire bytes: one-shot for a materialized body,
//! incrementally for a streaming one.

use std::sync::Arc;

use async_stream::try_stream;
use async_trait::async_trait;

use crate::error::Error;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;
use crate::wire::encoding::{decode_all, parse_content_encoding, StreamingDecoder};

#[derive(Debug, Default)]
pub struct DecodeMiddleware;

#[async_trait]
impl Middleware for DecodeMiddleware {
    async fn handle(&self, req: Arc<Request>, next: Next<'_>) -> Result<Response, Error> {
        let resp = next.run(req).await?;
        match resp {
            Response::Materialized(mut m) => {
                let codings = parse_content_encoding(&m.headers)?;
                if !codings.is_empty() {
                    m.body = decode_all(m.body, &codings)?;
                    m.headers.remove("content-encoding");
                    m.headers.remove("content-length");
                }
                Ok(Response::Materialized(m))
            }
            Response::Streaming(mut s) => {
                let codings = parse_content_encoding(&s.headers)?;
                if codings.is_empty() {
                    return Ok(Response::Streaming(s));
                }
                s.headers.remove("content-encoding");
                s.headers.remove("content-length");
                let mut decoder = StreamingDecoder::new(&codings);
                let mut inner = s.body;
                s.body = Box::pin(try_stream! {
                    use futures_util::StreamExt;
                    while let Some(chunk) = inner.next().await {
                        let chunk = chunk?;
                        yield decoder.feed(chunk)?;
                    }
                });
                Ok(Response::Streaming(s))
            }
        }
    }
}
