//! Drives one request/response round trip over a pooled connection:
//! acquire, write head + body, parse status/headers, then fork into a
//! materialized or streaming response.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;

use crate::body::{ChunkStream, RequestBody};
use crate::conn::Connection;
use crate::cookie::CookieJar;
use crate::error::Error;
use crate::pool::Pool;
use crate::request::Request;
use crate::resolver::Resolver;
use crate::response::{MaterializedResponse, Response, StreamingResponse};
use crate::tls::TlsConfig;
use crate::wire;
use crate::wire::chunked::ChunkedReader;
use crate::wire::response::BodyFraming;

/// Timeouts applied at each of the three blocking points in a round trip.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub connect: Duration,
    pub write: Duration,
    pub read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            connect: Duration::from_secs(10),
            write: Duration::from_secs(30),
            read: Duration::from_secs(30),
        }
    }
}

pub struct Transport {
    pool: Arc<Pool>,
    resolver: Arc<dyn Resolver>,
    tls: TlsConfig,
    timeouts: Timeouts,
    jar: Option<Arc<CookieJar>>,
}

impl Transport {
    pub fn new(
        pool: Arc<Pool>,
        resolver: Arc<dyn Resolver>,
        tls: TlsConfig,
        timeouts: Timeouts,
        jar: Option<Arc<CookieJar>>,
    ) -> Self {
        Transport {
            pool,
            resolver,
            tls,
            timeouts,
            jar,
        }
    }

    /// Execute `req` and materialize the whole body into memory.
    pub async fn send(&self, req: Arc<Request>) -> Result<Response, Error> {
        let response = self.round_trip(req, false).await?;
        Ok(response)
    }

    /// Execute `req` but expose the body as a lazily-read chunk stream.
    pub async fn send_streaming(&self, req: Arc<Request>) -> Result<Response, Error> {
        let response = self.round_trip(req, true).await?;
        Ok(response)
    }

    async fn round_trip(&self, req: Arc<Request>, want_stream: bool) -> Result<Response, Error> {
        let key = req.uri.connection_key();

        let mut conn = match self.pool.checkout(&key).await {
            Some(c) => c,
            None => {
                timeout(
                    self.timeouts.connect,
                    Connection::connect(&key, self.resolver.as_ref(), &self.tls),
                )
                .await
                .map_err(|_| Error::Timeout)??
            }
        };

        if let Err(e) = self.write_request(&mut conn, &req).await {
            conn.reusable = false;
            return Err(e);
        }

        let head = match timeout(self.timeouts.read, read_head(&mut conn)).await {
            Ok(Ok(head)) => head,
            Ok(Err(e)) => {
                conn.reusable = false;
                return Err(e);
            }
            Err(_) => {
                conn.reusable = false;
                return Err(Error::Timeout);
            }
        };

        let framing = wire::response::determine_framing(req.method, head.status.code, &head.headers)?;
        let keep_alive = connection_keep_alive(&head.headers, framing);
        conn.reusable = keep_alive;

        if framing == BodyFraming::None {
            self.pool.checkin(conn).await;
            return Ok(Response::Materialized(MaterializedResponse {
                status: head.status.code,
                status_message: head.status.reason,
                headers: head.headers,
                body: Bytes::new(),
                request: req,
            }));
        }

        if want_stream {
            let status = head.status.code;
            let status_message = head.status.reason;
            let headers = head.headers;
            let body = make_chunk_stream(conn, framing, self.pool.clone(), self.timeouts.read);
            return Ok(Response::Streaming(StreamingResponse {
                status,
                status_message,
                headers,
                request: req,
                body,
            }));
        }

        let body = timeout(self.timeouts.read, read_body_to_end(&mut conn, framing))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(|e| {
                conn.reusable = false;
                e
            })?;

        self.pool.checkin(conn).await;
        Ok(Response::Materialized(MaterializedResponse {
            status: head.status.code,
            status_message: head.status.reason,
            headers: head.headers,
            body,
            request: req,
        }))
    }

    async fn write_request(&self, conn: &mut Connection, req: &Request) -> Result<(), Error> {
        timeout(self.timeouts.write, async {
            let head = wire::request::serialize_head(req, self.jar.as_deref(), false);
            conn.write_all(head.as_bytes()).await.map_err(Error::write)?;
            self.write_body(conn, &req.body).await?;
            conn.flush().await.map_err(Error::write)
        })
        .await
        .map_err(|_| Error::Timeout)?
    }

    async fn write_body(&self, conn: &mut Connection, body: &RequestBody) -> Result<(), Error> {
        match body {
            RequestBody::Empty => Ok(()),
            RequestBody::Bytes(b) => conn.write_all(b).await.map_err(Error::write),
            RequestBody::Stream(slot) => {
                use futures_util::StreamExt;
                let mut stream = match slot.lock().await.take() {
                    Some(s) => s,
                    None => return Ok(()), // already drained by a prior attempt
                };
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk?;
                    conn.write_all(&wire::request::encode_chunk(&chunk))
                        .await
                        .map_err(Error::write)?;
                }
                conn.write_all(wire::request::encode_final_chunk())
                    .await
                    .map_err(Error::write)
            }
        }
    }
}

struct Head {
    status: wire::response::StatusLine,
    headers: crate::header::HeaderMap,
}

/// Parse the status line and headers, discarding any interim `1xx`
/// responses (e.g. `100 Continue`) and re-reading until a final status.
async fn read_head(conn: &mut Connection) -> Result<Head, Error> {
    loop {
        let status = wire::response::parse_status_line(conn).await?;
        let headers = wire::response::parse_headers(conn).await?;
        if (100..200).contains(&status.code) {
            continue;
        }
        return Ok(Head { status, headers });
    }
}

fn connection_keep_alive(headers: &crate::header::HeaderMap, framing: BodyFraming) -> bool {
    if framing == BodyFraming::UntilClose {
        return false;
    }
    match headers.get("connection") {
        Some(v) => !v.to_ascii_lowercase().contains("close"),
        None => true,
    }
}

async fn read_body_to_end(conn: &mut Connection, framing: BodyFraming) -> Result<Bytes, Error> {
    match framing {
        BodyFraming::None => Ok(Bytes::new()),
        BodyFraming::Chunked => {
            let mut reader = ChunkedReader::new(conn);
            reader.read_to_end().await
        }
        BodyFraming::ContentLength(len) => {
            let mut buf = BytesMut::zeroed(len as usize);
            conn.read_exact(&mut buf).await.map_err(Error::read)?;
            Ok(buf.freeze())
        }
        BodyFraming::UntilClose => {
            let mut buf = Vec::new();
            conn.read_to_end(&mut buf).await.map_err(Error::read)?;
            Ok(Bytes::from(buf))
        }
    }
}

/// Build the async chunk stream for a streaming response. The connection is
/// returned to the pool if the body is drained to completion; dropping the
/// stream before exhaustion simply closes the connection, which is the
/// cheapest correct behavior for an abandoned stream.
fn make_chunk_stream(
    mut conn: Connection,
    framing: BodyFraming,
    pool: Arc<Pool>,
    read_timeout: Duration,
) -> ChunkStream {
    Box::pin(async_stream::try_stream! {
        match framing {
            BodyFraming::None => {}
            BodyFraming::Chunked => {
                loop {
                    let chunk = timeout(read_timeout, async {
                        let mut reader = ChunkedReader::new(&mut conn);
                        reader.next_chunk().await
                    })
                    .await
                    .map_err(|_| Error::Timeout)??;
                    match chunk {
                        Some(bytes) => yield bytes,
                        None => break,
                    }
                }
            }
            BodyFraming::ContentLength(len) => {
                let mut remaining = len;
                let mut buf = vec![0u8; 8192];
                while remaining > 0 {
                    let want = buf.len().min(remaining as usize);
                    let n = timeout(read_timeout, conn.read(&mut buf[..want]))
                        .await
                        .map_err(|_| Error::Timeout)?
                        .map_err(Error::read)?;
                    if n == 0 {
                        Err(Error::protocol("connection closed before Content-Length was satisfied"))?;
                    }
                    remaining -= n as u64;
                    yield Bytes::copy_from_slice(&buf[..n]);
                }
            }
            BodyFraming::UntilClose => {
                let mut buf = vec![0u8; 8192];
                loop {
                    let n = timeout(read_timeout, conn.read(&mut buf))
                        .await
                        .map_err(|_| Error::Timeout)?
                        .map_err(Error::read)?;
                    if n == 0 {
                        break;
                    }
                    yield Bytes::copy_from_slice(&buf[..n]);
                }
                conn.reusable = false;
            }
        }
        if conn.reusable {
            pool.checkin(conn).await;
        }
    })
}
