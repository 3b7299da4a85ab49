//! A single connection: a boxed async stream (plain TCP or TLS-over-TCP),
//! plus the bookkeeping needed to know whether it can be returned to the
//! pool after a round trip.

use std::pin::Pin;
use std::task::{Context, Poll};

use rustls_pki_types::ServerName;
use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, BufReader, ReadBuf};
use tokio::net::TcpStream;

use crate::error::Error;
use crate::resolver::Resolver;
use crate::tls::TlsConfig;
use crate::uri::{ConnectionKey, Scheme};

/// Either a plain TCP stream or a TLS stream over one, behind a single
/// `AsyncRead + AsyncWrite` façade so the rest of the crate never has to
/// branch on scheme again after connect time.
enum Stream {
    Plain(TcpStream),
    Tls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl AsyncRead for Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Stream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Stream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Stream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Stream::Plain(s) => Pin::new(s).poll_flush(cx),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Stream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// A connected socket, ready to carry one or more request/response round
/// trips. Buffered so header parsing can use `AsyncBufRead` line reads.
pub struct Connection {
    stream: BufReader<Stream>,
    pub key: ConnectionKey,
    /// Set once a response signals the connection must not be reused
    /// (e.g. `Connection: close`, `UntilClose` framing, or a protocol
    /// error mid-stream).
    pub reusable: bool,
}

impl Connection {
    pub async fn connect(
        key: &ConnectionKey,
        resolver: &dyn Resolver,
        tls: &TlsConfig,
    ) -> Result<Self, Error> {
        let addrs = resolver.resolve(&key.host, key.port).await?;
        let mut last_err = None;
        let mut tcp = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(s) => {
                    tcp = Some(s);
                    break;
                }
                Err(e) => last_err = Some(e),
            }
        }
        let tcp = tcp.ok_or_else(|| {
            Error::connect(last_err.unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotConnected, "no addresses tried")
            }))
        })?;
        let _ = tcp.set_nodelay(true);

        let stream = match key.scheme {
            Scheme::Http => Stream::Plain(tcp),
            Scheme::Https => {
                let connector = tls.connector()?;
                let name = ServerName::try_from(key.host.clone())
                    .map_err(|_| Error::connect_msg(format!("invalid DNS name: {}", key.host)))?;
                let tls_stream = connector
                    .connect(name, tcp)
                    .await
                    .map_err(Error::tls)?;
                Stream::Tls(Box::new(tls_stream))
            }
        };

        Ok(Connection {
            stream: BufReader::new(stream),
            key: key.clone(),
            reusable: true,
        })
    }

}

impl AsyncRead for Connection {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().stream).poll_read(cx, buf)
    }
}

impl AsyncBufRead for Connection {
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<&[u8]>> {
        Pin::new(&mut self.get_mut().stream).poll_fill_buf(cx)
    }

    fn consume(self: Pin<&mut Self>, amt: usize) {
        Pin::new(&mut self.get_mut().stream).consume(amt)
    }
}

impl AsyncWrite for Connection {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(self.get_mut().stream.get_mut()).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(self.get_mut().stream.get_mut()).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(self.get_mut().stream.get_mut()).poll_shutdown(cx)
    }
}
