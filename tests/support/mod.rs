//! A minimal loopback HTTP server for integration tests: bind to an
//! ephemeral port, spawn a task per accepted connection, hand each one to a
//! caller-supplied handler.

use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

pub struct RequestHead {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
}

impl RequestHead {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Read the request line + headers off `stream`, then drain any body
/// indicated by `Content-Length` (chunked request bodies are not produced
/// by this crate's test suite).
pub async fn read_request(reader: &mut BufReader<TcpStream>) -> RequestHead {
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await.unwrap();
    let request_line = request_line.trim_end().to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        let line = line.trim_end().to_string();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let content_length: usize = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(0);
    if content_length > 0 {
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).await.unwrap();
    }

    RequestHead { request_line, headers }
}

/// Start a loopback server; `handler` is invoked once per accepted
/// connection with a buffered reader/writer pair already set up. Returns
/// the base URL (`http://127.0.0.1:PORT`).
pub async fn spawn_server<F, Fut>(handler: F) -> String
where
    F: Fn(BufReader<TcpStream>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let handler = handler.clone();
            tokio::spawn(async move {
                (handler)(BufReader::new(stream)).await;
            });
        }
    });

    format!("http://127.0.0.1:{port}")
}

pub async fn write_response(reader: &mut BufReader<TcpStream>, raw: &[u8]) {
    reader.get_mut().write_all(raw).await.unwrap();
    reader.get_mut().flush().await.unwrap();
}
