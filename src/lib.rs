//! An HTTP/1.1 client built directly on non-blocking TCP/TLS: a
//! connection-oriented transport (URI, headers, cookies, wire codec,
//! connection, pool) driven through a composable middleware pipeline
//! (retry, redirect, cookies, decode, authentication, timeout), with both
//! a materialized and a streaming response mode.
//!
//! ```no_run
//! # async fn run() -> Result<(), aioreq_rs::Error> {
//! let client = aioreq_rs::Client::new();
//! let req = client.get("http://example.com/").build()?;
//! let resp = client.send(req).await?;
//! println!("{}", resp.status());
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod client;
pub mod config;
pub mod conn;
pub mod cookie;
pub mod digest;
pub mod error;
pub mod header;
pub mod middleware;
pub mod pool;
pub mod request;
pub mod resolver;
pub mod response;
pub mod tls;
pub mod transport;
pub mod uri;
pub mod wire;

pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, Result};
pub use request::{Method, Request, RequestBuilder};
pub use response::{MaterializedResponse, Response, StreamingResponse};
pub use uri::Uri;
