//! The middleware pipeline: dyn-dispatched, index-walking chain. A
//! `Middleware` trait plus a `Next` holding the remaining slice of `Arc<dyn
//! Middleware>`; the terminal call falls through to the underlying
//! transport. Adapted to `async fn` via `async-trait`, the way
//! `reqwest-middleware` does for the same dyn-incompatible-native-async-trait
//! problem.

pub mod auth;
pub mod cookies;
pub mod decode;
pub mod redirect;
pub mod retry;
pub mod timeout;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::transport::Transport;

/// A single pipeline stage. `handle` is called with the request and a
/// `Next` that continues the chain; a middleware may inspect/modify the
/// request before calling `next.run(req)`, and inspect/modify the response
/// after.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, req: Arc<Request>, next: Next<'_>) -> Result<Response, Error>;
}

/// The remaining suffix of the chain, plus the transport the chain
/// eventually bottoms out in.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    transport: &'a Transport,
    streaming: bool,
}

impl<'a> Next<'a> {
    pub fn new(chain: &'a [Arc<dyn Middleware>], transport: &'a Transport, streaming: bool) -> Self {
        Next {
            chain,
            transport,
            streaming,
        }
    }

    pub async fn run(self, req: Arc<Request>) -> Result<Response, Error> {
        match self.chain.split_first() {
            Some((head, rest)) => {
                let next = Next {
                    chain: rest,
                    transport: self.transport,
                    streaming: self.streaming,
                };
                head.handle(req, next).await
            }
            None => {
                if self.streaming {
                    self.transport.send_streaming(req).await
                } else {
                    self.transport.send(req).await
                }
            }
        }
    }
}
