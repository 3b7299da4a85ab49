//! Enforces the request's total time budget, set via
//! `RequestBuilder::timeout` or the client's default. This wraps the rest
//! of the chain (connect/write/read timeouts are enforced individually,
//! deeper, by the transport) rather than replacing them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use crate::error::Error;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

#[derive(Debug)]
pub struct TimeoutMiddleware {
    default_timeout: Option<Duration>,
}

impl TimeoutMiddleware {
    pub fn new(default_timeout: Option<Duration>) -> Self {
        TimeoutMiddleware { default_timeout }
    }
}

#[async_trait]
impl Middleware for TimeoutMiddleware {
    async fn handle(&self, req: Arc<Request>, next: Next<'_>) -> Result<Response, Error> {
        match req.timeout.or(self.default_timeout) {
            Some(budget) => timeout(budget, next.run(req)).await.map_err(|_| Error::Timeout)?,
            None => next.run(req).await,
        }
    }
}
