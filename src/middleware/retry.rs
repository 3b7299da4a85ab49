//! Retries transport-level failures (connect/read/write/timeout) a bounded
//! number of times. Off for non-idempotent methods unless explicitly
//! opted in.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::time::sleep;

use crate::error::Error;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// Fixed delay between retry attempts.
const RETRY_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug)]
pub struct RetryMiddleware {
    max_attempts: u32,
    allow_non_idempotent: AtomicBool,
}

impl RetryMiddleware {
    pub fn new(max_attempts: u32) -> Self {
        RetryMiddleware {
            max_attempts,
            allow_non_idempotent: AtomicBool::new(false),
        }
    }

    pub fn allow_non_idempotent(self, allow: bool) -> Self {
        self.allow_non_idempotent.store(allow, Ordering::Relaxed);
        self
    }
}

impl Default for RetryMiddleware {
    fn default() -> Self {
        RetryMiddleware::new(3)
    }
}

#[async_trait]
impl Middleware for RetryMiddleware {
    async fn handle(&self, req: Arc<Request>, next: Next<'_>) -> Result<Response, Error> {
        let retryable_method =
            req.method.is_idempotent() || self.allow_non_idempotent.load(Ordering::Relaxed);

        if !retryable_method {
            return next.run(req).await;
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match next.run(req.clone()).await {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_retriable() && attempt < self.max_attempts => {
                    debug!("retrying after attempt {attempt} failed: {e}");
                    sleep(RETRY_DELAY).await;
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
