//! Ingests `Set-Cookie` from responses into the shared jar. Attaching the
//! `Cookie:` header on the way out happens lower down, in
//! `wire::request::serialize_head`, which the transport already threads
//! the jar into — this middleware only needs to handle the response side.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cookie::CookieJar;
use crate::error::Error;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

#[derive(Debug)]
pub struct CookieMiddleware {
    jar: Arc<CookieJar>,
}

impl CookieMiddleware {
    pub fn new(jar: Arc<CookieJar>) -> Self {
        CookieMiddleware { jar }
    }
}

#[async_trait]
impl Middleware for CookieMiddleware {
    async fn handle(&self, req: Arc<Request>, next: Next<'_>) -> Result<Response, Error> {
        let resp = next.run(req).await?;
        self.jar.ingest(resp.headers(), resp.request().uri.host());
        Ok(resp)
    }
}
