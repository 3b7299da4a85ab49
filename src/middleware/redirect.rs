//! Follows `3xx` redirects up to a fixed budget. `303` always rewrites to
//! `GET` and drops the body; `301`/`302` do the same only when the original
//! method was `POST`; `307`/`308` preserve method and body. A redirect that
//! crosses origin (scheme, host, or port changes) strips `Authorization` and
//! `Cookie` from the replayed request.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::error::Error;
use crate::middleware::{Middleware, Next};
use crate::request::{Method, Request};
use crate::response::Response;

#[derive(Debug)]
pub struct RedirectMiddleware {
    max_redirects: u32,
}

impl RedirectMiddleware {
    pub fn new(max_redirects: u32) -> Self {
        RedirectMiddleware { max_redirects }
    }
}

impl Default for RedirectMiddleware {
    fn default() -> Self {
        RedirectMiddleware::new(10)
    }
}

fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

#[async_trait]
impl Middleware for RedirectMiddleware {
    async fn handle(&self, req: Arc<Request>, next: Next<'_>) -> Result<Response, Error> {
        let mut current = req;
        loop {
            let resp = next.run(current.clone()).await?;
            let status = resp.status();
            if !is_redirect(status) {
                return Ok(resp);
            }

            let location = match resp.headers().get("location") {
                Some(loc) => loc.to_string(),
                None => return Ok(resp),
            };

            if current.redirect_budget == 0 {
                return Err(Error::TooManyRedirects);
            }

            let new_uri = current.uri.resolve(&location)?;
            debug!("redirecting {} -> {new_uri}", current.uri);

            let cross_origin = new_uri.scheme() != current.uri.scheme()
                || !new_uri.host().eq_ignore_ascii_case(current.uri.host())
                || new_uri.port() != current.uri.port();

            // 307/308 preserve method and body; 303 always rewrites to GET,
            // 301/302 only when the original method was POST.
            let rewrite_to_get =
                status == 303 || (matches!(status, 301 | 302) && current.method == Method::Post);

            let mut next_req = current.with_uri(new_uri, !rewrite_to_get);
            next_req.redirect_budget = current.redirect_budget.saturating_sub(1).min(self.max_redirects);

            if rewrite_to_get {
                next_req.method = Method::Get;
                next_req.headers.remove("content-length");
                next_req.headers.remove("content-type");
            } else {
                next_req.method = current.method;
            }

            if cross_origin {
                next_req.headers.remove("authorization");
                next_req.headers.remove("cookie");
                next_req.auth = None;
                next_req.explicit_authorization = false;
            }

            current = Arc::new(next_req);
        }
    }
}
