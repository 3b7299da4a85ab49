//! Reactive authentication: credentials are withheld until a `401`
//! challenge arrives, then retried once with either `Basic` or `Digest`
//! depending on what the server's `WWW-Authenticate` offers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::digest::{basic_auth_value, build_authorization_header, generate_cnonce, DigestChallenge};
use crate::error::Error;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

#[derive(Default)]
struct NonceState {
    nonce: String,
    count: u32,
}

/// Tracks the digest nonce-use counter per (host, realm) so repeated
/// requests to the same realm keep incrementing `nc` rather than reusing
/// one, across the lifetime of a `Client`.
#[derive(Default)]
pub struct AuthenticationMiddleware {
    nonce_state: Mutex<HashMap<(String, String), NonceState>>,
}

impl AuthenticationMiddleware {
    pub fn new() -> Self {
        AuthenticationMiddleware::default()
    }
}

impl std::fmt::Debug for AuthenticationMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationMiddleware").finish()
    }
}

#[async_trait]
impl Middleware for AuthenticationMiddleware {
    async fn handle(&self, req: Arc<Request>, next: Next<'_>) -> Result<Response, Error> {
        let resp = next.run(req.clone()).await?;
        if resp.status() != 401 || req.explicit_authorization {
            return Ok(resp);
        }
        let Some((user, pass)) = req.auth.clone() else {
            return Ok(resp);
        };

        let challenges = resp
            .headers()
            .get_all("www-authenticate")
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        if challenges.is_empty() {
            return Ok(resp);
        }

        let authorization = if let Some(digest_header) =
            challenges.iter().find(|c| c.trim_start().starts_with("Digest"))
        {
            self.digest_authorization(digest_header, &user, &pass, &req).await?
        } else if challenges.iter().any(|c| c.trim_start().starts_with("Basic")) {
            basic_auth_value(&user, &pass)
        } else {
            return Ok(resp);
        };

        let mut retried = req.with_uri(req.uri.clone(), true);
        retried.headers.set("Authorization", authorization)?;
        retried.explicit_authorization = true;

        next.run(Arc::new(retried)).await
    }
}

impl AuthenticationMiddleware {
    async fn digest_authorization(
        &self,
        header: &str,
        user: &str,
        pass: &str,
        req: &Request,
    ) -> Result<String, Error> {
        let challenge = DigestChallenge::parse(header)?;
        let key = (req.uri.host().to_string(), challenge.realm.clone());

        let mut states = self.nonce_state.lock().await;
        let state = states.entry(key).or_default();
        if state.nonce != challenge.nonce {
            state.nonce = challenge.nonce.clone();
            state.count = 0;
        }
        state.count += 1;
        let nc = state.count;
        drop(states);

        let cnonce = generate_cnonce();
        build_authorization_header(
            &challenge,
            user,
            pass,
            req.method.as_str(),
            &req.uri.request_target(),
            &body_bytes_for_digest(&req.body),
            &cnonce,
            nc,
        )
    }
}

/// The bytes to hash for `qop=auth-int`. Only a fully-buffered `Bytes` body
/// has a known byte sequence available here without consuming it; a
/// streaming body falls back to an empty hash, matching the one-shot-drain
/// limitation that already applies to replaying a streamed body at all.
fn body_bytes_for_digest(body: &crate::body::RequestBody) -> Vec<u8> {
    match body {
        crate::body::RequestBody::Bytes(b) => b.to_vec(),
        _ => Vec::new(),
    }
}
