//! The user-facing `Client`: `get/post/put/delete/patch/head/options/send`,
//! plus `stream` for the streaming response mode.

use std::sync::Arc;

use log::trace;

use crate::config::{ClientConfig, ClientConfigBuilder};
use crate::cookie::CookieJar;
use crate::error::Error;
use crate::middleware::auth::AuthenticationMiddleware;
use crate::middleware::cookies::CookieMiddleware;
use crate::middleware::decode::DecodeMiddleware;
use crate::middleware::redirect::RedirectMiddleware;
use crate::middleware::retry::RetryMiddleware;
use crate::middleware::timeout::TimeoutMiddleware;
use crate::middleware::{Middleware, Next};
use crate::pool::Pool;
use crate::request::{Method, Request, RequestBuilder};
use crate::response::Response;
use crate::transport::Transport;

struct ClientState {
    config: ClientConfig,
    pool: Arc<Pool>,
    jar: Arc<CookieJar>,
    transport: Transport,
    chain: Vec<Arc<dyn Middleware>>,
}

/// A cheap-to-clone handle: clones share the connection pool, cookie jar,
/// and middleware chain via an `Arc` around the shared state.
#[derive(Clone)]
pub struct Client {
    state: Arc<ClientState>,
}

impl Client {
    pub fn new() -> Self {
        Client::with_config(ClientConfig::default())
    }

    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let pool = Pool::new(if config.persistent_connections {
            config.max_idle_per_host
        } else {
            0
        });
        let jar = Arc::new(CookieJar::new());
        let transport = Transport::new(
            pool.clone(),
            config.resolver.clone(),
            config.tls.clone(),
            config.timeouts,
            Some(jar.clone()),
        );

        let chain: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(TimeoutMiddleware::new(config.default_timeout)),
            Arc::new(RetryMiddleware::new(config.max_retries).allow_non_idempotent(config.allow_non_idempotent_retry)),
            Arc::new(RedirectMiddleware::new(config.max_redirects)),
            Arc::new(AuthenticationMiddleware::new()),
            Arc::new(CookieMiddleware::new(jar.clone())),
            Arc::new(DecodeMiddleware),
        ];

        Client {
            state: Arc::new(ClientState {
                config,
                pool,
                jar,
                transport,
                chain,
            }),
        }
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::Get, url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(Method::Post, url)
    }

    pub fn put(&self, url: &str) -> RequestBuilder {
        self.request(Method::Put, url)
    }

    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.request(Method::Delete, url)
    }

    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.request(Method::Patch, url)
    }

    pub fn head(&self, url: &str) -> RequestBuilder {
        self.request(Method::Head, url)
    }

    pub fn options(&self, url: &str) -> RequestBuilder {
        self.request(Method::Options, url)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = RequestBuilder::new(method, url);
        for (name, value) in self.state.config.default_headers.iter() {
            builder = builder.header(name.to_string(), value.to_string());
        }
        builder
    }

    /// Run a fully-built request, materializing the response body.
    pub async fn send(&self, req: Request) -> Result<Response, Error> {
        trace!("sending {} {}", req.method.as_str(), req.uri);
        let req = Arc::new(req);
        let next = Next::new(&self.state.chain, &self.state.transport, false);
        next.run(req).await
    }

    /// Run a fully-built request, exposing the body as a lazily-read
    /// stream instead of materializing it.
    pub async fn stream(&self, req: Request) -> Result<Response, Error> {
        trace!("streaming {} {}", req.method.as_str(), req.uri);
        let req = Arc::new(req);
        let next = Next::new(&self.state.chain, &self.state.transport, true);
        next.run(req).await
    }

    pub fn cookie_jar(&self) -> &CookieJar {
        &self.state.jar
    }

    /// Drop all idle pooled connections and refuse to pool any more.
    /// Existing in-flight requests finish normally.
    pub async fn close(&self) {
        self.state.pool.shutdown().await;
    }
}

impl Default for Client {
    fn default() -> Self {
        Client::new()
    }
}
