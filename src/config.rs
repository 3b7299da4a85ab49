//! Client configuration: timeouts, TLS behavior, pool sizing, retry/redirect
//! budgets, default headers.

use std::sync::Arc;
use std::time::Duration;

use crate::header::HeaderMap;
use crate::resolver::{DefaultResolver, Resolver};
use crate::tls::TlsConfig;
use crate::transport::Timeouts;

#[derive(Clone)]
pub struct ClientConfig {
    pub timeouts: Timeouts,
    pub default_timeout: Option<Duration>,
    pub tls: TlsConfig,
    pub max_idle_per_host: usize,
    pub max_redirects: u32,
    pub max_retries: u32,
    pub allow_non_idempotent_retry: bool,
    pub persistent_connections: bool,
    pub default_headers: HeaderMap,
    pub resolver: Arc<dyn Resolver>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("timeouts", &self.timeouts)
            .field("default_timeout", &self.default_timeout)
            .field("max_idle_per_host", &self.max_idle_per_host)
            .field("max_redirects", &self.max_redirects)
            .field("max_retries", &self.max_retries)
            .field("persistent_connections", &self.persistent_connections)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            timeouts: Timeouts::default(),
            default_timeout: None,
            tls: TlsConfig::default(),
            max_idle_per_host: 8,
            max_redirects: 10,
            max_retries: 3,
            allow_non_idempotent_retry: false,
            persistent_connections: true,
            default_headers: HeaderMap::new(),
            resolver: Arc::new(DefaultResolver),
        }
    }
}

pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        ClientConfigBuilder {
            config: ClientConfig::default(),
        }
    }

    pub fn connect_timeout(mut self, d: Duration) -> Self {
        self.config.timeouts.connect = d;
        self
    }

    pub fn write_timeout(mut self, d: Duration) -> Self {
        self.config.timeouts.write = d;
        self
    }

    pub fn read_timeout(mut self, d: Duration) -> Self {
        self.config.timeouts.read = d;
        self
    }

    pub fn request_timeout(mut self, d: Duration) -> Self {
        self.config.default_timeout = Some(d);
        self
    }

    pub fn verify_peer(mut self, verify: bool) -> Self {
        self.config.tls.verify_peer = verify;
        self
    }

    pub fn check_hostname(mut self, check: bool) -> Self {
        self.config.tls.verify_hostname = check;
        self
    }

    pub fn keylog_filename(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.config.tls.keylog_filename = Some(path.into());
        self
    }

    pub fn max_idle_per_host(mut self, n: usize) -> Self {
        self.config.max_idle_per_host = n;
        self
    }

    pub fn max_redirects(mut self, n: u32) -> Self {
        self.config.max_redirects = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn allow_non_idempotent_retry(mut self, allow: bool) -> Self {
        self.config.allow_non_idempotent_retry = allow;
        self
    }

    pub fn persistent_connections(mut self, enabled: bool) -> Self {
        self.config.persistent_connections = enabled;
        self
    }

    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.config.default_headers.add(name, value);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.config.resolver = resolver;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        ClientConfigBuilder::new()
    }
}
