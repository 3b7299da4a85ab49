//! A bounded idle-connection pool keyed by (scheme, host, port).

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::conn::Connection;
use crate::uri::ConnectionKey;

/// Max idle connections kept per (scheme, host, port). Connections beyond
/// this are simply dropped (and thus closed) on checkin.
const DEFAULT_MAX_IDLE_PER_HOST: usize = 8;

struct PoolState {
    idle: HashMap<ConnectionKey, VecDeque<Connection>>,
    max_idle_per_host: usize,
    closed: bool,
}

/// Shared owner of idle connections across a `Client`'s lifetime. Hostnames
/// are never shared across different scheme/host/port triples (no
/// cross-hostname pool sharing).
pub struct Pool {
    state: Mutex<PoolState>,
}

impl Pool {
    /// `max_idle_per_host == 0` disables pooling entirely: every checkout
    /// misses and every checkin is a no-op, which is how
    /// `ClientConfig::persistent_connections(false)` is wired.
    pub fn new(max_idle_per_host: usize) -> Arc<Self> {
        Arc::new(Pool {
            state: Mutex::new(PoolState {
                idle: HashMap::new(),
                max_idle_per_host,
                closed: false,
            }),
        })
    }

    pub fn with_default_capacity() -> Arc<Self> {
        Self::new(DEFAULT_MAX_IDLE_PER_HOST)
    }

    /// Take a ready idle connection for this key, if one exists.
    pub async fn checkout(&self, key: &ConnectionKey) -> Option<Connection> {
        let mut state = self.state.lock().await;
        state.idle.get_mut(key).and_then(|deque| deque.pop_front())
    }

    /// Return a connection for reuse. Dropped silently (closing the
    /// socket) if the pool is full, the pool is closed, or the connection
    /// was marked non-reusable by the last round trip.
    pub async fn checkin(&self, conn: Connection) {
        if !conn.reusable {
            return;
        }
        let mut state = self.state.lock().await;
        if state.closed {
            return;
        }
        let deque = state.idle.entry(conn.key.clone()).or_default();
        if deque.len() < state.max_idle_per_host {
            deque.push_back(conn);
        }
    }

    /// Drop all idle connections and refuse further checkins. Existing
    /// checked-out connections finish their in-flight round trip but are
    /// not returned.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        state.closed = true;
        state.idle.clear();
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uri::Scheme;

    fn key(host: &str) -> ConnectionKey {
        ConnectionKey {
            scheme: Scheme::Http,
            host: host.to_string(),
            port: 80,
        }
    }

    #[tokio::test]
    async fn checkout_returns_none_when_empty() {
        let pool = Pool::with_default_capacity();
        assert!(pool.checkout(&key("example.com")).await.is_none());
    }

    #[tokio::test]
    async fn shutdown_clears_idle_and_blocks_future_checkins() {
        let pool = Pool::with_default_capacity();
        pool.shutdown().await;
        assert!(pool.is_closed().await);
    }
}
