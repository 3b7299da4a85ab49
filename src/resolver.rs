//! Pluggable hostname resolution behind a `Resolver` trait, so callers can
//! swap in a custom DNS strategy without touching the transport.

use std::fmt::Debug;
use std::net::SocketAddr;

use async_trait::async_trait;

use crate::error::Error;

/// A pluggable name resolver. The default implementation defers entirely
/// to the OS resolver via `tokio::net::lookup_host`.
#[async_trait]
pub trait Resolver: Debug + Send + Sync {
    async fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>, Error>;
}

#[derive(Debug, Default)]
pub struct DefaultResolver;

#[async_trait]
impl Resolver for DefaultResolver {
    async fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>, Error> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
            .await
            .map_err(Error::connect)?
            .collect();
        if addrs.is_empty() {
            return Err(Error::ConnectError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no addresses for {host}"),
            )));
        }
        Ok(addrs)
    }
}
