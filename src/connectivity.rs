//! # Connectivity Self-Test
//!
//! A plain TCP connect to a well-known host. It runs once at start-up and
//! again whenever fetches keep failing. A failed probe is fatal: the process
//! exits with an error and the service supervisor restarts the sign, since
//! a wedged network stack does not recover in-process.

use log::error;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;

/// No route to the probe host.
#[derive(Error, Debug)]
#[error("no connectivity to {host}: {source}")]
pub struct ConnectivityLoss {
    pub host: String,
    #[source]
    pub source: io::Error,
}

/// Something that can tell whether the network is usable.
#[allow(async_fn_in_trait)]
pub trait Reachability {
    async fn probe(&self) -> Result<(), ConnectivityLoss>;
}

/// Connects to `host` and immediately closes the connection.
#[derive(Clone, Debug)]
pub struct TcpProbe {
    host: String,
    timeout: Duration,
}

impl TcpProbe {
    /// `host` is `address:port`, e.g. `1.1.1.1:80`.
    pub fn new(host: impl Into<String>, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            timeout,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl Reachability for TcpProbe {
    async fn probe(&self) -> Result<(), ConnectivityLoss> {
        let result = match tokio::time::timeout(self.timeout, TcpStream::connect(&self.host)).await
        {
            Ok(connected) => connected.map(drop),
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no answer within {:?}", self.timeout),
            )),
        };

        result.map_err(|source| {
            error!("Connectivity test to {} failed: {}", self.host, source);
            ConnectivityLoss {
                host: self.host.clone(),
                source,
            }
        })
    }
}
