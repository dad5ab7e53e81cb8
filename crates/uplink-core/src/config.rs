//! Gateway configuration.
//!
//! All settings arrive from the daemon's command line; there is no
//! configuration file and no environment surface beyond log filtering.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Request header carrying the satellite location.
pub const LOCATION_HEADER: &str = "X-Satellite-Location";

/// Default number of compiled satellites kept in the cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Default ceiling on fetched satellite source size, in bytes.
pub const DEFAULT_MAX_SATELLITE_SIZE: usize = 128 * 1024;

/// Default timeout on the upstream fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_PORT: u16 = 8080;

/// Runtime configuration assembled by the daemon at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: SocketAddr,
    /// Maximum number of cached compiled satellites.
    pub cache_capacity: usize,
    /// Maximum declared size of fetched satellite source, in bytes.
    pub max_satellite_size: usize,
    /// Timeout applied to the upstream fetch request.
    pub fetch_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_satellite_size: DEFAULT_MAX_SATELLITE_SIZE,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl GatewayConfig {
    /// Bind address for the given port, optionally restricted to
    /// loopback. The restriction exists for development; some desktop
    /// firewalls prompt on every restart of a wildcard listener.
    pub fn bind(port: u16, local_only: bool) -> SocketAddr {
        let ip = if local_only {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        };
        SocketAddr::new(ip, port)
    }
}
