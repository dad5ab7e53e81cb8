//! HTTP server loop.
//!
//! Binds a TCP listener and serves connections with hyper HTTP/1.1,
//! one spawned task per connection, until the shutdown signal flips.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::gateway::Gateway;

/// The gateway's HTTP listener.
pub struct GatewayServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    gateway: Arc<Gateway>,
}

impl GatewayServer {
    /// Bind the listener. Binding is separate from serving so callers
    /// asking for port 0 can learn the bound address before traffic
    /// arrives.
    pub async fn bind(addr: SocketAddr, gateway: Arc<Gateway>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .context("failed to bind gateway listener")?;
        let local_addr = listener.local_addr().context("listener has no local addr")?;
        Ok(Self {
            listener,
            local_addr,
            gateway,
        })
    }

    /// The address actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept and serve connections until `shutdown` changes.
    pub async fn serve(self, mut shutdown: tokio::sync::watch::Receiver<bool>) -> anyhow::Result<()> {
        info!(addr = %self.local_addr, "gateway listening");

        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    let (stream, peer_addr) = accept_result.context("accept failed")?;
                    let gateway = self.gateway.clone();

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let svc = service_fn(move |req| {
                            let gateway = gateway.clone();
                            async move {
                                Ok::<_, Infallible>(gateway.handle(req).await)
                            }
                        });

                        if let Err(e) = http1::Builder::new()
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(%peer_addr, error = %e, "connection error");
                        }
                    });
                }
                _ = shutdown.changed() => {
                    info!("gateway shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}
