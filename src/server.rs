//! Listener glue and per-connection supervision.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::io::BufStream;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ProxyError;
use crate::{handshake, relay, request};

pub struct ProxyServer {
    listener: TcpListener,
}

impl ProxyServer {
    pub async fn bind(config: &Config) -> Result<Self> {
        let listener = TcpListener::bind(&config.bind)
            .await
            .with_context(|| format!("bind {}", config.bind))?;
        info!(
            "listening on {}",
            listener.local_addr().context("local_addr")?
        );
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().context("local_addr")
    }

    /// Accepts forever. Accept errors are logged and the loop continues;
    /// each accepted socket runs on its own task with no state shared
    /// across connections.
    pub async fn serve(self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((socket, source)) => {
                    debug!("connected from {}", source);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(socket).await {
                            warn!("{}: {}", source, e);
                        }
                    });
                }
                Err(e) => warn!("accept error: {}", e),
            }
        }
    }
}

/// Per-connection supervisor: handshake, then request resolution, then the
/// relay, strictly in that order. Both sockets are owned here and closed by
/// drop on every exit path, whether the session failed mid-handshake or ran
/// a full relay.
async fn handle_connection(socket: TcpStream) -> Result<(), ProxyError> {
    let mut client = BufStream::new(socket);
    handshake::negotiate(&mut client).await?;
    let server = request::resolve(&mut client).await?;
    let mut server = BufStream::new(server);
    let (sent, received) = relay::relay(&mut client, &mut server).await?;
    debug!("session done, {} bytes sent, {} bytes received", sent, received);
    Ok(())
}
