//! socksd-rs
//!
//! A small SOCKS5 proxy server: no-auth handshake, CONNECT only, then a
//! transparent bidirectional byte relay until both sides drain.

pub mod addr;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod handshake;
pub mod relay;
pub mod request;
pub mod server;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export commonly used types for convenience
pub use addr::TargetAddress;
pub use config::Config;
pub use error::ProxyError;
pub use server::ProxyServer;
