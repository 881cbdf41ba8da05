use std::io;

use thiserror::Error;

use crate::addr::TargetAddress;

/// Terminal error kinds for a proxy session. None of these are retried:
/// every variant ends the connection it occurred on.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("unsupported SOCKS version: {0}")]
    VersionMismatch(u8),
    #[error("malformed frame: {0}")]
    Protocol(&'static str),
    #[error("unsupported address type: {0}")]
    UnsupportedAddressType(u8),
    #[error("unsupported command: {0}")]
    UnsupportedCommand(u8),
    #[error("no acceptable auth method, client offered {0:?}")]
    NoAcceptableAuthMethod(Vec<u8>),
    #[error("failed to connect to {target}: {source}")]
    Dial {
        target: TargetAddress,
        source: io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
