//! Method negotiation: reads one client greeting and answers with a
//! two-byte method selection. Only "no authentication" is ever offered
//! back; anything else is rejected with `0xFF`.

use tracing::debug;

use crate::codec::{ClientGreeting, RW, SOCKS_AUTH_NO_ACCEPTABLE, SOCKS_AUTH_NONE, SOCKS_VER_5};
use crate::error::ProxyError;

/// Runs the greeting exchange on `socket`.
///
/// A greeting with the wrong version byte is dropped without a reply, the
/// peer is assumed non-conformant. A single greeting is read; there is no
/// corrective retry for a malformed one.
pub async fn negotiate<IO: RW>(socket: &mut IO) -> Result<(), ProxyError> {
    let greeting = ClientGreeting::read_from(socket).await?;
    if greeting.version != SOCKS_VER_5 {
        return Err(ProxyError::VersionMismatch(greeting.version));
    }
    if !greeting.methods.contains(&SOCKS_AUTH_NONE) {
        socket
            .write_all(&[SOCKS_VER_5, SOCKS_AUTH_NO_ACCEPTABLE])
            .await?;
        socket.flush().await?;
        return Err(ProxyError::NoAcceptableAuthMethod(greeting.methods));
    }
    socket.write_all(&[SOCKS_VER_5, SOCKS_AUTH_NONE]).await?;
    socket.flush().await?;
    debug!("negotiated no-auth, client offered {:?}", greeting.methods);
    Ok(())
}
