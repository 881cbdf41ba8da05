//! CONNECT resolution: reads the request that follows a successful
//! handshake, dials the destination, and answers with a reply frame.
//! Every failure mode past the request header leaves a best-effort reply
//! on the client stream before the error is returned.

use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::codec::{
    read_target, Reply, RequestHead, RW, SOCKS_CMD_CONNECT,
    SOCKS_REPLY_ADDRESS_NOT_SUPPORTED, SOCKS_REPLY_COMMAND_NOT_SUPPORTED,
    SOCKS_REPLY_GENERAL_FAILURE, SOCKS_VER_5,
};
use crate::error::ProxyError;

/// Reads one CONNECT request from `socket` and returns the established
/// destination stream. The success reply carries the local address of the
/// outbound socket.
///
/// A request with the wrong version byte gets no reply, matching the
/// greeting-stage behavior; unsupported commands and address types are
/// answered with their protocol status codes before the connection dies.
pub async fn resolve<IO: RW>(socket: &mut IO) -> Result<TcpStream, ProxyError> {
    let head = RequestHead::read_from(socket).await?;
    if head.version != SOCKS_VER_5 {
        return Err(ProxyError::VersionMismatch(head.version));
    }
    if head.cmd != SOCKS_CMD_CONNECT {
        write_failure(socket, SOCKS_REPLY_COMMAND_NOT_SUPPORTED).await;
        return Err(ProxyError::UnsupportedCommand(head.cmd));
    }
    let target = match read_target(socket, head.atyp).await {
        Ok(target) => target,
        Err(e @ ProxyError::UnsupportedAddressType(_)) => {
            write_failure(socket, SOCKS_REPLY_ADDRESS_NOT_SUPPORTED).await;
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    debug!("connecting to {}", target);
    let server = match target.connect_tcp().await {
        Ok(server) => server,
        Err(e) => {
            write_failure(socket, SOCKS_REPLY_GENERAL_FAILURE).await;
            return Err(ProxyError::Dial { target, source: e });
        }
    };

    let local = server.local_addr()?;
    Reply::success(local).write_to(socket).await?;
    debug!("connected to {}, bound {}", target, local);
    Ok(server)
}

// The transport may already be broken by the time a failure reply goes
// out, so its own write error is not escalated.
async fn write_failure<IO: RW>(socket: &mut IO, status: u8) {
    if let Some(e) = Reply::failure(status).write_to(socket).await.err() {
        warn!("failed to send reply: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufStream};
    use tokio::net::TcpListener;
    use tokio_test::io::Builder;

    #[test(tokio::test)]
    async fn rejects_unknown_command() {
        let stream = Builder::new()
            .read(&[5, 3, 0, 1])
            .write(&[5, 7, 0, 1, 0, 0, 0, 0, 0, 0])
            .build();
        let mut stream = BufReader::new(stream);
        let err = resolve(&mut stream).await.unwrap_err();
        assert!(matches!(err, ProxyError::UnsupportedCommand(3)));
    }

    #[test(tokio::test)]
    async fn rejects_unknown_address_type() {
        // the port bytes are never read
        let stream = Builder::new()
            .read(&[5, 1, 0, 2])
            .write(&[5, 8, 0, 1, 0, 0, 0, 0, 0, 0])
            .build();
        let mut stream = BufReader::new(stream);
        let err = resolve(&mut stream).await.unwrap_err();
        assert!(matches!(err, ProxyError::UnsupportedAddressType(2)));
    }

    #[test(tokio::test)]
    async fn version_mismatch_sends_nothing() {
        let stream = Builder::new().read(&[4, 1, 0, 1]).build();
        let mut stream = BufReader::new(stream);
        let err = resolve(&mut stream).await.unwrap_err();
        assert!(matches!(err, ProxyError::VersionMismatch(4)));
    }

    #[test(tokio::test)]
    async fn connects_and_reports_local_address() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = tokio::spawn(async move { listener.accept().await.unwrap().1 });

        let (near, far) = tokio::io::duplex(256);
        let far = tokio::spawn(async move {
            let mut far = BufStream::new(far);
            let mut request = vec![5, 1, 0, 1, 127, 0, 0, 1];
            request.extend(addr.port().to_be_bytes());
            far.write_all(&request).await.unwrap();
            far.flush().await.unwrap();
            let mut reply = [0u8; 10];
            far.read_exact(&mut reply).await.unwrap();
            reply
        });

        let mut near = BufStream::new(near);
        let server = resolve(&mut near).await.unwrap();
        assert_eq!(server.peer_addr().unwrap(), addr);

        let reply = far.await.unwrap();
        assert_eq!(&reply[..4], &[5, 0, 0, 1]);
        assert_eq!(&reply[4..8], &[127, 0, 0, 1]);
        assert_eq!(
            u16::from_be_bytes([reply[8], reply[9]]),
            server.local_addr().unwrap().port()
        );
        // the destination really accepted the dial
        assert_eq!(accepted.await.unwrap(), server.local_addr().unwrap());
    }

    #[test(tokio::test)]
    async fn dial_failure_sends_general_failure() {
        // grab a free port, then close it so the dial is refused
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (near, far) = tokio::io::duplex(256);
        let far = tokio::spawn(async move {
            let mut far = BufStream::new(far);
            let mut request = vec![5, 1, 0, 1, 127, 0, 0, 1];
            request.extend(addr.port().to_be_bytes());
            far.write_all(&request).await.unwrap();
            far.flush().await.unwrap();
            let mut reply = [0u8; 10];
            far.read_exact(&mut reply).await.unwrap();
            reply
        });

        let mut near = BufStream::new(near);
        let err = resolve(&mut near).await.unwrap_err();
        assert!(matches!(err, ProxyError::Dial { .. }), "{:?}", err);
        assert_eq!(far.await.unwrap(), [5, 5, 0, 1, 0, 0, 0, 0, 0, 0]);
    }
}
