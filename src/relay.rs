//! Bidirectional byte relay between two established streams. Each
//! direction copies independently; a finished direction half-closes its
//! write side and the relay returns only once both have completed.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::error::ProxyError;

const BUFFER_SIZE: usize = 65536;

async fn copy_stream<R, W>(mut r: R, rn: &str, mut w: W, wn: &str) -> Result<u64, ProxyError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let len = r.read(&mut buf).await?;
        if len == 0 {
            break;
        }
        let mut pos = 0;
        while pos < len {
            let n = w.write(&buf[pos..len]).await?;
            pos += n;
        }
        w.flush().await?;
        total += len as u64;
    }
    trace!("{} reached eof, shutting down {}", rn, wn);
    w.shutdown().await?;
    Ok(total)
}

/// Copies bytes both ways until both directions have drained.
///
/// The relay only borrows the streams; closing them is the caller's job.
/// One direction hitting end-of-stream or an error never cancels the
/// other, so a half-closed peer keeps receiving until its counterpart
/// also finishes. Returns the byte counts (client to server, server to
/// client); if a direction failed, its error surfaces only after both
/// are done.
pub async fn relay<A, B>(client: &mut A, server: &mut B) -> Result<(u64, u64), ProxyError>
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let (cread, cwrite) = tokio::io::split(&mut *client);
    let (sread, swrite) = tokio::io::split(&mut *server);
    let copy_c2s = copy_stream(cread, "client", swrite, "server");
    let copy_s2c = copy_stream(sread, "server", cwrite, "client");
    tokio::pin!(copy_c2s);
    tokio::pin!(copy_s2c);

    let mut c2s = None;
    let mut s2c = None;
    while c2s.is_none() || s2c.is_none() {
        tokio::select! {
            ret = (&mut copy_c2s), if c2s.is_none() => {
                debug!("client to server direction finished");
                c2s = Some(ret);
            }
            ret = (&mut copy_s2c), if s2c.is_none() => {
                debug!("server to client direction finished");
                s2c = Some(ret);
            }
        }
    }
    let sent = c2s.unwrap()?;
    let received = s2c.unwrap()?;
    Ok((sent, received))
}
