//! Wire codec for the SOCKS5 frames this server speaks: the client
//! greeting, the method selection, the CONNECT request and the fixed
//! ten-byte reply.

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};

use tokio::io::{AsyncBufRead, AsyncReadExt, AsyncWriteExt};

use crate::addr::TargetAddress;
use crate::error::ProxyError;

pub trait RW: AsyncBufRead + AsyncWriteExt + Send + Sync + Unpin {}
impl<T> RW for T where T: AsyncBufRead + AsyncWriteExt + Send + Sync + Unpin {}

pub const SOCKS_VER_5: u8 = 5u8;
pub const SOCKS_CMD_CONNECT: u8 = 1u8;
pub const SOCKS_ATYP_INET4: u8 = 1u8;
pub const SOCKS_ATYP_DOMAIN: u8 = 3u8;
pub const SOCKS_ATYP_INET6: u8 = 4u8;
pub const SOCKS_AUTH_NONE: u8 = 0u8;
pub const SOCKS_AUTH_NO_ACCEPTABLE: u8 = 0xffu8;
pub const SOCKS_REPLY_OK: u8 = 0u8;
pub const SOCKS_REPLY_GENERAL_FAILURE: u8 = 5u8;
pub const SOCKS_REPLY_COMMAND_NOT_SUPPORTED: u8 = 7u8;
pub const SOCKS_REPLY_ADDRESS_NOT_SUPPORTED: u8 = 8u8;

/// `[VER][NMETHODS][METHODS...]`, read once at connection start.
#[derive(Debug, Eq, PartialEq)]
pub struct ClientGreeting {
    pub version: u8,
    pub methods: Vec<u8>,
}

impl ClientGreeting {
    pub async fn read_from<IO: RW>(socket: &mut IO) -> Result<Self, ProxyError> {
        let version = socket.read_u8().await?;
        let n = socket.read_u8().await?;
        let mut methods = vec![0; n as usize];
        socket.read_exact(&mut methods).await.map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                ProxyError::Protocol("truncated method list")
            } else {
                e.into()
            }
        })?;
        Ok(Self { version, methods })
    }
}

/// The fixed part of a request: `[VER][CMD][RSV][ATYP]`. The address and
/// port that follow are decoded separately so the caller can reject an
/// unsupported command before touching the address bytes.
#[derive(Debug, Eq, PartialEq)]
pub struct RequestHead {
    pub version: u8,
    pub cmd: u8,
    pub atyp: u8,
}

impl RequestHead {
    pub async fn read_from<IO: RW>(socket: &mut IO) -> Result<Self, ProxyError> {
        let version = socket.read_u8().await?;
        let cmd = socket.read_u8().await?;
        let _rsv = socket.read_u8().await?;
        let atyp = socket.read_u8().await?;
        Ok(Self { version, cmd, atyp })
    }
}

/// Reads the address and big-endian port for the given address type.
pub async fn read_target<IO: RW>(socket: &mut IO, atyp: u8) -> Result<TargetAddress, ProxyError> {
    match atyp {
        SOCKS_ATYP_INET4 => {
            let dst = socket.read_u32().await?;
            let dport = socket.read_u16().await?;
            Ok((dst, dport).into())
        }
        SOCKS_ATYP_DOMAIN => {
            let domain = read_length_and_string(socket).await?;
            let dport = socket.read_u16().await?;
            Ok(TargetAddress::DomainPort(domain, dport))
        }
        SOCKS_ATYP_INET6 => {
            let mut dst = [0u8; 16];
            socket.read_exact(&mut dst).await?;
            let dport = socket.read_u16().await?;
            Ok((dst, dport).into())
        }
        _ => Err(ProxyError::UnsupportedAddressType(atyp)),
    }
}

/// `[VER][REP][RSV][ATYP=1][BND.ADDR(4)][BND.PORT(2)]`, always ten bytes.
///
/// Only IPv4 bound addresses are representable; anything else degrades to
/// a zero-filled address field. Failure replies carry no address at all.
#[derive(Debug, Eq, PartialEq)]
pub struct Reply {
    pub status: u8,
    pub bind: Option<SocketAddr>,
}

impl Reply {
    pub fn success(bind: SocketAddr) -> Self {
        Self {
            status: SOCKS_REPLY_OK,
            bind: Some(bind),
        }
    }

    pub fn failure(status: u8) -> Self {
        Self { status, bind: None }
    }

    pub async fn write_to<IO: RW>(&self, socket: &mut IO) -> Result<(), ProxyError> {
        let (addr, port) = match &self.bind {
            Some(bind) => {
                let addr = match bind.ip() {
                    IpAddr::V4(v4) => v4.octets(),
                    IpAddr::V6(_) => [0u8; 4],
                };
                (addr, bind.port())
            }
            None => ([0u8; 4], 0),
        };
        socket.write_u8(SOCKS_VER_5).await?;
        socket.write_u8(self.status).await?;
        socket.write_u8(0).await?;
        socket.write_u8(SOCKS_ATYP_INET4).await?;
        socket.write_all(&addr).await?;
        socket.write_u16(port).await?;
        socket.flush().await?;
        Ok(())
    }
}

async fn read_length_and_string<IO: RW>(io: &mut IO) -> Result<String, ProxyError> {
    let len = io.read_u8().await?;
    let mut buf = vec![0; len as usize];
    io.read_exact(&mut buf).await.map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            ProxyError::Protocol("truncated domain name")
        } else {
            ProxyError::Io(e)
        }
    })?;
    Ok(String::from_utf8_lossy(&buf).to_string())
}
