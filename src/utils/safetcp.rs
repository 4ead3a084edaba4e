//! Length-prefixed message framing over TCP and bind helpers.

use std::net::SocketAddr;

use rmp_serde::decode::from_slice as decode_from_slice;
use rmp_serde::encode::to_vec as encode_to_vec;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::{self, Duration};

use crate::utils::ReplikvError;

/// Receives a message of type `T` from a TCP readable connection. A message
/// is framed as an 8-byte big-endian length followed by its MessagePack
/// encoding.
pub(crate) async fn recv_msg<T, Conn>(conn: &mut Conn) -> Result<T, ReplikvError>
where
    T: DeserializeOwned,
    Conn: AsyncReadExt + Unpin,
{
    let msg_len = conn.read_u64().await?; // receive length first
    let mut msg_buf: Vec<u8> = vec![0; msg_len as usize];
    conn.read_exact(&mut msg_buf[..]).await?;
    let msg = decode_from_slice(&msg_buf)?;
    Ok(msg)
}

/// Sends a message of type `T` through a TCP writable connection, framed the
/// same way `recv_msg` expects.
pub(crate) async fn send_msg<T, Conn>(
    conn: &mut Conn,
    msg: &T,
) -> Result<(), ReplikvError>
where
    T: Serialize,
    Conn: AsyncWriteExt + Unpin,
{
    let msg_bytes = encode_to_vec(msg)?;
    conn.write_u64(msg_bytes.len() as u64).await?; // send length first
    conn.write_all(&msg_bytes[..]).await?;
    conn.flush().await?;
    Ok(())
}

/// Wrapper over tokio `TcpListener::bind()` that provides a retrying logic.
pub(crate) async fn tcp_bind_with_retry(
    bind_addr: SocketAddr,
    mut retries: u8,
) -> Result<TcpListener, ReplikvError> {
    loop {
        match TcpListener::bind(bind_addr).await {
            Ok(listener) => return Ok(listener),
            Err(err) => {
                if retries == 0 {
                    return Err(err.into());
                }
                retries -= 1;
                time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}
