//! Length-prefixed JSON frames over any async byte stream.

use bytes::{BufMut, BytesMut};
use gavel_core::wire::{self, FRAME_HEADER_LEN, MAX_FRAME_LEN};
use gavel_core::TransportError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Read one frame. `Ok(None)` means the peer closed the stream cleanly
/// between frames; a close inside the header is a protocol error.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, TransportError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut header = [0u8; FRAME_HEADER_LEN];
    let mut filled = 0;
    while filled < FRAME_HEADER_LEN {
        let n = reader
            .read(&mut header[filled..])
            .await
            .map_err(|e| TransportError::Protocol(e.to_string()))?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(TransportError::Protocol(format!(
                "truncated frame header ({filled} of {FRAME_HEADER_LEN} bytes)"
            )));
        }
        filled += n;
    }
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(TransportError::Protocol(format!(
            "frame of {len} bytes exceeds limit of {MAX_FRAME_LEN}"
        )));
    }

    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| TransportError::Protocol(format!("truncated frame: {e}")))?;

    wire::decode(&payload)
        .map(Some)
        .map_err(|e| TransportError::Protocol(format!("malformed payload: {e}")))
}

/// Write one frame and flush.
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = wire::encode(value).map_err(|e| TransportError::Protocol(e.to_string()))?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(TransportError::Protocol(format!(
            "frame of {} bytes exceeds limit of {MAX_FRAME_LEN}",
            payload.len()
        )));
    }

    let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.put_slice(&payload);

    writer
        .write_all(&buf)
        .await
        .map_err(|e| TransportError::Protocol(e.to_string()))?;
    writer
        .flush()
        .await
        .map_err(|e| TransportError::Protocol(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_core::wire::{Request, Response};
    use tokio::io::duplex;

    #[tokio::test]
    async fn frames_survive_a_stream_back_to_back() {
        let (mut client, mut server) = duplex(4096);
        write_frame(&mut client, &Request::QueryMembership).await.unwrap();
        write_frame(&mut client, &Response::Ack).await.unwrap();
        drop(client);

        let first: Option<Request> = read_frame(&mut server).await.unwrap();
        assert_eq!(first, Some(Request::QueryMembership));
        let second: Option<Response> = read_frame(&mut server).await.unwrap();
        assert_eq!(second, Some(Response::Ack));
        let eof: Option<Response> = read_frame(&mut server).await.unwrap();
        assert_eq!(eof, None);
    }

    #[tokio::test]
    async fn close_inside_header_is_a_protocol_error() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&[0u8, 0]).await.unwrap();
        drop(client);
        let result: Result<Option<Request>, _> = read_frame(&mut server).await;
        assert!(matches!(result, Err(TransportError::Protocol(_))));
    }

    #[tokio::test]
    async fn close_before_any_byte_is_clean() {
        let (client, mut server) = duplex(64);
        drop(client);
        let result: Option<Request> = read_frame(&mut server).await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn header_is_big_endian_length() {
        let (mut client, mut server) = duplex(4096);
        write_frame(&mut client, &Response::Ack).await.unwrap();
        drop(client);

        let mut raw = Vec::new();
        server.read_to_end(&mut raw).await.unwrap();
        let body = br#"{"kind":"ack"}"#;
        assert_eq!(&raw[..4], &(body.len() as u32).to_be_bytes());
        assert_eq!(&raw[4..], body);
    }

    #[tokio::test]
    async fn oversized_header_is_rejected() {
        let (mut client, mut server) = duplex(64);
        client
            .write_all(&((MAX_FRAME_LEN as u32) + 1).to_be_bytes())
            .await
            .unwrap();
        let result: Result<Option<Request>, _> = read_frame(&mut server).await;
        assert!(matches!(result, Err(TransportError::Protocol(_))));
    }

    #[tokio::test]
    async fn garbage_payload_is_a_protocol_error() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&3u32.to_be_bytes()).await.unwrap();
        client.write_all(b"{{{").await.unwrap();
        let result: Result<Option<Request>, _> = read_frame(&mut server).await;
        assert!(matches!(result, Err(TransportError::Protocol(_))));
    }
}
