//! Protocol codec
//!
//! Framing for requests and replies. The same frames are what a remote
//! transport would put on the socket; in-process transports can use them
//! too to keep the message contract honest.
//!
//! ## Wire Format
//!
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Kind (1) │ Len (4)  │      bincode payload        │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! - Request kind: the request type byte (0x01..=0x04)
//! - Reply kind: 0x81 write reply, 0x82 get reply
//! - Length is big-endian

use std::io::{Read, Write};

use bytes::{BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{QuillError, Result};

use super::{Reply, Request, RequestType};

/// Header size: 1 byte kind + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (64 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 64 * 1024 * 1024;

const WRITE_REPLY_KIND: u8 = 0x81;
const GET_REPLY_KIND: u8 = 0x82;

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request frame
pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
    frame(request.request_type() as u8, request)
}

/// Decode a request frame
///
/// The kind byte, the header's discriminator, and the body must all agree.
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    let (kind, payload) = unframe(bytes)?;

    let expected = RequestType::from_u8(kind).ok_or_else(|| {
        QuillError::ProtocolSerialization(format!("Unknown request kind: 0x{:02x}", kind))
    })?;

    let request: Request = decode_payload(payload)?;
    if request.request_type() != expected || !request.is_consistent() {
        return Err(QuillError::ProtocolSerialization(format!(
            "Request kind mismatch: frame says {:?}, header says {:?}, body is {:?}",
            expected,
            request.request_type(),
            request.body.request_type()
        )));
    }

    Ok(request)
}

// =============================================================================
// Reply Encoding/Decoding
// =============================================================================

/// Encode a reply frame
pub fn encode_reply(reply: &Reply) -> Result<Vec<u8>> {
    let kind = match reply {
        Reply::Write(_) => WRITE_REPLY_KIND,
        Reply::Get(_) => GET_REPLY_KIND,
    };
    frame(kind, reply)
}

/// Decode a reply frame
pub fn decode_reply(bytes: &[u8]) -> Result<Reply> {
    let (kind, payload) = unframe(bytes)?;
    if kind != WRITE_REPLY_KIND && kind != GET_REPLY_KIND {
        return Err(QuillError::ProtocolSerialization(format!(
            "Unknown reply kind: 0x{:02x}",
            kind
        )));
    }

    let reply: Reply = decode_payload(payload)?;
    let matches = matches!(
        (&reply, kind),
        (Reply::Write(_), WRITE_REPLY_KIND) | (Reply::Get(_), GET_REPLY_KIND)
    );
    if !matches {
        return Err(QuillError::ProtocolSerialization(
            "Reply kind does not match its payload".to_string(),
        ));
    }

    Ok(reply)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete request from a stream
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    decode_request(&read_frame(reader)?)
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    writer.write_all(&encode_request(request)?)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete reply from a stream
pub fn read_reply<R: Read>(reader: &mut R) -> Result<Reply> {
    decode_reply(&read_frame(reader)?)
}

/// Write a reply to a stream
pub fn write_reply<W: Write>(writer: &mut W, reply: &Reply) -> Result<()> {
    writer.write_all(&encode_reply(reply)?)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Private Helpers
// =============================================================================

fn frame<T: Serialize>(kind: u8, message: &T) -> Result<Vec<u8>> {
    let payload = bincode::serialize(message)
        .map_err(|e| QuillError::ProtocolSerialization(e.to_string()))?;

    if payload.len() > MAX_PAYLOAD_SIZE as usize {
        return Err(QuillError::ProtocolSerialization(format!(
            "Payload too large: {} bytes (max {})",
            payload.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    buf.put_u8(kind);
    buf.put_u32(payload.len() as u32);
    buf.put_slice(&payload);
    Ok(buf.to_vec())
}

fn unframe(bytes: &[u8]) -> Result<(u8, &[u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(QuillError::ProtocolSerialization(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let kind = bytes[0];
    let payload_len = payload_len(&bytes[..HEADER_SIZE])?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(QuillError::ProtocolSerialization(format!(
            "Incomplete payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    Ok((kind, &bytes[HEADER_SIZE..total_len]))
}

fn payload_len(header: &[u8]) -> Result<usize> {
    let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
    if len > MAX_PAYLOAD_SIZE {
        return Err(QuillError::ProtocolSerialization(format!(
            "Payload too large: {} bytes (max {})",
            len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(len as usize)
}

fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    bincode::deserialize(payload).map_err(|e| QuillError::ProtocolSerialization(e.to_string()))
}

fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let len = payload_len(&header)?;

    let mut message = Vec::with_capacity(HEADER_SIZE + len);
    message.extend_from_slice(&header);
    message.resize(HEADER_SIZE + len, 0);
    if len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }
    Ok(message)
}
