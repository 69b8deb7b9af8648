//! VarInt framing shared by the Minecraft handshake and status packets.
//!
//! Values are unsigned here; the protocol's signed VarInts are never
//! negative for the fields the status exchange uses.

use tokio::io::{AsyncRead, AsyncReadExt};

/// Longest encoding of a 32-bit VarInt.
pub const MAX_VARINT_LEN: usize = 5;

/// Appends `value` as a VarInt.
pub fn write_varint(value: u32, out: &mut Vec<u8>) {
    let mut remaining = value;
    loop {
        let low = u8::try_from(remaining & 0x7F).unwrap_or_default();
        remaining >>= 7;
        if remaining == 0 {
            out.push(low);
            return;
        }
        out.push(low | 0x80);
    }
}

/// Appends a VarInt-length-prefixed UTF-8 string.
///
/// Returns `None` when the string is too long to frame.
pub fn write_string(value: &str, out: &mut Vec<u8>) -> Option<()> {
    let len = u32::try_from(value.len()).ok()?;
    write_varint(len, out);
    out.extend_from_slice(value.as_bytes());
    Some(())
}

/// Prefixes `packet` with its VarInt length.
pub fn frame(packet: &[u8]) -> Option<Vec<u8>> {
    let len = u32::try_from(packet.len()).ok()?;
    let mut framed = Vec::with_capacity(packet.len().saturating_add(MAX_VARINT_LEN));
    write_varint(len, &mut framed);
    framed.extend_from_slice(packet);
    Some(framed)
}

/// Decodes a VarInt from the front of `bytes`, returning it with the rest.
pub fn decode_varint(bytes: &[u8]) -> Option<(u32, &[u8])> {
    let mut value = 0_u32;
    for (index, byte) in bytes.iter().take(MAX_VARINT_LEN).enumerate() {
        value |= u32::from(byte & 0x7F) << (7 * index);
        if byte & 0x80 == 0 {
            return Some((value, bytes.get(index + 1..)?));
        }
    }
    None
}

/// Reads a VarInt from an async stream.
///
/// # Errors
///
/// Propagates read errors, and reports an over-long encoding as
/// [`std::io::ErrorKind::InvalidData`].
pub async fn read_varint<R>(reader: &mut R) -> std::io::Result<u32>
where
    R: AsyncRead + Unpin,
{
    let mut value = 0_u32;
    for index in 0..MAX_VARINT_LEN {
        let byte = reader.read_u8().await?;
        value |= u32::from(byte & 0x7F) << (7 * index);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        "VarInt longer than five bytes",
    ))
}
