//! Minecraft Server List Ping probe over TCP.
//!
//! Performs the handshake (next state `status`) followed by an empty status
//! request, then decodes the JSON document carried by the status response.

use std::net::SocketAddr;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, lookup_host};

use super::varint::{decode_varint, frame, read_varint, write_string, write_varint};
use crate::status::domain::{ServerAddress, ServerStatus};
use crate::status::ports::{GameStatusProbe, ProbeError, ProbeResult};

/// Protocol version sent in the handshake; servers answer status queries
/// regardless of the client version.
pub const DEFAULT_PROTOCOL_VERSION: u32 = 47;

const HANDSHAKE_PACKET_ID: u32 = 0x00;
const STATUS_PACKET_ID: u32 = 0x00;
const NEXT_STATE_STATUS: u32 = 1;
const MAX_RESPONSE_LEN: u32 = 1 << 20;

#[derive(Debug, Deserialize)]
struct StatusDto {
    version: VersionDto,
    players: PlayersDto,
    #[serde(default)]
    description: Option<DescriptionDto>,
}

#[derive(Debug, Deserialize)]
struct VersionDto {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PlayersDto {
    online: u32,
    max: u32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DescriptionDto {
    Plain(String),
    Component(ComponentDto),
}

#[derive(Debug, Deserialize)]
struct ComponentDto {
    #[serde(default)]
    text: String,
    #[serde(default)]
    extra: Vec<DescriptionDto>,
}

impl DescriptionDto {
    fn append_text(&self, out: &mut String) {
        match self {
            Self::Plain(text) => out.push_str(text),
            Self::Component(component) => {
                out.push_str(&component.text);
                for child in &component.extra {
                    child.append_text(out);
                }
            }
        }
    }
}

/// Status probe speaking the Server List Ping protocol.
#[derive(Debug, Clone, Copy)]
pub struct ServerListPingProbe {
    protocol_version: u32,
}

impl Default for ServerListPingProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerListPingProbe {
    /// Creates a probe that announces [`DEFAULT_PROTOCOL_VERSION`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            protocol_version: DEFAULT_PROTOCOL_VERSION,
        }
    }

    /// Overrides the announced protocol version.
    #[must_use]
    pub const fn with_protocol_version(mut self, protocol_version: u32) -> Self {
        self.protocol_version = protocol_version;
        self
    }
}

#[async_trait]
impl GameStatusProbe for ServerListPingProbe {
    async fn query(&self, address: &ServerAddress) -> ProbeResult<ServerStatus> {
        let candidates = resolve(address).await?;
        let mut stream = connect_any(address, &candidates).await?;

        let request = status_request(address, self.protocol_version)
            .ok_or_else(|| ProbeError::protocol(address, "host name too long to frame"))?;
        stream
            .write_all(&request)
            .await
            .map_err(|err| ProbeError::connection(address, err))?;

        let payload = read_packet(&mut stream).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::InvalidData {
                ProbeError::protocol(address, err.to_string())
            } else {
                ProbeError::connection(address, err)
            }
        })?;
        parse_status_packet(&payload).map_err(|reason| ProbeError::protocol(address, reason))
    }
}

async fn resolve(address: &ServerAddress) -> ProbeResult<Vec<SocketAddr>> {
    let resolve_error = |cause: std::io::Error| ProbeError::Resolve {
        address: address.clone(),
        cause: cause.into(),
    };
    let candidates: Vec<SocketAddr> = lookup_host((address.host(), address.port()))
        .await
        .map_err(resolve_error)?
        .collect();
    if candidates.is_empty() {
        return Err(resolve_error(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no addresses found",
        )));
    }
    Ok(candidates)
}

async fn connect_any(address: &ServerAddress, candidates: &[SocketAddr]) -> ProbeResult<TcpStream> {
    let mut last_error = None;
    for candidate in candidates {
        match TcpStream::connect(*candidate).await {
            Ok(stream) => return Ok(stream),
            Err(err) => last_error = Some(err),
        }
    }
    Err(ProbeError::connection(
        address,
        last_error.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses to connect to")
        }),
    ))
}

fn status_request(address: &ServerAddress, protocol_version: u32) -> Option<Vec<u8>> {
    let mut handshake = Vec::with_capacity(address.host().len().saturating_add(16));
    write_varint(HANDSHAKE_PACKET_ID, &mut handshake);
    write_varint(protocol_version, &mut handshake);
    write_string(address.host(), &mut handshake)?;
    handshake.extend_from_slice(&port_bytes(address.port()));
    write_varint(NEXT_STATE_STATUS, &mut handshake);

    let mut request = frame(&handshake)?;
    let mut status = Vec::with_capacity(1);
    write_varint(STATUS_PACKET_ID, &mut status);
    request.extend(frame(&status)?);
    Some(request)
}

#[expect(
    clippy::big_endian_bytes,
    reason = "the handshake carries the port as an unsigned big-endian short"
)]
const fn port_bytes(port: u16) -> [u8; 2] {
    port.to_be_bytes()
}

async fn read_packet(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let len = read_varint(stream).await?;
    if len == 0 || len > MAX_RESPONSE_LEN {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("unexpected status packet length {len}"),
        ));
    }
    let capacity = usize::try_from(len)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    let mut payload = vec![0_u8; capacity];
    stream.read_exact(&mut payload).await?;
    Ok(payload)
}

fn parse_status_packet(payload: &[u8]) -> Result<ServerStatus, String> {
    let (packet_id, after_id) =
        decode_varint(payload).ok_or_else(|| "missing packet id".to_owned())?;
    if packet_id != STATUS_PACKET_ID {
        return Err(format!("unexpected packet id {packet_id:#04x}"));
    }
    let (raw_len, after_len) =
        decode_varint(after_id).ok_or_else(|| "missing status length".to_owned())?;
    let json_len = usize::try_from(raw_len).map_err(|err| err.to_string())?;
    let json = after_len
        .get(..json_len)
        .ok_or_else(|| "status document truncated".to_owned())?;
    parse_status_json(json)
}

fn parse_status_json(json: &[u8]) -> Result<ServerStatus, String> {
    let decoded: StatusDto =
        serde_json::from_slice(json).map_err(|err| format!("invalid status JSON: {err}"))?;
    let mut motd = String::new();
    if let Some(description) = &decoded.description {
        description.append_text(&mut motd);
    }
    Ok(ServerStatus {
        version: decoded.version.name,
        online_players: decoded.players.online,
        max_players: decoded.players.max,
        motd,
    })
}
