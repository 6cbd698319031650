//! Minimal Source RCON client for a Minecraft server.
//!
//! Packet layout (little endian): `len:i32 | id:i32 | kind:i32 | body | 0 0`
//! where `len` counts everything after itself.

use std::time::Duration;

use otter_core::config::EXTERNAL_CALL_TIMEOUT_SECS;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{CommandError, Result};

const LOGIN: i32 = 3;
const COMMAND: i32 = 2;
/// Largest packet the server is allowed to send back.
const MAX_PACKET: i32 = 4096 + 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    pub kind: i32,
    pub body: String,
}

pub fn encode(packet: &Packet) -> Vec<u8> {
    let body = packet.body.as_bytes();
    let len = (body.len() + 10) as i32;
    let mut buf = Vec::with_capacity(body.len() + 14);
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(&packet.id.to_le_bytes());
    buf.extend_from_slice(&packet.kind.to_le_bytes());
    buf.extend_from_slice(body);
    buf.extend_from_slice(&[0, 0]);
    buf
}

async fn read_packet(stream: &mut TcpStream) -> Result<Packet> {
    let len = stream.read_i32_le().await.map_err(io_err)?;
    if !(10..=MAX_PACKET).contains(&len) {
        return Err(CommandError::Rcon {
            detail: format!("bad packet length {len}"),
        });
    }
    let id = stream.read_i32_le().await.map_err(io_err)?;
    let kind = stream.read_i32_le().await.map_err(io_err)?;
    let mut rest = vec![0u8; (len - 8) as usize];
    stream.read_exact(&mut rest).await.map_err(io_err)?;
    let body_len = rest.len().saturating_sub(2);
    let body = String::from_utf8_lossy(&rest[..body_len]).into_owned();
    Ok(Packet { id, kind, body })
}

fn io_err(e: std::io::Error) -> CommandError {
    CommandError::Rcon {
        detail: e.to_string(),
    }
}

pub struct RconClient {
    address: String,
    password: String,
    timeout: Duration,
}

impl RconClient {
    pub fn new(address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            password: password.into(),
            timeout: Duration::from_secs(EXTERNAL_CALL_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Log in, run `command`, and return the server's response text.
    pub async fn execute(&self, command: &str) -> Result<String> {
        tokio::time::timeout(self.timeout, self.session(command))
            .await
            .map_err(|_| CommandError::Timeout {
                ms: self.timeout.as_millis() as u64,
            })?
    }

    async fn session(&self, command: &str) -> Result<String> {
        let mut stream = TcpStream::connect(&self.address).await.map_err(io_err)?;

        let login = Packet {
            id: 1,
            kind: LOGIN,
            body: self.password.clone(),
        };
        stream.write_all(&encode(&login)).await.map_err(io_err)?;
        let reply = read_packet(&mut stream).await?;
        if reply.id == -1 {
            return Err(CommandError::Rcon {
                detail: "authentication rejected".to_string(),
            });
        }

        let request = Packet {
            id: 2,
            kind: COMMAND,
            body: command.to_string(),
        };
        stream.write_all(&encode(&request)).await.map_err(io_err)?;
        let reply = read_packet(&mut stream).await?;
        debug!(address = %self.address, bytes = reply.body.len(), "rcon command answered");
        Ok(reply.body)
    }
}
