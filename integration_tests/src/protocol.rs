//! Host side of the CP board frame protocol.
//!
//! Frames are fixed-size records: a 4-byte header followed by a 4-byte
//! payload, or a 16-byte payload for long reports and labels. There is no
//! delimiter, so the reader needs to know how long the reply will be.

use anyhow::Result;

/// Version tag carried by data and command frames
pub const DATA_VERSION: u8 = 0x66;

pub const HEADER_SIZE: usize = 4;
pub const SHORT_FRAME_SIZE: usize = 8;
pub const LONG_FRAME_SIZE: usize = 20;

/// Sensor id of identification and error frames
pub const ID_PKT_CODE: u8 = 0xFF;
pub const CORE_VERSION_ID: u8 = 0x10;
pub const WRAPPER_VERSION_ID: u8 = 0x11;

/// Fixed payload of a handshake reply
pub const HANDSHAKE_PAYLOAD: [u8; 4] = [0x12, 0xEF, 0xCD, 0xAB];

/// First payload byte of the unknown-type error
pub const PACKET_ERROR_CODE: u8 = 0xEE;

/// Message type codes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    IdPacket = 0x10,
    CommandPacket = 0x11,
    ConfirmCommand = 0x12,
    RequestData = 0x13,
    ReportData = 0x14,
    RequestLabel = 0x15,
    ReportLabel = 0x16,
    ReportError = 0x17,
    Handshake = 0x18,
}

impl MessageType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x10 => Some(Self::IdPacket),
            0x11 => Some(Self::CommandPacket),
            0x12 => Some(Self::ConfirmCommand),
            0x13 => Some(Self::RequestData),
            0x14 => Some(Self::ReportData),
            0x15 => Some(Self::RequestLabel),
            0x16 => Some(Self::ReportLabel),
            0x17 => Some(Self::ReportError),
            0x18 => Some(Self::Handshake),
            _ => None,
        }
    }
}

/// A frame received from the node
#[derive(Debug, Clone)]
pub struct Reply {
    pub version: u8,
    pub message_type: Option<MessageType>,
    pub raw_type: u8,
    pub size: u8,
    pub sensor_id: u8,
    pub payload: Vec<u8>,
}

impl Reply {
    /// Payload read as 16-bit slots, high byte first
    pub fn slots(&self) -> Vec<u16> {
        self.payload
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect()
    }

    /// Payload as text, for labels
    pub fn label(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Build a short request frame
pub fn build_request(message_type: u8, sensor_id: u8, payload: [u8; 4]) -> [u8; SHORT_FRAME_SIZE] {
    let mut frame = [0u8; SHORT_FRAME_SIZE];
    frame[0] = DATA_VERSION;
    frame[1] = message_type;
    frame[2] = SHORT_FRAME_SIZE as u8;
    frame[3] = sensor_id;
    frame[HEADER_SIZE..].copy_from_slice(&payload);
    frame
}

/// Command frame carrying two 16-bit parameters
pub fn build_command(sensor_id: u8, first: u16, second: u16) -> [u8; SHORT_FRAME_SIZE] {
    let [a, b] = first.to_be_bytes();
    let [c, d] = second.to_be_bytes();
    build_request(MessageType::CommandPacket as u8, sensor_id, [a, b, c, d])
}

pub fn build_request_data(sensor_id: u8) -> [u8; SHORT_FRAME_SIZE] {
    build_request(MessageType::RequestData as u8, sensor_id, [0; 4])
}

pub fn build_request_label(sensor_id: u8) -> [u8; SHORT_FRAME_SIZE] {
    build_request(MessageType::RequestLabel as u8, sensor_id, [0; 4])
}

pub fn build_handshake() -> [u8; SHORT_FRAME_SIZE] {
    build_request(MessageType::Handshake as u8, 0x00, [0; 4])
}

/// Parse a reply; the size byte must agree with the bytes received
pub fn parse_reply(data: &[u8]) -> Result<Reply> {
    if data.len() < HEADER_SIZE {
        anyhow::bail!("Reply too short: {} bytes", data.len());
    }
    let size = data[2];
    if size as usize != data.len() {
        anyhow::bail!("Size byte {} does not match {} bytes received", size, data.len());
    }

    Ok(Reply {
        version: data[0],
        message_type: MessageType::from_byte(data[1]),
        raw_type: data[1],
        size,
        sensor_id: data[3],
        payload: data[HEADER_SIZE..].to_vec(),
    })
}
