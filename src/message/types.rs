use crate::chunk::ChunkHeader;
use crate::message::Command;
use crate::{AmfError, ByteBuffer, ProtocolError, Result};

/// RTMP message type ids as they appear in chunk headers
pub mod type_ids {
    pub const SET_CHUNK_SIZE: u8 = 1;
    pub const ABORT: u8 = 2;
    pub const ACKNOWLEDGEMENT: u8 = 3;
    pub const USER_CONTROL: u8 = 4;
    pub const WINDOW_ACK_SIZE: u8 = 5;
    pub const SET_PEER_BANDWIDTH: u8 = 6;
    pub const AUDIO: u8 = 8;
    pub const VIDEO: u8 = 9;
    pub const DATA_AMF3: u8 = 15;
    pub const COMMAND_AMF3: u8 = 17;
    pub const DATA_AMF0: u8 = 18;
    pub const COMMAND_AMF0: u8 = 20;
}

/// Peer bandwidth limit types
pub mod limit_types {
    pub const HARD: u8 = 0;
    pub const SOFT: u8 = 1;
    pub const DYNAMIC: u8 = 2;
}

/// A fully decoded RTMP message.
///
/// Every inbound chunk body resolves to exactly one of these; dispatch is an
/// exhaustive match, there is no dynamically-typed payload container.
#[derive(Debug, Clone, PartialEq)]
pub enum RtmpMessage {
    SetChunkSize(u32),
    Abort(u32),
    Acknowledgement(u32),
    UserControl(UserControlEvent),
    WindowAckSize(u32),
    SetPeerBandwidth { size: u32, limit_type: u8 },
    Audio(Vec<u8>),
    Video(Vec<u8>),
    Command(Command),
}

/// User control (type 4) events, refined by the 16-bit event type
#[derive(Debug, Clone, PartialEq)]
pub enum UserControlEvent {
    StreamBegin(u32),
    StreamEof(u32),
    StreamDry(u32),
    SetBufferLength { stream_id: u32, buffer_ms: u32 },
    StreamIsRecorded(u32),
    PingRequest(u32),
    PingResponse(u32),
    Unknown { event: u16, data: Vec<u8> },
}

impl RtmpMessage {
    /// Decode a reassembled chunk body into a typed message
    pub fn decode(header: &ChunkHeader, body: &[u8]) -> Result<RtmpMessage> {
        let mut buffer = ByteBuffer::new(body.to_vec());
        match header.message_type {
            type_ids::SET_CHUNK_SIZE => Ok(RtmpMessage::SetChunkSize(buffer.read_u32_be()?)),
            type_ids::ABORT => Ok(RtmpMessage::Abort(buffer.read_u32_be()?)),
            type_ids::ACKNOWLEDGEMENT => {
                Ok(RtmpMessage::Acknowledgement(buffer.read_u32_be()?))
            }
            type_ids::USER_CONTROL => {
                Ok(RtmpMessage::UserControl(UserControlEvent::decode(&mut buffer)?))
            }
            type_ids::WINDOW_ACK_SIZE => Ok(RtmpMessage::WindowAckSize(buffer.read_u32_be()?)),
            type_ids::SET_PEER_BANDWIDTH => Ok(RtmpMessage::SetPeerBandwidth {
                size: buffer.read_u32_be()?,
                limit_type: buffer.read_u8()?,
            }),
            type_ids::AUDIO => Ok(RtmpMessage::Audio(body.to_vec())),
            type_ids::VIDEO => Ok(RtmpMessage::Video(body.to_vec())),
            type_ids::COMMAND_AMF0 => Ok(RtmpMessage::Command(Command::decode(body)?)),
            type_ids::COMMAND_AMF3 => {
                // AMF3 commands carry one format-selector byte, then AMF0
                if body.is_empty() {
                    return Err(AmfError::ShortRead.into());
                }
                Ok(RtmpMessage::Command(Command::decode(&body[1..])?))
            }
            other => Err(ProtocolError::UnsupportedMessageType(other).into()),
        }
    }

    /// Serialize to (message type id, body) for the chunk writer
    pub fn encode(&self) -> Result<(u8, Vec<u8>)> {
        match self {
            RtmpMessage::SetChunkSize(size) => {
                Ok((type_ids::SET_CHUNK_SIZE, size.to_be_bytes().to_vec()))
            }
            RtmpMessage::Abort(csid) => Ok((type_ids::ABORT, csid.to_be_bytes().to_vec())),
            RtmpMessage::Acknowledgement(seq) => {
                Ok((type_ids::ACKNOWLEDGEMENT, seq.to_be_bytes().to_vec()))
            }
            RtmpMessage::UserControl(event) => Ok((type_ids::USER_CONTROL, event.encode()?)),
            RtmpMessage::WindowAckSize(size) => {
                Ok((type_ids::WINDOW_ACK_SIZE, size.to_be_bytes().to_vec()))
            }
            RtmpMessage::SetPeerBandwidth { size, limit_type } => {
                let mut body = size.to_be_bytes().to_vec();
                body.push(*limit_type);
                Ok((type_ids::SET_PEER_BANDWIDTH, body))
            }
            RtmpMessage::Audio(payload) => Ok((type_ids::AUDIO, payload.clone())),
            RtmpMessage::Video(payload) => Ok((type_ids::VIDEO, payload.clone())),
            RtmpMessage::Command(command) => Ok((type_ids::COMMAND_AMF0, command.encode()?)),
        }
    }

    /// Short name for logs and state-machine errors
    pub fn kind(&self) -> &'static str {
        match self {
            RtmpMessage::SetChunkSize(_) => "SetChunkSize",
            RtmpMessage::Abort(_) => "Abort",
            RtmpMessage::Acknowledgement(_) => "Acknowledgement",
            RtmpMessage::UserControl(_) => "UserControl",
            RtmpMessage::WindowAckSize(_) => "WindowAckSize",
            RtmpMessage::SetPeerBandwidth { .. } => "SetPeerBandwidth",
            RtmpMessage::Audio(_) => "Audio",
            RtmpMessage::Video(_) => "Video",
            RtmpMessage::Command(_) => "Command",
        }
    }
}

impl UserControlEvent {
    fn decode(buffer: &mut ByteBuffer) -> Result<UserControlEvent> {
        let event = buffer.read_u16_be()?;
        Ok(match event {
            0 => UserControlEvent::StreamBegin(buffer.read_u32_be()?),
            1 => UserControlEvent::StreamEof(buffer.read_u32_be()?),
            2 => UserControlEvent::StreamDry(buffer.read_u32_be()?),
            3 => UserControlEvent::SetBufferLength {
                stream_id: buffer.read_u32_be()?,
                buffer_ms: buffer.read_u32_be()?,
            },
            4 => UserControlEvent::StreamIsRecorded(buffer.read_u32_be()?),
            6 => UserControlEvent::PingRequest(buffer.read_u32_be()?),
            7 => UserControlEvent::PingResponse(buffer.read_u32_be()?),
            other => UserControlEvent::Unknown {
                event: other,
                data: buffer.read_bytes(buffer.remaining())?,
            },
        })
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let mut buffer = ByteBuffer::with_capacity(6);
        match self {
            UserControlEvent::StreamBegin(id) => {
                buffer.write_u16_be(0)?;
                buffer.write_u32_be(*id)?;
            }
            UserControlEvent::StreamEof(id) => {
                buffer.write_u16_be(1)?;
                buffer.write_u32_be(*id)?;
            }
            UserControlEvent::StreamDry(id) => {
                buffer.write_u16_be(2)?;
                buffer.write_u32_be(*id)?;
            }
            UserControlEvent::SetBufferLength {
                stream_id,
                buffer_ms,
            } => {
                buffer.write_u16_be(3)?;
                buffer.write_u32_be(*stream_id)?;
                buffer.write_u32_be(*buffer_ms)?;
            }
            UserControlEvent::StreamIsRecorded(id) => {
                buffer.write_u16_be(4)?;
                buffer.write_u32_be(*id)?;
            }
            UserControlEvent::PingRequest(ts) => {
                buffer.write_u16_be(6)?;
                buffer.write_u32_be(*ts)?;
            }
            UserControlEvent::PingResponse(ts) => {
                buffer.write_u16_be(7)?;
                buffer.write_u32_be(*ts)?;
            }
            UserControlEvent::Unknown { event, data } => {
                buffer.write_u16_be(*event)?;
                buffer.write_bytes(data)?;
            }
        }
        Ok(buffer.to_vec())
    }
}
