//! Frame discriminator and fixed-width codec.

use crate::record::{Record, RECORD_LEN};
use thiserror::Error;

/// Control frame size in bytes: type(4) + sequence(4).
pub const CONTROL_FRAME_LEN: usize = 8;

/// Data frame size in bytes: control header + record payload.
pub const DATA_FRAME_LEN: usize = CONTROL_FRAME_LEN + RECORD_LEN;

/// Frame type discriminator.
///
/// - `Syn`: handshake liveness probe
/// - `Data`: request or response carrying a [`Record`]
/// - `Ack`: server's answer to a `Syn`
/// - `Fin`: connection teardown, best effort
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    Syn = 0,
    Data = 1,
    Ack = 2,
    Fin = 3,
}

impl FrameType {
    /// Convert from raw tag value.
    ///
    /// Returns `None` for unknown tags.
    #[inline]
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Syn),
            1 => Some(Self::Data),
            2 => Some(Self::Ack),
            3 => Some(Self::Fin),
            _ => None,
        }
    }
}

impl TryFrom<u32> for FrameType {
    type Error = ();

    #[inline]
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_u32(value).ok_or(())
    }
}

/// Errors that can arise when parsing a raw datagram.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WireError {
    #[error("datagram too short for a frame header ({0} bytes)")]
    Truncated(usize),

    #[error("datagram length {len} does not match the {frame_type:?} frame shape")]
    LengthMismatch { frame_type: FrameType, len: usize },

    #[error("unknown frame type tag {0}")]
    UnknownFrameType(u32),

    #[error("unknown command tag {0}")]
    UnknownCommand(u32),

    #[error("record name is not valid UTF-8")]
    InvalidName,
}

/// One protocol frame: the unit exchanged over the datagram channel.
///
/// Only `Data` frames carry a payload. The constructors keep frame type and
/// payload consistent; a hand-built `Data` frame without a payload encodes
/// to a shape the peer will reject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_type: FrameType,
    pub sequence: u32,
    pub payload: Option<Record>,
}

impl Frame {
    /// Handshake probe.
    pub fn syn(sequence: u32) -> Self {
        Self::control(FrameType::Syn, sequence)
    }

    /// Handshake answer.
    pub fn ack(sequence: u32) -> Self {
        Self::control(FrameType::Ack, sequence)
    }

    /// Teardown notice.
    pub fn fin(sequence: u32) -> Self {
        Self::control(FrameType::Fin, sequence)
    }

    /// Request or response frame carrying `record`.
    pub fn data(sequence: u32, record: Record) -> Self {
        Self {
            frame_type: FrameType::Data,
            sequence,
            payload: Some(record),
        }
    }

    fn control(frame_type: FrameType, sequence: u32) -> Self {
        Self {
            frame_type,
            sequence,
            payload: None,
        }
    }

    /// Serialise this frame into a newly allocated byte vector.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(match self.payload {
            Some(_) => DATA_FRAME_LEN,
            None => CONTROL_FRAME_LEN,
        });
        buf.extend_from_slice(&(self.frame_type as u32).to_be_bytes());
        buf.extend_from_slice(&self.sequence.to_be_bytes());
        if let Some(record) = &self.payload {
            record.write_to(&mut buf);
        }
        buf
    }

    /// Parse a frame from a raw datagram.
    ///
    /// The only valid shapes are [`CONTROL_FRAME_LEN`] bytes for
    /// `Syn`/`Ack`/`Fin` and [`DATA_FRAME_LEN`] bytes for `Data`; any other
    /// length fails, as does an unknown type or command tag.
    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() < CONTROL_FRAME_LEN {
            return Err(WireError::Truncated(buf.len()));
        }

        let tag = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let frame_type = FrameType::from_u32(tag).ok_or(WireError::UnknownFrameType(tag))?;
        let sequence = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);

        match frame_type {
            FrameType::Data => {
                if buf.len() != DATA_FRAME_LEN {
                    return Err(WireError::LengthMismatch {
                        frame_type,
                        len: buf.len(),
                    });
                }
                let record = Record::read_from(&buf[CONTROL_FRAME_LEN..])?;
                Ok(Self::data(sequence, record))
            }
            _ => {
                if buf.len() != CONTROL_FRAME_LEN {
                    return Err(WireError::LengthMismatch {
                        frame_type,
                        len: buf.len(),
                    });
                }
                Ok(Self::control(frame_type, sequence))
            }
        }
    }
}
