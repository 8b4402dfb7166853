//! ==============================================================================
//! wire.rs - fixed layout record codec
//! ==============================================================================
//!
//! purpose:
//!     converts between raw peer link frames and the records in domain.rs.
//!
//! layout:
//!     sensor boards send their c structs as-is: little endian, 4-byte fields,
//!     no padding.
//!
//!     smoke       (16 bytes)  id | detected | ppm (f32) | count (u32)
//!     ultrasonic  (28 bytes)  id | det1 | dist1 (f32) | det2 | dist2 (f32) | count1 | count2
//!     rfid        (76 bytes)  id | people_in | tag_scanned | uid [32] | label [32]
//!
//! framing:
//!     - legacy: the record alone, kind picked by exact length
//!     - tagged: one discriminator byte, then the record
//!
//! ==============================================================================

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{
    PersonnelTagReading, ProximityChannel, Reading, ReadingKind, SmokeReading, TagText,
    UltrasonicReading, TAG_TEXT_CAPACITY,
};

pub const SMOKE_LEN: usize = 16;
pub const ULTRASONIC_LEN: usize = 28;
pub const RFID_LEN: usize = 12 + 2 * TAG_TEXT_CAPACITY;

/// how records are framed on the peer link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    /// raw record, classified by length
    #[default]
    Legacy,
    /// leading kind byte followed by the raw record
    Tagged,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("no record is {0} bytes long")]
    UnknownLength(usize),

    #[error("empty frame")]
    Empty,

    #[error("unknown record tag 0x{0:02x}")]
    UnknownTag(u8),

    #[error("{kind} record must be {expected} bytes, got {actual}")]
    LengthMismatch {
        kind: ReadingKind,
        expected: usize,
        actual: usize,
    },
}

impl FrameError {
    /// true when the frame claimed a kind but broke its contract
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, FrameError::LengthMismatch { .. } | FrameError::UnknownTag(_))
    }
}

impl ReadingKind {
    /// record size without any framing
    pub fn record_len(self) -> usize {
        match self {
            ReadingKind::Smoke => SMOKE_LEN,
            ReadingKind::Ultrasonic => ULTRASONIC_LEN,
            ReadingKind::Rfid => RFID_LEN,
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            ReadingKind::Smoke => 1,
            ReadingKind::Ultrasonic => 2,
            ReadingKind::Rfid => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        ReadingKind::ALL.into_iter().find(|k| k.tag() == tag)
    }

    /// legacy classification: exact length match, first hit wins
    pub fn from_len(len: usize) -> Option<Self> {
        ReadingKind::ALL.into_iter().find(|k| k.record_len() == len)
    }
}

// ==============================================================================
// decode
// ==============================================================================

/// decode one frame received from the peer link
pub fn decode(format: FrameFormat, frame: &[u8]) -> Result<Reading, FrameError> {
    match format {
        FrameFormat::Legacy => {
            let kind = ReadingKind::from_len(frame.len())
                .ok_or(FrameError::UnknownLength(frame.len()))?;
            Ok(decode_record(kind, frame))
        }
        FrameFormat::Tagged => {
            let (&tag, record) = frame.split_first().ok_or(FrameError::Empty)?;
            let kind = ReadingKind::from_tag(tag).ok_or(FrameError::UnknownTag(tag))?;
            if record.len() != kind.record_len() {
                return Err(FrameError::LengthMismatch {
                    kind,
                    expected: kind.record_len(),
                    actual: record.len(),
                });
            }
            Ok(decode_record(kind, record))
        }
    }
}

// caller guarantees record.len() == kind.record_len()
fn decode_record(kind: ReadingKind, record: &[u8]) -> Reading {
    match kind {
        ReadingKind::Smoke => Reading::Smoke(SmokeReading {
            source_id: le_i32(record, 0),
            smoke_detected: le_i32(record, 4),
            ppm: le_f32(record, 8),
            detection_count: le_u32(record, 12),
        }),
        ReadingKind::Ultrasonic => Reading::Ultrasonic(UltrasonicReading {
            source_id: le_i32(record, 0),
            channels: [
                ProximityChannel {
                    object_detected: le_i32(record, 4),
                    distance_cm: le_f32(record, 8),
                    detection_count: le_u32(record, 20),
                },
                ProximityChannel {
                    object_detected: le_i32(record, 12),
                    distance_cm: le_f32(record, 16),
                    detection_count: le_u32(record, 24),
                },
            ],
        }),
        ReadingKind::Rfid => Reading::Rfid(PersonnelTagReading {
            source_id: le_i32(record, 0),
            people_in: le_i32(record, 4),
            tag_scanned: le_i32(record, 8),
            scanned_uid: tag_text(record, 12),
            scanned_label: tag_text(record, 12 + TAG_TEXT_CAPACITY),
        }),
    }
}

fn le_bytes(buf: &[u8], at: usize) -> [u8; 4] {
    [buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]
}

fn le_i32(buf: &[u8], at: usize) -> i32 {
    i32::from_le_bytes(le_bytes(buf, at))
}

fn le_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(le_bytes(buf, at))
}

fn le_f32(buf: &[u8], at: usize) -> f32 {
    f32::from_le_bytes(le_bytes(buf, at))
}

/// copies the fixed text buffer verbatim
fn tag_text(buf: &[u8], at: usize) -> TagText {
    let mut raw = [0u8; TAG_TEXT_CAPACITY];
    raw.copy_from_slice(&buf[at..at + TAG_TEXT_CAPACITY]);
    TagText::from_raw(raw)
}

// ==============================================================================
// encode
// ==============================================================================

/// encode a record for the peer link
pub fn encode(format: FrameFormat, reading: &Reading) -> Vec<u8> {
    let kind = reading.kind();
    let mut out = Vec::with_capacity(kind.record_len() + 1);
    if format == FrameFormat::Tagged {
        out.push(kind.tag());
    }

    match reading {
        Reading::Smoke(r) => {
            out.extend_from_slice(&r.source_id.to_le_bytes());
            out.extend_from_slice(&r.smoke_detected.to_le_bytes());
            out.extend_from_slice(&r.ppm.to_le_bytes());
            out.extend_from_slice(&r.detection_count.to_le_bytes());
        }
        Reading::Ultrasonic(r) => {
            let [a, b] = &r.channels;
            out.extend_from_slice(&r.source_id.to_le_bytes());
            out.extend_from_slice(&a.object_detected.to_le_bytes());
            out.extend_from_slice(&a.distance_cm.to_le_bytes());
            out.extend_from_slice(&b.object_detected.to_le_bytes());
            out.extend_from_slice(&b.distance_cm.to_le_bytes());
            out.extend_from_slice(&a.detection_count.to_le_bytes());
            out.extend_from_slice(&b.detection_count.to_le_bytes());
        }
        Reading::Rfid(r) => {
            out.extend_from_slice(&r.source_id.to_le_bytes());
            out.extend_from_slice(&r.people_in.to_le_bytes());
            out.extend_from_slice(&r.tag_scanned.to_le_bytes());
            out.extend_from_slice(r.scanned_uid.as_raw());
            out.extend_from_slice(r.scanned_label.as_raw());
        }
    }

    out
}
