//! ==============================================================================
//! domain.rs - sensor reading records
//! ==============================================================================
//!
//! purpose:
//!     the three record shapes the sensing peers send to the hub.
//!     field layout on the wire lives in wire.rs; these are the decoded values.
//!
//! relationships:
//!     - decoded by: wire.rs
//!     - stored by: store.rs (one slot per kind)
//!     - rendered by: status.rs
//!
//! ==============================================================================

use std::borrow::Cow;
use std::fmt;

/// capacity of the fixed string buffers in a personnel tag record,
/// terminator included
pub const TAG_TEXT_CAPACITY: usize = 32;

/// fixed c string buffer from a personnel tag record
///
/// the raw bytes are kept as received so a relayed record is byte-identical
/// to the one that came in; text is only decoded for display.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TagText([u8; TAG_TEXT_CAPACITY]);

impl TagText {
    /// NUL padded buffer holding at most 31 bytes of `text`, cut on a char boundary
    pub fn new(text: &str) -> Self {
        let mut end = text.len().min(TAG_TEXT_CAPACITY - 1);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let mut buf = [0u8; TAG_TEXT_CAPACITY];
        buf[..end].copy_from_slice(&text.as_bytes()[..end]);
        Self(buf)
    }

    pub fn from_raw(buf: [u8; TAG_TEXT_CAPACITY]) -> Self {
        Self(buf)
    }

    pub fn as_raw(&self) -> &[u8; TAG_TEXT_CAPACITY] {
        &self.0
    }

    /// bytes up to the first NUL; the last byte always counts as the terminator
    pub fn content(&self) -> &[u8] {
        let limit = TAG_TEXT_CAPACITY - 1;
        let end = self.0[..limit].iter().position(|&b| b == 0).unwrap_or(limit);
        &self.0[..end]
    }

    /// display text, invalid utf-8 replaced
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.content())
    }
}

impl Default for TagText {
    fn default() -> Self {
        Self([0u8; TAG_TEXT_CAPACITY])
    }
}

impl fmt::Display for TagText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl fmt::Debug for TagText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.text())
    }
}

/// which slot a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingKind {
    Smoke,
    Ultrasonic,
    Rfid,
}

impl ReadingKind {
    pub const ALL: [ReadingKind; 3] = [ReadingKind::Smoke, ReadingKind::Ultrasonic, ReadingKind::Rfid];

    pub fn label(self) -> &'static str {
        match self {
            ReadingKind::Smoke => "smoke",
            ReadingKind::Ultrasonic => "ultrasonic",
            ReadingKind::Rfid => "rfid",
        }
    }
}

impl fmt::Display for ReadingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// smoke detector reading
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmokeReading {
    /// board id of the sender, 0 means nothing received yet
    pub source_id: i32,
    /// 0 = clear, anything else = smoke detected
    pub smoke_detected: i32,
    /// smoke concentration in ppm
    pub ppm: f32,
    /// cumulative detection events reported by the sender
    pub detection_count: u32,
}

impl SmokeReading {
    pub fn is_alarm(&self) -> bool {
        self.smoke_detected != 0
    }
}

/// one proximity channel of an ultrasonic board
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProximityChannel {
    pub object_detected: i32,
    /// centimeters, 0 means no valid echo
    pub distance_cm: f32,
    pub detection_count: u32,
}

/// two-channel ultrasonic proximity reading
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UltrasonicReading {
    pub source_id: i32,
    pub channels: [ProximityChannel; 2],
}

/// rfid door reader reading
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonnelTagReading {
    pub source_id: i32,
    /// occupancy as counted by the reader, not clamped
    pub people_in: i32,
    pub tag_scanned: i32,
    /// last scanned uid
    pub scanned_uid: TagText,
    /// display name bound to the last scanned uid
    pub scanned_label: TagText,
}

/// a decoded record of any kind
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Smoke(SmokeReading),
    Ultrasonic(UltrasonicReading),
    Rfid(PersonnelTagReading),
}

impl Reading {
    pub fn kind(&self) -> ReadingKind {
        match self {
            Reading::Smoke(_) => ReadingKind::Smoke,
            Reading::Ultrasonic(_) => ReadingKind::Ultrasonic,
            Reading::Rfid(_) => ReadingKind::Rfid,
        }
    }
}
