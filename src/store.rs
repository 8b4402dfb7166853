//! ==============================================================================
//! store.rs - latest-reading state store
//! ==============================================================================
//!
//! purpose:
//!     holds exactly one slot per reading kind. every update replaces the
//!     slot wholesale; there is no history.
//!
//! sharing:
//!     the peer link receive loop writes, the web server and the relay read.
//!     arc<rwlock<>> gives each reader a consistent copy: a slot is only ever
//!     replaced under the write lock, so a read sees the record from before or
//!     after an update, never a mix of both.
//!
//! ==============================================================================

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{PersonnelTagReading, Reading, SmokeReading, UltrasonicReading};

/// a point-in-time copy of all three slots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub smoke: SmokeReading,
    pub ultrasonic: UltrasonicReading,
    pub rfid: PersonnelTagReading,
}

impl Snapshot {
    /// every slot as a record, in relay order
    pub fn readings(&self) -> [Reading; 3] {
        [
            Reading::Smoke(self.smoke.clone()),
            Reading::Ultrasonic(self.ultrasonic.clone()),
            Reading::Rfid(self.rfid.clone()),
        ]
    }

    fn apply(&mut self, reading: Reading) {
        match reading {
            Reading::Smoke(r) => self.smoke = r,
            Reading::Ultrasonic(r) => self.ultrasonic = r,
            Reading::Rfid(r) => self.rfid = r,
        }
    }
}

/// clone-able handle to the shared slots
#[derive(Clone, Default)]
pub struct StateStore {
    inner: Arc<RwLock<Snapshot>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// overwrite the slot matching the reading's kind
    pub async fn apply(&self, reading: Reading) {
        self.inner.write().await.apply(reading);
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.inner.read().await.clone()
    }
}
