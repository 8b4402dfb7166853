//! ==============================================================================
//! dispatch.rs - inbound frame dispatcher
//! ==============================================================================
//!
//! purpose:
//!     turns a raw frame from the peer link into a record and writes it into
//!     the matching store slot. frames that decode to nothing are dropped
//!     with a diagnostic; the sender never hears about it.
//!
//! relationships:
//!     - uses: wire.rs (decode), store.rs (slot overwrite)
//!     - used by: hub.rs
//!
//! ==============================================================================

use crate::domain::{Reading, ReadingKind};
use crate::store::StateStore;
use crate::transport::Inbound;
use crate::wire::{self, FrameError, FrameFormat};

#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    format: FrameFormat,
    show_sensor_data: bool,
}

impl Dispatcher {
    pub fn new(format: FrameFormat, show_sensor_data: bool) -> Self {
        Self { format, show_sensor_data }
    }

    /// decode and store; returns the kind that was updated
    pub async fn dispatch(&self, store: &StateStore, inbound: &Inbound) -> Result<ReadingKind, FrameError> {
        let reading = match wire::decode(self.format, &inbound.payload) {
            Ok(r) => r,
            Err(e) => {
                self.report_rejected(inbound, &e);
                return Err(e);
            }
        };

        let kind = reading.kind();
        if self.show_sensor_data {
            log_reading(inbound, &reading);
        }
        store.apply(reading).await;
        Ok(kind)
    }

    fn report_rejected(&self, inbound: &Inbound, err: &FrameError) {
        if err.is_protocol_violation() {
            tracing::error!(
                "[DISPATCH] protocol violation from {}: {} (frame {})",
                inbound.sender(),
                err,
                hex::encode(&inbound.payload)
            );
        } else {
            tracing::warn!(
                "[DISPATCH] invalid data received from {}: {} (frame {})",
                inbound.sender(),
                err,
                hex::encode(&inbound.payload)
            );
        }
    }
}

fn log_reading(inbound: &Inbound, reading: &Reading) {
    match reading {
        Reading::Smoke(r) => tracing::info!(
            "[SMOKE] from {} | board {} | ppm {:.2} | detected {} | count {}",
            inbound.sender(),
            r.source_id,
            r.ppm,
            r.smoke_detected,
            r.detection_count
        ),
        Reading::Ultrasonic(r) => {
            for (i, ch) in r.channels.iter().enumerate() {
                tracing::info!(
                    "[ULTRASONIC] from {} | board {} | sensor {} | detected {} | {:.2} cm | count {}",
                    inbound.sender(),
                    r.source_id,
                    i + 1,
                    ch.object_detected,
                    ch.distance_cm,
                    ch.detection_count
                );
            }
        }
        Reading::Rfid(r) => tracing::info!(
            "[RFID] from {} | board {} | personnel count {} | last scan \"{}\"",
            inbound.sender(),
            r.source_id,
            r.people_in,
            r.scanned_label
        ),
    }
}
