//! ==============================================================================
//! relay.rs - forward current state to the downstream peers
//! ==============================================================================
//!
//! purpose:
//!     after every accepted frame (and optionally on a fixed schedule) the
//!     latest value of every slot goes to that kind's configured peer,
//!     whichever slot actually changed.
//!
//! delivery:
//!     fire-and-forget. each destination is attempted on its own; a failure is
//!     logged and does not stop the others. no retry, no queue.
//!
//! relationships:
//!     - uses: transport.rs (PeerTransport), wire.rs (encode), config.rs (RelayRoutes)
//!     - used by: hub.rs
//!
//! ==============================================================================

use std::sync::Arc;

use crate::config::RelayRoutes;
use crate::domain::ReadingKind;
use crate::store::Snapshot;
use crate::transport::{PeerInfo, PeerTransport, TransportError};
use crate::wire::{self, FrameFormat};

/// outcome of one send per kind, in relay order
pub type RelayReport = Vec<(ReadingKind, Result<(), TransportError>)>;

#[derive(Clone)]
pub struct Relay {
    transport: Arc<dyn PeerTransport>,
    routes: RelayRoutes,
    format: FrameFormat,
}

impl Relay {
    pub fn new(transport: Arc<dyn PeerTransport>, routes: RelayRoutes, format: FrameFormat) -> Self {
        Self { transport, routes, format }
    }

    /// register every destination with the transport, once each
    pub fn register_peers(&self, channel: u8) -> usize {
        let mut registered = 0;
        for kind in ReadingKind::ALL {
            let dest = self.routes.get(kind);
            let peer = PeerInfo { mac: dest.mac, addr: dest.addr, channel };
            match self.transport.add_peer(peer) {
                Ok(()) => {
                    tracing::info!("[RELAY] {} peer {} successfully added", kind, dest.mac);
                    registered += 1;
                }
                Err(e) => tracing::warn!("[RELAY] failed to add {} peer: {}", kind, e),
            }
        }
        registered
    }

    /// send every slot of the snapshot to its destination
    pub fn forward(&self, snapshot: &Snapshot) -> RelayReport {
        snapshot
            .readings()
            .iter()
            .map(|reading| {
                let kind = reading.kind();
                let dest = self.routes.get(kind);
                let frame = wire::encode(self.format, reading);
                let result = self.transport.send(dest.mac, &frame);
                match &result {
                    Ok(()) => tracing::info!("[RELAY] {} data sent successfully", kind),
                    Err(e) => tracing::warn!("[RELAY] failed to send {} data: {}", kind, e),
                }
                (kind, result)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Destination, HubConfig};
    use crate::domain::{PersonnelTagReading, Reading, SmokeReading, TagText};
    use crate::transport::mock::MockTransport;
    use macaddr::MacAddr6;

    fn routes() -> RelayRoutes {
        HubConfig::default().relay_routes().unwrap()
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            smoke: SmokeReading { source_id: 1, ppm: 12.5, ..Default::default() },
            rfid: PersonnelTagReading {
                source_id: 3,
                people_in: 1,
                scanned_label: TagText::new("Sammy"),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_forward_sends_every_slot_to_its_peer() {
        let mock = Arc::new(MockTransport::default());
        let relay = Relay::new(mock.clone(), routes(), FrameFormat::Legacy);
        assert_eq!(relay.register_peers(6), 3);

        let report = relay.forward(&snapshot());
        assert!(report.iter().all(|(_, r)| r.is_ok()));

        let sent = mock.sent();
        assert_eq!(sent.len(), 3);
        for ((mac, frame), reading) in sent.iter().zip(snapshot().readings()) {
            assert_eq!(*mac, routes().get(reading.kind()).mac);
            assert_eq!(wire::decode(FrameFormat::Legacy, frame), Ok(reading));
        }
    }

    #[test]
    fn test_one_failing_peer_does_not_block_the_others() {
        let mock = Arc::new(MockTransport::default());
        let relay = Relay::new(mock.clone(), routes(), FrameFormat::Tagged);
        relay.register_peers(6);
        mock.fail_peer(routes().ultrasonic.mac);

        let report = relay.forward(&snapshot());
        let failed: Vec<_> = report.iter().filter(|(_, r)| r.is_err()).map(|(k, _)| *k).collect();
        assert_eq!(failed, vec![ReadingKind::Ultrasonic]);

        let kinds: Vec<_> = mock
            .sent()
            .iter()
            .map(|(_, frame)| wire::decode(FrameFormat::Tagged, frame).unwrap().kind())
            .collect();
        assert_eq!(kinds, vec![ReadingKind::Smoke, ReadingKind::Rfid]);
    }

    #[test]
    fn test_duplicate_destination_registers_once() {
        let shared = Destination {
            mac: MacAddr6::new(2, 0, 0, 0, 0, 9),
            addr: "10.0.0.9:4210".parse().unwrap(),
        };
        let routes = RelayRoutes { smoke: shared, ultrasonic: shared, rfid: routes().rfid };
        let mock = Arc::new(MockTransport::default());
        let relay = Relay::new(mock.clone(), routes, FrameFormat::Legacy);

        assert_eq!(relay.register_peers(6), 2);

        // both kinds still reach the shared board
        let report = relay.forward(&Snapshot::default());
        assert!(report.iter().all(|(_, r)| r.is_ok()));
        assert_eq!(mock.sent().len(), 3);
        assert!(matches!(
            wire::decode(FrameFormat::Legacy, &mock.sent()[0].1),
            Ok(Reading::Smoke(_))
        ));
    }
}
