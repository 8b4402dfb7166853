//! ==============================================================================
//! hub.rs - the telemetry hub context
//! ==============================================================================
//!
//! purpose:
//!     one clone-able handle that owns the state store, the dispatcher and the
//!     relay. the receive loop, the relay timer and the web server each hold a
//!     clone; nothing lives in globals.
//!
//! flow:
//!     peer link frame -> dispatcher -> store -> relay (every slot)
//!     http poll       -> store snapshot -> status text
//!
//! ==============================================================================

use std::time::Duration;

use crate::config::AlertsConfig;
use crate::dispatch::Dispatcher;
use crate::domain::ReadingKind;
use crate::relay::{Relay, RelayReport};
use crate::store::{Snapshot, StateStore};
use crate::transport::Inbound;

#[derive(Clone)]
pub struct Hub {
    store: StateStore,
    dispatcher: Dispatcher,
    relay: Relay,
    relay_on_receive: bool,
    alerts: AlertsConfig,
}

impl Hub {
    pub fn new(dispatcher: Dispatcher, relay: Relay, relay_on_receive: bool, alerts: AlertsConfig) -> Self {
        Self {
            store: StateStore::new(),
            dispatcher,
            relay,
            relay_on_receive,
            alerts,
        }
    }

    pub fn alerts(&self) -> &AlertsConfig {
        &self.alerts
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.store.snapshot().await
    }

    /// handle one frame from the peer link
    ///
    /// returns the kind that was stored, or `None` when the frame was dropped.
    /// the dispatcher has already logged why.
    pub async fn handle_frame(&self, inbound: &Inbound) -> Option<ReadingKind> {
        let kind = self.dispatcher.dispatch(&self.store, inbound).await.ok()?;
        if self.relay_on_receive {
            self.relay_now().await;
        }
        Some(kind)
    }

    /// forward the current snapshot to every destination
    pub async fn relay_now(&self) -> RelayReport {
        let snapshot = self.store.snapshot().await;
        self.relay.forward(&snapshot)
    }

    /// relay every `period`, starting immediately; runs until the task is dropped
    pub async fn relay_on_schedule(self, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            self.relay_now().await;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::HubConfig;
    use crate::domain::{Reading, SmokeReading};
    use crate::transport::mock::MockTransport;
    use crate::wire::{self, FrameFormat};
    use std::sync::Arc;

    pub(crate) fn test_hub(relay_on_receive: bool) -> (Hub, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::default());
        let routes = HubConfig::default().relay_routes().unwrap();
        let relay = Relay::new(mock.clone(), routes, FrameFormat::Legacy);
        relay.register_peers(6);
        let hub = Hub::new(
            Dispatcher::new(FrameFormat::Legacy, false),
            relay,
            relay_on_receive,
            AlertsConfig::default(),
        );
        (hub, mock)
    }

    pub(crate) fn frame(reading: &Reading) -> Inbound {
        Inbound {
            from: "127.0.0.1:4210".parse().unwrap(),
            peer: None,
            payload: wire::encode(FrameFormat::Legacy, reading),
        }
    }

    #[tokio::test]
    async fn test_accepted_frame_relays_all_slots() {
        let (hub, mock) = test_hub(true);
        let smoke = Reading::Smoke(SmokeReading { source_id: 1, ..Default::default() });

        assert_eq!(hub.handle_frame(&frame(&smoke)).await, Some(ReadingKind::Smoke));
        assert_eq!(mock.sent().len(), 3);
        assert_eq!(hub.snapshot().await.smoke.source_id, 1);
    }

    #[tokio::test]
    async fn test_rejected_frame_relays_nothing() {
        let (hub, mock) = test_hub(true);
        let bad = Inbound { payload: vec![0; 5], ..frame(&Reading::Smoke(SmokeReading::default())) };

        assert!(hub.handle_frame(&bad).await.is_none());
        assert!(mock.sent().is_empty());
    }

    #[tokio::test]
    async fn test_relay_on_receive_can_be_disabled() {
        let (hub, mock) = test_hub(false);
        let smoke = Reading::Smoke(SmokeReading { source_id: 1, ..Default::default() });

        hub.handle_frame(&frame(&smoke)).await.unwrap();
        assert!(mock.sent().is_empty());

        // the scheduled path still works
        let report = hub.relay_now().await;
        assert_eq!(report.len(), 3);
        assert_eq!(mock.sent().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_relay_sends_every_slot_each_tick() {
        let (hub, mock) = test_hub(false);
        let smoke = Reading::Smoke(SmokeReading { source_id: 4, ..Default::default() });
        hub.handle_frame(&frame(&smoke)).await.unwrap();

        let task = tokio::spawn(hub.clone().relay_on_schedule(Duration::from_millis(100)));

        // ticks at 0, 100 and 200 ms
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(mock.sent().len(), 9);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(mock.sent().len(), 12);

        task.abort();
        let sent = mock.sent();
        let routes = HubConfig::default().relay_routes().unwrap();
        for tick in sent.chunks(3) {
            let kinds: Vec<_> = tick
                .iter()
                .map(|(mac, payload)| {
                    let kind = wire::decode(FrameFormat::Legacy, payload).unwrap().kind();
                    assert_eq!(*mac, routes.get(kind).mac);
                    kind
                })
                .collect();
            assert_eq!(kinds, ReadingKind::ALL.to_vec());
        }
        assert_eq!(sent[0].1, wire::encode(FrameFormat::Legacy, &smoke));
    }
}
