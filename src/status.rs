//! ==============================================================================
//! status.rs - human readable status text
//! ==============================================================================
//!
//! purpose:
//!     pure rendering of the store snapshot into the html fragments the
//!     dashboard drops into its cards. nothing here is cached; every poll
//!     renders from the snapshot it is handed.
//!
//! thresholds:
//!     - proximity: 0 < d <= proximity_cm approaching, d > proximity_cm clear,
//!       anything else (0, negative, nan) means no echo yet. both channels
//!       use the same bands.
//!     - occupancy: people_in >= occupancy_min means someone is in, which
//!       also drives the lights recommendation.
//!
//! ==============================================================================

use crate::config::AlertsConfig;
use crate::domain::{PersonnelTagReading, ProximityChannel, SmokeReading, UltrasonicReading};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProximityBand {
    NoData,
    Approaching(f32),
    Clear,
}

impl ProximityBand {
    pub fn classify(channel: &ProximityChannel, alerts: &AlertsConfig) -> Self {
        let d = channel.distance_cm;
        if d > 0.0 && d <= alerts.proximity_cm {
            ProximityBand::Approaching(d)
        } else if d > alerts.proximity_cm {
            ProximityBand::Clear
        } else {
            ProximityBand::NoData
        }
    }
}

pub fn smoke_status(smoke: &SmokeReading) -> String {
    // board id 0 is the never-received sentinel
    if smoke.source_id == 0 {
        return "No smoke data received yet.".to_string();
    }

    let verdict = if smoke.is_alarm() {
        "<span class='warning'>Smoke Detected!</span><br>"
    } else {
        "<span class='safe'>No Smoke Detected</span><br>"
    };
    format!("Board ID: {}<br>{}PPM: {:.2}<br>", smoke.source_id, verdict, smoke.ppm)
}

pub fn ultrasonic_status(ultrasonic: &UltrasonicReading, alerts: &AlertsConfig) -> String {
    ultrasonic
        .channels
        .iter()
        .enumerate()
        .map(|(i, ch)| channel_status(i + 1, ProximityBand::classify(ch, alerts)))
        .collect()
}

fn channel_status(machine: usize, band: ProximityBand) -> String {
    match band {
        ProximityBand::Approaching(d) => format!(
            "<span class='warning'>WARNING! </span><br>Someone is Approaching Machine {machine}!<br>Distance: {d:.2} cm<br>"
        ),
        ProximityBand::Clear => {
            format!("<span class='safe'>CLEAR! </span><br>No one is near the Machine {machine}<br>")
        }
        ProximityBand::NoData => format!("No ultrasonic data received yet for Machine {machine}.<br>"),
    }
}

pub fn is_occupied(rfid: &PersonnelTagReading, alerts: &AlertsConfig) -> bool {
    rfid.people_in >= alerts.occupancy_min
}

pub fn personnel_status(rfid: &PersonnelTagReading, alerts: &AlertsConfig) -> String {
    if is_occupied(rfid, alerts) {
        format!("Personnel Count: {}<br>Logged: {}<br>", rfid.people_in, rfid.scanned_label)
    } else {
        "No one is In".to_string()
    }
}

/// lights follow occupancy
pub fn lights_status(rfid: &PersonnelTagReading, alerts: &AlertsConfig) -> String {
    if is_occupied(rfid, alerts) {
        "On Operation".to_string()
    } else {
        "Off Operation".to_string()
    }
}
