//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `hub.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - LinkConfig: peer link channel and udp bind address.
//!     - HttpConfig: where the dashboard is served.
//!     - WireConfig: legacy (length classified) or tagged framing.
//!     - RelayConfig: on-receive relay toggle and optional fixed schedule.
//!     - AlertsConfig: proximity and occupancy thresholds.
//!     - PeersConfig: one relay destination per reading kind.
//!
//! ==============================================================================

use anyhow::{bail, Context, Result};
use macaddr::MacAddr6;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::domain::ReadingKind;
use crate::wire::FrameFormat;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct HubConfig {
    pub link: LinkConfig,
    pub http: HttpConfig,
    pub wire: WireConfig,
    pub relay: RelayConfig,
    pub alerts: AlertsConfig,
    pub logging: LoggingConfig,
    pub peers: PeersConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LinkConfig {
    pub channel: u8,
    pub bind: SocketAddr,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            channel: 6,
            bind: SocketAddr::from(([0, 0, 0, 0], 4210)),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct WireConfig {
    pub format: FrameFormat,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RelayConfig {
    pub enabled: bool,
    /// also relay on this fixed schedule when set
    pub interval_ms: Option<u64>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { enabled: true, interval_ms: None }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct AlertsConfig {
    /// a channel at or under this distance (and above zero) is "approaching"
    pub proximity_cm: f32,
    /// occupancy at or above this count means someone is in
    pub occupancy_min: i32,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self { proximity_cm: 5.0, occupancy_min: 1 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_sensor_data: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), show_sensor_data: true }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PeerEntry {
    /// colon separated, e.g. "10:06:1C:81:FD:58"
    pub mac: String,
    /// where the board listens for relayed frames
    pub addr: SocketAddr,
}

impl PeerEntry {
    fn new(mac: &str, addr: [u8; 4]) -> Self {
        Self { mac: mac.to_string(), addr: SocketAddr::from((addr, 4210)) }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PeersConfig {
    pub smoke: PeerEntry,
    pub ultrasonic: PeerEntry,
    pub rfid: PeerEntry,
}

impl Default for PeersConfig {
    fn default() -> Self {
        Self {
            smoke: PeerEntry::new("10:06:1C:81:FD:58", [192, 168, 4, 21]),
            ultrasonic: PeerEntry::new("D0:EF:76:5C:58:FC", [192, 168, 4, 22]),
            rfid: PeerEntry::new("88:13:BF:0D:6B:B0", [192, 168, 4, 23]),
        }
    }
}

/// a validated relay destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub mac: MacAddr6,
    pub addr: SocketAddr,
}

/// reading kind -> relay destination, fixed for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayRoutes {
    pub smoke: Destination,
    pub ultrasonic: Destination,
    pub rfid: Destination,
}

impl RelayRoutes {
    pub fn get(&self, kind: ReadingKind) -> Destination {
        match kind {
            ReadingKind::Smoke => self.smoke,
            ReadingKind::Ultrasonic => self.ultrasonic,
            ReadingKind::Rfid => self.rfid,
        }
    }
}

impl HubConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read config file {}", path.as_ref().display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: HubConfig = toml::from_str(content).context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.relay.interval_ms == Some(0) {
            bail!("relay.interval_ms must be greater than zero");
        }
        self.relay_routes()?;
        Ok(())
    }

    /// Load with default fallback
    ///
    /// an explicit path must load; the well-known paths are best effort.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let config = Self::load(path)?;
            println!("[CONFIG] Loaded from {}", path.display());
            return Ok(config);
        }

        let paths = [
            PathBuf::from("config").join("hub.toml"),
            PathBuf::from("..").join("config").join("hub.toml"),
        ];

        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        println!("[CONFIG] Loaded from {}", path.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        println!("[CONFIG] Warning: Failed to load {}: {:#}", path.display(), e);
                    }
                }
            }
        }

        println!("[CONFIG] Warning: No config file found - using defaults");
        Ok(Self::default())
    }

    /// validate the peer table into relay routes
    pub fn relay_routes(&self) -> Result<RelayRoutes> {
        let resolve = |kind: ReadingKind, entry: &PeerEntry| -> Result<Destination> {
            let mac = entry
                .mac
                .parse::<MacAddr6>()
                .with_context(|| format!("invalid mac for {kind} peer: {:?}", entry.mac))?;
            Ok(Destination { mac, addr: entry.addr })
        };

        Ok(RelayRoutes {
            smoke: resolve(ReadingKind::Smoke, &self.peers.smoke)?,
            ultrasonic: resolve(ReadingKind::Ultrasonic, &self.peers.ultrasonic)?,
            rfid: resolve(ReadingKind::Rfid, &self.peers.rfid)?,
        })
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("┌─────────────────────────────────────────┐");
        println!("│            HUB CONFIGURATION            │");
        println!("├─────────────────────────────────────────┤");
        println!("│ Link: {} (channel {})", self.link.bind, self.link.channel);
        println!("│ Dashboard: http://{}", self.http.bind);
        println!("│ Wire Format: {:?}", self.wire.format);
        println!("│ Relay: {} (interval {:?} ms)", self.relay.enabled, self.relay.interval_ms);
        println!("│ Proximity Alert: <= {} cm", self.alerts.proximity_cm);
        println!("│ Log Level: {}", self.logging.level);
        println!("├─────────────────────────────────────────┤");
    }
}
