//! ==============================================================================
//! main.rs - telemetry hub entry point
//! ==============================================================================
//!
//! purpose:
//!     the hub node between the sensing boards and the people watching them.
//!     boards push fixed-layout records over the peer link, the hub keeps the
//!     latest one per kind, relays the current set to the configured peers
//!     and answers dashboard polls with status text.
//!
//! responsibilities:
//!     - load configuration and start logging
//!     - open the peer link and register the relay peers
//!     - run the receive loop (frame -> dispatcher -> store -> relay)
//!     - serve the dashboard and status endpoints
//!     - run the optional fixed-schedule relay
//!
//! architecture:
//!
//!     ┌─────────────────────────────────────────────────────────────┐
//!     │                     hub process (this file)                  │
//!     │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//!     │  │ receive     │  │ web server  │  │ relay timer         │  │
//!     │  │ loop (udp)  │  │ (axum)      │  │ (optional)          │  │
//!     │  └──────┬──────┘  └──────┬──────┘  └──────────┬──────────┘  │
//!     │         │                │                    │             │
//!     │         └────────────────┼────────────────────┘             │
//!     │                    ┌─────┴─────┐                            │
//!     │                    │    hub    │ <- hub.rs                  │
//!     │                    └─────┬─────┘                            │
//!     │        (store + dispatcher + relay, clone-able handle)       │
//!     └──────────────────────────┼──────────────────────────────────┘
//!                                │ peer link
//!                ┌───────────────┼───────────────┐
//!                ▼               ▼               ▼
//!          ┌──────────┐   ┌────────────┐   ┌──────────┐
//!          │  smoke   │   │ ultrasonic │   │   rfid   │
//!          └──────────┘   └────────────┘   └──────────┘
//!
//! ==============================================================================

mod args;
mod config;
mod dispatch;
mod domain;
mod hub;
mod relay;
mod server;
mod status;
mod store;
mod transport;
mod wire;

use anyhow::Result;
use clap::Parser as _;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::args::Args;
use crate::config::{HubConfig, LoggingConfig};
use crate::dispatch::Dispatcher;
use crate::hub::Hub;
use crate::relay::Relay;
use crate::transport::UdpTransport;

#[tokio::main]
async fn main() -> Result<()> {
    println!("===========================================================");
    println!("  Telemetry Hub");
    println!("  smoke | ultrasonic | rfid");
    println!("===========================================================");

    // step 1: load configuration
    let args = Args::parse();
    let config = HubConfig::load_or_default(args.config.as_deref())?;
    init_logging(&config.logging);
    config.print_summary();

    // step 2: open the peer link and register relay peers
    let routes = config.relay_routes()?;
    let link = Arc::new(UdpTransport::bind(config.link.bind).await?);
    tracing::info!("[STARTUP] peer link listening on {}", link.local_addr()?);

    let relay = Relay::new(link.clone(), routes, config.wire.format);
    let registered = relay.register_peers(config.link.channel);
    tracing::info!("[STARTUP] {} of 3 relay peers registered", registered);

    // step 3: build the hub
    let hub = Hub::new(
        Dispatcher::new(config.wire.format, config.logging.show_sensor_data),
        relay,
        config.relay.enabled,
        config.alerts,
    );

    // step 4: start the web server in background
    let web_hub = hub.clone();
    let http_bind = config.http.bind;
    tokio::spawn(async move {
        tracing::info!("[STARTUP] dashboard live at http://{}", http_bind);
        if let Err(e) = server::run_server(http_bind, web_hub).await {
            tracing::error!("[ERROR] web server error: {:#}", e);
        }
    });

    // step 5: optional fixed-schedule relay
    if let (true, Some(ms)) = (config.relay.enabled, config.relay.interval_ms) {
        tokio::spawn(hub.clone().relay_on_schedule(Duration::from_millis(ms)));
    }

    // step 6: receive loop
    tracing::info!("[RUNTIME] waiting for sensor data");
    loop {
        match link.recv().await {
            Ok(inbound) => {
                if let Some(kind) = hub.handle_frame(&inbound).await {
                    tracing::debug!("[LINK] {} record from {} stored", kind, inbound.sender());
                }
            }
            Err(e) => {
                tracing::warn!("[LINK] receive error: {}", e);
            }
        }
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
