//! ==============================================================================
//! server.rs - polling web surface
//! ==============================================================================
//!
//! purpose:
//!     serves the dashboard page and the four status fragments it polls.
//!     routing is by substring of the request path, checked in a fixed
//!     order; the first token found wins and anything else gets the page.
//!
//! relationships:
//!     - uses: hub.rs (snapshot), status.rs (rendering)
//!     - serves: assets/index.html (compiled in)
//!
//! ==============================================================================

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;

use crate::config::AlertsConfig;
use crate::hub::Hub;
use crate::status;
use crate::store::Snapshot;

/// the dashboard page, returned verbatim for unmatched paths
pub const DASHBOARD_HTML: &str = include_str!("../assets/index.html");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Smoke,
    Ultrasonic,
    Rfid,
    Lights,
    Dashboard,
}

// priority order
const ROUTES: [(&str, Route); 4] = [
    ("/smoke", Route::Smoke),
    ("/ultrasonic", Route::Ultrasonic),
    ("/rfid", Route::Rfid),
    ("/lights", Route::Lights),
];

pub fn route(path: &str) -> Route {
    ROUTES
        .iter()
        .find(|(token, _)| path.contains(token))
        .map(|(_, r)| *r)
        .unwrap_or(Route::Dashboard)
}

pub fn render(route: Route, snapshot: &Snapshot, alerts: &AlertsConfig) -> String {
    match route {
        Route::Smoke => status::smoke_status(&snapshot.smoke),
        Route::Ultrasonic => status::ultrasonic_status(&snapshot.ultrasonic, alerts),
        Route::Rfid => status::personnel_status(&snapshot.rfid, alerts),
        Route::Lights => status::lights_status(&snapshot.rfid, alerts),
        Route::Dashboard => DASHBOARD_HTML.to_string(),
    }
}

pub async fn run_server(addr: SocketAddr, hub: Hub) -> Result<()> {
    let app = app(hub);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind http listener on {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn app(hub: Hub) -> Router {
    Router::new()
        .fallback(status_handler)
        .layer(CorsLayer::permissive())
        .with_state(hub)
}

async fn status_handler(State(hub): State<Hub>, uri: Uri) -> Response {
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or_else(|| uri.path());
    let route = route(path);
    let snapshot = hub.snapshot().await;
    let body = render(route, &snapshot, hub.alerts());

    match route {
        Route::Dashboard => tracing::debug!("[HTTP] {} -> dashboard page served", path),
        _ => tracing::debug!("[HTTP] {} -> {}", path, body),
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html"), (header::CONNECTION, "close")],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PersonnelTagReading, Reading, SmokeReading, TagText};
    use crate::hub::tests::{frame, test_hub};

    async fn get(hub: &Hub, path: &str) -> (Response, String) {
        let resp = status_handler(State(hub.clone()), path.parse::<Uri>().unwrap()).await;
        let (parts, body) = resp.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        (
            Response::from_parts(parts, axum::body::Body::empty()),
            String::from_utf8(bytes.to_vec()).unwrap(),
        )
    }

    #[test]
    fn test_route_tokens() {
        assert_eq!(route("/smoke"), Route::Smoke);
        assert_eq!(route("/ultrasonic?t=1"), Route::Ultrasonic);
        assert_eq!(route("/rfid"), Route::Rfid);
        assert_eq!(route("/lights"), Route::Lights);
        assert_eq!(route("/"), Route::Dashboard);
        assert_eq!(route("/favicon.ico"), Route::Dashboard);
    }

    #[test]
    fn test_route_priority_and_substring() {
        // smoke is checked before lights
        assert_eq!(route("/lights/smoke"), Route::Smoke);
        assert_eq!(route("/x/rfid/lights"), Route::Rfid);
        assert_eq!(route("/status/ultrasonic"), Route::Ultrasonic);
        assert_eq!(route("/SMOKE"), Route::Dashboard);
    }

    #[tokio::test]
    async fn test_headers_and_dashboard_fallback() {
        let (hub, _) = test_hub(false);
        let (resp, body) = get(&hub, "/index.html").await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/html");
        assert_eq!(resp.headers()[header::CONNECTION], "close");
        assert_eq!(body, DASHBOARD_HTML);
        assert!(body.contains("fetch('/lights')"));
    }

    #[tokio::test]
    async fn test_rfid_and_lights_before_and_after_reading() {
        let (hub, _) = test_hub(false);
        assert_eq!(get(&hub, "/rfid").await.1, "No one is In");
        assert_eq!(get(&hub, "/lights").await.1, "Off Operation");

        let rfid = Reading::Rfid(PersonnelTagReading {
            source_id: 3,
            people_in: 1,
            tag_scanned: 1,
            scanned_uid: TagText::new("9C 11 0A"),
            scanned_label: TagText::new("Kizah"),
        });
        hub.handle_frame(&frame(&rfid)).await.unwrap();

        assert_eq!(get(&hub, "/rfid").await.1, "Personnel Count: 1<br>Logged: Kizah<br>");
        assert_eq!(get(&hub, "/lights").await.1, "On Operation");
    }

    #[tokio::test]
    async fn test_repeated_polls_are_identical() {
        let (hub, _) = test_hub(false);
        let smoke = Reading::Smoke(SmokeReading {
            source_id: 1,
            smoke_detected: 1,
            ppm: 42.0,
            detection_count: 2,
        });
        hub.handle_frame(&frame(&smoke)).await.unwrap();

        for path in ["/smoke", "/ultrasonic", "/rfid", "/lights", "/"] {
            let first = get(&hub, path).await.1;
            let second = get(&hub, path).await.1;
            assert_eq!(first, second, "{path}");
        }
        assert!(get(&hub, "/smoke").await.1.contains("PPM: 42.00"));
    }
}
