//! Climate Observation API Server
//!
//! Read-only REST API over station precipitation and temperature
//! observations.

use anyhow::Context;
use axum::{response::Html, routing::get, Router};
use std::str::FromStr;
use std::sync::Arc;
use storage::ClimateStore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
mod error;
mod routes;

pub use crate::config::{LoggingConfig, ServerConfig, Settings};
pub use error::{ApiError, ConfigError};

/// Application state shared across handlers.
///
/// Built once at start-up and never mutated afterwards.
pub struct AppState {
    /// Climate database
    pub store: ClimateStore,
    /// Version string
    pub version: String,
}

impl AppState {
    /// Create new application state
    pub fn new(store: ClimateStore) -> Self {
        Self {
            store,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

const INDEX_HTML: &str = "Available Routes:<br/>\
    /api/v1.0/precipitation<br/>\
    /api/v1.0/stations<br/>\
    /api/v1.0/tobs<br/>\
    /api/v1.0/&#60;start&#62;<br/>\
    /api/v1.0/&#60;start&#62;/&#60;end&#62;<br/>";

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route(
            "/api/v1.0/precipitation",
            get(routes::precipitation::get_precipitation),
        )
        .route("/api/v1.0/stations", get(routes::stations::get_stations))
        .route("/api/v1.0/tobs", get(routes::temperature::get_tobs))
        .route("/api/v1.0/:start", get(routes::temperature::get_summary_from))
        .route(
            "/api/v1.0/:start/:end",
            get(routes::temperature::get_summary_between),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// List the available routes
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let level = Level::from_str(&config.level)
        .map_err(|_| ConfigError::InvalidLogLevel(config.level.clone()))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let installed = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    installed.map_err(|e| ConfigError::Logging(e.to_string()))
}

/// Run the server until a shutdown signal arrives
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let store = ClimateStore::connect(&settings.storage).await?;
    let state = Arc::new(AppState::new(store.clone()));

    info!("Serving climate data (v{})", state.version);

    let mut app = create_router(state);
    if settings.server.permissive_cors {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = settings.server.bind_addr.as_str();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Starting API server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use storage::testing::{
        measurement, seeded_integer_store, seeded_store, station, unseeded_store,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn request(store: ClimateStore, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let app = create_router(Arc::new(AppState::new(store)));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, bytes.to_vec())
    }

    async fn get_json(store: ClimateStore, uri: &str) -> (StatusCode, Value) {
        let (status, content_type, body) = request(store, uri).await;
        assert_eq!(content_type.as_deref(), Some("application/json"));
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn hawaii_store() -> ClimateStore {
        seeded_store(
            &[
                station("USC00519397", "WAIKIKI 717.2, HI US", 21.2716, -157.8168, 3.0),
                station("USC00513117", "KANEOHE 838.1, HI US", 21.4234, -157.8015, 14.6),
                station("USC00519281", "WAIHEE 837.5, HI US", 21.45167, -157.84889, 32.9),
            ],
            &[
                measurement("USC00519397", "2016-08-22", Some(0.4), 78.0),
                measurement("USC00519397", "2016-08-23", Some(0.0), 81.0),
                measurement("USC00519397", "2017-08-23", Some(0.3), 81.0),
                measurement("USC00513117", "2017-08-23", Some(0.5), 76.0),
                measurement("USC00519281", "2016-08-18", Some(0.06), 80.0),
                measurement("USC00519281", "2016-08-19", None, 79.0),
                measurement("USC00519281", "2017-03-01", Some(1.2), 72.0),
                measurement("USC00519281", "2017-08-18", Some(0.0), 79.0),
            ],
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_index_lists_routes() {
        let store = seeded_store(&[], &[]).await.unwrap();
        let (status, content_type, body) = request(store, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/html"));
        let body = String::from_utf8(body).unwrap();
        assert!(body.starts_with("Available Routes:<br/>"));
        assert!(body.contains("/api/v1.0/precipitation<br/>"));
        assert!(body.contains("/api/v1.0/&#60;start&#62;/&#60;end&#62;<br/>"));
    }

    #[tokio::test]
    async fn test_precipitation_trailing_year() {
        let (status, body) = get_json(hawaii_store().await, "/api/v1.0/precipitation").await;

        assert_eq!(status, StatusCode::OK);
        let map = body.as_object().unwrap();
        // 2016-08-22 is just outside the window ending 2017-08-23.
        assert!(!map.contains_key("2016-08-22"));
        assert_eq!(map["2016-08-23"], json!(0.0));
        assert_eq!(map["2017-03-01"], json!(1.2));
        assert!(map.contains_key("2017-08-18"));
        // Two stations report 2017-08-23 (0.3 then 0.5); the later row replaces
        // the earlier one rather than being summed or averaged.
        assert_eq!(map["2017-08-23"], json!(0.5));
        assert_eq!(map.len(), 4);
        for date in map.keys() {
            assert!(date.as_str() >= "2016-08-23" && date.as_str() <= "2017-08-23");
        }
    }

    #[tokio::test]
    async fn test_precipitation_keeps_missing_readings_as_null() {
        let store = seeded_store(
            &[],
            &[
                measurement("USC00519281", "2016-08-19", None, 79.0),
                measurement("USC00519281", "2016-08-20", Some(0.5), 79.0),
            ],
        )
        .await
        .unwrap();

        let (_, body) = get_json(store, "/api/v1.0/precipitation").await;
        assert_eq!(body, json!({"2016-08-19": null, "2016-08-20": 0.5}));
    }

    #[tokio::test]
    async fn test_precipitation_empty_dataset() {
        let store = seeded_store(&[], &[]).await.unwrap();
        let (status, body) = get_json(store, "/api/v1.0/precipitation").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn test_stations_echo_rows() {
        let (status, body) = get_json(hawaii_store().await, "/api/v1.0/stations").await;

        assert_eq!(status, StatusCode::OK);
        let stations = body.as_array().unwrap();
        assert_eq!(stations.len(), 3);
        assert_eq!(
            stations[2],
            json!({
                "station": "USC00519281",
                "name": "WAIHEE 837.5, HI US",
                "latitude": 21.45167,
                "longitude": -157.84889,
                "elevation": 32.9
            })
        );
    }

    #[tokio::test]
    async fn test_tobs_uses_most_active_station() {
        let (status, body) = get_json(hawaii_store().await, "/api/v1.0/tobs").await;

        assert_eq!(status, StatusCode::OK);
        // USC00519281 has the most rows; its window is 2016-08-18..=2017-08-18.
        let rows = body.as_array().unwrap();
        assert_eq!(
            rows,
            &vec![
                json!({"date": "2016-08-18", "temperature": 80.0}),
                json!({"date": "2016-08-19", "temperature": 79.0}),
                json!({"date": "2017-03-01", "temperature": 72.0}),
                json!({"date": "2017-08-18", "temperature": 79.0}),
            ]
        );
    }

    #[tokio::test]
    async fn test_tobs_empty_dataset() {
        let store = seeded_store(&[], &[]).await.unwrap();
        let (status, body) = get_json(store, "/api/v1.0/tobs").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_summary_bounded_range() {
        let store = seeded_store(
            &[],
            &[
                measurement("S1", "2017-08-22", Some(0.0), 1.0),
                measurement("S1", "2017-08-23", Some(0.0), 0.5),
            ],
        )
        .await
        .unwrap();

        let (status, body) = get_json(store, "/api/v1.0/2017-08-22/2017-08-23").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"min": 0.5, "max": 1.0, "avg": 0.75}));
    }

    #[tokio::test]
    async fn test_summary_open_range() {
        let (status, body) = get_json(hawaii_store().await, "/api/v1.0/2017-08-19").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"min": 76.0, "max": 81.0, "avg": 78.5}));
    }

    #[tokio::test]
    async fn test_summary_without_matches_is_null() {
        let null = json!({"min": null, "max": null, "avg": null});

        let (status, body) = get_json(hawaii_store().await, "/api/v1.0/2020-01-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, null);

        let (_, body) = get_json(hawaii_store().await, "/api/v1.0/2017-08-23/2016-08-23").await;
        assert_eq!(body, null);
    }

    #[tokio::test]
    async fn test_summary_accepts_unparsed_dates() {
        // Compared as text: "not-a-date" sorts after every ISO date.
        let (status, body) = get_json(hawaii_store().await, "/api/v1.0/not-a-date").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"min": null, "max": null, "avg": null}));

        // "2017" sorts before every 2017-xx-xx date.
        let (status, body) = get_json(hawaii_store().await, "/api/v1.0/2017").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["min"], json!(72.0));
    }

    #[tokio::test]
    async fn test_integer_readings_are_served() {
        let store = seeded_integer_store(
            &[],
            &[
                measurement("S1", "2017-08-22", Some(0.0), 70.0),
                measurement("S1", "2017-08-23", Some(1.0), 75.0),
            ],
        )
        .await
        .unwrap();

        let (status, body) = get_json(store.clone(), "/api/v1.0/tobs").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"date": "2017-08-22", "temperature": 70.0},
                {"date": "2017-08-23", "temperature": 75.0}
            ])
        );

        let (status, body) = get_json(store.clone(), "/api/v1.0/2017-08-22/2017-08-23").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"min": 70.0, "max": 75.0, "avg": 72.5}));

        let (status, body) = get_json(store, "/api/v1.0/precipitation").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"2017-08-22": 0.0, "2017-08-23": 1.0}));
    }

    #[tokio::test]
    async fn test_storage_failure_is_server_error() {
        let store = unseeded_store().await.unwrap();
        let (status, body) = get_json(store, "/api/v1.0/stations").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("no such table"));
    }

    #[test]
    fn test_invalid_log_level() {
        let config = LoggingConfig {
            level: "loud".to_string(),
            json: false,
        };
        assert!(matches!(
            init_logging(&config),
            Err(ConfigError::InvalidLogLevel(level)) if level == "loud"
        ));
    }
}
