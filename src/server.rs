use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::{self, Next},
    response::Response,
    Router,
};
use serde_json::json;
use std::{
    path::PathBuf,
    sync::atomic::{AtomicU64, Ordering},
    time::Instant,
};
use tower_http::services::{ServeDir, ServeFile};

use crate::config::{parse_non_empty_string, parse_with_bounds};
use crate::logging::{now_unix_millis, LogLevel, Logger, DEFAULT_LOG_LEVEL};

const DEFAULT_PORT: u16 = 8080;
const PORT_BOUNDS: (u16, u16) = (1, u16::MAX);
const DEFAULT_DIST_DIR: &str = "dist";
const REQUEST_ID_HEADER: &str = "x-request-id";

static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Static host for the `trunk build` output.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub dist_dir: PathBuf,
    pub log_level: LogLevel,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            port: parse_with_bounds(lookup("PORT"), DEFAULT_PORT, PORT_BOUNDS),
            dist_dir: parse_non_empty_string(lookup("DIST_DIR"))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DIST_DIR)),
            log_level: parse_non_empty_string(lookup("LOG_LEVEL"))
                .and_then(|value| LogLevel::parse(&value))
                .unwrap_or(DEFAULT_LOG_LEVEL),
        }
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env();
    let logger = Logger::new(config.log_level);
    let bind_address = format!("0.0.0.0:{}", config.port);

    let static_service = ServeDir::new(&config.dist_dir)
        .not_found_service(ServeFile::new(config.dist_dir.join("index.html")));

    let app = Router::new()
        .fallback_service(static_service)
        .layer(middleware::from_fn_with_state(logger, log_requests));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    logger.info(
        "server_listening",
        json!({
            "url": format!("http://127.0.0.1:{}", config.port),
            "dist_dir": config.dist_dir.display().to_string(),
        }),
    );
    axum::serve(listener, app).await?;
    Ok(())
}

async fn log_requests(State(logger): State<Logger>, request: Request, next: Next) -> Response {
    let request_id = resolve_request_id(request.headers());
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let mut response = next.run(request).await;

    if let Ok(header) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, header);
    }

    logger.info(
        "request_served",
        json!({
            "request_id": request_id,
            "method": method,
            "path": path,
            "status": response.status().as_u16(),
            "duration_ms": started.elapsed().as_millis() as u64,
        }),
    );

    response
}

fn generate_request_id() -> String {
    let counter = REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("req-{}-{counter}", now_unix_millis())
}

fn resolve_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|raw| raw.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(generate_request_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let values: HashMap<&str, &str> = pairs.iter().copied().collect();
        ServerConfig::from_lookup(|name| values.get(name).map(|value| value.to_string()))
    }

    #[test]
    fn server_config_defaults() {
        let config = config_from(&[]);

        assert_eq!(config.port, 8080);
        assert_eq!(config.dist_dir, PathBuf::from("dist"));
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn server_config_rejects_invalid_port() {
        assert_eq!(config_from(&[("PORT", "0")]).port, 8080);
        assert_eq!(config_from(&[("PORT", "70000")]).port, 8080);
        assert_eq!(config_from(&[("PORT", "3000")]).port, 3000);
    }

    #[test]
    fn server_config_reads_dist_dir_and_level() {
        let config = config_from(&[("DIST_DIR", " public "), ("LOG_LEVEL", "warn")]);

        assert_eq!(config.dist_dir, PathBuf::from("public"));
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn incoming_request_id_is_reused() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static(" abc-123 "));

        assert_eq!(resolve_request_id(&headers), "abc-123");
    }

    #[test]
    fn missing_request_id_is_generated() {
        let first = resolve_request_id(&HeaderMap::new());
        let second = resolve_request_id(&HeaderMap::new());

        assert!(first.starts_with("req-"));
        assert_ne!(first, second);
    }
}
