//! Logs API calls at a configurable verbosity.
//!
//! Every route is a GET driven by query parameters, so the request line is
//! logged with its query. Headers and small JSON bodies are logged on demand.

use super::super::state::ServerState;
use axum::extract::State;
use axum::{
    body::Body,
    http::{header::HeaderMap, Request, Response, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use std::time::Instant;
use tracing::{error, info};

#[derive(PartialEq, PartialOrd, Clone, Debug, Default, clap::ValueEnum)]
pub enum RequestsLoggingLevel {
    None,
    #[default]
    Path,
    Headers,
    Body,
}

impl std::fmt::Display for RequestsLoggingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Larger bodies are only measured.
const MAX_LOGGED_BODY_BYTES: usize = 2048;

fn content_length(headers: &HeaderMap) -> Result<usize, &'static str> {
    headers
        .get("content-length")
        .ok_or("no content-length")?
        .to_str()
        .map_err(|_| "unreadable content-length")?
        .parse::<usize>()
        .map_err(|_| "non-numeric content-length")
}

fn log_headers(label: &str, headers: &HeaderMap) {
    info!("  {} headers:", label);
    for (name, value) in headers.iter() {
        info!("    {}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
}

/// Prints `body` when it is small enough and hands it back intact.
async fn log_body(label: &str, headers: &HeaderMap, body: Body) -> Result<Body, axum::Error> {
    match content_length(headers) {
        Err(reason) => {
            info!("  {} body: {}", label, reason);
            Ok(body)
        }
        Ok(0) => Ok(body),
        Ok(size) if size > MAX_LOGGED_BODY_BYTES => {
            info!(
                "  {} body: {:#}, not printed",
                label,
                byte_unit::Byte::from(size)
            );
            Ok(body)
        }
        Ok(size) => {
            let bytes = axum::body::to_bytes(body, size).await?;
            info!(
                "  {} body ({:#}):\n{}",
                label,
                byte_unit::Byte::from(size),
                String::from_utf8_lossy(&bytes)
            );
            Ok(Body::from(bytes))
        }
    }
}

fn internal_error() -> Response<Body> {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

pub async fn log_requests(
    State(state): State<ServerState>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let level = state.config.requests_logging_level.clone();
    if level == RequestsLoggingLevel::None {
        return next.run(request).await;
    }

    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    match request.uri().query() {
        Some(query) => info!(">>> {} {}?{}", method, path, query),
        None => info!(">>> {} {}", method, path),
    }

    let mut request = request;
    if level >= RequestsLoggingLevel::Headers {
        log_headers("Request", request.headers());
    }
    if level >= RequestsLoggingLevel::Body {
        let (parts, body) = request.into_parts();
        match log_body("Request", &parts.headers, body).await {
            Ok(body) => request = Request::from_parts(parts, body),
            Err(err) => {
                error!("Failed to read request body of {}: {}", path, err);
                return internal_error();
            }
        }
    }

    let mut response = next.run(request).await;

    if level >= RequestsLoggingLevel::Headers {
        log_headers("Response", response.headers());
    }
    if level >= RequestsLoggingLevel::Body {
        let (parts, body) = response.into_parts();
        match log_body("Response", &parts.headers, body).await {
            Ok(body) => response = Response::from_parts(parts, body),
            Err(err) => {
                error!("Failed to read response body of {}: {}", path, err);
                return internal_error();
            }
        }
    }

    info!(
        "<<< {} {} {} ({}ms)",
        method,
        path,
        response.status().as_u16(),
        start.elapsed().as_millis()
    );
    response
}
