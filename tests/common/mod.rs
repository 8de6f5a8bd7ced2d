//! Shared test utilities

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use herald_gateway::api::{router, ApiState};
use herald_gateway::Config;

/// Multipart boundary used by the hand-rolled form encoder
pub const BOUNDARY: &str = "herald-test-boundary";

/// One part of a multipart form submission
pub enum FormPart<'a> {
    Text {
        name: &'a str,
        value: &'a str,
    },
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

/// Build a config pointed at mock upstream servers
#[must_use]
pub fn test_config(groq_url: &str, cartesia_url: &str) -> Config {
    let mut config = Config::default();
    config.api_keys.groq = Some("test-groq-key".to_string());
    config.api_keys.cartesia = Some("test-cartesia-key".to_string());
    config.upstream.groq_url = groq_url.to_string();
    config.upstream.cartesia_url = cartesia_url.to_string();
    config
}

/// Build a test router against mock upstream servers
#[must_use]
pub fn test_router(groq_url: &str, cartesia_url: &str) -> axum::Router {
    let config = test_config(groq_url, cartesia_url);
    let state = ApiState::from_config(&config).expect("failed to build test state");
    router(Arc::new(state))
}

/// Encode parts as a multipart/form-data body
#[must_use]
pub fn multipart_body(parts: &[FormPart]) -> Vec<u8> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            FormPart::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            FormPart::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; \
                         filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Build a POST /api/turn request from form parts
#[must_use]
pub fn turn_request(parts: &[FormPart]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/turn")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .expect("failed to build request")
}

/// Read and percent-decode a response header, `None` when absent
#[must_use]
pub fn decoded_header(response: &axum::http::Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| urlencoding::decode(v).ok())
        .map(std::borrow::Cow::into_owned)
}
