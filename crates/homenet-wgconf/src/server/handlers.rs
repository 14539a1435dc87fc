//! Config request handler

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::borrow::Cow;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

use super::AppState;

/// Realm advertised when credentials are missing
pub const AUTH_REALM: &str = "Basic realm=\"wireguard\"";

/// Extract the password from a `Basic` authorization header
pub fn basic_auth_password(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (_user, password) = credentials.split_once(':')?;
    Some(password.to_string())
}

/// Compare two secrets without short-circuiting on the first differing byte
fn secrets_match(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Percent-decode a request path; `None` if it is not valid UTF-8
fn decode_path(path: &str) -> Option<Cow<'_, str>> {
    urlencoding::decode(path).ok()
}

fn no_configs_found() -> Response {
    (StatusCode::BAD_REQUEST, "No configs found\n").into_response()
}

/// Serve `/<host>/<name>` to a client authenticated by private key
///
/// Unknown hosts, unknown configs and wrong keys all get the same answer so
/// the endpoint does not reveal which configs exist.
pub async fn serve_config(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let Some(path) = decode_path(uri.path()) else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let [host, name] = segments[..] else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    let Some(private_key) = basic_auth_password(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, AUTH_REALM)],
            "Missing private key in basic auth\n",
        )
            .into_response();
    };

    let Some(host_configs) = state.store.host(host) else {
        warn!("No host found: {}", host);
        return no_configs_found();
    };

    let Some(config) = host_configs.get(name) else {
        warn!("No config found: {}/{}", host, name);
        return no_configs_found();
    };

    if !secrets_match(&config.private_key, &private_key) {
        warn!("Private keys do not match for {}/{}", host, name);
        return no_configs_found();
    }

    state.served_count.fetch_add(1, Ordering::Relaxed);
    info!("Serving config {}/{}", host, name);
    format!("{}\n", config.contents).into_response()
}
