use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use linklet_core::UserId;
use sha2::{Digest, Sha256};
use std::fmt::Write;

const COOKIE_NAME: &str = "auth";

/// Resolves the caller's identity from the `auth` cookie, issuing a
/// fresh one when the cookie is absent or fails verification.
///
/// The identity is inserted into the request extensions as a typed
/// [`UserId`], which handlers pull out with the `Extension` extractor.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let known = request
        .headers()
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookies| cookie_value(cookies, COOKIE_NAME))
        .and_then(|value| decode_cookie(value, state.auth_secret.as_bytes()));

    let (uid, fresh) = match known {
        Some(uid) => (uid, false),
        None => (UserId::random(), true),
    };

    request.extensions_mut().insert(uid);
    let mut response = next.run(request).await;

    // Re-issue the cookie only when the caller arrived without a valid one.
    if fresh {
        let cookie = format!(
            "{COOKIE_NAME}={}; Path=/; HttpOnly",
            encode_cookie(uid, state.auth_secret.as_bytes())
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// Renders a cookie value: 32 hex characters of identity followed by a
/// 64-character keyed SHA-256 signature.
pub fn encode_cookie(uid: UserId, secret: &[u8]) -> String {
    let mut value = uid.to_hex();
    value.push_str(&signature(uid, secret));
    value
}

/// Parses and verifies a cookie value produced by [`encode_cookie`].
pub fn decode_cookie(value: &str, secret: &[u8]) -> Option<UserId> {
    if value.len() != 96 {
        return None;
    }
    let (uid_hex, sig) = value.split_at(32);
    let uid = UserId::from_hex(uid_hex)?;
    (signature(uid, secret) == sig).then_some(uid)
}

fn signature(uid: UserId, secret: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    hasher.update(uid.as_uuid().as_bytes());
    hasher.finalize().iter().fold(
        String::with_capacity(64),
        |mut hex, byte| {
            let _ = write!(hex, "{byte:02x}");
            hex
        },
    )
}

fn cookie_value<'a>(cookies: &'a str, name: &str) -> Option<&'a str> {
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}
