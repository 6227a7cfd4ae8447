use std::path::PathBuf;

use axum::http::{header, HeaderMap};

pub const TOKEN_COOKIE: &str = "token";
/// URL-safe base64 of 16 random bytes.
const TOKEN_LEN: usize = 24;

/// Decides whether a request token grants access. Session issuance lives
/// elsewhere; this only checks.
pub trait Authorizer: Send + Sync {
    fn is_authorized(&self, token: &str) -> bool;
}

/// A token is valid while a file of the same name exists in the sessions
/// directory.
pub struct SessionDirAuthorizer {
    dir: PathBuf,
}

impl SessionDirAuthorizer {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl Authorizer for SessionDirAuthorizer {
    fn is_authorized(&self, token: &str) -> bool {
        is_token_shaped(token) && self.dir.join(token).is_file()
    }
}

pub struct AllowAll;

impl Authorizer for AllowAll {
    fn is_authorized(&self, _token: &str) -> bool {
        true
    }
}

// Also keeps tokens from naming anything outside the sessions directory.
fn is_token_shaped(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'='))
}

pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }
    extract_token_cookie(headers)
}

fn extract_token_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie| parse_cookie_value(cookie, TOKEN_COOKIE))
}

fn parse_cookie_value(cookie: &str, name: &str) -> Option<String> {
    for part in cookie.split(';') {
        let part = part.trim();
        let mut iter = part.splitn(2, '=');
        let key = iter.next()?.trim();
        let value = match iter.next() {
            Some(value) => value.trim(),
            None => continue,
        };
        if key == name && !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}
