use actix_web::http::header::{self, HeaderMap, HeaderValue};
use log::debug;

use super::{RequestContext, BEARER_SCHEME};

/// Extracts the bearer token of the request.
///
/// A non-empty `Authorization` header always wins: the token is whatever
/// follows the bearer scheme, and any other scheme yields no token without
/// looking at cookies. Otherwise the session cookie is used, with an optional
/// `<cookie_name>=` prefix stripped, and the outgoing `Authorization` header
/// is rewritten to carry it.
pub fn extract(ctx: RequestContext, cookie_name: &str) -> RequestContext {
    if let Some(value) = ctx.headers.get(header::AUTHORIZATION) {
        if !value.is_empty() {
            let token = value
                .to_str()
                .ok()
                .and_then(|v| v.strip_prefix(BEARER_SCHEME))
                .unwrap_or_default()
                .to_string();
            return RequestContext { token, ..ctx };
        }
    }

    let value = match session_cookie(&ctx.headers, cookie_name) {
        Some(value) => value,
        None => return ctx,
    };
    let prefix = format!("{cookie_name}=");
    let token = value.strip_prefix(&prefix).unwrap_or(&value).to_string();

    let authorization = match HeaderValue::from_str(&format!("{BEARER_SCHEME}{token}")) {
        Ok(authorization) => authorization,
        Err(_) => {
            debug!("Ignore session cookie '{cookie_name}' with invalid characters");
            return ctx;
        }
    };

    let mut headers = ctx.headers;
    headers.insert(header::AUTHORIZATION, authorization);
    RequestContext {
        headers,
        token,
        ..ctx
    }
}

/// Returns the value of the first cookie named `name`.
fn session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let value = match value.to_str() {
            Ok(value) => value,
            Err(_) => continue,
        };
        for pair in value.split(';') {
            let (key, value) = match pair.trim().split_once('=') {
                Some(kv) => kv,
                None => continue,
            };
            if key.trim() != name {
                continue;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            return Some(value.to_string());
        }
    }
    None
}
