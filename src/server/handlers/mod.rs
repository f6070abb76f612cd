pub mod healthz;
pub mod proxy;

use actix_web::http::header::HeaderMap;
use actix_web::web::Bytes;
use actix_web::{HttpRequest, HttpResponse};
use async_trait::async_trait;

/// Serves a request the gate decided to forward.
///
/// `headers` replaces the inbound headers: it carries the normalized
/// `Authorization` header and the namespace header.
#[async_trait(?Send)]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, req: &HttpRequest, headers: HeaderMap, body: Bytes) -> HttpResponse;
}
