use actix_web::HttpRequest;
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::server::response::Response;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthzResponse {
    pub now: u64,
    pub version: String,
    pub client_ip: Option<String>,
}

pub struct HealthzHandler;

impl HealthzHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, req: &HttpRequest) -> Response {
        let now = Local::now().timestamp() as u64;
        let response = HealthzResponse {
            now,
            version: env!("CARGO_PKG_VERSION").to_string(),
            client_ip: req.connection_info().peer_addr().map(|a| a.to_string()),
        };
        Response::json(response)
    }
}
