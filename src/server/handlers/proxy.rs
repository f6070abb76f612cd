use actix_web::http::header::{HeaderMap, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::web::Bytes;
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder};
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error};
use reqwest::redirect::Policy;
use reqwest::Method;

use crate::server::response::Response;

use super::Forwarder;

/// Headers that only make sense for a single connection and are never
/// relayed.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// Relays forwarded requests to the upstream server.
pub struct ProxyForwarder {
    upstream: String,
    client: reqwest::Client,
}

impl ProxyForwarder {
    pub fn new(upstream: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .context("build upstream client")?;
        Ok(Self {
            upstream: upstream.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn upstream_url(&self, req: &HttpRequest) -> String {
        let path = match req.uri().path_and_query() {
            Some(path) => path.as_str(),
            None => "/",
        };
        format!("{}{path}", self.upstream)
    }

    async fn send(
        &self,
        req: &HttpRequest,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<HttpResponse> {
        let method =
            Method::from_bytes(req.method().as_str().as_bytes()).context("convert method")?;
        let url = self.upstream_url(req);
        debug!("Forwarding {method} {url}");

        let mut upstream_req = self.client.request(method, &url);
        for (name, value) in headers.iter() {
            if is_hop_by_hop(name.as_str()) {
                continue;
            }
            upstream_req = upstream_req.header(name.as_str(), value.as_bytes());
        }

        let upstream_resp = upstream_req
            .body(body.to_vec())
            .send()
            .await
            .with_context(|| format!("send request to '{url}'"))?;

        let status = StatusCode::from_u16(upstream_resp.status().as_u16())
            .context("convert upstream status")?;
        let mut resp = HttpResponseBuilder::new(status);
        for (name, value) in upstream_resp.headers().iter() {
            if is_hop_by_hop(name.as_str()) {
                continue;
            }
            match HeaderValue::from_bytes(value.as_bytes()) {
                Ok(value) => {
                    resp.append_header((name.as_str(), value));
                }
                Err(_) => debug!("Drop invalid upstream header '{name}'"),
            }
        }

        let body = upstream_resp
            .bytes()
            .await
            .context("read upstream response body")?;
        Ok(resp.body(body.to_vec()))
    }
}

#[async_trait(?Send)]
impl Forwarder for ProxyForwarder {
    async fn forward(&self, req: &HttpRequest, headers: HeaderMap, body: Bytes) -> HttpResponse {
        match self.send(req, headers, body).await {
            Ok(resp) => resp,
            Err(err) => {
                error!("Forward {} {} failed: {err:#}", req.method(), req.path());
                Response::bad_gateway("upstream unavailable").into()
            }
        }
    }
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|hop| name.eq_ignore_ascii_case(hop))
}
