use std::sync::Arc;
use std::time::Duration;

use actix_web::web::{self, Data, Payload, ServiceConfig};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use openssl::ssl::SslAcceptorBuilder;
use sd_notify::NotifyState;

use super::gate::{Decision, Gate};
use super::handlers::healthz::HealthzHandler;
use super::handlers::Forwarder;
use super::response::Response;

pub struct RestfulServer {
    ssl: Option<SslAcceptorBuilder>,
    ctx: Arc<RestfulContext>,

    keep_alive_secs: Option<u64>,
    workers: Option<u64>,

    bind: String,

    payload_limit_mib: usize,
}

/// Largest request body forwarded upstream, in bytes.
struct PayloadLimit(usize);

pub struct RestfulContext {
    pub gate: Gate,
    pub forwarder: Arc<dyn Forwarder>,
    pub healthz_handler: HealthzHandler,
}

impl RestfulServer {
    const HEALTHZ_PATH: &str = "/healthz";

    pub fn new(
        bind: String,
        ssl: Option<SslAcceptorBuilder>,
        ctx: Arc<RestfulContext>,
        payload_limit_mib: usize,
    ) -> Self {
        Self {
            ssl,
            ctx,
            keep_alive_secs: None,
            workers: None,
            bind,
            payload_limit_mib,
        }
    }

    pub fn set_keep_alive_secs(&mut self, keep_alive_secs: u64) {
        self.keep_alive_secs = Some(keep_alive_secs);
    }

    pub fn set_workers(&mut self, workers: u64) {
        self.workers = Some(workers);
    }

    /// Registers the routes: `/healthz` is served directly, every other
    /// request goes through the gate.
    pub fn configure(
        ctx: Arc<RestfulContext>,
        payload_limit_mib: usize,
    ) -> impl FnOnce(&mut ServiceConfig) {
        move |cfg| {
            cfg.app_data(Data::new(ctx))
                .app_data(Data::new(PayloadLimit(payload_limit_mib * 1024 * 1024)))
                .service(
                    web::resource(Self::HEALTHZ_PATH).route(web::get().to(Self::handle_healthz)),
                )
                .default_service(web::to(Self::handle_gate));
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let ctx = self.ctx.clone();
        let payload_limit_mib = self.payload_limit_mib;
        let mut srv = HttpServer::new(move || {
            App::new().configure(Self::configure(ctx.clone(), payload_limit_mib))
        });

        if let Some(ssl) = self.ssl.take() {
            info!("Binding to https://{}", self.bind);
            srv = srv.bind_openssl(&self.bind, ssl).context("bind with ssl")?
        } else {
            warn!("Using HTTP (without SSL). THIS IS DANGEROUS, DO NOT USE IN PRODUCTION");
            info!("Binding to http://{}", self.bind);
            srv = srv.bind(&self.bind).context("bind without ssl")?
        };

        if let Some(keep_alive) = self.keep_alive_secs {
            srv = srv.keep_alive(Duration::from_secs(keep_alive));
        }
        if let Some(workers) = self.workers {
            srv = srv.workers(workers as usize);
        }

        sd_notify::notify(true, &[NotifyState::Ready]).context("notify systemd")?;
        info!("Starting gate server");
        srv.run().await.context("run server")?;

        info!("Server stopped by user");
        Ok(())
    }

    async fn handle_healthz(req: HttpRequest, ctx: Data<Arc<RestfulContext>>) -> HttpResponse {
        ctx.healthz_handler.handle(&req).into()
    }

    /// Runs the gate, then either forwards the request or answers it.
    ///
    /// The body is only read once the request is allowed through, so refused
    /// callers never make the gate buffer anything.
    ///
    /// Dropping this future (client gone) drops every pending collaborator
    /// call with it.
    async fn handle_gate(
        req: HttpRequest,
        payload: Payload,
        ctx: Data<Arc<RestfulContext>>,
        limit: Data<PayloadLimit>,
    ) -> HttpResponse {
        let decision = ctx.gate.decide(&req).await;
        let gate_ctx = match decision {
            Decision::Forward(gate_ctx) => gate_ctx,
            decision => {
                return match Response::from_decision(&decision) {
                    Some(resp) => resp.into(),
                    None => Response::error("gate produced no response").into(),
                };
            }
        };

        let body = match payload.to_bytes_limited(limit.0).await {
            Ok(Ok(body)) => body,
            Ok(Err(err)) => {
                debug!("Read body of {} failed: {err}", req.path());
                return Response::bad_request("invalid request body").into();
            }
            Err(_) => return Response::payload_too_large().into(),
        };

        gate_ctx.attach(&req);
        ctx.forwarder.forward(&req, gate_ctx.headers, body).await
    }
}
