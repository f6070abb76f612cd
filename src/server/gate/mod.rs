mod credential;
mod login;
mod namespace;

use std::sync::Arc;

use actix_web::http::header::HeaderMap;
use actix_web::http::StatusCode;
use actix_web::{HttpMessage, HttpRequest};
use log::{debug, error, warn};

use super::authn::{Account, Inspector};
use super::authz::{Resource, Verifier, VerifyError};
use super::blocklist::BlockList;
use super::resolver::{Endpoint, Resolver};
use super::response::UNAUTHORIZED_MESSAGE;

/// Prefix of a bearer credential in the `Authorization` header.
pub const BEARER_SCHEME: &str = "Bearer ";

/// Header carrying the namespace of a request, both inbound (declared by the
/// caller) and outbound (derived by the gate).
pub const NAMESPACE_HEADER: &str = "micro-namespace";

/// Per-request state threaded through the pipeline stages.
///
/// Each stage consumes the context and returns a new one, so a stage can
/// never observe a half-updated context.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub endpoint: Endpoint,
    /// Headers sent to the forwarded handler, including the gate annotations.
    pub headers: HeaderMap,
    /// Bearer token, empty if the request carries none.
    pub token: String,
    pub account: Option<Account>,
    pub namespace: String,
}

impl RequestContext {
    pub fn new(endpoint: Endpoint, headers: HeaderMap) -> Self {
        Self {
            endpoint,
            headers,
            token: String::new(),
            account: None,
            namespace: String::new(),
        }
    }

    /// Makes the gate results readable by in-process handlers through the
    /// request extensions.
    pub fn attach(&self, req: &HttpRequest) {
        let mut extensions = req.extensions_mut();
        extensions.insert(self.endpoint.clone());
        extensions.insert(Namespace(self.namespace.clone()));
        if let Some(account) = self.account.as_ref() {
            extensions.insert(account.clone());
        }
    }
}

/// Namespace of the request, stored in the request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace(pub String);

/// The terminal outcome of the gate for one request.
#[derive(Debug)]
pub enum Decision {
    Forward(RequestContext),
    Unauthorized(String),
    Forbidden,
    InternalError(String),
    RedirectToLogin(String),
}

impl Decision {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Decision::Forward(_) => None,
            Decision::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            Decision::Forbidden => Some(StatusCode::FORBIDDEN),
            Decision::InternalError(_) => Some(StatusCode::INTERNAL_SERVER_ERROR),
            Decision::RedirectToLogin(_) => Some(StatusCode::TEMPORARY_REDIRECT),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Decision::Forward(_) => "forward",
            Decision::Unauthorized(_) => "unauthorized",
            Decision::Forbidden => "forbidden",
            Decision::InternalError(_) => "internal error",
            Decision::RedirectToLogin(_) => "redirect to login",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GateOptions {
    /// Name of the session cookie holding the token.
    pub token_cookie: String,
    /// Login page for anonymous callers, empty to answer 401 instead.
    pub login_url: String,
    /// Prepended to service names when building resources.
    pub service_prefix: String,
}

/// Decides, for every request, whether it is forwarded, rejected or
/// redirected to the login page.
pub struct Gate {
    resolver: Arc<dyn Resolver>,
    inspector: Arc<dyn Inspector>,
    blocklist: Arc<dyn BlockList>,
    verifier: Arc<dyn Verifier>,
    options: GateOptions,
}

impl Gate {
    pub fn new(
        resolver: Arc<dyn Resolver>,
        inspector: Arc<dyn Inspector>,
        blocklist: Arc<dyn BlockList>,
        verifier: Arc<dyn Verifier>,
        options: GateOptions,
    ) -> Self {
        Self {
            resolver,
            inspector,
            blocklist,
            verifier,
            options,
        }
    }

    pub fn options(&self) -> &GateOptions {
        &self.options
    }

    pub async fn decide(&self, req: &HttpRequest) -> Decision {
        let decision = self.run(req).await;
        debug!(
            "{} {}: {}",
            req.method(),
            req.uri().path(),
            decision.kind()
        );
        decision
    }

    async fn run(&self, req: &HttpRequest) -> Decision {
        let (mut endpoint, routed) = match self.resolver.resolve(req) {
            Ok(endpoint) => (endpoint, true),
            Err(err) if err.is_recoverable() => {
                debug!("Unrouted request {}: {err}", req.path());
                (Endpoint::unrouted(req.path()), false)
            }
            Err(err) => {
                error!("Resolve request {} failed: {err}", req.path());
                return Decision::InternalError(err.to_string());
            }
        };

        if endpoint.domain.is_empty() {
            if let Some(domain_resolver) = self.resolver.domain_resolver() {
                endpoint.domain = domain_resolver.domain(req);
            }
        }
        if routed {
            req.extensions_mut().insert(endpoint.clone());
        }

        let ctx = RequestContext::new(endpoint, req.headers().clone());
        let ctx = credential::extract(ctx, &self.options.token_cookie);
        let ctx = self.identify(ctx);

        let ctx = match namespace::resolve(ctx) {
            Ok(ctx) => ctx,
            Err(err) => {
                error!("Resolve namespace failed: {err:#}");
                return Decision::InternalError(err.to_string());
            }
        };

        if let Some(account) = ctx.account.as_ref() {
            match self.blocklist.is_blocked(&account.id, &account.issuer).await {
                Ok(true) => {
                    warn!(
                        "Rejected blocked account '{}' issued by '{}'",
                        account.id, account.issuer
                    );
                    return Decision::Unauthorized(String::from(UNAUTHORIZED_MESSAGE));
                }
                Ok(false) => {}
                Err(err) => warn!(
                    "Check blocklist for account '{}' failed, let it pass: {err:#}",
                    account.id
                ),
            }
        }

        let ctx = namespace::scope_account(ctx);

        let resource = Resource::for_endpoint(&ctx.endpoint, &self.options.service_prefix);
        debug!("Resolving {} {}", resource.name, resource.endpoint);

        let result = self
            .verifier
            .verify(ctx.account.as_ref(), &resource, &ctx.namespace)
            .await;
        match result {
            Ok(()) => Decision::Forward(ctx),
            Err(VerifyError::Forbidden) => {
                if ctx.account.is_some() {
                    return Decision::Forbidden;
                }
                login::fallback(ctx, req, &self.options.login_url)
            }
            Err(VerifyError::Other(msg)) => {
                error!(
                    "Verify {} {} in '{}' failed: {msg}",
                    resource.name, resource.endpoint, ctx.namespace
                );
                Decision::InternalError(msg)
            }
        }
    }

    fn identify(&self, ctx: RequestContext) -> RequestContext {
        match self.inspector.inspect(&ctx.token) {
            Ok(account) => RequestContext {
                account: Some(account),
                ..ctx
            },
            Err(err) => {
                if !ctx.token.is_empty() {
                    debug!("Inspect token failed, treating request as anonymous: {err}");
                }
                ctx
            }
        }
    }
}
