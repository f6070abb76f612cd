use std::collections::HashMap;
use std::sync::Arc;

use actix_web::body::to_bytes;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::{self, HeaderMap};
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::web::Bytes;
use actix_web::{App, HttpRequest, HttpResponse};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use micro_gate::server::authn::jwt::{Claims, JwtInspector};
use micro_gate::server::authz::rule::{Access, ResourcePattern, Rule, RuleVerifier};
use micro_gate::server::blocklist::config::BlockedAccount;
use micro_gate::server::blocklist::MemoryBlockList;
use micro_gate::server::gate::{Gate, GateOptions, NAMESPACE_HEADER};
use micro_gate::server::handlers::healthz::HealthzHandler;
use micro_gate::server::handlers::Forwarder;
use micro_gate::server::resolver::{RouteTable, RpcResolver};
use micro_gate::server::response::{FORBIDDEN_MESSAGE, UNAUTHORIZED_MESSAGE};
use micro_gate::server::restful::{RestfulContext, RestfulServer};

const SECRET: &[u8] = b"integration-test-secret";

/// Answers `forwarded <authorization>|<namespace>` from the headers the gate
/// hands over.
struct EchoForwarder;

#[async_trait(?Send)]
impl Forwarder for EchoForwarder {
    async fn forward(&self, _req: &HttpRequest, headers: HeaderMap, _body: Bytes) -> HttpResponse {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        HttpResponse::Ok().body(format!(
            "forwarded {}|{}",
            get(header::AUTHORIZATION.as_str()),
            get(NAMESPACE_HEADER)
        ))
    }
}

fn token(id: &str, issuer: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: id.to_string(),
        iss: issuer.to_string(),
        exp: (now + 600) as usize,
        iat: now as usize,
        nbf: None,
        scopes: vec![],
        metadata: HashMap::new(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET),
    )
    .unwrap()
}

/// Grants any authenticated account access to `service`.
fn account_rule(service: &str) -> Rule {
    Rule {
        id: format!("accounts-{service}"),
        namespace: String::new(),
        scope: String::from("*"),
        resource: ResourcePattern {
            kind: String::from("service"),
            name: service.to_string(),
            endpoint: String::from("*"),
        },
        access: Access::Granted,
        priority: 0,
    }
}

/// Grants everyone access to requests with the given resource endpoint.
fn public_rule(endpoint: &str) -> Rule {
    Rule {
        id: format!("public-{endpoint}"),
        namespace: String::new(),
        scope: String::new(),
        resource: ResourcePattern {
            kind: String::from("*"),
            name: String::from("*"),
            endpoint: endpoint.to_string(),
        },
        access: Access::Granted,
        priority: 0,
    }
}

fn context(rules: Vec<Rule>, login_url: &str) -> Arc<RestfulContext> {
    let services = ["users", "orders"].iter().map(|s| s.to_string()).collect();
    let resolver = RpcResolver::new(RouteTable::new(String::from("micro"), services));
    let blocklist = MemoryBlockList::new(&[BlockedAccount {
        id: String::from("mallory"),
        issuer: String::from("micro"),
    }]);

    let gate = Gate::new(
        Arc::new(resolver),
        Arc::new(JwtInspector::with_secret(SECRET, 0)),
        Arc::new(blocklist),
        Arc::new(RuleVerifier::new(rules)),
        GateOptions {
            token_cookie: String::from("micro-token"),
            login_url: login_url.to_string(),
            service_prefix: String::new(),
        },
    );
    Arc::new(RestfulContext {
        gate,
        forwarder: Arc::new(EchoForwarder),
        healthz_handler: HealthzHandler::new(),
    })
}

async fn call(ctx: Arc<RestfulContext>, req: TestRequest) -> (StatusCode, HeaderMap, String) {
    let app = test::init_service(App::new().configure(RestfulServer::configure(ctx, 1))).await;
    let resp: ServiceResponse = test::call_service(&app, req.to_request()).await;
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = to_bytes(resp.into_body()).await.unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

fn bearer(uri: &str, token: &str) -> TestRequest {
    TestRequest::get()
        .uri(uri)
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
}

#[actix_web::test]
async fn test_unrouted_request_reaches_decision() {
    // Unknown service, no rule: anonymous callers are rejected
    let ctx = context(vec![], "");
    let (status, _, body) = call(ctx, TestRequest::get().uri("/favicon.ico")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, UNAUTHORIZED_MESSAGE);

    // The raw path is the resource endpoint. The endpoint has no domain, so
    // neither has the namespace
    let ctx = context(vec![public_rule("/favicon.ico")], "");
    let (status, _, body) = call(ctx, TestRequest::get().uri("/favicon.ico")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "forwarded |");

    // Malformed path
    let ctx = context(vec![], "/login");
    let (status, headers, _) = call(ctx, TestRequest::get().uri("/")).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        "/login?redirect_to=%2F"
    );
}

#[actix_web::test]
async fn test_bearer_header_wins_over_cookie() {
    let ctx = context(vec![account_rule("users")], "");
    let alice = token("alice", "micro");
    let req = bearer("/users/read", &alice)
        .insert_header((header::COOKIE, "micro-token=not-a-token"));
    let (status, _, body) = call(ctx, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, format!("forwarded Bearer {alice}|micro"));
}

#[actix_web::test]
async fn test_cookie_rewrites_authorization() {
    let ctx = context(vec![account_rule("users")], "");
    let alice = token("alice", "micro");
    let req = TestRequest::get()
        .uri("/users/read")
        .insert_header((header::COOKIE, format!("theme=dark; micro-token={alice}")));
    let (status, _, body) = call(ctx, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, format!("forwarded Bearer {alice}|micro"));
}

#[actix_web::test]
async fn test_foreign_account_is_anonymous() {
    let ctx = context(vec![account_rule("users")], "");
    let req = bearer("/users/read", &token("alice", "micro"))
        .insert_header((NAMESPACE_HEADER, "acme"));
    let (status, _, _) = call(ctx, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A public resource still serves it, without the account
    let ctx = context(vec![public_rule("Users.Read")], "");
    let req = bearer("/users/read", &token("alice", "micro"))
        .insert_header((NAMESPACE_HEADER, "acme"));
    let (status, _, body) = call(ctx, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.ends_with("|acme"));
}

#[actix_web::test]
async fn test_blocked_account() {
    let ctx = context(vec![account_rule("users"), public_rule("*")], "/login");
    let (status, _, body) = call(ctx, bearer("/users/read", &token("mallory", "micro"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, UNAUTHORIZED_MESSAGE);
}

#[actix_web::test]
async fn test_anonymous_without_login_url() {
    let ctx = context(vec![account_rule("users")], "");
    let (status, _, body) = call(ctx, TestRequest::get().uri("/users/read")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, UNAUTHORIZED_MESSAGE);
}

#[actix_web::test]
async fn test_login_page_is_served() {
    let ctx = context(vec![], "/login");
    let (status, _, body) = call(ctx, TestRequest::get().uri("/login")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("forwarded "));
}

#[actix_web::test]
async fn test_anonymous_redirected_to_login() {
    let ctx = context(vec![], "/login");
    let (status, headers, _) = call(ctx, TestRequest::get().uri("/dashboard")).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        "/login?redirect_to=%2Fdashboard"
    );
}

#[actix_web::test]
async fn test_login_redirect_with_query() {
    let ctx = context(vec![], "/login?theme=dark");
    let (status, headers, _) = call(ctx.clone(), TestRequest::get().uri("/dashboard")).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    let location = headers.get(header::LOCATION).unwrap().to_str().unwrap();
    assert_eq!(location, "/login?theme=dark&redirect_to=%2Fdashboard");

    // Following the redirect lands on the login page
    let (status, _, body) = call(ctx, TestRequest::get().uri(location)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("forwarded "));
}

#[actix_web::test]
async fn test_oversized_body() {
    let body = vec![b'x'; 2 * 1024 * 1024];

    // Refused requests are answered before the body is read
    let ctx = context(vec![], "/login");
    let req = TestRequest::post()
        .uri("/dashboard")
        .set_payload(body.clone());
    let (status, headers, _) = call(ctx, req).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        "/login?redirect_to=%2Fdashboard"
    );

    let ctx = context(vec![account_rule("orders")], "");
    let req = TestRequest::post()
        .uri("/users/create")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token("alice", "micro"))))
        .set_payload(body.clone());
    let (status, _, body_text) = call(ctx, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body_text, FORBIDDEN_MESSAGE);

    // Allowed requests are held to the payload limit
    let ctx = context(vec![account_rule("users")], "");
    let alice = token("alice", "micro");
    let req = TestRequest::post()
        .uri("/users/create")
        .insert_header((header::AUTHORIZATION, format!("Bearer {alice}")))
        .set_payload(body);
    let (status, _, _) = call(ctx.clone(), req).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let req = TestRequest::post()
        .uri("/users/create")
        .insert_header((header::AUTHORIZATION, format!("Bearer {alice}")))
        .set_payload(vec![b'x'; 1024]);
    let (status, _, body_text) = call(ctx, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body_text, format!("forwarded Bearer {alice}|micro"));
}

#[actix_web::test]
async fn test_account_forbidden() {
    for login_url in ["", "/login"] {
        let ctx = context(vec![account_rule("orders")], login_url);
        let (status, _, body) = call(ctx, bearer("/users/read", &token("alice", "micro"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, FORBIDDEN_MESSAGE);
    }
}

#[actix_web::test]
async fn test_account_forwarded_with_namespace() {
    let ctx = context(vec![account_rule("users")], "/login");
    let alice = token("alice", "micro");
    let (status, _, body) = call(ctx, bearer("/users/read", &alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, format!("forwarded Bearer {alice}|micro"));
}

#[actix_web::test]
async fn test_healthz_skips_gate() {
    let ctx = context(vec![], "");
    let (status, _, body) = call(ctx, TestRequest::get().uri("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    let healthz: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(healthz["version"], env!("CARGO_PKG_VERSION"));
}
