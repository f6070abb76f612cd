use actix_web::HttpRequest;
use url::form_urlencoded;

use crate::config::is_http_url;
use crate::server::response::UNAUTHORIZED_MESSAGE;

use super::{Decision, RequestContext};

const REDIRECT_QUERY: &str = "redirect_to";

/// Decides the fate of an anonymous request the verifier refused.
///
/// Without a login page the request is unauthorized. The login page itself
/// is forwarded so it can be served, anything else is redirected to it.
pub fn fallback(ctx: RequestContext, req: &HttpRequest, login_url: &str) -> Decision {
    if login_url.is_empty() {
        return Decision::Unauthorized(String::from(UNAUTHORIZED_MESSAGE));
    }

    if is_login_page(req, login_url) {
        return Decision::Forward(ctx);
    }

    Decision::RedirectToLogin(redirect_location(login_url, &req.uri().to_string()))
}

/// Tells whether the request targets the login page.
///
/// Queries are ignored on both sides: the login URL may carry its own, and
/// the redirect adds `redirect_to`. An absolute login URL is compared with the
/// scheme and host from the connection info, which honors `Forwarded` and
/// `X-Forwarded-*` headers, so the gate must sit behind a proxy that sets
/// them or strips them.
fn is_login_page(req: &HttpRequest, login_url: &str) -> bool {
    let login_page = strip_query(login_url);
    if is_http_url(login_page) {
        return absolute_url(req) == login_page;
    }
    req.path() == login_page
}

fn strip_query(url: &str) -> &str {
    match url.split_once(['?', '#']) {
        Some((url, _)) => url,
        None => url,
    }
}

fn absolute_url(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}{}", info.scheme(), info.host(), req.path())
}

/// Builds `<login_url>?redirect_to=<original>`, keeping any query the login
/// URL already has.
pub fn redirect_location(login_url: &str, original: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(REDIRECT_QUERY, original)
        .finish();
    let sep = if login_url.contains('?') { '&' } else { '?' };
    format!("{login_url}{sep}{query}")
}

#[cfg(test)]
mod tests {
    use actix_web::http::header;
    use actix_web::test::TestRequest;

    use crate::server::resolver::Endpoint;

    use super::*;

    fn context(req: &HttpRequest) -> RequestContext {
        RequestContext::new(Endpoint::unrouted(req.path()), req.headers().clone())
    }

    fn decide(req: TestRequest, login_url: &str) -> Decision {
        let req = req.to_http_request();
        fallback(context(&req), &req, login_url)
    }

    #[test]
    fn test_no_login_url() {
        let decision = decide(TestRequest::with_uri("/dashboard"), "");
        match decision {
            Decision::Unauthorized(msg) => assert_eq!(msg, UNAUTHORIZED_MESSAGE),
            decision => panic!("unexpected decision {decision:?}"),
        }
    }

    #[test]
    fn test_relative_login_url() {
        let decision = decide(TestRequest::with_uri("/login"), "/login");
        assert!(matches!(decision, Decision::Forward(_)));

        // The query is not part of the comparison
        let decision = decide(TestRequest::with_uri("/login?next=1"), "/login");
        assert!(matches!(decision, Decision::Forward(_)));

        let decision = decide(TestRequest::with_uri("/dashboard"), "/login");
        match decision {
            Decision::RedirectToLogin(location) => {
                assert_eq!(location, "/login?redirect_to=%2Fdashboard")
            }
            decision => panic!("unexpected decision {decision:?}"),
        }
    }

    #[test]
    fn test_absolute_login_url() {
        let login_url = "http://auth.example.com/login";

        let req = TestRequest::with_uri("/login")
            .insert_header((header::HOST, "auth.example.com"));
        assert!(matches!(decide(req, login_url), Decision::Forward(_)));

        // Same path on another host is not the login page
        let req = TestRequest::with_uri("/login")
            .insert_header((header::HOST, "app.example.com"));
        match decide(req, login_url) {
            Decision::RedirectToLogin(location) => assert_eq!(
                location,
                "http://auth.example.com/login?redirect_to=%2Flogin"
            ),
            decision => panic!("unexpected decision {decision:?}"),
        }
    }

    #[test]
    fn test_login_url_with_query() {
        let login_url = "/login?theme=dark";
        let location = match decide(TestRequest::with_uri("/dashboard"), login_url) {
            Decision::RedirectToLogin(location) => location,
            decision => panic!("unexpected decision {decision:?}"),
        };
        assert_eq!(location, "/login?theme=dark&redirect_to=%2Fdashboard");

        // Following the redirect serves the login page
        let decision = decide(TestRequest::with_uri(&location), login_url);
        assert!(matches!(decision, Decision::Forward(_)));
    }

    #[test]
    fn test_absolute_login_url_after_redirect() {
        let login_url = "http://auth.example.com/login";
        let req = TestRequest::with_uri("/dashboard")
            .insert_header((header::HOST, "auth.example.com"));
        let location = match decide(req, login_url) {
            Decision::RedirectToLogin(location) => location,
            decision => panic!("unexpected decision {decision:?}"),
        };
        assert_eq!(
            location,
            "http://auth.example.com/login?redirect_to=%2Fdashboard"
        );

        let req = TestRequest::with_uri("/login?redirect_to=%2Fdashboard")
            .insert_header((header::HOST, "auth.example.com"));
        assert!(matches!(decide(req, login_url), Decision::Forward(_)));
    }

    #[test]
    fn test_redirect_location() {
        assert_eq!(
            redirect_location("/login", "/orders?id=1&page=2"),
            "/login?redirect_to=%2Forders%3Fid%3D1%26page%3D2"
        );
        assert_eq!(
            redirect_location("/login?theme=dark", "/"),
            "/login?theme=dark&redirect_to=%2F"
        );
    }
}
