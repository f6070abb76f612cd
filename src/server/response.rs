use actix_web::http::header;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder};
use serde::Serialize;

use super::gate::Decision;

pub const UNAUTHORIZED_MESSAGE: &str = "unauthorized request";
pub const FORBIDDEN_MESSAGE: &str = "Forbidden request";

const MIME_TEXT: &str = "text/plain; charset=utf-8";

/// A wrapper struct for HTTP responses written by the gate itself.
///
/// Error bodies are plain text.
pub struct Response {
    http_response: HttpResponse,
}

impl Response {
    pub fn unauthorized(message: impl AsRef<str>) -> Self {
        Self::text_response(StatusCode::UNAUTHORIZED, message.as_ref())
    }

    pub fn forbidden() -> Self {
        Self::text_response(StatusCode::FORBIDDEN, FORBIDDEN_MESSAGE)
    }

    pub fn error(message: impl AsRef<str>) -> Self {
        Self::text_response(StatusCode::INTERNAL_SERVER_ERROR, message.as_ref())
    }

    pub fn bad_gateway(message: impl AsRef<str>) -> Self {
        Self::text_response(StatusCode::BAD_GATEWAY, message.as_ref())
    }

    pub fn bad_request(message: impl AsRef<str>) -> Self {
        Self::text_response(StatusCode::BAD_REQUEST, message.as_ref())
    }

    pub fn payload_too_large() -> Self {
        Self::text_response(StatusCode::PAYLOAD_TOO_LARGE, "request body too large")
    }

    /// Temporary redirect, the client keeps the method and body.
    pub fn redirect(location: &str) -> Self {
        let http_response = HttpResponse::TemporaryRedirect()
            .insert_header((header::LOCATION, location))
            .finish();
        Self { http_response }
    }

    pub fn json<T: Serialize>(data: T) -> Self {
        Self {
            http_response: HttpResponse::Ok().json(data),
        }
    }

    /// Response of a decision that is not forwarded. `None` for
    /// [`Decision::Forward`].
    pub fn from_decision(decision: &Decision) -> Option<Self> {
        let resp = match decision {
            Decision::Forward(_) => return None,
            Decision::Unauthorized(message) => Self::unauthorized(message),
            Decision::Forbidden => Self::forbidden(),
            Decision::InternalError(message) => Self::error(message),
            Decision::RedirectToLogin(location) => Self::redirect(location),
        };
        Some(resp)
    }

    fn text_response(status: StatusCode, message: &str) -> Self {
        let http_response = HttpResponseBuilder::new(status)
            .insert_header((header::CONTENT_TYPE, MIME_TEXT))
            .body(message.to_string());
        Self { http_response }
    }
}

impl From<Response> for HttpResponse {
    fn from(val: Response) -> Self {
        val.http_response
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;

    async fn body(resp: Response) -> (StatusCode, String) {
        let resp: HttpResponse = resp.into();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[actix_web::test]
    async fn test_from_decision() {
        let resp = Response::from_decision(&Decision::Forbidden).unwrap();
        assert_eq!(
            body(resp).await,
            (StatusCode::FORBIDDEN, String::from(FORBIDDEN_MESSAGE))
        );

        let resp =
            Response::from_decision(&Decision::Unauthorized(String::from(UNAUTHORIZED_MESSAGE)))
                .unwrap();
        assert_eq!(
            body(resp).await,
            (StatusCode::UNAUTHORIZED, String::from(UNAUTHORIZED_MESSAGE))
        );

        let resp =
            Response::from_decision(&Decision::InternalError(String::from("boom"))).unwrap();
        assert_eq!(
            body(resp).await,
            (StatusCode::INTERNAL_SERVER_ERROR, String::from("boom"))
        );
    }

    #[test]
    fn test_redirect() {
        let resp = Response::from_decision(&Decision::RedirectToLogin(String::from(
            "/login?redirect_to=%2F",
        )))
        .unwrap();
        let resp: HttpResponse = resp.into();
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/login?redirect_to=%2F"
        );
    }
}
