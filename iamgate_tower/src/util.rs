//! Utilities for generating HTTP responses on authentication failures

use http::{header, HeaderValue, Response, StatusCode};

/// The challenge sent with every `401 Unauthorized` response
pub const BEARER_CHALLENGE: HeaderValue = HeaderValue::from_static("Bearer");

/// Build a `401 Unauthorized` response with an empty body and the
/// `www-authenticate` challenge
///
/// The prepared response will have the form:
///
/// ```http
/// HTTP/1.1 401 Unauthorized
/// www-authenticate: Bearer
/// ```
pub fn unauthorized<Body: Default>() -> Response<Body> {
    unauthorized_with_body(Body::default())
}

/// Build a `401 Unauthorized` response around the given body, with the
/// `www-authenticate` challenge
///
/// No content type is set; callers supplying a body are expected to add one.
pub fn unauthorized_with_body<Body>(body: Body) -> Response<Body> {
    let mut resp = Response::new(body);
    *resp.status_mut() = StatusCode::UNAUTHORIZED;
    resp.headers_mut()
        .insert(header::WWW_AUTHENTICATE, BEARER_CHALLENGE);
    resp
}
