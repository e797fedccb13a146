//! A `tower_http` request validator guarding protected resources

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use iiif_auth::{credential, GuardDecision, ResourceChallenge, ResourceGuard};
use tower_http::validate_request::{ValidateRequest, ValidateRequestHeaderLayer};

/// Checks the credential presented with a request before it reaches a
/// protected resource
///
/// The credential is taken from an `Authorization: Bearer` header or, for
/// clients such as `<img>` tags that cannot set headers, from a query
/// parameter. On success the [`Access`](iiif_auth::Access) decision is
/// stored in the request extensions.
#[derive(Clone, Debug)]
pub struct VerifyCredential {
    guard: ResourceGuard,
    query_param: &'static str,
    public_info: bool,
}

impl VerifyCredential {
    /// Guards with `guard`, also accepting the credential in `query_param`
    pub fn new(guard: ResourceGuard, query_param: &'static str) -> Self {
        Self {
            guard,
            query_param,
            public_info: false,
        }
    }

    /// Lets `info.json` documents through unchecked
    ///
    /// Used where the image description itself advertises the access
    /// service.
    pub fn with_public_info(mut self) -> Self {
        self.public_info = true;
        self
    }

    /// Wraps this validator in a layer
    pub fn into_layer(self) -> ValidateRequestHeaderLayer<Self> {
        ValidateRequestHeaderLayer::custom(self)
    }
}

pub(crate) fn query_value(query: Option<&str>, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

impl<B> ValidateRequest<B> for VerifyCredential {
    type ResponseBody = Body;

    fn validate(&mut self, request: &mut Request<B>) -> Result<(), Response<Self::ResponseBody>> {
        if self.public_info && request.uri().path().ends_with("/info.json") {
            tracing::trace!("public image description");
            return Ok(());
        }

        let authorization = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let query = query_value(request.uri().query(), self.query_param);

        let decision = self
            .guard
            .check(credential::presented(authorization, query.as_deref()));

        match decision {
            GuardDecision::Allow(access) => {
                tracing::trace!(pattern = %self.guard.pattern(), "credential accepted");
                let _ = request.extensions_mut().insert(access);
                Ok(())
            }
            GuardDecision::Challenge(challenge) => {
                tracing::debug!(pattern = %self.guard.pattern(), "resource challenged");
                Err(challenge_response(challenge))
            }
        }
    }
}

/// A `401` carrying the challenge body and a bearer `www-authenticate` header
pub(crate) fn challenge_response(challenge: ResourceChallenge) -> Response<Body> {
    (
        StatusCode::UNAUTHORIZED,
        [(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static(r#"Bearer error="invalid_token""#),
        )],
        Json(challenge),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_values_are_decoded() {
        assert_eq!(
            query_value(Some("a=1&token=abc%2Bdef"), "token").as_deref(),
            Some("abc+def")
        );
        assert_eq!(query_value(Some("a=1"), "token"), None);
        assert_eq!(query_value(None, "token"), None);
    }
}
