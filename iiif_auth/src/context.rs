//! JSON-LD contexts and `type` values

/// The IIIF Authorization Flow 2.0 JSON-LD context
pub const AUTH2_CONTEXT: &str = "http://iiif.io/api/auth/2/context.json";

/// The IIIF Image API 3 JSON-LD context
pub const IMAGE3_CONTEXT: &str = "http://iiif.io/api/image/3/context.json";

/// The IIIF Presentation API 3 JSON-LD context
pub const PRESENTATION3_CONTEXT: &str = "http://iiif.io/api/presentation/3/context.json";

/// `type` of a probe service reference
pub const PROBE_SERVICE: &str = "AuthProbeService2";

/// `type` of a probe service response
pub const PROBE_RESULT: &str = "AuthProbeResult2";

/// `type` of an access service descriptor
pub const ACCESS_SERVICE: &str = "AuthAccessService2";

/// `type` of a token service descriptor
pub const ACCESS_TOKEN_SERVICE: &str = "AuthAccessTokenService2";

/// `type` of a logout service descriptor
pub const LOGOUT_SERVICE: &str = "AuthLogoutService2";

/// `type` of a delivered access token
pub const ACCESS_TOKEN: &str = "AuthAccessToken2";

/// `type` of an access token error
pub const ACCESS_TOKEN_ERROR: &str = "AuthAccessTokenError2";

pub(crate) fn auth2_context() -> String {
    AUTH2_CONTEXT.to_owned()
}
