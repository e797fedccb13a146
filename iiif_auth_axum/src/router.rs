use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use iiif_auth::{catalog, credential, AccessPattern, LogoutRequest};
use serde::Deserialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    guard::VerifyCredential,
    interactive::{self, page_error},
    kiosk, pages, resources, AppState,
};

/// The query parameter carrying an interactive credential
pub const TOKEN_PARAM: &str = "token";

/// The query parameter carrying a kiosk pass
pub const KIOSK_PARAM: &str = "kiosk";

#[derive(Debug, Default, Deserialize)]
struct ProbeParams {
    #[serde(default)]
    resource: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    kiosk: Option<String>,
}

fn probe(state: &AppState, pattern: AccessPattern, headers: &HeaderMap, params: ProbeParams) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let query = match pattern {
        AccessPattern::Kiosk => params.kiosk.as_deref().or(params.token.as_deref()),
        AccessPattern::Interactive | AccessPattern::External => params.token.as_deref(),
    };
    let resource = params
        .resource
        .unwrap_or_else(|| state.catalog().image_service_id("1").into());

    let result = state
        .probe_service(pattern)
        .probe(&resource, credential::presented(authorization, query));

    let status =
        StatusCode::from_u16(result.status.code()).unwrap_or(StatusCode::UNAUTHORIZED);
    (status, Json(result)).into_response()
}

/// `GET /api/iiif/probe`
async fn interactive_probe(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ProbeParams>,
) -> Response {
    probe(&state, AccessPattern::Interactive, &headers, params)
}

/// `GET /api/iiif/auth/kiosk/probe`
async fn kiosk_probe(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ProbeParams>,
) -> Response {
    probe(&state, AccessPattern::Kiosk, &headers, params)
}

#[derive(Debug, Default, Deserialize)]
struct LogoutParams {
    #[serde(flatten)]
    request: LogoutRequest,
    #[serde(default)]
    locale: Option<String>,
}

/// `GET /api/iiif/logout`
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<LogoutParams>,
) -> Response {
    let origin_header = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    let page = state.logout_service().logout(&params.request, origin_header);
    let locale = pages::request_locale(params.locale.as_deref(), &headers);

    match pages::notice_page(locale, "Logout", page.notice.as_ref(), Some(&page.home)) {
        Ok(html) => ([(header::CACHE_CONTROL, "no-store")], Html(html)).into_response(),
        Err(error) => page_error(error),
    }
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Builds the complete service router
///
/// Every response carries an unrestricted cross-origin policy, since the
/// resources are embedded by viewers hosted elsewhere.
pub fn router(state: AppState) -> Router {
    let interactive_guard =
        VerifyCredential::new(state.resource_guard(AccessPattern::Interactive), TOKEN_PARAM);
    let kiosk_guard = VerifyCredential::new(state.resource_guard(AccessPattern::Kiosk), KIOSK_PARAM)
        .with_public_info();
    let external_guard =
        VerifyCredential::new(state.resource_guard(AccessPattern::External), TOKEN_PARAM);

    Router::new()
        .route(catalog::PROBE_PATH, get(interactive_probe))
        .route(
            catalog::ACCESS_PATH,
            get(interactive::access_entry).post(interactive::login_json),
        )
        .route(catalog::LOGIN_PATH, get(interactive::access_entry))
        .route(
            catalog::AUTH_PAGE_PATH,
            get(interactive::auth_page).post(interactive::auth_submit),
        )
        .route(catalog::TOKEN_PATH, get(interactive::token))
        .route(catalog::LOGOUT_PATH, get(logout))
        .route(catalog::KIOSK_ACCESS_PATH, get(kiosk::terms))
        .route(catalog::KIOSK_ACCEPT_PATH, get(kiosk::accept))
        .route(catalog::KIOSK_DECLINE_PATH, get(kiosk::decline))
        .route(catalog::KIOSK_TOKEN_PATH, get(kiosk::token))
        .route(catalog::KIOSK_PROBE_PATH, get(kiosk_probe))
        .route(
            &format!("{}/:id/*params", catalog::IMAGE_PATH),
            get(resources::image).route_layer(interactive_guard.into_layer()),
        )
        .route(
            &format!("{}/{}/*params", catalog::IMAGE_PATH, catalog::KIOSK_IMAGE_ID),
            get(resources::kiosk_image).route_layer(kiosk_guard.into_layer()),
        )
        .route(
            &format!("{}/{}/*params", catalog::IMAGE_PATH, catalog::OPEN_IMAGE_ID),
            get(resources::open_image).route_layer(external_guard.into_layer()),
        )
        .route(&format!("{}/:id", catalog::MANIFEST_PATH), get(resources::manifest))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
