//! Interactive access service, login page, and token service hand-off

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use iiif_auth::{
    AccessEntryParams, AccessPattern, Ceremony, Handoff, Handshake, HandshakeParams, Locale,
    LoginRequest, LoginResponse, TokenRequest,
};
use serde::Deserialize;

use crate::{
    pages::{self, FormError},
    AppState,
};

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

pub(crate) fn malformed(error: impl std::fmt::Display) -> Response {
    (StatusCode::BAD_REQUEST, format!("Missing parameters: {error}")).into_response()
}

pub(crate) fn page_error(error: serde_json::Error) -> Response {
    let error: &(dyn std::error::Error + 'static) = &error;
    tracing::error!(error, "unable to render page");
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

/// The locale of an access service entry, with the referring page as a
/// hint
fn entry_locale(params: &AccessEntryParams, headers: &HeaderMap) -> Locale {
    let explicit = params.locale.as_deref().and_then(|l| l.parse().ok());
    explicit.unwrap_or_else(|| match header_str(headers, header::REFERER) {
        Some(referer) => Locale::from_referer(referer),
        None => pages::request_locale(None, headers),
    })
}

/// `GET /api/iiif/access` and `GET /api/iiif/login`
pub(crate) async fn access_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<AccessEntryParams>,
) -> Response {
    let handshake = match params.resolve(header_str(&headers, header::REFERER)) {
        Ok(h) => h,
        Err(error) => return malformed(error),
    };
    let locale = entry_locale(&params, &headers);

    let mut location = handshake.attach_to(state.catalog().auth_page_url());
    location
        .query_pairs_mut()
        .append_pair("locale", locale.as_str());

    tracing::debug!(message_id = %handshake.message_id(), "starting interactive access");
    Redirect::to(location.as_str()).into_response()
}

/// `POST /api/iiif/access`
pub(crate) async fn login_json(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Response {
    match state.interactive_access().login(&request) {
        LoginResponse::Issued(message) => Json(message).into_response(),
        LoginResponse::Rejected(error) => (StatusCode::UNAUTHORIZED, Json(error)).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthPageParams {
    #[serde(flatten)]
    handshake: HandshakeParams,
    #[serde(default)]
    locale: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthForm {
    #[serde(flatten)]
    login: LoginRequest,
    #[serde(flatten)]
    handshake: HandshakeParams,
    #[serde(default)]
    locale: Option<String>,
}

fn render_login(
    state: &AppState,
    locale: Locale,
    handshake: &Handshake,
    error: Option<FormError<'_>>,
) -> String {
    let service = state
        .catalog()
        .access_service(AccessPattern::Interactive, false);

    pages::login_form(
        locale,
        &service,
        &state.catalog().auth_page_url(),
        &[
            ("messageId", handshake.message_id().as_str()),
            ("origin", handshake.origin().as_str()),
            ("locale", locale.as_str()),
        ],
        error,
    )
}

/// `GET /auth`
pub(crate) async fn auth_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<AuthPageParams>,
) -> Response {
    let handshake = match Handshake::from_params(&params.handshake) {
        Ok(h) => h,
        Err(error) => return malformed(error),
    };
    let locale = pages::request_locale(params.locale.as_deref(), &headers);

    Html(render_login(&state, locale, &handshake, None)).into_response()
}

/// `POST /auth`
pub(crate) async fn auth_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<AuthForm>,
) -> Response {
    let handshake = match Handshake::from_params(&form.handshake) {
        Ok(h) => h,
        Err(error) => return malformed(error),
    };
    let locale = pages::request_locale(form.locale.as_deref(), &headers);

    match state.interactive_access().submit(&form.login) {
        Ceremony::Confirmed(issued) => {
            let mut location =
                handshake.attach_to(state.catalog().token_url(AccessPattern::Interactive));
            location
                .query_pairs_mut()
                .append_pair("accessToken", issued.access_token().as_str());
            Redirect::to(location.as_str()).into_response()
        }
        Ceremony::Failed(error) => {
            let page = render_login(
                &state,
                locale,
                &handshake,
                Some(FormError {
                    heading: &error.heading,
                    note: &error.note,
                }),
            );
            (StatusCode::UNAUTHORIZED, Html(page)).into_response()
        }
        Ceremony::Presented | Ceremony::Declined => {
            Html(render_login(&state, locale, &handshake, None)).into_response()
        }
    }
}

/// Renders a token service decision for `pattern`
pub(crate) fn token_handoff(
    state: &AppState,
    pattern: AccessPattern,
    locale: Locale,
    request: &TokenRequest,
) -> Response {
    match state.token_service(pattern).deliver(request) {
        Handoff::Deliver(delivery) => match pages::post_to_opener(
            locale,
            "IIIF Auth Token",
            &delivery.target_origin,
            &delivery.message,
            delivery.close_after,
            None,
        ) {
            Ok(page) => (
                [(header::CACHE_CONTROL, "no-store")],
                Html(page),
            )
                .into_response(),
            Err(error) => page_error(error),
        },
        Handoff::RestartAccess { location } => Redirect::to(location.as_str()).into_response(),
        Handoff::Malformed(error) => malformed(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenParams {
    #[serde(flatten)]
    pub(crate) request: TokenRequest,
    #[serde(default)]
    pub(crate) locale: Option<String>,
}

/// `GET /api/iiif/token`
pub(crate) async fn token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<TokenParams>,
) -> Response {
    let locale = pages::request_locale(params.locale.as_deref(), &headers);
    token_handoff(&state, AccessPattern::Interactive, locale, &params.request)
}
