//! Kiosk access service family

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use iiif_auth::{
    catalog, AccessEntryParams, AccessPattern, Ceremony, Handshake, HandshakeParams, KioskChoice,
};
use serde::Deserialize;

use crate::{
    interactive::{malformed, page_error, token_handoff, TokenParams},
    pages, AppState,
};

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceParams {
    #[serde(flatten)]
    handshake: HandshakeParams,
    #[serde(default)]
    locale: Option<String>,
}

/// `GET /api/iiif/auth/kiosk`
pub(crate) async fn terms(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<AccessEntryParams>,
) -> Response {
    let referer = headers.get(header::REFERER).and_then(|v| v.to_str().ok());
    let handshake = match params.resolve(referer) {
        Ok(h) => h,
        Err(error) => return malformed(error),
    };
    let locale = pages::request_locale(params.locale.as_deref(), &headers);

    let link = |path: &str| {
        let mut url = handshake.attach_to(state.catalog().endpoint(path));
        url.query_pairs_mut().append_pair("locale", locale.as_str());
        url
    };

    let service = state.catalog().access_service(AccessPattern::Kiosk, false);
    tracing::debug!(message_id = %handshake.message_id(), "presenting kiosk terms");
    Html(pages::kiosk_terms(
        locale,
        &service,
        &link(catalog::KIOSK_ACCEPT_PATH),
        &link(catalog::KIOSK_DECLINE_PATH),
    ))
    .into_response()
}

/// `GET /api/iiif/auth/kiosk/accept`
pub(crate) async fn accept(
    State(state): State<AppState>,
    Query(params): Query<ChoiceParams>,
) -> Response {
    let handshake = match Handshake::from_params(&params.handshake) {
        Ok(h) => h,
        Err(error) => return malformed(error),
    };

    match state.kiosk_access().respond(KioskChoice::Accept) {
        Ceremony::Confirmed(pass) => {
            let mut location = handshake.attach_to(state.catalog().token_url(AccessPattern::Kiosk));
            {
                let mut query = location.query_pairs_mut();
                query.append_pair("accessToken", pass.access_token().as_str());
                if let Some(locale) = &params.locale {
                    query.append_pair("locale", locale);
                }
            }
            Redirect::to(location.as_str()).into_response()
        }
        Ceremony::Failed(error) => {
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(error)).into_response()
        }
        Ceremony::Presented | Ceremony::Declined => {
            Redirect::to(handshake.attach_to(state.catalog().access_url(AccessPattern::Kiosk)).as_str())
                .into_response()
        }
    }
}

/// `GET /api/iiif/auth/kiosk/decline`
///
/// The page closes even when the hand-off context is unusable; it just
/// posts nothing in that case.
pub(crate) async fn decline(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ChoiceParams>,
) -> Response {
    let access = state.kiosk_access();
    let notice = match access.respond(KioskChoice::Decline) {
        Ceremony::Declined => access.decline_notice(&params.handshake),
        _ => None,
    };
    let locale = pages::request_locale(params.locale.as_deref(), &headers);

    match pages::notice_page(locale, "Terms Declined", notice.as_ref(), None) {
        Ok(page) => Html(page).into_response(),
        Err(error) => page_error(error),
    }
}

/// `GET /api/iiif/auth/kiosk/token`
pub(crate) async fn token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<TokenParams>,
) -> Response {
    let locale = pages::request_locale(params.locale.as_deref(), &headers);
    token_handoff(&state, AccessPattern::Kiosk, locale, &params.request)
}
