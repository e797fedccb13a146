//! Placeholder IIIF resources
//!
//! The image bytes are a fixed SVG; only the protection around them matters.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use iiif_auth::{
    catalog, context, Access, AccessPattern, AccessServiceDescriptor, ProbeServiceReference,
};
use serde::Serialize;

use crate::AppState;

const WIDTH: u32 = 750;
const HEIGHT: u32 = 1_000;
const IMAGE_PROTOCOL: &str = "http://iiif.io/api/image";
const LEVEL2: &str = "level2";

/// The authentication service advertised by an image description
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum AuthService {
    /// Clients should probe before fetching
    Probe(ProbeServiceReference),
    /// Clients should go straight to this access service
    Access(AccessServiceDescriptor),
}

/// A size or tile dimension
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Size {
    width: u32,
    height: u32,
}

/// A tiling scheme
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    width: u32,
    height: u32,
    scale_factors: Vec<u32>,
}

/// An Image API 3 `ImageService3` description
#[derive(Clone, Debug, Serialize)]
pub struct ImageInfo {
    #[serde(rename = "@context")]
    context: &'static str,
    id: String,
    #[serde(rename = "type")]
    kind: &'static str,
    protocol: &'static str,
    profile: &'static str,
    width: u32,
    height: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sizes: Vec<Size>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tiles: Vec<Tile>,
    service: Vec<AuthService>,
}

impl ImageInfo {
    fn new(id: String, service: AuthService) -> Self {
        Self {
            context: context::IMAGE3_CONTEXT,
            id,
            kind: "ImageService3",
            protocol: IMAGE_PROTOCOL,
            profile: LEVEL2,
            width: WIDTH,
            height: HEIGHT,
            sizes: Vec::new(),
            tiles: Vec::new(),
            service: vec![service],
        }
    }

    fn with_tiles(mut self) -> Self {
        self.sizes = [4, 2, 1]
            .into_iter()
            .map(|f| Size {
                width: WIDTH / f,
                height: HEIGHT / f,
            })
            .collect();
        self.tiles = vec![Tile {
            width: 512,
            height: 512,
            scale_factors: vec![1, 2, 4, 8],
        }];
        self
    }
}

fn placeholder_svg(title: &str, subtitle: &str) -> Response {
    let svg = format!(
        r##"<svg width="{WIDTH}" height="{HEIGHT}" xmlns="http://www.w3.org/2000/svg">
  <rect width="{WIDTH}" height="{HEIGHT}" fill="#f0f0f0"/>
  <text x="375" y="500" font-family="Arial" font-size="48" text-anchor="middle" fill="#333">{title}</text>
  <text x="375" y="560" font-family="Arial" font-size="24" text-anchor="middle" fill="#666">{subtitle}</text>
</svg>
"##
    );

    (
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
        ],
        svg,
    )
        .into_response()
}

/// `GET /api/iiif/image/{id}/{*params}`, interactively protected
///
/// `info.json` describes the image; anything else returns its bytes.
pub(crate) async fn image(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    Path((id, params)): Path<(String, String)>,
) -> Response {
    if let Access::Granted(grant) = &access {
        tracing::trace!(subject = %grant.subject(), %id, %params, "serving protected image");
    }

    if params == "info.json" {
        let catalog = state.catalog();
        Json(ImageInfo::new(
            catalog.image_service_id(&id).into(),
            AuthService::Probe(catalog.probe_service(AccessPattern::Interactive)),
        ))
        .into_response()
    } else {
        placeholder_svg("Protected Image", "Authenticated Access Only")
    }
}

/// `GET /api/iiif/image/kiosk/{*params}`
///
/// `info.json` is public and advertises the kiosk access service directly;
/// the bytes require a kiosk pass.
pub(crate) async fn kiosk_image(State(state): State<AppState>, Path(params): Path<String>) -> Response {
    if params == "info.json" {
        let catalog = state.catalog();
        Json(
            ImageInfo::new(
                catalog.image_service_id(catalog::KIOSK_IMAGE_ID).into(),
                AuthService::Access(catalog.access_service(AccessPattern::Kiosk, true)),
            )
            .with_tiles(),
        )
        .into_response()
    } else {
        placeholder_svg("Kiosk Image", "Terms Accepted")
    }
}

/// `GET /api/iiif/image/open/{*params}`, relying on ambient session state
pub(crate) async fn open_image(State(state): State<AppState>, Path(params): Path<String>) -> Response {
    if params == "info.json" {
        let catalog = state.catalog();
        Json(ImageInfo::new(
            catalog.image_service_id(catalog::OPEN_IMAGE_ID).into(),
            AuthService::Access(catalog.access_service(AccessPattern::External, true)),
        ))
        .into_response()
    } else {
        placeholder_svg("Open Image", "Session Access")
    }
}

/// `GET /api/iiif/manifest/{id}`
pub(crate) async fn manifest(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let catalog = state.catalog();
    let manifest_id = catalog.manifest_id(&id);
    let image_service = catalog.image_service_id(&id);
    let canvas = format!("{manifest_id}/canvas/1");

    Json(serde_json::json!({
        "@context": context::PRESENTATION3_CONTEXT,
        "id": manifest_id.as_str(),
        "type": "Manifest",
        "label": { "en": ["Sample Manifest"] },
        "metadata": [{
            "label": { "en": ["Description"] },
            "value": { "en": ["This is a sample IIIF manifest"] }
        }],
        "items": [{
            "id": canvas,
            "type": "Canvas",
            "label": { "en": ["Protected Image"] },
            "height": HEIGHT,
            "width": WIDTH,
            "items": [{
                "id": format!("{canvas}/page"),
                "type": "AnnotationPage",
                "items": [{
                    "id": format!("{canvas}/annotation"),
                    "type": "Annotation",
                    "motivation": "painting",
                    "body": {
                        "id": format!("{image_service}/full/max/0/default.jpg"),
                        "type": "Image",
                        "format": "image/jpeg",
                        "height": HEIGHT,
                        "width": WIDTH,
                        "service": [{
                            "@context": context::IMAGE3_CONTEXT,
                            "id": image_service.as_str(),
                            "type": "ImageService3",
                            "profile": LEVEL2,
                            "service": [catalog.probe_service(AccessPattern::Interactive)]
                        }]
                    },
                    "target": canvas
                }]
            }]
        }]
    }))
    .into_response()
}
