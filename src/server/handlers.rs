//! HTTP request handlers for the photo storefront.
//!
//! # Endpoints
//!
//! - `GET /gallery/{photo_id}` - Main photo, neighbors, and per-asset actions
//! - `POST /redeem` - Claim the free download of a photo set
//! - `POST /purchases` - Record a confirmed purchase (signed webhook)
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::entitlement::EntitlementStore;
use crate::error::GalleryError;
use crate::gallery::{GalleryResponse, GalleryService, PurchaseResponse, RedeemResponse};
use crate::resolve::parse_start_date;
use crate::store::AssetStore;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the gallery service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: AssetStore, E: EntitlementStore> {
    pub service: Arc<GalleryService<S, E>>,
}

impl<S: AssetStore, E: EntitlementStore> AppState<S, E> {
    pub fn new(service: GalleryService<S, E>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

impl<S: AssetStore, E: EntitlementStore> Clone for AppState<S, E> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for gallery requests.
#[derive(Debug, Default, Deserialize)]
pub struct GalleryQueryParams {
    /// First day of the date search (defaults to today, UTC)
    #[serde(rename = "startDateISO")]
    pub start_date_iso: Option<String>,
}

/// Body of `POST /redeem`.
///
/// Every field is optional at the JSON level so that a missing field is
/// reported as a 400 with our own message rather than a serde rejection.
#[derive(Debug, Default, Deserialize)]
pub struct RedeemRequest {
    #[serde(rename = "photoId")]
    pub photo_id: Option<String>,

    #[serde(rename = "publicId")]
    pub public_id: Option<String>,

    #[serde(rename = "startDateISO")]
    pub start_date_iso: Option<String>,
}

/// Body of `POST /purchases`.
#[derive(Debug, Default, Deserialize)]
pub struct PurchaseRequest {
    pub photo_set_id: Option<String>,

    #[serde(rename = "publicId")]
    pub public_id: Option<String>,
}

/// Parse an optional `startDateISO`, treating a blank value as absent.
fn start_date(value: Option<&str>) -> Result<Option<NaiveDate>, GalleryError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_start_date(raw)
            .map(Some)
            .ok_or_else(|| GalleryError::InvalidStartDate(raw.to_string())),
    }
}

/// Decode a JSON body. An empty body reads as `{}`.
fn json_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, GalleryError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| GalleryError::InvalidBody(e.to_string()))
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,

    /// Error type identifier (e.g., "not_found", "already_redeemed")
    pub kind: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            kind: kind.into(),
            status: None,
        }
    }

    pub fn with_status(error: impl Into<String>, kind: impl Into<String>, status: StatusCode) -> Self {
        Self {
            error: error.into(),
            kind: kind.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

impl GalleryError {
    /// HTTP status and error kind for this error.
    pub fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            GalleryError::PhotoNotFound => (StatusCode::NOT_FOUND, "not_found"),
            GalleryError::MissingFields => (StatusCode::BAD_REQUEST, "missing_fields"),
            GalleryError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "invalid_body"),
            GalleryError::InvalidStartDate(_) => (StatusCode::BAD_REQUEST, "invalid_start_date"),
            GalleryError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed"),
            GalleryError::AlreadyRedeemed => (StatusCode::FORBIDDEN, "already_redeemed"),
            GalleryError::Entitlement(_) => (StatusCode::INTERNAL_SERVER_ERROR, "entitlement_error"),
        }
    }
}

/// Convert GalleryError to HTTP response.
///
/// - 5xx errors are logged at ERROR level
/// - 404s are logged at DEBUG level (common and expected)
/// - other 4xx errors are logged at WARN level
impl IntoResponse for GalleryError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let message = self.to_string();

        if status.is_server_error() {
            error!(kind, status = status.as_u16(), "Server error: {}", message);
        } else if status == StatusCode::NOT_FOUND {
            debug!(kind, status = status.as_u16(), "Resource not found: {}", message);
        } else {
            warn!(kind, status = status.as_u16(), "Client error: {}", message);
        }

        let error_response = ErrorResponse::with_status(message, kind, status);

        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle gallery requests.
///
/// # Endpoint
///
/// `GET /gallery/{photo_id}?startDateISO=2025-09-28`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "photo_set_id": "ps_...",
///   "assets": [
///     {"label": "Main Pose", "publicId": "...", "previewUrl": "...",
///      "action": {"type": "free", "label": "Get Free Download", "url": null}}
///   ],
///   "entitlements": {"free_redeemed": 0, "free_asset_public_id": null, "redeemed_at": null}
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: `startDateISO` is not a date
/// - `404 Not Found`: No candidate path exists for the photo id
pub async fn gallery_handler<S, E>(
    State(state): State<AppState<S, E>>,
    Path(photo_id): Path<String>,
    Query(query): Query<GalleryQueryParams>,
) -> Result<Json<GalleryResponse>, GalleryError>
where
    S: AssetStore + 'static,
    E: EntitlementStore + 'static,
{
    let start = start_date(query.start_date_iso.as_deref())?;
    let response = state.service.gallery(&photo_id, start).await?;
    Ok(Json(response))
}

/// Handle free-download redemption.
///
/// # Endpoint
///
/// `POST /redeem` with JSON body `{"photoId", "publicId", "startDateISO"?}`
///
/// # Errors
///
/// - `400 Bad Request`: Missing field, malformed body, or bad date
/// - `403 Forbidden`: The photo set's free download is already claimed
/// - `404 Not Found`: The photo id does not resolve
pub async fn redeem_handler<S, E>(
    State(state): State<AppState<S, E>>,
    body: Bytes,
) -> Result<Json<RedeemResponse>, GalleryError>
where
    S: AssetStore + 'static,
    E: EntitlementStore + 'static,
{
    let request: RedeemRequest = json_body(&body)?;
    let start = start_date(request.start_date_iso.as_deref())?;

    let response = state
        .service
        .redeem(
            request.photo_id.as_deref().unwrap_or_default(),
            request.public_id.as_deref().unwrap_or_default(),
            start,
        )
        .await?;

    Ok(Json(response))
}

/// Handle purchase confirmations from the payment provider.
///
/// The signature is checked by the webhook middleware before this runs.
///
/// # Endpoint
///
/// `POST /purchases` with JSON body `{"photo_set_id", "publicId"}`
pub async fn purchase_handler<S, E>(
    State(state): State<AppState<S, E>>,
    body: Bytes,
) -> Result<Json<PurchaseResponse>, GalleryError>
where
    S: AssetStore + 'static,
    E: EntitlementStore + 'static,
{
    let request: PurchaseRequest = json_body(&body)?;

    let response = state
        .service
        .record_purchase(
            request.photo_set_id.as_deref().unwrap_or_default(),
            request.public_id.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(response))
}

/// Reject any method other than the one a route serves.
pub async fn method_not_allowed() -> GalleryError {
    GalleryError::MethodNotAllowed
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
