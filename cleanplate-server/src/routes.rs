// cleanplate-server/src/routes.rs
//
// Wire DTOs and handlers. Field names match the original client payloads
// (camelCase throughout).

use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use cleanplate_common::models::VerificationStatus;
use cleanplate_core::services::eligibility_service::RemainingTime;
use cleanplate_core::services::{ClaimRequest, UploadPlateRequest};
use cleanplate_core::Error;

use crate::context::ServerContext;
use crate::error::ApiError;

pub fn router(ctx: Arc<ServerContext>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/plate/check-eligibility", post(check_eligibility_handler))
        .route("/api/plate/upload", post(upload_plate_handler))
        .route("/api/plate/verify/{scan_id}", post(verify_scan_handler))
        .route("/api/plate/status/{scan_id}", get(scan_status_handler))
        .route("/api/guest/offers", get(offers_handler))
        .route("/api/guest/scan", post(claim_reward_handler))
        .route("/admin/scans/metrics", get(scan_metrics_handler))
        .nest_service("/uploads", ServeDir::new(ctx.uploads_dir.clone()))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(ctx)
}

async fn health_handler(
    State(ctx): State<Arc<ServerContext>>,
) -> Result<impl IntoResponse, ApiError> {
    sqlx::query("SELECT 1").execute(ctx.db.pool()).await.map_err(Error::from)?;
    Ok(Json(json!({ "status": "ok" })))
}

// ---------------------------------------------------------------
// Eligibility
// ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EligibilityBody {
    #[serde(default)]
    device_fingerprint: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EligibilityResponse {
    eligible: bool,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_available_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining_time: Option<RemainingTime>,
}

async fn check_eligibility_handler(
    State(ctx): State<Arc<ServerContext>>,
    Json(body): Json<EligibilityBody>,
) -> Result<impl IntoResponse, ApiError> {
    let answer = ctx
        .eligibility_service
        .check_eligibility(&body.device_fingerprint)
        .await?;

    Ok(Json(EligibilityResponse {
        eligible: answer.eligible,
        message: if answer.eligible {
            "You can proceed with scanning."
        } else {
            "Scan limit reached. Try again later."
        },
        next_available_at: answer.next_available_at,
        remaining_time: answer.remaining,
    }))
}

// ---------------------------------------------------------------
// Upload & verify
// ---------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanSummaryResponse {
    id: Uuid,
    plate_image_url: Option<String>,
    verification_status: VerificationStatus,
    next_scan_available_at: Option<DateTime<Utc>>,
}

async fn upload_plate_handler(
    State(ctx): State<Arc<ServerContext>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut image: Option<(String, Vec<u8>)> = None;
    let mut device_fingerprint = String::new();
    let mut scan_id = None;
    let mut restaurant_id = None;
    let mut shop_id = None;
    let mut item_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| Error::Validation("Malformed upload payload.".to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or("plate.jpg").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| Error::Validation("Malformed upload payload.".to_string()))?;
                image = Some((filename, bytes.to_vec()));
            }
            "deviceFingerprint" => device_fingerprint = text_field(field).await?,
            "scanId" => scan_id = Some(uuid_field(field, "scanId").await?),
            "restaurantId" => restaurant_id = Some(uuid_field(field, "restaurantId").await?),
            "shopId" => shop_id = Some(uuid_field(field, "shopId").await?),
            "itemId" => item_id = Some(uuid_field(field, "itemId").await?),
            _ => {}
        }
    }

    let (filename, bytes) =
        image.ok_or_else(|| Error::Validation("No image uploaded.".to_string()))?;
    if device_fingerprint.trim().is_empty() {
        return Err(Error::Validation("Device identifier is required.".to_string()).into());
    }

    let image_url = ctx.image_store.store(&filename, &bytes).await?;

    let scan = ctx
        .verification_service
        .upload_plate(UploadPlateRequest {
            image_url,
            device_fingerprint,
            scan_id,
            restaurant_id,
            shop_id,
            item_id,
        })
        .await?;

    Ok(Json(json!({
        "message": "Image uploaded successfully. Verification in progress...",
        "scan": ScanSummaryResponse {
            id: scan.scan_id,
            plate_image_url: scan.plate_image_url,
            verification_status: scan.verification_status,
            next_scan_available_at: scan.next_scan_available_at,
        },
    })))
}

async fn verify_scan_handler(
    State(ctx): State<Arc<ServerContext>>,
    Path(scan_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = ctx.verification_service.verify_scan(scan_id).await?;

    let message = if outcome.reward_unlocked {
        "Plate verified! Your reward is unlocked."
    } else {
        "Plate verification failed. Food leftovers detected."
    };

    Ok(Json(json!({
        "message": message,
        "scan": {
            "id": outcome.scan_id,
            "verificationStatus": outcome.status,
            "rewardUnlocked": outcome.reward_unlocked,
        },
    })))
}

async fn scan_status_handler(
    State(ctx): State<Arc<ServerContext>>,
    Path(scan_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let view = ctx.verification_service.scan_status(scan_id).await?;

    Ok(Json(json!({
        "scan": {
            "id": view.scan.scan_id,
            "plateImageUrl": view.scan.plate_image_url,
            "verificationStatus": view.scan.verification_status,
            "rewardUnlocked": view.scan.reward_unlocked,
            "nextScanAvailableAt": view.scan.next_scan_available_at,
            "restaurant": view.restaurant_name,
            "shop": view.shop_name,
            "item": view.item_name,
            "scannedAt": view.scan.scanned_at,
            "verifiedAt": view.scan.verified_at,
        },
    })))
}

// ---------------------------------------------------------------
// Offers & claims
// ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OffersQuery {
    restaurant_id: Option<Uuid>,
}

async fn offers_handler(
    State(ctx): State<Arc<ServerContext>>,
    Query(query): Query<OffersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let board = ctx.reward_service.list_offers(query.restaurant_id).await?;
    Ok(Json(board))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimBody {
    restaurant_id: Option<Uuid>,
    shop_id: Option<Uuid>,
    item_id: Option<Uuid>,
    #[serde(default)]
    device_fingerprint: String,
    guest_name: Option<String>,
}

async fn claim_reward_handler(
    State(ctx): State<Arc<ServerContext>>,
    Json(body): Json<ClaimBody>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(restaurant_id), Some(shop_id), Some(item_id)) =
        (body.restaurant_id, body.shop_id, body.item_id)
    else {
        return Err(Error::Validation("Restaurant, shop, and item are required.".to_string()).into());
    };

    let receipt = ctx
        .reward_service
        .claim_reward(ClaimRequest {
            restaurant_id,
            shop_id,
            item_id,
            device_fingerprint: body.device_fingerprint,
            guest_name: body.guest_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Reward claimed successfully!",
            "rewardCode": receipt.reward_code,
            "claimedAt": receipt.claimed_at,
            "expiresAt": receipt.expires_at,
            "scan": {
                "id": receipt.scan_id,
                "item": receipt.item_name,
                "shop": receipt.shop_name,
                "originalPrice": receipt.original_price,
                "discountedPrice": receipt.discounted_price,
                "discountAmount": receipt.discount_amount,
            },
        })),
    ))
}

// Dashboard read model. Staff authentication is handled by the fronting
// admin service, not here.
async fn scan_metrics_handler(
    State(ctx): State<Arc<ServerContext>>,
) -> Result<impl IntoResponse, ApiError> {
    let metrics = ctx.reward_service.scan_metrics().await?;
    Ok(Json(metrics))
}

// ---------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------

async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|_| Error::Validation("Malformed upload payload.".to_string()).into())
}

async fn uuid_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<Uuid, ApiError> {
    let text = text_field(field).await?;
    text.parse()
        .map_err(|_| Error::Validation(format!("Invalid {name}.")).into())
}
