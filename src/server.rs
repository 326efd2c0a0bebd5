use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};

use crate::error::RelayError;
use crate::models::{NutritionRecord, UploadedImage};
use crate::services::{normalize, resolve_webhook_url, ReplyShape, WebhookClient};

/// Meal photos straight off a phone camera run well past the framework's
/// 2 MiB default.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub struct AppState {
    pub webhook: WebhookClient,
}

pub fn create_router(webhook: WebhookClient) -> Router {
    let state = Arc::new(AppState { webhook });

    Router::new()
        .route("/", get(root_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// The analysis relay: accept one uploaded image, forward it to the webhook,
/// normalize whichever reply shape comes back.
///
/// Each call is a stateless single pass. One terminal log event records the
/// outcome classification; everything else is debug-level operability noise.
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<NutritionRecord>, RelayError> {
    let result = analyze(&state.webhook, multipart).await;

    match result {
        Ok(record) => {
            log::info!(
                "Analyze outcome=success calories={:?} items={}",
                record.calories,
                record.food_items.as_ref().map_or(0, |f| f.len())
            );
            Ok(Json(record))
        }
        Err(err) => {
            log::warn!("Analyze outcome={} error={}", err.classification(), err);
            Err(err)
        }
    }
}

async fn analyze(
    webhook: &WebhookClient,
    multipart: Multipart,
) -> Result<NutritionRecord, RelayError> {
    // Input validation happens before the endpoint is even resolved: a
    // missing image must not produce a misconfiguration error or a network
    // call.
    let image = extract_image(multipart).await?;

    let url = resolve_webhook_url()?;
    let shape = ReplyShape::from_env();

    log::debug!(
        "Forwarding upload to {}: name={:?} type={:?} size={}",
        url,
        image.filename,
        image.content_type,
        image.size()
    );

    let body = webhook.forward(&url, &image).await?;

    normalize(&body, shape)
}

/// Pull the single `image` field out of the multipart request. Other fields
/// are ignored; a missing or empty image field is the caller's error.
async fn extract_image(mut multipart: Multipart) -> Result<UploadedImage, RelayError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| RelayError::MissingImage)?
    {
        if field.name() != Some("image") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(|_| RelayError::MissingImage)?;

        if data.is_empty() {
            return Err(RelayError::MissingImage);
        }

        return Ok(UploadedImage {
            data,
            filename,
            content_type,
        });
    }

    Err(RelayError::MissingImage)
}

async fn root_handler() -> &'static str {
    "NutriSnap Analysis Relay - POST /api/analyze with an 'image' form field"
}

async fn health_check() -> &'static str {
    "OK"
}
