use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::AppState;
use crate::error::AppError;
use crate::jobs::dispatcher::ScheduledCallback;
use crate::models::contact_models::{CallbackFormPayload, ContactRecord, ContactSource, WebhookPayload};

#[derive(Debug, Serialize)]
pub struct IntakeResponse {
    pub success: bool,
    pub message: String,
    pub data: ScheduledContact,
}

#[derive(Debug, Serialize)]
pub struct ScheduledContact {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub interested_service: Option<String>,
    pub preferred_time: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "scheduledFor")]
    pub scheduled_for: String,
}

impl ScheduledContact {
    fn new(record: &ContactRecord, scheduled: &ScheduledCallback) -> Self {
        ScheduledContact {
            name: record.name.clone(),
            phone: record.phone.clone(),
            email: record.email.clone(),
            interested_service: record.interested_service.clone(),
            preferred_time: record.preferred_time.clone(),
            message: record.message.clone(),
            scheduled_for: scheduled.scheduled_for.to_rfc3339(),
        }
    }
}

/// `POST /api/webhook`: chatbot relay submissions. The callback goes out after
/// the configured delay with the chatbot context in the script.
pub async fn zapier_webhook(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<WebhookPayload>, JsonRejection>,
) -> Result<Json<IntakeResponse>, AppError> {
    let Json(payload) = payload.map_err(|e| {
        warn!("Rejected webhook body: {}", e.body_text());
        AppError::validation(format!("Invalid request body: {}", e.body_text()))
    })?;
    info!("Received webhook submission for {:?}", payload.name);

    let delay = state.dispatcher.delay();
    intake(&state, payload, ContactSource::ChatbotWebhook, delay)
}

/// `POST /api/callback`: the floating callback form. Dialed right away with the base script.
pub async fn request_callback(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CallbackFormPayload>, JsonRejection>,
) -> Result<Json<IntakeResponse>, AppError> {
    let Json(payload) = payload.map_err(|e| {
        warn!("Rejected callback request body: {}", e.body_text());
        AppError::validation(format!("Invalid request body: {}", e.body_text()))
    })?;

    intake(&state, payload.into(), ContactSource::CallbackForm, Duration::ZERO)
}

fn intake(
    state: &AppState,
    payload: WebhookPayload,
    source: ContactSource,
    delay: Duration,
) -> Result<Json<IntakeResponse>, AppError> {
    let record = ContactRecord::from_payload(payload, source, &state.settings.default_country_code)?;

    // fire-and-forget: the handle is dropped, the task keeps running
    let scheduled = state.dispatcher.schedule_after(record.clone(), delay)?;
    let data = ScheduledContact::new(&record, &scheduled);

    Ok(Json(IntakeResponse {
        success: true,
        message: format!(
            "Callback scheduled for {} at {} {}",
            record.name,
            record.phone,
            describe_delay(delay)
        ),
        data,
    }))
}

fn describe_delay(delay: Duration) -> String {
    let secs = delay.as_secs();
    match secs {
        0 => "now".to_string(),
        60 => "in 1 minute".to_string(),
        s if s % 60 == 0 => format!("in {} minutes", s / 60),
        s => format!("in {} seconds", s),
    }
}

pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "success": false,
            "message": "Method not allowed. Use POST.",
        })),
    )
}
