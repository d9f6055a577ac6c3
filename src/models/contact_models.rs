use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::utils::phone::normalize_phone;

pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields: name and phone";

/// Body posted by the chatbot relay or the site's contact form.
///
/// Everything is optional on the wire so a missing name or phone is reported
/// as a validation failure instead of a parse failure.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub interested_service: Option<String>,
    #[serde(default)]
    pub preferred_time: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of the floating "AI Callback" form.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CallbackFormPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<CallbackFormPayload> for WebhookPayload {
    fn from(form: CallbackFormPayload) -> Self {
        WebhookPayload {
            name: form.name,
            phone: form.phone,
            email: form.email,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactSource {
    ChatbotWebhook,
    CallbackForm,
}

/// A validated, normalized contact. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactRecord {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub interested_service: Option<String>,
    pub preferred_time: Option<String>,
    pub message: Option<String>,
    pub source: ContactSource,
}

impl ContactRecord {
    pub fn from_payload(
        payload: WebhookPayload,
        source: ContactSource,
        default_country_code: &str,
    ) -> Result<Self, AppError> {
        let name = non_blank(payload.name);
        let phone = non_blank(payload.phone);

        let (name, phone) = match (name, phone) {
            (Some(name), Some(phone)) => (name, phone),
            _ => return Err(AppError::validation(MISSING_FIELDS_MESSAGE)),
        };

        let phone = normalize_phone(&phone, default_country_code)
            .ok_or_else(|| AppError::validation(format!("Invalid phone number: {}", phone)))?;

        Ok(ContactRecord {
            name,
            phone,
            email: non_blank(payload.email),
            interested_service: non_blank(payload.interested_service),
            preferred_time: non_blank(payload.preferred_time),
            message: non_blank(payload.message),
            source,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Provider-neutral description of one outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub customer_number: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub system_prompt: String,
}

/// Result of a single call-placement attempt. Logged, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallOutcome {
    pub success: bool,
    #[serde(rename = "callId")]
    pub call_id: Option<String>,
    pub message: String,
}

impl CallOutcome {
    pub fn placed(call_id: impl Into<String>, message: impl Into<String>) -> Self {
        CallOutcome {
            success: true,
            call_id: Some(call_id.into()),
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        CallOutcome {
            success: false,
            call_id: None,
            message: message.into(),
        }
    }
}
