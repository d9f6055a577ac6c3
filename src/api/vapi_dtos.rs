use serde::{Deserialize, Serialize};

use crate::config::settings::AssistantSettings;

/// Body of `POST /call`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant: Option<AssistantConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_overrides: Option<AssistantConfig>,
    pub phone_number_id: String,
    pub customer: Customer,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    pub model: ModelConfig,
    pub voice: VoiceConfig,
    pub first_message: String,
    pub end_call_message: String,
    pub max_duration_seconds: u32,
    pub silence_timeout_seconds: u32,
    pub response_delay_seconds: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelConfig {
    pub provider: String,
    pub model: String,
    pub messages: Vec<ModelMessage>,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub provider: String,
    pub voice_id: String,
    pub speed: f32,
    pub stability: f32,
    pub similarity_boost: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub number: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCallResponse {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorResponse {
    /// Vapi sends `message` either as a string or as a list of validation strings.
    pub fn describe(&self) -> Option<String> {
        match &self.message {
            Some(serde_json::Value::String(message)) => Some(message.clone()),
            Some(serde_json::Value::Array(items)) => Some(
                items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string).unwrap_or_else(|| item.to_string()))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => self.error.clone(),
        }
    }
}

impl AssistantConfig {
    pub fn from_settings(settings: &AssistantSettings, system_prompt: &str) -> Self {
        AssistantConfig {
            model: ModelConfig {
                provider: settings.model_provider.clone(),
                model: settings.model.clone(),
                messages: vec![ModelMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                }],
                temperature: settings.temperature,
            },
            voice: VoiceConfig {
                provider: settings.voice_provider.clone(),
                voice_id: settings.voice_id.clone(),
                speed: settings.voice_speed,
                stability: settings.voice_stability,
                similarity_boost: settings.voice_similarity_boost,
            },
            first_message: settings.first_message.clone(),
            end_call_message: settings.end_call_message.clone(),
            max_duration_seconds: settings.max_duration_seconds,
            silence_timeout_seconds: settings.silence_timeout_seconds,
            response_delay_seconds: settings.response_delay_seconds,
        }
    }
}
