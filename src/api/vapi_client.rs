use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use tracing::{error, info};

use crate::api::vapi_dtos::{AssistantConfig, CreateCallRequest, CreateCallResponse, Customer, ErrorResponse};
use crate::config::settings::ProviderSettings;
use crate::error::ProviderError;
use crate::models::contact_models::{CallOutcome, CallRequest};

/// Something that can place an outbound voice call.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CallProvider: Send + Sync {
    async fn place_call(&self, request: &CallRequest) -> Result<CallOutcome, ProviderError>;
}

/// Places calls through Vapi's `POST /call`.
#[derive(Debug, Clone)]
pub struct VapiClient {
    client: Client,
    api_key: String,
    phone_number_id: String,
    settings: ProviderSettings,
}

impl VapiClient {
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| ProviderError::Configuration("VAPI_API_KEY is not set".to_string()))?;
        let phone_number_id = settings
            .phone_number_id
            .clone()
            .ok_or_else(|| ProviderError::Configuration("VAPI_PHONE_NUMBER_ID is not set".to_string()))?;

        Ok(Self {
            client: Client::new(),
            api_key,
            phone_number_id,
            settings,
        })
    }

    fn build_payload(&self, request: &CallRequest) -> CreateCallRequest {
        let assistant = AssistantConfig::from_settings(&self.settings.assistant, &request.system_prompt);
        let customer = Customer {
            number: request.customer_number.clone(),
            name: request.customer_name.clone(),
            email: request.customer_email.clone(),
        };

        match &self.settings.assistant_id {
            Some(assistant_id) => CreateCallRequest {
                assistant_id: Some(assistant_id.clone()),
                assistant: None,
                assistant_overrides: Some(assistant),
                phone_number_id: self.phone_number_id.clone(),
                customer,
            },
            None => CreateCallRequest {
                assistant_id: None,
                assistant: Some(assistant),
                assistant_overrides: None,
                phone_number_id: self.phone_number_id.clone(),
                customer,
            },
        }
    }
}

#[async_trait]
impl CallProvider for VapiClient {
    async fn place_call(&self, request: &CallRequest) -> Result<CallOutcome, ProviderError> {
        let payload = self.build_payload(request);
        let url = format!("{}/call", self.settings.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.describe())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
            error!("Vapi rejected call for {}: {} ({})", request.customer_name, message, status);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let created: CreateCallResponse = response.json().await?;
        info!(
            "Vapi accepted call {} for {} (status {:?})",
            created.id, request.customer_name, created.status
        );

        Ok(CallOutcome::placed(
            created.id,
            format!("Contextual callback initiated for {}.", request.customer_name),
        ))
    }
}

/// Stand-in provider that never dials. Used while testing the funnel without
/// spending provider credits.
#[derive(Debug, Clone)]
pub struct SimulatedProvider {
    latency: Duration,
}

impl SimulatedProvider {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait]
impl CallProvider for SimulatedProvider {
    async fn place_call(&self, request: &CallRequest) -> Result<CallOutcome, ProviderError> {
        tokio::time::sleep(self.latency).await;

        info!("SIMULATED Vapi callback for {} at {}", request.customer_name, request.customer_number);

        Ok(CallOutcome::placed(
            format!("sim_ctx_{}", chrono::Utc::now().timestamp_millis()),
            format!(
                "SIMULATION: AI would call {} at {}.",
                request.customer_name, request.customer_number
            ),
        ))
    }
}
