use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::api::vapi_client::CallProvider;
use crate::error::AppError;
use crate::models::contact_models::{CallOutcome, CallRequest, ContactRecord};
use crate::utils::callback_prompts::system_prompt_for;

/// Lifecycle of one submitted contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackState {
    Received,
    Scheduled,
    Attempted,
    Succeeded,
    Failed,
}

impl CallbackState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CallbackState::Succeeded | CallbackState::Failed)
    }

    /// Next state when moving forward. Terminal states stay put.
    fn advance(self, outcome: Option<&CallOutcome>) -> CallbackState {
        match (self, outcome) {
            (CallbackState::Received, _) => CallbackState::Scheduled,
            (CallbackState::Scheduled, _) => CallbackState::Attempted,
            (CallbackState::Attempted, Some(o)) if o.success => CallbackState::Succeeded,
            (CallbackState::Attempted, _) => CallbackState::Failed,
            (terminal, _) => terminal,
        }
    }
}

/// Handle to a callback that has been put on the timer.
///
/// Dropping it detaches the task; it cannot cancel it.
#[derive(Debug)]
pub struct ScheduledCallback {
    pub callback_id: Uuid,
    pub scheduled_for: DateTime<Utc>,
    pub handle: JoinHandle<CallbackState>,
}

/// Fires one delayed outbound call per contact on an in-process timer.
/// Nothing is persisted: a restart loses every pending callback.
#[derive(Clone)]
pub struct CallbackDispatcher {
    provider: Arc<dyn CallProvider>,
    delay: Duration,
}

impl CallbackDispatcher {
    pub fn new(provider: Arc<dyn CallProvider>, delay: Duration) -> Self {
        Self { provider, delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(&self, record: ContactRecord) -> Result<ScheduledCallback, AppError> {
        self.schedule_after(record, self.delay)
    }

    pub fn schedule_after(&self, record: ContactRecord, delay: Duration) -> Result<ScheduledCallback, AppError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| AppError::internal(format!("no async runtime to schedule on: {e}")))?;
        let offset = chrono::Duration::from_std(delay)
            .map_err(|e| AppError::internal(format!("callback delay out of range: {e}")))?;
        let scheduled_for = Utc::now()
            .checked_add_signed(offset)
            .ok_or_else(|| AppError::internal("callback time out of range"))?;
        let deadline = tokio::time::Instant::now()
            .checked_add(delay)
            .ok_or_else(|| AppError::internal("callback time out of range"))?;

        let callback_id = Uuid::new_v4();
        let span = info_span!("callback", %callback_id, customer = %record.name);
        let state = CallbackState::Received.advance(None);

        span.in_scope(|| {
            info!(
                "Scheduling callback for {} in {}s (at {})",
                record.name,
                delay.as_secs(),
                scheduled_for.to_rfc3339()
            );
        });

        let provider = Arc::clone(&self.provider);
        let handle = runtime.spawn(
            async move {
                tokio::time::sleep_until(deadline).await;
                run_callback(provider.as_ref(), &record, state).await
            }
            .instrument(span),
        );

        Ok(ScheduledCallback {
            callback_id,
            scheduled_for,
            handle,
        })
    }
}

async fn run_callback(provider: &dyn CallProvider, record: &ContactRecord, state: CallbackState) -> CallbackState {
    let state = state.advance(None);
    info!("Initiating callback for {}...", record.name);

    let request = CallRequest {
        customer_number: record.phone.clone(),
        customer_name: record.name.clone(),
        customer_email: record.email.clone(),
        system_prompt: system_prompt_for(record),
    };

    let outcome = match provider.place_call(&request).await {
        Ok(outcome) => outcome,
        Err(e) => CallOutcome::failed(e.to_string()),
    };

    let state = state.advance(Some(&outcome));
    match state {
        CallbackState::Succeeded => log_callback_attempt(record, &outcome),
        _ => handle_callback_failure(record, &outcome),
    }
    state
}

fn log_callback_attempt(record: &ContactRecord, outcome: &CallOutcome) {
    info!(
        customer = %record.name,
        phone = %record.phone,
        source = ?record.source,
        call_id = outcome.call_id.as_deref().unwrap_or(""),
        status = "initiated",
        "Callback initiated successfully for {}",
        record.name
    );
}

// No retry or admin notification: a failed callback ends here.
fn handle_callback_failure(record: &ContactRecord, outcome: &CallOutcome) {
    error!(
        customer = %record.name,
        phone = %record.phone,
        error = %outcome.message,
        status = "failed",
        "Callback failed for {}",
        record.name
    );
}
