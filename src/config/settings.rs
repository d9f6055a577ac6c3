use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static COUNTRY_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+\d{1,3}$").expect("country code pattern"));

pub const DEFAULT_VAPI_BASE_URL: &str = "https://api.vapi.ai";
pub const DEFAULT_CALLBACK_DELAY: Duration = Duration::from_secs(2 * 60);

/// Everything the service reads from the environment, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Prepended to numbers that arrive without a leading `+`.
    pub default_country_code: String,
    pub callback_delay: Duration,
    pub rust_log: String,
    pub sentry_dsn: Option<String>,
    pub provider: ProviderSettings,
}

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Saved assistant on the Vapi dashboard. When set the script is sent as overrides.
    pub assistant_id: Option<String>,
    pub phone_number_id: Option<String>,
    pub simulate: bool,
    pub assistant: AssistantSettings,
}

/// Voice agent parameters sent with every outbound call.
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub model_provider: String,
    pub model: String,
    pub temperature: f32,
    pub voice_provider: String,
    pub voice_id: String,
    pub voice_speed: f32,
    pub voice_stability: f32,
    pub voice_similarity_boost: f32,
    pub first_message: String,
    pub end_call_message: String,
    pub max_duration_seconds: u32,
    pub silence_timeout_seconds: u32,
    pub response_delay_seconds: u32,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            model_provider: "openai".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            voice_provider: "elevenlabs".to_string(),
            voice_id: "rachel".to_string(),
            voice_speed: 1.0,
            voice_stability: 0.8,
            voice_similarity_boost: 0.8,
            first_message: "Hi! This is the AI assistant from My Rides calling you back as requested. \
                Thanks for your interest in our ride service! Do you have a couple of minutes for me \
                to tell you about what we offer?"
                .to_string(),
            end_call_message: "Thank you for your time! We look forward to serving you with My Rides. \
                Have a great day!"
                .to_string(),
            max_duration_seconds: 180,
            silence_timeout_seconds: 10,
            response_delay_seconds: 1,
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_VAPI_BASE_URL.to_string(),
            assistant_id: None,
            phone_number_id: None,
            simulate: false,
            assistant: AssistantSettings::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            default_country_code: "+27".to_string(),
            callback_delay: DEFAULT_CALLBACK_DELAY,
            rust_log: "info".to_string(),
            sentry_dsn: None,
            provider: ProviderSettings::default(),
        }
    }
}

impl Settings {
    /// Reads the process environment. Call after `dotenvy::dotenv()`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup, falling back to defaults
    /// for anything unset or blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Settings::default();

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().with_context(|| format!("PORT is not a valid port: {raw}"))?,
            None => defaults.port,
        };

        let callback_delay = match get("CALLBACK_DELAY_SECONDS") {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .with_context(|| format!("CALLBACK_DELAY_SECONDS is not a number of seconds: {raw}"))?,
            ),
            None => defaults.callback_delay,
        };

        let simulate = match get("VAPI_SIMULATE") {
            Some(raw) => parse_flag(&raw).with_context(|| format!("VAPI_SIMULATE is not a boolean: {raw}"))?,
            None => false,
        };

        let settings = Settings {
            host: get("HOST").unwrap_or(defaults.host),
            port,
            default_country_code: get("DEFAULT_COUNTRY_CODE").unwrap_or(defaults.default_country_code),
            callback_delay,
            rust_log: get("RUST_LOG").unwrap_or(defaults.rust_log),
            sentry_dsn: get("SENTRY_DSN"),
            provider: ProviderSettings {
                api_key: get("VAPI_API_KEY"),
                base_url: get("VAPI_BASE_URL").unwrap_or(defaults.provider.base_url),
                assistant_id: get("VAPI_ASSISTANT_ID"),
                phone_number_id: get("VAPI_PHONE_NUMBER_ID"),
                simulate,
                assistant: AssistantSettings::default(),
            },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn server_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .context("Invalid server address")
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            bail!("PORT must be greater than 0");
        }

        if !COUNTRY_CODE.is_match(&self.default_country_code) {
            bail!(
                "DEFAULT_COUNTRY_CODE must look like +27, got {}",
                self.default_country_code
            );
        }

        if !self.provider.simulate {
            if self.provider.api_key.is_none() {
                bail!("VAPI_API_KEY must be set (or VAPI_SIMULATE=true)");
            }
            if self.provider.phone_number_id.is_none() {
                bail!("VAPI_PHONE_NUMBER_ID must be set (or VAPI_SIMULATE=true)");
            }
        }

        Ok(())
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("expected true or false"),
    }
}
