use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rides_callback::api::vapi_client::{CallProvider, SimulatedProvider, VapiClient};
use rides_callback::config::settings::Settings;
use rides_callback::jobs::dispatcher::CallbackDispatcher;
use rides_callback::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let settings = Settings::from_env()?;

    let _guard = settings.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.rust_log))
        .init();

    let provider: Arc<dyn CallProvider> = if settings.provider.simulate {
        info!("VAPI_SIMULATE is on, callbacks will not dial anyone");
        Arc::new(SimulatedProvider::default())
    } else {
        Arc::new(VapiClient::new(settings.provider.clone()).context("Failed to set up Vapi client")?)
    };

    let dispatcher = CallbackDispatcher::new(provider, settings.callback_delay);
    let addr = settings.server_addr()?;

    let state = Arc::new(AppState { settings, dispatcher });
    let app = create_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
