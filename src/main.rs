use anyhow::Context;
use bookswap_kernel::{settings::Settings, InitCtx};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load bookswap settings")?;
    bookswap_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        host = %settings.server.host,
        port = settings.server.port,
        "bookswap-app bootstrap starting"
    );

    let (registry, _state) = bookswap_app::build_app(&settings)?;
    let ctx = InitCtx {
        settings: &settings,
    };
    registry.boot(&ctx).await?;

    let served = bookswap_http::start_server(&registry, &settings).await;
    registry.shutdown().await?;
    served
}
