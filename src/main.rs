use anyhow::Result;
use pv_forecast_engine::{api, config::Config, controller, telemetry};
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load()?;

    if cfg.weather.entity_id.is_some()
        && (cfg.weather.token.is_empty() || cfg.weather.token.starts_with("__SET_VIA_ENV"))
    {
        anyhow::bail!(
            "PVF__WEATHER__TOKEN must be set to a long-lived access token when a weather entity is configured"
        );
    }

    let state = controller::AppState::new(cfg.clone())?;
    let app = api::router(state.clone());

    let addr = cfg.server.socket_addr()?;
    if cfg.server.host == "0.0.0.0" {
        warn!("binding to 0.0.0.0 exposes the service to the network");
    }

    info!(%addr, site = %cfg.site.name, "starting pv forecast engine");

    controller::spawn_refresh_task(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
