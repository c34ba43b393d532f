//! Highlight feed service — binary entrypoint.
//! Boots the Axum HTTP server, wires the acquisition pipeline, metrics and
//! the background refresh scheduler.

use highlight_feed::{
    build_state,
    config::PipelineConfig,
    metrics::Metrics,
    router,
    scheduler::{spawn_refresh_scheduler, RefreshSchedulerCfg},
};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - HIGHLIGHTS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("HIGHLIGHTS_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pipeline=info,cache=info,provider=debug,scheduler=info,warn"));

    // Shuttle may already own the global subscriber; that's fine.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = PipelineConfig::load_default()?;
    let state = build_state(&cfg);

    if !state.pipeline.has_primary() {
        tracing::warn!("primary provider key missing; responses will be degraded or secondary-only");
    }

    let mut app = router(state.clone());
    match Metrics::init(cfg.cache_ttl_secs) {
        Ok(m) => app = app.merge(m.router()),
        Err(e) => tracing::warn!("metrics disabled: {e:#}"),
    }

    match cfg.refresh_interval() {
        Some(interval) => {
            spawn_refresh_scheduler(
                state.pipeline.clone(),
                state.reference.clone(),
                RefreshSchedulerCfg {
                    interval,
                    languages: cfg.languages.clone(),
                },
            );
        }
        None => tracing::info!("background refresh disabled"),
    }

    Ok(app.into())
}
