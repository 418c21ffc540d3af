use axum::{
    extract::State,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockdash_core::dashboard::{Dashboard, DashboardOptions, DashboardView, FetchRequest};
use stockdash_core::forecast::ForecastOptions;
use stockdash_core::ingest::YahooFinanceClient;

const INDEX_HTML: &str = include_str!("../static/index.html");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stockdash_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let dashboard = match build_dashboard(&settings) {
        Ok(dashboard) => dashboard,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "failed to build dashboard");
            return Err(e);
        }
    };

    let state = AppState {
        dashboard: Arc::new(dashboard),
    };
    let app = router(state);

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], settings.port()));

    tracing::info!(%addr, "dashboard listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Clone)]
struct AppState {
    dashboard: Arc<Dashboard>,
}

fn build_dashboard(settings: &stockdash_core::config::Settings) -> anyhow::Result<Dashboard> {
    let provider = YahooFinanceClient::from_settings(settings)?;
    let options = DashboardOptions {
        forecast: ForecastOptions::default()
            .with_horizon_days(settings.require_forecast_horizon_days()?),
        ..DashboardOptions::default()
    };
    Ok(Dashboard::new(Arc::new(provider), options))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/api/fetch", post(fetch))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn fetch(
    State(state): State<AppState>,
    Json(req): Json<FetchRequest>,
) -> Json<DashboardView> {
    Json(state.dashboard.handle_fetch(req).await)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &stockdash_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
