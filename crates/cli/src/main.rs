use clap::Parser;
use std::sync::Arc;
use stockdash_core::dashboard::{Dashboard, DashboardOptions, DashboardView, FetchRequest, StatusLevel};
use stockdash_core::forecast::ForecastOptions;
use stockdash_core::ingest::{HistoryRange, YahooFinanceClient};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "stockdash_cli")]
struct Args {
    /// Ticker symbol to fetch (e.g. AAPL).
    #[arg(long)]
    symbol: String,

    /// History window: 1mo, 3mo, 6mo or 1y.
    #[arg(long, default_value = "6mo")]
    range: HistoryRange,

    /// Forecast horizon in days. Defaults to FORECAST_HORIZON_DAYS or 30.
    #[arg(long)]
    horizon_days: Option<usize>,

    /// Print the rendered view as JSON instead of a text report.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stockdash_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let horizon_days = match args.horizon_days {
        Some(days) => {
            anyhow::ensure!(
                (1..=365).contains(&days),
                "--horizon-days must be 1..=365 (got {days})"
            );
            days
        }
        None => settings.require_forecast_horizon_days()?,
    };

    let provider = YahooFinanceClient::from_settings(&settings)?;
    let dashboard = Dashboard::new(
        Arc::new(provider),
        DashboardOptions {
            range: args.range,
            forecast: ForecastOptions::default().with_horizon_days(horizon_days),
        },
    );

    tracing::info!(
        provider = dashboard.provider_name(),
        symbol = %args.symbol,
        range = args.range.as_str(),
        horizon_days,
        "running fetch cycle"
    );
    let view = dashboard
        .handle_fetch(FetchRequest {
            n_clicks: 1,
            symbol: Some(args.symbol),
        })
        .await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", text_report(&view));
    }

    if let Some(status) = view.status.as_ref() {
        if status.level == StatusLevel::Error {
            let err = anyhow::anyhow!("{}", status.message);
            sentry_anyhow::capture_anyhow(&err);
            return Err(err);
        }
    }
    Ok(())
}

fn text_report(view: &DashboardView) -> String {
    let mut out = String::new();
    let mut line = |s: &str| {
        out.push_str(s);
        out.push('\n');
    };

    if let Some(status) = &view.status {
        if let Some(heading) = &status.heading {
            line(heading);
        }
        line(&status.message);
    }
    if let Some(details) = &view.stock_details {
        line("");
        line(&details.heading);
        for l in &details.lines {
            line(&format!("  {l}"));
        }
    }
    if let Some(price) = &view.current_price {
        line("");
        line(price);
    }
    if let Some(rec) = &view.recommendation {
        line(rec);
    }
    if let Some(prediction) = &view.prediction {
        line("");
        line(&prediction.heading);
        // The predicted line is drawn last, over the uncertainty band.
        if let Some(trace) = prediction.figure.data.last() {
            let tail_start = trace.x.len().saturating_sub(7);
            for (date, value) in trace.x.iter().zip(&trace.y).skip(tail_start) {
                line(&format!("  {date}  {value:.2}"));
            }
        }
    }
    out
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
