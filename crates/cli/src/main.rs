use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use preppit_core::aggregate::{aggregate_with, BucketMode};
use preppit_core::client::http::HttpDashboardApi;
use preppit_core::client::Session;
use preppit_core::domain::contract::{CandidatePage, CandidateRecord};
use preppit_core::domain::view::DashboardViewModel;
use preppit_core::merge::{merge, CandidateFragment};
use preppit_core::service::DashboardService;
use preppit_core::time::calendar::resolve_reference_date;
use preppit_core::transform::transform_json;

#[derive(Debug, Parser)]
#[command(name = "preppit")]
struct Args {
    /// Reference date for candidate growth (YYYY-MM-DD). Defaults to now (UTC).
    #[arg(long)]
    reference_date: Option<String>,

    /// Only bucket candidates created in the reference year.
    #[arg(long)]
    year_aware: bool,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,

    /// Print the partner profile summary instead of the dashboard.
    #[arg(long, conflicts_with = "payload")]
    profile: bool,

    /// Saved dashboard payload; runs offline together with --candidates.
    #[arg(long, requires = "candidates")]
    payload: Option<PathBuf>,

    /// Saved candidate listing (a page object or a bare array of records).
    #[arg(long, requires = "payload")]
    candidates: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = preppit_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    if args.year_aware {
        settings.year_aware_buckets = true;
    }

    let reference = resolve_reference_date(args.reference_date.as_deref(), chrono::Utc::now())?;

    let output = match (&args.payload, &args.candidates) {
        (Some(payload), Some(candidates)) => {
            let view = run_offline(payload, candidates, reference, settings.bucket_mode())?;
            serde_json::to_value(view)?
        }
        _ => {
            let api = HttpDashboardApi::from_settings(&settings)?;
            let session = Session::new(settings.require_api_token()?)?;
            let service = DashboardService::from_settings(Arc::new(api), &settings);

            if args.profile {
                serde_json::to_value(service.load_profile(&session).await?)?
            } else {
                match service.fetch_fresh(&session, reference).await {
                    Ok(view) => serde_json::to_value(view)?,
                    Err(err) => {
                        sentry_anyhow::capture_anyhow(&err);
                        tracing::error!(%reference, error = %err, "dashboard fetch failed");
                        return Err(err);
                    }
                }
            }
        }
    };

    let text = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{text}");
    Ok(())
}

fn run_offline(
    payload_path: &Path,
    candidates_path: &Path,
    reference: chrono::DateTime<chrono::Utc>,
    mode: BucketMode,
) -> anyhow::Result<DashboardViewModel> {
    let payload = read_json(payload_path)?;
    let base = transform_json(&payload)?;

    let records = parse_candidates(read_json(candidates_path)?)?;
    let total = records.len() as u64;
    let fragment = CandidateFragment::from_aggregate(aggregate_with(&records, reference, mode), total);

    tracing::info!(%reference, candidates = total, ?mode, "built dashboard from saved payloads");
    Ok(merge(&base, &fragment))
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn parse_candidates(raw: serde_json::Value) -> anyhow::Result<Vec<CandidateRecord>> {
    if raw.is_array() {
        return serde_json::from_value(raw).context("failed to parse candidate records");
    }
    Ok(CandidatePage::from_value(raw)?.results)
}

fn init_sentry(settings: &preppit_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
