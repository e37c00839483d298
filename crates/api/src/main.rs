use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use preppit_core::client::http::HttpDashboardApi;
use preppit_core::client::Session;
use preppit_core::domain::profile::ProfileSummary;
use preppit_core::domain::view::DashboardViewModel;
use preppit_core::error::DashboardError;
use preppit_core::service::DashboardService;
use preppit_core::time::calendar::resolve_reference_date;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = preppit_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let service = match HttpDashboardApi::from_settings(&settings) {
        Ok(api) => Some(Arc::new(DashboardService::from_settings(
            Arc::new(api),
            &settings,
        ))),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "partner api client unavailable; starting in degraded mode");
            None
        }
    };

    let state = AppState { service };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/refresh", post(refresh_dashboard))
        .route("/profile", get(get_profile))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    service: Option<Arc<DashboardService>>,
}

#[derive(Debug, Deserialize)]
struct DashboardQuery {
    reference_date: Option<String>,
}

async fn get_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardViewModel>, StatusCode> {
    let Some(service) = &state.service else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };
    let session = session_from_headers(&headers)?;

    let reference = resolve_reference_date(query.reference_date.as_deref(), chrono::Utc::now())
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    let view = service
        .load(&session, reference)
        .await
        .map_err(|e| report(&e))?;

    Ok(Json(view))
}

async fn refresh_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, StatusCode> {
    let Some(service) = &state.service else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };
    let session = session_from_headers(&headers)?;

    service.invalidate(&session).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProfileSummary>, StatusCode> {
    let Some(service) = &state.service else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };
    let session = session_from_headers(&headers)?;

    let summary = service
        .load_profile(&session)
        .await
        .map_err(|e| report(&e))?;

    Ok(Json(summary))
}

fn session_from_headers(headers: &HeaderMap) -> Result<Session, StatusCode> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;
    Session::new(token).map_err(|_| StatusCode::UNAUTHORIZED)
}

fn report(err: &anyhow::Error) -> StatusCode {
    let status = status_for(err);
    if status.is_server_error() {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %err, %status, "dashboard request failed");
    } else {
        tracing::warn!(error = %err, %status, "dashboard request rejected");
    }
    status
}

fn status_for(err: &anyhow::Error) -> StatusCode {
    match err.downcast_ref::<DashboardError>() {
        Some(DashboardError::FetchFailure {
            status: Some(401), ..
        }) => StatusCode::UNAUTHORIZED,
        Some(DashboardError::FetchFailure {
            status: Some(403), ..
        }) => StatusCode::FORBIDDEN,
        Some(_) => StatusCode::BAD_GATEWAY,
        None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_session() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok-1"));
        assert_eq!(session_from_headers(&headers).unwrap().token(), "tok-1");
    }

    #[test]
    fn rejects_missing_or_foreign_auth() {
        assert_eq!(
            session_from_headers(&HeaderMap::new()).unwrap_err(),
            StatusCode::UNAUTHORIZED
        );
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(
            session_from_headers(&headers).unwrap_err(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn maps_core_errors_to_statuses() {
        let malformed: anyhow::Error = DashboardError::malformed("key_metrics", "missing").into();
        assert_eq!(status_for(&malformed), StatusCode::BAD_GATEWAY);

        let expired: anyhow::Error = DashboardError::fetch("/partners/dashboard/", Some(401), "").into();
        assert_eq!(status_for(&expired), StatusCode::UNAUTHORIZED);

        let down: anyhow::Error = DashboardError::fetch("/partners/dashboard/", None, "refused").into();
        assert_eq!(status_for(&down), StatusCode::BAD_GATEWAY);

        assert_eq!(
            status_for(&anyhow::anyhow!("bug")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
