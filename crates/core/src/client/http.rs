use crate::client::{CandidateListing, DashboardApi, Session};
use crate::config::Settings;
use crate::domain::contract::{ApiDashboardResponse, CandidatePage};
use crate::domain::profile::PartnerProfile;
use crate::error::DashboardError;
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpDashboardApi {
    http: reqwest::Client,
    base_url: String,
    dashboard_path: String,
    candidates_path: String,
    profile_path: String,
    attempts: u32,
    max_candidate_pages: u32,
}

impl HttpDashboardApi {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings.require_api_base_url()?.to_string();
        anyhow::ensure!(
            settings.fetch_attempts >= 1,
            "PREPPIT_FETCH_ATTEMPTS must be >= 1"
        );

        let http = reqwest::Client::builder()
            .timeout(settings.http_timeout())
            .build()
            .context("failed to build partner api http client")?;

        Ok(Self {
            http,
            base_url,
            dashboard_path: settings.dashboard_path.clone(),
            candidates_path: settings.candidates_path.clone(),
            profile_path: settings.profile_path.clone(),
            attempts: settings.fetch_attempts,
            max_candidate_pages: settings.max_candidate_pages.max(1),
        })
    }

    fn url(&self, path: &str) -> String {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(session: &Session) -> anyhow::Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", session.token()))
            .context("session token is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        Ok(headers)
    }

    async fn get_once(&self, url: &str, session: &Session) -> anyhow::Result<Value> {
        let headers = Self::headers(session)?;

        let res = self
            .http
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| DashboardError::fetch(url, None, e.to_string()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| DashboardError::fetch(url, Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            return Err(DashboardError::fetch(url, Some(status.as_u16()), truncate(&text)).into());
        }

        let raw_json = serde_json::from_str::<Value>(&text).map_err(|e| {
            DashboardError::malformed("payload", format!("response from {url} is not JSON: {e}"))
        })?;
        Ok(raw_json)
    }

    /// GETs `url`, retrying transient fetch failures up to the configured attempt budget.
    /// Client errors and malformed bodies are returned immediately.
    async fn get_json(&self, url: &str, session: &Session) -> anyhow::Result<Value> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.get_once(url, session).await {
                Ok(v) => return Ok(v),
                Err(err) => {
                    let retryable = err
                        .downcast_ref::<DashboardError>()
                        .is_some_and(DashboardError::is_retryable);
                    if !retryable || attempt >= self.attempts {
                        return Err(err);
                    }
                    let backoff = backoff_for(attempt);
                    tracing::warn!(attempt, %url, ?backoff, error = %err, "partner api fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl DashboardApi for HttpDashboardApi {
    fn backend_name(&self) -> &'static str {
        "partner_http_json"
    }

    async fn fetch_dashboard(&self, session: &Session) -> anyhow::Result<ApiDashboardResponse> {
        let url = self.url(&self.dashboard_path);
        let raw = self.get_json(&url, session).await?;
        Ok(ApiDashboardResponse::from_value(&raw)?)
    }

    async fn fetch_candidates(&self, session: &Session) -> anyhow::Result<CandidateListing> {
        let first = self.url(&self.candidates_path);
        let mut next = Some(first.clone());
        let mut pages: u32 = 0;
        let mut count: u64 = 0;
        let mut records = Vec::new();

        while let Some(url) = next.take() {
            if pages >= self.max_candidate_pages {
                return Err(DashboardError::fetch(
                    first.as_str(),
                    None,
                    format!("candidate listing exceeded {} pages", self.max_candidate_pages),
                )
                .into());
            }
            pages += 1;

            let raw = self.get_json(&url, session).await?;
            let page = CandidatePage::from_value(raw)?;
            count = page.count;
            records.extend(page.results);
            next = page.next.filter(|s| !s.trim().is_empty());
        }

        tracing::debug!(pages, count, fetched = records.len(), "fetched candidate listing");
        Ok(CandidateListing { count, records })
    }

    async fn fetch_profile(&self, session: &Session) -> anyhow::Result<PartnerProfile> {
        let url = self.url(&self.profile_path);
        let raw = self.get_json(&url, session).await?;
        let profile = serde_json::from_value::<PartnerProfile>(raw)
            .map_err(|e| DashboardError::malformed("profile", e.to_string()))?;
        Ok(profile)
    }
}

const MAX_BACKOFF_EXPONENT: u32 = 6;

/// 1s, 2s, 4s, ... capped at 64s.
fn backoff_for(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
    Duration::from_secs(1u64 << exponent)
}

fn truncate(body: &str) -> String {
    const MAX: usize = 512;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
