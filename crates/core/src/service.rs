//! Fetches both dashboard inputs and runs them through transform, aggregate and merge.

use crate::aggregate::{aggregate_with, BucketMode};
use crate::client::{CandidateListing, DashboardApi, Session};
use crate::config::Settings;
use crate::domain::contract::ApiDashboardResponse;
use crate::domain::profile::ProfileSummary;
use crate::domain::view::DashboardViewModel;
use crate::error::DashboardError;
use crate::merge::{merge, CandidateFragment};
use crate::transform::transform;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// What presentation code should show for the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardState {
    Loading,
    Ready(DashboardViewModel),
    Failed(DashboardError),
}

impl DashboardState {
    pub fn from_result(res: anyhow::Result<DashboardViewModel>) -> Self {
        match res {
            Ok(vm) => Self::Ready(vm),
            Err(err) => Self::Failed(
                err.downcast::<DashboardError>()
                    .unwrap_or_else(|other| DashboardError::fetch("dashboard", None, format!("{other:#}"))),
            ),
        }
    }

    /// The fallback while loading, the data once ready, nothing on failure.
    pub fn view_or_fallback(&self) -> Option<DashboardViewModel> {
        match self {
            Self::Loading => Some(DashboardViewModel::fallback()),
            Self::Ready(vm) => Some(vm.clone()),
            Self::Failed(_) => None,
        }
    }
}

/// Raw inputs as fetched. The view depends on the reference date as well, so it is rebuilt
/// from these on every call rather than cached itself.
#[derive(Debug, Clone)]
struct CachedInputs {
    fetched_at: Instant,
    payload: ApiDashboardResponse,
    listing: CandidateListing,
}

pub struct DashboardService {
    api: Arc<dyn DashboardApi>,
    bucket_mode: BucketMode,
    ttl: Duration,
    cache: Mutex<HashMap<Session, CachedInputs>>,
}

impl DashboardService {
    pub fn new(api: Arc<dyn DashboardApi>, bucket_mode: BucketMode, ttl: Duration) -> Self {
        Self {
            api,
            bucket_mode,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_settings(api: Arc<dyn DashboardApi>, settings: &Settings) -> Self {
        Self::new(api, settings.bucket_mode(), settings.cache_ttl())
    }

    /// Reuses the session's fetched inputs while they are fresher than the staleness window,
    /// otherwise fetches both concurrently. The view is built for `reference` either way.
    pub async fn load(
        &self,
        session: &Session,
        reference: DateTime<Utc>,
    ) -> anyhow::Result<DashboardViewModel> {
        if let Some(hit) = self.cached(session).await {
            tracing::debug!(backend = self.api.backend_name(), "dashboard cache hit");
            return self.build(&hit.payload, &hit.listing, reference);
        }

        let (payload, listing) = self.fetch_inputs(session).await?;
        let view = self.build(&payload, &listing, reference)?;

        let mut cache = self.cache.lock().await;
        cache.retain(|_, entry| entry.fetched_at.elapsed() < self.ttl);
        cache.insert(
            session.clone(),
            CachedInputs {
                fetched_at: Instant::now(),
                payload,
                listing,
            },
        );
        Ok(view)
    }

    pub async fn load_state(&self, session: &Session, reference: DateTime<Utc>) -> DashboardState {
        DashboardState::from_result(self.load(session, reference).await)
    }

    /// Bypasses the cache and does not populate it.
    pub async fn fetch_fresh(
        &self,
        session: &Session,
        reference: DateTime<Utc>,
    ) -> anyhow::Result<DashboardViewModel> {
        let (payload, listing) = self.fetch_inputs(session).await?;
        self.build(&payload, &listing, reference)
    }

    pub async fn load_profile(&self, session: &Session) -> anyhow::Result<ProfileSummary> {
        let profile = self.api.fetch_profile(session).await?;
        Ok(profile.summary())
    }

    pub async fn invalidate(&self, session: &Session) -> bool {
        self.cache.lock().await.remove(session).is_some()
    }

    /// Number of sessions currently holding cached inputs.
    pub async fn cached_sessions(&self) -> usize {
        self.cache.lock().await.len()
    }

    async fn fetch_inputs(
        &self,
        session: &Session,
    ) -> anyhow::Result<(ApiDashboardResponse, CandidateListing)> {
        let started = Instant::now();
        let inputs = tokio::try_join!(
            self.api.fetch_dashboard(session),
            self.api.fetch_candidates(session),
        )?;
        tracing::debug!(
            backend = self.api.backend_name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fetched dashboard inputs"
        );
        Ok(inputs)
    }

    fn build(
        &self,
        payload: &ApiDashboardResponse,
        listing: &CandidateListing,
        reference: DateTime<Utc>,
    ) -> anyhow::Result<DashboardViewModel> {
        let base = transform(payload)?;
        let aggregate = aggregate_with(&listing.records, reference, self.bucket_mode);
        let total = listing.records.len() as u64;
        if listing.count != total {
            tracing::warn!(
                reported = listing.count,
                fetched = total,
                "candidate listing count differs from fetched records"
            );
        }
        let fragment = CandidateFragment::from_aggregate(aggregate, total);

        tracing::info!(
            backend = self.api.backend_name(),
            %reference,
            candidates = total,
            candidates_change = fragment.candidates_change,
            next_steps = base.next_steps.len(),
            "dashboard view rebuilt"
        );
        Ok(merge(&base, &fragment))
    }

    async fn cached(&self, session: &Session) -> Option<CachedInputs> {
        let mut cache = self.cache.lock().await;
        match cache.get(session) {
            Some(entry) if entry.fetched_at.elapsed() < self.ttl => Some(entry.clone()),
            Some(_) => {
                cache.remove(session);
                None
            }
            None => None,
        }
    }
}
