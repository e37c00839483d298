use crate::domain::contract::{ApiDashboardResponse, CandidateRecord};
use crate::domain::profile::PartnerProfile;
use std::fmt;

pub mod http;

/// Authenticated partner session. The fetch layer is the only thing that reads the token.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> anyhow::Result<Self> {
        let token = token.into().trim().to_string();
        anyhow::ensure!(!token.is_empty(), "session token must be non-empty");
        Ok(Self { token })
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}

/// Candidate listing after following every page.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateListing {
    /// Backend-reported total, which may exceed `records.len()` if the backend is mid-update.
    pub count: u64,
    pub records: Vec<CandidateRecord>,
}

#[async_trait::async_trait]
pub trait DashboardApi: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn fetch_dashboard(&self, session: &Session) -> anyhow::Result<ApiDashboardResponse>;

    async fn fetch_candidates(&self, session: &Session) -> anyhow::Result<CandidateListing>;

    async fn fetch_profile(&self, session: &Session) -> anyhow::Result<PartnerProfile>;
}
