pub mod aggregate;
pub mod client;
pub mod domain;
pub mod error;
pub mod merge;
pub mod service;
pub mod time;
pub mod transform;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    use crate::aggregate::BucketMode;

    const DEFAULT_DASHBOARD_PATH: &str = "/partners/dashboard/";
    const DEFAULT_CANDIDATES_PATH: &str = "/partners/candidates/";
    const DEFAULT_PROFILE_PATH: &str = "/partners/me/";
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_FETCH_ATTEMPTS: u32 = 2;
    const DEFAULT_MAX_CANDIDATE_PAGES: u32 = 50;
    const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub api_base_url: Option<String>,
        pub api_token: Option<String>,
        pub dashboard_path: String,
        pub candidates_path: String,
        pub profile_path: String,
        pub http_timeout_secs: u64,
        pub fetch_attempts: u32,
        pub max_candidate_pages: u32,
        pub cache_ttl_secs: u64,
        pub year_aware_buckets: bool,
        pub sentry_dsn: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                api_base_url: None,
                api_token: None,
                dashboard_path: DEFAULT_DASHBOARD_PATH.to_string(),
                candidates_path: DEFAULT_CANDIDATES_PATH.to_string(),
                profile_path: DEFAULT_PROFILE_PATH.to_string(),
                http_timeout_secs: DEFAULT_TIMEOUT_SECS,
                fetch_attempts: DEFAULT_FETCH_ATTEMPTS,
                max_candidate_pages: DEFAULT_MAX_CANDIDATE_PAGES,
                cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
                year_aware_buckets: false,
                sentry_dsn: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let defaults = Self::default();
            let year_aware_buckets = match env_nonempty("PREPPIT_YEAR_AWARE_BUCKETS") {
                Some(s) => parse_bool(&s)
                    .with_context(|| format!("PREPPIT_YEAR_AWARE_BUCKETS is not a boolean: {s}"))?,
                None => defaults.year_aware_buckets,
            };

            Ok(Self {
                api_base_url: env_nonempty("PREPPIT_API_BASE_URL"),
                api_token: env_nonempty("PREPPIT_API_TOKEN"),
                dashboard_path: env_nonempty("PREPPIT_DASHBOARD_PATH")
                    .unwrap_or(defaults.dashboard_path),
                candidates_path: env_nonempty("PREPPIT_CANDIDATES_PATH")
                    .unwrap_or(defaults.candidates_path),
                profile_path: env_nonempty("PREPPIT_PROFILE_PATH")
                    .unwrap_or(defaults.profile_path),
                http_timeout_secs: env_parsed("PREPPIT_HTTP_TIMEOUT_SECS")?
                    .unwrap_or(defaults.http_timeout_secs),
                fetch_attempts: env_parsed("PREPPIT_FETCH_ATTEMPTS")?
                    .unwrap_or(defaults.fetch_attempts),
                max_candidate_pages: env_parsed("PREPPIT_MAX_CANDIDATE_PAGES")?
                    .unwrap_or(defaults.max_candidate_pages),
                cache_ttl_secs: env_parsed("PREPPIT_CACHE_TTL_SECS")?
                    .unwrap_or(defaults.cache_ttl_secs),
                year_aware_buckets,
                sentry_dsn: env_nonempty("SENTRY_DSN"),
            })
        }

        pub fn require_api_base_url(&self) -> anyhow::Result<&str> {
            self.api_base_url
                .as_deref()
                .context("PREPPIT_API_BASE_URL is required")
        }

        pub fn require_api_token(&self) -> anyhow::Result<&str> {
            self.api_token
                .as_deref()
                .context("PREPPIT_API_TOKEN is required")
        }

        pub fn http_timeout(&self) -> Duration {
            Duration::from_secs(self.http_timeout_secs)
        }

        pub fn cache_ttl(&self) -> Duration {
            Duration::from_secs(self.cache_ttl_secs)
        }

        pub fn bucket_mode(&self) -> BucketMode {
            if self.year_aware_buckets {
                BucketMode::ReferenceYear
            } else {
                BucketMode::MonthOfYear
            }
        }
    }

    fn env_nonempty(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn env_parsed<T>(key: &str) -> anyhow::Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        env_nonempty(key)
            .map(|s| {
                s.parse::<T>()
                    .with_context(|| format!("{key} has an invalid value: {s}"))
            })
            .transpose()
    }

    fn parse_bool(s: &str) -> Option<bool> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }

}
