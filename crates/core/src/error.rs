use std::fmt;

/// Failures the dashboard core can report to presentation code.
///
/// Travels inside `anyhow::Error` across the fetch layer; callers that need to
/// tell the two apart use `downcast_ref::<DashboardError>()`.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardError {
    /// A required field is missing, mistyped or out of range in a backend payload.
    MalformedResponse {
        section: &'static str,
        detail: String,
    },
    /// The backend could not be reached or answered with a non-success status.
    FetchFailure {
        endpoint: String,
        status: Option<u16>,
        detail: String,
    },
}

impl DashboardError {
    pub fn malformed(section: &'static str, detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            section,
            detail: detail.into(),
        }
    }

    pub fn fetch(endpoint: impl Into<String>, status: Option<u16>, detail: impl Into<String>) -> Self {
        Self::FetchFailure {
            endpoint: endpoint.into(),
            status,
            detail: detail.into(),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse { .. })
    }

    /// Network errors, timeouts, throttling and 5xx may succeed on a second try.
    /// Other 4xx statuses and malformed bodies will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::MalformedResponse { .. } => false,
            Self::FetchFailure { status: None, .. } => true,
            Self::FetchFailure {
                status: Some(status),
                ..
            } => matches!(*status, 408 | 429) || *status >= 500,
        }
    }
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedResponse { section, detail } => {
                write!(f, "malformed response (section={section}): {detail}")
            }
            Self::FetchFailure {
                endpoint,
                status: Some(status),
                detail,
            } => write!(f, "fetch failed (endpoint={endpoint}, status={status}): {detail}"),
            Self::FetchFailure {
                endpoint,
                status: None,
                detail,
            } => write!(f, "fetch failed (endpoint={endpoint}): {detail}"),
        }
    }
}

impl std::error::Error for DashboardError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failing_section() {
        let err = DashboardError::malformed("finance_metrics", "missing field `currency`");
        assert_eq!(
            err.to_string(),
            "malformed response (section=finance_metrics): missing field `currency`"
        );
        assert!(err.is_malformed());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(DashboardError::fetch("/x", None, "connection reset").is_retryable());
        assert!(DashboardError::fetch("/x", Some(503), "").is_retryable());
        assert!(DashboardError::fetch("/x", Some(429), "").is_retryable());
        assert!(!DashboardError::fetch("/x", Some(401), "").is_retryable());
        assert!(!DashboardError::fetch("/x", Some(403), "").is_retryable());
        assert!(!DashboardError::fetch("/x", Some(404), "").is_retryable());
        assert!(!DashboardError::malformed("payload", "not JSON").is_retryable());
    }

    #[test]
    fn survives_a_round_trip_through_anyhow() {
        let err: anyhow::Error = DashboardError::fetch("/partners/dashboard/", Some(503), "unavailable").into();
        let diag = err.downcast_ref::<DashboardError>().unwrap();
        assert!(!diag.is_malformed());
        assert!(err.to_string().contains("status=503"));
    }
}
