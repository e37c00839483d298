//! Wire shapes returned by the partner backend (snake_case, backend oriented).

use crate::error::DashboardError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiDashboardResponse {
    pub key_metrics: KeyMetrics,
    pub finance_metrics: FinanceMetrics,
    pub practice_metrics: PracticeMetrics,
    pub next_steps: NextSteps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMetrics {
    pub total_candidates_enrolled: u64,
    pub completed_sessions: CompletedSessions,
    pub average_candidate_score: f64,
    pub average_performance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedSessions {
    pub this_month: u64,
    pub all_time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceMetrics {
    pub revenue_and_payouts: RevenueAndPayouts,
    pub practice_sessions: PurchasedSessions,
}

/// Amounts are major units of `currency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueAndPayouts {
    pub total_revenue_generated: f64,
    pub total_payouts: f64,
    pub pending_payout: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchasedSessions {
    pub purchased: u64,
    pub utilized: u64,
    /// Percentage, 0..=100.
    pub utilization_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeMetrics {
    pub practice_sessions_taken: SessionsTaken,
    pub feedback_trends: FeedbackTrends,
    pub popular_exam_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionsTaken {
    pub total: u64,
    pub this_month: u64,
    pub this_week: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackTrends {
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
    pub average_rating: f64,
}

impl FeedbackTrends {
    /// Sum of all feedback counts; `None` if it does not fit in a `u64`.
    pub fn total(&self) -> Option<u64> {
        self.positive
            .checked_add(self.neutral)?
            .checked_add(self.negative)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextSteps {
    pub items: Vec<NextStepItem>,
    /// Backend computed; never re-derived from `items`.
    pub completion_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextStepItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: NextStepStatus,
    pub action_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NextStepStatus {
    Pending,
    Completed,
}

/// One entry of the candidates listing. Only `created_at` matters to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePage {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<CandidateRecord>,
}

const SECTIONS: [&str; 4] = [
    "key_metrics",
    "finance_metrics",
    "practice_metrics",
    "next_steps",
];

impl ApiDashboardResponse {
    /// Decodes a raw payload section by section so a failure names the section at fault,
    /// then validates the decoded values.
    pub fn from_value(raw: &Value) -> Result<Self, DashboardError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| DashboardError::malformed("payload", "expected a JSON object"))?;

        for section in SECTIONS {
            if !obj.contains_key(section) {
                return Err(DashboardError::malformed(section, "section is missing"));
            }
        }

        let parsed = Self {
            key_metrics: decode_section("key_metrics", &obj["key_metrics"])?,
            finance_metrics: decode_section("finance_metrics", &obj["finance_metrics"])?,
            practice_metrics: decode_section("practice_metrics", &obj["practice_metrics"])?,
            next_steps: decode_section("next_steps", &obj["next_steps"])?,
        };
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<(), DashboardError> {
        let key = &self.key_metrics;
        check_percentage(
            "key_metrics",
            "average_candidate_score",
            key.average_candidate_score,
        )?;
        require(
            key.completed_sessions.this_month <= key.completed_sessions.all_time,
            "key_metrics",
            || {
                format!(
                    "completed_sessions.this_month ({}) exceeds all_time ({})",
                    key.completed_sessions.this_month, key.completed_sessions.all_time
                )
            },
        )?;

        let revenue = &self.finance_metrics.revenue_and_payouts;
        for (name, amount) in [
            ("total_revenue_generated", revenue.total_revenue_generated),
            ("total_payouts", revenue.total_payouts),
            ("pending_payout", revenue.pending_payout),
        ] {
            require(amount.is_finite() && amount >= 0.0, "finance_metrics", || {
                format!("{name} must be a non-negative amount (got {amount})")
            })?;
        }
        require(
            revenue.currency.len() == 3 && revenue.currency.chars().all(|c| c.is_ascii_uppercase()),
            "finance_metrics",
            || format!("currency must be an ISO 4217 code (got {:?})", revenue.currency),
        )?;
        check_percentage(
            "finance_metrics",
            "utilization_rate",
            self.finance_metrics.practice_sessions.utilization_rate,
        )?;

        let taken = &self.practice_metrics.practice_sessions_taken;
        require(
            taken.this_month <= taken.total && taken.this_week <= taken.total,
            "practice_metrics",
            || {
                format!(
                    "practice_sessions_taken sub-counts exceed total (total={}, this_month={}, this_week={})",
                    taken.total, taken.this_month, taken.this_week
                )
            },
        )?;
        let feedback = &self.practice_metrics.feedback_trends;
        require(feedback.total().is_some(), "practice_metrics", || {
            format!(
                "feedback_trends counts overflow (positive={}, neutral={}, negative={})",
                feedback.positive, feedback.neutral, feedback.negative
            )
        })?;
        let rating = feedback.average_rating;
        require(rating.is_finite() && rating >= 0.0, "practice_metrics", || {
            format!("feedback_trends.average_rating must be non-negative (got {rating})")
        })?;

        check_percentage(
            "next_steps",
            "completion_percentage",
            self.next_steps.completion_percentage,
        )?;
        let mut seen_ids = BTreeSet::<&str>::new();
        for item in &self.next_steps.items {
            require(!item.id.trim().is_empty(), "next_steps", || {
                "item id must be non-empty".to_string()
            })?;
            require(seen_ids.insert(item.id.as_str()), "next_steps", || {
                format!("duplicate item id: {}", item.id)
            })?;
        }

        Ok(())
    }
}

impl CandidatePage {
    pub fn from_value(raw: Value) -> Result<Self, DashboardError> {
        serde_json::from_value(raw).map_err(|e| DashboardError::malformed("candidates", e.to_string()))
    }
}

fn decode_section<T: DeserializeOwned>(section: &'static str, raw: &Value) -> Result<T, DashboardError> {
    T::deserialize(raw).map_err(|e| DashboardError::malformed(section, e.to_string()))
}

fn require(
    cond: bool,
    section: &'static str,
    detail: impl FnOnce() -> String,
) -> Result<(), DashboardError> {
    if cond {
        Ok(())
    } else {
        Err(DashboardError::malformed(section, detail()))
    }
}

fn check_percentage(section: &'static str, field: &str, value: f64) -> Result<(), DashboardError> {
    require((0.0..=100.0).contains(&value), section, || {
        format!("{field} must be between 0 and 100 (got {value})")
    })
}
