//! Presentation shapes handed to dashboard widgets (camelCase, UI oriented).

use serde::{Deserialize, Serialize};

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardViewModel {
    pub metrics: KeyMetricsView,
    pub financial: FinancialView,
    pub practice_sessions: PracticeSessionsView,
    pub charts: ChartsView,
    pub next_steps: Vec<NextStepView>,
    pub next_steps_completion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMetricsView {
    pub total_candidates: u64,
    pub candidates_change: i64,
    pub completed_sessions: u64,
    pub sessions_change: i64,
    pub average_score: f64,
    pub score_change: i64,
    pub performance_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialView {
    pub total_revenue: f64,
    pub revenue_change: i64,
    pub pending_payments: f64,
    pub total_payouts: f64,
    pub average_session_cost: i64,
    pub currency: String,
    pub sessions_purchased: u64,
    pub sessions_utilized: u64,
    pub utilization_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSessionsView {
    pub total_sessions: u64,
    pub this_month: u64,
    pub this_week: u64,
    pub total_feedback: u64,
    pub response_rate: i64,
    pub average_rating: f64,
    pub popular_exam_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartsView {
    pub revenue_spend: RevenueSpendSeries,
    pub candidates_growth: MonthlySeries,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueSpendSeries {
    pub revenue: MonthlySeries,
    pub spend: MonthlySeries,
}

impl RevenueSpendSeries {
    pub fn zeroed() -> Self {
        Self {
            revenue: MonthlySeries::zeroed(),
            spend: MonthlySeries::zeroed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub month: String,
    pub value: i64,
}

/// Twelve points, Jan..Dec. The array length makes a short or long series unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlySeries(pub [ChartPoint; 12]);

impl MonthlySeries {
    pub fn from_values(values: [i64; 12]) -> Self {
        Self(std::array::from_fn(|i| ChartPoint {
            month: MONTH_LABELS[i].to_string(),
            value: values[i],
        }))
    }

    pub fn zeroed() -> Self {
        Self::from_values([0; 12])
    }

    pub fn values(&self) -> [i64; 12] {
        std::array::from_fn(|i| self.0[i].value)
    }

    pub fn points(&self) -> &[ChartPoint] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextStepView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub link: String,
}

impl DashboardViewModel {
    /// Loading/error placeholder: same shape as a transformed view model, every number zero.
    pub fn fallback() -> Self {
        Self {
            metrics: KeyMetricsView {
                total_candidates: 0,
                candidates_change: 0,
                completed_sessions: 0,
                sessions_change: 0,
                average_score: 0.0,
                score_change: 0,
                performance_label: String::new(),
            },
            financial: FinancialView {
                total_revenue: 0.0,
                revenue_change: 0,
                pending_payments: 0.0,
                total_payouts: 0.0,
                average_session_cost: 0,
                currency: String::new(),
                sessions_purchased: 0,
                sessions_utilized: 0,
                utilization_rate: 0.0,
            },
            practice_sessions: PracticeSessionsView {
                total_sessions: 0,
                this_month: 0,
                this_week: 0,
                total_feedback: 0,
                response_rate: 0,
                average_rating: 0.0,
                popular_exam_types: Vec::new(),
            },
            charts: ChartsView {
                revenue_spend: RevenueSpendSeries::zeroed(),
                candidates_growth: MonthlySeries::zeroed(),
            },
            next_steps: Vec::new(),
            next_steps_completion: 0.0,
        }
    }
}

impl Default for DashboardViewModel {
    fn default() -> Self {
        Self::fallback()
    }
}
