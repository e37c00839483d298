//! Maps a backend dashboard payload onto the presentation view model.

use crate::domain::contract::{ApiDashboardResponse, NextStepItem, NextStepStatus};
use crate::domain::view::{
    ChartsView, DashboardViewModel, FinancialView, KeyMetricsView, MonthlySeries,
    NextStepView, PracticeSessionsView, RevenueSpendSeries,
};
use crate::error::DashboardError;
use serde_json::Value;

/// Source of the twelve-month revenue/spend history.
///
/// The current backend does not expose that history, so the only implementation is
/// [`ZeroFilled`]. A real source plugs in here without touching the rest of the mapping.
pub trait RevenueSpendSource {
    fn revenue_spend(&self, payload: &ApiDashboardResponse) -> RevenueSpendSeries;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroFilled;

impl RevenueSpendSource for ZeroFilled {
    fn revenue_spend(&self, _payload: &ApiDashboardResponse) -> RevenueSpendSeries {
        RevenueSpendSeries::zeroed()
    }
}

pub fn transform(payload: &ApiDashboardResponse) -> Result<DashboardViewModel, DashboardError> {
    transform_with(payload, &ZeroFilled)
}

/// Decodes and validates a raw payload, then transforms it.
pub fn transform_json(raw: &Value) -> Result<DashboardViewModel, DashboardError> {
    let payload = ApiDashboardResponse::from_value(raw)?;
    transform(&payload)
}

pub fn transform_with(
    payload: &ApiDashboardResponse,
    history: &dyn RevenueSpendSource,
) -> Result<DashboardViewModel, DashboardError> {
    payload.validate()?;

    let key = &payload.key_metrics;
    let revenue = &payload.finance_metrics.revenue_and_payouts;
    let purchased = &payload.finance_metrics.practice_sessions;
    let taken = &payload.practice_metrics.practice_sessions_taken;
    let feedback = &payload.practice_metrics.feedback_trends;
    let total_feedback = feedback.total().ok_or_else(|| {
        DashboardError::malformed("practice_metrics", "feedback_trends counts overflow")
    })?;

    // Trend fields need a previous snapshot, which the payload does not carry.
    Ok(DashboardViewModel {
        metrics: KeyMetricsView {
            total_candidates: key.total_candidates_enrolled,
            candidates_change: 0,
            completed_sessions: key.completed_sessions.all_time,
            sessions_change: 0,
            average_score: key.average_candidate_score,
            score_change: 0,
            performance_label: key.average_performance.clone(),
        },
        financial: FinancialView {
            total_revenue: revenue.total_revenue_generated,
            revenue_change: 0,
            pending_payments: revenue.pending_payout,
            total_payouts: revenue.total_payouts,
            average_session_cost: average_session_cost(
                revenue.total_revenue_generated,
                purchased.utilized,
            ),
            currency: revenue.currency.clone(),
            sessions_purchased: purchased.purchased,
            sessions_utilized: purchased.utilized,
            utilization_rate: purchased.utilization_rate,
        },
        practice_sessions: PracticeSessionsView {
            total_sessions: taken.total,
            this_month: taken.this_month,
            this_week: taken.this_week,
            total_feedback,
            response_rate: response_rate(total_feedback, taken.total),
            average_rating: feedback.average_rating,
            popular_exam_types: payload.practice_metrics.popular_exam_types.clone(),
        },
        charts: ChartsView {
            revenue_spend: history.revenue_spend(payload),
            candidates_growth: MonthlySeries::zeroed(),
        },
        next_steps: payload.next_steps.items.iter().map(next_step_view).collect(),
        next_steps_completion: payload.next_steps.completion_percentage,
    })
}

/// `round(total_revenue / utilized)`, or 0 when nothing was utilized. Rounds half away from zero.
pub fn average_session_cost(total_revenue: f64, utilized_sessions: u64) -> i64 {
    if utilized_sessions == 0 {
        return 0;
    }
    (total_revenue / utilized_sessions as f64).round() as i64
}

/// `round(100 * total_feedback / total_sessions)`, or 0 without sessions. Rounds half away from zero.
pub fn response_rate(total_feedback: u64, total_sessions: u64) -> i64 {
    if total_sessions == 0 {
        return 0;
    }
    (100.0 * total_feedback as f64 / total_sessions as f64).round() as i64
}

fn next_step_view(item: &NextStepItem) -> NextStepView {
    NextStepView {
        id: item.id.clone(),
        title: item.title.clone(),
        description: item.description.clone(),
        completed: item.status == NextStepStatus::Completed,
        link: item.action_url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::tests::sample_payload;
    use crate::domain::view::MONTH_LABELS;
    use serde_json::json;

    #[test]
    fn zero_division_guards() {
        assert_eq!(average_session_cost(0.0, 0), 0);
        assert_eq!(average_session_cost(100.0, 4), 25);
        assert_eq!(response_rate(0, 0), 0);
        assert_eq!(response_rate(10, 20), 50);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(average_session_cost(5.0, 2), 3);
        assert_eq!(average_session_cost(7.0, 3), 2);
        assert_eq!(response_rate(1, 8), 13); // 12.5
        assert_eq!(response_rate(1, 3), 33);
    }

    #[test]
    fn derives_cost_feedback_and_response_rate() {
        let vm = transform_json(&sample_payload()).unwrap();
        assert_eq!(vm.financial.average_session_cost, 1770);
        assert_eq!(vm.practice_sessions.total_feedback, 16);
        assert_eq!(vm.practice_sessions.response_rate, 80);
        assert_eq!(vm.financial.currency, "NGN");
        assert_eq!(vm.metrics.total_candidates, 42);
        assert_eq!(vm.metrics.completed_sessions, 120);
    }

    #[test]
    fn trend_fields_are_always_zero() {
        let vm = transform_json(&sample_payload()).unwrap();
        assert_eq!(vm.metrics.candidates_change, 0);
        assert_eq!(vm.metrics.sessions_change, 0);
        assert_eq!(vm.metrics.score_change, 0);
        assert_eq!(vm.financial.revenue_change, 0);
    }

    #[test]
    fn maps_next_steps_in_order() {
        let vm = transform_json(&sample_payload()).unwrap();
        let ids: Vec<&str> = vm.next_steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["profile", "invite"]);
        assert!(vm.next_steps[0].completed);
        assert!(!vm.next_steps[1].completed);
        assert_eq!(vm.next_steps[1].link, "/candidates/invite");
        assert_eq!(vm.next_steps_completion, 50.0);
    }

    #[test]
    fn next_step_count_tracks_input() {
        for n in [0usize, 1, 5] {
            let mut raw = sample_payload();
            let items: Vec<_> = (0..n)
                .map(|i| {
                    json!({
                        "id": format!("step-{i}"),
                        "title": "t",
                        "description": "d",
                        "status": if i % 2 == 0 { "pending" } else { "completed" },
                        "action_url": "/x"
                    })
                })
                .collect();
            raw["next_steps"]["items"] = json!(items);
            let vm = transform_json(&raw).unwrap();
            assert_eq!(vm.next_steps.len(), n);
        }
    }

    #[test]
    fn charts_are_zero_filled() {
        let vm = transform_json(&sample_payload()).unwrap();
        for series in [
            &vm.charts.revenue_spend.revenue,
            &vm.charts.revenue_spend.spend,
            &vm.charts.candidates_growth,
        ] {
            assert_eq!(series.values(), [0; 12]);
            assert_eq!(series.points()[0].month, MONTH_LABELS[0]);
        }
    }

    #[test]
    fn revenue_history_source_is_pluggable() {
        struct Flat(i64);
        impl RevenueSpendSource for Flat {
            fn revenue_spend(&self, _payload: &ApiDashboardResponse) -> RevenueSpendSeries {
                RevenueSpendSeries {
                    revenue: MonthlySeries::from_values([self.0; 12]),
                    spend: MonthlySeries::zeroed(),
                }
            }
        }

        let payload = ApiDashboardResponse::from_value(&sample_payload()).unwrap();
        let vm = transform_with(&payload, &Flat(7)).unwrap();
        assert_eq!(vm.charts.revenue_spend.revenue.values(), [7; 12]);
    }

    #[test]
    fn is_deterministic() {
        let raw = sample_payload();
        assert_eq!(transform_json(&raw).unwrap(), transform_json(&raw).unwrap());
    }

    #[test]
    fn refuses_malformed_payload() {
        let mut raw = sample_payload();
        raw["practice_metrics"]["feedback_trends"]
            .as_object_mut()
            .unwrap()
            .remove("negative");
        let err = transform_json(&raw).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn overflowing_feedback_is_malformed_not_wrapped() {
        let mut payload = ApiDashboardResponse::from_value(&sample_payload()).unwrap();
        payload.practice_metrics.feedback_trends.positive = u64::MAX;
        let err = transform(&payload).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn validates_typed_payloads_too() {
        let mut payload = ApiDashboardResponse::from_value(&sample_payload()).unwrap();
        payload.key_metrics.average_candidate_score = 120.0;
        assert!(transform(&payload).is_err());
    }
}
