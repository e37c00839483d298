use crate::aggregate::CandidateAggregate;
use crate::domain::view::{DashboardViewModel, MonthlySeries};

/// Candidate figures that supersede the dashboard endpoint's own candidate totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFragment {
    pub total_candidates: u64,
    pub candidates_change: i64,
    pub by_month: MonthlySeries,
}

impl CandidateFragment {
    pub fn from_aggregate(aggregate: CandidateAggregate, total_candidates: u64) -> Self {
        Self {
            total_candidates,
            candidates_change: aggregate.change_percent,
            by_month: aggregate.by_month,
        }
    }

    /// Loading/error placeholder.
    pub fn empty() -> Self {
        Self {
            total_candidates: 0,
            candidates_change: 0,
            by_month: MonthlySeries::zeroed(),
        }
    }
}

/// Overlays the candidate fragment on `base`. Only candidate totals, candidate change and the
/// candidate growth series are replaced; `base` is left as it was.
pub fn merge(base: &DashboardViewModel, fragment: &CandidateFragment) -> DashboardViewModel {
    let mut out = base.clone();
    out.metrics.total_candidates = fragment.total_candidates;
    out.metrics.candidates_change = fragment.candidates_change;
    out.charts.candidates_growth = fragment.by_month.clone();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::domain::contract::tests::sample_payload;
    use crate::domain::contract::CandidateRecord;
    use crate::transform::transform_json;
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    fn fragment() -> CandidateFragment {
        let candidates: Vec<CandidateRecord> = [(2026, 4, 20), (2026, 5, 1), (2026, 3, 20)]
            .into_iter()
            .map(|(y, m, d)| CandidateRecord {
                id: None,
                full_name: None,
                email: None,
                created_at: Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap(),
            })
            .collect();
        let reference = Utc.with_ymd_and_hms(2026, 5, 15, 0, 0, 0).unwrap();
        let total = candidates.len() as u64;
        CandidateFragment::from_aggregate(aggregate(&candidates, reference), total)
    }

    /// Replaces every leaf with its JSON type and keeps one element per array, so two values
    /// compare equal exactly when they have the same structure.
    fn shape(v: &Value) -> Value {
        match v {
            Value::Null => Value::from("null"),
            Value::Bool(_) => Value::from("bool"),
            Value::Number(_) => Value::from("number"),
            Value::String(_) => Value::from("string"),
            Value::Array(items) => Value::Array(items.first().map(shape).into_iter().collect()),
            Value::Object(map) => Value::Object(
                map.iter().map(|(k, v)| (k.clone(), shape(v))).collect(),
            ),
        }
    }

    /// Like `shape`, but lets an empty array stand in for any array.
    fn same_shape(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Array(x), Value::Array(y)) if x.is_empty() || y.is_empty() => true,
            (Value::Array(x), Value::Array(y)) => same_shape(&x[0], &y[0]),
            (Value::Object(x), Value::Object(y)) => {
                x.len() == y.len()
                    && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| same_shape(v, w)))
            }
            _ => shape(a) == shape(b),
        }
    }

    #[test]
    fn overwrites_only_candidate_fields() {
        let base = transform_json(&sample_payload()).unwrap();
        let frag = fragment();
        let merged = merge(&base, &frag);

        assert_eq!(merged.metrics.total_candidates, 3);
        assert_eq!(merged.metrics.candidates_change, 100);
        assert_eq!(merged.charts.candidates_growth.values()[3], 1);
        assert_eq!(merged.charts.revenue_spend, base.charts.revenue_spend);
        assert_eq!(merged.financial, base.financial);
        assert_eq!(merged.next_steps, base.next_steps);
        assert_eq!(merged.metrics.completed_sessions, base.metrics.completed_sessions);
        // base untouched
        assert_eq!(base.metrics.total_candidates, 42);
    }

    #[test]
    fn is_idempotent() {
        let base = transform_json(&sample_payload()).unwrap();
        let frag = fragment();
        let once = merge(&base, &frag);
        assert_eq!(merge(&once, &frag), once);
    }

    #[test]
    fn merging_fallbacks_yields_the_fallback() {
        let merged = merge(&DashboardViewModel::fallback(), &CandidateFragment::empty());
        assert_eq!(merged, DashboardViewModel::fallback());
    }

    #[test]
    fn fallback_has_the_transformed_shape() {
        let fallback = serde_json::to_value(DashboardViewModel::fallback()).unwrap();
        let base = transform_json(&sample_payload()).unwrap();
        let merged = serde_json::to_value(merge(&base, &fragment())).unwrap();
        assert!(same_shape(&fallback, &merged));
        assert_eq!(shape(&fallback["charts"]), shape(&merged["charts"]));
        assert_eq!(shape(&fallback["metrics"]), shape(&merged["metrics"]));
    }
}
