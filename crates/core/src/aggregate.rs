//! Monthly bucketing of candidate sign-ups and month-over-month growth.

use crate::domain::contract::CandidateRecord;
use crate::domain::view::MonthlySeries;
use crate::time::calendar::{month_index, months_before};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketMode {
    /// Bucket by calendar month only; records from different years share a bucket.
    #[default]
    MonthOfYear,
    /// Only records created in the reference date's year are bucketed.
    ReferenceYear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAggregate {
    pub by_month: MonthlySeries,
    pub this_month_count: u64,
    pub last_month_count: u64,
    pub change_percent: i64,
}

pub fn aggregate(candidates: &[CandidateRecord], reference: DateTime<Utc>) -> CandidateAggregate {
    aggregate_with(candidates, reference, BucketMode::MonthOfYear)
}

pub fn aggregate_with(
    candidates: &[CandidateRecord],
    reference: DateTime<Utc>,
    mode: BucketMode,
) -> CandidateAggregate {
    let one_month_ago = months_before(reference, 1);
    let two_months_ago = months_before(reference, 2);

    let mut buckets = [0i64; 12];
    let mut this_month_count: u64 = 0;
    let mut last_month_count: u64 = 0;

    for candidate in candidates {
        let created = candidate.created_at;

        let in_scope = match mode {
            BucketMode::MonthOfYear => true,
            BucketMode::ReferenceYear => created.year() == reference.year(),
        };
        if in_scope {
            buckets[month_index(created)] += 1;
        }

        if created >= one_month_ago {
            this_month_count += 1;
        } else if created >= two_months_ago {
            last_month_count += 1;
        }
    }

    CandidateAggregate {
        by_month: MonthlySeries::from_values(buckets),
        this_month_count,
        last_month_count,
        change_percent: change_percent(this_month_count, last_month_count),
    }
}

/// Signed month-over-month change. Growth from a zero base reads as 100, no activity as 0.
pub fn change_percent(this_month: u64, last_month: u64) -> i64 {
    if last_month > 0 {
        let delta = this_month as f64 - last_month as f64;
        (100.0 * delta / last_month as f64).round() as i64
    } else if this_month > 0 {
        100
    } else {
        0
    }
}
