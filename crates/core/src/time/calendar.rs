use anyhow::Context;
use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc};

/// Resolves the date the dashboard is computed "as of".
///
/// An explicit `YYYY-MM-DD` argument pins the reference to the end of that UTC day so records
/// created during it fall inside the current window; otherwise `now_utc` is used as is.
pub fn resolve_reference_date(
    reference_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<DateTime<Utc>> {
    let Some(s) = reference_arg else {
        return Ok(now_utc);
    };

    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid reference date (expected YYYY-MM-DD): {s}"))?;
    let end_of_day =
        NaiveTime::from_hms_opt(23, 59, 59).context("invalid end-of-day time")?;
    Ok(date.and_time(end_of_day).and_utc())
}

/// Steps back `n` calendar months, clamping to the last day of a shorter month
/// (Mar 31 minus one month is Feb 28/29).
pub fn months_before(at: DateTime<Utc>, n: u32) -> DateTime<Utc> {
    at.checked_sub_months(Months::new(n))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Zero-based calendar month (Jan = 0) in UTC.
pub fn month_index(at: DateTime<Utc>) -> usize {
    at.month0() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn defaults_to_now() {
        let now = Utc.with_ymd_and_hms(2026, 5, 14, 8, 30, 0).unwrap();
        assert_eq!(resolve_reference_date(None, now).unwrap(), now);
    }

    #[test]
    fn explicit_date_pins_end_of_day() {
        let now = Utc.with_ymd_and_hms(2026, 5, 14, 8, 30, 0).unwrap();
        let d = resolve_reference_date(Some("2026-02-01"), now).unwrap();
        assert_eq!(d, Utc.with_ymd_and_hms(2026, 2, 1, 23, 59, 59).unwrap());
    }

    #[test]
    fn rejects_garbage_dates() {
        let now = Utc.with_ymd_and_hms(2026, 5, 14, 8, 30, 0).unwrap();
        assert!(resolve_reference_date(Some("14/05/2026"), now).is_err());
    }

    #[test]
    fn month_subtraction_clamps_to_month_end() {
        let at = Utc.with_ymd_and_hms(2026, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(
            months_before(at, 1),
            Utc.with_ymd_and_hms(2026, 2, 28, 12, 0, 0).unwrap()
        );
        // 2024 is a leap year.
        let at = Utc.with_ymd_and_hms(2024, 4, 30, 0, 0, 0).unwrap();
        assert_eq!(
            months_before(at, 2),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn month_subtraction_crosses_year_boundary() {
        let at = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(
            months_before(at, 2),
            Utc.with_ymd_and_hms(2025, 11, 15, 0, 0, 0).unwrap()
        );
        assert_eq!(month_index(at), 0);
    }
}
