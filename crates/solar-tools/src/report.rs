//! Read-side summaries over the ingested collections.
//!
//! A report covers one period (day, week, month, or year) anchored at a
//! date on the plant's IST calendar. The period resolves to an inclusive
//! day range, which maps to a half-open UTC window for querying, since
//! every stored timestamp is UTC.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};

use crate::error::IngestError;
use crate::store::{DailyEnergy, PowerReading, SolarStore};
use crate::time;

/// Reporting period, anchored at a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

/// Inclusive IST day range with the UTC window that covers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    /// UTC instant at IST midnight of `first_day`.
    pub utc_start: DateTime<Utc>,
    /// UTC instant at IST midnight of the day after `last_day` (exclusive).
    pub utc_end: DateTime<Utc>,
}

/// Resolve a period to the IST day range containing `date`.
///
/// Weeks start on Monday; months and years follow the calendar.
pub fn resolve_window(period: Period, date: NaiveDate) -> ReportWindow {
    let (first_day, last_day) = match period {
        Period::Day => (date, date),
        Period::Week => {
            let week = date.week(Weekday::Mon);
            (week.first_day(), week.last_day())
        }
        Period::Month => {
            let first = first_of_month(date.year(), date.month());
            let next = if date.month() == 12 {
                first_of_month(date.year() + 1, 1)
            } else {
                first_of_month(date.year(), date.month() + 1)
            };
            (first, next - Duration::days(1))
        }
        Period::Year => (
            first_of_month(date.year(), 1),
            NaiveDate::from_ymd_opt(date.year(), 12, 31).expect("valid calendar date"),
        ),
    };

    ReportWindow {
        first_day,
        last_day,
        utc_start: time::ist_day_start(first_day),
        utc_end: time::ist_day_start(last_day + Duration::days(1)),
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("valid calendar date")
}

/// What a period's report holds.
#[derive(Debug)]
pub struct Report {
    pub window: ReportWindow,
    /// Daily totals inside the window, oldest first.
    pub days: Vec<DailyEnergy>,
    pub total_kwh: f64,
    /// Highest 5-minute power sample. Only populated for single-day
    /// reports, where the power curve is part of the picture.
    pub peak: Option<PowerReading>,
}

/// Summarize one period from the store.
pub async fn generate(
    store: &SolarStore,
    plant_id: i64,
    period: Period,
    date: NaiveDate,
) -> Result<Report, IngestError> {
    let window = resolve_window(period, date);

    let days = store
        .daily_energy_between(plant_id, window.utc_start, window.utc_end)
        .await?;
    let total_kwh = days.iter().map(|d| d.energy_kwh).sum();

    let peak = if period == Period::Day {
        let readings = store
            .power_readings_between(plant_id, window.utc_start, window.utc_end)
            .await?;
        peak_reading(&readings)
    } else {
        None
    };

    tracing::debug!(
        plant_id,
        first_day = %window.first_day,
        last_day = %window.last_day,
        days_with_data = days.len(),
        total_kwh,
        "Report generated"
    );

    Ok(Report {
        window,
        days,
        total_kwh,
        peak,
    })
}

fn peak_reading(readings: &[PowerReading]) -> Option<PowerReading> {
    readings
        .iter()
        .max_by(|a, b| a.power_w.total_cmp(&b.power_w))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_window_maps_to_ist_bounds() {
        let window = resolve_window(Period::Day, date(2024, 1, 15));
        assert_eq!(window.first_day, window.last_day);
        assert_eq!(window.utc_start.to_rfc3339(), "2024-01-14T18:30:00+00:00");
        assert_eq!(window.utc_end.to_rfc3339(), "2024-01-15T18:30:00+00:00");
    }

    #[test]
    fn test_week_window_runs_monday_to_sunday() {
        // 2024-01-17 is a Wednesday.
        let window = resolve_window(Period::Week, date(2024, 1, 17));
        assert_eq!(window.first_day, date(2024, 1, 15));
        assert_eq!(window.last_day, date(2024, 1, 21));
    }

    #[test]
    fn test_month_window_covers_leap_february() {
        let window = resolve_window(Period::Month, date(2024, 2, 10));
        assert_eq!(window.first_day, date(2024, 2, 1));
        assert_eq!(window.last_day, date(2024, 2, 29));
    }

    #[test]
    fn test_month_window_december_rolls_over_year() {
        let window = resolve_window(Period::Month, date(2023, 12, 25));
        assert_eq!(window.first_day, date(2023, 12, 1));
        assert_eq!(window.last_day, date(2023, 12, 31));
    }

    #[test]
    fn test_year_window_spans_calendar_year() {
        let window = resolve_window(Period::Year, date(2024, 6, 1));
        assert_eq!(window.first_day, date(2024, 1, 1));
        assert_eq!(window.last_day, date(2024, 12, 31));
        assert_eq!(window.utc_start.to_rfc3339(), "2023-12-31T18:30:00+00:00");
    }

    #[test]
    fn test_peak_reading_picks_highest_sample() {
        let sample = |power_w: f64| PowerReading {
            plant_id: 1,
            timestamp: Utc::now(),
            power_w,
        };

        assert!(peak_reading(&[]).is_none());
        let peak = peak_reading(&[sample(300.0), sample(1250.0), sample(900.0)]).unwrap();
        assert_eq!(peak.power_w, 1250.0);
    }
}
