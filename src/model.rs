use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// Weekday index (0 = Sunday) of the first column.
    pub fn index(self) -> u32 {
        match self {
            WeekStart::Sunday => 0,
            WeekStart::Monday => 1,
        }
    }

    pub fn labels(self) -> [&'static str; 7] {
        match self {
            WeekStart::Sunday => ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"],
            WeekStart::Monday => ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Month,
    Week(WeekStart),
}

impl Granularity {
    pub fn label(&self) -> &'static str {
        match self {
            Granularity::Month => "month",
            Granularity::Week(_) => "week",
        }
    }

    /// First day of the unit containing `date`.
    pub fn unit_start(&self, date: NaiveDate) -> NaiveDate {
        match *self {
            Granularity::Month => start_of_month(date),
            Granularity::Week(week_start) => start_of_week(date, week_start),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCell {
    pub date: NaiveDate,
    pub in_month: bool,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CalendarError {
    #[error("invalid date (use YYYY-MM-DD): {0}")]
    InvalidDate(String),
    #[error("window of {size} pages cannot hold a preload threshold of {threshold}")]
    InvalidWindow { size: usize, threshold: usize },
}

pub fn parse_date(input: &str) -> Result<NaiveDate, CalendarError> {
    let raw = input.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| CalendarError::InvalidDate(raw.into()))
}

/// 0 = Sunday ... 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn start_of_week(date: NaiveDate, week_start: WeekStart) -> NaiveDate {
    let back = (weekday_index(date) + 7 - week_start.index()) % 7;
    date - Duration::days(back as i64)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).map(|d| d.day()).unwrap_or(28)
}

/// Day `day` of the month starting at `month_start`, pulled back to the
/// month's last day when it does not exist there (Jan 31 -> Feb 28/29).
pub fn clamp_day_to_month(day: u32, month_start: NaiveDate) -> NaiveDate {
    let last = days_in_month(month_start.year(), month_start.month());
    month_start.with_day(day.clamp(1, last)).unwrap_or(month_start)
}

/// `anchor` moved by `count` months or weeks. Saturates at the ends of the
/// representable calendar instead of failing.
pub fn add_units(anchor: NaiveDate, count: i64, granularity: Granularity) -> NaiveDate {
    let moved = match granularity {
        Granularity::Month => {
            let months = Months::new(count.unsigned_abs().min(u32::MAX as u64) as u32);
            if count >= 0 {
                anchor.checked_add_months(months)
            } else {
                anchor.checked_sub_months(months)
            }
        }
        Granularity::Week(_) => Duration::try_weeks(count).and_then(|d| anchor.checked_add_signed(d)),
    };
    moved.unwrap_or(if count >= 0 { NaiveDate::MAX } else { NaiveDate::MIN })
}

/// Signed number of whole units from the unit of `anchor` to the unit of `date`.
pub fn units_between(anchor: NaiveDate, date: NaiveDate, granularity: Granularity) -> i64 {
    match granularity {
        Granularity::Month => {
            let months = |d: NaiveDate| d.year() as i64 * 12 + d.month0() as i64;
            months(date) - months(anchor)
        }
        Granularity::Week(week_start) => {
            let from = start_of_week(anchor, week_start);
            let to = start_of_week(date, week_start);
            (to - from).num_days().div_euclid(7)
        }
    }
}

/// Six full weeks starting at the week that contains the 1st.
pub fn month_matrix(month_start: NaiveDate, week_start: WeekStart) -> [MonthCell; 42] {
    let month_start = start_of_month(month_start);
    let grid_start = start_of_week(month_start, week_start);
    std::array::from_fn(|i| {
        let date = grid_start + Duration::days(i as i64);
        MonthCell {
            date,
            in_month: date.month() == month_start.month() && date.year() == month_start.year(),
        }
    })
}

pub fn week_days(week_start_date: NaiveDate) -> [NaiveDate; 7] {
    std::array::from_fn(|i| week_start_date + Duration::days(i as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_start_respects_first_column() {
        // 2024-03-15 is a Friday
        assert_eq!(start_of_week(date(2024, 3, 15), WeekStart::Sunday), date(2024, 3, 10));
        assert_eq!(start_of_week(date(2024, 3, 15), WeekStart::Monday), date(2024, 3, 11));
        assert_eq!(start_of_week(date(2024, 3, 10), WeekStart::Monday), date(2024, 3, 4));
        assert_eq!(weekday_index(date(2024, 3, 15)), 5);
    }

    #[test]
    fn clamps_day_to_shorter_months() {
        assert_eq!(clamp_day_to_month(31, date(2024, 2, 1)), date(2024, 2, 29));
        assert_eq!(clamp_day_to_month(31, date(2023, 2, 1)), date(2023, 2, 28));
        assert_eq!(clamp_day_to_month(31, date(2024, 4, 1)), date(2024, 4, 30));
        assert_eq!(clamp_day_to_month(15, date(2024, 4, 1)), date(2024, 4, 15));
    }

    #[test]
    fn adds_and_counts_units() {
        let anchor = date(2024, 1, 1);
        assert_eq!(add_units(anchor, 14, Granularity::Month), date(2025, 3, 1));
        assert_eq!(add_units(anchor, -1, Granularity::Month), date(2023, 12, 1));
        assert_eq!(units_between(anchor, date(2025, 3, 20), Granularity::Month), 14);
        assert_eq!(units_between(anchor, date(2023, 12, 31), Granularity::Month), -1);

        let week = Granularity::Week(WeekStart::Sunday);
        let anchor = date(2024, 3, 10);
        assert_eq!(add_units(anchor, 2, week), date(2024, 3, 24));
        assert_eq!(units_between(anchor, date(2024, 3, 29), week), 2);
        assert_eq!(units_between(anchor, date(2024, 3, 9), week), -1);
    }

    #[test]
    fn month_matrix_covers_six_weeks() {
        let cells = month_matrix(date(2024, 3, 1), WeekStart::Sunday);
        assert_eq!(cells.len(), 42);
        assert_eq!(cells[0].date, date(2024, 2, 25));
        assert!(!cells[0].in_month);
        assert!(cells[5].in_month);
        assert_eq!(cells.iter().filter(|c| c.in_month).count(), 31);

        let monday = month_matrix(date(2024, 3, 1), WeekStart::Monday);
        assert_eq!(monday[0].date, date(2024, 2, 26));
        assert_eq!(monday[41].date, date(2024, 4, 7));
    }

    #[test]
    fn week_days_run_seven_days() {
        let days = week_days(date(2024, 3, 10));
        assert_eq!(days[0], date(2024, 3, 10));
        assert_eq!(days[6], date(2024, 3, 16));
    }

    #[test]
    fn rejects_malformed_dates() {
        assert_eq!(parse_date(" 2024-02-29 "), Ok(date(2024, 2, 29)));
        assert!(matches!(parse_date("2023-02-29"), Err(CalendarError::InvalidDate(_))));
        assert!(parse_date("29.02.2024").is_err());
    }
}
