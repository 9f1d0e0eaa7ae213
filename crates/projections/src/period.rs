//! Calendar reporting windows.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;

/// Reporting period for statistics.
///
/// Boundaries fall on local midnights in the time zone of the `now` passed
/// in; weeks start on Sunday. Every window except `Yesterday` is open-ended,
/// so orders dated after `now` are still counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeFilter {
    #[default]
    All,
    Today,
    Yesterday,
    ThisWeek,
    ThisMonth,
}

impl TimeFilter {
    /// Returns the `[start, end)` bounds of the window, in UTC.
    ///
    /// `None` on either side means unbounded.
    pub fn bounds<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
    ) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let tz = now.timezone();
        let today = now.date_naive();

        match self {
            TimeFilter::All => (None, None),
            TimeFilter::Today => (Some(start_of_day(&tz, today)), None),
            TimeFilter::Yesterday => {
                let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
                (
                    Some(start_of_day(&tz, yesterday)),
                    Some(start_of_day(&tz, today)),
                )
            }
            TimeFilter::ThisWeek => {
                let back = u64::from(today.weekday().num_days_from_sunday());
                let sunday = today.checked_sub_days(Days::new(back)).unwrap_or(today);
                (Some(start_of_day(&tz, sunday)), None)
            }
            TimeFilter::ThisMonth => {
                let first = today.with_day(1).unwrap_or(today);
                (Some(start_of_day(&tz, first)), None)
            }
        }
    }

    /// Returns true if `date` falls inside the window.
    pub fn contains<Tz: TimeZone>(&self, date: DateTime<Utc>, now: &DateTime<Tz>) -> bool {
        let (start, end) = self.bounds(now);
        start.is_none_or(|s| date >= s) && end.is_none_or(|e| date < e)
    }

    /// Returns the period name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::All => "all",
            TimeFilter::Today => "today",
            TimeFilter::Yesterday => "yesterday",
            TimeFilter::ThisWeek => "thisWeek",
            TimeFilter::ThisMonth => "thisMonth",
        }
    }
}

impl std::fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TimeFilter {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-'))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "" | "all" => Ok(TimeFilter::All),
            "today" => Ok(TimeFilter::Today),
            "yesterday" => Ok(TimeFilter::Yesterday),
            "thisweek" | "week" => Ok(TimeFilter::ThisWeek),
            "thismonth" | "month" => Ok(TimeFilter::ThisMonth),
            _ => Err(ProjectionError::UnknownPeriod(s.to_string())),
        }
    }
}

/// Local midnight of `date`, in UTC.
///
/// If midnight falls in a DST gap the date is read as UTC midnight instead.
fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}
