use chrono::{Datelike, Days, NaiveDate};

use crate::errors::CoreError;
use crate::models::period::Period;
use crate::models::window::DateWindow;

/// Maps a period and an offset to the calendar window the charts show.
///
/// Pure: the result depends only on `(period, offset, today)`. Offset 0 is
/// the current period, +1 the one before it, −1 the one after it. Any
/// offset is accepted; windows past the available data are still valid
/// and simply aggregate to empty series.
pub struct WindowService;

impl WindowService {
    pub fn new() -> Self {
        Self
    }

    /// The local calendar day, for callers that don't inject their own.
    pub fn today() -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    /// Compute the nominal window for `period`, `offset` periods back from `today`.
    ///
    /// - `1week`: the Sunday–Saturday week containing `today − 7·offset` days
    /// - `1month`: the calendar month `offset` months back
    /// - `6months`: six calendar months ending `6·offset` months back
    /// - `1year`: twelve calendar months ending `12·offset` months back
    pub fn compute_window(
        &self,
        period: Period,
        offset: i32,
        today: NaiveDate,
    ) -> Result<DateWindow, CoreError> {
        let window = match period.months() {
            None => Self::week_window(offset, today)?,
            Some(months) => Self::month_window(months, offset, today)?,
        };
        debug_assert!(window.start_date <= window.end_date);
        Ok(window)
    }

    fn week_window(offset: i32, today: NaiveDate) -> Result<DateWindow, CoreError> {
        let anchor = shift_days(today, -7 * i64::from(offset)).ok_or_else(|| {
            CoreError::WindowOutOfRange(format!("1week window at offset {offset}"))
        })?;
        let since_sunday = i64::from(anchor.weekday().num_days_from_sunday());
        let start = shift_days(anchor, -since_sunday);
        let end = start.and_then(|s| shift_days(s, 6));
        match (start, end) {
            (Some(start), Some(end)) => DateWindow::new(start, end),
            _ => Err(CoreError::WindowOutOfRange(format!(
                "1week window at offset {offset}"
            ))),
        }
    }

    fn month_window(months: u32, offset: i32, today: NaiveDate) -> Result<DateWindow, CoreError> {
        let months = i64::from(months);
        let current = month_index(today);
        let last = current - months * i64::from(offset);
        let first = last - (months - 1);

        let start = first_of_month(first);
        // Last day of the final month = the day before the next month starts.
        let end = first_of_month(last + 1).and_then(|d| d.pred_opt());

        match (start, end) {
            (Some(start), Some(end)) => DateWindow::new(start, end),
            _ => Err(CoreError::WindowOutOfRange(format!(
                "{months}-month window at offset {offset}"
            ))),
        }
    }
}

impl Default for WindowService {
    fn default() -> Self {
        Self::new()
    }
}

/// Months since year 0, so month arithmetic is plain integer arithmetic.
pub(crate) fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

/// First day of the month at `index` (see [`month_index`]).
pub(crate) fn first_of_month(index: i64) -> Option<NaiveDate> {
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}
