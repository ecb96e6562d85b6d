use chrono::{Datelike, NaiveDate};

use crate::models::period::{Granularity, Period};
use crate::models::window::DateWindow;

/// Turns dates into display text. Locale lives here, outside the core.
pub trait DateLabelFormatter {
    /// A single day, e.g. "Jan 3" or "Jan 3, 2024".
    fn day(&self, date: NaiveDate, with_year: bool) -> String;

    /// A whole month, always with its year, e.g. "Apr 2024".
    fn month(&self, date: NaiveDate) -> String;

    /// Join two labels into a range.
    fn range(&self, start: &str, end: &str) -> String;
}

/// English short-month labels: "Jan 3", "Jan 3, 2024", "Apr 2024".
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishLabels;

impl DateLabelFormatter for EnglishLabels {
    fn day(&self, date: NaiveDate, with_year: bool) -> String {
        if with_year {
            date.format("%b %-d, %Y").to_string()
        } else {
            date.format("%b %-d").to_string()
        }
    }

    fn month(&self, date: NaiveDate) -> String {
        date.format("%b %Y").to_string()
    }

    fn range(&self, start: &str, end: &str) -> String {
        format!("{start} – {end}")
    }
}

/// Derives the human-facing label for the window on screen.
///
/// Only the choice of what to show is decided here: day-level labels for
/// week/month periods, month-level labels for 6-month/year periods, years
/// only where they disambiguate. Wording comes from the formatter.
pub struct TitleService;

impl TitleService {
    pub fn new() -> Self {
        Self
    }

    /// Label for `window` viewed under `period`.
    ///
    /// Returns `None` when no meaningful range applies: a window touching
    /// the edges of the representable calendar, which is what an
    /// out-of-bounds [`ZoomGesture`](crate::models::sync::ZoomGesture)
    /// collapses to before any other clamping. Windows coming from the
    /// coordinator are already inside its gesture bounds and always get a
    /// title.
    pub fn format_title(
        &self,
        period: Period,
        window: &DateWindow,
        labels: &dyn DateLabelFormatter,
    ) -> Option<String> {
        if window.start_date == NaiveDate::MIN || window.end_date == NaiveDate::MAX {
            return None;
        }

        let (start, end) = (window.start_date, window.end_date);
        let title = match period.granularity() {
            Granularity::Day => {
                if start == end {
                    labels.day(start, true)
                } else {
                    let with_year = start.year() != end.year();
                    labels.range(&labels.day(start, with_year), &labels.day(end, with_year))
                }
            }
            Granularity::Month => {
                if (start.year(), start.month()) == (end.year(), end.month()) {
                    labels.month(start)
                } else {
                    labels.range(&labels.month(start), &labels.month(end))
                }
            }
        };
        Some(title)
    }
}

impl Default for TitleService {
    fn default() -> Self {
        Self::new()
    }
}
