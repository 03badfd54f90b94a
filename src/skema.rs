use crate::allocate::is_weekday;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

/// The fixed daily grid. The opening five minutes are reserved for the
/// morning muster ("BM appel") on Mondays.
pub const TIME_SLOTS: [&str; 16] = [
    "0800-0805",
    "0805-0900",
    "0900-0930",
    "0930-1000",
    "1000-1030",
    "1030-1100",
    "1100-1130",
    "1130-1200",
    "1200-1230",
    "1230-1300",
    "1300-1330",
    "1330-1400",
    "1400-1430",
    "1430-1500",
    "1500-1530",
    "1530-1600",
];

pub const MUSTER_TITLE: &str = "BM appel";

/// Upper bound on the 1-based week index. Keeps `week_span` well inside
/// the representable date range; anything larger is a caller error.
pub const MAX_WEEKS: u32 = 260;

/// 7-day span of the 1-based `week` counted from `start`.
pub fn week_span(start: NaiveDate, week: u32) -> (NaiveDate, NaiveDate) {
    let first = start + Duration::days(i64::from(week - 1) * 7);
    (first, first + Duration::days(6))
}

/// Drops the `[IMPORT] ` marker and the leading `Subject: ` prefix so the
/// grid shows only the lesson label.
pub fn display_title(title: &str) -> String {
    let title = title.strip_prefix("[IMPORT] ").unwrap_or(title);
    match title.split_once(": ") {
        Some((_, rest)) => rest.to_string(),
        None => title.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRow {
    pub time: String,
    /// One cell per weekday column, in the order of `WeekGrid::days`.
    pub cells: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekGrid {
    /// The five weekday dates of the span, ascending.
    pub days: Vec<NaiveDate>,
    pub slots: Vec<SlotRow>,
}

/// Lays the entries of one 7-day span into the 16-slot grid. A span
/// always contains exactly five weekdays; each becomes a column and its
/// entries fill slots top-down from 0805 in the given order. Slot 0 stays
/// reserved, showing the muster on the Monday column.
pub fn build_week_grid(span_start: NaiveDate, entries: &[(NaiveDate, String)]) -> WeekGrid {
    let span_end = span_start + Duration::days(6);
    let days: Vec<NaiveDate> = (0..7)
        .map(|i| span_start + Duration::days(i))
        .filter(|d| is_weekday(*d))
        .collect();

    let mut slots: Vec<SlotRow> = TIME_SLOTS
        .iter()
        .map(|time| SlotRow {
            time: (*time).to_string(),
            cells: vec![None; days.len()],
        })
        .collect();

    for (col, day) in days.iter().enumerate() {
        if day.weekday() == Weekday::Mon {
            slots[0].cells[col] = Some(MUSTER_TITLE.to_string());
        }
        let mut row = 1usize;
        for (date, title) in entries {
            if date != day {
                continue;
            }
            if row >= slots.len() {
                break;
            }
            slots[row].cells[col] = Some(display_title(title));
            row += 1;
        }
    }

    debug_assert!(days.iter().all(|d| *d <= span_end));
    WeekGrid { days, slots }
}
