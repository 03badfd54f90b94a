use crate::allocate::is_weekday;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid literal date"),
    }
}

/// Fixed reporting window the hour accounting runs over.
pub const REPORT_START: NaiveDate = ymd(2025, 8, 1);
pub const REPORT_END: NaiveDate = ymd(2026, 1, 31);
pub const REPORT_WEEKS: f64 = 26.0;
/// Contractual norm: 37 hours per week over the window.
pub const EXPECTED_HOURS: f64 = REPORT_WEEKS * 37.0;
/// Assumed hours for a weekday with no record.
pub const DEFAULT_DAY_HOURS: f64 = 8.0;
/// One compensatory day pays down this many overtime hours.
pub const COMP_DAY_HOURS: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkType {
    Working,
    DayOff,
    Afspadsering,
}

impl WorkType {
    pub fn parse(s: &str) -> Option<WorkType> {
        match s {
            "working" => Some(WorkType::Working),
            "dayOff" => Some(WorkType::DayOff),
            "afspadsering" => Some(WorkType::Afspadsering),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkType::Working => "working",
            WorkType::DayOff => "dayOff",
            WorkType::Afspadsering => "afspadsering",
        }
    }
}

/// A recorded deviation from the default working day. Absent weekday =
/// working 8h; weekends are never counted regardless of records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayRecord {
    pub work_type: WorkType,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_hours: f64,
    pub expected_hours: f64,
    pub overtime_hours: f64,
    pub avg_hours_per_week: f64,
    pub afspadsering_days: u32,
    pub suggested_afspadsering_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRangeError {
    /// `end` must be strictly after `start`.
    EndNotAfterStart,
}

/// Hours between two clock times on the same day, minute precision.
pub fn worked_hours(start: NaiveTime, end: NaiveTime) -> Result<f64, TimeRangeError> {
    if end <= start {
        return Err(TimeRangeError::EndNotAfterStart);
    }
    let minutes = (end - start).num_minutes();
    Ok(minutes as f64 / 60.0)
}

/// Accumulates a person's hours over the reporting window. Afspadsering
/// days contribute nothing and are tallied separately; every other
/// weekday contributes its recorded hours, or the 8h default when no
/// record exists.
pub fn summarize(records: &BTreeMap<NaiveDate, DayRecord>) -> Summary {
    let mut total_hours = 0.0;
    let mut afspadsering_days = 0u32;

    let mut day = REPORT_START;
    while day <= REPORT_END {
        if is_weekday(day) {
            match records.get(&day) {
                Some(rec) if rec.work_type == WorkType::Afspadsering => {
                    afspadsering_days += 1;
                }
                Some(rec) => total_hours += rec.hours,
                None => total_hours += DEFAULT_DAY_HOURS,
            }
        }
        day += Duration::days(1);
    }

    let overtime_hours = (total_hours - EXPECTED_HOURS).max(0.0);
    Summary {
        total_hours,
        expected_hours: EXPECTED_HOURS,
        overtime_hours,
        avg_hours_per_week: total_hours / REPORT_WEEKS,
        afspadsering_days,
        suggested_afspadsering_days: (overtime_hours / COMP_DAY_HOURS).ceil() as u32,
    }
}

fn free_weekdays(records: &BTreeMap<NaiveDate, DayRecord>) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = REPORT_START;
    while day <= REPORT_END {
        if is_weekday(day) && !records.contains_key(&day) {
            days.push(day);
        }
        day += Duration::days(1);
    }
    days
}

/// Places `day_count` compensatory days on free weekdays (free = no day
/// record) in the reporting window:
///
/// A. Mondays and Fridays first, up to 40% of the requested count, to
///    produce long weekends.
/// B. If five or more days remain, whole free Monday-Friday weeks.
/// C. Free weekdays in date order, avoiding dates adjacent to an already
///    planned day while there are still enough candidates to be choosy.
/// D. Any remaining free weekday.
///
/// A shorter-than-requested plan is a valid result when the window runs
/// out of free days.
pub fn plan_afspadsering(
    records: &BTreeMap<NaiveDate, DayRecord>,
    day_count: u32,
) -> Vec<NaiveDate> {
    let day_count = day_count as usize;
    let free = free_weekdays(records);
    let mut planned: BTreeSet<NaiveDate> = BTreeSet::new();

    // Phase A: long weekends.
    let phase_a_cap = ((day_count as f64) * 0.4).ceil() as usize;
    for &day in &free {
        if planned.len() >= phase_a_cap.min(day_count) {
            break;
        }
        if matches!(day.weekday(), Weekday::Mon | Weekday::Fri) {
            planned.insert(day);
        }
    }

    // Phase B: whole free weeks.
    let mut remaining = day_count.saturating_sub(planned.len());
    if remaining >= 5 {
        let mut weeks_wanted = remaining / 5;
        let free_set: BTreeSet<NaiveDate> = free.iter().copied().collect();
        let mut monday = crate::allocate::monday_at_or_after(REPORT_START);
        while weeks_wanted > 0 && monday + Duration::days(4) <= REPORT_END {
            let week: Vec<NaiveDate> = (0..5).map(|i| monday + Duration::days(i)).collect();
            let usable = week
                .iter()
                .all(|d| free_set.contains(d) && !planned.contains(d));
            if usable {
                planned.extend(week);
                weeks_wanted -= 1;
            }
            monday += Duration::days(7);
        }
    }

    // Phase C: spread out, avoiding back-to-back placements.
    let candidates: Vec<NaiveDate> = free
        .iter()
        .copied()
        .filter(|d| !planned.contains(d))
        .collect();
    let mut needed = day_count.saturating_sub(planned.len());
    for (i, &day) in candidates.iter().enumerate() {
        if needed == 0 {
            break;
        }
        let must_take = candidates.len() - i <= needed;
        let adjacent = planned.contains(&(day - Duration::days(1)))
            || planned.contains(&(day + Duration::days(1)));
        if adjacent && !must_take {
            continue;
        }
        planned.insert(day);
        needed -= 1;
    }

    // Phase D: whatever is left, anywhere free.
    if needed > 0 {
        for &day in &candidates {
            if needed == 0 {
                break;
            }
            if planned.insert(day) {
                needed -= 1;
            }
        }
    }

    planned.into_iter().collect()
}
