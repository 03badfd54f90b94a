use crate::catalog::{self, LessonItem};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::Rng;
use serde::Serialize;

/// Calendar span of the basic-theory block: the first three weeks.
pub const BASIC_THEORY_WINDOW_DAYS: i64 = 21;
/// Daily lesson density drawn for the random phases.
pub const MIN_LESSONS_PER_DAY: usize = 2;
pub const MAX_LESSONS_PER_DAY: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub subject: String,
    pub lessons: Vec<LessonItem>,
}

/// One lesson placed on one day. Carries the (subject, lessonNumber)
/// identity so the status check can match exactly instead of by substring.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedEntry {
    pub date: NaiveDate,
    pub title: String,
    pub color_tag: String,
    pub subject: String,
    pub lesson_number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AllocateError {
    /// `endDate` must be strictly after `startDate`.
    InvalidDateRange,
}

pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn monday_at_or_after(date: NaiveDate) -> NaiveDate {
    let offset = (7 - date.weekday().num_days_from_monday()) % 7;
    date + Duration::days(i64::from(offset))
}

fn entry_for(date: NaiveDate, lesson: &LessonItem) -> PlannedEntry {
    PlannedEntry {
        date,
        title: lesson.title(),
        color_tag: lesson.color_tag().to_string(),
        subject: lesson.subject.clone(),
        lesson_number: lesson.number,
    }
}

/// Distributes the selected lessons over `[start, end]` in four phases:
/// basic theory one-per-weekday in the first three weeks, field exercises
/// as whole Monday-Friday weeks, the remaining subjects pooled 2-4 per
/// weekday, and a density fill that tops every weekday up to a fresh 2-4
/// target by re-sampling from the distributable pool.
///
/// The produced set fully replaces whatever was allocated before; the
/// caller owns the clear-and-write.
pub fn allocate<R: Rng>(
    start: NaiveDate,
    end: NaiveDate,
    selections: &[Selection],
    rng: &mut R,
) -> Result<Vec<PlannedEntry>, AllocateError> {
    if end <= start {
        return Err(AllocateError::InvalidDateRange);
    }

    let find = |name: &str| selections.iter().find(|s| s.subject == name);
    let mut entries: Vec<PlannedEntry> = Vec::new();

    // Phase 1: basic theory, one lesson per weekday in the first 21 days.
    // Weekends pass without consuming a lesson.
    let theory_end = start + Duration::days(BASIC_THEORY_WINDOW_DAYS - 1);
    if let Some(sel) = find(catalog::BASIC_THEORY) {
        let mut day = start;
        let mut next = 0usize;
        while day <= theory_end && next < sel.lessons.len() {
            if is_weekday(day) {
                entries.push(entry_for(day, &sel.lessons[next]));
                next += 1;
            }
            day += Duration::days(1);
        }
    }

    // Phase 2: field exercises, one whole Monday-Friday week per exercise,
    // starting at the first Monday at or after the theory window. A week
    // reaching past `end` is clipped to the in-range days.
    let mut cursor = start + Duration::days(BASIC_THEORY_WINDOW_DAYS);
    if let Some(sel) = find(catalog::FIELD_EXERCISES) {
        for exercise in &sel.lessons {
            let monday = monday_at_or_after(cursor);
            if monday > end {
                break;
            }
            for offset in 0..5 {
                let day = monday + Duration::days(offset);
                if day <= end {
                    entries.push(entry_for(day, exercise));
                }
            }
            cursor = monday + Duration::days(7);
        }
    }

    // Phase 3: everything else, pooled in subject-then-item order and laid
    // out 2-4 per weekday after the field-exercise window until the pool
    // runs out.
    let pool: Vec<&LessonItem> = selections
        .iter()
        .filter(|s| s.subject != catalog::BASIC_THEORY && s.subject != catalog::FIELD_EXERCISES)
        .flat_map(|s| s.lessons.iter())
        .collect();
    let mut day = cursor;
    let mut next = 0usize;
    while day <= end && next < pool.len() {
        if is_weekday(day) {
            let per_day = rng
                .gen_range(MIN_LESSONS_PER_DAY..=MAX_LESSONS_PER_DAY)
                .min(pool.len() - next);
            for _ in 0..per_day {
                entries.push(entry_for(day, pool[next]));
                next += 1;
            }
        }
        day += Duration::days(1);
    }

    // Phase 4: density fill. Every weekday below a fresh 2-4 target gets
    // topped up by sampling the distributable pool with replacement, so
    // repeats of phase-3 lessons are expected. The front-loaded theory
    // block and the whole-week exercises are never re-drawn here.
    if !pool.is_empty() {
        let mut day = start;
        while day <= end {
            if is_weekday(day) {
                let existing = entries.iter().filter(|e| e.date == day).count();
                let target = rng.gen_range(MIN_LESSONS_PER_DAY..=MAX_LESSONS_PER_DAY);
                for _ in existing..target {
                    let pick = pool[rng.gen_range(0..pool.len())];
                    entries.push(entry_for(day, pick));
                }
            }
            day += Duration::days(1);
        }
    }

    Ok(entries)
}

/// How many Basisteori numbers are held to the front-loaded sequence check.
pub const SEQUENCE_CHECK_LIMIT: u32 = 10;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub missing_lessons: Vec<String>,
    pub sequence_warnings: Vec<String>,
}

/// Advisory check of an allocated calendar against the selected catalog
/// subjects: which lessons never made it onto the calendar, and whether
/// the first ten Basisteori lessons are all present. `placed` is the set
/// of (subject, lessonNumber) identities currently on the calendar.
pub fn verify(selections: &[Selection], placed: &[(String, u32)]) -> StatusReport {
    let is_placed =
        |subject: &str, number: u32| placed.iter().any(|(s, n)| s == subject && *n == number);

    let mut report = StatusReport::default();
    for sel in selections {
        for lesson in &sel.lessons {
            if !is_placed(&sel.subject, lesson.number) {
                report.missing_lessons.push(lesson.title());
            }
        }
    }

    if let Some(sel) = selections.iter().find(|s| s.subject == catalog::BASIC_THEORY) {
        let limit = SEQUENCE_CHECK_LIMIT.min(sel.lessons.len() as u32);
        for number in 1..=limit {
            if !is_placed(catalog::BASIC_THEORY, number) {
                report.sequence_warnings.push(format!(
                    "{} lesson {} is missing or out of sequence",
                    catalog::BASIC_THEORY,
                    number
                ));
            }
        }
    }

    report
}
