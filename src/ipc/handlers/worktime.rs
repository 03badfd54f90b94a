use crate::allocate::is_weekday;
use crate::ipc::error::ok;
use crate::ipc::helpers::{db_conn, get_required_str, parse_time, required_date, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::roster;
use crate::worktime::{self, DayRecord, WorkType, DEFAULT_DAY_HOURS};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;

fn load_records(
    conn: &Connection,
    person_id: &str,
) -> Result<BTreeMap<NaiveDate, DayRecord>, HandlerErr> {
    let mut stmt = conn
        .prepare("SELECT date, work_type, hours FROM day_records WHERE person_id = ?")
        .map_err(HandlerErr::db)?;
    let rows = stmt
        .query_map([person_id], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, f64>(2)?,
            ))
        })
        .map_err(HandlerErr::db)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(HandlerErr::db)?;

    let mut records = BTreeMap::new();
    for (date_raw, type_raw, hours) in rows {
        let Ok(date) = NaiveDate::parse_from_str(&date_raw, "%Y-%m-%d") else {
            continue;
        };
        let Some(work_type) = WorkType::parse(&type_raw) else {
            continue;
        };
        records.insert(date, DayRecord { work_type, hours });
    }
    Ok(records)
}

fn worktime_summary(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let person_id = get_required_str(params, "personId")?;
    let records = load_records(conn, &person_id)?;
    let summary = worktime::summarize(&records);
    serde_json::to_value(&summary).map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))
}

fn worktime_day_set(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let person_id = get_required_str(params, "personId")?;
    let date = required_date(params, "date")?;
    if !is_weekday(date) {
        return Err(HandlerErr::bad_params("date falls on a weekend"));
    }
    let type_raw = get_required_str(params, "workType")?;
    let work_type = WorkType::parse(&type_raw)
        .ok_or_else(|| HandlerErr::bad_params(format!("unknown workType: {}", type_raw)))?;

    let (hours, start_time, end_time) = match work_type {
        WorkType::Working => {
            let start = parse_time(&get_required_str(params, "startTime")?)?;
            let end = parse_time(&get_required_str(params, "endTime")?)?;
            let hours = worktime::worked_hours(start, end).map_err(|_| {
                HandlerErr::new("invalid_time_range", "endTime must be after startTime")
            })?;
            (
                hours,
                Some(start.format("%H:%M").to_string()),
                Some(end.format("%H:%M").to_string()),
            )
        }
        WorkType::DayOff | WorkType::Afspadsering => (0.0, None, None),
    };

    conn.execute(
        "INSERT INTO day_records(person_id, date, work_type, hours, start_time, end_time)
         VALUES(?, ?, ?, ?, ?, ?)
         ON CONFLICT(person_id, date) DO UPDATE SET
             work_type = excluded.work_type,
             hours = excluded.hours,
             start_time = excluded.start_time,
             end_time = excluded.end_time",
        (
            &person_id,
            date.to_string(),
            work_type.as_str(),
            hours,
            &start_time,
            &end_time,
        ),
    )
    .map_err(HandlerErr::db)?;

    Ok(json!({
        "personId": person_id,
        "date": date.to_string(),
        "workType": work_type.as_str(),
        "hours": hours,
        "startTime": start_time,
        "endTime": end_time,
    }))
}

fn worktime_day_get(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let person_id = get_required_str(params, "personId")?;
    let date = required_date(params, "date")?;

    let row: Option<(String, f64, Option<String>, Option<String>)> = conn
        .query_row(
            "SELECT work_type, hours, start_time, end_time
             FROM day_records WHERE person_id = ? AND date = ?",
            (&person_id, date.to_string()),
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .optional()
        .map_err(HandlerErr::db)?;

    let value = match row {
        Some((work_type, hours, start_time, end_time)) => json!({
            "personId": person_id,
            "date": date.to_string(),
            "workType": work_type,
            "hours": hours,
            "startTime": start_time,
            "endTime": end_time,
            "recorded": true,
        }),
        None => json!({
            "personId": person_id,
            "date": date.to_string(),
            "workType": WorkType::Working.as_str(),
            "hours": if is_weekday(date) { DEFAULT_DAY_HOURS } else { 0.0 },
            "startTime": null,
            "endTime": null,
            "recorded": false,
        }),
    };
    Ok(value)
}

fn planned_dates(
    records: &BTreeMap<NaiveDate, DayRecord>,
    params: &serde_json::Value,
) -> Result<Vec<NaiveDate>, HandlerErr> {
    let day_count = match params.get("dayCount") {
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| HandlerErr::bad_params("dayCount out of range"))?,
        None => worktime::summarize(records).suggested_afspadsering_days,
    };
    Ok(worktime::plan_afspadsering(records, day_count))
}

fn afsp_plan(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let person_id = get_required_str(params, "personId")?;
    let records = load_records(conn, &person_id)?;
    let summary = worktime::summarize(&records);
    let dates = planned_dates(&records, params)?;
    Ok(json!({
        "personId": person_id,
        "dates": dates.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
        "dayCount": dates.len(),
        "suggestedDayCount": summary.suggested_afspadsering_days,
    }))
}

fn afsp_apply(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let person_id = get_required_str(params, "personId")?;
    let dates: Vec<NaiveDate> = match params.get("dates").and_then(|v| v.as_array()) {
        Some(arr) => {
            let mut out = Vec::with_capacity(arr.len());
            for v in arr {
                let Some(raw) = v.as_str() else {
                    return Err(HandlerErr::bad_params("dates must be strings"));
                };
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| HandlerErr::bad_params(format!("invalid date: {}", raw)))?;
                out.push(date);
            }
            out
        }
        None => planned_dates(&load_records(conn, &person_id)?, params)?,
    };

    let tx = conn.unchecked_transaction().map_err(HandlerErr::db)?;
    for date in &dates {
        tx.execute(
            "INSERT INTO day_records(person_id, date, work_type, hours, start_time, end_time)
             VALUES(?, ?, ?, 0, NULL, NULL)
             ON CONFLICT(person_id, date) DO UPDATE SET
                 work_type = excluded.work_type,
                 hours = excluded.hours,
                 start_time = NULL,
                 end_time = NULL",
            (&person_id, date.to_string(), WorkType::Afspadsering.as_str()),
        )
        .map_err(HandlerErr::db)?;
    }
    tx.commit().map_err(HandlerErr::db)?;

    Ok(json!({
        "personId": person_id,
        "appliedCount": dates.len(),
        "dates": dates.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
    }))
}

fn afsp_cancel(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let person_id = get_required_str(params, "personId")?;
    let cancelled = conn
        .execute(
            "DELETE FROM day_records WHERE person_id = ? AND work_type = ?",
            (&person_id, WorkType::Afspadsering.as_str()),
        )
        .map_err(HandlerErr::db)?;
    Ok(json!({
        "personId": person_id,
        "cancelledCount": cancelled,
    }))
}

fn roster_list() -> Result<serde_json::Value, HandlerErr> {
    let roster = roster::full_roster();
    Ok(json!({ "dels": roster }))
}

fn dispatch(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    if req.method == "roster.list" {
        return roster_list();
    }
    let conn = db_conn(&state.db)?;
    match req.method.as_str() {
        "worktime.summary" => worktime_summary(conn, &req.params),
        "worktime.day.set" => worktime_day_set(conn, &req.params),
        "worktime.day.get" => worktime_day_get(conn, &req.params),
        "afsp.plan" => afsp_plan(conn, &req.params),
        "afsp.apply" => afsp_apply(conn, &req.params),
        "afsp.cancel" => afsp_cancel(conn, &req.params),
        _ => unreachable!("routed method"),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "worktime.summary" | "worktime.day.set" | "worktime.day.get" | "afsp.plan"
        | "afsp.apply" | "afsp.cancel" | "roster.list" => Some(match dispatch(state, req) {
            Ok(result) => ok(&req.id, result),
            Err(error) => error.response(&req.id),
        }),
        _ => None,
    }
}
