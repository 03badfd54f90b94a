use crate::ipc::error::ok;
use crate::ipc::helpers::{db_conn, required_date, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::roster;
use crate::skema;
use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use serde_json::json;

fn entries_in_span(
    conn: &Connection,
    first: NaiveDate,
    last: NaiveDate,
) -> Result<Vec<(NaiveDate, String)>, HandlerErr> {
    let mut stmt = conn
        .prepare(
            "SELECT date, title FROM calendar_entries
             WHERE date >= ? AND date <= ?
             ORDER BY date, rowid",
        )
        .map_err(HandlerErr::db)?;
    let rows = stmt
        .query_map((first.to_string(), last.to_string()), |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })
        .map_err(HandlerErr::db)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(HandlerErr::db)?;

    Ok(rows
        .into_iter()
        .filter_map(|(raw, title)| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .ok()
                .map(|d| (d, title))
        })
        .collect())
}

fn skema_week(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let start = required_date(params, "startDate")?;
    let week = params
        .get("week")
        .and_then(|v| v.as_u64())
        .filter(|w| (1..=u64::from(skema::MAX_WEEKS)).contains(w))
        .ok_or_else(|| {
            HandlerErr::bad_params(format!("week must be between 1 and {}", skema::MAX_WEEKS))
        })? as u32;

    let (first, last) = skema::week_span(start, week);
    let entries = entries_in_span(conn, first, last)?;
    let grid = skema::build_week_grid(first, &entries);

    // Each weekday column is led by that weekday's sergeant of the DEL.
    let leaders: Option<Vec<String>> = params
        .get("del")
        .and_then(|v| v.as_u64())
        .map(|del| {
            let sergeants = roster::del_sergeants(del as u32);
            grid.days
                .iter()
                .map(|d| {
                    sergeants
                        .get(d.weekday().num_days_from_monday() as usize)
                        .map(|s| s.name.clone())
                        .unwrap_or_default()
                })
                .collect()
        });

    Ok(json!({
        "week": week,
        "days": grid.days.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
        "slots": grid.slots,
        "leaders": leaders,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "skema.week" => Some(match db_conn(&state.db).and_then(|conn| skema_week(conn, &req.params)) {
            Ok(result) => ok(&req.id, result),
            Err(error) => error.response(&req.id),
        }),
        _ => None,
    }
}
