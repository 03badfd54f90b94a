use crate::allocate::{self, AllocateError, Selection};
use crate::catalog::{self, Catalog};
use crate::db;
use crate::ipc::error::ok;
use crate::ipc::helpers::{db_conn, get_required_str, get_str, required_date, HandlerErr};
use crate::ipc::types::{AppState, Request};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const DEFAULT_UNIT: &str = "ENH";
pub const IMPORT_PREFIX: &str = "[IMPORT] ";
const LAST_RUN_KEY: &str = "akos.lastRun";

/// One calendar-entry row, also the snapshot payload element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    id: String,
    date: NaiveDate,
    title: String,
    color_tag: String,
    subject: Option<String>,
    lesson_number: Option<u32>,
    imported: bool,
}

fn load_entries(conn: &Connection) -> Result<Vec<StoredEntry>, HandlerErr> {
    let mut stmt = conn
        .prepare(
            "SELECT id, date, title, color_tag, subject, lesson_number, imported
             FROM calendar_entries
             ORDER BY date, rowid",
        )
        .map_err(HandlerErr::db)?;
    let rows = stmt
        .query_map([], |r| {
            let date_raw: String = r.get(1)?;
            let date = NaiveDate::parse_from_str(&date_raw, "%Y-%m-%d").map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
            })?;
            Ok(StoredEntry {
                id: r.get(0)?,
                date,
                title: r.get(2)?,
                color_tag: r.get(3)?,
                subject: r.get(4)?,
                lesson_number: r.get::<_, Option<i64>>(5)?.map(|n| n as u32),
                imported: r.get::<_, i64>(6)? != 0,
            })
        })
        .map_err(HandlerErr::db)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(HandlerErr::db)?;
    Ok(rows)
}

fn insert_entry(conn: &Connection, entry: &StoredEntry) -> Result<(), HandlerErr> {
    conn.execute(
        "INSERT INTO calendar_entries(id, date, title, color_tag, subject, lesson_number, imported)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (
            &entry.id,
            entry.date.to_string(),
            &entry.title,
            &entry.color_tag,
            &entry.subject,
            entry.lesson_number.map(|n| n as i64),
            entry.imported as i64,
        ),
    )
    .map_err(HandlerErr::db)?;
    Ok(())
}

fn catalog_path(workspace: Option<&Path>, params: &serde_json::Value) -> Result<PathBuf, HandlerErr> {
    if let Some(p) = get_str(params, "catalogPath") {
        return Ok(PathBuf::from(p));
    }
    workspace
        .map(|w| w.join("plukark.json"))
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

fn load_catalog_for(
    workspace: Option<&Path>,
    params: &serde_json::Value,
) -> Result<Catalog, HandlerErr> {
    let path = catalog_path(workspace, params)?;
    catalog::load_catalog(&path).map_err(|e| HandlerErr::new("catalog_unavailable", format!("{e:#}")))
}

fn subjects_from(params: &serde_json::Value) -> Result<Option<Vec<String>>, HandlerErr> {
    let Some(raw) = params.get("subjects") else {
        return Ok(None);
    };
    let Some(arr) = raw.as_array() else {
        return Err(HandlerErr::bad_params("subjects must be an array"));
    };
    let mut subjects = Vec::with_capacity(arr.len());
    for v in arr {
        let Some(s) = v.as_str() else {
            return Err(HandlerErr::bad_params("subjects must be strings"));
        };
        subjects.push(s.to_string());
    }
    Ok(Some(subjects))
}

fn selections_for(catalog: &Catalog, subjects: &[String]) -> Vec<Selection> {
    subjects
        .iter()
        .map(|s| Selection {
            subject: s.clone(),
            lessons: catalog::subject_lessons(catalog, s),
        })
        .collect()
}

fn rng_from(params: &serde_json::Value) -> StdRng {
    match params.get("seed").and_then(|v| v.as_u64()) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn unit_from(params: &serde_json::Value) -> String {
    get_str(params, "unit").unwrap_or_else(|| DEFAULT_UNIT.to_string())
}

/// Stores the full current entry set as one snapshot row for `unit`.
fn snapshot_current(conn: &Connection, unit: &str) -> Result<(String, usize), HandlerErr> {
    let entries = load_entries(conn)?;
    let payload = serde_json::to_string(&entries)
        .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?;
    let snapshot_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO snapshots(id, unit, created_at, entry_count, payload)
         VALUES(?, ?, ?, ?, ?)",
        (
            &snapshot_id,
            unit,
            chrono::Utc::now().to_rfc3339(),
            entries.len() as i64,
            payload,
        ),
    )
    .map_err(HandlerErr::db)?;
    Ok((snapshot_id, entries.len()))
}

fn akos_generate(
    conn: &Connection,
    workspace: Option<&Path>,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let start = required_date(params, "startDate")?;
    let end = required_date(params, "endDate")?;
    let subjects = subjects_from(params)?
        .ok_or_else(|| HandlerErr::bad_params("missing subjects"))?;
    let catalog = load_catalog_for(workspace, params)?;
    let selections = selections_for(&catalog, &subjects);
    let mut rng = rng_from(params);

    let planned = allocate::allocate(start, end, &selections, &mut rng).map_err(|e| match e {
        AllocateError::InvalidDateRange => {
            HandlerErr::new("invalid_date_range", "endDate must be after startDate")
        }
    })?;

    let unit = unit_from(params);
    let tx = conn.unchecked_transaction().map_err(HandlerErr::db)?;
    tx.execute("DELETE FROM calendar_entries", [])
        .map_err(HandlerErr::db)?;
    for p in &planned {
        insert_entry(
            &tx,
            &StoredEntry {
                id: Uuid::new_v4().to_string(),
                date: p.date,
                title: p.title.clone(),
                color_tag: p.color_tag.clone(),
                subject: Some(p.subject.clone()),
                lesson_number: Some(p.lesson_number),
                imported: false,
            },
        )?;
    }
    db::settings_set_json(
        &tx,
        LAST_RUN_KEY,
        &json!({
            "startDate": start.to_string(),
            "endDate": end.to_string(),
            "subjects": subjects,
        }),
    )
    .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?;
    let (snapshot_id, entry_count) = snapshot_current(&tx, &unit)?;
    tx.commit().map_err(HandlerErr::db)?;

    Ok(json!({
        "entryCount": entry_count,
        "snapshotId": snapshot_id,
        "unit": unit,
    }))
}

fn akos_status(
    conn: &Connection,
    workspace: Option<&Path>,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let subjects = match subjects_from(params)? {
        Some(subjects) => subjects,
        // Fall back to the subjects of the last allocation run.
        None => db::settings_get_json(conn, LAST_RUN_KEY)
            .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?
            .and_then(|v| {
                v.get("subjects").and_then(|s| {
                    s.as_array().map(|arr| {
                        arr.iter()
                            .filter_map(|x| x.as_str().map(|s| s.to_string()))
                            .collect::<Vec<_>>()
                    })
                })
            })
            .ok_or_else(|| HandlerErr::bad_params("missing subjects"))?,
    };

    let catalog = load_catalog_for(workspace, params)?;
    let selections = selections_for(&catalog, &subjects);

    let mut stmt = conn
        .prepare(
            "SELECT subject, lesson_number FROM calendar_entries
             WHERE subject IS NOT NULL AND lesson_number IS NOT NULL",
        )
        .map_err(HandlerErr::db)?;
    let placed = stmt
        .query_map([], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)? as u32))
        })
        .map_err(HandlerErr::db)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(HandlerErr::db)?;

    let report = allocate::verify(&selections, &placed);
    Ok(json!({
        "missingLessons": report.missing_lessons,
        "sequenceWarnings": report.sequence_warnings,
    }))
}

fn akos_entries_list(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    let entries = load_entries(conn)?;
    Ok(json!({ "entries": entries }))
}

fn akos_import(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let snapshot_id = get_required_str(params, "snapshotId")?;
    let payload: Option<String> = conn
        .query_row(
            "SELECT payload FROM snapshots WHERE id = ?",
            [&snapshot_id],
            |r| r.get(0),
        )
        .optional()
        .map_err(HandlerErr::db)?;
    let Some(payload) = payload else {
        return Err(HandlerErr::new(
            "snapshot_not_found",
            format!("no snapshot {}", snapshot_id),
        ));
    };
    let entries: Vec<StoredEntry> = serde_json::from_str(&payload)
        .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?;

    let unit = unit_from(params);
    let tx = conn.unchecked_transaction().map_err(HandlerErr::db)?;
    for e in &entries {
        let bare = e.title.strip_prefix(IMPORT_PREFIX).unwrap_or(&e.title);
        insert_entry(
            &tx,
            &StoredEntry {
                id: Uuid::new_v4().to_string(),
                date: e.date,
                title: format!("{}{}", IMPORT_PREFIX, bare),
                color_tag: e.color_tag.clone(),
                subject: e.subject.clone(),
                lesson_number: e.lesson_number,
                imported: true,
            },
        )?;
    }
    let (new_snapshot_id, _) = snapshot_current(&tx, &unit)?;
    tx.commit().map_err(HandlerErr::db)?;

    Ok(json!({
        "importedCount": entries.len(),
        "snapshotId": new_snapshot_id,
    }))
}

fn akos_snapshots_list(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let unit = get_str(params, "unit");
    let mut stmt = conn
        .prepare(
            "SELECT id, unit, created_at, entry_count FROM snapshots
             WHERE (?1 IS NULL OR unit = ?1)
             ORDER BY created_at DESC, rowid DESC",
        )
        .map_err(HandlerErr::db)?;
    let rows = stmt
        .query_map([&unit], |r| {
            Ok(json!({
                "id": r.get::<_, String>(0)?,
                "unit": r.get::<_, String>(1)?,
                "createdAt": r.get::<_, String>(2)?,
                "entryCount": r.get::<_, i64>(3)?,
            }))
        })
        .map_err(HandlerErr::db)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(HandlerErr::db)?;
    Ok(json!({ "snapshots": rows }))
}

fn dispatch(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let workspace = state.workspace.as_deref();
    let conn = db_conn(&state.db)?;
    match req.method.as_str() {
        "akos.generate" => akos_generate(conn, workspace, &req.params),
        "akos.status" => akos_status(conn, workspace, &req.params),
        "akos.entries.list" => akos_entries_list(conn),
        "akos.import" => akos_import(conn, &req.params),
        "akos.snapshots.list" => akos_snapshots_list(conn, &req.params),
        _ => unreachable!("routed method"),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "akos.generate" | "akos.status" | "akos.entries.list" | "akos.import"
        | "akos.snapshots.list" => Some(match dispatch(state, req) {
            Ok(result) => ok(&req.id, result),
            Err(error) => error.response(&req.id),
        }),
        _ => None,
    }
}
