
use serde_json::json;
use test_support::*;

#[test]
fn day_edits_reject_weekends_bad_types_and_inverted_times() {
    let workspace = temp_dir("akos-day-validation");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let code = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "worktime.summary",
        json!({ "personId": "sgt-a1" }),
    );
    assert_eq!(code, "no_workspace");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // 2025-08-02 is a Saturday.
    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "worktime.day.set",
        json!({
            "personId": "sgt-a1",
            "date": "2025-08-02",
            "workType": "working",
            "startTime": "08:00",
            "endTime": "16:00",
        }),
    );
    assert_eq!(code, "bad_params");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "worktime.day.set",
        json!({
            "personId": "sgt-a1",
            "date": "2025-08-04",
            "workType": "vacation",
        }),
    );
    assert_eq!(code, "bad_params");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "worktime.day.set",
        json!({
            "personId": "sgt-a1",
            "date": "2025-08-04",
            "workType": "working",
            "startTime": "16:00",
            "endTime": "08:00",
        }),
    );
    assert_eq!(code, "invalid_time_range");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "worktime.day.set",
        json!({
            "personId": "sgt-a1",
            "date": "2025-08-04",
            "workType": "working",
            "startTime": "08:00",
            "endTime": "08:00",
        }),
    );
    assert_eq!(code, "invalid_time_range");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "worktime.day.set",
        json!({ "date": "2025-08-04", "workType": "working" }),
    );
    assert_eq!(code, "bad_params");

    // None of the rejected edits stuck.
    let fetched = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "worktime.day.get",
        json!({ "personId": "sgt-a1", "date": "2025-08-04" }),
    );
    assert_eq!(fetched.get("recorded").and_then(|v| v.as_bool()), Some(false));

    // A dayOff needs no times and stores zero hours.
    let record = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "worktime.day.set",
        json!({
            "personId": "sgt-a1",
            "date": "2025-08-04",
            "workType": "dayOff",
        }),
    );
    assert_eq!(record.get("hours").and_then(|v| v.as_f64()), Some(0.0));

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "worktime.summary",
        json!({ "personId": "sgt-a1" }),
    );
    assert_eq!(summary.get("totalHours").and_then(|v| v.as_f64()), Some(1040.0));
}
