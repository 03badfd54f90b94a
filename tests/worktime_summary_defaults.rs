
use serde_json::json;
use test_support::*;

#[test]
fn defaults_give_the_window_norm_and_edits_shift_it() {
    let workspace = temp_dir("akos-worktime");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // 131 weekdays at 8h against the 962h norm.
    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "worktime.summary",
        json!({ "personId": "sgt-a1" }),
    );
    assert_eq!(summary.get("totalHours").and_then(|v| v.as_f64()), Some(1048.0));
    assert_eq!(summary.get("expectedHours").and_then(|v| v.as_f64()), Some(962.0));
    assert_eq!(summary.get("overtimeHours").and_then(|v| v.as_f64()), Some(86.0));
    assert_eq!(summary.get("afspadseringDays").and_then(|v| v.as_u64()), Some(0));
    assert_eq!(
        summary
            .get("suggestedAfspadseringDays")
            .and_then(|v| v.as_u64()),
        Some(13)
    );
    let avg = summary
        .get("avgHoursPerWeek")
        .and_then(|v| v.as_f64())
        .expect("avg");
    assert!((avg - 1048.0 / 26.0).abs() < 1e-9);

    let record = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "worktime.day.set",
        json!({
            "personId": "sgt-a1",
            "date": "2025-08-04",
            "workType": "working",
            "startTime": "07:00",
            "endTime": "17:30",
        }),
    );
    assert_eq!(record.get("hours").and_then(|v| v.as_f64()), Some(10.5));

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "worktime.summary",
        json!({ "personId": "sgt-a1" }),
    );
    assert_eq!(
        summary.get("totalHours").and_then(|v| v.as_f64()),
        Some(1050.5)
    );
    assert_eq!(
        summary.get("overtimeHours").and_then(|v| v.as_f64()),
        Some(88.5)
    );

    let fetched = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "worktime.day.get",
        json!({ "personId": "sgt-a1", "date": "2025-08-04" }),
    );
    assert_eq!(fetched.get("recorded").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(fetched.get("startTime").and_then(|v| v.as_str()), Some("07:00"));
    assert_eq!(fetched.get("endTime").and_then(|v| v.as_str()), Some("17:30"));

    // Unrecorded weekdays report the default; other people are untouched.
    let fetched = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "worktime.day.get",
        json!({ "personId": "sgt-a1", "date": "2025-08-05" }),
    );
    assert_eq!(fetched.get("recorded").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(fetched.get("hours").and_then(|v| v.as_f64()), Some(8.0));

    let other = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "worktime.summary",
        json!({ "personId": "sgt-c3" }),
    );
    assert_eq!(other.get("totalHours").and_then(|v| v.as_f64()), Some(1048.0));
}
