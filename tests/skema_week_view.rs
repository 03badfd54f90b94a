
use serde_json::json;
use test_support::*;

fn cells(slots: &serde_json::Value, row: usize) -> Vec<Option<String>> {
    slots
        .as_array()
        .expect("slots array")
        .get(row)
        .and_then(|r| r.get("cells"))
        .and_then(|c| c.as_array())
        .expect("cells array")
        .iter()
        .map(|v| v.as_str().map(|s| s.to_string()))
        .collect()
}

#[test]
fn week_grid_lays_lessons_into_the_slot_table() {
    let workspace = temp_dir("akos-skema");
    write_catalog(&workspace);
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "akos.generate",
        json!({
            "startDate": "2025-08-01",
            "endDate": "2025-08-25",
            "subjects": ["Basisteori"],
            "seed": 1,
        }),
    );

    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "skema.week",
        json!({ "startDate": "2025-08-01" }),
    );
    assert_eq!(code, "bad_params");

    // Out-of-range week indexes are rejected, not panicked on, and the
    // daemon keeps answering afterwards.
    for (id, week) in [
        ("3a", json!(0)),
        ("3b", json!(4_000_000_000u64)),
        ("3c", json!(4_294_967_296u64)),
    ] {
        let code = request_err(
            &mut stdin,
            &mut reader,
            id,
            "skema.week",
            json!({ "startDate": "2025-08-01", "week": week }),
        );
        assert_eq!(code, "bad_params");
    }

    let week = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "skema.week",
        json!({ "startDate": "2025-08-01", "week": 1, "del": 1 }),
    );
    assert_eq!(
        week.get("days").and_then(|v| v.as_array()).map(|a| {
            a.iter()
                .map(|d| d.as_str().unwrap_or_default())
                .collect::<Vec<_>>()
        }),
        Some(vec![
            "2025-08-01",
            "2025-08-04",
            "2025-08-05",
            "2025-08-06",
            "2025-08-07",
        ])
    );

    let slots = week.get("slots").cloned().expect("slots");
    assert_eq!(slots.as_array().map(|a| a.len()), Some(16));
    assert_eq!(
        slots
            .as_array()
            .and_then(|a| a.first())
            .and_then(|r| r.get("time"))
            .and_then(|t| t.as_str()),
        Some("0800-0805")
    );

    // Muster on the Monday column only; the subject prefix is stripped.
    assert_eq!(
        cells(&slots, 0),
        vec![
            None,
            Some("BM appel".to_string()),
            None,
            None,
            None,
        ]
    );
    assert_eq!(
        cells(&slots, 1),
        vec![
            Some("BT 1".to_string()),
            Some("BT 2".to_string()),
            Some("BT 3".to_string()),
            Some("BT 4".to_string()),
            Some("BT 5".to_string()),
        ]
    );
    assert_eq!(cells(&slots, 2), vec![None, None, None, None, None]);

    // Weekday-indexed DEL leaders: the Friday column gets the fifth.
    assert_eq!(
        week.get("leaders").and_then(|v| v.as_array()).map(|a| {
            a.iter()
                .map(|d| d.as_str().unwrap_or_default())
                .collect::<Vec<_>>()
        }),
        Some(vec!["SGT A5", "SGT A1", "SGT A2", "SGT A3", "SGT A4"])
    );

    // Week two carries the back half of the theory block.
    let week = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "skema.week",
        json!({ "startDate": "2025-08-01", "week": 2 }),
    );
    let slots = week.get("slots").cloned().expect("slots");
    assert_eq!(
        cells(&slots, 1),
        vec![
            Some("BT 6".to_string()),
            Some("BT 7".to_string()),
            Some("BT 8".to_string()),
            Some("BT 9".to_string()),
            Some("BT 10".to_string()),
        ]
    );
    assert!(week.get("leaders").map(|v| v.is_null()).unwrap_or(false));
}
