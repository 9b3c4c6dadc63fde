
use serde_json::json;
use test_support::{request, request_ok, spawn_sidecar, temp_dir};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("substitutd-router-smoke");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "teachers.create",
        json!({ "name": "Smoke Teacher", "email": "smoke@school" }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "4", "teachers.list", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "classes.create",
        json!({ "name": "6A" }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "6", "classes.list", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "timetable.setDay",
        json!({
            "weekday": "monday",
            "slots": [
                { "period": 1, "class": "6A", "subject": "Math", "teacher": { "email": "smoke@school" } }
            ]
        }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "8", "timetable.week", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "timetable.dailyMerged",
        json!({ "date": "2024-03-04" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "absences.set",
        json!({ "date": "2024-03-04", "teachers": [{ "email": "smoke@school" }] }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "absences.list",
        json!({ "date": "2024-03-04" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "12",
        "substitutions.vacantSlots",
        json!({ "date": "2024-03-04" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "13",
        "substitutions.freeTeachers",
        json!({ "date": "2024-03-04", "period": 1 }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "14",
        "substitutions.forDate",
        json!({ "date": "2024-03-04" }),
    );

    let unknown = request(
        &mut stdin,
        &mut reader,
        "15",
        "no.such.method",
        json!({}),
    );
    assert_eq!(
        unknown
            .pointer("/error/code")
            .and_then(|v| v.as_str()),
        Some("not_implemented")
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
