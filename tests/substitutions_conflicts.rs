
use serde_json::json;
use test_support::{open_workspace, request_err, request_ok};

const DATE: &str = "2024-03-04"; // a Monday

fn seed(
    stdin: &mut std::process::ChildStdin,
    reader: &mut std::io::BufReader<std::process::ChildStdout>,
) {
    for (i, name) in ["Alice", "Bob", "Carol", "Dave"].iter().enumerate() {
        let _ = request_ok(
            stdin,
            reader,
            &format!("t{}", i),
            "teachers.create",
            json!({ "name": name }),
        );
    }
    let _ = request_ok(
        stdin,
        reader,
        "day",
        "timetable.setDay",
        json!({
            "weekday": 0,
            "slots": [
                { "period": 3, "class": "6A", "subject": "Math", "teacher": { "name": "Alice" } },
                { "period": 3, "class": "7B", "subject": "Physics", "teacher": { "name": "Bob" } }
            ]
        }),
    );
    let _ = request_ok(
        stdin,
        reader,
        "abs",
        "absences.set",
        json!({ "date": DATE, "teachers": [{ "name": "Alice" }] }),
    );
}

#[test]
fn absent_substitute_is_rejected_and_nothing_is_written() {
    let (_child, mut stdin, mut reader, _ws) = open_workspace("substitutd-absentee-conflict");
    seed(&mut stdin, &mut reader);

    let code = request_err(
        &mut stdin,
        &mut reader,
        "a",
        "substitutions.assign",
        json!({
            "date": DATE,
            "period": 3,
            "class": "6A",
            "substitute": { "name": "Alice" }
        }),
    );
    assert_eq!(code, "absentee_conflict");

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "l",
        "substitutions.forDate",
        json!({ "date": DATE }),
    );
    assert_eq!(
        listed
            .get("records")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(0)
    );
}

#[test]
fn substitute_with_a_regular_slot_in_the_period_is_rejected() {
    let (_child, mut stdin, mut reader, _ws) = open_workspace("substitutd-double-booking-regular");
    seed(&mut stdin, &mut reader);

    let code = request_err(
        &mut stdin,
        &mut reader,
        "a",
        "substitutions.assign",
        json!({
            "date": DATE,
            "period": 3,
            "class": "6A",
            "substitute": { "name": "Bob" }
        }),
    );
    assert_eq!(code, "double_booking");
}

#[test]
fn substitute_already_covering_another_class_is_rejected() {
    let (_child, mut stdin, mut reader, _ws) = open_workspace("substitutd-double-booking-sub");
    seed(&mut stdin, &mut reader);

    // Bob is also out; both period-3 slots are vacant now.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "abs2",
        "absences.set",
        json!({ "date": DATE, "teachers": [{ "name": "Alice" }, { "name": "Bob" }] }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "a1",
        "substitutions.assign",
        json!({
            "date": DATE,
            "period": 3,
            "class": "6A",
            "substitute": { "name": "Carol" }
        }),
    );
    let code = request_err(
        &mut stdin,
        &mut reader,
        "a2",
        "substitutions.assign",
        json!({
            "date": DATE,
            "period": 3,
            "class": "7B",
            "substitute": { "name": "Carol" }
        }),
    );
    assert_eq!(code, "double_booking");

    // Dave is still free for 7B.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "a3",
        "substitutions.assign",
        json!({
            "date": DATE,
            "period": 3,
            "class": "7B",
            "substitute": { "name": "Dave" }
        }),
    );
}

#[test]
fn replacing_a_substitute_requires_explicit_update() {
    let (_child, mut stdin, mut reader, _ws) = open_workspace("substitutd-conflict-update");
    seed(&mut stdin, &mut reader);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "a1",
        "substitutions.assign",
        json!({
            "date": DATE,
            "period": 3,
            "class": "6A",
            "substitute": { "name": "Carol" }
        }),
    );

    let code = request_err(
        &mut stdin,
        &mut reader,
        "a2",
        "substitutions.assign",
        json!({
            "date": DATE,
            "period": 3,
            "class": "6A",
            "substitute": { "name": "Dave" }
        }),
    );
    assert_eq!(code, "conflict");

    let replaced = request_ok(
        &mut stdin,
        &mut reader,
        "a3",
        "substitutions.assign",
        json!({
            "date": DATE,
            "period": 3,
            "class": "6A",
            "substitute": { "name": "Dave" },
            "update": true
        }),
    );
    assert_eq!(
        replaced
            .pointer("/record/substituteTeacher/name")
            .and_then(|v| v.as_str()),
        Some("Dave")
    );

    // Still one record for the slot, now held by Dave.
    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "l",
        "substitutions.forDate",
        json!({ "date": DATE }),
    );
    let records = listed
        .get("records")
        .and_then(|v| v.as_array())
        .expect("records")
        .clone();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0]
            .pointer("/substituteTeacher/name")
            .and_then(|v| v.as_str()),
        Some("Dave")
    );
}

#[test]
fn malformed_assignments_are_rejected_before_the_store() {
    let (_child, mut stdin, mut reader, _ws) = open_workspace("substitutd-bad-params");
    seed(&mut stdin, &mut reader);

    for (id, params) in [
        ("m1", json!({ "period": 3, "class": "6A", "substitute": { "name": "Carol" } })),
        ("m2", json!({ "date": DATE, "class": "6A", "substitute": { "name": "Carol" } })),
        ("m3", json!({ "date": DATE, "period": 0, "class": "6A", "substitute": { "name": "Carol" } })),
        ("m4", json!({ "date": DATE, "period": 3, "substitute": { "name": "Carol" } })),
        ("m5", json!({ "date": DATE, "period": 3, "class": "6A" })),
        ("m6", json!({ "date": "04.03.2024", "period": 3, "class": "6A", "substitute": { "name": "Carol" } })),
    ] {
        let code = request_err(&mut stdin, &mut reader, id, "substitutions.assign", params);
        assert_eq!(code, "bad_params", "case {}", id);
    }
}
