mod test_support;

use pretty_assertions::assert_eq;
use serde_json::json;
use test_support::{slot_starts, spawn_sidecar, spawn_sidecar_with_env};

// 2026-10-19 is a Monday; day index 1 in the backend's Sunday-first numbering.
fn monday_params() -> serde_json::Value {
    json!({
        "date": "2026-10-19",
        "durationMinutes": 30,
        "now": "2026-10-19T08:00:00",
        "recurring": [
            { "day_of_week": 1, "start_time": "09:00:00", "end_time": "11:00:00", "is_available": true }
        ],
        "booked": [
            { "scheduled_at": "2026-10-19T10:00:00", "duration_minutes": 30 }
        ]
    })
}

#[test]
fn reschedule_flow_applies_two_hour_lead_time() {
    let mut sidecar = spawn_sidecar();
    let mut params = monday_params();
    params["flow"] = json!("reschedule");

    let result = sidecar.request_ok("slots.available", params);
    assert_eq!(slot_starts(&result), vec!["2026-10-19T10:30:00"]);
    assert_eq!(result["leadMinutes"], json!(120));
    assert_eq!(result["cutoff"], json!("2026-10-19T10:00:00"));
    assert_eq!(result["slots"][0]["end"], json!("2026-10-19T11:00:00"));
}

#[test]
fn book_with_student_flow_has_no_lead_time() {
    let mut sidecar = spawn_sidecar();
    let result = sidecar.request_ok("slots.available", monday_params());
    assert_eq!(result["flow"], json!("bookWithStudent"));
    assert_eq!(
        slot_starts(&result),
        vec![
            "2026-10-19T09:00:00",
            "2026-10-19T09:30:00",
            "2026-10-19T10:30:00"
        ]
    );
}

#[test]
fn per_request_overrides_win_over_flow_defaults() {
    let mut sidecar = spawn_sidecar();
    let params = json!({
        "flow": "reschedule",
        "date": "2026-10-19",
        "durationMinutes": 60,
        "now": "2026-10-19T00:00",
        "leadMinutes": 0,
        "merge": "concatenate",
        "fit": "overhang",
        "recurring": [ { "dayOfWeek": "Mon", "startTime": "09:00", "endTime": "10:00" } ],
        "overrides": [ { "date": "2026-10-19", "startTime": "09:00", "endTime": "10:00", "isAvailable": true } ]
    });
    let result = sidecar.request_ok("slots.available", params.clone());
    assert_eq!(result["fit"], json!("overhang"));
    assert_eq!(
        slot_starts(&result),
        vec![
            "2026-10-19T09:00:00",
            "2026-10-19T09:00:00",
            "2026-10-19T09:30:00",
            "2026-10-19T09:30:00"
        ]
    );

    let mut fixed = params;
    fixed["merge"] = json!("dedup");
    fixed["fit"] = json!("within_window");
    let result = sidecar.request_ok("slots.available", fixed);
    assert_eq!(slot_starts(&result), vec!["2026-10-19T09:00:00"]);
}

#[test]
fn typed_errors_reach_the_client() {
    let mut sidecar = spawn_sidecar();

    let mut zero = monday_params();
    zero["durationMinutes"] = json!(0);
    assert_eq!(sidecar.request_err("slots.available", zero), "invalid_duration");

    let mut bad_time = monday_params();
    bad_time["recurring"][0]["start_time"] = json!("9am");
    let resp = sidecar.request("slots.available", bad_time);
    assert_eq!(resp["error"]["code"], json!("malformed_time"));
    assert_eq!(
        resp["error"]["details"]["field"],
        json!("recurring[0].startTime")
    );

    let mut late = monday_params();
    late["now"] = json!("2026-10-19T12:00:00");
    assert_eq!(sidecar.request_err("slots.available", late), "no_slots");

    let mut bad_flow = monday_params();
    bad_flow["flow"] = json!("instant");
    assert_eq!(sidecar.request_err("slots.available", bad_flow), "bad_params");

    let mut bad_day = monday_params();
    bad_day["recurring"][0]["day_of_week"] = json!(7);
    assert_eq!(sidecar.request_err("slots.available", bad_day), "bad_params");

    assert_eq!(
        sidecar.request_err("slots.available", json!({ "durationMinutes": 30 })),
        "bad_params"
    );
}

#[test]
fn windows_lists_applicable_availability() {
    let mut sidecar = spawn_sidecar();
    let result = sidecar.request_ok(
        "slots.windows",
        json!({
            "date": "2026-10-19",
            "recurring": [
                { "dayOfWeek": 1, "startTime": "09:00", "endTime": "11:00" },
                { "dayOfWeek": 2, "startTime": "09:00", "endTime": "11:00" }
            ],
            "overrides": [
                { "date": "2026-10-19", "startTime": "14:00", "endTime": "15:00", "isAvailable": false }
            ]
        }),
    );
    assert_eq!(
        result["windows"],
        json!([{ "start": "2026-10-19T09:00:00", "end": "2026-10-19T11:00:00" }])
    );
}

#[test]
fn check_reschedule_accepts_only_derived_slots() {
    let mut sidecar = spawn_sidecar();

    let mut good = monday_params();
    good["proposedStart"] = json!("2026-10-19T10:30");
    let result = sidecar.request_ok("slots.checkReschedule", good);
    assert_eq!(result["flow"], json!("reschedule"));
    assert_eq!(result["slot"]["start"], json!("2026-10-19T10:30:00"));

    // Inside the lead time for the reschedule flow.
    let mut early = monday_params();
    early["proposedStart"] = json!("2026-10-19T09:00");
    assert_eq!(
        sidecar.request_err("slots.checkReschedule", early),
        "slot_unavailable"
    );

    let mut nothing_free = monday_params();
    nothing_free["now"] = json!("2026-10-19T12:00:00");
    nothing_free["proposedStart"] = json!("2026-10-19T10:30");
    assert_eq!(
        sidecar.request_err("slots.checkReschedule", nothing_free),
        "slot_unavailable"
    );
}

#[test]
fn next_available_jumps_to_first_open_day() {
    let mut sidecar = spawn_sidecar();
    let params = json!({
        "fromDate": "2026-10-19",
        "now": "2026-10-19T08:00",
        "recurring": [ { "dayOfWeek": 4, "startTime": "16:00", "endTime": "17:00" } ]
    });
    let result = sidecar.request_ok("slots.nextAvailable", params.clone());
    assert_eq!(result["date"], json!("2026-10-22"));
    assert_eq!(
        slot_starts(&result),
        vec!["2026-10-22T16:00:00", "2026-10-22T16:30:00"]
    );

    let mut short = params.clone();
    short["horizonDays"] = json!(2);
    assert_eq!(sidecar.request_err("slots.nextAvailable", short), "no_slots");

    let mut too_far = params;
    too_far["horizonDays"] = json!(365);
    assert_eq!(
        sidecar.request_err("slots.nextAvailable", too_far),
        "bad_params"
    );
}

#[test]
fn identical_requests_give_identical_answers() {
    let mut sidecar = spawn_sidecar();
    let a = sidecar.request_ok("slots.available", monday_params());
    let b = sidecar.request_ok("slots.available", monday_params());
    assert_eq!(a, b);
}

#[test]
fn oversized_numbers_are_rejected_and_the_sidecar_keeps_serving() {
    let mut sidecar = spawn_sidecar();

    let mut lead = monday_params();
    lead["leadMinutes"] = json!(i64::MAX);
    assert_eq!(sidecar.request_err("slots.available", lead), "bad_params");

    let mut lead_just_over = monday_params();
    lead_just_over["leadMinutes"] = json!(90 * 24 * 60 + 1);
    assert_eq!(
        sidecar.request_err("slots.available", lead_just_over),
        "bad_params"
    );

    let mut duration = monday_params();
    duration["durationMinutes"] = json!(1_000_000_000_000_i64);
    assert_eq!(
        sidecar.request_err("slots.available", duration),
        "invalid_duration"
    );

    let mut booked = monday_params();
    booked["booked"][0]["duration_minutes"] = json!(i64::MAX);
    assert_eq!(
        sidecar.request_err("slots.available", booked),
        "invalid_duration"
    );

    let mut far = monday_params();
    far["proposedStart"] = json!("2026-10-19T10:30");
    far["durationMinutes"] = json!(i64::MAX);
    assert_eq!(
        sidecar.request_err("slots.checkReschedule", far),
        "invalid_duration"
    );

    let _ = sidecar.request_ok("health", json!({}));
    let result = sidecar.request_ok("slots.available", monday_params());
    assert_eq!(slot_starts(&result).len(), 3);
}

#[test]
fn null_spelling_does_not_hide_the_other_spelling() {
    let mut sidecar = spawn_sidecar();
    let mut params = monday_params();
    params["recurring"][0]["isAvailable"] = json!(null);
    params["recurring"][0]["is_available"] = json!(false);
    assert_eq!(sidecar.request_err("slots.available", params), "no_slots");
}

#[test]
fn booked_lesson_in_utc_blocks_its_local_slot() {
    // POSIX zone string for a fixed UTC+2, no zoneinfo lookup needed.
    let mut sidecar = spawn_sidecar_with_env(&[("TZ", "UTC-2")]);
    let result = sidecar.request_ok(
        "slots.available",
        json!({
            "date": "2026-10-19",
            "durationMinutes": 30,
            "now": "2026-10-19T00:00:00",
            "recurring": [
                { "day_of_week": 1, "start_time": "11:00:00", "end_time": "13:00:00" }
            ],
            "booked": [
                { "scheduled_at": "2026-10-19T10:00:00+00:00", "duration_minutes": 30 }
            ]
        }),
    );
    assert_eq!(
        slot_starts(&result),
        vec![
            "2026-10-19T11:00:00",
            "2026-10-19T11:30:00",
            "2026-10-19T12:30:00"
        ]
    );
}
