use crate::catalog::{CatalogError, LessonStatus, SubjectCategory, TeacherTier};
use crate::ipc::error::{domain_err, ok};
use crate::ipc::helpers::{bad_params, parse_opt_string};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value as JsonValue};

fn status_json(s: LessonStatus) -> JsonValue {
    json!({
        "key": s,
        "label": s.label(),
        "color": s.color(),
        "terminal": s.is_terminal(),
    })
}

fn subject_json(c: SubjectCategory) -> JsonValue {
    json!({
        "key": c,
        "label": c.label(),
        "icon": c.icon(),
    })
}

fn tier_json(t: TeacherTier) -> JsonValue {
    json!({
        "key": t,
        "label": t.label(),
        "score": t.score(),
        "color": t.color(),
    })
}

/// One entry when `key` is given, otherwise the whole table.
fn lookup<T: Copy>(
    req: &Request,
    all: &[T],
    parse: fn(&str) -> Result<T, CatalogError>,
    render: fn(T) -> JsonValue,
) -> JsonValue {
    match parse_opt_string(req.params.get("key")) {
        Err(e) => bad_params(req, format!("key {}", e)),
        Ok(None) => ok(
            &req.id,
            json!({ "entries": all.iter().copied().map(render).collect::<Vec<_>>() }),
        ),
        Ok(Some(key)) => match parse(&key) {
            Ok(v) => ok(&req.id, render(v)),
            Err(e) => domain_err(&req.id, &e),
        },
    }
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "catalog.lessonStatus" => Some(lookup(
            req,
            &LessonStatus::ALL,
            LessonStatus::parse,
            status_json,
        )),
        "catalog.subject" => Some(lookup(
            req,
            &SubjectCategory::ALL,
            SubjectCategory::parse,
            subject_json,
        )),
        "catalog.tier" => Some(lookup(req, &TeacherTier::ALL, TeacherTier::parse, tier_json)),
        _ => None,
    }
}
