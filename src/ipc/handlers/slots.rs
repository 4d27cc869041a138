use crate::config::MAX_HORIZON_DAYS;
use crate::flows::{BookingFlow, FlowPolicy};
use crate::ipc::error::{domain_err, ok};
use crate::ipc::helpers::{bad_params, parse_array, parse_opt_i64, parse_opt_string};
use crate::ipc::types::{AppState, Request};
use crate::slots::{
    self, BookedLesson, FitPolicy, MergePolicy, OverrideWindow, RecurringWindow, Slot, SlotError,
    SlotQuery, MAX_LEAD_MINUTES,
};
use chrono::{Duration, Local, Weekday};
use serde_json::{json, Value as JsonValue};

const DEFAULT_DURATION_MINUTES: i64 = 30;

enum ParamError {
    Bad(String),
    Slot(SlotError),
}

impl From<SlotError> for ParamError {
    fn from(e: SlotError) -> Self {
        Self::Slot(e)
    }
}

impl From<String> for ParamError {
    fn from(s: String) -> Self {
        Self::Bad(s)
    }
}

impl ParamError {
    fn into_response(self, req: &Request) -> JsonValue {
        match self {
            Self::Bad(msg) => bad_params(req, msg),
            Self::Slot(e) => domain_err(&req.id, &e),
        }
    }
}

struct SlotInputs {
    recurring: Vec<RecurringWindow>,
    overrides: Vec<OverrideWindow>,
    booked: Vec<BookedLesson>,
}

/// Rows arrive either camelCase from the UI or snake_case straight from the backend.
fn row_field<'a>(row: &'a JsonValue, names: &[&str]) -> Option<&'a JsonValue> {
    names
        .iter()
        .filter_map(|n| row.get(*n))
        .find(|v| !v.is_null())
}

fn row_str<'a>(row: &'a JsonValue, names: &[&str], path: &str) -> Result<&'a str, ParamError> {
    match row_field(row, names) {
        None => Err(ParamError::Bad(format!("missing {}", path))),
        Some(v) => v
            .as_str()
            .ok_or_else(|| ParamError::Bad(format!("{} must be string", path))),
    }
}

fn row_available(row: &JsonValue, path: &str) -> Result<bool, ParamError> {
    match row_field(row, &["isAvailable", "is_available"]) {
        None => Ok(true),
        Some(v) => v
            .as_bool()
            .ok_or_else(|| ParamError::Bad(format!("{}.isAvailable must be boolean", path))),
    }
}

fn parse_weekday(v: &JsonValue, path: &str) -> Result<Weekday, ParamError> {
    let parsed = match v {
        JsonValue::Number(n) => n.as_i64().and_then(slots::weekday_from_index),
        JsonValue::String(s) => s.trim().parse::<Weekday>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        ParamError::Bad(format!(
            "{} must be 0..6 (Sunday = 0) or a weekday name",
            path
        ))
    })
}

fn parse_recurring(rows: &[JsonValue]) -> Result<Vec<RecurringWindow>, ParamError> {
    let mut out = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let path = format!("recurring[{}]", i);
        let day_path = format!("{}.dayOfWeek", path);
        let day = row_field(row, &["dayOfWeek", "day_of_week"])
            .ok_or_else(|| ParamError::Bad(format!("missing {}", day_path)))?;
        let start_path = format!("{}.startTime", path);
        let end_path = format!("{}.endTime", path);
        out.push(RecurringWindow {
            day_of_week: parse_weekday(day, &day_path)?,
            start_time: slots::parse_time_of_day(
                &start_path,
                row_str(row, &["startTime", "start_time"], &start_path)?,
            )?,
            end_time: slots::parse_time_of_day(
                &end_path,
                row_str(row, &["endTime", "end_time"], &end_path)?,
            )?,
            is_available: row_available(row, &path)?,
        });
    }
    Ok(out)
}

fn parse_overrides(rows: &[JsonValue]) -> Result<Vec<OverrideWindow>, ParamError> {
    let mut out = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let path = format!("overrides[{}]", i);
        let date_path = format!("{}.date", path);
        let start_path = format!("{}.startTime", path);
        let end_path = format!("{}.endTime", path);
        out.push(OverrideWindow {
            date: slots::parse_date(
                &date_path,
                row_str(row, &["date", "specificDate", "specific_date"], &date_path)?,
            )?,
            start_time: slots::parse_time_of_day(
                &start_path,
                row_str(row, &["startTime", "start_time"], &start_path)?,
            )?,
            end_time: slots::parse_time_of_day(
                &end_path,
                row_str(row, &["endTime", "end_time"], &end_path)?,
            )?,
            is_available: row_available(row, &path)?,
        });
    }
    Ok(out)
}

fn parse_booked(rows: &[JsonValue]) -> Result<Vec<BookedLesson>, ParamError> {
    let mut out = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let start_path = format!("booked[{}].start", i);
        let dur_path = format!("booked[{}].durationMinutes", i);
        let start = slots::parse_date_time(
            &start_path,
            row_str(row, &["start", "scheduledAt", "scheduled_at"], &start_path)?,
        )?;
        let duration_minutes =
            row_field(row, &["durationMinutes", "duration_minutes", "duration"])
                .ok_or_else(|| ParamError::Bad(format!("missing {}", dur_path)))?
                .as_i64()
                .ok_or_else(|| ParamError::Bad(format!("{} must be integer", dur_path)))?;
        out.push(BookedLesson {
            start,
            duration_minutes,
        });
    }
    Ok(out)
}

fn parse_inputs(req: &Request) -> Result<SlotInputs, ParamError> {
    let p = &req.params;
    Ok(SlotInputs {
        recurring: parse_recurring(parse_array(p.get("recurring"), "recurring")?)?,
        overrides: parse_overrides(parse_array(p.get("overrides"), "overrides")?)?,
        booked: parse_booked(parse_array(p.get("booked"), "booked")?)?,
    })
}

fn parse_flow(req: &Request, default: BookingFlow) -> Result<BookingFlow, ParamError> {
    match parse_opt_string(req.params.get("flow")).map_err(|e| format!("flow {}", e))? {
        None => Ok(default),
        Some(s) => BookingFlow::parse(&s).ok_or_else(|| {
            ParamError::Bad("flow must be one of: reschedule, bookWithStudent".to_string())
        }),
    }
}

/// Flow defaults with any per-request `leadMinutes` / `merge` / `fit` applied.
fn parse_policy(req: &Request, base: FlowPolicy) -> Result<FlowPolicy, ParamError> {
    let p = &req.params;
    let mut policy = base;
    let lead = parse_opt_i64(p.get("leadMinutes")).map_err(|e| format!("leadMinutes {}", e))?;
    if let Some(lead) = lead {
        if !(0..=MAX_LEAD_MINUTES).contains(&lead) {
            return Err(ParamError::Bad(format!(
                "leadMinutes must be in 0..={}",
                MAX_LEAD_MINUTES
            )));
        }
        policy.lead_time = Duration::minutes(lead);
    }
    if let Some(raw) = parse_opt_string(p.get("merge")).map_err(|e| format!("merge {}", e))? {
        policy.merge = MergePolicy::parse(&raw).ok_or_else(|| {
            ParamError::Bad("merge must be one of: concatenate, dedup".to_string())
        })?;
    }
    if let Some(raw) = parse_opt_string(p.get("fit")).map_err(|e| format!("fit {}", e))? {
        policy.fit = FitPolicy::parse(&raw).ok_or_else(|| {
            ParamError::Bad("fit must be one of: overhang, within_window".to_string())
        })?;
    }
    Ok(policy)
}

fn parse_query(
    state: &AppState,
    req: &Request,
    default_flow: BookingFlow,
    date_key: &str,
) -> Result<(BookingFlow, SlotQuery), ParamError> {
    let p = &req.params;
    let flow = parse_flow(req, default_flow)?;
    let policy = parse_policy(req, flow.policy(&state.config.scheduling))?;

    let raw_date = parse_opt_string(p.get(date_key))
        .map_err(|e| format!("{} {}", date_key, e))?
        .ok_or_else(|| format!("missing {}", date_key))?;
    let date = slots::parse_date(date_key, &raw_date)?;

    let duration_minutes = parse_opt_i64(p.get("durationMinutes"))
        .map_err(|e| format!("durationMinutes {}", e))?
        .unwrap_or(DEFAULT_DURATION_MINUTES);

    let now = match parse_opt_string(p.get("now")).map_err(|e| format!("now {}", e))? {
        Some(raw) => slots::parse_date_time("now", &raw)?,
        None => Local::now().naive_local(),
    };

    Ok((
        flow,
        SlotQuery {
            date,
            duration_minutes,
            now,
            lead_time: policy.lead_time,
            merge: policy.merge,
            fit: policy.fit,
        },
    ))
}

fn slot_json(s: &Slot) -> JsonValue {
    json!({ "start": s.start, "end": s.end })
}

fn slots_result(
    flow: BookingFlow,
    query: &SlotQuery,
    slots: &[Slot],
) -> Result<JsonValue, ParamError> {
    let cutoff = query.cutoff()?;
    Ok(json!({
        "flow": flow.as_str(),
        "date": query.date,
        "durationMinutes": query.duration_minutes,
        "cutoff": cutoff,
        "leadMinutes": query.lead_time.num_minutes(),
        "merge": query.merge.as_str(),
        "fit": query.fit.as_str(),
        "slots": slots.iter().map(slot_json).collect::<Vec<_>>(),
    }))
}

fn available(state: &AppState, req: &Request) -> Result<JsonValue, ParamError> {
    let (flow, query) = parse_query(state, req, BookingFlow::BookWithStudent, "date")?;
    let inputs = parse_inputs(req)?;
    let slots = slots::derive_slots(&inputs.recurring, &inputs.overrides, &inputs.booked, &query)?;
    tracing::debug!(flow = flow.as_str(), date = %query.date, count = slots.len(), "derived slots");
    slots_result(flow, &query, &slots)
}

fn windows(state: &AppState, req: &Request) -> Result<JsonValue, ParamError> {
    let p = &req.params;
    let flow = parse_flow(req, BookingFlow::BookWithStudent)?;
    let policy = parse_policy(req, flow.policy(&state.config.scheduling))?;
    let raw_date = parse_opt_string(p.get("date"))
        .map_err(|e| format!("date {}", e))?
        .ok_or_else(|| "missing date".to_string())?;
    let date = slots::parse_date("date", &raw_date)?;
    let inputs = parse_inputs(req)?;
    let windows = slots::windows_for_date(&inputs.recurring, &inputs.overrides, date, policy.merge);
    Ok(json!({
        "date": date,
        "merge": policy.merge.as_str(),
        "windows": windows,
    }))
}

fn check_reschedule(state: &AppState, req: &Request) -> Result<JsonValue, ParamError> {
    let (flow, query) = parse_query(state, req, BookingFlow::Reschedule, "date")?;
    let raw = parse_opt_string(req.params.get("proposedStart"))
        .map_err(|e| format!("proposedStart {}", e))?
        .ok_or_else(|| "missing proposedStart".to_string())?;
    let proposed = slots::parse_date_time("proposedStart", &raw)?;
    let inputs = parse_inputs(req)?;

    let derived = slots::derive_slots(&inputs.recurring, &inputs.overrides, &inputs.booked, &query);
    let slots = match derived {
        Ok(v) => v,
        Err(SlotError::NoSlots { .. }) => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    let slot = slots::check_proposed_start(&slots, proposed)?;
    Ok(json!({
        "flow": flow.as_str(),
        "slot": slot_json(&slot),
    }))
}

fn next_available(state: &AppState, req: &Request) -> Result<JsonValue, ParamError> {
    let (flow, query) = parse_query(state, req, BookingFlow::BookWithStudent, "fromDate")?;
    let horizon = parse_opt_i64(req.params.get("horizonDays"))
        .map_err(|e| format!("horizonDays {}", e))?
        .unwrap_or(state.config.scheduling.next_available_horizon_days);
    if !(1..=MAX_HORIZON_DAYS).contains(&horizon) {
        return Err(ParamError::Bad(format!(
            "horizonDays must be in 1..={}",
            MAX_HORIZON_DAYS
        )));
    }
    let inputs = parse_inputs(req)?;
    let (date, slots) = slots::next_available(
        &inputs.recurring,
        &inputs.overrides,
        &inputs.booked,
        &query,
        horizon,
    )?;
    slots_result(flow, &query.on(date), &slots)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "slots.available" => available(state, req),
        "slots.windows" => windows(state, req),
        "slots.checkReschedule" => check_reschedule(state, req),
        "slots.nextAvailable" => next_available(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.into_response(req),
    })
}

