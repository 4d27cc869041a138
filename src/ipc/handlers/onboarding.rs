use crate::ipc::error::{domain_err, err, ok};
use crate::ipc::helpers::{bad_params, required_str};
use crate::ipc::types::{AppState, Request};
use crate::onboarding::{OnboardingProgress, OnboardingStep, ProgressSnapshot};
use crate::prefs::{SqliteStore, StoreError};
use serde_json::{json, Value as JsonValue};

enum Action {
    Get,
    Complete(OnboardingStep),
    Skip(OnboardingStep),
    Reset,
}

fn parse_step(req: &Request) -> Result<OnboardingStep, JsonValue> {
    let raw = required_str(req, "step")?;
    OnboardingStep::parse(&raw).ok_or_else(|| {
        bad_params(
            req,
            "step must be one of: profile, subjects, availability, payouts, introVideo",
        )
    })
}

fn run(state: &mut AppState, req: &Request, action: Action) -> JsonValue {
    // Completion is persisted per workspace; skips only last for this session.
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let mut persistent = SqliteStore::new(conn);
    let mut progress = OnboardingProgress::new(&mut persistent, &mut state.session);
    let result: Result<ProgressSnapshot, StoreError> = match action {
        Action::Get => progress.snapshot(),
        Action::Complete(step) => progress.complete(step),
        Action::Skip(step) => progress.skip(step),
        Action::Reset => progress.reset(),
    };
    match result {
        Ok(snap) => ok(&req.id, json!(snap)),
        Err(e) => domain_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let action = match req.method.as_str() {
        "onboarding.get" => Action::Get,
        "onboarding.reset" => Action::Reset,
        "onboarding.complete" => match parse_step(req) {
            Ok(step) => Action::Complete(step),
            Err(e) => return Some(e),
        },
        "onboarding.skip" => match parse_step(req) {
            Ok(step) => Action::Skip(step),
            Err(e) => return Some(e),
        },
        _ => return None,
    };
    Some(run(state, req, action))
}
