use serde_json::json;

use crate::catalog::CatalogError;
use crate::prefs::StoreError;
use crate::slots::SlotError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Stable wire code and optional details for a domain error.
pub trait ErrorCode: std::fmt::Display {
    fn code(&self) -> &'static str;

    fn details(&self) -> Option<serde_json::Value> {
        None
    }
}

pub fn domain_err(id: &str, e: &impl ErrorCode) -> serde_json::Value {
    tracing::debug!(id, code = e.code(), error = %e, "request failed");
    err(id, e.code(), e.to_string(), e.details())
}

impl ErrorCode for SlotError {
    fn code(&self) -> &'static str {
        match self {
            SlotError::InvalidDuration { .. } => "invalid_duration",
            SlotError::OutOfRange { .. } => "bad_params",
            SlotError::MalformedTime { .. } => "malformed_time",
            SlotError::NoSlots { .. } | SlotError::NoSlotsInHorizon { .. } => "no_slots",
            SlotError::SlotUnavailable { .. } => "slot_unavailable",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            SlotError::InvalidDuration { minutes } => Some(json!({ "minutes": minutes })),
            SlotError::OutOfRange { field } => Some(json!({ "field": field })),
            SlotError::MalformedTime { field, value } => {
                Some(json!({ "field": field, "value": value }))
            }
            SlotError::NoSlots { date } => Some(json!({ "date": date })),
            SlotError::NoSlotsInHorizon { from, days } => {
                Some(json!({ "fromDate": from, "horizonDays": days }))
            }
            SlotError::SlotUnavailable { proposed } => Some(json!({ "proposedStart": proposed })),
        }
    }
}

impl ErrorCode for StoreError {
    fn code(&self) -> &'static str {
        match self {
            StoreError::InvalidKey { .. } => "bad_params",
            StoreError::Sqlite(_) | StoreError::Corrupt { .. } => "store_failed",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            StoreError::InvalidKey { key, .. } => Some(json!({ "key": key })),
            StoreError::Corrupt { key, .. } => Some(json!({ "key": key })),
            StoreError::Sqlite(_) => None,
        }
    }
}

impl ErrorCode for CatalogError {
    fn code(&self) -> &'static str {
        "unknown_key"
    }

    fn details(&self) -> Option<serde_json::Value> {
        Some(json!({ "table": self.table, "key": self.key }))
    }
}
