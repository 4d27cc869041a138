use crate::ipc::error::{domain_err, ok};
use crate::ipc::helpers::{bad_params, db_conn, parse_opt_string, required_str};
use crate::ipc::types::{AppState, Request};
use crate::prefs::{KvStore, SqliteStore, StoreError, StoreScope};
use serde_json::{json, Map, Value as JsonValue};

fn parse_scope(req: &Request) -> Result<StoreScope, JsonValue> {
    match parse_opt_string(req.params.get("scope")) {
        Err(e) => Err(bad_params(req, format!("scope {}", e))),
        Ok(None) => Ok(StoreScope::Persistent),
        Ok(Some(s)) => StoreScope::parse(&s)
            .ok_or_else(|| bad_params(req, "scope must be one of: session, persistent")),
    }
}

/// Runs `f` against the store for the requested scope.
fn with_store<F>(state: &mut AppState, req: &Request, f: F) -> JsonValue
where
    F: FnOnce(&mut dyn KvStore) -> Result<JsonValue, StoreError>,
{
    let scope = match parse_scope(req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let result = match scope {
        StoreScope::Session => {
            let store: &mut dyn KvStore = &mut state.session;
            f(store)
        }
        StoreScope::Persistent => {
            let conn = match db_conn(state, req) {
                Ok(c) => c,
                Err(e) => return e,
            };
            let mut sqlite = SqliteStore::new(conn);
            let store: &mut dyn KvStore = &mut sqlite;
            f(store)
        }
    };
    match result {
        Ok(mut v) => {
            if let Some(obj) = v.as_object_mut() {
                obj.insert("scope".into(), json!(scope.as_str()));
            }
            ok(&req.id, v)
        }
        Err(e) => {
            if matches!(e, StoreError::Sqlite(_)) {
                tracing::warn!(error = %e, "kv store failure");
            }
            domain_err(&req.id, &e)
        }
    }
}

fn handle_get(state: &mut AppState, req: &Request) -> JsonValue {
    let key = match required_str(req, "key") {
        Ok(v) => v,
        Err(e) => return e,
    };
    with_store(state, req, |store| {
        let value = store.get_json(&key)?;
        Ok(json!({ "key": key, "value": value, "present": value.is_some() }))
    })
}

fn handle_set(state: &mut AppState, req: &Request) -> JsonValue {
    let key = match required_str(req, "key") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(value) = req.params.get("value").cloned() else {
        return bad_params(req, "missing value");
    };
    with_store(state, req, |store| {
        store.set_json(&key, &value)?;
        Ok(json!({ "key": key, "value": value }))
    })
}

fn handle_remove(state: &mut AppState, req: &Request) -> JsonValue {
    let key = match required_str(req, "key") {
        Ok(v) => v,
        Err(e) => return e,
    };
    with_store(state, req, |store| {
        let removed = store.remove(&key)?;
        Ok(json!({ "key": key, "removed": removed }))
    })
}

fn handle_list(state: &mut AppState, req: &Request) -> JsonValue {
    let prefix = match parse_opt_string(req.params.get("prefix")) {
        Ok(v) => v.unwrap_or_default(),
        Err(e) => return bad_params(req, format!("prefix {}", e)),
    };
    with_store(state, req, |store| {
        let mut entries = Map::new();
        for key in store.keys_with_prefix(&prefix)? {
            let value = store.get_json(&key)?.unwrap_or(JsonValue::Null);
            entries.insert(key, value);
        }
        Ok(json!({ "prefix": prefix, "entries": entries }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "prefs.get" => Some(handle_get(state, req)),
        "prefs.set" => Some(handle_set(state, req)),
        "prefs.remove" => Some(handle_remove(state, req)),
        "prefs.list" => Some(handle_list(state, req)),
        _ => None,
    }
}
