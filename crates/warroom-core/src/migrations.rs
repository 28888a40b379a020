//! Schema upgrades for the persisted document and the config file.
//!
//! Documents are upgraded as raw JSON before typed deserialization, so a
//! migration can repair shapes the current types would reject outright.

use crate::config::Config;
use crate::error::{Result, WarRoomError};
use crate::types::{Priority, Stage};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::str::FromStr;

/// Documents written before versioning existed carry no `schemaVersion` and
/// are treated as version 1.
pub const LEGACY_SCHEMA_VERSION: u32 = 1;
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Bring a raw stored document up to [`CURRENT_SCHEMA_VERSION`].
pub fn migrate_document(mut doc: Value) -> Result<Value> {
    let Some(obj) = doc.as_object_mut() else {
        return Err(WarRoomError::Validation(
            "stored document is not a JSON object".to_string(),
        ));
    };

    let version = obj
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .map(|v| v as u32)
        .unwrap_or(LEGACY_SCHEMA_VERSION);

    if version > CURRENT_SCHEMA_VERSION {
        return Err(WarRoomError::UnsupportedSchema(version));
    }
    if version < 2 {
        migrate_v1_to_v2(obj);
    }
    repair_deal_numbers(obj);
    Ok(doc)
}

/// Coerce deal probability and value on every version. A single hand-edited
/// number (`"probability": 300` or `60.5`) must not fail typed decoding of the
/// whole document.
fn repair_deal_numbers(obj: &mut Map<String, Value>) {
    if let Some(Value::Array(deals)) = obj.get_mut("pipeline") {
        for deal in deals.iter_mut().filter_map(Value::as_object_mut) {
            normalize_probability(deal);
            normalize_value(deal);
        }
    }
}

/// v1 → v2: the unversioned browser document.
///
/// - unknown stage labels fall back to Target, unknown priorities to P1,
/// - numeric tiers become strings, unknown tiers become "1",
/// - missing or duplicate ids are regenerated,
/// - missing label fields become empty strings.
fn migrate_v1_to_v2(obj: &mut Map<String, Value>) {
    if let Some(Value::Array(deals)) = obj.get_mut("pipeline") {
        let mut seen = HashSet::new();
        for deal in deals.iter_mut().filter_map(Value::as_object_mut) {
            ensure_unique_id(deal, &mut seen, crate::deal::new_deal_id);
            ensure_string(deal, "company");
            ensure_string(deal, "role");
            normalize_stage(deal);
            normalize_priority(deal);
        }
    }

    if let Some(Value::Array(contacts)) = obj.get_mut("contacts") {
        let mut seen = HashSet::new();
        for contact in contacts.iter_mut().filter_map(Value::as_object_mut) {
            ensure_unique_id(contact, &mut seen, crate::contact::new_contact_id);
            ensure_string(contact, "name");
            ensure_string(contact, "company");
            normalize_tier(contact);
        }
    }

    obj.insert("schemaVersion".to_string(), Value::from(2u32));
}

fn ensure_unique_id(
    record: &mut Map<String, Value>,
    seen: &mut HashSet<String>,
    fresh: fn() -> String,
) {
    let current = record
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|id| !id.is_empty());
    let id = match current {
        Some(id) if seen.insert(id.clone()) => id,
        other => {
            let id = fresh();
            tracing::warn!(old = ?other, new = %id, "regenerated missing or duplicate record id");
            seen.insert(id.clone());
            id
        }
    };
    record.insert("id".to_string(), Value::String(id));
}

fn ensure_string(record: &mut Map<String, Value>, key: &str) {
    let fixed = match record.get(key) {
        Some(Value::String(_)) => return,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    record.insert(key.to_string(), Value::String(fixed));
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
}

fn normalize_probability(deal: &mut Map<String, Value>) {
    let p = deal
        .get("probability")
        .and_then(as_number)
        .filter(|p| p.is_finite())
        .map(|p| p.round().clamp(0.0, 100.0) as u64)
        .unwrap_or(0);
    deal.insert("probability".to_string(), Value::from(p));
}

fn normalize_value(deal: &mut Map<String, Value>) {
    let v = deal
        .get("value")
        .and_then(as_number)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0);
    deal.insert("value".to_string(), Value::from(v));
}

fn normalize_stage(deal: &mut Map<String, Value>) {
    let stage = deal
        .get("stage")
        .and_then(Value::as_str)
        .and_then(|s| Stage::from_str(s).ok())
        .unwrap_or_default();
    deal.insert("stage".to_string(), Value::String(stage.as_str().to_string()));
}

fn normalize_priority(deal: &mut Map<String, Value>) {
    let Some(raw) = deal.get("priority") else {
        return;
    };
    let priority = raw
        .as_str()
        .map(str::to_string)
        .or_else(|| raw.as_u64().map(|n| n.to_string()))
        .and_then(|s| Priority::from_str(&s).ok())
        .unwrap_or_default();
    deal.insert("priority".to_string(), Value::String(priority.as_str().to_string()));
}

fn normalize_tier(contact: &mut Map<String, Value>) {
    let tier = match contact.get("tier") {
        Some(Value::String(s)) if matches!(s.as_str(), "1" | "2" | "3") => return,
        Some(Value::Number(n)) => match n.as_u64() {
            Some(t @ 1..=3) => t.to_string(),
            _ => "1".to_string(),
        },
        None => return,
        Some(_) => "1".to_string(),
    };
    contact.insert("tier".to_string(), Value::String(tier));
}

/// Run any pending schema migrations on a loaded [`Config`].
///
/// Config schema v1 has no migrations yet; add a match arm on `cfg.version`
/// when the layout changes.
pub fn migrate_config(cfg: Config) -> Result<Config> {
    Ok(cfg)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
