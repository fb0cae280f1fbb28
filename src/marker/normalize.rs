//! Record normalization
//!
//! Alias lookups are ordered and explicit — one list per canonical field,
//! never a reflective scan over arbitrary keys. Missing or unparsable
//! optional fields degrade to neutral defaults; `normalize` never fails.

use super::{join_address_parts, Marker};
use serde_json::Value;

const ID_ALIASES: [&str; 3] = ["id", "Id", "recordId"];
const TITLE_ALIASES: [&str; 4] = ["title", "Title", "name", "Name"];
const DESCRIPTION_ALIASES: [&str; 2] = ["description", "Description"];
const LATITUDE_ALIASES: [&str; 3] = ["latitude", "Latitude", "lat"];
const LONGITUDE_ALIASES: [&str; 4] = ["longitude", "Longitude", "lng", "lon"];
const ICON_ALIASES: [&str; 2] = ["customIcon", "icon"];

/// Convert raw records into canonical markers, one per record, preserving
/// input order. Non-object records still produce a marker with synthesized
/// id/title so the count invariant holds.
pub fn normalize(raw_records: &[Value]) -> Vec<Marker> {
    raw_records
        .iter()
        .enumerate()
        .map(|(index, record)| normalize_one(record, index))
        .collect()
}

fn normalize_one(record: &Value, index: usize) -> Marker {
    let street = string_alias(record, &["street", "Street"]);
    let city = string_alias(record, &["city", "City"]);
    let state = string_alias(record, &["state", "State"]);
    let postal_code = string_alias(record, &["postalCode", "PostalCode"]);
    let country = string_alias(record, &["country", "Country"]);

    let mut address = resolve_address(record);
    if address.is_empty() {
        address = join_address_parts([&street, &city, &state, &postal_code, &country]);
    }

    Marker {
        id: string_alias_or(record, &ID_ALIASES, || format!("marker_{index}")),
        title: string_alias_or(record, &TITLE_ALIASES, || format!("Location {}", index + 1)),
        description: string_alias(record, &DESCRIPTION_ALIASES),
        latitude: coerce_number(first_present(record, &LATITUDE_ALIASES)),
        longitude: coerce_number(first_present(record, &LONGITUDE_ALIASES)),
        address,
        street,
        city,
        state,
        postal_code,
        country,
        custom_icon: first_present(record, &ICON_ALIASES)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        raw_data: record.clone(),
    }
}

/// Address resolution precedence: compound address object → flat string
/// under either case variant → empty (caller derives from parts).
fn resolve_address(record: &Value) -> String {
    match record.get("address") {
        Some(Value::Object(compound)) => {
            let part = |key: &str| {
                compound
                    .get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
            };
            join_address_parts([
                part("street"),
                part("city"),
                part("state"),
                part("postalCode"),
                part("country"),
            ])
        }
        Some(Value::String(s)) => s.clone(),
        _ => record
            .get("Address")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}

fn first_present<'a>(record: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .find_map(|key| record.get(key))
        .filter(|v| !v.is_null())
}

fn string_alias(record: &Value, aliases: &[&str]) -> String {
    first_present(record, aliases)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn string_alias_or(record: &Value, aliases: &[&str], fallback: impl FnOnce() -> String) -> String {
    match first_present(record, aliases) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        // Numeric ids are accepted as-is (some sources key records by number)
        Some(Value::Number(n)) => n.to_string(),
        _ => fallback(),
    }
}

/// Numeric coercion for coordinates: numbers pass through, strings are
/// parsed, everything else (and parse failures) becomes `None` — never a
/// silent 0.0.
fn coerce_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
