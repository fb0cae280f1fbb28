//! Canonical marker model and record normalization
//!
//! Raw location records arrive with heterogeneous shapes (different casing,
//! alias keys, compound vs. flat addresses). Everything downstream works on
//! the canonical [`Marker`] produced by [`normalize`].

mod normalize;

pub use normalize::normalize;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical point entity derived from one raw record.
///
/// Latitude and longitude are mutually present: a marker either has a full
/// coordinate pair or none (see [`Marker::coordinates`]). The full original
/// record is retained in `raw_data` for popup and filter field lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Unique within a load; stable across re-renders when the source
    /// record id is unchanged.
    pub id: String,
    pub title: String,
    pub description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Joined non-empty address parts, comma-separated, street→country.
    pub address: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    /// Inline vector-icon markup or identifier, when the record carries one.
    pub custom_icon: Option<String>,
    /// The full original record.
    pub raw_data: Value,
}

impl Marker {
    /// The coordinate pair, only when both halves are present.
    ///
    /// Coordinates take precedence over the address for centering; callers
    /// fall back to the address parts when this returns `None`.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }

    /// Whether any address component is set.
    pub fn has_address(&self) -> bool {
        !self.street.is_empty()
            || !self.city.is_empty()
            || !self.state.is_empty()
            || !self.postal_code.is_empty()
            || !self.country.is_empty()
            || !self.address.is_empty()
    }

    /// Stringified value of a raw-data field, if present and non-null.
    pub fn raw_field(&self, field: &str) -> Option<String> {
        match self.raw_data.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

/// Join non-empty address parts in street→country order.
pub(crate) fn join_address_parts(parts: [&str; 5]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn marker_at(lat: Option<f64>, lng: Option<f64>) -> Marker {
        Marker {
            id: "m1".to_string(),
            title: "HQ".to_string(),
            description: String::new(),
            latitude: lat,
            longitude: lng,
            address: String::new(),
            street: String::new(),
            city: String::new(),
            state: String::new(),
            postal_code: String::new(),
            country: String::new(),
            custom_icon: None,
            raw_data: json!({}),
        }
    }

    #[test]
    fn coordinates_require_both_halves() {
        assert_eq!(marker_at(Some(1.0), Some(2.0)).coordinates(), Some((1.0, 2.0)));
        assert_eq!(marker_at(Some(1.0), None).coordinates(), None);
        assert_eq!(marker_at(None, Some(2.0)).coordinates(), None);
        assert_eq!(marker_at(None, None).coordinates(), None);
    }

    #[test]
    fn zero_is_a_valid_coordinate() {
        assert_eq!(marker_at(Some(0.0), Some(0.0)).coordinates(), Some((0.0, 0.0)));
    }

    #[test]
    fn join_skips_empty_parts() {
        assert_eq!(
            join_address_parts(["1 Main St", "", "CA", "", "USA"]),
            "1 Main St, CA, USA"
        );
        assert_eq!(join_address_parts(["", "", "", "", ""]), "");
    }

    #[test]
    fn raw_field_stringifies_non_strings() {
        let mut m = marker_at(None, None);
        m.raw_data = json!({"Phone": "555-1234", "Employees": 42, "Active": true});
        assert_eq!(m.raw_field("Phone"), Some("555-1234".to_string()));
        assert_eq!(m.raw_field("Employees"), Some("42".to_string()));
        assert_eq!(m.raw_field("Active"), Some("true".to_string()));
        assert_eq!(m.raw_field("Missing"), None);
    }
}
