//! Search and per-field filtering over the canonical marker set
//!
//! Filtering is pure and idempotent: the same `FilterState` applied to the
//! same marker set always yields the same visible subset, in input order.
//! Filters subtract, never reorder.

use crate::marker::Marker;
use std::collections::BTreeMap;

/// The operator-controlled filter inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Free-text search matched against title, description, and address.
    pub search_term: String,
    /// Per-field filter values keyed by raw-data field name. Empty values
    /// are inert.
    pub field_values: BTreeMap<String, String>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.field_values.insert(field.into(), value.into());
        self
    }

    /// True when neither search nor any field filter is set.
    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty() && self.field_values.values().all(String::is_empty)
    }
}

/// Compute the visible subset: search filter first (OR across title,
/// description, address), then each non-empty field filter (AND across
/// fields) against stringified `raw_data` values.
pub fn apply(markers: &[Marker], state: &FilterState) -> Vec<Marker> {
    markers
        .iter()
        .filter(|m| matches_search(m, &state.search_term))
        .filter(|m| matches_fields(m, &state.field_values))
        .cloned()
        .collect()
}

fn matches_search(marker: &Marker, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let term = term.to_lowercase();
    marker.title.to_lowercase().contains(&term)
        || marker.description.to_lowercase().contains(&term)
        || marker.address.to_lowercase().contains(&term)
}

fn matches_fields(marker: &Marker, field_values: &BTreeMap<String, String>) -> bool {
    field_values
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .all(|(field, value)| {
            marker
                .raw_field(field)
                .is_some_and(|v| v.to_lowercase().contains(&value.to_lowercase()))
        })
}
