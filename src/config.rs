//! Configuration surface consumed by the engine
//!
//! Mirrors the host's design-time attributes. Everything arrives as a JSON
//! blob from the hosting environment, so the whole surface derives serde
//! with camelCase keys and per-field defaults. Parse failures of optional
//! JSON sub-blobs (filter fields, header buttons, popup fields) degrade to
//! empty collections rather than erroring.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which map renderer variant to construct. Chosen once, never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Host-provided, declaratively configured map widget.
    #[default]
    Managed,
    /// Self-hosted tile map under direct programmatic control.
    Tile,
}

/// Where marker records come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Operator-entered JSON.
    Manual,
    /// JSON bound to a host variable.
    Variable,
    /// Backend query through a [`crate::storage::RecordSource`].
    #[default]
    Query,
}

/// Marker visual variant on the tile map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerKind {
    /// Generated teardrop pin colored by fill/stroke config.
    #[default]
    Default,
    /// Parametrized circle (radius, fill, stroke).
    Circle,
    /// Inline vector markup, scaled; built-in fallback when absent.
    CustomIcon,
}

/// Drawing toolbar placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolbarPosition {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Marker list panel visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListVisibility {
    Visible,
    Hidden,
    /// Show only when more than one marker is visible.
    #[default]
    Auto,
}

/// Field-name mapping from source records to canonical marker fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldMapping {
    pub title_field: Option<String>,
    pub description_field: Option<String>,
    pub address_field: Option<String>,
    pub latitude_field: Option<String>,
    pub longitude_field: Option<String>,
    pub street_field: Option<String>,
    pub city_field: Option<String>,
    pub state_field: Option<String>,
    pub postal_code_field: Option<String>,
    pub country_field: Option<String>,
    pub record_id_field: Option<String>,
    pub custom_icon_field: Option<String>,
}

/// Marker style attributes shared by the renderer and the draw tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkerStyle {
    pub marker_type: MarkerKind,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub stroke_color: String,
    pub stroke_width: f64,
    pub radius: f64,
    pub scale: f64,
    pub custom_icon_svg: Option<String>,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            marker_type: MarkerKind::Default,
            fill_color: "#EA4335".to_string(),
            fill_opacity: 0.7,
            stroke_color: "#C62828".to_string(),
            stroke_width: 2.0,
            radius: 10.0,
            scale: 1.0,
            custom_icon_svg: None,
        }
    }
}

/// Clustering options (tile map only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterConfig {
    pub enabled: bool,
    pub show_coverage_on_hover: bool,
    pub max_cluster_radius: u32,
    pub disable_clustering_at_zoom: Option<u8>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            show_coverage_on_hover: false,
            max_cluster_radius: 80,
            disable_clustering_at_zoom: None,
        }
    }
}

/// Drawing options (tile map only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DrawConfig {
    pub enabled: bool,
    pub tool_marker: bool,
    pub tool_line: bool,
    pub tool_polygon: bool,
    pub tool_circle: bool,
    pub tool_edit: bool,
    pub tool_delete: bool,
    pub toolbar_position: ToolbarPosition,
    /// Persist the interchange document through the document store.
    pub save_document: bool,
    /// Persist automatically after the quiet period instead of on demand.
    pub auto_save: bool,
    pub linked_entity_id: Option<String>,
    pub existing_document_id: Option<String>,
    pub document_title: String,
    /// Document to preload into the editable shape layer.
    pub preload_document_id: Option<String>,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            tool_marker: false,
            tool_line: false,
            tool_polygon: false,
            tool_circle: false,
            tool_edit: false,
            tool_delete: false,
            toolbar_position: ToolbarPosition::default(),
            save_document: false,
            auto_save: false,
            linked_entity_id: None,
            existing_document_id: None,
            document_title: "Map Drawing Document".to_string(),
            preload_document_id: None,
        }
    }
}

/// Explicit map center, when not left to fit-bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CenterConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    /// Render the configured center as its own pin.
    pub display_as_marker: bool,
}

impl CenterConfig {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }

    pub fn has_address(&self) -> bool {
        self.city.is_some() || self.country.is_some()
    }
}

/// One operator-defined header button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderButton {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub variant: Option<String>,
}

/// One operator-defined filter field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterField {
    pub field_name: String,
    pub label: String,
    #[serde(default)]
    pub field_type: Option<String>,
}

/// The full configuration surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapConfig {
    pub engine: EngineKind,
    pub source: SourceKind,

    // Query source
    pub object_name: Option<String>,
    pub query_filter: Option<String>,
    pub record_limit: Option<u32>,
    pub field_mapping: FieldMapping,

    // Manual/variable source
    pub markers_json: Option<String>,

    pub center: CenterConfig,
    pub zoom_level: Option<u8>,
    pub marker_style: MarkerStyle,
    pub clustering: ClusterConfig,
    pub drawing: DrawConfig,

    pub list_visibility: ListVisibility,
    pub searchable: bool,
    pub show_filters: bool,
    /// JSON array of [`FilterField`]s.
    pub filter_fields_json: Option<String>,
    /// JSON array of [`HeaderButton`]s.
    pub header_buttons_json: Option<String>,

    pub enable_popups: bool,
    /// JSON array of raw-data field API names shown in the popup.
    pub popup_fields_json: Option<String>,
    pub phone_field: Option<String>,

    pub enable_marker_drag: bool,
    pub tile_url: Option<String>,
    pub tile_attribution: Option<String>,

    /// Inline GeoJSON for the read-only overlay layer; wins over the
    /// document id when both are set.
    pub overlay_geojson: Option<String>,
    /// Stored document to render as the read-only overlay layer.
    pub overlay_document_id: Option<String>,
}

impl MapConfig {
    /// Header buttons parsed from config; invalid JSON yields none.
    pub fn header_buttons(&self) -> Vec<HeaderButton> {
        parse_json_list(self.header_buttons_json.as_deref())
    }

    /// Filter field definitions parsed from config; invalid JSON yields none.
    pub fn filter_fields(&self) -> Vec<FilterField> {
        parse_json_list(self.filter_fields_json.as_deref())
    }

    /// Popup field API names parsed from config; invalid JSON yields none.
    pub fn popup_fields(&self) -> Vec<String> {
        parse_json_list(self.popup_fields_json.as_deref())
    }

    pub fn zoom(&self) -> u8 {
        self.zoom_level.unwrap_or(10)
    }
}

fn parse_json_list<T: serde::de::DeserializeOwned>(json: Option<&str>) -> Vec<T> {
    let Some(json) = json else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<T>>(json) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring malformed configuration list");
            Vec::new()
        }
    }
}

/// Convert a raw-data field API name into a readable label
/// (e.g. `BillingCity__c` → `Billing City`).
pub fn format_field_label(field_name: &str) -> String {
    let trimmed = field_name
        .strip_suffix("__c")
        .or_else(|| field_name.strip_suffix("__C"))
        .unwrap_or(field_name);

    let mut label = String::with_capacity(trimmed.len() + 4);
    for (i, ch) in trimmed.chars().enumerate() {
        if ch.is_uppercase() && i > 0 && !label.ends_with(' ') {
            label.push(' ');
        }
        if i == 0 {
            label.extend(ch.to_uppercase());
        } else {
            label.push(ch);
        }
    }
    label.trim().to_string()
}

/// Raw-data field value projected for popup display.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupField {
    pub label: String,
    pub value: String,
}

impl MapConfig {
    /// Project the configured popup fields out of a marker's raw data,
    /// keeping only fields with non-empty values.
    pub fn popup_fields_for(&self, marker: &crate::marker::Marker) -> Vec<PopupField> {
        self.popup_fields()
            .iter()
            .filter_map(|name| {
                marker.raw_field(name).filter(|v| !v.is_empty()).map(|value| PopupField {
                    label: format_field_label(name),
                    value,
                })
            })
            .collect()
    }

    /// Phone number for the popup call action: the configured field first,
    /// then the common aliases.
    pub fn phone_number_for(&self, marker: &crate::marker::Marker) -> Option<String> {
        if let Some(field) = &self.phone_field {
            return marker.raw_field(field);
        }
        ["Phone", "phone", "MobilePhone", "HomePhone"]
            .iter()
            .find_map(|f| marker.raw_field(f))
    }
}

impl MapConfig {
    /// Parse a full configuration blob. Unlike the optional sub-blobs this
    /// is the component's identity; malformed input is an error.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
