//! Drawn shape model

use crate::config::MarkerStyle;
use crate::geo::LatLng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The four shape-producing draw tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Marker,
    Line,
    Polygon,
    Circle,
}

/// Drawing controller state. Closed set; only one non-idle state at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    Idle,
    Drawing(ShapeKind),
    Editing,
    Deleting,
}

/// Geometry of one drawn shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeGeometry {
    Point(LatLng),
    Line(Vec<LatLng>),
    /// Exterior ring; not required to repeat the first vertex.
    Polygon(Vec<LatLng>),
    Circle { center: LatLng, radius_meters: f64 },
}

impl ShapeGeometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Point(_) => ShapeKind::Marker,
            Self::Line(_) => ShapeKind::Line,
            Self::Polygon(_) => ShapeKind::Polygon,
            Self::Circle { .. } => ShapeKind::Circle,
        }
    }
}

/// Stroke/fill attributes captured from config when the tool was armed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub stroke_color: String,
    pub stroke_width: f64,
    pub fill_color: String,
    pub fill_opacity: f64,
}

impl ShapeStyle {
    pub fn from_marker_style(style: &MarkerStyle) -> Self {
        Self {
            stroke_color: style.stroke_color.clone(),
            stroke_width: style.stroke_width,
            fill_color: style.fill_color.clone(),
            fill_opacity: style.fill_opacity,
        }
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self::from_marker_style(&MarkerStyle::default())
    }
}

/// One operator-drawn shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawnShape {
    pub id: Uuid,
    pub geometry: ShapeGeometry,
    pub style: ShapeStyle,
}

impl DrawnShape {
    pub fn new(geometry: ShapeGeometry, style: ShapeStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            geometry,
            style,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_reports_its_tool_kind() {
        assert_eq!(
            ShapeGeometry::Point(LatLng::new(0.0, 0.0)).kind(),
            ShapeKind::Marker
        );
        assert_eq!(
            ShapeGeometry::Circle {
                center: LatLng::new(0.0, 0.0),
                radius_meters: 10.0
            }
            .kind(),
            ShapeKind::Circle
        );
    }

    #[test]
    fn style_captures_marker_config() {
        let style = ShapeStyle::default();
        assert_eq!(style.stroke_color, "#C62828");
        assert_eq!(style.fill_color, "#EA4335");
    }
}
