//! The common feature shape shared by every category.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::geometry::{GeometryError, Shape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Municipality,
    Park,
    Incident,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Municipality => "municipality",
            Category::Park => "park",
            Category::Incident => "incident",
        }
    }
}

/// Why a raw record could not become a [`Feature`].
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("not a GeoJSON feature: {0}")]
    NotAFeature(#[from] geojson::Error),
    #[error("feature has no geometry")]
    MissingGeometry,
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub category: Category,
    pub shape: Shape,
    pub attributes: Map<String, Value>,
}

impl Feature {
    pub fn from_json(value: Value, category: Category) -> Result<Self, FeatureError> {
        let feature = geojson::Feature::from_json_value(value)?;
        let geometry = feature.geometry.ok_or(FeatureError::MissingGeometry)?;
        let shape = Shape::from_geojson(&geometry.value)?;

        Ok(Feature {
            category,
            shape,
            attributes: feature.properties.unwrap_or_default(),
        })
    }

    /// Trimmed, non-empty string attribute.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.attributes.get(key) {
            Some(Value::String(s)) => Some(s.trim()).filter(|s| !s.is_empty()),
            _ => None,
        }
    }

    /// First present key in `keys`, as text.
    pub fn first_text(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.text(key))
    }

    /// Identifier-like attribute: strings and integers both qualify.
    pub fn identifier(&self, key: &str) -> Option<String> {
        match self.attributes.get(key)? {
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Non-negative integer count. Accepts integral numbers, whole floats and
    /// numeric strings; anything else is `None`.
    pub fn count(&self, key: &str) -> Option<u64> {
        match self.attributes.get(key)? {
            Value::Number(n) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            }),
            Value::String(s) => s.trim().replace(',', "").parse().ok(),
            _ => None,
        }
    }
}
