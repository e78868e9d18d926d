use anyhow::Result;
use geo_types::Geometry;
use serde_json::{Map, Value};

use crate::classify::{Feature, Incident, Municipality, Park};
use crate::config::IncidentTaxonomy;
use crate::dashboard::Frame;

pub mod geojson;
pub mod geojsonl;

pub use self::geojson::GeoJsonSink;
pub use self::geojsonl::GeoJsonlSink;

#[derive(Clone, Debug)]
pub struct FeatureRow {
    pub geometry: Geometry<f64>,
    /// Attributes as delivered by the source.
    pub attributes: Map<String, Value>,
    /// Display properties; these win over an attribute with the same name.
    pub extras: Map<String, Value>,
}

impl FeatureRow {
    fn new(feature: &Feature) -> Self {
        FeatureRow {
            geometry: feature.shape.to_geometry(),
            attributes: feature.attributes.clone(),
            extras: Map::new(),
        }
    }

    fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extras.insert(key.to_string(), value.into());
        self
    }

    fn with_opt(self, key: &str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    pub fn into_properties(self) -> Map<String, Value> {
        let mut properties = self.extras;
        for (name, value) in self.attributes {
            properties.entry(name).or_insert(value);
        }
        properties
    }

    pub fn from_municipality(municipality: &Municipality) -> Self {
        FeatureRow::new(&municipality.feature)
            .with("category", municipality.feature.category.label())
            .with("label", municipality.name.as_str())
            .with_opt("color", municipality.status.map(|s| s.color()))
    }

    pub fn from_incident(incident: &Incident, taxonomy: &IncidentTaxonomy) -> Self {
        let spec = taxonomy.get(&incident.kind);
        let anchor = match incident.anchor() {
            Ok(at) => Some(vec![at.lat, at.lng]),
            Err(err) => {
                tracing::warn!("No marker anchor for incident {:?}: {}", incident.name, err);
                None
            }
        };
        FeatureRow::new(&incident.feature)
            .with("category", incident.feature.category.label())
            .with("label", incident.name.as_str())
            .with_opt("confirmation", incident.confirmation.map(|s| s.label()))
            .with_opt("color", spec.map(|s| s.color_for(incident.confirmation)))
            .with_opt("icon", spec.map(|s| s.icon.as_str()))
            .with_opt("anchor", anchor)
            .with_opt("discussion", incident.discussion_path())
    }

    pub fn from_park(park: &Park) -> Self {
        FeatureRow::new(&park.feature)
            .with("category", park.feature.category.label())
            .with("label", park.display_name.as_str())
            .with("color", Park::COLOR)
    }
}

/// Rows for every visible feature of a frame: parks first, then
/// municipalities, then incidents on top.
pub fn frame_rows(frame: &Frame<'_>, taxonomy: &IncidentTaxonomy) -> Vec<FeatureRow> {
    let parks = frame.parks.iter().map(|p| FeatureRow::from_park(p));
    let municipalities = frame
        .municipalities
        .iter()
        .map(|m| FeatureRow::from_municipality(m));
    let incidents = frame
        .incidents
        .iter()
        .map(|i| FeatureRow::from_incident(i, taxonomy));
    parks.chain(municipalities).chain(incidents).collect()
}

pub trait DataSink {
    fn add_feature(&mut self, row: FeatureRow) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

pub(crate) fn to_feature(row: FeatureRow) -> ::geojson::Feature {
    let geometry = ::geojson::Geometry::from(&row.geometry);
    ::geojson::Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(row.into_properties()),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Category;
    use serde_json::json;

    fn feature(properties: Value, category: Category) -> Feature {
        shaped(json!({ "type": "Point", "coordinates": [-97.1, 49.85] }), properties, category)
    }

    fn shaped(geometry: Value, properties: Value, category: Category) -> Feature {
        Feature::from_json(
            json!({ "type": "Feature", "geometry": geometry, "properties": properties }),
            category,
        )
        .unwrap()
    }

    fn anchor_of(row: FeatureRow) -> (f64, f64) {
        let props = row.into_properties();
        let anchor = props["anchor"].as_array().unwrap();
        (anchor[0].as_f64().unwrap(), anchor[1].as_f64().unwrap())
    }

    #[test]
    fn incident_row_carries_display_properties() {
        let incident = Incident::from_feature(feature(
            json!({ "id": 7, "name": "Red River", "type": "Flood", "status": "suspected", "label": "raw" }),
            Category::Incident,
        ));
        let props = FeatureRow::from_incident(&incident, &IncidentTaxonomy::default()).into_properties();

        assert_eq!(props["category"], "incident");
        assert_eq!(props["label"], "Red River");
        assert_eq!(props["color"], "#7fcdbb");
        assert_eq!(props["icon"], "flood");
        assert_eq!(props["discussion"], "/incident/7/discussion/");
        assert_eq!(props["confirmation"], "suspected");
        assert_eq!(props["anchor"], json!([49.85, -97.1]));
        assert_eq!(props["type"], "Flood");
    }

    #[test]
    fn polygonal_incidents_anchor_on_outer_ring_mean() {
        let taxonomy = IncidentTaxonomy::default();
        let square = json!([[[-97.0, 49.0], [-96.0, 49.0], [-96.0, 50.0], [-97.0, 50.0], [-97.0, 49.0]]]);

        let polygon = Incident::from_feature(shaped(
            json!({ "type": "Polygon", "coordinates": square.clone() }),
            json!({ "name": "Marsh", "type": "flood", "status": "confirmed" }),
            Category::Incident,
        ));
        let (lat, lng) = anchor_of(FeatureRow::from_incident(&polygon, &taxonomy));
        assert!((lat - 49.5).abs() < 1e-9);
        assert!((lng - (-96.5)).abs() < 1e-9);

        let multi = Incident::from_feature(shaped(
            json!({
                "type": "MultiPolygon",
                "coordinates": [
                    square,
                    [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]]
                ]
            }),
            json!({ "name": "Delta", "type": "drought", "status": "suspected" }),
            Category::Incident,
        ));
        let (lat, lng) = anchor_of(FeatureRow::from_incident(&multi, &taxonomy));
        assert!((lat - 49.5).abs() < 1e-9);
        assert!((lng - (-96.5)).abs() < 1e-9);
    }

    #[test]
    fn park_and_municipality_rows() {
        let park = Park::from_feature(feature(json!({ "NAME_E": "Whiteshell" }), Category::Park));
        let props = FeatureRow::from_park(&park).into_properties();
        assert_eq!(props["color"], Park::COLOR);
        assert_eq!(props["label"], "Whiteshell");

        let town = Municipality::from_feature(feature(
            json!({ "name": "Gimli", "status": "town" }),
            Category::Municipality,
        ));
        let props = FeatureRow::from_municipality(&town).into_properties();
        assert_eq!(props["category"], "municipality");
        assert_eq!(props["color"], "#10b981");
        assert!(!props.contains_key("discussion"));
    }
}
