//! Owned application state driven by the rendering layer.
//!
//! A load builds the complete next state (all three collections and the
//! search index) before anything is replaced, so a frame or a query always
//! sees one consistent snapshot.

use serde::Serialize;
use std::path::Path;
use thiserror::Error;

use crate::classify::{Dataset, Feature, Incident, LoadReport, Municipality, Park};
use crate::config::DashboardConfig;
use crate::filter::{FilterCriteria, FilteredView};
use crate::geometry::{GeometryError, LatLng, LatLngBounds};
use crate::metrics::{DataSummary, Metrics};
use crate::search::{SearchEntry, SearchIndex};
use crate::source::{DataSource, IncidentUploader, UploadError, UploadReport, validate_upload};

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Failed to load data from {source_name}: {message}")]
    Load {
        source_name: String,
        message: String,
    },
    #[error("Upload failed: {0}")]
    Upload(String),
    #[error(transparent)]
    InvalidUpload(#[from] UploadError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadStatus {
    NotLoaded,
    Loaded(LoadReport),
    Failed { message: String },
}

/// Everything the rendering layer needs for one redraw.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    pub municipalities: Vec<&'a Municipality>,
    pub incidents: Vec<&'a Incident>,
    pub parks: Vec<&'a Park>,
    pub metrics: Metrics,
}

pub struct Dashboard {
    config: DashboardConfig,
    dataset: Dataset,
    index: SearchIndex,
    status: LoadStatus,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        let index = SearchIndex::default().with_limit(config.search_result_limit);
        Self {
            config,
            dataset: Dataset::default(),
            index,
            status: LoadStatus::NotLoaded,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn search_index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Fetch and replace all collections. On failure the dashboard is left
    /// empty rather than holding on to the previous load.
    pub fn load(&mut self, source: &dyn DataSource) -> Result<LoadReport, DashboardError> {
        match source.fetch() {
            Ok(payload) => {
                let (dataset, report) = Dataset::classify(payload);
                self.replace(dataset, report);
                tracing::info!(
                    "Loaded {} municipalities, {} incidents, {} parks from {} ({} skipped)",
                    report.municipalities,
                    report.incidents,
                    report.parks,
                    source.describe(),
                    report.skipped
                );
                Ok(report)
            }
            Err(err) => {
                let message = format!("{err:#}");
                tracing::warn!("Load from {} failed: {}", source.describe(), message);
                self.replace(Dataset::default(), LoadReport::default());
                self.status = LoadStatus::Failed {
                    message: message.clone(),
                };
                Err(DashboardError::Load {
                    source_name: source.describe(),
                    message,
                })
            }
        }
    }

    fn replace(&mut self, dataset: Dataset, report: LoadReport) {
        let index = SearchIndex::build(&dataset.municipalities, &dataset.parks, &dataset.incidents)
            .with_limit(self.config.search_result_limit);
        self.dataset = dataset;
        self.index = index;
        self.status = LoadStatus::Loaded(report);
    }

    /// Validate and send an incident file, then reload everything on success.
    /// A rejected upload leaves the current state untouched.
    pub fn upload(
        &mut self,
        uploader: &dyn IncidentUploader,
        source: &dyn DataSource,
        path: &Path,
    ) -> Result<UploadReport, DashboardError> {
        let features = validate_upload(path)?;
        tracing::info!("Uploading {} features from {:?}", features, path);

        let report = uploader
            .upload(path)
            .map_err(|err| DashboardError::Upload(format!("{err:#}")))?;
        self.apply_upload(report, source)
    }

    pub fn apply_upload(
        &mut self,
        report: UploadReport,
        source: &dyn DataSource,
    ) -> Result<UploadReport, DashboardError> {
        if !report.success {
            let message = report
                .message
                .clone()
                .unwrap_or_else(|| "Upload failed".to_string());
            return Err(DashboardError::Upload(message));
        }

        tracing::info!(
            "Upload accepted: {} added, {} duplicates, {} total",
            report.added,
            report.duplicates,
            report.total
        );
        self.load(source)?;
        Ok(report)
    }

    pub fn view(&self, criteria: &FilterCriteria) -> FilteredView<'_> {
        FilteredView::apply(&self.dataset, criteria, &self.config.incident_types)
    }

    pub fn render(&self, criteria: &FilterCriteria) -> Frame<'_> {
        let view = self.view(criteria);
        let metrics = Metrics::from_view(&view, &self.dataset, &self.config.incident_types);
        Frame {
            municipalities: view.municipalities,
            incidents: view.incidents,
            parks: view.parks,
            metrics,
        }
    }

    pub fn metrics(&self, criteria: &FilterCriteria) -> Metrics {
        Metrics::compute(&self.dataset, criteria, &self.config.incident_types)
    }

    pub fn summary(&self) -> DataSummary {
        DataSummary::compute(&self.dataset.incidents, &self.config.incident_types)
    }

    pub fn search(&self, query: &str) -> Vec<&SearchEntry> {
        self.index.query(query)
    }

    /// Camera bounds for zooming to a feature.
    pub fn zoom_bounds(&self, feature: &Feature) -> Result<LatLngBounds, GeometryError> {
        Ok(feature
            .shape
            .bounding_box()?
            .padded(self.config.camera_padding_degrees))
    }

    /// Camera bounds for zooming to a bare location, such as the user's position.
    pub fn zoom_to(&self, location: LatLng) -> LatLngBounds {
        LatLngBounds::around(location, self.config.camera_padding_degrees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::BulkPayload;
    use anyhow::{Result, anyhow};
    use serde_json::{Value, json};
    use std::cell::RefCell;
    use std::sync::Arc;

    /// Serves queued payloads in order; `None` simulates a failed fetch.
    struct ScriptedSource {
        responses: RefCell<Vec<Option<Value>>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Option<Value>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: RefCell::new(responses),
            }
        }
    }

    impl DataSource for ScriptedSource {
        fn fetch(&self) -> Result<BulkPayload> {
            match self.responses.borrow_mut().pop().flatten() {
                Some(value) => Ok(serde_json::from_value(value)?),
                None => Err(anyhow!("HTTP error! status: 503")),
            }
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    struct FixedUploader(UploadReport);

    impl IncidentUploader for FixedUploader {
        fn upload(&self, _path: &Path) -> Result<UploadReport> {
            Ok(self.0.clone())
        }
    }

    fn feature(kind: &str, coordinates: Value, properties: Value) -> Value {
        json!({
            "type": "Feature",
            "geometry": { "type": kind, "coordinates": coordinates },
            "properties": properties
        })
    }

    fn first_payload() -> Value {
        json!({
            "municipalities": {
                "type": "FeatureCollection",
                "features": [
                    feature("Polygon", json!([[[-97.3, 49.8], [-97.0, 49.8], [-97.0, 50.0], [-97.3, 50.0], [-97.3, 49.8]]]),
                        json!({ "name": "Winnipeg", "status": "city", "population_2021": 749607 })),
                    feature("Point", json!([-96.99, 50.63]),
                        json!({ "name": "Gimli", "status": "town", "population_2021": 2317 }))
                ]
            },
            "incidents": [
                feature("Point", json!([-97.1, 49.85]),
                    json!({ "id": 1, "name": "Red River", "type": "flood", "status": "confirmed" })),
                feature("LineString", json!([[0.0, 0.0], [1.0, 1.0]]),
                    json!({ "id": 2, "name": "Broken", "type": "flood", "status": "confirmed" }))
            ]
        })
    }

    fn second_payload() -> Value {
        json!({
            "incidents": [
                feature("Point", json!([-98.0, 53.0]),
                    json!({ "id": 9, "name": "Cedar Lake", "type": "algal bloom", "confidence": "suspected" }))
            ],
            "parks": [
                feature("Point", json!([-95.5, 49.9]), json!({ "NAME_E": "Whiteshell" }))
            ]
        })
    }

    #[test]
    fn load_builds_collections_and_index() {
        let source = ScriptedSource::new(vec![Some(first_payload())]);
        let mut dashboard = Dashboard::new(DashboardConfig::default());
        assert_eq!(dashboard.status(), &LoadStatus::NotLoaded);

        let report = dashboard.load(&source).unwrap();
        assert_eq!(report.municipalities, 2);
        assert_eq!(report.incidents, 1);
        assert_eq!(report.parks, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(dashboard.status(), &LoadStatus::Loaded(report));
        assert_eq!(dashboard.search_index().len(), 3);
        assert_eq!(dashboard.search("red")[0].label, "Red River (Flood)");
    }

    #[test]
    fn render_returns_filtered_layers_and_metrics() {
        let source = ScriptedSource::new(vec![Some(first_payload())]);
        let mut dashboard = Dashboard::new(DashboardConfig::default());
        dashboard.load(&source).unwrap();

        let mut criteria = FilterCriteria::default();
        criteria.statuses.city = false;
        let frame = dashboard.render(&criteria);

        assert_eq!(frame.municipalities.len(), 1);
        assert_eq!(frame.municipalities[0].name, "Gimli");
        assert_eq!(frame.incidents.len(), 1);
        assert_eq!(frame.metrics.total_population, 2317);
        assert_eq!(frame.metrics.count_for("flood"), Some(1));
        assert_eq!(frame.metrics, dashboard.metrics(&criteria));
    }

    #[test]
    fn reload_replaces_everything() {
        let source = ScriptedSource::new(vec![Some(first_payload()), Some(second_payload())]);
        let mut dashboard = Dashboard::new(DashboardConfig::default());
        dashboard.load(&source).unwrap();
        let old: Vec<Arc<Feature>> = dashboard
            .search_index()
            .entries()
            .iter()
            .map(|e| Arc::clone(&e.feature))
            .collect();

        dashboard.load(&source).unwrap();
        assert!(dashboard.dataset().municipalities.is_empty());
        assert_eq!(dashboard.search_index().len(), 2);
        assert!(dashboard.search("winnipeg").is_empty());
        for entry in dashboard.search_index().entries() {
            assert!(old.iter().all(|f| !Arc::ptr_eq(f, &entry.feature)));
        }
    }

    #[test]
    fn failed_load_clears_previous_state() {
        let source = ScriptedSource::new(vec![Some(first_payload()), None]);
        let mut dashboard = Dashboard::new(DashboardConfig::default());
        dashboard.load(&source).unwrap();

        let err = dashboard.load(&source).unwrap_err();
        assert!(matches!(err, DashboardError::Load { .. }));
        assert!(matches!(dashboard.status(), LoadStatus::Failed { .. }));
        assert_eq!(dashboard.dataset(), &Dataset::default());
        assert!(dashboard.search_index().is_empty());
        assert_eq!(dashboard.metrics(&FilterCriteria::default()).total_incidents, 0);
    }

    #[test]
    fn rejected_upload_keeps_state() {
        let source = ScriptedSource::new(vec![Some(first_payload())]);
        let mut dashboard = Dashboard::new(DashboardConfig::default());
        dashboard.load(&source).unwrap();

        let rejected = UploadReport {
            success: false,
            message: Some("Error processing file: bad geometry".to_string()),
            ..UploadReport::default()
        };
        let err = dashboard.apply_upload(rejected, &source).unwrap_err();
        assert_eq!(err.to_string(), "Upload failed: Error processing file: bad geometry");
        assert_eq!(dashboard.dataset().incidents.len(), 1);
    }

    #[test]
    fn accepted_upload_triggers_reload() {
        let source = ScriptedSource::new(vec![Some(first_payload()), Some(second_payload())]);
        let mut dashboard = Dashboard::new(DashboardConfig::default());
        dashboard.load(&source).unwrap();

        let mut file = tempfile::NamedTempFile::with_suffix(".geojson").unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"{ "type": "FeatureCollection", "features": [] }"#,
        )
        .unwrap();

        let accepted = UploadReport {
            success: true,
            added: 1,
            duplicates: 0,
            total: 1,
            message: None,
        };
        let report = dashboard
            .upload(&FixedUploader(accepted.clone()), &source, file.path())
            .unwrap();
        assert_eq!(report, accepted);
        assert_eq!(dashboard.dataset().incidents[0].name, "Cedar Lake");
    }

    #[test]
    fn invalid_upload_file_is_rejected_before_sending() {
        let source = ScriptedSource::new(vec![]);
        let mut dashboard = Dashboard::new(DashboardConfig::default());
        let mut file = tempfile::NamedTempFile::with_suffix(".geojson").unwrap();
        std::io::Write::write_all(&mut file, b"[1, 2, 3]").unwrap();

        let uploader = FixedUploader(UploadReport {
            success: true,
            ..UploadReport::default()
        });
        let err = dashboard.upload(&uploader, &source, file.path()).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::InvalidUpload(UploadError::NotFeatureCollection)
        ));
        assert_eq!(dashboard.status(), &LoadStatus::NotLoaded);
    }

    #[test]
    fn zoom_bounds_are_padded() {
        let source = ScriptedSource::new(vec![Some(first_payload())]);
        let mut dashboard = Dashboard::new(DashboardConfig::default());
        dashboard.load(&source).unwrap();

        let winnipeg = &dashboard.dataset().municipalities[0].feature;
        let bounds = dashboard.zoom_bounds(winnipeg).unwrap().to_array();
        assert!((bounds[0][0] - 49.79).abs() < 1e-9);
        assert!((bounds[0][1] - (-97.31)).abs() < 1e-9);
        assert!((bounds[1][0] - 50.01).abs() < 1e-9);
        assert!((bounds[1][1] - (-96.99)).abs() < 1e-9);

        let here = dashboard.zoom_to(LatLng { lat: 49.0, lng: -97.0 });
        assert!((here.north_east.lat - 49.01).abs() < 1e-9);
    }
}
