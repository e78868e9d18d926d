//! Entity classification.
//!
//! Turns the three raw collections of the bulk payload into typed records that
//! share a [`Feature`]. A record that cannot be turned into a feature is
//! dropped on its own; missing or odd attributes never drop a record, they
//! only make it fall out of the filters that need them.

mod feature;
mod status;

pub use feature::{Category, Feature, FeatureError};
pub use status::{ConfirmationState, MunicipalityStatus};

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use time::Date;
use time::macros::format_description;

use crate::geometry::{GeometryError, LatLng};
use crate::source::BulkPayload;

pub const UNKNOWN_PARK: &str = "Unknown Park";
pub const UNKNOWN_MUNICIPALITY: &str = "Unknown Municipality";
pub const UNNAMED_INCIDENT: &str = "Unnamed Incident";

#[derive(Debug, Clone, PartialEq)]
pub struct Municipality {
    pub feature: Arc<Feature>,
    pub name: String,
    /// Status as delivered, for display.
    pub raw_status: String,
    pub status: Option<MunicipalityStatus>,
    pub population: u64,
}

impl Municipality {
    pub fn from_feature(feature: Feature) -> Self {
        let raw_status = feature.text("status").unwrap_or_default().to_string();
        Municipality {
            name: feature
                .text("name")
                .unwrap_or(UNKNOWN_MUNICIPALITY)
                .to_string(),
            status: MunicipalityStatus::classify(&raw_status),
            population: feature
                .count("population_2021")
                .or_else(|| feature.count("population"))
                .unwrap_or(0),
            raw_status,
            feature: Arc::new(feature),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    pub feature: Arc<Feature>,
    pub id: Option<String>,
    pub name: String,
    /// Lowercased incident type, matched against the configured taxonomy.
    pub kind: String,
    pub confirmation: Option<ConfirmationState>,
    pub started_at: Option<String>,
    pub description: Option<String>,
}

impl Incident {
    pub fn from_feature(feature: Feature) -> Self {
        // `status` wins whenever it is present, even if it is not a state we know.
        let confirmation = feature
            .first_text(&["status", "confidence"])
            .and_then(|s| s.parse().ok());

        Incident {
            id: feature.identifier("id"),
            name: feature.text("name").unwrap_or(UNNAMED_INCIDENT).to_string(),
            kind: feature.text("type").unwrap_or_default().to_lowercase(),
            confirmation,
            started_at: feature.text("started_at").map(str::to_string),
            description: feature.text("description").map(str::to_string),
            feature: Arc::new(feature),
        }
    }

    /// Reference to the incident's discussion thread.
    pub fn discussion_path(&self) -> Option<String> {
        self.id
            .as_ref()
            .map(|id| format!("/incident/{id}/discussion/"))
    }

    /// Calendar day the incident started, ignoring any time-of-day suffix.
    pub fn started_on(&self) -> Option<Date> {
        let raw = self.started_at.as_deref()?;
        let day = raw.split('T').next()?;
        Date::parse(day, format_description!("[year]-[month]-[day]")).ok()
    }

    /// Where the incident's marker sits.
    pub fn anchor(&self) -> Result<LatLng, GeometryError> {
        self.feature.shape.centroid()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Park {
    pub feature: Arc<Feature>,
    pub display_name: String,
    pub province: Option<String>,
    pub management: Option<String>,
    pub owner: Option<String>,
    pub park_class: Option<String>,
    pub url: Option<String>,
}

impl Park {
    pub const COLOR: &'static str = "#228b22";

    pub fn from_feature(feature: Feature) -> Self {
        let text = |key: &str| feature.text(key).map(str::to_string);
        Park {
            display_name: feature
                .first_text(&["NAME_E", "name"])
                .unwrap_or(UNKNOWN_PARK)
                .to_string(),
            province: text("LOC_E"),
            management: text("MGMT_E"),
            owner: text("OWNER_E"),
            park_class: text("PRK_CLSS"),
            url: text("URL"),
            feature: Arc::new(feature),
        }
    }
}

/// One consistent snapshot of all three collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub municipalities: Vec<Municipality>,
    pub incidents: Vec<Incident>,
    pub parks: Vec<Park>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub municipalities: usize,
    pub incidents: usize,
    pub parks: usize,
    /// Records dropped because they could not be read as a displayable feature.
    pub skipped: usize,
}

impl Dataset {
    pub fn classify(payload: BulkPayload) -> (Self, LoadReport) {
        let mut skipped = 0;
        let municipalities = collect(
            payload.municipalities,
            Category::Municipality,
            &mut skipped,
            Municipality::from_feature,
        );
        let incidents = collect(
            payload.incidents,
            Category::Incident,
            &mut skipped,
            Incident::from_feature,
        );
        let parks = collect(payload.parks, Category::Park, &mut skipped, Park::from_feature);

        let report = LoadReport {
            municipalities: municipalities.len(),
            incidents: incidents.len(),
            parks: parks.len(),
            skipped,
        };
        let dataset = Dataset {
            municipalities,
            incidents,
            parks,
        };
        (dataset, report)
    }
}

fn collect<T>(
    raw: Vec<Value>,
    category: Category,
    skipped: &mut usize,
    build: fn(Feature) -> T,
) -> Vec<T> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(position, value)| match Feature::from_json(value, category) {
            Ok(feature) => Some(build(feature)),
            Err(err) => {
                tracing::warn!(
                    "Skipping {} #{}: {}",
                    category.label(),
                    position,
                    err
                );
                *skipped += 1;
                None
            }
        })
        .collect()
}
