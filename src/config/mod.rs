use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::classify::ConfirmationState;
use crate::geometry::DEFAULT_PADDING_DEGREES;

pub const DEFAULT_SEARCH_RESULT_LIMIT: usize = 12;

/// Load any settings file the `config` crate understands (YAML, JSON, TOML)
/// into `T`.
pub fn load_settings<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let settings = ::config::Config::builder()
        .add_source(::config::File::from(path))
        .build()?;
    Ok(settings.try_deserialize()?)
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DashboardConfig {
    #[serde(default)]
    pub incident_types: IncidentTaxonomy,
    #[serde(default = "default_padding")]
    pub camera_padding_degrees: f64,
    #[serde(default = "default_search_result_limit")]
    pub search_result_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            incident_types: IncidentTaxonomy::default(),
            camera_padding_degrees: DEFAULT_PADDING_DEGREES,
            search_result_limit: DEFAULT_SEARCH_RESULT_LIMIT,
        }
    }
}

impl DashboardConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: Self = load_settings(path)?;
        if config.incident_types.is_empty() {
            anyhow::bail!("Config: incident_types must list at least one incident type");
        }
        Ok(config)
    }
}

fn default_padding() -> f64 {
    DEFAULT_PADDING_DEGREES
}

fn default_search_result_limit() -> usize {
    DEFAULT_SEARCH_RESULT_LIMIT
}

/// Display and filter metadata for one incident type.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IncidentTypeSpec {
    /// Lowercased type string as it appears in incident records.
    pub key: String,
    pub label: String,
    pub icon: String,
    pub confirmed_color: String,
    pub suspected_color: String,
}

impl IncidentTypeSpec {
    fn new(key: &str, label: &str, confirmed_color: &str, suspected_color: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            icon: key.replace(' ', "_"),
            confirmed_color: confirmed_color.to_string(),
            suspected_color: suspected_color.to_string(),
        }
    }

    /// Confirmed reports get the saturated colour, everything else the pale one.
    pub fn color_for(&self, confirmation: Option<ConfirmationState>) -> &str {
        match confirmation {
            Some(ConfirmationState::Confirmed) => &self.confirmed_color,
            _ => &self.suspected_color,
        }
    }
}

/// The ordered set of incident types the dashboard knows about.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(transparent)]
pub struct IncidentTaxonomy(Vec<IncidentTypeSpec>);

impl Default for IncidentTaxonomy {
    fn default() -> Self {
        Self(vec![
            IncidentTypeSpec::new("flood", "Flood", "#2c7fb8", "#7fcdbb"),
            IncidentTypeSpec::new("drought", "Drought", "#d4a373", "#e6c9a8"),
            IncidentTypeSpec::new("algal bloom", "Algal Bloom", "#32cd32", "#90ee90"),
            IncidentTypeSpec::new("contaminated water", "Contaminated Water", "#8b4513", "#cd853f"),
            IncidentTypeSpec::new(
                "hydroelectric disruption",
                "Hydroelectric Disruption",
                "#ffd700",
                "#ffec8b",
            ),
            IncidentTypeSpec::new("invasive species", "Invasive Species", "#ff6347", "#ff7f50"),
            IncidentTypeSpec::new(
                "declining fish population",
                "Declining Fish Population",
                "#4169e1",
                "#87ceeb",
            ),
        ])
    }
}

impl IncidentTaxonomy {
    pub fn get(&self, key: &str) -> Option<&IncidentTypeSpec> {
        self.0.iter().find(|spec| spec.key.eq_ignore_ascii_case(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IncidentTypeSpec> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
