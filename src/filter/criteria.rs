use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::classify::{ConfirmationState, MunicipalityStatus};
use crate::config::load_settings;

/// Snapshot of every filter control at the moment filtering runs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub statuses: StatusToggles,
    pub population: PopulationRange,
    /// Per incident type toggle, keyed by lowercased type. Types without an
    /// entry are shown.
    pub incident_types: BTreeMap<String, bool>,
    pub confirmation: ConfirmationToggles,
    pub show_parks: bool,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            statuses: StatusToggles::default(),
            population: PopulationRange::default(),
            incident_types: BTreeMap::new(),
            confirmation: ConfirmationToggles::default(),
            show_parks: true,
        }
    }
}

impl FilterCriteria {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        load_settings(path)
    }

    pub fn status_enabled(&self, status: MunicipalityStatus) -> bool {
        match status {
            MunicipalityStatus::City => self.statuses.city,
            MunicipalityStatus::Town => self.statuses.town,
            MunicipalityStatus::Rm => self.statuses.rm,
        }
    }

    pub fn confirmation_enabled(&self, state: ConfirmationState) -> bool {
        match state {
            ConfirmationState::Confirmed => self.confirmation.confirmed,
            ConfirmationState::Suspected => self.confirmation.suspected,
        }
    }

    pub fn incident_type_enabled(&self, key: &str) -> bool {
        self.incident_types
            .iter()
            .find(|(toggle, _)| toggle.eq_ignore_ascii_case(key))
            .is_none_or(|(_, enabled)| *enabled)
    }

    pub fn with_incident_type(mut self, key: &str, enabled: bool) -> Self {
        self.incident_types.insert(key.to_lowercase(), enabled);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusToggles {
    pub city: bool,
    pub town: bool,
    pub rm: bool,
}

impl Default for StatusToggles {
    fn default() -> Self {
        Self {
            city: true,
            town: true,
            rm: true,
        }
    }
}

/// Inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PopulationRange {
    pub min: u64,
    pub max: u64,
}

impl Default for PopulationRange {
    fn default() -> Self {
        Self {
            min: 0,
            max: u64::MAX,
        }
    }
}

impl PopulationRange {
    pub fn contains(&self, population: u64) -> bool {
        self.min <= population && population <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfirmationToggles {
    pub confirmed: bool,
    pub suspected: bool,
}

impl Default for ConfirmationToggles {
    fn default() -> Self {
        Self {
            confirmed: true,
            suspected: true,
        }
    }
}
