use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Municipal status after normalization. Unrecognized statuses have no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MunicipalityStatus {
    City,
    Town,
    Rm,
}

impl MunicipalityStatus {
    /// `"rm"` or anything mentioning "rural" is a rural municipality.
    pub fn classify(raw: &str) -> Option<Self> {
        let status = raw.trim().to_lowercase();
        if status == "rm" || status.contains("rural") {
            Some(MunicipalityStatus::Rm)
        } else if status == "city" {
            Some(MunicipalityStatus::City)
        } else if status == "town" {
            Some(MunicipalityStatus::Town)
        } else {
            None
        }
    }

    pub fn label_prefix(&self) -> &'static str {
        match self {
            MunicipalityStatus::City => "City of",
            MunicipalityStatus::Town => "Town of",
            MunicipalityStatus::Rm => "RM of",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MunicipalityStatus::City => "City",
            MunicipalityStatus::Town => "Town",
            MunicipalityStatus::Rm => "RM",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            MunicipalityStatus::City => "#3b82f6",
            MunicipalityStatus::Town => "#10b981",
            MunicipalityStatus::Rm => "#64748b",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationState {
    Confirmed,
    Suspected,
}

impl ConfirmationState {
    pub fn label(&self) -> &'static str {
        match self {
            ConfirmationState::Confirmed => "confirmed",
            ConfirmationState::Suspected => "suspected",
        }
    }
}

impl FromStr for ConfirmationState {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "confirmed" => Ok(ConfirmationState::Confirmed),
            "suspected" => Ok(ConfirmationState::Suspected),
            _ => Err(format!("invalid confirmation state: {value}")),
        }
    }
}
