//! Per-category filtering against a [`FilterCriteria`] snapshot.
//!
//! Every filter is stable: matches come back in source order.

mod criteria;

pub use criteria::{ConfirmationToggles, FilterCriteria, PopulationRange, StatusToggles};

use crate::classify::{Dataset, Incident, Municipality, Park};
use crate::config::IncidentTaxonomy;

pub fn municipality_matches(municipality: &Municipality, criteria: &FilterCriteria) -> bool {
    municipality
        .status
        .is_some_and(|status| criteria.status_enabled(status))
        && criteria.population.contains(municipality.population)
}

/// Confirmation is a hard gate: an incident with no recognized confirmation
/// state, or whose state is switched off, never passes on its type alone.
pub fn incident_matches(
    incident: &Incident,
    criteria: &FilterCriteria,
    taxonomy: &IncidentTaxonomy,
) -> bool {
    incident
        .confirmation
        .is_some_and(|state| criteria.confirmation_enabled(state))
        && taxonomy.contains(&incident.kind)
        && criteria.incident_type_enabled(&incident.kind)
}

pub fn filter_municipalities<'a>(
    municipalities: &'a [Municipality],
    criteria: &FilterCriteria,
) -> Vec<&'a Municipality> {
    municipalities
        .iter()
        .filter(|m| municipality_matches(m, criteria))
        .collect()
}

pub fn filter_incidents<'a>(
    incidents: &'a [Incident],
    criteria: &FilterCriteria,
    taxonomy: &IncidentTaxonomy,
) -> Vec<&'a Incident> {
    incidents
        .iter()
        .filter(|i| incident_matches(i, criteria, taxonomy))
        .collect()
}

pub fn filter_parks<'a>(parks: &'a [Park], criteria: &FilterCriteria) -> Vec<&'a Park> {
    if criteria.show_parks {
        parks.iter().collect()
    } else {
        Vec::new()
    }
}

/// The three filtered subsets of one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView<'a> {
    pub municipalities: Vec<&'a Municipality>,
    pub incidents: Vec<&'a Incident>,
    pub parks: Vec<&'a Park>,
}

impl<'a> FilteredView<'a> {
    pub fn apply(
        dataset: &'a Dataset,
        criteria: &FilterCriteria,
        taxonomy: &IncidentTaxonomy,
    ) -> Self {
        FilteredView {
            municipalities: filter_municipalities(&dataset.municipalities, criteria),
            incidents: filter_incidents(&dataset.incidents, criteria, taxonomy),
            parks: filter_parks(&dataset.parks, criteria),
        }
    }
}
