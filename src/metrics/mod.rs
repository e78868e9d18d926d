//! Summary counters, recomputed from scratch on every call.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::classify::{ConfirmationState, Dataset, Incident};
use crate::config::IncidentTaxonomy;
use crate::filter::{FilterCriteria, FilteredView};

/// Number of incidents listed as samples in a [`DataSummary`].
pub const SUMMARY_SAMPLE_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub key: String,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub municipality_count: usize,
    pub total_population: u64,
    /// One entry per configured type, in taxonomy order.
    pub incidents_by_type: Vec<TypeCount>,
    /// Size of the whole incident collection, ignoring filters.
    pub total_incidents: usize,
    /// Incidents whose type is not in the taxonomy, ignoring filters.
    pub uncategorized_incidents: usize,
}

impl Metrics {
    pub fn compute(
        dataset: &Dataset,
        criteria: &FilterCriteria,
        taxonomy: &IncidentTaxonomy,
    ) -> Self {
        let view = FilteredView::apply(dataset, criteria, taxonomy);
        Self::from_view(&view, dataset, taxonomy)
    }

    /// Counters for an already filtered view of `dataset`.
    pub fn from_view(view: &FilteredView<'_>, dataset: &Dataset, taxonomy: &IncidentTaxonomy) -> Self {
        let incidents_by_type = taxonomy
            .iter()
            .map(|spec| TypeCount {
                key: spec.key.clone(),
                label: spec.label.clone(),
                count: view
                    .incidents
                    .iter()
                    .filter(|i| spec.key.eq_ignore_ascii_case(&i.kind))
                    .count(),
            })
            .collect();

        Metrics {
            municipality_count: view.municipalities.len(),
            total_population: view
                .municipalities
                .iter()
                .map(|m| m.population)
                .fold(0u64, u64::saturating_add),
            incidents_by_type,
            total_incidents: dataset.incidents.len(),
            uncategorized_incidents: dataset
                .incidents
                .iter()
                .filter(|i| !taxonomy.contains(&i.kind))
                .count(),
        }
    }

    pub fn visible_incidents(&self) -> usize {
        self.incidents_by_type.iter().map(|t| t.count).sum()
    }

    pub fn count_for(&self, key: &str) -> Option<usize> {
        self.incidents_by_type
            .iter()
            .find(|t| t.key.eq_ignore_ascii_case(key))
            .map(|t| t.count)
    }

    pub fn uncategorized(&self) -> usize {
        self.uncategorized_incidents
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfirmationCounts {
    pub confirmed: usize,
    pub suspected: usize,
    pub unresolved: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncidentSample {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: Option<ConfirmationState>,
    pub started_at: Option<String>,
}

/// Unfiltered overview of the incident collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSummary {
    pub total: usize,
    /// Every configured type (possibly zero) plus any unknown type seen.
    pub by_type: BTreeMap<String, usize>,
    pub by_confirmation: ConfirmationCounts,
    pub samples: Vec<IncidentSample>,
}

impl DataSummary {
    pub fn compute(incidents: &[Incident], taxonomy: &IncidentTaxonomy) -> Self {
        let mut by_type: BTreeMap<String, usize> =
            taxonomy.iter().map(|spec| (spec.key.clone(), 0)).collect();
        let mut by_confirmation = ConfirmationCounts::default();

        for incident in incidents {
            if !incident.kind.is_empty() {
                let key = taxonomy
                    .get(&incident.kind)
                    .map_or(incident.kind.as_str(), |spec| spec.key.as_str());
                *by_type.entry(key.to_string()).or_default() += 1;
            }
            match incident.confirmation {
                Some(ConfirmationState::Confirmed) => by_confirmation.confirmed += 1,
                Some(ConfirmationState::Suspected) => by_confirmation.suspected += 1,
                None => by_confirmation.unresolved += 1,
            }
        }

        let samples = incidents
            .iter()
            .take(SUMMARY_SAMPLE_SIZE)
            .map(|i| IncidentSample {
                name: i.name.clone(),
                kind: i.kind.clone(),
                status: i.confirmation,
                started_at: i.started_at.clone(),
            })
            .collect();

        DataSummary {
            total: incidents.len(),
            by_type,
            by_confirmation,
            samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Category, Feature, Municipality};
    use serde_json::{Value, json};

    fn point(properties: Value, category: Category) -> Feature {
        Feature::from_json(
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [-97.1, 49.85] },
                "properties": properties
            }),
            category,
        )
        .unwrap()
    }

    fn dataset() -> Dataset {
        let municipalities = [("Winnipeg", "city", 749_607), ("Selkirk", "city", 10_504), ("Gimli", "town", 2_317)]
            .into_iter()
            .map(|(name, status, population)| {
                Municipality::from_feature(point(
                    json!({ "name": name, "status": status, "population_2021": population }),
                    Category::Municipality,
                ))
            })
            .collect();
        let incidents = [
            ("a", "flood", "confirmed"),
            ("b", "flood", "suspected"),
            ("c", "drought", "confirmed"),
            ("d", "wildfire", "confirmed"),
            ("e", "algal bloom", ""),
            ("f", "flood", "confirmed"),
        ]
        .into_iter()
        .map(|(name, kind, status)| {
            Incident::from_feature(point(
                json!({ "name": name, "type": kind, "status": status }),
                Category::Incident,
            ))
        })
        .collect();

        Dataset {
            municipalities,
            incidents,
            parks: Vec::new(),
        }
    }

    #[test]
    fn counts_filtered_municipalities_and_population() {
        let data = dataset();
        let mut criteria = FilterCriteria::default();
        criteria.statuses.town = false;

        let metrics = Metrics::compute(&data, &criteria, &IncidentTaxonomy::default());
        assert_eq!(metrics.municipality_count, 2);
        assert_eq!(metrics.total_population, 760_111);
    }

    #[test]
    fn counts_incidents_per_configured_type() {
        let data = dataset();
        let taxonomy = IncidentTaxonomy::default();
        let mut criteria = FilterCriteria::default();
        criteria.confirmation.suspected = false;

        let metrics = Metrics::compute(&data, &criteria, &taxonomy);
        assert_eq!(metrics.incidents_by_type.len(), taxonomy.len());
        assert_eq!(metrics.count_for("flood"), Some(2));
        assert_eq!(metrics.count_for("drought"), Some(1));
        assert_eq!(metrics.count_for("algal bloom"), Some(0));
        assert_eq!(metrics.count_for("wildfire"), None);
        assert_eq!(metrics.visible_incidents(), 3);
    }

    #[test]
    fn total_ignores_filters_and_exposes_unknown_types() {
        let data = dataset();
        let mut criteria = FilterCriteria::default();
        criteria.confirmation.confirmed = false;
        criteria.confirmation.suspected = false;

        let metrics = Metrics::compute(&data, &criteria, &IncidentTaxonomy::default());
        assert_eq!(metrics.visible_incidents(), 0);
        assert_eq!(metrics.total_incidents, 6);
        assert_eq!(metrics.uncategorized(), 1);
    }

    #[test]
    fn recomputation_is_stable() {
        let data = dataset();
        let criteria = FilterCriteria::default();
        let taxonomy = IncidentTaxonomy::default();
        assert_eq!(
            Metrics::compute(&data, &criteria, &taxonomy),
            Metrics::compute(&data, &criteria, &taxonomy)
        );
    }

    #[test]
    fn summary_counts_everything_unfiltered() {
        let data = dataset();
        let summary = DataSummary::compute(&data.incidents, &IncidentTaxonomy::default());

        assert_eq!(summary.total, 6);
        assert_eq!(summary.by_type["flood"], 3);
        assert_eq!(summary.by_type["wildfire"], 1);
        assert_eq!(summary.by_type["invasive species"], 0);
        assert_eq!(
            summary.by_confirmation,
            ConfirmationCounts {
                confirmed: 4,
                suspected: 1,
                unresolved: 1
            }
        );
        assert_eq!(summary.samples.len(), SUMMARY_SAMPLE_SIZE);
        assert_eq!(summary.samples[0].name, "a");
    }
}
