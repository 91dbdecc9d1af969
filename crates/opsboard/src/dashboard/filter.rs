use super::dataset::{Dataset, MetricRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// Which values of a categorical dimension to keep. `All` is resolved against
/// the distinct values of the unfiltered dataset, so it behaves as "no
/// restriction" no matter what was selected before.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl Selection {
    fn resolve(&self, observed: &BTreeSet<String>) -> BTreeSet<String> {
        match self {
            Selection::All => observed.clone(),
            Selection::Only(chosen) => chosen.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    #[serde(default)]
    pub agents: Selection,
    #[serde(default)]
    pub zones: Selection,
}

impl FilterCriteria {
    /// Criteria spanning the whole dataset with no categorical restriction.
    /// Used as the fallback when a submitted range is degenerate.
    pub fn unrestricted(dataset: &Dataset) -> Option<Self> {
        let (date_start, date_end) = dataset.date_bounds()?;
        Some(Self {
            date_start,
            date_end,
            agents: Selection::All,
            zones: Selection::All,
        })
    }

    /// Build criteria from raw date strings as submitted by a client. A range
    /// where either end fails to parse is reported as malformed so the caller
    /// can fall back to the unfiltered dataset.
    pub fn from_raw_range(
        start: &str,
        end: &str,
        agents: Selection,
        zones: Selection,
    ) -> Result<Self, MalformedRange> {
        let date_start = parse_day(start).ok_or_else(|| MalformedRange {
            raw: start.to_string(),
        })?;
        let date_end = parse_day(end).ok_or_else(|| MalformedRange {
            raw: end.to_string(),
        })?;
        Ok(Self {
            date_start,
            date_end,
            agents,
            zones,
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unparseable date '{raw}' in filter range")]
pub struct MalformedRange {
    pub raw: String,
}

/// Result of a filter pass. `fallback` is set when malformed criteria forced
/// the engine to return the unfiltered dataset, so the presentation layer can
/// tell the user instead of silently showing different data.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub records: Vec<MetricRecord>,
    pub fallback: bool,
}

/// Pure filter over the loaded dataset. An inverted date range yields an
/// empty result; selections are resolved against the unfiltered dataset's
/// observed values.
pub fn filter(dataset: &Dataset, criteria: &FilterCriteria) -> FilterOutcome {
    let agents = criteria.agents.resolve(&dataset.agents());
    let zones = criteria.zones.resolve(&dataset.zones());

    let records = dataset
        .records()
        .iter()
        .filter(|record| {
            record.date >= criteria.date_start
                && record.date <= criteria.date_end
                && agents.contains(&record.agent)
                && zones.contains(&record.zone)
        })
        .cloned()
        .collect();

    FilterOutcome {
        records,
        fallback: false,
    }
}

/// Filter with the recovery policy applied: malformed criteria fall back to
/// the full dataset, flagged and logged rather than failing the pipeline.
pub fn filter_or_fallback(
    dataset: &Dataset,
    criteria: Result<FilterCriteria, MalformedRange>,
) -> FilterOutcome {
    match criteria {
        Ok(criteria) => filter(dataset, &criteria),
        Err(err) => {
            warn!(%err, "filter criteria malformed, serving unfiltered dataset");
            FilterOutcome {
                records: dataset.records().to_vec(),
                fallback: true,
            }
        }
    }
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}
