pub mod aggregate;
pub mod cache;
pub mod dataset;
pub mod filter;
pub mod score;
pub mod summary;

use aggregate::{aggregate, AgentAggregate, AggregatePolicy};
use dataset::{Dataset, DatasetError};
use filter::{FilterCriteria, FilterOutcome, MalformedRange};
use score::{score, ScoreRow, ScoringStrategy};
use serde::Serialize;
use summary::KpiSummary;

/// Everything the presentation layer needs for one render: headline KPIs,
/// per-agent aggregates, and the ranked scores. Rebuilt in full on every
/// filter change; nothing is mutated in place.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub kpis: KpiSummary,
    pub aggregates: Vec<AgentAggregate>,
    pub ranking: Vec<ScoreRow>,
    /// Set when malformed filter criteria forced the unfiltered fallback.
    pub filter_fallback: bool,
    pub record_count: usize,
}

impl DashboardReport {
    /// Run filter, aggregation, scoring, and KPI summarization over a loaded
    /// dataset. An empty source dataset is terminal for the render cycle and
    /// comes back as `DatasetError::EmptySource`; an empty *filtered* view is
    /// fine and yields empty tables.
    pub fn build(
        dataset: &Dataset,
        criteria: Result<FilterCriteria, MalformedRange>,
        policy: &AggregatePolicy,
        strategy: ScoringStrategy,
    ) -> Result<Self, DatasetError> {
        if dataset.is_empty() {
            return Err(DatasetError::EmptySource);
        }

        let FilterOutcome { records, fallback } = filter::filter_or_fallback(dataset, criteria);

        let aggregates = aggregate(&records, policy);
        let ranking = score(&aggregates, strategy);
        let kpis = KpiSummary::from_records(&records);

        Ok(Self {
            kpis,
            aggregates,
            ranking,
            filter_fallback: fallback,
            record_count: records.len(),
        })
    }

    /// Top of the ranking, if any agent survived the filter.
    pub fn best_agent(&self) -> Option<&ScoreRow> {
        self.ranking.first()
    }
}
