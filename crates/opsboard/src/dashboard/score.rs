use super::aggregate::AgentAggregate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The factors a weighting scheme can draw on. Complaint and delivery scores
/// are penalty inversions: fewer incidents pushes them toward 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Orders,
    Calls,
    ComplaintScore,
    DeliveryScore,
    Rating,
}

/// Historical weighting schemes. Both have shipped; neither may be silently
/// dropped in favor of the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightScheme {
    #[default]
    FiveFactor,
    FourFactor,
}

impl WeightScheme {
    /// The declared weight table. Weights always sum to 1.0; keep that
    /// invariant when editing (there is a test pinning it).
    pub fn weights(&self) -> &'static [(Factor, f64)] {
        match self {
            WeightScheme::FiveFactor => &[
                (Factor::Orders, 0.30),
                (Factor::Calls, 0.20),
                (Factor::ComplaintScore, 0.20),
                (Factor::DeliveryScore, 0.15),
                (Factor::Rating, 0.15),
            ],
            WeightScheme::FourFactor => &[
                (Factor::Orders, 0.40),
                (Factor::Calls, 0.25),
                (Factor::ComplaintScore, 0.20),
                (Factor::DeliveryScore, 0.15),
            ],
        }
    }
}

/// Two scoring formulas coexist in production: min-max normalized weighting
/// and a positive/negative ratio. Selectable per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    MinMax(WeightScheme),
    Ratio,
}

impl Default for ScoringStrategy {
    fn default() -> Self {
        Self::MinMax(WeightScheme::default())
    }
}

/// One factor's contribution to an agent's note.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreComponent {
    pub factor: Factor,
    pub normalized: f64,
    pub weight: f64,
}

/// Final per-agent score. Rebuilt from scratch on every recompute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow {
    pub agent: String,
    pub components: Vec<ScoreComponent>,
    pub note: f64,
}

/// Raw factor values for one agent before normalization.
struct FactorValues {
    agent: String,
    orders: f64,
    calls: f64,
    complaint_score: f64,
    delivery_score: f64,
    rating: f64,
}

impl FactorValues {
    fn from_aggregate(aggregate: &AgentAggregate) -> Self {
        let complaints = aggregate.complaints.unwrap_or(0.0);
        let failed = aggregate.failed_deliveries.unwrap_or(0.0);
        Self {
            agent: aggregate.agent.clone(),
            orders: aggregate.daily_orders.unwrap_or(0.0),
            calls: aggregate.call_interactions.unwrap_or(0.0),
            // Defined for every non-negative count; 0 incidents maps to 1.0.
            complaint_score: 1.0 / (1.0 + complaints),
            delivery_score: 1.0 / (1.0 + failed),
            rating: aggregate.rating.unwrap_or(0.0),
        }
    }

    fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Orders => self.orders,
            Factor::Calls => self.calls,
            Factor::ComplaintScore => self.complaint_score,
            Factor::DeliveryScore => self.delivery_score,
            Factor::Rating => self.rating,
        }
    }
}

/// Score the aggregates under the chosen strategy and rank strictly
/// descending by note, ties broken by agent id ascending so the ordering is
/// deterministic regardless of input order.
pub fn score(aggregates: &[AgentAggregate], strategy: ScoringStrategy) -> Vec<ScoreRow> {
    let mut rows = match strategy {
        ScoringStrategy::MinMax(scheme) => score_min_max(aggregates, scheme),
        ScoringStrategy::Ratio => score_ratio(aggregates),
    };

    rows.sort_by(|a, b| match b.note.total_cmp(&a.note) {
        Ordering::Equal => a.agent.cmp(&b.agent),
        other => other,
    });
    rows
}

fn score_min_max(aggregates: &[AgentAggregate], scheme: WeightScheme) -> Vec<ScoreRow> {
    let values: Vec<FactorValues> = aggregates.iter().map(FactorValues::from_aggregate).collect();
    let weights = scheme.weights();

    // One normalized column per factor, indexed like `values`.
    let columns: Vec<Vec<f64>> = weights
        .iter()
        .map(|(factor, _)| normalize_column(&values, *factor))
        .collect();

    values
        .iter()
        .enumerate()
        .map(|(idx, value)| {
            let components: Vec<ScoreComponent> = weights
                .iter()
                .zip(&columns)
                .map(|((factor, weight), column)| ScoreComponent {
                    factor: *factor,
                    normalized: column[idx],
                    weight: *weight,
                })
                .collect();

            let note = components
                .iter()
                .map(|component| component.normalized * component.weight)
                .sum::<f64>()
                * 100.0;

            ScoreRow {
                agent: value.agent.clone(),
                components,
                note: round_one(note),
            }
        })
        .collect()
}

/// Min-max rescale one factor across the current view. A zero-variance
/// column (single agent, or all agents equal) normalizes to 0 for everyone;
/// the division is never attempted.
fn normalize_column(values: &[FactorValues], factor: Factor) -> Vec<f64> {
    let raw: Vec<f64> = values.iter().map(|value| value.get(factor)).collect();
    let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if raw.is_empty() || max == min {
        return vec![0.0; raw.len()];
    }

    raw.iter().map(|value| (value - min) / (max - min)).collect()
}

const RATIO_POSITIVE: [(Factor, f64); 3] = [
    (Factor::Calls, 2.0),
    (Factor::Orders, 3.0),
    (Factor::Rating, 1.5),
];

fn score_ratio(aggregates: &[AgentAggregate]) -> Vec<ScoreRow> {
    aggregates
        .iter()
        .map(|aggregate| {
            let values = FactorValues::from_aggregate(aggregate);
            let positive: f64 = RATIO_POSITIVE
                .iter()
                .map(|(factor, weight)| values.get(*factor) * weight)
                .sum();
            let negative = aggregate.complaints.unwrap_or(0.0) * 2.0
                + aggregate.complaint_followups.unwrap_or(0.0) * 1.5
                + aggregate.failed_deliveries.unwrap_or(0.0) * 1.8;

            let note = if positive + negative == 0.0 {
                0.0
            } else {
                (positive / (positive + negative) * 100.0).clamp(0.0, 100.0)
            };

            ScoreRow {
                agent: aggregate.agent.clone(),
                components: Vec::new(),
                note: round_one(note),
            }
        })
        .collect()
}

fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
