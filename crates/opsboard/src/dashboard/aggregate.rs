use super::dataset::MetricRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a metric column collapses when grouping by agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnPolicy {
    Sum,
    Mean,
}

/// Declared per-column aggregation table. Deployments of this dashboard have
/// disagreed on whether ratings are summed or averaged, so the choice lives
/// in configuration instead of at the call sites; both historical behaviors
/// stay reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatePolicy {
    pub daily_orders: ColumnPolicy,
    pub interactions: ColumnPolicy,
    pub call_interactions: ColumnPolicy,
    pub complaints: ColumnPolicy,
    pub failed_deliveries: ColumnPolicy,
    pub rating: ColumnPolicy,
    pub sku_count: ColumnPolicy,
    pub complaint_followups: ColumnPolicy,
    pub sku_per_order: ColumnPolicy,
}

impl AggregatePolicy {
    /// Counts summed, rating and SKU-per-order averaged. Matches the scoring
    /// groupby of the most recent deployment.
    pub fn classic() -> Self {
        Self {
            daily_orders: ColumnPolicy::Sum,
            interactions: ColumnPolicy::Sum,
            call_interactions: ColumnPolicy::Sum,
            complaints: ColumnPolicy::Sum,
            failed_deliveries: ColumnPolicy::Sum,
            rating: ColumnPolicy::Mean,
            sku_count: ColumnPolicy::Sum,
            complaint_followups: ColumnPolicy::Sum,
            sku_per_order: ColumnPolicy::Mean,
        }
    }

    /// Variant used by deployments that summed ratings across days.
    pub fn rating_sum() -> Self {
        Self {
            rating: ColumnPolicy::Sum,
            ..Self::classic()
        }
    }
}

impl Default for AggregatePolicy {
    fn default() -> Self {
        Self::classic()
    }
}

/// Per-agent rollup of the filtered records. A `None` means the column was a
/// MEAN with no contributing values; presentation renders it as "N/A", never
/// as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentAggregate {
    pub agent: String,
    pub daily_orders: Option<f64>,
    pub interactions: Option<f64>,
    pub call_interactions: Option<f64>,
    pub complaints: Option<f64>,
    pub failed_deliveries: Option<f64>,
    pub rating: Option<f64>,
    pub sku_count: Option<f64>,
    pub complaint_followups: Option<f64>,
    pub sku_per_order: Option<f64>,
}

/// Accumulates one column: missing values contribute nothing to the sum and
/// do not count toward the mean denominator.
#[derive(Debug, Default, Clone, Copy)]
struct ColumnAcc {
    sum: f64,
    present: usize,
}

impl ColumnAcc {
    fn add(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.sum += value;
            self.present += 1;
        }
    }

    fn collapse(self, policy: ColumnPolicy) -> Option<f64> {
        match policy {
            ColumnPolicy::Sum => Some(self.sum),
            ColumnPolicy::Mean if self.present > 0 => Some(self.sum / self.present as f64),
            ColumnPolicy::Mean => None,
        }
    }
}

#[derive(Debug, Default)]
struct AgentAcc {
    daily_orders: ColumnAcc,
    interactions: ColumnAcc,
    call_interactions: ColumnAcc,
    complaints: ColumnAcc,
    failed_deliveries: ColumnAcc,
    rating: ColumnAcc,
    sku_count: ColumnAcc,
    complaint_followups: ColumnAcc,
    sku_per_order: ColumnAcc,
}

/// Group the filtered records by exact agent id. Agents with no matching
/// records are absent from the output entirely; "active agents" counts hang
/// off this cardinality. Output is ordered by agent id ascending.
pub fn aggregate(records: &[MetricRecord], policy: &AggregatePolicy) -> Vec<AgentAggregate> {
    let mut groups: BTreeMap<&str, AgentAcc> = BTreeMap::new();

    for record in records {
        let acc = groups.entry(record.agent.as_str()).or_default();
        acc.daily_orders.add(record.daily_orders);
        acc.interactions.add(record.interactions);
        acc.call_interactions.add(record.call_interactions);
        acc.complaints.add(record.complaints);
        acc.failed_deliveries.add(record.failed_deliveries);
        acc.rating.add(record.rating);
        acc.sku_count.add(record.sku_count);
        acc.complaint_followups.add(record.complaint_followups);
        acc.sku_per_order.add(record.sku_per_order);
    }

    groups
        .into_iter()
        .map(|(agent, acc)| AgentAggregate {
            agent: agent.to_string(),
            daily_orders: acc.daily_orders.collapse(policy.daily_orders),
            interactions: acc.interactions.collapse(policy.interactions),
            call_interactions: acc.call_interactions.collapse(policy.call_interactions),
            complaints: acc.complaints.collapse(policy.complaints),
            failed_deliveries: acc.failed_deliveries.collapse(policy.failed_deliveries),
            rating: acc.rating.collapse(policy.rating),
            sku_count: acc.sku_count.collapse(policy.sku_count),
            complaint_followups: acc.complaint_followups.collapse(policy.complaint_followups),
            sku_per_order: acc.sku_per_order.collapse(policy.sku_per_order),
        })
        .collect()
}
