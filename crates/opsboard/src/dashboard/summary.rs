use super::dataset::MetricRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Headline totals over the filtered records, one value per dashboard tile.
///
/// `notation_total` is the SUM of ratings, matching the KPI row of the
/// original dashboard; the per-agent aggregation can still average ratings
/// independently. The two deliberately coexist (see DESIGN.md).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total_orders: f64,
    pub total_interactions: f64,
    pub total_complaints: f64,
    pub total_failed_deliveries: f64,
    pub notation_total: f64,
    pub mean_sku_per_order: Option<f64>,
    pub total_sku: f64,
    pub total_complaint_followups: f64,
    pub active_agents: usize,
    pub active_zones: usize,
    pub mean_orders_per_agent: f64,
    pub orders_by_agent: Vec<AgentOrders>,
}

/// Per-agent order totals, the feed for the "orders by agent" chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentOrders {
    pub agent: String,
    pub orders: f64,
}

impl KpiSummary {
    pub fn from_records(records: &[MetricRecord]) -> Self {
        let mut total_orders = 0.0;
        let mut total_interactions = 0.0;
        let mut total_complaints = 0.0;
        let mut total_failed_deliveries = 0.0;
        let mut notation_total = 0.0;
        let mut sku_per_order_sum = 0.0;
        let mut sku_per_order_present = 0usize;
        let mut total_sku = 0.0;
        let mut total_complaint_followups = 0.0;

        let mut agents: BTreeSet<&str> = BTreeSet::new();
        let mut zones: BTreeSet<&str> = BTreeSet::new();
        let mut orders_per_agent: BTreeMap<&str, f64> = BTreeMap::new();

        for record in records {
            agents.insert(record.agent.as_str());
            zones.insert(record.zone.as_str());

            let orders = record.daily_orders.unwrap_or(0.0);
            total_orders += orders;
            *orders_per_agent.entry(record.agent.as_str()).or_default() += orders;

            total_interactions += record.interactions.unwrap_or(0.0);
            total_complaints += record.complaints.unwrap_or(0.0);
            total_failed_deliveries += record.failed_deliveries.unwrap_or(0.0);
            notation_total += record.rating.unwrap_or(0.0);
            total_sku += record.sku_count.unwrap_or(0.0);
            total_complaint_followups += record.complaint_followups.unwrap_or(0.0);

            if let Some(value) = record.sku_per_order {
                sku_per_order_sum += value;
                sku_per_order_present += 1;
            }
        }

        let mean_sku_per_order = if sku_per_order_present > 0 {
            Some(sku_per_order_sum / sku_per_order_present as f64)
        } else {
            None
        };

        let active_agents = agents.len();
        let mean_orders_per_agent = if active_agents > 0 {
            total_orders / active_agents as f64
        } else {
            0.0
        };

        let orders_by_agent = orders_per_agent
            .into_iter()
            .map(|(agent, orders)| AgentOrders {
                agent: agent.to_string(),
                orders,
            })
            .collect();

        Self {
            total_orders,
            total_interactions,
            total_complaints,
            total_failed_deliveries,
            notation_total,
            mean_sku_per_order,
            total_sku,
            total_complaint_followups,
            active_agents,
            active_zones: zones.len(),
            mean_orders_per_agent,
            orders_by_agent,
        }
    }
}

/// Placeholder rendering for optional means: undefined shows as "N/A",
/// never as a fabricated zero.
pub fn display_optional(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.1}"),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::dataset::Dataset;

    fn sample() -> Dataset {
        let csv = "\
date,agent,zone,total_commandes_journalier,total_interactions_par_agent,total_reclamation_par_agent,moyenne_sku_par_commande
2024-03-01,Alice,Nord,10,40,1,2.0
2024-03-02,Alice,Sud,6,25,0,4.0
2024-03-01,Bob,Nord,4,12,2,
";
        Dataset::from_reader(csv.as_bytes()).expect("sample parses")
    }

    #[test]
    fn totals_and_cardinalities_cover_the_filtered_view() {
        let dataset = sample();
        let summary = KpiSummary::from_records(dataset.records());

        assert_eq!(summary.total_orders, 20.0);
        assert_eq!(summary.total_interactions, 77.0);
        assert_eq!(summary.total_complaints, 3.0);
        assert_eq!(summary.active_agents, 2);
        assert_eq!(summary.active_zones, 2);
        assert_eq!(summary.mean_orders_per_agent, 10.0);
    }

    #[test]
    fn sku_mean_skips_missing_cells() {
        let dataset = sample();
        let summary = KpiSummary::from_records(dataset.records());
        // Bob's row has no value, so the mean is over Alice's two rows only.
        assert_eq!(summary.mean_sku_per_order, Some(3.0));
    }

    #[test]
    fn empty_view_has_zero_kpis_and_no_divide_by_zero() {
        let summary = KpiSummary::from_records(&[]);
        assert_eq!(summary.active_agents, 0);
        assert_eq!(summary.mean_orders_per_agent, 0.0);
        assert_eq!(summary.mean_sku_per_order, None);
        assert!(summary.orders_by_agent.is_empty());
    }

    #[test]
    fn orders_by_agent_sums_across_rows() {
        let dataset = sample();
        let summary = KpiSummary::from_records(dataset.records());
        assert_eq!(
            summary.orders_by_agent,
            vec![
                AgentOrders {
                    agent: "Alice".to_string(),
                    orders: 16.0
                },
                AgentOrders {
                    agent: "Bob".to_string(),
                    orders: 4.0
                },
            ]
        );
    }

    #[test]
    fn undefined_means_render_as_placeholder() {
        assert_eq!(display_optional(None), "N/A");
        assert_eq!(display_optional(Some(3.25)), "3.2");
    }
}
