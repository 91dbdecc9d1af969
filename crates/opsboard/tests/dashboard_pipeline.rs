use chrono::NaiveDate;
use opsboard::dashboard::aggregate::AggregatePolicy;
use opsboard::dashboard::dataset::Dataset;
use opsboard::dashboard::filter::{FilterCriteria, Selection};
use opsboard::dashboard::score::{ScoringStrategy, WeightScheme};
use opsboard::dashboard::DashboardReport;

const EXPORT: &str = "\
date,agent,zone,total_commandes_journalier,total_interactions_par_agent,total_interaction_appel_par_agent,total_reclamation_par_agent,total_suivi_livraison_impossible_par_agent,total_notation_par_agent,total_sku_par_agent,total_suivi_reclamation_par_agent,moyenne_sku_par_commande
2024-03-01,Alice,Nord,20,55,50,0,0,4.8,120,0,2.4
2024-03-02,Alice,Nord,18,48,44,1,0,4.6,100,1,2.1
2024-03-01,Bob,Sud,6,20,16,4,2,3.2,30,3,1.8
2024-03-02,Bob,Sud,7,18,15,2,1,3.5,35,1,1.9
2024-03-01,Chloe,Est,11,30,28,1,1,4.0,60,0,2.2
";

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn full_range() -> FilterCriteria {
    FilterCriteria {
        date_start: day(2024, 3, 1),
        date_end: day(2024, 3, 2),
        agents: Selection::All,
        zones: Selection::All,
    }
}

#[test]
fn end_to_end_report_over_a_realistic_export() {
    let dataset = Dataset::from_reader(EXPORT.as_bytes()).expect("export parses");
    let report = DashboardReport::build(
        &dataset,
        Ok(full_range()),
        &AggregatePolicy::classic(),
        ScoringStrategy::MinMax(WeightScheme::FiveFactor),
    )
    .expect("report builds");

    assert_eq!(report.record_count, 5);
    assert_eq!(report.kpis.active_agents, 3);
    assert_eq!(report.kpis.active_zones, 3);
    assert_eq!(report.kpis.total_orders, 62.0);

    // Alice dominates every factor, so min-max puts her at exactly 100.
    assert_eq!(report.ranking[0].agent, "Alice");
    assert_eq!(report.ranking[0].note, 100.0);
    assert_eq!(report.ranking.len(), 3);
    for pair in report.ranking.windows(2) {
        assert!(pair[0].note >= pair[1].note, "ranking must be descending");
    }
}

#[test]
fn zone_filter_drops_agents_from_aggregates_entirely() {
    let dataset = Dataset::from_reader(EXPORT.as_bytes()).expect("export parses");
    let criteria = FilterCriteria {
        zones: Selection::Only(["Nord".to_string()].into_iter().collect()),
        ..full_range()
    };

    let report = DashboardReport::build(
        &dataset,
        Ok(criteria),
        &AggregatePolicy::classic(),
        ScoringStrategy::default(),
    )
    .expect("report builds");

    assert_eq!(report.aggregates.len(), 1);
    assert_eq!(report.aggregates[0].agent, "Alice");
    assert_eq!(report.kpis.active_agents, 1);
    // A lone agent min-maxes to zero on every factor.
    assert_eq!(report.ranking[0].note, 0.0);
}

#[test]
fn both_strategies_rank_the_same_dataset_within_bounds() {
    let dataset = Dataset::from_reader(EXPORT.as_bytes()).expect("export parses");

    for strategy in [
        ScoringStrategy::MinMax(WeightScheme::FiveFactor),
        ScoringStrategy::MinMax(WeightScheme::FourFactor),
        ScoringStrategy::Ratio,
    ] {
        let report = DashboardReport::build(
            &dataset,
            Ok(full_range()),
            &AggregatePolicy::classic(),
            strategy,
        )
        .expect("report builds");

        assert_eq!(report.ranking.len(), 3);
        for row in &report.ranking {
            assert!(
                (0.0..=100.0).contains(&row.note),
                "{strategy:?} produced out-of-range note {} for {}",
                row.note,
                row.agent
            );
        }
    }
}

#[test]
fn rating_policy_presets_disagree_on_notation_semantics() {
    let dataset = Dataset::from_reader(EXPORT.as_bytes()).expect("export parses");

    let mean = DashboardReport::build(
        &dataset,
        Ok(full_range()),
        &AggregatePolicy::classic(),
        ScoringStrategy::default(),
    )
    .expect("mean report");
    let sum = DashboardReport::build(
        &dataset,
        Ok(full_range()),
        &AggregatePolicy::rating_sum(),
        ScoringStrategy::default(),
    )
    .expect("sum report");

    let alice_mean = mean.aggregates[0].rating.expect("rating present");
    let alice_sum = sum.aggregates[0].rating.expect("rating present");
    assert!((alice_mean - 4.7).abs() < 1e-9);
    assert!((alice_sum - 9.4).abs() < 1e-9);
}
