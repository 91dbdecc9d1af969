use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use opsboard::dashboard::aggregate::AggregatePolicy;
use opsboard::dashboard::dataset::Dataset;
use opsboard::dashboard::filter::{FilterCriteria, Selection};
use opsboard::dashboard::score::{ScoringStrategy, WeightScheme};
use opsboard::dashboard::summary::display_optional;
use opsboard::dashboard::DashboardReport;
use opsboard::error::AppError;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// CSV export to report on
    #[arg(long)]
    pub(crate) data: PathBuf,
    /// Start of the reporting window (YYYY-MM-DD); defaults to the earliest day present
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date_start: Option<NaiveDate>,
    /// End of the reporting window (YYYY-MM-DD); defaults to the latest day present
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date_end: Option<NaiveDate>,
    /// Restrict to these agents (repeatable); all agents when omitted
    #[arg(long = "agent")]
    pub(crate) agents: Vec<String>,
    /// Restrict to these zones (repeatable); all zones when omitted
    #[arg(long = "zone")]
    pub(crate) zones: Vec<String>,
    /// Scoring strategy for the ranking
    #[arg(long, value_enum, default_value_t = StrategyArg::FiveFactor)]
    pub(crate) strategy: StrategyArg,
    /// Sum ratings across days instead of averaging them
    #[arg(long)]
    pub(crate) rating_sum: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StrategyArg {
    /// Min-max weighted: orders, calls, complaint score, delivery score, rating
    FiveFactor,
    /// Min-max weighted without the rating factor
    FourFactor,
    /// Positive/negative weighted ratio
    Ratio,
}

impl StrategyArg {
    fn to_strategy(self) -> ScoringStrategy {
        match self {
            StrategyArg::FiveFactor => ScoringStrategy::MinMax(WeightScheme::FiveFactor),
            StrategyArg::FourFactor => ScoringStrategy::MinMax(WeightScheme::FourFactor),
            StrategyArg::Ratio => ScoringStrategy::Ratio,
        }
    }
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let dataset = Dataset::from_path(&args.data)?;

    let mut criteria = match FilterCriteria::unrestricted(&dataset) {
        Some(criteria) => criteria,
        None => {
            eprintln!("dataset is empty; nothing to report on");
            std::process::exit(1);
        }
    };
    if let Some(start) = args.date_start {
        criteria.date_start = start;
    }
    if let Some(end) = args.date_end {
        criteria.date_end = end;
    }
    if !args.agents.is_empty() {
        criteria.agents = Selection::Only(args.agents.iter().cloned().collect());
    }
    if !args.zones.is_empty() {
        criteria.zones = Selection::Only(args.zones.iter().cloned().collect());
    }

    let policy = if args.rating_sum {
        AggregatePolicy::rating_sum()
    } else {
        AggregatePolicy::classic()
    };

    let report = DashboardReport::build(
        &dataset,
        Ok(criteria.clone()),
        &policy,
        args.strategy.to_strategy(),
    )?;

    println!(
        "Reporting window: {} .. {} ({} records)",
        criteria.date_start, criteria.date_end, report.record_count
    );
    println!();
    println!("KPIs");
    println!("  Total orders:            {:.0}", report.kpis.total_orders);
    println!(
        "  Total interactions:      {:.0}",
        report.kpis.total_interactions
    );
    println!(
        "  Complaints:              {:.0}",
        report.kpis.total_complaints
    );
    println!(
        "  Failed deliveries:       {:.0}",
        report.kpis.total_failed_deliveries
    );
    println!(
        "  Notation (sum):          {:.1}",
        report.kpis.notation_total
    );
    println!(
        "  Mean SKU/order:          {}",
        display_optional(report.kpis.mean_sku_per_order)
    );
    println!("  Total SKU:               {:.0}", report.kpis.total_sku);
    println!(
        "  Complaint follow-ups:    {:.0}",
        report.kpis.total_complaint_followups
    );
    println!("  Active agents:           {}", report.kpis.active_agents);
    println!("  Active zones:            {}", report.kpis.active_zones);
    println!(
        "  Mean orders/agent:       {:.0}",
        report.kpis.mean_orders_per_agent
    );
    println!();
    println!("Ranking ({:?})", args.strategy);
    for (position, row) in report.ranking.iter().enumerate() {
        println!("  {:>2}. {:<20} {:>6.1}", position + 1, row.agent, row.note);
    }
    if let Some(best) = report.best_agent() {
        println!();
        println!("Best agent: {} ({:.1})", best.agent, best.note);
    }

    Ok(())
}
