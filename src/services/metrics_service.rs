//! Metrics Service
//!
//! Pure aggregation from a deal collection to a [`PipelineMetrics`]
//! snapshot. Nothing is cached; callers recompute after every change.
//!
//! Average days in stage uses the current residency of the deals sitting in
//! each stage, not completed residencies. The conversion rate is the ratio of
//! deals currently in Closing to deals currently in Prospecting.

use crate::state::AppState;
use crate::store::models::{Deal, DealStage, PipelineMetrics, StageMetrics};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Metrics service for business logic
pub struct MetricsService;

impl MetricsService {
    /// Metrics for the deals currently in the store
    pub fn get_pipeline_metrics(state: &AppState) -> PipelineMetrics {
        Self::compute(&state.store.list(), state.now())
    }

    /// Aggregate a deal collection as of `now`
    pub fn compute(deals: &[Deal], now: DateTime<Utc>) -> PipelineMetrics {
        let mut stages: Vec<StageMetrics> =
            DealStage::ALL.iter().map(|&stage| StageMetrics::empty(stage)).collect();
        let mut days_in_stage = [0i64; DealStage::ALL.len()];

        for deal in deals {
            let slot = deal.stage as usize;
            stages[slot].count += 1;
            stages[slot].value += deal.value;
            stages[slot].profit += deal.potential_profit;
            days_in_stage[slot] += deal.days_in_current_stage(now);
        }

        for (metrics, days) in stages.iter_mut().zip(days_in_stage) {
            if metrics.count > 0 {
                metrics.avg_days_in_stage = days as f64 / metrics.count as f64;
            }
        }

        let total_deals = deals.len();
        let total_value: f64 = deals.iter().map(|d| d.value).sum();
        let total_profit: f64 = deals.iter().map(|d| d.potential_profit).sum();

        let prospecting = stages[DealStage::Prospecting as usize].count;
        let closing = stages[DealStage::Closing as usize].count;
        let conversion_rate = conversion_rate(closing, prospecting);

        let avg_deal_cycle = if total_deals == 0 {
            0.0
        } else {
            let cycle_days: i64 = deals.iter().map(|d| d.cycle_days(now)).sum();
            cycle_days as f64 / total_deals as f64
        };

        let bottleneck_stage = bottleneck(&stages);

        let weighted_forecast: f64 = stages.iter().map(|s| s.value * s.probability).sum();
        let weighted_profit_forecast: f64 = stages.iter().map(|s| s.profit * s.probability).sum();

        debug!(
            "Computed pipeline metrics: {} deals, conversion {}%, bottleneck {}",
            total_deals,
            conversion_rate,
            bottleneck_stage.as_str()
        );

        PipelineMetrics {
            stages,
            total_deals,
            total_value,
            total_profit,
            conversion_rate,
            avg_deal_cycle,
            bottleneck_stage,
            weighted_forecast,
            weighted_profit_forecast,
            generated_at: now,
        }
    }
}

/// `round(closing / prospecting * 100)`, 0 without prospects
fn conversion_rate(closing: usize, prospecting: usize) -> u32 {
    if prospecting == 0 {
        return 0;
    }
    (closing as f64 / prospecting as f64 * 100.0).round() as u32
}

/// Stage with the highest average residency; earliest stage wins ties
fn bottleneck(stages: &[StageMetrics]) -> DealStage {
    let mut worst = DealStage::Prospecting;
    let mut worst_days = f64::MIN;

    for metrics in stages {
        if metrics.avg_days_in_stage > worst_days {
            worst = metrics.stage;
            worst_days = metrics.avg_days_in_stage;
        }
    }

    worst
}
