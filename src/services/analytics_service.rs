//! Analytics Service
//!
//! Chart series for the pipeline analytics screen. Every series is a plain
//! reshaping of [`PipelineMetrics`].

use crate::services::metrics_service::MetricsService;
use crate::state::AppState;
use crate::store::models::{DealStage, PipelineMetrics};
use serde::{Deserialize, Serialize};

/// One bar of the conversion funnel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStep {
    pub stage: DealStage,
    pub label: String,
    pub count: usize,
    pub value: f64,
    /// Share of all deals, percent
    pub share_of_pipeline: f64,
    /// Count relative to Prospecting, percent
    pub relative_to_prospecting: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityBar {
    pub stage: DealStage,
    pub label: String,
    pub avg_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleneckBar {
    pub stage: DealStage,
    pub label: String,
    pub avg_days: f64,
    pub is_bottleneck: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub stage: DealStage,
    pub label: String,
    pub value: f64,
    pub probability: f64,
    pub weighted_value: f64,
    pub weighted_profit: f64,
}

/// Probability-weighted revenue forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueForecast {
    pub rows: Vec<ForecastRow>,
    pub total_value: f64,
    pub weighted_value: f64,
    pub weighted_profit: f64,
}

/// Everything the analytics screen draws
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineAnalytics {
    pub metrics: PipelineMetrics,
    pub funnel: Vec<FunnelStep>,
    pub velocity: Vec<VelocityBar>,
    pub bottlenecks: Vec<BottleneckBar>,
    pub forecast: RevenueForecast,
}

/// Analytics service for chart data
pub struct AnalyticsService;

impl AnalyticsService {
    /// Analytics for the deals currently in the store
    pub fn get_analytics(state: &AppState) -> PipelineAnalytics {
        tracing::info!("AnalyticsService::get_analytics");
        Self::build(MetricsService::get_pipeline_metrics(state))
    }

    /// Derive every chart series from a metrics snapshot
    pub fn build(metrics: PipelineMetrics) -> PipelineAnalytics {
        PipelineAnalytics {
            funnel: Self::funnel(&metrics),
            velocity: Self::velocity(&metrics),
            bottlenecks: Self::bottlenecks(&metrics),
            forecast: Self::forecast(&metrics),
            metrics,
        }
    }

    pub fn funnel(metrics: &PipelineMetrics) -> Vec<FunnelStep> {
        let prospecting = metrics.stage(DealStage::Prospecting).count;

        metrics
            .stages
            .iter()
            .map(|s| FunnelStep {
                stage: s.stage,
                label: s.stage.label().to_string(),
                count: s.count,
                value: s.value,
                share_of_pipeline: percent(s.count, metrics.total_deals),
                relative_to_prospecting: percent(s.count, prospecting),
            })
            .collect()
    }

    pub fn velocity(metrics: &PipelineMetrics) -> Vec<VelocityBar> {
        metrics
            .stages
            .iter()
            .map(|s| VelocityBar {
                stage: s.stage,
                label: s.stage.label().to_string(),
                avg_days: s.avg_days_in_stage,
            })
            .collect()
    }

    pub fn bottlenecks(metrics: &PipelineMetrics) -> Vec<BottleneckBar> {
        metrics
            .stages
            .iter()
            .map(|s| BottleneckBar {
                stage: s.stage,
                label: s.stage.label().to_string(),
                avg_days: s.avg_days_in_stage,
                is_bottleneck: s.stage == metrics.bottleneck_stage,
            })
            .collect()
    }

    pub fn forecast(metrics: &PipelineMetrics) -> RevenueForecast {
        let rows = metrics
            .stages
            .iter()
            .map(|s| ForecastRow {
                stage: s.stage,
                label: s.stage.label().to_string(),
                value: s.value,
                probability: s.probability,
                weighted_value: s.value * s.probability,
                weighted_profit: s.profit * s.probability,
            })
            .collect();

        RevenueForecast {
            rows,
            total_value: metrics.total_value,
            weighted_value: metrics.weighted_forecast,
            weighted_profit: metrics.weighted_profit_forecast,
        }
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
