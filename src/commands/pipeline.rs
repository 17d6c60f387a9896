//! Pipeline metrics and analytics commands

use crate::error::Result;
use crate::services::{AnalyticsService, MetricsService, PipelineAnalytics};
use crate::state::AppState;
use crate::store::models::{Deal, PipelineMetrics};

/// Metrics for a caller-supplied deal collection (e.g. a filtered board)
pub fn get_pipeline_metrics(state: &AppState, deals: &[Deal]) -> Result<PipelineMetrics> {
    Ok(MetricsService::compute(deals, state.now()))
}

/// Metrics for every deal in the store
pub fn get_store_metrics(state: &AppState) -> Result<PipelineMetrics> {
    Ok(MetricsService::get_pipeline_metrics(state))
}

/// Funnel, velocity, bottleneck and forecast series
pub fn get_pipeline_analytics(state: &AppState) -> Result<PipelineAnalytics> {
    Ok(AnalyticsService::get_analytics(state))
}
