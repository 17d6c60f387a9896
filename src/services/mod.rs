//! Services Layer
//!
//! Pipeline business logic shared by the command surface and any embedding
//! host. Services are the only code that writes to the deal store.
//!
//! # Architecture
//!
//! ```text
//! Kanban / forms / charts --> Commands --> Services --> DealStore
//! ```
//!
//! # Services
//!
//! - `DealService` - Create, edit, duplicate, delete, flag, prioritize deals
//! - `TransitionService` - Stage moves and stage history
//! - `MetricsService` - Pipeline metrics and weighted forecast
//! - `AnalyticsService` - Chart series derived from the metrics

pub mod analytics_service;
pub mod deal_service;
pub mod metrics_service;
pub mod transition_service;

// Re-export commonly used types and services
pub use analytics_service::{
    AnalyticsService, BottleneckBar, ForecastRow, FunnelStep, PipelineAnalytics, RevenueForecast,
    VelocityBar,
};
pub use deal_service::{BulkActionResult, DealService};
pub use metrics_service::MetricsService;
pub use transition_service::{MoveDealCommand, StageTransition, TransitionService};

use crate::error::{AppError, Result};
use tracing::warn;

/// Outcome for an operation that targeted a missing deal.
///
/// Strict mode surfaces `NotFound`; lenient mode logs and yields `None`.
pub(crate) fn missing_deal<T>(strict: bool, id: &str, operation: &str) -> Result<Option<T>> {
    if strict {
        Err(AppError::deal_not_found(id))
    } else {
        warn!("{} ignored: deal '{}' not found", operation, id);
        Ok(None)
    }
}
