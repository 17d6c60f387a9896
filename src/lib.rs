//! Dealflow - Real estate investment deal pipeline
//!
//! The engine behind a real-estate CRM dashboard's deal board: an in-memory
//! deal store, stage moves with stage history, and pipeline metrics with a
//! probability-weighted revenue forecast.
//!
//! ```no_run
//! use dealflow::commands::{deals, pipeline};
//! use dealflow::config::PipelineSettings;
//! use dealflow::state::AppState;
//! use dealflow::store::models::{DealStage, NewDeal};
//!
//! # fn main() -> dealflow::error::Result<()> {
//! let settings = PipelineSettings::from_env()?;
//! dealflow::init_tracing(&settings.log_filter);
//!
//! let state = AppState::new(settings)?;
//! let deal = deals::add_deal(&state, NewDeal {
//!     title: "Maple Ave Fix & Flip".into(),
//!     ..Default::default()
//! })?;
//! deals::move_deal_to_stage(&state, &deal.id, DealStage::UnderContract)?;
//!
//! let metrics = pipeline::get_store_metrics(&state)?;
//! println!("weighted forecast: {:.0}", metrics.weighted_forecast);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod store;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
///
/// `RUST_LOG` wins over `default_filter`. Calling this more than once is a no-op.
pub fn init_tracing(default_filter: &str) {
    let initialized = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if initialized.is_ok() {
        tracing::info!("Dealflow tracing initialized");
    }
}
