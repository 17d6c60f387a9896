//! Settings management commands

use crate::config::{PipelineSettings, UpdateSettingsRequest};
use crate::error::Result;
use crate::state::AppState;

/// Get current settings
pub fn get_settings(state: &AppState) -> Result<PipelineSettings> {
    Ok(state.get_settings())
}

/// Update settings
pub fn update_settings(
    state: &AppState,
    request: UpdateSettingsRequest,
) -> Result<PipelineSettings> {
    tracing::info!("Updating pipeline settings");

    let next = request.apply(&state.get_settings())?;
    state.set_settings(next.clone());
    Ok(next)
}
