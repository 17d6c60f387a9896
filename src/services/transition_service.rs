//! Transition Service
//!
//! Moves deals between pipeline stages and records stage history.
//! Any stage may follow any other, including the stage a deal is already in.

use crate::error::Result;
use crate::services::deal_service::BulkActionResult;
use crate::services::missing_deal;
use crate::state::AppState;
use crate::store::models::{Deal, DealStage, StageHistoryEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Request to put a deal in a stage (one kanban drop)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDealCommand {
    pub deal_id: String,
    pub target_stage: DealStage,
}

impl MoveDealCommand {
    pub fn new(deal_id: impl Into<String>, target_stage: DealStage) -> Self {
        Self {
            deal_id: deal_id.into(),
            target_stage,
        }
    }
}

/// Record of an applied stage move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTransition {
    pub deal_id: String,
    pub from_stage: DealStage,
    pub to_stage: DealStage,
    pub moved_at: DateTime<Utc>,
    pub history_len: usize,
}

/// Transition service for business logic
pub struct TransitionService;

impl TransitionService {
    /// Apply a stage move to a deal.
    ///
    /// Appends `{target, now, 0}` to the history. With `backfill` the
    /// outgoing entry first receives its elapsed whole days.
    pub fn apply(
        deal: &mut Deal,
        target: DealStage,
        now: DateTime<Utc>,
        backfill: bool,
    ) -> StageTransition {
        let from_stage = deal.stage;

        if backfill {
            if let Some(outgoing) = deal.stage_history.last_mut() {
                outgoing.days_in_stage = (now - outgoing.date).num_days().max(0);
            }
        }

        deal.stage_history.push(StageHistoryEntry::new(target, now));
        deal.stage = target;
        deal.last_updated = now;

        debug!(
            "Deal {} moved {} -> {} ({} history entries)",
            deal.id,
            from_stage.as_str(),
            target.as_str(),
            deal.stage_history.len()
        );

        StageTransition {
            deal_id: deal.id.clone(),
            from_stage,
            to_stage: target,
            moved_at: now,
            history_len: deal.stage_history.len(),
        }
    }

    /// Move one deal
    ///
    /// Returns `None` when the deal is missing and strict mode is off.
    pub fn move_deal(
        state: &AppState,
        command: &MoveDealCommand,
    ) -> Result<Option<StageTransition>> {
        info!(
            "TransitionService::move_deal - {} -> {}",
            command.deal_id,
            command.target_stage.as_str()
        );

        let settings = state.get_settings();
        let now = state.now();

        let moved = state.store.modify(&command.deal_id, |deal| {
            Self::apply(deal, command.target_stage, now, settings.backfill_stage_durations)
        });

        match moved {
            Some(transition) => Ok(Some(transition)),
            None => missing_deal(settings.strict_not_found, &command.deal_id, "move_deal"),
        }
    }

    /// Apply several moves; each succeeds or fails on its own
    pub fn move_many(state: &AppState, commands: &[MoveDealCommand]) -> Vec<BulkActionResult> {
        info!("TransitionService::move_many - {} deals", commands.len());

        commands
            .iter()
            .map(|command| match Self::move_deal(state, command) {
                Ok(Some(transition)) => BulkActionResult::ok(
                    &command.deal_id,
                    format!(
                        "Moved from {} to {}",
                        transition.from_stage, transition.to_stage
                    ),
                ),
                Ok(None) => BulkActionResult::ok(&command.deal_id, "Deal not found, skipped"),
                Err(e) => BulkActionResult::failed(&command.deal_id, e.to_string()),
            })
            .collect()
    }
}
