//! Deal Service
//!
//! Create, edit, duplicate and delete deals, plus the field-level toggles
//! and auxiliary collections the deal screens use.

use crate::error::{AppError, Result};
use crate::services::missing_deal;
use crate::services::transition_service::TransitionService;
use crate::state::AppState;
use crate::store::models::{
    Communication, CommunicationChannel, Deal, DealDocument, DealFilter, DealTask, NewDeal,
    Priority, StageHistoryEntry,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

/// Per-deal outcome of a bulk action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkActionResult {
    pub deal_id: String,
    pub success: bool,
    pub message: String,
}

impl BulkActionResult {
    pub fn ok(deal_id: &str, message: impl Into<String>) -> Self {
        Self {
            deal_id: deal_id.to_string(),
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(deal_id: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        error!("Bulk action failed for deal {}: {}", deal_id, message);
        Self {
            deal_id: deal_id.to_string(),
            success: false,
            message,
        }
    }
}

/// Deal service for business logic
pub struct DealService;

impl DealService {
    /// All deals in board order
    pub fn list_deals(state: &AppState) -> Vec<Deal> {
        state.store.list()
    }

    /// Get a deal by id
    pub fn get_deal(state: &AppState, id: &str) -> Option<Deal> {
        state.store.get(id)
    }

    /// Deals matching a board filter
    pub fn search_deals(state: &AppState, filter: &DealFilter) -> Vec<Deal> {
        state.store.filter(filter)
    }

    /// Create a deal
    ///
    /// Assigns an id when absent and writes the first stage history entry.
    pub fn add_deal(state: &AppState, input: NewDeal) -> Result<Deal> {
        info!("DealService::add_deal - {}", input.title);

        validate_title(&input.title)?;
        input.financial.validate()?;

        let settings = state.get_settings();
        let now = state.now();

        let id = match input.id {
            Some(id) if id.trim().is_empty() => {
                return Err(AppError::Validation("Deal id must not be blank".to_string()));
            }
            Some(id) => id,
            None => Uuid::new_v4().to_string(),
        };
        let stage = input.stage.unwrap_or(settings.default_stage);

        let mut deal = Deal {
            id,
            title: input.title,
            address: input.address,
            property_type: input.property_type,
            contact_name: input.contact_name,
            stage,
            priority: input.priority.unwrap_or(settings.default_priority),
            value: 0.0,
            potential_profit: 0.0,
            financial: input.financial,
            stage_history: vec![StageHistoryEntry::new(stage, now)],
            flagged: input.flagged,
            notes: input.notes,
            tasks: Vec::new(),
            documents: Vec::new(),
            communications: Vec::new(),
            created_at: now,
            last_updated: now,
        };
        deal.refresh_financials();

        state.store.insert(deal.clone())?;
        Ok(deal)
    }

    /// Apply an edited deal onto the stored record.
    ///
    /// Stage history and `created_at` stay owned by the store; a changed
    /// stage is recorded as a transition.
    pub fn update_deal(state: &AppState, edited: Deal) -> Result<Option<Deal>> {
        info!("DealService::update_deal - {}", edited.id);

        validate_title(&edited.title)?;
        edited.financial.validate()?;

        let settings = state.get_settings();
        let now = state.now();
        let id = edited.id.clone();

        let updated = state.store.modify(&id, |deal| {
            if edited.stage != deal.stage {
                let backfill = settings.backfill_stage_durations;
                TransitionService::apply(deal, edited.stage, now, backfill);
            }

            deal.title = edited.title;
            deal.address = edited.address;
            deal.property_type = edited.property_type;
            deal.contact_name = edited.contact_name;
            deal.priority = edited.priority;
            deal.financial = edited.financial;
            deal.flagged = edited.flagged;
            deal.notes = edited.notes;
            deal.tasks = edited.tasks;
            deal.documents = edited.documents;
            deal.communications = edited.communications;
            deal.refresh_financials();
            deal.last_updated = now;
            deal.clone()
        });

        match updated {
            Some(deal) => Ok(Some(deal)),
            None => missing_deal(settings.strict_not_found, &id, "update_deal"),
        }
    }

    /// Delete a deal
    pub fn delete_deal(state: &AppState, id: &str) -> Result<Option<Deal>> {
        info!("DealService::delete_deal - {}", id);

        match state.store.remove(id) {
            Some(deal) => Ok(Some(deal)),
            None => missing_deal(state.get_settings().strict_not_found, id, "delete_deal"),
        }
    }

    /// Clone a deal under a new id.
    ///
    /// Timestamps reset to now; stage history is copied as-is.
    pub fn duplicate_deal(state: &AppState, id: &str) -> Result<Option<Deal>> {
        info!("DealService::duplicate_deal - {}", id);

        let settings = state.get_settings();
        let now = state.now();

        let copied = state.store.insert_derived(id, |source| Deal {
            id: Uuid::new_v4().to_string(),
            title: format!("{}{}", source.title, settings.duplicate_suffix),
            created_at: now,
            last_updated: now,
            ..source.clone()
        });

        match copied {
            Some(copy) => copy.map(Some),
            None => missing_deal(settings.strict_not_found, id, "duplicate_deal"),
        }
    }

    /// Set deal priority
    pub fn set_priority(state: &AppState, id: &str, priority: Priority) -> Result<Option<Deal>> {
        info!("DealService::set_priority - {} -> {}", id, priority);

        Self::touch(state, id, "set_priority", |deal| deal.priority = priority)
    }

    /// Flag or unflag a deal
    pub fn set_flag(state: &AppState, id: &str, flagged: bool) -> Result<Option<Deal>> {
        info!("DealService::set_flag - {} flagged={}", id, flagged);

        Self::touch(state, id, "set_flag", |deal| deal.flagged = flagged)
    }

    // ========================================================================
    // Auxiliary collections
    // ========================================================================

    /// Add a follow-up task
    pub fn add_task(
        state: &AppState,
        deal_id: &str,
        title: &str,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<DealTask> {
        info!("DealService::add_task - {}", deal_id);

        if title.trim().is_empty() {
            return Err(AppError::Validation("Task title must not be blank".to_string()));
        }

        let task = DealTask {
            id: Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            due_date,
            completed: false,
        };

        let now = state.now();
        state
            .store
            .modify(deal_id, |deal| {
                deal.tasks.push(task.clone());
                deal.last_updated = now;
            })
            .ok_or_else(|| AppError::deal_not_found(deal_id))?;

        Ok(task)
    }

    /// Mark a task done or open
    pub fn set_task_completed(
        state: &AppState,
        deal_id: &str,
        task_id: &str,
        completed: bool,
    ) -> Result<DealTask> {
        info!("DealService::set_task_completed - {}/{} -> {}", deal_id, task_id, completed);

        let now = state.now();
        state
            .store
            .modify(deal_id, |deal| {
                let task = deal.tasks.iter_mut().find(|t| t.id == task_id)?;
                task.completed = completed;
                let task = task.clone();
                deal.last_updated = now;
                Some(task)
            })
            .ok_or_else(|| AppError::deal_not_found(deal_id))?
            .ok_or_else(|| AppError::NotFound(format!("Task '{}' not found", task_id)))
    }

    /// Attach a document reference
    pub fn attach_document(
        state: &AppState,
        deal_id: &str,
        name: &str,
        url: Option<String>,
    ) -> Result<DealDocument> {
        info!("DealService::attach_document - {} ({})", deal_id, name);

        if name.trim().is_empty() {
            return Err(AppError::Validation("Document name must not be blank".to_string()));
        }

        let now = state.now();
        let document = DealDocument {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            url,
            uploaded_at: now,
        };

        state
            .store
            .modify(deal_id, |deal| {
                deal.documents.push(document.clone());
                deal.last_updated = now;
            })
            .ok_or_else(|| AppError::deal_not_found(deal_id))?;

        Ok(document)
    }

    /// Log a call, email, meeting or note
    pub fn log_communication(
        state: &AppState,
        deal_id: &str,
        channel: CommunicationChannel,
        summary: &str,
    ) -> Result<Communication> {
        info!("DealService::log_communication - {} ({:?})", deal_id, channel);

        let now = state.now();
        let entry = Communication {
            id: Uuid::new_v4().to_string(),
            channel,
            summary: summary.trim().to_string(),
            occurred_at: now,
        };

        state
            .store
            .modify(deal_id, |deal| {
                deal.communications.push(entry.clone());
                deal.last_updated = now;
            })
            .ok_or_else(|| AppError::deal_not_found(deal_id))?;

        Ok(entry)
    }

    // ========================================================================
    // Bulk actions
    // ========================================================================

    /// Delete several deals
    pub fn bulk_delete(state: &AppState, ids: &[String]) -> Vec<BulkActionResult> {
        info!("DealService::bulk_delete - {} deals", ids.len());

        ids.iter()
            .map(|id| match Self::delete_deal(state, id) {
                Ok(Some(_)) => BulkActionResult::ok(id, "Deleted"),
                Ok(None) => BulkActionResult::ok(id, "Deal not found, skipped"),
                Err(e) => BulkActionResult::failed(id, e.to_string()),
            })
            .collect()
    }

    /// Set the same priority on several deals
    pub fn bulk_set_priority(
        state: &AppState,
        ids: &[String],
        priority: Priority,
    ) -> Vec<BulkActionResult> {
        info!("DealService::bulk_set_priority - {} deals -> {}", ids.len(), priority);

        ids.iter()
            .map(|id| match Self::set_priority(state, id, priority) {
                Ok(Some(_)) => BulkActionResult::ok(id, format!("Priority set to {}", priority)),
                Ok(None) => BulkActionResult::ok(id, "Deal not found, skipped"),
                Err(e) => BulkActionResult::failed(id, e.to_string()),
            })
            .collect()
    }

    // ========================================================================
    // Private Helper Methods
    // ========================================================================

    fn touch(
        state: &AppState,
        id: &str,
        operation: &str,
        edit: impl FnOnce(&mut Deal),
    ) -> Result<Option<Deal>> {
        let now = state.now();
        let updated = state.store.modify(id, |deal| {
            edit(deal);
            deal.last_updated = now;
            deal.clone()
        });

        match updated {
            Some(deal) => Ok(Some(deal)),
            None => missing_deal(state.get_settings().strict_not_found, id, operation),
        }
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("Deal title must not be blank".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::config::PipelineSettings;
    use crate::services::transition_service::MoveDealCommand;
    use crate::store::models::{DealStage, FinancialDetails};
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 10, 15, 30, 0).unwrap()
    }

    fn new_deal(title: &str, purchase: f64, arv: f64) -> NewDeal {
        NewDeal {
            title: title.to_string(),
            address: "500 Harbor Rd".to_string(),
            contact_name: Some("Jordan Blake".to_string()),
            financial: FinancialDetails {
                purchase_price: purchase,
                closing_costs: 3_000.0,
                repair_costs: 12_000.0,
                arv,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn cottage() -> NewDeal {
        new_deal("Harbor Cottage", 100_000.0, 150_000.0)
    }

    fn test_state() -> (AppState, std::sync::Arc<crate::clock::ManualClock>) {
        AppState::new_for_testing(PipelineSettings::default(), start())
    }

    #[test]
    fn test_add_deal_defaults() {
        let (state, _clock) = test_state();
        let deal = DealService::add_deal(&state, cottage()).unwrap();

        assert!(!deal.id.is_empty());
        assert_eq!(deal.stage, DealStage::Prospecting);
        assert_eq!(deal.priority, Priority::Medium);
        assert_eq!(deal.value, 100_000.0);
        assert_eq!(deal.potential_profit, 35_000.0);
        assert_eq!(deal.stage_history.len(), 1);
        assert_eq!(deal.stage_history[0].date, start());
        assert_eq!(deal.created_at, start());
        assert_eq!(state.store.get(&deal.id), Some(deal));
    }

    #[test]
    fn test_add_deal_with_stage_and_id() {
        let (state, _clock) = test_state();
        let mut input = new_deal("Ridge Lot", 50_000.0, 40_000.0);
        input.id = Some("deal-42".to_string());
        input.stage = Some(DealStage::Negotiations);

        let deal = DealService::add_deal(&state, input.clone()).unwrap();
        assert_eq!(deal.id, "deal-42");
        assert_eq!(deal.stage_history[0].stage, DealStage::Negotiations);
        // ARV below cost clamps to zero
        assert_eq!(deal.potential_profit, 0.0);

        let duplicate = DealService::add_deal(&state, input);
        assert!(matches!(duplicate, Err(AppError::DuplicateId(_))));
    }

    #[test]
    fn test_add_deal_validation() {
        let (state, _clock) = test_state();

        let blank = DealService::add_deal(&state, new_deal("  ", 1.0, 2.0));
        assert!(matches!(blank, Err(AppError::Validation(_))));

        let negative = DealService::add_deal(&state, new_deal("Bad Math", -5.0, 2.0));
        assert!(matches!(negative, Err(AppError::Validation(_))));

        assert!(state.store.is_empty());
    }

    #[test]
    fn test_update_recomputes_profit() {
        let (state, clock) = test_state();
        let deal = DealService::add_deal(&state, cottage()).unwrap();

        clock.advance_days(1);
        let mut edited = deal.clone();
        edited.financial.arv = 200_000.0;
        edited.financial.repair_costs = 40_000.0;
        // derived fields from the caller are ignored
        edited.potential_profit = -1.0;
        edited.value = 1.0;

        let updated = DealService::update_deal(&state, edited).unwrap().unwrap();
        assert_eq!(updated.potential_profit, 200_000.0 - 100_000.0 - 3_000.0 - 40_000.0);
        assert_eq!(updated.value, 100_000.0);
        assert_eq!(updated.last_updated, start() + Duration::days(1));
        assert_eq!(updated.created_at, start());
    }

    #[test]
    fn test_update_keeps_history_and_records_stage_change() {
        let (state, _clock) = test_state();
        let deal = DealService::add_deal(&state, cottage()).unwrap();

        let mut edited = deal.clone();
        edited.stage = DealStage::UnderContract;
        edited.stage_history.clear();

        let updated = DealService::update_deal(&state, edited).unwrap().unwrap();
        assert_eq!(updated.stage_history.len(), 2);
        assert!(updated.history_is_consistent());

        // same stage: no extra entry
        let again = DealService::update_deal(&state, updated.clone()).unwrap().unwrap();
        assert_eq!(again.stage_history.len(), 2);
    }

    #[test]
    fn test_update_missing_deal() {
        let (state, _clock) = test_state();
        let deal = DealService::add_deal(&state, new_deal("Harbor Cottage", 1.0, 2.0)).unwrap();
        let mut ghost = deal.clone();
        ghost.id = "ghost".to_string();

        assert!(matches!(
            DealService::update_deal(&state, ghost.clone()),
            Err(AppError::NotFound(_))
        ));

        state.set_settings(PipelineSettings {
            strict_not_found: false,
            ..Default::default()
        });
        assert_eq!(DealService::update_deal(&state, ghost).unwrap(), None);
        assert_eq!(state.store.len(), 1);
    }

    #[test]
    fn test_delete_deal() {
        let (state, _clock) = test_state();
        let deal = DealService::add_deal(&state, new_deal("Harbor Cottage", 1.0, 2.0)).unwrap();

        assert!(DealService::delete_deal(&state, &deal.id).unwrap().is_some());
        assert!(state.store.get(&deal.id).is_none());
        assert!(matches!(
            DealService::delete_deal(&state, &deal.id),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_deal() {
        let (state, clock) = test_state();
        let deal = DealService::add_deal(&state, cottage()).unwrap();

        clock.advance_days(3);
        let command = MoveDealCommand::new(&deal.id, DealStage::DueDiligence);
        TransitionService::move_deal(&state, &command).unwrap();
        let source = state.store.get(&deal.id).unwrap();

        clock.advance_days(2);
        let copy = DealService::duplicate_deal(&state, &deal.id).unwrap().unwrap();

        assert_ne!(copy.id, source.id);
        assert!(copy.title.ends_with(" (Copy)"));
        assert_eq!(copy.title, "Harbor Cottage (Copy)");
        assert_eq!(copy.created_at, clock.now());
        assert_eq!(copy.last_updated, clock.now());
        assert_eq!(copy.stage_history, source.stage_history);
        assert_eq!(copy.stage, source.stage);
        assert_eq!(copy.potential_profit, source.potential_profit);
        assert_eq!(state.store.len(), 2);
    }

    #[test]
    fn test_duplicate_after_delete() {
        let (state, _clock) = test_state();
        let deal = DealService::add_deal(&state, cottage()).unwrap();
        DealService::delete_deal(&state, &deal.id).unwrap();

        assert!(matches!(
            DealService::duplicate_deal(&state, &deal.id),
            Err(AppError::NotFound(_))
        ));
        assert!(state.store.is_empty());
    }

    #[test]
    fn test_priority_and_flag_bump_last_updated() {
        let (state, clock) = test_state();
        let deal = DealService::add_deal(&state, new_deal("Harbor Cottage", 1.0, 2.0)).unwrap();

        clock.advance_days(1);
        let updated = DealService::set_priority(&state, &deal.id, Priority::High).unwrap().unwrap();
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.last_updated, clock.now());

        clock.advance_days(1);
        let flagged = DealService::set_flag(&state, &deal.id, true).unwrap().unwrap();
        assert!(flagged.flagged);
        assert_eq!(flagged.last_updated, clock.now());
        // stage untouched
        assert_eq!(flagged.stage_history.len(), 1);
    }

    #[test]
    fn test_tasks_documents_communications() {
        let (state, _clock) = test_state();
        let deal = DealService::add_deal(&state, new_deal("Harbor Cottage", 1.0, 2.0)).unwrap();

        let task = DealService::add_task(&state, &deal.id, "Call lender", None).unwrap();
        let done = DealService::set_task_completed(&state, &deal.id, &task.id, true).unwrap();
        assert!(done.completed);
        assert!(matches!(
            DealService::set_task_completed(&state, &deal.id, "missing", true),
            Err(AppError::NotFound(_))
        ));

        DealService::attach_document(&state, &deal.id, "Purchase agreement.pdf", None).unwrap();
        let channel = CommunicationChannel::Call;
        DealService::log_communication(&state, &deal.id, channel, "Seller open to 95k").unwrap();

        let stored = state.store.get(&deal.id).unwrap();
        assert_eq!(stored.tasks.len(), 1);
        assert!(stored.tasks[0].completed);
        assert_eq!(stored.documents.len(), 1);
        assert_eq!(stored.communications[0].channel, CommunicationChannel::Call);

        assert!(matches!(
            DealService::add_task(&state, "ghost", "Nope", None),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_search_deals() {
        let (state, _clock) = test_state();
        let a = DealService::add_deal(&state, new_deal("Harbor Cottage", 1.0, 2.0)).unwrap();
        let b = DealService::add_deal(&state, new_deal("Mill Street Triplex", 1.0, 2.0)).unwrap();
        DealService::set_flag(&state, &b.id, true).unwrap();

        let by_query = DealService::search_deals(
            &state,
            &DealFilter {
                query: Some("cottage".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(by_query.len(), 1);
        assert_eq!(by_query[0].id, a.id);

        let flagged = DealService::search_deals(
            &state,
            &DealFilter {
                flagged: Some(true),
                ..Default::default()
            },
        );
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].id, b.id);

        let by_contact = DealService::search_deals(
            &state,
            &DealFilter {
                query: Some("jordan".to_string()),
                stage: Some(DealStage::Prospecting),
                ..Default::default()
            },
        );
        assert_eq!(by_contact.len(), 2);
    }

    #[test]
    fn test_bulk_actions() {
        let (state, _clock) = test_state();
        let a = DealService::add_deal(&state, new_deal("A", 1.0, 2.0)).unwrap();
        let b = DealService::add_deal(&state, new_deal("B", 1.0, 2.0)).unwrap();

        let results = DealService::bulk_set_priority(
            &state,
            &[a.id.clone(), "ghost".to_string()],
            Priority::Low,
        );
        assert!(results[0].success);
        assert!(!results[1].success);
        assert_eq!(state.store.get(&a.id).unwrap().priority, Priority::Low);

        let results = DealService::bulk_delete(&state, &[a.id.clone(), b.id.clone()]);
        assert!(results.iter().all(|r| r.success));
        assert!(state.store.is_empty());
    }
}
