//! Deal board commands

use crate::error::Result;
use crate::services::{BulkActionResult, DealService, MoveDealCommand, TransitionService};
use crate::state::AppState;
use crate::store::models::{
    Communication, CommunicationChannel, Deal, DealDocument, DealFilter, DealStage, DealTask,
    NewDeal, Priority,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct BulkMoveRequest {
    pub deal_ids: Vec<String>,
    pub target_stage: DealStage,
}

#[derive(Debug, Deserialize)]
pub struct AddTaskRequest {
    pub deal_id: String,
    pub title: String,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AttachDocumentRequest {
    pub deal_id: String,
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogCommunicationRequest {
    pub deal_id: String,
    pub channel: CommunicationChannel,
    pub summary: String,
}

/// Get all deals
pub fn list_deals(state: &AppState) -> Result<Vec<Deal>> {
    Ok(DealService::list_deals(state))
}

/// Get a single deal
pub fn get_deal(state: &AppState, id: &str) -> Result<Option<Deal>> {
    Ok(DealService::get_deal(state, id))
}

/// Filter the board
pub fn search_deals(state: &AppState, filter: DealFilter) -> Result<Vec<Deal>> {
    Ok(DealService::search_deals(state, &filter))
}

/// Create a new deal
pub fn add_deal(state: &AppState, request: NewDeal) -> Result<Deal> {
    tracing::info!("Creating deal: {}", request.title);
    DealService::add_deal(state, request)
}

/// Save an edited deal
pub fn update_deal(state: &AppState, deal: Deal) -> Result<()> {
    tracing::info!("Updating deal: {}", deal.id);
    DealService::update_deal(state, deal).map(|_| ())
}

/// Delete a deal
pub fn delete_deal(state: &AppState, id: &str) -> Result<()> {
    tracing::info!("Deleting deal: {}", id);
    DealService::delete_deal(state, id).map(|_| ())
}

/// Drop a deal into a stage column
pub fn move_deal_to_stage(state: &AppState, id: &str, stage: DealStage) -> Result<()> {
    tracing::info!("Moving deal {} to {}", id, stage);
    TransitionService::move_deal(state, &MoveDealCommand::new(id, stage)).map(|_| ())
}

/// Same as [`move_deal_to_stage`] with the stage given by name
pub fn move_deal_to_stage_named(state: &AppState, id: &str, stage: &str) -> Result<()> {
    move_deal_to_stage(state, id, stage.parse()?)
}

/// Duplicate a deal
pub fn duplicate_deal(state: &AppState, id: &str) -> Result<Option<Deal>> {
    tracing::info!("Duplicating deal: {}", id);
    DealService::duplicate_deal(state, id)
}

/// Set deal priority
pub fn set_deal_priority(state: &AppState, id: &str, priority: Priority) -> Result<()> {
    DealService::set_priority(state, id, priority).map(|_| ())
}

/// Flag or unflag a deal
pub fn toggle_deal_flag(state: &AppState, id: &str, flagged: bool) -> Result<()> {
    DealService::set_flag(state, id, flagged).map(|_| ())
}

/// Move the selected deals to one stage
pub fn bulk_move_deals(
    state: &AppState,
    request: BulkMoveRequest,
) -> Result<Vec<BulkActionResult>> {
    tracing::info!("Bulk moving {} deals to {}", request.deal_ids.len(), request.target_stage);

    let commands: Vec<MoveDealCommand> = request
        .deal_ids
        .into_iter()
        .map(|id| MoveDealCommand::new(id, request.target_stage))
        .collect();

    Ok(TransitionService::move_many(state, &commands))
}

/// Delete the selected deals
pub fn bulk_delete_deals(state: &AppState, deal_ids: Vec<String>) -> Result<Vec<BulkActionResult>> {
    Ok(DealService::bulk_delete(state, &deal_ids))
}

/// Set one priority on the selected deals
pub fn bulk_set_priority(
    state: &AppState,
    deal_ids: Vec<String>,
    priority: Priority,
) -> Result<Vec<BulkActionResult>> {
    Ok(DealService::bulk_set_priority(state, &deal_ids, priority))
}

/// Add a task to a deal
pub fn add_deal_task(state: &AppState, request: AddTaskRequest) -> Result<DealTask> {
    DealService::add_task(state, &request.deal_id, &request.title, request.due_date)
}

/// Check or uncheck a task
pub fn toggle_deal_task(
    state: &AppState,
    deal_id: &str,
    task_id: &str,
    completed: bool,
) -> Result<DealTask> {
    DealService::set_task_completed(state, deal_id, task_id, completed)
}

/// Attach a document to a deal
pub fn attach_deal_document(
    state: &AppState,
    request: AttachDocumentRequest,
) -> Result<DealDocument> {
    DealService::attach_document(state, &request.deal_id, &request.name, request.url)
}

/// Log a communication on a deal
pub fn log_deal_communication(
    state: &AppState,
    request: LogCommunicationRequest,
) -> Result<Communication> {
    DealService::log_communication(state, &request.deal_id, request.channel, &request.summary)
}
