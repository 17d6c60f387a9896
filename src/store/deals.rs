//! Deal table: id lookup plus board order

use crate::error::{AppError, Result};
use crate::store::models::Deal;
use std::collections::{HashMap, HashSet};

/// Deals keyed by id; `order` keeps insertion (board) order
#[derive(Debug, Default)]
pub struct DealTable {
    deals: HashMap<String, Deal>,
    order: Vec<String>,
}

/// Reject a record the board cannot hold
fn check_record(deal: &Deal) -> Result<()> {
    if deal.id.trim().is_empty() {
        return Err(AppError::Validation("Deal id must not be blank".to_string()));
    }
    if !deal.history_is_consistent() {
        return Err(AppError::Validation(format!(
            "Deal '{}' stage history must end in its current stage",
            deal.id
        )));
    }
    if !deal.potential_profit.is_finite() || deal.potential_profit < 0.0 {
        return Err(AppError::Validation(format!(
            "Deal '{}' potential profit must be a non-negative number",
            deal.id
        )));
    }
    Ok(())
}

/// Insert a new deal, rejecting a colliding id or a malformed record
pub fn insert(table: &mut DealTable, deal: Deal) -> Result<()> {
    check_record(&deal)?;
    if table.deals.contains_key(&deal.id) {
        return Err(AppError::DuplicateId(deal.id));
    }

    table.order.push(deal.id.clone());
    table.deals.insert(deal.id.clone(), deal);
    Ok(())
}

/// Insert a batch all-or-nothing
///
/// Every record is checked against the table and the rest of the batch
/// before the first insert.
pub fn insert_all(table: &mut DealTable, batch: Vec<Deal>) -> Result<usize> {
    let mut seen = HashSet::new();
    for deal in &batch {
        check_record(deal)?;
        if table.deals.contains_key(&deal.id) || !seen.insert(deal.id.as_str()) {
            return Err(AppError::DuplicateId(deal.id.clone()));
        }
    }

    let loaded = batch.len();
    for deal in batch {
        table.order.push(deal.id.clone());
        table.deals.insert(deal.id.clone(), deal);
    }
    Ok(loaded)
}

/// Get a deal by id
pub fn get<'a>(table: &'a DealTable, id: &str) -> Option<&'a Deal> {
    table.deals.get(id)
}

/// Get a deal by id for mutation
pub fn get_mut<'a>(table: &'a mut DealTable, id: &str) -> Option<&'a mut Deal> {
    table.deals.get_mut(id)
}

/// All deals in board order
pub fn list(table: &DealTable) -> Vec<Deal> {
    table
        .order
        .iter()
        .filter_map(|id| table.deals.get(id))
        .cloned()
        .collect()
}

/// Remove a deal
pub fn remove(table: &mut DealTable, id: &str) -> Option<Deal> {
    let removed = table.deals.remove(id)?;
    table.order.retain(|existing| existing != id);
    Some(removed)
}

/// Number of stored deals
pub fn count(table: &DealTable) -> usize {
    table.deals.len()
}

/// Drop every deal
pub fn clear(table: &mut DealTable) {
    table.deals.clear();
    table.order.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{DealStage, FinancialDetails, Priority, StageHistoryEntry};
    use chrono::{TimeZone, Utc};

    fn deal(id: &str) -> Deal {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        Deal {
            id: id.to_string(),
            title: format!("Deal {}", id),
            address: String::new(),
            property_type: None,
            contact_name: None,
            stage: DealStage::Prospecting,
            priority: Priority::Low,
            value: 0.0,
            potential_profit: 0.0,
            financial: FinancialDetails::default(),
            stage_history: vec![StageHistoryEntry::new(DealStage::Prospecting, now)],
            flagged: false,
            notes: None,
            tasks: vec![],
            documents: vec![],
            communications: vec![],
            created_at: now,
            last_updated: now,
        }
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut table = DealTable::default();
        insert(&mut table, deal("b")).unwrap();
        insert(&mut table, deal("a")).unwrap();
        insert(&mut table, deal("c")).unwrap();

        let ids: Vec<String> = list(&table).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut table = DealTable::default();
        insert(&mut table, deal("a")).unwrap();

        let result = insert(&mut table, deal("a"));
        assert!(matches!(result, Err(AppError::DuplicateId(id)) if id == "a"));
        assert_eq!(count(&table), 1);
    }

    #[test]
    fn test_malformed_records_rejected() {
        let mut table = DealTable::default();

        let mut no_history = deal("a");
        no_history.stage_history.clear();
        assert!(matches!(insert(&mut table, no_history), Err(AppError::Validation(_))));

        let mut stale_history = deal("b");
        stale_history.stage = DealStage::Closing;
        assert!(matches!(insert(&mut table, stale_history), Err(AppError::Validation(_))));

        let mut losing = deal("c");
        losing.potential_profit = -5.0;
        assert!(matches!(insert(&mut table, losing), Err(AppError::Validation(_))));

        assert!(matches!(insert(&mut table, deal(" ")), Err(AppError::Validation(_))));
        assert_eq!(count(&table), 0);
    }

    #[test]
    fn test_insert_all_is_atomic() {
        let mut table = DealTable::default();
        insert(&mut table, deal("existing")).unwrap();

        let batch = vec![deal("x"), deal("y"), deal("x"), deal("z")];
        let result = insert_all(&mut table, batch);
        assert!(matches!(result, Err(AppError::DuplicateId(id)) if id == "x"));
        assert_eq!(count(&table), 1);

        let batch = vec![deal("x"), deal("existing")];
        assert!(matches!(insert_all(&mut table, batch), Err(AppError::DuplicateId(_))));
        assert_eq!(count(&table), 1);

        let mut broken = deal("w");
        broken.stage_history.clear();
        assert!(insert_all(&mut table, vec![deal("v"), broken]).is_err());
        assert_eq!(count(&table), 1);

        assert_eq!(insert_all(&mut table, vec![deal("x"), deal("y")]).unwrap(), 2);
        let ids: Vec<String> = list(&table).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["existing", "x", "y"]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut table = DealTable::default();
        insert(&mut table, deal("a")).unwrap();
        insert(&mut table, deal("b")).unwrap();

        assert!(remove(&mut table, "a").is_some());
        assert!(remove(&mut table, "a").is_none());
        assert_eq!(list(&table).len(), 1);

        clear(&mut table);
        assert_eq!(count(&table), 0);
    }
}
