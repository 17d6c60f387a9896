//! Sample portfolio for demos and first launch

use crate::store::models::{
    Deal, DealStage, DealTask, FinancialDetails, Priority, StageHistoryEntry,
};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

struct SeedDeal {
    title: &'static str,
    address: &'static str,
    property_type: &'static str,
    contact: &'static str,
    priority: Priority,
    flagged: bool,
    financial: FinancialDetails,
    /// (stage, days ago the stage was entered)
    path: &'static [(DealStage, i64)],
    task: Option<&'static str>,
}

fn money(purchase: f64, closing: f64, repair: f64, arv: f64) -> FinancialDetails {
    FinancialDetails {
        purchase_price: purchase,
        closing_costs: closing,
        repair_costs: repair,
        arv,
        ..Default::default()
    }
}

fn rental(mut f: FinancialDetails, rent: f64, costs: f64) -> FinancialDetails {
    f.monthly_rent = Some(rent);
    f.monthly_costs = Some(costs);
    f
}

fn seeds() -> Vec<SeedDeal> {
    use DealStage::*;

    vec![
        SeedDeal {
            title: "Maple Ave Fix & Flip",
            address: "418 Maple Ave, Columbus, OH",
            property_type: "Single Family",
            contact: "Dana Whitfield",
            priority: Priority::High,
            flagged: true,
            financial: money(145_000.0, 4_500.0, 38_000.0, 245_000.0),
            path: &[(Prospecting, 6)],
            task: Some("Schedule walkthrough with contractor"),
        },
        SeedDeal {
            title: "Riverside Fourplex",
            address: "77 Riverside Dr, Dayton, OH",
            property_type: "Multi-Family",
            contact: "Marco Ruiz",
            priority: Priority::Medium,
            flagged: false,
            financial: rental(money(360_000.0, 9_000.0, 25_000.0, 430_000.0), 4_800.0, 1_650.0),
            path: &[(Prospecting, 21), (UnderContract, 9)],
            task: Some("Order rent roll and leases"),
        },
        SeedDeal {
            title: "Oak Hollow Rental",
            address: "2209 Oak Hollow Ln, Akron, OH",
            property_type: "Single Family",
            contact: "Priya Natarajan",
            priority: Priority::Low,
            flagged: false,
            financial: rental(money(118_000.0, 3_200.0, 12_000.0, 150_000.0), 1_450.0, 420.0),
            path: &[(Prospecting, 40), (UnderContract, 30), (DueDiligence, 14)],
            task: Some("Review inspection report"),
        },
        SeedDeal {
            title: "Downtown Mixed-Use",
            address: "15 Market St, Cincinnati, OH",
            property_type: "Mixed Use",
            contact: "Helen Osei",
            priority: Priority::High,
            flagged: true,
            financial: money(720_000.0, 18_000.0, 95_000.0, 910_000.0),
            path: &[(Prospecting, 60), (UnderContract, 45), (DueDiligence, 31), (Negotiations, 11)],
            task: None,
        },
        SeedDeal {
            title: "Lakeview Condo Wholesale",
            address: "9 Lakeview Ct #4B, Cleveland, OH",
            property_type: "Condo",
            contact: "Sam Kowalski",
            priority: Priority::Medium,
            flagged: false,
            financial: money(96_000.0, 2_400.0, 6_500.0, 128_000.0),
            path: &[
                (Prospecting, 55),
                (UnderContract, 38),
                (DueDiligence, 20),
                (Negotiations, 12),
                (Closing, 3),
            ],
            task: Some("Confirm title company wire instructions"),
        },
        SeedDeal {
            title: "Elm Street Duplex",
            address: "340 Elm St, Toledo, OH",
            property_type: "Duplex",
            contact: "Rita Alvarez",
            priority: Priority::Medium,
            flagged: false,
            financial: rental(money(189_000.0, 5_100.0, 22_000.0, 250_000.0), 2_300.0, 780.0),
            path: &[(Prospecting, 3)],
            task: None,
        },
    ]
}

/// Build the sample portfolio with stage history backdated from `now`
pub fn sample_deals(now: DateTime<Utc>) -> Vec<Deal> {
    seeds()
        .into_iter()
        .map(|seed| build(seed, now))
        .collect()
}

fn build(seed: SeedDeal, now: DateTime<Utc>) -> Deal {
    let stage_history: Vec<StageHistoryEntry> = seed
        .path
        .iter()
        .map(|&(stage, days_ago)| StageHistoryEntry::new(stage, now - Duration::days(days_ago)))
        .collect();

    let (stage, entered) = seed
        .path
        .last()
        .map(|&(stage, days_ago)| (stage, now - Duration::days(days_ago)))
        .unwrap_or((DealStage::Prospecting, now));
    let created_at = stage_history.first().map(|e| e.date).unwrap_or(now);

    let tasks = seed
        .task
        .map(|title| DealTask {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            due_date: Some(now + Duration::days(7)),
            completed: false,
        })
        .into_iter()
        .collect();

    let mut deal = Deal {
        id: Uuid::new_v4().to_string(),
        title: seed.title.to_string(),
        address: seed.address.to_string(),
        property_type: Some(seed.property_type.to_string()),
        contact_name: Some(seed.contact.to_string()),
        stage,
        priority: seed.priority,
        value: 0.0,
        potential_profit: 0.0,
        financial: seed.financial,
        stage_history,
        flagged: seed.flagged,
        notes: None,
        tasks,
        documents: vec![],
        communications: vec![],
        created_at,
        last_updated: entered,
    };
    deal.refresh_financials();
    deal
}
