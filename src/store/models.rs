//! Deal pipeline models

use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pipeline stage, in board order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStage {
    Prospecting,
    UnderContract,
    DueDiligence,
    Negotiations,
    Closing,
}

impl DealStage {
    /// All stages in board order
    pub const ALL: [DealStage; 5] = [
        DealStage::Prospecting,
        DealStage::UnderContract,
        DealStage::DueDiligence,
        DealStage::Negotiations,
        DealStage::Closing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DealStage::Prospecting => "prospecting",
            DealStage::UnderContract => "under_contract",
            DealStage::DueDiligence => "due_diligence",
            DealStage::Negotiations => "negotiations",
            DealStage::Closing => "closing",
        }
    }

    /// Column heading on the board
    pub fn label(&self) -> &'static str {
        match self {
            DealStage::Prospecting => "Prospecting",
            DealStage::UnderContract => "Under Contract",
            DealStage::DueDiligence => "Due Diligence",
            DealStage::Negotiations => "Negotiations",
            DealStage::Closing => "Closing",
        }
    }

    /// Fixed probability that a deal in this stage closes
    pub fn close_probability(&self) -> f64 {
        match self {
            DealStage::Prospecting => 0.20,
            DealStage::UnderContract => 0.40,
            DealStage::DueDiligence => 0.60,
            DealStage::Negotiations => 0.80,
            DealStage::Closing => 0.95,
        }
    }
}

impl fmt::Display for DealStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DealStage {
    type Err = AppError;

    /// Accepts `under_contract`, `under-contract` or `Under Contract`
    fn from_str(s: &str) -> Result<Self> {
        let key = normalize_name(s);
        DealStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == key)
            .ok_or_else(|| AppError::Validation(format!("Unknown deal stage '{}'", s)))
    }
}

/// Deal priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_name(s).as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(AppError::Validation(format!("Unknown priority '{}'", s))),
        }
    }
}

fn normalize_name(s: &str) -> String {
    s.trim()
        .to_ascii_lowercase()
        .replace(['-', ' '], "_")
}

/// Purchase and operating figures for a property
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialDetails {
    pub purchase_price: f64,
    pub closing_costs: f64,
    pub repair_costs: f64,
    /// After-repair value
    pub arv: f64,
    pub monthly_rent: Option<f64>,
    pub monthly_costs: Option<f64>,
    pub cap_rate: Option<f64>,
    pub cash_on_cash: Option<f64>,
}

impl FinancialDetails {
    /// ARV minus every acquisition cost, never below zero
    pub fn potential_profit(&self) -> f64 {
        (self.arv - self.purchase_price - self.closing_costs - self.repair_costs).max(0.0)
    }

    /// Cash needed to acquire and fix the property
    pub fn total_investment(&self) -> f64 {
        self.purchase_price + self.closing_costs + self.repair_costs
    }

    /// Recompute cap rate and cash-on-cash from rent, when rent is known
    pub fn derive_rental_metrics(&mut self) {
        let Some(rent) = self.monthly_rent else {
            return;
        };

        let annual_net = (rent - self.monthly_costs.unwrap_or(0.0)) * 12.0;

        self.cap_rate = (self.purchase_price > 0.0)
            .then(|| annual_net / self.purchase_price * 100.0);

        let invested = self.total_investment();
        self.cash_on_cash = (invested > 0.0).then(|| annual_net / invested * 100.0);
    }

    /// Reject negative or non-finite money
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("purchase_price", self.purchase_price),
            ("closing_costs", self.closing_costs),
            ("repair_costs", self.repair_costs),
            ("arv", self.arv),
        ];
        let optional = [
            ("monthly_rent", self.monthly_rent),
            ("monthly_costs", self.monthly_costs),
        ];

        let fields = required
            .into_iter()
            .chain(optional.into_iter().filter_map(|(name, v)| v.map(|v| (name, v))));

        for (name, amount) in fields {
            if !amount.is_finite() {
                return Err(AppError::Validation(format!("{} must be a finite number", name)));
            }
            if amount < 0.0 {
                return Err(AppError::Validation(format!(
                    "{} cannot be negative (got {})",
                    name, amount
                )));
            }
        }

        Ok(())
    }
}

/// One residency of a deal in a stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageHistoryEntry {
    pub stage: DealStage,
    pub date: DateTime<Utc>,
    /// Snapshot counter; zero when the entry is written
    pub days_in_stage: i64,
}

impl StageHistoryEntry {
    pub fn new(stage: DealStage, date: DateTime<Utc>) -> Self {
        Self {
            stage,
            date,
            days_in_stage: 0,
        }
    }
}

/// Follow-up task attached to a deal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealTask {
    pub id: String,
    pub title: String,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
}

/// File attached to a deal (contract, inspection report, LOI)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealDocument {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationChannel {
    Email,
    Call,
    Text,
    Meeting,
    Note,
}

/// Logged contact with a seller, agent or lender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Communication {
    pub id: String,
    pub channel: CommunicationChannel,
    pub summary: String,
    pub occurred_at: DateTime<Utc>,
}

/// Deal model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    pub title: String,
    pub address: String,
    pub property_type: Option<String>,
    pub contact_name: Option<String>,
    pub stage: DealStage,
    pub priority: Priority,
    /// Purchase price
    pub value: f64,
    pub potential_profit: f64,
    pub financial: FinancialDetails,
    pub stage_history: Vec<StageHistoryEntry>,
    pub flagged: bool,
    pub notes: Option<String>,
    pub tasks: Vec<DealTask>,
    pub documents: Vec<DealDocument>,
    pub communications: Vec<Communication>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Deal {
    /// When the deal entered its current stage
    pub fn stage_entered_at(&self) -> DateTime<Utc> {
        self.stage_history
            .last()
            .map(|entry| entry.date)
            .unwrap_or(self.created_at)
    }

    /// Whole days since the last stage change
    pub fn days_in_current_stage(&self, now: DateTime<Utc>) -> i64 {
        (now - self.stage_entered_at()).num_days().max(0)
    }

    /// Recorded residency days plus the current residency
    pub fn cycle_days(&self, now: DateTime<Utc>) -> i64 {
        let recorded: i64 = self.stage_history.iter().map(|e| e.days_in_stage).sum();
        recorded + self.days_in_current_stage(now)
    }

    /// Refresh every field derived from `financial`
    pub fn refresh_financials(&mut self) {
        self.financial.derive_rental_metrics();
        self.value = self.financial.purchase_price;
        self.potential_profit = self.financial.potential_profit();
    }

    /// Whether the last history entry agrees with `stage`
    pub fn history_is_consistent(&self) -> bool {
        self.stage_history
            .last()
            .is_some_and(|entry| entry.stage == self.stage)
    }
}

/// Input for creating a deal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewDeal {
    pub id: Option<String>,
    pub title: String,
    pub address: String,
    pub property_type: Option<String>,
    pub contact_name: Option<String>,
    pub stage: Option<DealStage>,
    pub priority: Option<Priority>,
    pub financial: FinancialDetails,
    pub flagged: bool,
    pub notes: Option<String>,
}

/// Board filter; unset fields match everything
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DealFilter {
    pub stage: Option<DealStage>,
    pub priority: Option<Priority>,
    pub flagged: Option<bool>,
    /// Case-insensitive match on title, address or contact
    pub query: Option<String>,
}

impl DealFilter {
    pub fn matches(&self, deal: &Deal) -> bool {
        if self.stage.is_some_and(|s| s != deal.stage) {
            return false;
        }
        if self.priority.is_some_and(|p| p != deal.priority) {
            return false;
        }
        if self.flagged.is_some_and(|f| f != deal.flagged) {
            return false;
        }

        match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let q = q.to_lowercase();
                deal.title.to_lowercase().contains(&q)
                    || deal.address.to_lowercase().contains(&q)
                    || deal
                        .contact_name
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(&q))
            }
            _ => true,
        }
    }
}

/// Per-stage slice of the pipeline metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageMetrics {
    pub stage: DealStage,
    pub count: usize,
    pub value: f64,
    pub profit: f64,
    pub avg_days_in_stage: f64,
    pub probability: f64,
}

impl StageMetrics {
    /// Zeroed metrics for a stage with no deals
    pub fn empty(stage: DealStage) -> Self {
        Self {
            stage,
            count: 0,
            value: 0.0,
            profit: 0.0,
            avg_days_in_stage: 0.0,
            probability: stage.close_probability(),
        }
    }
}

/// Snapshot of the whole pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineMetrics {
    /// One entry per stage, in board order
    pub stages: Vec<StageMetrics>,
    pub total_deals: usize,
    pub total_value: f64,
    pub total_profit: f64,
    /// Percent of Closing deals relative to Prospecting deals
    pub conversion_rate: u32,
    pub avg_deal_cycle: f64,
    pub bottleneck_stage: DealStage,
    pub weighted_forecast: f64,
    pub weighted_profit_forecast: f64,
    pub generated_at: DateTime<Utc>,
}

impl PipelineMetrics {
    /// Metrics for one stage; a stage missing from `stages` reads as empty
    pub fn stage(&self, stage: DealStage) -> StageMetrics {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .cloned()
            .unwrap_or_else(|| StageMetrics::empty(stage))
    }
}
