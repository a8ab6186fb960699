//! Type definitions for `mission_core`.
//!
//! Catalog rules, target inputs, the derived mission context, the mission
//! aggregate and the event log entries.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! numeric_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(MissionId);
numeric_id!(TickId);
numeric_id!(TargetId);
numeric_id!(RuleId);

// ---------------------------------------------------------------------------
// Classification enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehavioralState {
    Awake,
    Trance,
    Dormant,
}

/// Size class derived from body mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Light,
    Medium,
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskClass {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityClass {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Planned,
    Running,
    Aborted,
    Concluded,
}

impl MissionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Aborted | Self::Concluded)
    }
}

// ---------------------------------------------------------------------------
// Collaborator inputs
// ---------------------------------------------------------------------------

/// Physical and behavioral attributes of a tracked target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetProfile {
    pub id: TargetId,
    pub mass_g: f64,
    pub height_cm: f64,
    pub state: BehavioralState,
    #[serde(default)]
    pub heart_rate_bpm: Option<f64>,
    #[serde(default)]
    pub mutation_count: Option<u32>,
    /// Raw special-ability tags as reported by sightings.
    #[serde(default)]
    pub ability_tags: Vec<String>,
}

/// Previously computed risk/priority score for a target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAnalysis {
    pub risk_total: f64,
    /// Overrides the class inferred from `risk_total` when present.
    #[serde(default)]
    pub risk_class: Option<RiskClass>,
    pub priority_class: PriorityClass,
    #[serde(default)]
    pub power_required: Option<f64>,
    pub distance_km: f64,
}

/// Source of target data consumed when a mission is planned.
pub trait TargetDirectory: Send + Sync {
    fn target_profile(&self, id: TargetId) -> Option<TargetProfile>;
    fn risk_analysis(&self, id: TargetId) -> Option<RiskAnalysis>;
}

// ---------------------------------------------------------------------------
// Derived context
// ---------------------------------------------------------------------------

/// Normalized view of a target used by every rule evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionContext {
    pub target_id: TargetId,
    pub state: BehavioralState,
    pub threat_tags: BTreeSet<String>,
    pub category: Category,
    pub risk_class: RiskClass,
    pub risk_total: f64,
    pub power_budget: f64,
    pub distance_m: f64,
    pub height_cm: f64,
    pub mass_g: f64,
    pub heart_rate_bpm: f64,
    pub mutation_count: u32,
}

// ---------------------------------------------------------------------------
// Catalog rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaknessCondition {
    pub state: Option<BehavioralState>,
    pub category: Option<Category>,
    pub tag: Option<String>,
    pub mutations_min: Option<u32>,
    pub mutations_max: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaknessRule {
    pub id: RuleId,
    pub name: String,
    #[serde(default)]
    pub condition: WeaknessCondition,
    pub success_bonus: f64,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TacticCondition {
    pub category: Option<Category>,
    pub risk_class: Option<RiskClass>,
    pub state: Option<BehavioralState>,
    pub tag: Option<String>,
    pub height_min_cm: Option<f64>,
    pub height_max_cm: Option<f64>,
    pub mutations_min: Option<u32>,
    pub mutations_max: Option<u32>,
    pub heart_rate_min: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TacticAction {
    pub kind: String,
    pub label: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TacticRule {
    pub id: RuleId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub condition: TacticCondition,
    pub priority: i32,
    pub action: TacticAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefenseRule {
    pub id: RuleId,
    pub name: String,
    /// Empty means the defense is generic.
    #[serde(default)]
    pub threat_tags: Vec<String>,
    pub countermeasure: String,
    pub rarity: u32,
    pub mitigation: f64,
    #[serde(default)]
    pub fallback: bool,
}

/// Immutable rule sets loaded once at start-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleCatalog {
    pub tactics: Vec<TacticRule>,
    pub defenses: Vec<DefenseRule>,
    pub weaknesses: Vec<WeaknessRule>,
}

// ---------------------------------------------------------------------------
// Selections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AppliedWeakness {
    pub rule: WeaknessRule,
    pub bonus: f64,
}

#[derive(Debug, Clone)]
pub struct TacticSelection {
    pub rule: TacticRule,
    pub weakness_bonus: f64,
}

#[derive(Debug, Clone)]
pub struct DefenseSelection {
    pub rule: DefenseRule,
    pub weight: f64,
}

#[derive(Debug, Clone, Default)]
pub struct DefenseLoadout {
    pub primary: Option<DefenseSelection>,
    pub fallback: Option<DefenseSelection>,
}

impl DefenseLoadout {
    pub fn primary_mitigation(&self) -> f64 {
        self.primary.as_ref().map_or(0.0, |d| d.rule.mitigation)
    }

    pub fn fallback_mitigation(&self) -> f64 {
        self.fallback.as_ref().map_or(0.0, |d| d.rule.mitigation)
    }
}

// ---------------------------------------------------------------------------
// Plan snapshots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedTactic {
    pub name: String,
    pub description: String,
    pub priority: i32,
    pub weakness_bonus: f64,
    pub exploits_weakness: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyPlan {
    pub category: Category,
    pub risk_class: RiskClass,
    pub tactics: Vec<PlannedTactic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedDefense {
    pub name: String,
    pub countermeasure: String,
    pub threat_tags: Vec<String>,
    pub rarity: u32,
    pub mitigation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefensePlan {
    pub primary: Option<PlannedDefense>,
    pub fallback: Option<PlannedDefense>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaknessSummary {
    pub id: RuleId,
    pub name: String,
    pub description: String,
    pub success_bonus: f64,
}

// ---------------------------------------------------------------------------
// Mission aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    pub target_id: TargetId,
    pub status: MissionStatus,
    pub allocated_power: f64,
    pub risk_total: f64,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub result: Option<String>,
    /// Fixed at creation.
    pub strategy: StrategyPlan,
    /// Fixed at creation.
    pub defense: DefensePlan,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub battery_pct: f64,
    pub fuel_pct: f64,
    pub integrity_pct: f64,
    pub distance_m: f64,
}

impl Telemetry {
    pub fn launch(distance_m: f64) -> Self {
        Self {
            battery_pct: 100.0,
            fuel_pct: 100.0,
            integrity_pct: 100.0,
            distance_m,
        }
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.battery_pct.is_finite()
            && self.fuel_pct.is_finite()
            && self.integrity_pct.is_finite()
            && self.distance_m.is_finite()
    }

    pub(crate) fn rounded(&self) -> Self {
        Self {
            battery_pct: round2(self.battery_pct),
            fuel_pct: round2(self.fuel_pct),
            integrity_pct: round2(self.integrity_pct),
            distance_m: round2(self.distance_m),
        }
    }
}

/// Point-in-time view of a mission handed to the hosting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionSnapshot {
    #[serde(flatten)]
    pub mission: Mission,
    pub telemetry: Telemetry,
    pub phase: crate::Phase,
    pub next_phase: Option<crate::Phase>,
    pub weaknesses: Vec<WeaknessSummary>,
    pub seed: u64,
}

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "detail", rename_all = "snake_case")]
pub enum TickEvent {
    MissionStarted,
    PhaseStarted {
        phase: crate::Phase,
    },
    Telemetry {
        phase: crate::Phase,
        tactic: Option<String>,
        abort_requested: bool,
    },
    DamageTaken {
        damage: f64,
        probability: f64,
    },
    TacticExecuted {
        tactic: String,
        chance: f64,
        success: bool,
        target_integrity: f64,
    },
    PhaseCompleted {
        phase: crate::Phase,
    },
    AbortRequested {
        reason: String,
    },
    MissionConcluded {
        success: bool,
        reason: String,
    },
    SimulationFault {
        message: String,
    },
}

impl TickEvent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::MissionStarted => "mission_started",
            Self::PhaseStarted { .. } => "phase_started",
            Self::Telemetry { .. } => "telemetry",
            Self::DamageTaken { .. } => "damage_taken",
            Self::TacticExecuted { .. } => "tactic_executed",
            Self::PhaseCompleted { .. } => "phase_completed",
            Self::AbortRequested { .. } => "abort_requested",
            Self::MissionConcluded { .. } => "mission_concluded",
            Self::SimulationFault { .. } => "simulation_fault",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionTick {
    pub id: TickId,
    pub mission_id: MissionId,
    pub sequence: u64,
    pub phase: crate::Phase,
    #[serde(flatten)]
    pub event: TickEvent,
    pub telemetry: Telemetry,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePage {
    pub page: u32,
    pub page_size: u32,
    pub total_count: usize,
    /// Entries dropped from the front of the log since the mission began.
    pub evicted: u64,
    pub items: Vec<MissionTick>,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
