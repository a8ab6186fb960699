//! Shared test fixtures for mission_core and downstream crates.
//!
//! `base_catalog()` mirrors the shipped content closely enough for planning
//! tests. `StaticDirectory` is an in-memory `TargetDirectory`.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    BehavioralState, Category, Constants, DefenseRule, PriorityClass, RiskAnalysis, RiskClass,
    RuleCatalog, RuleId, TacticAction, TacticCondition, TacticRule, TargetDirectory, TargetId,
    TargetProfile, WeaknessCondition, WeaknessRule,
};

pub fn make_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}

/// Reference constants with a 1 ms tick so actor tests finish quickly.
pub fn fast_constants() -> Constants {
    Constants {
        tick_interval_ms: 1,
        ..Constants::default()
    }
}

fn tactic(id: u64, name: &str, priority: i32, condition: TacticCondition) -> TacticRule {
    TacticRule {
        id: RuleId(id),
        name: name.to_string(),
        description: format!("{name} (test)"),
        condition,
        priority,
        action: TacticAction {
            kind: "maneuver".to_string(),
            label: name.to_lowercase().replace(' ', "_"),
            note: None,
        },
    }
}

fn defense(id: u64, name: &str, tags: &[&str], rarity: u32, mitigation: f64) -> DefenseRule {
    DefenseRule {
        id: RuleId(id),
        name: name.to_string(),
        threat_tags: tags.iter().map(|t| (*t).to_string()).collect(),
        countermeasure: format!("{name} countermeasure"),
        rarity,
        mitigation,
        fallback: false,
    }
}

fn weakness(id: u64, name: &str, bonus: f64, condition: WeaknessCondition) -> WeaknessRule {
    WeaknessRule {
        id: RuleId(id),
        name: name.to_string(),
        condition,
        success_bonus: bonus,
        description: format!("{name} (test)"),
    }
}

/// Eight tactics, seven defenses (one fallback), five weaknesses.
pub fn base_catalog() -> RuleCatalog {
    RuleCatalog {
        tactics: base_tactics(),
        defenses: base_defenses(),
        weaknesses: base_weaknesses(),
    }
}

pub fn base_tactics() -> Vec<TacticRule> {
    vec![
        tactic(
            1001,
            "Overhead strike",
            80,
            TacticCondition {
                height_min_cm: Some(100.0),
                ..TacticCondition::default()
            },
        ),
        tactic(
            1002,
            "Dielectric isolation",
            90,
            TacticCondition {
                tag: Some("electric".to_string()),
                ..TacticCondition::default()
            },
        ),
        tactic(
            1003,
            "Containment net",
            85,
            TacticCondition {
                state: Some(BehavioralState::Dormant),
                ..TacticCondition::default()
            },
        ),
        tactic(
            1004,
            "Calming resonance",
            70,
            TacticCondition {
                state: Some(BehavioralState::Trance),
                heart_rate_min: Some(110.0),
                ..TacticCondition::default()
            },
        ),
        tactic(
            1005,
            "Microdrone belt",
            75,
            TacticCondition {
                mutations_min: Some(3),
                ..TacticCondition::default()
            },
        ),
        tactic(
            1006,
            "Stealth approach",
            95,
            TacticCondition {
                risk_class: Some(RiskClass::High),
                ..TacticCondition::default()
            },
        ),
        tactic(
            1007,
            "Foam curtain",
            60,
            TacticCondition {
                category: Some(Category::Light),
                ..TacticCondition::default()
            },
        ),
        tactic(
            1008,
            "Inverse gravity field",
            65,
            TacticCondition {
                category: Some(Category::Heavy),
                ..TacticCondition::default()
            },
        ),
    ]
}

pub fn base_defenses() -> Vec<DefenseRule> {
    vec![
        defense(2001, "Faraday mesh", &["electric", "ballistic"], 24, 0.35),
        defense(2002, "Psionic damper", &["mind_control", "sonic"], 28, 0.40),
        defense(2003, "Warded plating", &["elemental", "ethereal"], 22, 0.32),
        defense(2004, "Heat shield", &["thermal", "igneous"], 18, 0.28),
        defense(2005, "Cocoa decoy", &["chocolate_weakness"], 32, 0.45),
        DefenseRule {
            fallback: true,
            ..defense(2006, "Neutral armor", &[], 12, 0.18)
        },
        defense(2007, "Trance breaker", &["trance"], 26, 0.33),
    ]
}

pub fn base_weaknesses() -> Vec<WeaknessRule> {
    vec![
        weakness(
            3001,
            "Deep sleep",
            0.35,
            WeaknessCondition {
                state: Some(BehavioralState::Dormant),
                ..WeaknessCondition::default()
            },
        ),
        weakness(
            3002,
            "Conductive body",
            0.28,
            WeaknessCondition {
                tag: Some("electric".to_string()),
                ..WeaknessCondition::default()
            },
        ),
        weakness(
            3003,
            "Chocolate craving",
            0.40,
            WeaknessCondition {
                tag: Some("chocolate_weakness".to_string()),
                ..WeaknessCondition::default()
            },
        ),
        weakness(
            3004,
            "Fragile frame",
            0.22,
            WeaknessCondition {
                category: Some(Category::Light),
                mutations_max: Some(1),
                ..WeaknessCondition::default()
            },
        ),
        weakness(
            3005,
            "Unstable genome",
            0.30,
            WeaknessCondition {
                mutations_min: Some(4),
                ..WeaknessCondition::default()
            },
        ),
    ]
}

/// Light, dormant, electric: matches weaknesses 3001, 3002, 3003 and 3004.
pub fn dormant_light_profile() -> TargetProfile {
    TargetProfile {
        id: TargetId(1),
        mass_g: 1800.0,
        height_cm: 40.0,
        state: BehavioralState::Dormant,
        heart_rate_bpm: Some(48.0),
        mutation_count: Some(0),
        ability_tags: vec!["Electric; chocolate_weakness".to_string()],
    }
}

/// Medium, awake, untagged: no weakness and no tactic applies.
pub fn plain_profile() -> TargetProfile {
    TargetProfile {
        id: TargetId(2),
        mass_g: 4000.0,
        height_cm: 60.0,
        state: BehavioralState::Awake,
        heart_rate_bpm: None,
        mutation_count: Some(2),
        ability_tags: vec![],
    }
}

/// Heavy, awake, tall and heavily mutated.
pub fn heavy_profile() -> TargetProfile {
    TargetProfile {
        id: TargetId(3),
        mass_g: 9000.0,
        height_cm: 180.0,
        state: BehavioralState::Awake,
        heart_rate_bpm: Some(95.0),
        mutation_count: Some(5),
        ability_tags: vec!["Ballistic".to_string(), "igneous, sonic".to_string()],
    }
}

pub fn analysis(risk_total: f64) -> RiskAnalysis {
    RiskAnalysis {
        risk_total,
        risk_class: None,
        priority_class: PriorityClass::Medium,
        power_required: None,
        distance_km: 1.5,
    }
}

/// In-memory target directory.
#[derive(Debug, Default, Clone)]
pub struct StaticDirectory {
    profiles: HashMap<TargetId, TargetProfile>,
    analyses: HashMap<TargetId, RiskAnalysis>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_target(mut self, profile: TargetProfile, analysis: Option<RiskAnalysis>) -> Self {
        if let Some(analysis) = analysis {
            self.analyses.insert(profile.id, analysis);
        }
        self.profiles.insert(profile.id, profile);
        self
    }
}

impl TargetDirectory for StaticDirectory {
    fn target_profile(&self, id: TargetId) -> Option<TargetProfile> {
        self.profiles.get(&id).cloned()
    }

    fn risk_analysis(&self, id: TargetId) -> Option<RiskAnalysis> {
        self.analyses.get(&id).cloned()
    }
}
