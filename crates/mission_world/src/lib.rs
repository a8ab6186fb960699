//! Content loading shared by the daemon and the tests: rule catalog, target
//! roster and tunables from `content/*.json`.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{ensure, Context, Result};
use mission_core::{
    Constants, DefenseRule, RiskAnalysis, RuleCatalog, RuleId, TacticRule, TargetDirectory,
    TargetId, TargetProfile, WeaknessRule,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
struct TacticsFile {
    tactics: Vec<TacticRule>,
}

#[derive(Deserialize)]
struct DefensesFile {
    defenses: Vec<DefenseRule>,
}

#[derive(Deserialize)]
struct WeaknessesFile {
    weaknesses: Vec<WeaknessRule>,
}

#[derive(Deserialize)]
struct TargetsFile {
    targets: Vec<TargetRecord>,
}

/// A tracked target as stored in `targets.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetRecord {
    pub name: String,
    pub profile: TargetProfile,
    /// Targets that were never analysed plan with default risk.
    #[serde(default)]
    pub analysis: Option<RiskAnalysis>,
}

/// JSON-backed `TargetDirectory`.
#[derive(Debug, Clone, Default)]
pub struct TargetRoster {
    records: BTreeMap<TargetId, TargetRecord>,
}

impl TargetRoster {
    pub fn from_records(records: Vec<TargetRecord>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for record in records {
            let id = record.profile.id;
            ensure!(
                map.insert(id, record).is_none(),
                "duplicate target id {id}"
            );
        }
        Ok(Self { records: map })
    }

    pub fn ids(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.records.keys().copied()
    }

    pub fn get(&self, id: TargetId) -> Option<&TargetRecord> {
        self.records.get(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TargetDirectory for TargetRoster {
    fn target_profile(&self, id: TargetId) -> Option<TargetProfile> {
        self.records.get(&id).map(|r| r.profile.clone())
    }

    fn risk_analysis(&self, id: TargetId) -> Option<RiskAnalysis> {
        self.records.get(&id).and_then(|r| r.analysis.clone())
    }
}

/// Everything the daemon needs to plan and fly missions.
#[derive(Debug, Clone)]
pub struct Content {
    pub constants: Constants,
    pub catalog: RuleCatalog,
    pub targets: TargetRoster,
}

fn read_json<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T> {
    let raw = std::fs::read_to_string(dir.join(file)).with_context(|| format!("reading {file}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {file}"))
}

pub fn load_constants(content_dir: &Path) -> Result<Constants> {
    let constants: Constants = read_json(content_dir, "constants.json")?;
    validate_constants(&constants).context("validating constants.json")?;
    Ok(constants)
}

pub fn load_catalog(content_dir: &Path) -> Result<RuleCatalog> {
    let tactics: TacticsFile = read_json(content_dir, "tactics.json")?;
    let defenses: DefensesFile = read_json(content_dir, "defenses.json")?;
    let weaknesses: WeaknessesFile = read_json(content_dir, "weaknesses.json")?;
    let catalog = RuleCatalog {
        tactics: tactics.tactics,
        defenses: defenses.defenses,
        weaknesses: weaknesses.weaknesses,
    };
    validate_catalog(&catalog).context("validating rule catalog")?;
    Ok(catalog)
}

pub fn load_targets(content_dir: &Path) -> Result<TargetRoster> {
    let file: TargetsFile = read_json(content_dir, "targets.json")?;
    for record in &file.targets {
        validate_target(record).with_context(|| format!("validating target '{}'", record.name))?;
    }
    TargetRoster::from_records(file.targets).context("indexing targets.json")
}

pub fn load_content(content_dir: &Path) -> Result<Content> {
    let content = Content {
        constants: load_constants(content_dir)?,
        catalog: load_catalog(content_dir)?,
        targets: load_targets(content_dir)?,
    };
    tracing::info!(
        "loaded {} tactics, {} defenses, {} weaknesses, {} targets from {}",
        content.catalog.tactics.len(),
        content.catalog.defenses.len(),
        content.catalog.weaknesses.len(),
        content.targets.len(),
        content_dir.display()
    );
    Ok(content)
}

fn ensure_unique<'a>(kind: &str, ids: impl Iterator<Item = &'a RuleId>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        ensure!(seen.insert(*id), "duplicate {kind} id {id}");
    }
    Ok(())
}

fn ensure_unit(what: &str, value: f64) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&value),
        "{what} must be within [0, 1], got {value}"
    );
    Ok(())
}

/// Rejects duplicate ids, out-of-range bonuses or mitigations, inverted
/// bounds, and a second tag-less fallback defense.
pub fn validate_catalog(catalog: &RuleCatalog) -> Result<()> {
    ensure_unique("tactic", catalog.tactics.iter().map(|t| &t.id))?;
    ensure_unique("defense", catalog.defenses.iter().map(|d| &d.id))?;
    ensure_unique("weakness", catalog.weaknesses.iter().map(|w| &w.id))?;
    catalog.tactics.iter().try_for_each(validate_tactic)?;
    catalog.weaknesses.iter().try_for_each(validate_weakness)?;
    catalog.defenses.iter().try_for_each(validate_defense)?;

    let tagless_fallbacks = catalog
        .defenses
        .iter()
        .filter(|d| d.fallback && d.threat_tags.is_empty())
        .count();
    ensure!(
        tagless_fallbacks <= 1,
        "at most one tag-less fallback defense is allowed, found {tagless_fallbacks}"
    );
    Ok(())
}

fn validate_tactic(tactic: &TacticRule) -> Result<()> {
    ensure!(!tactic.name.is_empty(), "tactic {} has an empty name", tactic.id);
    let c = &tactic.condition;
    if let (Some(min), Some(max)) = (c.height_min_cm, c.height_max_cm) {
        ensure!(min <= max, "tactic '{}' height bounds are inverted", tactic.name);
    }
    if let (Some(min), Some(max)) = (c.mutations_min, c.mutations_max) {
        ensure!(min <= max, "tactic '{}' mutation bounds are inverted", tactic.name);
    }
    Ok(())
}

fn validate_weakness(weakness: &WeaknessRule) -> Result<()> {
    ensure_unit(
        &format!("weakness '{}' success_bonus", weakness.name),
        weakness.success_bonus,
    )?;
    let c = &weakness.condition;
    if let (Some(min), Some(max)) = (c.mutations_min, c.mutations_max) {
        ensure!(min <= max, "weakness '{}' mutation bounds are inverted", weakness.name);
    }
    Ok(())
}

fn validate_defense(defense: &DefenseRule) -> Result<()> {
    ensure!(!defense.name.is_empty(), "defense {} has an empty name", defense.id);
    ensure_unit(
        &format!("defense '{}' mitigation", defense.name),
        defense.mitigation,
    )
}

pub fn validate_constants(c: &Constants) -> Result<()> {
    ensure!(c.ticks_per_minute > 0.0, "ticks_per_minute must be positive");
    ensure!(c.timeline_capacity > 0, "timeline_capacity must be positive");
    ensure!(c.engagement_cadence_ticks > 0, "engagement_cadence_ticks must be positive");
    ensure!(c.damage_risk_divisor > 0.0, "damage_risk_divisor must be positive");
    ensure!(c.default_page_size > 0, "default_page_size must be positive");
    ensure_unit("base_engagement_chance", c.base_engagement_chance)?;
    ensure_unit("max_engagement_chance", c.max_engagement_chance)?;
    ensure_unit("max_damage_chance", c.max_damage_chance)?;
    ensure_unit("fallback_mitigation_share", c.fallback_mitigation_share)?;
    ensure!(
        c.target_damage_min <= c.target_damage_max,
        "target damage range is inverted"
    );
    ensure!(
        c.hull_damage_min <= c.hull_damage_max,
        "hull damage range is inverted"
    );
    ensure!(c.min_power <= c.max_power, "power range is inverted");
    ensure!(
        c.launch_distance_m.is_finite() && c.launch_distance_m >= 0.0,
        "launch_distance_m must be a non-negative number"
    );
    Ok(())
}

fn validate_target(record: &TargetRecord) -> Result<()> {
    let p = &record.profile;
    ensure!(!record.name.is_empty(), "target {} has an empty name", p.id);
    ensure!(p.mass_g > 0.0, "mass_g must be positive, got {}", p.mass_g);
    ensure!(p.height_cm >= 0.0, "height_cm must not be negative");
    if let Some(analysis) = &record.analysis {
        ensure!(
            (0.0..=100.0).contains(&analysis.risk_total),
            "risk_total must be within [0, 100], got {}",
            analysis.risk_total
        );
        ensure!(analysis.distance_km >= 0.0, "distance_km must not be negative");
    }
    Ok(())
}
