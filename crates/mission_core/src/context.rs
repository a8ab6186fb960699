use std::collections::BTreeSet;

use crate::{Category, Constants, MissionContext, RiskAnalysis, RiskClass, TargetProfile};

const LIGHT_MAX_G: f64 = 2500.0;
const MEDIUM_MAX_G: f64 = 6000.0;
const MEDIUM_RISK_MIN: f64 = 40.0;
const HIGH_RISK_MIN: f64 = 70.0;
const MIN_RISK: f64 = 0.0;
const MAX_RISK: f64 = 100.0;

/// Map a raw target profile and optional analysis into a `MissionContext`.
pub fn build_context(
    profile: &TargetProfile,
    analysis: Option<&RiskAnalysis>,
    constants: &Constants,
) -> MissionContext {
    let risk_total = analysis
        .map_or(constants.default_risk_total, |a| a.risk_total)
        .clamp(MIN_RISK, MAX_RISK);
    let risk_class = analysis
        .and_then(|a| a.risk_class)
        .unwrap_or_else(|| classify_risk(risk_total));
    let power_budget = analysis.and_then(|a| a.power_required).unwrap_or_else(|| {
        (risk_total * constants.power_per_risk).clamp(constants.min_power, constants.max_power)
    });
    let distance_km = analysis.map_or(constants.default_distance_km, |a| a.distance_km);

    MissionContext {
        target_id: profile.id,
        state: profile.state,
        threat_tags: normalize_tags(&profile.ability_tags),
        category: classify_category(profile.mass_g),
        risk_class,
        risk_total,
        power_budget,
        distance_m: distance_km * 1000.0,
        height_cm: profile.height_cm,
        mass_g: profile.mass_g,
        heart_rate_bpm: profile.heart_rate_bpm.unwrap_or(0.0),
        mutation_count: profile.mutation_count.unwrap_or(0),
    }
}

/// Upper bounds are inclusive: 2500 g is still light.
pub fn classify_category(mass_g: f64) -> Category {
    if mass_g <= LIGHT_MAX_G {
        Category::Light
    } else if mass_g <= MEDIUM_MAX_G {
        Category::Medium
    } else {
        Category::Heavy
    }
}

pub fn classify_risk(risk_total: f64) -> RiskClass {
    if risk_total >= HIGH_RISK_MIN {
        RiskClass::High
    } else if risk_total >= MEDIUM_RISK_MIN {
        RiskClass::Medium
    } else {
        RiskClass::Low
    }
}

/// Sightings report tags as free text, sometimes several per entry.
fn normalize_tags(raw: &[String]) -> BTreeSet<String> {
    raw.iter()
        .flat_map(|entry| entry.split([';', ',']))
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_lowercase)
        .collect()
}
