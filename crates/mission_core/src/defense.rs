use std::collections::BTreeSet;

use rand::Rng;

use crate::{DefenseLoadout, DefenseRule, DefenseSelection, MissionContext};

const TAG_OVERLAP_WEIGHT: f64 = 10.0;

/// Pick a primary and a fallback countermeasure for `context`.
///
/// Tagged candidates and fallbacks are weighted draws, each with its own roll,
/// so two plans for the same target may differ.
pub fn select_defenses(
    defenses: &[DefenseRule],
    context: &MissionContext,
    rng: &mut impl Rng,
) -> DefenseLoadout {
    let primary =
        tagged_primary(defenses, &context.threat_tags, rng).or_else(|| generic_primary(defenses));

    let mut fallback: Option<DefenseSelection> = None;
    for defense in defenses.iter().filter(|d| d.fallback) {
        let weight = f64::from(defense.rarity) * rng.gen::<f64>();
        if fallback.as_ref().is_none_or(|best| weight > best.weight) {
            fallback = Some(DefenseSelection {
                rule: defense.clone(),
                weight,
            });
        }
    }

    DefenseLoadout { primary, fallback }
}

fn tagged_primary(
    defenses: &[DefenseRule],
    tags: &BTreeSet<String>,
    rng: &mut impl Rng,
) -> Option<DefenseSelection> {
    let mut best: Option<DefenseSelection> = None;
    for defense in defenses.iter().filter(|d| !d.fallback) {
        let overlap = defense
            .threat_tags
            .iter()
            .filter(|tag| tags.contains(&tag.to_lowercase()))
            .count();
        if overlap == 0 {
            continue;
        }
        let base = f64::from(defense.rarity) + TAG_OVERLAP_WEIGHT * overlap as f64;
        let weight = base * rng.gen::<f64>();
        if best.as_ref().is_none_or(|b| weight > b.weight) {
            best = Some(DefenseSelection {
                rule: defense.clone(),
                weight,
            });
        }
    }
    best
}

/// Tag-less defenses are preferred; any non-fallback entry will do otherwise.
fn generic_primary(defenses: &[DefenseRule]) -> Option<DefenseSelection> {
    defenses
        .iter()
        .filter(|d| !d.fallback)
        .find(|d| d.threat_tags.is_empty())
        .or_else(|| defenses.iter().find(|d| !d.fallback))
        .map(|defense| DefenseSelection {
            rule: defense.clone(),
            weight: f64::from(defense.rarity),
        })
}
