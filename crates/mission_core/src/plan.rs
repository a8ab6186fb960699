//! Mission planning: context, weaknesses, tactics and defenses for a target.

use rand::Rng;

use crate::context::build_context;
use crate::defense::select_defenses;
use crate::tactics::select_tactics;
use crate::types::round2;
use crate::weakness::evaluate_weaknesses;
use crate::{
    AppliedWeakness, Constants, DefenseLoadout, DefensePlan, DefenseSelection, MissionContext,
    PlannedDefense, PlannedTactic, RiskAnalysis, RuleCatalog, StrategyPlan, TacticSelection,
    TargetProfile, WeaknessSummary,
};

#[derive(Debug, Clone)]
pub struct MissionPlan {
    pub context: MissionContext,
    pub weaknesses: Vec<AppliedWeakness>,
    /// Engagement rotation, best first. Never empty.
    pub tactics: Vec<TacticSelection>,
    pub defenses: DefenseLoadout,
}

impl MissionPlan {
    pub fn build(
        profile: &TargetProfile,
        analysis: Option<&RiskAnalysis>,
        catalog: &RuleCatalog,
        constants: &Constants,
        rng: &mut impl Rng,
    ) -> Self {
        let context = build_context(profile, analysis, constants);
        let weaknesses = evaluate_weaknesses(&catalog.weaknesses, &context);
        let tactics = select_tactics(&catalog.tactics, &context, &weaknesses);
        let defenses = select_defenses(&catalog.defenses, &context, rng);
        Self {
            context,
            weaknesses,
            tactics,
            defenses,
        }
    }

    pub fn total_weakness_bonus(&self) -> f64 {
        self.weaknesses.iter().map(|w| w.bonus).sum()
    }

    pub fn strategy(&self) -> StrategyPlan {
        StrategyPlan {
            category: self.context.category,
            risk_class: self.context.risk_class,
            tactics: self
                .tactics
                .iter()
                .map(|t| PlannedTactic {
                    name: t.rule.name.clone(),
                    description: t.rule.description.clone(),
                    priority: t.rule.priority,
                    weakness_bonus: round2(t.weakness_bonus),
                    exploits_weakness: t.weakness_bonus > 0.0,
                })
                .collect(),
        }
    }

    pub fn defense(&self) -> DefensePlan {
        DefensePlan {
            primary: self.defenses.primary.as_ref().map(planned_defense),
            fallback: self.defenses.fallback.as_ref().map(planned_defense),
        }
    }

    pub fn weakness_summaries(&self) -> Vec<WeaknessSummary> {
        self.weaknesses
            .iter()
            .map(|w| WeaknessSummary {
                id: w.rule.id,
                name: w.rule.name.clone(),
                description: w.rule.description.clone(),
                success_bonus: round2(w.bonus),
            })
            .collect()
    }
}

fn planned_defense(selection: &DefenseSelection) -> PlannedDefense {
    PlannedDefense {
        name: selection.rule.name.clone(),
        countermeasure: selection.rule.countermeasure.clone(),
        threat_tags: selection.rule.threat_tags.clone(),
        rarity: selection.rule.rarity,
        mitigation: round2(selection.rule.mitigation),
    }
}
