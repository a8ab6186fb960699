use std::cmp::Ordering;

use crate::{
    AppliedWeakness, MissionContext, RuleId, TacticAction, TacticCondition, TacticRule,
    TacticSelection,
};

pub const MAX_WEAKNESS_BONUS: f64 = 0.4;
const TAG_SHARE: f64 = 0.6;
const STATE_SHARE: f64 = 0.5;
const CATEGORY_SHARE: f64 = 0.4;

pub const DEFAULT_PROTOCOL_ID: RuleId = RuleId(0);
const DEFAULT_PROTOCOL_PRIORITY: i32 = 50;

/// Rank the tactics applicable to `context`. Never returns an empty plan.
///
/// Ordered by declared priority, then by weakness bonus, both descending. The
/// order doubles as the engagement rotation.
pub fn select_tactics(
    rules: &[TacticRule],
    context: &MissionContext,
    weaknesses: &[AppliedWeakness],
) -> Vec<TacticSelection> {
    let mut selected: Vec<TacticSelection> = rules
        .iter()
        .filter(|rule| tactic_matches(&rule.condition, context))
        .map(|rule| TacticSelection {
            rule: rule.clone(),
            weakness_bonus: weakness_bonus(&rule.condition, weaknesses),
        })
        .collect();

    if selected.is_empty() {
        selected.push(TacticSelection {
            rule: default_protocol(),
            weakness_bonus: 0.0,
        });
    }

    selected.sort_by(|a, b| {
        b.rule.priority.cmp(&a.rule.priority).then_with(|| {
            b.weakness_bonus
                .partial_cmp(&a.weakness_bonus)
                .unwrap_or(Ordering::Equal)
        })
    });
    selected
}

pub fn tactic_matches(condition: &TacticCondition, context: &MissionContext) -> bool {
    condition.category.is_none_or(|c| c == context.category)
        && condition.risk_class.is_none_or(|r| r == context.risk_class)
        && condition.state.is_none_or(|s| s == context.state)
        && condition
            .tag
            .as_ref()
            .is_none_or(|t| context.threat_tags.contains(&t.to_lowercase()))
        && condition
            .height_min_cm
            .is_none_or(|min| context.height_cm >= min)
        && condition
            .height_max_cm
            .is_none_or(|max| context.height_cm <= max)
        && condition
            .mutations_min
            .is_none_or(|min| context.mutation_count >= min)
        && condition
            .mutations_max
            .is_none_or(|max| context.mutation_count <= max)
        && condition
            .heart_rate_min
            .is_none_or(|min| context.heart_rate_bpm >= min)
}

/// Damped share of each applicable weakness that targets the same tag, state
/// or category as the tactic, capped at `MAX_WEAKNESS_BONUS`.
pub fn weakness_bonus(condition: &TacticCondition, weaknesses: &[AppliedWeakness]) -> f64 {
    let mut bonus = 0.0;
    for weakness in weaknesses {
        let wc = &weakness.rule.condition;
        if let (Some(wt), Some(tt)) = (&wc.tag, &condition.tag) {
            if wt.eq_ignore_ascii_case(tt) {
                bonus += weakness.bonus * TAG_SHARE;
            }
        }
        if wc.state.is_some() && wc.state == condition.state {
            bonus += weakness.bonus * STATE_SHARE;
        }
        if wc.category.is_some() && wc.category == condition.category {
            bonus += weakness.bonus * CATEGORY_SHARE;
        }
    }
    bonus.clamp(0.0, MAX_WEAKNESS_BONUS)
}

fn default_protocol() -> TacticRule {
    TacticRule {
        id: DEFAULT_PROTOCOL_ID,
        name: "Default protocol".to_string(),
        description: "Generic low-altitude containment procedure.".to_string(),
        condition: TacticCondition::default(),
        priority: DEFAULT_PROTOCOL_PRIORITY,
        action: TacticAction {
            kind: "default".to_string(),
            label: "standard_procedure".to_string(),
            note: None,
        },
    }
}
