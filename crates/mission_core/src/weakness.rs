use crate::{AppliedWeakness, MissionContext, WeaknessCondition, WeaknessRule};

/// Every catalog weakness whose condition fully matches the context.
pub fn evaluate_weaknesses(
    rules: &[WeaknessRule],
    context: &MissionContext,
) -> Vec<AppliedWeakness> {
    rules
        .iter()
        .filter(|rule| weakness_matches(&rule.condition, context))
        .map(|rule| AppliedWeakness {
            rule: rule.clone(),
            bonus: rule.success_bonus,
        })
        .collect()
}

/// Populated fields are AND-ed; an empty condition always matches.
pub fn weakness_matches(condition: &WeaknessCondition, context: &MissionContext) -> bool {
    condition.state.is_none_or(|s| s == context.state)
        && condition.category.is_none_or(|c| c == context.category)
        && condition
            .tag
            .as_ref()
            .is_none_or(|t| context.threat_tags.contains(&t.to_lowercase()))
        && condition
            .mutations_min
            .is_none_or(|min| context.mutation_count >= min)
        && condition
            .mutations_max
            .is_none_or(|max| context.mutation_count <= max)
}
