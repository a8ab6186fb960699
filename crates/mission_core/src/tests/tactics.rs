use super::*;
use crate::tactics::DEFAULT_PROTOCOL_ID;
use crate::test_fixtures::{dormant_light_profile, heavy_profile, plain_profile};

fn plan_for(profile: &TargetProfile, risk_total: f64) -> Vec<TacticSelection> {
    let catalog = base_catalog();
    let ctx = context_for(profile, Some(risk_total));
    let weaknesses = evaluate_weaknesses(&catalog.weaknesses, &ctx);
    select_tactics(&catalog.tactics, &ctx, &weaknesses)
}

fn ids(selection: &[TacticSelection]) -> Vec<u64> {
    selection.iter().map(|t| t.rule.id.0).collect()
}

#[test]
fn ordered_by_priority_descending() {
    let plan = plan_for(&heavy_profile(), 80.0);
    assert_eq!(ids(&plan), vec![1006, 1001, 1005, 1008]);
}

#[test]
fn weakness_bonus_is_damped_by_match_kind() {
    let plan = plan_for(&dormant_light_profile(), 30.0);
    assert_eq!(ids(&plan), vec![1002, 1003, 1007]);
    // tag match: 0.28 * 0.6
    assert_close(plan[0].weakness_bonus, 0.168);
    // state match: 0.35 * 0.5
    assert_close(plan[1].weakness_bonus, 0.175);
    // category match: 0.22 * 0.4
    assert_close(plan[2].weakness_bonus, 0.088);
}

#[test]
fn no_match_falls_back_to_default_protocol() {
    let plan = plan_for(&plain_profile(), 30.0);
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].rule.id, DEFAULT_PROTOCOL_ID);
    assert_eq!(plan[0].rule.priority, 50);
    assert_eq!(plan[0].rule.action.label, "standard_procedure");
    assert_close(plan[0].weakness_bonus, 0.0);
}

#[test]
fn empty_catalog_still_yields_a_plan() {
    let ctx = context_for(&heavy_profile(), None);
    let plan = select_tactics(&[], &ctx, &[]);
    assert_eq!(ids(&plan), vec![DEFAULT_PROTOCOL_ID.0]);
}

#[test]
fn bonus_is_capped() {
    let strong = |condition: WeaknessCondition| AppliedWeakness {
        rule: WeaknessRule {
            id: RuleId(9),
            name: "strong".to_string(),
            condition,
            success_bonus: 0.9,
            description: String::new(),
        },
        bonus: 0.9,
    };
    let weaknesses = vec![
        strong(WeaknessCondition {
            tag: Some("electric".to_string()),
            ..WeaknessCondition::default()
        }),
        strong(WeaknessCondition {
            state: Some(BehavioralState::Dormant),
            ..WeaknessCondition::default()
        }),
    ];
    let condition = TacticCondition {
        tag: Some("Electric".to_string()),
        state: Some(BehavioralState::Dormant),
        ..TacticCondition::default()
    };
    assert_close(weakness_bonus(&condition, &weaknesses), MAX_WEAKNESS_BONUS);
}

#[test]
fn equal_priority_breaks_ties_on_bonus() {
    let mut catalog = base_catalog();
    // Containment net and dielectric isolation now share a priority.
    for rule in &mut catalog.tactics {
        if rule.id == RuleId(1003) {
            rule.priority = 90;
        }
    }
    let ctx = context_for(&dormant_light_profile(), Some(30.0));
    let weaknesses = evaluate_weaknesses(&catalog.weaknesses, &ctx);
    let plan = select_tactics(&catalog.tactics, &ctx, &weaknesses);
    // 0.175 beats 0.168
    assert_eq!(ids(&plan), vec![1003, 1002, 1007]);
}

#[test]
fn heart_rate_threshold_gates_calming_resonance() {
    let mut profile = dormant_light_profile();
    profile.state = BehavioralState::Trance;
    profile.heart_rate_bpm = Some(110.0);
    assert!(ids(&plan_for(&profile, 30.0)).contains(&1004));
    profile.heart_rate_bpm = Some(109.0);
    assert!(!ids(&plan_for(&profile, 30.0)).contains(&1004));
}
