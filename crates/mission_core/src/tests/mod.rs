use super::*;
use crate::test_fixtures::{analysis, base_catalog, make_rng};
use std::sync::Arc;

mod registry;
mod tactics;

// --- Shared test helpers ------------------------------------------------

const TEST_SEED: u64 = 0x5EED;

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {expected}, got {actual}"
    );
}

fn context_for(profile: &TargetProfile, risk_total: Option<f64>) -> MissionContext {
    let analysis = risk_total.map(analysis);
    build_context(profile, analysis.as_ref(), &Constants::default())
}

/// Plan against `catalog` and wrap the result in a fresh runtime.
fn runtime_with(
    profile: &TargetProfile,
    risk_total: f64,
    catalog: &RuleCatalog,
    constants: Constants,
) -> MissionRuntime {
    let (seed, mut rng) = mission_rng(TEST_SEED, 1);
    let plan = MissionPlan::build(
        profile,
        Some(&analysis(risk_total)),
        catalog,
        &constants,
        &mut rng,
    );
    MissionRuntime::new(
        MissionId(1),
        plan,
        seed,
        rng,
        Arc::new(constants),
        Arc::new(IdSequence::new()),
    )
}

/// Fly until the runtime reports `Finished`. Returns the number of ticks.
fn fly_to_end(runtime: &mut MissionRuntime) -> usize {
    let mut ticks = 0;
    while runtime.advance().unwrap() == Step::Continue {
        ticks += 1;
        assert!(ticks < 10_000, "mission never concluded");
    }
    ticks
}

fn labels(runtime: &MissionRuntime) -> Vec<&'static str> {
    runtime.log().iter().map(|t| t.event.label()).collect()
}

fn phases_entered(runtime: &MissionRuntime) -> Vec<Phase> {
    runtime
        .log()
        .iter()
        .filter_map(|t| match t.event {
            TickEvent::PhaseStarted { phase } => Some(phase),
            _ => None,
        })
        .collect()
}

#[test]
fn plan_for_shipped_catalog_is_never_empty() {
    let catalog = base_catalog();
    let mut rng = make_rng();
    for profile in [
        test_fixtures::dormant_light_profile(),
        test_fixtures::plain_profile(),
        test_fixtures::heavy_profile(),
    ] {
        let plan = MissionPlan::build(
            &profile,
            None,
            &catalog,
            &Constants::default(),
            &mut rng,
        );
        assert!(!plan.tactics.is_empty());
        assert!(plan.defenses.primary.is_some());
        assert!(plan.defenses.fallback.is_some());
        for tactic in &plan.tactics {
            assert!((0.0..=MAX_WEAKNESS_BONUS).contains(&tactic.weakness_bonus));
        }
    }
}
