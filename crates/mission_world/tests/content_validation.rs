//! Loads the shipped `content/*.json` and checks it against the planner.
//!
//! Also exercises the loader's error paths on hand-written files in a temp dir.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use mission_core::{
    build_context, evaluate_weaknesses, select_tactics, Category, MissionPlan, RiskClass,
    TargetDirectory, TargetId,
};
use mission_world::{load_catalog, load_constants, load_content, load_targets, Content};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Integration tests run from the crate directory, so go up two levels.
fn content_dir() -> PathBuf {
    let manifest = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    Path::new(&manifest).join("../../content")
}

fn shipped() -> &'static Content {
    static CONTENT: OnceLock<Content> = OnceLock::new();
    CONTENT.get_or_init(|| load_content(&content_dir()).expect("shipped content should load"))
}

// =========================================================================
// Shipped content
// =========================================================================

#[test]
fn shipped_catalog_has_every_rule() {
    let catalog = &shipped().catalog;
    assert_eq!(catalog.tactics.len(), 8);
    assert_eq!(catalog.defenses.len(), 7);
    assert_eq!(catalog.weaknesses.len(), 5);
    assert_eq!(catalog.defenses.iter().filter(|d| d.fallback).count(), 1);
}

#[test]
fn shipped_constants_match_reference_values() {
    let c = &shipped().constants;
    assert_eq!(c.tick_interval_ms, 20);
    assert_eq!(c.timeline_capacity, 2000);
    assert_eq!(c.engagement_cadence_ticks, 4);
}

#[test]
fn every_shipped_target_gets_a_full_plan() {
    let content = shipped();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    for id in content.targets.ids() {
        let profile = content.targets.target_profile(id).unwrap();
        let analysis = content.targets.risk_analysis(id);
        let plan = MissionPlan::build(
            &profile,
            analysis.as_ref(),
            &content.catalog,
            &content.constants,
            &mut rng,
        );
        assert!(!plan.tactics.is_empty(), "target {id} has no tactics");
        assert!(plan.defenses.primary.is_some(), "target {id} has no primary");
        assert!(plan.defenses.fallback.is_some(), "target {id} has no fallback");
    }
}

#[test]
fn heavy_high_risk_target_leads_with_stealth() {
    let content = shipped();
    let id = TargetId(3);
    let profile = content.targets.target_profile(id).unwrap();
    let analysis = content.targets.risk_analysis(id);
    let ctx = build_context(&profile, analysis.as_ref(), &content.constants);
    assert_eq!(ctx.category, Category::Heavy);
    assert_eq!(ctx.risk_class, RiskClass::High);

    let weaknesses = evaluate_weaknesses(&content.catalog.weaknesses, &ctx);
    let tactics = select_tactics(&content.catalog.tactics, &ctx, &weaknesses);
    assert_eq!(tactics[0].rule.name, "Stealth approach");
}

#[test]
fn unanalysed_target_has_no_risk_analysis() {
    let targets = &shipped().targets;
    assert!(targets.get(TargetId(4)).is_some());
    assert!(targets.risk_analysis(TargetId(4)).is_none());
}

// =========================================================================
// Loader errors
// =========================================================================

fn write(dir: &Path, file: &str, body: &str) {
    std::fs::write(dir.join(file), body).unwrap();
}

fn error_chain(err: &anyhow::Error) -> String {
    format!("{err:#}")
}

#[test]
fn missing_file_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_constants(dir.path()).unwrap_err();
    assert!(error_chain(&err).contains("reading constants.json"), "{err:#}");
}

#[test]
fn malformed_json_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "targets.json", "{ \"targets\": [ ");
    let err = load_targets(dir.path()).unwrap_err();
    assert!(error_chain(&err).contains("parsing targets.json"), "{err:#}");
}

#[test]
fn partial_constants_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "constants.json", r#"{ "tick_interval_ms": 0 }"#);
    let constants = load_constants(dir.path()).unwrap();
    assert!(constants.tick_interval().is_none());
    assert_eq!(constants.default_page_size, 50);
}

#[test]
fn invalid_constants_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "constants.json", r#"{ "max_damage_chance": 2.0 }"#);
    let err = load_constants(dir.path()).unwrap_err();
    assert!(error_chain(&err).contains("max_damage_chance"), "{err:#}");
}

#[test]
fn out_of_range_bonus_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "tactics.json", r#"{ "tactics": [] }"#);
    write(dir.path(), "defenses.json", r#"{ "defenses": [] }"#);
    write(
        dir.path(),
        "weaknesses.json",
        r#"{ "weaknesses": [
            { "id": 1, "name": "Too good", "success_bonus": 1.4, "description": "" }
        ] }"#,
    );
    let err = load_catalog(dir.path()).unwrap_err();
    assert!(error_chain(&err).contains("success_bonus"), "{err:#}");
}

#[test]
fn negative_mass_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "targets.json",
        r#"{ "targets": [ {
            "name": "Ghost",
            "profile": { "id": 9, "mass_g": -1.0, "height_cm": 10.0, "state": "awake" }
        } ] }"#,
    );
    let err = load_targets(dir.path()).unwrap_err();
    assert!(error_chain(&err).contains("Ghost"), "{err:#}");
}
