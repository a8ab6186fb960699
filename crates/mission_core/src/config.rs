//! Simulation tunables.
//!
//! Deserialized from `content/constants.json`; any field left out falls back
//! to the reference value in `Default`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Constants {
    /// Wall-clock quantum per tick. Zero means the actor only yields.
    pub tick_interval_ms: u64,
    /// Maximum number of entries kept in a mission's event log.
    pub timeline_capacity: usize,
    /// Battery or fuel at or below this percentage ends the mission.
    pub min_reserve_pct: f64,
    /// Converts a per-minute burn rate into a per-tick burn.
    pub ticks_per_minute: f64,
    pub launch_distance_m: f64,
    /// Engage ticks between two engagement attempts.
    pub engagement_cadence_ticks: u32,
    pub base_engagement_chance: f64,
    pub max_engagement_chance: f64,
    pub target_damage_min: f64,
    pub target_damage_max: f64,
    /// `risk_total / damage_risk_divisor` is the unmitigated damage chance.
    pub damage_risk_divisor: f64,
    pub max_damage_chance: f64,
    /// Share of the fallback defense's mitigation that applies.
    pub fallback_mitigation_share: f64,
    pub hull_damage_min: f64,
    pub hull_damage_max: f64,
    /// Default risk total when a target has no analysis.
    pub default_risk_total: f64,
    pub power_per_risk: f64,
    pub min_power: f64,
    pub max_power: f64,
    pub default_distance_km: f64,
    pub default_page_size: u32,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            tick_interval_ms: 20,
            timeline_capacity: 2000,
            min_reserve_pct: 5.0,
            ticks_per_minute: 300.0,
            launch_distance_m: 1500.0,
            engagement_cadence_ticks: 4,
            base_engagement_chance: 0.25,
            max_engagement_chance: 0.95,
            target_damage_min: 35.0,
            target_damage_max: 55.0,
            damage_risk_divisor: 750.0,
            max_damage_chance: 0.75,
            fallback_mitigation_share: 0.5,
            hull_damage_min: 2.4,
            hull_damage_max: 8.9,
            default_risk_total: 40.0,
            power_per_risk: 0.8,
            min_power: 20.0,
            max_power: 120.0,
            default_distance_km: 1.0,
            default_page_size: 50,
        }
    }
}

impl Constants {
    pub fn tick_interval(&self) -> Option<Duration> {
        (self.tick_interval_ms > 0).then(|| Duration::from_millis(self.tick_interval_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_reference_values() {
        let constants: Constants =
            serde_json::from_str(r#"{"tick_interval_ms": 5}"#).unwrap();
        assert_eq!(constants.tick_interval_ms, 5);
        assert_eq!(constants.timeline_capacity, 2000);
        assert_eq!(constants.engagement_cadence_ticks, 4);
    }

    #[test]
    fn zero_interval_means_yield_only() {
        let constants = Constants {
            tick_interval_ms: 0,
            ..Constants::default()
        };
        assert!(constants.tick_interval().is_none());
        assert_eq!(
            Constants::default().tick_interval(),
            Some(Duration::from_millis(20))
        );
    }
}
