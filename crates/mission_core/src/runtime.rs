//! Per-mission state machine.
//!
//! `MissionRuntime` is driven one tick at a time by `advance`. It performs no
//! IO and never sleeps; the owning actor decides when the next tick happens.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::plan::MissionPlan;
use crate::timeline::EventLog;
use crate::{
    Constants, IdSequence, Mission, MissionError, MissionId, MissionSnapshot, MissionStatus,
    MissionTick, Phase, Telemetry, TickEvent, TickId, TimelinePage, FLIGHT_PLAN,
};

pub const REASON_CONTAINED: &str = "target contained";
pub const REASON_BATTERY: &str = "insufficient battery";
pub const REASON_FUEL: &str = "insufficient fuel";
pub const REASON_HULL: &str = "hull compromised";
pub const REASON_ABORTED: &str = "mission aborted";
pub const REASON_TIMEOUT: &str = "operational timeout";
pub const RESULT_ABORTED_BEFORE_TAKEOFF: &str = "aborted before takeoff";

const INITIAL_TARGET_INTEGRITY: f64 = 100.0;

/// Result of a single call to [`MissionRuntime::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The mission is still flying; schedule another tick.
    Continue,
    /// The mission is terminal or was never started.
    Finished,
}

#[derive(Debug, Clone, Copy)]
struct Outcome {
    success: bool,
    reason: &'static str,
}

impl Outcome {
    fn failure(reason: &'static str) -> Self {
        Self {
            success: false,
            reason,
        }
    }
}

/// Chance that an engagement attempt lands.
pub fn engagement_chance(
    tactic_bonus: f64,
    total_weakness_bonus: f64,
    constants: &Constants,
) -> f64 {
    (constants.base_engagement_chance + tactic_bonus + total_weakness_bonus)
        .clamp(0.0, constants.max_engagement_chance)
}

/// Chance that the drone takes hull damage on an exposed tick.
pub fn damage_probability(
    risk_total: f64,
    primary_mitigation: f64,
    fallback_mitigation: f64,
    constants: &Constants,
) -> f64 {
    let base = risk_total / constants.damage_risk_divisor;
    let mitigated = base
        * (1.0 - primary_mitigation)
        * (1.0 - fallback_mitigation * constants.fallback_mitigation_share);
    mitigated.clamp(0.0, constants.max_damage_chance)
}

fn uniform(rng: &mut impl Rng, min: f64, max: f64) -> f64 {
    min + rng.gen::<f64>() * (max - min)
}

pub struct MissionRuntime {
    mission: Mission,
    plan: MissionPlan,
    constants: Arc<Constants>,
    ids: Arc<IdSequence>,
    rng: ChaCha8Rng,
    seed: u64,
    telemetry: Telemetry,
    log: EventLog,
    phase: Phase,
    /// Index into `FLIGHT_PLAN` of the phase being flown or about to be entered.
    plan_index: usize,
    phase_open: bool,
    ticks_in_phase: u32,
    abort_requested: bool,
    concluded: bool,
    captured: bool,
    target_integrity: f64,
    tactic_index: usize,
    ticks_since_attempt: u32,
}

impl MissionRuntime {
    pub fn new(
        id: MissionId,
        plan: MissionPlan,
        seed: u64,
        rng: ChaCha8Rng,
        constants: Arc<Constants>,
        ids: Arc<IdSequence>,
    ) -> Self {
        let mission = Mission {
            id,
            target_id: plan.context.target_id,
            status: MissionStatus::Planned,
            allocated_power: plan.context.power_budget,
            risk_total: plan.context.risk_total,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            result: None,
            strategy: plan.strategy(),
            defense: plan.defense(),
        };
        Self {
            mission,
            telemetry: Telemetry::launch(constants.launch_distance_m),
            log: EventLog::new(constants.timeline_capacity),
            plan,
            constants,
            ids,
            rng,
            seed,
            phase: Phase::Idle,
            plan_index: 0,
            phase_open: false,
            ticks_in_phase: 0,
            abort_requested: false,
            concluded: false,
            captured: false,
            target_integrity: INITIAL_TARGET_INTEGRITY,
            tactic_index: 0,
            ticks_since_attempt: 0,
        }
    }

    pub fn id(&self) -> MissionId {
        self.mission.id
    }

    pub fn mission(&self) -> &Mission {
        &self.mission
    }

    pub fn plan(&self) -> &MissionPlan {
        &self.plan
    }

    pub fn status(&self) -> MissionStatus {
        self.mission.status
    }

    pub fn is_running(&self) -> bool {
        self.mission.status == MissionStatus::Running && !self.concluded
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn telemetry(&self) -> Telemetry {
        self.telemetry
    }

    pub fn captured(&self) -> bool {
        self.captured
    }

    pub fn target_integrity(&self) -> f64 {
        self.target_integrity
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Planned → Running. Returns false when the mission had already left
    /// `Planned`, in which case nothing changes.
    pub fn start(&mut self) -> bool {
        if self.mission.status != MissionStatus::Planned {
            return false;
        }
        self.mission.status = MissionStatus::Running;
        self.mission.started_at = Some(Utc::now());
        self.phase = Phase::Takeoff;
        self.record(TickEvent::MissionStarted, false);
        tracing::info!("mission {} started", self.mission.id);
        true
    }

    /// Flag an abort. A planned mission is aborted on the spot; a running one
    /// turns back at the next phase boundary. Returns false when nothing
    /// changed.
    pub fn request_abort(&mut self) -> bool {
        if self.concluded || self.abort_requested {
            return false;
        }
        self.abort_requested = true;
        let status = self.mission.status;
        match status {
            MissionStatus::Planned => {
                self.concluded = true;
                self.mission.status = MissionStatus::Aborted;
                self.mission.finished_at = Some(Utc::now());
                self.mission.result = Some(RESULT_ABORTED_BEFORE_TAKEOFF.to_string());
                tracing::warn!("mission {} aborted before takeoff", self.mission.id);
            }
            MissionStatus::Running => {
                self.record(
                    TickEvent::AbortRequested {
                        reason: "operator request".to_string(),
                    },
                    false,
                );
                tracing::warn!(
                    "mission {} abort requested during {:?}",
                    self.mission.id,
                    self.phase
                );
            }
            MissionStatus::Aborted | MissionStatus::Concluded => {}
        }
        true
    }

    /// Fly one tick.
    pub fn advance(&mut self) -> Result<Step, MissionError> {
        if !self.is_running() {
            return Ok(Step::Finished);
        }

        if !self.phase_open {
            if self.plan_index >= FLIGHT_PLAN.len() {
                self.conclude(Outcome::failure(REASON_TIMEOUT));
                return Ok(Step::Finished);
            }
            self.enter_next_phase();
        }

        let phase = self.phase;
        self.update_telemetry(phase);
        if !self.telemetry.is_finite() {
            return Err(MissionError::SimulationFault(format!(
                "non-finite telemetry during {phase:?}: {:?}",
                self.telemetry
            )));
        }
        if let Some(outcome) = self.terminal_outcome() {
            self.conclude(outcome);
            return Ok(Step::Finished);
        }

        if phase == Phase::Engage {
            self.engagement_attempt()?;
            if let Some(outcome) = self.terminal_outcome() {
                self.conclude(outcome);
                return Ok(Step::Finished);
            }
            if self.captured {
                self.close_phase();
                return Ok(Step::Continue);
            }
        }

        self.ticks_in_phase += 1;
        if self.ticks_in_phase >= phase.tick_budget() {
            self.close_phase();
        }
        Ok(Step::Continue)
    }

    /// Force the mission into `Aborted` after an unexpected failure in the
    /// simulation task.
    pub fn fault(&mut self, message: &str) {
        if self.concluded {
            return;
        }
        self.concluded = true;
        self.mission.status = MissionStatus::Aborted;
        self.mission.finished_at = Some(Utc::now());
        self.mission.result = Some("simulation fault".to_string());
        self.record(
            TickEvent::SimulationFault {
                message: message.to_string(),
            },
            false,
        );
        tracing::error!("mission {} simulation fault: {message}", self.mission.id);
    }

    pub fn snapshot(&self) -> MissionSnapshot {
        MissionSnapshot {
            mission: self.mission.clone(),
            telemetry: self.telemetry.rounded(),
            phase: self.phase,
            next_phase: if self.concluded {
                None
            } else {
                self.phase.successor()
            },
            weaknesses: self.plan.weakness_summaries(),
            seed: self.seed,
        }
    }

    pub fn timeline(&self, page: u32, page_size: u32) -> TimelinePage {
        self.log.page(page, page_size, self.constants.default_page_size)
    }

    // -----------------------------------------------------------------------
    // Phase handling
    // -----------------------------------------------------------------------

    fn enter_next_phase(&mut self) {
        let scheduled = FLIGHT_PLAN[self.plan_index];
        if self.abort_requested && !matches!(scheduled, Phase::Egress | Phase::Land) {
            if let Some(egress) = Phase::Egress.position() {
                self.plan_index = egress;
            }
        }
        self.phase = FLIGHT_PLAN[self.plan_index];
        self.phase_open = true;
        self.ticks_in_phase = 0;
        self.record(TickEvent::PhaseStarted { phase: self.phase }, false);
        tracing::debug!("mission {} entering {:?}", self.mission.id, self.phase);
    }

    fn close_phase(&mut self) {
        self.record(TickEvent::PhaseCompleted { phase: self.phase }, false);
        self.phase_open = false;
        self.plan_index += 1;
    }

    // -----------------------------------------------------------------------
    // Per-tick effects
    // -----------------------------------------------------------------------

    fn update_telemetry(&mut self, phase: Phase) {
        let burn = phase.consumption_per_minute() / self.constants.ticks_per_minute;
        self.telemetry.battery_pct = (self.telemetry.battery_pct - burn).max(0.0);
        self.telemetry.fuel_pct = (self.telemetry.fuel_pct - burn).max(0.0);
        self.telemetry.distance_m = phase.next_distance(self.telemetry.distance_m);

        self.apply_damage(phase);

        let tactic = self
            .plan
            .tactics
            .get(self.tactic_index)
            .map(|t| t.rule.name.clone());
        self.record(
            TickEvent::Telemetry {
                phase,
                tactic,
                abort_requested: self.abort_requested,
            },
            false,
        );
    }

    fn apply_damage(&mut self, phase: Phase) {
        if !phase.exposed() {
            return;
        }
        let probability = damage_probability(
            self.plan.context.risk_total,
            self.plan.defenses.primary_mitigation(),
            self.plan.defenses.fallback_mitigation(),
            &self.constants,
        );
        if self.rng.gen::<f64>() < probability {
            let damage = uniform(
                &mut self.rng,
                self.constants.hull_damage_min,
                self.constants.hull_damage_max,
            );
            self.telemetry.integrity_pct = (self.telemetry.integrity_pct - damage).max(0.0);
            self.record(
                TickEvent::DamageTaken {
                    damage,
                    probability,
                },
                false,
            );
        }
    }

    fn engagement_attempt(&mut self) -> Result<(), MissionError> {
        if self.captured {
            return Ok(());
        }
        self.ticks_since_attempt += 1;
        if self.ticks_since_attempt < self.constants.engagement_cadence_ticks {
            return Ok(());
        }
        self.ticks_since_attempt = 0;

        let rotation = self.plan.tactics.len();
        if rotation == 0 {
            return Err(MissionError::SimulationFault(
                "tactic rotation is empty".to_string(),
            ));
        }
        let tactic = &self.plan.tactics[self.tactic_index % rotation];
        let name = tactic.rule.name.clone();
        let chance = engagement_chance(
            tactic.weakness_bonus,
            self.plan.total_weakness_bonus(),
            &self.constants,
        );

        let success = self.rng.gen::<f64>() < chance;
        if success {
            let hit = uniform(
                &mut self.rng,
                self.constants.target_damage_min,
                self.constants.target_damage_max,
            );
            self.target_integrity = (self.target_integrity - hit).max(0.0);
            if self.target_integrity <= 0.0 {
                self.captured = true;
            }
        } else {
            self.tactic_index = (self.tactic_index + 1) % rotation;
        }

        self.record(
            TickEvent::TacticExecuted {
                tactic: name,
                chance,
                success,
                target_integrity: self.target_integrity,
            },
            success,
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Termination
    // -----------------------------------------------------------------------

    fn terminal_outcome(&self) -> Option<Outcome> {
        let t = &self.telemetry;
        if t.battery_pct <= self.constants.min_reserve_pct {
            return Some(Outcome::failure(REASON_BATTERY));
        }
        if t.fuel_pct <= self.constants.min_reserve_pct {
            return Some(Outcome::failure(REASON_FUEL));
        }
        if t.integrity_pct <= 0.0 {
            return Some(Outcome::failure(REASON_HULL));
        }
        if self.captured && self.phase == Phase::Land {
            return Some(Outcome {
                success: true,
                reason: REASON_CONTAINED,
            });
        }
        if self.abort_requested && self.phase == Phase::Land {
            return Some(Outcome::failure(REASON_ABORTED));
        }
        None
    }

    /// A failure while an abort is pending counts as `Aborted`; every other
    /// outcome is `Concluded`.
    fn conclude(&mut self, outcome: Outcome) {
        if self.concluded {
            return;
        }
        self.concluded = true;
        self.mission.finished_at = Some(Utc::now());
        self.mission.status = if !outcome.success && self.abort_requested {
            MissionStatus::Aborted
        } else {
            MissionStatus::Concluded
        };
        self.mission.result = Some(if outcome.success {
            outcome.reason.to_string()
        } else {
            format!("failure: {}", outcome.reason)
        });
        self.record(
            TickEvent::MissionConcluded {
                success: outcome.success,
                reason: outcome.reason.to_string(),
            },
            outcome.success,
        );
        tracing::info!(
            "mission {} finished as {:?}: {}",
            self.mission.id,
            self.mission.status,
            outcome.reason
        );
    }

    fn record(&mut self, event: TickEvent, success: bool) {
        let tick = MissionTick {
            id: TickId(self.ids.next()),
            mission_id: self.mission.id,
            sequence: self.log.next_sequence(),
            phase: self.phase,
            event,
            telemetry: self.telemetry,
            success,
        };
        self.log.push(tick);
    }
}
