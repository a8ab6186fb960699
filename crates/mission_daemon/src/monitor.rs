use std::time::Duration;

use anyhow::{Context, Result};
use mission_core::{MissionId, MissionRegistry, MissionSnapshot, MissionTick, TargetId, TickEvent};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

pub struct FlightOptions {
    /// How often mission state is polled.
    pub poll: Duration,
    /// Abort every mission still flying after this long.
    pub abort_after: Option<Duration>,
    /// Page size used to pull a mission's full log for the report.
    pub log_page_size: u32,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    pub logged: usize,
    pub evicted: u64,
    pub attempts: usize,
    pub hits: usize,
    pub damage_events: usize,
}

impl TickSummary {
    pub fn from_ticks(ticks: &[MissionTick], evicted: u64) -> Self {
        let mut summary = Self {
            logged: ticks.len(),
            evicted,
            ..Self::default()
        };
        for tick in ticks {
            match &tick.event {
                TickEvent::TacticExecuted { success, .. } => {
                    summary.attempts += 1;
                    if *success {
                        summary.hits += 1;
                    }
                }
                TickEvent::DamageTaken { .. } => summary.damage_events += 1,
                _ => {}
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MissionReport {
    pub target_name: String,
    pub mission: MissionSnapshot,
    pub ticks: TickSummary,
}

impl MissionReport {
    pub fn render(&self) -> String {
        let m = &self.mission.mission;
        let t = &self.mission.telemetry;
        let lead = m
            .strategy
            .tactics
            .first()
            .map_or("-", |tactic| tactic.name.as_str());
        format!(
            "mission {id} [{name}] {status:?}: {result}\n  \
             risk {risk:.0} ({class:?}), lead tactic {lead}, phase {phase:?}\n  \
             battery {battery:.2}% fuel {fuel:.2}% hull {hull:.2}% distance {dist:.0} m\n  \
             {attempts} attempts, {hits} hits, {damage} hull hits, {logged} events ({evicted} evicted)",
            id = m.id,
            name = self.target_name,
            status = m.status,
            result = m.result.as_deref().unwrap_or("in flight"),
            risk = m.risk_total,
            class = m.strategy.risk_class,
            phase = self.mission.phase,
            battery = t.battery_pct,
            fuel = t.fuel_pct,
            hull = t.integrity_pct,
            dist = t.distance_m,
            attempts = self.ticks.attempts,
            hits = self.ticks.hits,
            damage = self.ticks.damage_events,
            logged = self.ticks.logged,
            evicted = self.ticks.evicted,
        )
    }
}

/// Plan and launch one mission per target, then poll until every mission is
/// terminal or shutdown is signalled.
pub async fn fly_all(
    registry: &MissionRegistry,
    targets: &[(TargetId, String)],
    options: &FlightOptions,
    mut shutdown: watch::Receiver<bool>,
) -> Result<Vec<MissionReport>> {
    let mut flights: Vec<(MissionId, String)> = Vec::with_capacity(targets.len());
    for (target, name) in targets {
        let planned = registry
            .create_mission(*target)
            .with_context(|| format!("planning mission for '{name}'"))?;
        let id = planned.mission.id;
        registry
            .start_mission(id)
            .await
            .with_context(|| format!("starting mission {id}"))?;
        flights.push((id, name.clone()));
    }

    let launched = Instant::now();
    let mut abort_sent = false;
    let mut poll = tokio::time::interval(options.poll);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut watching = true;
    loop {
        if *shutdown.borrow() {
            tracing::warn!("shutdown requested; reporting missions as they stand");
            break;
        }
        tokio::select! {
            _ = poll.tick() => {}
            changed = shutdown.changed(), if watching => {
                if changed.is_err() {
                    watching = false;
                }
                continue;
            }
        }

        if !abort_sent && options.abort_after.is_some_and(|d| launched.elapsed() >= d) {
            abort_sent = true;
            for (id, _) in &flights {
                registry.abort_mission(*id).await?;
            }
        }

        let mut in_flight = 0;
        for (id, _) in &flights {
            let snapshot = registry
                .get_mission(*id)
                .await
                .with_context(|| format!("mission {id} disappeared"))?;
            if !snapshot.mission.status.is_terminal() {
                in_flight += 1;
            }
        }
        if in_flight == 0 {
            break;
        }
        tracing::debug!("{in_flight} of {} missions still flying", flights.len());
    }

    let mut reports = Vec::with_capacity(flights.len());
    for (id, name) in flights {
        reports.push(report(registry, id, name, options.log_page_size).await?);
    }
    Ok(reports)
}

async fn report(
    registry: &MissionRegistry,
    id: MissionId,
    target_name: String,
    page_size: u32,
) -> Result<MissionReport> {
    let mission = registry
        .get_mission(id)
        .await
        .with_context(|| format!("mission {id} disappeared"))?;
    let page = registry.timeline(id, 1, page_size).await?;
    Ok(MissionReport {
        target_name,
        mission,
        ticks: TickSummary::from_ticks(&page.items, page.evicted),
    })
}
