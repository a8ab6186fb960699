use super::*;
use crate::test_fixtures::{dormant_light_profile, fast_constants, plain_profile, StaticDirectory};
use std::time::Duration;
use tokio::sync::watch;

const LIGHT: TargetId = TargetId(1);
const PLAIN: TargetId = TargetId(2);

fn registry_with(constants: Constants) -> (MissionRegistry, watch::Sender<bool>) {
    let directory = StaticDirectory::new()
        .with_target(dormant_light_profile(), Some(analysis(55.0)))
        .with_target(plain_profile(), None);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let registry = MissionRegistry::new(
        Arc::new(directory),
        Arc::new(base_catalog()),
        constants,
        TEST_SEED,
        shutdown_rx,
    );
    (registry, shutdown_tx)
}

async fn wait_for_terminal(registry: &MissionRegistry, id: MissionId) -> MissionSnapshot {
    for _ in 0..10_000 {
        let snapshot = registry.get_mission(id).await.unwrap();
        if snapshot.mission.status.is_terminal() {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("mission {id} never finished");
}

#[tokio::test(start_paused = true)]
async fn unknown_ids_are_rejected() {
    let (registry, _shutdown) = registry_with(fast_constants());
    assert_eq!(
        registry.create_mission(TargetId(404)).unwrap_err(),
        MissionError::TargetNotFound(TargetId(404))
    );
    assert_eq!(
        registry.start_mission(MissionId(9)).await.unwrap_err(),
        MissionError::MissionNotFound(MissionId(9))
    );
    assert_eq!(
        registry.abort_mission(MissionId(9)).await.unwrap_err(),
        MissionError::MissionNotFound(MissionId(9))
    );
    assert!(registry.timeline(MissionId(9), 1, 10).await.is_err());
    assert!(registry.get_mission(MissionId(9)).await.is_none());
    assert!(registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn mission_flies_to_a_terminal_state() {
    let (registry, _shutdown) = registry_with(fast_constants());
    let planned = registry.create_mission(LIGHT).unwrap();
    assert_eq!(planned.mission.status, MissionStatus::Planned);
    assert_eq!(planned.mission.target_id, LIGHT);
    assert!(!planned.mission.strategy.tactics.is_empty());

    let id = planned.mission.id;
    let running = registry.start_mission(id).await.unwrap();
    assert_eq!(running.mission.status, MissionStatus::Running);
    assert!(running.mission.started_at.is_some());

    let done = wait_for_terminal(&registry, id).await;
    assert!(done.mission.result.is_some());
    assert!(done.mission.finished_at.is_some());

    let page = registry.timeline(id, 1, 0).await.unwrap();
    assert_eq!(page.page_size, 50);
    assert_eq!(page.items[0].event, TickEvent::MissionStarted);
}

#[tokio::test(start_paused = true)]
async fn double_start_keeps_the_same_mission() {
    let (registry, _shutdown) = registry_with(fast_constants());
    let id = registry.create_mission(PLAIN).unwrap().mission.id;
    let first = registry.start_mission(id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    let before = registry.timeline(id, 1, 1).await.unwrap();

    let second = registry.start_mission(id).await.unwrap();
    assert_eq!(second.mission.id, first.mission.id);
    assert_eq!(second.mission.started_at, first.mission.started_at);

    let after = registry.timeline(id, 1, 1).await.unwrap();
    assert_eq!(after.items[0].sequence, 1);
    assert!(after.total_count >= before.total_count);
}

#[tokio::test(start_paused = true)]
async fn abort_before_start_logs_nothing() {
    let (registry, _shutdown) = registry_with(fast_constants());
    let id = registry.create_mission(LIGHT).unwrap().mission.id;
    let aborted = registry.abort_mission(id).await.unwrap();
    assert_eq!(aborted.mission.status, MissionStatus::Aborted);
    assert_eq!(
        aborted.mission.result.as_deref(),
        Some(crate::runtime::RESULT_ABORTED_BEFORE_TAKEOFF)
    );

    let again = registry.start_mission(id).await.unwrap();
    assert_eq!(again.mission.status, MissionStatus::Aborted);
    assert_eq!(registry.timeline(id, 1, 50).await.unwrap().total_count, 0);
}

#[tokio::test(start_paused = true)]
async fn abort_in_flight_ends_aborted() {
    let (registry, _shutdown) = registry_with(fast_constants());
    let id = registry.create_mission(PLAIN).unwrap().mission.id;
    registry.start_mission(id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    registry.abort_mission(id).await.unwrap();

    let done = wait_for_terminal(&registry, id).await;
    assert_eq!(done.mission.status, MissionStatus::Aborted);
}

#[tokio::test(start_paused = true)]
async fn listing_is_newest_first_and_ids_are_shared() {
    let (registry, _shutdown) = registry_with(fast_constants());
    let ids: Vec<MissionId> = [LIGHT, PLAIN, LIGHT]
        .into_iter()
        .map(|target| registry.create_mission(target).unwrap().mission.id)
        .collect();
    assert_eq!(registry.len(), 3);

    let listed: Vec<MissionId> = registry.list_missions().await.iter().map(|m| m.id).collect();
    let mut expected = ids.clone();
    expected.reverse();
    assert_eq!(listed, expected);

    registry.start_mission(ids[0]).await.unwrap();
    wait_for_terminal(&registry, ids[0]).await;
    let page = registry.timeline(ids[0], 1, 2000).await.unwrap();
    for tick in &page.items {
        assert!(ids.iter().all(|id| id.0 != tick.id.0));
    }
}

#[tokio::test(start_paused = true)]
async fn shutdown_halts_simulation_but_keeps_reads() {
    let (registry, shutdown) = registry_with(fast_constants());
    let id = registry.create_mission(PLAIN).unwrap().mission.id;
    registry.start_mission(id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    shutdown.send(true).unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let halted = registry.timeline(id, 1, 1).await.unwrap().total_count;

    tokio::time::sleep(Duration::from_millis(500)).await;
    let snapshot = registry.get_mission(id).await.unwrap();
    assert_eq!(snapshot.mission.status, MissionStatus::Running);
    assert_eq!(registry.timeline(id, 1, 1).await.unwrap().total_count, halted);
}

#[tokio::test(start_paused = true)]
async fn simulation_fault_aborts_the_mission() {
    let (registry, _shutdown) = registry_with(Constants {
        ticks_per_minute: -0.0,
        ..fast_constants()
    });
    let id = registry.create_mission(PLAIN).unwrap().mission.id;
    registry.start_mission(id).await.unwrap();

    let done = wait_for_terminal(&registry, id).await;
    assert_eq!(done.mission.status, MissionStatus::Aborted);
    assert_eq!(done.mission.result.as_deref(), Some("simulation fault"));

    let page = registry.timeline(id, 1, 2000).await.unwrap();
    assert_eq!(
        page.items.last().map(|t| t.event.label()),
        Some("simulation_fault")
    );
}

#[tokio::test]
async fn zero_interval_runs_on_yield_only() {
    let (registry, _shutdown) = registry_with(Constants {
        tick_interval_ms: 0,
        ..Constants::default()
    });
    let id = registry.create_mission(LIGHT).unwrap().mission.id;
    registry.start_mission(id).await.unwrap();
    let done = wait_for_terminal(&registry, id).await;
    assert!(done.mission.status.is_terminal());
}

#[tokio::test(start_paused = true)]
async fn same_seed_same_mission() {
    let mut runs = Vec::new();
    for _ in 0..2 {
        let (registry, _shutdown) = registry_with(fast_constants());
        let id = registry.create_mission(LIGHT).unwrap().mission.id;
        registry.start_mission(id).await.unwrap();
        let done = wait_for_terminal(&registry, id).await;
        let page = registry.timeline(id, 1, 2000).await.unwrap();
        runs.push((done.mission.result, done.seed, page.items));
    }
    assert_eq!(runs[0], runs[1]);
}
