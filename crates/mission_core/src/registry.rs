use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot, watch};

use crate::actor::{MissionActor, MissionCommand};
use crate::id::mission_rng;
use crate::plan::MissionPlan;
use crate::runtime::MissionRuntime;
use crate::{
    Constants, IdSequence, Mission, MissionError, MissionId, MissionSnapshot, RuleCatalog,
    TargetDirectory, TargetId, TimelinePage,
};

const COMMAND_BUFFER: usize = 32;

#[derive(Clone)]
struct MissionHandle {
    commands: mpsc::Sender<MissionCommand>,
}

/// In-memory index of every mission created by this process.
pub struct MissionRegistry {
    directory: Arc<dyn TargetDirectory>,
    catalog: Arc<RuleCatalog>,
    constants: Arc<Constants>,
    ids: Arc<IdSequence>,
    base_seed: u64,
    shutdown: watch::Receiver<bool>,
    missions: RwLock<BTreeMap<MissionId, MissionHandle>>,
}

impl MissionRegistry {
    /// `shutdown` halts every mission's simulation once it reads `true`.
    pub fn new(
        directory: Arc<dyn TargetDirectory>,
        catalog: Arc<RuleCatalog>,
        constants: Constants,
        base_seed: u64,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            directory,
            catalog,
            constants: Arc::new(constants),
            ids: Arc::new(IdSequence::new()),
            base_seed,
            shutdown,
            missions: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    pub fn len(&self) -> usize {
        self.missions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.missions.read().is_empty()
    }

    /// Plan a mission against `target` and park it in `Planned`.
    ///
    /// Must be called from within a Tokio runtime: the mission's actor task
    /// is spawned here.
    pub fn create_mission(&self, target: TargetId) -> Result<MissionSnapshot, MissionError> {
        let profile = self
            .directory
            .target_profile(target)
            .ok_or(MissionError::TargetNotFound(target))?;
        let analysis = self.directory.risk_analysis(target);

        let id = MissionId(self.ids.next());
        let (seed, mut rng) = mission_rng(self.base_seed, id.0);
        let plan = MissionPlan::build(
            &profile,
            analysis.as_ref(),
            &self.catalog,
            &self.constants,
            &mut rng,
        );
        let runtime = MissionRuntime::new(
            id,
            plan,
            seed,
            rng,
            Arc::clone(&self.constants),
            Arc::clone(&self.ids),
        );
        let snapshot = runtime.snapshot();

        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let actor = MissionActor::new(
            runtime,
            rx,
            self.shutdown.clone(),
            self.constants.tick_interval(),
        );
        tokio::spawn(actor.run());
        self.missions
            .write()
            .insert(id, MissionHandle { commands: tx });

        tracing::info!(
            "mission {id} planned for target {target} ({} tactics, risk {:.0})",
            snapshot.mission.strategy.tactics.len(),
            snapshot.mission.risk_total
        );
        Ok(snapshot)
    }

    /// Launch a planned mission. Starting a mission that already left
    /// `Planned` returns its current state unchanged.
    pub async fn start_mission(&self, id: MissionId) -> Result<MissionSnapshot, MissionError> {
        self.request(id, MissionCommand::Start).await
    }

    /// Request an abort. Planned missions abort immediately; running ones
    /// turn back at the next phase boundary.
    pub async fn abort_mission(&self, id: MissionId) -> Result<MissionSnapshot, MissionError> {
        self.request(id, MissionCommand::Abort).await
    }

    pub async fn get_mission(&self, id: MissionId) -> Option<MissionSnapshot> {
        self.request(id, MissionCommand::Snapshot).await.ok()
    }

    /// All missions, newest first.
    pub async fn list_missions(&self) -> Vec<Mission> {
        let handles: Vec<(MissionId, MissionHandle)> = self
            .missions
            .read()
            .iter()
            .map(|(id, handle)| (*id, handle.clone()))
            .collect();

        let mut missions = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            match ask(id, &handle, MissionCommand::Snapshot).await {
                Ok(snapshot) => missions.push(snapshot.mission),
                Err(err) => tracing::warn!("skipping mission in listing: {err}"),
            }
        }
        missions.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        missions
    }

    pub async fn timeline(
        &self,
        id: MissionId,
        page: u32,
        page_size: u32,
    ) -> Result<TimelinePage, MissionError> {
        self.request(id, |reply| MissionCommand::Timeline {
            page,
            page_size,
            reply,
        })
        .await
    }

    async fn request<T>(
        &self,
        id: MissionId,
        command: impl FnOnce(oneshot::Sender<T>) -> MissionCommand,
    ) -> Result<T, MissionError> {
        let handle = self
            .missions
            .read()
            .get(&id)
            .cloned()
            .ok_or(MissionError::MissionNotFound(id))?;
        ask(id, &handle, command).await
    }
}

async fn ask<T>(
    id: MissionId,
    handle: &MissionHandle,
    command: impl FnOnce(oneshot::Sender<T>) -> MissionCommand,
) -> Result<T, MissionError> {
    let (reply, response) = oneshot::channel();
    handle
        .commands
        .send(command(reply))
        .await
        .map_err(|_| MissionError::MissionUnavailable(id))?;
    response
        .await
        .map_err(|_| MissionError::MissionUnavailable(id))
}
