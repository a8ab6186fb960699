//! One task per mission. The actor owns its `MissionRuntime` outright and
//! interleaves host commands with simulation ticks.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Interval, MissedTickBehavior};

use crate::runtime::MissionRuntime;
use crate::{MissionSnapshot, TimelinePage};

pub(crate) enum MissionCommand {
    Start(oneshot::Sender<MissionSnapshot>),
    Abort(oneshot::Sender<MissionSnapshot>),
    Snapshot(oneshot::Sender<MissionSnapshot>),
    Timeline {
        page: u32,
        page_size: u32,
        reply: oneshot::Sender<TimelinePage>,
    },
}

pub(crate) struct MissionActor {
    runtime: MissionRuntime,
    commands: mpsc::Receiver<MissionCommand>,
    shutdown: watch::Receiver<bool>,
    watching_shutdown: bool,
    halted: bool,
    tick_interval: Option<Duration>,
}

impl MissionActor {
    pub(crate) fn new(
        runtime: MissionRuntime,
        commands: mpsc::Receiver<MissionCommand>,
        shutdown: watch::Receiver<bool>,
        tick_interval: Option<Duration>,
    ) -> Self {
        let halted = *shutdown.borrow();
        Self {
            runtime,
            commands,
            shutdown,
            watching_shutdown: !halted,
            halted,
            tick_interval,
        }
    }

    /// Serve commands until every handle to the mission is dropped.
    pub(crate) async fn run(mut self) {
        let mut interval = self.tick_interval.map(|period| {
            let mut iv = tokio::time::interval(period);
            iv.set_missed_tick_behavior(MissedTickBehavior::Delay);
            iv
        });

        loop {
            let flying = self.runtime.is_running() && !self.halted;
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                changed = self.shutdown.changed(), if self.watching_shutdown => {
                    if changed.is_err() {
                        self.watching_shutdown = false;
                    } else if *self.shutdown.borrow() {
                        self.halt();
                    }
                }
                () = next_tick(interval.as_mut()), if flying => self.tick(),
            }
        }
        tracing::debug!("mission {} actor stopped", self.runtime.id());
    }

    fn handle(&mut self, command: MissionCommand) {
        match command {
            MissionCommand::Start(reply) => {
                self.runtime.start();
                let _ = reply.send(self.runtime.snapshot());
            }
            MissionCommand::Abort(reply) => {
                self.runtime.request_abort();
                let _ = reply.send(self.runtime.snapshot());
            }
            MissionCommand::Snapshot(reply) => {
                let _ = reply.send(self.runtime.snapshot());
            }
            MissionCommand::Timeline {
                page,
                page_size,
                reply,
            } => {
                let _ = reply.send(self.runtime.timeline(page, page_size));
            }
        }
    }

    /// Advance one tick. Failures never leave the task: they end the mission.
    fn tick(&mut self) {
        let runtime = &mut self.runtime;
        match panic::catch_unwind(AssertUnwindSafe(|| runtime.advance())) {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => self.runtime.fault(&err.to_string()),
            Err(payload) => self.runtime.fault(&panic_message(payload.as_ref())),
        }
    }

    fn halt(&mut self) {
        self.halted = true;
        self.watching_shutdown = false;
        tracing::info!(
            "mission {} halted by shutdown during {:?}",
            self.runtime.id(),
            self.runtime.phase()
        );
    }
}

async fn next_tick(interval: Option<&mut Interval>) {
    match interval {
        Some(iv) => {
            iv.tick().await;
        }
        None => tokio::task::yield_now().await,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in simulation task".to_string()
    }
}
