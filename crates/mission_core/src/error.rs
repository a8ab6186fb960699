use thiserror::Error;

use crate::{MissionId, TargetId};

#[derive(Debug, Error, PartialEq)]
pub enum MissionError {
    #[error("target {0} not found")]
    TargetNotFound(TargetId),
    #[error("mission {0} not found")]
    MissionNotFound(MissionId),
    #[error("mission {0} is no longer reachable")]
    MissionUnavailable(MissionId),
    #[error("simulation fault: {0}")]
    SimulationFault(String),
}
