use serde::{Deserialize, Serialize};

/// Flight-plan stage of a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Takeoff,
    Cruise,
    Approach,
    Engage,
    Egress,
    Land,
}

/// Phases flown once a mission starts, in order.
pub const FLIGHT_PLAN: [Phase; 6] = [
    Phase::Takeoff,
    Phase::Cruise,
    Phase::Approach,
    Phase::Engage,
    Phase::Egress,
    Phase::Land,
];

/// Distance adjustment applied once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Leg {
    Closing { step_m: f64, floor_m: f64 },
    Opening { step_m: f64, ceiling_m: f64 },
}

impl Phase {
    /// Ticks allotted to the phase. `Idle` is never flown.
    pub fn tick_budget(self) -> u32 {
        match self {
            Self::Idle => 0,
            Self::Takeoff => 25,
            Self::Cruise => 80,
            Self::Approach => 50,
            Self::Engage => 120,
            Self::Egress => 45,
            Self::Land => 30,
        }
    }

    /// Battery and fuel burn in percent per minute of flight.
    pub fn consumption_per_minute(self) -> f64 {
        match self {
            Self::Takeoff => 5.0,
            Self::Approach | Self::Egress => 3.0,
            Self::Engage => 6.0,
            Self::Idle | Self::Cruise | Self::Land => 2.0,
        }
    }

    /// Whether the damage roll applies in this phase.
    pub fn exposed(self) -> bool {
        !matches!(self, Self::Idle | Self::Takeoff | Self::Land)
    }

    fn leg(self) -> Option<Leg> {
        match self {
            Self::Idle => None,
            Self::Takeoff => Some(Leg::Closing { step_m: 15.0, floor_m: 1200.0 }),
            Self::Cruise => Some(Leg::Closing { step_m: 14.0, floor_m: 350.0 }),
            Self::Approach => Some(Leg::Closing { step_m: 10.0, floor_m: 40.0 }),
            Self::Engage => Some(Leg::Closing { step_m: 2.0, floor_m: 15.0 }),
            Self::Egress => Some(Leg::Opening { step_m: 18.0, ceiling_m: 1800.0 }),
            Self::Land => Some(Leg::Closing { step_m: 25.0, floor_m: 0.0 }),
        }
    }

    /// Distance to target after one tick of this phase, clamped to the leg's
    /// floor or ceiling.
    pub fn next_distance(self, distance_m: f64) -> f64 {
        let next = match self.leg() {
            None => distance_m,
            Some(Leg::Closing { step_m, floor_m }) => (distance_m - step_m).max(floor_m),
            Some(Leg::Opening { step_m, ceiling_m }) => (distance_m + step_m).min(ceiling_m),
        };
        next.max(0.0)
    }

    pub fn position(self) -> Option<usize> {
        FLIGHT_PLAN.iter().position(|p| *p == self)
    }

    pub fn successor(self) -> Option<Phase> {
        match self {
            Self::Idle => Some(Self::Takeoff),
            other => other
                .position()
                .and_then(|index| FLIGHT_PLAN.get(index + 1).copied()),
        }
    }
}
