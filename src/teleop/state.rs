// Operator control state machine
//
// Buttons cycle the drive heading in PI/4 steps and latch the kill switch.
// One call to `ControlState::step` is one loop iteration.

use std::f32::consts::FRAC_PI_4;

use tracing::{error, info, warn};

use super::debounce::{Action, EdgeLatch, InputId};
use crate::drive::mix;
use crate::messages::{InputSnapshot, MotorOutputSet};

/// Number of selectable headings (PI/4 apart)
pub const MODE_COUNT: i32 = 8;

pub const KILLED_LABEL: &str = "KILLED";
pub const FAULT_LABEL: &str = "     ERROR      ";
pub const NO_LINK_LABEL: &str = "    NO LINK     ";

const HEADING_LABELS: [&str; MODE_COUNT as usize] = [
    "<      0       >",
    "<     PI/4     >",
    "<     PI/2     >",
    "<     3PI/4    >",
    "<      PI      >",
    "<     5PI/4    >",
    "<     3PI/2    >",
    "<     7PI/4    >",
];

/// Display label for a heading mode, `None` when out of range
pub fn heading_label(mode: i32) -> Option<&'static str> {
    usize::try_from(mode)
        .ok()
        .and_then(|i| HEADING_LABELS.get(i).copied())
}

/// What the motors should do this iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuation {
    Stop,
    Drive(MotorOutputSet),
}

impl Actuation {
    pub fn outputs(&self) -> MotorOutputSet {
        match self {
            Actuation::Stop => MotorOutputSet::stopped(),
            Actuation::Drive(set) => *set,
        }
    }
}

/// Result of one control iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cycle {
    /// Second display line
    pub label: &'static str,
    pub actuation: Actuation,
    /// Mode was out of range; motors were forced off this iteration
    pub fault: bool,
}

/// Mode and kill state for one operator-control session
///
/// A new session starts from `ControlState::default()`; nothing carries
/// over from a previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlState {
    radian_multiplier: i32,
    kill_switch: bool,
    latches: [EdgeLatch; InputId::COUNT],
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an arbitrary mode index; out-of-range values are wrapped
    /// on the next step
    pub fn with_mode(radian_multiplier: i32) -> Self {
        Self {
            radian_multiplier,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> i32 {
        self.radian_multiplier
    }

    pub fn is_killed(&self) -> bool {
        self.kill_switch
    }

    pub fn is_latched(&self, id: InputId) -> bool {
        self.latches[id.index()].is_latched()
    }

    /// Heading selected by the current mode (radians)
    pub fn heading(&self) -> f32 {
        self.radian_multiplier as f32 * FRAC_PI_4
    }

    /// Run one iteration against a fresh input sample
    pub fn step(&mut self, inputs: &InputSnapshot) -> Cycle {
        let before = self.radian_multiplier;

        for id in InputId::ALL {
            if self.latches[id.index()].update(id.is_down(inputs)) {
                self.apply(id.action());
            }
        }
        self.wrap_mode();

        if self.radian_multiplier != before {
            info!(from = before, to = self.radian_multiplier, "Heading mode changed");
        }

        self.resolve()
    }

    /// Turn the current mode/kill state into this iteration's output
    ///
    /// Does not wrap the mode: an out-of-range index here trips the fault
    /// (forced kill, mode back to 0).
    pub fn resolve(&mut self) -> Cycle {
        let (label, fault) = match heading_label(self.radian_multiplier) {
            Some(label) => (label, false),
            None => {
                self.trip_fault();
                (FAULT_LABEL, true)
            }
        };

        if self.kill_switch {
            return Cycle {
                label: KILLED_LABEL,
                actuation: Actuation::Stop,
                fault,
            };
        }

        Cycle {
            label,
            actuation: Actuation::Drive(mix(self.heading(), 1.0, 0)),
            fault,
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Decrement => {
                self.radian_multiplier = self.radian_multiplier.saturating_sub(1);
            }
            Action::Increment => {
                self.radian_multiplier = self.radian_multiplier.saturating_add(1);
            }
            Action::Kill => {
                if !self.kill_switch {
                    warn!("Kill switch engaged, motors stopped for the rest of the session");
                }
                self.kill_switch = true;
            }
        }
    }

    fn wrap_mode(&mut self) {
        if self.radian_multiplier >= MODE_COUNT {
            self.radian_multiplier = 0;
        }
        if self.radian_multiplier < 0 {
            self.radian_multiplier = MODE_COUNT - 1;
        }
    }

    fn trip_fault(&mut self) {
        error!(mode = self.radian_multiplier, "Heading mode out of range, forcing kill");
        self.kill_switch = true;
        self.radian_multiplier = 0;
    }
}
