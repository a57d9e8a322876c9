// Message types exchanged with the operator and hardware sides

use serde::{Deserialize, Serialize};

use crate::config::MAX_MOTOR_SPEED;

// Buttons on the two-line status display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayButtons {
    pub left: bool,
    pub center: bool,
    pub right: bool,
}

// Button group 8 on the primary joystick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoystickButtons {
    pub left: bool,
    pub up: bool,
    pub right: bool,
}

/// One sample of every operator input, operator -> runtime
///
/// Missing fields deserialize as released / centred, so a publisher only
/// needs to send what it has.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSnapshot {
    pub display: DisplayButtons,
    pub joystick: JoystickButtons,
    pub axis_x: i16,
    pub axis_y: i16,
}

/// Four drive motor commands, runtime -> hardware
///
/// Every component stays within `±MAX_MOTOR_SPEED`; the all-zero default is
/// a full stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorOutputSet {
    pub front_left: i16,
    pub front_right: i16,
    pub rear_left: i16,
    pub rear_right: i16,
}

impl MotorOutputSet {
    pub fn new(front_left: i16, front_right: i16, rear_left: i16, rear_right: i16) -> Self {
        Self {
            front_left,
            front_right,
            rear_left,
            rear_right,
        }
    }

    pub fn stopped() -> Self {
        Self::default()
    }

    /// Same command on all four motors (in-place rotation)
    pub fn uniform(value: i16) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn is_stopped(&self) -> bool {
        *self == Self::stopped()
    }

    /// Returns values as array [front_left, front_right, rear_left, rear_right]
    pub fn as_array(&self) -> [i16; 4] {
        [
            self.front_left,
            self.front_right,
            self.rear_left,
            self.rear_right,
        ]
    }

    /// Largest magnitude across the four motors
    pub fn peak(&self) -> i16 {
        self.as_array()
            .iter()
            .map(|v| v.saturating_abs())
            .max()
            .unwrap_or(0)
    }

    pub fn within_limits(&self) -> bool {
        self.peak() <= MAX_MOTOR_SPEED
    }
}

/// Both lines of the status display, runtime -> display
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayFrame {
    pub line1: String,
    pub line2: String,
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    InputStale,
    Killed,
}
