// Loop timing, topics, motor limits
use std::time::Duration;

// Control loop period (one suspension per iteration)
pub const LOOP_PERIOD: Duration = Duration::from_millis(20);

// Pause after an out-of-range mode before the loop carries on
pub const FAULT_PAUSE: Duration = Duration::from_millis(100);

// Input watchdog: with no operator sample this long, everything reads as released
pub const INPUT_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_INPUT: &str = "xdrive/input/operator"; // operator samples
pub const TOPIC_MOTORS: &str = "xdrive/rt/motors"; // actuation
pub const TOPIC_DISPLAY: &str = "xdrive/state/display"; // two-line status
pub const TOPIC_HEALTH: &str = "xdrive/state/health"; // health status

// Motor command limits
pub const MAX_MOTOR_SPEED: i16 = 127;
pub const DEADBAND: i16 = 10;

// First display line, set once per session
pub const DISPLAY_TITLE: &str = "Cycle PI/4";

/// Runtime knobs that can be overridden from the command line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeConfig {
    pub period: Duration,
    pub input_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            period: LOOP_PERIOD,
            input_timeout: INPUT_TIMEOUT,
        }
    }
}
