// X-drive mixing for a four-wheel holonomic base
// Converts a heading/speed/rotation command into four motor commands.

use num_traits::{Float, FloatConst};

use crate::config::{DEADBAND, MAX_MOTOR_SPEED};
use crate::messages::MotorOutputSet;

/// Motion request for one control cycle
///
/// * `heading` - Direction of travel in radians (0 = forward, PI/2 = right)
/// * `speed` - Translational speed from 0 to 1
/// * `rotation` - Rotation bias in motor units, within `±max_motor_speed`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveCommand<F = f32> {
    pub heading: F,
    pub speed: F,
    pub rotation: i16,
}

impl<F: Float> DriveCommand<F> {
    pub fn new(heading: F, speed: F, rotation: i16) -> Self {
        Self {
            heading,
            speed,
            rotation,
        }
    }

    /// Rotate in place (no translation)
    pub fn spin(rotation: i16) -> Self {
        Self::new(F::zero(), F::zero(), rotation)
    }
}

/// Mixer parameters for an X-drive chassis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XDrive {
    max_motor_speed: i16,
    deadband: i16,
}

impl Default for XDrive {
    fn default() -> Self {
        Self::new(MAX_MOTOR_SPEED, DEADBAND)
    }
}

impl XDrive {
    pub fn new(max_motor_speed: i16, deadband: i16) -> Self {
        Self {
            max_motor_speed: max_motor_speed.saturating_abs(),
            deadband: deadband.saturating_abs(),
        }
    }

    pub fn max_motor_speed(&self) -> i16 {
        self.max_motor_speed
    }

    pub fn deadband(&self) -> i16 {
        self.deadband
    }

    /// Mix a drive command into motor outputs
    ///
    /// With positive speed each wheel gets the projection of the heading onto
    /// its roller axis, plus the rotation bias, and the set is rescaled so the
    /// largest magnitude equals `speed * max_motor_speed`. With zero speed the
    /// base either spins in place (rotation outside the deadband) or stops.
    pub fn mix<F: Float + FloatConst>(&self, cmd: &DriveCommand<F>) -> MotorOutputSet {
        let rotation = cmd
            .rotation
            .clamp(-self.max_motor_speed, self.max_motor_speed);

        // NaN and negative speeds fall through to the zero-speed branch
        if cmd.speed > F::zero() {
            let m = self.limit::<F>();
            let bias = F::from(rotation).unwrap_or_else(F::zero);
            let lead = (F::FRAC_PI_4() - cmd.heading).cos();
            let lag = (F::FRAC_PI_4() + cmd.heading).cos();

            // [front_left, front_right, rear_left, rear_right]
            let raw = [-m * lead + bias, m * lag + bias, -m * lag + bias, m * lead + bias];

            let max_value = max_magnitude(&raw);
            if max_value <= F::zero() {
                return MotorOutputSet::stopped();
            }

            let scale = cmd.speed * m / max_value;
            let [fl, fr, rl, rr] = raw.map(|v| self.to_motor(v * scale));
            MotorOutputSet::new(fl, fr, rl, rr)
        } else if rotation.abs() > self.deadband {
            MotorOutputSet::uniform(rotation)
        } else {
            MotorOutputSet::stopped()
        }
    }

    fn limit<F: Float>(&self) -> F {
        F::from(self.max_motor_speed).unwrap_or_else(F::zero)
    }

    /// Round to the nearest motor unit and clamp to the motor limit
    fn to_motor<F: Float>(&self, value: F) -> i16 {
        if value.is_nan() {
            return 0;
        }
        let m = self.limit::<F>();
        value.round().max(-m).min(m).to_i16().unwrap_or(0)
    }
}

/// Mix with the default motor limit and deadband
pub fn mix<F: Float + FloatConst>(heading: F, speed: F, rotation: i16) -> MotorOutputSet {
    XDrive::default().mix(&DriveCommand::new(heading, speed, rotation))
}

/// Largest absolute value in the slice (0 for an empty slice)
pub(crate) fn max_magnitude<F: Float>(values: &[F]) -> F {
    values.iter().fold(F::zero(), |acc, v| acc.max(v.abs()))
}
