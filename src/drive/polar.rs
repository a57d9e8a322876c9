// Joystick axes to polar (heading, speed)

use num_traits::Float;

use crate::config::MAX_MOTOR_SPEED;

/// Polar form of a joystick reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarReading<F = f32> {
    pub heading: F,
    pub speed: F,
}

/// Convert raw joystick axes using the default motor limit
pub fn to_polar<F: Float>(axis_x: i16, axis_y: i16) -> PolarReading<F> {
    to_polar_with_limit(axis_x, axis_y, MAX_MOTOR_SPEED)
}

/// Convert raw joystick axes to a heading and speed
///
/// `speed` is `max_motor_speed / |stick|`: the further the stick is pushed,
/// the smaller the value. The control loop drives from the button-selected
/// heading instead, so this is reported but never fed to the mixer.
/// A centred stick gives a speed of 0.
pub fn to_polar_with_limit<F: Float>(
    axis_x: i16,
    axis_y: i16,
    max_motor_speed: i16,
) -> PolarReading<F> {
    let x = F::from(axis_x).unwrap_or_else(F::zero);
    let y = F::from(axis_y).unwrap_or_else(F::zero);
    let m = F::from(max_motor_speed).unwrap_or_else(F::zero);

    let heading = y.atan2(x);
    let magnitude = (x * x + y * y).sqrt();
    let speed = if magnitude > F::zero() {
        m / magnitude
    } else {
        F::zero()
    };

    PolarReading { heading, speed }
}
