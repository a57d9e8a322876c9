// Hardware-facing collaborator interface for the control loop
//
// The loop never touches devices directly: it reads buttons/axes, writes
// motor commands and display text through `DriveIo`, and hands control back
// once per iteration through `exchange`.

use crate::messages::{InputSnapshot, MotorOutputSet, RuntimeHealth};
use crate::teleop::InputId;

/// Input sources (two redundant sources for the same buttons)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputDevice {
    Display,
    Joystick,
}

/// Digital channel on an input device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Left,
    Center,
    Right,
    Up,
}

/// Analog joystick axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Drive motor positions on the chassis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorId {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl MotorId {
    pub const ALL: [MotorId; 4] = [
        MotorId::FrontLeft,
        MotorId::FrontRight,
        MotorId::RearLeft,
        MotorId::RearRight,
    ];

    pub fn select(self, set: &MotorOutputSet) -> i16 {
        match self {
            MotorId::FrontLeft => set.front_left,
            MotorId::FrontRight => set.front_right,
            MotorId::RearLeft => set.rear_left,
            MotorId::RearRight => set.rear_right,
        }
    }

    pub fn slot(self, set: &mut MotorOutputSet) -> &mut i16 {
        match self {
            MotorId::FrontLeft => &mut set.front_left,
            MotorId::FrontRight => &mut set.front_right,
            MotorId::RearLeft => &mut set.rear_left,
            MotorId::RearRight => &mut set.rear_right,
        }
    }
}

/// Status display line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayLine {
    First,
    Second,
}

/// Operations the control loop needs from the hardware side
#[allow(async_fn_in_trait)]
pub trait DriveIo {
    type Error;

    fn read_digital(&mut self, device: InputDevice, channel: Channel) -> bool;

    fn read_analog(&mut self, device: InputDevice, axis: Axis) -> i16;

    /// Command one motor, `value` within `±MAX_MOTOR_SPEED`
    fn set_motor(&mut self, motor: MotorId, value: i16);

    fn stop_motor(&mut self, motor: MotorId) {
        self.set_motor(motor, 0);
    }

    fn stop_all(&mut self) {
        for motor in MotorId::ALL {
            self.stop_motor(motor);
        }
    }

    fn set_display_text(&mut self, line: DisplayLine, text: &str);

    /// Whether operator input is live; the loop holds every motor stopped
    /// while it is not
    fn link_up(&self) -> bool {
        true
    }

    /// Push this iteration's outputs and pick up fresh inputs
    async fn exchange(&mut self, health: RuntimeHealth) -> Result<(), Self::Error>;
}

/// Where each watched button lives
pub fn input_source(id: InputId) -> (InputDevice, Channel) {
    match id {
        InputId::DisplayLeft => (InputDevice::Display, Channel::Left),
        InputId::DisplayCenter => (InputDevice::Display, Channel::Center),
        InputId::DisplayRight => (InputDevice::Display, Channel::Right),
        InputId::JoystickLeft => (InputDevice::Joystick, Channel::Left),
        InputId::JoystickUp => (InputDevice::Joystick, Channel::Up),
        InputId::JoystickRight => (InputDevice::Joystick, Channel::Right),
    }
}

/// Answer a digital read from a snapshot (unmapped channels read released)
pub fn sample_digital(inputs: &InputSnapshot, device: InputDevice, channel: Channel) -> bool {
    InputId::ALL
        .iter()
        .find(|&&id| input_source(id) == (device, channel))
        .is_some_and(|id| id.is_down(inputs))
}

/// Answer an analog read from a snapshot (only the joystick has axes)
pub fn sample_analog(inputs: &InputSnapshot, device: InputDevice, axis: Axis) -> i16 {
    match (device, axis) {
        (InputDevice::Joystick, Axis::X) => inputs.axis_x,
        (InputDevice::Joystick, Axis::Y) => inputs.axis_y,
        (InputDevice::Display, _) => 0,
    }
}

/// Poll every input the loop watches
pub fn poll_inputs<I: DriveIo>(io: &mut I) -> InputSnapshot {
    let mut inputs = InputSnapshot::default();
    for id in InputId::ALL {
        let (device, channel) = input_source(id);
        let down = io.read_digital(device, channel);
        match id {
            InputId::DisplayLeft => inputs.display.left = down,
            InputId::DisplayCenter => inputs.display.center = down,
            InputId::DisplayRight => inputs.display.right = down,
            InputId::JoystickLeft => inputs.joystick.left = down,
            InputId::JoystickUp => inputs.joystick.up = down,
            InputId::JoystickRight => inputs.joystick.right = down,
        }
    }
    inputs.axis_x = io.read_analog(InputDevice::Joystick, Axis::X);
    inputs.axis_y = io.read_analog(InputDevice::Joystick, Axis::Y);
    inputs
}

/// Write a full motor set
pub fn apply_outputs<I: DriveIo>(io: &mut I, set: &MotorOutputSet) {
    for motor in MotorId::ALL {
        io.set_motor(motor, motor.select(set));
    }
}
