// Button debouncing for operator inputs

use crate::messages::InputSnapshot;

/// Digital inputs the control loop watches
///
/// The display buttons and joystick group 8 are redundant sources for the
/// same three actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputId {
    DisplayLeft,
    DisplayCenter,
    DisplayRight,
    JoystickLeft,
    JoystickUp,
    JoystickRight,
}

/// What a button press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Decrement,
    Kill,
    Increment,
}

impl InputId {
    pub const COUNT: usize = 6;

    pub const ALL: [InputId; Self::COUNT] = [
        InputId::DisplayLeft,
        InputId::DisplayCenter,
        InputId::DisplayRight,
        InputId::JoystickLeft,
        InputId::JoystickUp,
        InputId::JoystickRight,
    ];

    pub fn action(self) -> Action {
        match self {
            InputId::DisplayLeft | InputId::JoystickLeft => Action::Decrement,
            InputId::DisplayCenter | InputId::JoystickUp => Action::Kill,
            InputId::DisplayRight | InputId::JoystickRight => Action::Increment,
        }
    }

    pub fn is_down(self, inputs: &InputSnapshot) -> bool {
        match self {
            InputId::DisplayLeft => inputs.display.left,
            InputId::DisplayCenter => inputs.display.center,
            InputId::DisplayRight => inputs.display.right,
            InputId::JoystickLeft => inputs.joystick.left,
            InputId::JoystickUp => inputs.joystick.up,
            InputId::JoystickRight => inputs.joystick.right,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// One-shot latch: reports a press once, on the released -> pressed edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeLatch {
    pressed: bool,
}

impl EdgeLatch {
    /// Feed the current level, returns true on a new press
    pub fn update(&mut self, down: bool) -> bool {
        let edge = down && !self.pressed;
        self.pressed = down;
        edge
    }

    pub fn is_latched(&self) -> bool {
        self.pressed
    }
}
