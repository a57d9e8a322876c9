// X-drive teleop runtime
//
// - drive: X-drive mixer and joystick polar conversion
// - teleop: debounced heading-mode / kill-switch state machine
// - runtime: fixed-period operator control loop
// - io / bridge: hardware collaborator interface and its zenoh transport

pub mod bridge;
pub mod config;
pub mod drive;
pub mod io;
pub mod messages;
pub mod runtime;
pub mod teleop;
