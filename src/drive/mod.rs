// Drive math for the X-drive base
//
// Provides:
// - X-drive mixing (heading/speed/rotation -> four motor commands)
// - Joystick axes to polar heading/speed conversion

pub mod mixer;
pub mod polar;

pub use mixer::{DriveCommand, XDrive, mix};
pub use polar::{PolarReading, to_polar};
