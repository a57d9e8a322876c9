// Operator control loop: fixed-period, single task
// Each iteration: poll inputs -> step state machine -> write motors/display -> yield.
// A restart (new session) always begins from default state; nothing is resumed.
// While the operator link is down the motors are held stopped; when it comes
// back a new session starts.

use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::{info, trace, warn};

use crate::config::{DISPLAY_TITLE, FAULT_PAUSE, RuntimeConfig};
use crate::drive::{PolarReading, to_polar};
use crate::io::{DisplayLine, DriveIo, apply_outputs, poll_inputs};
use crate::messages::RuntimeHealth;
use crate::teleop::state::{FAULT_LABEL, NO_LINK_LABEL};
use crate::teleop::{Actuation, ControlState, Cycle};

pub struct Runtime<I> {
    io: I,
    state: ControlState,
    config: RuntimeConfig,
    link_lost: bool,
}

impl<I: DriveIo> Runtime<I> {
    pub fn new(io: I, config: RuntimeConfig) -> Self {
        Self {
            io,
            state: ControlState::default(),
            config,
            link_lost: false,
        }
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn io(&self) -> &I {
        &self.io
    }

    pub fn health(&self) -> RuntimeHealth {
        if self.link_lost {
            RuntimeHealth::InputStale
        } else if self.state.is_killed() {
            RuntimeHealth::Killed
        } else {
            RuntimeHealth::Ok
        }
    }

    /// Reset to a fresh session
    pub fn begin_session(&mut self) {
        self.state = ControlState::default();
        self.io.set_display_text(DisplayLine::First, DISPLAY_TITLE);
    }

    /// Run one loop iteration (without the period wait)
    pub async fn iterate(&mut self) -> Result<Cycle, I::Error> {
        if !self.io.link_up() {
            return self.hold_stopped().await;
        }
        if self.link_lost {
            info!("Operator input restored, starting a new session");
            self.link_lost = false;
            self.begin_session();
        }

        let inputs = poll_inputs(&mut self.io);

        // Joystick drive is not wired in; report the reading only
        let polar: PolarReading<f32> = to_polar(inputs.axis_x, inputs.axis_y);
        trace!(heading = polar.heading, speed = polar.speed, "Joystick polar reading");

        let cycle = self.state.step(&inputs);
        self.actuate(cycle).await
    }

    /// Write one resolved cycle to the hardware and publish it
    ///
    /// A faulted cycle first publishes the error frame with every motor
    /// stopped and waits `FAULT_PAUSE` before the regular frame.
    pub async fn actuate(&mut self, cycle: Cycle) -> Result<Cycle, I::Error> {
        if cycle.fault {
            self.io.set_display_text(DisplayLine::Second, FAULT_LABEL);
            self.io.stop_all();
            let health = self.health();
            self.io.exchange(health).await?;
            sleep(FAULT_PAUSE).await;
        }

        self.io.set_display_text(DisplayLine::Second, cycle.label);
        match cycle.actuation {
            Actuation::Stop => self.io.stop_all(),
            Actuation::Drive(set) => apply_outputs(&mut self.io, &set),
        }
        let health = self.health();
        self.io.exchange(health).await?;

        Ok(cycle)
    }

    async fn hold_stopped(&mut self) -> Result<Cycle, I::Error> {
        if !self.link_lost {
            warn!("Operator input lost, holding motors stopped");
            self.link_lost = true;
        }
        let cycle = Cycle {
            label: NO_LINK_LABEL,
            actuation: Actuation::Stop,
            fault: false,
        };
        self.actuate(cycle).await
    }

    /// Run the session until an I/O error; never returns `Ok`
    pub async fn run(&mut self) -> Result<(), I::Error> {
        self.begin_session();

        let mut tick = interval(self.config.period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Operator control started: {}ms loop, {}ms input timeout",
            self.config.period.as_millis(),
            self.config.input_timeout.as_millis()
        );

        loop {
            tick.tick().await;
            self.iterate().await?;
        }
    }

    /// End the session with every motor stopped
    pub async fn shutdown(&mut self) -> Result<(), I::Error> {
        info!("Stopping all motors");
        self.io.stop_all();
        let health = self.health();
        self.io.exchange(health).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::convert::Infallible;
    use std::time::Instant;

    use crate::bridge::InputWatchdog;
    use crate::config::{INPUT_TIMEOUT, LOOP_PERIOD, MAX_MOTOR_SPEED};
    use crate::drive::mix;
    use crate::io::{Axis, Channel, InputDevice, MotorId, sample_analog, sample_digital};
    use crate::messages::{DisplayButtons, InputSnapshot, JoystickButtons, MotorOutputSet};
    use crate::teleop::state::KILLED_LABEL;
    use crate::teleop::{InputId, MODE_COUNT};

    /// In-memory hardware: scripted inputs, recorded outputs
    ///
    /// One script entry is delivered per exchange; `None` means the operator
    /// sent nothing that tick. Each exchange advances the clock by one loop
    /// period, and an exhausted script keeps sending released inputs.
    struct FakeIo {
        watchdog: InputWatchdog,
        clock: Instant,
        current: InputSnapshot,
        script: VecDeque<Option<InputSnapshot>>,
        motors: MotorOutputSet,
        line1: String,
        line2: String,
        published: Vec<(MotorOutputSet, String, RuntimeHealth)>,
    }

    impl FakeIo {
        fn with_samples(samples: &[Option<InputSnapshot>]) -> Self {
            let mut io = Self {
                watchdog: InputWatchdog::new(INPUT_TIMEOUT),
                clock: Instant::now(),
                current: InputSnapshot::default(),
                script: samples.iter().copied().collect(),
                motors: MotorOutputSet::stopped(),
                line1: String::new(),
                line2: String::new(),
                published: Vec::new(),
            };
            io.deliver();
            io
        }

        fn scripted(inputs: &[InputSnapshot]) -> Self {
            let samples: Vec<_> = inputs.iter().copied().map(Some).collect();
            Self::with_samples(&samples)
        }

        fn deliver(&mut self) {
            let next = self.script.pop_front().unwrap_or(Some(InputSnapshot::default()));
            if let Some(inputs) = next {
                self.watchdog.on_sample(inputs, self.clock);
            }
            self.watchdog.refresh(self.clock);
            self.current = self.watchdog.current();
        }
    }

    impl DriveIo for FakeIo {
        type Error = Infallible;

        fn read_digital(&mut self, device: InputDevice, channel: Channel) -> bool {
            sample_digital(&self.current, device, channel)
        }

        fn read_analog(&mut self, device: InputDevice, axis: Axis) -> i16 {
            sample_analog(&self.current, device, axis)
        }

        fn set_motor(&mut self, motor: MotorId, value: i16) {
            *motor.slot(&mut self.motors) = value;
        }

        fn set_display_text(&mut self, line: DisplayLine, text: &str) {
            match line {
                DisplayLine::First => self.line1 = text.to_string(),
                DisplayLine::Second => self.line2 = text.to_string(),
            }
        }

        fn link_up(&self) -> bool {
            !self.watchdog.is_stale()
        }

        async fn exchange(&mut self, health: RuntimeHealth) -> Result<(), Infallible> {
            self.published.push((self.motors, self.line2.clone(), health));
            self.clock += LOOP_PERIOD;
            self.deliver();
            Ok(())
        }
    }

    fn kill() -> InputSnapshot {
        InputSnapshot {
            display: DisplayButtons {
                center: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn next() -> InputSnapshot {
        InputSnapshot {
            joystick: JoystickButtons {
                right: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn runtime(inputs: &[InputSnapshot]) -> Runtime<FakeIo> {
        let mut rt = Runtime::new(FakeIo::scripted(inputs), RuntimeConfig::default());
        rt.begin_session();
        rt
    }

    /// `first`, then `silent` ticks with no operator sample
    fn runtime_with_dropout(first: InputSnapshot, silent: usize) -> Runtime<FakeIo> {
        let mut samples = vec![Some(first)];
        samples.extend(std::iter::repeat_n(None, silent));
        let mut rt = Runtime::new(FakeIo::with_samples(&samples), RuntimeConfig::default());
        rt.begin_session();
        rt
    }

    #[tokio::test]
    async fn test_session_start_sets_title() {
        let rt = runtime(&[]);
        assert_eq!(rt.io().line1, DISPLAY_TITLE);
        assert_eq!(rt.state(), &ControlState::default());
    }

    #[tokio::test]
    async fn test_idle_iteration_drives_mode_zero() {
        let mut rt = runtime(&[InputSnapshot::default()]);
        rt.iterate().await.unwrap();

        let (motors, line2, health) = rt.io().published[0].clone();
        assert_eq!(motors, mix(0.0f32, 1.0, 0));
        assert_eq!(motors.peak(), MAX_MOTOR_SPEED);
        assert_eq!(line2, "<      0       >");
        assert_eq!(health, RuntimeHealth::Ok);
    }

    #[tokio::test]
    async fn test_mode_button_changes_heading() {
        let mut rt = runtime(&[next(), next(), InputSnapshot::default(), next()]);
        for _ in 0..4 {
            rt.iterate().await.unwrap();
        }
        // Held across two iterations counts once, then a fresh press
        assert_eq!(rt.state().mode(), 2);
        assert_eq!(rt.io().line2, "<     PI/2     >");
        assert_eq!(rt.io().motors, mix(std::f32::consts::FRAC_PI_2, 1.0, 0));
    }

    #[tokio::test]
    async fn test_kill_stops_motors_for_session() {
        let mut rt = runtime(&[next(), kill(), InputSnapshot::default(), next(), next()]);
        for _ in 0..5 {
            rt.iterate().await.unwrap();
        }

        let published = &rt.io().published;
        assert!(!published[0].0.is_stopped());
        for (motors, line2, health) in &published[1..] {
            assert!(motors.is_stopped());
            assert_eq!(line2, KILLED_LABEL);
            assert_eq!(*health, RuntimeHealth::Killed);
        }
    }

    #[tokio::test]
    async fn test_new_session_clears_kill() {
        let mut rt = runtime(&[kill()]);
        rt.iterate().await.unwrap();
        assert!(rt.state().is_killed());

        rt.begin_session();
        assert!(!rt.state().is_killed());
        let cycle = rt.iterate().await.unwrap();
        assert!(matches!(cycle.actuation, Actuation::Drive(_)));
    }

    #[tokio::test]
    async fn test_shutdown_stops_everything() {
        let mut rt = runtime(&[InputSnapshot::default()]);
        rt.iterate().await.unwrap();
        assert!(!rt.io().motors.is_stopped());

        rt.shutdown().await.unwrap();
        assert!(rt.io().motors.is_stopped());
        assert!(rt.io().published.last().unwrap().0.is_stopped());
    }

    #[tokio::test]
    async fn test_joystick_axes_do_not_steer() {
        let stick = InputSnapshot {
            axis_x: 0,
            axis_y: 127,
            ..Default::default()
        };
        let mut rt = runtime(&[stick]);
        rt.iterate().await.unwrap();
        assert_eq!(rt.io().motors, mix(0.0f32, 1.0, 0));
    }

    #[tokio::test]
    async fn test_lost_link_stops_motors() {
        // 250ms timeout at 20ms per tick: stale after 13 silent ticks
        let mut rt = runtime_with_dropout(next(), 30);
        for _ in 0..20 {
            rt.iterate().await.unwrap();
        }
        assert!(!rt.io().link_up());

        let published = &rt.io().published;
        println!("First frame: {:?}", published[0]);
        assert!(!published[0].0.is_stopped(), "driving before the dropout");

        let (motors, line2, health) = published.last().unwrap();
        println!("Last frame: {:?} {:?} {:?}", motors, line2, health);
        assert!(motors.is_stopped());
        assert_eq!(line2, NO_LINK_LABEL);
        assert_eq!(*health, RuntimeHealth::InputStale);
        assert_eq!(rt.health(), RuntimeHealth::InputStale);
    }

    #[tokio::test]
    async fn test_restored_link_starts_new_session() {
        // Killed and in mode 1, then the operator goes quiet past the timeout
        let mut rt = runtime(&[next(), kill()]);
        rt.iterate().await.unwrap();
        rt.iterate().await.unwrap();
        assert!(rt.state().is_killed());
        assert_eq!(rt.state().mode(), 1);

        let silent: Vec<_> = std::iter::repeat_n(None, 20).collect();
        rt.io.script.extend(silent);
        for _ in 0..20 {
            rt.iterate().await.unwrap();
        }
        assert!(!rt.io().link_up());
        assert_eq!(rt.health(), RuntimeHealth::InputStale);

        // Script exhausted: released inputs arrive again
        for _ in 0..3 {
            rt.iterate().await.unwrap();
        }
        assert!(rt.io().link_up());
        assert!(!rt.state().is_killed());
        assert_eq!(rt.state().mode(), 0);
        assert!(!rt.state().is_latched(InputId::DisplayCenter));

        let (motors, line2, health) = rt.io().published.last().unwrap();
        assert_eq!(*motors, mix(0.0f32, 1.0, 0));
        assert_eq!(line2, "<      0       >");
        assert_eq!(*health, RuntimeHealth::Ok);
        assert_eq!(rt.io().line1, DISPLAY_TITLE);
    }

    #[tokio::test]
    async fn test_fault_cycle_publishes_error_frame() {
        let mut rt = runtime(&[]);
        rt.iterate().await.unwrap();
        assert!(!rt.io().motors.is_stopped());

        rt.state = ControlState::with_mode(MODE_COUNT + 1);
        let cycle = rt.state.resolve();
        assert!(cycle.fault);
        rt.actuate(cycle).await.unwrap();

        let published = &rt.io().published;
        assert_eq!(published.len(), 3);

        let (motors, line2, health) = &published[1];
        println!("Fault frame: {:?} {:?} {:?}", motors, line2, health);
        assert!(motors.is_stopped());
        assert_eq!(line2, FAULT_LABEL);
        assert_eq!(*health, RuntimeHealth::Killed);

        let (motors, line2, health) = &published[2];
        assert!(motors.is_stopped());
        assert_eq!(line2, KILLED_LABEL);
        assert_eq!(*health, RuntimeHealth::Killed);

        assert_eq!(rt.state().mode(), 0);
        assert!(rt.state().is_killed());
    }
}
