// Zenoh transport for operator inputs and drive outputs
//
// Inputs arrive as `InputSnapshot` JSON; motor outputs, display lines and
// health are published as JSON once per loop iteration.
// The input watchdog releases every button if the operator side goes quiet,
// and reports the link down so the runtime holds the motors stopped.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use zenoh::handlers::FifoChannelHandler;
use zenoh::pubsub::{Publisher, Subscriber};
use zenoh::sample::Sample;

use crate::config::{TOPIC_DISPLAY, TOPIC_HEALTH, TOPIC_INPUT, TOPIC_MOTORS};
use crate::io::{
    Axis, Channel, DisplayLine, DriveIo, InputDevice, MotorId, sample_analog, sample_digital,
};
use crate::messages::{DisplayFrame, InputSnapshot, MotorOutputSet, RuntimeHealth};

/// Error types for the I/O bridge
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Zenoh error: {0}")]
    Zenoh(zenoh::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to load zenoh config {path}: {reason}")]
    Config { path: String, reason: String },
}

impl From<zenoh::Error> for BridgeError {
    fn from(err: zenoh::Error) -> Self {
        BridgeError::Zenoh(err)
    }
}

/// Keeps the latest operator sample and decides whether it is still fresh
#[derive(Debug, Clone)]
pub struct InputWatchdog {
    latest: InputSnapshot,
    received_at: Option<Instant>,
    timeout: Duration,
    stale: bool,
}

impl InputWatchdog {
    pub fn new(timeout: Duration) -> Self {
        Self {
            latest: InputSnapshot::default(),
            received_at: None,
            timeout,
            stale: true, // Start stale until first sample
        }
    }

    pub fn on_sample(&mut self, inputs: InputSnapshot, now: Instant) {
        self.latest = inputs;
        self.received_at = Some(now);
    }

    /// Re-evaluate freshness, logs the transitions
    pub fn refresh(&mut self, now: Instant) {
        let stale = match self.received_at {
            Some(at) => now.saturating_duration_since(at) > self.timeout,
            None => true,
        };
        if stale && !self.stale {
            warn!("Operator input stale (>{:?}), releasing all inputs", self.timeout);
        } else if !stale && self.stale {
            info!("Operator input live");
        }
        self.stale = stale;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Latest sample, or all released / centred when stale
    pub fn current(&self) -> InputSnapshot {
        if self.stale {
            InputSnapshot::default()
        } else {
            self.latest
        }
    }
}

/// `DriveIo` over zenoh pub/sub
pub struct ZenohBridge {
    // Dropping the session closes every declaration below
    _session: zenoh::Session,
    subscriber: Subscriber<FifoChannelHandler<Sample>>,
    pub_motors: Publisher<'static>,
    pub_display: Publisher<'static>,
    pub_health: Publisher<'static>,
    watchdog: InputWatchdog,
    inputs: InputSnapshot,
    motors: MotorOutputSet,
    display: DisplayFrame,
}

impl ZenohBridge {
    pub async fn open(config: zenoh::Config, input_timeout: Duration) -> Result<Self, BridgeError> {
        info!("Opening Zenoh session...");
        let session = zenoh::open(config).await?;

        info!("Setting up publishers and subscribers...");
        let subscriber = session.declare_subscriber(TOPIC_INPUT).await?;
        let pub_motors = session.declare_publisher(TOPIC_MOTORS).await?;
        let pub_display = session.declare_publisher(TOPIC_DISPLAY).await?;
        let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

        info!("Subscribed to: {}", TOPIC_INPUT);
        info!("Publishing to: {}, {}, {}", TOPIC_MOTORS, TOPIC_DISPLAY, TOPIC_HEALTH);

        Ok(Self {
            _session: session,
            subscriber,
            pub_motors,
            pub_display,
            pub_health,
            watchdog: InputWatchdog::new(input_timeout),
            inputs: InputSnapshot::default(),
            motors: MotorOutputSet::stopped(),
            display: DisplayFrame::default(),
        })
    }

    /// Drain all pending samples (non-blocking), keep latest
    fn drain_inputs(&mut self) {
        while let Ok(Some(sample)) = self.subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<InputSnapshot>(&payload) {
                Ok(inputs) => self.watchdog.on_sample(inputs, Instant::now()),
                Err(e) => warn!("Failed to parse operator input: {}", e),
            }
        }
        self.watchdog.refresh(Instant::now());
        self.inputs = self.watchdog.current();
    }
}

impl DriveIo for ZenohBridge {
    type Error = BridgeError;

    fn read_digital(&mut self, device: InputDevice, channel: Channel) -> bool {
        sample_digital(&self.inputs, device, channel)
    }

    fn read_analog(&mut self, device: InputDevice, axis: Axis) -> i16 {
        sample_analog(&self.inputs, device, axis)
    }

    fn set_motor(&mut self, motor: MotorId, value: i16) {
        *motor.slot(&mut self.motors) = value;
    }

    fn set_display_text(&mut self, line: DisplayLine, text: &str) {
        let slot = match line {
            DisplayLine::First => &mut self.display.line1,
            DisplayLine::Second => &mut self.display.line2,
        };
        if *slot != text {
            *slot = text.to_string();
        }
    }

    fn link_up(&self) -> bool {
        !self.watchdog.is_stale()
    }

    async fn exchange(&mut self, health: RuntimeHealth) -> Result<(), BridgeError> {
        debug!(motors = ?self.motors, ?health, "Publishing outputs");
        self.pub_motors
            .put(serde_json::to_string(&self.motors)?)
            .await?;
        self.pub_display
            .put(serde_json::to_string(&self.display)?)
            .await?;
        self.pub_health.put(serde_json::to_string(&health)?).await?;

        self.drain_inputs();
        Ok(())
    }
}

/// Load a zenoh config file, or the default config when no path is given
pub fn load_zenoh_config(path: Option<&str>) -> Result<zenoh::Config, BridgeError> {
    match path {
        Some(path) => {
            info!("Loading zenoh config from {}", path);
            zenoh::Config::from_file(path).map_err(|e| BridgeError::Config {
                path: path.to_string(),
                reason: e.to_string(),
            })
        }
        None => Ok(zenoh::Config::default()),
    }
}
