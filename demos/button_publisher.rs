// Keyboard operator panel: ←/A previous heading, →/D next heading, Space/K kill, Q quit
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::{Duration, Instant};
use tracing::info;

use xdrive_teleop::config::TOPIC_INPUT;
use xdrive_teleop::messages::{InputSnapshot, JoystickButtons};

const HOLD_MS: u64 = 100; // Key counts as held this long after its last press/repeat

#[derive(Default)]
struct HeldKeys {
    left: Option<Instant>,
    kill: Option<Instant>,
    right: Option<Instant>,
}

impl HeldKeys {
    fn snapshot(&self) -> InputSnapshot {
        let hold = Duration::from_millis(HOLD_MS);
        let held = |at: Option<Instant>| at.is_some_and(|t| t.elapsed() < hold);
        InputSnapshot {
            joystick: JoystickButtons {
                left: held(self.left),
                up: held(self.kill),
                right: held(self.right),
            },
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_INPUT).await?;

    info!("Controls: ←/A=previous heading, →/D=next heading, Space/K=kill, Q=quit");

    enable_raw_mode()?;
    let result = run_panel(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_panel(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut keys = HeldKeys::default();

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    KeyCode::Left | KeyCode::Char('a') if pressed => {
                        keys.left = Some(Instant::now());
                    }
                    KeyCode::Right | KeyCode::Char('d') if pressed => {
                        keys.right = Some(Instant::now());
                    }
                    KeyCode::Char(' ') | KeyCode::Char('k') if pressed => {
                        info!("Kill requested");
                        keys.kill = Some(Instant::now());
                    }
                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,
                    _ => {}
                }
            }
        }

        // Always publish at ~50Hz so the runtime watchdog stays fed
        let sample = serde_json::to_string(&keys.snapshot())?;
        publisher.put(sample).await?;
    }

    Ok(())
}
