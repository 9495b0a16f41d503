//! Headless pilot - flies a jet in a running Skyfight arena
//!
//! Connects over WebSocket, joins under a name and runs the same per-frame
//! loop a browser tab would: dead-reckons its own jet, smooths the others,
//! and reports crashes, hits and coin pickups. Useful for load and soak
//! testing the server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use futures::{Sink, SinkExt, StreamExt};
use glam::Vec3;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skyfight::flight::{Cockpit, ControlInput, FlightModel, JetStatus};
use skyfight::util::time::{frame_duration, unix_millis};
use skyfight::ws::protocol::{ClientMsg, ServerMsg};

#[derive(Parser, Debug)]
#[command(name = "pilot")]
#[command(about = "Headless Skyfight pilot")]
struct Args {
    /// Server WebSocket URL
    #[arg(short, long, default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    /// Display name sent with the join request
    #[arg(short, long, default_value = "Drone")]
    name: String,

    /// Flight time in seconds
    #[arg(short, long, default_value = "60")]
    duration: u64,

    /// Cannon bursts per second
    #[arg(long, default_value = "2.0")]
    fire_rate: f64,

    /// Seed for the autopilot's manoeuvres
    #[arg(long)]
    seed: Option<u64>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, thiserror::Error)]
enum PilotError {
    #[error("WebSocket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Server closed the connection")]
    Closed,
}

/// Preferred altitude band
const CRUISE_FLOOR: f32 = 150.0;
const CRUISE_CEILING: f32 = 400.0;
/// Turn back toward the centre beyond this horizontal radius
const TURN_BACK_RADIUS: f32 = 700.0;
const CRUISE_SPEED: f32 = 2.0;
const MISSILE_CHANCE: f64 = 0.004;
const FLARE_CHANCE: f64 = 0.003;

/// Stick-and-throttle logic for an unattended jet
struct Autopilot {
    rng: ChaCha8Rng,
    fire_chance: f64,
    /// Frames left on the current random yaw
    wander: u32,
    wander_left: bool,
}

impl Autopilot {
    fn new(seed: u64, fire_rate: f64) -> Self {
        let frames_per_sec = 1.0 / frame_duration().as_secs_f64();
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            fire_chance: (fire_rate / frames_per_sec).clamp(0.0, 1.0),
            wander: 0,
            wander_left: false,
        }
    }

    fn control(&mut self, jet: &FlightModel) -> ControlInput {
        let mut input = ControlInput::default();
        let forward = jet.forward();
        let altitude = jet.position.y;

        // Altitude hold: climb out of the floor and dives, descend from the ceiling
        if altitude < CRUISE_FLOOR || forward.y < -0.25 {
            input.nose_up = true;
        } else if altitude > CRUISE_CEILING && forward.y > -0.25 {
            input.nose_down = true;
        }

        input.throttle_up = jet.speed < CRUISE_SPEED;
        input.throttle_down = jet.speed > CRUISE_SPEED + 0.5;

        let horizontal = Vec3::new(jet.position.x, 0.0, jet.position.z);
        if horizontal.length() > TURN_BACK_RADIUS {
            let home = -horizontal;
            let cross = forward.x * home.z - forward.z * home.x;
            input.yaw_left = cross < 0.0;
            input.yaw_right = cross >= 0.0;
        } else {
            if self.wander == 0 && self.rng.gen_bool(0.01) {
                self.wander = self.rng.gen_range(20..90);
                self.wander_left = self.rng.gen_bool(0.5);
            }
            if self.wander > 0 {
                self.wander -= 1;
                input.yaw_left = self.wander_left;
                input.yaw_right = !self.wander_left;
            }
        }

        input.fire_gun = self.rng.gen_bool(self.fire_chance);
        input.fire_missile = self.rng.gen_bool(MISSILE_CHANCE);
        input.deploy_flare = self.rng.gen_bool(FLARE_CHANCE);
        input
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let seed = args.seed.unwrap_or_else(rand::random);
    info!(url = %args.url, name = %args.name, seed, "Pilot starting");

    fly(&args, seed).await?;

    info!("Pilot landed");
    Ok(())
}

async fn fly(args: &Args, seed: u64) -> Result<(), PilotError> {
    let (ws_stream, _) = connect_async(args.url.as_str()).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    info!("Connected to {}", args.url);

    send(
        &mut ws_sender,
        &ClientMsg::Join {
            name: Some(args.name.clone()),
        },
    )
    .await?;

    let cockpit = Arc::new(Mutex::new(Cockpit::new()));

    // Reader task: server messages -> cockpit
    let reader_cockpit = cockpit.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(frame) = ws_receiver.next().await {
            match frame {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerMsg>(&text) {
                    Ok(msg) => {
                        log_event(&msg);
                        reader_cockpit.lock().apply(msg, Instant::now());
                    }
                    Err(e) => warn!(error = %e, "Unparseable server message"),
                },
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "Close frame received");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "WebSocket read error");
                    break;
                }
            }
        }
    });

    let mut autopilot = Autopilot::new(seed, args.fire_rate);
    let mut frame_timer = interval(frame_duration());
    frame_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ping_timer = interval(Duration::from_secs(1));
    let deadline = sleep(Duration::from_secs(args.duration));
    tokio::pin!(deadline);

    let mut frames: u64 = 0;
    let result = loop {
        tokio::select! {
            _ = frame_timer.tick() => {
                let outbound = {
                    let mut cockpit = cockpit.lock();
                    let input = match (cockpit.status(), cockpit.jet()) {
                        (JetStatus::Flying, Some(jet)) => autopilot.control(jet),
                        _ => ControlInput::default(),
                    };
                    cockpit.tick(&input, Instant::now())
                };
                frames += 1;

                let mut sent = Ok(());
                for msg in &outbound {
                    if matches!(msg, ClientMsg::Crash) {
                        info!("Crashed, waiting for respawn");
                    }
                    sent = send(&mut ws_sender, msg).await;
                    if sent.is_err() {
                        break;
                    }
                }
                if let Err(e) = sent {
                    break Err(e);
                }
            }
            _ = ping_timer.tick() => {
                if let Err(e) = send(&mut ws_sender, &ClientMsg::Ping { t: unix_millis() }).await {
                    break Err(e);
                }
                let cockpit = cockpit.lock();
                debug!(
                    frames,
                    health = cockpit.health(),
                    coins = cockpit.coins().len(),
                    remotes = cockpit.remotes().len(),
                    rtt_ms = ?cockpit.last_rtt_ms(),
                    "Status"
                );
            }
            _ = &mut reader => {
                break Err(PilotError::Closed);
            }
            _ = &mut deadline => {
                break Ok(());
            }
        }
    };

    // Best effort close; the server cleans up either way
    let _ = ws_sender.send(Message::Close(None)).await;
    reader.abort();

    let cockpit = cockpit.lock();
    for (rank, entry) in cockpit.leaderboard().iter().enumerate() {
        info!("#{} {} - {}", rank + 1, entry.name, entry.score);
    }

    result
}

async fn send<S>(sink: &mut S, msg: &ClientMsg) -> Result<(), PilotError>
where
    S: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}

fn log_event(msg: &ServerMsg) {
    match msg {
        ServerMsg::Welcome { id, .. } => info!(%id, "Welcomed"),
        ServerMsg::YouDied => info!("Shot down"),
        ServerMsg::GameOver { winner } => info!(%winner, "Round over"),
        ServerMsg::GameReset { players } => info!(players = players.len(), "Round reset"),
        _ => {}
    }
}

fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulls_out_of_a_low_dive() {
        let mut autopilot = Autopilot::new(1, 0.0);
        let mut jet = FlightModel::spawn(Vec3::new(0.0, 100.0, 0.0));
        let input = autopilot.control(&jet);
        assert!(input.nose_up);
        assert!(!input.nose_down);

        jet.position.y = 500.0;
        let input = autopilot.control(&jet);
        assert!(input.nose_down);
    }

    #[test]
    fn turns_back_toward_the_centre() {
        let mut autopilot = Autopilot::new(1, 0.0);
        // Heading -Z at x = +800: home is to the left
        let jet = FlightModel::spawn(Vec3::new(800.0, 200.0, 0.0));
        let input = autopilot.control(&jet);
        assert!(input.yaw_left);
        assert!(!input.yaw_right);
    }

    #[test]
    fn zero_fire_rate_never_shoots() {
        let mut autopilot = Autopilot::new(7, 0.0);
        let jet = FlightModel::spawn(Vec3::new(0.0, 200.0, 0.0));
        for _ in 0..600 {
            assert!(!autopilot.control(&jet).fire_gun);
        }
    }
}
