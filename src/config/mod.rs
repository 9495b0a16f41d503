//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Directory served at `/` for the browser client
    pub static_dir: PathBuf,
    /// Max inbound WebSocket messages per second per connection
    pub input_rate_limit: u32,
    /// Arena rules
    pub arena: ArenaConfig,
}

/// Gameplay rules for the arena task
#[derive(Clone, Debug)]
pub struct ArenaConfig {
    /// Seed for world generation; random when unset
    pub seed: u64,
    pub building_count: usize,
    pub coin_count: usize,
    /// Score added per collected coin
    pub coin_value: u32,
    /// Score that ends the round
    pub win_score: u32,
    pub respawn_delay: Duration,
    pub reset_delay: Duration,
    pub relay: RelayOptions,
    /// Swap the trust-the-client policy for sanity checks
    pub validate_input: bool,
}

/// Whether combat broadcasts are echoed back to the connection that fired them
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelayOptions {
    pub echo_shots_to_sender: bool,
    pub echo_missiles_to_sender: bool,
    pub echo_flares_to_sender: bool,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            echo_shots_to_sender: false,
            echo_missiles_to_sender: true,
            echo_flares_to_sender: true,
        }
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            seed: rand::random(),
            building_count: 50,
            coin_count: 20,
            coin_value: 100,
            win_score: 1000,
            respawn_delay: Duration::from_secs(5),
            reset_delay: Duration::from_secs(5),
            relay: RelayOptions::default(),
            validate_input: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        };

        let defaults = ArenaConfig::default();
        let relay = RelayOptions::default();

        let arena = ArenaConfig {
            seed: parse_or("WORLD_SEED", defaults.seed)?,
            building_count: parse_or("BUILDING_COUNT", defaults.building_count)?,
            coin_count: parse_or("COIN_COUNT", defaults.coin_count)?,
            coin_value: parse_or("COIN_VALUE", defaults.coin_value)?,
            win_score: parse_or("WIN_SCORE", defaults.win_score)?,
            respawn_delay: Duration::from_secs(parse_or("RESPAWN_DELAY_SECS", 5u64)?),
            reset_delay: Duration::from_secs(parse_or("RESET_DELAY_SECS", 5u64)?),
            relay: RelayOptions {
                echo_shots_to_sender: parse_or(
                    "ECHO_SHOTS_TO_SENDER",
                    relay.echo_shots_to_sender,
                )?,
                echo_missiles_to_sender: parse_or(
                    "ECHO_MISSILES_TO_SENDER",
                    relay.echo_missiles_to_sender,
                )?,
                echo_flares_to_sender: parse_or(
                    "ECHO_FLARES_TO_SENDER",
                    relay.echo_flares_to_sender,
                )?,
            },
            validate_input: parse_or("VALIDATE_INPUT", false)?,
        };

        if arena.win_score == 0 {
            return Err(ConfigError::Invalid("WIN_SCORE"));
        }

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public")),

            input_rate_limit: parse_or("INPUT_RATE_LIMIT", 120)?,

            arena,
        })
    }
}

/// Read an optional variable, failing only when it is present but malformed
fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
