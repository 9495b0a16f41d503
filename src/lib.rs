//! Skyfight - multiplayer jet combat arena
//!
//! The server side (`game`, `ws`, `http`) holds the authoritative player,
//! coin and building state and relays events between connections. The
//! `flight` module is the client half: per-frame dead reckoning for the
//! local jet, smoothing of remote jets, and the local collision checks that
//! produce crash, hit and coin reports.

pub mod app;
pub mod config;
pub mod flight;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;
