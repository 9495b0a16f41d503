//! HTTP surface: health, static client files, WebSocket upgrade

pub mod routes;

pub use routes::build_router;
