//! HTTP surface for the bot platform.
//!
//! One shared webhook, optional per-bot endpoints, a health listing, and
//! the platform handshake short-circuit. Handlers acknowledge immediately
//! and hand events to background workflow tasks. Nothing upstream ever
//! waits on processing, and no failure escapes to the transport.

pub mod dispatch;
pub mod server;
pub mod state;

pub use {server::build_app, state::AppState};
