//! Bot credential discovery from the process environment.
//!
//! Every `<NAME>_TOKEN` / `<NAME>_SECRET` pair becomes one bot identity
//! named `lowercase(NAME)`. With no pairs present, a single legacy
//! `SLACK_BOT_TOKEN` / `SLACK_SIGNING_SECRET` pair registers under the
//! default name, and with nothing at all a placeholder identity keeps the
//! pipeline exercisable offline.

pub mod discover;

pub use discover::{DEFAULT_BOT_NAME, DiscoveredBot, discover_bots, discover_from_env};
