//! Shared message and role types used across all bina crates.

pub mod types;
