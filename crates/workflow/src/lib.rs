//! Inbound event processing pipeline — one workflow invocation per event.
//!
//! Flow: validate → acknowledge → fetch context → call reasoning →
//! normalize output → finalize → deliver, with a terminal error-report
//! node reachable from every step. Nodes share a single mutable state
//! record owned by the invocation and communicate through partial updates;
//! control flow branches on state flags, never on unwound errors.

pub mod context;
pub mod engine;
pub mod error;
pub mod node;
pub mod nodes;
pub mod state;
pub mod variants;

pub use {
    engine::{Step, Workflow, next_step},
    error::NodeError,
    node::{BotServices, Node},
    state::{StateUpdate, WorkflowState},
    variants::{WorkflowFactory, factory_for},
};
