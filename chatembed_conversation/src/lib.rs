#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Conversation state machine for the embeddable chat client.
//!
//! This crate ties the session, the exchange and the transcript store into
//! user turns the UI can drive.
//!
//! # Key Features
//! - `idle -> awaiting_response -> idle` per turn, with re-entry refused
//! - Every turn ends with exactly one bot message, degraded or not
//! - Stored history merged in front of the transcript on initialization
//! - Snapshots published to subscribers on every change

mod controller;
mod state;

pub use controller::{ConversationController, ConversationError, DEFAULT_SAVE_TIMEOUT};
pub use state::{ConversationSnapshot, DebugSnapshot, TurnState};
