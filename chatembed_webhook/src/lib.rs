#![deny(
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

//! Message exchange with the remote workflow webhook.
//!
//! The webhook speaks the embedded-mode chat contract: a POST of
//! `{chatInput, sessionId}` answered by a loosely shaped JSON object.
//! [`WebhookClient`] turns every outcome, including failures, into a bot
//! [`chatembed_core::Message`].

mod client;
mod error;
mod reply;

pub use client::{CONNECTION_FALLBACK_TEXT, WORKFLOW_ERROR_MESSAGE, WebhookClient};
pub use error::ExchangeError;
pub use reply::{NO_REPLY_TEXT, ReplyShape};
