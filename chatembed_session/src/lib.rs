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

//! Session identity and the optional history backend.
//!
//! Both talk to `{base_url}/sessions...` and both treat the backend as an
//! optional enhancement: when it is unconfigured or unreachable, sessions
//! are purely local and the transcript lives only in memory.

mod http;
mod manager;
mod transcript;

pub use http::build_client;
pub use manager::SessionManager;
pub use transcript::HttpTranscriptStore;
