//! Identifier generation.
//!
//! Session ids keep the `session-<unix-millis>-<9 base36 chars>` shape that
//! downstream workflow backends parse. Message ids are time-ordered UUIDs so
//! messages created within the same millisecond never collide.

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::MessageId;

const SESSION_PREFIX: &str = "session-";
const SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a new local session id.
#[must_use]
pub fn session_id() -> String {
    session_id_at(Utc::now().timestamp_millis(), &mut rand::thread_rng())
}

/// Generate a session id for a given timestamp and random source.
pub fn session_id_at<R: Rng>(unix_millis: i64, rng: &mut R) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect();
    format!("{SESSION_PREFIX}{unix_millis}-{suffix}")
}

/// Whether `value` has the shape produced by [`session_id`].
#[must_use]
pub fn is_session_id(value: &str) -> bool {
    let Some(rest) = value.strip_prefix(SESSION_PREFIX) else {
        return false;
    };
    let Some((millis, suffix)) = rest.split_once('-') else {
        return false;
    };
    !millis.is_empty()
        && millis.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == SUFFIX_LEN
        && suffix.bytes().all(|b| BASE36.contains(&b))
}

/// Generate a message id such as `user_<uuid-v7>`.
#[must_use]
pub fn message_id(prefix: &str) -> MessageId {
    MessageId::new(format!("{prefix}_{}", Uuid::now_v7()))
}
