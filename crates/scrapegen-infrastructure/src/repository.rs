//! Helpers shared by the session repositories.

use chrono::DateTime;
use scrapegen_core::session::Session;
use std::cmp::Ordering;

/// Sorts most recently updated first. Unparsable timestamps sort last.
pub(crate) fn sort_newest_first(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| {
        let a_ts = DateTime::parse_from_rfc3339(&a.updated_at).ok();
        let b_ts = DateTime::parse_from_rfc3339(&b.updated_at).ok();
        match (a_ts, b_ts) {
            (Some(a_ts), Some(b_ts)) => b_ts.cmp(&a_ts),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => b.updated_at.cmp(&a.updated_at),
        }
    });
}
