//! Online/offline presence derived from last-seen staleness.
//!
//! There is no heartbeat in the protocol and no background sweep. Presence
//! is pull-computed: any handler that returns user data recomputes the flag
//! from `last_seen` and persists flips, so stored presence is self-healing
//! and never staler than the window on the paths that show it.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;

use crate::store::models::User;
use crate::store::{Result, users};

/// Staleness window: a user is online while liveness evidence is younger
/// than this many seconds.
pub const ONLINE_WINDOW_SECS: i64 = 30;

/// The presence predicate. `None` (never seen) is always offline.
#[must_use]
pub fn is_online(last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    last_seen.is_some_and(|seen| now - seen < Duration::seconds(ONLINE_WINDOW_SECS))
}

/// Recomputes presence for each user and persists any flips, updating the
/// records in place.
///
/// # Errors
///
/// Returns [`crate::store::StoreError`] if persisting a flip fails.
pub fn refresh(conn: &Connection, members: &mut [User], now: DateTime<Utc>) -> Result<()> {
    for user in members {
        let online = is_online(user.last_seen, now);
        if user.online != online {
            users::set_online_flag(conn, user.id, online)?;
            user.online = online;
        }
    }
    Ok(())
}
