//! Session identity for one widget instance.

use chrono::{DateTime, Utc};
use log::{debug, info};
use parking_lot::RwLock;
use parlor_rs_protocol::{SessionId, WidgetUid};
use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of the random suffix in session tokens.
const SESSION_SUFFIX_LEN: usize = 9;
/// Length of client-generated uid tokens.
const UID_LEN: usize = 15;

/// Random alphanumeric token fragment.
fn token_fragment(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generate a fresh session token, unique-enough within one process.
///
/// Collisions are statistically negligible and are not detected or retried.
pub fn generate_session_id() -> SessionId {
    SessionId::new(format!(
        "session_{}_{}",
        Utc::now().timestamp_millis(),
        token_fragment(SESSION_SUFFIX_LEN)
    ))
}

/// Generate a fresh anonymous uid token in its own namespace.
pub fn generate_uid() -> WidgetUid {
    WidgetUid::new(token_fragment(UID_LEN))
}

/// Identity held for the lifetime of one widget instance.
///
/// The session id never changes after construction. The uid is
/// client-generated and may be replaced by a server-assigned value carried
/// in a send acknowledgement; it is never regenerated locally.
pub struct Session {
    session_id: SessionId,
    uid: RwLock<WidgetUid>,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Allocate a fresh session with generated tokens.
    pub fn new() -> Self {
        let session_id = generate_session_id();
        let uid = generate_uid();
        info!("created widget session (session_id={}, uid={})", session_id, uid);
        Self {
            session_id,
            uid: RwLock::new(uid),
            created_at: Utc::now(),
        }
    }

    /// The immutable session token.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// The current uid token.
    pub fn uid(&self) -> WidgetUid {
        self.uid.read().clone()
    }

    /// Session creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Record a server-assigned uid, which takes precedence over the
    /// client-generated one.
    pub(crate) fn adopt_uid(&self, uid: WidgetUid) {
        let mut current = self.uid.write();
        if *current == uid {
            return;
        }
        debug!(
            "adopting server uid (session_id={}, uid={})",
            self.session_id, uid
        );
        *current = uid;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{Session, generate_session_id, generate_uid};
    use parlor_rs_protocol::WidgetUid;
    use pretty_assertions::assert_eq;

    #[test]
    fn session_tokens_follow_the_expected_shape() {
        let session_id = generate_session_id();
        let parts: Vec<&str> = session_id.as_str().splitn(3, '_').collect();
        assert_eq!(parts[0], "session");
        assert!(parts[1].chars().all(|ch| ch.is_ascii_digit()));
        assert_eq!(parts[2].len(), 9);

        let uid = generate_uid();
        assert_eq!(uid.as_str().len(), 15);
        assert!(uid.as_str().chars().all(|ch| ch.is_ascii_alphanumeric()));
    }

    #[test]
    fn generated_tokens_differ_across_calls() {
        assert_ne!(generate_session_id(), generate_session_id());
        assert_ne!(generate_uid(), generate_uid());
    }

    #[test]
    fn adopt_uid_replaces_the_client_token() {
        let session = Session::new();
        let original = session.uid();
        session.adopt_uid(WidgetUid::new("server-uid"));
        assert_eq!(session.uid(), WidgetUid::new("server-uid"));
        assert_ne!(session.uid(), original);
    }
}
