use chrono::{DateTime, Utc};
use serde::Serialize;

/// Identity decoded from a backend-issued access token.
///
/// Never constructed from parts by the client; the only way to obtain one is
/// decoding a token (see [`crate::token::decode_session`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    /// Token subject. The backend issues numeric or string subjects
    /// depending on the auth path; both are normalized to a string.
    pub subject_id: String,
    pub display_name: String,
    pub email: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Expiry is judged against wall-clock time at decision time, not at
    /// decode time.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
