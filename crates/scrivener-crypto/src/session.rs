use crate::signature::{SESSION_WINDOW_SECS, SignatureScheme, sha256_hex};

/// Width of one session bucket. Client and server both derive session tokens
/// from the start of an hour bucket so their time values line up.
pub const SESSION_BUCKET_SECS: i64 = 3600;

/// Number of buckets the server tries, counting the current one.
pub const SESSION_BUCKETS: i64 = 25;

/// `"session_" + SHA256(technical_token + ":" + time_value)`
pub fn derive_session_token(technical_token: &str, time_value: i64) -> String {
    format!("session_{}", sha256_hex(&format!("{}:{}", technical_token, time_value)))
}

/// Start of the bucket containing `now`.
pub fn bucket_start(now: i64) -> i64 {
    now - now.rem_euclid(SESSION_BUCKET_SECS)
}

/// Bucket starts the server will try for a session signature, newest first.
///
/// Within one replay window of the next hour, that bucket is tried too: a
/// client whose clock runs ahead may already have derived its token from it.
pub fn candidate_buckets(now: i64) -> impl Iterator<Item = i64> {
    let current = bucket_start(now);
    let ahead = bucket_start(now + SESSION_WINDOW_SECS as i64);
    let lead = (ahead > current).then_some(ahead);
    lead.into_iter()
        .chain((0..SESSION_BUCKETS).map(move |offset| current - offset * SESSION_BUCKET_SECS))
}

/// Client-side state established at registration or authentication.
///
/// Passed explicitly to every signed call; nothing is held globally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub login: String,
    pub technical_token: String,
    pub session_token: String,
    pub scheme: SignatureScheme,
}

impl SessionContext {
    /// Derive the session token once, for the bucket containing `now`.
    pub fn establish(
        login: impl Into<String>,
        technical_token: impl Into<String>,
        scheme: SignatureScheme,
        now: i64,
    ) -> Self {
        let technical_token = technical_token.into();
        let session_token = derive_session_token(&technical_token, bucket_start(now));
        Self {
            login: login.into(),
            technical_token,
            session_token,
            scheme,
        }
    }

    /// Signature header value for a request carrying `canonical_payload`.
    pub fn sign(&self, canonical_payload: &str, now: i64) -> String {
        self.scheme
            .sign(&self.technical_token, &self.session_token, canonical_payload, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let a = derive_session_token("12345", 1_700_000_000);
        let b = derive_session_token("12345", 1_700_000_000);
        assert_eq!(a, b);
        assert!(a.starts_with("session_"));
        assert_eq!(a.len(), "session_".len() + 64);
    }

    #[test]
    fn derivation_depends_on_token_and_time() {
        let base = derive_session_token("12345", 1_700_000_000);
        assert_ne!(base, derive_session_token("12346", 1_700_000_000));
        assert_ne!(base, derive_session_token("12345", 1_700_000_001));
    }

    #[test]
    fn derivation_hashes_token_colon_time() {
        assert_eq!(
            derive_session_token("abc", 42),
            format!("session_{}", sha256_hex("abc:42"))
        );
    }

    #[test]
    fn buckets_align_to_the_hour() {
        assert_eq!(bucket_start(7200), 7200);
        assert_eq!(bucket_start(7201), 7200);
        assert_eq!(bucket_start(10_799), 7200);
        assert_eq!(bucket_start(-1), -3600);
    }

    #[test]
    fn candidates_cover_current_and_previous_day() {
        let now = 1_700_003_123;
        let buckets: Vec<i64> = candidate_buckets(now).collect();
        assert_eq!(buckets.len(), 25);
        assert_eq!(buckets[0], bucket_start(now));
        assert_eq!(buckets[24], bucket_start(now) - 24 * 3600);
    }

    #[test]
    fn next_bucket_is_tried_near_the_hour() {
        let hour = 1_700_002_800;
        assert_eq!(bucket_start(hour), hour);

        let near: Vec<i64> = candidate_buckets(hour + 3600 - 300).collect();
        assert_eq!(near.len(), 26);
        assert_eq!(near[0], hour + 3600);
        assert_eq!(near[1], hour);

        let far: Vec<i64> = candidate_buckets(hour + 3600 - 301).collect();
        assert_eq!(far.len(), 25);
        assert_eq!(far[0], hour);
    }

    #[test]
    fn establish_derives_from_bucket_start() {
        let ctx = SessionContext::establish("alice", "999", SignatureScheme::Session, 3600 * 10 + 59);
        assert_eq!(ctx.session_token, derive_session_token("999", 3600 * 10));
        assert_eq!(ctx.login, "alice");
    }
}
