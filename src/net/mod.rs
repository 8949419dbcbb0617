// src/net/mod.rs
//! Transport: rotating identities, retries with backoff, soft-failure detection.
//!
//! A fetch never returns an `Err`. The outcome is a `FetchAttempt` the caller turns
//! into a normal or an error record.
mod client;
mod identity;
mod pace;

pub use client::{HttpGet, ReqwestClient, Response, TransportError};
pub use identity::{IdentityProfile, ProfilePool};
pub use pace::{DelayPolicy, Pacer, Pause, RetryPolicy, ThreadPause};

use std::time::Duration;

use rand::rngs::StdRng;

/// Outcome of one attempt, or of the whole fetch for the last two.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchStatus {
    Success,
    /// 2xx, but the body is the generic placeholder page (or too small).
    SoftFailure,
    NetworkError,
    ExhaustedRetries,
}

impl FetchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FetchStatus::Success => "success",
            FetchStatus::SoftFailure => "soft_failure",
            FetchStatus::NetworkError => "network_error",
            FetchStatus::ExhaustedRetries => "exhausted_retries",
        }
    }
}

/// One failed attempt, kept for the audit trail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptFailure {
    pub attempt: u32,
    pub profile: String,
    pub status: FetchStatus,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchAttempt {
    pub url: String,
    /// `Success` or `ExhaustedRetries`.
    pub status: FetchStatus,
    /// Present only on success.
    pub body: Option<String>,
    /// Profile of the last attempt made.
    pub profile: String,
    /// Attempts made, 1-based.
    pub attempts: u32,
    pub failures: Vec<AttemptFailure>,
}

impl FetchAttempt {
    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }

    /// Human-readable reason of the last failed attempt.
    pub fn last_error(&self) -> Option<&str> {
        self.failures.last().map(|f| f.detail.as_str())
    }
}

/// What a "real" page must not look like.
#[derive(Clone, Debug, PartialEq)]
pub struct SoftFailureRules {
    /// Any of these in the body marks it as a placeholder.
    pub signatures: Vec<String>,
    /// Bodies shorter than this (bytes) are placeholders too. 0 disables.
    pub min_body_bytes: usize,
}

impl SoftFailureRules {
    /// Reason the body is a placeholder, if it is one.
    pub fn check(&self, body: &str) -> Option<String> {
        if let Some(sig) = self.signatures.iter().find(|s| !s.is_empty() && body.contains(s.as_str())) {
            return Some(format!("placeholder page ({sig:?})"));
        }
        if body.len() < self.min_body_bytes {
            return Some(format!("body too small ({} < {} bytes)", body.len(), self.min_body_bytes));
        }
        None
    }
}

/// Stateful fetcher: owns the client, the profile rotation cursor and the
/// backoff timing. One per run.
pub struct Transport<C: HttpGet, P: Pause> {
    client: C,
    pool: ProfilePool,
    retry: RetryPolicy,
    soft: SoftFailureRules,
    timeout: Duration,
    pause: P,
    rng: StdRng,
    cursor: usize,
}

impl<C: HttpGet, P: Pause> Transport<C, P> {
    pub fn new(
        client: C,
        pool: ProfilePool,
        retry: RetryPolicy,
        soft: SoftFailureRules,
        timeout: Duration,
        pause: P,
        rng: StdRng,
    ) -> Self {
        Self { client, pool, retry, soft, timeout, pause, rng, cursor: 0 }
    }

    /// Fetch with the configured attempt cap.
    pub fn fetch(&mut self, url: &str) -> FetchAttempt {
        let max = self.retry.max_attempts;
        self.fetch_with(url, max)
    }

    /// Fetch `url` with up to `max_attempts` tries. The session profile is taken at
    /// the current cursor; every retry moves the cursor on, and the cursor moves
    /// once more at the end so the next fetch starts on a fresh session.
    pub fn fetch_with(&mut self, url: &str, max_attempts: u32) -> FetchAttempt {
        let max_attempts = max_attempts.max(1);
        let mut failures = Vec::new();
        let mut profile_name = s!();

        for k in 1..=max_attempts {
            if k > 1 {
                self.cursor = self.cursor.wrapping_add(1);
                let wait = self.retry.backoff(k, &mut self.rng);
                logd!(url, attempt = k, secs = wait.as_secs_f64(), "backing off");
                self.pause.pause(wait);
            }

            let profile = if k == max_attempts && k > 1 && self.retry.minimal_fallback {
                self.pool.minimal()
            } else {
                self.pool.session(self.cursor)
            };
            profile_name.clone_from(&profile.name);

            let (status, detail) = match self.client.get(url, profile, self.timeout) {
                Ok(resp) if !resp.is_success() => (FetchStatus::NetworkError, format!("http status {}", resp.status)),
                Ok(resp) => match self.soft.check(&resp.body) {
                    Some(reason) => (FetchStatus::SoftFailure, reason),
                    None => {
                        logd!(url, attempt = k, profile = %profile.name, bytes = resp.body.len(), "fetched");
                        self.cursor = self.cursor.wrapping_add(1);
                        return FetchAttempt {
                            url: s!(url),
                            status: FetchStatus::Success,
                            body: Some(resp.body),
                            profile: profile_name,
                            attempts: k,
                            failures,
                        };
                    }
                },
                Err(e) => (FetchStatus::NetworkError, e.to_string()),
            };

            logf!(url, attempt = k, of = max_attempts, profile = %profile.name, status = status.as_str(), %detail, "attempt failed");
            failures.push(AttemptFailure { attempt: k, profile: profile_name.clone(), status, detail });
        }

        self.cursor = self.cursor.wrapping_add(1);
        FetchAttempt {
            url: s!(url),
            status: FetchStatus::ExhaustedRetries,
            body: None,
            profile: profile_name,
            attempts: max_attempts,
            failures,
        }
    }

    pub fn pool(&self) -> &ProfilePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Replays canned results and remembers which profile each call used.
    struct Scripted {
        replies: RefCell<Vec<Result<Response, TransportError>>>,
        seen: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(mut replies: Vec<Result<Response, TransportError>>) -> Self {
            replies.reverse();
            Self { replies: RefCell::new(replies), seen: RefCell::new(Vec::new()) }
        }
    }

    impl HttpGet for Scripted {
        fn get(&self, _url: &str, profile: &IdentityProfile, _t: Duration) -> Result<Response, TransportError> {
            self.seen.borrow_mut().push(profile.name.clone());
            self.replies.borrow_mut().pop().unwrap_or(Err(TransportError::Timeout))
        }
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<Duration>>>);

    impl Pause for Recorder {
        fn pause(&mut self, d: Duration) {
            self.0.borrow_mut().push(d);
        }
    }

    fn pool() -> ProfilePool {
        let sessions = ["a", "b", "c", "m"].into_iter().map(IdentityProfile::new).collect();
        ProfilePool::from_profiles(sessions, IdentityProfile::new("minimal"))
    }

    fn transport(replies: Vec<Result<Response, TransportError>>) -> (Transport<Scripted, Recorder>, Recorder) {
        let rec = Recorder::default();
        let t = Transport::new(
            Scripted::new(replies),
            pool(),
            RetryPolicy {
                max_attempts: 3,
                backoff_base: Duration::from_secs(1),
                jitter: Duration::ZERO,
                minimal_fallback: true,
            },
            SoftFailureRules { signatures: vec![s!("Spotify – Web Player")], min_body_bytes: 0 },
            Duration::from_secs(30),
            rec.clone(),
            StdRng::seed_from_u64(0),
        );
        (t, rec)
    }

    #[test]
    fn first_try_success() {
        let (mut t, rec) = transport(vec![Ok(Response::ok("<html>real</html>"))]);
        let got = t.fetch("https://x/artist/1");
        assert!(got.is_success());
        assert_eq!((got.attempts, got.profile.as_str()), (1, "a"));
        assert_eq!(got.body.as_deref(), Some("<html>real</html>"));
        assert!(rec.0.borrow().is_empty());
    }

    #[test]
    fn soft_failure_rotates_then_succeeds() {
        let (mut t, rec) = transport(vec![
            Ok(Response::ok("<title>Spotify – Web Player</title>")),
            Ok(Response::ok("<html>real</html>")),
        ]);
        let got = t.fetch("u");
        assert!(got.is_success());
        assert_eq!(got.attempts, 2);
        assert_eq!(*t.client.seen.borrow(), ["a", "b"]);
        assert_eq!(got.failures[0].status, FetchStatus::SoftFailure);
        assert_eq!(*rec.0.borrow(), [Duration::from_secs(2)]);
    }

    #[test]
    fn exhausts_with_minimal_last() {
        let (mut t, rec) = transport(vec![
            Err(TransportError::Timeout),
            Ok(Response { status: 503, body: s!() }),
            Ok(Response::ok("Spotify – Web Player")),
        ]);
        let got = t.fetch("u");
        assert_eq!(got.status, FetchStatus::ExhaustedRetries);
        assert!(got.body.is_none());
        assert_eq!(got.attempts, 3);
        assert_eq!(*t.client.seen.borrow(), ["a", "b", "minimal"]);
        let kinds: Vec<FetchStatus> = got.failures.iter().map(|f| f.status).collect();
        assert_eq!(kinds, [FetchStatus::NetworkError, FetchStatus::NetworkError, FetchStatus::SoftFailure]);
        assert_eq!(*rec.0.borrow(), [Duration::from_secs(2), Duration::from_secs(4)]);
    }

    #[test]
    fn sessions_advance_between_fetches() {
        let (mut t, _) = transport(vec![Ok(Response::ok("one")), Ok(Response::ok("two"))]);
        assert_eq!(t.fetch("u1").profile, "a");
        assert_eq!(t.fetch("u2").profile, "b");
    }

    #[test]
    fn single_attempt_keeps_session_profile() {
        let (mut t, rec) = transport(vec![Err(TransportError::Connect(s!("refused")))]);
        let got = t.fetch_with("u", 1);
        assert_eq!(got.status, FetchStatus::ExhaustedRetries);
        assert_eq!(got.profile, "a");
        assert_eq!(got.last_error(), Some("connection failed: refused"));
        assert!(rec.0.borrow().is_empty());
    }

    #[test]
    fn small_bodies_are_soft_failures() {
        let rules = SoftFailureRules { signatures: Vec::new(), min_body_bytes: 1000 };
        assert!(rules.check("tiny").is_some());
        assert!(rules.check(&"x".repeat(1000)).is_none());
    }
}
