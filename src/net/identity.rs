// src/net/identity.rs
//! Identity profiles: the header set a request goes out with.
//!
//! The pool is built once per run and never mutated. Rotation state (which
//! profile is next) belongs to the `Transport`, not to the pool.

use rand::Rng;

const DESKTOP_AGENTS: [&str; 6] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/120.0.0.0",
];

const MOBILE_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; SM-G991U) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (iPad; CPU OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; SAMSUNG SM-G996U) AppleWebKit/537.36 (KHTML, like Gecko) SamsungBrowser/23.0 Chrome/115.0.0.0 Mobile Safari/537.36",
];

const REFERERS: [&str; 3] = ["https://www.google.com/", "https://open.spotify.com/", "https://www.spotify.com/"];

const DESKTOP_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";
const MOBILE_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityProfile {
    pub name: String,
    /// Sent verbatim, in order. `Accept-Encoding` is left to the client.
    pub headers: Vec<(String, String)>,
}

impl IdentityProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), headers: Vec::new() }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((s!(key), value.into()));
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.header("User-Agent")
    }
}

/// Session profiles in rotation order, plus the UA-only fallback.
#[derive(Clone, Debug)]
pub struct ProfilePool {
    sessions: Vec<IdentityProfile>,
    minimal: IdentityProfile,
}

impl ProfilePool {
    /// `desktop` browser sessions followed by one mobile session.
    pub fn build<R: Rng>(rng: &mut R, desktop: usize) -> Self {
        let mut sessions: Vec<IdentityProfile> =
            (1..=desktop).map(|i| desktop_profile(rng, i)).collect();
        sessions.push(mobile_profile(rng));

        let minimal = IdentityProfile::new("minimal").with("User-Agent", pick(rng, &DESKTOP_AGENTS));
        logd!(sessions = sessions.len(), "identity pool built");
        Self { sessions, minimal }
    }

    /// Fixed pool; an empty `sessions` list rotates through `minimal` only.
    pub fn from_profiles(sessions: Vec<IdentityProfile>, minimal: IdentityProfile) -> Self {
        Self { sessions, minimal }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Profile at rotation position `cursor` (wraps).
    pub fn session(&self, cursor: usize) -> &IdentityProfile {
        if self.sessions.is_empty() {
            return &self.minimal;
        }
        &self.sessions[cursor % self.sessions.len()]
    }

    pub fn minimal(&self) -> &IdentityProfile {
        &self.minimal
    }
}

fn pick<'a, R: Rng>(rng: &mut R, from: &[&'a str]) -> &'a str {
    from[rng.random_range(0..from.len())]
}

fn desktop_profile<R: Rng>(rng: &mut R, n: usize) -> IdentityProfile {
    let mut p = IdentityProfile::new(format!("desktop-{n}"))
        .with("User-Agent", pick(rng, &DESKTOP_AGENTS))
        .with("Accept", DESKTOP_ACCEPT)
        .with("Accept-Language", "en-US,en;q=0.9")
        .with("DNT", "1")
        .with("Upgrade-Insecure-Requests", "1")
        .with("Sec-Fetch-Dest", "document")
        .with("Sec-Fetch-Mode", "navigate")
        .with("Sec-Fetch-Site", "none")
        .with("Sec-Fetch-User", "?1")
        .with("Cache-Control", "max-age=0")
        .with("sec-ch-ua", r#""Not_A Brand";v="8", "Chromium";v="120", "Google Chrome";v="120""#)
        .with("sec-ch-ua-mobile", "?0")
        .with("sec-ch-ua-platform", r#""Windows""#);
    if rng.random_bool(0.5) {
        p = p.with("Referer", pick(rng, &REFERERS));
    }
    p
}

fn mobile_profile<R: Rng>(rng: &mut R) -> IdentityProfile {
    let sp_t: String = (0..32)
        .map(|_| char::from_digit(rng.random_range(0..16u32), 16).unwrap_or('0'))
        .collect();
    IdentityProfile::new("mobile")
        .with("User-Agent", pick(rng, &MOBILE_AGENTS))
        .with("Accept", MOBILE_ACCEPT)
        .with("Accept-Language", "en-US,en;q=0.9")
        .with("Upgrade-Insecure-Requests", "1")
        .with("Sec-Fetch-Dest", "document")
        .with("Sec-Fetch-Mode", "navigate")
        .with("Sec-Fetch-Site", "none")
        .with("Sec-Fetch-User", "?1")
        .with("sec-ch-ua-mobile", "?1")
        .with("sec-ch-ua-platform", r#""Android""#)
        .with("Viewport-Width", "360")
        .with("Cookie", format!("sp_t={sp_t}"))
}
