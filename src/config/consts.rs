// src/config/consts.rs

// Sites
pub const SPOTIFY_HOST: &str = "open.spotify.com";
pub const SPOTIFY_DATA_SOURCE: &str = "spotify.com";
pub const KWORB_DATA_SOURCE: &str = "kworb.net";

// Local store
pub const STORE_SEP: char = ',';

// Output
pub const DEFAULT_OUT_DIR: &str = "out";
pub const DEFAULT_LISTENERS_FILE: &str = "monthly_listeners.csv";
pub const DEFAULT_STREAMS_FILE: &str = "comprehensive_streams.csv";
pub const DEFAULT_TOP_N: usize = 10;

// Transport
pub const MAX_ATTEMPTS: u32 = 3;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const BACKOFF_BASE_SECS: f64 = 1.0;
pub const BACKOFF_JITTER_SECS: f64 = 1.0;
pub const DESKTOP_SESSIONS: usize = 3;

// Pacing between targets
pub const BASE_DELAY_SECS: f64 = 4.0;
pub const DELAY_SPREAD_SECS: f64 = 1.0;
pub const MIN_DELAY_SECS: f64 = 2.0;
pub const MIN_DELAY_FLOOR_SECS: f64 = 1.0; // never burst

// Soft failure: the generic player shell served instead of the artist page
pub const WEB_PLAYER_SIGNATURE: &str = "Spotify – Web Player";

// Validation bounds
pub const LISTENERS_MIN: u64 = 1;
pub const LISTENERS_MAX: u64 = 50_000_000;
pub const TOTAL_STREAMS_FLOOR: u64 = 10_000; // exclusive
pub const DAILY_STREAMS_MIN: u64 = 10;
pub const DAILY_STREAMS_MAX: u64 = 1_000_000;
pub const SPOTIFY_ID_LEN: usize = 22;

// Presets (artist IDs)
pub const SB19_ID: &str = "3g7vYcdDXnqnDKYFwqXBJP";
pub const BINI_ID: &str = "7tNO3vJC9zlHy2IJOx34ga";
