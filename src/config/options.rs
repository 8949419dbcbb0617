// src/config/options.rs
use std::{fs, path::{Path, PathBuf}, time::Duration};

use serde::{Deserialize, Serialize};

use super::consts::*;
use crate::engine::{KnownValue, Overrides};
use crate::error::{Error, Result};
use crate::net::{DelayPolicy, RetryPolicy, SoftFailureRules};

/// How a run treats the destination file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Add rows after whatever is there (time series).
    #[default]
    Append,
    /// Replace the destination with this run's rows ("sync").
    Overwrite,
}

/// Which page family a run scrapes; selects record kind and default file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageKind {
    Listeners,
    Streams,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverrideEntry {
    pub artist_id: String,
    pub monthly_listeners: u64,
    #[serde(default)]
    pub artist_name: Option<String>,
}

/// Everything a run needs to know. Built from defaults, then an optional TOML
/// file, then CLI flags (last writer wins).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunOptions {
    /// Attempt cap per endpoint (first try included).
    pub max_retries: u32,
    /// Seconds between targets before jitter.
    pub base_delay: f64,
    pub delay_spread: f64,
    pub min_delay: f64,
    pub backoff_base: f64,
    pub timeout_secs: u64,
    pub output_path: Option<PathBuf>,
    pub history_path: Option<PathBuf>,
    pub mode: WriteMode,
    pub top_n: usize,
    pub soft_failure_signatures: Vec<String>,
    pub min_body_bytes: usize,
    pub overrides: Vec<OverrideEntry>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_retries: MAX_ATTEMPTS,
            base_delay: BASE_DELAY_SECS,
            delay_spread: DELAY_SPREAD_SECS,
            min_delay: MIN_DELAY_SECS,
            backoff_base: BACKOFF_BASE_SECS,
            timeout_secs: REQUEST_TIMEOUT_SECS,
            output_path: None,
            history_path: None,
            mode: WriteMode::Append,
            top_n: DEFAULT_TOP_N,
            soft_failure_signatures: vec![s!(WEB_PLAYER_SIGNATURE)],
            min_body_bytes: 0,
            overrides: Vec::new(),
        }
    }
}

impl RunOptions {
    /// Read a TOML file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let opts: RunOptions = toml::from_str(text)?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(Error::Config(s!("max_retries must be at least 1")));
        }
        for (name, v) in [
            ("base_delay", self.base_delay),
            ("delay_spread", self.delay_spread),
            ("min_delay", self.min_delay),
            ("backoff_base", self.backoff_base),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(Error::Config(format!("{name} must be a non-negative number of seconds")));
            }
            if Duration::try_from_secs_f64(v).is_err() {
                return Err(Error::Config(format!("{name} is out of range")));
            }
        }
        if self.min_delay < MIN_DELAY_FLOOR_SECS {
            return Err(Error::Config(format!("min_delay must be at least {MIN_DELAY_FLOOR_SECS}s")));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(s!("timeout_secs must be positive")));
        }
        for o in &self.overrides {
            if !crate::engine::is_spotify_id(&o.artist_id) {
                return Err(Error::Config(format!("override id {:?} is not a 22-char artist id", o.artist_id)));
            }
        }
        Ok(())
    }

    /// Destination file, falling back to `out/<default file for kind>`.
    pub fn output_for(&self, kind: PageKind) -> PathBuf {
        self.output_path.clone().unwrap_or_else(|| {
            let file = match kind {
                PageKind::Listeners => DEFAULT_LISTENERS_FILE,
                PageKind::Streams => DEFAULT_STREAMS_FILE,
            };
            PathBuf::from(DEFAULT_OUT_DIR).join(file)
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            backoff_base: secs(self.backoff_base),
            jitter: secs(BACKOFF_JITTER_SECS),
            minimal_fallback: true,
        }
    }

    pub fn delay_policy(&self) -> DelayPolicy {
        DelayPolicy {
            base: secs(self.base_delay),
            spread: secs(self.delay_spread),
            floor: secs(self.min_delay),
        }
    }

    pub fn soft_failure_rules(&self) -> SoftFailureRules {
        SoftFailureRules {
            signatures: self.soft_failure_signatures.clone(),
            min_body_bytes: self.min_body_bytes,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn overrides(&self) -> Overrides {
        self.overrides
            .iter()
            .map(|o| {
                (o.artist_id.clone(), KnownValue {
                    monthly_listeners: o.monthly_listeners,
                    artist_name: o.artist_name.clone(),
                })
            })
            .collect()
    }
}

fn secs(v: f64) -> Duration {
    Duration::from_secs_f64(v.max(0.0))
}
