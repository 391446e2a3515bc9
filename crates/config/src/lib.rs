//! # Config - Runtime Settings
//!
//! All settings come from environment variables. Missing or unparseable
//! values fall back to the defaults below.
//!
//! ```text
//! IPSCORE_ARCHIVE         archive loaded at startup, target of SAVE  (default: unset)
//! IPSCORE_LOCK_STRIPES    directory creation lock stripes            (default: 256)
//! IPSCORE_REJECT_BOGONS   reject bogon text addresses                (default: false)
//! IPSCORE_DECAY_FACTOR    factor used by DECAY without arguments     (default: 0.9)
//! IPSCORE_DECAY_DEADZONE  deadzone used by DECAY without arguments   (default: 0)
//! IPSCORE_LOG             log filter when RUST_LOG is unset          (default: "warn")
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

pub const ENV_ARCHIVE: &str = "IPSCORE_ARCHIVE";
pub const ENV_LOCK_STRIPES: &str = "IPSCORE_LOCK_STRIPES";
pub const ENV_REJECT_BOGONS: &str = "IPSCORE_REJECT_BOGONS";
pub const ENV_DECAY_FACTOR: &str = "IPSCORE_DECAY_FACTOR";
pub const ENV_DECAY_DEADZONE: &str = "IPSCORE_DECAY_DEADZONE";
pub const ENV_LOG: &str = "IPSCORE_LOG";

pub const DEFAULT_LOCK_STRIPES: usize = 256;
pub const DEFAULT_DECAY_FACTOR: f64 = 0.9;
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Engine and shell settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Archive file used by startup load and argument-less SAVE/LOAD.
    pub archive_path: Option<PathBuf>,
    /// Number of stripes guarding block creation. Always at least 1.
    pub lock_stripes: usize,
    /// Whether text-address entry points reject bogon addresses.
    pub reject_bogons: bool,
    pub decay_factor: f64,
    pub decay_deadzone: u16,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            archive_path: None,
            lock_stripes: DEFAULT_LOCK_STRIPES,
            reject_bogons: false,
            decay_factor: DEFAULT_DECAY_FACTOR,
            decay_deadzone: 0,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// `from_env` is this with `std::env::var`; tests pass a map instead.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let archive_path = lookup(ENV_ARCHIVE)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let lock_stripes = parse_or(&lookup, ENV_LOCK_STRIPES, defaults.lock_stripes);
        let lock_stripes = if lock_stripes == 0 {
            warn!(key = ENV_LOCK_STRIPES, "zero stripes requested, using 1");
            1
        } else {
            lock_stripes
        };

        let decay_factor = parse_or(&lookup, ENV_DECAY_FACTOR, defaults.decay_factor);
        let decay_factor = if decay_factor.is_finite() && (0.0..=1.0).contains(&decay_factor) {
            decay_factor
        } else {
            warn!(key = ENV_DECAY_FACTOR, value = decay_factor, "factor out of range, using default");
            defaults.decay_factor
        };

        Self {
            archive_path,
            lock_stripes,
            reject_bogons: parse_bool_or(&lookup, ENV_REJECT_BOGONS, defaults.reject_bogons),
            decay_factor,
            decay_deadzone: parse_or(&lookup, ENV_DECAY_DEADZONE, defaults.decay_deadzone),
            log_filter: lookup(ENV_LOG)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_filter),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "unparseable setting, using default");
            default
        }),
    }
}

fn parse_bool_or<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => default,
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                warn!(key, value = %v, "unparseable flag, using default");
                default
            }
        },
    }
}
