//! # Engine Configuration
//!
//! The configuration surface of the rendering engine: the pattern string
//! (with `common`/`combined` alias expansion), the timestamp locale, cache
//! window sizes, and the buffer pool bounds.

mod __test__;

use chrono::Locale;
use serde::{Deserialize, Serialize};

use crate::buffer_pool::{DEFAULT_MAX_RETAINED, DEFAULT_POOL_CAPACITY};
use crate::date_cache::{SHARED_CACHE_SIZE, WORKER_CACHE_SIZE};

/// Alias for the Common Log Format pattern.
pub const COMMON_ALIAS: &str = "common";

/// Expansion of [`COMMON_ALIAS`].
pub const COMMON_PATTERN: &str = "%h %l %u %t \"%r\" %s %b";

/// Alias for the combined log format pattern.
pub const COMBINED_ALIAS: &str = "combined";

/// Expansion of [`COMBINED_ALIAS`].
pub const COMBINED_PATTERN: &str = "%h %l %u %t \"%r\" %s %b \"%{Referer}i\" \"%{User-Agent}i\"";

/// Expands the two well-known pattern aliases; any other string passes
/// through unchanged. Must run before compilation.
pub fn resolve_alias(pattern: &str) -> &str {
  match pattern {
    COMMON_ALIAS => COMMON_PATTERN,
    COMBINED_ALIAS => COMBINED_PATTERN,
    other => other,
  }
}

/// Looks up a locale by name, e.g. `en_US` or `fr_FR`.
///
/// Unknown names fall back to `fallback` with an error logged, mirroring
/// the non-fatal handling of every other configuration mistake: a bad
/// locale garbles timestamps, it does not stop the server.
pub fn find_locale(name: &str, fallback: Locale) -> Locale {
  match Locale::try_from(name) {
    Ok(locale) => locale,
    Err(_) => {
      tracing::error!(locale = %name, "unknown locale name, keeping fallback");
      fallback
    },
  }
}

/// Returns whether `format` is a usable custom timestamp format.
///
/// Custom formats are expected to be validated here once at configuration
/// time; the render path does not re-validate per request.
pub fn validate_time_format(format: &str) -> bool {
  use chrono::TimeZone;
  use std::fmt::Write as _;

  let probe = match chrono::Utc.timestamp_millis_opt(0) {
    chrono::LocalResult::Single(dt) => dt,
    _ => return false,
  };
  let mut out = String::new();
  write!(out, "{}", probe.format(format)).is_ok()
}

/// Declarative engine configuration, deserializable from the host's config
/// file format via serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Pattern string or one of the aliases `common` / `combined`.
  pub pattern: String,

  /// Locale name for custom timestamp formats, e.g. `de_DE`. The CLF
  /// timestamp always uses `en_US`.
  pub locale: Option<String>,

  /// Retention ceiling for recycled line buffers, in bytes.
  pub max_buffer_size: usize,

  /// Maximum number of idle buffers kept in the pool.
  pub pool_capacity: usize,

  /// Window size of the shared timestamp cache tier, in seconds.
  pub shared_cache_size: usize,

  /// Window size of each per-worker timestamp cache tier, in seconds.
  pub worker_cache_size: usize,

  /// Skip logging when this request attribute is present.
  pub condition_unless: Option<String>,

  /// Skip logging unless this request attribute is present.
  pub condition_if: Option<String>,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      pattern: COMMON_ALIAS.to_string(),
      locale: None,
      max_buffer_size: DEFAULT_MAX_RETAINED,
      pool_capacity: DEFAULT_POOL_CAPACITY,
      shared_cache_size: SHARED_CACHE_SIZE,
      worker_cache_size: WORKER_CACHE_SIZE,
      condition_unless: None,
      condition_if: None,
    }
  }
}

impl EngineConfig {
  /// The configured locale, falling back to `en_US` for missing or unknown
  /// names.
  pub fn locale(&self) -> Locale {
    match &self.locale {
      Some(name) => find_locale(name, Locale::en_US),
      None => Locale::en_US,
    }
  }

  /// The pattern string with aliases expanded.
  pub fn resolved_pattern(&self) -> &str {
    resolve_alias(&self.pattern)
  }
}
