//! # Timestamp Cache
//!
//! A locale-aware, two-tier cache for formatted timestamps keyed at
//! one-second granularity.
//!
//! Formatting a timestamp is by far the most expensive part of rendering an
//! access log line, and under load the same second is formatted thousands of
//! times. Each cache tier keeps a cyclic window of consecutive seconds: new
//! seconds shift the window instead of clearing it, so a burst of traffic
//! spanning a second boundary invalidates exactly one slot.
//!
//! There is one entry for the CLF format (the access log standard) and a map
//! of entries for additional strftime formats, lazily populated. An entry's
//! locale is latched when the entry is first created for a given format
//! string; later lookups with a different locale reuse the latched one. The
//! CLF entry always formats with `en_US`.
//!
//! [`DateCache`] is the per-worker tier: it is not thread-safe and is meant
//! to live inside a per-worker render context. [`SharedDateCache`] is the
//! process-wide tier behind short-held mutexes. A per-worker cache parented
//! to the shared tier only takes the shared lock on its own miss, which under
//! sustained load amortizes to roughly one lock acquisition per worker per
//! second rather than one per request.

mod __test__;

use chrono::{Local, LocalResult, Locale, TimeZone};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, PoisonError};

/// Window size of the shared, process-wide tier, in seconds.
pub const SHARED_CACHE_SIZE: usize = 300;

/// Window size of a per-worker tier, in seconds.
pub const WORKER_CACHE_SIZE: usize = 60;

/// Common Log Format timestamp layout, rendered inside `[...]`.
const CLF_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Formats one instant with one fixed format string and one fixed locale.
#[derive(Debug)]
struct TimeFormatter {
  format: String,
  locale: Locale,
  is_clf: bool,
}

impl TimeFormatter {
  fn clf() -> Self {
    Self {
      format: CLF_FORMAT.to_string(),
      locale: Locale::en_US,
      is_clf: true,
    }
  }

  fn custom(format: &str, locale: Locale) -> Self {
    Self {
      format: format.to_string(),
      locale,
      is_clf: false,
    }
  }

  /// Formats `millis` since the Unix epoch in the local time zone.
  ///
  /// An invalid format string degrades to `???` instead of failing; hosts
  /// are expected to validate custom formats at configuration time via
  /// [`crate::config::validate_time_format`].
  fn format(&self, millis: i64) -> String {
    let datetime = match Local.timestamp_millis_opt(millis) {
      LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
      LocalResult::None => return "???".to_string(),
    };
    let mut out = String::with_capacity(32);
    if self.is_clf {
      out.push('[');
    }
    if write!(out, "{}", datetime.format_localized(&self.format, self.locale)).is_err() {
      out.clear();
      out.push_str("???");
      return out;
    }
    if self.is_clf {
      out.push(']');
    }
    out
  }
}

/// One cyclic window of cached formatted seconds plus its formatter.
///
/// Not thread-safe on its own; shared-tier entries are wrapped in a `Mutex`.
/// An entry created with a parent never formats locally: on a miss it
/// delegates to the parent entry under the parent's lock and caches the
/// result in its own window.
#[derive(Debug)]
pub struct CacheEntry {
  /// Second observed by the most recent call, the one-shot memo key.
  previous_seconds: i64,
  /// Value returned by the most recent call.
  previous_format: String,
  /// First second covered by the window, `i64::MIN` while empty.
  first: i64,
  /// Last second covered by the window. `last == first + N - 1` when the
  /// window is non-empty.
  last: i64,
  /// Physical index of `first` in the cyclic buffer.
  offset: usize,
  slots: Vec<Option<String>>,
  formatter: TimeFormatter,
  parent: Option<Arc<Mutex<CacheEntry>>>,
}

impl CacheEntry {
  /// Creates an entry with `cache_size` one-second slots.
  ///
  /// `format` of `None` selects the CLF layout, which always uses `en_US`
  /// and wraps the value in `[...]`. Panics if `cache_size` is zero; window
  /// sizes are fixed at construction of the owning cache.
  fn new(
    format: Option<&str>,
    locale: Locale,
    cache_size: usize,
    parent: Option<Arc<Mutex<CacheEntry>>>,
  ) -> Self {
    if cache_size == 0 {
      panic!("cache size must be greater than 0");
    }
    let formatter = match format {
      None => TimeFormatter::clf(),
      Some(fmt) => TimeFormatter::custom(fmt, locale),
    };
    Self {
      previous_seconds: i64::MIN,
      previous_format: String::new(),
      first: i64::MIN,
      last: i64::MIN,
      offset: 0,
      slots: vec![None; cache_size],
      formatter,
      parent,
    }
  }

  /// Returns the formatted value for `millis`, consulting the memo, the
  /// window, the parent tier, and finally the formatter, in that order.
  ///
  /// The returned value is deterministic for a given instant regardless of
  /// window state; caching only changes the cost.
  fn get_internal(&mut self, millis: i64) -> &str {
    let seconds = millis / 1000;

    // Hot path: bursty traffic keeps hitting the same second.
    if seconds == self.previous_seconds {
      return &self.previous_format;
    }
    self.previous_seconds = seconds;

    let n = self.slots.len() as i64;
    // wrapping_sub: `first` is i64::MIN while the window is empty, and the
    // full-reset branch below ignores the garbage index that produces.
    let mut index = (((self.offset as i64 + seconds.wrapping_sub(self.first)) % n + n) % n) as usize;

    if seconds >= self.first && seconds <= self.last {
      if let Some(cached) = self.slots[index].clone() {
        self.previous_format = cached;
        return &self.previous_format;
      }
      // In-window miss: keep the window, fill the slot below.
    } else if seconds >= self.last.saturating_add(n) || seconds <= self.first.saturating_sub(n) {
      // Farther than one window away in either direction: start over.
      self.first = seconds;
      self.last = seconds + n - 1;
      self.offset = 0;
      index = 0;
      for slot in self.slots.iter_mut() {
        *slot = None;
      }
    } else if seconds > self.last {
      // Slide forward, invalidating only the slots that fall out.
      for i in 1..(seconds - self.last) {
        let stale = ((index as i64 - i) % n + n) % n;
        self.slots[stale as usize] = None;
      }
      self.first = seconds - (n - 1);
      self.last = seconds;
      self.offset = (index + 1) % self.slots.len();
    } else {
      // seconds < self.first: slide backward symmetrically.
      for i in 1..(self.first - seconds) {
        let stale = ((index as i64 + i) % n) as usize;
        self.slots[stale] = None;
      }
      self.first = seconds;
      self.last = seconds + n - 1;
      self.offset = index;
    }

    let formatted = match &self.parent {
      Some(parent) => {
        let mut parent = parent.lock().unwrap_or_else(PoisonError::into_inner);
        parent.get_internal(millis).to_string()
      },
      None => self.formatter.format(millis),
    };
    self.slots[index] = Some(formatted.clone());
    self.previous_format = formatted;
    &self.previous_format
  }
}

/// The process-wide cache tier.
///
/// Constructed once at startup and handed to every worker context; every
/// entry sits behind its own mutex so concurrent workers rolling over to a
/// new second contend only briefly and only on the entries they use.
#[derive(Debug)]
pub struct SharedDateCache {
  cache_size: usize,
  clf: Arc<Mutex<CacheEntry>>,
  by_format: Mutex<HashMap<String, Arc<Mutex<CacheEntry>>>>,
}

impl SharedDateCache {
  pub fn new(cache_size: usize) -> Self {
    Self {
      cache_size,
      clf: Arc::new(Mutex::new(CacheEntry::new(None, Locale::en_US, cache_size, None))),
      by_format: Mutex::new(HashMap::new()),
    }
  }

  /// Returns a handle to the shared entry for `format`, creating it on
  /// first use. The locale supplied by that first caller is latched into
  /// the entry for its lifetime.
  fn entry(&self, format: Option<&str>, locale: Locale) -> Arc<Mutex<CacheEntry>> {
    match format {
      None => Arc::clone(&self.clf),
      Some(fmt) => {
        let mut map = self
          .by_format
          .lock()
          .unwrap_or_else(PoisonError::into_inner);
        let entry = map
          .entry(fmt.to_string())
          .or_insert_with(|| {
            Arc::new(Mutex::new(CacheEntry::new(Some(fmt), locale, self.cache_size, None)))
          });
        Arc::clone(entry)
      },
    }
  }
}

impl Default for SharedDateCache {
  fn default() -> Self {
    Self::new(SHARED_CACHE_SIZE)
  }
}

/// A per-worker cache tier.
///
/// Not `Sync`: one instance belongs to one worker and is threaded through
/// the render call explicitly. When parented to a [`SharedDateCache`], every
/// entry delegates to the matching shared entry on a miss.
#[derive(Debug)]
pub struct DateCache {
  cache_size: usize,
  parent: Option<Arc<SharedDateCache>>,
  clf: CacheEntry,
  by_format: HashMap<String, CacheEntry>,
}

impl DateCache {
  pub fn new(cache_size: usize, parent: Option<Arc<SharedDateCache>>) -> Self {
    let clf_parent = parent
      .as_ref()
      .map(|shared| shared.entry(None, Locale::en_US));
    Self {
      cache_size,
      parent,
      clf: CacheEntry::new(None, Locale::en_US, cache_size, clf_parent),
      by_format: HashMap::new(),
    }
  }

  /// Formats `millis` in Common Log Format, wrapped in `[...]`.
  pub fn clf_format(&mut self, millis: i64) -> &str {
    self.clf.get_internal(millis)
  }

  /// Formats `millis` with a custom strftime `format`.
  ///
  /// The entry for a given format string is created on first use and keeps
  /// that first caller's `locale`; later calls with a different locale for
  /// the same format string silently get the latched locale's formatting.
  pub fn custom_format(&mut self, format: &str, locale: Locale, millis: i64) -> &str {
    if !self.by_format.contains_key(format) {
      let parent = self
        .parent
        .as_ref()
        .map(|shared| shared.entry(Some(format), locale));
      let entry = CacheEntry::new(Some(format), locale, self.cache_size, parent);
      self.by_format.insert(format.to_string(), entry);
    }
    // Present by construction; avoids the entry API so the parent lookup
    // above can borrow self.parent while the map is untouched.
    match self.by_format.get_mut(format) {
      Some(entry) => entry.get_internal(millis),
      None => "???",
    }
  }
}

impl Default for DateCache {
  fn default() -> Self {
    Self::new(WORKER_CACHE_SIZE, None)
  }
}
