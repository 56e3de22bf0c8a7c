#[cfg(test)]
mod tests {
  use crate::date_cache::{DateCache, SharedDateCache};
  use chrono::{Local, Locale, TimeZone};
  use std::sync::Arc;

  // 2023-11-14T22:13:20Z, safely mid-month in every timezone.
  const BASE: i64 = 1_700_000_000_000;

  fn fresh_clf(millis: i64) -> String {
    let dt = Local.timestamp_millis_opt(millis).unwrap();
    format!("[{}]", dt.format_localized("%d/%b/%Y:%H:%M:%S %z", Locale::en_US))
  }

  fn fresh_custom(format: &str, locale: Locale, millis: i64) -> String {
    let dt = Local.timestamp_millis_opt(millis).unwrap();
    dt.format_localized(format, locale).to_string()
  }

  #[test]
  fn test_clf_matches_fresh_format() {
    let mut cache = DateCache::new(5, None);
    assert_eq!(cache.clf_format(BASE), fresh_clf(BASE));
  }

  #[test]
  fn test_same_second_is_identical() {
    let mut cache = DateCache::new(5, None);
    let first = cache.clf_format(BASE).to_string();
    // Different milliseconds, same second.
    assert_eq!(cache.clf_format(BASE + 999), first);
    assert_eq!(cache.clf_format(BASE + 1), first);
    // The next second formats differently.
    assert_ne!(cache.clf_format(BASE + 1000), first);
  }

  #[test]
  fn test_same_second_survives_interleaved_queries() {
    let mut cache = DateCache::new(5, None);
    let expected = cache.clf_format(BASE).to_string();
    // Query other in-window seconds between repeats of the same second.
    for offset in 1..5 {
      cache.clf_format(BASE + offset * 1000);
    }
    assert_eq!(cache.clf_format(BASE + 500), expected);
  }

  #[test]
  fn test_sliding_window_stays_correct() {
    let size = 5i64;
    let mut cache = DateCache::new(size as usize, None);
    // Strictly increasing seconds well past the window size: only the
    // sliding path runs after the first fill, and every value stays right.
    for i in 0..(size * 3) {
      let millis = BASE + i * 1000;
      assert_eq!(cache.clf_format(millis), fresh_clf(millis));
    }
    // Re-query seconds still inside the final window.
    for i in (size * 2)..(size * 3) {
      let millis = BASE + i * 1000;
      assert_eq!(cache.clf_format(millis), fresh_clf(millis));
    }
  }

  #[test]
  fn test_backward_slide_stays_correct() {
    let mut cache = DateCache::new(5, None);
    cache.clf_format(BASE);
    // Step backwards one second at a time, staying within a window's reach.
    for i in 1..4 {
      let millis = BASE - i * 1000;
      assert_eq!(cache.clf_format(millis), fresh_clf(millis));
    }
    // Forward again: still correct.
    assert_eq!(cache.clf_format(BASE), fresh_clf(BASE));
  }

  #[test]
  fn test_full_reset_boundary() {
    let mut cache = DateCache::new(5, None);
    cache.clf_format(BASE);
    // Far jumps in both directions force the reset branch.
    let forward = BASE + 1000 * 1000;
    assert_eq!(cache.clf_format(forward), fresh_clf(forward));
    let backward = BASE - 1000 * 1000;
    assert_eq!(cache.clf_format(backward), fresh_clf(backward));
  }

  #[test]
  fn test_custom_format_matches_fresh_format() {
    let mut cache = DateCache::new(5, None);
    let format = "%Y-%m-%d %H:%M:%S";
    let expected = fresh_custom(format, Locale::en_US, BASE);
    assert_eq!(cache.custom_format(format, Locale::en_US, BASE), expected);
    // Repeated calls return byte-identical strings.
    assert_eq!(cache.custom_format(format, Locale::en_US, BASE), expected);
  }

  #[test]
  fn test_locale_is_latched_per_format_string() {
    let mut cache = DateCache::new(5, None);
    let format = "%B";
    let english = cache.custom_format(format, Locale::en_US, BASE).to_string();
    assert_eq!(english, fresh_custom(format, Locale::en_US, BASE));
    // A different locale for the same format string gets the first
    // caller's locale.
    let latched = cache.custom_format(format, Locale::fr_FR, BASE + 1000).to_string();
    assert_eq!(latched, fresh_custom(format, Locale::en_US, BASE + 1000));
    // A new format string may use the new locale.
    let mut fresh = DateCache::new(5, None);
    let french = fresh.custom_format(format, Locale::fr_FR, BASE).to_string();
    assert_eq!(french, fresh_custom(format, Locale::fr_FR, BASE));
  }

  #[test]
  fn test_worker_tier_delegates_to_shared_tier() {
    let shared = Arc::new(SharedDateCache::new(300));
    let mut worker_a = DateCache::new(5, Some(Arc::clone(&shared)));
    let mut worker_b = DateCache::new(5, Some(Arc::clone(&shared)));

    let a = worker_a.clf_format(BASE).to_string();
    let b = worker_b.clf_format(BASE).to_string();
    assert_eq!(a, b);
    assert_eq!(a, fresh_clf(BASE));

    let fmt = "%H:%M";
    let ca = worker_a.custom_format(fmt, Locale::en_US, BASE).to_string();
    let cb = worker_b.custom_format(fmt, Locale::en_US, BASE).to_string();
    assert_eq!(ca, cb);
  }

  #[test]
  fn test_shared_tier_is_usable_across_threads() {
    let shared = Arc::new(SharedDateCache::new(300));
    let expected = fresh_clf(BASE);
    let mut handles = Vec::new();
    for _ in 0..4 {
      let shared = Arc::clone(&shared);
      let expected = expected.clone();
      handles.push(std::thread::spawn(move || {
        let mut worker = DateCache::new(60, Some(shared));
        for i in 0..100 {
          let millis = BASE + (i % 10) * 1000;
          let got = worker.clf_format(millis).to_string();
          assert_eq!(got, fresh_clf(millis));
        }
        assert_eq!(worker.clf_format(BASE), expected);
      }));
    }
    for handle in handles {
      handle.join().unwrap();
    }
  }

  #[test]
  fn test_invalid_format_degrades_to_placeholder() {
    let mut cache = DateCache::new(5, None);
    // %Q is not a chrono specifier; the value garbles, nothing panics.
    assert_eq!(cache.custom_format("%Q", Locale::en_US, BASE), "???");
  }
}
