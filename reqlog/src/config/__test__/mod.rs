#[cfg(test)]
mod tests {
  use crate::config::{
    find_locale, resolve_alias, validate_time_format, EngineConfig, COMBINED_PATTERN,
    COMMON_PATTERN,
  };
  use chrono::Locale;

  #[test]
  fn test_alias_resolution() {
    assert_eq!(resolve_alias("common"), COMMON_PATTERN);
    assert_eq!(resolve_alias("combined"), COMBINED_PATTERN);
    assert_eq!(resolve_alias("%h %s"), "%h %s");
  }

  #[test]
  fn test_find_locale() {
    assert_eq!(find_locale("fr_FR", Locale::en_US), Locale::fr_FR);
    // Unknown names keep the fallback instead of failing.
    assert_eq!(find_locale("xx_YY", Locale::en_US), Locale::en_US);
  }

  #[test]
  fn test_validate_time_format() {
    assert!(validate_time_format("%Y-%m-%d %H:%M:%S"));
    assert!(validate_time_format("%d/%b/%Y:%H:%M:%S %z"));
    assert!(!validate_time_format("%Q"));
  }

  #[test]
  fn test_defaults() {
    let config = EngineConfig::default();
    assert_eq!(config.resolved_pattern(), COMMON_PATTERN);
    assert_eq!(config.locale(), Locale::en_US);
    assert_eq!(config.max_buffer_size, 256);
    assert!(config.condition_unless.is_none());
  }

  #[test]
  fn test_deserializes_with_defaults() {
    let config: EngineConfig =
      serde_json::from_str(r#"{"pattern": "combined", "locale": "de_DE"}"#).unwrap();
    assert_eq!(config.resolved_pattern(), COMBINED_PATTERN);
    assert_eq!(config.locale(), Locale::de_DE);
    assert_eq!(config.shared_cache_size, 300);
    assert_eq!(config.worker_cache_size, 60);
  }
}
