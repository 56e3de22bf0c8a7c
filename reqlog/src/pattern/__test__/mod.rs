#[cfg(test)]
mod tests {
  use crate::element::{FieldElement, PortSelector, TimeField, TimeStyle};
  use crate::pattern::{compile, compile_with_locale};
  use chrono::Locale;

  #[test]
  fn test_element_order_matches_pattern_order() {
    let pattern = compile("%h %s");
    let elements = pattern.elements();
    assert_eq!(elements.len(), 4);
    assert_eq!(elements[0], FieldElement::Literal(String::new()));
    assert_eq!(elements[1], FieldElement::RemoteHost);
    assert_eq!(elements[2], FieldElement::Literal(" ".to_string()));
    assert_eq!(elements[3], FieldElement::Status);
  }

  #[test]
  fn test_leading_and_trailing_literals() {
    let pattern = compile(">> %m <<");
    let elements = pattern.elements();
    assert_eq!(elements[0], FieldElement::Literal(">> ".to_string()));
    assert_eq!(elements[1], FieldElement::Method);
    assert_eq!(elements[2], FieldElement::Literal(" <<".to_string()));
  }

  #[test]
  fn test_literal_only_pattern() {
    let pattern = compile("static text");
    assert_eq!(pattern.elements(), &[FieldElement::Literal("static text".to_string())]);
  }

  #[test]
  fn test_empty_pattern() {
    assert!(compile("").is_empty());
  }

  #[test]
  fn test_plain_selectors() {
    let pattern = compile("%a%A%b%B%D%F%h%H%I%l%m%p%q%r%s%S%T%u%U%v");
    let kinds: Vec<&FieldElement> = pattern
      .elements()
      .iter()
      .filter(|e| !matches!(e, FieldElement::Literal(l) if l.is_empty()))
      .collect();
    assert_eq!(kinds.len(), 20);
    assert_eq!(*kinds[0], FieldElement::RemoteAddr);
    assert_eq!(*kinds[1], FieldElement::LocalAddr);
    assert_eq!(*kinds[2], FieldElement::BytesSent { dash_if_zero: true });
    assert_eq!(*kinds[3], FieldElement::BytesSent { dash_if_zero: false });
    assert_eq!(*kinds[4], FieldElement::ElapsedMillis);
    assert_eq!(*kinds[11], FieldElement::Port(PortSelector::Local));
    assert_eq!(*kinds[16], FieldElement::ElapsedSeconds);
  }

  #[test]
  fn test_parameterized_selectors() {
    let pattern = compile("%{User-Agent}i%{sid}c%{ETag}o%{flag}r%{cart}s%{remote}p");
    let fields: Vec<&FieldElement> = pattern
      .elements()
      .iter()
      .filter(|e| !matches!(e, FieldElement::Literal(l) if l.is_empty()))
      .collect();
    assert_eq!(*fields[0], FieldElement::Header("User-Agent".to_string()));
    assert_eq!(*fields[1], FieldElement::Cookie("sid".to_string()));
    assert_eq!(*fields[2], FieldElement::ResponseHeader("ETag".to_string()));
    assert_eq!(*fields[3], FieldElement::RequestAttribute("flag".to_string()));
    assert_eq!(*fields[4], FieldElement::SessionAttribute("cart".to_string()));
    assert_eq!(*fields[5], FieldElement::Port(PortSelector::Remote));
  }

  #[test]
  fn test_unknown_selector_degrades_to_placeholder() {
    let pattern = compile("%Z");
    assert!(pattern
      .elements()
      .contains(&FieldElement::Literal("???".to_string())));
  }

  #[test]
  fn test_unknown_parameterized_selector_names_the_selector() {
    let pattern = compile("%{name}Z");
    assert!(pattern
      .elements()
      .contains(&FieldElement::Literal("???Z???".to_string())));
  }

  #[test]
  fn test_unterminated_brace_degrades_to_text() {
    // No closing brace: the whole escape renders as ordinary text.
    let pattern = compile("%{abc");
    assert!(pattern
      .elements()
      .contains(&FieldElement::Literal("%{abc".to_string())));

    let mixed = compile("%s %{tail");
    assert_eq!(mixed.elements().last(), Some(&FieldElement::Literal("%{tail".to_string())));
    assert!(mixed.elements().contains(&FieldElement::Status));
  }

  #[test]
  fn test_timestamp_sub_formats() {
    let pattern = compile("%{sec}t%{msec}t%{msec_frac}t%{begin:sec}t%{end}t");
    let fields: Vec<&FieldElement> = pattern
      .elements()
      .iter()
      .filter(|e| !matches!(e, FieldElement::Literal(_)))
      .collect();
    assert_eq!(
      *fields[0],
      FieldElement::DateTime(TimeField {
        style: TimeStyle::EpochSecs,
        uses_begin: false,
      })
    );
    assert_eq!(
      *fields[1],
      FieldElement::DateTime(TimeField {
        style: TimeStyle::EpochMillis,
        uses_begin: false,
      })
    );
    assert_eq!(
      *fields[2],
      FieldElement::DateTime(TimeField {
        style: TimeStyle::MillisFrac,
        uses_begin: false,
      })
    );
    assert_eq!(
      *fields[3],
      FieldElement::DateTime(TimeField {
        style: TimeStyle::EpochSecs,
        uses_begin: true,
      })
    );
    assert_eq!(
      *fields[4],
      FieldElement::DateTime(TimeField {
        style: TimeStyle::Clf,
        uses_begin: false,
      })
    );
  }

  #[test]
  fn test_custom_timestamp_format_latches_locale_and_millis() {
    let pattern = compile_with_locale("%{%H:%M:%S.%3f}t", Locale::de_DE);
    let field = pattern
      .elements()
      .iter()
      .find(|e| matches!(e, FieldElement::DateTime(_)))
      .unwrap();
    match field {
      FieldElement::DateTime(TimeField { style, uses_begin }) => {
        assert!(!uses_begin);
        match style {
          TimeStyle::Custom {
            format,
            locale,
            uses_millis,
            needs_escaping,
          } => {
            assert_eq!(format, "%H:%M:%S.{#}");
            assert_eq!(*locale, Locale::de_DE);
            assert!(*uses_millis);
            assert!(!*needs_escaping);
          },
          other => panic!("expected custom style, got {:?}", other),
        }
      },
      _ => unreachable!(),
    }
  }

  #[test]
  fn test_elapsed_time_units() {
    let pattern = compile("%{ms}T %{s}T");
    let fields: Vec<&FieldElement> = pattern
      .elements()
      .iter()
      .filter(|e| !matches!(e, FieldElement::Literal(_)))
      .collect();
    assert_eq!(*fields[0], FieldElement::ElapsedMillis);
    assert_eq!(*fields[1], FieldElement::ElapsedSeconds);
  }

  #[test]
  fn test_recompilation_builds_a_fresh_sequence() {
    let first = compile("%h");
    let second = compile("%h %s");
    assert_ne!(first, second);
    assert_eq!(first, compile("%h"));
  }
}
