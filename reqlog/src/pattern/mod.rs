//! # Pattern Compiler
//!
//! Compiles a printf-like access log pattern string into an ordered sequence
//! of [`FieldElement`]s, once, at configuration time.
//!
//! The grammar is `%X` for a plain field and `%{name}X` for a parameterized
//! one; everything else is literal text. Compilation never fails: an
//! unrecognized selector becomes a visible placeholder in the output instead
//! of an error, because a partially wrong log pattern must not stop the
//! server from serving requests.

mod __test__;

use chrono::Locale;
use smallvec::SmallVec;

use crate::element::{FieldElement, PortSelector, TimeField};

/// An immutable, compiled access log pattern.
///
/// Element order is the left-to-right order of appearance in the source
/// pattern and is literally the output order. Reconfiguring a pattern always
/// compiles a brand-new sequence; compiled patterns are never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPattern {
  elements: SmallVec<[FieldElement; 8]>,
}

impl CompiledPattern {
  /// The compiled elements in output order.
  pub fn elements(&self) -> &[FieldElement] {
    &self.elements
  }

  pub fn len(&self) -> usize {
    self.elements.len()
  }

  pub fn is_empty(&self) -> bool {
    self.elements.is_empty()
  }
}

/// Compiles `pattern` with the `en_US` locale bound into any custom
/// timestamp formats. See [`compile_with_locale`].
pub fn compile(pattern: &str) -> CompiledPattern {
  compile_with_locale(pattern, Locale::en_US)
}

/// Compiles `pattern` into a [`CompiledPattern`].
///
/// `locale` is latched into `%{format}t` fields; it affects month and day
/// names of custom formats, never the CLF timestamp. Alias names such as
/// `common` must be expanded before calling this, see
/// [`crate::config::resolve_alias`].
pub fn compile_with_locale(pattern: &str, locale: Locale) -> CompiledPattern {
  let chars: Vec<char> = pattern.chars().collect();
  let mut elements: SmallVec<[FieldElement; 8]> = SmallVec::new();
  let mut literal = String::new();
  let mut replace = false;

  let mut i = 0;
  while i < chars.len() {
    let ch = chars[i];
    if replace {
      if ch == '{' {
        let mut name = String::new();
        let mut j = i + 1;
        while j < chars.len() && chars[j] != '}' {
          name.push(chars[j]);
          j += 1;
        }
        if j + 1 < chars.len() {
          // Skip past the closing brace to the selector character.
          j += 1;
          elements.push(parameterized_element(&name, chars[j], locale));
          i = j;
        } else {
          // No closing brace before end of string: the escape is abandoned
          // and `%{` plus the name render as ordinary text.
          literal.push('%');
          literal.push(ch);
        }
      } else {
        elements.push(plain_element(ch, locale));
      }
      replace = false;
    } else if ch == '%' {
      replace = true;
      elements.push(FieldElement::Literal(std::mem::take(&mut literal)));
    } else {
      literal.push(ch);
    }
    i += 1;
  }
  if !literal.is_empty() {
    elements.push(FieldElement::Literal(literal));
  }

  CompiledPattern { elements }
}

/// Selects the element for a `%X` escape.
fn plain_element(selector: char, locale: Locale) -> FieldElement {
  match selector {
    'a' => FieldElement::RemoteAddr,
    'A' => FieldElement::LocalAddr,
    'b' => FieldElement::BytesSent { dash_if_zero: true },
    'B' => FieldElement::BytesSent { dash_if_zero: false },
    'D' => FieldElement::ElapsedMillis,
    'F' => FieldElement::FirstByteMillis,
    'h' => FieldElement::RemoteHost,
    'H' => FieldElement::Protocol,
    'I' => FieldElement::ThreadName,
    'l' => FieldElement::LogicalUser,
    'm' => FieldElement::Method,
    'p' => FieldElement::Port(PortSelector::Local),
    'q' => FieldElement::QueryString,
    'r' => FieldElement::RequestLine,
    's' => FieldElement::Status,
    'S' => FieldElement::SessionId,
    't' => FieldElement::DateTime(TimeField::parse("", locale)),
    'T' => FieldElement::ElapsedSeconds,
    'u' => FieldElement::RemoteUser,
    'U' => FieldElement::RequestUri,
    'v' => FieldElement::ServerName,
    _ => {
      tracing::warn!(selector = %selector, "unrecognized pattern selector");
      FieldElement::Literal("???".to_string())
    },
  }
}

/// Selects the element for a `%{name}X` escape.
fn parameterized_element(name: &str, selector: char, locale: Locale) -> FieldElement {
  match selector {
    'i' => FieldElement::Header(name.to_string()),
    'c' => FieldElement::Cookie(name.to_string()),
    'o' => FieldElement::ResponseHeader(name.to_string()),
    'r' => FieldElement::RequestAttribute(name.to_string()),
    's' => FieldElement::SessionAttribute(name.to_string()),
    'p' => match name {
      "remote" => FieldElement::Port(PortSelector::Remote),
      "local" => FieldElement::Port(PortSelector::Local),
      other => {
        tracing::warn!(port_type = %other, "unrecognized port type, using local");
        FieldElement::Port(PortSelector::Local)
      },
    },
    't' => FieldElement::DateTime(TimeField::parse(name, locale)),
    'T' => match name {
      "ms" => FieldElement::ElapsedMillis,
      _ => FieldElement::ElapsedSeconds,
    },
    _ => {
      tracing::warn!(selector = %selector, "unrecognized parameterized pattern selector");
      FieldElement::Literal(format!("???{}???", selector))
    },
  }
}
