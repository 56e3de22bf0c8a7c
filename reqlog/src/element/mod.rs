//! # Field Elements
//!
//! One renderable unit of a compiled log pattern. A pattern compiles into an
//! ordered sequence of [`FieldElement`]s; rendering a request walks the
//! sequence and appends each field to the line buffer.
//!
//! Every variant has a defined fallback (`-` for absent data, the `???`
//! family for unrecognized pattern selectors), so rendering never fails and
//! never panics: a bad field garbles its own column and nothing else.


use chrono::Locale;

use crate::date_cache::DateCache;
use crate::view::{
  AttributeValue, RequestView, ResponseView, SENDFILE_END_ATTRIBUTE, SENDFILE_START_ATTRIBUTE,
};

/// Marker substituted for millisecond specifiers in custom time formats so
/// the cached value stays stable within one second. The actual milliseconds
/// are patched in after cache retrieval.
const MSEC_MARKER: &str = "{#}";

/// Which port of the connection to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSelector {
  Local,
  Remote,
}

/// Rendering style of a timestamp field.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeStyle {
  /// Common Log Format, `[dd/Mon/yyyy:HH:mm:ss zzzz]`.
  Clf,
  /// Whole seconds since the Unix epoch.
  EpochSecs,
  /// Whole milliseconds since the Unix epoch.
  EpochMillis,
  /// The millisecond fraction of the current second, zero-padded to 3
  /// digits.
  MillisFrac,
  /// A custom strftime format, cached per second.
  Custom {
    format: String,
    locale: Locale,
    /// Format contained `%3f`; the cached value carries [`MSEC_MARKER`]
    /// where the milliseconds belong.
    uses_millis: bool,
    /// Formatted output may contain characters the escaper rewrites.
    needs_escaping: bool,
  },
}

/// A compiled `%t` / `%{...}t` field.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeField {
  pub style: TimeStyle,
  /// Log the request start instant instead of the completion instant.
  pub uses_begin: bool,
}

impl TimeField {
  /// Parses the `%{spec}t` sub-format: an optional `begin:`/`end:` selector
  /// followed by `sec`, `msec`, `msec_frac`, or a strftime format string.
  /// A bare `%t` is CLF at completion time.
  pub fn parse(spec: &str, locale: Locale) -> Self {
    let mut format = spec;
    let mut uses_begin = false;
    if format == "begin" {
      uses_begin = true;
      format = "";
    } else if let Some(rest) = format.strip_prefix("begin:") {
      uses_begin = true;
      format = rest;
    } else if format == "end" {
      format = "";
    } else if let Some(rest) = format.strip_prefix("end:") {
      format = rest;
    }

    let style = match format {
      "" => TimeStyle::Clf,
      "sec" => TimeStyle::EpochSecs,
      "msec" => TimeStyle::EpochMillis,
      "msec_frac" => TimeStyle::MillisFrac,
      _ => {
        let uses_millis = format.contains("%3f");
        let tidy = format.replace("%3f", MSEC_MARKER);
        let mut probe = String::new();
        escape_and_append(format, &mut probe);
        TimeStyle::Custom {
          needs_escaping: probe != format,
          format: tidy,
          locale,
          uses_millis,
        }
      },
    };
    TimeField { style, uses_begin }
  }
}

/// One element of a compiled access log pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldElement {
  /// Constant text between pattern escapes, including placeholder text for
  /// unrecognized selectors.
  Literal(String),
  /// `%a` — remote IP address.
  RemoteAddr,
  /// `%A` — local IP address.
  LocalAddr,
  /// `%h` — remote host name.
  RemoteHost,
  /// `%H` — request protocol.
  Protocol,
  /// `%l` — remote logical username from identd, always `-`.
  LogicalUser,
  /// `%m` — request method.
  Method,
  /// `%r` — first line of the request.
  RequestLine,
  /// `%s` — response status code.
  Status,
  /// `%S` — session id.
  SessionId,
  /// `%D`, `%{ms}T` — elapsed time in whole milliseconds.
  ElapsedMillis,
  /// `%T` — elapsed time as `secs.mmm` with exactly 3 fractional digits.
  ElapsedSeconds,
  /// `%F` — milliseconds from request start to response commit.
  FirstByteMillis,
  /// `%b` / `%B` — response body bytes; `%b` collapses `<= 0` to `-`.
  BytesSent { dash_if_zero: bool },
  /// `%t` / `%{fmt}t` — timestamp.
  DateTime(TimeField),
  /// `%q` — query string with leading `?`, or nothing.
  QueryString,
  /// `%U` — request URI path.
  RequestUri,
  /// `%v` — server name.
  ServerName,
  /// `%I` — worker thread name.
  ThreadName,
  /// `%u` — authenticated remote user.
  RemoteUser,
  /// `%{name}i` — request header, multi-values joined with `,`.
  Header(String),
  /// `%{name}c` — cookie value(s).
  Cookie(String),
  /// `%{name}o` — response header, multi-values joined with `,`.
  ResponseHeader(String),
  /// `%{name}r` — request attribute.
  RequestAttribute(String),
  /// `%{name}s` — session attribute.
  SessionAttribute(String),
  /// `%p` / `%{local|remote}p` — connection port.
  Port(PortSelector),
}

impl FieldElement {
  /// Appends this field's value for one completed request to `out`.
  ///
  /// `instant_millis` is the request start time; timestamp fields add
  /// `elapsed_millis` unless compiled with the `begin` selector. Absent data
  /// renders the field's fallback literal; this method never fails.
  pub fn render(
    &self,
    out: &mut String,
    dates: &mut DateCache,
    instant_millis: i64,
    request: &dyn RequestView,
    response: Option<&dyn ResponseView>,
    elapsed_millis: i64,
  ) {
    match self {
      FieldElement::Literal(text) => out.push_str(text),
      FieldElement::RemoteAddr => push_or_dash(out, request.remote_addr()),
      FieldElement::LocalAddr => push_or_dash(out, request.local_addr()),
      FieldElement::RemoteHost => {
        let host = request.remote_host().or_else(|| request.remote_addr());
        push_or_dash(out, host.filter(|h| !h.is_empty()));
      },
      FieldElement::Protocol => push_or_dash(out, request.protocol()),
      FieldElement::LogicalUser => out.push('-'),
      FieldElement::Method => push_or_dash(out, request.method()),
      FieldElement::RequestLine => render_request_line(out, request),
      FieldElement::Status => render_status(out, response),
      FieldElement::SessionId => push_or_dash(out, request.session_id()),
      FieldElement::ElapsedMillis => out.push_str(&elapsed_millis.to_string()),
      FieldElement::ElapsedSeconds => render_fractional_seconds(out, elapsed_millis),
      FieldElement::FirstByteMillis => render_first_byte(out, request, response),
      FieldElement::BytesSent { dash_if_zero } => {
        render_bytes(out, request, response, *dash_if_zero)
      },
      FieldElement::DateTime(field) => {
        render_time(out, dates, field, instant_millis, elapsed_millis)
      },
      FieldElement::QueryString => {
        if let Some(query) = request.query_string() {
          out.push('?');
          out.push_str(query);
        }
      },
      FieldElement::RequestUri => push_or_dash(out, request.request_uri()),
      FieldElement::ServerName => push_or_dash(out, request.server_name()),
      FieldElement::ThreadName => push_or_dash(out, request.thread_name()),
      FieldElement::RemoteUser => match request.remote_user() {
        Some(user) => escape_and_append(user, out),
        None => out.push('-'),
      },
      FieldElement::Header(name) => render_joined(out, request.header_values(name)),
      FieldElement::Cookie(name) => {
        let values = request.cookie_values(name);
        if values.is_empty() {
          out.push('-');
        } else {
          escape_and_append(&values.join(","), out);
        }
      },
      FieldElement::ResponseHeader(name) => {
        let values = response.map(|r| r.header_values(name)).unwrap_or_default();
        render_joined(out, values);
      },
      FieldElement::RequestAttribute(name) => render_attribute(out, request.attribute(name)),
      FieldElement::SessionAttribute(name) => {
        render_attribute(out, request.session_attribute(name))
      },
      FieldElement::Port(selector) => {
        let port = match selector {
          PortSelector::Local => request.server_port(),
          PortSelector::Remote => request.remote_port(),
        };
        out.push_str(&port.to_string());
      },
    }
  }
}

fn push_or_dash(out: &mut String, value: Option<&str>) {
  match value {
    Some(v) => out.push_str(v),
    None => out.push('-'),
  }
}

fn render_request_line(out: &mut String, request: &dyn RequestView) {
  // No method means no request line.
  let Some(method) = request.method() else {
    out.push('-');
    return;
  };
  out.push_str(method);
  out.push(' ');
  out.push_str(request.request_uri().unwrap_or("-"));
  if let Some(query) = request.query_string() {
    out.push('?');
    out.push_str(query);
  }
  out.push(' ');
  out.push_str(request.protocol().unwrap_or("-"));
}

fn render_status(out: &mut String, response: Option<&dyn ResponseView>) {
  match response {
    Some(response) => {
      let status = response.status();
      if (100..=999).contains(&status) {
        // Digit-at-a-time fast path keeps the hot path free of a
        // formatting allocation.
        out.push((b'0' + (status / 100) as u8) as char);
        out.push((b'0' + ((status / 10) % 10) as u8) as char);
        out.push((b'0' + (status % 10) as u8) as char);
      } else {
        out.push_str(&status.to_string());
      }
    },
    None => out.push('-'),
  }
}

/// `secs.mmm`, zero-padded to exactly 3 fractional digits, not rounded.
fn render_fractional_seconds(out: &mut String, elapsed_millis: i64) {
  out.push_str(&(elapsed_millis / 1000).to_string());
  out.push('.');
  let remains = elapsed_millis.rem_euclid(1000);
  out.push_str(&(remains / 100).to_string());
  out.push_str(&((remains / 10) % 10).to_string());
  out.push_str(&(remains % 10).to_string());
}

fn render_first_byte(out: &mut String, request: &dyn RequestView, response: Option<&dyn ResponseView>) {
  match response.and_then(|r| r.commit_time_millis()) {
    Some(commit) => {
      let delta = commit - request.start_time_millis();
      out.push_str(&delta.to_string());
    },
    None => out.push('-'),
  }
}

fn render_bytes(
  out: &mut String,
  request: &dyn RequestView,
  response: Option<&dyn ResponseView>,
  dash_if_zero: bool,
) {
  let mut length = response.map(|r| r.bytes_written()).unwrap_or(0);
  if length <= 0 {
    // Sendfile transfers bypass the response byte counter; the connector
    // records the byte range as request attributes instead. Attributes may
    // be set by untrusted applications, so both must be numeric.
    let start = request
      .attribute(SENDFILE_START_ATTRIBUTE)
      .and_then(|v| v.as_number());
    let end = request
      .attribute(SENDFILE_END_ATTRIBUTE)
      .and_then(|v| v.as_number());
    if let (Some(start), Some(end)) = (start, end) {
      length = end - start;
    }
  }
  if length <= 0 && dash_if_zero {
    out.push('-');
  } else {
    out.push_str(&length.to_string());
  }
}

fn render_time(
  out: &mut String,
  dates: &mut DateCache,
  field: &TimeField,
  instant_millis: i64,
  elapsed_millis: i64,
) {
  let mut timestamp = instant_millis;
  if !field.uses_begin {
    timestamp += elapsed_millis;
  }
  match &field.style {
    TimeStyle::Clf => out.push_str(dates.clf_format(timestamp)),
    TimeStyle::EpochSecs => out.push_str(&(timestamp / 1000).to_string()),
    TimeStyle::EpochMillis => out.push_str(&timestamp.to_string()),
    TimeStyle::MillisFrac => push_millis_frac(out, timestamp.rem_euclid(1000)),
    TimeStyle::Custom {
      format,
      locale,
      uses_millis,
      needs_escaping,
    } => {
      let cached = dates.custom_format(format, *locale, timestamp);
      if !*uses_millis && !*needs_escaping {
        out.push_str(cached);
        return;
      }
      let value = if *uses_millis {
        let mut frac = String::with_capacity(4);
        push_millis_frac(&mut frac, timestamp.rem_euclid(1000));
        cached.replace(MSEC_MARKER, &frac)
      } else {
        cached.to_string()
      };
      if *needs_escaping {
        escape_and_append(&value, out);
      } else {
        out.push_str(&value);
      }
    },
  }
}

fn push_millis_frac(out: &mut String, frac: i64) {
  if frac < 100 {
    out.push('0');
    if frac < 10 {
      out.push('0');
    }
  }
  out.push_str(&frac.to_string());
}

fn render_joined(out: &mut String, values: Vec<&str>) {
  let mut iter = values.into_iter();
  match iter.next() {
    Some(first) => {
      escape_and_append(first, out);
      for value in iter {
        out.push(',');
        escape_and_append(value, out);
      }
    },
    None => out.push('-'),
  }
}

fn render_attribute(out: &mut String, value: Option<AttributeValue>) {
  match value {
    Some(AttributeValue::Text(text)) => escape_and_append(&text, out),
    Some(AttributeValue::Number(n)) => out.push_str(&n.to_string()),
    None => out.push('-'),
  }
}

/// Appends `input` to `out`, escaping the way httpd's `mod_log_config` does:
/// `"` and `\` get a backslash, common control characters get their C-style
/// notation, and every other control or non-ASCII character becomes a
/// `\uXXXX` sequence. An empty value renders as `-`.
pub fn escape_and_append(input: &str, out: &mut String) {
  if input.is_empty() {
    out.push('-');
    return;
  }

  for c in input.chars() {
    match c {
      '\\' => out.push_str("\\\\"),
      '"' => out.push_str("\\\""),
      '\x0c' => out.push_str("\\f"),
      '\n' => out.push_str("\\n"),
      '\r' => out.push_str("\\r"),
      '\t' => out.push_str("\\t"),
      c if (' '..='\x7e').contains(&c) => out.push(c),
      c => {
        out.push_str("\\u");
        let code = c as u32;
        out.push_str(&format!("{:04x}", code));
      },
    }
  }
}
