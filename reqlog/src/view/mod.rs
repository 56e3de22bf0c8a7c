//! # Request/Response Views
//!
//! The read-only boundary between the rendering engine and its host. The
//! engine consumes completed requests and responses exclusively through these
//! traits and never mutates them.
//!
//! Hosts with their own request types implement [`RequestView`] and
//! [`ResponseView`] directly. [`RequestRecord`] and [`ResponseRecord`] are
//! plain-struct implementations for embedding and for tests.


use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request attribute recording the byte offset where a sendfile transfer
/// started. Used as a fallback when the response byte counter is zero.
pub const SENDFILE_START_ATTRIBUTE: &str = "sendfile.start";

/// Request attribute recording the byte offset where a sendfile transfer
/// ended.
pub const SENDFILE_END_ATTRIBUTE: &str = "sendfile.end";

/// A dynamically typed request or session attribute value.
///
/// Attributes may be set by untrusted applications, so lookups distinguish
/// text from numbers instead of assuming either. The sendfile byte-range
/// fallback only engages when both attributes are [`AttributeValue::Number`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
  /// Free-form text value.
  Text(String),
  /// Integral value, e.g. a byte offset.
  Number(i64),
}

impl AttributeValue {
  /// Returns the numeric value, or `None` for text attributes.
  pub fn as_number(&self) -> Option<i64> {
    match self {
      AttributeValue::Number(n) => Some(*n),
      AttributeValue::Text(_) => None,
    }
  }
}

impl std::fmt::Display for AttributeValue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      AttributeValue::Text(s) => f.write_str(s),
      AttributeValue::Number(n) => write!(f, "{}", n),
    }
  }
}

/// Read-only view of a completed request.
///
/// Every accessor returning `Option` treats `None` as "data not available";
/// the rendering side substitutes the field's fallback literal instead of
/// failing.
pub trait RequestView {
  /// Remote (client) IP address.
  fn remote_addr(&self) -> Option<&str>;

  /// Remote host name, or the address when lookups are disabled.
  fn remote_host(&self) -> Option<&str>;

  /// Local (server) IP address the connection arrived on.
  fn local_addr(&self) -> Option<&str>;

  /// Request protocol, e.g. `HTTP/1.1`.
  fn protocol(&self) -> Option<&str>;

  /// Request method, e.g. `GET`.
  fn method(&self) -> Option<&str>;

  /// Requested URI path, without the query string.
  fn request_uri(&self) -> Option<&str>;

  /// Raw query string without the leading `?`, if any.
  fn query_string(&self) -> Option<&str>;

  /// Server name the request was addressed to.
  fn server_name(&self) -> Option<&str>;

  /// Local port the connection arrived on.
  fn server_port(&self) -> u16;

  /// Remote (client) port.
  fn remote_port(&self) -> u16;

  /// Authenticated remote user, if any.
  fn remote_user(&self) -> Option<&str>;

  /// Session id, if a session exists.
  fn session_id(&self) -> Option<&str>;

  /// Name of the worker thread handling the request.
  fn thread_name(&self) -> Option<&str>;

  /// Request start time in milliseconds since the Unix epoch.
  fn start_time_millis(&self) -> i64;

  /// All values of a request header, in source order. Empty when absent.
  fn header_values(&self, name: &str) -> Vec<&str>;

  /// All values of cookies with the given name, in source order.
  fn cookie_values(&self, name: &str) -> Vec<&str>;

  /// A named request attribute.
  fn attribute(&self, name: &str) -> Option<AttributeValue>;

  /// A named session attribute. `None` when there is no session or no such
  /// attribute.
  fn session_attribute(&self, name: &str) -> Option<AttributeValue>;
}

/// Read-only view of a completed response.
pub trait ResponseView {
  /// HTTP status code.
  fn status(&self) -> u16;

  /// Response body bytes written, excluding headers.
  fn bytes_written(&self) -> i64;

  /// Commit time (first byte written) in milliseconds since the Unix epoch,
  /// or `None` if the response never committed.
  fn commit_time_millis(&self) -> Option<i64>;

  /// All values of a response header, in insertion order. Empty when absent.
  fn header_values(&self, name: &str) -> Vec<&str>;
}

/// Owned, plain-struct [`RequestView`] implementation.
///
/// Hosts that do not want to implement the trait over their own request type
/// can populate one of these per completed request. Also the fixture type
/// used throughout this crate's tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestRecord {
  pub remote_addr: Option<String>,
  pub remote_host: Option<String>,
  pub local_addr: Option<String>,
  pub protocol: Option<String>,
  pub method: Option<String>,
  pub request_uri: Option<String>,
  pub query_string: Option<String>,
  pub server_name: Option<String>,
  pub server_port: u16,
  pub remote_port: u16,
  pub remote_user: Option<String>,
  pub session_id: Option<String>,
  pub thread_name: Option<String>,
  pub start_time_millis: i64,
  /// Header name/value pairs in wire order. Names compare case-insensitively.
  pub headers: Vec<(String, String)>,
  /// Cookie name/value pairs in wire order.
  pub cookies: Vec<(String, String)>,
  pub attributes: HashMap<String, AttributeValue>,
  pub session_attributes: HashMap<String, AttributeValue>,
}

impl RequestView for RequestRecord {
  fn remote_addr(&self) -> Option<&str> {
    self.remote_addr.as_deref()
  }

  fn remote_host(&self) -> Option<&str> {
    self.remote_host.as_deref()
  }

  fn local_addr(&self) -> Option<&str> {
    self.local_addr.as_deref()
  }

  fn protocol(&self) -> Option<&str> {
    self.protocol.as_deref()
  }

  fn method(&self) -> Option<&str> {
    self.method.as_deref()
  }

  fn request_uri(&self) -> Option<&str> {
    self.request_uri.as_deref()
  }

  fn query_string(&self) -> Option<&str> {
    self.query_string.as_deref()
  }

  fn server_name(&self) -> Option<&str> {
    self.server_name.as_deref()
  }

  fn server_port(&self) -> u16 {
    self.server_port
  }

  fn remote_port(&self) -> u16 {
    self.remote_port
  }

  fn remote_user(&self) -> Option<&str> {
    self.remote_user.as_deref()
  }

  fn session_id(&self) -> Option<&str> {
    self.session_id.as_deref()
  }

  fn thread_name(&self) -> Option<&str> {
    self.thread_name.as_deref()
  }

  fn start_time_millis(&self) -> i64 {
    self.start_time_millis
  }

  fn header_values(&self, name: &str) -> Vec<&str> {
    self
      .headers
      .iter()
      .filter(|(n, _)| n.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
      .collect()
  }

  fn cookie_values(&self, name: &str) -> Vec<&str> {
    self
      .cookies
      .iter()
      .filter(|(n, _)| n == name)
      .map(|(_, v)| v.as_str())
      .collect()
  }

  fn attribute(&self, name: &str) -> Option<AttributeValue> {
    self.attributes.get(name).cloned()
  }

  fn session_attribute(&self, name: &str) -> Option<AttributeValue> {
    self.session_attributes.get(name).cloned()
  }
}

/// Owned, plain-struct [`ResponseView`] implementation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseRecord {
  pub status: u16,
  pub bytes_written: i64,
  pub commit_time_millis: Option<i64>,
  /// Header name/value pairs in insertion order.
  pub headers: Vec<(String, String)>,
}

impl ResponseView for ResponseRecord {
  fn status(&self) -> u16 {
    self.status
  }

  fn bytes_written(&self) -> i64 {
    self.bytes_written
  }

  fn commit_time_millis(&self) -> Option<i64> {
    self.commit_time_millis
  }

  fn header_values(&self, name: &str) -> Vec<&str> {
    self
      .headers
      .iter()
      .filter(|(n, _)| n.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
      .collect()
  }
}
