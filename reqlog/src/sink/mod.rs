//! # Log Sinks
//!
//! Where finished lines go. The engine hands a sink one complete,
//! newline-free line per request; the sink appends its own separator and
//! performs any I/O. Rotation and file naming are the host's business.

mod __test__;

use std::io::Write;

/// Destination for rendered log lines.
pub trait LogSink {
  /// Writes one complete line. The line carries no trailing newline.
  fn write_line(&mut self, line: &str);
}

/// Sink over any `io::Write`, appending `\n` after each line.
///
/// Write errors are reported through `tracing` and swallowed: logging must
/// never take down the request path it is observing.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
  inner: W,
}

impl<W: Write> WriterSink<W> {
  pub fn new(inner: W) -> Self {
    Self { inner }
  }

  pub fn into_inner(self) -> W {
    self.inner
  }
}

impl<W: Write> LogSink for WriterSink<W> {
  fn write_line(&mut self, line: &str) {
    if let Err(e) = self
      .inner
      .write_all(line.as_bytes())
      .and_then(|_| self.inner.write_all(b"\n"))
    {
      tracing::error!(error = %e, "failed to write access log line");
    }
  }
}

/// In-memory sink collecting lines, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySink {
  pub lines: Vec<String>,
}

impl MemorySink {
  pub fn new() -> Self {
    Self::default()
  }
}

impl LogSink for MemorySink {
  fn write_line(&mut self, line: &str) {
    self.lines.push(line.to_string());
  }
}
