#[cfg(test)]
mod tests {
  use crate::sink::{LogSink, MemorySink, WriterSink};
  use std::io::Read;

  #[test]
  fn test_writer_sink_appends_newline() {
    let mut sink = WriterSink::new(Vec::new());
    sink.write_line("first");
    sink.write_line("second");
    assert_eq!(sink.into_inner(), b"first\nsecond\n");
  }

  #[test]
  fn test_writer_sink_to_file() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut sink = WriterSink::new(file.reopen().unwrap());
    sink.write_line("203.0.113.5 - - [x] \"GET / HTTP/1.1\" 200 12");

    let mut contents = String::new();
    file.reopen().unwrap().read_to_string(&mut contents).unwrap();
    assert_eq!(contents, "203.0.113.5 - - [x] \"GET / HTTP/1.1\" 200 12\n");
  }

  #[test]
  fn test_memory_sink_collects_lines() {
    let mut sink = MemorySink::new();
    sink.write_line("a");
    sink.write_line("b");
    assert_eq!(sink.lines, vec!["a", "b"]);
  }
}
