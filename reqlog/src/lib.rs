//! # reqlog
//!
//! A pattern-driven access log line rendering engine.
//!
//! A printf-like pattern string compiles once into a sequence of field
//! elements; at request completion the engine renders the sequence against
//! the finished request/response and hands one complete line to a sink.
//! Timestamp formatting goes through a two-tier per-second cache and line
//! buffers are pooled, so logging stays off the request path's critical
//! cost profile.
//!
//! ```rust
//! use reqlog::config::EngineConfig;
//! use reqlog::engine::RenderEngine;
//! use reqlog::view::{RequestRecord, ResponseRecord, ResponseView};
//!
//! let config = EngineConfig::default(); // pattern "common"
//! let (engine, pattern, _condition) = RenderEngine::from_config(&config);
//! let mut ctx = engine.context();
//!
//! let request = RequestRecord {
//!   remote_host: Some("203.0.113.5".to_string()),
//!   method: Some("GET".to_string()),
//!   request_uri: Some("/index.html".to_string()),
//!   protocol: Some("HTTP/1.1".to_string()),
//!   ..Default::default()
//! };
//! let response = ResponseRecord {
//!   status: 200,
//!   bytes_written: 512,
//!   ..Default::default()
//! };
//!
//! let line = engine.render_line(
//!   &pattern,
//!   &mut ctx,
//!   1_692_105_600_000,
//!   &request,
//!   Some(&response as &dyn ResponseView),
//!   3,
//! );
//! assert!(line.as_str().ends_with("\"GET /index.html HTTP/1.1\" 200 512"));
//! ```

pub mod buffer_pool;
pub mod config;
pub mod date_cache;
pub mod element;
pub mod engine;
pub mod pattern;
pub mod sink;
pub mod view;
