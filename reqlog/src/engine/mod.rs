//! # Render Engine
//!
//! Executes a compiled pattern against a completed request/response and
//! produces one formatted line per request.
//!
//! The engine owns the two process-wide shared resources, the buffer pool
//! and the shared timestamp cache tier. Each worker thread creates one
//! [`RenderContext`] up front and passes it into every render call; the
//! context carries the worker's private timestamp cache tier, parented to
//! the shared one, so the shared lock is only taken on a per-second
//! rollover rather than per request.
//!
//! Rendering is stateless per call and never fails: malformed pattern
//! elements and missing request data degrade to placeholder text inside the
//! line, and nothing propagates out of [`RenderEngine::render_line`].


use std::sync::Arc;

use crate::buffer_pool::{BufferPool, PooledBuffer};
use crate::config::EngineConfig;
use crate::date_cache::{DateCache, SharedDateCache};
use crate::pattern::{compile_with_locale, CompiledPattern};
use crate::sink::LogSink;
use crate::view::{RequestView, ResponseView};

/// Decides whether a completed request should be logged at all.
///
/// Evaluated by the caller before rendering so the engine itself stays free
/// of business rules. `skip_if_present` wins over `require_present` when
/// both match.
#[derive(Debug, Clone, Default)]
pub struct LogCondition {
  /// Skip logging when this request attribute is present.
  pub skip_if_present: Option<String>,
  /// Skip logging unless this request attribute is present.
  pub require_present: Option<String>,
}

impl LogCondition {
  pub fn should_log(&self, request: &dyn RequestView) -> bool {
    if let Some(name) = &self.skip_if_present {
      if request.attribute(name).is_some() {
        return false;
      }
    }
    if let Some(name) = &self.require_present {
      if request.attribute(name).is_none() {
        return false;
      }
    }
    true
  }
}

impl From<&EngineConfig> for LogCondition {
  fn from(config: &EngineConfig) -> Self {
    Self {
      skip_if_present: config.condition_unless.clone(),
      require_present: config.condition_if.clone(),
    }
  }
}

/// Per-worker-thread rendering state.
///
/// Not `Sync`; create one per worker via [`RenderEngine::context`] and
/// thread it through every render call from that worker.
#[derive(Debug)]
pub struct RenderContext {
  dates: DateCache,
}

impl RenderContext {
  /// The worker's private timestamp cache tier.
  pub fn dates_mut(&mut self) -> &mut DateCache {
    &mut self.dates
  }
}

/// The root of the rendering pipeline.
pub struct RenderEngine {
  pool: BufferPool,
  shared_dates: Arc<SharedDateCache>,
  worker_cache_size: usize,
}

impl RenderEngine {
  /// Creates an engine with the given shared resources.
  pub fn new(pool: BufferPool, shared_dates: Arc<SharedDateCache>, worker_cache_size: usize) -> Self {
    Self {
      pool,
      shared_dates,
      worker_cache_size,
    }
  }

  /// Builds an engine from a declarative config. The compiled pattern and
  /// the log condition are produced alongside because reconfiguration
  /// replaces them wholesale while the engine (and its pooled buffers and
  /// shared cache) stays put.
  pub fn from_config(config: &EngineConfig) -> (Self, CompiledPattern, LogCondition) {
    let engine = Self::new(
      BufferPool::new(config.pool_capacity, config.max_buffer_size),
      Arc::new(SharedDateCache::new(config.shared_cache_size)),
      config.worker_cache_size,
    );
    let pattern = compile_with_locale(config.resolved_pattern(), config.locale());
    let condition = LogCondition::from(config);
    (engine, pattern, condition)
  }

  /// Creates the per-worker render context, with its private timestamp
  /// cache parented to the engine's shared tier.
  pub fn context(&self) -> RenderContext {
    RenderContext {
      dates: DateCache::new(self.worker_cache_size, Some(Arc::clone(&self.shared_dates))),
    }
  }

  /// Renders one log line for a completed request.
  ///
  /// `instant_millis` is the request start time; `elapsed_millis` the time
  /// from start to completion. Returns the filled buffer; the caller writes
  /// it to a sink, and dropping the buffer recycles it. Conditional logging
  /// is the caller's responsibility (see [`LogCondition`]), keeping this
  /// path pure.
  pub fn render_line<'a>(
    &'a self,
    pattern: &CompiledPattern,
    ctx: &mut RenderContext,
    instant_millis: i64,
    request: &dyn RequestView,
    response: Option<&dyn ResponseView>,
    elapsed_millis: i64,
  ) -> PooledBuffer<'a> {
    let mut buf = self.pool.acquire();
    for element in pattern.elements() {
      element.render(
        &mut buf,
        ctx.dates_mut(),
        instant_millis,
        request,
        response,
        elapsed_millis,
      );
    }
    buf
  }

  /// Renders one line and writes it to `sink`, recycling the buffer.
  pub fn emit(
    &self,
    pattern: &CompiledPattern,
    ctx: &mut RenderContext,
    sink: &mut dyn LogSink,
    instant_millis: i64,
    request: &dyn RequestView,
    response: Option<&dyn ResponseView>,
    elapsed_millis: i64,
  ) {
    let line = self.render_line(pattern, ctx, instant_millis, request, response, elapsed_millis);
    sink.write_line(line.as_str());
  }

  /// The engine's buffer pool.
  pub fn pool(&self) -> &BufferPool {
    &self.pool
  }

  /// The engine's shared timestamp cache tier.
  pub fn shared_dates(&self) -> &Arc<SharedDateCache> {
    &self.shared_dates
  }
}

impl std::fmt::Debug for RenderEngine {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RenderEngine")
      .field("worker_cache_size", &self.worker_cache_size)
      .field("idle_buffers", &self.pool.idle_len())
      .finish()
  }
}
