//! Stage chain and instrumentation points.
//!
//! # Responsibilities
//! - Define the `Stage` trait observed middleware implements and the `Next`
//!   continuation that nests the chain
//! - Wrap inner stages with labeled instrumentation points driving the
//!   per-request logging service
//! - Build and dispatch the assembled pipeline
//!
//! # Design Decisions
//! - Stages receive `&mut Exchange` plus `Next`, the shape of an axum
//!   middleware function, so the exchange survives error returns and the
//!   post-hook can run on every exit path
//! - The per-request `LoggingService` rides in the exchange extensions

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::config::LoggerConfig;
use crate::exchange::Exchange;
use crate::observability::{LogSink, TracingSink};

use super::service::LoggingService;
use super::{PipelineError, StageResult};

/// Names of the stages on either side of an instrumentation point, used to
/// label its log entries.
#[derive(Debug, Clone)]
pub struct StageDescription {
    pub before: String,
    pub after: String,
}

impl StageDescription {
    pub fn new(before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
        }
    }
}

/// One middleware stage of the observed chain.
pub trait Stage: Send + Sync {
    fn handle<'a>(&'a self, exchange: &'a mut Exchange, next: Next<'a>) -> BoxFuture<'a, StageResult>;
}

/// The remainder of the chain after the current stage.
pub struct Next<'a> {
    chain: &'a [Arc<dyn Stage>],
}

impl<'a> Next<'a> {
    /// Invoke the rest of the chain. A stage that never calls this
    /// short-circuits everything nested inside it.
    pub async fn run(self, exchange: &mut Exchange) -> StageResult {
        match self.chain.split_first() {
            Some((stage, rest)) => stage.handle(exchange, Next { chain: rest }).await,
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.chain.len())
            .finish()
    }
}

/// Adapter turning a middleware function into a [`Stage`].
pub struct FromFn<F>(F);

impl<F> Stage for FromFn<F>
where
    F: for<'a> Fn(&'a mut Exchange, Next<'a>) -> BoxFuture<'a, StageResult> + Send + Sync,
{
    fn handle<'a>(&'a self, exchange: &'a mut Exchange, next: Next<'a>) -> BoxFuture<'a, StageResult> {
        (self.0)(exchange, next)
    }
}

/// Use a plain middleware function as a stage.
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: for<'a> Fn(&'a mut Exchange, Next<'a>) -> BoxFuture<'a, StageResult> + Send + Sync,
{
    FromFn(f)
}

/// The insertion point: brackets everything nested inside it with the
/// logging service's pre- and post-hooks.
struct InstrumentationPoint {
    description: StageDescription,
}

impl Stage for InstrumentationPoint {
    fn handle<'a>(&'a self, exchange: &'a mut Exchange, next: Next<'a>) -> BoxFuture<'a, StageResult> {
        Box::pin(async move {
            let service = exchange
                .extensions()
                .get::<Arc<LoggingService>>()
                .cloned()
                .ok_or(PipelineError::MissingService)?;

            service.on_pre_invoke(&self.description, exchange).await?;
            let outcome = next.run(exchange).await;
            // Bookkeeping runs on every exit path; a stage error still wins.
            let bookkeeping = service.on_post_invoke(&self.description, exchange).await;
            match outcome {
                Err(err) => Err(err),
                Ok(()) => bookkeeping.map_err(Into::into),
            }
        })
    }
}

/// Assembles the observed chain with instrumentation points interleaved.
pub struct PipelineBuilder {
    config: LoggerConfig,
    sink: Arc<dyn LogSink>,
    chain: Vec<Arc<dyn Stage>>,
}

impl PipelineBuilder {
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            config,
            sink: Arc::new(TracingSink),
            chain: Vec::new(),
        }
    }

    /// Replace the log sink (tests inject a collecting sink here).
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Append an observed stage to the chain.
    pub fn stage<S>(mut self, stage: S) -> Self
    where
        S: Stage + 'static,
    {
        self.chain.push(Arc::new(stage));
        self
    }

    /// Insert an instrumentation point between the named neighboring stages.
    pub fn observe_between(
        mut self,
        before: impl Into<String>,
        after: impl Into<String>,
    ) -> Self {
        self.chain.push(Arc::new(InstrumentationPoint {
            description: StageDescription::new(before, after),
        }));
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            config: Arc::new(self.config),
            sink: self.sink,
            chain: self.chain.into(),
        }
    }
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("server_name", &self.config.server_name)
            .field("stages", &self.chain.len())
            .finish()
    }
}

/// The assembled chain. Dispatch one exchange through it per request.
pub struct Pipeline {
    config: Arc<LoggerConfig>,
    sink: Arc<dyn LogSink>,
    chain: Arc<[Arc<dyn Stage>]>,
}

impl Pipeline {
    /// Run the exchange through the chain, creating the per-request logging
    /// service and attaching it to the exchange extensions.
    pub async fn dispatch(&self, exchange: &mut Exchange) -> StageResult {
        let service = Arc::new(LoggingService::new(&self.config, self.sink.clone()));
        exchange.extensions_mut().insert(service);
        Next { chain: &self.chain[..] }.run(exchange).await
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("server_name", &self.config.server_name)
            .field("stages", &self.chain.len())
            .finish()
    }
}
