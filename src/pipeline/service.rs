//! Per-request logging service: the state machine plus its emitted effects.
//!
//! # Responsibilities
//! - Drive the `Initial → Observing → Observing → …` transitions from the
//!   pre/post hooks of each instrumentation point
//! - Own the request's body capture and the leases the hooks hold on it
//! - Render and emit the banner and per-stage diff entries
//!
//! # Design Decisions
//! - Transitions are total over (state, hook, exchange); a post-hook in
//!   `Initial` is a contract violation surfaced as a fatal error
//! - The log-scope number is taken lazily from a process-wide counter on the
//!   request's first emitted entry

use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::capture::{BodyCapture, CaptureLease};
use crate::config::{LoggerConfig, RenderConfig};
use crate::exchange::Exchange;
use crate::format;
use crate::observability::LogSink;
use crate::snapshot::{self, ExchangeSnapshot, HeaderDifference};

use super::middleware::StageDescription;
use super::state::LoggingState;
use super::PipelineError;

/// Process-wide sequence grouping the log lines of one request. Incremented
/// without ordering guarantees across concurrent requests; readability only.
static SCOPE_SEQ: AtomicU64 = AtomicU64::new(0);

enum Direction {
    Inbound,
    Outbound,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Inbound => f.write_str("Inbound"),
            Direction::Outbound => f.write_str("Outbound"),
        }
    }
}

/// One per request; owns the logging state, the body capture, and the sink.
pub struct LoggingService {
    server_name: String,
    limits: RenderConfig,
    sink: Arc<dyn LogSink>,
    scope: OnceLock<u64>,
    state: tokio::sync::Mutex<LoggingState>,
    capture: BodyCapture,
    leases: Mutex<Vec<CaptureLease>>,
}

impl LoggingService {
    pub fn new(config: &LoggerConfig, sink: Arc<dyn LogSink>) -> Self {
        Self {
            server_name: config.server_name.clone(),
            limits: config.render.clone(),
            sink,
            scope: OnceLock::new(),
            state: tokio::sync::Mutex::new(LoggingState::Initial),
            capture: BodyCapture::new(),
            leases: Mutex::new(Vec::new()),
        }
    }

    /// Called by an instrumentation point before invoking the next handler.
    pub async fn on_pre_invoke(
        &self,
        description: &StageDescription,
        exchange: &mut Exchange,
    ) -> Result<(), PipelineError> {
        let mut state = self.state.lock().await;
        let current = mem::replace(&mut *state, LoggingState::Terminal);
        *state = self.advance_pre(current, description, exchange).await?;
        Ok(())
    }

    /// Called by an instrumentation point after the next handler returns,
    /// on every exit path.
    pub async fn on_post_invoke(
        &self,
        description: &StageDescription,
        exchange: &mut Exchange,
    ) -> Result<(), PipelineError> {
        let mut state = self.state.lock().await;
        let current = mem::replace(&mut *state, LoggingState::Terminal);
        *state = self.advance_post(current, description, exchange).await?;
        Ok(())
    }

    async fn advance_pre(
        &self,
        state: LoggingState,
        description: &StageDescription,
        exchange: &mut Exchange,
    ) -> Result<LoggingState, PipelineError> {
        match state {
            LoggingState::Initial => self.enter_pipeline(exchange).await,
            LoggingState::Observing { snapshot } => {
                self.push_lease(self.capture.acquire(exchange.response_mut()));
                Ok(self.observe(Direction::Inbound, &description.before, snapshot, exchange))
            }
            LoggingState::Terminal => Ok(LoggingState::Terminal),
        }
    }

    async fn advance_post(
        &self,
        state: LoggingState,
        description: &StageDescription,
        exchange: &mut Exchange,
    ) -> Result<LoggingState, PipelineError> {
        match state {
            LoggingState::Initial => Err(PipelineError::HookImbalance),
            LoggingState::Observing { snapshot } => {
                let next =
                    self.observe(Direction::Outbound, &description.after, snapshot, exchange);
                self.release_one(exchange).await?;
                Ok(next)
            }
            LoggingState::Terminal => Ok(LoggingState::Terminal),
        }
    }

    /// First pre-hook of the request: start the capture window, buffer the
    /// inbound body, and emit the incoming-request banner block.
    async fn enter_pipeline(&self, exchange: &mut Exchange) -> Result<LoggingState, PipelineError> {
        self.push_lease(self.capture.acquire(exchange.response_mut()));

        let body = exchange
            .request_mut()
            .body_mut()
            .buffer()
            .await
            .map_err(PipelineError::RequestBody)?;

        let snapshot = snapshot::take(exchange);
        let mut text = String::new();
        text.push_str(&format::banner(&format!(
            "{} {}",
            snapshot.request.method, snapshot.request.path
        )));

        let query = exchange.request().query_pairs();
        if !query.is_empty() {
            text.push_str(&section(
                "Query Parameters",
                &format::pairs_block(&query, &self.limits),
            ));
        }

        text.push_str(&section(
            "Request Headers",
            &format::header_block(&format::header_entries(&snapshot.request.headers), &self.limits),
        ));

        if !snapshot.request.cookies.is_empty() {
            text.push_str(&section(
                "Cookies",
                &format::pairs_block(&snapshot.request.cookies, &self.limits),
            ));
        }

        if !body.is_empty() {
            let content_type = exchange.request().content_type();
            text.push_str(&format!(
                "+++ Request Body +++\n{}\n",
                format::format_body(content_type, &body, &self.limits)
            ));
        }

        if !snapshot.response.headers.is_empty() {
            text.push_str(&section(
                "Response Headers",
                &format::header_block(
                    &format::header_entries(&snapshot.response.headers),
                    &self.limits,
                ),
            ));
        }

        text.push_str(&format!(
            "+++ User +++\n{}",
            format::format_principal(&snapshot.principal, &self.limits)
        ));

        self.output(&text);
        Ok(LoggingState::Observing { snapshot })
    }

    /// Take a fresh snapshot, log the delta against the previous one when
    /// non-empty, and carry the fresh snapshot forward.
    fn observe(
        &self,
        direction: Direction,
        stage: &str,
        previous: ExchangeSnapshot,
        exchange: &Exchange,
    ) -> LoggingState {
        let next = snapshot::take(exchange);
        let difference = snapshot::compare(&previous, &next);
        if !difference.is_empty() {
            let mut text = format!("{direction}: stage {stage} made the following changes:\n");
            text.push_str(&self.diff_block("Request", &difference.request.headers));
            if difference.principal_changed {
                text.push_str(&format!(
                    "+++ Changed User +++\n{}",
                    format::format_principal(&difference.principal, &self.limits)
                ));
            }
            text.push_str(&self.diff_block("Response", &difference.response.headers));
            if let Some(status) = &difference.response.status {
                text.push_str(&format!(
                    "Changed status code from {} to {}\n",
                    status.before.as_u16(),
                    status.after.as_u16()
                ));
            }
            if difference.response.body_length.is_some() {
                text.push_str(&format!(
                    "+++ Wrote to body +++\n{}\n",
                    format::render_response_body(exchange.response(), &self.limits)
                ));
            }
            self.output(&text);
        }
        LoggingState::Observing { snapshot: next }
    }

    fn diff_block(&self, label: &str, difference: &HeaderDifference) -> String {
        let mut out = String::new();
        if !difference.added.is_empty() {
            out.push_str(&format!(
                "=== Added {label} Headers ===\n{}",
                format::header_block(&difference.added, &self.limits)
            ));
        }
        if !difference.removed.is_empty() {
            out.push_str(&format!(
                "=== Removed {label} Headers ===\n{}",
                format::header_block(&difference.removed, &self.limits)
            ));
        }
        for (key, change) in &difference.modified {
            out.push_str(&format!(
                "Changed {label} header {key} from {} to {}\n",
                format::format_value_list(&change.before, &self.limits),
                format::format_value_list(&change.after, &self.limits)
            ));
        }
        out
    }

    fn output(&self, text: &str) {
        let scope = *self
            .scope
            .get_or_init(|| SCOPE_SEQ.fetch_add(1, Ordering::Relaxed));
        self.sink.emit(scope, &self.server_name, text);
    }

    fn leases(&self) -> MutexGuard<'_, Vec<CaptureLease>> {
        self.leases
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push_lease(&self, lease: CaptureLease) {
        self.leases().push(lease);
    }

    async fn release_one(&self, exchange: &mut Exchange) -> Result<(), PipelineError> {
        let lease = self.leases().pop();
        if let Some(lease) = lease {
            self.capture
                .release(lease, exchange.response_mut())
                .await
                .map_err(PipelineError::BodyRestore)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for LoggingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingService")
            .field("server_name", &self.server_name)
            .field("capture", &self.capture)
            .finish()
    }
}

fn section(title: &str, block: &str) -> String {
    format!("*** {title} ***\n{block}")
}
