//! Fault containment for rendering subtrees
//!
//! A [`FaultBoundary`] runs a subtree's render call and intercepts a panic
//! raised *synchronously* inside it. On the first such fault it records one
//! diagnostic entry, switches to the fixed [`FallbackView`] and stays there;
//! only [`FaultBoundary::trigger_recovery`] (a full reload by the host)
//! gets the page back.
//!
//! # Limitations
//!
//! Only the synchronous render call is covered. Panics in spawned tasks,
//! callbacks invoked later, or code outside the wrapped closure are not
//! intercepted and propagate normally. Interception relies on unwinding, so
//! builds with `panic = "abort"` get no protection.

mod fallback;

pub use fallback::{FallbackView, RecoveryAction, ReloadHost};

use serde::Serialize;
use serde_json::json;
use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::logger::DiagnosticLogger;

/// Diagnostic message recorded for every intercepted fault
pub const FAULT_MESSAGE: &str = "FaultBoundary caught an error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Normal,
    Errored,
}

/// The fault raised by a descendant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedFault {
    pub message: String,
}

/// Where the fault was intercepted
#[derive(Debug, Clone, Serialize)]
pub struct FaultInfo {
    pub boundary: String,
    pub backtrace: String,
}

#[derive(Debug, Clone, Default)]
pub struct FaultState {
    pub phase: Phase,
    pub error: Option<CapturedFault>,
    pub info: Option<FaultInfo>,
}

/// Output of one render pass
#[derive(Debug)]
pub enum Rendered<'a, V> {
    Content(V),
    Fallback(&'a FallbackView),
}

impl<V> Rendered<'_, V> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Rendered::Fallback(_))
    }

    pub fn content(self) -> Option<V> {
        match self {
            Rendered::Content(v) => Some(v),
            Rendered::Fallback(_) => None,
        }
    }
}

pub struct FaultBoundary {
    name: String,
    logger: DiagnosticLogger,
    host: Arc<dyn ReloadHost>,
    fallback: FallbackView,
    state: FaultState,
}

impl FaultBoundary {
    pub fn new(name: impl Into<String>, logger: DiagnosticLogger, host: Arc<dyn ReloadHost>) -> Self {
        Self {
            name: name.into(),
            logger,
            host,
            fallback: FallbackView::standard(),
            state: FaultState::default(),
        }
    }

    /// Render the wrapped subtree.
    ///
    /// Once errored, `children` is not invoked again and the fallback is
    /// returned, whatever `children` would now produce.
    pub fn render<V, F>(&mut self, children: F) -> Rendered<'_, V>
    where
        F: FnOnce() -> V,
    {
        if self.state.phase == Phase::Errored {
            return Rendered::Fallback(&self.fallback);
        }

        match panic::catch_unwind(AssertUnwindSafe(children)) {
            Ok(view) => Rendered::Content(view),
            Err(payload) => {
                self.capture(payload.as_ref());
                Rendered::Fallback(&self.fallback)
            }
        }
    }

    fn capture(&mut self, payload: &(dyn Any + Send)) {
        let error = CapturedFault {
            message: panic_payload_to_string(payload),
        };
        let info = FaultInfo {
            boundary: self.name.clone(),
            backtrace: Backtrace::force_capture().to_string(),
        };

        self.logger.error(
            FAULT_MESSAGE,
            Some(json!({
                "boundary": info.boundary,
                "error": error.message,
                "info": info.backtrace,
            })),
        );

        self.state = FaultState {
            phase: Phase::Errored,
            error: Some(error),
            info: Some(info),
        };
    }

    /// The fallback's single action: ask the host for a full reload.
    /// The boundary's own state is untouched.
    pub fn trigger_recovery(&self) {
        tracing::info!(boundary = %self.name, "Reload requested from fallback view");
        self.host.reload();
    }

    pub fn state(&self) -> &FaultState {
        &self.state
    }

    pub fn is_errored(&self) -> bool {
        self.state.phase == Phase::Errored
    }

    pub fn fallback(&self) -> &FallbackView {
        &self.fallback
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn panic_payload_to_string(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
