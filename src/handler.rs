//! Scoped fault handler: classify, report, and re-package faults
//!
//! `handle_errors` wraps a block of operations. When the block raises a
//! fault the handler decides, by kind, whether to leave it alone or to catch
//! it; a caught fault is reported to `do_except` and then either absorbed or
//! re-raised as a new fault of the configured kind, chained to the original.
//!
//! ```rust
//! use a3s_buzz::{handle_errors, require_condition, RUNTIME_ERROR};
//!
//! let err = handle_errors("Loading config failed")
//!     .run(|| require_condition(false, "file was empty"))
//!     .unwrap_err();
//!
//! assert!(err.is_kind_of(&RUNTIME_ERROR));
//! assert_eq!(err.to_string(), "Loading config failed -- Fault: file was empty");
//! ```
//!
//! Each handler is meant to be entered and left by one logical operation.
//! It holds no locks; sharing one across concurrent operations is the
//! caller's responsibility.

use crate::builder::{BuildParams, Builder, RaiseSpec};
use crate::error::{BuzzError, ConstructionError, Result};
use crate::fault::Fault;
use crate::kind::{FaultKind, CANCELLED, FAULT, RUNTIME_ERROR};
use crate::trace::capture_trace;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Message of the fault raised when a cancellation token fires
pub const CANCELLED_MESSAGE: &str = "Operation was cancelled";

/// Parameters passed to the `do_except` hook
#[derive(Debug, Clone, Copy)]
pub struct DoExceptParams<'a> {
    /// The original fault raised in the block
    pub err: &'a Fault,

    /// Base message given to `handle_errors`
    pub base_message: &'a str,

    /// `"<base> -- <kind>: <message>"`, the message of any re-raised fault
    pub final_message: &'a str,

    /// Call chain at the moment the fault was caught
    pub trace: &'a [String],
}

/// States of a guarded region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Entered,
    Executing,
    CompletedOk,
    Caught,
    /// Covered by an ignore kind; propagated unchanged
    Ignored,
    /// Not covered by any handle kind; propagated unchanged
    Unmatched,
    /// Caught and absorbed
    Suppressed,
    /// Caught and replaced by a new fault
    Reraised,
    Exited,
}

/// What to do with a caught fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaiseKind {
    /// Re-raise as a new fault of this kind
    Kind(&'static FaultKind),
    /// Discard the fault; execution continues after the region
    Absorb,
}

impl Default for RaiseKind {
    fn default() -> Self {
        RaiseKind::Kind(&RUNTIME_ERROR)
    }
}

type ExceptHook<'h> = Box<dyn FnOnce(&DoExceptParams<'_>) + Send + 'h>;
type Hook<'h> = Box<dyn FnOnce() + Send + 'h>;

/// Configuration of one guarded region
pub struct HandleErrors<'h> {
    base_message: String,
    handle_kinds: Vec<&'static FaultKind>,
    ignore_kinds: Vec<&'static FaultKind>,
    raise_kind: RaiseKind,
    raise_args: Vec<Value>,
    raise_kwargs: Map<String, Value>,
    builder: Option<Builder>,
    do_except: Option<ExceptHook<'h>>,
    do_else: Option<Hook<'h>>,
    do_finally: Option<Hook<'h>>,
}

/// Start configuring a guarded region with `base_message`
pub fn handle_errors<'h>(base_message: impl Into<String>) -> HandleErrors<'h> {
    HandleErrors::new(base_message)
}

/// Compose the message of a re-packaged fault
pub fn reformat_fault(base_message: &str, fault: &Fault) -> String {
    format!("{} -- {}: {}", base_message, fault.kind_name(), fault.message())
}

impl<'h> HandleErrors<'h> {
    pub fn new(base_message: impl Into<String>) -> Self {
        Self {
            base_message: base_message.into(),
            handle_kinds: Vec::new(),
            ignore_kinds: Vec::new(),
            raise_kind: RaiseKind::default(),
            raise_args: Vec::new(),
            raise_kwargs: Map::new(),
            builder: None,
            do_except: None,
            do_else: None,
            do_finally: None,
        }
    }

    /// Catch faults covered by `kind`
    ///
    /// May be called repeatedly to catch several kinds. Without any call,
    /// every fault is caught.
    pub fn handle(mut self, kind: &'static FaultKind) -> Self {
        self.handle_kinds.push(kind);
        self
    }

    /// Leave faults covered by `kind` untouched, even if a handle kind covers them
    pub fn ignore(mut self, kind: &'static FaultKind) -> Self {
        self.ignore_kinds.push(kind);
        self
    }

    /// Kind of the re-raised fault (default `RUNTIME_ERROR`)
    pub fn raise(mut self, kind: &'static FaultKind) -> Self {
        self.raise_kind = RaiseKind::Kind(kind);
        self
    }

    /// Absorb caught faults instead of re-raising
    pub fn absorb(mut self) -> Self {
        self.raise_kind = RaiseKind::Absorb;
        self
    }

    /// Positional construction argument for the re-raised fault
    pub fn raise_arg(mut self, value: impl Into<Value>) -> Self {
        self.raise_args.push(value.into());
        self
    }

    /// Named construction argument for the re-raised fault
    pub fn raise_kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.raise_kwargs.insert(name.into(), value.into());
        self
    }

    /// Custom builder for the re-raised fault
    pub fn builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(&BuildParams<'_>) -> std::result::Result<Fault, ConstructionError>
            + Send
            + Sync
            + 'static,
    {
        self.builder = Some(Arc::new(builder));
        self
    }

    /// Called once with the original fault when one is caught
    pub fn do_except(mut self, hook: impl FnOnce(&DoExceptParams<'_>) + Send + 'h) -> Self {
        self.do_except = Some(Box::new(hook));
        self
    }

    /// Called when the block completes without a fault
    pub fn do_else(mut self, hook: impl FnOnce() + Send + 'h) -> Self {
        self.do_else = Some(Box::new(hook));
        self
    }

    /// Called exactly once when the region is left, however it is left
    pub fn do_finally(mut self, hook: impl FnOnce() + Send + 'h) -> Self {
        self.do_finally = Some(Box::new(hook));
        self
    }

    pub fn base_message(&self) -> &str {
        &self.base_message
    }

    pub fn raise_kind(&self) -> RaiseKind {
        self.raise_kind
    }

    /// Run `block` inside the guarded region
    ///
    /// Returns `Ok(Some(value))` when the block succeeds, `Ok(None)` when a
    /// fault was caught and absorbed, and `Err` when a fault propagates,
    /// either unchanged or re-packaged.
    pub fn run<T>(mut self, block: impl FnOnce() -> Result<T>) -> Result<Option<T>> {
        let _finally = Finally(self.do_finally.take());
        self.enter();
        let outcome = block();
        self.conclude(outcome)
    }

    /// Asynchronous variant of `run`
    ///
    /// Suspension happens only while awaiting `block`. If the returned
    /// future is dropped before completion, `do_finally` still runs.
    pub async fn run_async<T, Fut>(mut self, block: Fut) -> Result<Option<T>>
    where
        Fut: Future<Output = Result<T>>,
    {
        let _finally = Finally(self.do_finally.take());
        self.enter();
        let outcome = block.await;
        self.conclude(outcome)
    }

    /// Run `block`, treating cancellation of `token` as a `CANCELLED` fault
    ///
    /// The cancellation fault goes through the same classification as any
    /// other fault: it is caught unless an ignore kind or the handle kinds
    /// say otherwise.
    pub async fn run_until_cancelled<T, Fut>(
        self,
        token: &CancellationToken,
        block: Fut,
    ) -> Result<Option<T>>
    where
        Fut: Future<Output = Result<T>>,
    {
        let guarded = async {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    Err(BuzzError::Fault(Fault::new(&CANCELLED, CANCELLED_MESSAGE)))
                }
                outcome = block => outcome,
            }
        };
        self.run_async(guarded).await
    }

    fn enter(&self) {
        tracing::trace!(base_message = %self.base_message, state = ?HandleState::Entered);
        tracing::trace!(base_message = %self.base_message, state = ?HandleState::Executing);
    }

    /// Classify a raised fault; ignore kinds take precedence
    pub fn classify(&self, fault: &Fault) -> HandleState {
        if fault.kind().is_any_kind_of(&self.ignore_kinds) {
            HandleState::Ignored
        } else if self.handle_kinds.is_empty() && fault.is_kind_of(&FAULT) {
            HandleState::Caught
        } else if fault.kind().is_any_kind_of(&self.handle_kinds) {
            HandleState::Caught
        } else {
            HandleState::Unmatched
        }
    }

    fn conclude<T>(mut self, outcome: Result<T>) -> Result<Option<T>> {
        let fault = match outcome {
            Ok(value) => {
                tracing::trace!(base_message = %self.base_message, state = ?HandleState::CompletedOk);
                if let Some(hook) = self.do_else.take() {
                    hook();
                }
                return Ok(Some(value));
            }
            Err(BuzzError::Fault(fault)) => fault,
            Err(other) => return Err(other),
        };

        let state = self.classify(&fault);
        if state != HandleState::Caught {
            tracing::trace!(
                base_message = %self.base_message,
                kind = fault.kind_name(),
                state = ?state,
                "Fault passed through"
            );
            return Err(BuzzError::Fault(fault));
        }

        let final_message = reformat_fault(&self.base_message, &fault);
        tracing::debug!(
            base_message = %self.base_message,
            kind = fault.kind_name(),
            message = %fault.message(),
            "Fault caught"
        );

        if let Some(hook) = self.do_except.take() {
            let trace = capture_trace();
            hook(&DoExceptParams {
                err: &fault,
                base_message: &self.base_message,
                final_message: &final_message,
                trace: &trace,
            });
        }

        match self.raise_kind {
            RaiseKind::Absorb => {
                tracing::debug!(
                    base_message = %self.base_message,
                    state = ?HandleState::Suppressed,
                    "Fault absorbed"
                );
                Ok(None)
            }
            RaiseKind::Kind(kind) => {
                let reraised = RaiseSpec::new(final_message)
                    .kind(kind)
                    .init_args(std::mem::take(&mut self.raise_args))
                    .init_kwargs(std::mem::take(&mut self.raise_kwargs))
                    .shared_builder(self.builder.take())
                    .base_message(self.base_message.as_str())
                    .build(Some(fault))?;
                tracing::debug!(
                    base_message = %self.base_message,
                    kind = reraised.kind_name(),
                    state = ?HandleState::Reraised,
                    "Fault re-raised"
                );
                Err(BuzzError::Fault(reraised))
            }
        }
    }
}

/// Runs `do_finally` when dropped
struct Finally<'h>(Option<Hook<'h>>);

impl Drop for Finally<'_> {
    fn drop(&mut self) {
        tracing::trace!(state = ?HandleState::Exited);
        if let Some(hook) = self.0.take() {
            hook();
        }
    }
}

impl FaultKind {
    /// `handle_errors` re-raising caught faults as this kind
    pub fn handle_errors<'h>(&'static self, base_message: impl Into<String>) -> HandleErrors<'h> {
        HandleErrors::new(base_message).raise(self)
    }
}
