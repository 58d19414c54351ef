//! The fault instance raised by every buzz operation
//!
//! A `Fault` is a kind tag plus a formatted message, the construction
//! arguments it was built with, an optional typed payload, and an optional
//! cause. It is deliberately not `Clone`: chaining moves the original fault
//! into its successor.

use crate::kind::{FaultKind, IO_ERROR};
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error as StdError;
use std::fmt;

/// A raised fault
#[derive(Debug)]
pub struct Fault {
    kind: &'static FaultKind,
    message: String,
    base_message: Option<String>,
    args: Vec<Value>,
    kwargs: Map<String, Value>,
    payload: Option<Box<dyn StdError + Send + Sync>>,
    cause: Option<Box<Fault>>,
}

impl Fault {
    /// Create a fault of `kind` with a message
    pub fn new(kind: &'static FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            base_message: None,
            args: Vec::new(),
            kwargs: Map::new(),
            payload: None,
            cause: None,
        }
    }

    /// Wrap a typed error; the message is taken from its `Display`
    pub fn from_error<E>(kind: &'static FaultKind, err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let mut fault = Self::new(kind, err.to_string());
        fault.payload = Some(Box::new(err));
        fault
    }

    /// Attach a typed payload without touching the message
    pub fn with_payload<E>(mut self, payload: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.payload = Some(Box::new(payload));
        self
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    pub fn with_kwargs(mut self, kwargs: Map<String, Value>) -> Self {
        self.kwargs = kwargs;
        self
    }

    pub fn with_base_message(mut self, base_message: impl Into<String>) -> Self {
        self.base_message = Some(base_message.into());
        self
    }

    /// Record `cause` as the fault this one was raised from
    ///
    /// If a cause is already present, `cause` is appended to the end of the
    /// existing chain instead of replacing it.
    pub fn with_cause(mut self, cause: Fault) -> Self {
        self.push_cause(cause);
        self
    }

    fn push_cause(&mut self, cause: Fault) {
        match self.cause {
            Some(ref mut existing) => existing.push_cause(cause),
            None => self.cause = Some(Box::new(cause)),
        }
    }

    pub fn kind(&self) -> &'static FaultKind {
        self.kind
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Base message supplied by `handle_errors` or `check_expressions`
    pub fn base_message(&self) -> Option<&str> {
        self.base_message.as_deref()
    }

    /// Positional construction arguments (after the message)
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Named construction arguments
    pub fn kwargs(&self) -> &Map<String, Value> {
        &self.kwargs
    }

    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.kwargs.get(name)
    }

    /// The fault this one was raised from, if any
    pub fn cause(&self) -> Option<&Fault> {
        self.cause.as_deref()
    }

    /// Detach and return the cause
    pub fn take_cause(&mut self) -> Option<Fault> {
        self.cause.take().map(|c| *c)
    }

    /// Iterate over the cause chain, nearest first (excluding `self`)
    pub fn causes(&self) -> impl Iterator<Item = &Fault> {
        std::iter::successors(self.cause(), |f| Fault::cause(f))
    }

    /// The deepest fault in the chain (`self` when there is no cause)
    pub fn root_cause(&self) -> &Fault {
        self.causes().last().unwrap_or(self)
    }

    /// Covers-test on this fault's kind
    pub fn is_kind_of(&self, kind: &FaultKind) -> bool {
        self.kind.is_kind_of(kind)
    }

    pub fn payload(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.payload.as_deref()
    }

    /// Borrow the typed payload as `E`
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.payload.as_ref().and_then(|p| p.downcast_ref::<E>())
    }

    /// Serializable snapshot of the fault and its cause chain
    pub fn report(&self) -> FaultReport {
        FaultReport {
            kind: self.kind.name().to_string(),
            ancestry: self.kind.ancestry().into_iter().map(String::from).collect(),
            message: self.message.clone(),
            base_message: self.base_message.clone(),
            args: self.args.clone(),
            kwargs: self.kwargs.clone(),
            cause: self.cause.as_ref().map(|c| Box::new(c.report())),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Fault {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match (&self.cause, &self.payload) {
            (Some(cause), _) => Some(cause.as_ref()),
            (None, Some(payload)) => Some(payload.as_ref()),
            (None, None) => None,
        }
    }
}

impl From<std::io::Error> for Fault {
    fn from(err: std::io::Error) -> Self {
        Fault::from_error(&IO_ERROR, err)
    }
}

/// Serializable view of a `Fault`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultReport {
    /// Kind name
    pub kind: String,

    /// Kind names from the fault's kind up to the root
    pub ancestry: Vec<String>,

    /// Formatted message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_message: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,

    #[serde(skip_serializing_if = "Map::is_empty")]
    pub kwargs: Map<String, Value>,

    /// Report of the cause, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<FaultReport>>,
}
