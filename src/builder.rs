//! Fault builder: turn a message and parameter bundle into a fault
//!
//! A `RaiseSpec` describes everything needed to raise: the message template
//! and its format arguments, the kind to build, the construction arguments,
//! and optionally a custom builder for kinds whose construction does not
//! follow the default "message first" convention.

use crate::error::{BuzzError, ConstructionError, Result};
use crate::fault::Fault;
use crate::kind::{FaultKind, FAULT};
use crate::message::prepare_message;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Custom construction function
pub type Builder =
    Arc<dyn Fn(&BuildParams<'_>) -> std::result::Result<Fault, ConstructionError> + Send + Sync>;

/// Arguments for a kind's default construction convention
#[derive(Debug, Clone, Copy)]
pub struct InitParams<'a> {
    /// Formatted message, passed first
    pub message: &'a str,

    /// Positional arguments following the message
    pub init_args: &'a [Value],

    /// Named arguments
    pub init_kwargs: &'a Map<String, Value>,

    /// Base message from `handle_errors` or `check_expressions`
    pub base_message: Option<&'a str>,
}

/// Parameter object handed to a custom `Builder`
#[derive(Debug, Clone, Copy)]
pub struct BuildParams<'a> {
    /// The kind the caller asked for
    pub fault_kind: &'static FaultKind,

    /// Formatted message
    pub message: &'a str,

    pub init_args: &'a [Value],

    pub init_kwargs: &'a Map<String, Value>,

    /// The message template before formatting
    pub raw_message_template: &'a str,

    /// Base message from `handle_errors` or `check_expressions`
    pub base_message: Option<&'a str>,
}

impl<'a> BuildParams<'a> {
    /// View these parameters as default-convention arguments
    pub fn init_params(&self) -> InitParams<'a> {
        InitParams {
            message: self.message,
            init_args: self.init_args,
            init_kwargs: self.init_kwargs,
            base_message: self.base_message,
        }
    }
}

/// Everything needed to raise one fault
pub struct RaiseSpec<'h> {
    message_template: String,
    format_args: Vec<Value>,
    format_kwargs: Map<String, Value>,
    fault_kind: &'static FaultKind,
    init_args: Vec<Value>,
    init_kwargs: Map<String, Value>,
    builder: Option<Builder>,
    base_message: Option<String>,
    do_except: Option<Box<dyn FnOnce(&Fault) + Send + 'h>>,
    do_else: Option<Box<dyn FnOnce() + Send + 'h>>,
}

impl<'h> RaiseSpec<'h> {
    /// Create a spec raising `FAULT` with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message_template: message.into(),
            format_args: Vec::new(),
            format_kwargs: Map::new(),
            fault_kind: &FAULT,
            init_args: Vec::new(),
            init_kwargs: Map::new(),
            builder: None,
            base_message: None,
            do_except: None,
            do_else: None,
        }
    }

    /// Replace the message template
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message_template = message.into();
        self
    }

    /// Kind of fault to raise
    pub fn kind(mut self, kind: &'static FaultKind) -> Self {
        self.fault_kind = kind;
        self
    }

    /// Add a positional template argument
    pub fn format_arg(mut self, value: impl Into<Value>) -> Self {
        self.format_args.push(value.into());
        self
    }

    /// Add a named template argument
    pub fn format_kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.format_kwargs.insert(name.into(), value.into());
        self
    }

    /// Add a positional construction argument
    pub fn init_arg(mut self, value: impl Into<Value>) -> Self {
        self.init_args.push(value.into());
        self
    }

    pub fn init_args(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.init_args.extend(values);
        self
    }

    /// Add a named construction argument
    pub fn init_kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.init_kwargs.insert(name.into(), value.into());
        self
    }

    pub fn init_kwargs(mut self, values: Map<String, Value>) -> Self {
        self.init_kwargs.extend(values);
        self
    }

    /// Construct faults with `builder` instead of the kind's own convention
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

    pub fn shared_builder(mut self, builder: Option<Builder>) -> Self {
        self.builder = builder;
        self
    }

    pub fn base_message(mut self, base_message: impl Into<String>) -> Self {
        self.base_message = Some(base_message.into());
        self
    }

    /// Called with the fault just before it is raised
    pub fn do_except(mut self, hook: impl FnOnce(&Fault) + Send + 'h) -> Self {
        self.do_except = Some(Box::new(hook));
        self
    }

    /// Called when the check passes
    pub fn do_else(mut self, hook: impl FnOnce() + Send + 'h) -> Self {
        self.do_else = Some(Box::new(hook));
        self
    }

    pub fn message_template(&self) -> &str {
        &self.message_template
    }

    pub fn fault_kind(&self) -> &'static FaultKind {
        self.fault_kind
    }

    /// Format the message and build the fault, chaining `cause` if given
    pub fn build(&self, cause: Option<Fault>) -> Result<Fault> {
        let message = prepare_message(
            &self.message_template,
            &self.format_args,
            &self.format_kwargs,
        )?;
        self.build_with_message(&message, cause)
    }

    /// Build from an already formatted message
    pub fn build_with_message(&self, message: &str, cause: Option<Fault>) -> Result<Fault> {
        let params = BuildParams {
            fault_kind: self.fault_kind,
            message,
            init_args: &self.init_args,
            init_kwargs: &self.init_kwargs,
            raw_message_template: &self.message_template,
            base_message: self.base_message.as_deref(),
        };

        let fault = match &self.builder {
            Some(builder) => builder(&params)?,
            None => self.fault_kind.construct(&params.init_params())?,
        };

        Ok(match cause {
            Some(cause) => fault.with_cause(cause),
            None => fault,
        })
    }

    /// Build the fault, run `do_except`, and return it ready to raise
    pub(crate) fn into_error(mut self) -> BuzzError {
        match self.build(None) {
            Ok(fault) => {
                tracing::trace!(
                    kind = fault.kind_name(),
                    message = %fault.message(),
                    "Raising fault"
                );
                if let Some(hook) = self.do_except.take() {
                    hook(&fault);
                }
                BuzzError::Fault(fault)
            }
            Err(err) => err,
        }
    }

    /// Run `do_else` for a passing check
    pub(crate) fn pass(mut self) {
        if let Some(hook) = self.do_else.take() {
            hook();
        }
    }
}

impl fmt::Debug for RaiseSpec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaiseSpec")
            .field("message_template", &self.message_template)
            .field("format_args", &self.format_args)
            .field("format_kwargs", &self.format_kwargs)
            .field("fault_kind", &self.fault_kind.name())
            .field("init_args", &self.init_args)
            .field("init_kwargs", &self.init_kwargs)
            .field("builder", &self.builder.is_some())
            .field("base_message", &self.base_message)
            .finish_non_exhaustive()
    }
}
