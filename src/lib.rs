//! # a3s-buzz
//!
//! Structured fault handling for the A3S ecosystem.
//!
//! ## Overview
//!
//! `a3s-buzz` gives every failure a kind from a declared hierarchy, a
//! rendered message, construction arguments, and an optional cause chain.
//! On top of that it offers one-line condition gates, a scoped handler that
//! re-raises selected faults with added context, and an accumulator that
//! reports every failed check at once.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_buzz::{handle_errors, FaultKind, FAULT};
//!
//! static CONFIG_ERROR: FaultKind = FaultKind::new("ConfigError", &FAULT);
//!
//! fn load_port(raw: Option<&str>) -> a3s_buzz::Result<u16> {
//!     let raw = CONFIG_ERROR.enforce_defined(raw, "port is missing")?;
//!     CONFIG_ERROR.require_condition(!raw.is_empty(), "port is empty")?;
//!     Ok(raw.parse().unwrap_or(8080))
//! }
//!
//! let result = handle_errors("while reading config").run(|| load_port(None));
//! let err = result.unwrap_err();
//! assert_eq!(err.to_string(), "while reading config -- ConfigError: port is missing");
//! assert!(err.as_fault().unwrap().cause().unwrap().is_kind_of(&CONFIG_ERROR));
//! ```
//!
//! ## Components
//!
//! - **FaultKind / Fault**: kind hierarchy and the fault value itself
//! - **RaiseSpec**: message template, kind, arguments, builder, and hooks
//! - **gates**: `require_condition`, `enforce_defined`, `ensure_type`
//! - **HandleErrors**: scoped handling for sync, async, and cancellable work
//! - **CheckExpressions**: accumulate checks, raise one report

pub mod builder;
pub mod checker;
pub mod error;
pub mod fault;
pub mod gate;
pub mod handler;
pub mod kind;
pub mod message;
pub mod trace;
pub mod truthy;

// Re-export core types
pub use builder::{BuildParams, Builder, InitParams, RaiseSpec};
pub use error::{BuzzError, ConstructionError, Result};
pub use fault::{Fault, FaultReport};
pub use kind::{Construction, Constructor, FaultKind, CANCELLED, FAULT, IO_ERROR, PANIC, RUNTIME_ERROR};

// Re-export operations
pub use checker::{check_expressions, CheckEntry, CheckExpressions, ExpressionChecker};
pub use gate::{enforce_defined, ensure_type, require_condition, UNDEFINED_MESSAGE};
pub use handler::{
    handle_errors, reformat_fault, DoExceptParams, HandleErrors, HandleState, RaiseKind,
    CANCELLED_MESSAGE,
};
pub use message::{prepare_message, render, sanitize};
pub use trace::capture_trace;
pub use truthy::Truthy;
