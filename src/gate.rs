//! Condition gates: raise a fault when a check fails
//!
//! The free functions raise `FAULT`. For any other kind, construction
//! arguments, a custom builder, or hooks, start from a `RaiseSpec`:
//!
//! ```rust
//! use a3s_buzz::{FaultKind, RaiseSpec, FAULT};
//!
//! static QUOTA: FaultKind = FaultKind::new("QuotaExceeded", &FAULT);
//!
//! fn reserve(used: u32, limit: u32) -> a3s_buzz::Result<()> {
//!     RaiseSpec::new("used {} of {} slots")
//!         .format_arg(used)
//!         .format_arg(limit)
//!         .kind(&QUOTA)
//!         .require_condition(used < limit)
//! }
//!
//! let err = reserve(5, 5).unwrap_err();
//! assert!(err.is_kind_of(&QUOTA));
//! assert_eq!(err.to_string(), "used 5 of 5 slots");
//! ```

use crate::builder::RaiseSpec;
use crate::error::Result;
use crate::kind::FaultKind;
use crate::truthy::Truthy;
use std::any::{type_name, Any};

/// Message used by `enforce_defined` when none is given
pub const UNDEFINED_MESSAGE: &str = "Value was not defined (None)";

fn type_mismatch_message<T>() -> String {
    format!("Value was not of type {}", type_name::<T>())
}

/// Raise `FAULT` with `message` unless `condition` is truthy
pub fn require_condition(condition: impl Truthy, message: impl Into<String>) -> Result<()> {
    RaiseSpec::new(message).require_condition(condition)
}

/// Return the value inside `value`, raising `FAULT` if it is `None`
pub fn enforce_defined<'m, T>(value: Option<T>, message: impl Into<Option<&'m str>>) -> Result<T> {
    RaiseSpec::new(message.into().unwrap_or(UNDEFINED_MESSAGE)).enforce_defined(value)
}

/// Narrow `value` to `T`, raising `FAULT` if it holds another type
pub fn ensure_type<'v, 'm, T: Any>(
    value: &'v dyn Any,
    message: impl Into<Option<&'m str>>,
) -> Result<&'v T> {
    let spec = match message.into() {
        Some(message) => RaiseSpec::new(message),
        None => RaiseSpec::new(type_mismatch_message::<T>()),
    };
    spec.ensure_type(value)
}

impl<'h> RaiseSpec<'h> {
    /// Raise unless `condition` is truthy
    pub fn require_condition(self, condition: impl Truthy) -> Result<()> {
        if condition.is_truthy() {
            self.pass();
            Ok(())
        } else {
            Err(self.into_error())
        }
    }

    /// Unwrap `value`, raising if it is `None`
    pub fn enforce_defined<T>(self, value: Option<T>) -> Result<T> {
        match value {
            Some(value) => {
                self.pass();
                Ok(value)
            }
            None => Err(self.or_message(UNDEFINED_MESSAGE).into_error()),
        }
    }

    /// Downcast `value` to `T`, raising on mismatch
    ///
    /// Concrete Rust types have no subtype relation, so the check is exact
    /// type identity.
    pub fn ensure_type<T: Any>(self, value: &dyn Any) -> Result<&T> {
        match value.downcast_ref::<T>() {
            Some(narrowed) => {
                self.pass();
                Ok(narrowed)
            }
            None => Err(self.or_message(&type_mismatch_message::<T>()).into_error()),
        }
    }

    /// Owned variant of `ensure_type`
    pub fn ensure_type_boxed<T: Any>(self, value: Box<dyn Any>) -> Result<T> {
        match value.downcast::<T>() {
            Ok(narrowed) => {
                self.pass();
                Ok(*narrowed)
            }
            Err(_) => Err(self.or_message(&type_mismatch_message::<T>()).into_error()),
        }
    }

    fn or_message(self, message: &str) -> Self {
        if self.message_template().is_empty() {
            self.message(message)
        } else {
            self
        }
    }
}

impl Default for RaiseSpec<'_> {
    /// No message yet; gates fill in their default text
    fn default() -> Self {
        RaiseSpec::new(String::new())
    }
}

impl FaultKind {
    /// `require_condition` raising this kind
    pub fn require_condition(
        &'static self,
        condition: impl Truthy,
        message: impl Into<String>,
    ) -> Result<()> {
        RaiseSpec::new(message).kind(self).require_condition(condition)
    }

    /// `enforce_defined` raising this kind
    pub fn enforce_defined<'m, T>(
        &'static self,
        value: Option<T>,
        message: impl Into<Option<&'m str>>,
    ) -> Result<T> {
        RaiseSpec::new(message.into().unwrap_or(UNDEFINED_MESSAGE))
            .kind(self)
            .enforce_defined(value)
    }

    /// `ensure_type` raising this kind
    pub fn ensure_type<'v, 'm, T: Any>(
        &'static self,
        value: &'v dyn Any,
        message: impl Into<Option<&'m str>>,
    ) -> Result<&'v T> {
        let spec = match message.into() {
            Some(message) => RaiseSpec::new(message),
            None => RaiseSpec::new(type_mismatch_message::<T>()),
        };
        spec.kind(self).ensure_type(value)
    }
}
