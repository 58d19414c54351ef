//! Expression accumulator: collect many checks, raise one report
//!
//! ```rust
//! use a3s_buzz::check_expressions;
//!
//! let (a, b) = (1, 2);
//! let err = check_expressions("Something wasn't right")
//!     .run(|check| {
//!         check.check(a > b, "a must be greater than b");
//!         check.check(a != 1, "a must not equal 1");
//!         check.check(b >= 0, None);
//!     })
//!     .unwrap_err();
//!
//! assert_eq!(
//!     err.to_string(),
//!     "Something wasn't right\n  1: a must be greater than b\n  2: a must not equal 1"
//! );
//! ```
//!
//! Like the handler, a checker belongs to one logical operation and is not
//! synchronized.

use crate::builder::{BuildParams, RaiseSpec};
use crate::error::{ConstructionError, Result};
use crate::fault::Fault;
use crate::kind::FaultKind;
use crate::truthy::Truthy;
use serde::Serialize;
use serde_json::{Map, Value};

/// One recorded check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckEntry {
    /// 1-based position in call order
    pub index: usize,

    pub description: String,

    pub passed: bool,
}

/// Ordered record of the checks made in one scope
#[derive(Debug, Clone, Default)]
pub struct ExpressionChecker {
    main_message: String,
    entries: Vec<CheckEntry>,
}

impl ExpressionChecker {
    pub fn new(main_message: impl Into<String>) -> Self {
        Self {
            main_message: main_message.into(),
            entries: Vec::new(),
        }
    }

    /// Record the truthiness of `value`, returning it
    ///
    /// Without a description the entry reads `"<index> expression failed"`.
    pub fn check<'d>(&mut self, value: impl Truthy, description: impl Into<Option<&'d str>>) -> bool {
        let index = self.entries.len() + 1;
        let passed = value.is_truthy();
        let description = match description.into() {
            Some(text) => text.to_string(),
            None => format!("{} expression failed", index),
        };
        self.entries.push(CheckEntry {
            index,
            description,
            passed,
        });
        passed
    }

    pub fn main_message(&self) -> &str {
        &self.main_message
    }

    /// All entries in call order
    pub fn entries(&self) -> &[CheckEntry] {
        &self.entries
    }

    /// Failing entries in call order
    pub fn failures(&self) -> impl Iterator<Item = &CheckEntry> {
        self.entries.iter().filter(|e| !e.passed)
    }

    /// True when nothing was checked or every check passed
    pub fn is_satisfied(&self) -> bool {
        self.entries.iter().all(|e| e.passed)
    }

    /// The failure report, or `None` when satisfied
    pub fn report(&self) -> Option<String> {
        if self.is_satisfied() {
            return None;
        }
        let mut report = self.main_message.clone();
        for entry in self.failures() {
            report.push_str(&format!("\n  {}: {}", entry.index, entry.description));
        }
        Some(report)
    }

    /// Close the scope, raising `FAULT` if any check failed
    pub fn finish(self) -> Result<()> {
        CheckExpressions::new(self.main_message.clone()).finish(self)
    }
}

/// Configuration of one accumulator scope
pub struct CheckExpressions<'h> {
    main_message: String,
    spec: RaiseSpec<'h>,
}

/// Start configuring an accumulator scope with `main_message`
pub fn check_expressions<'h>(main_message: impl Into<String>) -> CheckExpressions<'h> {
    CheckExpressions::new(main_message)
}

impl<'h> CheckExpressions<'h> {
    pub fn new(main_message: impl Into<String>) -> Self {
        let main_message = main_message.into();
        let spec = RaiseSpec::default().base_message(main_message.as_str());
        Self { main_message, spec }
    }

    /// Kind of the aggregate fault
    pub fn kind(mut self, kind: &'static FaultKind) -> Self {
        self.spec = self.spec.kind(kind);
        self
    }

    pub fn init_arg(mut self, value: impl Into<Value>) -> Self {
        self.spec = self.spec.init_arg(value);
        self
    }

    pub fn init_kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.spec = self.spec.init_kwarg(name, value);
        self
    }

    pub fn init_kwargs(mut self, values: Map<String, Value>) -> Self {
        self.spec = self.spec.init_kwargs(values);
        self
    }

    pub fn builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(&BuildParams<'_>) -> std::result::Result<Fault, ConstructionError>
            + Send
            + Sync
            + 'static,
    {
        self.spec = self.spec.builder(builder);
        self
    }

    /// Called with the aggregate fault before it is raised
    pub fn do_except(mut self, hook: impl FnOnce(&Fault) + Send + 'h) -> Self {
        self.spec = self.spec.do_except(hook);
        self
    }

    /// Called when the scope closes with nothing failed
    pub fn do_else(mut self, hook: impl FnOnce() + Send + 'h) -> Self {
        self.spec = self.spec.do_else(hook);
        self
    }

    /// Run `body` with a fresh checker, then close the scope
    pub fn run<T>(self, body: impl FnOnce(&mut ExpressionChecker) -> T) -> Result<T> {
        let mut checker = ExpressionChecker::new(self.main_message.as_str());
        let value = body(&mut checker);
        self.finish(checker)?;
        Ok(value)
    }

    /// Like `run`, for bodies that can fail themselves
    ///
    /// A failing body propagates its own error and the recorded checks are
    /// discarded.
    pub fn try_run<T>(self, body: impl FnOnce(&mut ExpressionChecker) -> Result<T>) -> Result<T> {
        let mut checker = ExpressionChecker::new(self.main_message.as_str());
        let value = body(&mut checker)?;
        self.finish(checker)?;
        Ok(value)
    }

    /// Close the scope for a checker filled elsewhere
    pub fn finish(self, checker: ExpressionChecker) -> Result<()> {
        match checker.report() {
            None => self.spec.require_condition(true),
            Some(report) => {
                tracing::debug!(
                    main_message = %self.main_message,
                    checked = checker.entries().len(),
                    failed = checker.failures().count(),
                    "Checked expressions failed"
                );
                self.spec.message(report).require_condition(false)
            }
        }
    }
}

impl FaultKind {
    /// `check_expressions` raising this kind
    pub fn check_expressions<'h>(&'static self, main_message: impl Into<String>) -> CheckExpressions<'h> {
        CheckExpressions::new(main_message).kind(self)
    }
}
