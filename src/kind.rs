//! Fault kinds: an open hierarchy of fault classifications
//!
//! Kinds are declared as `static` items so they live for the whole program
//! and can be referenced as parents by other kinds:
//!
//! ```rust
//! use a3s_buzz::{FaultKind, FAULT};
//!
//! static STORAGE: FaultKind = FaultKind::new("StorageError", &FAULT);
//! static NOT_FOUND: FaultKind = FaultKind::new("NotFound", &STORAGE);
//!
//! assert!(NOT_FOUND.is_kind_of(&STORAGE));
//! assert!(NOT_FOUND.is_kind_of(&FAULT));
//! assert!(!STORAGE.is_kind_of(&NOT_FOUND));
//! ```
//!
//! Kind identity is the address of the `static`. Two kinds that share a name
//! are still distinct and never cover each other.

use crate::builder::InitParams;
use crate::error::ConstructionError;
use crate::fault::Fault;
use std::fmt;

/// Typed constructor used by `Construction::Custom`
pub type Constructor = fn(&InitParams<'_>) -> std::result::Result<Fault, ConstructionError>;

/// How the default builder convention constructs a kind
#[derive(Clone, Copy)]
pub enum Construction {
    /// Message plus any positional and named arguments
    Generic,
    /// Classification only; building it is a construction error
    Abstract,
    /// A typed constructor that may reject the argument bundle
    Custom(Constructor),
}

impl fmt::Debug for Construction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Construction::Generic => f.write_str("Generic"),
            Construction::Abstract => f.write_str("Abstract"),
            Construction::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// A node in the fault kind hierarchy
pub struct FaultKind {
    name: &'static str,
    parent: Option<&'static FaultKind>,
    construction: Construction,
}

/// The universal kind. Every other kind descends from it.
pub static FAULT: FaultKind = FaultKind {
    name: "Fault",
    parent: None,
    construction: Construction::Generic,
};

/// Generic runtime failure, the default kind raised by `handle_errors`
pub static RUNTIME_ERROR: FaultKind = FaultKind::new("RuntimeError", &FAULT);

/// Converted `std::io::Error`
pub static IO_ERROR: FaultKind = FaultKind::new("IoError", &FAULT);

/// The surrounding task or block was cancelled
pub static CANCELLED: FaultKind = FaultKind::new("Cancelled", &FAULT);

/// A spawned task panicked
pub static PANIC: FaultKind = FaultKind::new("Panic", &FAULT);

impl FaultKind {
    /// Declare a kind derived from `parent` with generic construction
    pub const fn new(name: &'static str, parent: &'static FaultKind) -> Self {
        Self {
            name,
            parent: Some(parent),
            construction: Construction::Generic,
        }
    }

    /// Replace the construction convention
    pub const fn with_construction(mut self, construction: Construction) -> Self {
        self.construction = construction;
        self
    }

    /// Kind name, reported as `kind_name` in handler messages
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Direct parent, `None` only for `FAULT`
    pub fn parent(&self) -> Option<&'static FaultKind> {
        self.parent
    }

    pub fn construction(&self) -> Construction {
        self.construction
    }

    /// Covers-test: true if this kind is `candidate` or derives from it
    pub fn is_kind_of(&self, candidate: &FaultKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if std::ptr::eq(kind, candidate) {
                return true;
            }
            current = kind.parent;
        }
        false
    }

    /// True if any kind in `candidates` covers this kind
    pub fn is_any_kind_of(&self, candidates: &[&FaultKind]) -> bool {
        candidates.iter().any(|c| self.is_kind_of(c))
    }

    /// Names from this kind up to the root, nearest first
    pub fn ancestry(&self) -> Vec<&'static str> {
        let mut names = vec![self.name];
        let mut current = self.parent;
        while let Some(kind) = current {
            names.push(kind.name);
            current = kind.parent;
        }
        names
    }

    /// Build an instance with the default construction convention
    pub fn construct(
        &'static self,
        params: &InitParams<'_>,
    ) -> std::result::Result<Fault, ConstructionError> {
        match self.construction {
            Construction::Generic => {
                let mut fault = Fault::new(self, params.message)
                    .with_args(params.init_args.to_vec())
                    .with_kwargs(params.init_kwargs.clone());
                if let Some(base) = params.base_message {
                    fault = fault.with_base_message(base);
                }
                Ok(fault)
            }
            Construction::Abstract => Err(ConstructionError::new(
                self,
                "kind is abstract and cannot be constructed",
            )),
            Construction::Custom(constructor) => {
                let fault = constructor(params)?;
                if !fault.is_kind_of(self) {
                    return Err(ConstructionError::new(
                        self,
                        format!("constructor produced a fault of kind '{}'", fault.kind_name()),
                    ));
                }
                Ok(fault)
            }
        }
    }
}

impl fmt::Debug for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultKind")
            .field("name", &self.name)
            .field("parent", &self.parent.map(|p| p.name))
            .field("construction", &self.construction)
            .finish()
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl PartialEq for FaultKind {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for FaultKind {}
