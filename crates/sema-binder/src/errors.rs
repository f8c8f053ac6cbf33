//! Invariant violations raised by the collector, binder and chain.
//!
//! User-code problems never surface here; they become diagnostics on the
//! owning unit. A `BinderError` means a caller or an internal contract was
//! broken and the current request cannot produce a meaningful answer.

use crate::decl::DeclKind;
use crate::ids::{DeclId, SymbolId, UnitId};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BinderError {
    #[error("declaration {decl:?} ({kind:?} `{name}`) reached the binder without a parent")]
    OrphanedDecl {
        decl: DeclId,
        kind: DeclKind,
        name: String,
    },

    #[error("declaration {decl:?} of kind {kind:?} cannot be bound here")]
    UnexpectedDeclKind { decl: DeclId, kind: DeclKind },

    #[error("unknown declaration {0:?}")]
    UnknownDecl(DeclId),

    #[error("symbol {0:?} is a read-only reference and cannot be modified")]
    ReadOnlyReference(SymbolId),

    #[error("unknown compilation unit {0:?}")]
    UnknownUnit(UnitId),

    #[error("symbol {0:?} belongs to an earlier chain generation")]
    StaleSymbol(SymbolId),

    #[error("{what} exceeded the depth limit of {limit}")]
    ResolutionDepthExceeded { what: &'static str, limit: u32 },

    #[error("no provisional context is active")]
    NoProvisionalContext,

    #[error("symbol ids are exhausted (generation base {base})")]
    SymbolIdsExhausted { base: u32 },
}

pub type BindResult<T> = Result<T, BinderError>;
