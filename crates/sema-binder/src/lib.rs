//! Declaration collection, symbol binding and generic instantiation.
//!
//! This crate provides:
//! - `DeclCollector` - walks a unit's AST into a scope-shaped `Decl` tree
//! - `Symbol` / `SymbolArena` - the symbol model (values, types, signatures,
//!   accessors, aliases, references)
//! - `SemanticInfoChain` - the cross-unit index that owns every arena and
//!   cache, binds decls on demand and answers lookups
//! - Generic instantiation (`instantiate_type`, `instantiate_signature`) and
//!   generative classification of recursive generic references
//! - Provisional contexts for speculative typing
//!
//! Everything is single-threaded and pull-based: binding happens when a
//! lookup or an instantiation first needs a symbol.

pub mod chain;
pub(crate) mod collector;
pub mod decl;
pub mod errors;
pub mod generative;
pub mod ids;
pub mod provisional;
pub mod recursion;
pub mod semantic_info;
pub mod substitution;
pub mod symbol;

mod binder;
mod binder_containers;
mod binder_signatures;
mod binder_types;
mod binder_values;
mod instantiate;
mod type_resolution;

pub use chain::{DeclSummary, Primitives, SemanticInfoChain};
pub use decl::{Decl, DeclArena, DeclFlags, DeclKind, DeclNamespace};
pub use errors::{BindResult, BinderError};
pub use generative::GenerativeTypeClass;
pub use ids::{DeclId, SymbolId, UnitId};
pub use provisional::ProvisionalOutcome;
pub use semantic_info::SemanticInfo;
pub use substitution::SubstitutionMap;
pub use symbol::{
    AccessorData, AliasData, InstantiationInfo, MemberSpace, MemberTable, ReferenceData,
    ResolutionState, SignatureData, Symbol, SymbolArena, SymbolData, SymbolKind, TypeData,
};

use sema_common::limits;

/// Configuration options for the binder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinderOptions {
    /// Maximum re-entrant `bind_decl` depth before binding fails with
    /// `ResolutionDepthExceeded`.
    pub max_bind_depth: u32,
    /// Maximum nesting of instantiations started from one request.
    pub max_instantiation_depth: u32,
    /// Report merged declarations that mix ambient and non-ambient decls.
    pub report_ambient_mismatch: bool,
}

impl Default for BinderOptions {
    fn default() -> Self {
        BinderOptions {
            max_bind_depth: limits::MAX_BIND_DEPTH,
            max_instantiation_depth: limits::MAX_INSTANTIATION_DEPTH,
            report_ambient_mismatch: true,
        }
    }
}
