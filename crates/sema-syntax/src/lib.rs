//! Declaration-level AST for the sema binder.
//!
//! This crate provides:
//! - `NodeArena` / `NodeIndex` - arena storage for an immutable syntax tree
//! - `SyntaxKind` / `ModifierFlags` - the node-kind taxonomy and source modifiers
//! - `parse_source_file` - a reader for the declaration subset, used to build
//!   trees from source text in tests and tools

pub mod arena;
pub mod node;
pub mod parser;
pub mod scanner;

pub use arena::NodeArena;
pub use node::{
    CatchData, ClassData, EnumData, EnumMemberData, ExportAssignmentData, FunctionData,
    IdentifierData, ImportData, InterfaceData, ModifierFlags, ModuleData, Node, NodeData,
    NodeIndex, NodeList, SourceFileData, SyntaxKind, TryData, TypeParameterData,
    TypeReferenceData, VariableData, WithData,
};
pub use parser::{ParseResult, is_declaration_file_name, parse_source_file};
