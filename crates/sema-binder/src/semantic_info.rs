//! Per-unit semantic index.

use crate::ids::{DeclId, SymbolId, UnitId};
use rustc_hash::FxHashMap;
use sema_common::Diagnostic;
use sema_syntax::{NodeArena, NodeIndex};
use smallvec::SmallVec;
use std::cell::OnceCell;
use std::ops::Range;
use std::sync::Arc;

/// Everything the chain knows about one compilation unit.
///
/// The AST is shared and never mutated. AST↔Decl maps are filled by the
/// collector and live as long as the unit; AST↔Symbol maps and diagnostics
/// belong to the current binding generation and are cleared by `update()`.
#[derive(Debug)]
pub struct SemanticInfo {
    pub unit: UnitId,
    pub file_name: String,
    pub arena: Arc<NodeArena>,
    pub root_node: NodeIndex,
    /// The `Script` decl (or the `Global` decl for the global unit).
    pub top_level_decl: DeclId,
    pub is_declaration_file: bool,
    pub is_external_module: bool,
    /// Ids of the decls produced by the current collection of this unit.
    pub(crate) decl_range: Range<u32>,
    pub(crate) ast_decl_map: FxHashMap<NodeIndex, DeclId>,
    pub(crate) decl_ast_map: FxHashMap<DeclId, NodeIndex>,
    pub(crate) ast_symbol_map: FxHashMap<NodeIndex, SymbolId>,
    pub(crate) symbol_ast_map: FxHashMap<SymbolId, NodeIndex>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub syntax_diagnostics: Vec<Diagnostic>,
    import_decls: OnceCell<FxHashMap<String, SmallVec<[DeclId; 1]>>>,
}

impl SemanticInfo {
    pub(crate) fn new(
        unit: UnitId,
        file_name: String,
        arena: Arc<NodeArena>,
        root_node: NodeIndex,
        syntax_diagnostics: Vec<Diagnostic>,
    ) -> Self {
        SemanticInfo {
            unit,
            file_name,
            arena,
            root_node,
            top_level_decl: DeclId::NONE,
            is_declaration_file: false,
            is_external_module: false,
            decl_range: 0..0,
            ast_decl_map: FxHashMap::default(),
            decl_ast_map: FxHashMap::default(),
            ast_symbol_map: FxHashMap::default(),
            symbol_ast_map: FxHashMap::default(),
            diagnostics: Vec::new(),
            syntax_diagnostics,
            import_decls: OnceCell::new(),
        }
    }

    pub(crate) fn map_decl(&mut self, node: NodeIndex, decl: DeclId) {
        if node.is_none() {
            return;
        }
        debug_assert!(
            !self.ast_decl_map.contains_key(&node),
            "node {node:?} already maps to a decl"
        );
        self.ast_decl_map.insert(node, decl);
        self.decl_ast_map.insert(decl, node);
    }

    pub(crate) fn map_symbol(&mut self, node: NodeIndex, symbol: SymbolId) {
        if node.is_none() || symbol.is_none() {
            return;
        }
        self.ast_symbol_map.insert(node, symbol);
        self.symbol_ast_map.entry(symbol).or_insert(node);
    }

    pub fn decl_for_ast(&self, node: NodeIndex) -> Option<DeclId> {
        self.ast_decl_map.get(&node).copied()
    }

    pub fn ast_for_decl(&self, decl: DeclId) -> Option<NodeIndex> {
        self.decl_ast_map.get(&decl).copied()
    }

    pub fn symbol_for_ast(&self, node: NodeIndex) -> Option<SymbolId> {
        self.ast_symbol_map.get(&node).copied()
    }

    pub fn ast_for_symbol(&self, symbol: SymbolId) -> Option<NodeIndex> {
        self.symbol_ast_map.get(&symbol).copied()
    }

    /// Binder diagnostics of the current generation.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub(crate) fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Drop everything derived from binding.
    pub(crate) fn clear_binding(&mut self) {
        self.ast_symbol_map.clear();
        self.symbol_ast_map.clear();
        self.diagnostics.clear();
    }

    /// Import decls by name, built on first use from `collect`.
    pub(crate) fn import_index(
        &self,
        collect: impl FnOnce() -> FxHashMap<String, SmallVec<[DeclId; 1]>>,
    ) -> &FxHashMap<String, SmallVec<[DeclId; 1]>> {
        self.import_decls.get_or_init(collect)
    }
}
