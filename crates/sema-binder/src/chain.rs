//! The semantic info chain.
//!
//! `SemanticInfoChain` owns every compilation unit, the decl and symbol
//! arenas, the binder context, the provisional stack and all per-generation
//! caches. It is the single entry point consumers talk to:
//!
//! - unit management (`add_unit`, `replace_unit`, `remove_unit`, `update`)
//! - lookups (`find_decls`, `find_symbol`, `find_external_module`, AST maps)
//! - diagnostics (`post_diagnostics`, `diagnostics_for`)
//!
//! Binding lives in the `binder*` modules, instantiation in `instantiate`,
//! all as further `impl SemanticInfoChain` blocks.

use crate::BinderOptions;
use crate::collector::{DeclCollector, quoted_module_name, strip_source_extension};
use crate::decl::{Decl, DeclArena, DeclFlags, DeclInit, DeclKind, DeclNamespace};
use crate::errors::{BindResult, BinderError};
use crate::generative::GenerativeTypeClass;
use crate::ids::{DeclId, SymbolId, UnitId};
use crate::provisional::ProvisionalFrame;
use crate::semantic_info::SemanticInfo;
use crate::symbol::{
    MemberSpace, MemberTable, ResolutionState, Symbol, SymbolArena, SymbolData, SymbolInit,
    SymbolKind, TypeData,
};
use rustc_hash::FxHashMap;
use sema_common::{Diagnostic, Span};
use sema_syntax::{NodeArena, NodeIndex, ParseResult, parse_source_file};
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, trace};

/// Names of the primitive types declared in the global unit.
pub(crate) const PRIMITIVE_NAMES: [&str; 7] =
    ["any", "boolean", "number", "string", "void", "null", "undefined"];

/// Symbols of the primitive types and the chain's error type for the current
/// generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Primitives {
    pub any: SymbolId,
    pub boolean: SymbolId,
    pub number: SymbolId,
    pub string: SymbolId,
    pub void: SymbolId,
    pub null: SymbolId,
    pub undefined: SymbolId,
    pub error: SymbolId,
}

impl Primitives {
    const UNSET: Primitives = Primitives {
        any: SymbolId::NONE,
        boolean: SymbolId::NONE,
        number: SymbolId::NONE,
        string: SymbolId::NONE,
        void: SymbolId::NONE,
        null: SymbolId::NONE,
        undefined: SymbolId::NONE,
        error: SymbolId::NONE,
    };

    /// Primitive named by a predefined-type keyword.
    pub fn by_name(&self, name: &str) -> Option<SymbolId> {
        match name {
            "any" => Some(self.any),
            "boolean" => Some(self.boolean),
            "number" => Some(self.number),
            "string" => Some(self.string),
            "void" => Some(self.void),
            "null" => Some(self.null),
            "undefined" => Some(self.undefined),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, symbol: SymbolId) {
        match name {
            "any" => self.any = symbol,
            "boolean" => self.boolean = symbol,
            "number" => self.number = symbol,
            "string" => self.string = symbol,
            "void" => self.void = symbol,
            "null" => self.null = symbol,
            "undefined" => self.undefined = symbol,
            _ => {}
        }
    }
}

/// Serializable view of a unit's decl tree.
#[derive(Clone, Debug, Serialize)]
pub struct DeclSummary {
    pub kind: DeclKind,
    pub name: String,
    pub flags: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_decl: Option<Box<DeclSummary>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DeclSummary>,
}

// =============================================================================
// Per-generation state
// =============================================================================

/// Caches that only hold for the current binding generation. `update()`
/// replaces the whole value.
#[derive(Debug, Default)]
pub(crate) struct ChainCaches {
    /// (name, space) → first top-level symbol across script units.
    pub top_level_symbols: FxHashMap<(String, MemberSpace), SymbolId>,
    pub decl_paths: FxHashMap<(Vec<String>, DeclNamespace), Vec<DeclId>>,
    pub symbol_paths: FxHashMap<(Vec<String>, DeclNamespace), SymbolId>,
    /// Normalised module name → dynamic module symbol.
    pub external_modules: FxHashMap<String, SymbolId>,
    pub generative: FxHashMap<(SymbolId, SymbolId), GenerativeTypeClass>,
    /// (literal parent of the first decl, name) → distinct variable symbols.
    pub variable_groups: FxHashMap<(DeclId, String), SmallVec<[SymbolId; 2]>>,
    /// Parameters and locals of function-like decls.
    pub function_locals: FxHashMap<DeclId, MemberTable>,
    /// Enum symbol → the decl whose first member omits its initializer.
    pub enum_omitted_initializer: FxHashMap<SymbolId, DeclId>,
    /// Target symbol → reference view.
    pub references: FxHashMap<SymbolId, SymbolId>,
    /// Element type → array type.
    pub arrays: FxHashMap<SymbolId, SymbolId>,
}

/// Re-entrancy counters of the binder. Reset with every generation.
#[derive(Debug, Default)]
pub(crate) struct BindContext {
    pub depth: u32,
    pub instantiation_depth: u32,
    pub alias_depth: u32,
}

/// The cross-unit semantic index.
pub struct SemanticInfoChain {
    pub(crate) units: Vec<Option<SemanticInfo>>,
    /// User units in compile order. The global unit is implicit and first.
    pub(crate) order: Vec<UnitId>,
    pub(crate) decls: DeclArena,
    pub(crate) symbols: SymbolArena,
    pub(crate) options: BinderOptions,
    pub(crate) context: BindContext,
    pub(crate) provisional: Vec<ProvisionalFrame>,
    pub(crate) caches: ChainCaches,
    pub(crate) primitives: Primitives,
    primitive_decls: Vec<DeclId>,
    /// First decl id of each unit's previous tree. One replaced tree is kept
    /// so its decls can still be matched against the current one.
    retired_decls: FxHashMap<UnitId, u32>,
    generation: u32,
}

impl Default for SemanticInfoChain {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticInfoChain {
    pub fn new() -> Self {
        Self::with_options(BinderOptions::default())
    }

    pub fn with_options(options: BinderOptions) -> Self {
        let mut chain = SemanticInfoChain {
            units: Vec::new(),
            order: Vec::new(),
            decls: DeclArena::new(),
            symbols: SymbolArena::new(),
            options,
            context: BindContext::default(),
            provisional: Vec::new(),
            caches: ChainCaches::default(),
            primitives: Primitives::UNSET,
            primitive_decls: Vec::new(),
            retired_decls: FxHashMap::default(),
            generation: 0,
        };
        chain.create_global_unit();
        // A fresh arena has the whole id space.
        if let Err(error) = chain.update() {
            tracing::error!(%error, "chain created without primitives");
        }
        chain
    }

    fn create_global_unit(&mut self) {
        let mut info = SemanticInfo::new(
            UnitId::GLOBAL,
            "<global>".to_string(),
            Arc::new(NodeArena::new()),
            NodeIndex::NONE,
            Vec::new(),
        );
        let start = self.decls.begin_batch();
        let global = self.decls.alloc(DeclInit {
            kind: DeclKind::Global,
            name: String::new(),
            display_name: String::new(),
            flags: DeclFlags::AMBIENT,
            span: Span::EMPTY,
            unit: UnitId::GLOBAL,
            node: NodeIndex::NONE,
            parent: DeclId::NONE,
        });
        for name in PRIMITIVE_NAMES {
            let decl = self.decls.alloc(DeclInit {
                kind: DeclKind::Primitive,
                name: name.to_string(),
                display_name: name.to_string(),
                flags: DeclFlags::AMBIENT,
                span: Span::EMPTY,
                unit: UnitId::GLOBAL,
                node: NodeIndex::NONE,
                parent: global,
            });
            self.primitive_decls.push(decl);
        }
        info.top_level_decl = global;
        info.decl_range = start..self.decls.next_id();
        self.units.push(Some(info));
    }

    // =========================================================================
    // Units
    // =========================================================================

    /// Add a parsed unit at the end of the compile order and collect it.
    pub fn add_unit(&mut self, file_name: &str, parse: ParseResult) -> BindResult<UnitId> {
        let unit = UnitId(self.units.len() as u32);
        let info = SemanticInfo::new(
            unit,
            file_name.to_string(),
            Arc::new(parse.arena),
            parse.root,
            parse.diagnostics,
        );
        self.units.push(Some(info));
        self.order.push(unit);
        self.collect(unit)?;
        self.update()?;
        Ok(unit)
    }

    /// Parse `text` with the fixture parser and add it.
    pub fn add_source(&mut self, file_name: &str, text: &str) -> BindResult<UnitId> {
        self.add_unit(file_name, parse_source_file(file_name, text))
    }

    /// Swap a unit's tree for a new parse. Its decls are re-collected under
    /// fresh ids and the chain moves to a new generation. Decls of the tree
    /// replaced before this one are released.
    pub fn replace_unit(&mut self, unit: UnitId, parse: ParseResult) -> BindResult<()> {
        let previous = self.unit(unit).ok_or(BinderError::UnknownUnit(unit))?;
        let (file_name, decl_range) = (previous.file_name.clone(), previous.decl_range.clone());
        if unit.is_global() {
            return Err(BinderError::UnknownUnit(unit));
        }
        let mut info = SemanticInfo::new(unit, file_name, Arc::new(parse.arena), parse.root, parse.diagnostics);
        info.decl_range = decl_range;
        self.units[unit.0 as usize] = Some(info);
        self.collect(unit)?;
        self.update()
    }

    pub fn replace_source(&mut self, unit: UnitId, text: &str) -> BindResult<()> {
        let file_name = self.unit(unit).ok_or(BinderError::UnknownUnit(unit))?.file_name.clone();
        self.replace_unit(unit, parse_source_file(&file_name, text))
    }

    pub fn remove_unit(&mut self, unit: UnitId) -> BindResult<()> {
        if unit.is_global() || self.unit(unit).is_none() {
            return Err(BinderError::UnknownUnit(unit));
        }
        if let Some(info) = self.units[unit.0 as usize].take() {
            let mut released = self.decls.release(info.decl_range.start);
            if let Some(start) = self.retired_decls.remove(&unit) {
                released += self.decls.release(start);
            }
            trace!(unit = unit.0, released, "released removed unit decls");
        }
        self.order.retain(|&u| u != unit);
        self.update()
    }

    /// Run the declaration collector over `unit` and return its `Script` decl.
    /// A tree collected earlier for the unit is retired.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn collect(&mut self, unit: UnitId) -> BindResult<DeclId> {
        let info = self
            .units
            .get_mut(unit.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(BinderError::UnknownUnit(unit))?;
        let arena = Arc::clone(&info.arena);
        let previous = std::mem::take(&mut info.decl_range);
        let start = self.decls.begin_batch();
        let script = DeclCollector::new(&mut self.decls, info, &arena).collect();
        info.decl_range = start..self.decls.next_id();
        debug!(unit = unit.0, decls = info.decl_range.len(), "collected declarations");
        if !previous.is_empty() {
            self.retire_decls(unit, previous.start);
        }
        Ok(script)
    }

    /// Keep the tree starting at `start` as the unit's previous tree and
    /// release the one it displaces.
    fn retire_decls(&mut self, unit: UnitId, start: u32) {
        if let Some(displaced) = self.retired_decls.insert(unit, start) {
            let released = self.decls.release(displaced);
            trace!(unit = unit.0, released, live = self.decls.len(), "released retired decls");
        }
    }

    /// Start a new binding generation.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn update(&mut self) -> BindResult<()> {
        self.invalidate()?;
        debug!(generation = self.generation, units = self.order.len(), "chain updated");
        Ok(())
    }

    /// Strip every binding result: decl bound state, AST↔Symbol maps,
    /// diagnostics, symbols and caches. Primitives are recreated so the chain
    /// stays usable; that fails only once symbol ids are exhausted.
    pub fn invalidate(&mut self) -> BindResult<()> {
        for decl in self.decls.iter_mut() {
            decl.clear_binding();
        }
        for info in self.units.iter_mut().flatten() {
            info.clear_binding();
        }
        self.symbols.reset();
        self.caches = ChainCaches::default();
        self.context = BindContext::default();
        self.provisional.clear();
        self.generation += 1;
        self.bind_primitives()
    }

    fn bind_primitives(&mut self) -> BindResult<()> {
        let mut primitives = Primitives::UNSET;
        let error = self
            .symbols
            .alloc(SymbolInit::new("error", SymbolKind::Error, SymbolData::Type(Box::default())).synthesized())?;
        if let Some(symbol) = self.symbols.get_mut(error) {
            symbol.resolution = ResolutionState::Resolved;
        }
        primitives.error = error;

        for &decl in &self.primitive_decls {
            let Some(name) = self.decls.get(decl).map(|d| d.name.clone()) else {
                continue;
            };
            let symbol = self
                .symbols
                .alloc(SymbolInit::new(name.clone(), SymbolKind::Primitive, SymbolData::Type(Box::default())))?;
            if let Some(s) = self.symbols.get_mut(symbol) {
                s.resolution = ResolutionState::Resolved;
                s.declarations.push(decl);
            }
            if let Some(d) = self.decls.get_mut(decl) {
                d.bound = true;
                d.symbol = symbol;
            }
            primitives.set(&name, symbol);
        }
        if let Some(global) = self.unit(UnitId::GLOBAL).map(|u| u.top_level_decl)
            && let Some(d) = self.decls.get_mut(global)
        {
            d.bound = true;
        }
        self.primitives = primitives;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn options(&self) -> &BinderOptions {
        &self.options
    }

    /// Incremented by every `update()`.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn decls(&self) -> &DeclArena {
        &self.decls
    }

    pub fn decl(&self, id: DeclId) -> Option<&Decl> {
        self.decls.get(id)
    }

    pub(crate) fn decl_or_err(&self, id: DeclId) -> BindResult<&Decl> {
        self.decls.get(id).ok_or(BinderError::UnknownDecl(id))
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    /// Like [`symbol`](Self::symbol), but tells stale ids apart from unknown
    /// ones.
    pub fn try_symbol(&self, id: SymbolId) -> BindResult<&Symbol> {
        if self.symbols.is_stale(id) {
            return Err(BinderError::StaleSymbol(id));
        }
        self.symbols.get(id).ok_or(BinderError::StaleSymbol(id))
    }

    pub(crate) fn symbol_mut(&mut self, id: SymbolId) -> BindResult<&mut Symbol> {
        if self.symbols.is_stale(id) {
            return Err(BinderError::StaleSymbol(id));
        }
        self.symbols.get_mut(id).ok_or(BinderError::StaleSymbol(id))
    }

    pub(crate) fn symbol_kind(&self, id: SymbolId) -> Option<SymbolKind> {
        self.symbols.get(id).map(|s| s.kind)
    }

    pub(crate) fn type_data(&self, id: SymbolId) -> Option<&TypeData> {
        self.symbols.get(id).and_then(Symbol::type_data)
    }

    pub(crate) fn type_data_mut(&mut self, id: SymbolId) -> Option<&mut TypeData> {
        self.symbols.get_mut(id).and_then(Symbol::type_data_mut)
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn unit(&self, id: UnitId) -> Option<&SemanticInfo> {
        self.units.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Option<&mut SemanticInfo> {
        self.units.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    /// User units in compile order.
    pub fn units(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.order.iter().copied()
    }

    pub fn primitives(&self) -> Primitives {
        self.primitives
    }

    pub fn any_type(&self) -> SymbolId {
        self.primitives.any
    }

    pub fn error_type(&self) -> SymbolId {
        self.primitives.error
    }

    /// True when `id` belongs to the current collection of a live unit.
    pub fn is_valid_decl(&self, id: DeclId) -> bool {
        let Some(decl) = self.decls.get(id) else {
            return false;
        };
        self.unit(decl.unit)
            .is_some_and(|info| info.decl_range.contains(&id.0))
    }

    pub(crate) fn check_valid_decl(&self, id: DeclId) -> BindResult<()> {
        let decl = self.decl_or_err(id)?;
        let Some(info) = self.unit(decl.unit) else {
            return Err(BinderError::UnknownUnit(decl.unit));
        };
        if !info.decl_range.contains(&id.0) {
            return Err(BinderError::UnknownDecl(id));
        }
        Ok(())
    }

    /// Generic symbol an instantiated view was derived from (`id` itself for
    /// roots).
    pub fn root_of(&self, id: SymbolId) -> SymbolId {
        let mut current = id;
        while let Some(symbol) = self.symbols.get(current) {
            if symbol.root.is_none() {
                return current;
            }
            current = symbol.root;
        }
        id
    }

    /// Declarations of a symbol, looked up through its root.
    pub fn declarations_of(&self, id: SymbolId) -> &[DeclId] {
        self.symbols
            .get(self.root_of(id))
            .map_or(&[], |s| s.own_declarations())
    }

    /// Position of a unit in compile order; the global unit comes first.
    pub(crate) fn unit_position(&self, unit: UnitId) -> usize {
        if unit.is_global() {
            return 0;
        }
        self.order
            .iter()
            .position(|&u| u == unit)
            .map_or(usize::MAX, |p| p + 1)
    }

    /// Total order of decls across units: compile order, then source order.
    /// Synthesized value decls sort right after their owner.
    pub(crate) fn order_key(&self, id: DeclId) -> (usize, u32, u32) {
        let Some(decl) = self.decls.get(id) else {
            return (usize::MAX, u32::MAX, u32::MAX);
        };
        let (anchor, synthesized) = if decl.is_synthesized && decl.value_decl.is_some() {
            (decl.value_decl.0, 1)
        } else {
            (id.0, 0)
        };
        (self.unit_position(decl.unit), anchor, synthesized)
    }

    pub(crate) fn file_name_of(&self, unit: UnitId) -> String {
        self.unit(unit).map(|u| u.file_name.clone()).unwrap_or_default()
    }

    // =========================================================================
    // Decl navigation
    // =========================================================================

    /// Children of `parent` named `name` in `namespace`, in order. The value
    /// namespace also yields the synthesized value decls of same-named types
    /// and containers.
    pub(crate) fn named_children(&self, parent: DeclId, name: &str, namespace: DeclNamespace) -> SmallVec<[DeclId; 4]> {
        let Some(decl) = self.decls.get(parent) else {
            return SmallVec::new();
        };
        let mut out: SmallVec<[DeclId; 4]> = decl.children_named(name, namespace).iter().copied().collect();
        if namespace == DeclNamespace::Value {
            let owners = decl
                .children_named(name, DeclNamespace::Type)
                .iter()
                .chain(decl.children_named(name, DeclNamespace::Container));
            for &owner in owners {
                let Some(value) = self.decls.get(owner).map(|d| d.value_decl) else {
                    continue;
                };
                if self.decls.get(value).is_some_and(|v| v.is_synthesized) {
                    out.push(value);
                }
            }
            out.sort_by_key(|&d| self.order_key(d));
        }
        out
    }

    pub(crate) fn top_level_decl_of(&self, unit: UnitId) -> DeclId {
        self.unit(unit).map_or(DeclId::NONE, |u| u.top_level_decl)
    }

    /// Decls reachable through `path` from the top level of every user unit.
    /// Intermediate segments are looked up as containers.
    pub fn find_decls(&mut self, path: &[&str], namespace: DeclNamespace) -> Vec<DeclId> {
        let key = (path.iter().map(|s| s.to_string()).collect::<Vec<_>>(), namespace);
        if let Some(found) = self.caches.decl_paths.get(&key) {
            return found.clone();
        }
        let Some((last, prefix)) = path.split_last() else {
            return Vec::new();
        };
        let mut found = Vec::new();
        for &unit in &self.order {
            let mut scopes: SmallVec<[DeclId; 4]> = SmallVec::new();
            scopes.push(self.top_level_decl_of(unit));
            for segment in prefix {
                scopes = scopes
                    .iter()
                    .flat_map(|&scope| self.named_children(scope, segment, DeclNamespace::Container))
                    .collect();
            }
            for scope in scopes {
                found.extend(self.named_children(scope, last, namespace));
            }
        }
        if !found.is_empty() {
            self.caches.decl_paths.insert(key, found.clone());
        }
        found
    }

    /// Symbol of the first decl `path` names, binding it on demand.
    pub fn find_symbol(&mut self, path: &[&str], namespace: DeclNamespace) -> BindResult<SymbolId> {
        let key = (path.iter().map(|s| s.to_string()).collect::<Vec<_>>(), namespace);
        if let Some(&symbol) = self.caches.symbol_paths.get(&key) {
            return Ok(symbol);
        }
        let Some(&first) = self.find_decls(path, namespace).first() else {
            return Ok(SymbolId::NONE);
        };
        let symbol = self.bind_decl(first)?;
        if symbol.is_some() {
            self.caches.symbol_paths.insert(key, symbol);
        }
        Ok(symbol)
    }

    /// Map a decl from an earlier collection of its unit onto the current
    /// tree by replaying its ancestors' names, kinds and ordinals.
    pub fn find_matching_valid_decl(&self, invalid: DeclId) -> Option<DeclId> {
        if self.is_valid_decl(invalid) {
            return Some(invalid);
        }
        let decl = self.decls.get(invalid)?;
        let (start, want_value) = if decl.is_synthesized {
            (decl.value_decl, true)
        } else {
            (invalid, false)
        };

        // (name, kind, ordinal) from the decl up to (excluding) its script.
        let mut steps = Vec::new();
        let mut current = start;
        loop {
            let d = self.decls.get(current)?;
            if matches!(d.kind, DeclKind::Script | DeclKind::Global) {
                break;
            }
            let parent = self.decls.get(d.parent)?;
            let ordinal = parent
                .children
                .iter()
                .filter_map(|&c| self.decls.get(c))
                .filter(|c| c.kind == d.kind && c.name == d.name)
                .position(|c| c.id == current)?;
            steps.push((d.name.clone(), d.kind, ordinal));
            current = d.parent;
        }

        let mut found = self.unit(decl.unit)?.top_level_decl;
        for (name, kind, ordinal) in steps.iter().rev() {
            let parent = self.decls.get(found)?;
            found = parent
                .children
                .iter()
                .copied()
                .filter(|&c| self.decls.get(c).is_some_and(|c| c.kind == *kind && &c.name == name))
                .nth(*ordinal)?;
        }
        if want_value {
            let value = self.decls.get(found)?.value_decl;
            return value.is_some().then_some(value);
        }
        Some(found)
    }

    /// `import` decls of `unit` named `name`.
    pub fn import_decls(&self, unit: UnitId, name: &str) -> Vec<DeclId> {
        let Some(info) = self.unit(unit) else {
            return Vec::new();
        };
        let decls = &self.decls;
        let root = info.top_level_decl;
        let index = info.import_index(|| {
            let mut map: FxHashMap<String, SmallVec<[DeclId; 1]>> = FxHashMap::default();
            for id in decls.descendants(root) {
                if let Some(decl) = decls.get(id)
                    && decl.kind == DeclKind::TypeAlias
                {
                    map.entry(decl.name.clone()).or_default().push(id);
                }
            }
            map
        });
        index.get(name).map(|v| v.to_vec()).unwrap_or_default()
    }

    /// Dynamic module symbol for `name`: an ambient `declare module "name"`
    /// first, then the unit `name.ts`, then `name.d.ts`. `NONE` when nothing
    /// matches.
    pub fn find_external_module(&mut self, name: &str) -> BindResult<SymbolId> {
        let key = name.strip_prefix("./").unwrap_or(name).to_string();
        if let Some(&symbol) = self.caches.external_modules.get(&key) {
            return Ok(symbol);
        }
        let quoted = quoted_module_name(&key);
        let mut found = DeclId::NONE;

        'ambient: for &unit in &self.order {
            let script = self.top_level_decl_of(unit);
            for &decl in self.named_children(script, &quoted, DeclNamespace::Container).iter() {
                if self
                    .decls
                    .get(decl)
                    .is_some_and(|d| d.kind == DeclKind::DynamicModule && d.node.is_some())
                {
                    found = decl;
                    break 'ambient;
                }
            }
        }

        if found.is_none() {
            'files: for extension in [".ts", ".d.ts"] {
                let file_name = format!("{key}{extension}");
                for &unit in &self.order {
                    let Some(info) = self.unit(unit) else { continue };
                    if info.file_name != file_name || !info.is_external_module {
                        continue;
                    }
                    let module_name = quoted_module_name(strip_source_extension(&info.file_name));
                    if let Some(&decl) = self
                        .named_children(info.top_level_decl, &module_name, DeclNamespace::Container)
                        .first()
                    {
                        found = decl;
                        break 'files;
                    }
                }
            }
        }

        if found.is_none() {
            trace!(module = %key, "external module not found");
            return Ok(SymbolId::NONE);
        }
        let symbol = self.bind_decl(found)?;
        if symbol.is_some() {
            self.caches.external_modules.insert(key, symbol);
        }
        Ok(symbol)
    }

    // =========================================================================
    // AST maps
    // =========================================================================

    pub fn get_decl_for_ast(&self, unit: UnitId, node: NodeIndex) -> Option<DeclId> {
        self.unit(unit)?.decl_for_ast(node)
    }

    pub fn get_ast_for_decl(&self, decl: DeclId) -> Option<NodeIndex> {
        let unit = self.decls.get(decl)?.unit;
        self.unit(unit)?.ast_for_decl(decl)
    }

    /// Symbol bound for an AST node, binding its decl on demand.
    pub fn get_symbol_for_ast(&mut self, unit: UnitId, node: NodeIndex) -> BindResult<SymbolId> {
        let info = self.unit(unit).ok_or(BinderError::UnknownUnit(unit))?;
        if let Some(symbol) = info.symbol_for_ast(node) {
            return Ok(symbol);
        }
        let Some(decl) = info.decl_for_ast(node) else {
            return Ok(SymbolId::NONE);
        };
        self.bind_decl(decl)?;
        Ok(self
            .unit(unit)
            .and_then(|info| info.symbol_for_ast(node))
            .unwrap_or(SymbolId::NONE))
    }

    /// First AST node the symbol was bound from, with its unit.
    pub fn get_ast_for_symbol(&self, symbol: SymbolId) -> Option<(UnitId, NodeIndex)> {
        let root = self.root_of(symbol);
        self.declarations_of(root).iter().find_map(|&decl| {
            let unit = self.decls.get(decl)?.unit;
            let node = self.unit(unit)?.ast_for_symbol(root)?;
            Some((unit, node))
        })
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Record a diagnostic at `decl`'s span.
    pub(crate) fn report(&mut self, decl: DeclId, code: u32, args: &[&str]) {
        self.report_related(decl, code, args, DeclId::NONE);
    }

    /// Like [`report`](Self::report), pointing back at `related` when it is a
    /// real decl.
    pub(crate) fn report_related(&mut self, decl: DeclId, code: u32, args: &[&str], related: DeclId) {
        let Some(d) = self.decls.get(decl) else {
            return;
        };
        let (unit, span) = (d.unit, d.span);
        let mut diagnostic = Diagnostic::from_code(self.file_name_of(unit), span.start, span.len(), code, args);
        if let Some(r) = self.decls.get(related) {
            let message = format!("'{}' was also declared here.", r.display_name);
            diagnostic = diagnostic.with_related(self.file_name_of(r.unit), r.span.start, r.span.len(), message);
        }
        trace!(code, decl = decl.0, "binder diagnostic");
        self.add_diagnostic(unit, diagnostic);
    }

    /// Diagnostics go to the innermost provisional frame when one is active.
    pub(crate) fn add_diagnostic(&mut self, unit: UnitId, diagnostic: Diagnostic) {
        if let Some(frame) = self.provisional.last_mut() {
            frame.diagnostics.push((unit, diagnostic));
            frame.had_provisional_errors = true;
            return;
        }
        if let Some(info) = self.unit_mut(unit) {
            info.add_diagnostic(diagnostic);
        }
    }

    /// Syntax and binder diagnostics of every user unit, in compile order.
    pub fn post_diagnostics(&self) -> Vec<Diagnostic> {
        self.order
            .iter()
            .filter_map(|&unit| self.unit(unit))
            .flat_map(|info| info.syntax_diagnostics.iter().chain(info.diagnostics()))
            .cloned()
            .collect()
    }

    /// Binder diagnostics of one unit.
    pub fn diagnostics_for(&self, unit: UnitId) -> &[Diagnostic] {
        self.unit(unit).map_or(&[], |info| info.diagnostics())
    }

    /// Bind every decl of every user unit.
    pub fn bind_all(&mut self) -> BindResult<()> {
        let order = self.order.clone();
        for unit in order {
            let root = self.top_level_decl_of(unit);
            for decl in self.decls.descendants(root) {
                self.bind_decl(decl)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Summaries
    // =========================================================================

    pub fn decl_tree_summary(&self, unit: UnitId) -> Option<DeclSummary> {
        let root = self.unit(unit)?.top_level_decl;
        self.summarize(root)
    }

    fn summarize(&self, id: DeclId) -> Option<DeclSummary> {
        let decl = self.decls.get(id)?;
        let value_decl = self
            .decls
            .get(decl.value_decl)
            .filter(|v| v.is_synthesized)
            .and_then(|v| self.summarize(v.id))
            .map(Box::new);
        Some(DeclSummary {
            kind: decl.kind,
            name: decl.display_name.clone(),
            flags: decl.flags().iter_names().map(|(name, _)| name).collect(),
            value_decl,
            children: decl.children.iter().filter_map(|&c| self.summarize(c)).collect(),
        })
    }
}
