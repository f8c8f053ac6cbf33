//! Symbol binder: entry point, parent scopes and the merge search.
//!
//! Binding is lazy and idempotent. `bind_decl` binds the lexical parent
//! first, marks the decl bound, then dispatches on its kind to the
//! `binder_*` modules. Type-like decls publish their symbol on the decl
//! before binding their children, so a child that re-enters the binder
//! finds its parent's symbol in place.

use crate::chain::SemanticInfoChain;
use crate::decl::{DeclFlags, DeclKind, DeclNamespace};
use crate::errors::{BindResult, BinderError};
use crate::ids::{DeclId, SymbolId, UnitId};
use crate::symbol::{MemberSpace, ResolutionState, SymbolData, SymbolInit, SymbolKind};
use sema_common::{diagnostic_codes, limits};
use smallvec::SmallVec;
use tracing::trace;

/// Where a decl's symbol is registered and looked up for merging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ParentScope {
    /// Script (or global) top level; merged through the decl tree.
    TopLevel,
    /// Catch or with block; only its own child decls are in scope.
    Block(DeclId),
    /// Member table of a type symbol. Module tables split members from
    /// non-members by export.
    Symbol { symbol: SymbolId, is_module: bool },
    /// Parameters and locals of a function-like decl.
    Locals(DeclId),
}

impl ParentScope {
    fn is_module(self) -> bool {
        matches!(self, ParentScope::Symbol { is_module: true, .. })
    }
}

/// Member-table space a decl kind binds into.
pub(crate) const fn member_space(kind: DeclKind) -> MemberSpace {
    match kind.namespace() {
        DeclNamespace::Value => MemberSpace::Value,
        DeclNamespace::Type | DeclNamespace::TypeParameter => MemberSpace::Type,
        DeclNamespace::Container => MemberSpace::Container,
    }
}

pub(crate) const fn decl_namespace(space: MemberSpace) -> DeclNamespace {
    match space {
        MemberSpace::Value => DeclNamespace::Value,
        MemberSpace::Type => DeclNamespace::Type,
        MemberSpace::Container => DeclNamespace::Container,
    }
}

impl SemanticInfoChain {
    /// Bind `id` and return its symbol (`NONE` for scripts and blocks).
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn bind_decl(&mut self, id: DeclId) -> BindResult<SymbolId> {
        let decl = self.decl_or_err(id)?;
        if decl.bound {
            return Ok(decl.symbol);
        }
        let (kind, parent, owner, is_synthesized) = (decl.kind, decl.parent, decl.value_decl, decl.is_synthesized);
        self.check_valid_decl(id)?;

        // Implicit values are produced by their owner.
        if is_synthesized {
            self.bind_decl(owner)?;
            return Ok(self.decls.get(id).map_or(SymbolId::NONE, |d| d.symbol));
        }

        if parent.is_some() {
            self.bind_decl(parent)?;
        } else if !matches!(kind, DeclKind::Script | DeclKind::Global) {
            let name = self.decls.get(id).map(|d| d.name.clone()).unwrap_or_default();
            return Err(BinderError::OrphanedDecl { decl: id, kind, name });
        }
        // Binding the parent may have bound us already.
        if let Some(decl) = self.decls.get(id)
            && decl.bound
        {
            return Ok(decl.symbol);
        }

        if self.context.depth >= self.options.max_bind_depth {
            return Err(BinderError::ResolutionDepthExceeded {
                what: "declaration binding",
                limit: self.options.max_bind_depth,
            });
        }
        if let Some(decl) = self.decls.get_mut(id) {
            decl.bound = true;
        }

        self.context.depth += 1;
        let result = stacker::maybe_grow(limits::STACK_RED_ZONE, limits::STACK_GROWTH_SIZE, || {
            self.bind_decl_kind(id, kind)
        });
        self.context.depth -= 1;
        let symbol = result?;

        if let Some(decl) = self.decls.get_mut(id)
            && decl.symbol.is_none()
        {
            decl.symbol = symbol;
        }
        trace!(decl = id.0, ?kind, symbol = symbol.0, "bound declaration");
        Ok(symbol)
    }

    fn bind_decl_kind(&mut self, id: DeclId, kind: DeclKind) -> BindResult<SymbolId> {
        match kind {
            DeclKind::Script | DeclKind::Global | DeclKind::CatchBlock | DeclKind::WithBlock => {
                Ok(SymbolId::NONE)
            }
            DeclKind::Primitive => Ok(self.decls.get(id).map_or(SymbolId::NONE, |d| d.symbol)),
            DeclKind::Container | DeclKind::DynamicModule => self.bind_module(id),
            DeclKind::TypeAlias => self.bind_import(id),
            DeclKind::Class => self.bind_class(id),
            DeclKind::Interface => self.bind_interface(id),
            DeclKind::Enum => self.bind_enum(id),
            DeclKind::ObjectType => self.bind_object_type(id),
            DeclKind::FunctionType | DeclKind::ConstructorType => self.bind_function_type(id, kind),
            DeclKind::TypeParameter => self.bind_type_parameter(id),
            DeclKind::Variable => self.bind_variable(id),
            DeclKind::Parameter => self.bind_parameter(id),
            DeclKind::Property => self.bind_property(id),
            DeclKind::EnumMember => self.bind_enum_member(id),
            DeclKind::Function | DeclKind::Method => self.bind_function(id, kind),
            DeclKind::FunctionExpression => self.bind_function_expression(id),
            DeclKind::ConstructorMethod => self.bind_constructor(id),
            DeclKind::GetAccessor | DeclKind::SetAccessor => self.bind_accessor(id, kind),
            DeclKind::CallSignature | DeclKind::ConstructSignature | DeclKind::IndexSignature => {
                self.bind_signature_member(id, kind)
            }
        }
    }

    /// Bind the synthesized value decl of `owner`, if it has one.
    pub(crate) fn bind_value_decl_of(&mut self, owner: DeclId) -> BindResult<SymbolId> {
        let Some(value) = self.decls.get(owner).map(|d| d.value_decl) else {
            return Ok(SymbolId::NONE);
        };
        let Some(decl) = self.decls.get_mut(value) else {
            return Ok(SymbolId::NONE);
        };
        if !decl.is_synthesized {
            return Ok(SymbolId::NONE);
        }
        if decl.bound {
            return Ok(decl.symbol);
        }
        decl.bound = true;
        let symbol = self.bind_implicit_value(value)?;
        if let Some(decl) = self.decls.get_mut(value) {
            decl.symbol = symbol;
        }
        Ok(symbol)
    }

    /// Bind the children of a type-like decl in declaration order.
    pub(crate) fn bind_children(&mut self, id: DeclId) -> BindResult<()> {
        let children = self.decls.get(id).map(|d| d.children.clone()).unwrap_or_default();
        for child in children {
            self.bind_decl(child)?;
        }
        Ok(())
    }

    // =========================================================================
    // Scopes and registration
    // =========================================================================

    pub(crate) fn parent_scope(&self, id: DeclId) -> BindResult<ParentScope> {
        let decl = self.decl_or_err(id)?;
        let Some(parent) = self.decls.get(decl.parent) else {
            return Err(BinderError::OrphanedDecl {
                decl: id,
                kind: decl.kind,
                name: decl.name.clone(),
            });
        };
        Ok(match parent.kind {
            DeclKind::Script | DeclKind::Global => ParentScope::TopLevel,
            DeclKind::CatchBlock | DeclKind::WithBlock => ParentScope::Block(parent.id),
            DeclKind::Container | DeclKind::DynamicModule => ParentScope::Symbol {
                symbol: parent.symbol,
                is_module: true,
            },
            DeclKind::Class if decl.has_flag(DeclFlags::STATIC) => ParentScope::Symbol {
                symbol: self.constructor_type_of(parent.symbol),
                is_module: false,
            },
            DeclKind::Class | DeclKind::Interface | DeclKind::ObjectType | DeclKind::Enum => {
                ParentScope::Symbol {
                    symbol: parent.symbol,
                    is_module: false,
                }
            }
            kind if kind.is_signature_owner() => ParentScope::Locals(parent.id),
            _ => {
                return Err(BinderError::UnexpectedDeclKind {
                    decl: id,
                    kind: decl.kind,
                });
            }
        })
    }

    /// Static side of a class: the type of its constructor value.
    pub(crate) fn constructor_type_of(&self, class: SymbolId) -> SymbolId {
        let constructor = self.type_data(class).map_or(SymbolId::NONE, |d| d.constructor_method);
        self.symbol(constructor).map_or(SymbolId::NONE, |s| s.type_id)
    }

    /// Register `symbol` under `name` in `scope`. Top-level and block scopes
    /// are resolved through the decl tree and keep no table.
    pub(crate) fn register(&mut self, scope: ParentScope, flags: DeclFlags, name: &str, space: MemberSpace, symbol: SymbolId) {
        if name.is_empty() {
            return;
        }
        match scope {
            ParentScope::TopLevel | ParentScope::Block(_) => {}
            ParentScope::Symbol { symbol: owner, is_module } => {
                let member = !is_module || flags.contains(DeclFlags::EXPORTED);
                if let Some(data) = self.type_data_mut(owner) {
                    data.members.insert(name, space, member, symbol);
                }
                if let Some(s) = self.symbols.get_mut(symbol)
                    && s.container.is_none()
                {
                    s.container = owner;
                }
            }
            ParentScope::Locals(function) => {
                self.caches
                    .function_locals
                    .entry(function)
                    .or_default()
                    .insert(name, space, true, symbol);
            }
        }
    }

    // =========================================================================
    // Symbol helpers
    // =========================================================================

    pub(crate) fn new_symbol(&mut self, name: impl Into<String>, kind: SymbolKind, data: SymbolData) -> BindResult<SymbolId> {
        self.symbols.alloc(SymbolInit::new(name, kind, data))
    }

    pub(crate) fn new_type_symbol(&mut self, name: impl Into<String>, kind: SymbolKind) -> BindResult<SymbolId> {
        self.new_symbol(name, kind, SymbolData::Type(Box::default()))
    }

    /// Record `decl` as a declaration of `symbol`, publish the symbol on the
    /// decl and map its AST node.
    pub(crate) fn attach_decl(&mut self, symbol: SymbolId, decl: DeclId) {
        let Some(d) = self.decls.get_mut(decl) else {
            return;
        };
        d.symbol = symbol;
        let (unit, node) = (d.unit, d.node);
        self.add_declaration(symbol, decl);
        if let Some(info) = self.unit_mut(unit) {
            info.map_symbol(node, symbol);
        }
    }

    /// Record `decl` as shaping `symbol` without publishing the symbol on it.
    pub(crate) fn add_declaration(&mut self, symbol: SymbolId, decl: DeclId) {
        if let Some(s) = self.symbols.get_mut(symbol)
            && !s.declarations.contains(&decl)
        {
            s.declarations.push(decl);
        }
    }

    /// Give `symbol` the error type.
    pub(crate) fn downgrade_to_error(&mut self, symbol: SymbolId) {
        let error = self.primitives.error;
        if let Some(s) = self.symbols.get_mut(symbol) {
            s.type_id = error;
            s.resolution = ResolutionState::Resolved;
        }
    }

    /// Report a duplicate identifier at `decl` and give it a fresh,
    /// unregistered, error-typed symbol.
    pub(crate) fn bind_duplicate(&mut self, decl: DeclId, kind: SymbolKind, data: SymbolData) -> BindResult<SymbolId> {
        let display = self.display_name(decl);
        self.report(decl, diagnostic_codes::DUPLICATE_IDENTIFIER, &[&display]);
        let name = self.decls.get(decl).map(|d| d.name.clone()).unwrap_or_default();
        let symbol = self.new_symbol(name, kind, data)?;
        self.downgrade_to_error(symbol);
        self.attach_decl(symbol, decl);
        Ok(symbol)
    }

    pub(crate) fn display_name(&self, decl: DeclId) -> String {
        self.decls.get(decl).map(|d| d.display_name.clone()).unwrap_or_default()
    }

    pub(crate) fn decl_flags(&self, decl: DeclId) -> DeclFlags {
        self.decls.get(decl).map(|d| d.flags()).unwrap_or_default()
    }

    /// One export-mismatch diagnostic when `decl` merges into `symbol` next to
    /// a sibling decl with a different export status.
    pub(crate) fn check_export_mismatch(&mut self, symbol: SymbolId, decl: DeclId, scope: ParentScope) {
        if !scope.is_module() {
            return;
        }
        let Some(d) = self.decls.get(decl) else { return };
        let (parent, exported) = (d.parent, d.has_flag(DeclFlags::EXPORTED));
        let mismatch = self.declarations_of(symbol).iter().any(|&other| {
            other != decl
                && self
                    .decls
                    .get(other)
                    .is_some_and(|o| o.parent == parent && o.has_flag(DeclFlags::EXPORTED) != exported)
        });
        if mismatch {
            let display = self.display_name(decl);
            self.report(decl, diagnostic_codes::EXPORT_MISMATCH_IN_MERGED_DECLARATION, &[&display]);
            self.downgrade_to_error(symbol);
        }
    }

    // =========================================================================
    // Merge search
    // =========================================================================

    /// Find the symbol `decl` merges into, if any.
    ///
    /// Every earlier same-named candidate is bound first so that the result
    /// does not depend on which decl was requested first.
    pub(crate) fn get_existing_symbol(
        &mut self,
        decl: DeclId,
        space: MemberSpace,
        scope: ParentScope,
    ) -> BindResult<Option<SymbolId>> {
        let d = self.decl_or_err(decl)?;
        let (name, parent, flags) = (d.name.clone(), d.parent, d.flags());
        if name.is_empty() {
            return Ok(None);
        }

        let candidates = self.earlier_candidates(decl, &name, space, scope);
        for &candidate in &candidates {
            self.bind_decl(candidate)?;
        }

        let found = match scope {
            ParentScope::TopLevel => self.find_top_level_symbol(&name, space, decl)?.map(|s| (s, true)),
            ParentScope::Block(_) => candidates
                .first()
                .and_then(|&c| self.decls.get(c))
                .map(|c| c.symbol)
                .filter(|s| s.is_some())
                .map(|s| (s, true)),
            ParentScope::Locals(function) => self
                .caches
                .function_locals
                .get(&function)
                .and_then(|table| table.get(&name, space, true))
                .map(|s| (s, true)),
            ParentScope::Symbol { symbol, is_module } => self.type_data(symbol).and_then(|data| {
                data.members
                    .get(&name, space, false)
                    .map(|s| (s, !is_module))
                    .or_else(|| data.members.get(&name, space, true).map(|s| (s, true)))
            }),
        };
        let Some((existing, previous_exported)) = found else {
            return Ok(None);
        };

        let exported = !scope.is_module() || flags.contains(DeclFlags::EXPORTED);
        if previous_exported && exported {
            return Ok(Some(existing));
        }
        let same_parent = self
            .declarations_of(existing)
            .last()
            .and_then(|&last| self.decls.get(last))
            .is_some_and(|last| last.parent == parent);
        Ok(same_parent.then_some(existing))
    }

    /// Same-named decls that precede `decl` in the decls sharing its scope.
    fn earlier_candidates(&self, decl: DeclId, name: &str, space: MemberSpace, scope: ParentScope) -> SmallVec<[DeclId; 4]> {
        let namespace = decl_namespace(space);
        let key = self.order_key(decl);
        let scopes: SmallVec<[DeclId; 4]> = match scope {
            ParentScope::TopLevel => {
                let position = key.0;
                self.order
                    .iter()
                    .filter(|&&u| self.unit_position(u) <= position)
                    .filter(|&&u| self.unit(u).is_some_and(|info| !info.is_external_module))
                    .map(|&u| self.top_level_decl_of(u))
                    .collect()
            }
            ParentScope::Block(block) => SmallVec::from_slice(&[block]),
            ParentScope::Locals(function) => SmallVec::from_slice(&[function]),
            ParentScope::Symbol { symbol, .. } => SmallVec::from_slice(self.declarations_of(symbol)),
        };
        let mut out: SmallVec<[DeclId; 4]> = scopes
            .iter()
            .flat_map(|&s| self.named_children(s, name, namespace))
            .filter(|&c| c != decl && self.order_key(c) < key)
            .collect();
        out.sort_by_key(|&c| self.order_key(c));
        out.dedup();
        out
    }

    /// First top-level symbol named `name` in `space`, walking script units
    /// in compile order and stopping at `seed`.
    pub(crate) fn find_top_level_symbol(
        &mut self,
        name: &str,
        space: MemberSpace,
        seed: DeclId,
    ) -> BindResult<Option<SymbolId>> {
        let Some(seed_decl) = self.decls.get(seed) else {
            return Ok(None);
        };
        // A file's own module never merges with anything.
        if seed_decl.kind == DeclKind::DynamicModule && seed_decl.node.is_none() {
            return Ok(None);
        }
        let seed_unit = seed_decl.unit;
        let seed_key = self.order_key(seed);
        let namespace = decl_namespace(space);

        let order = self.order.clone();
        for unit in order {
            let is_external = self.unit(unit).is_some_and(|info| info.is_external_module);
            if !is_external {
                let script = self.top_level_decl_of(unit);
                for candidate in self.named_children(script, name, namespace) {
                    if unit == seed_unit && self.order_key(candidate) >= seed_key {
                        break;
                    }
                    let symbol = self.bind_decl(candidate)?;
                    if symbol.is_some() {
                        return Ok(Some(symbol));
                    }
                }
            }
            if unit == seed_unit {
                break;
            }
        }
        Ok(None)
    }

    /// First symbol named `name` in `space` at the top level of any script
    /// unit, falling back to the global unit. Cached per generation.
    pub(crate) fn top_level_symbol(&mut self, name: &str, space: MemberSpace) -> BindResult<SymbolId> {
        let key = (name.to_string(), space);
        if let Some(&symbol) = self.caches.top_level_symbols.get(&key) {
            return Ok(symbol);
        }
        let namespace = decl_namespace(space);
        let mut scopes: Vec<DeclId> = self
            .order
            .iter()
            .filter(|&&u| self.unit(u).is_some_and(|info| !info.is_external_module))
            .map(|&u| self.top_level_decl_of(u))
            .collect();
        scopes.push(self.top_level_decl_of(UnitId::GLOBAL));

        let mut found = SymbolId::NONE;
        'scopes: for scope in scopes {
            for candidate in self.named_children(scope, name, namespace) {
                let symbol = self.bind_decl(candidate)?;
                if symbol.is_some() {
                    found = symbol;
                    break 'scopes;
                }
            }
        }
        if found.is_some() {
            self.caches.top_level_symbols.insert(key, found);
        }
        Ok(found)
    }
}
