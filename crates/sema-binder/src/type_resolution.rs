//! Declared types: annotations resolved to type symbols through lexical
//! lookup, plus the array and reference views built along the way.

use crate::binder::decl_namespace;
use crate::chain::SemanticInfoChain;
use crate::decl::{DeclKind, DeclNamespace};
use crate::errors::{BindResult, BinderError};
use crate::ids::{DeclId, SymbolId, UnitId};
use crate::substitution::SubstitutionMap;
use crate::symbol::{
    MemberSpace, ReferenceData, ResolutionState, SymbolData, SymbolInit, SymbolKind,
};
use sema_syntax::{NodeData, NodeIndex};
use std::cell::OnceCell;
use std::sync::Arc;
use tracing::trace;

impl SemanticInfoChain {
    /// Declared type of a symbol.
    ///
    /// Types are their own declared type; aliases yield their assigned type;
    /// signatures their return type; accessors the getter's return type (or
    /// the setter's parameter type). Values resolve the annotation of their
    /// first declaration once; a cycle or a missing annotation yields `any`.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn declared_type_of(&mut self, symbol: SymbolId) -> BindResult<SymbolId> {
        let symbol = self.resolve_reference(symbol)?;
        let s = self.try_symbol(symbol)?;
        let kind = s.kind;
        if kind.is_type() {
            return Ok(symbol);
        }
        match kind {
            SymbolKind::TypeAlias => return self.alias_target(symbol, MemberSpace::Type),
            SymbolKind::CallSignature | SymbolKind::ConstructSignature | SymbolKind::IndexSignature => {
                return Ok(s.signature_data().map_or(SymbolId::NONE, |d| d.return_type));
            }
            SymbolKind::Accessor if !s.is_rooted() => return self.accessor_type(symbol),
            _ => {}
        }
        match s.resolution {
            ResolutionState::Resolved => return Ok(s.type_id),
            ResolutionState::Resolving => {
                trace!(symbol = symbol.0, "circular declared type");
                return Ok(self.primitives.any);
            }
            ResolutionState::Unresolved => {}
        }
        if s.type_id.is_some() {
            let ty = s.type_id;
            self.symbol_mut(symbol)?.resolution = ResolutionState::Resolved;
            return Ok(ty);
        }
        let Some(&decl) = self.declarations_of(symbol).first() else {
            return Ok(self.primitives.any);
        };

        self.symbol_mut(symbol)?.resolution = ResolutionState::Resolving;
        let ty = match self.type_from_annotation(decl) {
            Ok(ty) => ty,
            Err(err) => {
                self.symbol_mut(symbol)?.resolution = ResolutionState::Unresolved;
                return Err(err);
            }
        };
        let s = self.symbol_mut(symbol)?;
        s.type_id = ty;
        s.resolution = ResolutionState::Resolved;
        self.note_typed(symbol);
        Ok(ty)
    }

    fn accessor_type(&mut self, accessor: SymbolId) -> BindResult<SymbolId> {
        let Some(data) = self.symbol(accessor).and_then(|s| s.accessor_data()).copied() else {
            return Ok(self.primitives.any);
        };
        let first_signature = |chain: &Self, half: SymbolId| {
            let function_type = chain.symbol(half).map_or(SymbolId::NONE, |s| s.type_id);
            chain
                .type_data(function_type)
                .and_then(|d| d.call_signatures.first().copied())
                .unwrap_or(SymbolId::NONE)
        };
        if data.getter.is_some() {
            let signature = first_signature(self, data.getter);
            return Ok(self
                .symbol(signature)
                .and_then(|s| s.signature_data())
                .map_or(self.primitives.any, |d| d.return_type));
        }
        let signature = first_signature(self, data.setter);
        let parameter = self
            .symbol(signature)
            .and_then(|s| s.signature_data())
            .and_then(|d| d.parameters.first().copied());
        match parameter {
            Some(parameter) => self.declared_type_of(parameter),
            None => Ok(self.primitives.any),
        }
    }

    /// Type written on `decl`: a variable, property or parameter annotation.
    /// A property parameter's property reads the parameter's annotation.
    fn type_from_annotation(&mut self, decl: DeclId) -> BindResult<SymbolId> {
        let d = self.decl_or_err(decl)?;
        if d.kind == DeclKind::EnumMember {
            return Ok(self.decls.get(d.parent).map_or(SymbolId::NONE, |p| p.symbol));
        }
        let source = match self.decls.get(d.value_decl) {
            Some(parameter) if d.kind == DeclKind::Property && parameter.kind == DeclKind::Parameter => parameter,
            _ => d,
        };
        let (unit, node, scope) = (source.unit, source.node, source.parent);
        let annotation = self
            .unit(unit)
            .and_then(|info| info.arena.variable(node))
            .map_or(NodeIndex::NONE, |v| v.type_annotation);
        self.resolve_type_node(unit, annotation, scope)
    }

    // =========================================================================
    // Type nodes
    // =========================================================================

    /// Resolve a type node of `unit` as seen from the decl `scope`.
    pub fn resolve_type_node(&mut self, unit: UnitId, node: NodeIndex, scope: DeclId) -> BindResult<SymbolId> {
        if node.is_none() {
            return Ok(self.primitives.any);
        }
        let arena = Arc::clone(&self.unit(unit).ok_or(BinderError::UnknownUnit(unit))?.arena);
        let Some(type_node) = arena.get(node) else {
            return Ok(self.primitives.any);
        };
        match &type_node.data {
            NodeData::PredefinedType { keyword } => {
                Ok(self.primitives.by_name(keyword).unwrap_or(self.primitives.any))
            }
            NodeData::TypeReference(reference) => {
                let segments: Vec<String> = reference
                    .name
                    .iter()
                    .filter_map(|&n| arena.identifier_text(n).map(str::to_string))
                    .collect();
                let mut target = self.resolve_name_path(scope, &segments, MemberSpace::Type)?;
                if self.symbol_kind(target) == Some(SymbolKind::TypeAlias) {
                    target = self.alias_target(target, MemberSpace::Type)?;
                }
                if target.is_none() {
                    trace!(name = %segments.join("."), "unresolved type reference");
                    return Ok(self.primitives.error);
                }
                if reference.type_arguments.is_empty() {
                    return Ok(target);
                }
                let mut arguments = Vec::with_capacity(reference.type_arguments.len());
                for &argument in &reference.type_arguments {
                    arguments.push(self.resolve_type_node(unit, argument, scope)?);
                }
                let parameters = self
                    .symbol(target)
                    .map(|s| s.type_parameters().to_vec())
                    .unwrap_or_default();
                if parameters.is_empty() {
                    return Ok(target);
                }
                let map = SubstitutionMap::from_pairs(&parameters, &arguments);
                self.instantiate_type(target, &map)
            }
            NodeData::ArrayType { element } => {
                let element = self.resolve_type_node(unit, *element, scope)?;
                self.array_of(element)
            }
            NodeData::ObjectType { .. } | NodeData::Function(_) => {
                let Some(decl) = self.get_decl_for_ast(unit, node) else {
                    return Ok(self.primitives.any);
                };
                self.bind_decl(decl)
            }
            _ => Ok(self.primitives.any),
        }
    }

    // =========================================================================
    // Name lookup
    // =========================================================================

    /// Resolve a dotted name from `scope`. The first segment is looked up
    /// lexically, every further one as an exported member of the container
    /// before it. Intermediate segments are containers.
    pub(crate) fn resolve_name_path(&mut self, scope: DeclId, segments: &[String], space: MemberSpace) -> BindResult<SymbolId> {
        let Some((last, prefix)) = segments.split_last() else {
            return Ok(SymbolId::NONE);
        };
        let Some((first, middle)) = prefix.split_first() else {
            return self.lookup_lexical(scope, last, space);
        };
        let mut container = self.lookup_lexical(scope, first, MemberSpace::Container)?;
        for segment in middle {
            container = self.container_member(container, segment, MemberSpace::Container)?;
            if container.is_none() {
                return Ok(SymbolId::NONE);
            }
        }
        self.container_member(container, last, space)
    }

    /// Exported member `name` of a container (following an alias to its
    /// container target).
    fn container_member(&mut self, container: SymbolId, name: &str, space: MemberSpace) -> BindResult<SymbolId> {
        let container = if self.symbol_kind(container) == Some(SymbolKind::TypeAlias) {
            self.alias_target(container, MemberSpace::Container)?
        } else {
            container
        };
        let Some(members) = self.type_data(container).map(|d| &d.members) else {
            return Ok(SymbolId::NONE);
        };
        if let Some(found) = members.get(name, space, true) {
            return Ok(found);
        }
        if space != MemberSpace::Container
            && let Some(alias) = members.get(name, MemberSpace::Container, true)
            && self.symbol_kind(alias) == Some(SymbolKind::TypeAlias)
        {
            return self.alias_target(alias, space);
        }
        Ok(SymbolId::NONE)
    }

    /// Walk the enclosing decls of `scope` outwards: type parameters of every
    /// enclosing decl, children of namespaces, function-likes and blocks,
    /// then the chain's top level.
    fn lookup_lexical(&mut self, scope: DeclId, name: &str, space: MemberSpace) -> BindResult<SymbolId> {
        let mut current = scope;
        while let Some(decl) = self.decls.get(current) {
            let (kind, parent) = (decl.kind, decl.parent);
            if space == MemberSpace::Type
                && let Some(&type_parameter) = decl.children_named(name, DeclNamespace::TypeParameter).first()
            {
                return self.bind_decl(type_parameter);
            }
            if matches!(kind, DeclKind::Script | DeclKind::Global) {
                break;
            }
            if kind.is_module() || kind.is_signature_owner() || kind.is_some_block() {
                let found = self.lookup_in_scope(current, name, space)?;
                if found.is_some() {
                    return Ok(found);
                }
            }
            current = parent;
        }

        let found = self.top_level_symbol(name, space)?;
        if found.is_some() || space == MemberSpace::Container {
            return Ok(found);
        }
        let alias = self.top_level_symbol(name, MemberSpace::Container)?;
        if self.symbol_kind(alias) == Some(SymbolKind::TypeAlias) {
            return self.alias_target(alias, space);
        }
        Ok(SymbolId::NONE)
    }

    fn lookup_in_scope(&mut self, scope: DeclId, name: &str, space: MemberSpace) -> BindResult<SymbolId> {
        for candidate in self.named_children(scope, name, decl_namespace(space)) {
            let symbol = self.bind_decl(candidate)?;
            if symbol.is_some() {
                return Ok(symbol);
            }
        }
        if space != MemberSpace::Container {
            for candidate in self.named_children(scope, name, DeclNamespace::Container) {
                if self.decls.get(candidate).is_some_and(|d| d.kind == DeclKind::TypeAlias) {
                    let alias = self.bind_decl(candidate)?;
                    let target = self.alias_target(alias, space)?;
                    if target.is_some() {
                        return Ok(target);
                    }
                }
            }
        }
        // Members contributed by other declarations of the same namespace.
        if self.decls.get(scope).is_some_and(|d| d.kind.is_module()) {
            let module = self.bind_decl(scope)?;
            if let Some(members) = self.type_data(module).map(|d| &d.members)
                && let Some(found) = members.get(name, space, true)
            {
                return Ok(found);
            }
        }
        Ok(SymbolId::NONE)
    }

    // =========================================================================
    // Arrays and references
    // =========================================================================

    /// `element[]`, one symbol per element type and generation.
    pub fn array_of(&mut self, element: SymbolId) -> BindResult<SymbolId> {
        if let Some(&array) = self.caches.arrays.get(&element) {
            return Ok(array);
        }
        let name = format!("{}[]", self.symbol(element).map_or("", |s| s.name.as_str()));
        let array = self.symbols.alloc(
            SymbolInit::new(name, SymbolKind::Array, SymbolData::Type(Box::default())).synthesized(),
        )?;
        if let Some(s) = self.symbols.get_mut(array) {
            s.resolution = ResolutionState::Resolved;
            if let Some(data) = s.type_data_mut() {
                data.element_type = element;
            }
        }
        self.caches.arrays.insert(element, array);
        Ok(array)
    }

    /// Read-only view forwarding to the symbol of `decl`, bound on first
    /// access.
    pub fn reference_to_decl(&mut self, decl: DeclId) -> BindResult<SymbolId> {
        self.check_valid_decl(decl)?;
        let name = self.decls.get(decl).map(|d| d.name.clone()).unwrap_or_default();
        self.new_reference(name, decl, SymbolId::NONE)
    }

    /// Read-only view forwarding to `target`. One view per target and
    /// generation.
    pub fn reference_to(&mut self, target: SymbolId) -> BindResult<SymbolId> {
        let target = self.resolve_reference(target)?;
        if let Some(&reference) = self.caches.references.get(&target) {
            return Ok(reference);
        }
        let name = self.try_symbol(target)?.name.clone();
        let reference = self.new_reference(name, DeclId::NONE, target)?;
        self.caches.references.insert(target, reference);
        Ok(reference)
    }

    fn new_reference(&mut self, name: String, target_decl: DeclId, target: SymbolId) -> BindResult<SymbolId> {
        let cell = OnceCell::new();
        if target.is_some() {
            let _ = cell.set(target);
        }
        let reference = self.symbols.alloc(
            SymbolInit::new(name, SymbolKind::Reference, SymbolData::Reference(ReferenceData { target_decl, target: cell }))
                .synthesized(),
        )?;
        if let Some(s) = self.symbols.get_mut(reference) {
            s.resolution = ResolutionState::Resolved;
        }
        Ok(reference)
    }

    /// The symbol a reference forwards to; any other symbol is returned as is.
    pub fn resolve_reference(&mut self, symbol: SymbolId) -> BindResult<SymbolId> {
        let s = self.try_symbol(symbol)?;
        let SymbolData::Reference(data) = &s.data else {
            return Ok(symbol);
        };
        if let Some(&target) = data.target.get() {
            return Ok(target);
        }
        let target_decl = data.target_decl;
        let target = self.bind_decl(target_decl)?;
        if let Some(SymbolData::Reference(data)) = self.symbol(symbol).map(|s| &s.data) {
            let _ = data.target.set(target);
        }
        Ok(target)
    }
}
