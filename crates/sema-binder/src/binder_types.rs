//! Binding of classes, interfaces, enums, type literals and type parameters.

use crate::chain::SemanticInfoChain;
use crate::decl::{DeclFlags, DeclKind};
use crate::errors::{BindResult, BinderError};
use crate::ids::{DeclId, SymbolId};
use crate::symbol::{
    MemberSpace, ResolutionState, SignatureData, SymbolData, SymbolInit, SymbolKind,
};
use sema_common::diagnostic_codes;
use sema_syntax::NodeData;
use std::sync::Arc;
use tracing::trace;

impl SemanticInfoChain {
    /// Bind a named type decl into the type symbol it merges with, or a new
    /// one. Only decls of the same `kind` merge; anything else in the type
    /// space is a duplicate.
    fn bind_named_type(&mut self, id: DeclId, kind: SymbolKind) -> BindResult<SymbolId> {
        let scope = self.parent_scope(id)?;
        let decl = self.decl_or_err(id)?;
        let (name, flags) = (decl.name.clone(), decl.flags());
        let symbol = match self.get_existing_symbol(id, MemberSpace::Type, scope)? {
            Some(existing) if self.symbol_kind(existing) == Some(kind) => {
                self.check_export_mismatch(existing, id, scope);
                self.attach_decl(existing, id);
                existing
            }
            Some(_) => self.bind_duplicate(id, kind, SymbolData::Type(Box::default()))?,
            None => {
                let symbol = self.new_type_symbol(name.clone(), kind)?;
                self.attach_decl(symbol, id);
                self.register(scope, flags, &name, MemberSpace::Type, symbol);
                symbol
            }
        };
        if let Some(s) = self.symbols.get_mut(symbol)
            && s.resolution == ResolutionState::Unresolved
        {
            s.resolution = ResolutionState::Resolved;
        }
        Ok(symbol)
    }

    pub(crate) fn bind_class(&mut self, id: DeclId) -> BindResult<SymbolId> {
        let symbol = self.bind_named_type(id, SymbolKind::Class)?;
        // Type parameters first: the constructor signature and the member
        // annotations refer to them.
        self.bind_type_parameter_children(id)?;
        self.bind_value_decl_of(id)?;
        self.bind_children(id)?;
        self.bind_heritage(id, symbol)?;
        Ok(symbol)
    }

    pub(crate) fn bind_interface(&mut self, id: DeclId) -> BindResult<SymbolId> {
        let symbol = self.bind_named_type(id, SymbolKind::Interface)?;
        self.bind_type_parameter_children(id)?;
        self.bind_children(id)?;
        self.bind_heritage(id, symbol)?;
        Ok(symbol)
    }

    fn bind_type_parameter_children(&mut self, id: DeclId) -> BindResult<()> {
        let children = self.decls.get(id).map(|d| d.children.clone()).unwrap_or_default();
        for child in children {
            if self.decls.get(child).is_some_and(|c| c.kind == DeclKind::TypeParameter) {
                self.bind_decl(child)?;
            }
        }
        Ok(())
    }

    /// Resolve `extends`/`implements` clauses of one class or interface decl
    /// and append them (deduplicated) to the merged symbol.
    fn bind_heritage(&mut self, id: DeclId, symbol: SymbolId) -> BindResult<()> {
        let decl = self.decl_or_err(id)?;
        let (unit, node) = (decl.unit, decl.node);
        let Some(info) = self.unit(unit) else {
            return Ok(());
        };
        let arena = Arc::clone(&info.arena);
        let (extends, implements) = match arena.get(node).map(|n| &n.data) {
            Some(NodeData::Class(data)) => (data.extends.clone(), data.implements.clone()),
            Some(NodeData::Interface(data)) => (data.extends.clone(), Vec::new()),
            _ => return Ok(()),
        };

        let error = self.primitives.error;
        for (clause, implemented) in [(extends, false), (implements, true)] {
            for type_node in clause {
                let base = self.resolve_type_node(unit, type_node, id)?;
                if base.is_none() || base == error {
                    continue;
                }
                let Some(data) = self.type_data_mut(symbol) else {
                    return Ok(());
                };
                let list = if implemented {
                    &mut data.implemented_types
                } else {
                    &mut data.extended_types
                };
                if !list.contains(&base) {
                    list.push(base);
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Enums
    // =========================================================================

    pub(crate) fn bind_enum(&mut self, id: DeclId) -> BindResult<SymbolId> {
        let symbol = self.bind_named_type(id, SymbolKind::Enum)?;
        if self.symbol_kind(symbol) == Some(SymbolKind::Enum) {
            self.ensure_enum_index_signature(symbol)?;
            self.check_enum_first_member(id, symbol);
        }
        self.bind_value_decl_of(id)?;
        self.bind_children(id)?;
        Ok(symbol)
    }

    /// `[index: number]: string`, once per enum symbol.
    fn ensure_enum_index_signature(&mut self, symbol: SymbolId) -> BindResult<()> {
        if self.type_data(symbol).is_none_or(|d| !d.index_signatures.is_empty()) {
            return Ok(());
        }
        let (number, string) = (self.primitives.number, self.primitives.string);
        let parameter = self
            .symbols
            .alloc(SymbolInit::new("index", SymbolKind::Parameter, SymbolData::Value).synthesized())?;
        if let Some(p) = self.symbols.get_mut(parameter) {
            p.type_id = number;
            p.resolution = ResolutionState::Resolved;
        }
        let signature = self.symbols.alloc(
            SymbolInit::new(
                "",
                SymbolKind::IndexSignature,
                SymbolData::Signature(Box::new(SignatureData {
                    parameters: vec![parameter],
                    return_type: string,
                    ..SignatureData::default()
                })),
            )
            .synthesized(),
        )?;
        if let Some(s) = self.symbols.get_mut(signature) {
            s.resolution = ResolutionState::Resolved;
            s.container = symbol;
        }
        if let Some(data) = self.type_data_mut(symbol) {
            data.index_signatures.push(signature);
        }
        Ok(())
    }

    /// Of all declarations of one enum, only one may leave its first member
    /// without an initializer.
    fn check_enum_first_member(&mut self, id: DeclId, symbol: SymbolId) {
        let first_member = self.decls.get(id).and_then(|d| {
            d.children
                .iter()
                .copied()
                .find(|&c| self.decls.get(c).is_some_and(|c| c.kind == DeclKind::EnumMember))
        });
        let Some(first_member) = first_member else {
            return;
        };
        if self.decl_flags(first_member).contains(DeclFlags::CONSTANT) {
            return;
        }
        match self.caches.enum_omitted_initializer.get(&symbol) {
            Some(&other) if other != id => {
                trace!(decl = id.0, other = other.0, "second enum declaration without initializer");
                self.report(first_member, diagnostic_codes::ENUM_FIRST_MEMBER_MUST_HAVE_INITIALIZER, &[]);
            }
            Some(_) => {}
            None => {
                self.caches.enum_omitted_initializer.insert(symbol, id);
            }
        }
    }

    // =========================================================================
    // Type literals
    // =========================================================================

    pub(crate) fn bind_object_type(&mut self, id: DeclId) -> BindResult<SymbolId> {
        let symbol = self.new_type_symbol("", SymbolKind::ObjectType)?;
        if let Some(s) = self.symbols.get_mut(symbol) {
            s.resolution = ResolutionState::Resolved;
        }
        self.attach_decl(symbol, id);
        self.bind_children(id)?;
        Ok(symbol)
    }

    /// `(x: T) => U` and `new (x: T) => U` literals: an anonymous type with a
    /// single call or construct signature.
    pub(crate) fn bind_function_type(&mut self, id: DeclId, kind: DeclKind) -> BindResult<SymbolId> {
        let (symbol_kind, signature_kind) = match kind {
            DeclKind::ConstructorType => (SymbolKind::ConstructorType, SymbolKind::ConstructSignature),
            _ => (SymbolKind::FunctionType, SymbolKind::CallSignature),
        };
        let symbol = self.new_type_symbol("", symbol_kind)?;
        if let Some(s) = self.symbols.get_mut(symbol) {
            s.resolution = ResolutionState::Resolved;
        }
        self.attach_decl(symbol, id);
        let signature = self.build_signature(id, signature_kind)?;
        if let Some(data) = self.type_data_mut(symbol) {
            match signature_kind {
                SymbolKind::ConstructSignature => data.construct_signatures.push(signature),
                _ => data.call_signatures.push(signature),
            }
        }
        Ok(symbol)
    }

    // =========================================================================
    // Type parameters
    // =========================================================================

    /// Type parameters of classes and interfaces are shared by name across
    /// merged declarations; those of signatures belong to the signature.
    /// Constraints are resolved lazily by [`SemanticInfoChain::constraint_of`].
    pub(crate) fn bind_type_parameter(&mut self, id: DeclId) -> BindResult<SymbolId> {
        let decl = self.decl_or_err(id)?;
        let (name, parent) = (decl.name.clone(), decl.parent);
        let owner = self.decl_or_err(parent)?;
        let (owner_kind, owner_symbol, owner_signature) = (owner.kind, owner.symbol, owner.signature_symbol);

        let (holder, is_signature) = match owner_kind {
            DeclKind::Class | DeclKind::Interface => (owner_symbol, false),
            kind if kind.is_signature_owner() => (owner_signature, true),
            kind => return Err(BinderError::UnexpectedDeclKind { decl: id, kind }),
        };

        let existing = self.symbol(holder).and_then(|s| {
            s.type_parameters()
                .iter()
                .copied()
                .find(|&tp| self.symbol(tp).is_some_and(|t| t.name == name))
        });
        if let Some(existing) = existing {
            let declared_here = self
                .declarations_of(existing)
                .iter()
                .any(|&d| self.decls.get(d).is_some_and(|d| d.parent == parent));
            if declared_here || is_signature {
                return self.bind_duplicate(id, SymbolKind::TypeParameter, SymbolData::Type(Box::default()));
            }
            // A later partial declaration of the same class or interface.
            self.attach_decl(existing, id);
            return Ok(existing);
        }

        let symbol = self.new_type_symbol(name, SymbolKind::TypeParameter)?;
        self.attach_decl(symbol, id);
        if let Some(s) = self.symbols.get_mut(symbol) {
            s.container = holder;
        }
        match self.symbols.get_mut(holder).map(|s| &mut s.data) {
            Some(SymbolData::Type(data)) => data.type_parameters.push(symbol),
            Some(SymbolData::Signature(data)) => {
                data.type_parameters.push(symbol);
                data.is_generic = true;
            }
            _ => {}
        }
        Ok(symbol)
    }

    /// The `extends` constraint of a type parameter, resolved on first use.
    /// `NONE` when unconstrained.
    pub fn constraint_of(&mut self, type_parameter: SymbolId) -> BindResult<SymbolId> {
        let symbol = self.try_symbol(type_parameter)?;
        if symbol.kind != SymbolKind::TypeParameter {
            return Ok(SymbolId::NONE);
        }
        let constraint = symbol.type_data().map_or(SymbolId::NONE, |d| d.constraint);
        if constraint.is_some() || symbol.resolution != ResolutionState::Unresolved {
            return Ok(constraint);
        }
        let Some(&decl) = self.declarations_of(type_parameter).first() else {
            return Ok(SymbolId::NONE);
        };
        let d = self.decl_or_err(decl)?;
        let (unit, node, scope) = (d.unit, d.node, d.parent);
        let constraint_node = self.unit(unit).and_then(|info| match info.arena.get(node).map(|n| &n.data) {
            Some(NodeData::TypeParameter(data)) => Some(data.constraint),
            _ => None,
        });

        self.symbol_mut(type_parameter)?.resolution = ResolutionState::Resolving;
        let resolved = match constraint_node {
            Some(node) if node.is_some() => self.resolve_type_node(unit, node, scope),
            _ => Ok(SymbolId::NONE),
        };
        let symbol = self.symbol_mut(type_parameter)?;
        symbol.resolution = ResolutionState::Resolved;
        let resolved = resolved?;
        if let Some(data) = symbol.type_data_mut()
            && data.constraint.is_none()
        {
            data.constraint = resolved;
        }
        Ok(resolved)
    }
}
