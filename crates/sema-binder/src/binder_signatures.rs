//! Binding of function-likes: functions and methods with their overloads,
//! constructors, accessors, signature members and parameters.

use crate::binder::ParentScope;
use crate::binder_values::ValueFlavor;
use crate::chain::SemanticInfoChain;
use crate::decl::{DeclFlags, DeclKind};
use crate::errors::BindResult;
use crate::ids::{DeclId, SymbolId};
use crate::symbol::{
    AccessorData, MemberSpace, ResolutionState, SignatureData, SymbolData, SymbolKind,
};
use sema_common::diagnostic_codes;
use smallvec::smallvec;
use std::sync::Arc;
use tracing::trace;

impl SemanticInfoChain {
    /// Create the signature symbol of a function-like decl, bind its type
    /// parameters and parameters in order and resolve its return annotation.
    pub(crate) fn build_signature(&mut self, id: DeclId, kind: SymbolKind) -> BindResult<SymbolId> {
        let decl = self.decl_or_err(id)?;
        let (unit, node, flags) = (decl.unit, decl.node, decl.flags());
        let children = decl.children.clone();

        let signature = self.new_symbol(
            "",
            kind,
            SymbolData::Signature(Box::new(SignatureData {
                is_definition: !flags.contains(DeclFlags::SIGNATURE),
                ..SignatureData::default()
            })),
        )?;
        self.add_declaration(signature, id);
        if let Some(d) = self.decls.get_mut(id) {
            d.signature_symbol = signature;
        }

        for child in children {
            let is_signature_part = self
                .decls
                .get(child)
                .is_some_and(|c| matches!(c.kind, DeclKind::TypeParameter | DeclKind::Parameter));
            if is_signature_part {
                self.bind_decl(child)?;
            }
        }

        let return_node = self
            .unit(unit)
            .and_then(|info| info.arena.function(node))
            .map(|f| f.return_type);
        let return_type = match return_node {
            Some(node) => self.resolve_type_node(unit, node, id)?,
            None => self.primitives.any,
        };

        let has_varargs = self
            .symbol(signature)
            .and_then(|s| s.signature_data())
            .is_some_and(|data| {
                data.parameters
                    .iter()
                    .any(|&p| self.symbol(p).is_some_and(|p| p.is_varargs))
            });
        let s = self.symbol_mut(signature)?;
        s.resolution = ResolutionState::Resolved;
        if let Some(data) = s.signature_data_mut() {
            data.return_type = return_type;
            data.has_varargs = has_varargs;
            data.is_generic = !data.type_parameters.is_empty();
        }
        Ok(signature)
    }

    /// A value symbol typed by a fresh, anonymous function type.
    fn new_function_symbol(&mut self, id: DeclId, name: &str, kind: SymbolKind) -> BindResult<SymbolId> {
        let symbol = self.new_symbol(name, kind, SymbolData::Value)?;
        let function_type = self.new_type_symbol("", SymbolKind::FunctionType)?;
        self.add_declaration(function_type, id);
        if let Some(t) = self.symbols.get_mut(function_type) {
            t.resolution = ResolutionState::Resolved;
        }
        if let Some(s) = self.symbols.get_mut(symbol) {
            s.type_id = function_type;
            s.resolution = ResolutionState::Resolved;
        }
        self.attach_decl(symbol, id);
        Ok(symbol)
    }

    fn push_call_signature(&mut self, function: SymbolId, signature: SymbolId) {
        let function_type = self.symbol(function).map_or(SymbolId::NONE, |s| s.type_id);
        if self.symbol_kind(function_type) != Some(SymbolKind::FunctionType) {
            return;
        }
        if let Some(data) = self.type_data_mut(function_type) {
            data.call_signatures.push(signature);
        }
    }

    // =========================================================================
    // Functions and methods
    // =========================================================================

    pub(crate) fn bind_function(&mut self, id: DeclId, kind: DeclKind) -> BindResult<SymbolId> {
        let scope = self.parent_scope(id)?;
        let decl = self.decl_or_err(id)?;
        let (name, flags) = (decl.name.clone(), decl.flags());
        let (symbol_kind, flavor) = if kind == DeclKind::Function {
            (SymbolKind::Function, ValueFlavor::Function)
        } else {
            (SymbolKind::Method, ValueFlavor::Method)
        };

        let symbol = match self.get_existing_symbol(id, MemberSpace::Value, scope)? {
            None => {
                let symbol = self.new_function_symbol(id, &name, symbol_kind)?;
                self.register(scope, flags, &name, MemberSpace::Value, symbol);
                symbol
            }
            Some(existing) => match self.value_flavor(existing) {
                existing_flavor if existing_flavor == flavor => {
                    let only_signatures = self.declarations_of(existing).iter().all(|&d| {
                        self.decl_flags(d).contains(DeclFlags::SIGNATURE)
                    });
                    if flags.contains(DeclFlags::SIGNATURE) || only_signatures {
                        self.check_ambient_mismatch(existing, id);
                        self.check_export_mismatch(existing, id, scope);
                        self.attach_decl(existing, id);
                        let function_type = self.symbol(existing).map_or(SymbolId::NONE, |s| s.type_id);
                        if self.symbol_kind(function_type) == Some(SymbolKind::FunctionType) {
                            self.add_declaration(function_type, id);
                        }
                        existing
                    } else {
                        trace!(decl = id.0, %name, "second function implementation");
                        self.bind_duplicate(id, symbol_kind, SymbolData::Value)?
                    }
                }
                ValueFlavor::ModuleValue if kind == DeclKind::Function => {
                    self.bind_function_after_module(id, existing, &name)?
                }
                _ => self.bind_duplicate(id, symbol_kind, SymbolData::Value)?,
            },
        };

        let signature = self.build_signature(id, SymbolKind::CallSignature)?;
        self.push_call_signature(symbol, signature);
        Ok(symbol)
    }

    /// A function declared after a namespace of the same name. An ambient
    /// namespace value turns into the function; otherwise the namespace came
    /// first illegally.
    fn bind_function_after_module(&mut self, id: DeclId, existing: SymbolId, name: &str) -> BindResult<SymbolId> {
        let module_decl = self.implicit_value_owner(existing);
        let module_is_ambient = self.decl_flags(module_decl).contains(DeclFlags::AMBIENT);
        if !module_is_ambient {
            let display = self.display_name(module_decl);
            self.report(module_decl, diagnostic_codes::NAMESPACE_BEFORE_MERGED_VALUE, &[&display]);
            let symbol = self.new_function_symbol(id, name, SymbolKind::Function)?;
            self.downgrade_to_error(symbol);
            return Ok(symbol);
        }

        let container = self.symbol(existing).map_or(SymbolId::NONE, |s| s.type_id);
        let function_type = self.new_type_symbol("", SymbolKind::FunctionType)?;
        self.add_declaration(function_type, id);
        if let Some(data) = self.type_data_mut(function_type) {
            data.associated_container = container;
        }
        if let Some(t) = self.symbols.get_mut(function_type) {
            t.resolution = ResolutionState::Resolved;
        }
        let s = self.symbol_mut(existing)?;
        s.kind = SymbolKind::Function;
        s.type_id = function_type;
        s.resolution = ResolutionState::Resolved;
        if let Some(data) = self.type_data_mut(container) {
            data.instance_symbol = existing;
        }
        self.attach_decl(existing, id);
        Ok(existing)
    }

    /// Ambient and non-ambient declarations of one overload set within one
    /// scope must agree.
    fn check_ambient_mismatch(&mut self, symbol: SymbolId, decl: DeclId) {
        if !self.options.report_ambient_mismatch {
            return;
        }
        let Some(d) = self.decls.get(decl) else { return };
        let (parent, ambient) = (d.parent, d.has_flag(DeclFlags::AMBIENT));
        let mismatch = self.declarations_of(symbol).iter().any(|&other| {
            other != decl
                && self
                    .decls
                    .get(other)
                    .is_some_and(|o| o.parent == parent && o.has_flag(DeclFlags::AMBIENT) != ambient)
        });
        if mismatch {
            let display = self.display_name(decl);
            self.report(decl, diagnostic_codes::AMBIENT_MISMATCH_IN_MERGED_DECLARATION, &[&display]);
            self.downgrade_to_error(symbol);
        }
    }

    pub(crate) fn bind_function_expression(&mut self, id: DeclId) -> BindResult<SymbolId> {
        let name = self.decl_or_err(id)?.name.clone();
        let symbol = self.new_function_symbol(id, &name, SymbolKind::FunctionExpression)?;
        let signature = self.build_signature(id, SymbolKind::CallSignature)?;
        self.push_call_signature(symbol, signature);
        Ok(symbol)
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    /// A real constructor replaces the class's implicit construct signature.
    pub(crate) fn bind_constructor(&mut self, id: DeclId) -> BindResult<SymbolId> {
        let decl = self.decl_or_err(id)?;
        let (parent, flags) = (decl.parent, decl.flags());
        let class = self.decls.get(parent).map_or(SymbolId::NONE, |d| d.symbol);
        let constructor = self.type_data(class).map_or(SymbolId::NONE, |d| d.constructor_method);
        let constructor_type = self.symbol(constructor).map_or(SymbolId::NONE, |s| s.type_id);
        let type_parameters = self
            .symbol(class)
            .map(|s| s.type_parameters().to_vec())
            .unwrap_or_default();

        let signature = self.build_signature(id, SymbolKind::ConstructSignature)?;
        if let Some(data) = self.symbol_mut(signature)?.signature_data_mut() {
            data.return_type = class;
            data.is_generic = !type_parameters.is_empty();
            data.type_parameters = type_parameters;
        }

        if self.symbol_kind(constructor_type) == Some(SymbolKind::ConstructorType) {
            let existing: Vec<SymbolId> = self
                .type_data(constructor_type)
                .map(|d| d.construct_signatures.clone())
                .unwrap_or_default();
            let is_definition = !flags.contains(DeclFlags::SIGNATURE);
            let has_definition = existing.iter().any(|&s| {
                self.symbol(s)
                    .and_then(|s| s.signature_data())
                    .is_some_and(|d| d.is_definition)
            });
            if is_definition && has_definition {
                self.report(id, diagnostic_codes::MULTIPLE_CONSTRUCTOR_IMPLEMENTATIONS, &[]);
            }
            if let Some(data) = self.type_data_mut(constructor_type) {
                let implicit = data.default_construct_signature;
                if implicit.is_some() {
                    data.construct_signatures.retain(|&s| s != implicit);
                    data.default_construct_signature = SymbolId::NONE;
                }
                data.construct_signatures.push(signature);
            }
        }
        if constructor.is_some() {
            self.attach_decl(constructor, id);
        }
        Ok(constructor)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// `get`/`set` pairs share one accessor symbol per name; each half is a
    /// method symbol with its own function type.
    pub(crate) fn bind_accessor(&mut self, id: DeclId, kind: DeclKind) -> BindResult<SymbolId> {
        let scope = self.parent_scope(id)?;
        let decl = self.decl_or_err(id)?;
        let (name, flags) = (decl.name.clone(), decl.flags());
        let has_type_parameters = decl
            .children
            .iter()
            .any(|&c| self.decls.get(c).is_some_and(|c| c.kind == DeclKind::TypeParameter));
        let empty = || {
            SymbolData::Accessor(AccessorData {
                getter: SymbolId::NONE,
                setter: SymbolId::NONE,
            })
        };

        let accessor = match self.get_existing_symbol(id, MemberSpace::Value, scope)? {
            Some(existing) if self.symbol_kind(existing) == Some(SymbolKind::Accessor) => {
                self.attach_decl(existing, id);
                existing
            }
            Some(_) => self.bind_duplicate(id, SymbolKind::Accessor, empty())?,
            None => {
                let accessor = self.new_symbol(name.clone(), SymbolKind::Accessor, empty())?;
                if let Some(s) = self.symbols.get_mut(accessor) {
                    s.resolution = ResolutionState::Resolved;
                }
                self.attach_decl(accessor, id);
                self.register(scope, flags, &name, MemberSpace::Value, accessor);
                accessor
            }
        };

        if has_type_parameters {
            self.report(id, diagnostic_codes::ACCESSOR_CANNOT_HAVE_TYPE_PARAMETERS, &[]);
        }

        let signature = self.build_signature(id, SymbolKind::CallSignature)?;
        let is_getter = kind == DeclKind::GetAccessor;
        let Some(SymbolData::Accessor(data)) = self.symbol(accessor).map(|s| &s.data) else {
            return Ok(accessor);
        };
        let slot = if is_getter { data.getter } else { data.setter };
        if !slot.is_none() {
            let display = self.display_name(id);
            self.report(id, diagnostic_codes::DUPLICATE_IDENTIFIER, &[&display]);
            return Ok(accessor);
        }

        let half = self.new_symbol(name.as_str(), SymbolKind::Method, SymbolData::Value)?;
        let function_type = self.new_type_symbol("", SymbolKind::FunctionType)?;
        self.add_declaration(function_type, id);
        self.add_declaration(half, id);
        if let Some(data) = self.type_data_mut(function_type) {
            data.call_signatures.push(signature);
        }
        if let Some(t) = self.symbols.get_mut(function_type) {
            t.resolution = ResolutionState::Resolved;
        }
        if let Some(s) = self.symbols.get_mut(half) {
            s.type_id = function_type;
            s.resolution = ResolutionState::Resolved;
            s.container = accessor;
        }
        if let Some(SymbolData::Accessor(data)) = self.symbols.get_mut(accessor).map(|s| &mut s.data) {
            if is_getter {
                data.getter = half;
            } else {
                data.setter = half;
            }
        }
        Ok(accessor)
    }

    // =========================================================================
    // Signature members
    // =========================================================================

    /// Call, construct and index signatures declared as type members.
    pub(crate) fn bind_signature_member(&mut self, id: DeclId, kind: DeclKind) -> BindResult<SymbolId> {
        let symbol_kind = match kind {
            DeclKind::ConstructSignature => SymbolKind::ConstructSignature,
            DeclKind::IndexSignature => SymbolKind::IndexSignature,
            _ => SymbolKind::CallSignature,
        };
        let parent = self.decl_or_err(id)?.parent;
        let owner = self.decls.get(parent).map_or(SymbolId::NONE, |d| d.symbol);
        let signature = self.build_signature(id, symbol_kind)?;
        if let Some(s) = self.symbols.get_mut(signature) {
            s.container = owner;
        }
        if let Some(data) = self.type_data_mut(owner) {
            match symbol_kind {
                SymbolKind::ConstructSignature => data.construct_signatures.push(signature),
                SymbolKind::IndexSignature => data.index_signatures.push(signature),
                _ => data.call_signatures.push(signature),
            }
        }
        self.attach_decl(signature, id);
        Ok(signature)
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Parameters bind into the locals of their function-like owner and are
    /// appended to the owner's signature in order. A property parameter shares
    /// the symbol of the class property it declares.
    pub(crate) fn bind_parameter(&mut self, id: DeclId) -> BindResult<SymbolId> {
        let decl = self.decl_or_err(id)?;
        let (name, flags, unit, node, owner, property) =
            (decl.name.clone(), decl.flags(), decl.unit, decl.node, decl.parent, decl.value_decl);
        let scope = ParentScope::Locals(owner);

        let has_initializer = self
            .unit(unit)
            .map(|info| Arc::clone(&info.arena))
            .and_then(|arena| arena.variable(node).map(|v| v.initializer.is_some()))
            .unwrap_or(false);
        if has_initializer && let Some(d) = self.decls.get_mut(id) {
            d.add_late_flags(DeclFlags::HAS_DEFAULT_ARGS);
        }

        let symbol = if flags.contains(DeclFlags::PROPERTY_PARAMETER) && property.is_some() {
            let symbol = self.bind_decl(property)?;
            self.attach_decl(symbol, id);
            self.register(scope, flags, &name, MemberSpace::Value, symbol);
            self.caches
                .variable_groups
                .entry((owner, name.clone()))
                .or_insert_with(|| smallvec![symbol]);
            symbol
        } else {
            match self.get_existing_symbol(id, MemberSpace::Value, scope)? {
                Some(_) => self.bind_duplicate(id, SymbolKind::Parameter, SymbolData::Value)?,
                None => {
                    let symbol = self.new_symbol(name.clone(), SymbolKind::Parameter, SymbolData::Value)?;
                    self.attach_decl(symbol, id);
                    self.register(scope, flags, &name, MemberSpace::Value, symbol);
                    symbol
                }
            }
        };
        if let Some(s) = self.symbols.get_mut(symbol) {
            s.is_optional |= flags.contains(DeclFlags::OPTIONAL) || has_initializer;
            s.is_varargs |= flags.contains(DeclFlags::REST);
        }

        let signature = self.decls.get(owner).map_or(SymbolId::NONE, |d| d.signature_symbol);
        if let Some(data) = self.symbols.get_mut(signature).and_then(|s| s.signature_data_mut()) {
            data.parameters.push(symbol);
        }
        Ok(symbol)
    }
}
