//! Binding of values: implicit values of classes, namespaces and enums,
//! variables, properties and enum members.
//!
//! Implicit values follow a fixed merge table keyed on the flavor of the
//! value already bound under the same name:
//!
//! | existing \ new       | namespace / enum value | class constructor        |
//! |----------------------|------------------------|--------------------------|
//! | namespace / enum     | merge                  | ambient class: take over |
//! | function             | merge                  | duplicate                |
//! | class constructor    | merge (namespace only) | merge (partial class)    |
//! | anything else        | duplicate              | duplicate                |

use crate::binder::ParentScope;
use crate::chain::SemanticInfoChain;
use crate::decl::{DeclFlags, DeclKind};
use crate::errors::BindResult;
use crate::ids::{DeclId, SymbolId};
use crate::symbol::{MemberSpace, ResolutionState, SignatureData, SymbolData, SymbolKind};
use sema_common::diagnostic_codes;
use smallvec::{SmallVec, smallvec};
use tracing::trace;

/// What kind of value a bound value symbol is, for merge decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ValueFlavor {
    ClassConstructor,
    ModuleValue,
    EnumValue,
    Function,
    Method,
    Variable,
    Parameter,
    Other,
}

impl ValueFlavor {
    fn is_module_or_enum(self) -> bool {
        matches!(self, ValueFlavor::ModuleValue | ValueFlavor::EnumValue)
    }
}

impl SemanticInfoChain {
    pub(crate) fn value_flavor(&self, symbol: SymbolId) -> ValueFlavor {
        let Some(s) = self.symbol(symbol) else {
            return ValueFlavor::Other;
        };
        match s.kind {
            SymbolKind::Function => ValueFlavor::Function,
            SymbolKind::Method => ValueFlavor::Method,
            SymbolKind::ConstructorMethod => ValueFlavor::ClassConstructor,
            SymbolKind::Variable | SymbolKind::Parameter => {
                let Some(first) = self.declarations_of(symbol).first().and_then(|&d| self.decls.get(d)) else {
                    return ValueFlavor::Other;
                };
                if first.is_synthesized && first.has_flag(DeclFlags::ENUM) {
                    ValueFlavor::EnumValue
                } else if first.is_synthesized && first.has_flag(DeclFlags::SOME_INITIALIZED_MODULE) {
                    ValueFlavor::ModuleValue
                } else if first.kind == DeclKind::Parameter {
                    ValueFlavor::Parameter
                } else {
                    ValueFlavor::Variable
                }
            }
            _ => ValueFlavor::Other,
        }
    }

    /// Owner (class, namespace or enum decl) of the implicit value that first
    /// declared `symbol`, or the first decl itself for ordinary values.
    pub(crate) fn implicit_value_owner(&self, symbol: SymbolId) -> DeclId {
        let Some(&first) = self.declarations_of(symbol).first() else {
            return DeclId::NONE;
        };
        match self.decls.get(first) {
            Some(d) if d.is_synthesized => d.value_decl,
            _ => first,
        }
    }

    // =========================================================================
    // Implicit values
    // =========================================================================

    /// Bind the synthesized value decl of a class, namespace or enum.
    pub(crate) fn bind_implicit_value(&mut self, value: DeclId) -> BindResult<SymbolId> {
        let scope = self.parent_scope(value)?;
        let decl = self.decl_or_err(value)?;
        let (flags, owner) = (decl.flags(), decl.value_decl);
        let flavor = if flags.contains(DeclFlags::CLASS_CONSTRUCTOR_VARIABLE) {
            ValueFlavor::ClassConstructor
        } else if flags.contains(DeclFlags::ENUM) {
            ValueFlavor::EnumValue
        } else {
            ValueFlavor::ModuleValue
        };
        let owner_symbol = self.decls.get(owner).map_or(SymbolId::NONE, |d| d.symbol);
        // The owner was already reported as a duplicate; don't report its
        // value a second time at the same place.
        let owner_failed = self
            .symbol(owner_symbol)
            .is_some_and(|s| s.type_id == self.primitives.error);

        let existing = self.get_existing_symbol(value, MemberSpace::Value, scope)?;
        let Some(existing) = existing else {
            return self.create_implicit_value(value, owner, owner_symbol, flavor, Some(scope));
        };
        if owner_failed {
            return self.create_implicit_value(value, owner, owner_symbol, flavor, None);
        }

        let existing_flavor = self.value_flavor(existing);
        trace!(decl = value.0, ?flavor, ?existing_flavor, "implicit value merge");
        match (existing_flavor, flavor) {
            (a, b) if a.is_module_or_enum() && b.is_module_or_enum() => {
                self.merge_implicit_value(existing, value, owner_symbol);
                Ok(existing)
            }
            (ValueFlavor::Function, b) if b.is_module_or_enum() => {
                self.check_module_after_value(existing, owner);
                self.merge_implicit_value(existing, value, owner_symbol);
                Ok(existing)
            }
            (ValueFlavor::ClassConstructor, ValueFlavor::ModuleValue) => {
                self.check_module_after_value(existing, owner);
                self.merge_implicit_value(existing, value, owner_symbol);
                Ok(existing)
            }
            (ValueFlavor::ClassConstructor, ValueFlavor::ClassConstructor) => {
                // Partial class: one constructor value, one constructor type.
                self.attach_decl(existing, value);
                let constructor_type = self.symbol(existing).map_or(SymbolId::NONE, |s| s.type_id);
                self.add_declaration(constructor_type, owner);
                let signature = self.type_data(constructor_type).map_or(SymbolId::NONE, |d| d.default_construct_signature);
                if let Some(d) = self.decls.get_mut(value) {
                    d.signature_symbol = signature;
                }
                Ok(existing)
            }
            (ValueFlavor::ModuleValue, ValueFlavor::ClassConstructor) => {
                self.bind_class_after_module(value, owner, owner_symbol, existing)
            }
            _ => {
                let display = self.display_name(value);
                self.report(value, diagnostic_codes::DUPLICATE_IDENTIFIER, &[&display]);
                let symbol = self.create_implicit_value(value, owner, owner_symbol, flavor, None)?;
                if flavor != ValueFlavor::ClassConstructor {
                    self.downgrade_to_error(symbol);
                }
                Ok(symbol)
            }
        }
    }

    /// New implicit value. Registered in `scope` when one is given.
    fn create_implicit_value(
        &mut self,
        value: DeclId,
        owner: DeclId,
        owner_symbol: SymbolId,
        flavor: ValueFlavor,
        scope: Option<ParentScope>,
    ) -> BindResult<SymbolId> {
        let name = self.decls.get(value).map(|d| d.name.clone()).unwrap_or_default();
        let flags = self.decl_flags(value);
        let symbol = if flavor == ValueFlavor::ClassConstructor {
            let symbol = self.new_symbol(name.as_str(), SymbolKind::ConstructorMethod, SymbolData::Value)?;
            self.attach_decl(symbol, value);
            self.build_constructor_type(symbol, value, owner, owner_symbol)?;
            symbol
        } else {
            let symbol = self.new_symbol(name.as_str(), SymbolKind::Variable, SymbolData::Value)?;
            self.attach_decl(symbol, value);
            if let Some(s) = self.symbols.get_mut(symbol) {
                s.type_id = owner_symbol;
                s.resolution = ResolutionState::Resolved;
            }
            if let Some(data) = self.type_data_mut(owner_symbol)
                && data.instance_symbol.is_none()
            {
                data.instance_symbol = symbol;
            }
            symbol
        };
        if let Some(scope) = scope {
            self.register(scope, flags, &name, MemberSpace::Value, symbol);
        }
        Ok(symbol)
    }

    /// Give a class constructor value its constructor type with the implicit
    /// zero-argument construct signature.
    fn build_constructor_type(
        &mut self,
        constructor: SymbolId,
        value: DeclId,
        class_decl: DeclId,
        class: SymbolId,
    ) -> BindResult<()> {
        let name = self.symbol(constructor).map(|s| s.name.clone()).unwrap_or_default();
        let type_parameters = self
            .symbol(class)
            .map(|s| s.type_parameters().to_vec())
            .unwrap_or_default();
        let constructor_type = self.new_type_symbol(name, SymbolKind::ConstructorType)?;
        self.add_declaration(constructor_type, class_decl);

        let signature = self.new_symbol(
            "",
            SymbolKind::ConstructSignature,
            SymbolData::Signature(Box::new(SignatureData {
                return_type: class,
                is_generic: !type_parameters.is_empty(),
                type_parameters,
                ..SignatureData::default()
            })),
        )?;
        self.add_declaration(signature, value);
        if let Some(s) = self.symbols.get_mut(signature) {
            s.resolution = ResolutionState::Resolved;
            s.container = constructor_type;
        }
        if let Some(d) = self.decls.get_mut(value) {
            d.signature_symbol = signature;
        }

        if let Some(t) = self.symbols.get_mut(constructor_type) {
            t.resolution = ResolutionState::Resolved;
            t.container = constructor;
        }
        if let Some(data) = self.type_data_mut(constructor_type) {
            data.construct_signatures.push(signature);
            data.default_construct_signature = signature;
        }
        if let Some(s) = self.symbols.get_mut(constructor) {
            s.type_id = constructor_type;
            s.resolution = ResolutionState::Resolved;
        }
        if let Some(data) = self.type_data_mut(class)
            && data.constructor_method.is_none()
        {
            data.constructor_method = constructor;
        }
        Ok(())
    }

    /// Attach a namespace or enum value to the value it merges with and link
    /// the container to it.
    fn merge_implicit_value(&mut self, existing: SymbolId, value: DeclId, owner_symbol: SymbolId) {
        self.attach_decl(existing, value);
        if let Some(data) = self.type_data_mut(owner_symbol)
            && data.instance_symbol.is_none()
        {
            data.instance_symbol = existing;
        }
        let Some(kind) = self.symbol_kind(existing) else { return };
        let value_type = self.symbol(existing).map_or(SymbolId::NONE, |s| s.type_id);
        match kind {
            SymbolKind::Function => {
                if let Some(data) = self.type_data_mut(value_type)
                    && data.associated_container.is_none()
                {
                    data.associated_container = owner_symbol;
                }
            }
            SymbolKind::ConstructorMethod => {
                if let Some(data) = self.type_data_mut(value_type)
                    && data.associated_container.is_none()
                {
                    data.associated_container = owner_symbol;
                }
                let class_decl = self.implicit_value_owner(existing);
                let class = self.decls.get(class_decl).map_or(SymbolId::NONE, |d| d.symbol);
                if let Some(data) = self.type_data_mut(class)
                    && data.associated_container.is_none()
                {
                    data.associated_container = owner_symbol;
                }
            }
            _ => {}
        }
    }

    /// A non-ambient class or function merged with a namespace declared in
    /// another file.
    fn check_module_after_value(&mut self, existing: SymbolId, module_decl: DeclId) {
        let value_decl = self.implicit_value_owner(existing);
        let Some(value) = self.decls.get(value_decl) else { return };
        let (value_unit, value_ambient) = (value.unit, value.has_flag(DeclFlags::AMBIENT));
        let module_unit = self.decls.get(module_decl).map(|d| d.unit);
        if value_ambient || module_unit == Some(value_unit) {
            return;
        }
        let display = self.display_name(module_decl);
        self.report_related(
            module_decl,
            diagnostic_codes::NAMESPACE_IN_DIFFERENT_FILE_FROM_MERGED_VALUE,
            &[&display],
            value_decl,
        );
        self.downgrade_to_error(existing);
    }

    /// A class declared after a namespace of the same name. An ambient class
    /// takes over the namespace value; otherwise the namespace came first
    /// illegally and the class gets a value of its own.
    fn bind_class_after_module(
        &mut self,
        value: DeclId,
        class_decl: DeclId,
        class: SymbolId,
        existing: SymbolId,
    ) -> BindResult<SymbolId> {
        let module_decl = self.implicit_value_owner(existing);
        if !self.decl_flags(class_decl).contains(DeclFlags::AMBIENT) {
            let display = self.display_name(module_decl);
            self.report(module_decl, diagnostic_codes::NAMESPACE_BEFORE_MERGED_VALUE, &[&display]);
            return self.create_implicit_value(value, class_decl, class, ValueFlavor::ClassConstructor, None);
        }
        let container = self.symbol(existing).map_or(SymbolId::NONE, |s| s.type_id);
        if let Some(s) = self.symbols.get_mut(existing) {
            s.kind = SymbolKind::ConstructorMethod;
        }
        self.attach_decl(existing, value);
        self.build_constructor_type(existing, value, class_decl, class)?;
        let constructor_type = self.symbol(existing).map_or(SymbolId::NONE, |s| s.type_id);
        for symbol in [class, constructor_type] {
            if let Some(data) = self.type_data_mut(symbol) {
                data.associated_container = container;
            }
        }
        Ok(existing)
    }

    // =========================================================================
    // Variables, properties and enum members
    // =========================================================================

    /// Same-scope variables (and a variable redeclaring a parameter, property
    /// parameters included) get distinct symbols joined in one variable
    /// declaration group.
    pub(crate) fn bind_variable(&mut self, id: DeclId) -> BindResult<SymbolId> {
        let scope = self.parent_scope(id)?;
        let decl = self.decl_or_err(id)?;
        let (name, flags, parent) = (decl.name.clone(), decl.flags(), decl.parent);
        let Some(existing) = self.get_existing_symbol(id, MemberSpace::Value, scope)? else {
            let symbol = self.new_symbol(name.clone(), SymbolKind::Variable, SymbolData::Value)?;
            self.attach_decl(symbol, id);
            self.register(scope, flags, &name, MemberSpace::Value, symbol);
            return Ok(symbol);
        };
        match self.value_flavor(existing) {
            ValueFlavor::Variable | ValueFlavor::Parameter => {
                self.check_export_mismatch(existing, id, scope);
                let group_scope = self
                    .declarations_of(existing)
                    .first()
                    .and_then(|&d| self.decls.get(d))
                    .map_or(DeclId::NONE, |d| d.parent);
                self.join_variable_group(existing, id, group_scope, name)
            }
            _ if self.starts_group(existing, parent, &name) => self.join_variable_group(existing, id, parent, name),
            _ => self.bind_duplicate(id, SymbolKind::Variable, SymbolData::Value),
        }
    }

    /// Whether `symbol` opened the variable declaration group of `name` in
    /// `scope` (a property parameter does so for its constructor).
    fn starts_group(&self, symbol: SymbolId, scope: DeclId, name: &str) -> bool {
        self.caches
            .variable_groups
            .get(&(scope, name.to_string()))
            .is_some_and(|group| group.first() == Some(&symbol))
    }

    /// A new variable symbol for `id`, appended to the group `existing`
    /// belongs to.
    fn join_variable_group(&mut self, existing: SymbolId, id: DeclId, group_scope: DeclId, name: String) -> BindResult<SymbolId> {
        let symbol = self.new_symbol(name.clone(), SymbolKind::Variable, SymbolData::Value)?;
        self.attach_decl(symbol, id);
        let container = self.symbol(existing).map_or(SymbolId::NONE, |e| e.container);
        if let Some(s) = self.symbols.get_mut(symbol) {
            s.container = container;
        }
        self.caches
            .variable_groups
            .entry((group_scope, name))
            .or_insert_with(|| smallvec![existing])
            .push(symbol);
        Ok(symbol)
    }

    /// Every symbol of the variable declaration group `symbol` belongs to, in
    /// declaration order; just `symbol` when it shares its name with no one.
    pub fn variable_group(&self, symbol: SymbolId) -> SmallVec<[SymbolId; 2]> {
        self.caches
            .variable_groups
            .values()
            .find(|group| group.contains(&symbol))
            .cloned()
            .unwrap_or_else(|| smallvec![symbol])
    }

    pub(crate) fn bind_property(&mut self, id: DeclId) -> BindResult<SymbolId> {
        let scope = self.parent_scope(id)?;
        let decl = self.decl_or_err(id)?;
        let (name, flags) = (decl.name.clone(), decl.flags());
        let symbol = match self.get_existing_symbol(id, MemberSpace::Value, scope)? {
            Some(_) => self.bind_duplicate(id, SymbolKind::Property, SymbolData::Value)?,
            None => {
                let symbol = self.new_symbol(name.clone(), SymbolKind::Property, SymbolData::Value)?;
                self.attach_decl(symbol, id);
                self.register(scope, flags, &name, MemberSpace::Value, symbol);
                symbol
            }
        };
        if let Some(s) = self.symbols.get_mut(symbol) {
            s.is_optional = flags.contains(DeclFlags::OPTIONAL);
        }
        Ok(symbol)
    }

    /// Enum members are typed by their enum.
    pub(crate) fn bind_enum_member(&mut self, id: DeclId) -> BindResult<SymbolId> {
        let scope = self.parent_scope(id)?;
        let decl = self.decl_or_err(id)?;
        let (name, flags, parent) = (decl.name.clone(), decl.flags(), decl.parent);
        let symbol = match self.get_existing_symbol(id, MemberSpace::Value, scope)? {
            Some(_) => return self.bind_duplicate(id, SymbolKind::EnumMember, SymbolData::Value),
            None => self.new_symbol(name.clone(), SymbolKind::EnumMember, SymbolData::Value)?,
        };
        let enum_symbol = self.decls.get(parent).map_or(SymbolId::NONE, |d| d.symbol);
        if let Some(s) = self.symbols.get_mut(symbol) {
            s.type_id = enum_symbol;
            s.resolution = ResolutionState::Resolved;
        }
        self.attach_decl(symbol, id);
        self.register(scope, flags, &name, MemberSpace::Value, symbol);
        Ok(symbol)
    }
}
