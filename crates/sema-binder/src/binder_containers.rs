//! Binding of modules, import aliases and export assignments.

use crate::binder::ParentScope;
use crate::chain::SemanticInfoChain;
use crate::decl::{DeclFlags, DeclKind};
use crate::errors::BindResult;
use crate::ids::{DeclId, SymbolId};
use crate::symbol::{AliasData, MemberSpace, ResolutionState, SymbolData, SymbolKind};
use sema_common::{diagnostic_codes, limits};
use sema_syntax::{NodeData, SyntaxKind};
use std::sync::Arc;
use tracing::trace;

impl SemanticInfoChain {
    /// Namespaces and external modules. Same-flavor declarations merge into
    /// one container symbol; the members of every declaration are bound
    /// eagerly so the container's tables are complete once it is bound.
    pub(crate) fn bind_module(&mut self, id: DeclId) -> BindResult<SymbolId> {
        let scope = self.parent_scope(id)?;
        let decl = self.decl_or_err(id)?;
        let (name, kind, flags) = (decl.name.clone(), decl.kind, decl.flags());
        let symbol_kind = if kind == DeclKind::DynamicModule {
            SymbolKind::DynamicModule
        } else {
            SymbolKind::Container
        };

        let symbol = match self.get_existing_symbol(id, MemberSpace::Container, scope)? {
            Some(existing) if self.symbol_kind(existing) == Some(symbol_kind) => {
                self.check_export_mismatch(existing, id, scope);
                self.attach_decl(existing, id);
                existing
            }
            Some(_) => self.bind_duplicate(id, symbol_kind, SymbolData::Type(Box::default()))?,
            None => {
                let symbol = self.new_type_symbol(name.clone(), symbol_kind)?;
                self.attach_decl(symbol, id);
                self.register(scope, flags, &name, MemberSpace::Container, symbol);
                symbol
            }
        };

        self.bind_value_decl_of(id)?;
        self.bind_children(id)?;
        if flags.contains(DeclFlags::HAS_EXPORT_ASSIGNMENT) {
            self.bind_export_assignment(id, symbol)?;
        }
        Ok(symbol)
    }

    /// Record the target of `export = X` on the dynamic module.
    fn bind_export_assignment(&mut self, id: DeclId, module: SymbolId) -> BindResult<()> {
        let decl = self.decl_or_err(id)?;
        let (unit, node) = (decl.unit, decl.node);
        let Some(info) = self.unit(unit) else {
            return Ok(());
        };
        let arena = Arc::clone(&info.arena);
        let body = if node.is_some() { node } else { info.root_node };
        let target_name = arena
            .statements(body)
            .iter()
            .filter(|&&s| arena.kind(s) == Some(SyntaxKind::ExportAssignment))
            .find_map(|&s| match arena.get(s).map(|n| &n.data) {
                Some(NodeData::ExportAssignment(data)) => arena.identifier_text(data.name),
                _ => None,
            });
        let Some(target_name) = target_name else {
            return Ok(());
        };

        let mut target = SymbolId::NONE;
        if let Some(data) = self.type_data(module) {
            'spaces: for space in [MemberSpace::Container, MemberSpace::Type, MemberSpace::Value] {
                for member in [true, false] {
                    if let Some(found) = data.members.get(target_name, space, member) {
                        target = found;
                        break 'spaces;
                    }
                }
            }
        }
        if self.symbol_kind(target) == Some(SymbolKind::TypeAlias) {
            target = self.resolve_alias(target)?;
        }
        trace!(module = module.0, target = target.0, "export assignment");
        if let Some(data) = self.type_data_mut(module) {
            data.export_assignment = target;
        }
        Ok(())
    }

    /// `import x = ...`: an alias symbol in the container space. The target is
    /// resolved on first use.
    pub(crate) fn bind_import(&mut self, id: DeclId) -> BindResult<SymbolId> {
        let scope: ParentScope = self.parent_scope(id)?;
        let decl = self.decl_or_err(id)?;
        let (name, flags) = (decl.name.clone(), decl.flags());
        match self.get_existing_symbol(id, MemberSpace::Container, scope)? {
            Some(_) => self.bind_duplicate(id, SymbolKind::TypeAlias, SymbolData::TypeAlias(AliasData::default())),
            None => {
                let symbol = self.new_symbol(name.clone(), SymbolKind::TypeAlias, SymbolData::TypeAlias(AliasData::default()))?;
                self.attach_decl(symbol, id);
                self.register(scope, flags, &name, MemberSpace::Container, symbol);
                Ok(symbol)
            }
        }
    }

    // =========================================================================
    // Alias resolution
    // =========================================================================

    /// Resolve an import alias and return its primary target: the assigned
    /// container, else type, else value. Non-alias symbols resolve to
    /// themselves; alias cycles resolve to `NONE`.
    pub fn resolve_alias(&mut self, alias: SymbolId) -> BindResult<SymbolId> {
        let symbol = self.try_symbol(alias)?;
        let SymbolData::TypeAlias(data) = &symbol.data else {
            return Ok(alias);
        };
        match symbol.resolution {
            ResolutionState::Resolved => return Ok(primary_target(data)),
            ResolutionState::Resolving => {
                trace!(alias = alias.0, "alias cycle");
                return Ok(SymbolId::NONE);
            }
            ResolutionState::Unresolved => {}
        }
        if self.context.alias_depth >= limits::MAX_ALIAS_CHAIN_DEPTH {
            trace!(alias = alias.0, "alias chain too deep");
            return Ok(SymbolId::NONE);
        }

        self.symbol_mut(alias)?.resolution = ResolutionState::Resolving;
        self.context.alias_depth += 1;
        let result = self.resolve_alias_target(alias);
        self.context.alias_depth -= 1;

        let symbol = self.symbol_mut(alias)?;
        symbol.resolution = ResolutionState::Resolved;
        let resolved = result?;
        let SymbolData::TypeAlias(data) = &mut symbol.data else {
            return Ok(SymbolId::NONE);
        };
        data.assigned_value = resolved.assigned_value;
        data.assigned_type = resolved.assigned_type;
        data.assigned_container = resolved.assigned_container;
        data.reported_missing |= resolved.reported_missing;
        Ok(primary_target(data))
    }

    /// Target of an alias in one space (`NONE` if it assigns nothing there).
    pub fn alias_target(&mut self, alias: SymbolId, space: MemberSpace) -> BindResult<SymbolId> {
        self.resolve_alias(alias)?;
        let Some(data) = self.symbol(alias).and_then(|s| s.alias_data()) else {
            return Ok(alias);
        };
        Ok(match space {
            MemberSpace::Value => data.assigned_value,
            MemberSpace::Type => data.assigned_type,
            MemberSpace::Container => data.assigned_container,
        })
    }

    fn resolve_alias_target(&mut self, alias: SymbolId) -> BindResult<AliasData> {
        let Some(&decl) = self.declarations_of(alias).first() else {
            return Ok(AliasData::default());
        };
        let d = self.decl_or_err(decl)?;
        let (unit, node, scope) = (d.unit, d.node, d.parent);
        let Some(info) = self.unit(unit) else {
            return Ok(AliasData::default());
        };
        let arena = Arc::clone(&info.arena);
        let Some(NodeData::Import(import)) = arena.get(node).map(|n| &n.data) else {
            return Ok(AliasData::default());
        };

        if import.is_external {
            let module_name = import
                .reference
                .first()
                .and_then(|&n| arena.identifier_text(n))
                .unwrap_or_default()
                .to_string();
            let module = self.find_external_module(&module_name)?;
            if module.is_none() {
                let already_reported = self
                    .symbol(alias)
                    .and_then(|s| s.alias_data())
                    .is_some_and(|d| d.reported_missing);
                if !already_reported {
                    self.report(decl, diagnostic_codes::CANNOT_FIND_MODULE, &[&module_name]);
                }
                return Ok(AliasData {
                    reported_missing: true,
                    ..AliasData::default()
                });
            }
            let exported = self.type_data(module).map_or(SymbolId::NONE, |d| d.export_assignment);
            if exported.is_some() {
                return Ok(self.alias_data_for(exported));
            }
            return Ok(AliasData {
                assigned_container: module,
                ..AliasData::default()
            });
        }

        let segments: Vec<String> = import
            .reference
            .iter()
            .filter_map(|&n| arena.identifier_text(n).map(str::to_string))
            .collect();
        let mut assigned_container = self.resolve_name_path(scope, &segments, MemberSpace::Container)?;
        if self.symbol_kind(assigned_container) == Some(SymbolKind::TypeAlias) {
            assigned_container = self.alias_target(assigned_container, MemberSpace::Container)?;
        }
        Ok(AliasData {
            assigned_container,
            assigned_type: self.resolve_name_path(scope, &segments, MemberSpace::Type)?,
            assigned_value: self.resolve_name_path(scope, &segments, MemberSpace::Value)?,
            reported_missing: false,
        })
    }

    /// Slot an alias target into the space its kind belongs to.
    fn alias_data_for(&self, target: SymbolId) -> AliasData {
        let mut data = AliasData::default();
        match self.symbol(target) {
            Some(s) if s.kind == SymbolKind::TypeAlias => {
                if let Some(inner) = s.alias_data() {
                    data = inner.clone();
                    data.reported_missing = false;
                }
            }
            Some(s) if s.kind.is_container() => data.assigned_container = target,
            Some(s) if s.kind.is_type() => data.assigned_type = target,
            Some(_) => data.assigned_value = target,
            None => {}
        }
        data
    }
}

fn primary_target(data: &AliasData) -> SymbolId {
    [data.assigned_container, data.assigned_type, data.assigned_value]
        .into_iter()
        .find(|s| s.is_some())
        .unwrap_or(SymbolId::NONE)
}
