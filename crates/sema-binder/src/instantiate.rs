//! Generic instantiation.
//!
//! Instantiating a generic type produces a *rooted view*: a symbol whose
//! `root` is the generic symbol and which carries the substitution in its
//! [`InstantiationInfo`]. Views never copy the root's tables. Members and
//! signatures are instantiated one by one when first asked for and cached on
//! the view; a member whose type does not mention any substituted parameter
//! is shared with the root.
//!
//! Views are cached on the root by the canonical signature of their
//! substitution, so instantiating the same type twice with equal arguments
//! yields the same symbol.

use crate::chain::SemanticInfoChain;
use crate::decl::{DeclFlags, DeclKind};
use crate::errors::{BindResult, BinderError};
use crate::ids::{DeclId, SymbolId};
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::substitution::SubstitutionMap;
use crate::symbol::{
    InstantiationInfo, MemberSpace, ResolutionState, SignatureData, SymbolData, SymbolInit,
    SymbolKind, TypeData,
};
use rustc_hash::FxHashSet;
use sema_common::limits;
use std::cell::OnceCell;
use std::fmt::Write;
use tracing::trace;

/// Per-view lists filled lazily from the root.
#[derive(Clone, Copy)]
enum ViewList {
    Call,
    Construct,
    Index,
    Extended,
}

impl ViewList {
    fn of_root(self, data: &TypeData) -> &[SymbolId] {
        match self {
            ViewList::Call => &data.call_signatures,
            ViewList::Construct => &data.construct_signatures,
            ViewList::Index => &data.index_signatures,
            ViewList::Extended => &data.extended_types,
        }
    }

    fn cell(self, info: &InstantiationInfo) -> &OnceCell<Vec<SymbolId>> {
        match self {
            ViewList::Call => &info.call_signatures,
            ViewList::Construct => &info.construct_signatures,
            ViewList::Index => &info.index_signatures,
            ViewList::Extended => &info.extended_types,
        }
    }
}

/// How the own type parameters of a signature are treated.
#[derive(Clone, Copy, PartialEq, Eq)]
enum SignatureMode {
    /// Unmapped own parameters get fresh symbols (instantiation through an
    /// enclosing type).
    Enclosing,
    /// Explicit type arguments of a call; unmapped parameters are kept.
    Call,
}

impl SemanticInfoChain {
    // =========================================================================
    // Types
    // =========================================================================

    /// Apply `map` to `ty`.
    ///
    /// Type parameters are replaced, arrays are rebuilt around their
    /// instantiated element, and classes, interfaces and type literals become
    /// rooted views. Everything else is returned unchanged.
    #[tracing::instrument(level = "trace", skip(self, map))]
    pub fn instantiate_type(&mut self, ty: SymbolId, map: &SubstitutionMap) -> BindResult<SymbolId> {
        if ty.is_none() || map.is_empty() {
            return Ok(ty);
        }
        if self.context.instantiation_depth >= self.options.max_instantiation_depth {
            return Err(BinderError::ResolutionDepthExceeded {
                what: "instantiation",
                limit: self.options.max_instantiation_depth,
            });
        }
        self.context.instantiation_depth += 1;
        let result = stacker::maybe_grow(limits::STACK_RED_ZONE, limits::STACK_GROWTH_SIZE, || {
            self.instantiate_type_inner(ty, map)
        });
        self.context.instantiation_depth -= 1;
        result
    }

    fn instantiate_type_inner(&mut self, ty: SymbolId, map: &SubstitutionMap) -> BindResult<SymbolId> {
        let ty = self.resolve_reference(ty)?;
        match self.try_symbol(ty)?.kind {
            SymbolKind::TypeParameter => Ok(map.get(ty).unwrap_or(ty)),
            SymbolKind::Array => {
                let element = self.type_data(ty).map_or(SymbolId::NONE, |d| d.element_type);
                let instantiated = self.instantiate_type(element, map)?;
                if instantiated == element {
                    return Ok(ty);
                }
                self.array_of(instantiated)
            }
            SymbolKind::Class
            | SymbolKind::Interface
            | SymbolKind::ObjectType
            | SymbolKind::FunctionType
            | SymbolKind::ConstructorType => self.instantiate_generic(ty, map),
            _ => Ok(ty),
        }
    }

    /// Compose the substitution `ty` already carries with `map`, restrict it
    /// to the parameters visible at the root's declaration and look up or
    /// allocate the view.
    fn instantiate_generic(&mut self, ty: SymbolId, map: &SubstitutionMap) -> BindResult<SymbolId> {
        let root = self.root_of(ty);
        let carried: Vec<(SymbolId, SymbolId)> = self
            .symbol(ty)
            .and_then(|s| s.instantiation())
            .map(|info| info.substitution.iter().collect())
            .unwrap_or_default();

        let mut composed = SubstitutionMap::new();
        for (parameter, argument) in carried {
            composed.insert(parameter, self.instantiate_type(argument, map)?);
        }
        let visible = match self.declarations_of(root).first().copied() {
            Some(decl) => self.visible_type_parameters(decl)?,
            None => Vec::new(),
        };
        let mut substitution = SubstitutionMap::new();
        for &parameter in &visible {
            if let Some(argument) = composed.get(parameter).or_else(|| map.get(parameter)) {
                substitution.insert(parameter, argument);
            }
        }
        if substitution.is_empty() || substitution.is_identity() {
            return Ok(root);
        }

        let key = self.canonical_signature(&substitution)?;
        if let Some(&view) = self.type_data(root).and_then(|d| d.specializations.get(&key)) {
            return Ok(view);
        }

        let root_symbol = self.try_symbol(root)?;
        let (name, kind, container) = (root_symbol.name.clone(), root_symbol.kind, root_symbol.container);
        let type_arguments: Vec<SymbolId> = root_symbol
            .type_parameters()
            .iter()
            .map(|&p| substitution.get(p).unwrap_or(p))
            .collect();
        let data = TypeData {
            instantiation: Some(Box::new(InstantiationInfo::new(substitution, type_arguments))),
            ..TypeData::default()
        };
        let view = self
            .symbols
            .alloc(SymbolInit::new(name, kind, SymbolData::Type(Box::new(data))).rooted(root))?;
        if let Some(s) = self.symbols.get_mut(view) {
            s.resolution = ResolutionState::Resolved;
            s.container = container;
        }
        trace!(root = root.0, view = view.0, %key, "new instantiation");
        if let Some(data) = self.type_data_mut(root) {
            data.specializations.insert(key, view);
        }
        Ok(view)
    }

    /// Type parameters in scope at `decl`, outermost first.
    ///
    /// Classes and interfaces only see their own. Static members do not see
    /// the class's. Function-likes add their own to their parent's; members,
    /// parameters and literals inherit their parent's. Modules, enums and
    /// scripts see none.
    fn visible_type_parameters(&mut self, decl: DeclId) -> BindResult<Vec<SymbolId>> {
        let Some(d) = self.decls.get(decl) else {
            return Ok(Vec::new());
        };
        let (kind, parent, is_static) = (d.kind, d.parent, d.has_flag(DeclFlags::STATIC));
        match kind {
            DeclKind::Class | DeclKind::Interface => self.own_type_parameters(decl),
            DeclKind::Method if is_static => self.own_type_parameters(decl),
            DeclKind::Property | DeclKind::GetAccessor | DeclKind::SetAccessor if is_static => Ok(Vec::new()),
            DeclKind::Function
            | DeclKind::Method
            | DeclKind::FunctionType
            | DeclKind::ConstructorType
            | DeclKind::CallSignature
            | DeclKind::ConstructSignature
            | DeclKind::FunctionExpression => {
                let mut visible = self.visible_type_parameters(parent)?;
                for own in self.own_type_parameters(decl)? {
                    if !visible.contains(&own) {
                        visible.push(own);
                    }
                }
                Ok(visible)
            }
            DeclKind::Script
            | DeclKind::Global
            | DeclKind::Container
            | DeclKind::DynamicModule
            | DeclKind::Enum
            | DeclKind::Primitive => Ok(Vec::new()),
            _ => self.visible_type_parameters(parent),
        }
    }

    fn own_type_parameters(&mut self, decl: DeclId) -> BindResult<Vec<SymbolId>> {
        let children = self.decls.get(decl).map(|d| d.children.clone()).unwrap_or_default();
        let mut own = Vec::new();
        for child in children {
            if self.decls.get(child).is_some_and(|c| c.kind == DeclKind::TypeParameter) {
                let symbol = self.bind_decl(child)?;
                if symbol.is_some() && !own.contains(&symbol) {
                    own.push(symbol);
                }
            }
        }
        Ok(own)
    }

    /// Arguments of an instantiated class or interface, in parameter order.
    /// A generic root reports its own parameters.
    pub fn type_arguments_of(&self, ty: SymbolId) -> Vec<SymbolId> {
        let Some(symbol) = self.symbol(ty) else {
            return Vec::new();
        };
        if let Some(info) = symbol.instantiation() {
            return info.type_arguments.clone();
        }
        match symbol.kind {
            SymbolKind::Class | SymbolKind::Interface => symbol.type_parameters().to_vec(),
            _ => Vec::new(),
        }
    }

    // =========================================================================
    // Canonical signatures
    // =========================================================================

    /// Deterministic text key of a substitution. Equal keys mean equal
    /// substitutions; views and signature specializations are cached by it.
    pub fn canonical_signature(&mut self, map: &SubstitutionMap) -> BindResult<String> {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::CanonicalSignature);
        let mut out = String::new();
        for (parameter, argument) in map.iter() {
            let _ = write!(out, "{}=", parameter.0);
            self.canonical_type(argument, &mut guard, &mut out)?;
            out.push(';');
        }
        Ok(out)
    }

    fn canonical_type(&mut self, ty: SymbolId, guard: &mut RecursionGuard<SymbolId>, out: &mut String) -> BindResult<()> {
        if ty.is_none() {
            out.push('_');
            return Ok(());
        }
        match guard.enter(ty) {
            RecursionResult::Entered => {}
            RecursionResult::Cycle => {
                let _ = write!(out, "@{}", ty.0);
                return Ok(());
            }
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {
                out.push('!');
                return Ok(());
            }
        }
        let result = self.canonical_type_inner(ty, guard, out);
        guard.leave(ty);
        result
    }

    fn canonical_type_inner(&mut self, ty: SymbolId, guard: &mut RecursionGuard<SymbolId>, out: &mut String) -> BindResult<()> {
        let ty = self.resolve_reference(ty)?;
        let symbol = self.try_symbol(ty)?;
        let kind = symbol.kind;
        if let Some(info) = symbol.instantiation() {
            let entries: Vec<(SymbolId, SymbolId)> = info.substitution.iter().collect();
            let _ = write!(out, "#{}<", symbol.root.0);
            for (parameter, argument) in entries {
                let _ = write!(out, "{}=", parameter.0);
                self.canonical_type(argument, guard, out)?;
                out.push(',');
            }
            out.push('>');
            return Ok(());
        }
        match kind {
            SymbolKind::Array => {
                let element = self.type_data(ty).map_or(SymbolId::NONE, |d| d.element_type);
                out.push('[');
                self.canonical_type(element, guard, out)?;
                out.push(']');
            }
            SymbolKind::ObjectType | SymbolKind::FunctionType | SymbolKind::ConstructorType => {
                let Some(data) = self.type_data(ty) else {
                    return Ok(());
                };
                let members: Vec<(String, SymbolId)> = data
                    .members
                    .iter(MemberSpace::Value, true)
                    .map(|(name, member)| (name.to_string(), member))
                    .collect();
                let signatures: Vec<(&'static str, &'static str, SymbolId)> = data
                    .call_signatures
                    .iter()
                    .map(|&s| ("(", ")", s))
                    .chain(data.construct_signatures.iter().map(|&s| ("new(", ")", s)))
                    .chain(data.index_signatures.iter().map(|&s| ("[", "]", s)))
                    .collect();
                out.push('{');
                for (name, member) in members {
                    let optional = self.symbol(member).is_some_and(|m| m.is_optional);
                    let member_type = self.declared_type_of(member)?;
                    let _ = write!(out, "{name}:");
                    self.canonical_type(member_type, guard, out)?;
                    if optional {
                        out.push('?');
                    }
                    out.push(';');
                }
                for (open, close, signature) in signatures {
                    out.push_str(open);
                    self.canonical_signature_shape(signature, guard, out)?;
                    out.push_str(close);
                }
                out.push('}');
            }
            _ => {
                let _ = write!(out, "#{}", ty.0);
            }
        }
        Ok(())
    }

    /// `<n>(p1,p2)=>r` for a signature with `n` own type parameters.
    fn canonical_signature_shape(&mut self, signature: SymbolId, guard: &mut RecursionGuard<SymbolId>, out: &mut String) -> BindResult<()> {
        let Some(data) = self.symbol(signature).and_then(|s| s.signature_data()) else {
            return Ok(());
        };
        let (parameters, return_type, arity) = (data.parameters.clone(), data.return_type, data.type_parameters.len());
        let _ = write!(out, "<{arity}>(");
        for parameter in parameters {
            let parameter_type = self.declared_type_of(parameter)?;
            self.canonical_type(parameter_type, guard, out)?;
            out.push(',');
        }
        out.push_str(")=>");
        self.canonical_type(return_type, guard, out)
    }

    // =========================================================================
    // Members of views
    // =========================================================================

    pub(crate) fn substitution_of(&self, view: SymbolId) -> SubstitutionMap {
        self.symbol(view)
            .and_then(|s| s.instantiation())
            .map(|info| info.substitution.clone())
            .unwrap_or_default()
    }

    fn instantiation_mut(&mut self, view: SymbolId) -> Option<&mut InstantiationInfo> {
        self.type_data_mut(view).and_then(|d| d.instantiation.as_deref_mut())
    }

    /// Member `name` of `ty` in `space`. On a view, value members are
    /// instantiated on first access.
    pub fn find_member(&mut self, ty: SymbolId, name: &str, space: MemberSpace) -> BindResult<SymbolId> {
        let ty = self.resolve_reference(ty)?;
        let root = self.root_of(ty);
        let Some(root_member) = self.type_data(root).and_then(|d| d.members.get(name, space, true)) else {
            return Ok(SymbolId::NONE);
        };
        if root == ty || space != MemberSpace::Value {
            return Ok(root_member);
        }
        let cache_key = (name.to_string(), space);
        if let Some(&cached) = self
            .symbol(ty)
            .and_then(|s| s.instantiation())
            .and_then(|info| info.member_cache.get(&cache_key))
        {
            return Ok(cached);
        }
        let map = self.substitution_of(ty);
        let member = self.instantiate_member(ty, root_member, &map)?;
        if let Some(info) = self.instantiation_mut(ty) {
            info.member_cache.insert(cache_key, member);
        }
        Ok(member)
    }

    /// Every member of `ty` in `space`, in registration order.
    pub fn members_of(&mut self, ty: SymbolId, space: MemberSpace) -> BindResult<Vec<SymbolId>> {
        let ty = self.resolve_reference(ty)?;
        let root = self.root_of(ty);
        let Some(data) = self.type_data(root) else {
            return Ok(Vec::new());
        };
        let entries: Vec<(String, SymbolId)> = data
            .members
            .iter(space, true)
            .map(|(name, member)| (name.to_string(), member))
            .collect();
        if root == ty || space != MemberSpace::Value {
            return Ok(entries.into_iter().map(|(_, member)| member).collect());
        }

        let complete = self.symbol(ty).and_then(|s| s.instantiation()).is_some_and(|i| i.members_complete);
        let mut members = Vec::with_capacity(entries.len());
        for (name, _) in entries {
            if complete
                && let Some(&cached) = self
                    .symbol(ty)
                    .and_then(|s| s.instantiation())
                    .and_then(|info| info.member_cache.get(&(name.clone(), space)))
            {
                members.push(cached);
                continue;
            }
            members.push(self.find_member(ty, &name, space)?);
        }
        if let Some(info) = self.instantiation_mut(ty) {
            info.members_complete = true;
        }
        Ok(members)
    }

    /// Share `member` when its type does not depend on `map`; otherwise
    /// create a rooted member of `view` with the instantiated type.
    fn instantiate_member(&mut self, view: SymbolId, member: SymbolId, map: &SubstitutionMap) -> BindResult<SymbolId> {
        let declared = self.declared_type_of(member)?;
        let parameters: FxHashSet<SymbolId> = map.keys().collect();
        if !self.type_mentions(declared, &parameters)? {
            return Ok(member);
        }
        let ty = self.instantiate_type(declared, map)?;
        let source = self.try_symbol(member)?;
        let (name, kind, is_optional) = (source.name.clone(), source.kind, source.is_optional);
        let instantiated = self
            .symbols
            .alloc(SymbolInit::new(name, kind, SymbolData::Value).rooted(member))?;
        if let Some(s) = self.symbols.get_mut(instantiated) {
            s.type_id = ty;
            s.resolution = ResolutionState::Resolved;
            s.container = view;
            s.is_optional = is_optional;
        }
        Ok(instantiated)
    }

    // =========================================================================
    // Signature and heritage lists of views
    // =========================================================================

    pub fn call_signatures(&mut self, ty: SymbolId) -> BindResult<Vec<SymbolId>> {
        self.view_list(ty, ViewList::Call)
    }

    pub fn construct_signatures(&mut self, ty: SymbolId) -> BindResult<Vec<SymbolId>> {
        self.view_list(ty, ViewList::Construct)
    }

    pub fn index_signatures(&mut self, ty: SymbolId) -> BindResult<Vec<SymbolId>> {
        self.view_list(ty, ViewList::Index)
    }

    /// Base types of a class or interface, instantiated for views.
    pub fn extended_types(&mut self, ty: SymbolId) -> BindResult<Vec<SymbolId>> {
        self.view_list(ty, ViewList::Extended)
    }

    fn view_list(&mut self, ty: SymbolId, list: ViewList) -> BindResult<Vec<SymbolId>> {
        let ty = self.resolve_reference(ty)?;
        let root = self.root_of(ty);
        let Some(data) = self.type_data(root) else {
            return Ok(Vec::new());
        };
        let root_list = list.of_root(data).to_vec();
        if root == ty {
            return Ok(root_list);
        }
        if let Some(cached) = self
            .symbol(ty)
            .and_then(|s| s.instantiation())
            .and_then(|info| list.cell(info).get())
        {
            return Ok(cached.clone());
        }

        let map = self.substitution_of(ty);
        let mut instantiated = Vec::with_capacity(root_list.len());
        for item in root_list {
            instantiated.push(match list {
                ViewList::Extended => self.instantiate_type(item, &map)?,
                _ => self.instantiate_signature(item, &map)?,
            });
        }
        if let Some(info) = self.symbol(ty).and_then(|s| s.instantiation()) {
            let _ = list.cell(info).set(instantiated.clone());
        }
        Ok(instantiated)
    }

    // =========================================================================
    // Signatures
    // =========================================================================

    /// Apply the substitution of an enclosing type to `signature`.
    ///
    /// Own type parameters of a generic signature that `map` does not bind
    /// are replaced by fresh parameters (with instantiated constraints), so
    /// the result never shares parameters with the generic original.
    #[tracing::instrument(level = "trace", skip(self, map))]
    pub fn instantiate_signature(&mut self, signature: SymbolId, map: &SubstitutionMap) -> BindResult<SymbolId> {
        self.signature_view(signature, map, SignatureMode::Enclosing)
    }

    /// Bind the type parameters of a generic signature to explicit
    /// `type_arguments`. Parameters without an argument stay generic.
    pub fn specialize_signature(&mut self, signature: SymbolId, type_arguments: &[SymbolId]) -> BindResult<SymbolId> {
        let parameters = self.try_symbol(signature)?.type_parameters().to_vec();
        let map = SubstitutionMap::from_pairs(&parameters, type_arguments);
        self.signature_view(signature, &map, SignatureMode::Call)
    }

    fn signature_view(&mut self, signature: SymbolId, map: &SubstitutionMap, mode: SignatureMode) -> BindResult<SymbolId> {
        if map.is_empty() {
            return Ok(signature);
        }
        let Some(data) = self.try_symbol(signature)?.signature_data().cloned() else {
            return Ok(signature);
        };
        let parameters: FxHashSet<SymbolId> = map.keys().collect();
        let binds_own = data.type_parameters.iter().any(|p| parameters.contains(p));
        if !binds_own && !self.signature_mentions(&data, &parameters)? {
            return Ok(signature);
        }

        let mut key = self.canonical_signature(map)?;
        if mode == SignatureMode::Call {
            key.insert_str(0, "call:");
        }
        if let Some(&cached) = data.specializations.get(&key) {
            return Ok(cached);
        }

        let mut full = map.clone();
        let mut type_parameters = Vec::new();
        let mut fresh = Vec::new();
        for &own in &data.type_parameters {
            if full.contains(own) {
                continue;
            }
            match mode {
                SignatureMode::Call => type_parameters.push(own),
                SignatureMode::Enclosing => {
                    let name = self.try_symbol(own)?.name.clone();
                    let minted = self.new_type_symbol(name, SymbolKind::TypeParameter)?;
                    if let Some(s) = self.symbols.get_mut(minted) {
                        s.resolution = ResolutionState::Resolved;
                        s.is_synthesized = true;
                    }
                    full.insert(own, minted);
                    type_parameters.push(minted);
                    fresh.push((own, minted));
                }
            }
        }
        for (original, minted) in fresh {
            let constraint = self.constraint_of(original)?;
            let constraint = self.instantiate_type(constraint, &full)?;
            if let Some(d) = self.type_data_mut(minted) {
                d.constraint = constraint;
            }
        }

        let view = self.build_signature_view(signature, &data, &full, type_parameters)?;
        if let Some(d) = self.symbols.get_mut(signature).and_then(|s| s.signature_data_mut()) {
            d.specializations.insert(key, view);
        }
        Ok(view)
    }

    fn signature_mentions(&mut self, data: &SignatureData, parameters: &FxHashSet<SymbolId>) -> BindResult<bool> {
        for &parameter in &data.parameters {
            let declared = self.declared_type_of(parameter)?;
            if self.type_mentions(declared, parameters)? {
                return Ok(true);
            }
        }
        self.type_mentions(data.return_type, parameters)
    }

    fn build_signature_view(
        &mut self,
        signature: SymbolId,
        data: &SignatureData,
        map: &SubstitutionMap,
        type_parameters: Vec<SymbolId>,
    ) -> BindResult<SymbolId> {
        let mut parameters = Vec::with_capacity(data.parameters.len());
        for &parameter in &data.parameters {
            let declared = self.declared_type_of(parameter)?;
            let ty = self.instantiate_type(declared, map)?;
            let source = self.try_symbol(parameter)?;
            let (name, is_optional, is_varargs) = (source.name.clone(), source.is_optional, source.is_varargs);
            let root = self.root_of(parameter);
            let view = self
                .symbols
                .alloc(SymbolInit::new(name, SymbolKind::Parameter, SymbolData::Value).rooted(root))?;
            if let Some(p) = self.symbols.get_mut(view) {
                p.type_id = ty;
                p.resolution = ResolutionState::Resolved;
                p.is_optional = is_optional;
                p.is_varargs = is_varargs;
            }
            parameters.push(view);
        }
        let return_type = self.instantiate_type(data.return_type, map)?;

        let source = self.try_symbol(signature)?;
        let (name, kind, container) = (source.name.clone(), source.kind, source.container);
        let root = self.root_of(signature);
        let view = self.symbols.alloc(
            SymbolInit::new(
                name,
                kind,
                SymbolData::Signature(Box::new(SignatureData {
                    parameters: parameters.clone(),
                    return_type,
                    is_generic: !type_parameters.is_empty(),
                    type_parameters,
                    has_varargs: data.has_varargs,
                    is_definition: data.is_definition,
                    ..SignatureData::default()
                })),
            )
            .rooted(root),
        )?;
        if let Some(s) = self.symbols.get_mut(view) {
            s.resolution = ResolutionState::Resolved;
            s.container = container;
        }
        for parameter in parameters {
            if let Some(p) = self.symbols.get_mut(parameter) {
                p.container = view;
            }
        }
        Ok(view)
    }

    // =========================================================================
    // Mentions
    // =========================================================================

    /// Whether `ty` refers to any of `parameters`, directly or through its
    /// arguments, element, members or signatures.
    pub(crate) fn type_mentions(&mut self, ty: SymbolId, parameters: &FxHashSet<SymbolId>) -> BindResult<bool> {
        if parameters.is_empty() {
            return Ok(false);
        }
        let mut guard = RecursionGuard::with_profile(RecursionProfile::TypeMentions);
        self.mentions_walk(ty, parameters, &mut guard)
    }

    fn mentions_walk(&mut self, ty: SymbolId, parameters: &FxHashSet<SymbolId>, guard: &mut RecursionGuard<SymbolId>) -> BindResult<bool> {
        if ty.is_none() {
            return Ok(false);
        }
        if parameters.contains(&ty) {
            return Ok(true);
        }
        if !guard.enter(ty).is_entered() {
            return Ok(false);
        }
        let result = self.mentions_inner(ty, parameters, guard);
        guard.leave(ty);
        result
    }

    fn mentions_inner(&mut self, ty: SymbolId, parameters: &FxHashSet<SymbolId>, guard: &mut RecursionGuard<SymbolId>) -> BindResult<bool> {
        let ty = self.resolve_reference(ty)?;
        if parameters.contains(&ty) {
            return Ok(true);
        }
        let symbol = self.try_symbol(ty)?;
        if let Some(info) = symbol.instantiation() {
            let arguments: Vec<SymbolId> = info.substitution.iter().map(|(_, argument)| argument).collect();
            for argument in arguments {
                if self.mentions_walk(argument, parameters, guard)? {
                    return Ok(true);
                }
            }
            return Ok(false);
        }
        match symbol.kind {
            SymbolKind::Class | SymbolKind::Interface => {
                Ok(symbol.type_parameters().iter().any(|p| parameters.contains(p)))
            }
            SymbolKind::Array => {
                let element = symbol.type_data().map_or(SymbolId::NONE, |d| d.element_type);
                self.mentions_walk(element, parameters, guard)
            }
            SymbolKind::ObjectType | SymbolKind::FunctionType | SymbolKind::ConstructorType => {
                let Some(data) = symbol.type_data() else {
                    return Ok(false);
                };
                let members: Vec<SymbolId> = data.members.iter(MemberSpace::Value, true).map(|(_, m)| m).collect();
                let signatures: Vec<SymbolId> = data
                    .call_signatures
                    .iter()
                    .chain(&data.construct_signatures)
                    .chain(&data.index_signatures)
                    .copied()
                    .collect();
                for member in members {
                    let member_type = self.declared_type_of(member)?;
                    if self.mentions_walk(member_type, parameters, guard)? {
                        return Ok(true);
                    }
                }
                for signature in signatures {
                    let Some(data) = self.symbol(signature).and_then(|s| s.signature_data()) else {
                        continue;
                    };
                    let (signature_parameters, return_type) = (data.parameters.clone(), data.return_type);
                    for parameter in signature_parameters {
                        let parameter_type = self.declared_type_of(parameter)?;
                        if self.mentions_walk(parameter_type, parameters, guard)? {
                            return Ok(true);
                        }
                    }
                    if self.mentions_walk(return_type, parameters, guard)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_list_cells_are_distinct() {
        let info = InstantiationInfo::new(SubstitutionMap::new(), Vec::new());
        let _ = ViewList::Call.cell(&info).set(vec![SymbolId(1)]);
        assert!(ViewList::Construct.cell(&info).get().is_none());
        assert_eq!(ViewList::Call.cell(&info).get(), Some(&vec![SymbolId(1)]));
    }
}
