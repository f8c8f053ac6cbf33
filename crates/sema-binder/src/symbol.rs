//! Symbol model.
//!
//! A `Symbol` is a named semantic entity: a value, a type, a signature, an
//! accessor pair, an import alias or a read-only reference to a named type.
//! Symbols are created by the binder and the instantiation engine and live in
//! a [`SymbolArena`] owned by the chain.
//!
//! Instantiated views are *rooted*: `root` points at the generic symbol they
//! were derived from and they never own declarations themselves.

use crate::errors::{BindResult, BinderError};
use crate::ids::{DeclId, SymbolId};
use crate::substitution::SubstitutionMap;
use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap};
use smallvec::SmallVec;
use std::cell::OnceCell;

pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Kind of a symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    // Values
    Variable,
    Parameter,
    Property,
    EnumMember,
    Function,
    Method,
    ConstructorMethod,
    FunctionExpression,
    Accessor,
    // Types
    Class,
    Interface,
    ObjectType,
    FunctionType,
    ConstructorType,
    Enum,
    Container,
    DynamicModule,
    TypeParameter,
    Primitive,
    Array,
    Error,
    // Signatures
    CallSignature,
    ConstructSignature,
    IndexSignature,
    // Forwarding
    TypeAlias,
    Reference,
}

impl SymbolKind {
    pub const fn is_type(self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::ObjectType
                | SymbolKind::FunctionType
                | SymbolKind::ConstructorType
                | SymbolKind::Enum
                | SymbolKind::Container
                | SymbolKind::DynamicModule
                | SymbolKind::TypeParameter
                | SymbolKind::Primitive
                | SymbolKind::Array
                | SymbolKind::Error
        )
    }

    pub const fn is_value(self) -> bool {
        matches!(
            self,
            SymbolKind::Variable
                | SymbolKind::Parameter
                | SymbolKind::Property
                | SymbolKind::EnumMember
                | SymbolKind::Function
                | SymbolKind::Method
                | SymbolKind::ConstructorMethod
                | SymbolKind::FunctionExpression
                | SymbolKind::Accessor
        )
    }

    pub const fn is_signature(self) -> bool {
        matches!(
            self,
            SymbolKind::CallSignature | SymbolKind::ConstructSignature | SymbolKind::IndexSignature
        )
    }

    pub const fn is_container(self) -> bool {
        matches!(self, SymbolKind::Container | SymbolKind::DynamicModule)
    }

    /// Types whose identity is their declaration (rather than their shape).
    pub const fn is_named_type(self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::Enum
                | SymbolKind::Container
                | SymbolKind::DynamicModule
                | SymbolKind::TypeParameter
                | SymbolKind::Primitive
                | SymbolKind::Error
        )
    }
}

/// Tri-state resolution marker used to break re-entrant resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResolutionState {
    #[default]
    Unresolved,
    Resolving,
    Resolved,
}

// =============================================================================
// Member tables
// =============================================================================

/// Which name space of a member table a symbol is registered in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberSpace {
    Value,
    Type,
    Container,
}

impl MemberSpace {
    const fn slot(self) -> usize {
        match self {
            MemberSpace::Value => 0,
            MemberSpace::Type => 1,
            MemberSpace::Container => 2,
        }
    }
}

/// Name-keyed member partitions of a type symbol.
///
/// *Members* are visible from outside (exported module members, class and
/// interface members). *Non-members* are locals of a module body, visible only
/// from inside it. Iteration order is registration order.
#[derive(Clone, Debug, Default)]
pub struct MemberTable {
    members: [FxIndexMap<String, SymbolId>; 3],
    non_members: [FxIndexMap<String, SymbolId>; 3],
}

impl MemberTable {
    fn partition(&self, space: MemberSpace, member: bool) -> &FxIndexMap<String, SymbolId> {
        if member {
            &self.members[space.slot()]
        } else {
            &self.non_members[space.slot()]
        }
    }

    pub fn get(&self, name: &str, space: MemberSpace, member: bool) -> Option<SymbolId> {
        self.partition(space, member).get(name).copied()
    }

    /// Register `symbol` under `name`. An existing entry is kept.
    pub(crate) fn insert(
        &mut self,
        name: &str,
        space: MemberSpace,
        member: bool,
        symbol: SymbolId,
    ) -> bool {
        let map = if member {
            &mut self.members[space.slot()]
        } else {
            &mut self.non_members[space.slot()]
        };
        if map.contains_key(name) {
            return false;
        }
        map.insert(name.to_string(), symbol);
        true
    }

    /// Overwrite the entry for `name` (used when a duplicate is replaced).
    pub(crate) fn replace(&mut self, name: &str, space: MemberSpace, member: bool, symbol: SymbolId) {
        let map = if member {
            &mut self.members[space.slot()]
        } else {
            &mut self.non_members[space.slot()]
        };
        map.insert(name.to_string(), symbol);
    }

    pub fn iter(&self, space: MemberSpace, member: bool) -> impl Iterator<Item = (&str, SymbolId)> {
        self.partition(space, member)
            .iter()
            .map(|(name, &symbol)| (name.as_str(), symbol))
    }

    pub fn is_empty(&self) -> bool {
        self.members.iter().chain(self.non_members.iter()).all(|m| m.is_empty())
    }
}

// =============================================================================
// Variant payloads
// =============================================================================

/// Lazily filled state of an instantiated type view.
#[derive(Clone, Debug)]
pub struct InstantiationInfo {
    pub substitution: SubstitutionMap,
    /// Arguments in the order of the root's type parameters.
    pub type_arguments: Vec<SymbolId>,
    pub(crate) member_cache: FxHashMap<(String, MemberSpace), SymbolId>,
    pub(crate) members_complete: bool,
    pub(crate) call_signatures: OnceCell<Vec<SymbolId>>,
    pub(crate) construct_signatures: OnceCell<Vec<SymbolId>>,
    pub(crate) index_signatures: OnceCell<Vec<SymbolId>>,
    pub(crate) extended_types: OnceCell<Vec<SymbolId>>,
}

impl InstantiationInfo {
    pub(crate) fn new(substitution: SubstitutionMap, type_arguments: Vec<SymbolId>) -> Self {
        InstantiationInfo {
            substitution,
            type_arguments,
            member_cache: FxHashMap::default(),
            members_complete: false,
            call_signatures: OnceCell::new(),
            construct_signatures: OnceCell::new(),
            index_signatures: OnceCell::new(),
            extended_types: OnceCell::new(),
        }
    }
}

/// Payload of type symbols.
#[derive(Clone, Debug)]
pub struct TypeData {
    pub members: MemberTable,
    pub call_signatures: Vec<SymbolId>,
    pub construct_signatures: Vec<SymbolId>,
    pub index_signatures: Vec<SymbolId>,
    pub extended_types: Vec<SymbolId>,
    pub implemented_types: Vec<SymbolId>,
    pub type_parameters: Vec<SymbolId>,
    /// Container merged with this class/interface/enum, if any.
    pub associated_container: SymbolId,
    /// Class: the constructor-function value symbol.
    pub constructor_method: SymbolId,
    /// Container/enum: the value symbol typed by this type.
    pub instance_symbol: SymbolId,
    /// Type parameter: its `extends` constraint.
    pub constraint: SymbolId,
    /// Array: element type.
    pub element_type: SymbolId,
    /// Dynamic module: the target of `export =`.
    pub export_assignment: SymbolId,
    /// Class constructor type: the implicit construct signature, until a real
    /// constructor replaces it.
    pub(crate) default_construct_signature: SymbolId,
    /// Roots only: canonical substitution signature → instantiated view.
    pub(crate) specializations: FxHashMap<String, SymbolId>,
    pub instantiation: Option<Box<InstantiationInfo>>,
}

impl Default for TypeData {
    fn default() -> Self {
        TypeData {
            members: MemberTable::default(),
            call_signatures: Vec::new(),
            construct_signatures: Vec::new(),
            index_signatures: Vec::new(),
            extended_types: Vec::new(),
            implemented_types: Vec::new(),
            type_parameters: Vec::new(),
            associated_container: SymbolId::NONE,
            constructor_method: SymbolId::NONE,
            instance_symbol: SymbolId::NONE,
            constraint: SymbolId::NONE,
            element_type: SymbolId::NONE,
            export_assignment: SymbolId::NONE,
            default_construct_signature: SymbolId::NONE,
            specializations: FxHashMap::default(),
            instantiation: None,
        }
    }
}

/// Payload of call, construct and index signatures.
#[derive(Clone, Debug)]
pub struct SignatureData {
    pub parameters: Vec<SymbolId>,
    pub return_type: SymbolId,
    pub type_parameters: Vec<SymbolId>,
    pub is_generic: bool,
    pub has_varargs: bool,
    /// Has a body (as opposed to an overload or ambient signature).
    pub is_definition: bool,
    pub(crate) specializations: FxHashMap<String, SymbolId>,
}

impl Default for SignatureData {
    fn default() -> Self {
        SignatureData {
            parameters: Vec::new(),
            return_type: SymbolId::NONE,
            type_parameters: Vec::new(),
            is_generic: false,
            has_varargs: false,
            is_definition: false,
            specializations: FxHashMap::default(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AccessorData {
    pub getter: SymbolId,
    pub setter: SymbolId,
}

/// Payload of `import x = ...` aliases.
#[derive(Clone, Debug)]
pub struct AliasData {
    pub assigned_value: SymbolId,
    pub assigned_type: SymbolId,
    pub assigned_container: SymbolId,
    /// Set once a missing external module has been reported.
    pub(crate) reported_missing: bool,
}

impl Default for AliasData {
    fn default() -> Self {
        AliasData {
            assigned_value: SymbolId::NONE,
            assigned_type: SymbolId::NONE,
            assigned_container: SymbolId::NONE,
            reported_missing: false,
        }
    }
}

/// Payload of read-only references to a named type.
#[derive(Clone, Debug)]
pub struct ReferenceData {
    /// Decl whose symbol the reference forwards to (`NONE` when built from a
    /// symbol).
    pub target_decl: DeclId,
    pub(crate) target: OnceCell<SymbolId>,
}

#[derive(Clone, Debug)]
pub enum SymbolData {
    Value,
    Type(Box<TypeData>),
    Signature(Box<SignatureData>),
    Accessor(AccessorData),
    TypeAlias(AliasData),
    Reference(ReferenceData),
}

/// A symbol.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub(crate) resolution: ResolutionState,
    /// Generic symbol this view was instantiated from (`NONE` for roots).
    pub root: SymbolId,
    /// Declarations merged into this symbol; always empty for rooted views.
    pub(crate) declarations: SmallVec<[DeclId; 2]>,
    /// Symbol whose member table holds this one.
    pub container: SymbolId,
    pub(crate) type_id: SymbolId,
    pub is_synthesized: bool,
    pub is_optional: bool,
    pub is_varargs: bool,
    pub data: SymbolData,
}

impl Symbol {
    #[inline]
    pub fn is_rooted(&self) -> bool {
        self.root.is_some()
    }

    #[inline]
    pub fn resolution(&self) -> ResolutionState {
        self.resolution
    }

    /// Type of a value symbol, the instance/ctor type of implicit values, or
    /// the chain's error type after a failed merge. `NONE` until resolved.
    #[inline]
    pub fn type_id(&self) -> SymbolId {
        self.type_id
    }

    #[inline]
    pub fn own_declarations(&self) -> &[DeclId] {
        &self.declarations
    }

    pub fn type_data(&self) -> Option<&TypeData> {
        match &self.data {
            SymbolData::Type(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn type_data_mut(&mut self) -> Option<&mut TypeData> {
        match &mut self.data {
            SymbolData::Type(data) => Some(data),
            _ => None,
        }
    }

    pub fn signature_data(&self) -> Option<&SignatureData> {
        match &self.data {
            SymbolData::Signature(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn signature_data_mut(&mut self) -> Option<&mut SignatureData> {
        match &mut self.data {
            SymbolData::Signature(data) => Some(data),
            _ => None,
        }
    }

    pub fn accessor_data(&self) -> Option<&AccessorData> {
        match &self.data {
            SymbolData::Accessor(data) => Some(data),
            _ => None,
        }
    }

    pub fn alias_data(&self) -> Option<&AliasData> {
        match &self.data {
            SymbolData::TypeAlias(data) => Some(data),
            _ => None,
        }
    }

    /// Type parameters a generic type or signature declares.
    pub fn type_parameters(&self) -> &[SymbolId] {
        match &self.data {
            SymbolData::Type(data) => &data.type_parameters,
            SymbolData::Signature(data) => &data.type_parameters,
            _ => &[],
        }
    }

    pub fn instantiation(&self) -> Option<&InstantiationInfo> {
        self.type_data().and_then(|d| d.instantiation.as_deref())
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Fields for a new symbol.
pub(crate) struct SymbolInit {
    pub name: String,
    pub kind: SymbolKind,
    pub data: SymbolData,
    pub root: SymbolId,
    pub is_synthesized: bool,
}

impl SymbolInit {
    pub fn new(name: impl Into<String>, kind: SymbolKind, data: SymbolData) -> Self {
        SymbolInit {
            name: name.into(),
            kind,
            data,
            root: SymbolId::NONE,
            is_synthesized: false,
        }
    }

    pub fn rooted(mut self, root: SymbolId) -> Self {
        self.root = root;
        self
    }

    pub fn synthesized(mut self) -> Self {
        self.is_synthesized = true;
        self
    }
}

/// Arena of the symbols of one chain generation.
///
/// Ids are `base + index`. [`SymbolArena::reset`] moves `base` past every id
/// issued so far, so ids from an earlier generation never alias new symbols.
/// Once the id space below [`SymbolId::NONE`] is used up, allocation fails.
#[derive(Debug, Default)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
    base: u32,
}

impl SymbolArena {
    pub fn new() -> Self {
        SymbolArena {
            symbols: Vec::new(),
            base: 0,
        }
    }

    #[inline]
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        if id.is_none() || id.0 < self.base {
            return None;
        }
        self.symbols.get((id.0 - self.base) as usize)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        if id.is_none() || id.0 < self.base {
            return None;
        }
        self.symbols.get_mut((id.0 - self.base) as usize)
    }

    /// True for ids issued by an earlier generation.
    #[inline]
    pub fn is_stale(&self, id: SymbolId) -> bool {
        id.is_some() && id.0 < self.base
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub(crate) fn alloc(&mut self, init: SymbolInit) -> BindResult<SymbolId> {
        let id = u32::try_from(self.symbols.len())
            .ok()
            .and_then(|len| self.base.checked_add(len))
            .map(SymbolId)
            .filter(|id| id.is_some())
            .ok_or(BinderError::SymbolIdsExhausted { base: self.base })?;
        self.symbols.push(Symbol {
            id,
            name: init.name,
            kind: init.kind,
            resolution: ResolutionState::Unresolved,
            root: init.root,
            declarations: SmallVec::new(),
            container: SymbolId::NONE,
            type_id: SymbolId::NONE,
            is_synthesized: init.is_synthesized,
            is_optional: false,
            is_varargs: false,
            data: init.data,
        });
        Ok(id)
    }

    /// Start a new generation.
    pub(crate) fn reset(&mut self) {
        self.base += self.symbols.len() as u32;
        self.symbols.clear();
    }
}
