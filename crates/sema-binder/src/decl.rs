//! Declarations: the scope-shaped tree produced by the collector.
//!
//! One `Decl` exists per syntactic declaration site (plus a few synthesized
//! ones for implicit values). Decls never change kind or construction flags;
//! the binder only attaches a symbol and a handful of late flags.

use crate::ids::{DeclId, SymbolId, UnitId};
use bitflags::bitflags;
use rustc_hash::FxHashMap;
use sema_common::Span;
use sema_syntax::NodeIndex;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Kind of a declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DeclKind {
    Script,
    Global,
    Container,
    DynamicModule,
    Enum,
    Class,
    Interface,
    ObjectType,
    Function,
    FunctionType,
    ConstructorType,
    FunctionExpression,
    Variable,
    Property,
    EnumMember,
    Method,
    ConstructorMethod,
    GetAccessor,
    SetAccessor,
    CallSignature,
    ConstructSignature,
    IndexSignature,
    Parameter,
    TypeParameter,
    TypeAlias,
    CatchBlock,
    WithBlock,
    Primitive,
}

impl DeclKind {
    pub const fn is_some_value(self) -> bool {
        matches!(
            self,
            DeclKind::Variable
                | DeclKind::Parameter
                | DeclKind::Property
                | DeclKind::EnumMember
                | DeclKind::Function
                | DeclKind::Method
                | DeclKind::ConstructorMethod
                | DeclKind::FunctionExpression
                | DeclKind::GetAccessor
                | DeclKind::SetAccessor
        )
    }

    pub const fn is_some_type(self) -> bool {
        matches!(
            self,
            DeclKind::Class
                | DeclKind::Interface
                | DeclKind::Enum
                | DeclKind::ObjectType
                | DeclKind::FunctionType
                | DeclKind::ConstructorType
                | DeclKind::TypeParameter
                | DeclKind::Primitive
        )
    }

    pub const fn is_some_container(self) -> bool {
        matches!(self, DeclKind::Container | DeclKind::DynamicModule | DeclKind::TypeAlias)
    }

    pub const fn is_some_signature(self) -> bool {
        matches!(
            self,
            DeclKind::CallSignature | DeclKind::ConstructSignature | DeclKind::IndexSignature
        )
    }

    /// Functions with (potentially) a body.
    pub const fn is_some_function(self) -> bool {
        matches!(
            self,
            DeclKind::Function
                | DeclKind::Method
                | DeclKind::ConstructorMethod
                | DeclKind::FunctionExpression
                | DeclKind::GetAccessor
                | DeclKind::SetAccessor
        )
    }

    pub const fn is_some_block(self) -> bool {
        matches!(self, DeclKind::CatchBlock | DeclKind::WithBlock)
    }

    /// Everything that owns a parameter list and produces a signature.
    pub const fn is_signature_owner(self) -> bool {
        self.is_some_function()
            || self.is_some_signature()
            || matches!(self, DeclKind::FunctionType | DeclKind::ConstructorType)
    }

    /// Decls that carry type parameters of their own.
    pub const fn can_have_type_parameters(self) -> bool {
        matches!(self, DeclKind::Class | DeclKind::Interface) || self.is_signature_owner()
    }

    /// Modules and namespaces.
    pub const fn is_module(self) -> bool {
        matches!(self, DeclKind::Container | DeclKind::DynamicModule)
    }

    /// Name-keyed child namespace this kind is indexed under.
    pub const fn namespace(self) -> DeclNamespace {
        if matches!(self, DeclKind::TypeParameter) {
            DeclNamespace::TypeParameter
        } else if self.is_some_container() {
            DeclNamespace::Container
        } else if self.is_some_type() {
            DeclNamespace::Type
        } else {
            DeclNamespace::Value
        }
    }
}

/// The four name-keyed namespaces children are indexed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DeclNamespace {
    Value,
    Type,
    Container,
    TypeParameter,
}

bitflags! {
    /// Declaration flags.
    ///
    /// Everything except [`DeclFlags::LATE`] is fixed when the decl is
    /// constructed.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DeclFlags: u32 {
        const EXPORTED = 1 << 0;
        const AMBIENT = 1 << 1;
        const STATIC = 1 << 2;
        const PRIVATE = 1 << 3;
        const PUBLIC = 1 << 4;
        const OPTIONAL = 1 << 5;
        /// Function-like decl without a body.
        const SIGNATURE = 1 << 6;
        /// Enum member with an explicit initializer.
        const CONSTANT = 1 << 7;
        const REST = 1 << 8;
        /// Constructor parameter promoted to a property.
        const PROPERTY_PARAMETER = 1 << 9;
        const CONSTRUCTOR_PARAMETER = 1 << 10;
        /// Synthesized constructor value of a class.
        const CLASS_CONSTRUCTOR_VARIABLE = 1 << 11;
        const INITIALIZED_MODULE = 1 << 12;
        const INITIALIZED_DYNAMIC_MODULE = 1 << 13;
        const ENUM = 1 << 14;
        const HAS_EXPORT_ASSIGNMENT = 1 << 15;
        const DECLARED_IN_WITH_BLOCK = 1 << 16;
        const HAS_DEFAULT_ARGS = 1 << 17;

        const IMPLICIT_VARIABLE = Self::CLASS_CONSTRUCTOR_VARIABLE.bits()
            | Self::INITIALIZED_MODULE.bits()
            | Self::INITIALIZED_DYNAMIC_MODULE.bits()
            | Self::ENUM.bits();
        const SOME_INITIALIZED_MODULE = Self::INITIALIZED_MODULE.bits()
            | Self::INITIALIZED_DYNAMIC_MODULE.bits()
            | Self::ENUM.bits();
        /// Flags that may be added after construction.
        const LATE = Self::HAS_DEFAULT_ARGS.bits() | Self::SOME_INITIALIZED_MODULE.bits();
    }
}

/// A declaration.
#[derive(Clone, Debug)]
pub struct Decl {
    pub id: DeclId,
    pub kind: DeclKind,
    /// Lookup name (unescaped; quoted for string-named modules).
    pub name: String,
    /// Name as spelled in source.
    pub display_name: String,
    flags: DeclFlags,
    pub span: Span,
    pub unit: UnitId,
    /// AST node this decl was collected from (`NONE` for synthesized decls).
    pub node: NodeIndex,
    pub parent: DeclId,
    pub is_synthesized: bool,
    /// Children in declaration order.
    pub children: Vec<DeclId>,
    child_index: ChildIndex,
    /// Paired decl: class/module/enum ↔ its implicit value, property
    /// parameter ↔ its property.
    pub value_decl: DeclId,
    pub(crate) bound: bool,
    pub(crate) symbol: SymbolId,
    pub(crate) signature_symbol: SymbolId,
}

impl Decl {
    #[inline]
    pub fn flags(&self) -> DeclFlags {
        self.flags
    }

    #[inline]
    pub fn has_flag(&self, flag: DeclFlags) -> bool {
        self.flags.intersects(flag)
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Cached symbol; `NONE` until bound (and for scripts and blocks).
    #[inline]
    pub fn symbol(&self) -> SymbolId {
        self.symbol
    }

    /// Signature symbol of a function-like decl.
    #[inline]
    pub fn signature_symbol(&self) -> SymbolId {
        self.signature_symbol
    }

    /// Children named `name` in `namespace`, in declaration order.
    pub fn children_named(&self, name: &str, namespace: DeclNamespace) -> &[DeclId] {
        self.child_index.get(name, namespace)
    }

    /// Add a flag the binder discovers after construction.
    pub(crate) fn add_late_flags(&mut self, flags: DeclFlags) {
        debug_assert!(
            DeclFlags::LATE.contains(flags),
            "{flags:?} may not be added after construction"
        );
        self.flags |= flags & DeclFlags::LATE;
    }

    pub(crate) fn clear_binding(&mut self) {
        self.bound = false;
        self.symbol = SymbolId::NONE;
        self.signature_symbol = SymbolId::NONE;
    }
}

/// Name-keyed index of a decl's children, one map per namespace.
#[derive(Clone, Debug, Default)]
struct ChildIndex {
    maps: [FxHashMap<String, SmallVec<[DeclId; 2]>>; 4],
}

impl ChildIndex {
    const fn slot(namespace: DeclNamespace) -> usize {
        match namespace {
            DeclNamespace::Value => 0,
            DeclNamespace::Type => 1,
            DeclNamespace::Container => 2,
            DeclNamespace::TypeParameter => 3,
        }
    }

    fn insert(&mut self, name: &str, namespace: DeclNamespace, decl: DeclId) {
        self.maps[Self::slot(namespace)]
            .entry(name.to_string())
            .or_default()
            .push(decl);
    }

    fn get(&self, name: &str, namespace: DeclNamespace) -> &[DeclId] {
        self.maps[Self::slot(namespace)]
            .get(name)
            .map_or(&[], |v| v.as_slice())
    }
}

/// Fields for a new decl.
#[derive(Clone, Debug)]
pub(crate) struct DeclInit {
    pub kind: DeclKind,
    pub name: String,
    pub display_name: String,
    pub flags: DeclFlags,
    pub span: Span,
    pub unit: UnitId,
    pub node: NodeIndex,
    pub parent: DeclId,
}

/// Arena of the decls of every live unit tree.
///
/// Decls are stored in batches keyed by their first id, one batch per
/// collected tree. Ids keep growing across batches, so releasing a batch
/// leaves its ids resolving to nothing instead of to a newer decl.
#[derive(Debug, Default)]
pub struct DeclArena {
    batches: BTreeMap<u32, Vec<Decl>>,
    next: u32,
}

impl DeclArena {
    pub fn new() -> Self {
        DeclArena::default()
    }

    #[inline]
    pub fn get(&self, id: DeclId) -> Option<&Decl> {
        if id.is_none() {
            return None;
        }
        let (&start, batch) = self.batches.range(..=id.0).next_back()?;
        batch.get((id.0 - start) as usize)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: DeclId) -> Option<&mut Decl> {
        if id.is_none() {
            return None;
        }
        let (&start, batch) = self.batches.range_mut(..=id.0).next_back()?;
        batch.get_mut((id.0 - start) as usize)
    }

    /// Number of live decls.
    pub fn len(&self) -> usize {
        self.batches.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.values().all(Vec::is_empty)
    }

    /// The id the next allocated decl will receive.
    pub fn next_id(&self) -> u32 {
        self.next
    }

    /// Start a new batch; decls allocated from now on belong to it until the
    /// next call. Returns the batch's first id.
    pub(crate) fn begin_batch(&mut self) -> u32 {
        self.batches.entry(self.next).or_default();
        self.next
    }

    /// Drop the batch starting at `start`. Returns how many decls it held.
    pub(crate) fn release(&mut self, start: u32) -> usize {
        self.batches.remove(&start).map_or(0, |batch| batch.len())
    }

    /// Allocate a decl and attach it to its parent's children.
    pub(crate) fn alloc(&mut self, init: DeclInit) -> DeclId {
        let id = self.alloc_detached(init, false);
        self.attach_child(id);
        id
    }

    /// Allocate a synthesized decl: it knows its parent but is not one of the
    /// parent's children.
    pub(crate) fn alloc_synthesized(&mut self, init: DeclInit) -> DeclId {
        self.alloc_detached(init, true)
    }

    fn alloc_detached(&mut self, init: DeclInit, is_synthesized: bool) -> DeclId {
        let id = DeclId(self.next);
        self.next += 1;
        let decl = Decl {
            id,
            kind: init.kind,
            name: init.name,
            display_name: init.display_name,
            flags: init.flags,
            span: init.span,
            unit: init.unit,
            node: if is_synthesized { NodeIndex::NONE } else { init.node },
            parent: init.parent,
            is_synthesized,
            children: Vec::new(),
            child_index: ChildIndex::default(),
            value_decl: DeclId::NONE,
            bound: false,
            symbol: SymbolId::NONE,
            signature_symbol: SymbolId::NONE,
        };
        let extends_last = self
            .batches
            .last_key_value()
            .is_some_and(|(&start, batch)| start + batch.len() as u32 == id.0);
        if extends_last && let Some(mut batch) = self.batches.last_entry() {
            batch.get_mut().push(decl);
        } else {
            self.batches.insert(id.0, vec![decl]);
        }
        id
    }

    fn attach_child(&mut self, child: DeclId) {
        let Some(decl) = self.get(child) else { return };
        let (parent, name, namespace) = (decl.parent, decl.name.clone(), decl.kind.namespace());
        let Some(parent_decl) = self.get_mut(parent) else {
            return;
        };
        parent_decl.children.push(child);
        if !name.is_empty() {
            parent_decl.child_index.insert(&name, namespace, child);
        }
    }

    /// Cross-link two decls through `value_decl`.
    pub(crate) fn link_value_decls(&mut self, a: DeclId, b: DeclId) {
        if let Some(decl) = self.get_mut(a) {
            decl.value_decl = b;
        }
        if let Some(decl) = self.get_mut(b) {
            decl.value_decl = a;
        }
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Decl> {
        self.batches.values_mut().flat_map(|batch| batch.iter_mut())
    }

    /// Walk `root` and all its descendants (synthesized value decls included)
    /// in pre-order.
    pub fn descendants(&self, root: DeclId) -> Vec<DeclId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(decl) = self.get(id) else { continue };
            out.push(id);
            if decl.value_decl.is_some()
                && self.get(decl.value_decl).is_some_and(|v| v.is_synthesized)
            {
                out.push(decl.value_decl);
            }
            stack.extend(decl.children.iter().rev().copied());
        }
        out
    }

    /// Nearest ancestor (starting at the parent) that is not a block.
    pub fn enclosing_non_block(&self, id: DeclId) -> DeclId {
        let mut current = self.get(id).map_or(DeclId::NONE, |d| d.parent);
        while let Some(decl) = self.get(current) {
            if !decl.kind.is_some_block() {
                return current;
            }
            current = decl.parent;
        }
        DeclId::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init(kind: DeclKind, name: &str, parent: DeclId) -> DeclInit {
        DeclInit {
            kind,
            name: name.to_string(),
            display_name: name.to_string(),
            flags: DeclFlags::empty(),
            span: Span::EMPTY,
            unit: UnitId(1),
            node: NodeIndex::NONE,
            parent,
        }
    }

    #[test]
    fn test_children_are_indexed_by_namespace() {
        let mut arena = DeclArena::new();
        let script = arena.alloc(init(DeclKind::Script, "a.ts", DeclId::NONE));
        let class = arena.alloc(init(DeclKind::Class, "C", script));
        let module = arena.alloc(init(DeclKind::Container, "C", script));
        let var = arena.alloc(init(DeclKind::Variable, "C", script));
        let literal = arena.alloc(init(DeclKind::ObjectType, "", script));

        let decl = arena.get(script).unwrap();
        assert_eq!(decl.children, vec![class, module, var, literal]);
        assert_eq!(decl.children_named("C", DeclNamespace::Type), &[class]);
        assert_eq!(decl.children_named("C", DeclNamespace::Container), &[module]);
        assert_eq!(decl.children_named("C", DeclNamespace::Value), &[var]);
        assert!(decl.children_named("", DeclNamespace::Type).is_empty());
    }

    #[test]
    fn test_synthesized_decls_are_not_children() {
        let mut arena = DeclArena::new();
        let script = arena.alloc(init(DeclKind::Script, "a.ts", DeclId::NONE));
        let class = arena.alloc(init(DeclKind::Class, "C", script));
        let value = arena.alloc_synthesized(init(DeclKind::ConstructorMethod, "C", script));
        arena.link_value_decls(class, value);

        assert_eq!(arena.get(script).unwrap().children, vec![class]);
        assert_eq!(arena.get(value).unwrap().parent, script);
        assert_eq!(arena.get(class).unwrap().value_decl, value);
        assert_eq!(arena.descendants(script), vec![script, class, value]);
    }

    #[test]
    fn test_released_batch_resolves_to_nothing() {
        let mut arena = DeclArena::new();
        let first = arena.begin_batch();
        let old = arena.alloc(init(DeclKind::Script, "a.ts", DeclId::NONE));
        let second = arena.begin_batch();
        let new = arena.alloc(init(DeclKind::Script, "a.ts", DeclId::NONE));
        assert_eq!((first, second), (0, 1));

        assert_eq!(arena.release(first), 1);
        assert!(arena.get(old).is_none());
        assert_eq!(arena.get(new).unwrap().id, new);
        assert_eq!(arena.len(), 1);

        let third = arena.begin_batch();
        let newer = arena.alloc(init(DeclKind::Script, "a.ts", DeclId::NONE));
        assert_eq!(third, 2);
        assert_eq!(newer, DeclId(2));
    }

    #[test]
    fn test_late_flags() {
        let mut arena = DeclArena::new();
        let module = arena.alloc(init(DeclKind::Container, "M", DeclId::NONE));
        let decl = arena.get_mut(module).unwrap();
        decl.add_late_flags(DeclFlags::INITIALIZED_MODULE);
        assert!(decl.has_flag(DeclFlags::SOME_INITIALIZED_MODULE));
        assert!(!decl.has_flag(DeclFlags::EXPORTED));
    }
}
