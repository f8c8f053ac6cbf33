//! Integer handles for decls, symbols and compilation units.

use serde::Serialize;

/// Handle of a [`Decl`](crate::Decl) in the chain's decl arena.
///
/// Ids are assigned monotonically and never reused, so a re-collected unit
/// gets fresh ids and an id from a released tree resolves to nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclId(pub u32);

impl DeclId {
    pub const NONE: DeclId = DeclId(u32::MAX);

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != u32::MAX
    }
}

/// Handle of a [`Symbol`](crate::Symbol) in the chain's symbol arena.
///
/// Symbol ids are only meaningful within one chain generation; after
/// `update()` every earlier id is stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const NONE: SymbolId = SymbolId(u32::MAX);

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != u32::MAX
    }
}

/// Handle of a compilation unit. Unit 0 is the synthetic global unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UnitId(pub u32);

impl UnitId {
    pub const GLOBAL: UnitId = UnitId(0);

    #[inline]
    pub const fn is_global(self) -> bool {
        self.0 == 0
    }
}
