//! Substitution maps: type parameter → type argument.

use crate::ids::SymbolId;
use crate::symbol::FxIndexMap;

/// Ordered mapping from type-parameter symbols to type symbols.
///
/// Keys are stored exactly as inserted and looked up by identity. Callers
/// pass the declared parameter symbols (or parameters minted for a signature
/// view), never views of them. Insertion order is kept so that signatures and
/// type argument lists come out in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubstitutionMap {
    entries: FxIndexMap<SymbolId, SymbolId>,
}

impl SubstitutionMap {
    pub fn new() -> Self {
        SubstitutionMap::default()
    }

    /// Map `parameters[i]` to `arguments[i]`; extra entries on either side
    /// are ignored.
    pub fn from_pairs(parameters: &[SymbolId], arguments: &[SymbolId]) -> Self {
        let mut map = SubstitutionMap::new();
        for (&parameter, &argument) in parameters.iter().zip(arguments) {
            map.insert(parameter, argument);
        }
        map
    }

    /// Bind `parameter`, replacing an earlier binding in place.
    pub fn insert(&mut self, parameter: SymbolId, argument: SymbolId) {
        self.entries.insert(parameter, argument);
    }

    #[inline]
    pub fn get(&self, parameter: SymbolId) -> Option<SymbolId> {
        self.entries.get(&parameter).copied()
    }

    #[inline]
    pub fn contains(&self, parameter: SymbolId) -> bool {
        self.entries.contains_key(&parameter)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, SymbolId)> + '_ {
        self.entries.iter().map(|(&k, &v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.entries.keys().copied()
    }

    /// Every parameter maps to itself.
    pub fn is_identity(&self) -> bool {
        self.entries.iter().all(|(k, v)| k == v)
    }

    /// Keep only the parameters for which `keep` holds.
    pub fn retain(&mut self, mut keep: impl FnMut(SymbolId) -> bool) {
        self.entries.retain(|&k, _| keep(k));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_keeps_order() {
        let map = SubstitutionMap::from_pairs(&[SymbolId(5), SymbolId(2)], &[SymbolId(7), SymbolId(8)]);
        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs, vec![(SymbolId(5), SymbolId(7)), (SymbolId(2), SymbolId(8))]);
        assert!(!map.is_identity());
    }

    #[test]
    fn test_identity_and_retain() {
        let mut map = SubstitutionMap::from_pairs(&[SymbolId(1), SymbolId(2)], &[SymbolId(1), SymbolId(9)]);
        assert!(!map.is_identity());
        map.retain(|p| p == SymbolId(1));
        assert!(map.is_identity());
        assert_eq!(map.len(), 1);
        assert!(map.contains(SymbolId(1)));
        assert!(!map.contains(SymbolId(2)));
    }

    #[test]
    fn test_insert_rebinds_in_place() {
        let mut map = SubstitutionMap::from_pairs(&[SymbolId(3), SymbolId(4)], &[SymbolId(10), SymbolId(11)]);
        map.insert(SymbolId(3), SymbolId(12));
        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs, vec![(SymbolId(3), SymbolId(12)), (SymbolId(4), SymbolId(11))]);
        assert_eq!(map.get(SymbolId(12)), None);
    }
}
