//! Generative classification of generic type references.
//!
//! Relative to an enclosing generic type `E<P..>`, a reference `R<A..>` is
//!
//! * `Closed` when no argument mentions any of `P..`;
//! * `Open` when some argument does, but expanding `R` only ever reaches
//!   references to `E` whose arguments are bare parameters of `E`;
//! * `InfinitelyExpanding` when expanding `R` reaches a reference to `E` with
//!   an argument that wraps some `P` in a larger type, so every level of
//!   expansion creates a new, bigger reference to `E`.
//!
//! The expansion walk never instantiates members. It walks the declared
//! structure of each generic root it enters and carries a substitution from
//! that root's parameters to types over `P..`, composing it at every nested
//! reference. Roots already on the current path are not entered again.
//!
//! Callers treat infinitely expanding references as opaque instead of
//! instantiating their members.

use crate::chain::SemanticInfoChain;
use crate::errors::BindResult;
use crate::ids::SymbolId;
use crate::recursion::{RecursionGuard, RecursionProfile};
use crate::substitution::SubstitutionMap;
use crate::symbol::{MemberSpace, SymbolKind};
use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum GenerativeTypeClass {
    Closed,
    Open,
    InfinitelyExpanding,
}

/// State of one expansion walk.
struct ExpansionWalk {
    enclosing_root: SymbolId,
    /// Type parameters of the enclosing root, in declaration order.
    own: Vec<SymbolId>,
    parameters: FxHashSet<SymbolId>,
    guard: RecursionGuard<SymbolId>,
    /// (structure being walked, symbol at the current position), outermost
    /// first.
    path: Vec<(SymbolId, SymbolId)>,
}

impl SemanticInfoChain {
    /// Classify `reference` relative to `enclosing`. Memoized per pair for
    /// the current generation.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn generative_type_classification(
        &mut self,
        reference: SymbolId,
        enclosing: SymbolId,
    ) -> BindResult<GenerativeTypeClass> {
        if let Some(&class) = self.caches.generative.get(&(reference, enclosing)) {
            return Ok(class);
        }
        let class = self.classify(reference, enclosing)?;
        debug!(reference = reference.0, enclosing = enclosing.0, ?class, "generative classification");
        self.caches.generative.insert((reference, enclosing), class);
        Ok(class)
    }

    fn classify(&mut self, reference: SymbolId, enclosing: SymbolId) -> BindResult<GenerativeTypeClass> {
        let reference = self.resolve_reference(reference)?;
        let enclosing = self.resolve_reference(enclosing)?;
        let enclosing_root = self.root_of(enclosing);
        let own: Vec<SymbolId> = self.try_symbol(enclosing_root)?.type_parameters().to_vec();
        let parameters: FxHashSet<SymbolId> = own.iter().copied().collect();

        let substitution = self.substitution_of(reference);
        let arguments: Vec<SymbolId> = if substitution.is_empty() {
            self.type_arguments_of(reference)
        } else {
            substitution.iter().map(|(_, argument)| argument).collect()
        };
        let mut open = false;
        for argument in arguments {
            if self.type_mentions(argument, &parameters)? {
                open = true;
                break;
            }
        }
        if !open {
            return Ok(GenerativeTypeClass::Closed);
        }

        let mut walk = ExpansionWalk {
            enclosing_root,
            own,
            parameters,
            guard: RecursionGuard::with_profile(RecursionProfile::GenerativeClassification),
            path: Vec::new(),
        };
        let root = self.root_of(reference);
        let expanding = if root == enclosing_root {
            self.wraps_parameter(&substitution, &walk)?
        } else {
            self.structure_expands(root, &substitution, &mut walk)?
        };
        Ok(if expanding {
            GenerativeTypeClass::InfinitelyExpanding
        } else {
            GenerativeTypeClass::Open
        })
    }

    /// Whether some parameter of the enclosing root is bound to a type that
    /// mentions the root's parameters without being one of them.
    fn wraps_parameter(&mut self, substitution: &SubstitutionMap, walk: &ExpansionWalk) -> BindResult<bool> {
        for &parameter in &walk.own {
            let argument = substitution.get(parameter).unwrap_or(parameter);
            if walk.parameters.contains(&argument) {
                continue;
            }
            if self.type_mentions(argument, &walk.parameters)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Walk the declared structure of `structure` with its parameters bound
    /// by `context`.
    fn structure_expands(
        &mut self,
        structure: SymbolId,
        context: &SubstitutionMap,
        walk: &mut ExpansionWalk,
    ) -> BindResult<bool> {
        if !walk.guard.enter(structure).is_entered() {
            return Ok(false);
        }
        let result = self.positions_expand(structure, context, walk);
        walk.guard.leave(structure);
        result
    }

    fn positions_expand(
        &mut self,
        structure: SymbolId,
        context: &SubstitutionMap,
        walk: &mut ExpansionWalk,
    ) -> BindResult<bool> {
        for (at, ty) in self.type_positions(structure)? {
            walk.path.push((structure, at));
            let expanding = self.position_expands(ty, context, walk);
            walk.path.pop();
            if expanding? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn position_expands(&mut self, ty: SymbolId, context: &SubstitutionMap, walk: &mut ExpansionWalk) -> BindResult<bool> {
        if ty.is_none() {
            return Ok(false);
        }
        let ty = self.resolve_reference(ty)?;
        let symbol = self.try_symbol(ty)?;
        let kind = symbol.kind;
        if symbol.instantiation().is_some() || matches!(kind, SymbolKind::Class | SymbolKind::Interface) {
            return self.reference_expands(ty, context, walk);
        }
        match kind {
            SymbolKind::Array => {
                let element = symbol.type_data().map_or(SymbolId::NONE, |d| d.element_type);
                self.position_expands(element, context, walk)
            }
            SymbolKind::ObjectType | SymbolKind::FunctionType | SymbolKind::ConstructorType => {
                self.structure_expands(ty, context, walk)
            }
            _ => Ok(false),
        }
    }

    /// A generic reference met during the walk: bring its arguments into the
    /// enclosing root's terms, then either check them against the enclosing
    /// root or keep expanding inside the referenced root.
    fn reference_expands(&mut self, ty: SymbolId, context: &SubstitutionMap, walk: &mut ExpansionWalk) -> BindResult<bool> {
        let root = self.root_of(ty);
        let carried: Vec<(SymbolId, SymbolId)> = if root == ty {
            let own = self.try_symbol(root)?.type_parameters().to_vec();
            own.into_iter().map(|p| (p, p)).collect()
        } else {
            self.substitution_of(ty).iter().collect()
        };
        let mut substituted = SubstitutionMap::new();
        for (parameter, argument) in carried {
            substituted.insert(parameter, self.instantiate_type(argument, context)?);
        }

        if root == walk.enclosing_root {
            let expanding = self.wraps_parameter(&substituted, walk)?;
            if expanding {
                trace!(path = ?walk.path, "expansion reaches a wrapped reference");
            }
            return Ok(expanding);
        }
        let mut open = false;
        for (_, argument) in substituted.iter() {
            if self.type_mentions(argument, &walk.parameters)? {
                open = true;
                break;
            }
        }
        if !open {
            return Ok(false);
        }
        self.structure_expands(root, &substituted, walk)
    }

    /// Every declared type position of a class, interface or type literal,
    /// paired with the symbol that owns it: bases, members, signature
    /// parameters and returns, and type-parameter constraints.
    fn type_positions(&mut self, structure: SymbolId) -> BindResult<Vec<(SymbolId, SymbolId)>> {
        let Some(data) = self.try_symbol(structure)?.type_data() else {
            return Ok(Vec::new());
        };
        let members: Vec<SymbolId> = data.members.iter(MemberSpace::Value, true).map(|(_, m)| m).collect();
        let signatures: Vec<SymbolId> = data
            .call_signatures
            .iter()
            .chain(&data.construct_signatures)
            .chain(&data.index_signatures)
            .copied()
            .collect();
        let mut positions: Vec<(SymbolId, SymbolId)> = data
            .extended_types
            .iter()
            .chain(&data.implemented_types)
            .map(|&base| (structure, base))
            .collect();
        let type_parameters = data.type_parameters.clone();

        for member in members {
            positions.push((member, self.declared_type_of(member)?));
        }
        for signature in signatures {
            let Some(data) = self.symbol(signature).and_then(|s| s.signature_data()) else {
                continue;
            };
            let (parameters, return_type, own) = (data.parameters.clone(), data.return_type, data.type_parameters.clone());
            for parameter in parameters {
                positions.push((parameter, self.declared_type_of(parameter)?));
            }
            positions.push((signature, return_type));
            for type_parameter in own {
                positions.push((type_parameter, self.constraint_of(type_parameter)?));
            }
        }
        for parameter in type_parameters {
            positions.push((parameter, self.constraint_of(parameter)?));
        }
        Ok(positions)
    }
}
