//! Shared fixtures for the binder integration tests.
#![allow(dead_code)]

use sema_binder::{BindResult, DeclNamespace, SemanticInfoChain, SymbolId, UnitId};

/// A chain holding `files` in order. Sources are added before anything is
/// bound: every `add_source` starts a new generation.
pub fn chain_with(files: &[(&str, &str)]) -> (SemanticInfoChain, Vec<UnitId>) {
    sema_common::tracing_config::init_tracing();
    let mut chain = SemanticInfoChain::new();
    let units = files
        .iter()
        .map(|(name, text)| chain.add_source(name, text).expect("add source"))
        .collect();
    (chain, units)
}

pub fn single(text: &str) -> (SemanticInfoChain, UnitId) {
    let (chain, units) = chain_with(&[("a.ts", text)]);
    (chain, units[0])
}

/// Symbol at a dotted path, e.g. `"A.B.C"`.
pub fn lookup(chain: &mut SemanticInfoChain, path: &str, namespace: DeclNamespace) -> SymbolId {
    let segments: Vec<&str> = path.split('.').collect();
    let symbol = chain.find_symbol(&segments, namespace).expect("find symbol");
    assert!(symbol.is_some(), "no symbol at {path:?} in {namespace:?}");
    symbol
}

pub fn value(chain: &mut SemanticInfoChain, path: &str) -> SymbolId {
    lookup(chain, path, DeclNamespace::Value)
}

pub fn ty(chain: &mut SemanticInfoChain, path: &str) -> SymbolId {
    lookup(chain, path, DeclNamespace::Type)
}

pub fn container(chain: &mut SemanticInfoChain, path: &str) -> SymbolId {
    lookup(chain, path, DeclNamespace::Container)
}

/// Bind everything and return the codes of all posted diagnostics.
pub fn bind_codes(chain: &mut SemanticInfoChain) -> BindResult<Vec<u32>> {
    chain.bind_all()?;
    Ok(chain.post_diagnostics().iter().map(|d| d.code).collect())
}

pub fn name_of(chain: &SemanticInfoChain, symbol: SymbolId) -> String {
    chain.symbol(symbol).map(|s| s.name.clone()).unwrap_or_default()
}
