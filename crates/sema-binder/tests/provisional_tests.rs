mod support;

use sema_binder::{BinderError, ProvisionalOutcome, SymbolId};
use sema_common::diagnostic_codes;
use support::{single, ty, value};

const DUPLICATE_FUNCTIONS: &str = "function f() { } function f() { }";

#[test]
fn test_pop_without_frame_fails() {
    let (mut chain, _) = single("");
    assert!(!chain.in_provisional());
    assert!(!chain.had_provisional_errors());
    assert_eq!(
        chain.pop_provisional(ProvisionalOutcome::Commit).unwrap_err(),
        BinderError::NoProvisionalContext
    );
}

#[test]
fn test_abandon_drops_buffered_diagnostics() {
    let (mut chain, unit) = single(DUPLICATE_FUNCTIONS);
    chain.push_provisional();
    assert!(chain.in_provisional());
    chain.bind_all().unwrap();
    assert!(chain.had_provisional_errors());
    assert!(chain.diagnostics_for(unit).is_empty());

    assert!(chain.pop_provisional(ProvisionalOutcome::Abandon).unwrap());
    assert!(!chain.in_provisional());
    assert!(chain.diagnostics_for(unit).is_empty());
}

#[test]
fn test_commit_promotes_buffered_diagnostics() {
    let (mut chain, unit) = single(DUPLICATE_FUNCTIONS);
    chain.push_provisional();
    chain.bind_all().unwrap();
    assert!(chain.pop_provisional(ProvisionalOutcome::Commit).unwrap());

    let codes: Vec<u32> = chain.diagnostics_for(unit).iter().map(|d| d.code).collect();
    assert_eq!(codes, vec![diagnostic_codes::DUPLICATE_IDENTIFIER]);
}

#[test]
fn test_nested_commit_lands_in_the_outer_frame() {
    let (mut chain, unit) = single(DUPLICATE_FUNCTIONS);
    chain.push_provisional();
    chain.push_provisional();
    chain.bind_all().unwrap();
    assert!(chain.pop_provisional(ProvisionalOutcome::Commit).unwrap());

    assert!(chain.in_provisional());
    assert!(chain.had_provisional_errors());
    assert!(chain.diagnostics_for(unit).is_empty());

    assert!(chain.pop_provisional(ProvisionalOutcome::Abandon).unwrap());
    assert!(chain.diagnostics_for(unit).is_empty());
}

#[test]
fn test_clean_frame_reports_no_errors() {
    let (mut chain, _) = single("var x: string;");
    chain.push_provisional();
    chain.bind_all().unwrap();
    assert!(!chain.had_provisional_errors());
    assert!(!chain.pop_provisional(ProvisionalOutcome::Commit).unwrap());
}

#[test]
fn test_types_set_under_a_frame_are_reset() {
    let (mut chain, _) = single("var x: string;");
    chain.bind_all().unwrap();
    let primitives = chain.primitives();
    let x = value(&mut chain, "x");
    assert_eq!(chain.declared_type_of(x).unwrap(), primitives.string);

    chain.push_provisional();
    chain.set_symbol_type(x, primitives.number).unwrap();
    assert_eq!(chain.declared_type_of(x).unwrap(), primitives.number);
    chain.pop_provisional(ProvisionalOutcome::Commit).unwrap();

    // Back to the annotation.
    assert_eq!(chain.declared_type_of(x).unwrap(), primitives.string);

    // Outside a frame the assignment sticks.
    chain.set_symbol_type(x, primitives.boolean).unwrap();
    assert_eq!(chain.declared_type_of(x).unwrap(), primitives.boolean);
}

#[test]
fn test_types_resolved_under_a_frame_are_resolved_again() {
    let (mut chain, _) = single("var y: number;");
    chain.bind_all().unwrap();
    let number = chain.primitives().number;
    let y = value(&mut chain, "y");

    chain.push_provisional();
    assert_eq!(chain.declared_type_of(y).unwrap(), number);
    chain.pop_provisional(ProvisionalOutcome::Abandon).unwrap();
    assert_eq!(chain.symbol(y).unwrap().type_id(), SymbolId::NONE);
    assert_eq!(chain.declared_type_of(y).unwrap(), number);
}

#[test]
fn test_references_are_read_only() {
    let (mut chain, _) = single("interface I { }");
    let interface = ty(&mut chain, "I");
    let reference = chain.reference_to(interface).unwrap();
    let any = chain.any_type();
    assert_eq!(
        chain.set_symbol_type(reference, any).unwrap_err(),
        BinderError::ReadOnlyReference(reference)
    );
}
