mod support;

use sema_binder::{BinderError, DeclNamespace, MemberSpace, SymbolId, SymbolKind, UnitId};
use sema_common::diagnostic_codes;
use support::{bind_codes, chain_with, container, single, ty, value};

// =============================================================================
// Generations and incremental updates
// =============================================================================

#[test]
fn test_every_unit_change_starts_a_generation() {
    let (mut chain, units) = chain_with(&[("a.ts", "var a = 1;")]);
    let before = chain.generation();
    let unit = chain.add_source("b.ts", "var b = 2;").unwrap();
    assert_eq!(chain.generation(), before + 1);
    chain.replace_source(units[0], "var a = 3;").unwrap();
    assert_eq!(chain.generation(), before + 2);
    chain.remove_unit(unit).unwrap();
    assert_eq!(chain.generation(), before + 3);
}

#[test]
fn test_symbols_go_stale_after_update() {
    let (mut chain, _) = single("class C { }");
    let old = ty(&mut chain, "C");
    assert!(chain.try_symbol(old).is_ok());

    chain.update().unwrap();
    assert_eq!(chain.try_symbol(old).unwrap_err(), BinderError::StaleSymbol(old));
    assert!(chain.symbol(old).is_none());

    // Rebinding produces a fresh symbol for the same decl.
    let fresh = ty(&mut chain, "C");
    assert_ne!(fresh, old);
    assert_eq!(chain.symbol(fresh).unwrap().kind, SymbolKind::Class);
}

#[test]
fn test_invalidate_drops_diagnostics_and_primitives_survive() {
    let (mut chain, unit) = single("function f() { } function f() { }");
    let codes = bind_codes(&mut chain).unwrap();
    assert_eq!(codes, vec![diagnostic_codes::DUPLICATE_IDENTIFIER]);
    let old_primitives = chain.primitives();

    chain.invalidate().unwrap();
    assert!(chain.diagnostics_for(unit).is_empty());
    let primitives = chain.primitives();
    assert_ne!(primitives.string, old_primitives.string);
    assert_eq!(chain.symbol(primitives.string).unwrap().name, "string");
    assert_eq!(chain.symbol(primitives.error).unwrap().kind, SymbolKind::Error);

    // Binding again reports again, once.
    let codes = bind_codes(&mut chain).unwrap();
    assert_eq!(codes, vec![diagnostic_codes::DUPLICATE_IDENTIFIER]);
}

#[test]
fn test_replace_source_recollects_under_fresh_ids() {
    let (mut chain, units) = chain_with(&[
        ("a.ts", "namespace N { export class C { } }"),
        ("b.ts", "var other = 1;"),
    ]);
    let old = chain.find_decls(&["N", "C"], DeclNamespace::Type)[0];
    assert!(chain.is_valid_decl(old));

    chain.replace_source(units[0], "namespace N { export class C { } export var added = 1; }").unwrap();
    assert!(!chain.is_valid_decl(old));
    assert_eq!(chain.bind_decl(old).unwrap_err(), BinderError::UnknownDecl(old));

    let current = chain.find_decls(&["N", "C"], DeclNamespace::Type)[0];
    assert_ne!(current, old);
    assert_eq!(chain.find_matching_valid_decl(old), Some(current));
    assert_eq!(chain.find_matching_valid_decl(current), Some(current));

    let n = container(&mut chain, "N");
    assert!(chain.find_member(n, "added", MemberSpace::Value).unwrap().is_some());
}

#[test]
fn test_matching_valid_decl_uses_ordinals_and_value_decls() {
    let (mut chain, units) = chain_with(&[(
        "a.ts",
        r#"
        namespace N { export var x = 1; }
        namespace N { export var y = 2; }
        "#,
    )]);
    let second = chain.find_decls(&["N"], DeclNamespace::Container)[1];
    let second_value = chain.decl(second).unwrap().value_decl;
    assert!(chain.decl(second_value).unwrap().is_synthesized);

    chain.replace_source(units[0], "namespace N { export var x = 1; }\nnamespace N { export var z = 3; }").unwrap();
    let current = chain.find_decls(&["N"], DeclNamespace::Container)[1];
    assert_eq!(chain.find_matching_valid_decl(second), Some(current));
    let current_value = chain.decl(current).unwrap().value_decl;
    assert_eq!(chain.find_matching_valid_decl(second_value), Some(current_value));
}

#[test]
fn test_matching_valid_decl_fails_when_decl_is_gone() {
    let (mut chain, units) = chain_with(&[("a.ts", "function gone() { }")]);
    let old = chain.find_decls(&["gone"], DeclNamespace::Value)[0];
    chain.replace_source(units[0], "function kept() { }").unwrap();
    assert_eq!(chain.find_matching_valid_decl(old), None);
}

#[test]
fn test_repeated_replacement_keeps_live_decls_stable() {
    let text = "namespace N { export class C { m(x: number) { } } }";
    let (mut chain, units) = chain_with(&[("a.ts", text), ("b.ts", "var other = 1;")]);
    let first = chain.find_decls(&["N", "C"], DeclNamespace::Type)[0];

    chain.replace_source(units[0], text).unwrap();
    let second = chain.find_decls(&["N", "C"], DeclNamespace::Type)[0];
    chain.replace_source(units[0], text).unwrap();
    let live = chain.decls().len();
    for _ in 0..8 {
        chain.replace_source(units[0], text).unwrap();
        assert_eq!(chain.decls().len(), live);
    }

    assert!(chain.decl(first).is_none());
    assert!(chain.decl(second).is_none());
    assert_eq!(chain.find_matching_valid_decl(first), None);
    let current = chain.find_decls(&["N", "C"], DeclNamespace::Type)[0];
    assert!(current.0 > second.0);
    assert_eq!(chain.find_matching_valid_decl(current), Some(current));
}

#[test]
fn test_remove_unit_drops_its_declarations() {
    let (mut chain, units) = chain_with(&[
        ("a.ts", "namespace N { export var a = 1; }"),
        ("b.ts", "namespace N { export var b = 2; }"),
    ]);
    let before = chain.decls().len();
    chain.remove_unit(units[1]).unwrap();
    assert!(chain.decls().len() < before);
    let n = container(&mut chain, "N");
    assert_eq!(chain.declarations_of(n).len(), 1);
    assert!(chain.find_member(n, "b", MemberSpace::Value).unwrap().is_none());
    assert_eq!(chain.units().filter(|u| !u.is_global()).count(), 1);
}

#[test]
fn test_remove_unit_rejects_unknown_and_global_units() {
    let (mut chain, units) = chain_with(&[("a.ts", "var a = 1;")]);
    assert_eq!(chain.remove_unit(UnitId::GLOBAL).unwrap_err(), BinderError::UnknownUnit(UnitId::GLOBAL));
    chain.remove_unit(units[0]).unwrap();
    assert_eq!(chain.remove_unit(units[0]).unwrap_err(), BinderError::UnknownUnit(units[0]));
    assert!(matches!(chain.replace_source(units[0], "var b;"), Err(BinderError::UnknownUnit(_))));
}

// =============================================================================
// AST maps
// =============================================================================

#[test]
fn test_ast_symbol_maps() {
    let (mut chain, unit) = single("namespace N { export class C { m() { } } }");
    let decl = chain.find_decls(&["N", "C"], DeclNamespace::Type)[0];
    let node = chain.get_ast_for_decl(decl).unwrap();
    assert_eq!(chain.get_decl_for_ast(unit, node), Some(decl));

    // Lookup through the AST binds on demand.
    let symbol = chain.get_symbol_for_ast(unit, node).unwrap();
    assert_eq!(symbol, ty(&mut chain, "N.C"));
    assert_eq!(chain.get_ast_for_symbol(symbol), Some((unit, node)));
}

#[test]
fn test_script_node_maps_to_a_decl_without_symbol() {
    let (mut chain, unit) = single("var a = 1;");
    let root = chain.unit(unit).unwrap().root_node;
    assert!(chain.get_decl_for_ast(unit, root).is_some());
    let script_symbol = chain.get_symbol_for_ast(unit, root).unwrap();
    assert!(script_symbol.is_none());
    assert_eq!(chain.get_ast_for_symbol(SymbolId::NONE), None);
}

// =============================================================================
// Import aliases
// =============================================================================

#[test]
fn test_import_alias_of_namespace() {
    let (mut chain, unit) = single(
        r#"
        namespace A { export namespace B { export class C { } } }
        import X = A.B;
        var c: X.C;
        "#,
    );
    let codes = bind_codes(&mut chain).unwrap();
    assert!(codes.is_empty(), "unexpected diagnostics: {codes:?}");

    let b = container(&mut chain, "A.B");
    let class = ty(&mut chain, "A.B.C");
    let alias = container(&mut chain, "X");
    assert_eq!(chain.symbol(alias).unwrap().kind, SymbolKind::TypeAlias);
    assert_eq!(chain.resolve_alias(alias).unwrap(), b);
    assert_eq!(chain.alias_target(alias, MemberSpace::Container).unwrap(), b);
    assert!(chain.alias_target(alias, MemberSpace::Type).unwrap().is_none());

    let c = value(&mut chain, "c");
    assert_eq!(chain.declared_type_of(c).unwrap(), class);
    assert_eq!(chain.import_decls(unit, "X").len(), 1);
    assert!(chain.import_decls(unit, "Y").is_empty());
}

#[test]
fn test_import_alias_of_class_spans_value_and_type() {
    let (mut chain, _) = single(
        r#"
        namespace A { export class C { } }
        import K = A.C;
        var k: K;
        "#,
    );
    chain.bind_all().unwrap();
    let class = ty(&mut chain, "A.C");
    let constructor = value(&mut chain, "A.C");
    let alias = container(&mut chain, "K");
    assert_eq!(chain.alias_target(alias, MemberSpace::Type).unwrap(), class);
    assert_eq!(chain.alias_target(alias, MemberSpace::Value).unwrap(), constructor);
    assert_eq!(chain.resolve_alias(alias).unwrap(), class);
    assert_eq!(chain.declared_type_of(alias).unwrap(), class);

    let k = value(&mut chain, "k");
    assert_eq!(chain.declared_type_of(k).unwrap(), class);
}

#[test]
fn test_alias_cycle_resolves_to_nothing() {
    let (mut chain, _) = single(
        r#"
        import P = Q;
        import Q = P;
        "#,
    );
    chain.bind_all().unwrap();
    let p = container(&mut chain, "P");
    assert!(chain.resolve_alias(p).unwrap().is_none());
}

// =============================================================================
// External modules
// =============================================================================

#[test]
fn test_import_require_of_unit() {
    let (mut chain, _) = chain_with(&[
        ("m.ts", "export var v = 1;"),
        ("a.ts", "import m = require(\"m\");"),
    ]);
    let module = chain.find_external_module("m").unwrap();
    assert_eq!(chain.symbol(module).unwrap().kind, SymbolKind::DynamicModule);
    assert_eq!(chain.find_external_module("./m").unwrap(), module);
    assert!(chain.find_member(module, "v", MemberSpace::Value).unwrap().is_some());

    // The import makes a.ts an external module itself.
    let alias = container(&mut chain, "\"a\".m");
    assert_eq!(chain.resolve_alias(alias).unwrap(), module);
    let codes = bind_codes(&mut chain).unwrap();
    assert!(codes.is_empty(), "unexpected diagnostics: {codes:?}");
}

#[test]
fn test_import_require_of_ambient_module() {
    let (mut chain, _) = chain_with(&[
        ("lib.d.ts", "declare module \"fs\" { export function read(): string; }"),
        ("a.ts", "import fs = require(\"fs\");"),
    ]);
    let alias = container(&mut chain, "\"a\".fs");
    let module = chain.resolve_alias(alias).unwrap();
    assert_eq!(chain.symbol(module).unwrap().kind, SymbolKind::DynamicModule);
    assert!(chain.find_member(module, "read", MemberSpace::Value).unwrap().is_some());
}

#[test]
fn test_missing_module_is_reported_once() {
    let (mut chain, unit) = single("import m = require(\"missing\");");
    assert!(chain.find_external_module("missing").unwrap().is_none());
    let alias = container(&mut chain, "\"a\".m");
    assert!(chain.resolve_alias(alias).unwrap().is_none());
    assert!(chain.resolve_alias(alias).unwrap().is_none());

    let diagnostics = chain.diagnostics_for(unit);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, diagnostic_codes::CANNOT_FIND_MODULE);
    assert!(diagnostics[0].message_text.contains("missing"));
}

#[test]
fn test_export_assignment_replaces_module_members() {
    let (mut chain, _) = chain_with(&[
        ("m.ts", "class K { } export = K;"),
        ("a.ts", "import k = require(\"m\"); var x: k;"),
    ]);
    let module = chain.find_external_module("m").unwrap();
    let assigned = chain.symbol(module).unwrap().type_data().unwrap().export_assignment;
    assert_eq!(chain.symbol(assigned).unwrap().kind, SymbolKind::Class);

    let alias = container(&mut chain, "\"a\".k");
    assert_eq!(chain.resolve_alias(alias).unwrap(), assigned);
    assert_eq!(chain.alias_target(alias, MemberSpace::Type).unwrap(), assigned);
    let x = value(&mut chain, "\"a\".x");
    assert_eq!(chain.declared_type_of(x).unwrap(), assigned);
}

// =============================================================================
// Lookup
// =============================================================================

#[test]
fn test_find_decls_across_units_in_compile_order() {
    let (mut chain, units) = chain_with(&[
        ("a.ts", "namespace N { export var a = 1; }"),
        ("b.ts", "namespace N { export var b = 2; }"),
    ]);
    let decls = chain.find_decls(&["N"], DeclNamespace::Container);
    let owners: Vec<UnitId> = decls.iter().map(|&d| chain.decl(d).unwrap().unit).collect();
    assert_eq!(owners, units);
    assert!(chain.find_decls(&["N", "missing"], DeclNamespace::Value).is_empty());
    assert!(chain.find_symbol(&["nothing"], DeclNamespace::Value).unwrap().is_none());
}

#[test]
fn test_primitives_resolve_by_name() {
    let (chain, _) = single("");
    let primitives = chain.primitives();
    for name in ["any", "boolean", "number", "string", "void", "null", "undefined"] {
        let symbol = primitives.by_name(name).unwrap();
        assert_eq!(chain.symbol(symbol).unwrap().name, name);
        assert_eq!(chain.symbol(symbol).unwrap().kind, SymbolKind::Primitive);
    }
    assert_eq!(primitives.by_name("object"), None);
    assert_eq!(chain.any_type(), primitives.any);
}

#[test]
fn test_reference_forwards_to_its_target() {
    let (mut chain, _) = single("interface I { x: number; }");
    let interface = ty(&mut chain, "I");
    let reference = chain.reference_to(interface).unwrap();
    assert_ne!(reference, interface);
    assert_eq!(chain.symbol(reference).unwrap().kind, SymbolKind::Reference);
    assert_eq!(chain.resolve_reference(reference).unwrap(), interface);
    assert_eq!(chain.reference_to(interface).unwrap(), reference);
    assert_eq!(chain.reference_to(reference).unwrap(), reference);
    assert!(chain.find_member(reference, "x", MemberSpace::Value).unwrap().is_some());
    assert_eq!(chain.declared_type_of(reference).unwrap(), interface);

    let decl = chain.find_decls(&["I"], DeclNamespace::Type)[0];
    let lazy = chain.reference_to_decl(decl).unwrap();
    assert_eq!(chain.resolve_reference(lazy).unwrap(), interface);
}
