mod support;

use sema_binder::{MemberSpace, SymbolKind};
use sema_common::diagnostic_codes;
use support::{bind_codes, name_of, single, ty, value};

// =============================================================================
// Class members
// =============================================================================

#[test]
fn test_static_members_live_on_the_constructor_type() {
    let (mut chain, _) = single(
        r#"
        class C {
            static s: string;
            x: number;
            static m() { }
        }
        "#,
    );
    let codes = bind_codes(&mut chain).unwrap();
    assert!(codes.is_empty(), "unexpected diagnostics: {codes:?}");

    let class = ty(&mut chain, "C");
    let constructor = value(&mut chain, "C");
    let constructor_type = chain.symbol(constructor).unwrap().type_id();
    assert_eq!(chain.symbol(constructor_type).unwrap().kind, SymbolKind::ConstructorType);

    assert!(chain.find_member(class, "x", MemberSpace::Value).unwrap().is_some());
    assert!(chain.find_member(class, "s", MemberSpace::Value).unwrap().is_none());
    assert!(chain.find_member(class, "m", MemberSpace::Value).unwrap().is_none());

    let s = chain.find_member(constructor_type, "s", MemberSpace::Value).unwrap();
    let m = chain.find_member(constructor_type, "m", MemberSpace::Value).unwrap();
    assert!(s.is_some());
    assert_eq!(chain.symbol(m).unwrap().kind, SymbolKind::Method);
    assert_eq!(chain.declared_type_of(s).unwrap(), chain.primitives().string);
    assert!(chain.find_member(constructor_type, "x", MemberSpace::Value).unwrap().is_none());
}

#[test]
fn test_property_parameter_is_a_class_member() {
    let (mut chain, _) = single(
        r#"
        class P {
            constructor(public p: number, q: string) { }
        }
        "#,
    );
    let codes = bind_codes(&mut chain).unwrap();
    assert!(codes.is_empty(), "unexpected diagnostics: {codes:?}");

    let class = ty(&mut chain, "P");
    let p = chain.find_member(class, "p", MemberSpace::Value).unwrap();
    assert_eq!(chain.symbol(p).unwrap().kind, SymbolKind::Property);
    assert_eq!(chain.declared_type_of(p).unwrap(), chain.primitives().number);
    assert!(chain.find_member(class, "q", MemberSpace::Value).unwrap().is_none());

    let constructor = value(&mut chain, "P");
    let constructor_type = chain.symbol(constructor).unwrap().type_id();
    let signatures = chain.construct_signatures(constructor_type).unwrap();
    assert_eq!(signatures.len(), 1);
    let data = chain.symbol(signatures[0]).unwrap().signature_data().unwrap().clone();
    assert_eq!(data.return_type, class);
    assert_eq!(data.parameters.len(), 2);
    // The parameter and the property are the same symbol.
    assert_eq!(data.parameters[0], p);
    assert_eq!(chain.declarations_of(p).len(), 2);
    assert_eq!(chain.symbol(data.parameters[1]).unwrap().kind, SymbolKind::Parameter);
}

#[test]
fn test_local_redeclaring_a_property_parameter_joins_its_group() {
    let (mut chain, _) = single(
        r#"
        class C {
            constructor(public x: number) { var x; }
        }
        "#,
    );
    let codes = bind_codes(&mut chain).unwrap();
    assert!(codes.is_empty(), "unexpected diagnostics: {codes:?}");

    let class = ty(&mut chain, "C");
    let property = chain.find_member(class, "x", MemberSpace::Value).unwrap();
    let group = chain.variable_group(property);
    assert_eq!(group.len(), 2);
    assert_eq!(group[0], property);
    assert_eq!(chain.symbol(group[1]).unwrap().kind, SymbolKind::Variable);
    assert_eq!(chain.variable_group(group[1]), group);
}

#[test]
fn test_class_without_constructor_has_implicit_construct_signature() {
    let (mut chain, _) = single("class Empty { }");
    chain.bind_all().unwrap();
    let class = ty(&mut chain, "Empty");
    let constructor = value(&mut chain, "Empty");
    let constructor_type = chain.symbol(constructor).unwrap().type_id();
    let signatures = chain.construct_signatures(constructor_type).unwrap();
    assert_eq!(signatures.len(), 1);
    let data = chain.symbol(signatures[0]).unwrap().signature_data().unwrap();
    assert!(data.parameters.is_empty());
    assert_eq!(data.return_type, class);
    assert_eq!(chain.symbol(class).unwrap().type_data().unwrap().constructor_method, constructor);
}

// =============================================================================
// Accessors
// =============================================================================

#[test]
fn test_get_and_set_share_one_accessor() {
    let (mut chain, _) = single(
        r#"
        class A {
            get v(): number { return 1; }
            set v(x: number) { }
        }
        "#,
    );
    let codes = bind_codes(&mut chain).unwrap();
    assert!(codes.is_empty(), "unexpected diagnostics: {codes:?}");

    let class = ty(&mut chain, "A");
    let members = chain.members_of(class, MemberSpace::Value).unwrap();
    assert_eq!(members.len(), 1);
    let accessor = members[0];
    let symbol = chain.symbol(accessor).unwrap();
    assert_eq!(symbol.kind, SymbolKind::Accessor);
    let halves = *symbol.accessor_data().unwrap();
    assert!(halves.getter.is_some());
    assert!(halves.setter.is_some());
    assert_ne!(halves.getter, halves.setter);
    assert_eq!(chain.symbol(halves.getter).unwrap().container, accessor);
    assert_eq!(chain.declarations_of(accessor).len(), 2);
    assert_eq!(chain.declared_type_of(accessor).unwrap(), chain.primitives().number);
}

#[test]
fn test_setter_only_accessor_takes_parameter_type() {
    let (mut chain, _) = single("class B { set w(x: string) { } }");
    chain.bind_all().unwrap();
    let class = ty(&mut chain, "B");
    let w = chain.find_member(class, "w", MemberSpace::Value).unwrap();
    assert!(chain.symbol(w).unwrap().accessor_data().unwrap().getter.is_none());
    assert_eq!(chain.declared_type_of(w).unwrap(), chain.primitives().string);
}

#[test]
fn test_duplicate_getter_is_reported() {
    let (mut chain, _) = single(
        r#"
        class D {
            get v(): number { return 1; }
            get v(): number { return 2; }
        }
        "#,
    );
    let codes = bind_codes(&mut chain).unwrap();
    assert_eq!(codes, vec![diagnostic_codes::DUPLICATE_IDENTIFIER]);

    let class = ty(&mut chain, "D");
    let v = chain.find_member(class, "v", MemberSpace::Value).unwrap();
    let declarations = chain.declarations_of(v).to_vec();
    assert_eq!(declarations.len(), 2);
    let getter = chain.symbol(v).unwrap().accessor_data().unwrap().getter;
    assert_eq!(chain.declarations_of(getter), &declarations[..1]);
    let function_type = chain.symbol(getter).unwrap().type_id();
    assert_eq!(chain.declarations_of(function_type), &declarations[..1]);
}

#[test]
fn test_property_then_accessor_is_duplicate() {
    let (mut chain, _) = single(
        r#"
        class E {
            v: number;
            get v(): number { return 1; }
        }
        "#,
    );
    let codes = bind_codes(&mut chain).unwrap();
    assert_eq!(codes, vec![diagnostic_codes::DUPLICATE_IDENTIFIER]);
}

// =============================================================================
// Interfaces and type literals
// =============================================================================

#[test]
fn test_interface_signatures_and_members() {
    let (mut chain, _) = single(
        r#"
        interface F {
            (x: number): string;
            new (x: string): F;
            [key: string]: any;
            name: string;
            method(a: number): void;
        }
        "#,
    );
    let codes = bind_codes(&mut chain).unwrap();
    assert!(codes.is_empty(), "unexpected diagnostics: {codes:?}");
    let primitives = chain.primitives();

    let f = ty(&mut chain, "F");
    let calls = chain.call_signatures(f).unwrap();
    let constructs = chain.construct_signatures(f).unwrap();
    let indexes = chain.index_signatures(f).unwrap();
    assert_eq!((calls.len(), constructs.len(), indexes.len()), (1, 1, 1));
    assert_eq!(chain.declared_type_of(calls[0]).unwrap(), primitives.string);
    assert_eq!(chain.declared_type_of(constructs[0]).unwrap(), f);
    assert_eq!(chain.declared_type_of(indexes[0]).unwrap(), primitives.any);
    assert_eq!(chain.symbol(calls[0]).unwrap().container, f);

    let members = chain.members_of(f, MemberSpace::Value).unwrap();
    let names: Vec<String> = members.iter().map(|&m| name_of(&chain, m)).collect();
    assert_eq!(names, ["name", "method"]);

    let method_type = chain.declared_type_of(members[1]).unwrap();
    assert_eq!(chain.symbol(method_type).unwrap().kind, SymbolKind::FunctionType);
    let method_signatures = chain.call_signatures(method_type).unwrap();
    assert_eq!(method_signatures.len(), 1);
    let data = chain.symbol(method_signatures[0]).unwrap().signature_data().unwrap().clone();
    assert_eq!(data.return_type, primitives.void);
    assert_eq!(data.parameters.len(), 1);
    assert_eq!(chain.declared_type_of(data.parameters[0]).unwrap(), primitives.number);
}

#[test]
fn test_object_type_literal_annotation() {
    let (mut chain, _) = single("var point: { x: number; y?: string };");
    chain.bind_all().unwrap();
    let point = value(&mut chain, "point");
    let literal = chain.declared_type_of(point).unwrap();
    assert_eq!(chain.symbol(literal).unwrap().kind, SymbolKind::ObjectType);

    let x = chain.find_member(literal, "x", MemberSpace::Value).unwrap();
    let y = chain.find_member(literal, "y", MemberSpace::Value).unwrap();
    assert!(!chain.symbol(x).unwrap().is_optional);
    assert!(chain.symbol(y).unwrap().is_optional);
    assert_eq!(chain.declared_type_of(y).unwrap(), chain.primitives().string);
}

#[test]
fn test_function_type_literal_annotation() {
    let (mut chain, _) = single("var handler: (e: string) => number;");
    chain.bind_all().unwrap();
    let handler = value(&mut chain, "handler");
    let function_type = chain.declared_type_of(handler).unwrap();
    assert_eq!(chain.symbol(function_type).unwrap().kind, SymbolKind::FunctionType);
    let signatures = chain.call_signatures(function_type).unwrap();
    assert_eq!(signatures.len(), 1);
    assert_eq!(chain.declared_type_of(signatures[0]).unwrap(), chain.primitives().number);
}

#[test]
fn test_optional_and_rest_parameters() {
    let (mut chain, _) = single("function f(a: number, b?: string, c = 1, ...rest: any[]) { }");
    chain.bind_all().unwrap();
    let f = value(&mut chain, "f");
    let function_type = chain.symbol(f).unwrap().type_id();
    let signature = chain.call_signatures(function_type).unwrap()[0];
    let data = chain.symbol(signature).unwrap().signature_data().unwrap().clone();
    assert!(data.has_varargs);
    let flags: Vec<(bool, bool)> = data
        .parameters
        .iter()
        .map(|&p| {
            let p = chain.symbol(p).unwrap();
            (p.is_optional, p.is_varargs)
        })
        .collect();
    assert_eq!(flags, [(false, false), (true, false), (true, false), (false, true)]);
}

// =============================================================================
// Enums
// =============================================================================

#[test]
fn test_enum_members_and_index_signature() {
    let (mut chain, _) = single("enum Color { Red, Green }");
    chain.bind_all().unwrap();
    let primitives = chain.primitives();
    let color = ty(&mut chain, "Color");
    let red = chain.find_member(color, "Red", MemberSpace::Value).unwrap();
    assert_eq!(chain.symbol(red).unwrap().kind, SymbolKind::EnumMember);
    assert_eq!(chain.declared_type_of(red).unwrap(), color);

    let indexes = chain.index_signatures(color).unwrap();
    assert_eq!(indexes.len(), 1);
    let data = chain.symbol(indexes[0]).unwrap().signature_data().unwrap().clone();
    assert_eq!(data.return_type, primitives.string);
    assert_eq!(chain.declared_type_of(data.parameters[0]).unwrap(), primitives.number);
}

#[test]
fn test_merged_enum_keeps_one_index_signature() {
    let (mut chain, _) = single(
        r#"
        enum E { A }
        enum E { B = 1 }
        "#,
    );
    let codes = bind_codes(&mut chain).unwrap();
    assert!(codes.is_empty(), "unexpected diagnostics: {codes:?}");
    let e = ty(&mut chain, "E");
    assert_eq!(chain.index_signatures(e).unwrap().len(), 1);
    assert_eq!(chain.members_of(e, MemberSpace::Value).unwrap().len(), 2);
}

// =============================================================================
// Declared types
// =============================================================================

#[test]
fn test_arrays_are_cached_per_element() {
    let (mut chain, _) = single(
        r#"
        var xs: string[];
        var ys: string[];
        var zs: number[];
        "#,
    );
    chain.bind_all().unwrap();
    let xs = value(&mut chain, "xs");
    let ys = value(&mut chain, "ys");
    let zs = value(&mut chain, "zs");
    let xs_type = chain.declared_type_of(xs).unwrap();
    let ys_type = chain.declared_type_of(ys).unwrap();
    let zs_type = chain.declared_type_of(zs).unwrap();
    assert_eq!(xs_type, ys_type);
    assert_ne!(xs_type, zs_type);

    let array = chain.symbol(xs_type).unwrap();
    assert_eq!(array.kind, SymbolKind::Array);
    assert_eq!(array.name, "string[]");
    assert_eq!(array.type_data().unwrap().element_type, chain.primitives().string);
}

#[test]
fn test_qualified_type_reference() {
    let (mut chain, _) = single(
        r#"
        namespace A { export namespace B { export interface I { } } }
        var i: A.B.I;
        "#,
    );
    chain.bind_all().unwrap();
    let i = value(&mut chain, "i");
    let interface = ty(&mut chain, "A.B.I");
    assert_eq!(chain.declared_type_of(i).unwrap(), interface);
}

#[test]
fn test_missing_annotation_is_any_and_unknown_name_is_error() {
    let (mut chain, _) = single(
        r#"
        var untyped;
        var broken: Missing;
        "#,
    );
    chain.bind_all().unwrap();
    let untyped = value(&mut chain, "untyped");
    let broken = value(&mut chain, "broken");
    assert_eq!(chain.declared_type_of(untyped).unwrap(), chain.any_type());
    assert_eq!(chain.declared_type_of(broken).unwrap(), chain.error_type());
}

#[test]
fn test_type_parameter_scope_in_members() {
    let (mut chain, _) = single(
        r#"
        class Box<T> {
            value: T;
            map<U>(f: (v: T) => U): U { return null; }
        }
        "#,
    );
    chain.bind_all().unwrap();
    let class = ty(&mut chain, "Box");
    let t = chain.symbol(class).unwrap().type_parameters()[0];
    let value_member = chain.find_member(class, "value", MemberSpace::Value).unwrap();
    assert_eq!(chain.declared_type_of(value_member).unwrap(), t);

    let map = chain.find_member(class, "map", MemberSpace::Value).unwrap();
    let map_type = chain.declared_type_of(map).unwrap();
    let signature = chain.call_signatures(map_type).unwrap()[0];
    let data = chain.symbol(signature).unwrap().signature_data().unwrap().clone();
    assert!(data.is_generic);
    assert_eq!(data.type_parameters.len(), 1);
    assert_eq!(data.return_type, data.type_parameters[0]);
    assert_ne!(data.type_parameters[0], t);
}
