mod support;

use sema_binder::{DeclFlags, DeclId, DeclKind, DeclNamespace, SemanticInfoChain};
use support::single;

fn kinds_of(chain: &SemanticInfoChain, ids: &[DeclId]) -> Vec<(DeclKind, String)> {
    ids.iter()
        .filter_map(|&id| chain.decl(id))
        .map(|d| (d.kind, d.name.clone()))
        .collect()
}

fn only(chain: &mut SemanticInfoChain, path: &[&str], namespace: DeclNamespace) -> DeclId {
    let found = chain.find_decls(path, namespace);
    assert_eq!(found.len(), 1, "expected one decl at {path:?}, got {found:?}");
    found[0]
}

#[test]
fn test_dotted_namespace_opens_one_container_per_segment() {
    let (mut chain, unit) = single(
        r#"
        namespace A.B {
            export class C<T> {
                x: number;
                constructor(public p: T) { }
            }
        }
        "#,
    );
    let script = chain.unit(unit).unwrap().top_level_decl;
    let a = only(&mut chain, &["A"], DeclNamespace::Container);
    let b = only(&mut chain, &["A", "B"], DeclNamespace::Container);

    assert_eq!(chain.decl(script).unwrap().kind, DeclKind::Script);
    assert_eq!(kinds_of(&chain, &chain.decl(script).unwrap().children.clone()), vec![(DeclKind::Container, "A".to_string())]);
    assert_eq!(chain.decl(b).unwrap().parent, a);
    assert!(
        chain.decl(b).unwrap().has_flag(DeclFlags::EXPORTED),
        "inner segments of a dotted name are exported"
    );
    assert!(!chain.decl(a).unwrap().has_flag(DeclFlags::EXPORTED));

    // A class makes both containers initialized, so both get a value decl.
    for module in [a, b] {
        let value = chain.decl(module).unwrap().value_decl;
        let value_decl = chain.decl(value).expect("initialized module has a value decl");
        assert!(value_decl.is_synthesized);
        assert_eq!(value_decl.kind, DeclKind::Variable);
        assert_eq!(value_decl.value_decl, module);
        assert!(
            !chain.decl(chain.decl(module).unwrap().parent).unwrap().children.contains(&value),
            "synthesized value decls are not children"
        );
    }
}

#[test]
fn test_class_members_and_property_parameter() {
    let (mut chain, _) = single(
        r#"
        class C<T> {
            x: number;
            static s: string;
            constructor(public p: T, q?: string) { }
            get v(): number { return 1; }
            set v(value: number) { }
            m<U>(u: U): T { return null; }
        }
        "#,
    );
    let class = only(&mut chain, &["C"], DeclNamespace::Type);
    let children = chain.decl(class).unwrap().children.clone();
    assert_eq!(
        kinds_of(&chain, &children),
        vec![
            (DeclKind::TypeParameter, "T".to_string()),
            (DeclKind::Property, "x".to_string()),
            (DeclKind::Property, "s".to_string()),
            (DeclKind::ConstructorMethod, String::new()),
            (DeclKind::Property, "p".to_string()),
            (DeclKind::GetAccessor, "v".to_string()),
            (DeclKind::SetAccessor, "v".to_string()),
            (DeclKind::Method, "m".to_string()),
        ]
    );
    assert!(chain.decl(children[2]).unwrap().has_flag(DeclFlags::STATIC));

    let constructor = children[3];
    let parameters = chain.decl(constructor).unwrap().children.clone();
    assert_eq!(
        kinds_of(&chain, &parameters),
        vec![
            (DeclKind::Parameter, "p".to_string()),
            (DeclKind::Parameter, "q".to_string())
        ]
    );
    let p = chain.decl(parameters[0]).unwrap();
    assert!(p.has_flag(DeclFlags::PROPERTY_PARAMETER));
    assert!(p.has_flag(DeclFlags::CONSTRUCTOR_PARAMETER));
    assert_eq!(p.value_decl, children[4], "property parameter links to its property");
    assert_eq!(chain.decl(children[4]).unwrap().value_decl, parameters[0]);
    let q = chain.decl(parameters[1]).unwrap();
    assert!(q.has_flag(DeclFlags::OPTIONAL));
    assert!(!q.has_flag(DeclFlags::PROPERTY_PARAMETER));

    let value = chain.decl(class).unwrap().value_decl;
    let value_decl = chain.decl(value).unwrap();
    assert_eq!(value_decl.kind, DeclKind::ConstructorMethod);
    assert!(value_decl.has_flag(DeclFlags::CLASS_CONSTRUCTOR_VARIABLE));
}

#[test]
fn test_uninitialized_namespace_has_no_value() {
    let (mut chain, _) = single(
        r#"
        namespace Types {
            export interface I { a: string; }
        }
        "#,
    );
    let module = only(&mut chain, &["Types"], DeclNamespace::Container);
    let decl = chain.decl(module).unwrap();
    assert!(!decl.has_flag(DeclFlags::INITIALIZED_MODULE));
    assert!(decl.value_decl.is_none(), "interfaces alone do not initialize a namespace");
}

#[test]
fn test_values_in_blocks_initialize_the_enclosing_namespace() {
    let (mut chain, _) = single(
        r#"
        namespace Caught {
            try { } catch (e) { var x = 1; }
        }
        namespace Scoped {
            with (obj) { var y = 2; }
        }
        "#,
    );
    for name in ["Caught", "Scoped"] {
        let module = only(&mut chain, &[name], DeclNamespace::Container);
        let decl = chain.decl(module).unwrap();
        assert!(decl.has_flag(DeclFlags::INITIALIZED_MODULE), "{name} should be initialized");
        assert!(decl.value_decl.is_some());
    }
}

#[test]
fn test_enum_members_and_value() {
    let (mut chain, _) = single("enum Color { Red, Green = 2 }");
    let decl = only(&mut chain, &["Color"], DeclNamespace::Type);
    let children = chain.decl(decl).unwrap().children.clone();
    assert_eq!(children.len(), 2);
    assert!(!chain.decl(children[0]).unwrap().has_flag(DeclFlags::CONSTANT));
    assert!(chain.decl(children[1]).unwrap().has_flag(DeclFlags::CONSTANT));
    let value = chain.decl(decl).unwrap().value_decl;
    assert!(chain.decl(value).unwrap().has_flag(DeclFlags::ENUM));
}

#[test]
fn test_external_module_wraps_file_in_dynamic_module() {
    let (mut chain, unit) = single("export var x: number;\nvar y = 1;");
    let info = chain.unit(unit).unwrap();
    assert!(info.is_external_module);
    let script = info.top_level_decl;
    let module = chain.decl(script).unwrap().children[0];
    let module_decl = chain.decl(module).unwrap();
    assert_eq!(module_decl.kind, DeclKind::DynamicModule);
    assert_eq!(module_decl.name, "\"a\"");
    assert!(module_decl.node.is_none());
    assert!(module_decl.has_flag(DeclFlags::INITIALIZED_DYNAMIC_MODULE));

    let children = module_decl.children.clone();
    assert_eq!(
        kinds_of(&chain, &children),
        vec![
            (DeclKind::Variable, "x".to_string()),
            (DeclKind::Variable, "y".to_string())
        ]
    );
    assert!(chain.decl(children[0]).unwrap().has_flag(DeclFlags::EXPORTED));
    assert!(!chain.decl(children[1]).unwrap().has_flag(DeclFlags::EXPORTED));
    assert!(chain.find_decls(&["x"], DeclNamespace::Value).is_empty(), "module members are not top-level");
}

#[test]
fn test_ambient_external_module_exports_implicitly() {
    let (mut chain, _) = single(
        r#"
        declare module "fs" {
            function read(): string;
        }
        declare module "path" {
            function join(): string;
            export = join;
        }
        "#,
    );
    let fs = only(&mut chain, &["\"fs\""], DeclNamespace::Container);
    let fs_decl = chain.decl(fs).unwrap();
    assert_eq!(fs_decl.kind, DeclKind::DynamicModule);
    assert!(fs_decl.has_flag(DeclFlags::AMBIENT));
    let read = fs_decl.children[0];
    assert!(chain.decl(read).unwrap().has_flag(DeclFlags::EXPORTED));
    assert!(chain.decl(read).unwrap().has_flag(DeclFlags::AMBIENT));
    assert!(chain.decl(read).unwrap().has_flag(DeclFlags::SIGNATURE));

    let path = only(&mut chain, &["\"path\""], DeclNamespace::Container);
    let path_decl = chain.decl(path).unwrap();
    assert!(path_decl.has_flag(DeclFlags::HAS_EXPORT_ASSIGNMENT));
    let join = path_decl.children[0];
    assert!(
        !chain.decl(join).unwrap().has_flag(DeclFlags::EXPORTED),
        "export = suppresses implicit exports"
    );
}

#[test]
fn test_declaration_file_is_ambient() {
    let (mut chain, _) = support::chain_with(&[("lib.d.ts", "declare var v: number;\nfunction f(): void;")]);
    for name in ["v", "f"] {
        let decl = only(&mut chain, &[name], DeclNamespace::Value);
        assert!(chain.decl(decl).unwrap().has_flag(DeclFlags::AMBIENT), "{name} should be ambient");
    }
}

#[test]
fn test_type_literals_become_anonymous_decls() {
    let (mut chain, _) = single(
        r#"
        var point: { x: number; y?: number };
        var handler: (e: string) => void;
        "#,
    );
    let point = only(&mut chain, &["point"], DeclNamespace::Value);
    let script = chain.decl(point).unwrap().parent;
    let children = chain.decl(script).unwrap().children.clone();
    assert_eq!(
        kinds_of(&chain, &children),
        vec![
            (DeclKind::Variable, "point".to_string()),
            (DeclKind::ObjectType, String::new()),
            (DeclKind::Variable, "handler".to_string()),
            (DeclKind::FunctionType, String::new()),
        ]
    );
    let literal = children[1];
    let members = chain.decl(literal).unwrap().children.clone();
    assert_eq!(members.len(), 2);
    assert!(chain.decl(members[1]).unwrap().has_flag(DeclFlags::OPTIONAL));
    let function_type = children[3];
    assert_eq!(
        kinds_of(&chain, &chain.decl(function_type).unwrap().children.clone()),
        vec![(DeclKind::Parameter, "e".to_string())]
    );
}

#[test]
fn test_catch_and_with_blocks() {
    let (mut chain, _) = single(
        r#"
        try { var t = 1; } catch (e) { var inCatch = 2; }
        with (obj) { var inWith = 3; }
        "#,
    );
    let t = only(&mut chain, &["t"], DeclNamespace::Value);
    assert_eq!(
        chain.decl(chain.decl(t).unwrap().parent).unwrap().kind,
        DeclKind::Script,
        "try blocks open no scope"
    );

    let script = chain.decl(t).unwrap().parent;
    let children = chain.decl(script).unwrap().children.clone();
    let catch = children
        .iter()
        .copied()
        .find(|&c| chain.decl(c).unwrap().kind == DeclKind::CatchBlock)
        .expect("catch block decl");
    assert_eq!(
        kinds_of(&chain, &chain.decl(catch).unwrap().children.clone()),
        vec![
            (DeclKind::Variable, "e".to_string()),
            (DeclKind::Variable, "inCatch".to_string())
        ]
    );
    let with = children
        .iter()
        .copied()
        .find(|&c| chain.decl(c).unwrap().kind == DeclKind::WithBlock)
        .expect("with block decl");
    let in_with = chain.decl(with).unwrap().children[0];
    assert!(chain.decl(in_with).unwrap().has_flag(DeclFlags::DECLARED_IN_WITH_BLOCK));
}

#[test]
fn test_ast_decl_maps_round_trip() {
    let (mut chain, unit) = single(
        r#"
        namespace N {
            export class C { constructor(private p: number) { } }
            export function f(a: string) { }
        }
        "#,
    );
    let root = chain.unit(unit).unwrap().top_level_decl;
    for id in chain.decls().descendants(root) {
        let decl = chain.decl(id).unwrap();
        if decl.is_synthesized {
            assert!(chain.get_ast_for_decl(id).is_none(), "synthesized decls have no node");
            continue;
        }
        let node = chain.get_ast_for_decl(id).expect("collected decls map to a node");
        assert_eq!(chain.get_decl_for_ast(unit, node), Some(id), "round trip of {:?}", decl.kind);
    }

    // The property of a property parameter maps at the parameter's name.
    let class = only(&mut chain, &["N", "C"], DeclNamespace::Type);
    let property = *chain.decl(class).unwrap().children.last().unwrap();
    let parameter = chain.decl(property).unwrap().value_decl;
    assert_ne!(chain.get_ast_for_decl(property), chain.get_ast_for_decl(parameter));
}

#[test]
fn test_decl_tree_summary_serializes() {
    let (chain, unit) = single(
        r#"
        namespace M {
            export var v = 1;
        }
        "#,
    );
    let summary = chain.decl_tree_summary(unit).expect("summary");
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["kind"], "Script");
    let module = &json["children"][0];
    assert_eq!(module["kind"], "Container");
    assert_eq!(module["name"], "M");
    assert_eq!(module["value_decl"]["kind"], "Variable");
    let variable = &module["children"][0];
    assert_eq!(variable["name"], "v");
    assert!(
        variable["flags"].as_array().unwrap().iter().any(|f| f == "EXPORTED"),
        "flags: {:?}",
        variable["flags"]
    );
    assert!(variable.get("children").is_none(), "empty children are skipped");
}
