use sema_syntax::{ModifierFlags, NodeData, NodeIndex, SyntaxKind, parse_source_file};

fn statements(result: &sema_syntax::ParseResult) -> Vec<NodeIndex> {
    result.arena.statements(result.root).to_vec()
}

#[test]
fn test_script_with_namespace_and_class() {
    let result = parse_source_file(
        "a.ts",
        r#"
        namespace A.B {
            export class C<T> extends Base<T> implements I {
                private x: number = 1;
                static s: string;
                constructor(public p: T, q?: string) { }
                get v(): number { return 1; }
                set v(value: number) { }
                m<U>(u: U): T[] { return null; }
            }
        }
        "#,
    );
    assert!(result.diagnostics.is_empty(), "unexpected diagnostics: {:?}", result.diagnostics);

    let Some(NodeData::SourceFile(file)) = result.arena.get(result.root).map(|n| &n.data) else {
        panic!("root must be a source file");
    };
    assert!(!file.is_external_module);
    assert!(!file.is_declaration_file);

    let module = statements(&result)[0];
    let Some(NodeData::Module(data)) = result.arena.get(module).map(|n| &n.data) else {
        panic!("expected module declaration");
    };
    assert_eq!(data.name.len(), 2, "dotted name keeps one identifier per segment");
    assert_eq!(result.arena.identifier_text(data.name[1]), Some("B"));

    let class = data.body[0];
    let class_node = result.arena.get(class).unwrap();
    assert_eq!(class_node.kind, SyntaxKind::ClassDeclaration);
    assert!(class_node.has_modifier(ModifierFlags::EXPORT));
    let NodeData::Class(class_data) = &class_node.data else {
        panic!("expected class payload");
    };
    assert_eq!(class_data.type_parameters.len(), 1);
    assert_eq!(class_data.extends.len(), 1);
    assert_eq!(class_data.implements.len(), 1);

    let kinds: Vec<SyntaxKind> = class_data
        .members
        .iter()
        .map(|&m| result.arena.kind(m).unwrap())
        .collect();
    assert_eq!(
        kinds,
        vec![
            SyntaxKind::PropertyDeclaration,
            SyntaxKind::PropertyDeclaration,
            SyntaxKind::ConstructorDeclaration,
            SyntaxKind::GetAccessor,
            SyntaxKind::SetAccessor,
            SyntaxKind::MethodDeclaration,
        ]
    );

    let ctor = result.arena.function(class_data.members[2]).unwrap();
    let first_param = result.arena.get(ctor.parameters[0]).unwrap();
    assert!(first_param.has_modifier(ModifierFlags::PUBLIC));
    let second_param = result.arena.get(ctor.parameters[1]).unwrap();
    assert!(second_param.has_modifier(ModifierFlags::OPTIONAL));

    let method = result.arena.function(class_data.members[5]).unwrap();
    assert_eq!(method.type_parameters.len(), 1);
    assert_eq!(result.arena.kind(method.return_type), Some(SyntaxKind::ArrayType));
    assert!(method.body.is_some());
}

#[test]
fn test_external_module_detection() {
    let exported = parse_source_file("m.ts", "export var x = 1;");
    let import = parse_source_file("n.ts", "import fs = require('fs');");
    let assignment = parse_source_file("o.ts", "var y; export = y;");
    let script = parse_source_file("p.ts", "declare module \"q\" { export var z: number; }");

    for (result, expected) in [(&exported, true), (&import, true), (&assignment, true), (&script, false)] {
        let Some(NodeData::SourceFile(file)) = result.arena.get(result.root).map(|n| &n.data) else {
            panic!("root must be a source file");
        };
        assert_eq!(file.is_external_module, expected, "file {}", file.file_name);
    }
}

#[test]
fn test_declaration_file_flag() {
    let result = parse_source_file("lib.d.ts", "declare var x: number;");
    let Some(NodeData::SourceFile(file)) = result.arena.get(result.root).map(|n| &n.data) else {
        panic!("root must be a source file");
    };
    assert!(file.is_declaration_file);
}

#[test]
fn test_interface_members_and_type_literals() {
    let result = parse_source_file(
        "i.ts",
        r#"
        interface IList<T> extends IBase {
            owner: IList<IList<T>>;
            (x: number): string;
            new (x: number): IList<T>;
            [index: number]: T;
            item?(i: number): { value: T; next: (n: T) => void };
        }
        "#,
    );
    assert!(result.diagnostics.is_empty(), "unexpected diagnostics: {:?}", result.diagnostics);
    let interface = statements(&result)[0];
    let Some(NodeData::Interface(data)) = result.arena.get(interface).map(|n| &n.data) else {
        panic!("expected interface");
    };
    let kinds: Vec<SyntaxKind> = data.members.iter().map(|&m| result.arena.kind(m).unwrap()).collect();
    assert_eq!(
        kinds,
        vec![
            SyntaxKind::PropertySignature,
            SyntaxKind::CallSignature,
            SyntaxKind::ConstructSignature,
            SyntaxKind::IndexSignature,
            SyntaxKind::MethodSignature,
        ]
    );

    let owner = result.arena.variable(data.members[0]).unwrap();
    let Some(NodeData::TypeReference(owner_type)) = result.arena.get(owner.type_annotation).map(|n| &n.data)
    else {
        panic!("owner must be annotated with a type reference");
    };
    assert_eq!(owner_type.type_arguments.len(), 1);
    assert_eq!(result.arena.kind(owner_type.type_arguments[0]), Some(SyntaxKind::TypeReference));

    let item = result.arena.get(data.members[4]).unwrap();
    assert!(item.has_modifier(ModifierFlags::OPTIONAL));
    let item_fn = result.arena.function(data.members[4]).unwrap();
    assert_eq!(result.arena.kind(item_fn.return_type), Some(SyntaxKind::ObjectType));
}

#[test]
fn test_function_expressions_are_kept_inside_skipped_expressions() {
    let result = parse_source_file(
        "f.ts",
        "var f = call(1, function inner(a) { var local; }, { k: function () { } });",
    );
    assert!(result.diagnostics.is_empty(), "unexpected diagnostics: {:?}", result.diagnostics);
    let expressions: Vec<_> = result
        .arena
        .iter()
        .filter(|(_, n)| n.kind == SyntaxKind::FunctionExpression)
        .collect();
    assert_eq!(expressions.len(), 2);

    let statement = statements(&result)[0];
    let Some(NodeData::VariableStatement { declarations }) = result.arena.get(statement).map(|n| &n.data)
    else {
        panic!("expected variable statement");
    };
    let declaration = result.arena.variable(declarations[0]).unwrap();
    let Some(NodeData::Expression { functions }) = result.arena.get(declaration.initializer).map(|n| &n.data)
    else {
        panic!("initializer must be an expression");
    };
    assert_eq!(functions.len(), 2);
}

#[test]
fn test_try_catch_and_with() {
    let result = parse_source_file(
        "t.ts",
        "function f() { try { } catch (e) { var x; } finally { } with (o) { var y; } }",
    );
    assert!(result.diagnostics.is_empty(), "unexpected diagnostics: {:?}", result.diagnostics);
    assert!(result.arena.iter().any(|(_, n)| n.kind == SyntaxKind::CatchClause));
    assert!(result.arena.iter().any(|(_, n)| n.kind == SyntaxKind::WithStatement));
}

#[test]
fn test_errors_are_reported_and_parsing_continues() {
    let result = parse_source_file("e.ts", "class { } var ok = 1;");
    assert!(!result.diagnostics.is_empty());
    assert!(
        result
            .arena
            .iter()
            .any(|(_, n)| n.kind == SyntaxKind::VariableDeclaration),
        "the variable after the broken class must still be parsed"
    );
}

#[test]
fn test_parent_pointers_are_set() {
    let result = parse_source_file("p.ts", "module M { export var x: number; }");
    for (index, node) in result.arena.iter() {
        if index == result.root {
            assert!(node.parent.is_none());
        } else {
            assert!(node.parent.is_some(), "{:?} has no parent", node.kind);
        }
    }
}

#[test]
fn test_kinds_and_indices_serialize() {
    let result = parse_source_file("s.ts", "interface I { }");
    let interface = statements(&result)[0];
    let kind = result.arena.kind(interface).unwrap();
    assert_eq!(serde_json::to_string(&kind).unwrap(), "\"InterfaceDeclaration\"");
    assert_eq!(serde_json::to_string(&NodeIndex(7)).unwrap(), "7");
}
