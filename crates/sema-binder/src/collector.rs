//! Declaration collector.
//!
//! Walks one unit's AST and produces its `Decl` tree. The walk keeps a parent
//! stack plus three scoped contexts:
//! - whether we are inside an ambient module (ambient flag inheritance)
//! - whether the innermost ambient external module has an `export =`
//!   (suppresses implicit exports)
//! - whether the file is a declaration file (everything is ambient)
//!
//! Value-initializing containers (modules holding values, enums, classes) get a
//! synthesized value decl when the walk leaves them.

use crate::decl::{DeclArena, DeclFlags, DeclInit, DeclKind};
use crate::ids::{DeclId, UnitId};
use crate::semantic_info::SemanticInfo;
use sema_syntax::{ModifierFlags, Node, NodeArena, NodeData, NodeIndex, SyntaxKind};
use tracing::trace;

/// Lookup name of a quoted module: the unescaped text between double quotes.
pub(crate) fn quoted_module_name(text: &str) -> String {
    format!("\"{text}\"")
}

/// Module path of a file name: the name without `.d.ts` / `.ts`.
pub(crate) fn strip_source_extension(file_name: &str) -> &str {
    file_name
        .strip_suffix(".d.ts")
        .or_else(|| file_name.strip_suffix(".ts"))
        .unwrap_or(file_name)
}

pub(crate) struct DeclCollector<'a> {
    decls: &'a mut DeclArena,
    info: &'a mut SemanticInfo,
    arena: &'a NodeArena,
    unit: UnitId,
    parents: Vec<DeclId>,
    in_ambient_module: Vec<bool>,
    has_export_assignment: Vec<bool>,
    in_declare_file: bool,
    with_depth: u32,
}

impl<'a> DeclCollector<'a> {
    pub(crate) fn new(decls: &'a mut DeclArena, info: &'a mut SemanticInfo, arena: &'a NodeArena) -> Self {
        let unit = info.unit;
        DeclCollector {
            decls,
            info,
            arena,
            unit,
            parents: Vec::new(),
            in_ambient_module: Vec::new(),
            has_export_assignment: Vec::new(),
            in_declare_file: false,
            with_depth: 0,
        }
    }

    /// Collect the whole unit and return its `Script` decl.
    pub(crate) fn collect(mut self) -> DeclId {
        let arena = self.arena;
        let root = self.info.root_node;
        let Some(NodeData::SourceFile(file)) = arena.get(root).map(|n| &n.data) else {
            // Not a source file: an empty script keeps the unit addressable.
            let file_name = self.info.file_name.clone();
            let script = self.add_decl(DeclKind::Script, file_name.clone(), file_name, DeclFlags::empty(), root);
            self.info.top_level_decl = script;
            return script;
        };

        self.info.is_declaration_file = file.is_declaration_file;
        self.info.is_external_module = file.is_external_module;
        self.in_declare_file = file.is_declaration_file;

        let file_name = self.info.file_name.clone();
        let script = self.add_decl(
            DeclKind::Script,
            file_name.clone(),
            file_name.clone(),
            DeclFlags::empty(),
            root,
        );
        self.info.top_level_decl = script;
        self.parents.push(script);

        if file.is_external_module {
            let path = strip_source_extension(&file_name);
            let mut flags = DeclFlags::EXPORTED;
            if self.in_declare_file {
                flags |= DeclFlags::AMBIENT;
            }
            if self.statements_have_export_assignment(&file.statements) {
                flags |= DeclFlags::HAS_EXPORT_ASSIGNMENT;
            }
            let module = self.add_decl(
                DeclKind::DynamicModule,
                quoted_module_name(path),
                path.to_string(),
                flags,
                NodeIndex::NONE,
            );
            self.parents.push(module);
            self.in_ambient_module.push(false);
            self.has_export_assignment
                .push(flags.contains(DeclFlags::HAS_EXPORT_ASSIGNMENT));
            self.collect_statements(&file.statements);
            self.has_export_assignment.pop();
            self.in_ambient_module.pop();
            self.parents.pop();
            self.finish_module(module);
        } else {
            self.collect_statements(&file.statements);
        }

        self.parents.pop();
        trace!(unit = self.unit.0, decls = self.decls.len(), "collected unit");
        script
    }

    // =========================================================================
    // Context helpers
    // =========================================================================

    fn parent(&self) -> DeclId {
        self.parents.last().copied().unwrap_or(DeclId::NONE)
    }

    fn in_ambient_context(&self) -> bool {
        self.in_declare_file || self.in_ambient_module.last().copied().unwrap_or(false)
    }

    fn statements_have_export_assignment(&self, statements: &[NodeIndex]) -> bool {
        statements
            .iter()
            .any(|&s| self.arena.kind(s) == Some(SyntaxKind::ExportAssignment))
    }

    /// Flags of a declaration node: its modifiers plus inherited context.
    fn flags_for(&self, node: &Node) -> DeclFlags {
        let mut flags = DeclFlags::empty();
        let modifiers = node.modifiers;
        if modifiers.contains(ModifierFlags::EXPORT) {
            flags |= DeclFlags::EXPORTED;
        }
        if modifiers.contains(ModifierFlags::DECLARE) || self.in_ambient_context() {
            flags |= DeclFlags::AMBIENT;
        }
        if modifiers.contains(ModifierFlags::STATIC) {
            flags |= DeclFlags::STATIC;
        }
        if modifiers.contains(ModifierFlags::PRIVATE) {
            flags |= DeclFlags::PRIVATE;
        }
        if modifiers.contains(ModifierFlags::PUBLIC) {
            flags |= DeclFlags::PUBLIC;
        }
        if modifiers.contains(ModifierFlags::OPTIONAL) {
            flags |= DeclFlags::OPTIONAL;
        }
        if modifiers.contains(ModifierFlags::REST) {
            flags |= DeclFlags::REST;
        }
        if self.with_depth > 0 {
            flags |= DeclFlags::DECLARED_IN_WITH_BLOCK;
        }
        flags
    }

    /// Implicit export inside an ambient external module without `export =`.
    fn implicit_export(&self) -> DeclFlags {
        let parent_is_ambient_dynamic = self
            .decls
            .get(self.parent())
            .is_some_and(|p| {
                p.kind == DeclKind::DynamicModule && p.node.is_some() && p.has_flag(DeclFlags::AMBIENT)
            });
        let suppressed = self.has_export_assignment.last().copied().unwrap_or(false);
        if parent_is_ambient_dynamic && !suppressed {
            DeclFlags::EXPORTED
        } else {
            DeclFlags::empty()
        }
    }

    /// Text and source spelling of a name node.
    fn name_of(&self, name: NodeIndex) -> (String, String) {
        self.arena
            .identifier(name)
            .map(|id| (id.text.clone(), id.raw.clone()))
            .unwrap_or_default()
    }

    fn add_decl(
        &mut self,
        kind: DeclKind,
        name: String,
        display_name: String,
        flags: DeclFlags,
        node: NodeIndex,
    ) -> DeclId {
        let span = self
            .arena
            .get(node)
            .map(Node::span)
            .unwrap_or_default();
        let id = self.decls.alloc(DeclInit {
            kind,
            name,
            display_name,
            flags,
            span,
            unit: self.unit,
            node,
            parent: self.parent(),
        });
        self.info.map_decl(node, id);
        id
    }

    /// A value was declared in the current container, possibly inside catch
    /// or with blocks.
    fn mark_parent_initialized(&mut self) {
        let mut parent = self.parent();
        while let Some(decl) = self.decls.get(parent)
            && decl.kind.is_some_block()
        {
            parent = decl.parent;
        }
        let Some(decl) = self.decls.get_mut(parent) else {
            return;
        };
        match decl.kind {
            DeclKind::Container => decl.add_late_flags(DeclFlags::INITIALIZED_MODULE),
            DeclKind::DynamicModule => decl.add_late_flags(DeclFlags::INITIALIZED_DYNAMIC_MODULE),
            _ => {}
        }
    }

    /// Synthesize the implicit value decl of `owner` as a sibling that is not
    /// one of the parent's children.
    fn synthesize_value_decl(&mut self, owner: DeclId, kind: DeclKind, flag: DeclFlags) {
        let Some(decl) = self.decls.get(owner) else {
            return;
        };
        let init = DeclInit {
            kind,
            name: decl.name.clone(),
            display_name: decl.display_name.clone(),
            flags: (decl.flags() - DeclFlags::LATE) | flag,
            span: decl.span,
            unit: self.unit,
            node: NodeIndex::NONE,
            parent: decl.parent,
        };
        let value = self.decls.alloc_synthesized(init);
        self.decls.link_value_decls(owner, value);
    }

    /// Exit step of a module: synthesize its value and tell the enclosing
    /// container it is initialized too.
    fn finish_module(&mut self, module: DeclId) {
        let Some(decl) = self.decls.get(module) else {
            return;
        };
        let flag = if decl.has_flag(DeclFlags::INITIALIZED_DYNAMIC_MODULE) {
            DeclFlags::INITIALIZED_DYNAMIC_MODULE
        } else if decl.has_flag(DeclFlags::INITIALIZED_MODULE) {
            DeclFlags::INITIALIZED_MODULE
        } else {
            return;
        };
        self.synthesize_value_decl(module, DeclKind::Variable, flag);
        self.mark_parent_initialized();
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn collect_statements(&mut self, statements: &[NodeIndex]) {
        for &statement in statements {
            self.collect_statement(statement);
        }
    }

    fn collect_statement(&mut self, index: NodeIndex) {
        let arena = self.arena;
        let Some(node) = arena.get(index) else {
            return;
        };
        match &node.data {
            NodeData::Module(_) => self.collect_module(index, node),
            NodeData::Class(_) => self.collect_class(index, node),
            NodeData::Interface(_) => self.collect_interface(index, node),
            NodeData::Enum(_) => self.collect_enum(index, node),
            NodeData::Function(_) if node.kind == SyntaxKind::FunctionDeclaration => {
                let (name, display) = self.name_of(arena.name_of(index));
                self.mark_parent_initialized();
                self.collect_function_like(DeclKind::Function, name, display, index, node);
            }
            NodeData::VariableStatement { declarations } => {
                for &declaration in declarations {
                    self.collect_variable(declaration);
                }
            }
            NodeData::Import(import) => {
                let (name, display) = self.name_of(import.name);
                let mut flags = self.flags_for(node);
                flags.remove(DeclFlags::AMBIENT);
                self.add_decl(DeclKind::TypeAlias, name, display, flags, index);
            }
            NodeData::Try(data) => {
                self.collect_block(data.try_block);
                self.collect_catch(data.catch_clause);
                self.collect_block(data.finally_block);
            }
            NodeData::With(data) => {
                self.collect_function_expressions(data.expression);
                let block = self.add_decl(DeclKind::WithBlock, String::new(), String::new(), self.flags_for(node), index);
                self.parents.push(block);
                self.with_depth += 1;
                if arena.kind(data.body) == Some(SyntaxKind::Block) {
                    self.collect_block(data.body);
                } else {
                    self.collect_statement(data.body);
                }
                self.with_depth -= 1;
                self.parents.pop();
            }
            NodeData::Block { statements } => self.collect_statements(statements),
            NodeData::Statement { expression } => self.collect_function_expressions(*expression),
            _ => {}
        }
    }

    fn collect_block(&mut self, block: NodeIndex) {
        let arena = self.arena;
        self.collect_statements(arena.statements(block));
    }

    fn collect_catch(&mut self, clause: NodeIndex) {
        let arena = self.arena;
        let Some(node) = arena.get(clause) else {
            return;
        };
        let NodeData::Catch(data) = &node.data else {
            return;
        };
        let block = self.add_decl(DeclKind::CatchBlock, String::new(), String::new(), self.flags_for(node), clause);
        self.parents.push(block);
        if let Some(variable) = arena.get(data.variable) {
            let (name, display) = self.name_of(arena.name_of(data.variable));
            let flags = self.flags_for(variable);
            self.add_decl(DeclKind::Variable, name, display, flags, data.variable);
        }
        self.collect_block(data.block);
        self.parents.pop();
    }

    /// Function expressions nested in an opaque expression go under the
    /// current parent.
    fn collect_function_expressions(&mut self, expression: NodeIndex) {
        let arena = self.arena;
        let Some(NodeData::Expression { functions }) = arena.get(expression).map(|n| &n.data) else {
            return;
        };
        for &function in functions {
            let Some(node) = arena.get(function) else { continue };
            let (name, display) = self.name_of(arena.name_of(function));
            self.collect_function_like(DeclKind::FunctionExpression, name, display, function, node);
        }
    }

    fn collect_variable(&mut self, index: NodeIndex) {
        let arena = self.arena;
        let (Some(node), Some(data)) = (arena.get(index), arena.variable(index)) else {
            return;
        };
        let (name, display) = self.name_of(data.name);
        let flags = self.flags_for(node) | self.implicit_export();
        self.mark_parent_initialized();
        self.add_decl(DeclKind::Variable, name, display, flags, index);
        let parent = self.parent();
        self.collect_type_literals(data.type_annotation, parent);
        self.collect_function_expressions(data.initializer);
    }

    // =========================================================================
    // Modules
    // =========================================================================

    fn collect_module(&mut self, index: NodeIndex, node: &Node) {
        let NodeData::Module(data) = &node.data else {
            return;
        };
        let arena = self.arena;
        let is_quoted = data
            .name
            .first()
            .is_some_and(|&n| arena.kind(n) == Some(SyntaxKind::StringLiteral));
        let mut base_flags = self.flags_for(node) | self.implicit_export();
        if is_quoted {
            base_flags |= DeclFlags::AMBIENT;
        }
        let ambient = base_flags.contains(DeclFlags::AMBIENT);

        // One container per dotted segment; the innermost one owns the body.
        let mut opened = Vec::with_capacity(data.name.len());
        for (position, &segment) in data.name.iter().enumerate() {
            let is_innermost = position + 1 == data.name.len();
            let (text, raw) = self.name_of(segment);
            let (kind, name) = if is_quoted {
                (DeclKind::DynamicModule, quoted_module_name(&text))
            } else {
                (DeclKind::Container, text)
            };
            let mut flags = if position == 0 {
                base_flags
            } else {
                let mut inner = DeclFlags::EXPORTED;
                inner.set(DeclFlags::AMBIENT, ambient);
                inner
            };
            if is_innermost && self.statements_have_export_assignment(&data.body) {
                flags |= DeclFlags::HAS_EXPORT_ASSIGNMENT;
            }
            let mapped = if is_innermost { index } else { segment };
            let decl = self.add_decl(kind, name, raw, flags, mapped);
            self.parents.push(decl);
            opened.push(decl);
        }
        if opened.is_empty() {
            return;
        }

        let innermost_flags = self
            .decls
            .get(*opened.last().unwrap_or(&DeclId::NONE))
            .map(|d| d.flags())
            .unwrap_or_default();
        self.in_ambient_module.push(ambient);
        self.has_export_assignment
            .push(innermost_flags.contains(DeclFlags::HAS_EXPORT_ASSIGNMENT));
        self.collect_statements(&data.body);
        self.has_export_assignment.pop();
        self.in_ambient_module.pop();

        for decl in opened.into_iter().rev() {
            self.parents.pop();
            self.finish_module(decl);
        }
    }

    // =========================================================================
    // Classes, interfaces and enums
    // =========================================================================

    fn collect_class(&mut self, index: NodeIndex, node: &Node) {
        let NodeData::Class(data) = &node.data else {
            return;
        };
        let (name, display) = self.name_of(data.name);
        let flags = self.flags_for(node) | self.implicit_export();
        self.mark_parent_initialized();
        let class = self.add_decl(DeclKind::Class, name, display, flags, index);
        self.parents.push(class);
        self.collect_type_parameters(&data.type_parameters);
        for &heritage in data.extends.iter().chain(&data.implements) {
            self.collect_type_literals(heritage, class);
        }
        for &member in &data.members {
            self.collect_class_member(member);
        }
        self.parents.pop();
        self.synthesize_value_decl(
            class,
            DeclKind::ConstructorMethod,
            DeclFlags::CLASS_CONSTRUCTOR_VARIABLE,
        );
    }

    fn collect_class_member(&mut self, index: NodeIndex) {
        let arena = self.arena;
        let Some(node) = arena.get(index) else {
            return;
        };
        let (name, display) = self.name_of(arena.name_of(index));
        match node.kind {
            SyntaxKind::PropertyDeclaration => {
                let Some(data) = arena.variable(index) else { return };
                let flags = self.flags_for(node);
                self.add_decl(DeclKind::Property, name, display, flags, index);
                let parent = self.parent();
                self.collect_type_literals(data.type_annotation, parent);
                self.collect_function_expressions(data.initializer);
            }
            SyntaxKind::ConstructorDeclaration => {
                self.collect_function_like(DeclKind::ConstructorMethod, String::new(), String::new(), index, node);
            }
            SyntaxKind::MethodDeclaration => {
                self.collect_function_like(DeclKind::Method, name, display, index, node);
            }
            SyntaxKind::GetAccessor => {
                self.collect_function_like(DeclKind::GetAccessor, name, display, index, node);
            }
            SyntaxKind::SetAccessor => {
                self.collect_function_like(DeclKind::SetAccessor, name, display, index, node);
            }
            SyntaxKind::IndexSignature => {
                self.collect_function_like(DeclKind::IndexSignature, String::new(), String::new(), index, node);
            }
            _ => {}
        }
    }

    fn collect_interface(&mut self, index: NodeIndex, node: &Node) {
        let NodeData::Interface(data) = &node.data else {
            return;
        };
        let (name, display) = self.name_of(data.name);
        let flags = self.flags_for(node) | self.implicit_export();
        let interface = self.add_decl(DeclKind::Interface, name, display, flags, index);
        self.parents.push(interface);
        self.collect_type_parameters(&data.type_parameters);
        for &heritage in &data.extends {
            self.collect_type_literals(heritage, interface);
        }
        self.collect_type_members(&data.members);
        self.parents.pop();
    }

    fn collect_enum(&mut self, index: NodeIndex, node: &Node) {
        let NodeData::Enum(data) = &node.data else {
            return;
        };
        let arena = self.arena;
        let (name, display) = self.name_of(data.name);
        let flags = self.flags_for(node) | self.implicit_export();
        self.mark_parent_initialized();
        let decl = self.add_decl(DeclKind::Enum, name, display, flags, index);
        self.parents.push(decl);
        for &member in &data.members {
            let Some(NodeData::EnumMember(member_data)) = arena.get(member).map(|n| &n.data) else {
                continue;
            };
            let (member_name, member_display) = self.name_of(member_data.name);
            let mut member_flags = DeclFlags::EXPORTED;
            member_flags.set(DeclFlags::AMBIENT, flags.contains(DeclFlags::AMBIENT));
            member_flags.set(DeclFlags::CONSTANT, member_data.initializer.is_some());
            self.add_decl(DeclKind::EnumMember, member_name, member_display, member_flags, member);
        }
        self.parents.pop();
        self.synthesize_value_decl(decl, DeclKind::Variable, DeclFlags::ENUM);
    }

    // =========================================================================
    // Function-likes, parameters and type members
    // =========================================================================

    fn collect_function_like(
        &mut self,
        kind: DeclKind,
        name: String,
        display: String,
        index: NodeIndex,
        node: &Node,
    ) {
        let arena = self.arena;
        let Some(data) = arena.function(index) else {
            return;
        };
        let mut flags = self.flags_for(node);
        if matches!(kind, DeclKind::Function) {
            flags |= self.implicit_export();
        }
        if data.body.is_none() {
            flags |= DeclFlags::SIGNATURE;
        }
        let decl = self.add_decl(kind, name, display, flags, index);
        self.parents.push(decl);
        self.collect_type_parameters(&data.type_parameters);
        for &parameter in &data.parameters {
            self.collect_parameter(kind, parameter);
        }
        self.collect_type_literals(data.return_type, decl);
        if data.body.is_some() {
            self.collect_block(data.body);
        }
        self.parents.pop();
    }

    fn collect_parameter(&mut self, owner_kind: DeclKind, index: NodeIndex) {
        let arena = self.arena;
        let (Some(node), Some(data)) = (arena.get(index), arena.variable(index)) else {
            return;
        };
        let (name, display) = self.name_of(data.name);
        let mut flags = self.flags_for(node);
        let is_constructor = owner_kind == DeclKind::ConstructorMethod;
        let is_property_parameter =
            is_constructor && node.modifiers.intersects(ModifierFlags::PUBLIC | ModifierFlags::PRIVATE);
        if is_constructor {
            flags |= DeclFlags::CONSTRUCTOR_PARAMETER;
        }
        if is_property_parameter {
            flags |= DeclFlags::PROPERTY_PARAMETER;
        }
        let parameter = self.add_decl(DeclKind::Parameter, name.clone(), display.clone(), flags, index);
        let owner = self.parent();
        self.collect_type_literals(data.type_annotation, owner);

        if is_property_parameter {
            // The property lives on the class, one level above the constructor.
            let class = self.parents.len().checked_sub(2).map(|i| self.parents[i]);
            let Some(class) = class else { return };
            let property_flags = flags
                & (DeclFlags::PUBLIC | DeclFlags::PRIVATE | DeclFlags::OPTIONAL | DeclFlags::AMBIENT);
            self.parents.push(class);
            let property = self.add_decl(DeclKind::Property, name, display, property_flags, data.name);
            self.parents.pop();
            self.decls.link_value_decls(parameter, property);
        }
    }

    fn collect_type_parameters(&mut self, type_parameters: &[NodeIndex]) {
        let arena = self.arena;
        for &index in type_parameters {
            let Some(NodeData::TypeParameter(data)) = arena.get(index).map(|n| &n.data) else {
                continue;
            };
            let (name, display) = self.name_of(data.name);
            self.add_decl(DeclKind::TypeParameter, name, display, DeclFlags::empty(), index);
            let owner = self.parent();
            self.collect_type_literals(data.constraint, owner);
        }
    }

    /// Members of an interface body or object type literal.
    fn collect_type_members(&mut self, members: &[NodeIndex]) {
        let arena = self.arena;
        for &member in members {
            let Some(node) = arena.get(member) else { continue };
            let (name, display) = self.name_of(arena.name_of(member));
            match node.kind {
                SyntaxKind::PropertySignature => {
                    let Some(data) = arena.variable(member) else { continue };
                    let flags = self.flags_for(node);
                    self.add_decl(DeclKind::Property, name, display, flags, member);
                    let parent = self.parent();
                    self.collect_type_literals(data.type_annotation, parent);
                }
                SyntaxKind::MethodSignature => {
                    self.collect_function_like(DeclKind::Method, name, display, member, node);
                }
                SyntaxKind::CallSignature => {
                    self.collect_function_like(DeclKind::CallSignature, String::new(), String::new(), member, node);
                }
                SyntaxKind::ConstructSignature => {
                    self.collect_function_like(
                        DeclKind::ConstructSignature,
                        String::new(),
                        String::new(),
                        member,
                        node,
                    );
                }
                SyntaxKind::IndexSignature => {
                    self.collect_function_like(DeclKind::IndexSignature, String::new(), String::new(), member, node);
                }
                _ => {}
            }
        }
    }

    /// Object, function and constructor type literals inside a type
    /// annotation become anonymous decls under `scope`.
    fn collect_type_literals(&mut self, type_node: NodeIndex, scope: DeclId) {
        let arena = self.arena;
        let Some(node) = arena.get(type_node) else {
            return;
        };
        match &node.data {
            NodeData::ArrayType { element } => self.collect_type_literals(*element, scope),
            NodeData::TypeReference(reference) => {
                for &argument in &reference.type_arguments {
                    self.collect_type_literals(argument, scope);
                }
            }
            NodeData::ObjectType { members } => {
                self.parents.push(scope);
                let literal = self.add_decl(DeclKind::ObjectType, String::new(), String::new(), DeclFlags::empty(), type_node);
                self.parents.push(literal);
                self.collect_type_members(members);
                self.parents.pop();
                self.parents.pop();
            }
            NodeData::Function(_) => {
                let kind = match node.kind {
                    SyntaxKind::FunctionType => DeclKind::FunctionType,
                    SyntaxKind::ConstructorType => DeclKind::ConstructorType,
                    _ => return,
                };
                self.parents.push(scope);
                self.collect_function_like(kind, String::new(), String::new(), type_node, node);
                self.parents.pop();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_names() {
        assert_eq!(quoted_module_name("fs"), "\"fs\"");
        assert_eq!(strip_source_extension("lib/a.d.ts"), "lib/a");
        assert_eq!(strip_source_extension("b.ts"), "b");
        assert_eq!(strip_source_extension("c.js"), "c.js");
    }
}
