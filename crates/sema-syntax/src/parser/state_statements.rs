//! Parser state - statements and top-level declarations

use super::ParserState;
use crate::node::{
    CatchData, EnumData, EnumMemberData, ExportAssignmentData, FunctionData, ImportData,
    InterfaceData, ModifierFlags, ModuleData, NodeData, NodeIndex, NodeList, SyntaxKind, TryData,
    VariableData, WithData,
};
use crate::scanner::TokenKind;
use sema_common::diagnostic_codes;

impl ParserState {
    pub(crate) fn parse_statements_until_eof(&mut self) -> NodeList {
        let mut statements = Vec::new();
        while !self.is_eof() {
            self.parse_statement_into(&mut statements);
        }
        statements
    }

    /// Statements up to (not including) the closing `}`.
    pub(crate) fn parse_statements_until_close_brace(&mut self) -> NodeList {
        let mut statements = Vec::new();
        while !self.is_eof() && !self.is_punct("}") {
            self.parse_statement_into(&mut statements);
        }
        statements
    }

    fn parse_statement_into(&mut self, statements: &mut NodeList) {
        let before = self.current;
        let statement = self.parse_statement();
        if statement.is_some() {
            statements.push(statement);
        }
        if self.current == before {
            self.error_at_current(diagnostic_codes::DECLARATION_OR_STATEMENT_EXPECTED, &[]);
            self.next_token();
        }
    }

    pub(crate) fn parse_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        if self.is_keyword("export") && self.peek(1).is_punct("=") {
            return self.parse_export_assignment(start);
        }
        let modifiers = self.parse_statement_modifiers();

        if self.is_keyword("module") || self.is_keyword("namespace") {
            let next = self.peek(1);
            if matches!(next.kind, TokenKind::Identifier | TokenKind::StringLiteral) {
                return self.parse_module_declaration(modifiers, start);
            }
        }
        if self.is_keyword("class") {
            return self.parse_class_declaration(modifiers, start);
        }
        if self.is_keyword("interface") {
            return self.parse_interface_declaration(modifiers, start);
        }
        if self.is_keyword("enum") {
            return self.parse_enum_declaration(modifiers, start);
        }
        if self.is_keyword("function") {
            return self.parse_function_declaration(modifiers, start);
        }
        if self.is_keyword("var") || self.is_keyword("let") || self.is_keyword("const") {
            return self.parse_variable_statement(modifiers, start);
        }
        if self.is_keyword("import") && self.peek(1).kind == TokenKind::Identifier {
            return self.parse_import_declaration(modifiers, start);
        }
        if !modifiers.is_empty() {
            self.error_at_current(diagnostic_codes::DECLARATION_OR_STATEMENT_EXPECTED, &[]);
            return NodeIndex::NONE;
        }

        if self.is_keyword("try") {
            return self.parse_try_statement(start);
        }
        if self.is_keyword("with") && self.peek(1).is_punct("(") {
            return self.parse_with_statement(start);
        }
        if self.is_keyword("return") {
            self.next_token();
            let expression = if self.is_punct(";") || self.is_punct("}") {
                NodeIndex::NONE
            } else {
                self.parse_expression()
            };
            self.parse_semicolon();
            let end = self.last_end();
            return self.arena.add(
                SyntaxKind::ReturnStatement,
                ModifierFlags::empty(),
                start,
                end,
                NodeData::Statement { expression },
            );
        }
        if self.is_punct("{") {
            return self.parse_block();
        }
        if self.parse_optional(";") {
            return NodeIndex::NONE;
        }

        let expression = self.parse_expression();
        if expression.is_none() {
            return NodeIndex::NONE;
        }
        self.parse_semicolon();
        let end = self.last_end();
        self.arena.add(
            SyntaxKind::ExpressionStatement,
            ModifierFlags::empty(),
            start,
            end,
            NodeData::Statement { expression },
        )
    }

    /// `export` and `declare` in any order.
    fn parse_statement_modifiers(&mut self) -> ModifierFlags {
        let mut modifiers = ModifierFlags::empty();
        loop {
            let next_is_name = self.peek(1).kind == TokenKind::Identifier;
            if self.is_keyword("export") && next_is_name {
                modifiers |= ModifierFlags::EXPORT;
            } else if self.is_keyword("declare") && next_is_name {
                modifiers |= ModifierFlags::DECLARE;
            } else {
                return modifiers;
            }
            self.next_token();
        }
    }

    pub(crate) fn parse_block(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.parse_expected("{");
        let statements = self.parse_statements_until_close_brace();
        self.parse_expected("}");
        let end = self.last_end();
        self.arena.add(
            SyntaxKind::Block,
            ModifierFlags::empty(),
            start,
            end,
            NodeData::Block { statements },
        )
    }

    fn parse_export_assignment(&mut self, start: u32) -> NodeIndex {
        self.next_token(); // export
        self.next_token(); // =
        let name = self.parse_identifier();
        self.parse_semicolon();
        let end = self.last_end();
        self.arena.add(
            SyntaxKind::ExportAssignment,
            ModifierFlags::empty(),
            start,
            end,
            NodeData::ExportAssignment(ExportAssignmentData { name }),
        )
    }

    fn parse_module_declaration(&mut self, modifiers: ModifierFlags, start: u32) -> NodeIndex {
        self.next_token(); // module / namespace
        let name = if self.token().kind == TokenKind::StringLiteral {
            vec![self.parse_string_literal()]
        } else {
            self.parse_entity_name()
        };
        let body = if self.parse_expected("{") {
            let body = self.parse_statements_until_close_brace();
            self.parse_expected("}");
            body
        } else {
            Vec::new()
        };
        let end = self.last_end();
        self.arena.add(
            SyntaxKind::ModuleDeclaration,
            modifiers,
            start,
            end,
            NodeData::Module(ModuleData { name, body }),
        )
    }

    fn parse_interface_declaration(&mut self, modifiers: ModifierFlags, start: u32) -> NodeIndex {
        self.next_token(); // interface
        let name = self.parse_identifier();
        let type_parameters = self.parse_type_parameters();
        let mut extends = Vec::new();
        if self.parse_optional_keyword("extends") {
            extends = self.parse_heritage_list();
        }
        let members = self.parse_object_type_members();
        let end = self.last_end();
        self.arena.add(
            SyntaxKind::InterfaceDeclaration,
            modifiers,
            start,
            end,
            NodeData::Interface(InterfaceData {
                name,
                type_parameters,
                extends,
                members,
            }),
        )
    }

    /// Comma-separated type references after `extends` / `implements`.
    pub(crate) fn parse_heritage_list(&mut self) -> NodeList {
        let mut types = Vec::new();
        loop {
            let ty = self.parse_type_reference();
            if ty.is_none() {
                break;
            }
            types.push(ty);
            if !self.parse_optional(",") {
                break;
            }
        }
        types
    }

    fn parse_enum_declaration(&mut self, modifiers: ModifierFlags, start: u32) -> NodeIndex {
        self.next_token(); // enum
        let name = self.parse_identifier();
        let mut members = Vec::new();
        if self.parse_expected("{") {
            while !self.is_eof() && !self.is_punct("}") {
                let member_start = self.token_pos();
                let member_name = self.parse_property_name();
                if member_name.is_none() {
                    self.next_token();
                    continue;
                }
                let initializer = if self.parse_optional("=") {
                    self.parse_expression()
                } else {
                    NodeIndex::NONE
                };
                let end = self.last_end();
                members.push(self.arena.add(
                    SyntaxKind::EnumMember,
                    ModifierFlags::empty(),
                    member_start,
                    end,
                    NodeData::EnumMember(EnumMemberData {
                        name: member_name,
                        initializer,
                    }),
                ));
                if !self.parse_optional(",") {
                    break;
                }
            }
            self.parse_expected("}");
        }
        let end = self.last_end();
        self.arena.add(
            SyntaxKind::EnumDeclaration,
            modifiers,
            start,
            end,
            NodeData::Enum(EnumData { name, members }),
        )
    }

    fn parse_function_declaration(&mut self, modifiers: ModifierFlags, start: u32) -> NodeIndex {
        self.next_token(); // function
        let name = self.parse_identifier();
        let (type_parameters, parameters, return_type) = self.parse_signature_parts(":");
        let body = self.parse_function_body();
        let end = self.last_end();
        self.arena.add(
            SyntaxKind::FunctionDeclaration,
            modifiers,
            start,
            end,
            NodeData::Function(FunctionData {
                name,
                type_parameters,
                parameters,
                return_type,
                body,
            }),
        )
    }

    pub(crate) fn parse_function_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token(); // function
        let name = if self.is_identifier() {
            self.parse_identifier()
        } else {
            NodeIndex::NONE
        };
        let (type_parameters, parameters, return_type) = self.parse_signature_parts(":");
        let body = if self.is_punct("{") {
            self.parse_block()
        } else {
            self.parse_expected("{");
            NodeIndex::NONE
        };
        let end = self.last_end();
        self.arena.add(
            SyntaxKind::FunctionExpression,
            ModifierFlags::empty(),
            start,
            end,
            NodeData::Function(FunctionData {
                name,
                type_parameters,
                parameters,
                return_type,
                body,
            }),
        )
    }

    /// A `{ ... }` body, or `NONE` after a terminating `;` (overloads, ambient).
    pub(crate) fn parse_function_body(&mut self) -> NodeIndex {
        if self.is_punct("{") {
            return self.parse_block();
        }
        self.parse_semicolon();
        NodeIndex::NONE
    }

    fn parse_variable_statement(&mut self, modifiers: ModifierFlags, start: u32) -> NodeIndex {
        self.next_token(); // var / let / const
        let mut declarations = Vec::new();
        loop {
            let decl_start = self.token_pos();
            let name = self.parse_identifier();
            if name.is_none() {
                break;
            }
            let type_annotation = if self.parse_optional(":") {
                self.parse_type()
            } else {
                NodeIndex::NONE
            };
            let initializer = if self.parse_optional("=") {
                self.parse_expression()
            } else {
                NodeIndex::NONE
            };
            let end = self.last_end();
            declarations.push(self.arena.add(
                SyntaxKind::VariableDeclaration,
                modifiers,
                decl_start,
                end,
                NodeData::Variable(VariableData {
                    name,
                    type_annotation,
                    initializer,
                }),
            ));
            if !self.parse_optional(",") {
                break;
            }
        }
        self.parse_semicolon();
        let end = self.last_end();
        self.arena.add(
            SyntaxKind::VariableStatement,
            modifiers,
            start,
            end,
            NodeData::VariableStatement { declarations },
        )
    }

    fn parse_import_declaration(&mut self, modifiers: ModifierFlags, start: u32) -> NodeIndex {
        self.next_token(); // import
        let name = self.parse_identifier();
        self.parse_expected("=");
        let (reference, is_external) = if self.is_keyword("require") && self.peek(1).is_punct("(") {
            self.next_token();
            self.next_token();
            let path = self.parse_string_literal();
            self.parse_expected(")");
            (if path.is_some() { vec![path] } else { Vec::new() }, true)
        } else {
            (self.parse_entity_name(), false)
        };
        self.parse_semicolon();
        let end = self.last_end();
        self.arena.add(
            SyntaxKind::ImportDeclaration,
            modifiers,
            start,
            end,
            NodeData::Import(ImportData {
                name,
                reference,
                is_external,
            }),
        )
    }

    fn parse_try_statement(&mut self, start: u32) -> NodeIndex {
        self.next_token(); // try
        let try_block = self.parse_block();
        let mut catch_clause = NodeIndex::NONE;
        if self.is_keyword("catch") {
            let catch_start = self.token_pos();
            self.next_token();
            self.parse_expected("(");
            let variable_start = self.token_pos();
            let variable_name = self.parse_identifier();
            let variable = if variable_name.is_some() {
                let end = self.last_end();
                self.arena.add(
                    SyntaxKind::VariableDeclaration,
                    ModifierFlags::empty(),
                    variable_start,
                    end,
                    NodeData::Variable(VariableData {
                        name: variable_name,
                        type_annotation: NodeIndex::NONE,
                        initializer: NodeIndex::NONE,
                    }),
                )
            } else {
                NodeIndex::NONE
            };
            self.parse_expected(")");
            let block = self.parse_block();
            let end = self.last_end();
            catch_clause = self.arena.add(
                SyntaxKind::CatchClause,
                ModifierFlags::empty(),
                catch_start,
                end,
                NodeData::Catch(CatchData { variable, block }),
            );
        }
        let finally_block = if self.parse_optional_keyword("finally") {
            self.parse_block()
        } else {
            NodeIndex::NONE
        };
        let end = self.last_end();
        self.arena.add(
            SyntaxKind::TryStatement,
            ModifierFlags::empty(),
            start,
            end,
            NodeData::Try(TryData {
                try_block,
                catch_clause,
                finally_block,
            }),
        )
    }

    fn parse_with_statement(&mut self, start: u32) -> NodeIndex {
        self.next_token(); // with
        self.parse_expected("(");
        let expression = self.parse_expression();
        self.parse_expected(")");
        let body = if self.is_punct("{") {
            self.parse_block()
        } else {
            self.parse_statement()
        };
        let end = self.last_end();
        self.arena.add(
            SyntaxKind::WithStatement,
            ModifierFlags::empty(),
            start,
            end,
            NodeData::With(WithData { expression, body }),
        )
    }
}
