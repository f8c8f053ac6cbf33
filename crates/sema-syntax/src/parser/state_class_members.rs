//! Parser state - class declarations and class members

use super::ParserState;
use crate::node::{
    ClassData, FunctionData, ModifierFlags, NodeData, NodeIndex, NodeList, SyntaxKind, VariableData,
};
use crate::scanner::TokenKind;

impl ParserState {
    pub(crate) fn parse_class_declaration(&mut self, modifiers: ModifierFlags, start: u32) -> NodeIndex {
        self.next_token(); // class
        let name = self.parse_identifier();
        let type_parameters = self.parse_type_parameters();
        let mut extends = Vec::new();
        let mut implements = Vec::new();
        if self.parse_optional_keyword("extends") {
            let base = self.parse_type_reference();
            if base.is_some() {
                extends.push(base);
            }
        }
        if self.parse_optional_keyword("implements") {
            implements = self.parse_heritage_list();
        }
        let members = self.parse_class_members();
        let end = self.last_end();
        self.arena.add(
            SyntaxKind::ClassDeclaration,
            modifiers,
            start,
            end,
            NodeData::Class(ClassData {
                name,
                type_parameters,
                extends,
                implements,
                members,
            }),
        )
    }

    fn parse_class_members(&mut self) -> NodeList {
        let mut members = Vec::new();
        if !self.parse_expected("{") {
            return members;
        }
        while !self.is_eof() && !self.is_punct("}") {
            if self.parse_optional(";") {
                continue;
            }
            let before = self.current;
            let member = self.parse_class_member();
            if member.is_some() {
                members.push(member);
            }
            if self.current == before {
                self.next_token();
            }
        }
        self.parse_expected("}");
        members
    }

    /// Next token can follow a modifier keyword used as a modifier (rather than
    /// as a member name).
    fn next_is_member_name(&self) -> bool {
        let next = self.peek(1);
        matches!(next.kind, TokenKind::Identifier | TokenKind::StringLiteral | TokenKind::NumericLiteral)
            || next.is_punct("[")
    }

    fn parse_class_member(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let mut modifiers = ModifierFlags::empty();
        loop {
            if self.is_keyword("public") && self.next_is_member_name() {
                modifiers |= ModifierFlags::PUBLIC;
            } else if self.is_keyword("private") && self.next_is_member_name() {
                modifiers |= ModifierFlags::PRIVATE;
            } else if self.is_keyword("static") && self.next_is_member_name() {
                modifiers |= ModifierFlags::STATIC;
            } else {
                break;
            }
            self.next_token();
        }

        if self.is_keyword("constructor") && self.peek(1).is_punct("(") {
            self.next_token();
            return self.parse_method_like(SyntaxKind::ConstructorDeclaration, modifiers, start, NodeIndex::NONE);
        }
        if (self.is_keyword("get") || self.is_keyword("set")) && self.next_is_member_name() {
            let kind = if self.is_keyword("get") {
                SyntaxKind::GetAccessor
            } else {
                SyntaxKind::SetAccessor
            };
            self.next_token();
            let name = self.parse_property_name();
            return self.parse_method_like(kind, modifiers, start, name);
        }
        if self.is_punct("[") {
            let signature = self.parse_index_signature(modifiers, start);
            self.parse_semicolon();
            return signature;
        }

        let name = self.parse_property_name();
        if name.is_none() {
            return NodeIndex::NONE;
        }
        if self.parse_optional("?") {
            modifiers |= ModifierFlags::OPTIONAL;
        }
        if self.is_punct("(") || self.is_punct("<") {
            return self.parse_method_like(SyntaxKind::MethodDeclaration, modifiers, start, name);
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
        self.parse_semicolon();
        let end = self.last_end();
        self.arena.add(
            SyntaxKind::PropertyDeclaration,
            modifiers,
            start,
            end,
            NodeData::Variable(VariableData {
                name,
                type_annotation,
                initializer,
            }),
        )
    }

    fn parse_method_like(
        &mut self,
        kind: SyntaxKind,
        modifiers: ModifierFlags,
        start: u32,
        name: NodeIndex,
    ) -> NodeIndex {
        let (type_parameters, parameters, return_type) = self.parse_signature_parts(":");
        let body = self.parse_function_body();
        let end = self.last_end();
        self.arena.add(
            kind,
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
}
