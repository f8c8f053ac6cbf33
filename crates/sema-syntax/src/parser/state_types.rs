//! Parser state - types, signatures, parameters and object-type members

use super::ParserState;
use crate::node::{
    FunctionData, ModifierFlags, NodeData, NodeIndex, NodeList, SyntaxKind, TypeParameterData,
    TypeReferenceData, VariableData,
};
use crate::scanner::TokenKind;
use sema_common::diagnostic_codes;

const PREDEFINED_TYPES: &[&str] = &["any", "number", "string", "boolean", "void", "null", "undefined"];

impl ParserState {
    // =========================================================================
    // Type parameters and parameters
    // =========================================================================

    /// `<T, U extends X>` or nothing.
    pub(crate) fn parse_type_parameters(&mut self) -> NodeList {
        let mut type_parameters = Vec::new();
        if !self.parse_optional("<") {
            return type_parameters;
        }
        while !self.is_eof() && !self.is_punct(">") {
            let start = self.token_pos();
            let name = self.parse_identifier();
            if name.is_none() {
                break;
            }
            let constraint = if self.parse_optional_keyword("extends") {
                self.parse_type()
            } else {
                NodeIndex::NONE
            };
            let end = self.last_end();
            type_parameters.push(self.arena.add(
                SyntaxKind::TypeParameter,
                ModifierFlags::empty(),
                start,
                end,
                NodeData::TypeParameter(TypeParameterData { name, constraint }),
            ));
            if !self.parse_optional(",") {
                break;
            }
        }
        self.parse_expected(">");
        type_parameters
    }

    /// Type parameters, a parenthesised parameter list and an optional return
    /// type introduced by `return_separator` (`:` or `=>`).
    pub(crate) fn parse_signature_parts(
        &mut self,
        return_separator: &str,
    ) -> (NodeList, NodeList, NodeIndex) {
        let type_parameters = self.parse_type_parameters();
        let parameters = self.parse_parameter_list("(", ")");
        let return_type = if return_separator == "=>" {
            self.parse_expected("=>");
            self.parse_type()
        } else if self.parse_optional(return_separator) {
            self.parse_type()
        } else {
            NodeIndex::NONE
        };
        (type_parameters, parameters, return_type)
    }

    /// Parameters between `open` and `close` (`(`/`)` or `[`/`]` for index
    /// signatures).
    pub(crate) fn parse_parameter_list(&mut self, open: &str, close: &str) -> NodeList {
        let mut parameters = Vec::new();
        if !self.parse_expected(open) {
            return parameters;
        }
        while !self.is_eof() && !self.is_punct(close) {
            let before = self.current;
            let parameter = self.parse_parameter();
            if parameter.is_some() {
                parameters.push(parameter);
            }
            if !self.parse_optional(",") {
                break;
            }
            if self.current == before {
                break;
            }
        }
        self.parse_expected(close);
        parameters
    }

    fn parse_parameter(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let mut modifiers = ModifierFlags::empty();
        loop {
            let next_is_name = self.peek(1).kind == TokenKind::Identifier;
            if self.is_keyword("public") && next_is_name {
                modifiers |= ModifierFlags::PUBLIC;
            } else if self.is_keyword("private") && next_is_name {
                modifiers |= ModifierFlags::PRIVATE;
            } else {
                break;
            }
            self.next_token();
        }
        if self.parse_optional("...") {
            modifiers |= ModifierFlags::REST;
        }
        let name = self.parse_identifier();
        if name.is_none() {
            return NodeIndex::NONE;
        }
        if self.parse_optional("?") {
            modifiers |= ModifierFlags::OPTIONAL;
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
        self.arena.add(
            SyntaxKind::Parameter,
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

    // =========================================================================
    // Types
    // =========================================================================

    /// Parse a type: a primary type followed by any number of `[]`.
    pub(crate) fn parse_type(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let mut ty = self.parse_primary_type();
        if ty.is_none() {
            return ty;
        }
        while self.is_punct("[") && self.peek(1).is_punct("]") {
            self.next_token();
            self.next_token();
            let end = self.last_end();
            ty = self.arena.add(
                SyntaxKind::ArrayType,
                ModifierFlags::empty(),
                start,
                end,
                NodeData::ArrayType { element: ty },
            );
        }
        ty
    }

    fn parse_primary_type(&mut self) -> NodeIndex {
        let start = self.token_pos();
        if self.is_punct("{") {
            let members = self.parse_object_type_members();
            let end = self.last_end();
            return self.arena.add(
                SyntaxKind::ObjectType,
                ModifierFlags::empty(),
                start,
                end,
                NodeData::ObjectType { members },
            );
        }
        if self.is_punct("(") || self.is_punct("<") {
            return self.parse_function_type(SyntaxKind::FunctionType, start);
        }
        if self.is_keyword("new") && (self.peek(1).is_punct("(") || self.peek(1).is_punct("<")) {
            self.next_token();
            return self.parse_function_type(SyntaxKind::ConstructorType, start);
        }
        if self.is_identifier() {
            let text = self.token().raw.clone();
            if PREDEFINED_TYPES.contains(&text.as_str()) {
                self.next_token();
                let end = self.last_end();
                return self.arena.add(
                    SyntaxKind::PredefinedType,
                    ModifierFlags::empty(),
                    start,
                    end,
                    NodeData::PredefinedType { keyword: text },
                );
            }
            return self.parse_type_reference();
        }
        self.error_at_current(diagnostic_codes::TYPE_EXPECTED, &[]);
        NodeIndex::NONE
    }

    /// `A.B<X, Y>`.
    pub(crate) fn parse_type_reference(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let name = self.parse_entity_name();
        if name.is_empty() {
            return NodeIndex::NONE;
        }
        let mut type_arguments = Vec::new();
        if self.parse_optional("<") {
            while !self.is_eof() && !self.is_punct(">") {
                let argument = self.parse_type();
                if argument.is_none() {
                    break;
                }
                type_arguments.push(argument);
                if !self.parse_optional(",") {
                    break;
                }
            }
            self.parse_expected(">");
        }
        let end = self.last_end();
        self.arena.add(
            SyntaxKind::TypeReference,
            ModifierFlags::empty(),
            start,
            end,
            NodeData::TypeReference(TypeReferenceData {
                name,
                type_arguments,
            }),
        )
    }

    fn parse_function_type(&mut self, kind: SyntaxKind, start: u32) -> NodeIndex {
        let (type_parameters, parameters, return_type) = self.parse_signature_parts("=>");
        let end = self.last_end();
        self.arena.add(
            kind,
            ModifierFlags::empty(),
            start,
            end,
            NodeData::Function(FunctionData {
                name: NodeIndex::NONE,
                type_parameters,
                parameters,
                return_type,
                body: NodeIndex::NONE,
            }),
        )
    }

    // =========================================================================
    // Object type members (interfaces and type literals)
    // =========================================================================

    /// `{ member; member, ... }` for interfaces and object type literals.
    pub(crate) fn parse_object_type_members(&mut self) -> NodeList {
        let mut members = Vec::new();
        if !self.parse_expected("{") {
            return members;
        }
        while !self.is_eof() && !self.is_punct("}") {
            let before = self.current;
            let member = self.parse_type_member();
            if member.is_some() {
                members.push(member);
            }
            if !self.parse_optional(";") && !self.parse_optional(",") && !self.is_punct("}") {
                if !self.token().preceded_by_line_break {
                    self.parse_expected(";");
                }
            }
            if self.current == before {
                self.next_token();
            }
        }
        self.parse_expected("}");
        members
    }

    fn parse_type_member(&mut self) -> NodeIndex {
        let start = self.token_pos();
        if self.is_punct("(") || self.is_punct("<") {
            return self.parse_signature_member(
                SyntaxKind::CallSignature,
                start,
                NodeIndex::NONE,
                ModifierFlags::empty(),
            );
        }
        if self.is_keyword("new") && (self.peek(1).is_punct("(") || self.peek(1).is_punct("<")) {
            self.next_token();
            return self.parse_signature_member(
                SyntaxKind::ConstructSignature,
                start,
                NodeIndex::NONE,
                ModifierFlags::empty(),
            );
        }
        if self.is_punct("[") {
            return self.parse_index_signature(ModifierFlags::empty(), start);
        }

        let name = self.parse_property_name();
        if name.is_none() {
            return NodeIndex::NONE;
        }
        let mut modifiers = ModifierFlags::empty();
        if self.parse_optional("?") {
            modifiers |= ModifierFlags::OPTIONAL;
        }
        if self.is_punct("(") || self.is_punct("<") {
            return self.parse_signature_member(SyntaxKind::MethodSignature, start, name, modifiers);
        }
        let type_annotation = if self.parse_optional(":") {
            self.parse_type()
        } else {
            NodeIndex::NONE
        };
        let end = self.last_end();
        self.arena.add(
            SyntaxKind::PropertySignature,
            modifiers,
            start,
            end,
            NodeData::Variable(VariableData {
                name,
                type_annotation,
                initializer: NodeIndex::NONE,
            }),
        )
    }

    fn parse_signature_member(
        &mut self,
        kind: SyntaxKind,
        start: u32,
        name: NodeIndex,
        modifiers: ModifierFlags,
    ) -> NodeIndex {
        let (type_parameters, parameters, return_type) = self.parse_signature_parts(":");
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
                body: NodeIndex::NONE,
            }),
        )
    }

    /// `[key: string]: T`.
    pub(crate) fn parse_index_signature(&mut self, modifiers: ModifierFlags, start: u32) -> NodeIndex {
        let parameters = self.parse_parameter_list("[", "]");
        let return_type = if self.parse_optional(":") {
            self.parse_type()
        } else {
            NodeIndex::NONE
        };
        let end = self.last_end();
        self.arena.add(
            SyntaxKind::IndexSignature,
            modifiers,
            start,
            end,
            NodeData::Function(FunctionData {
                name: NodeIndex::NONE,
                type_parameters: Vec::new(),
                parameters,
                return_type,
                body: NodeIndex::NONE,
            }),
        )
    }
}
