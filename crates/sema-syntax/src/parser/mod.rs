//! Recursive-descent reader for the declaration subset.
//!
//! The parser understands namespaces and modules, classes, interfaces, enums,
//! functions, variables, imports, export assignments, `try`/`catch`, `with`
//! and type annotations. Expressions are skipped token by token; only function
//! expressions found inside them are parsed, since they introduce declarations.
//!
//! Parsing never fails: unexpected tokens are reported as diagnostics and
//! skipped.

mod state_class_members;
mod state_statements;
mod state_types;

use crate::arena::NodeArena;
use crate::node::{IdentifierData, ModifierFlags, NodeData, NodeIndex, SourceFileData, SyntaxKind};
use crate::scanner::{Scanner, Token, TokenKind};
use sema_common::{Diagnostic, diagnostic_codes};
use tracing::debug;

/// Output of [`parse_source_file`].
#[derive(Debug)]
pub struct ParseResult {
    pub arena: NodeArena,
    pub root: NodeIndex,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse `text` as the source file `file_name`.
///
/// A `.d.ts` file name marks the file as a declaration file. The file is an
/// external module when its top level carries an `export` modifier, an
/// `import x = require(...)` or an `export =`.
#[tracing::instrument(level = "debug", skip(text))]
pub fn parse_source_file(file_name: &str, text: &str) -> ParseResult {
    let mut state = ParserState::new(file_name, text);
    let root = state.parse_source_file();
    debug!(
        nodes = state.arena.len(),
        diagnostics = state.diagnostics.len(),
        "parsed source file"
    );
    ParseResult {
        arena: state.arena,
        root,
        diagnostics: state.diagnostics,
    }
}

/// True when `file_name` names a declaration file.
pub fn is_declaration_file_name(file_name: &str) -> bool {
    file_name.ends_with(".d.ts")
}

pub(crate) struct ParserState {
    pub(crate) file_name: String,
    pub(crate) tokens: Vec<Token>,
    pub(crate) current: usize,
    pub(crate) arena: NodeArena,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl ParserState {
    fn new(file_name: &str, text: &str) -> Self {
        ParserState {
            file_name: file_name.to_string(),
            tokens: Scanner::new(text).scan_all(),
            current: 0,
            arena: NodeArena::new(),
            diagnostics: Vec::new(),
        }
    }

    fn parse_source_file(&mut self) -> NodeIndex {
        let statements = self.parse_statements_until_eof();
        let is_external_module = statements.iter().any(|&s| self.is_external_module_indicator(s));
        let end = self.token().end;
        self.arena.add(
            SyntaxKind::SourceFile,
            ModifierFlags::empty(),
            0,
            end,
            NodeData::SourceFile(SourceFileData {
                file_name: self.file_name.clone(),
                statements,
                is_declaration_file: is_declaration_file_name(&self.file_name),
                is_external_module,
            }),
        )
    }

    fn is_external_module_indicator(&self, statement: NodeIndex) -> bool {
        let Some(node) = self.arena.get(statement) else {
            return false;
        };
        match &node.data {
            NodeData::ExportAssignment(_) => true,
            NodeData::Import(import) => import.is_external,
            _ => node.has_modifier(ModifierFlags::EXPORT),
        }
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    #[inline]
    pub(crate) fn token(&self) -> &Token {
        // `tokens` always ends with EndOfFile and `current` never moves past it.
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    #[inline]
    pub(crate) fn peek(&self, offset: usize) -> &Token {
        &self.tokens[(self.current + offset).min(self.tokens.len() - 1)]
    }

    #[inline]
    pub(crate) fn token_pos(&self) -> u32 {
        self.token().pos
    }

    /// End of the previously consumed token.
    #[inline]
    pub(crate) fn last_end(&self) -> u32 {
        if self.current == 0 {
            0
        } else {
            self.tokens[self.current - 1].end
        }
    }

    #[inline]
    pub(crate) fn is_eof(&self) -> bool {
        self.token().kind == TokenKind::EndOfFile
    }

    pub(crate) fn next_token(&mut self) {
        if !self.is_eof() {
            self.current += 1;
        }
    }

    #[inline]
    pub(crate) fn is_punct(&self, text: &str) -> bool {
        self.token().is_punct(text)
    }

    #[inline]
    pub(crate) fn is_keyword(&self, keyword: &str) -> bool {
        self.token().is_keyword(keyword)
    }

    pub(crate) fn parse_optional(&mut self, punct: &str) -> bool {
        if self.is_punct(punct) {
            self.next_token();
            true
        } else {
            false
        }
    }

    pub(crate) fn parse_optional_keyword(&mut self, keyword: &str) -> bool {
        if self.is_keyword(keyword) {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Consume `punct` or report `'{punct}' expected.` without consuming.
    pub(crate) fn parse_expected(&mut self, punct: &str) -> bool {
        if self.parse_optional(punct) {
            return true;
        }
        self.error_at_current(diagnostic_codes::TOKEN_EXPECTED, &[punct]);
        false
    }

    pub(crate) fn error_at_current(&mut self, code: u32, args: &[&str]) {
        let token = self.token();
        let (start, length) = (token.pos, token.end.saturating_sub(token.pos));
        // One diagnostic per position keeps error recovery from cascading.
        if self
            .diagnostics
            .last()
            .is_some_and(|d| d.start == start && d.file == self.file_name)
        {
            return;
        }
        self.diagnostics
            .push(Diagnostic::from_code(self.file_name.clone(), start, length, code, args));
    }

    /// Optional `;` that may be omitted before `}`, end of file or a line break.
    pub(crate) fn parse_semicolon(&mut self) {
        if self.parse_optional(";") {
            return;
        }
        if self.is_punct("}") || self.is_eof() || self.token().preceded_by_line_break {
            return;
        }
        self.parse_expected(";");
    }

    // =========================================================================
    // Names
    // =========================================================================

    pub(crate) fn is_identifier(&self) -> bool {
        self.token().kind == TokenKind::Identifier
    }

    /// Parse an identifier (keywords are accepted as names). Returns `NONE` and
    /// reports when the current token is not an identifier.
    pub(crate) fn parse_identifier(&mut self) -> NodeIndex {
        if !self.is_identifier() {
            self.error_at_current(diagnostic_codes::IDENTIFIER_EXPECTED, &[]);
            return NodeIndex::NONE;
        }
        let token = self.token().clone();
        self.next_token();
        self.arena.add(
            SyntaxKind::Identifier,
            ModifierFlags::empty(),
            token.pos,
            token.end,
            NodeData::Identifier(IdentifierData {
                text: token.value,
                raw: token.raw,
            }),
        )
    }

    pub(crate) fn parse_string_literal(&mut self) -> NodeIndex {
        if self.token().kind != TokenKind::StringLiteral {
            self.error_at_current(diagnostic_codes::TOKEN_EXPECTED, &["string literal"]);
            return NodeIndex::NONE;
        }
        let token = self.token().clone();
        self.next_token();
        self.arena.add(
            SyntaxKind::StringLiteral,
            ModifierFlags::empty(),
            token.pos,
            token.end,
            NodeData::Identifier(IdentifierData {
                text: token.value,
                raw: token.raw,
            }),
        )
    }

    /// `A.B.C` as a list of identifiers.
    pub(crate) fn parse_entity_name(&mut self) -> Vec<NodeIndex> {
        let mut segments = Vec::new();
        loop {
            let segment = self.parse_identifier();
            if segment.is_none() {
                break;
            }
            segments.push(segment);
            if !self.parse_optional(".") {
                break;
            }
        }
        segments
    }

    /// Property names may be identifiers, string literals or numbers.
    pub(crate) fn parse_property_name(&mut self) -> NodeIndex {
        match self.token().kind {
            TokenKind::StringLiteral => self.parse_string_literal(),
            TokenKind::NumericLiteral => {
                let token = self.token().clone();
                self.next_token();
                self.arena.add(
                    SyntaxKind::Identifier,
                    ModifierFlags::empty(),
                    token.pos,
                    token.end,
                    NodeData::Identifier(IdentifierData {
                        text: token.value,
                        raw: token.raw,
                    }),
                )
            }
            _ => self.parse_identifier(),
        }
    }

    // =========================================================================
    // Expressions (skipped)
    // =========================================================================

    /// Skip an expression, keeping the function expressions found inside it.
    ///
    /// Stops before `;`, `,`, `)`, `]` or `}` at nesting depth zero. Returns
    /// `NONE` when no tokens were consumed.
    pub(crate) fn parse_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let first = self.current;
        let mut functions = Vec::new();
        let mut depth = 0usize;
        while !self.is_eof() {
            if self.is_keyword("function") {
                let function = self.parse_function_expression();
                if function.is_some() {
                    functions.push(function);
                }
                continue;
            }
            let token = self.token();
            if token.kind == TokenKind::Punctuation {
                match token.value.as_str() {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => {
                        if depth == 0 {
                            break;
                        }
                        depth -= 1;
                    }
                    ";" | "," if depth == 0 => break,
                    _ => {}
                }
            }
            self.next_token();
        }
        if self.current == first {
            return NodeIndex::NONE;
        }
        let end = self.last_end();
        self.arena.add(
            SyntaxKind::Expression,
            ModifierFlags::empty(),
            start,
            end,
            NodeData::Expression { functions },
        )
    }
}
