//! AST node model.
//!
//! Nodes live in a [`NodeArena`](crate::NodeArena) and are addressed by
//! [`NodeIndex`]. Each node carries a fixed header (kind, modifiers, span,
//! parent) plus a kind-specific [`NodeData`] payload. The tree is immutable once
//! the parser hands it over; consumers only read it.

use bitflags::bitflags;
use sema_common::Span;
use serde::Serialize;

/// Index of a node inside its arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Default for NodeIndex {
    fn default() -> Self {
        NodeIndex::NONE
    }
}

/// Ordered list of child nodes.
pub type NodeList = Vec<NodeIndex>;

/// Node kinds of the declaration-level AST.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SyntaxKind {
    SourceFile,
    ModuleDeclaration,
    ClassDeclaration,
    InterfaceDeclaration,
    EnumDeclaration,
    EnumMember,
    ImportDeclaration,
    ExportAssignment,
    FunctionDeclaration,
    FunctionExpression,
    MethodDeclaration,
    ConstructorDeclaration,
    GetAccessor,
    SetAccessor,
    PropertyDeclaration,
    VariableStatement,
    VariableDeclaration,
    PropertySignature,
    MethodSignature,
    CallSignature,
    ConstructSignature,
    IndexSignature,
    Parameter,
    TypeParameter,
    Identifier,
    StringLiteral,
    PredefinedType,
    TypeReference,
    ArrayType,
    ObjectType,
    FunctionType,
    ConstructorType,
    Block,
    TryStatement,
    CatchClause,
    WithStatement,
    ExpressionStatement,
    ReturnStatement,
    Expression,
}

impl SyntaxKind {
    /// Kinds whose payload is [`NodeData::Function`].
    pub const fn is_function_like(self) -> bool {
        matches!(
            self,
            SyntaxKind::FunctionDeclaration
                | SyntaxKind::FunctionExpression
                | SyntaxKind::MethodDeclaration
                | SyntaxKind::ConstructorDeclaration
                | SyntaxKind::GetAccessor
                | SyntaxKind::SetAccessor
                | SyntaxKind::MethodSignature
                | SyntaxKind::CallSignature
                | SyntaxKind::ConstructSignature
                | SyntaxKind::IndexSignature
                | SyntaxKind::FunctionType
                | SyntaxKind::ConstructorType
        )
    }

    /// Kinds that can appear in a type position.
    pub const fn is_type_node(self) -> bool {
        matches!(
            self,
            SyntaxKind::PredefinedType
                | SyntaxKind::TypeReference
                | SyntaxKind::ArrayType
                | SyntaxKind::ObjectType
                | SyntaxKind::FunctionType
                | SyntaxKind::ConstructorType
        )
    }
}

bitflags! {
    /// Source modifiers attached to a declaration node.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ModifierFlags: u16 {
        const EXPORT = 1 << 0;
        const DECLARE = 1 << 1;
        const STATIC = 1 << 2;
        const PUBLIC = 1 << 3;
        const PRIVATE = 1 << 4;
        /// `?` on a property, method or parameter.
        const OPTIONAL = 1 << 5;
        /// `...` on a parameter.
        const REST = 1 << 6;
    }
}

/// A single AST node.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: SyntaxKind,
    pub modifiers: ModifierFlags,
    pub pos: u32,
    pub end: u32,
    pub parent: NodeIndex,
    pub data: NodeData,
}

impl Node {
    #[inline]
    pub fn span(&self) -> Span {
        Span::new(self.pos, self.end)
    }

    #[inline]
    pub fn has_modifier(&self, flag: ModifierFlags) -> bool {
        self.modifiers.contains(flag)
    }
}

/// Identifier or string literal text.
///
/// `text` is the unescaped value used for lookup; `raw` is the spelling found
/// in source (with quotes for string literals, with escapes for escaped
/// identifiers).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentifierData {
    pub text: String,
    pub raw: String,
}

#[derive(Clone, Debug)]
pub struct SourceFileData {
    pub file_name: String,
    pub statements: NodeList,
    pub is_declaration_file: bool,
    pub is_external_module: bool,
}

/// `module A.B.C { }` or `module "m" { }`.
#[derive(Clone, Debug)]
pub struct ModuleData {
    /// One identifier per dotted segment, or a single string literal.
    pub name: NodeList,
    pub body: NodeList,
}

#[derive(Clone, Debug)]
pub struct ClassData {
    pub name: NodeIndex,
    pub type_parameters: NodeList,
    pub extends: NodeList,
    pub implements: NodeList,
    pub members: NodeList,
}

#[derive(Clone, Debug)]
pub struct InterfaceData {
    pub name: NodeIndex,
    pub type_parameters: NodeList,
    pub extends: NodeList,
    pub members: NodeList,
}

#[derive(Clone, Debug)]
pub struct EnumData {
    pub name: NodeIndex,
    pub members: NodeList,
}

#[derive(Clone, Debug)]
pub struct EnumMemberData {
    pub name: NodeIndex,
    pub initializer: NodeIndex,
}

/// `import x = require("m")` or `import x = A.B`.
#[derive(Clone, Debug)]
pub struct ImportData {
    pub name: NodeIndex,
    /// A single string literal for `require`, else one identifier per segment.
    pub reference: NodeList,
    pub is_external: bool,
}

#[derive(Clone, Debug)]
pub struct ExportAssignmentData {
    pub name: NodeIndex,
}

/// Payload shared by every function-like node, from declarations down to
/// function types and index signatures.
#[derive(Clone, Debug)]
pub struct FunctionData {
    /// `NONE` for anonymous functions, constructors and signatures.
    pub name: NodeIndex,
    pub type_parameters: NodeList,
    pub parameters: NodeList,
    pub return_type: NodeIndex,
    /// A `Block`, or `NONE` for overloads and signatures.
    pub body: NodeIndex,
}

/// Variable declarators, class properties, interface properties and parameters.
#[derive(Clone, Debug)]
pub struct VariableData {
    pub name: NodeIndex,
    pub type_annotation: NodeIndex,
    pub initializer: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct TypeParameterData {
    pub name: NodeIndex,
    pub constraint: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct TypeReferenceData {
    /// One identifier per dotted segment.
    pub name: NodeList,
    pub type_arguments: NodeList,
}

#[derive(Clone, Debug)]
pub struct TryData {
    pub try_block: NodeIndex,
    pub catch_clause: NodeIndex,
    pub finally_block: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct CatchData {
    pub variable: NodeIndex,
    pub block: NodeIndex,
}

#[derive(Clone, Debug)]
pub struct WithData {
    pub expression: NodeIndex,
    pub body: NodeIndex,
}

/// Kind-specific payload.
#[derive(Clone, Debug)]
pub enum NodeData {
    None,
    Identifier(IdentifierData),
    SourceFile(SourceFileData),
    Module(ModuleData),
    Class(ClassData),
    Interface(InterfaceData),
    Enum(EnumData),
    EnumMember(EnumMemberData),
    Import(ImportData),
    ExportAssignment(ExportAssignmentData),
    Function(FunctionData),
    Variable(VariableData),
    VariableStatement { declarations: NodeList },
    TypeParameter(TypeParameterData),
    /// `any`, `number`, `string`, `boolean`, `void`, `null`, `undefined`.
    PredefinedType { keyword: String },
    TypeReference(TypeReferenceData),
    ArrayType { element: NodeIndex },
    ObjectType { members: NodeList },
    Block { statements: NodeList },
    Try(TryData),
    Catch(CatchData),
    With(WithData),
    /// Expression and return statements wrap one `Expression` node (or `NONE`).
    Statement { expression: NodeIndex },
    /// Opaque expression. Only the function expressions nested inside it are
    /// kept; everything else is skipped by the parser.
    Expression { functions: NodeList },
}

impl NodeData {
    /// Direct children in source order.
    pub fn children(&self) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut push = |idx: NodeIndex| {
            if idx.is_some() {
                out.push(idx);
            }
        };
        match self {
            NodeData::None | NodeData::Identifier(_) | NodeData::PredefinedType { .. } => {}
            NodeData::SourceFile(d) => d.statements.iter().copied().for_each(&mut push),
            NodeData::Module(d) => {
                d.name.iter().copied().for_each(&mut push);
                d.body.iter().copied().for_each(&mut push);
            }
            NodeData::Class(d) => {
                push(d.name);
                d.type_parameters.iter().copied().for_each(&mut push);
                d.extends.iter().copied().for_each(&mut push);
                d.implements.iter().copied().for_each(&mut push);
                d.members.iter().copied().for_each(&mut push);
            }
            NodeData::Interface(d) => {
                push(d.name);
                d.type_parameters.iter().copied().for_each(&mut push);
                d.extends.iter().copied().for_each(&mut push);
                d.members.iter().copied().for_each(&mut push);
            }
            NodeData::Enum(d) => {
                push(d.name);
                d.members.iter().copied().for_each(&mut push);
            }
            NodeData::EnumMember(d) => {
                push(d.name);
                push(d.initializer);
            }
            NodeData::Import(d) => {
                push(d.name);
                d.reference.iter().copied().for_each(&mut push);
            }
            NodeData::ExportAssignment(d) => push(d.name),
            NodeData::Function(d) => {
                push(d.name);
                d.type_parameters.iter().copied().for_each(&mut push);
                d.parameters.iter().copied().for_each(&mut push);
                push(d.return_type);
                push(d.body);
            }
            NodeData::Variable(d) => {
                push(d.name);
                push(d.type_annotation);
                push(d.initializer);
            }
            NodeData::VariableStatement { declarations } => {
                declarations.iter().copied().for_each(&mut push)
            }
            NodeData::TypeParameter(d) => {
                push(d.name);
                push(d.constraint);
            }
            NodeData::TypeReference(d) => {
                d.name.iter().copied().for_each(&mut push);
                d.type_arguments.iter().copied().for_each(&mut push);
            }
            NodeData::ArrayType { element } => push(*element),
            NodeData::ObjectType { members } => members.iter().copied().for_each(&mut push),
            NodeData::Block { statements } => statements.iter().copied().for_each(&mut push),
            NodeData::Try(d) => {
                push(d.try_block);
                push(d.catch_clause);
                push(d.finally_block);
            }
            NodeData::Catch(d) => {
                push(d.variable);
                push(d.block);
            }
            NodeData::With(d) => {
                push(d.expression);
                push(d.body);
            }
            NodeData::Statement { expression } => push(*expression),
            NodeData::Expression { functions } => functions.iter().copied().for_each(&mut push),
        }
        out
    }
}
