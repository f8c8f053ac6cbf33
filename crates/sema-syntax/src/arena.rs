//! Node arena for AST storage.

use crate::node::{
    FunctionData, IdentifierData, ModifierFlags, Node, NodeData, NodeIndex, SyntaxKind,
    VariableData,
};

/// Arena-based storage for AST nodes.
/// Nodes are stored contiguously and referenced by index.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena { nodes: Vec::new() }
    }

    /// Add a node to the arena and return its index.
    ///
    /// Every child listed by the payload gets its parent pointer set to the
    /// new node, so nodes must be added bottom-up.
    pub fn add(
        &mut self,
        kind: SyntaxKind,
        modifiers: ModifierFlags,
        pos: u32,
        end: u32,
        data: NodeData,
    ) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        for child in data.children() {
            if let Some(node) = self.nodes.get_mut(child.0 as usize) {
                node.parent = index;
            }
        }
        self.nodes.push(Node {
            kind,
            modifiers,
            pos,
            end,
            parent: NodeIndex::NONE,
            data,
        });
        index
    }

    /// Get a node by index
    #[inline]
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get(index.0 as usize)
        }
    }

    #[inline]
    pub fn kind(&self, index: NodeIndex) -> Option<SyntaxKind> {
        self.get(index).map(|n| n.kind)
    }

    /// Get the number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeIndex(i as u32), n))
    }

    // =========================================================================
    // Typed accessors
    // =========================================================================

    /// Identifier or string-literal payload.
    pub fn identifier(&self, index: NodeIndex) -> Option<&IdentifierData> {
        match &self.get(index)?.data {
            NodeData::Identifier(data) => Some(data),
            _ => None,
        }
    }

    /// Unescaped text of an identifier or string literal.
    pub fn identifier_text(&self, index: NodeIndex) -> Option<&str> {
        self.identifier(index).map(|d| d.text.as_str())
    }

    pub fn function(&self, index: NodeIndex) -> Option<&FunctionData> {
        match &self.get(index)?.data {
            NodeData::Function(data) => Some(data),
            _ => None,
        }
    }

    pub fn variable(&self, index: NodeIndex) -> Option<&VariableData> {
        match &self.get(index)?.data {
            NodeData::Variable(data) => Some(data),
            _ => None,
        }
    }

    /// Statements of a source file, module body or block.
    pub fn statements(&self, index: NodeIndex) -> &[NodeIndex] {
        match self.get(index).map(|n| &n.data) {
            Some(NodeData::SourceFile(d)) => &d.statements,
            Some(NodeData::Module(d)) => &d.body,
            Some(NodeData::Block { statements }) => statements,
            _ => &[],
        }
    }

    /// The name node of a named declaration, if it has one.
    pub fn name_of(&self, index: NodeIndex) -> NodeIndex {
        match self.get(index).map(|n| &n.data) {
            Some(NodeData::Class(d)) => d.name,
            Some(NodeData::Interface(d)) => d.name,
            Some(NodeData::Enum(d)) => d.name,
            Some(NodeData::EnumMember(d)) => d.name,
            Some(NodeData::Import(d)) => d.name,
            Some(NodeData::Function(d)) => d.name,
            Some(NodeData::Variable(d)) => d.name,
            Some(NodeData::TypeParameter(d)) => d.name,
            Some(NodeData::Module(d)) => d.name.last().copied().unwrap_or(NodeIndex::NONE),
            _ => NodeIndex::NONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_sets_parent_pointers() {
        let mut arena = NodeArena::new();
        let name = arena.add(
            SyntaxKind::Identifier,
            ModifierFlags::empty(),
            6,
            7,
            NodeData::Identifier(IdentifierData {
                text: "C".into(),
                raw: "C".into(),
            }),
        );
        let class = arena.add(
            SyntaxKind::ClassDeclaration,
            ModifierFlags::EXPORT,
            0,
            10,
            NodeData::Class(crate::node::ClassData {
                name,
                type_parameters: Vec::new(),
                extends: Vec::new(),
                implements: Vec::new(),
                members: Vec::new(),
            }),
        );
        assert_eq!(arena.get(name).map(|n| n.parent), Some(class));
        assert_eq!(arena.name_of(class), name);
        assert_eq!(arena.identifier_text(name), Some("C"));
        assert!(arena.get(NodeIndex::NONE).is_none());
    }
}
