//! Arena-allocated abstract syntax tree.
//!
//! All nodes of one parse live in a single `Vec` owned by [`Ast`]. Children
//! and the parent back-link are plain [`NodeId`] indices, so the tree is
//! owned top-down without reference counting.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::base::Range;

/// Index of a node inside its [`Ast`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

impl NodeId {
    /// Get the raw index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Node kinds of the surface grammar.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    Program,

    // Modules
    ImportDeclaration,
    ImportSpecifier,
    ExportDeclaration,
    ExportSpecifier,

    // Declarations
    FunctionDeclaration,
    ClassDeclaration,
    InterfaceDeclaration,
    TypeAlias,
    EnumDeclaration,
    EnumMember,
    VariableDeclaration,
    VariableDeclarator,
    NamespaceDeclaration,
    ModuleDeclaration,
    Parameter,
    TypeParameter,
    MethodDeclaration,
    Constructor,
    PropertyDeclaration,
    PropertySignature,
    MethodSignature,
    HeritageClause,
    TypeAnnotation,

    // Binding patterns
    ObjectPattern,
    ArrayPattern,
    AssignmentPattern,
    RestElement,

    // Statements
    Block,
    ExpressionStatement,
    ReturnStatement,
    IfStatement,
    ForStatement,
    ForInStatement,
    ForOfStatement,
    WhileStatement,
    DoWhileStatement,
    SwitchStatement,
    CaseClause,
    TryStatement,
    CatchClause,
    ThrowStatement,
    BreakStatement,
    ContinueStatement,
    EmptyStatement,

    // Expressions
    AssignmentExpression,
    SequenceExpression,
    ConditionalExpression,
    BinaryExpression,
    UnaryExpression,
    UpdateExpression,
    CallExpression,
    NewExpression,
    MemberExpression,
    IndexExpression,
    ArrowFunction,
    FunctionExpression,
    ClassExpression,
    ObjectLiteral,
    Property,
    ComputedPropertyName,
    ArrayLiteral,
    SpreadElement,
    AsExpression,
    NonNullExpression,
    ParenthesizedExpression,
    ThisExpression,
    SuperExpression,

    // Leaves
    Identifier,
    PropertyName,
    StringLiteral,
    NumberLiteral,
    BooleanLiteral,
    NullLiteral,
}

impl NodeKind {
    /// Nodes whose body introduces a function scope.
    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            NodeKind::FunctionDeclaration
                | NodeKind::FunctionExpression
                | NodeKind::ArrowFunction
                | NodeKind::MethodDeclaration
                | NodeKind::Constructor
        )
    }

    /// Nodes whose first `Identifier` child is the declared name.
    pub fn is_declaration(self) -> bool {
        matches!(
            self,
            NodeKind::FunctionDeclaration
                | NodeKind::ClassDeclaration
                | NodeKind::InterfaceDeclaration
                | NodeKind::TypeAlias
                | NodeKind::EnumDeclaration
                | NodeKind::NamespaceDeclaration
                | NodeKind::ModuleDeclaration
                | NodeKind::MethodDeclaration
                | NodeKind::PropertyDeclaration
        )
    }
}

/// A single syntax node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AstNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub range: Range,
    /// Name, literal value or operator, depending on `kind`.
    pub text: SmolStr,
    /// `None` only for the root.
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A parsed file.
#[derive(Clone, Debug)]
pub struct Ast {
    nodes: Vec<AstNode>,
    root: NodeId,
    source_file: SmolStr,
    language: SmolStr,
    source: Option<Arc<str>>,
}

impl Ast {
    pub(crate) fn new(
        nodes: Vec<AstNode>,
        root: NodeId,
        source_file: &str,
        language: &str,
    ) -> Self {
        Self {
            nodes,
            root,
            source_file: SmolStr::new(source_file),
            language: SmolStr::new(language),
            source: None,
        }
    }

    /// Attach the source text the tokens were produced from.
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The `Program` node.
    pub fn root(&self) -> &AstNode {
        &self.nodes[self.root.index()]
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&AstNode> {
        self.nodes.get(id.index())
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    /// Child nodes in source order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &AstNode> + '_ {
        self.node(id).children.iter().map(|&c| self.node(c))
    }

    pub fn parent(&self, id: NodeId) -> Option<&AstNode> {
        self.node(id).parent.map(|p| self.node(p))
    }

    /// Parent chain, nearest first. Does not include `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = &AstNode> + '_ {
        std::iter::successors(self.parent(id), |n| self.parent(n.id))
    }

    /// All nodes in allocation order.
    pub fn nodes(&self) -> impl Iterator<Item = &AstNode> + '_ {
        self.nodes.iter()
    }

    /// Pre-order walk starting at the root.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        order
    }

    /// The declared-name child of a declaration node, if it has one.
    ///
    /// Bindings are named by an `Identifier`; class and interface members by
    /// a `PropertyName`.
    pub fn declared_name(&self, id: NodeId) -> Option<&AstNode> {
        self.node(id)
            .children
            .first()
            .map(|&c| self.node(c))
            .filter(|c| matches!(c.kind, NodeKind::Identifier | NodeKind::PropertyName))
    }

    /// Source text covered by a node, when the source was attached.
    pub fn source_text(&self, id: NodeId) -> Option<&str> {
        let source = self.source.as_deref()?;
        let range = self.node(id).range.text_range();
        source.get(std::ops::Range::<usize>::from(range))
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
