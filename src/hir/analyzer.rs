//! Semantic analysis: scopes, symbols and references for one syntax tree.
//!
//! A single depth-first walk in source order. Declarations bind their name in
//! the current scope before their children are visited; every other
//! `Identifier` is a use site resolved against the scope chain as it exists
//! at that moment. A name declared later in the walk is therefore not yet
//! visible, and a use site that does not resolve is dropped without a
//! diagnostic.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::config::AnalyzerConfig;
use crate::syntax::{Ast, AstNode, NodeId, NodeKind};
use super::ids::{ReferenceId, ScopeId, SymbolId};
use super::model::SemanticModel;
use super::scope::{ScopeKind, ScopeTree};
use super::symbols::{Reference, ReferenceKind, Symbol, SymbolKind};

/// Builds a [`SemanticModel`] from a parsed file.
#[derive(Clone, Debug, Default)]
pub struct SemanticAnalyzer {
    config: AnalyzerConfig,
}

impl SemanticAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze `ast`. Never fails.
    pub fn analyze(&self, ast: &Ast, source_file: &str) -> SemanticModel {
        let root = ast.root();
        let mut walker = Walker {
            config: self.config,
            ast,
            source_file: SmolStr::new(source_file),
            scopes: ScopeTree::new(root.range),
            symbols: IndexMap::new(),
            references: IndexMap::new(),
        };

        let module = walker.scopes.alloc(ScopeKind::Module, ScopeId::GLOBAL, root.range);
        walker.visit_children(root, module);

        let model = SemanticModel::new(
            walker.source_file,
            SmolStr::new(ast.language()),
            walker.symbols,
            walker.references,
            walker.scopes,
        );
        tracing::debug!(
            file = source_file,
            symbols = model.symbol_count(),
            references = model.reference_count(),
            scopes = model.scopes().len(),
            "analyzed"
        );
        model
    }
}

struct Walker<'a> {
    config: AnalyzerConfig,
    ast: &'a Ast,
    source_file: SmolStr,
    scopes: ScopeTree,
    symbols: IndexMap<SymbolId, Symbol>,
    references: IndexMap<SymbolId, Vec<Reference>>,
}

impl<'a> Walker<'a> {
    fn visit(&mut self, node: &'a AstNode, scope: ScopeId) {
        match node.kind {
            NodeKind::FunctionDeclaration => self.visit_function_declaration(node, scope),
            NodeKind::FunctionExpression => {
                let inner = self.scopes.alloc(ScopeKind::Function, scope, node.range);
                if let Some(name) = self.ast.declared_name(node.id) {
                    let signature = self.function_signature(node);
                    self.declare(name, node, SymbolKind::Function, inner, signature);
                }
                self.visit_function_parts(node, inner);
            }
            NodeKind::ArrowFunction | NodeKind::Constructor => {
                let inner = self.scopes.alloc(ScopeKind::Function, scope, node.range);
                self.visit_function_parts(node, inner);
            }
            NodeKind::ClassDeclaration | NodeKind::ClassExpression => self.visit_class(node, scope),
            NodeKind::InterfaceDeclaration => {
                if let Some(name) = self.ast.declared_name(node.id) {
                    self.declare(name, node, SymbolKind::Interface, scope, None);
                }
                self.visit_type_positions(node, scope);
            }
            NodeKind::TypeAlias => {
                if let Some(name) = self.ast.declared_name(node.id) {
                    let body = children_of(self.ast, node.id, NodeKind::TypeAnnotation)
                        .last()
                        .map(|ann| ann.text.to_string());
                    self.declare(name, node, SymbolKind::Type, scope, body);
                }
                self.visit_type_positions(node, scope);
            }
            NodeKind::EnumDeclaration => {
                if let Some(name) = self.ast.declared_name(node.id) {
                    self.declare(name, node, SymbolKind::Enum, scope, None);
                }
                for member in children_of(self.ast, node.id, NodeKind::EnumMember) {
                    for init in self.ast.children(member.id).skip(1) {
                        self.visit(init, scope);
                    }
                }
            }
            NodeKind::VariableDeclaration => self.visit_variable_declaration(node, scope),
            NodeKind::NamespaceDeclaration | NodeKind::ModuleDeclaration => {
                self.visit_namespace(node, scope)
            }
            NodeKind::ImportDeclaration => self.visit_import(node, scope),
            NodeKind::ExportSpecifier => {
                if let Some(local) = self.ast.children(node.id).next() {
                    if local.kind == NodeKind::Identifier {
                        let kind = self.classified(ReferenceKind::Export);
                        self.resolve(local, scope, kind);
                    }
                }
            }
            NodeKind::Block => {
                let inner = self.scopes.alloc(ScopeKind::Block, scope, node.range);
                self.visit_children(node, inner);
            }
            NodeKind::ForStatement | NodeKind::ForInStatement | NodeKind::ForOfStatement => {
                let inner = self.scopes.alloc(ScopeKind::For, scope, node.range);
                self.visit_children(node, inner);
            }
            NodeKind::SwitchStatement => {
                let mut children = self.ast.children(node.id);
                if let Some(discriminant) = children.next() {
                    self.visit(discriminant, scope);
                }
                let cases = self.scopes.alloc(ScopeKind::Block, scope, node.range);
                for case in children {
                    self.visit_children(case, cases);
                }
            }
            NodeKind::CatchClause => self.visit_catch(node, scope),
            NodeKind::TypeAnnotation => self.visit_type(node, scope),
            NodeKind::Identifier => self.resolve(node, scope, ReferenceKind::Read),
            NodeKind::CallExpression | NodeKind::NewExpression if self.config.classify_references => {
                self.visit_with_target(node, scope, ReferenceKind::Call)
            }
            NodeKind::AssignmentExpression | NodeKind::UpdateExpression
                if self.config.classify_references =>
            {
                self.visit_with_target(node, scope, ReferenceKind::Write)
            }
            NodeKind::PropertyName
            | NodeKind::StringLiteral
            | NodeKind::NumberLiteral
            | NodeKind::BooleanLiteral
            | NodeKind::NullLiteral
            | NodeKind::ThisExpression
            | NodeKind::SuperExpression => {}
            _ => self.visit_children(node, scope),
        }
    }

    fn visit_children(&mut self, node: &'a AstNode, scope: ScopeId) {
        for child in self.ast.children(node.id) {
            self.visit(child, scope);
        }
    }

    /// Resolve the first child as `kind` when it is a bare name, then visit
    /// the rest normally.
    fn visit_with_target(&mut self, node: &'a AstNode, scope: ScopeId, kind: ReferenceKind) {
        let mut children = self.ast.children(node.id);
        if let Some(target) = children.next() {
            if target.kind == NodeKind::Identifier {
                self.resolve(target, scope, kind);
            } else {
                self.visit(target, scope);
            }
        }
        for child in children {
            self.visit(child, scope);
        }
    }

    fn classified(&self, kind: ReferenceKind) -> ReferenceKind {
        if self.config.classify_references {
            kind
        } else {
            ReferenceKind::Read
        }
    }

    // ── Declarations ─────────────────────────────────────────────────────

    fn visit_function_declaration(&mut self, node: &'a AstNode, scope: ScopeId) {
        if let Some(name) = self.ast.declared_name(node.id) {
            let signature = self.function_signature(node);
            self.declare(name, node, SymbolKind::Function, scope, signature);
        }
        let inner = self.scopes.alloc(ScopeKind::Function, scope, node.range);
        self.visit_function_parts(node, inner);
    }

    /// Type parameters, parameters, return type and body of a function-like
    /// node, all in the function's own scope. A block body shares it.
    fn visit_function_parts(&mut self, node: &'a AstNode, inner: ScopeId) {
        let name = match node.kind {
            NodeKind::ArrowFunction | NodeKind::Constructor => None,
            _ => self.ast.declared_name(node.id).map(|n| n.id),
        };
        for child in self.ast.children(node.id) {
            if Some(child.id) == name {
                continue;
            }
            match child.kind {
                NodeKind::Parameter => self.visit_parameter(child, inner),
                NodeKind::TypeParameter => self.visit_type_positions(child, inner),
                NodeKind::Block => self.visit_children(child, inner),
                _ => self.visit(child, inner),
            }
        }
    }

    fn visit_parameter(&mut self, param: &'a AstNode, scope: ScopeId) {
        let mut children = self.ast.children(param.id);
        let signature = children_of(self.ast, param.id, NodeKind::TypeAnnotation)
            .next()
            .map(|ann| ann.text.to_string());
        if let Some(target) = children.next() {
            if target.kind == NodeKind::TypeAnnotation {
                // `this: T` parameter
                self.visit_type(target, scope);
            } else {
                self.declare_pattern(target, param, SymbolKind::Parameter, scope, signature);
            }
        }
        for child in children {
            self.visit(child, scope);
        }
    }

    fn visit_variable_declaration(&mut self, node: &'a AstNode, scope: ScopeId) {
        let kind = if node.text == "const" {
            SymbolKind::Constant
        } else {
            SymbolKind::Variable
        };
        for declarator in children_of(self.ast, node.id, NodeKind::VariableDeclarator) {
            let mut children = self.ast.children(declarator.id);
            let Some(target) = children.next() else {
                continue;
            };
            let signature = self.value_signature(declarator);
            self.declare_pattern(target, declarator, kind, scope, signature);
            for child in children {
                self.visit(child, scope);
            }
        }
    }

    /// Bind every name in a binding target. Default values and computed keys
    /// are visited as expressions.
    fn declare_pattern(
        &mut self,
        target: &'a AstNode,
        decl: &'a AstNode,
        kind: SymbolKind,
        scope: ScopeId,
        signature: Option<String>,
    ) {
        match target.kind {
            NodeKind::Identifier => {
                self.declare(target, decl, kind, scope, signature);
            }
            NodeKind::ObjectPattern | NodeKind::ArrayPattern => {
                for element in self.ast.children(target.id) {
                    self.declare_pattern(element, decl, kind, scope, None);
                }
            }
            NodeKind::Property => {
                for part in self.ast.children(target.id) {
                    match part.kind {
                        NodeKind::PropertyName => {}
                        NodeKind::ComputedPropertyName => self.visit_children(part, scope),
                        _ => self.declare_pattern(part, decl, kind, scope, None),
                    }
                }
            }
            NodeKind::AssignmentPattern => {
                let mut parts = self.ast.children(target.id);
                if let Some(inner) = parts.next() {
                    self.declare_pattern(inner, decl, kind, scope, signature);
                }
                for default in parts {
                    self.visit(default, scope);
                }
            }
            NodeKind::RestElement => {
                if let Some(inner) = self.ast.children(target.id).next() {
                    self.declare_pattern(inner, decl, kind, scope, signature);
                }
            }
            _ => self.visit(target, scope),
        }
    }

    fn visit_class(&mut self, node: &'a AstNode, scope: ScopeId) {
        let name = self
            .ast
            .declared_name(node.id)
            .filter(|n| n.kind == NodeKind::Identifier);
        let class_scope = if node.kind == NodeKind::ClassDeclaration {
            if let Some(name) = name {
                self.declare(name, node, SymbolKind::Class, scope, None);
            }
            self.scopes.alloc(ScopeKind::Class, scope, node.range)
        } else {
            let inner = self.scopes.alloc(ScopeKind::Class, scope, node.range);
            if let Some(name) = name {
                self.declare(name, node, SymbolKind::Class, inner, None);
            }
            inner
        };

        for member in self.ast.children(node.id) {
            match member.kind {
                NodeKind::Identifier => {}
                NodeKind::TypeParameter => self.visit_type_positions(member, class_scope),
                NodeKind::MethodDeclaration => {
                    if let Some(name) = self.member_name(member) {
                        let signature = self.function_signature(member);
                        self.declare(name, member, SymbolKind::Method, class_scope, signature);
                    }
                    let inner = self.scopes.alloc(ScopeKind::Function, class_scope, member.range);
                    self.visit_function_parts(member, inner);
                }
                NodeKind::PropertyDeclaration => {
                    if let Some(name) = self.member_name(member) {
                        let signature = self.value_signature(member);
                        self.declare(name, member, SymbolKind::Property, class_scope, signature);
                    }
                    for part in self.ast.children(member.id) {
                        if part.kind != NodeKind::PropertyName {
                            self.visit(part, class_scope);
                        }
                    }
                }
                _ => self.visit(member, class_scope),
            }
        }
    }

    /// Name of a class member, unless it is computed.
    fn member_name(&self, member: &'a AstNode) -> Option<&'a AstNode> {
        self.ast
            .declared_name(member.id)
            .filter(|n| n.kind == NodeKind::PropertyName)
    }

    fn visit_namespace(&mut self, node: &'a AstNode, scope: ScopeId) {
        if let Some(name) = self
            .ast
            .declared_name(node.id)
            .filter(|n| n.kind == NodeKind::Identifier)
        {
            let kind = if node.kind == NodeKind::NamespaceDeclaration {
                SymbolKind::Namespace
            } else {
                SymbolKind::Module
            };
            self.declare(name, node, kind, scope, None);
        }

        let inner = self.scopes.alloc(ScopeKind::Module, scope, node.range);
        for child in self.ast.children(node.id) {
            match child.kind {
                NodeKind::Identifier | NodeKind::StringLiteral => {}
                NodeKind::Block => self.visit_children(child, inner),
                _ => self.visit(child, inner),
            }
        }
    }

    fn visit_import(&mut self, node: &'a AstNode, scope: ScopeId) {
        for child in self.ast.children(node.id) {
            match child.kind {
                NodeKind::ImportSpecifier => {
                    let local = self
                        .ast
                        .children(child.id)
                        .filter(|c| c.kind == NodeKind::Identifier)
                        .last();
                    if let Some(local) = local {
                        self.declare(local, child, SymbolKind::Import, scope, None);
                    }
                }
                NodeKind::StringLiteral => {}
                // `import x = A.B`
                _ => match leftmost_identifier(self.ast, child) {
                    Some(head) => {
                        let kind = self.classified(ReferenceKind::Import);
                        self.resolve(head, scope, kind);
                        self.visit_arguments_of(child, head, scope);
                    }
                    None => self.visit(child, scope),
                },
            }
        }
    }

    /// Visit everything under `node` except the already resolved `head`.
    fn visit_arguments_of(&mut self, node: &'a AstNode, head: &'a AstNode, scope: ScopeId) {
        if node.id == head.id {
            return;
        }
        for child in self.ast.children(node.id) {
            if child.id == head.id {
                continue;
            }
            if self.ast.ancestors(head.id).any(|a| a.id == child.id) {
                self.visit_arguments_of(child, head, scope);
            } else {
                self.visit(child, scope);
            }
        }
    }

    fn visit_catch(&mut self, node: &'a AstNode, scope: ScopeId) {
        let inner = self.scopes.alloc(ScopeKind::Catch, scope, node.range);
        for child in self.ast.children(node.id) {
            match child.kind {
                NodeKind::Identifier | NodeKind::ObjectPattern | NodeKind::ArrayPattern => {
                    self.declare_pattern(child, node, SymbolKind::Parameter, inner, None);
                }
                NodeKind::Block => self.visit_children(child, inner),
                _ => self.visit(child, inner),
            }
        }
    }

    // ── Types ────────────────────────────────────────────────────────────

    /// Every identifier under an annotation names a type (or, after
    /// `typeof`, a value).
    fn visit_type(&mut self, node: &'a AstNode, scope: ScopeId) {
        for child in self.ast.children(node.id) {
            if child.kind == NodeKind::Identifier {
                self.resolve(child, scope, ReferenceKind::Read);
            } else {
                self.visit_type(child, scope);
            }
        }
    }

    /// Visit only the annotations below `node`; member and parameter names
    /// of interfaces and aliases are not bindings.
    fn visit_type_positions(&mut self, node: &'a AstNode, scope: ScopeId) {
        for child in self.ast.children(node.id) {
            match child.kind {
                NodeKind::TypeAnnotation => self.visit_type(child, scope),
                NodeKind::Identifier | NodeKind::PropertyName => {}
                _ => self.visit_type_positions(child, scope),
            }
        }
    }

    // ── Symbols and references ───────────────────────────────────────────

    /// Create a symbol for `name` declared by `decl` and bind it in `scope`.
    fn declare(
        &mut self,
        name: &'a AstNode,
        decl: &'a AstNode,
        kind: SymbolKind,
        scope: ScopeId,
        type_signature: Option<String>,
    ) -> SymbolId {
        let root = self.declaration_root(decl);
        let export = self
            .ast
            .parent(root.id)
            .filter(|p| p.kind == NodeKind::ExportDeclaration);
        let documentation = if self.config.collect_documentation {
            self.documentation(export.unwrap_or(root))
        } else {
            None
        };

        let id = SymbolId::new();
        let symbol = Symbol {
            id,
            name: name.text.clone(),
            kind,
            range: name.range,
            full_range: decl.range,
            scope,
            type_signature,
            documentation,
            exported: export.is_some(),
            imported: kind == SymbolKind::Import,
            source_file: self.source_file.clone(),
        };
        let shadowed = match kind {
            SymbolKind::Method | SymbolKind::Property => {
                self.scopes.insert_member(scope, name.text.clone(), id)
            }
            _ => self.scopes.insert(scope, name.text.clone(), id),
        };
        if let Some(shadowed) = shadowed {
            tracing::trace!(name = %name.text, ?shadowed, "redeclared in the same scope");
        }
        self.symbols.insert(id, symbol);
        id
    }

    /// The statement-level node a binding belongs to: the variable statement
    /// for declarators, the node itself otherwise.
    fn declaration_root(&self, decl: &'a AstNode) -> &'a AstNode {
        if decl.kind == NodeKind::VariableDeclarator {
            if let Some(parent) = self.ast.parent(decl.id) {
                return parent;
            }
        }
        decl
    }

    fn resolve(&mut self, ident: &'a AstNode, scope: ScopeId, kind: ReferenceKind) {
        let Some(symbol_id) = self.scopes.lookup(scope, &ident.text) else {
            tracing::trace!(name = %ident.text, at = %ident.range.start, "unresolved identifier");
            return;
        };
        let reference = Reference {
            id: ReferenceId::new(),
            symbol_id,
            range: ident.range,
            kind,
            source_file: self.source_file.clone(),
        };
        self.references.entry(symbol_id).or_default().push(reference);
    }

    // ── Signatures and documentation ─────────────────────────────────────

    /// `(a: number, b?: string): boolean` for a function-like node.
    fn function_signature(&self, node: &'a AstNode) -> Option<String> {
        let params: Vec<String> = children_of(self.ast, node.id, NodeKind::Parameter)
            .map(|p| self.parameter_text(p))
            .collect();
        let ret = children_of(self.ast, node.id, NodeKind::TypeAnnotation)
            .next()
            .map(|ann| format!(": {}", ann.text))
            .unwrap_or_default();
        Some(format!("({}){}", params.join(", "), ret))
    }

    fn parameter_text(&self, param: &'a AstNode) -> String {
        if let Some(text) = self.ast.source_text(param.id) {
            return collapse_whitespace(text);
        }
        match children_of(self.ast, param.id, NodeKind::TypeAnnotation).next() {
            Some(ann) => format!("{}: {}", param.text, ann.text),
            None => param.text.to_string(),
        }
    }

    /// Annotation of a declarator or property, or the signature of the
    /// function it is initialized with.
    fn value_signature(&self, node: &'a AstNode) -> Option<String> {
        if let Some(ann) = children_of(self.ast, node.id, NodeKind::TypeAnnotation).next() {
            return Some(ann.text.to_string());
        }
        self.ast
            .children(node.id)
            .find(|c| matches!(c.kind, NodeKind::ArrowFunction | NodeKind::FunctionExpression))
            .and_then(|f| self.function_signature(f))
    }

    fn documentation(&self, anchor: &'a AstNode) -> Option<String> {
        let source = self.ast.source()?;
        let offset = u32::from(anchor.range.start.offset) as usize;
        doc_comment(source, offset)
    }
}

fn children_of(ast: &Ast, id: NodeId, kind: NodeKind) -> impl Iterator<Item = &AstNode> {
    ast.children(id).filter(move |c| c.kind == kind)
}

/// First identifier of a member chain such as `A.B.C`.
fn leftmost_identifier<'a>(ast: &'a Ast, node: &'a AstNode) -> Option<&'a AstNode> {
    match node.kind {
        NodeKind::Identifier => Some(node),
        NodeKind::MemberExpression | NodeKind::CallExpression | NodeKind::IndexExpression => {
            let head = ast.children(node.id).next()?;
            leftmost_identifier(ast, head)
        }
        _ => None,
    }
}

/// The `/** ... */` block ending right before `offset`, with comment
/// decoration stripped.
fn doc_comment(source: &str, offset: usize) -> Option<String> {
    let before = source.get(..offset)?.trim_end();
    let body = before.strip_suffix("*/")?;
    let start = body.rfind("/**")?;
    let body = &body[start + 3..];
    if body.contains("*/") {
        return None;
    }

    let text = body
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').map_or(line, str::trim_start)
        })
        .collect::<Vec<_>>()
        .join("\n");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
