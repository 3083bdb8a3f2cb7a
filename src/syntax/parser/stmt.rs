//! Statements, declarations and binding patterns.

use smol_str::SmolStr;

use super::{ParseResult, Parser, unquote};
use crate::base::Position;
use crate::syntax::ast::{NodeId, NodeKind};
use crate::syntax::lexer::{Token, TokenKind};

/// Words that may prefix a class member.
const MEMBER_MODIFIERS: &[&str] = &[
    "public", "private", "protected", "static", "readonly", "abstract", "override", "declare",
    "accessor", "async", "get", "set",
];

impl Parser<'_> {
    pub(super) fn parse_statement(&mut self) -> ParseResult<NodeId> {
        self.nested(Self::dispatch_statement)
    }

    /// Statement dispatch on the current token.
    fn dispatch_statement(&mut self) -> ParseResult<NodeId> {
        let Some(tok) = self.current() else {
            return Err(self.error("statement"));
        };

        if tok.kind == TokenKind::Keyword {
            match tok.value.as_str() {
                "import" if !self.peek_is(1, "(") && !self.peek_is(1, ".") => {
                    return self.parse_import();
                }
                "export" => return self.parse_export(),
                "function" => return self.parse_function_declaration(false),
                "async" if self.peek_is(1, "function") && !self.line_break_before(1) => {
                    return self.parse_function_declaration(false);
                }
                "class" => return self.parse_class(NodeKind::ClassDeclaration, false),
                "abstract" if self.peek_is(1, "class") => {
                    self.advance();
                    return self.parse_class(NodeKind::ClassDeclaration, false);
                }
                "interface" if self.peek(1).is_some_and(Token::is_binding_name) => {
                    return self.parse_interface();
                }
                "type" if self.peek(1).is_some_and(Token::is_binding_name)
                    && (self.peek_is(2, "=") || self.peek_is(2, "<")) =>
                {
                    return self.parse_type_alias();
                }
                "enum" => return self.parse_enum(),
                "const" if self.peek_is(1, "enum") => {
                    self.advance();
                    return self.parse_enum();
                }
                "const" | "var" => return self.parse_variable_statement(),
                "let" if self.peek(1).is_some_and(|t| {
                    t.is_binding_name() || t.is_symbol("[") || t.is_symbol("{")
                }) =>
                {
                    return self.parse_variable_statement();
                }
                "namespace" if self.peek(1).is_some_and(Token::is_binding_name) => {
                    let start = self.start();
                    self.advance();
                    return self.parse_namespace(start);
                }
                "module" if self.peek(1).is_some_and(|t| {
                    t.is_binding_name() || t.kind == TokenKind::String
                }) && !self.line_break_before(1) =>
                {
                    return self.parse_module_declaration();
                }
                "declare" if self.peek(1).is_some_and(Token::is_word) && !self.line_break_before(1) => {
                    self.advance();
                    if self.at("global") {
                        return self.parse_module_declaration();
                    }
                    return self.parse_statement();
                }
                "return" => return self.parse_return(),
                "if" => return self.parse_if(),
                "for" => return self.parse_for(),
                "while" => return self.parse_while(),
                "do" => return self.parse_do_while(),
                "switch" => return self.parse_switch(),
                "try" => return self.parse_try(),
                "throw" => return self.parse_throw(),
                "break" | "continue" => return self.parse_jump(),
                _ => {}
            }
        }

        if tok.is_symbol("{") {
            return self.parse_block();
        }
        if tok.is_symbol(";") {
            self.advance();
            return Ok(self.leaf(NodeKind::EmptyStatement, tok));
        }
        if tok.is_symbol("@") {
            self.skip_decorators()?;
            return self.parse_statement();
        }
        // labelled statement: the label is not a binding
        if tok.is_binding_name() && self.peek_is(1, ":") {
            self.advance();
            self.advance();
            return self.parse_statement();
        }

        self.parse_expression_statement()
    }

    /// Whether token `n` ahead starts on a later line than the one before it.
    fn line_break_before(&self, n: usize) -> bool {
        match (self.peek(n.saturating_sub(1)), self.peek(n)) {
            (Some(prev), Some(next)) => next.range.start.line > prev.range.end.line,
            _ => true,
        }
    }

    /// Semicolon, or an automatic one at `}`, end of input or a line break.
    fn consume_statement_end(&mut self) -> ParseResult<()> {
        if self.eat(";") || self.at("}") || self.is_eof() || self.at_line_break() {
            Ok(())
        } else {
            Err(self.error("';'"))
        }
    }

    fn parse_expression_statement(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        let expr = self.parse_expression()?;
        self.consume_statement_end()?;
        Ok(self.finish(NodeKind::ExpressionStatement, start, "", vec![expr]))
    }

    pub(super) fn parse_block(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_operator("{")?;
        let saved = std::mem::replace(&mut self.no_in, false);
        let mut items = Vec::new();
        while !self.at("}") {
            if self.is_eof() {
                return Err(self.error("'}'"));
            }
            items.push(self.parse_statement()?);
        }
        self.no_in = saved;
        self.expect_operator("}")?;
        Ok(self.finish(NodeKind::Block, start, "", items))
    }

    // ── Modules ──────────────────────────────────────────────────────────

    fn parse_import(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_keyword("import")?;
        let mut children = Vec::new();

        if let Some(source) = self.current().filter(|t| t.kind == TokenKind::String) {
            self.advance();
            children.push(self.leaf(NodeKind::StringLiteral, source));
            self.consume_statement_end()?;
            return Ok(self.finish(NodeKind::ImportDeclaration, start, unquote(&source.value), children));
        }

        let type_only = self.at("type")
            && self.peek(1).is_some_and(|t| {
                t.is_symbol("{")
                    || t.is_symbol("*")
                    || (t.is_binding_name()
                        && !(t.value == "from"
                            && self.peek(2).is_some_and(|s| s.kind == TokenKind::String)))
            });
        if type_only {
            self.advance();
        }

        // default binding, or `import x = require("y")`
        if self.at_binding_name() && !(self.at("from") && self.peek(1).is_some_and(|t| t.kind == TokenKind::String)) {
            let spec_start = self.start();
            let local = self.expect_identifier()?;
            let id = self.leaf(NodeKind::Identifier, local);
            children.push(self.finish(NodeKind::ImportSpecifier, spec_start, local.value.clone(), vec![id]));

            if self.eat("=") {
                children.push(self.parse_assignment()?);
                self.consume_statement_end()?;
                return Ok(self.finish(NodeKind::ImportDeclaration, start, "", children));
            }
            self.eat(",");
        }

        if self.at("*") {
            let spec_start = self.start();
            self.advance();
            self.expect_keyword("as")?;
            let local = self.expect_identifier()?;
            let id = self.leaf(NodeKind::Identifier, local);
            children.push(self.finish(NodeKind::ImportSpecifier, spec_start, local.value.clone(), vec![id]));
        } else if self.eat("{") {
            while !self.at("}") {
                children.push(self.parse_import_specifier()?);
                if !self.eat(",") {
                    break;
                }
            }
            self.expect_operator("}")?;
        }

        self.expect_keyword("from")?;
        let Some(source) = self.current().filter(|t| t.kind == TokenKind::String) else {
            return Err(self.error("module specifier"));
        };
        self.advance();
        children.push(self.leaf(NodeKind::StringLiteral, source));
        self.skip_import_attributes()?;
        self.consume_statement_end()?;
        Ok(self.finish(NodeKind::ImportDeclaration, start, unquote(&source.value), children))
    }

    /// `a`, `a as b`, `"a-b" as c`, `type a`.
    fn parse_import_specifier(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        if self.at("type")
            && self.peek(1).is_some_and(Token::is_word)
            && !self.peek_is(1, "as")
        {
            self.advance();
        }
        let imported = match self.current() {
            Some(t) if t.is_word() || t.kind == TokenKind::String => {
                self.advance();
                t
            }
            _ => return Err(self.error("import name")),
        };

        if self.eat("as") {
            let name = self.alloc_property_name(imported);
            let local = self.expect_identifier()?;
            let id = self.leaf(NodeKind::Identifier, local);
            return Ok(self.finish(NodeKind::ImportSpecifier, start, local.value.clone(), vec![name, id]));
        }
        if !imported.is_binding_name() {
            return Err(self.error_at(imported, "identifier"));
        }
        let id = self.leaf(NodeKind::Identifier, imported);
        Ok(self.finish(NodeKind::ImportSpecifier, start, imported.value.clone(), vec![id]))
    }

    /// `with { type: "json" }` / `assert { ... }` after a module specifier.
    fn skip_import_attributes(&mut self) -> ParseResult<()> {
        if (self.at("with") || self.at("assert")) && self.peek_is(1, "{") && !self.at_line_break() {
            self.advance();
            self.skip_balanced()?;
        }
        Ok(())
    }

    fn parse_export(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_keyword("export")?;

        if self.eat("default") {
            let decl = if self.at("function")
                || (self.at("async") && self.peek_is(1, "function"))
            {
                self.parse_function_declaration(true)?
            } else if self.at("class") {
                self.parse_class(NodeKind::ClassDeclaration, true)?
            } else if self.at("abstract") && self.peek_is(1, "class") {
                self.advance();
                self.parse_class(NodeKind::ClassDeclaration, true)?
            } else if self.at("interface") {
                self.parse_interface()?
            } else {
                let expr = self.parse_assignment()?;
                self.consume_statement_end()?;
                expr
            };
            return Ok(self.finish(NodeKind::ExportDeclaration, start, "default", vec![decl]));
        }

        if self.eat("=") {
            let expr = self.parse_assignment()?;
            self.consume_statement_end()?;
            return Ok(self.finish(NodeKind::ExportDeclaration, start, "=", vec![expr]));
        }

        if self.at("as") && self.peek_is(1, "namespace") {
            self.advance();
            self.advance();
            let name = self.expect_word()?;
            let name = self.alloc_property_name(name);
            self.consume_statement_end()?;
            return Ok(self.finish(NodeKind::ExportDeclaration, start, "namespace", vec![name]));
        }

        if self.at("type") && self.peek_is(1, "{") {
            self.advance();
        }

        if self.at("*") {
            self.advance();
            let mut children = Vec::new();
            if self.eat("as") {
                let name = self.expect_word()?;
                children.push(self.alloc_property_name(name));
            }
            children.push(self.parse_module_source()?);
            self.consume_statement_end()?;
            return Ok(self.finish(NodeKind::ExportDeclaration, start, "*", children));
        }

        if self.at("{") {
            return self.parse_export_list(start);
        }

        let decl = self.parse_statement()?;
        Ok(self.finish(NodeKind::ExportDeclaration, start, "", vec![decl]))
    }

    /// `export { a, b as c } [from "m"];`
    fn parse_export_list(&mut self, start: Position) -> ParseResult<NodeId> {
        self.expect_operator("{")?;
        let mut specs: Vec<(Position, &Token, Option<&Token>)> = Vec::new();
        while !self.at("}") {
            let spec_start = self.start();
            if self.at("type") && self.peek(1).is_some_and(Token::is_word) && !self.peek_is(1, "as") {
                self.advance();
            }
            let local = match self.current() {
                Some(t) if t.is_word() || t.kind == TokenKind::String => {
                    self.advance();
                    t
                }
                _ => return Err(self.error("export name")),
            };
            let exported = if self.eat("as") {
                match self.current() {
                    Some(t) if t.is_word() || t.kind == TokenKind::String => {
                        self.advance();
                        Some(t)
                    }
                    _ => return Err(self.error("export name")),
                }
            } else {
                None
            };
            specs.push((spec_start, local, exported));
            if !self.eat(",") {
                break;
            }
        }
        self.expect_operator("}")?;

        // re-exports name bindings of another module, not local ones
        let reexport = self.at("from");
        let mut children = Vec::with_capacity(specs.len() + 1);
        for (spec_start, local, exported) in specs {
            let local_node = if reexport || !local.is_binding_name() {
                self.alloc_property_name(local)
            } else {
                self.leaf(NodeKind::Identifier, local)
            };
            let mut parts = vec![local_node];
            let mut text = local.value.clone();
            if let Some(exported) = exported {
                parts.push(self.alloc_property_name(exported));
                text = SmolStr::new(unquote(&exported.value));
            }
            let spec_end = self.node_end(*parts.last().unwrap_or(&local_node));
            let range = crate::base::Range::new(spec_start, spec_end);
            children.push(self.alloc(NodeKind::ExportSpecifier, range, text, parts));
        }

        if reexport {
            children.push(self.parse_module_source()?);
        }
        self.consume_statement_end()?;
        Ok(self.finish(NodeKind::ExportDeclaration, start, "", children))
    }

    fn node_end(&self, id: NodeId) -> Position {
        self.nodes[id.index()].range.end
    }

    /// `from "module"` as a `StringLiteral` node.
    fn parse_module_source(&mut self) -> ParseResult<NodeId> {
        self.expect_keyword("from")?;
        let Some(source) = self.current().filter(|t| t.kind == TokenKind::String) else {
            return Err(self.error("module specifier"));
        };
        self.advance();
        let node = self.leaf(NodeKind::StringLiteral, source);
        self.skip_import_attributes()?;
        Ok(node)
    }

    /// A non-binding name leaf. String names lose their quotes.
    pub(super) fn alloc_property_name(&mut self, tok: &Token) -> NodeId {
        let text = if tok.kind == TokenKind::String {
            SmolStr::new(unquote(&tok.value))
        } else {
            tok.value.clone()
        };
        self.alloc(NodeKind::PropertyName, tok.range, text, Vec::new())
    }

    // ── Declarations ─────────────────────────────────────────────────────

    /// `[async] function [*] name<T>(params): R { body }`. The body may be
    /// missing for overloads and ambient declarations.
    fn parse_function_declaration(&mut self, anonymous_ok: bool) -> ParseResult<NodeId> {
        let start = self.start();
        self.eat("async");
        self.expect_keyword("function")?;
        self.eat("*");

        let mut children = Vec::new();
        let mut name = SmolStr::default();
        if !(anonymous_ok && self.at("(")) {
            let tok = self.expect_identifier()?;
            name = tok.value.clone();
            children.push(self.leaf(NodeKind::Identifier, tok));
        }
        self.parse_function_rest(&mut children, true)?;
        Ok(self.finish(NodeKind::FunctionDeclaration, start, name, children))
    }

    /// Type parameters, parameter list, return type and body of any
    /// function-like production, appended to `children`.
    pub(super) fn parse_function_rest(
        &mut self,
        children: &mut Vec<NodeId>,
        body_optional: bool,
    ) -> ParseResult<()> {
        children.extend(self.parse_type_parameters()?);
        children.extend(self.parse_parameter_list()?);
        if self.eat(":") {
            children.push(self.parse_return_type()?);
        }
        if self.at("{") {
            children.push(self.parse_block()?);
        } else if body_optional {
            self.consume_statement_end()?;
        } else {
            return Err(self.error("'{'"));
        }
        Ok(())
    }

    /// `(a, b?: T, {c}, ...rest)`
    pub(super) fn parse_parameter_list(&mut self) -> ParseResult<Vec<NodeId>> {
        self.expect_operator("(")?;
        let saved = std::mem::replace(&mut self.no_in, false);
        let mut params = Vec::new();
        while !self.at(")") {
            params.push(self.parse_parameter()?);
            if !self.eat(",") {
                break;
            }
        }
        self.no_in = saved;
        self.expect_operator(")")?;
        Ok(params)
    }

    fn parse_parameter(&mut self) -> ParseResult<NodeId> {
        self.skip_decorators()?;
        let start = self.start();
        while self.current().is_some_and(|t| {
            matches!(t.value.as_str(), "public" | "private" | "protected" | "readonly" | "override")
                && t.kind == TokenKind::Keyword
        }) && self.peek(1).is_some_and(|t| {
            t.is_binding_name() || t.is_symbol("{") || t.is_symbol("[") || t.is_symbol("...")
        }) {
            self.advance();
        }

        let mut children = Vec::new();
        let name;
        if self.at("this") {
            // `this: Type` declares the receiver type only
            self.advance();
            name = SmolStr::new_static("this");
        } else if self.at("...") {
            let rest_start = self.start();
            self.advance();
            let target = self.parse_binding_target()?;
            name = self.text_of(target);
            children.push(self.finish(NodeKind::RestElement, rest_start, "...", vec![target]));
        } else {
            let target = self.parse_binding_target()?;
            name = self.text_of(target);
            children.push(target);
        }

        self.eat("?");
        if self.eat(":") {
            children.push(self.parse_type_annotation()?);
        }
        if self.eat("=") {
            children.push(self.parse_assignment()?);
        }
        Ok(self.finish(NodeKind::Parameter, start, name, children))
    }

    /// `class Name<T> extends Base implements I { members }`
    pub(super) fn parse_class(&mut self, kind: NodeKind, anonymous_ok: bool) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_keyword("class")?;

        let mut children = Vec::new();
        let mut name = SmolStr::default();
        if self.at_binding_name() && !self.at("implements") {
            let tok = self.expect_identifier()?;
            name = tok.value.clone();
            children.push(self.leaf(NodeKind::Identifier, tok));
        } else if !anonymous_ok {
            return Err(self.error("identifier"));
        }
        children.extend(self.parse_type_parameters()?);

        if self.at("extends") {
            let clause_start = self.start();
            self.advance();
            let mut parts = vec![self.parse_heritage_expression()?];
            if self.at("<") {
                parts.push(self.parse_type_arguments()?);
            }
            children.push(self.finish(NodeKind::HeritageClause, clause_start, "extends", parts));
        }
        if self.at("implements") {
            let clause_start = self.start();
            self.advance();
            let mut parts = Vec::new();
            loop {
                parts.push(self.parse_type_annotation()?);
                if !self.eat(",") {
                    break;
                }
            }
            children.push(self.finish(NodeKind::HeritageClause, clause_start, "implements", parts));
        }

        self.expect_operator("{")?;
        let saved = std::mem::replace(&mut self.no_in, false);
        while !self.at("}") {
            if self.is_eof() {
                return Err(self.error("'}'"));
            }
            if let Some(member) = self.parse_class_member()? {
                children.push(member);
            }
        }
        self.no_in = saved;
        self.expect_operator("}")?;
        Ok(self.finish(kind, start, name, children))
    }

    fn parse_class_member(&mut self) -> ParseResult<Option<NodeId>> {
        if self.eat(";") {
            return Ok(None);
        }
        self.skip_decorators()?;
        let start = self.start();

        if self.at("static") && self.peek_is(1, "{") {
            self.advance();
            return self.parse_block().map(Some);
        }

        while self.current().is_some_and(|t| {
            t.kind == TokenKind::Keyword && MEMBER_MODIFIERS.contains(&t.value.as_str())
        }) && self.peek(1).is_some_and(starts_member_name)
            && !self.line_break_before(1)
        {
            self.advance();
        }
        self.eat("*");

        if self.at("constructor") && self.peek_is(1, "(") {
            self.advance();
            let mut children = Vec::new();
            self.parse_function_rest(&mut children, true)?;
            return Ok(Some(self.finish(NodeKind::Constructor, start, "constructor", children)));
        }

        if self.at("[")
            && self.peek(1).is_some_and(Token::is_word)
            && self.peek_is(2, ":")
        {
            let sig = self.parse_index_signature(start)?;
            self.consume_statement_end()?;
            return Ok(Some(sig));
        }

        let name = self.parse_property_key()?;
        let text = self.text_of(name);
        self.eat("?");
        self.eat("!");

        let mut children = vec![name];
        if self.at("(") || self.at("<") {
            self.parse_function_rest(&mut children, true)?;
            return Ok(Some(self.finish(NodeKind::MethodDeclaration, start, text, children)));
        }

        if self.eat(":") {
            children.push(self.parse_type_annotation()?);
        }
        if self.eat("=") {
            children.push(self.parse_assignment()?);
        }
        self.consume_statement_end()?;
        Ok(Some(self.finish(NodeKind::PropertyDeclaration, start, text, children)))
    }

    /// `[key: string]: T` as a nameless `PropertySignature`.
    fn parse_index_signature(&mut self, start: Position) -> ParseResult<NodeId> {
        self.expect_operator("[")?;
        self.expect_word()?;
        self.expect_operator(":")?;
        let key = self.parse_type_annotation()?;
        self.expect_operator("]")?;
        let mut children = vec![key];
        if self.eat(":") {
            children.push(self.parse_type_annotation()?);
        }
        Ok(self.finish(NodeKind::PropertySignature, start, "[]", children))
    }

    /// Member or object key: word, string, number, `#private` or `[computed]`.
    pub(super) fn parse_property_key(&mut self) -> ParseResult<NodeId> {
        let Some(tok) = self.current() else {
            return Err(self.error("property name"));
        };
        if tok.is_symbol("[") {
            let start = self.start();
            self.advance();
            let saved = std::mem::replace(&mut self.no_in, false);
            let expr = self.parse_assignment()?;
            self.no_in = saved;
            self.expect_operator("]")?;
            return Ok(self.finish(NodeKind::ComputedPropertyName, start, "", vec![expr]));
        }
        if tok.is_symbol("#") {
            let start = self.start();
            self.advance();
            let name = self.expect_word()?;
            let text = format!("#{}", name.value);
            return Ok(self.finish(NodeKind::PropertyName, start, text, Vec::new()));
        }
        if tok.is_word() || matches!(tok.kind, TokenKind::String | TokenKind::Number) {
            self.advance();
            return Ok(self.alloc_property_name(tok));
        }
        Err(self.error("property name"))
    }

    fn parse_interface(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_keyword("interface")?;
        let name = self.expect_identifier()?;
        let mut children = vec![self.leaf(NodeKind::Identifier, name)];
        children.extend(self.parse_type_parameters()?);

        if self.at("extends") {
            let clause_start = self.start();
            self.advance();
            let mut parts = Vec::new();
            loop {
                parts.push(self.parse_type_annotation()?);
                if !self.eat(",") {
                    break;
                }
            }
            children.push(self.finish(NodeKind::HeritageClause, clause_start, "extends", parts));
        }

        self.expect_operator("{")?;
        while !self.at("}") {
            if self.is_eof() {
                return Err(self.error("'}'"));
            }
            children.push(self.parse_interface_member()?);
            if !self.eat(";") && !self.eat(",") && !self.at("}") && !self.at_line_break() {
                return Err(self.error("';'"));
            }
        }
        self.expect_operator("}")?;
        Ok(self.finish(NodeKind::InterfaceDeclaration, start, name.value.clone(), children))
    }

    fn parse_interface_member(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        if self.at("readonly") && self.peek(1).is_some_and(starts_member_name) {
            self.advance();
        }

        // call and construct signatures
        if self.at("(") || self.at("<") || (self.at("new") && (self.peek_is(1, "(") || self.peek_is(1, "<"))) {
            let text = if self.eat("new") { "new" } else { "()" };
            let mut children = self.parse_type_parameters()?;
            children.extend(self.parse_parameter_list()?);
            if self.eat(":") {
                children.push(self.parse_return_type()?);
            }
            return Ok(self.finish(NodeKind::MethodSignature, start, text, children));
        }

        if self.at("[") && self.peek(1).is_some_and(Token::is_word) && self.peek_is(2, ":") {
            return self.parse_index_signature(start);
        }

        if (self.at("get") || self.at("set")) && self.peek(1).is_some_and(starts_member_name) {
            self.advance();
        }
        let name = self.parse_property_key()?;
        let text = self.text_of(name);
        self.eat("?");

        let mut children = vec![name];
        if self.at("(") || self.at("<") {
            children.extend(self.parse_type_parameters()?);
            children.extend(self.parse_parameter_list()?);
            if self.eat(":") {
                children.push(self.parse_return_type()?);
            }
            return Ok(self.finish(NodeKind::MethodSignature, start, text, children));
        }
        if self.eat(":") {
            children.push(self.parse_type_annotation()?);
        }
        Ok(self.finish(NodeKind::PropertySignature, start, text, children))
    }

    fn parse_type_alias(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_keyword("type")?;
        let name = self.expect_identifier()?;
        let mut children = vec![self.leaf(NodeKind::Identifier, name)];
        children.extend(self.parse_type_parameters()?);
        self.expect_operator("=")?;
        children.push(self.parse_type_annotation()?);
        self.consume_statement_end()?;
        Ok(self.finish(NodeKind::TypeAlias, start, name.value.clone(), children))
    }

    fn parse_enum(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_keyword("enum")?;
        let name = self.expect_identifier()?;
        let mut children = vec![self.leaf(NodeKind::Identifier, name)];

        self.expect_operator("{")?;
        while !self.at("}") {
            let member_start = self.start();
            let key = self.parse_property_key()?;
            let text = self.text_of(key);
            let mut parts = vec![key];
            if self.eat("=") {
                parts.push(self.parse_assignment()?);
            }
            children.push(self.finish(NodeKind::EnumMember, member_start, text, parts));
            if !self.eat(",") {
                break;
            }
        }
        self.expect_operator("}")?;
        Ok(self.finish(NodeKind::EnumDeclaration, start, name.value.clone(), children))
    }

    /// `namespace A.B { ... }`, after the keyword. Dotted names nest.
    fn parse_namespace(&mut self, start: Position) -> ParseResult<NodeId> {
        let name = self.expect_identifier()?;
        let id = self.leaf(NodeKind::Identifier, name);
        let body = if self.eat(".") {
            let inner_start = self.start();
            self.parse_namespace(inner_start)?
        } else {
            self.parse_block()?
        };
        Ok(self.finish(NodeKind::NamespaceDeclaration, start, name.value.clone(), vec![id, body]))
    }

    /// `module M {}`, `module "m" {}`, `global {}`.
    fn parse_module_declaration(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        let mut children = Vec::new();
        let text;
        if self.eat("global") {
            text = SmolStr::new_static("global");
        } else {
            self.expect_keyword("module")?;
            match self.current() {
                Some(t) if t.kind == TokenKind::String => {
                    self.advance();
                    text = SmolStr::new(unquote(&t.value));
                    children.push(self.leaf(NodeKind::StringLiteral, t));
                }
                _ => {
                    let name = self.expect_identifier()?;
                    text = name.value.clone();
                    children.push(self.leaf(NodeKind::Identifier, name));
                }
            }
        }
        if self.at("{") {
            children.push(self.parse_block()?);
        } else {
            self.consume_statement_end()?;
        }
        Ok(self.finish(NodeKind::ModuleDeclaration, start, text, children))
    }

    fn parse_variable_statement(&mut self) -> ParseResult<NodeId> {
        let decl = self.parse_variable_declaration()?;
        self.consume_statement_end()?;
        // widen the range over the semicolon
        let node = &mut self.nodes[decl.index()];
        node.range.end = node.range.end.max(self.prev_end);
        Ok(decl)
    }

    /// `const a = 1, {b} = c` without the statement terminator.
    pub(super) fn parse_variable_declaration(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        let Some(keyword) = self.advance() else {
            return Err(self.error("'const', 'let' or 'var'"));
        };
        let mut declarators = Vec::new();
        loop {
            declarators.push(self.parse_declarator()?);
            if !self.eat(",") {
                break;
            }
        }
        Ok(self.finish(NodeKind::VariableDeclaration, start, keyword.value.clone(), declarators))
    }

    fn parse_declarator(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        let target = self.parse_binding_target()?;
        let name = self.text_of(target);
        let mut children = vec![target];
        self.eat("!");
        if self.eat(":") {
            children.push(self.parse_type_annotation()?);
        }
        if self.eat("=") {
            children.push(self.parse_assignment()?);
        }
        Ok(self.finish(NodeKind::VariableDeclarator, start, name, children))
    }

    // ── Binding patterns ─────────────────────────────────────────────────

    /// Identifier, object pattern or array pattern.
    pub(super) fn parse_binding_target(&mut self) -> ParseResult<NodeId> {
        match self.current() {
            Some(t) if t.is_symbol("{") => self.nested(Self::parse_object_pattern),
            Some(t) if t.is_symbol("[") => self.nested(Self::parse_array_pattern),
            _ => {
                let tok = self.expect_identifier()?;
                Ok(self.leaf(NodeKind::Identifier, tok))
            }
        }
    }

    /// A binding target with an optional `= default`.
    fn parse_binding_element(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        let target = self.parse_binding_target()?;
        if self.eat("=") {
            let value = self.parse_assignment()?;
            let text = self.text_of(target);
            return Ok(self.finish(NodeKind::AssignmentPattern, start, text, vec![target, value]));
        }
        Ok(target)
    }

    fn parse_object_pattern(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_operator("{")?;
        let mut elements = Vec::new();
        while !self.at("}") {
            let elem_start = self.start();
            if self.eat("...") {
                let target = self.parse_binding_target()?;
                elements.push(self.finish(NodeKind::RestElement, elem_start, "...", vec![target]));
            } else if self.at_binding_name() && !self.peek_is(1, ":") {
                // shorthand `{a}` / `{a = 1}`
                elements.push(self.parse_binding_element()?);
            } else {
                let key = self.parse_property_key()?;
                let text = self.text_of(key);
                self.expect_operator(":")?;
                let value = self.parse_binding_element()?;
                elements.push(self.finish(NodeKind::Property, elem_start, text, vec![key, value]));
            }
            if !self.eat(",") {
                break;
            }
        }
        self.expect_operator("}")?;
        Ok(self.finish(NodeKind::ObjectPattern, start, "", elements))
    }

    fn parse_array_pattern(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_operator("[")?;
        let mut elements = Vec::new();
        while !self.at("]") {
            if self.eat(",") {
                continue;
            }
            let elem_start = self.start();
            if self.eat("...") {
                let target = self.parse_binding_target()?;
                elements.push(self.finish(NodeKind::RestElement, elem_start, "...", vec![target]));
            } else {
                elements.push(self.parse_binding_element()?);
            }
            if !self.at("]") {
                self.expect_operator(",")?;
            }
        }
        self.expect_operator("]")?;
        Ok(self.finish(NodeKind::ArrayPattern, start, "", elements))
    }

    /// `@name`, `@a.b(args)`; consumed without nodes.
    pub(super) fn skip_decorators(&mut self) -> ParseResult<()> {
        while self.eat("@") {
            self.expect_word()?;
            while self.eat(".") {
                self.expect_word()?;
            }
            if self.at("(") {
                self.skip_balanced()?;
            }
        }
        Ok(())
    }

    // ── Control flow ─────────────────────────────────────────────────────

    fn parse_return(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_keyword("return")?;
        let mut children = Vec::new();
        if !self.at(";") && !self.at("}") && !self.at_line_break() {
            children.push(self.parse_expression()?);
        }
        self.consume_statement_end()?;
        Ok(self.finish(NodeKind::ReturnStatement, start, "", children))
    }

    fn parse_throw(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_keyword("throw")?;
        let expr = self.parse_expression()?;
        self.consume_statement_end()?;
        Ok(self.finish(NodeKind::ThrowStatement, start, "", vec![expr]))
    }

    /// `break` / `continue`, with an optional label that is not a reference.
    fn parse_jump(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        let Some(keyword) = self.advance() else {
            return Err(self.error("statement"));
        };
        let kind = if keyword.value == "break" {
            NodeKind::BreakStatement
        } else {
            NodeKind::ContinueStatement
        };
        if self.at_binding_name() && !self.at_line_break() {
            self.advance();
        }
        self.consume_statement_end()?;
        Ok(self.finish(kind, start, keyword.value.clone(), Vec::new()))
    }

    fn parse_paren_condition(&mut self) -> ParseResult<NodeId> {
        self.expect_operator("(")?;
        let saved = std::mem::replace(&mut self.no_in, false);
        let expr = self.parse_expression()?;
        self.no_in = saved;
        self.expect_operator(")")?;
        Ok(expr)
    }

    fn parse_if(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_keyword("if")?;
        let mut children = vec![self.parse_paren_condition()?];
        children.push(self.parse_statement()?);
        if self.eat("else") {
            children.push(self.parse_statement()?);
        }
        Ok(self.finish(NodeKind::IfStatement, start, "", children))
    }

    fn parse_while(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_keyword("while")?;
        let test = self.parse_paren_condition()?;
        let body = self.parse_statement()?;
        Ok(self.finish(NodeKind::WhileStatement, start, "", vec![test, body]))
    }

    fn parse_do_while(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_keyword("do")?;
        let body = self.parse_statement()?;
        self.expect_keyword("while")?;
        let test = self.parse_paren_condition()?;
        self.eat_semicolon();
        Ok(self.finish(NodeKind::DoWhileStatement, start, "", vec![body, test]))
    }

    /// Classic, `for...of` and `for...in` loops.
    fn parse_for(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_keyword("for")?;
        let text = if self.eat("await") { "await" } else { "" };
        self.expect_operator("(")?;

        let mut children = Vec::new();
        if !self.at(";") {
            let saved = std::mem::replace(&mut self.no_in, true);
            let declares = self.at("const")
                || self.at("var")
                || (self.at("let")
                    && self.peek(1).is_some_and(|t| {
                        t.is_binding_name() || t.is_symbol("[") || t.is_symbol("{")
                    }));
            let init = if declares {
                self.parse_variable_declaration()
            } else {
                self.parse_expression()
            };
            self.no_in = saved;
            children.push(init?);

            let iteration = if self.eat("of") {
                Some((NodeKind::ForOfStatement, self.parse_assignment()?))
            } else if self.eat("in") {
                Some((NodeKind::ForInStatement, self.parse_expression()?))
            } else {
                None
            };
            if let Some((kind, right)) = iteration {
                children.push(right);
                self.expect_operator(")")?;
                children.push(self.parse_statement()?);
                return Ok(self.finish(kind, start, text, children));
            }
        }

        self.expect_operator(";")?;
        if !self.at(";") {
            children.push(self.parse_expression()?);
        }
        self.expect_operator(";")?;
        if !self.at(")") {
            children.push(self.parse_expression()?);
        }
        self.expect_operator(")")?;
        children.push(self.parse_statement()?);
        Ok(self.finish(NodeKind::ForStatement, start, text, children))
    }

    fn parse_switch(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_keyword("switch")?;
        let mut children = vec![self.parse_paren_condition()?];
        self.expect_operator("{")?;
        while !self.at("}") {
            let case_start = self.start();
            let (text, mut parts) = if self.eat("default") {
                ("default", Vec::new())
            } else {
                self.expect_keyword("case")?;
                ("case", vec![self.parse_expression()?])
            };
            self.expect_operator(":")?;
            while !self.at("case") && !self.at("default") && !self.at("}") {
                if self.is_eof() {
                    return Err(self.error("'}'"));
                }
                parts.push(self.parse_statement()?);
            }
            children.push(self.finish(NodeKind::CaseClause, case_start, text, parts));
        }
        self.expect_operator("}")?;
        Ok(self.finish(NodeKind::SwitchStatement, start, "", children))
    }

    fn parse_try(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_keyword("try")?;
        let mut children = vec![self.parse_block()?];

        if self.at("catch") {
            let catch_start = self.start();
            self.advance();
            let mut parts = Vec::new();
            if self.eat("(") {
                parts.push(self.parse_binding_target()?);
                if self.eat(":") {
                    parts.push(self.parse_type_annotation()?);
                }
                self.expect_operator(")")?;
            }
            parts.push(self.parse_block()?);
            children.push(self.finish(NodeKind::CatchClause, catch_start, "catch", parts));
        }
        if self.eat("finally") {
            children.push(self.parse_block()?);
        }
        if children.len() == 1 {
            return Err(self.error("'catch' or 'finally'"));
        }
        Ok(self.finish(NodeKind::TryStatement, start, "", children))
    }
}

/// Tokens that can follow a modifier and begin a member name.
fn starts_member_name(tok: &Token) -> bool {
    tok.is_word()
        || matches!(tok.kind, TokenKind::String | TokenKind::Number)
        || tok.is_symbol("[")
        || tok.is_symbol("#")
        || tok.is_symbol("*")
}
