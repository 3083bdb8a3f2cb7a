//! Type annotations.
//!
//! Types are consumed without a tree of their own. A `TypeAnnotation` node
//! keeps the rendered type text and, as children, one `Identifier` per named
//! type it mentions so type usages resolve like any other reference.

use super::{ParseResult, Parser};
use crate::syntax::ast::{NodeId, NodeKind};
use crate::syntax::keywords;
use crate::syntax::lexer::{Token, TokenKind};

impl Parser<'_> {
    /// Parse a type and wrap it in a `TypeAnnotation` node.
    pub(super) fn parse_type_annotation(&mut self) -> ParseResult<NodeId> {
        self.annotation(|p, refs| p.parse_type(refs))
    }

    /// Return type position, which also accepts type predicates.
    pub(super) fn parse_return_type(&mut self) -> ParseResult<NodeId> {
        self.annotation(|p, refs| p.parse_type_or_predicate(refs))
    }

    /// `<A, B<C>>` after a callee or heritage name, as one annotation.
    pub(super) fn parse_type_arguments(&mut self) -> ParseResult<NodeId> {
        self.annotation(|p, refs| p.parse_type_argument_list(refs))
    }

    fn annotation(
        &mut self,
        body: impl FnOnce(&mut Self, &mut Vec<NodeId>) -> ParseResult<()>,
    ) -> ParseResult<NodeId> {
        let start = self.start();
        let first = self.pos;
        let mut refs = Vec::new();
        body(self, &mut refs)?;
        let text = render_tokens(&self.tokens[first..self.pos.max(first)]);
        Ok(self.finish(NodeKind::TypeAnnotation, start, text, refs))
    }

    /// Declaration type parameters, `<T extends U = V, ...>`. Empty when the
    /// current token is not `<`.
    pub(super) fn parse_type_parameters(&mut self) -> ParseResult<Vec<NodeId>> {
        let mut params = Vec::new();
        if !self.eat("<") {
            return Ok(params);
        }
        loop {
            let start = self.start();
            while (self.at("const") || self.at("in") || self.at("out"))
                && self.peek(1).is_some_and(Token::is_binding_name)
            {
                self.advance();
            }
            let name = self.expect_identifier()?;
            let mut children = Vec::new();
            if self.eat("extends") {
                children.push(self.parse_type_annotation()?);
            }
            if self.eat("=") {
                children.push(self.parse_type_annotation()?);
            }
            params.push(self.finish(NodeKind::TypeParameter, start, name.value.clone(), children));

            if !self.eat(",") || self.at_angle_close() {
                break;
            }
        }
        self.close_angle()?;
        Ok(params)
    }

    /// Whether `<` at the cursor opens type arguments of a call.
    pub(super) fn type_arguments_ahead(&self) -> bool {
        self.angle_close(self.pos).is_some_and(|close| {
            self.tokens.get(close + 1).is_some_and(|t| {
                t.is_symbol("(") || (t.kind == TokenKind::String && t.value.starts_with('`'))
            })
        })
    }

    /// Index of the token closing the `<` at `open`, if the tokens in between
    /// can form a type argument list.
    pub(super) fn angle_close(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, tok) in self.tokens.iter().enumerate().skip(open) {
            if !matches!(tok.kind, TokenKind::Operator | TokenKind::Punctuation) {
                continue;
            }
            match tok.value.as_str() {
                "<" => depth += 1,
                ">" | ">>" | ">>>" => {
                    depth = depth.checked_sub(tok.value.len())?;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                "," | "." | "[" | "]" | "(" | ")" | "{" | "}" | "|" | "&" | "?" | ":" | "=>"
                | "=" | "..." | "-" => {}
                _ => return None,
            }
        }
        None
    }

    fn at_angle_close(&self) -> bool {
        self.current()
            .is_some_and(|t| t.kind == TokenKind::Operator && t.value.starts_with('>'))
    }

    /// Consume one `>`, splitting `>>` and `>>>` across nested lists.
    pub(super) fn close_angle(&mut self) -> ParseResult<()> {
        match self.current() {
            Some(t) if t.kind == TokenKind::Operator && t.value.starts_with('>') => {
                let arrows = t.value.chars().take_while(|&c| c == '>').count();
                if self.split_gt + 1 >= arrows {
                    self.advance();
                } else {
                    self.split_gt += 1;
                }
                Ok(())
            }
            _ => Err(self.error("'>'")),
        }
    }

    // ── Type grammar ─────────────────────────────────────────────────────

    fn parse_type_argument_list(&mut self, refs: &mut Vec<NodeId>) -> ParseResult<()> {
        self.expect_operator("<")?;
        loop {
            self.parse_type(refs)?;
            if !self.eat(",") || self.at_angle_close() {
                break;
            }
        }
        self.close_angle()
    }

    fn parse_type_or_predicate(&mut self, refs: &mut Vec<NodeId>) -> ParseResult<()> {
        if self.at("asserts") && self.peek(1).is_some_and(Token::is_word) {
            self.advance();
            self.advance();
            if self.eat("is") {
                self.parse_type(refs)?;
            }
            return Ok(());
        }
        if self.at_word() && self.peek_is(1, "is") {
            self.advance();
            self.advance();
        }
        self.parse_type(refs)
    }

    pub(super) fn parse_type(&mut self, refs: &mut Vec<NodeId>) -> ParseResult<()> {
        self.nested(|p| p.parse_conditional_type(refs))
    }

    fn parse_conditional_type(&mut self, refs: &mut Vec<NodeId>) -> ParseResult<()> {
        self.parse_union_type(refs)?;
        if self.at("extends") {
            self.advance();
            self.parse_union_type(refs)?;
            self.expect_operator("?")?;
            self.parse_type(refs)?;
            self.expect_operator(":")?;
            self.parse_type(refs)?;
        }
        Ok(())
    }

    fn parse_union_type(&mut self, refs: &mut Vec<NodeId>) -> ParseResult<()> {
        self.eat("|");
        loop {
            self.parse_intersection_type(refs)?;
            if !self.eat("|") {
                return Ok(());
            }
        }
    }

    fn parse_intersection_type(&mut self, refs: &mut Vec<NodeId>) -> ParseResult<()> {
        self.eat("&");
        loop {
            self.parse_postfix_type(refs)?;
            if !self.eat("&") {
                return Ok(());
            }
        }
    }

    fn parse_postfix_type(&mut self, refs: &mut Vec<NodeId>) -> ParseResult<()> {
        self.parse_prefix_type(refs)?;
        while self.at("[") && !self.at_line_break() {
            self.advance();
            if !self.eat("]") {
                self.parse_type(refs)?;
                self.expect_operator("]")?;
            }
        }
        Ok(())
    }

    fn parse_prefix_type(&mut self, refs: &mut Vec<NodeId>) -> ParseResult<()> {
        let operand_follows = self
            .peek(1)
            .is_some_and(|t| t.is_word() || t.is_symbol("(") || t.is_symbol("[") || t.is_symbol("{"));

        if (self.at("keyof") || self.at("unique") || self.at("readonly")) && operand_follows {
            self.advance();
            return self.nested(|p| p.parse_prefix_type(refs));
        }
        if self.at("infer") && operand_follows {
            self.advance();
            self.expect_word()?;
            return Ok(());
        }
        if self.at("typeof") {
            self.advance();
            if self.at("import") {
                return self.parse_import_type();
            }
            let name = self.expect_identifier()?;
            refs.push(self.leaf(NodeKind::Identifier, name));
            self.skip_qualified_tail()?;
            if self.at("<") && !self.at_line_break() {
                self.parse_type_argument_list(refs)?;
            }
            return Ok(());
        }
        self.parse_primary_type(refs)
    }

    fn parse_primary_type(&mut self, refs: &mut Vec<NodeId>) -> ParseResult<()> {
        let Some(tok) = self.current() else {
            return Err(self.error("type"));
        };

        match (tok.kind, tok.value.as_str()) {
            (TokenKind::Punctuation, "(") => {
                if self.function_type_ahead() {
                    self.parse_signature(refs, true)
                } else {
                    self.advance();
                    self.parse_type(refs)?;
                    self.expect_operator(")")?;
                    Ok(())
                }
            }
            (TokenKind::Operator, "<") => self.parse_signature(refs, true),
            (TokenKind::Keyword, "new") => {
                self.advance();
                self.parse_signature(refs, true)
            }
            (TokenKind::Keyword, "abstract") if self.peek_is(1, "new") => {
                self.advance();
                self.advance();
                self.parse_signature(refs, true)
            }
            (TokenKind::Punctuation, "{") => self.parse_object_type(refs),
            (TokenKind::Punctuation, "[") => self.parse_tuple_type(refs),
            (TokenKind::String | TokenKind::Number, _) => {
                self.advance();
                Ok(())
            }
            (TokenKind::Operator, "-") if self.peek(1).is_some_and(|t| t.kind == TokenKind::Number) => {
                self.advance();
                self.advance();
                Ok(())
            }
            (TokenKind::Keyword, "import") => self.parse_import_type(),
            (TokenKind::Keyword, "void" | "null" | "this" | "true" | "false") => {
                self.advance();
                Ok(())
            }
            (TokenKind::Identifier | TokenKind::Keyword, _) if tok.is_binding_name() => {
                self.advance();
                if !keywords::is_primitive_type(&tok.value) {
                    refs.push(self.leaf(NodeKind::Identifier, tok));
                }
                self.skip_qualified_tail()?;
                if self.at("<") && !self.at_line_break() {
                    self.parse_type_argument_list(refs)?;
                }
                Ok(())
            }
            _ => Err(self.error("type")),
        }
    }

    /// `.b.c` after a type name. Only the head of a qualified name resolves.
    fn skip_qualified_tail(&mut self) -> ParseResult<()> {
        while self.at(".") && self.peek(1).is_some_and(Token::is_word) {
            self.advance();
            self.expect_word()?;
        }
        Ok(())
    }

    fn parse_import_type(&mut self) -> ParseResult<()> {
        self.expect_keyword("import")?;
        self.expect_operator("(")?;
        if !self.at_kind(TokenKind::String) {
            return Err(self.error("module specifier"));
        }
        self.advance();
        self.expect_operator(")")?;
        self.skip_qualified_tail()
    }

    fn function_type_ahead(&self) -> bool {
        self.matching_close(self.pos)
            .is_some_and(|close| self.tokens.get(close + 1).is_some_and(|t| t.is_symbol("=>")))
    }

    /// `<T>(a: A, b?: B) => R` (arrow) or `(a: A): R` (member signature).
    /// Parameter names are skipped; only their types are collected.
    fn parse_signature(&mut self, refs: &mut Vec<NodeId>, arrow: bool) -> ParseResult<()> {
        let type_params = self.parse_type_parameters()?;
        refs.extend(type_params);

        self.expect_operator("(")?;
        while !self.at(")") {
            self.eat("...");
            if self.at("{") || self.at("[") {
                self.skip_balanced()?;
            } else {
                self.expect_word()?;
            }
            self.eat("?");
            if self.eat(":") {
                self.parse_type(refs)?;
            }
            if !self.eat(",") {
                break;
            }
        }
        self.expect_operator(")")?;

        if arrow {
            self.expect_operator("=>")?;
            self.parse_type_or_predicate(refs)
        } else if self.eat(":") {
            self.parse_type_or_predicate(refs)
        } else {
            Ok(())
        }
    }

    fn parse_object_type(&mut self, refs: &mut Vec<NodeId>) -> ParseResult<()> {
        self.expect_operator("{")?;
        while !self.at("}") {
            if self.is_eof() {
                return Err(self.error("'}'"));
            }
            self.parse_type_member(refs)?;
            if !self.eat(";") && !self.eat(",") && !self.at("}") && !self.at_line_break() {
                return Err(self.error("';'"));
            }
        }
        self.expect_operator("}")?;
        Ok(())
    }

    /// One member of an object type literal. Names are not collected.
    fn parse_type_member(&mut self, refs: &mut Vec<NodeId>) -> ParseResult<()> {
        if self.at("+") || self.at("-") {
            self.advance();
        }
        if self.at("readonly") && self.peek(1).is_some_and(|t| t.is_word() || t.is_symbol("[")) {
            self.advance();
        }

        // mapped type: [K in Keys as Name]?: T
        if self.at("[") && self.peek(1).is_some_and(Token::is_word) && self.peek_is(2, "in") {
            self.advance();
            self.advance();
            self.advance();
            self.parse_type(refs)?;
            if self.eat("as") {
                self.parse_type(refs)?;
            }
            self.expect_operator("]")?;
            if self.at("+") || self.at("-") {
                self.advance();
            }
            self.eat("?");
            if self.eat(":") {
                self.parse_type(refs)?;
            }
            return Ok(());
        }

        if self.at("(") || self.at("<") {
            return self.parse_signature(refs, false);
        }
        if self.at("new") && (self.peek_is(1, "(") || self.peek_is(1, "<")) {
            self.advance();
            return self.parse_signature(refs, false);
        }

        if self.at("[") {
            // index signature or computed key
            if self.peek(1).is_some_and(Token::is_word) && self.peek_is(2, ":") {
                self.advance();
                self.advance();
                self.advance();
                self.parse_type(refs)?;
                self.expect_operator("]")?;
            } else {
                self.skip_balanced()?;
            }
        } else {
            if (self.at("get") || self.at("set")) && self.peek(1).is_some_and(Token::is_word) {
                self.advance();
            }
            match self.current() {
                Some(t) if t.is_word() || matches!(t.kind, TokenKind::String | TokenKind::Number) => {
                    self.advance();
                }
                _ => return Err(self.error("property name")),
            }
        }

        self.eat("?");
        if self.at("(") || self.at("<") {
            self.parse_signature(refs, false)
        } else if self.eat(":") {
            self.parse_type(refs)
        } else {
            Ok(())
        }
    }

    fn parse_tuple_type(&mut self, refs: &mut Vec<NodeId>) -> ParseResult<()> {
        self.expect_operator("[")?;
        while !self.at("]") {
            self.eat("...");
            let labelled = self.at_word()
                && (self.peek_is(1, ":") || (self.peek_is(1, "?") && self.peek_is(2, ":")));
            if labelled {
                self.advance();
                self.eat("?");
                self.expect_operator(":")?;
                self.eat("...");
            }
            self.parse_type(refs)?;
            self.eat("?");
            if !self.eat(",") {
                break;
            }
        }
        self.expect_operator("]")?;
        Ok(())
    }

    /// Index of the bracket closing the one at `open`.
    pub(super) fn matching_close(&self, open: usize) -> Option<usize> {
        self.closers.get(open).copied().flatten()
    }

    /// Skip a bracketed group without building nodes.
    pub(super) fn skip_balanced(&mut self) -> ParseResult<()> {
        let Some(close) = self.matching_close(self.pos) else {
            return Err(self.error("closing bracket"));
        };
        while self.pos <= close {
            self.advance();
        }
        Ok(())
    }
}

/// Render a token run as compact source-like text.
pub(super) fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token> = None;
    for tok in tokens {
        if prev.is_some_and(|p| needs_space(p, tok)) {
            out.push(' ');
        }
        out.push_str(&tok.value);
        prev = Some(tok);
    }
    out
}

fn needs_space(prev: &Token, next: &Token) -> bool {
    let symbol = |t: &Token| matches!(t.kind, TokenKind::Operator | TokenKind::Punctuation);
    if !symbol(prev) && !symbol(next) {
        return true;
    }
    (symbol(next) && matches!(next.value.as_str(), "|" | "&" | "=>" | "=" | "{"))
        || (symbol(prev) && matches!(prev.value.as_str(), "," | ":" | "|" | "&" | "=>" | "=" | "{"))
        || (symbol(next) && next.value == "}")
}

#[cfg(test)]
mod tests {
    use crate::syntax::ast::{Ast, NodeKind};
    use crate::syntax::{parse, tokenize};
    use rstest::rstest;

    fn annotations(src: &str) -> (Ast, Vec<crate::syntax::ast::NodeId>) {
        let ast = parse(&tokenize(src), "t.ts", "typescript").unwrap();
        let found = ast
            .nodes()
            .filter(|n| n.kind == NodeKind::TypeAnnotation)
            .map(|n| n.id)
            .collect();
        (ast, found)
    }

    /// Identifiers under any annotation, in source order.
    fn referenced_names(src: &str) -> Vec<String> {
        let (ast, _) = annotations(src);
        ast.walk()
            .into_iter()
            .filter(|&id| {
                ast.kind(id) == NodeKind::Identifier
                    && ast.ancestors(id).any(|a| a.kind == NodeKind::TypeAnnotation)
            })
            .map(|id| ast.node(id).text.to_string())
            .collect()
    }

    #[rstest]
    #[case("let a: string;", vec![])]
    #[case("let a: Foo;", vec!["Foo"])]
    #[case("let a: Foo | Bar[];", vec!["Foo", "Bar"])]
    #[case("let a: Map<string, Array<Item>>;", vec!["Map", "Array", "Item"])]
    #[case("let a: (x: Input) => Output;", vec!["Input", "Output"])]
    #[case("let a: { name: Name; go(n: number): void };", vec!["Name"])]
    #[case("let a: [Head, ...Tail[]];", vec!["Head", "Tail"])]
    #[case("let a: keyof typeof config;", vec!["config"])]
    #[case("let a: ns.Inner;", vec!["ns"])]
    #[case("type M<T> = { [K in keyof T]?: T[K] };", vec!["T", "T", "K"])]
    #[case("type C<T> = T extends string ? Yes : No;", vec!["T", "Yes", "No"])]
    fn test_type_references(#[case] src: &str, #[case] expected: Vec<&str>) {
        assert_eq!(referenced_names(src), expected);
    }

    #[test]
    fn test_annotation_text_is_rendered() {
        let (ast, anns) = annotations("let a: Map<string, number[]> = x;");
        assert_eq!(ast.node(anns[0]).text, "Map<string, number[]>");
    }

    #[test]
    fn test_nested_generic_close_is_split() {
        let (ast, anns) = annotations("let a: A<B<C>>; let b: D;");
        assert_eq!(anns.len(), 2);
        assert_eq!(ast.node(anns[1]).text, "D");
    }

    #[test]
    fn test_type_parameters_become_nodes() {
        let ast = parse(
            &tokenize("function id<T extends Base = Default>(x: T): T { return x; }"),
            "t.ts",
            "typescript",
        )
        .unwrap();
        let tp = ast
            .nodes()
            .find(|n| n.kind == NodeKind::TypeParameter)
            .unwrap();
        assert_eq!(tp.text, "T");
        assert_eq!(tp.children.len(), 2);
    }

    #[test]
    fn test_type_predicate_return() {
        let (ast, anns) = annotations("function isFoo(x: unknown): x is Foo { return true; }");
        let ret = ast.node(*anns.last().unwrap());
        assert_eq!(ret.text, "x is Foo");
        assert_eq!(ret.children.len(), 1);
    }
}
