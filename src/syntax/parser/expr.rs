//! Expressions: a precedence ladder from sequence down to primary.

use smol_str::SmolStr;

use super::{ParseResult, Parser};
use crate::syntax::ast::{NodeId, NodeKind};
use crate::syntax::lexer::{Token, TokenKind};

const ASSIGNMENT_OPERATORS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "**=", "<<=", ">>=", "&=", "|=", "^=", "&&=", "||=", "??=",
];

/// Precedence of `as` / `satisfies`, same level as relational operators.
const AS_PRECEDENCE: u8 = 8;

fn binary_precedence(tok: &Token) -> Option<u8> {
    let prec = match (tok.kind, tok.value.as_str()) {
        (TokenKind::Operator, "??") => 1,
        (TokenKind::Operator, "||") => 2,
        (TokenKind::Operator, "&&") => 3,
        (TokenKind::Operator, "|") => 4,
        (TokenKind::Operator, "^") => 5,
        (TokenKind::Operator, "&") => 6,
        (TokenKind::Operator, "==" | "!=" | "===" | "!==") => 7,
        (TokenKind::Operator, "<" | ">" | "<=" | ">=") => 8,
        (TokenKind::Keyword, "instanceof" | "in") => 8,
        (TokenKind::Operator, "<<" | ">>" | ">>>") => 9,
        (TokenKind::Operator, "+" | "-") => 10,
        (TokenKind::Operator, "*" | "/" | "%") => 11,
        (TokenKind::Operator, "**") => 12,
        _ => return None,
    };
    Some(prec)
}

impl Parser<'_> {
    /// Comma-separated expressions.
    pub(super) fn parse_expression(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        let first = self.parse_assignment()?;
        if !self.at(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(",") {
            items.push(self.parse_assignment()?);
        }
        Ok(self.finish(NodeKind::SequenceExpression, start, "", items))
    }

    pub(super) fn parse_assignment(&mut self) -> ParseResult<NodeId> {
        self.nested(Self::parse_assignment_expression)
    }

    fn parse_assignment_expression(&mut self) -> ParseResult<NodeId> {
        if self.arrow_ahead() {
            return self.parse_arrow_function();
        }
        if self.at("yield") && self.at_kind(TokenKind::Keyword) {
            return self.parse_yield();
        }

        let start = self.start();
        let target = self.parse_conditional()?;
        let Some(op) = self
            .current()
            .filter(|t| t.kind == TokenKind::Operator && ASSIGNMENT_OPERATORS.contains(&t.value.as_str()))
        else {
            return Ok(target);
        };
        if self.split_gt > 0 {
            return Ok(target);
        }
        self.advance();
        let value = self.parse_assignment()?;
        Ok(self.finish(NodeKind::AssignmentExpression, start, op.value.clone(), vec![target, value]))
    }

    fn parse_yield(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.advance();
        let text = if self.eat("*") { "yield*" } else { "yield" };
        let mut children = Vec::new();
        let operand_follows = self.current().is_some_and(|t| {
            !matches!(t.value.as_str(), ")" | "]" | "}" | "," | ";" | ":")
                || matches!(t.kind, TokenKind::String | TokenKind::Number)
        });
        if operand_follows && !self.at_line_break() {
            children.push(self.parse_assignment()?);
        }
        Ok(self.finish(NodeKind::UnaryExpression, start, text, children))
    }

    fn parse_conditional(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        let test = self.parse_binary(1)?;
        if !self.at("?") {
            return Ok(test);
        }
        self.advance();
        let saved = std::mem::replace(&mut self.no_in, false);
        let consequent = self.parse_assignment()?;
        self.no_in = saved;
        self.expect_operator(":")?;
        let alternate = self.parse_assignment()?;
        Ok(self.finish(
            NodeKind::ConditionalExpression,
            start,
            "",
            vec![test, consequent, alternate],
        ))
    }

    /// Precedence climbing over binary operators. `**` is right-associative.
    fn parse_binary(&mut self, min_prec: u8) -> ParseResult<NodeId> {
        let start = self.start();
        let mut left = self.parse_unary()?;

        loop {
            let Some(tok) = self.current() else {
                break;
            };
            if self.split_gt > 0 {
                break;
            }

            if (tok.is_keyword("as") || tok.is_keyword("satisfies"))
                && min_prec <= AS_PRECEDENCE
                && !self.at_line_break()
            {
                self.advance();
                let ty = if self.at("const") {
                    let Some(konst) = self.advance() else {
                        return Err(self.error("type"));
                    };
                    self.alloc(NodeKind::TypeAnnotation, konst.range, konst.value.clone(), Vec::new())
                } else {
                    self.parse_type_annotation()?
                };
                left = self.finish(NodeKind::AsExpression, start, tok.value.clone(), vec![left, ty]);
                continue;
            }

            let Some(prec) = binary_precedence(tok) else {
                break;
            };
            if prec < min_prec || (self.no_in && tok.is_keyword("in")) {
                break;
            }
            self.advance();
            let next_min = if tok.value == "**" { prec } else { prec + 1 };
            let right = self.nested(|p| p.parse_binary(next_min))?;
            left = self.finish(NodeKind::BinaryExpression, start, tok.value.clone(), vec![left, right]);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        let Some(tok) = self.current() else {
            return Err(self.error("expression"));
        };

        let unary = match (tok.kind, tok.value.as_str()) {
            (TokenKind::Operator, "!" | "-" | "+" | "~") => true,
            (TokenKind::Keyword, "typeof" | "void" | "delete") => true,
            (TokenKind::Keyword, "await") => self.peek(1).is_some_and(|next| {
                !next.is_symbol(")")
                    && !next.is_symbol("]")
                    && !next.is_symbol("}")
                    && !next.is_symbol(",")
                    && !next.is_symbol(";")
                    && !next.is_symbol(":")
                    && !next.is_symbol("=")
                    && !next.is_symbol("=>")
                    && !next.is_symbol(".")
            }),
            _ => false,
        };
        if unary {
            self.advance();
            let operand = self.nested(Self::parse_unary)?;
            return Ok(self.finish(NodeKind::UnaryExpression, start, tok.value.clone(), vec![operand]));
        }

        if tok.is_symbol("++") || tok.is_symbol("--") {
            self.advance();
            let operand = self.nested(Self::parse_unary)?;
            return Ok(self.finish(NodeKind::UpdateExpression, start, tok.value.clone(), vec![operand]));
        }

        let expr = self.parse_left_hand_side()?;
        if let Some(op) = self
            .current()
            .filter(|t| t.is_symbol("++") || t.is_symbol("--"))
        {
            if !self.at_line_break() {
                self.advance();
                return Ok(self.finish(NodeKind::UpdateExpression, start, op.value.clone(), vec![expr]));
            }
        }
        Ok(expr)
    }

    /// Member access, calls, indexing and non-null assertions.
    fn parse_left_hand_side(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        let mut expr = if self.at("new") {
            self.nested(Self::parse_new)?
        } else {
            self.parse_primary()?
        };

        loop {
            let Some(tok) = self.current() else {
                break;
            };
            if tok.is_symbol(".") {
                self.advance();
                let name = self.parse_member_name()?;
                let text = self.text_of(name);
                expr = self.finish(NodeKind::MemberExpression, start, text, vec![expr, name]);
            } else if tok.is_symbol("?.") {
                self.advance();
                if self.at("(") {
                    let mut children = vec![expr];
                    children.extend(self.parse_arguments()?);
                    expr = self.finish(NodeKind::CallExpression, start, "?.", children);
                } else if self.at("[") {
                    let index = self.parse_index()?;
                    expr = self.finish(NodeKind::IndexExpression, start, "?.", vec![expr, index]);
                } else {
                    let name = self.parse_member_name()?;
                    let text = self.text_of(name);
                    expr = self.finish(NodeKind::MemberExpression, start, text, vec![expr, name]);
                }
            } else if tok.is_symbol("[") {
                let index = self.parse_index()?;
                expr = self.finish(NodeKind::IndexExpression, start, "", vec![expr, index]);
            } else if tok.is_symbol("(") {
                let mut children = vec![expr];
                children.extend(self.parse_arguments()?);
                expr = self.finish(NodeKind::CallExpression, start, "", children);
            } else if tok.is_symbol("<") && self.type_arguments_ahead() {
                let mut children = vec![expr, self.parse_type_arguments()?];
                if self.at("(") {
                    children.extend(self.parse_arguments()?);
                } else if let Some(template) = self.current().filter(|t| t.kind == TokenKind::String) {
                    self.advance();
                    children.push(self.leaf(NodeKind::StringLiteral, template));
                }
                expr = self.finish(NodeKind::CallExpression, start, "", children);
            } else if tok.kind == TokenKind::String && tok.value.starts_with('`') && !self.at_line_break() {
                // tagged template
                self.advance();
                let template = self.leaf(NodeKind::StringLiteral, tok);
                expr = self.finish(NodeKind::CallExpression, start, "", vec![expr, template]);
            } else if tok.is_symbol("!") && !self.at_line_break() {
                self.advance();
                expr = self.finish(NodeKind::NonNullExpression, start, "!", vec![expr]);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    /// The base after `extends`: a name, a member chain or a mixin call such
    /// as `Mixin(Base)`. Stops before type arguments and the class body.
    pub(super) fn parse_heritage_expression(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(".") {
                let name = self.parse_member_name()?;
                let text = self.text_of(name);
                expr = self.finish(NodeKind::MemberExpression, start, text, vec![expr, name]);
            } else if self.at("(") {
                let mut children = vec![expr];
                children.extend(self.parse_arguments()?);
                expr = self.finish(NodeKind::CallExpression, start, "", children);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    /// Property after `.`: any word, or a `#private` name.
    fn parse_member_name(&mut self) -> ParseResult<NodeId> {
        if self.at("#") {
            return self.parse_property_key();
        }
        let name = self.expect_word()?;
        Ok(self.alloc_property_name(name))
    }

    fn parse_index(&mut self) -> ParseResult<NodeId> {
        self.expect_operator("[")?;
        let saved = std::mem::replace(&mut self.no_in, false);
        let index = self.parse_expression()?;
        self.no_in = saved;
        self.expect_operator("]")?;
        Ok(index)
    }

    /// `(a, ...b)` call arguments.
    fn parse_arguments(&mut self) -> ParseResult<Vec<NodeId>> {
        self.expect_operator("(")?;
        let saved = std::mem::replace(&mut self.no_in, false);
        let mut args = Vec::new();
        while !self.at(")") {
            args.push(self.parse_spread_or_assignment()?);
            if !self.eat(",") {
                break;
            }
        }
        self.no_in = saved;
        self.expect_operator(")")?;
        Ok(args)
    }

    fn parse_spread_or_assignment(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        if self.eat("...") {
            let arg = self.parse_assignment()?;
            return Ok(self.finish(NodeKind::SpreadElement, start, "...", vec![arg]));
        }
        self.parse_assignment()
    }

    /// `new Callee<T>(args)`; arguments are optional.
    fn parse_new(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_keyword("new")?;
        if self.eat(".") {
            let meta = self.expect_word()?;
            let text = format!("new.{}", meta.value);
            return Ok(self.finish(NodeKind::PropertyName, start, text, Vec::new()));
        }

        let mut callee = if self.at("new") {
            self.nested(Self::parse_new)?
        } else {
            self.parse_primary()?
        };
        loop {
            if self.eat(".") {
                let name = self.parse_member_name()?;
                let text = self.text_of(name);
                callee = self.finish(NodeKind::MemberExpression, start, text, vec![callee, name]);
            } else if self.at("[") {
                let index = self.parse_index()?;
                callee = self.finish(NodeKind::IndexExpression, start, "", vec![callee, index]);
            } else {
                break;
            }
        }

        let mut children = vec![callee];
        if self.at("<") && self.angle_close(self.pos).is_some() {
            children.push(self.parse_type_arguments()?);
        }
        if self.at("(") {
            children.extend(self.parse_arguments()?);
        }
        Ok(self.finish(NodeKind::NewExpression, start, "new", children))
    }

    fn parse_primary(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        let Some(tok) = self.current() else {
            return Err(self.error("expression"));
        };

        match tok.kind {
            TokenKind::Number => {
                self.advance();
                return Ok(self.leaf(NodeKind::NumberLiteral, tok));
            }
            TokenKind::String => {
                self.advance();
                return Ok(self.leaf(NodeKind::StringLiteral, tok));
            }
            TokenKind::Keyword => match tok.value.as_str() {
                "true" | "false" => {
                    self.advance();
                    return Ok(self.leaf(NodeKind::BooleanLiteral, tok));
                }
                "null" => {
                    self.advance();
                    return Ok(self.leaf(NodeKind::NullLiteral, tok));
                }
                "this" => {
                    self.advance();
                    return Ok(self.leaf(NodeKind::ThisExpression, tok));
                }
                "super" => {
                    self.advance();
                    return Ok(self.leaf(NodeKind::SuperExpression, tok));
                }
                "function" => return self.parse_function_expression(),
                "async" if self.peek_is(1, "function") => return self.parse_function_expression(),
                "class" => return self.parse_class(NodeKind::ClassExpression, true),
                "import" => {
                    // `import(...)` and `import.meta`
                    self.advance();
                    return Ok(self.alloc_property_name(tok));
                }
                _ => {}
            },
            _ => {}
        }

        if tok.is_binding_name() {
            self.advance();
            return Ok(self.leaf(NodeKind::Identifier, tok));
        }
        if tok.is_symbol("(") {
            self.advance();
            let saved = std::mem::replace(&mut self.no_in, false);
            let inner = self.parse_expression()?;
            self.no_in = saved;
            self.expect_operator(")")?;
            return Ok(self.finish(NodeKind::ParenthesizedExpression, start, "", vec![inner]));
        }
        if tok.is_symbol("[") {
            return self.parse_array_literal();
        }
        if tok.is_symbol("{") {
            return self.parse_object_literal();
        }
        if tok.is_symbol("/") || tok.is_symbol("/=") {
            return self.parse_regex_literal();
        }
        if tok.is_symbol("@") {
            self.skip_decorators()?;
            return self.parse_class(NodeKind::ClassExpression, true);
        }
        Err(self.error("expression"))
    }

    /// Regex literals are not lexed; rejoin the tokens up to the closing `/`
    /// on the same line, plus adjacent flags.
    fn parse_regex_literal(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        let line = start.line;
        let mut text = String::new();
        let Some(open) = self.advance() else {
            return Err(self.error("expression"));
        };
        text.push_str(&open.value);

        loop {
            match self.current() {
                Some(t) if t.range.start.line == line => {
                    self.advance();
                    text.push_str(&t.value);
                    if t.kind == TokenKind::Operator && t.value.starts_with('/') {
                        break;
                    }
                }
                _ => return Err(self.error("'/'")),
            }
        }
        if let Some(flags) = self
            .current()
            .filter(|t| t.kind == TokenKind::Identifier && t.range.start == self.prev_end)
        {
            self.advance();
            text.push_str(&flags.value);
        }
        Ok(self.finish(NodeKind::StringLiteral, start, text, Vec::new()))
    }

    fn parse_array_literal(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_operator("[")?;
        let saved = std::mem::replace(&mut self.no_in, false);
        let mut elements = Vec::new();
        while !self.at("]") {
            if self.eat(",") {
                continue;
            }
            elements.push(self.parse_spread_or_assignment()?);
            if !self.at("]") {
                self.expect_operator(",")?;
            }
        }
        self.no_in = saved;
        self.expect_operator("]")?;
        Ok(self.finish(NodeKind::ArrayLiteral, start, "", elements))
    }

    fn parse_object_literal(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.expect_operator("{")?;
        let saved = std::mem::replace(&mut self.no_in, false);
        let mut members = Vec::new();
        while !self.at("}") {
            members.push(self.parse_object_member()?);
            if !self.eat(",") {
                break;
            }
        }
        self.no_in = saved;
        self.expect_operator("}")?;
        Ok(self.finish(NodeKind::ObjectLiteral, start, "", members))
    }

    /// `...spread`, `key: value`, `shorthand`, `method() {}`, `get x() {}`.
    fn parse_object_member(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        if self.eat("...") {
            let arg = self.parse_assignment()?;
            return Ok(self.finish(NodeKind::SpreadElement, start, "...", vec![arg]));
        }

        while (self.at("async") || self.at("get") || self.at("set"))
            && self.peek(1).is_some_and(|t| {
                t.is_word()
                    || matches!(t.kind, TokenKind::String | TokenKind::Number)
                    || t.is_symbol("[")
                    || t.is_symbol("*")
            })
        {
            self.advance();
        }
        self.eat("*");

        // shorthand `{ a }` / `{ a = 1 }`
        if self.at_binding_name()
            && self.peek(1).is_some_and(|t| t.is_symbol(",") || t.is_symbol("}") || t.is_symbol("="))
        {
            let Some(tok) = self.advance() else {
                return Err(self.error("property name"));
            };
            let mut children = vec![self.leaf(NodeKind::Identifier, tok)];
            if self.eat("=") {
                children.push(self.parse_assignment()?);
            }
            return Ok(self.finish(NodeKind::Property, start, tok.value.clone(), children));
        }

        let key = self.parse_property_key()?;
        let text: SmolStr = self.text_of(key);

        if self.at("(") || self.at("<") {
            let fn_start = self.start();
            let mut parts = Vec::new();
            self.parse_function_rest(&mut parts, false)?;
            let method = self.finish(NodeKind::FunctionExpression, fn_start, text.clone(), parts);
            return Ok(self.finish(NodeKind::Property, start, text, vec![key, method]));
        }

        self.expect_operator(":")?;
        let value = self.parse_assignment()?;
        Ok(self.finish(NodeKind::Property, start, text, vec![key, value]))
    }

    /// `[async] function [*] [name](params) { body }`
    fn parse_function_expression(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        self.eat("async");
        self.expect_keyword("function")?;
        self.eat("*");
        let mut children = Vec::new();
        let mut name = SmolStr::default();
        if let Some(tok) = self.current().filter(|t| t.is_binding_name()) {
            self.advance();
            name = tok.value.clone();
            children.push(self.leaf(NodeKind::Identifier, tok));
        }
        self.parse_function_rest(&mut children, false)?;
        Ok(self.finish(NodeKind::FunctionExpression, start, name, children))
    }

    // ── Arrow functions ──────────────────────────────────────────────────

    /// Whether an arrow function starts at the cursor.
    fn arrow_ahead(&self) -> bool {
        let mut i = self.pos;
        let Some(first) = self.tokens.get(i) else {
            return false;
        };
        if first.is_keyword("async") {
            let next = self.tokens.get(i + 1);
            let same_line = next.is_some_and(|n| n.range.start.line == first.range.end.line);
            if same_line
                && next.is_some_and(|n| n.is_binding_name() || n.is_symbol("(") || n.is_symbol("<"))
            {
                i += 1;
            }
        }

        let Some(tok) = self.tokens.get(i) else {
            return false;
        };
        if tok.is_binding_name() {
            return self.tokens.get(i + 1).is_some_and(|t| t.is_symbol("=>"));
        }
        let paren = if tok.is_symbol("<") {
            match self.angle_close(i) {
                Some(close) if self.tokens.get(close + 1).is_some_and(|t| t.is_symbol("(")) => close + 1,
                _ => return false,
            }
        } else if tok.is_symbol("(") {
            i
        } else {
            return false;
        };

        let Some(close) = self.matching_close(paren) else {
            return false;
        };
        match self.tokens.get(close + 1) {
            Some(t) if t.is_symbol("=>") => true,
            Some(t) if t.is_symbol(":") => self.return_type_then_arrow(close + 2),
            _ => false,
        }
    }

    /// Scan a return type annotation starting at `from` for a following `=>`.
    fn return_type_then_arrow(&self, from: usize) -> bool {
        let mut depth = 0usize;
        for tok in &self.tokens[from.min(self.tokens.len())..] {
            if !matches!(tok.kind, TokenKind::Operator | TokenKind::Punctuation) {
                continue;
            }
            match tok.value.as_str() {
                "(" | "[" | "{" | "<" => depth += 1,
                ")" | "]" | "}" | ">" => match depth.checked_sub(1) {
                    Some(d) => depth = d,
                    None => return false,
                },
                "=>" if depth == 0 => return true,
                ";" | "," | "=" if depth == 0 => return false,
                _ => {}
            }
        }
        false
    }

    fn parse_arrow_function(&mut self) -> ParseResult<NodeId> {
        let start = self.start();
        let text = if self.at("async") && !self.peek_is(1, "=>") {
            self.advance();
            "async"
        } else {
            ""
        };

        let mut children = self.parse_type_parameters()?;
        if self.at("(") {
            children.extend(self.parse_parameter_list()?);
        } else {
            let name = self.expect_identifier()?;
            let id = self.leaf(NodeKind::Identifier, name);
            let param = self.finish(NodeKind::Parameter, name.range.start, name.value.clone(), vec![id]);
            children.push(param);
        }
        if self.eat(":") {
            children.push(self.parse_return_type()?);
        }
        self.expect_operator("=>")?;

        let body = if self.at("{") {
            self.parse_block()?
        } else {
            let saved = std::mem::replace(&mut self.no_in, false);
            let body = self.parse_assignment();
            self.no_in = saved;
            body?
        };
        children.push(body);
        Ok(self.finish(NodeKind::ArrowFunction, start, text, children))
    }
}
