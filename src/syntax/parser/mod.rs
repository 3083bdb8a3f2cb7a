//! Recursive-descent parser producing an arena [`Ast`].
//!
//! One statement dispatcher keyed on the current keyword, a precedence ladder
//! for expressions and a small type-annotation grammar. Parsing is fail-fast:
//! the first structural mismatch aborts with a [`ParseError`] and no partial
//! tree is returned.

mod expr;
mod stmt;
mod types;

use smol_str::SmolStr;
use thiserror::Error;

use crate::base::{Position, Range};
use super::ast::{Ast, AstNode, NodeId, NodeKind};
use super::lexer::{Token, TokenKind};

/// A structural mismatch in the token stream.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{position}: expected {expected}, found {found}")]
pub struct ParseError {
    /// What the parser was looking for.
    pub expected: String,
    /// The offending token text, or `end of input`.
    pub found: String,
    /// Where the offending token starts.
    pub position: Position,
}

/// Convenient `Result` alias for parser productions.
pub type ParseResult<T> = Result<T, ParseError>;

/// Deepest recursion through nested statements, expressions, types and
/// patterns.
pub const MAX_NESTING: usize = 256;

/// Deepest node of an accepted tree. Tree walks recurse, so this also bounds
/// their stack use.
pub const MAX_TREE_DEPTH: usize = 1024;

/// Parse a token stream into a `Program` rooted tree.
pub fn parse(tokens: &[Token], source_file: &str, language: &str) -> ParseResult<Ast> {
    let mut parser = Parser::new(tokens);
    let root = parser.parse_program()?;
    check_tree_depth(&parser.nodes, root)?;
    Ok(Ast::new(parser.nodes, root, source_file, language))
}

/// Tokenize and parse `content`, keeping the source text on the tree.
pub fn parse_source(content: &str, source_file: &str, language: &str) -> ParseResult<Ast> {
    let tokens = super::lexer::tokenize(content);
    parse(&tokens, source_file, language).map(|ast| ast.with_source(content))
}

pub(crate) struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    nodes: Vec<AstNode>,
    /// End of the last consumed token.
    prev_end: Position,
    /// How many `>` of the current token were already used to close type
    /// arguments (`Array<Array<T>>` lexes the closer as one `>>`).
    split_gt: usize,
    /// Disallow `in` as a binary operator (for-in heads).
    no_in: bool,
    /// Current recursion depth, capped at [`MAX_NESTING`].
    depth: usize,
    /// Index of the bracket closing each `(`, `[` or `{` token.
    closers: Vec<Option<usize>>,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            nodes: Vec::with_capacity(tokens.len()),
            prev_end: Position::default(),
            split_gt: 0,
            no_in: false,
            depth: 0,
            closers: bracket_pairs(tokens),
        }
    }

    /// Run a production one nesting level deeper, failing past
    /// [`MAX_NESTING`].
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(format!("at most {MAX_NESTING} levels of nesting")));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_program(&mut self) -> ParseResult<NodeId> {
        let mut items = Vec::new();
        while !self.is_eof() {
            items.push(self.parse_statement()?);
        }
        let start = self
            .tokens
            .first()
            .map_or_else(Position::default, |t| t.range.start);
        Ok(self.finish(NodeKind::Program, start, "", items))
    }

    // ── Token access ─────────────────────────────────────────────────────

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn current(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn peek(&self, n: usize) -> Option<&'t Token> {
        self.tokens.get(self.pos + n)
    }

    /// Operator, punctuation or keyword with exactly this text.
    fn at(&self, text: &str) -> bool {
        self.peek_is(0, text)
    }

    fn peek_is(&self, n: usize, text: &str) -> bool {
        self.peek(n)
            .is_some_and(|t| t.kind != TokenKind::String && t.kind != TokenKind::Number && t.value == text)
    }

    fn at_kind(&self, kind: TokenKind) -> bool {
        self.current().is_some_and(|t| t.kind == kind)
    }

    fn at_binding_name(&self) -> bool {
        self.current().is_some_and(Token::is_binding_name)
    }

    fn at_word(&self) -> bool {
        self.current().is_some_and(Token::is_word)
    }

    /// Whether the current token starts a new line relative to the previous one.
    fn at_line_break(&self) -> bool {
        self.current()
            .is_none_or(|t| t.range.start.line > self.prev_end.line)
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        self.split_gt = 0;
        self.prev_end = token.range.end;
        Some(token)
    }

    fn eat(&mut self, text: &str) -> bool {
        if self.at(text) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume an operator or punctuation token, or fail.
    fn expect_operator(&mut self, text: &str) -> ParseResult<&'t Token> {
        match self.current() {
            Some(t) if t.is_symbol(text) => {
                self.advance();
                Ok(t)
            }
            _ => Err(self.error(format!("'{text}'"))),
        }
    }

    fn expect_keyword(&mut self, word: &str) -> ParseResult<&'t Token> {
        match self.current() {
            Some(t) if t.is_keyword(word) => {
                self.advance();
                Ok(t)
            }
            _ => Err(self.error(format!("'{word}'"))),
        }
    }

    /// Consume a binding name (identifier or contextual keyword), or fail.
    fn expect_identifier(&mut self) -> ParseResult<&'t Token> {
        match self.current() {
            Some(t) if t.is_binding_name() => {
                self.advance();
                Ok(t)
            }
            _ => Err(self.error("identifier")),
        }
    }

    /// Consume any word, including reserved ones (property names).
    fn expect_word(&mut self) -> ParseResult<&'t Token> {
        match self.current() {
            Some(t) if t.is_word() => {
                self.advance();
                Ok(t)
            }
            _ => Err(self.error("property name")),
        }
    }

    fn error(&self, expected: impl Into<String>) -> ParseError {
        let (found, position) = match self.current() {
            Some(t) => (format!("'{}'", t.value), t.range.start),
            None => ("end of input".to_string(), self.prev_end),
        };
        ParseError {
            expected: expected.into(),
            found,
            position,
        }
    }

    /// Mismatch reported at an already consumed token.
    fn error_at(&self, tok: &Token, expected: impl Into<String>) -> ParseError {
        ParseError {
            expected: expected.into(),
            found: format!("'{}'", tok.value),
            position: tok.range.start,
        }
    }

    /// Start position of the next production.
    fn start(&self) -> Position {
        self.current().map_or(self.prev_end, |t| t.range.start)
    }

    // ── Node allocation ──────────────────────────────────────────────────

    /// Allocate a node spanning `start` to the end of the last consumed token
    /// and adopt `children`.
    fn finish(
        &mut self,
        kind: NodeKind,
        start: Position,
        text: impl Into<SmolStr>,
        children: Vec<NodeId>,
    ) -> NodeId {
        let range = Range::new(start, self.prev_end.max(start));
        self.alloc(kind, range, text.into(), children)
    }

    /// Allocate a leaf node for a single token.
    fn leaf(&mut self, kind: NodeKind, token: &Token) -> NodeId {
        self.alloc(kind, token.range, token.value.clone(), Vec::new())
    }

    fn alloc(&mut self, kind: NodeKind, range: Range, text: SmolStr, children: Vec<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for &child in &children {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(AstNode {
            id,
            kind,
            range,
            text,
            parent: None,
            children,
        });
        id
    }

    fn text_of(&self, id: NodeId) -> SmolStr {
        self.nodes[id.index()].text.clone()
    }

    fn eat_semicolon(&mut self) {
        self.eat(";");
    }
}

/// Pair every opening bracket with its closer in one pass. Bracket kinds
/// are not distinguished, and unmatched closers are ignored.
fn bracket_pairs(tokens: &[Token]) -> Vec<Option<usize>> {
    let mut closers = vec![None; tokens.len()];
    let mut open = Vec::new();
    for (i, tok) in tokens.iter().enumerate() {
        if tok.kind != TokenKind::Punctuation {
            continue;
        }
        match tok.value.as_str() {
            "(" | "[" | "{" => open.push(i),
            ")" | "]" | "}" => {
                if let Some(o) = open.pop() {
                    closers[o] = Some(i);
                }
            }
            _ => {}
        }
    }
    closers
}

fn check_tree_depth(nodes: &[AstNode], root: NodeId) -> ParseResult<()> {
    let mut stack = vec![(root, 0usize)];
    while let Some((id, depth)) = stack.pop() {
        let Some(node) = nodes.get(id.index()) else {
            continue;
        };
        if depth > MAX_TREE_DEPTH {
            return Err(ParseError {
                expected: format!("at most {MAX_TREE_DEPTH} levels of nesting"),
                found: format!("{:?}", node.kind),
                position: node.range.start,
            });
        }
        stack.extend(node.children.iter().map(|&c| (c, depth + 1)));
    }
    Ok(())
}

/// Strip the quotes of a string token value.
pub(crate) fn unquote(value: &str) -> &str {
    let trimmed = value
        .strip_prefix(['"', '\'', '`'])
        .unwrap_or(value);
    trimmed
        .strip_suffix(['"', '\'', '`'])
        .unwrap_or(trimmed)
}
