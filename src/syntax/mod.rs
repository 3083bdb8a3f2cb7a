// Lexer, parser and syntax tree for the TypeScript-like surface grammar
pub mod ast;
pub mod keywords;
pub mod lexer;
pub mod parser;

pub use ast::{Ast, AstNode, NodeId, NodeKind};
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::{MAX_NESTING, MAX_TREE_DEPTH, ParseError, ParseResult, parse, parse_source};
