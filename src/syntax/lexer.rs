//! Lexer: source text to a flat token stream.
//!
//! Built on a `logos` state machine. Whitespace and comments are skipped,
//! strings and block comments are finished by callbacks so that unterminated
//! forms end where the surface grammar says they do. Anything the state
//! machine cannot match becomes a single-character token, so [`tokenize`] is
//! total over its input.

use logos::{Lexer as RawLexer, Logos, Skip};
use smol_str::SmolStr;

use crate::base::{LineIndex, Range, TextSize};
use super::keywords;

/// Token category.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenKind {
    Identifier,
    Keyword,
    Number,
    String,
    Operator,
    Punctuation,
}

/// A lexed token. `value` is the raw source slice (strings keep their quotes).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    pub kind: TokenKind,
    pub value: SmolStr,
    pub range: Range,
}

impl Token {
    /// Whether this is an operator or punctuation token with the given text.
    pub fn is_symbol(&self, text: &str) -> bool {
        matches!(self.kind, TokenKind::Operator | TokenKind::Punctuation) && self.value == text
    }

    /// Whether this is the keyword `word`.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.value == word
    }

    /// Identifier or keyword: anything that can name a property.
    pub fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Identifier | TokenKind::Keyword)
    }

    /// Identifier or contextual keyword: anything that can name a binding.
    pub fn is_binding_name(&self) -> bool {
        match self.kind {
            TokenKind::Identifier => true,
            TokenKind::Keyword => keywords::is_contextual(&self.value),
            _ => false,
        }
    }
}

/// Raw token categories produced by the logos state machine.
#[derive(Logos, Copy, Clone, Debug, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\x0B\x0C]+")]
#[logos(skip r"//[^\n]*")]
enum RawKind {
    #[token("/*", block_comment)]
    BlockComment,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Word,

    #[regex(r"[0-9][0-9.eExXa-fA-F]*")]
    Number,

    #[token("\"", |lex| quoted(lex, '"'))]
    #[token("'", |lex| quoted(lex, '\''))]
    #[token("`", |lex| quoted(lex, '`'))]
    String,

    // three-character operators
    #[token("===")]
    #[token("!==")]
    #[token("**=")]
    #[token("<<=")]
    #[token(">>=")]
    #[token(">>>")]
    #[token("...")]
    #[token("&&=")]
    #[token("||=")]
    #[token("??=")]
    // two-character operators
    #[token("=>")]
    #[token("==")]
    #[token("!=")]
    #[token("<=")]
    #[token(">=")]
    #[token("&&")]
    #[token("||")]
    #[token("??")]
    #[token("?.")]
    #[token("++")]
    #[token("--")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("%=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    #[token("**")]
    #[token("<<")]
    #[token(">>")]
    // single-character operators
    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("%")]
    #[token("=")]
    #[token("<")]
    #[token(">")]
    #[token("!")]
    #[token("&")]
    #[token("|")]
    #[token("^")]
    #[token("~")]
    #[token("?")]
    #[token(":")]
    #[token("@")]
    #[token("#")]
    Operator,

    #[token("(")]
    #[token(")")]
    #[token("{")]
    #[token("}")]
    #[token("[")]
    #[token("]")]
    #[token(";")]
    #[token(",")]
    #[token(".")]
    Punctuation,

    #[regex(r"[^\x00-\x7F]")]
    NonAscii,
}

/// Skip to the closing `*/`, or to end of input when there is none.
fn block_comment(lex: &mut RawLexer<RawKind>) -> Skip {
    let rest = lex.remainder();
    let len = rest.find("*/").map_or(rest.len(), |end| end + 2);
    lex.bump(len);
    Skip
}

/// Finish a string literal opened by `quote`.
///
/// A backslash escapes the following character. `"` and `'` strings stop
/// before an unescaped newline; template strings may span lines.
fn quoted(lex: &mut RawLexer<RawKind>, quote: char) -> bool {
    let rest = lex.remainder();
    let mut chars = rest.char_indices();
    let mut len = rest.len();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                if chars.next().is_none() {
                    len = i + 1;
                    break;
                }
            }
            '\n' if quote != '`' => {
                len = i;
                break;
            }
            c if c == quote => {
                len = i + c.len_utf8();
                break;
            }
            _ => {}
        }
    }

    lex.bump(len);
    true
}

const PUNCTUATION: &[char] = &['(', ')', '{', '}', '[', ']', ';', ',', '.'];

/// Convert source text into tokens. Never fails.
pub fn tokenize(content: &str) -> Vec<Token> {
    let index = LineIndex::new(content);
    let range = |start: usize, end: usize| {
        Range::new(
            index.position(TextSize::from(start as u32)),
            index.position(TextSize::from(end as u32)),
        )
    };

    let mut tokens = Vec::new();
    let mut lex = RawKind::lexer(content);

    while let Some(result) = lex.next() {
        let span = lex.span();
        let text = lex.slice();

        match result {
            Ok(raw) => {
                let kind = match raw {
                    RawKind::Word if keywords::is_keyword(text) => TokenKind::Keyword,
                    RawKind::Word => TokenKind::Identifier,
                    RawKind::Number => TokenKind::Number,
                    RawKind::String => TokenKind::String,
                    RawKind::Operator | RawKind::NonAscii => TokenKind::Operator,
                    RawKind::Punctuation => TokenKind::Punctuation,
                    // skipped by its callback
                    RawKind::BlockComment => continue,
                };
                tokens.push(Token {
                    kind,
                    value: SmolStr::new(text),
                    range: range(span.start, span.end),
                });
            }
            Err(()) => {
                // one token per unmatched character
                for (i, c) in text.char_indices() {
                    let start = span.start + i;
                    let kind = if PUNCTUATION.contains(&c) {
                        TokenKind::Punctuation
                    } else {
                        TokenKind::Operator
                    };
                    tokens.push(Token {
                        kind,
                        value: SmolStr::new(c.encode_utf8(&mut [0; 4])),
                        range: range(start, start + c.len_utf8()),
                    });
                }
            }
        }
    }

    tracing::trace!(count = tokens.len(), "tokenized");
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).into_iter().map(|t| t.kind).collect()
    }

    fn values(src: &str) -> Vec<String> {
        tokenize(src).into_iter().map(|t| t.value.to_string()).collect()
    }

    #[test]
    fn test_identifiers_and_keywords() {
        assert_eq!(
            kinds("const $x = _y;"),
            vec![
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::Identifier,
                TokenKind::Punctuation,
            ]
        );
    }

    #[test]
    fn test_positions_track_lines() {
        let tokens = tokenize("let a\n  = 1;");
        let eq = &tokens[2];
        assert_eq!(eq.value, "=");
        assert_eq!(eq.range.start.line_col(), (2, 3));
        assert_eq!(eq.range.end.line_col(), (2, 4));
        assert_eq!(u32::from(eq.range.start.offset), 8);
    }

    #[test]
    fn test_comments_are_skipped() {
        let src = "a // line\n/* block\n comment */ b";
        let tokens = tokenize(src);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].value, "b");
        assert_eq!(tokens[1].range.start.line_col(), (3, 13));
    }

    #[test]
    fn test_unterminated_block_comment_runs_to_end() {
        assert_eq!(values("a /* never closed\n b c"), vec!["a"]);
    }

    #[rstest]
    #[case("0x1F", "0x1F")]
    #[case("1.5e10", "1.5e10")]
    #[case("42", "42")]
    fn test_numbers(#[case] src: &str, #[case] expected: &str) {
        let tokens = tokenize(src);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].value, expected);
    }

    #[test]
    fn test_strings_with_escapes() {
        let tokens = tokenize(r#"'it\'s' "a\"b""#);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].value, r#"'it\'s'"#);
        assert_eq!(tokens[1].value, r#""a\"b""#);
    }

    #[test]
    fn test_unterminated_string_stops_at_line_end() {
        let tokens = tokenize("\"open\nnext");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].value, "\"open");
        assert_eq!(tokens[1].value, "next");
        assert_eq!(tokens[1].range.start.line, 2);
    }

    #[test]
    fn test_template_spans_lines() {
        let tokens = tokenize("`a\nb` c");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[1].range.start.line_col(), (2, 4));
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(values("a === b"), vec!["a", "===", "b"]);
        assert_eq!(values("x => x"), vec!["x", "=>", "x"]);
        assert_eq!(values("a!==b"), vec!["a", "!==", "b"]);
        assert_eq!(values("...rest"), vec!["...", "rest"]);
        assert_eq!(values("a?.b"), vec!["a", "?.", "b"]);
    }

    #[test]
    fn test_unknown_characters_become_single_tokens() {
        let tokens = tokenize("a \u{00e9}\u{00e9} b");
        assert_eq!(values("a \u{00e9}\u{00e9} b"), vec!["a", "\u{00e9}", "\u{00e9}", "b"]);
        assert_eq!(tokens[1].kind, TokenKind::Operator);
        assert_eq!(tokens[2].range.start.column, 5);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n\t ").is_empty());
    }
}
