//! Keyword tables for the TypeScript-like surface grammar.

/// Reserved words. These can never be used as binding names.
pub const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw", "true", "try",
    "typeof", "var", "void", "while", "with",
];

/// Contextual keywords. Lexed as `Keyword`, but the parser accepts them
/// wherever an identifier is expected.
pub const CONTEXTUAL: &[&str] = &[
    "abstract", "accessor", "any", "as", "asserts", "async", "await", "boolean", "declare", "from",
    "get", "implements", "infer", "interface", "is", "keyof", "let", "module", "namespace",
    "never", "number", "object", "of", "override", "package", "private", "protected", "public",
    "readonly", "require", "satisfies", "set", "static", "string", "symbol", "type", "undefined",
    "unique", "unknown", "yield",
];

/// Built-in type names that never resolve to a user symbol.
pub const PRIMITIVE_TYPES: &[&str] = &[
    "any", "bigint", "boolean", "never", "null", "number", "object", "string", "symbol",
    "undefined", "unknown", "void", "this", "true", "false",
];

/// Whether `word` is lexed as a keyword.
pub fn is_keyword(word: &str) -> bool {
    RESERVED.contains(&word) || CONTEXTUAL.contains(&word)
}

/// Whether `word` is a contextual keyword (usable as an identifier).
pub fn is_contextual(word: &str) -> bool {
    CONTEXTUAL.contains(&word)
}

/// Whether `word` names a built-in type.
pub fn is_primitive_type(word: &str) -> bool {
    PRIMITIVE_TYPES.contains(&word)
}
