//! Symbols and references produced by analysis.

use smol_str::SmolStr;

use crate::base::{Position, Range};
use super::ids::{ReferenceId, ScopeId, SymbolId};

/// The kind of a declared symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SymbolKind {
    Function,
    Class,
    Interface,
    /// Type alias.
    Type,
    Enum,
    Variable,
    Constant,
    Parameter,
    Property,
    Method,
    Namespace,
    Module,
    Import,
}

impl SymbolKind {
    /// Lowercase kind name, as used in symbol search filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Type => "type",
            Self::Enum => "enum",
            Self::Variable => "variable",
            Self::Constant => "constant",
            Self::Parameter => "parameter",
            Self::Property => "property",
            Self::Method => "method",
            Self::Namespace => "namespace",
            Self::Module => "module",
            Self::Import => "import",
        }
    }

    /// Get a display string for this kind (capitalized for UI display).
    pub fn display(&self) -> &'static str {
        match self {
            Self::Function => "Function",
            Self::Class => "Class",
            Self::Interface => "Interface",
            Self::Type => "Type alias",
            Self::Enum => "Enum",
            Self::Variable => "Variable",
            Self::Constant => "Constant",
            Self::Parameter => "Parameter",
            Self::Property => "Property",
            Self::Method => "Method",
            Self::Namespace => "Namespace",
            Self::Module => "Module",
            Self::Import => "Import",
        }
    }

    /// Whether this kind names a type (usable in annotations).
    pub fn is_type(&self) -> bool {
        matches!(self, Self::Class | Self::Interface | Self::Type | Self::Enum)
    }

    /// Parse a lowercase kind name.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "function" => Self::Function,
            "class" => Self::Class,
            "interface" => Self::Interface,
            "type" => Self::Type,
            "enum" => Self::Enum,
            "variable" => Self::Variable,
            "constant" => Self::Constant,
            "parameter" => Self::Parameter,
            "property" => Self::Property,
            "method" => Self::Method,
            "namespace" => Self::Namespace,
            "module" => Self::Module,
            "import" => Self::Import,
            _ => return None,
        };
        Some(kind)
    }
}

/// A named declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Symbol {
    pub id: SymbolId,
    pub name: SmolStr,
    pub kind: SymbolKind,
    /// Range of the declared name.
    pub range: Range,
    /// Range of the whole declaration.
    pub full_range: Range,
    /// Scope the symbol is declared in.
    pub scope: ScopeId,
    /// Rendered signature, e.g. `(a: number): number` or `: string`.
    pub type_signature: Option<String>,
    /// Text of the nearest preceding `/** ... */` comment.
    pub documentation: Option<String>,
    pub exported: bool,
    pub imported: bool,
    pub source_file: SmolStr,
}

impl Symbol {
    /// Whether `pos` lies on the declared name.
    pub fn contains(&self, pos: Position) -> bool {
        self.range.contains(pos)
    }
}

/// How a reference uses its symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ReferenceKind {
    Read,
    Write,
    Call,
    Import,
    Export,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Call => "call",
            Self::Import => "import",
            Self::Export => "export",
        }
    }
}

/// A resolved use site of a symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reference {
    pub id: ReferenceId,
    pub symbol_id: SymbolId,
    pub range: Range,
    pub kind: ReferenceKind,
    pub source_file: SmolStr,
}
