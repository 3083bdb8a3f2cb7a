//! Analysis inputs supplied by the editor.

use std::path::Path;
use std::sync::Arc;

use smol_str::SmolStr;

/// A file to analyze.
///
/// `version` is an opaque counter the caller bumps on every edit. It is only
/// compared for equality when deciding whether a cached model is current.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceFile {
    pub uri: SmolStr,
    pub content: Arc<str>,
    pub language: SmolStr,
    pub version: u64,
}

impl SourceFile {
    pub fn new(
        uri: impl Into<SmolStr>,
        content: impl Into<Arc<str>>,
        language: impl Into<SmolStr>,
        version: u64,
    ) -> Self {
        Self {
            uri: uri.into(),
            content: content.into(),
            language: language.into(),
            version,
        }
    }

    /// Create a file whose language is inferred from the uri's extension.
    pub fn from_uri(uri: impl Into<SmolStr>, content: impl Into<Arc<str>>, version: u64) -> Self {
        let uri = uri.into();
        let language = language_for_path(Path::new(uri.as_str())).unwrap_or("typescript");
        Self::new(uri, content, language, version)
    }

    /// The same file with new content and the next version.
    pub fn edited(&self, content: impl Into<Arc<str>>) -> Self {
        Self {
            uri: self.uri.clone(),
            content: content.into(),
            language: self.language.clone(),
            version: self.version + 1,
        }
    }
}

/// Language id for a source path, if the extension is one we analyze.
pub fn language_for_path(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()? {
        "ts" | "mts" | "cts" => Some("typescript"),
        "tsx" => Some("typescriptreact"),
        "js" | "mjs" | "cjs" => Some("javascript"),
        "jsx" => Some("javascriptreact"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("src/a.ts", Some("typescript"))]
    #[case("src/a.cts", Some("typescript"))]
    #[case("src/view.tsx", Some("typescriptreact"))]
    #[case("lib/index.js", Some("javascript"))]
    #[case("README.md", None)]
    #[case("Makefile", None)]
    fn test_language_for_path(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(language_for_path(Path::new(path)), expected);
    }

    #[test]
    fn test_edited_bumps_version() {
        let file = SourceFile::from_uri("file:///a.ts", "let a;", 3);
        let next = file.edited("let b;");
        assert_eq!(next.version, 4);
        assert_eq!(next.uri, file.uri);
        assert_eq!(&*next.content, "let b;");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_source_file_serde() {
        let file = SourceFile::from_uri("file:///a.ts", "let a;", 2);
        let json = serde_json::to_string(&file).unwrap();
        assert!(json.contains(r#""content":"let a;""#), "{json}");
        let back: SourceFile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, file);
    }
}
