//! Property-based checks over generated programs.
//!
//! Programs are built from a small statement grammar over a fixed pool of
//! names, so declarations, shadowing and forward uses all occur often.
#![cfg(feature = "proptest")]

use proptest::prelude::*;
use sema::hir::SemanticAnalyzer;
use sema::syntax::parse_source;
use sema::{AnalyzerConfig, IndexerConfig, ProjectIndexer, SourceFile};

const URI: &str = "file:///gen.ts";

// ============================================================================
// PROPTEST STRATEGIES
// ============================================================================

fn arb_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "item", "total", "value"]).prop_map(String::from)
}

fn arb_expr() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        arb_name(),
        (0u32..100).prop_map(|n| n.to_string()),
        Just("\"text\"".to_string()),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("{l} + {r}")),
            (arb_name(), inner.clone()).prop_map(|(f, a)| format!("{f}({a})")),
            (arb_name(), arb_name()).prop_map(|(o, p)| format!("{o}.{p}")),
            inner.prop_map(|e| format!("({e})")),
        ]
    })
}

fn arb_statement() -> impl Strategy<Value = String> {
    let simple = prop_oneof![
        (prop::sample::select(vec!["const", "let", "var"]), arb_name(), arb_expr())
            .prop_map(|(kw, n, e)| format!("{kw} {n} = {e};")),
        arb_expr().prop_map(|e| format!("{e};")),
        (arb_name(), arb_expr()).prop_map(|(n, e)| format!("{n} = {e};")),
    ];
    simple.prop_recursive(2, 12, 4, |inner| {
        prop_oneof![
            (arb_name(), arb_name(), prop::collection::vec(inner.clone(), 0..4)).prop_map(
                |(f, p, body)| format!("function {f}({p}) {{\n{}\n}}", body.join("\n"))
            ),
            (arb_expr(), prop::collection::vec(inner.clone(), 0..3))
                .prop_map(|(c, body)| format!("if ({c}) {{\n{}\n}}", body.join("\n"))),
            (arb_name(), arb_expr(), prop::collection::vec(inner, 0..3)).prop_map(
                |(n, e, body)| format!("for (const {n} of {e}) {{\n{}\n}}", body.join("\n"))
            ),
        ]
    })
}

fn arb_program() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_statement(), 0..8).prop_map(|stmts| stmts.join("\n"))
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn test_generated_programs_parse(source in arb_program()) {
        prop_assert!(parse_source(&source, URI, "typescript").is_ok(), "{}", source);
    }

    #[test]
    fn test_tree_validity(source in arb_program()) {
        let ast = parse_source(&source, URI, "typescript").unwrap();
        let root = ast.root_id();
        for node in ast.nodes() {
            if node.id == root {
                prop_assert!(node.parent.is_none());
                continue;
            }
            let parent = node.parent.unwrap();
            prop_assert!(ast.node(parent).children.contains(&node.id));
            prop_assert!(ast.ancestors(node.id).all(|a| a.id != node.id));
        }
    }

    #[test]
    fn test_resolution_soundness(source in arb_program()) {
        let ast = parse_source(&source, URI, "typescript").unwrap();
        let model = SemanticAnalyzer::new(AnalyzerConfig::default()).analyze(&ast, URI);
        for reference in model.all_references() {
            let symbol = model.symbol(reference.symbol_id);
            prop_assert!(symbol.is_some());
            prop_assert!(symbol.unwrap().range.start <= reference.range.start);
        }
        for symbol in model.symbols() {
            prop_assert!(model.scopes().reaches_global(symbol.scope));
        }
    }

    #[test]
    fn test_indexing_is_deterministic(source in arb_program()) {
        let first = ProjectIndexer::new(IndexerConfig::default());
        let second = ProjectIndexer::new(IndexerConfig::default());
        let file = SourceFile::new(URI, source.as_str(), "typescript", 1);
        let a = first.index_file(&file).unwrap();
        let b = second.index_file(&file).unwrap();

        let shape = |m: &sema::SemanticModel| {
            m.symbols()
                .map(|s| (s.name.clone(), s.kind, s.range, m.references(s.id).len()))
                .collect::<Vec<_>>()
        };
        prop_assert_eq!(shape(&a), shape(&b));
    }
}
