//! Parser integration tests
//!
//! Tests parsing through the public API: sources, steps, unions,
//! definitions, and syntax error reporting.

use scopedsl_foundation::{ErrorCategory, ErrorKind};
use scopedsl_language::{Node, NodeKind, SourceRef, parse_definitions, parse_scope};

// =============================================================================
// Expressions
// =============================================================================

#[test]
fn inventory_scope_shape() {
    let expr = parse_scope("actor.core:inventory.items[]").unwrap();
    assert_eq!(expr.kind(), NodeKind::ArrayIterate);
    assert_eq!(expr.node_count(), 3);
    assert_eq!(expr.to_string(), "actor.core:inventory.items[]");
}

#[test]
fn filtered_reference_shape() {
    let source = r#"positioning:close_actors[{"==":[{"var":"entity.components.core:name.text"},"Bob"]}]"#;
    let expr = parse_scope(source).unwrap();
    let Node::Filter { child, filter } = &expr.node else {
        panic!("expected filter, got {expr:?}");
    };
    assert_eq!(
        child.node,
        Node::Source(SourceRef::Scope("positioning:close_actors".into()))
    );
    assert!(!filter.expr().is_literal());
    assert_eq!(expr.references(), vec!["positioning:close_actors"]);
}

#[test]
fn whitespace_and_comments_between_terms() {
    let expr = parse_scope("actor   +\n  location // where I am\n  | self").unwrap();
    let Node::Union(members) = &expr.node else {
        panic!("expected union");
    };
    assert_eq!(members.len(), 3);
}

#[test]
fn filter_body_may_span_lines() {
    let source = "entities(core:item)[{\n  \"==\": [1,\n 1]\n}]";
    assert_eq!(parse_scope(source).unwrap().kind(), NodeKind::Filter);
}

#[test]
fn every_node_kind_appears() {
    let expr = parse_scope(
        r#"entities(core:item)[{"var": "entity.id"}] + actor.core:inventory.items[]"#,
    )
    .unwrap();
    let mut kinds = Vec::new();
    let mut stack = vec![&expr];
    while let Some(node) = stack.pop() {
        kinds.push(node.kind());
        stack.extend(node.children());
    }
    kinds.sort();
    kinds.dedup();
    assert_eq!(kinds, NodeKind::ALL.to_vec());
}

// =============================================================================
// Syntax Errors
// =============================================================================

#[test]
fn syntax_errors_are_categorized() {
    for source in ["", "actor[", "actor..x", "entities()", "+ actor", "mod:a := actor"] {
        let err = parse_scope(source).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Syntax, "{source:?}");
    }
}

#[test]
fn syntax_error_reports_line_and_column() {
    let err = parse_scope("actor +\n  ]").unwrap_err();
    match err.kind {
        ErrorKind::Syntax { line, column, .. } => {
            assert_eq!(line, 2);
            assert_eq!(column, 3);
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn invalid_json_in_filter_is_a_syntax_error() {
    let err = parse_scope(r#"actor[{"==": [1, 1}]"#).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Syntax);
}

fn syntax_position(err: &scopedsl_foundation::Error) -> (usize, u32, u32) {
    match &err.kind {
        ErrorKind::Syntax {
            offset, line, column, ..
        } => (*offset, *line, *column),
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn invalid_json_points_inside_the_filter() {
    // The '}' is at byte 19; the '[' opening the filter is at byte 5.
    let err = parse_scope(r#"actor[  {"==": [1, }]]"#).unwrap_err();
    assert_eq!(syntax_position(&err), (19, 1, 20));

    let source = "m:a := actor[\n  {\"==\": [\n    1,\n  ]}]\n";
    let err = parse_definitions(source).unwrap_err();
    let (offset, line, column) = syntax_position(&err);
    assert_eq!((line, column), (4, 3));
    assert_eq!(&source[offset..=offset], "]");
}

#[test]
fn unknown_operator_points_at_the_filter() {
    let err = parse_scope(r#"actor[{"regex": [1, 2]}]"#).unwrap_err();
    assert_eq!(syntax_position(&err), (5, 1, 6));
}

// =============================================================================
// Definitions
// =============================================================================

#[test]
fn definitions_keep_source_order() {
    let defs = parse_definitions(
        "b:second := actor\n// note\na:first := none\nc:third := b:second + a:first\n",
    )
    .unwrap();
    let ids: Vec<&str> = defs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["b:second", "a:first", "c:third"]);
    assert_eq!(defs[2].expr.references(), vec!["b:second", "a:first"]);
    assert_eq!(defs[2].to_string(), "c:third := b:second + a:first");
}

#[test]
fn one_bad_definition_fails_the_file() {
    let err = parse_definitions("a:ok := actor\nb:bad := actor[\n").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Syntax);
}
