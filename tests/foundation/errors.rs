//! Integration tests for Error types
//!
//! Tests error construction, categories, codes, and scope context.

use scopedsl_foundation::{EntityId, Error, ErrorCategory, ErrorKind};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_syntax_carries_position() {
    let err = Error::syntax("unexpected ']'", 7, 1, 8);
    assert!(matches!(err.kind, ErrorKind::Syntax { .. }));
    let msg = format!("{err}");
    assert!(msg.contains("1:8"));
    assert!(msg.contains("unexpected ']'"));
}

#[test]
fn error_unknown_scope() {
    let err = Error::unknown_scope("mod:missing");
    assert!(matches!(err.kind, ErrorKind::UnknownScope(_)));
    assert!(format!("{err}").contains("mod:missing"));
}

#[test]
fn error_cyclic_scope_shows_chain() {
    let err = Error::cyclic_scope(vec!["mod:a".into(), "mod:b".into(), "mod:a".into()]);
    assert_eq!(
        err.to_string(),
        "cyclic scope reference: mod:a -> mod:b -> mod:a"
    );
}

#[test]
fn error_missing_dependency_names_resolver() {
    let err = Error::missing_dependency("location", "SourceRefResolver");
    let msg = format!("{err}");
    assert!(msg.contains("location"));
    assert!(msg.contains("SourceRefResolver"));
}

#[test]
fn error_entity_not_found() {
    let err = Error::entity_not_found(EntityId::new("ghost"));
    assert!(matches!(err.kind, ErrorKind::EntityNotFound(_)));
    assert!(format!("{err}").contains("ghost"));
}

// =============================================================================
// Categories
// =============================================================================

#[test]
fn categories_map_from_kinds() {
    let cases = [
        (Error::syntax("x", 0, 1, 1), ErrorCategory::Syntax),
        (Error::unknown_scope("a:b"), ErrorCategory::UnknownScope),
        (Error::cyclic_scope(vec!["a:b".into(), "a:b".into()]), ErrorCategory::CyclicScope),
        (Error::filter_evaluation("bad"), ErrorCategory::FilterEvaluation),
        (Error::missing_dependency("location", "SourceRefResolver"), ErrorCategory::MissingDependency),
        (Error::depth_limit(64), ErrorCategory::DepthLimit),
        (Error::new(ErrorKind::Io("disk".into())), ErrorCategory::Internal),
    ];
    for (err, category) in cases {
        assert_eq!(err.category(), category, "{err}");
    }
}

#[test]
fn category_names_and_codes_are_stable() {
    let table: Vec<(&str, &str)> = ErrorCategory::ALL
        .iter()
        .map(|c| (c.name(), c.code()))
        .collect();
    assert_eq!(
        table,
        vec![
            ("SyntaxError", "SCOPE_1001"),
            ("UnknownScopeError", "SCOPE_2001"),
            ("CyclicScopeError", "SCOPE_2002"),
            ("FilterEvaluationError", "SCOPE_3001"),
            ("MissingDependencyError", "SCOPE_4001"),
            ("DepthLimitError", "SCOPE_5001"),
            ("InternalError", "SCOPE_9001"),
        ]
    );
}

// =============================================================================
// Scope Context
// =============================================================================

#[test]
fn in_scope_keeps_innermost() {
    let err = Error::filter_evaluation("bad")
        .in_scope("mod:inner")
        .in_scope("mod:outer");
    assert_eq!(err.scope_id(), Some("mod:inner"));
}

#[test]
fn scope_id_absent_by_default() {
    assert_eq!(Error::unknown_scope("a:b").scope_id(), None);
}
