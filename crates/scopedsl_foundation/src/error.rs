//! Error types for ScopeDSL.
//!
//! Uses `thiserror` for ergonomic error definition with rich context. Every
//! error kind belongs to exactly one [`ErrorCategory`], which is what the
//! engine's error handler aggregates on.

use std::fmt;

use thiserror::Error;

use crate::entity::EntityId;

/// Convenience alias for results carrying a ScopeDSL [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for ScopeDSL operations.
#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Adds the scope ID to this error's context, keeping an existing one.
    #[must_use]
    pub fn in_scope(mut self, scope_id: &str) -> Self {
        let context = self.context.take().unwrap_or_default();
        let context = if context.scope_id.is_some() {
            context
        } else {
            context.with_scope(scope_id)
        };
        self.context = Some(context);
        self
    }

    /// Creates a syntax error at the given source position.
    #[must_use]
    pub fn syntax(message: impl Into<String>, offset: usize, line: u32, column: u32) -> Self {
        Self::new(ErrorKind::Syntax {
            message: message.into(),
            offset,
            line,
            column,
        })
    }

    /// Creates an unknown scope error.
    #[must_use]
    pub fn unknown_scope(scope_id: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownScope(scope_id.into()))
    }

    /// Creates a cyclic scope error from the reference chain.
    ///
    /// `chain` lists the scopes being resolved, outermost first, and ends with
    /// the reference that closed the cycle.
    #[must_use]
    pub fn cyclic_scope(chain: Vec<String>) -> Self {
        Self::new(ErrorKind::CyclicScope { chain })
    }

    /// Creates a filter evaluation error.
    #[must_use]
    pub fn filter_evaluation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FilterEvaluation(message.into()))
    }

    /// Creates a missing dependency error.
    #[must_use]
    pub fn missing_dependency(dependency: impl Into<String>, resolver: &'static str) -> Self {
        Self::new(ErrorKind::MissingDependency {
            dependency: dependency.into(),
            resolver,
        })
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(id: EntityId) -> Self {
        Self::new(ErrorKind::EntityNotFound(id))
    }

    /// Creates a depth limit error.
    #[must_use]
    pub fn depth_limit(limit: usize) -> Self {
        Self::new(ErrorKind::DepthLimit { limit })
    }

    /// Returns the category this error is reported under.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Returns the scope ID recorded in this error's context, if any.
    #[must_use]
    pub fn scope_id(&self) -> Option<&str> {
        self.context.as_ref().and_then(|c| c.scope_id.as_deref())
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// Malformed scope source.
    #[error("syntax error at {line}:{column} (offset {offset}): {message}")]
    Syntax {
        /// Description of the problem.
        message: String,
        /// Byte offset into the source.
        offset: usize,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
    },

    /// A scope reference named no registered or built-in scope.
    #[error("unknown scope: {0}")]
    UnknownScope(String),

    /// A scope references itself, directly or through other scopes.
    #[error("cyclic scope reference: {}", .chain.join(" -> "))]
    CyclicScope {
        /// The reference chain that closed the cycle.
        chain: Vec<String>,
    },

    /// A filter operator was applied to values it cannot handle.
    #[error("filter evaluation failed: {0}")]
    FilterEvaluation(String),

    /// A resolver needed a context field that was not supplied.
    #[error("missing dependency '{dependency}' required by {resolver}")]
    MissingDependency {
        /// The missing context field.
        dependency: String,
        /// The resolver that needed it.
        resolver: &'static str,
    },

    /// Resolution nested deeper than the configured limit.
    #[error("resolution depth limit ({limit}) exceeded")]
    DepthLimit {
        /// The configured limit.
        limit: usize,
    },

    /// Entity was not found in storage.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Entity ID is already taken.
    #[error("entity already exists: {0}")]
    EntityExists(EntityId),

    /// I/O failure (runtime only).
    #[error("I/O error: {0}")]
    Io(String),

    /// Snapshot encoding or decoding failure (runtime only).
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Returns the category this kind is reported under.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Syntax { .. } => ErrorCategory::Syntax,
            Self::UnknownScope(_) => ErrorCategory::UnknownScope,
            Self::CyclicScope { .. } => ErrorCategory::CyclicScope,
            Self::FilterEvaluation(_) => ErrorCategory::FilterEvaluation,
            Self::MissingDependency { .. } => ErrorCategory::MissingDependency,
            Self::DepthLimit { .. } => ErrorCategory::DepthLimit,
            Self::EntityNotFound(_)
            | Self::EntityExists(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Internal(_) => ErrorCategory::Internal,
        }
    }
}

// =============================================================================
// Error Category
// =============================================================================

/// Reporting category for errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCategory {
    /// Parse-time failure.
    Syntax,
    /// Reference to an unregistered scope.
    UnknownScope,
    /// Self- or mutually-referential scopes.
    CyclicScope,
    /// Operator/type mismatch inside a filter.
    FilterEvaluation,
    /// Required context field absent.
    MissingDependency,
    /// Nesting deeper than the engine allows.
    DepthLimit,
    /// Anything else.
    Internal,
}

impl ErrorCategory {
    /// All categories, in reporting order.
    pub const ALL: [Self; 7] = [
        Self::Syntax,
        Self::UnknownScope,
        Self::CyclicScope,
        Self::FilterEvaluation,
        Self::MissingDependency,
        Self::DepthLimit,
        Self::Internal,
    ];

    /// Returns the stable display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Syntax => "SyntaxError",
            Self::UnknownScope => "UnknownScopeError",
            Self::CyclicScope => "CyclicScopeError",
            Self::FilterEvaluation => "FilterEvaluationError",
            Self::MissingDependency => "MissingDependencyError",
            Self::DepthLimit => "DepthLimitError",
            Self::Internal => "InternalError",
        }
    }

    /// Returns the stable error code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Syntax => "SCOPE_1001",
            Self::UnknownScope => "SCOPE_2001",
            Self::CyclicScope => "SCOPE_2002",
            Self::FilterEvaluation => "SCOPE_3001",
            Self::MissingDependency => "SCOPE_4001",
            Self::DepthLimit => "SCOPE_5001",
            Self::Internal => "SCOPE_9001",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Error Context
// =============================================================================

/// Context about where an error occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The scope being registered or resolved.
    pub scope_id: Option<String>,
    /// Line number in the scope source.
    pub line: Option<usize>,
    /// Column number in the scope source.
    pub column: Option<usize>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scope ID.
    #[must_use]
    pub fn with_scope(mut self, scope_id: impl Into<String>) -> Self {
        self.scope_id = Some(scope_id.into());
        self
    }

    /// Sets the line and column.
    #[must_use]
    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scope) = &self.scope_id {
            write!(f, "in scope {scope}")?;
            if let (Some(line), Some(col)) = (self.line, self.column) {
                write!(f, ":{line}:{col}")?;
            }
        }
        Ok(())
    }
}
