//! Error types.

use derive_more::{Display, Error, From};

/// Errors raised while compiling a path template.
///
/// These are setup-time errors; a router should never begin serving with a malformed template.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[non_exhaustive]
pub enum PatternError {
    /// A `{` was never closed.
    #[display("pattern {pattern:?} contains malformed dynamic segment")]
    MalformedSegment { pattern: String },

    /// A `(` was never closed or a `)` has no matching `(`.
    #[display("pattern {pattern:?} contains unbalanced optional group")]
    UnbalancedGroup { pattern: String },

    /// Segment names must be non-empty and made of ASCII alphanumerics or `_`.
    #[display("pattern {pattern:?} contains invalid segment name {name:?}")]
    InvalidName { pattern: String, name: String },

    #[display("pattern {pattern:?} declares segment {name:?} more than once")]
    DuplicateName { pattern: String, name: String },

    #[display("custom regex is not supported for tail segment {name:?} in pattern {pattern:?}")]
    TailWithRegex { pattern: String, name: String },

    #[display("tail segments must have names; consider `{{tail}}*` in pattern {pattern:?}")]
    UnnamedTail { pattern: String },

    #[display("only {max} dynamic segments are allowed, pattern {pattern:?} has {count}")]
    TooManySegments {
        pattern: String,
        count: usize,
        max: usize,
    },

    /// The regular expression generated for the pattern (or a custom segment regex) is invalid.
    #[display("wrong path pattern {pattern:?}: {message}")]
    Regex { pattern: String, message: String },
}

/// Required parameter missing or failing its requirement during generation.
///
/// This is a caller error (insufficient or invalid parameters supplied) and is never retried or
/// substituted with defaults.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[non_exhaustive]
pub enum RoutingError {
    #[display("route {pattern:?} requires parameter {part:?}")]
    Missing { pattern: String, part: String },

    #[display(
        "parameter {part:?} of route {pattern:?} has value {value:?} which does not satisfy \
         requirement {requirement:?}"
    )]
    Unsatisfied {
        pattern: String,
        part: String,
        value: String,
        requirement: String,
    },
}

impl RoutingError {
    /// Returns name of the offending path part.
    pub fn part(&self) -> &str {
        match self {
            RoutingError::Missing { part, .. } | RoutingError::Unsatisfied { part, .. } => part,
        }
    }
}

/// Errors that can occur when generating a path.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
#[non_exhaustive]
pub enum GenerationError {
    /// No route is registered under the requested name.
    #[display("named route {_0:?} not found")]
    #[from(ignore)]
    RouteNotFound(#[error(not(source))] String),

    /// The routing table has no routes to score.
    #[display("routing table has no routes")]
    #[from(ignore)]
    NoRoutes,

    /// Required parts could not be satisfied.
    #[display("{_0}")]
    Routing(RoutingError),
}
