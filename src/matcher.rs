//! Route condition matchers.
//!
//! A [`Matcher`] accepts or rejects a single string value: a request method, a client address
//! or a request attribute such as the host or a header. Routes combine a verb matcher, an
//! optional address matcher and any number of attribute constraints; all must accept a request
//! for the route to be eligible.
//!
//! # Examples
//! ```
//! use http::Method;
//! use pathway::Matcher;
//!
//! let verb = Matcher::methods([Method::GET, Method::HEAD]);
//! assert!(verb.accepts("HEAD"));
//! assert!(!verb.accepts("POST"));
//!
//! let subdomain = Matcher::pattern("api|admin");
//! assert!(subdomain.accepts("api"));
//! assert!(!subdomain.accepts("apis"));
//! ```

use std::{fmt, sync::Arc};

use http::Method;

use crate::{
    error::PatternError,
    re::{anchored, Regex},
};

/// Predicate over a single string value.
#[derive(Clone)]
pub enum Matcher {
    /// Accepts every value, including an absent one.
    Any,

    /// Accepts a value equal to the given string.
    Exact(String),

    /// Accepts a value the regex matches in full.
    Pattern(Regex),

    /// Accepts a value equal to one of the given strings.
    OneOf(Vec<String>),

    /// Accepts a value the predicate returns `true` for.
    Fn(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl Matcher {
    /// Creates a matcher accepting only `value`.
    pub fn exact(value: impl Into<String>) -> Self {
        Matcher::Exact(value.into())
    }

    /// Creates a matcher accepting values that match `pattern` in full.
    ///
    /// # Panics
    /// Panics if `pattern` is not a valid regex. Use [`try_pattern`](Self::try_pattern) to
    /// handle the error.
    pub fn pattern(pattern: &str) -> Self {
        Self::try_pattern(pattern).unwrap_or_else(|err| panic!("{}", err))
    }

    /// Fallible version of [`pattern`](Self::pattern).
    pub fn try_pattern(pattern: &str) -> Result<Self, PatternError> {
        anchored(pattern)
            .map(Matcher::Pattern)
            .map_err(|err| PatternError::Regex {
                pattern: pattern.to_owned(),
                message: err.to_string(),
            })
    }

    /// Creates a matcher accepting any of `values`.
    pub fn one_of<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Matcher::OneOf(values.into_iter().map(Into::into).collect())
    }

    /// Creates a matcher from a predicate function.
    ///
    /// # Examples
    /// ```
    /// use pathway::Matcher;
    ///
    /// let internal = Matcher::from_fn(|addr| addr.starts_with("10."));
    /// assert!(internal.accepts("10.0.0.7"));
    /// assert!(!internal.accepts("192.168.1.7"));
    /// ```
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Matcher::Fn(Arc::new(f))
    }

    /// Creates a matcher accepting a single request method.
    pub fn method(method: Method) -> Self {
        Matcher::Exact(method.as_str().to_owned())
    }

    /// Creates a matcher accepting any of the given request methods.
    pub fn methods<I>(methods: I) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        Matcher::OneOf(
            methods
                .into_iter()
                .map(|method| method.as_str().to_owned())
                .collect(),
        )
    }

    /// Returns true if `value` is accepted.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Exact(expected) => expected == value,
            Matcher::Pattern(re) => re.is_match(value),
            Matcher::OneOf(values) => values.iter().any(|expected| expected == value),
            Matcher::Fn(f) => f(value),
        }
    }

    /// Returns true if an optional value is accepted.
    ///
    /// An absent value is only accepted by [`Matcher::Any`].
    pub fn accepts_opt(&self, value: Option<&str>) -> bool {
        match value {
            Some(value) => self.accepts(value),
            None => matches!(self, Matcher::Any),
        }
    }

    /// Returns `true` if this is the catch-all matcher.
    pub fn is_any(&self) -> bool {
        matches!(self, Matcher::Any)
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Matcher::Any
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Any => f.write_str("Any"),
            Matcher::Exact(value) => f.debug_tuple("Exact").field(value).finish(),
            Matcher::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Matcher::OneOf(values) => f.debug_tuple("OneOf").field(values).finish(),
            Matcher::Fn(_) => f.write_str("Fn(..)"),
        }
    }
}

impl From<Method> for Matcher {
    fn from(method: Method) -> Self {
        Matcher::method(method)
    }
}

impl From<&str> for Matcher {
    fn from(value: &str) -> Self {
        Matcher::exact(value)
    }
}

impl From<String> for Matcher {
    fn from(value: String) -> Self {
        Matcher::Exact(value)
    }
}

impl From<Regex> for Matcher {
    fn from(re: Regex) -> Self {
        Matcher::Pattern(re)
    }
}
