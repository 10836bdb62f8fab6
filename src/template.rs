use std::hash::{Hash, Hasher};

use tracing::error;

use crate::{
    error::PatternError,
    re::{anchored, escape, Regex, REGEX_FLAGS},
    Params,
};

const MAX_DYNAMIC_SEGMENTS: usize = 16;

/// Default regex for dynamic segments; stops at segment, extension and query delimiters.
const DEFAULT_PATTERN: &str = "[^/.?]+";

/// Regex for tail segments.
const DEFAULT_PATTERN_TAIL: &str = ".*";

/// Compiled path template.
///
/// `PathTemplate`s transform a template syntax into regular expressions from which to check
/// matches with paths and capture portions of a matched path into named parameters. The same
/// template is used in reverse to render a path from a set of parameters. Templates without
/// dynamic segments or optional groups are on a fast path that avoids the regex engine.
///
///
/// # Template Format
/// A template is a string of literal text, dynamic segments and optional groups. Literal text is
/// matched verbatim.
///
/// ## Dynamic Segments
/// The marker for a dynamic segment is curly braces wrapping an identifier. For example,
/// `/users/{id}` matches `/users/123` and captures `id = "123"`.
///
/// By default, dynamic segments use the regex `[^/.?]+`; they stop at the next `/`, `.` or `?`.
/// A custom regex can be given with `{name:regex}`, for example `/users/{id:\d+}`. The custom
/// regex is also the _requirement_ checked for that parameter when generating paths.
///
/// A template can contain at most 16 dynamic segments.
///
/// ## Tail Segments
/// `{name}*` captures all remaining characters, including slashes.
///
/// ## Optional Groups
/// Parenthesis mark an optional part of the template. Groups can be nested. Dynamic segments
/// inside a group are _optional parts_; all others are _required parts_.
///
/// ```
/// use pathway::PathTemplate;
///
/// let tmpl = PathTemplate::new("/{controller}(/{action}(/{id}))(.{format})");
/// assert_eq!(tmpl.parts(), ["controller", "action", "id", "format"]);
/// assert_eq!(tmpl.required_parts(), ["controller"]);
///
/// assert!(tmpl.is_match("/users"));
/// assert!(tmpl.is_match("/users/show/1.json"));
///
/// let m = tmpl.captures("/users/show.json").unwrap();
/// assert_eq!(m.get("action"), Some("show"));
/// assert_eq!(m.get("id"), None);
/// assert_eq!(m.get("format"), Some("json"));
/// ```
///
/// # Prefix Templates
/// A prefix template ([`prefix`](Self::prefix)) matches the start of a path up to a segment
/// boundary, leaving the rest as a remainder for a mounted router.
///
/// ```
/// use pathway::PathTemplate;
///
/// let tmpl = PathTemplate::prefix("/admin");
/// assert!(tmpl.is_match("/admin"));
/// assert!(tmpl.is_match("/admin/users"));
/// assert!(!tmpl.is_match("/administrator"));
///
/// let m = tmpl.captures("/admin/users/1").unwrap();
/// assert_eq!(m.matched(), "/admin");
/// assert_eq!(m.remainder(), "/users/1");
/// ```
///
/// # Trailing Slashes
/// No normalization of intra-path or trailing slashes is done; `/root` does not match `/root/`.
#[derive(Clone, Debug)]
pub struct PathTemplate {
    /// Pattern that generated the template.
    pattern: String,

    is_prefix: bool,

    /// Pattern type.
    pat_type: PatternType,

    /// List of segments that compose the pattern, in order.
    segments: Vec<PatternSegment>,

    /// Names of all dynamic segments, in template order.
    parts: Vec<String>,

    /// Names of dynamic segments outside any optional group, in template order.
    required: Vec<String>,

    /// Custom segment regexes, checked as full-string requirements during generation.
    requirements: Vec<Requirement>,
}

#[derive(Debug, Clone, PartialEq)]
enum PatternSegment {
    /// Literal slice of pattern.
    Const(String),

    /// Name of dynamic segment.
    Var(String),

    /// Optional group of segments.
    Optional(Vec<PatternSegment>),
}

#[derive(Debug, Clone)]
enum PatternType {
    /// Single constant/literal segment.
    Static(String),

    /// Regular expression and list of dynamic segment names.
    Dynamic(Regex, Vec<String>),
}

#[derive(Debug, Clone)]
struct Requirement {
    name: String,
    pattern: String,
    re: Regex,
}

/// Successful match of a path against a [`PathTemplate`].
#[derive(Debug, Clone)]
pub struct TemplateMatch<'a> {
    path: &'a str,
    len: usize,
    captures: Vec<(&'a str, Option<&'a str>)>,
}

impl<'a> TemplateMatch<'a> {
    /// Returns the matched prefix of the path.
    pub fn matched(&self) -> &'a str {
        &self.path[..self.len]
    }

    /// Returns the part of the path left unmatched.
    ///
    /// Always empty for non-prefix templates.
    pub fn remainder(&self) -> &'a str {
        &self.path[self.len..]
    }

    /// Returns length of the matched prefix.
    pub fn matched_len(&self) -> usize {
        self.len
    }

    /// Returns captured value of a dynamic segment; `None` if the segment did not participate.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.captures
            .iter()
            .find(|(key, _)| *key == name)
            .and_then(|(_, val)| *val)
    }

    /// Returns iterator over captured segments that have a value.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        self.captures
            .iter()
            .filter_map(|(key, val)| val.map(|val| (*key, val)))
    }
}

/// Accumulates segment metadata and regex source while parsing.
struct Parser<'p> {
    pattern: &'p str,
    re: String,
    parts: Vec<String>,
    required: Vec<String>,
    requirements: Vec<Requirement>,
    has_tail: bool,
}

impl PathTemplate {
    /// Constructs a new template performing full-path matching.
    ///
    /// # Panics
    /// Panics if the template is malformed. Use [`try_new`](Self::try_new) to handle the error.
    ///
    /// # Examples
    /// ```
    /// use pathway::PathTemplate;
    ///
    /// let tmpl = PathTemplate::new("/user/{id}");
    /// assert!(tmpl.is_match("/user/123"));
    /// assert!(!tmpl.is_match("/user/123/stars"));
    /// assert!(!tmpl.is_match("user/1234"));
    /// assert!(!tmpl.is_match("/foo"));
    /// ```
    pub fn new(pattern: impl Into<String>) -> Self {
        Self::try_new(pattern).unwrap_or_else(|err| panic!("{}", err))
    }

    /// Constructs a new template that matches a prefix of a path, up to a segment boundary.
    ///
    /// # Panics
    /// Panics if the template is malformed. Use [`try_prefix`](Self::try_prefix) to handle the
    /// error.
    ///
    /// # Examples
    /// ```
    /// use pathway::PathTemplate;
    ///
    /// let tmpl = PathTemplate::prefix("/user/{id}");
    /// assert!(tmpl.is_match("/user/123"));
    /// assert!(tmpl.is_match("/user/123/stars"));
    /// assert!(!tmpl.is_match("user/123"));
    /// assert!(!tmpl.is_match("/foo"));
    /// ```
    pub fn prefix(pattern: impl Into<String>) -> Self {
        Self::try_prefix(pattern).unwrap_or_else(|err| panic!("{}", err))
    }

    /// Fallible version of [`new`](Self::new).
    ///
    /// # Examples
    /// ```
    /// use pathway::{PathTemplate, PatternError};
    ///
    /// let err = PathTemplate::try_new("/users/{id").unwrap_err();
    /// assert!(matches!(err, PatternError::MalformedSegment { .. }));
    /// ```
    pub fn try_new(pattern: impl Into<String>) -> Result<Self, PatternError> {
        Self::construct(pattern.into(), false)
    }

    /// Fallible version of [`prefix`](Self::prefix).
    pub fn try_prefix(pattern: impl Into<String>) -> Result<Self, PatternError> {
        Self::construct(pattern.into(), true)
    }

    /// Returns the pattern string that generated the template.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns `true` if template performs prefix matching.
    pub fn is_prefix(&self) -> bool {
        self.is_prefix
    }

    /// Returns names of all dynamic segments in template order.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Returns names of dynamic segments that must always be present to render the template.
    pub fn required_parts(&self) -> &[String] {
        &self.required
    }

    /// Returns `true` if `name` is a required part.
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|part| part == name)
    }

    /// Returns `true` if `name` is any dynamic segment of the template.
    pub fn has_part(&self, name: &str) -> bool {
        self.parts.iter().any(|part| part == name)
    }

    /// Returns iterator of `(name, pattern)` pairs for segments declared with a custom regex.
    pub fn requirements(&self) -> impl Iterator<Item = (&str, &str)> {
        self.requirements
            .iter()
            .map(|req| (req.name.as_str(), req.pattern.as_str()))
    }

    /// Returns the requirement pattern of a segment, if it declares one.
    pub fn requirement(&self, name: &str) -> Option<&str> {
        self.requirements
            .iter()
            .find(|req| req.name == name)
            .map(|req| req.pattern.as_str())
    }

    /// Checks `value` against the requirement of segment `name` as a full-string match.
    ///
    /// Segments without a requirement accept any value.
    ///
    /// # Examples
    /// ```
    /// use pathway::PathTemplate;
    ///
    /// let tmpl = PathTemplate::new(r"/users/{id:\d+}/{slug}");
    /// assert!(tmpl.requirement_satisfied("id", "42"));
    /// assert!(!tmpl.requirement_satisfied("id", "42a"));
    /// assert!(tmpl.requirement_satisfied("slug", "anything"));
    /// ```
    pub fn requirement_satisfied(&self, name: &str, value: &str) -> bool {
        match self.requirements.iter().find(|req| req.name == name) {
            Some(req) => req.re.is_match(value),
            None => true,
        }
    }

    /// Returns `true` if `path` matches this template.
    ///
    /// # Examples
    /// ```
    /// use pathway::PathTemplate;
    ///
    /// // static template
    /// let tmpl = PathTemplate::new("/user");
    /// assert!(tmpl.is_match("/user"));
    /// assert!(!tmpl.is_match("/users"));
    /// assert!(!tmpl.is_match("/user/123"));
    ///
    /// // dynamic template
    /// let tmpl = PathTemplate::new("/user/{user_id}");
    /// assert!(tmpl.is_match("/user/123"));
    /// assert!(!tmpl.is_match("/user/123/stars"));
    ///
    /// // prefix template
    /// let tmpl = PathTemplate::prefix("/root");
    /// assert!(tmpl.is_match("/root"));
    /// assert!(tmpl.is_match("/root/leaf"));
    /// assert!(!tmpl.is_match("/roots"));
    /// ```
    #[inline]
    pub fn is_match(&self, path: &str) -> bool {
        match &self.pat_type {
            PatternType::Static(pattern) => self.static_match(pattern, path).is_some(),
            PatternType::Dynamic(re, _) => re.is_match(path),
        }
    }

    /// Tries to match `path`, returning the position in the path where the match ends.
    ///
    /// # Examples
    /// ```
    /// use pathway::PathTemplate;
    ///
    /// let tmpl = PathTemplate::new("/user");
    /// assert_eq!(tmpl.find_match("/user"), Some(5));
    /// assert!(tmpl.find_match("/user/").is_none());
    ///
    /// let tmpl = PathTemplate::prefix("/user/{id}");
    /// assert_eq!(tmpl.find_match("/user/123"), Some(9));
    /// assert_eq!(tmpl.find_match("/user/12345/stars"), Some(11));
    /// assert!(tmpl.find_match("/user/").is_none());
    /// ```
    pub fn find_match(&self, path: &str) -> Option<usize> {
        self.captures(path).map(|m| m.matched_len())
    }

    /// Matches `path` and collects dynamic segment values.
    ///
    /// Segments inside optional groups that did not participate in the match are reported as
    /// absent.
    ///
    /// # Examples
    /// ```
    /// use pathway::PathTemplate;
    ///
    /// let tmpl = PathTemplate::prefix("/user/{id}");
    /// let m = tmpl.captures("/user/123/stars").unwrap();
    /// assert_eq!(m.get("id"), Some("123"));
    /// assert_eq!(m.remainder(), "/stars");
    ///
    /// let tmpl = PathTemplate::new("/blob/{path}*");
    /// let m = tmpl.captures("/blob/HEAD/Cargo.toml").unwrap();
    /// assert_eq!(m.get("path"), Some("HEAD/Cargo.toml"));
    /// assert_eq!(m.remainder(), "");
    /// ```
    pub fn captures<'a>(&'a self, path: &'a str) -> Option<TemplateMatch<'a>> {
        match &self.pat_type {
            PatternType::Static(pattern) => Some(TemplateMatch {
                path,
                len: self.static_match(pattern, path)?,
                captures: Vec::new(),
            }),

            PatternType::Dynamic(re, names) => {
                let captures = re.captures(path)?;
                let len = captures.get(1).map_or(0, |m| m.end());

                let mut values = Vec::with_capacity(names.len());
                for name in names {
                    let value = captures.name(name).map(|m| m.as_str());

                    if value.is_none() && self.is_required(name) {
                        error!("Dynamic path match but not all segments found: {}", name);
                        return None;
                    }

                    values.push((name.as_str(), value));
                }

                Some(TemplateMatch {
                    path,
                    len,
                    captures: values,
                })
            }
        }
    }

    /// Renders a path from a map of dynamic segment values.
    ///
    /// Returns `None` if a required part has no value. An optional group is rendered only when
    /// every dynamic segment directly inside it has a value.
    ///
    /// # Examples
    /// ```
    /// use pathway::{Params, PathTemplate};
    ///
    /// let tmpl = PathTemplate::new("/{controller}(/{action}(/{id}))");
    ///
    /// let params = Params::from([("controller", "users"), ("action", "show"), ("id", "1")]);
    /// assert_eq!(tmpl.format(&params).unwrap(), "/users/show/1");
    ///
    /// let params = Params::from([("controller", "users"), ("id", "1")]);
    /// assert_eq!(tmpl.format(&params).unwrap(), "/users");
    ///
    /// assert!(tmpl.format(&Params::new()).is_none());
    /// ```
    pub fn format(&self, values: &Params) -> Option<String> {
        let mut path = String::with_capacity(self.pattern.len());

        if self.build_path(&mut path, |name| values.get_present(name)) {
            Some(path)
        } else {
            None
        }
    }

    /// Renders a path from an iterator of dynamic segment values, taken in template order.
    ///
    /// # Examples
    /// ```
    /// # use pathway::PathTemplate;
    /// let tmpl = PathTemplate::new("/user/{id}/post/{title}");
    /// assert_eq!(tmpl.format_iter(["123", "my-post"]).unwrap(), "/user/123/post/my-post");
    /// ```
    pub fn format_iter<I>(&self, values: I) -> Option<String>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let values = values.into_iter().collect::<Vec<_>>();
        let mut iter = values.iter().map(|val| val.as_ref());
        let mut path = String::with_capacity(self.pattern.len());

        if self.build_path(&mut path, |_| iter.next()) {
            Some(path)
        } else {
            None
        }
    }

    /// Assembles path using a closure that maps variable segment names to values.
    fn build_path<'v, F>(&self, path: &mut String, mut vars: F) -> bool
    where
        F: FnMut(&str) -> Option<&'v str>,
    {
        for segment in &self.segments {
            match segment {
                PatternSegment::Const(val) => path.push_str(val),
                PatternSegment::Var(name) => match vars(name) {
                    Some(val) => path.push_str(val),
                    None => return false,
                },
                PatternSegment::Optional(group) => {
                    if let Some((rendered, consumed)) = Self::build_group(group, &mut vars) {
                        if consumed > 0 {
                            path.push_str(&rendered);
                        }
                    }
                }
            }
        }

        true
    }

    /// Renders an optional group, returning its text and number of values it consumed.
    ///
    /// Returns `None` if a direct dynamic segment of the group has no value.
    fn build_group<'v, F>(group: &[PatternSegment], vars: &mut F) -> Option<(String, usize)>
    where
        F: FnMut(&str) -> Option<&'v str>,
    {
        let mut rendered = String::new();
        let mut consumed = 0;

        for segment in group {
            match segment {
                PatternSegment::Const(val) => rendered.push_str(val),
                PatternSegment::Var(name) => {
                    rendered.push_str(vars(name)?);
                    consumed += 1;
                }
                PatternSegment::Optional(inner) => {
                    if let Some((text, n)) = Self::build_group(inner, vars) {
                        if n > 0 {
                            rendered.push_str(&text);
                            consumed += n;
                        }
                    }
                }
            }
        }

        Some((rendered, consumed))
    }

    /// Returns match length if `pattern` acts as a proper prefix (i.e., separated by a slash) in
    /// `path`, or matches it exactly for non-prefix templates.
    fn static_match(&self, pattern: &str, path: &str) -> Option<usize> {
        let rem = path.strip_prefix(pattern)?;

        match self.is_prefix {
            // template is not a prefix so an exact match is needed
            false if rem.is_empty() => Some(pattern.len()),

            // template is a prefix so rem should start with a path delimiter
            true if rem.is_empty() || rem.starts_with('/') => Some(pattern.len()),

            // trailing slash of the template is the delimiter; it is left to the remainder
            true if pattern.ends_with('/') => Some(pattern.len() - 1),

            // otherwise, no match
            _ => None,
        }
    }

    fn construct(pattern: String, is_prefix: bool) -> Result<Self, PatternError> {
        let mut parser = Parser {
            pattern: &pattern,
            re: String::new(),
            parts: Vec::new(),
            required: Vec::new(),
            requirements: Vec::new(),
            has_tail: false,
        };

        let mut unprocessed = pattern.as_str();
        let segments = parser.parse_segments(&mut unprocessed, 0)?;

        if parser.parts.len() > MAX_DYNAMIC_SEGMENTS {
            return Err(PatternError::TooManySegments {
                pattern: pattern.clone(),
                count: parser.parts.len(),
                max: MAX_DYNAMIC_SEGMENTS,
            });
        }

        if is_prefix && parser.has_tail {
            // tail segments in prefixes have no defined semantics
            tracing::warn!(
                "Prefix templates should not have tail segments; \
                 use `PathTemplate::new` for {:?}",
                pattern
            );
        }

        let is_static = segments
            .iter()
            .all(|seg| matches!(seg, PatternSegment::Const(_)));

        let pat_type = if is_static {
            PatternType::Static(pattern.clone())
        } else {
            // Store the pattern in capture group #1 to have context info outside it
            let re = match parser.re.strip_suffix('/') {
                // trailing slash is the boundary itself and stays with the remainder
                Some(body) if is_prefix && !parser.has_tail => {
                    format!("({}^{})/", REGEX_FLAGS, body)
                }

                // Ensure the match ends at a segment boundary
                _ if parser.has_tail => format!("({}^{})", REGEX_FLAGS, parser.re),
                _ if is_prefix => format!("({}^{})(/|$)", REGEX_FLAGS, parser.re),
                _ => format!("({}^{})$", REGEX_FLAGS, parser.re),
            };

            let re = Regex::new(&re).map_err(|err| PatternError::Regex {
                pattern: pattern.clone(),
                message: err.to_string(),
            })?;

            PatternType::Dynamic(re, parser.parts.clone())
        };

        let Parser {
            parts,
            required,
            requirements,
            ..
        } = parser;

        Ok(PathTemplate {
            pattern,
            is_prefix,
            pat_type,
            segments,
            parts,
            required,
            requirements,
        })
    }
}

impl Parser<'_> {
    /// Parses segments until the end of input or the `)` closing the current group.
    fn parse_segments(
        &mut self,
        unprocessed: &mut &str,
        depth: usize,
    ) -> Result<Vec<PatternSegment>, PatternError> {
        let mut segments = Vec::new();

        loop {
            let idx = unprocessed.find(|c| matches!(c, '{' | '(' | ')'));
            let (literal, rem) = unprocessed.split_at(idx.unwrap_or(unprocessed.len()));

            if !literal.is_empty() {
                if rem.is_empty() && depth == 0 && literal.ends_with('*') {
                    return Err(PatternError::UnnamedTail {
                        pattern: self.pattern.to_owned(),
                    });
                }

                segments.push(PatternSegment::Const(literal.to_owned()));
                self.re.push_str(&escape(literal));
            }

            *unprocessed = rem;

            match rem.chars().next() {
                None if depth == 0 => return Ok(segments),
                None => return Err(self.unbalanced()),

                Some(')') if depth == 0 => return Err(self.unbalanced()),
                Some(')') => {
                    *unprocessed = &rem[1..];
                    return Ok(segments);
                }

                Some('(') => {
                    *unprocessed = &rem[1..];
                    self.re.push_str("(?:");
                    let group = self.parse_segments(unprocessed, depth + 1)?;
                    self.re.push_str(")?");
                    segments.push(PatternSegment::Optional(group));
                }

                Some(_) => {
                    let name = self.parse_param(unprocessed, depth)?;
                    segments.push(PatternSegment::Var(name));
                }
            }
        }
    }

    /// Parses a dynamic segment definition, advancing `unprocessed` past it.
    fn parse_param(&mut self, unprocessed: &mut &str, depth: usize) -> Result<String, PatternError> {
        let pattern = *unprocessed;

        let mut params_nesting = 0usize;
        let close_idx = pattern
            .find(|c| match c {
                '{' => {
                    params_nesting += 1;
                    false
                }
                '}' => {
                    params_nesting -= 1;
                    params_nesting == 0
                }
                _ => false,
            })
            .ok_or_else(|| PatternError::MalformedSegment {
                pattern: self.pattern.to_owned(),
            })?;

        let (param, mut rem) = pattern.split_at(close_idx + 1);

        // remove outer curly brackets
        let param = &param[1..param.len() - 1];

        let tail = rem.starts_with('*');
        if tail {
            rem = &rem[1..];
            self.has_tail = true;
        }

        let (name, custom) = match param.split_once(':') {
            Some((name, custom)) => (name, Some(custom)),
            None => (param, None),
        };

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(PatternError::InvalidName {
                pattern: self.pattern.to_owned(),
                name: name.to_owned(),
            });
        }

        if self.parts.iter().any(|part| part == name) {
            return Err(PatternError::DuplicateName {
                pattern: self.pattern.to_owned(),
                name: name.to_owned(),
            });
        }

        let segment_re = match (custom, tail) {
            (Some(_), true) => {
                return Err(PatternError::TailWithRegex {
                    pattern: self.pattern.to_owned(),
                    name: name.to_owned(),
                })
            }
            (Some(custom), false) => {
                let re = anchored(custom).map_err(|err| PatternError::Regex {
                    pattern: self.pattern.to_owned(),
                    message: err.to_string(),
                })?;

                self.requirements.push(Requirement {
                    name: name.to_owned(),
                    pattern: custom.to_owned(),
                    re,
                });

                custom
            }
            (None, true) => DEFAULT_PATTERN_TAIL,
            (None, false) => DEFAULT_PATTERN,
        };

        self.re.push_str(&format!(r"(?P<{}>{})", name, segment_re));
        self.parts.push(name.to_owned());
        if depth == 0 {
            self.required.push(name.to_owned());
        }

        *unprocessed = rem;
        Ok(name.to_owned())
    }

    fn unbalanced(&self) -> PatternError {
        PatternError::UnbalancedGroup {
            pattern: self.pattern.to_owned(),
        }
    }
}

impl Eq for PathTemplate {}

impl PartialEq for PathTemplate {
    fn eq(&self, other: &PathTemplate) -> bool {
        self.pattern == other.pattern && self.is_prefix == other.is_prefix
    }
}

impl Hash for PathTemplate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pattern.hash(state);
        self.is_prefix.hash(state);
    }
}

impl<'a> From<&'a str> for PathTemplate {
    fn from(path: &'a str) -> PathTemplate {
        PathTemplate::new(path)
    }
}

impl From<String> for PathTemplate {
    fn from(path: String) -> PathTemplate {
        PathTemplate::new(path)
    }
}
