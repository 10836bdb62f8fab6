use std::fmt;

use tracing::trace;

use crate::{Attribute, Matcher, Params, PathTemplate, RouteRequest};

/// Generation score of a route with a required part left unsupplied.
const UNSATISFIED_SCORE: isize = -2;

/// Generation score of a route whose extra default disagrees with a supplied value.
const CONTRADICTED_SCORE: isize = -1;

/// Matching conditions of a route.
///
/// Only the path template is mandatory. The verb matcher defaults to [`Matcher::Any`]; without an
/// IP matcher every client address is accepted.
///
/// # Examples
/// ```
/// use http::{header, Method};
/// use pathway::{Attribute, Conditions, Matcher};
///
/// let conditions = Conditions::new("/admin/{page}")
///     .verb(Method::GET)
///     .ip(Matcher::pattern(r"10\.\d+\.\d+\.\d+"))
///     .constraint(Attribute::Header(header::ACCEPT), "text/html");
/// # drop(conditions);
/// ```
#[derive(Debug, Clone)]
pub struct Conditions {
    path: PathTemplate,
    verb: Matcher,
    ip: Option<Matcher>,
    constraints: Vec<(Attribute, Matcher)>,
}

impl Conditions {
    /// Creates conditions for a path template.
    pub fn new(path: impl Into<PathTemplate>) -> Self {
        Conditions {
            path: path.into(),
            verb: Matcher::Any,
            ip: None,
            constraints: Vec::new(),
        }
    }

    /// Replaces the path template.
    pub fn path(mut self, path: impl Into<PathTemplate>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the request method matcher.
    pub fn verb(mut self, verb: impl Into<Matcher>) -> Self {
        self.verb = verb.into();
        self
    }

    /// Sets the client address matcher.
    pub fn ip(mut self, ip: impl Into<Matcher>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Adds a constraint on a request attribute.
    pub fn constraint(mut self, attr: Attribute, matcher: impl Into<Matcher>) -> Self {
        self.constraints.push((attr, matcher.into()));
        self
    }
}

impl From<&str> for Conditions {
    fn from(path: &str) -> Self {
        Conditions::new(path)
    }
}

impl From<String> for Conditions {
    fn from(path: String) -> Self {
        Conditions::new(path)
    }
}

impl From<PathTemplate> for Conditions {
    fn from(path: PathTemplate) -> Self {
        Conditions::new(path)
    }
}

/// A registered route: a handler value plus the conditions and defaults it is reachable under.
///
/// Routes are created by [`RouterBuilder::add_route`](crate::RouterBuilder::add_route) and can be
/// adjusted until the router is finished. A finished router hands out shared references only.
pub struct Route<T> {
    handler: T,
    path: PathTemplate,
    verb: Matcher,
    ip: Option<Matcher>,
    constraints: Vec<(Attribute, Matcher)>,
    defaults: Params,
    name: Option<String>,
}

impl<T> Route<T> {
    pub(crate) fn new(
        handler: T,
        conditions: Conditions,
        defaults: Params,
        name: Option<String>,
    ) -> Self {
        let Conditions {
            path,
            verb,
            ip,
            constraints,
        } = conditions;

        Route {
            handler,
            path,
            verb,
            ip,
            constraints,
            defaults,
            name,
        }
    }

    /// Returns the handler value.
    #[inline]
    pub fn handler(&self) -> &T {
        &self.handler
    }

    #[inline]
    pub fn handler_mut(&mut self) -> &mut T {
        &mut self.handler
    }

    /// Returns the compiled path template.
    #[inline]
    pub fn path(&self) -> &PathTemplate {
        &self.path
    }

    #[inline]
    pub fn verb(&self) -> &Matcher {
        &self.verb
    }

    #[inline]
    pub fn ip(&self) -> Option<&Matcher> {
        self.ip.as_ref()
    }

    pub fn constraints(&self) -> impl Iterator<Item = (&Attribute, &Matcher)> {
        self.constraints.iter().map(|(attr, matcher)| (attr, matcher))
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Sets the route name.
    ///
    /// Names are indexed when the router is finished; the last route carrying a name wins.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Returns default parameter values.
    #[inline]
    pub fn defaults(&self) -> &Params {
        &self.defaults
    }

    /// Adds or replaces a default parameter value.
    pub fn add_default(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.defaults.insert(name, value);
        self
    }

    /// Adds a constraint on a request attribute.
    pub fn add_constraint(&mut self, attr: Attribute, matcher: impl Into<Matcher>) -> &mut Self {
        self.constraints.push((attr, matcher.into()));
        self
    }

    /// Parameter names of the path template, in template order.
    #[inline]
    pub fn parts(&self) -> &[String] {
        self.path.parts()
    }

    /// Parameter names that must be present to render the path.
    #[inline]
    pub fn required_parts(&self) -> &[String] {
        self.path.required_parts()
    }

    /// Defaults whose names do not appear in the path template.
    ///
    /// These identify the route during generation, e.g. `controller` and `action`.
    pub fn extras(&self) -> impl Iterator<Item = (&str, &str)> {
        self.defaults
            .iter()
            .filter(move |(key, _)| !self.path.has_part(key))
    }

    /// Returns true if the request method, client address and every attribute constraint are
    /// accepted. The path is not checked.
    pub fn accepts<R: RouteRequest>(&self, req: &R) -> bool {
        if !self.verb.accepts(req.method().as_str()) {
            trace!("route {} rejects method {}", self.path.pattern(), req.method());
            return false;
        }

        if let Some(ip) = &self.ip {
            if let Some(addr) = req.remote_addr() {
                if !ip.accepts(&addr) {
                    trace!("route {} rejects address {}", self.path.pattern(), addr);
                    return false;
                }
            }
        }

        for (attr, matcher) in &self.constraints {
            if !matcher.accepts_opt(req.attribute(attr).as_deref()) {
                trace!("route {} rejects {}", self.path.pattern(), attr);
                return false;
            }
        }

        true
    }

    /// Scores how well this route fits a set of supplied values during generation.
    ///
    /// Returns `-2` when a required part has no value, so a route that cannot render always loses
    /// to one that can. Returns `-1` when a supplied value contradicts an extra default. Otherwise
    /// every supplied part counts one point and every extra default equal to its supplied value
    /// counts two. Empty values count as absent.
    ///
    /// # Examples
    /// ```
    /// use pathway::{Params, Router};
    ///
    /// let mut router = Router::<()>::build();
    /// router.add_route((), "/users/{id}", [("controller", "users")].into(), None);
    /// let router = router.finish();
    /// let route = &router.routes()[0];
    ///
    /// assert_eq!(route.score(&Params::from([("controller", "users"), ("id", "1")])), 3);
    /// assert_eq!(route.score(&Params::from([("id", "1")])), 1);
    /// assert_eq!(route.score(&Params::from([("controller", "users")])), -2);
    /// assert_eq!(route.score(&Params::from([("controller", "posts"), ("id", "1")])), -1);
    /// ```
    pub fn score(&self, supplied: &Params) -> isize {
        if self
            .required_parts()
            .iter()
            .any(|part| supplied.get_present(part).is_none())
        {
            return UNSATISFIED_SCORE;
        }

        let mut score = self
            .parts()
            .iter()
            .filter(|part| supplied.get_present(part).is_some())
            .count() as isize;

        for (key, default) in self.extras() {
            match supplied.get_present(key) {
                Some(val) if val == default => score += 2,
                Some(_) => return CONTRADICTED_SCORE,
                None => {}
            }
        }

        score
    }
}

impl<T> fmt::Debug for Route<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path.pattern())
            .field("verb", &self.verb)
            .field("ip", &self.ip)
            .field("constraints", &self.constraints)
            .field("defaults", &self.defaults)
            .field("name", &self.name)
            .finish()
    }
}
