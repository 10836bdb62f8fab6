//! Reverse routing: rendering paths from parameters.

use std::borrow::Cow;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tracing::{debug, error, trace};

use crate::{GenerationError, Params, Route, Router, RoutingError};

/// https://url.spec.whatwg.org/#path-percent-encode-set
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}');

/// Path segment set; also escapes the separators a segment must not contain.
const SEGMENT: &AsciiSet = &PATH.add(b'/').add(b'%');

/// Parameterize hook percent-encoding a value so it is safe to use as a single path segment.
///
/// # Examples
/// ```
/// use pathway::{generate::escape_segment, Params, Router};
///
/// let mut router = Router::<()>::build();
/// router.add_route((), "/tags/{tag}", Params::new(), Some("tag"));
/// let router = router.finish();
///
/// let generated = router
///     .generate_with(Some("tag"), &Params::from([("tag", "c/c++ 20%")]), &Params::new(), escape_segment)
///     .unwrap();
/// assert_eq!(generated.path(), "/tags/c%2Fc++%2020%25");
/// ```
pub fn escape_segment(_name: &str, value: &str) -> String {
    utf8_percent_encode(value, SEGMENT).to_string()
}

/// Result of path generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    path: String,
    leftovers: Params,
}

impl Generated {
    /// Returns the rendered path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns options that were not used to render the path.
    pub fn leftovers(&self) -> &Params {
        &self.leftovers
    }

    /// Serializes leftovers as a URL-encoded query string.
    pub fn query_string(&self) -> Result<String, serde_urlencoded::ser::Error> {
        serde_urlencoded::to_string(&self.leftovers)
    }

    /// Returns the path followed by the leftovers query string, if there are any leftovers.
    pub fn url(&self) -> Result<String, serde_urlencoded::ser::Error> {
        if self.leftovers.is_empty() {
            return Ok(self.path.clone());
        }

        Ok(format!("{}?{}", self.path, self.query_string()?))
    }

    pub fn into_parts(self) -> (String, Params) {
        (self.path, self.leftovers)
    }
}

type Parameterize<'a> = &'a dyn Fn(&str, &str) -> String;

impl<T> Router<T> {
    /// Renders a path from a route name or from the best scoring route.
    ///
    /// When `name` is given the named route is used and an unknown name fails with
    /// [`GenerationError::RouteNotFound`]. Otherwise every route is [scored](Route::score) against
    /// `recall` overlaid with the non-empty `options`; of the routes sharing the highest score the
    /// one registered last is used.
    ///
    /// Path parts take their value from `options` first and fall back to `recall`. Optional parts
    /// are rendered up to the last one present in `options`. Options that were not used for the
    /// path, other than the configured reserved keys, are returned as leftovers.
    ///
    /// # Errors
    /// Fails with [`GenerationError::Routing`] when a required part has no value or its value does
    /// not satisfy the part's requirement.
    ///
    /// # Examples
    /// ```
    /// use pathway::{Params, Router};
    ///
    /// let mut router = Router::<()>::build();
    /// router.add_route((), r"/users/{id:\d+}(.{format})", [("controller", "users")].into(), Some("user"));
    /// let router = router.finish();
    ///
    /// let options = Params::from([("controller", "users"), ("id", "1"), ("page", "2")]);
    /// let generated = router.generate(None, &options, &Params::new()).unwrap();
    /// assert_eq!(generated.path(), "/users/1");
    /// assert_eq!(generated.url().unwrap(), "/users/1?page=2");
    ///
    /// let options = Params::from([("id", "abc")]);
    /// assert!(router.generate(Some("user"), &options, &Params::new()).is_err());
    /// ```
    pub fn generate(
        &self,
        name: Option<&str>,
        options: &Params,
        recall: &Params,
    ) -> Result<Generated, GenerationError> {
        self.generate_inner(name, options, recall, None)
    }

    /// Same as [`generate`](Self::generate) but transforms every resolved part value through
    /// `parameterize` before it is validated and rendered.
    ///
    /// The hook receives the part name and its value.
    pub fn generate_with<F>(
        &self,
        name: Option<&str>,
        options: &Params,
        recall: &Params,
        parameterize: F,
    ) -> Result<Generated, GenerationError>
    where
        F: Fn(&str, &str) -> String,
    {
        self.generate_inner(name, options, recall, Some(&parameterize))
    }

    fn generate_inner(
        &self,
        name: Option<&str>,
        options: &Params,
        recall: &Params,
        parameterize: Option<Parameterize<'_>>,
    ) -> Result<Generated, GenerationError> {
        let route = match name {
            Some(name) => self
                .route(name)
                .ok_or_else(|| GenerationError::RouteNotFound(name.to_owned()))?,

            None => {
                let mut supplied = recall.clone();
                supplied.extend(options.iter().filter(|(_, val)| !val.is_empty()));
                self.best_route(&supplied).ok_or(GenerationError::NoRoutes)?
            }
        };

        let segment_values = options
            .iter()
            .filter(|(_, val)| !val.is_empty())
            .collect::<Params>();

        let provided = provided_parts(route, &segment_values);

        let route_values = provided
            .iter()
            .map(|&part| {
                let value = segment_values
                    .get(part)
                    .or_else(|| recall.get_present(part));
                (part, value)
            })
            .collect::<Vec<_>>();

        let mut parts = Params::with_capacity(route_values.len());
        for &(part, value) in &route_values {
            let value = match (value, parameterize) {
                (Some(value), Some(parameterize)) => Cow::Owned(parameterize(part, value)),
                (Some(value), None) => Cow::Borrowed(value),
                (None, _) => continue,
            };

            if !value.is_empty() {
                parts.insert(part, value);
            }
        }

        verify_required_parts(route, &parts)?;

        let path = route.path().format(&parts).ok_or_else(|| {
            error!(
                "verified parts {:?} failed to render route {}",
                parts,
                route.path().pattern()
            );
            GenerationError::from(missing_part(route, &parts))
        })?;

        let leftovers = options
            .iter()
            .filter(|&(key, val)| {
                !self.config().is_reserved(key) && !route_values.contains(&(key, Some(val)))
            })
            .collect::<Params>();

        debug!("generated {:?} from route {}", path, route.path().pattern());

        Ok(Generated { path, leftovers })
    }

    /// Returns the highest scoring route; the last one registered wins a tie.
    fn best_route(&self, supplied: &Params) -> Option<&Route<T>> {
        let mut best: Option<(isize, &Route<T>)> = None;

        for route in self.routes() {
            let score = route.score(supplied);
            trace!("route {} scores {}", route.path().pattern(), score);

            if best.map_or(true, |(max, _)| score >= max) {
                best = Some((score, route));
            }
        }

        best.map(|(_, route)| route)
    }
}

/// Returns the parts to render: every required part plus optional parts up to and including the
/// last one supplied. Template order is kept.
fn provided_parts<'r, T>(route: &'r Route<T>, segment_values: &Params) -> Vec<&'r str> {
    let parts = route.parts();

    let last_supplied = parts
        .iter()
        .rposition(|part| segment_values.contains_key(part));

    parts
        .iter()
        .enumerate()
        .filter(|&(idx, part)| {
            last_supplied.map_or(false, |last| idx <= last) || route.path().is_required(part)
        })
        .map(|(_, part)| part.as_str())
        .collect()
}

fn verify_required_parts<T>(route: &Route<T>, parts: &Params) -> Result<(), RoutingError> {
    for part in route.required_parts() {
        let value = parts.get(part).ok_or_else(|| missing_part(route, parts))?;

        if !route.path().requirement_satisfied(part, value) {
            return Err(RoutingError::Unsatisfied {
                pattern: route.path().pattern().to_owned(),
                part: part.clone(),
                value: value.to_owned(),
                requirement: route.path().requirement(part).unwrap_or_default().to_owned(),
            });
        }
    }

    Ok(())
}

/// Builds the error for the first required part without a value.
fn missing_part<T>(route: &Route<T>, parts: &Params) -> RoutingError {
    let part = route
        .required_parts()
        .iter()
        .find(|part| parts.get_present(part).is_none())
        .cloned()
        .unwrap_or_default();

    RoutingError::Missing {
        pattern: route.path().pattern().to_owned(),
        part,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RouterConfig;

    fn router(routes: &[(&str, &[(&str, &str)], Option<&str>)]) -> Router<usize> {
        let mut router = Router::build();
        for (idx, (path, defaults, name)) in routes.iter().enumerate() {
            router.add_route(idx, *path, defaults.iter().copied().collect(), *name);
        }
        router.finish()
    }

    #[test]
    fn named_route() {
        let router = router(&[
            ("/users/{id}", &[], Some("user")),
            ("/posts/{id}", &[], Some("post")),
        ]);

        let options = Params::from([("id", "1")]);
        let generated = router.generate(Some("user"), &options, &Params::new()).unwrap();
        assert_eq!(generated.path(), "/users/1");
        assert!(generated.leftovers().is_empty());

        let err = router.generate(Some("comment"), &options, &Params::new()).unwrap_err();
        assert_eq!(err, GenerationError::RouteNotFound("comment".to_owned()));
    }

    #[test]
    fn empty_table() {
        let router = router(&[]);
        let err = router.generate(None, &Params::new(), &Params::new()).unwrap_err();
        assert_eq!(err, GenerationError::NoRoutes);
    }

    #[test]
    fn scoring_prefers_extras() {
        let router = router(&[
            ("/users/{id}", &[("controller", "users")], None),
            ("/posts/{id}", &[("controller", "posts")], None),
            ("/{controller}/{id}", &[], None),
        ]);

        let options = Params::from([("controller", "users"), ("id", "1")]);
        let generated = router.generate(None, &options, &Params::new()).unwrap();
        assert_eq!(generated.path(), "/users/1");

        let options = Params::from([("controller", "posts"), ("id", "1")]);
        let generated = router.generate(None, &options, &Params::new()).unwrap();
        assert_eq!(generated.path(), "/posts/1");

        let options = Params::from([("controller", "tags"), ("id", "1")]);
        let generated = router.generate(None, &options, &Params::new()).unwrap();
        assert_eq!(generated.path(), "/tags/1");
    }

    #[test]
    fn last_max_wins() {
        let router = router(&[("/a/{id}", &[], None), ("/b/{id}", &[], None)]);

        let options = Params::from([("id", "1")]);
        let generated = router.generate(None, &options, &Params::new()).unwrap();
        assert_eq!(generated.path(), "/b/1");
    }

    #[test]
    fn renderable_route_beats_unsatisfiable() {
        let router = router(&[
            ("/users/{id}", &[("controller", "users")], None),
            ("/posts/{slug}", &[], None),
        ]);

        // the first route contradicts `controller` but can render; the last one lacks `slug`
        let options = Params::from([("controller", "posts"), ("id", "1")]);
        let generated = router.generate(None, &options, &Params::new()).unwrap();
        assert_eq!(generated.path(), "/users/1");
        assert!(generated.leftovers().is_empty());
    }

    #[test]
    fn empty_option_does_not_hide_recall() {
        let router = router(&[
            ("/{controller}/{id}", &[], None),
            ("/{controller}", &[], None),
        ]);

        // `id` is recalled for both scoring and rendering
        let options = Params::from([("controller", "users"), ("id", "")]);
        let recall = Params::from([("id", "7")]);
        let generated = router.generate(None, &options, &recall).unwrap();
        assert_eq!(generated.path(), "/users/7");
    }

    #[test]
    fn optional_parts_up_to_last_supplied() {
        let router = router(&[("/{controller}(/{action}(/{id}))", &[], Some("default"))]);
        let name = Some("default");

        let recall = Params::from([("controller", "users"), ("action", "show"), ("id", "9")]);

        // nothing optional supplied: only required parts are rendered
        let generated = router.generate(name, &Params::new(), &recall).unwrap();
        assert_eq!(generated.path(), "/users");

        // `id` supplied: `action` is recalled
        let options = Params::from([("id", "1")]);
        let generated = router.generate(name, &options, &recall).unwrap();
        assert_eq!(generated.path(), "/users/show/1");

        // empty values do not count as supplied
        let options = Params::from([("action", "edit"), ("id", "")]);
        let generated = router.generate(name, &options, &recall).unwrap();
        assert_eq!(generated.path(), "/users/edit");
    }

    #[test]
    fn required_parts_are_verified() {
        let router = router(&[(r"/users/{id:\d+}", &[], Some("user"))]);

        let err = router
            .generate(Some("user"), &Params::new(), &Params::new())
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Routing(RoutingError::Missing { ref part, .. }) if part == "id"
        ));

        let options = Params::from([("id", "abc")]);
        let err = router
            .generate(Some("user"), &options, &Params::new())
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Routing(RoutingError::Unsatisfied { ref value, .. }) if value == "abc"
        ));

        // partial matches do not satisfy a requirement
        let options = Params::from([("id", "12a")]);
        assert!(router.generate(Some("user"), &options, &Params::new()).is_err());

        // recall fills in
        let recall = Params::from([("id", "12")]);
        let generated = router.generate(Some("user"), &Params::new(), &recall).unwrap();
        assert_eq!(generated.path(), "/users/12");
    }

    #[test]
    fn leftovers() {
        let router = router(&[("/{controller}/{id}", &[], None)]);

        let options = Params::from([
            ("controller", "users"),
            ("action", "show"),
            ("id", "1"),
            ("page", "2"),
            ("q", "rust lang"),
            ("empty", ""),
        ]);
        let generated = router.generate(None, &options, &Params::new()).unwrap();
        assert_eq!(generated.path(), "/users/1");
        assert_eq!(
            generated.leftovers(),
            &Params::from([("page", "2"), ("q", "rust lang"), ("empty", "")])
        );
        assert_eq!(generated.query_string().unwrap(), "page=2&q=rust+lang&empty=");
        assert_eq!(generated.url().unwrap(), "/users/1?page=2&q=rust+lang&empty=");

        let (path, leftovers) = generated.into_parts();
        assert_eq!(path, "/users/1");
        assert_eq!(leftovers.len(), 3);
    }

    #[test]
    fn leftovers_compare_consumed_values() {
        let router = router(&[("/{lang}", &[], Some("home"))]);

        // consumed options are compared with their values before parameterize
        let options = Params::from([("lang", "en")]);
        let generated = router
            .generate_with(Some("home"), &options, &Params::new(), |_, val| {
                val.to_uppercase()
            })
            .unwrap();
        assert_eq!(generated.path(), "/EN");
        assert!(generated.leftovers().is_empty());
    }

    #[test]
    fn reserved_keys_are_configurable() {
        let mut router = Router::<()>::build_with(RouterConfig::default().with_reserved_keys(["locale"]));
        router.add_route((), "/", Params::new(), None);
        let router = router.finish();

        let options = Params::from([("controller", "home"), ("locale", "de")]);
        let generated = router.generate(None, &options, &Params::new()).unwrap();
        assert_eq!(generated.url().unwrap(), "/?controller=home");
    }

    #[test]
    fn parameterize_before_verification() {
        let router = router(&[("/files/{name}", &[], Some("file"))]);

        let options = Params::from([("name", "a b/c")]);
        let generated = router
            .generate_with(Some("file"), &options, &Params::new(), escape_segment)
            .unwrap();
        assert_eq!(generated.path(), "/files/a%20b%2Fc");

        // hook producing empty value drops the part
        let err = router
            .generate_with(Some("file"), &options, &Params::new(), |_, _| String::new())
            .unwrap_err();
        assert!(matches!(err, GenerationError::Routing(RoutingError::Missing { .. })));
    }

    #[test]
    fn idempotent() {
        let router = router(&[
            ("/{controller}(/{action})", &[], None),
            ("/{controller}/{action}/{id}", &[], None),
        ]);

        let options = Params::from([("controller", "users"), ("action", "show"), ("id", "1")]);
        let recall = Params::from([("controller", "posts")]);

        let a = router.generate(None, &options, &recall).unwrap();
        let b = router.generate(None, &options, &recall).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.path(), "/users/show/1");
    }
}
