use std::{collections::HashMap, fmt};

use tracing::{debug, error, trace};

use crate::{Conditions, Params, Route, RouteRequest, RouterConfig};

/// Request router and path generator.
///
/// A router holds an ordered list of [routes](Route) plus an index of named routes. It is created
/// through a [`RouterBuilder`] and is read-only afterwards, so a finished router can be shared
/// between threads and used for recognition and generation concurrently without locking.
///
/// Recognition scans routes in registration order and picks the first one whose conditions accept
/// the request and whose path template matches. See [`generate`](Self::generate) for reverse
/// routing.
pub struct Router<T> {
    routes: Vec<Route<T>>,
    named: HashMap<String, usize>,
    config: RouterConfig,
}

impl<T> Router<T> {
    /// Constructs new `RouterBuilder` with empty route list and default configuration.
    pub fn build() -> RouterBuilder<T> {
        Self::build_with(RouterConfig::default())
    }

    /// Constructs new `RouterBuilder` with empty route list.
    pub fn build_with(config: RouterConfig) -> RouterBuilder<T> {
        RouterBuilder {
            routes: Vec::new(),
            config,
        }
    }

    /// Returns routes in registration order.
    pub fn routes(&self) -> &[Route<T>] {
        &self.routes
    }

    /// Returns named routes. The order is unspecified.
    pub fn named_routes(&self) -> impl Iterator<Item = (&str, &Route<T>)> {
        self.named
            .iter()
            .filter_map(move |(name, &idx)| Some((name.as_str(), self.routes.get(idx)?)))
    }

    /// Looks up a route by name.
    pub fn route(&self, name: &str) -> Option<&Route<T>> {
        self.named.get(name).and_then(|&idx| self.routes.get(idx))
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Returns number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Finds the first route that accepts a request and matches its path.
    ///
    /// Returns the recognized parameters, which are the route defaults overridden by every
    /// captured path segment that has a value, together with the route.
    ///
    /// When a prefix route matches only part of the unprocessed path, the matched prefix is
    /// skipped on the request's [`Path`](crate::Path) so that a nested router sees the remainder.
    /// The path is left untouched for full matches and when nothing matches.
    ///
    /// # Examples
    /// ```
    /// use http::Method;
    /// use pathway::{test::TestRequest, Conditions, Params, Router};
    ///
    /// let mut router = Router::build();
    /// router.add_route(
    ///     "users#show",
    ///     Conditions::new("/users/{id}(.{format})").verb(Method::GET),
    ///     Params::from([("format", "html")]),
    ///     Some("user"),
    /// );
    /// let router = router.finish();
    ///
    /// let mut req = TestRequest::get().uri("/users/1.json").to_request();
    /// let (params, route) = router.recognize(&mut req).unwrap();
    /// assert_eq!(*route.handler(), "users#show");
    /// assert_eq!(params, Params::from([("format", "json"), ("id", "1")]));
    ///
    /// let mut req = TestRequest::delete().uri("/users/1").to_request();
    /// assert!(router.recognize(&mut req).is_none());
    /// ```
    pub fn recognize<R>(&self, req: &mut R) -> Option<(Params, &Route<T>)>
    where
        R: RouteRequest,
    {
        for route in &self.routes {
            if !route.accepts(req) {
                continue;
            }

            let path = req.resource_path();

            let (params, skip) = {
                let matched = match route.path().captures(path.unprocessed()) {
                    Some(matched) => matched,
                    None => {
                        trace!(
                            "route {} does not match path {:?}",
                            route.path().pattern(),
                            path.unprocessed()
                        );
                        continue;
                    }
                };

                let mut params = route.defaults().clone();
                for (name, value) in matched.iter() {
                    params.insert(name, value);
                }

                let skip = if matched.remainder().is_empty() {
                    0
                } else {
                    matched.matched_len()
                };

                (params, skip)
            };

            if skip > 0 && !path.try_skip(skip) {
                error!(
                    "consumed prefix of {:?} plus {} bytes exceeds the supported path length",
                    path.consumed(),
                    skip
                );
                continue;
            }

            debug!(
                "recognized {:?} as route {}",
                path.as_str(),
                route.path().pattern()
            );

            return Some((params, route));
        }

        debug!("no route recognized {} request", req.method());
        None
    }
}

impl<T> fmt::Debug for Router<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .field("named", &self.named)
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for an ordered [routing](Router) list.
pub struct RouterBuilder<T> {
    routes: Vec<Route<T>>,
    config: RouterConfig,
}

impl<T> RouterBuilder<T> {
    /// Adds a new route to the end of the routing list.
    ///
    /// Nothing is validated here; malformed templates are rejected when the [`PathTemplate`] is
    /// constructed. When `name` is given the route is indexed under it, replacing any earlier route
    /// with the same name.
    ///
    /// Returns mutable reference to the new route for further configuration.
    ///
    /// [`PathTemplate`]: crate::PathTemplate
    pub fn add_route(
        &mut self,
        handler: T,
        conditions: impl Into<Conditions>,
        defaults: Params,
        name: Option<&str>,
    ) -> &mut Route<T> {
        let route = Route::new(
            handler,
            conditions.into(),
            defaults,
            name.map(str::to_owned),
        );

        self.routes.push(route);
        let idx = self.routes.len() - 1;
        &mut self.routes[idx]
    }

    /// Returns routes added so far.
    pub fn routes(&self) -> &[Route<T>] {
        &self.routes
    }

    /// Finish configuration and create router instance.
    pub fn finish(self) -> Router<T> {
        let mut named = HashMap::new();

        for (idx, route) in self.routes.iter().enumerate() {
            if let Some(name) = route.name() {
                if let Some(prev) = named.insert(name.to_owned(), idx) {
                    debug!("route name {:?} re-registered, replacing route #{}", name, prev);
                }
            }
        }

        debug!(
            "router finished with {} routes, {} named",
            self.routes.len(),
            named.len()
        );

        Router {
            routes: self.routes,
            named,
            config: self.config,
        }
    }
}
