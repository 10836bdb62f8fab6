//! Request dispatch to route handlers.

use http::{header::HeaderValue, HeaderName, Response, StatusCode};
use tracing::debug;

use crate::{RouteRequest, Router};

/// Header marking a response as "this router declines the request".
///
/// A caller higher up the chain may try an alternative instead of treating the response as an
/// application-level not-found.
pub const X_CASCADE: HeaderName = HeaderName::from_static("x-cascade");

/// A request handler.
///
/// Implemented for every `Fn(R) -> Response<B>` (including boxed closures, see [`BoxedHandler`])
/// and for [`Router`] itself, so routers can be mounted under a prefix route of another router.
pub trait Handler<R> {
    /// Response body type.
    type Body;

    /// Handles the request.
    fn call(&self, req: R) -> Response<Self::Body>;
}

impl<R, F, B> Handler<R> for F
where
    F: Fn(R) -> Response<B>,
{
    type Body = B;

    #[inline]
    fn call(&self, req: R) -> Response<B> {
        (self)(req)
    }
}

/// Type-erased handler, for routers whose routes use different handler types.
pub type BoxedHandler<R, B> = Box<dyn Fn(R) -> Response<B> + Send + Sync>;

/// Erases the type of a handler.
///
/// # Examples
/// ```
/// use http::Response;
/// use pathway::{dispatch::boxed, BoxedHandler, Params, Request, Router};
///
/// let mut admin = Router::<BoxedHandler<Request, String>>::build();
/// admin.add_route(boxed(|_req: Request| Response::new("dashboard".to_owned())), "/", Params::new(), None);
///
/// let mut router = Router::<BoxedHandler<Request, String>>::build();
/// router.add_route(boxed(|_req: Request| Response::new("home".to_owned())), "/", Params::new(), None);
/// router.add_route(boxed(admin.finish()), pathway::PathTemplate::prefix("/admin"), Params::new(), None);
/// # drop(router.finish());
/// ```
pub fn boxed<R, H>(handler: H) -> BoxedHandler<R, H::Body>
where
    R: 'static,
    H: Handler<R> + Send + Sync + 'static,
{
    Box::new(move |req: R| handler.call(req))
}

/// Response returned when no route recognizes a request.
///
/// Status `404 Not Found`, an [`X_CASCADE`] header set to `pass` and body `Not Found`.
pub fn not_found<B>() -> Response<B>
where
    B: From<&'static str>,
{
    let mut res = Response::new(B::from("Not Found"));
    *res.status_mut() = StatusCode::NOT_FOUND;
    res.headers_mut()
        .insert(X_CASCADE, HeaderValue::from_static("pass"));
    res
}

impl<T> Router<T> {
    /// Dispatches a request to the handler of the recognized route.
    ///
    /// Recognized parameters are stored in the request under the configured
    /// [parameters key](crate::RouterConfig::parameters_key) before the handler is invoked once;
    /// its response is returned unchanged. When no route is recognized the [`not_found`] response
    /// is returned.
    ///
    /// # Examples
    /// ```
    /// use http::{Response, StatusCode};
    /// use pathway::{test::TestRequest, Params, Request, Router};
    ///
    /// let mut router = Router::build();
    /// router.add_route(
    ///     |req: Request| {
    ///         let params = req.params("pathway.path_parameters").unwrap();
    ///         Response::new(format!("user {}", &params["id"]))
    ///     },
    ///     "/users/{id}",
    ///     Params::new(),
    ///     None,
    /// );
    /// let router = router.finish();
    ///
    /// let res = router.call(TestRequest::get().uri("/users/7").to_request());
    /// assert_eq!(res.body(), "user 7");
    ///
    /// let res = router.call(TestRequest::get().uri("/posts/7").to_request());
    /// assert_eq!(res.status(), StatusCode::NOT_FOUND);
    /// assert_eq!(res.headers()["x-cascade"], "pass");
    /// ```
    pub fn call<R, B>(&self, mut req: R) -> Response<B>
    where
        R: RouteRequest,
        T: Handler<R, Body = B>,
        B: From<&'static str>,
    {
        match self.recognize(&mut req) {
            Some((params, route)) => {
                req.insert_params(self.config().parameters_key(), params);
                route.handler().call(req)
            }

            None => {
                debug!("declining request, responding with cascade 404");
                not_found()
            }
        }
    }
}

impl<R, T> Handler<R> for Router<T>
where
    R: RouteRequest,
    T: Handler<R>,
    T::Body: From<&'static str>,
{
    type Body = T::Body;

    fn call(&self, req: R) -> Response<Self::Body> {
        Router::call(self, req)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use http::Method;

    use super::*;
    use crate::{test::TestRequest, Conditions, Params, PathTemplate, Request};

    #[test]
    fn not_found_response() {
        let res = not_found::<String>();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.headers().get(X_CASCADE).unwrap(), "pass");
        assert_eq!(res.body(), "Not Found");
    }

    #[test]
    fn handler_invoked_once() {
        let calls = Cell::new(0);

        let mut router = Router::build();
        router.add_route(
            |_req: Request| {
                calls.set(calls.get() + 1);
                Response::new(String::from("ok"))
            },
            Conditions::new("/").verb(Method::GET),
            Params::new(),
            None,
        );
        let router = router.finish();

        let res = router.call(TestRequest::get().to_request());
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(calls.get(), 1);

        let res = router.call(TestRequest::post().to_request());
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn custom_parameters_key() {
        let config = crate::RouterConfig::default().with_parameters_key("app.params");

        let mut router = Router::build_with(config);
        router.add_route(
            |req: Request| {
                let params = req.params("app.params").cloned().unwrap_or_default();
                Response::new(params.query("id").to_owned())
            },
            "/items/{id}",
            Params::from([("controller", "items")]),
            None,
        );
        let router = router.finish();

        let res = router.call(TestRequest::get().uri("/items/12").to_request());
        assert_eq!(res.body(), "12");
    }

    #[test]
    fn mounted_router() {
        let mut api = Router::<BoxedHandler<Request, String>>::build();
        api.add_route(
            boxed(|req: Request| {
                let params = req.params("pathway.path_parameters").cloned();
                Response::new(format!(
                    "{} {} {:?}",
                    req.path().consumed(),
                    req.path().unprocessed(),
                    params.unwrap_or_default().get("id"),
                ))
            }),
            "/users/{id}",
            Params::new(),
            None,
        );

        let mut router = Router::<BoxedHandler<Request, String>>::build();
        router.add_route(
            boxed(api.finish()),
            PathTemplate::prefix("/api"),
            Params::new(),
            None,
        );
        let router = router.finish();

        let res = router.call(TestRequest::get().uri("/api/users/3").to_request());
        assert_eq!(res.body(), r#"/api /users/3 Some("3")"#);

        // nested router declines
        let res = router.call(TestRequest::get().uri("/api/posts/3").to_request());
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.headers()[X_CASCADE], "pass");
    }
}
