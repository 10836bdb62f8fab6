//! Request recognition and reverse routing.
//!
//! A [`Router`] holds an ordered table of [routes](Route). Each route pairs a handler value with a
//! [path template](PathTemplate), optional verb, client address and attribute
//! [matchers](Matcher), and default parameter values. The router works in two directions:
//!
//! - **Recognition** ([`Router::recognize`], [`Router::call`]) finds the first route accepting a
//!   request and extracts its [parameters](Params). Prefix routes leave the unmatched remainder of
//!   the path for a mounted router.
//! - **Generation** ([`Router::generate`]) picks a route by name or by score and renders a path
//!   from parameters, verifying that every required part is present and valid.
//!
//! # Examples
//! ```
//! use http::Method;
//! use pathway::{test::TestRequest, Conditions, Params, Router};
//!
//! let mut router = Router::build();
//! router.add_route(
//!     "users#show",
//!     Conditions::new(r"/users/{id:\d+}(.{format})").verb(Method::GET),
//!     Params::from([("controller", "users"), ("action", "show")]),
//!     Some("user"),
//! );
//! let router = router.finish();
//!
//! // request -> route
//! let mut req = TestRequest::get().uri("/users/42.json").to_request();
//! let (params, route) = router.recognize(&mut req).unwrap();
//! assert_eq!(*route.handler(), "users#show");
//! assert_eq!(&params["id"], "42");
//! assert_eq!(&params["format"], "json");
//!
//! // parameters -> path
//! let generated = router.generate(Some("user"), &params, &Params::new()).unwrap();
//! assert_eq!(generated.path(), "/users/42.json");
//! ```

#![deny(rust_2018_idioms, nonstandard_style)]
#![warn(future_incompatible)]

mod config;
mod de;
pub mod dispatch;
mod error;
pub mod generate;
mod matcher;
mod params;
mod path;
mod re;
mod request;
mod resource_path;
mod route;
mod router;
mod template;

pub use self::config::{RouterConfig, DEFAULT_PARAMETERS_KEY};
pub use self::de::ParamsDeserializer;
pub use self::dispatch::{BoxedHandler, Handler};
pub use self::error::{GenerationError, PatternError, RoutingError};
pub use self::generate::Generated;
pub use self::matcher::Matcher;
pub use self::params::Params;
pub use self::path::Path;
pub use self::request::{Attribute, Request, RouteRequest};
pub use self::resource_path::{Resource, ResourcePath};
pub use self::route::{Conditions, Route};
pub use self::router::{Router, RouterBuilder};
pub use self::template::{PathTemplate, TemplateMatch};
