use http::{header, Method, Response, StatusCode};
use pathway::{
    dispatch::X_CASCADE, test::TestRequest, Attribute, Conditions, GenerationError, Matcher,
    Params, PathTemplate, Request, Router, RoutingError,
};

fn resources() -> Router<&'static str> {
    let mut router = Router::build();

    router.add_route(
        "users#index",
        Conditions::new("/users(.{format})").verb(Method::GET),
        Params::from([("controller", "users"), ("action", "index")]),
        Some("users"),
    );
    router.add_route(
        "users#create",
        Conditions::new("/users(.{format})").verb(Method::POST),
        Params::from([("controller", "users"), ("action", "create")]),
        None,
    );
    router.add_route(
        "users#show",
        Conditions::new(r"/users/{id:\d+}(.{format})").verb(Method::GET),
        Params::from([("controller", "users"), ("action", "show")]),
        Some("user"),
    );
    router.add_route(
        "api",
        Conditions::new("/{controller}/{action}/{id}")
            .verb(Matcher::methods([Method::GET, Method::HEAD]))
            .constraint(Attribute::Subdomain, "api"),
        Params::new(),
        Some("api"),
    );
    router.add_route(
        "default",
        Conditions::new("/{controller}(/{action}(/{id}))").verb(Method::GET),
        Params::from([("action", "index")]),
        Some("default"),
    );

    router.finish()
}

fn recognize(router: &Router<&'static str>, mut req: Request) -> Option<(Params, &'static str)> {
    router
        .recognize(&mut req)
        .map(|(params, route)| (params, *route.handler()))
}

#[test]
fn first_eligible_route_wins() {
    let router = resources();

    let req = TestRequest::get().uri("/users").to_request();
    let (params, handler) = recognize(&router, req).unwrap();
    assert_eq!(handler, "users#index");
    assert_eq!(&params["action"], "index");

    let req = TestRequest::post().uri("/users.json").to_request();
    let (params, handler) = recognize(&router, req).unwrap();
    assert_eq!(handler, "users#create");
    assert_eq!(&params["format"], "json");

    // `{id:\d+}` rejects the path, so scanning continues past the constraint-satisfying route
    let req = TestRequest::get().uri("/users/new").to_request();
    let (params, handler) = recognize(&router, req).unwrap();
    assert_eq!(handler, "default");
    assert_eq!(&params["controller"], "users");
    assert_eq!(&params["action"], "new");

    // both the api route and the default route accept; the earlier one wins
    let req = TestRequest::get()
        .uri("/posts/show/1")
        .insert_header((header::HOST, "api.example.com"))
        .to_request();
    let (_, handler) = recognize(&router, req).unwrap();
    assert_eq!(handler, "api");

    let req = TestRequest::get().uri("/posts/show/1").to_request();
    let (_, handler) = recognize(&router, req).unwrap();
    assert_eq!(handler, "default");
}

#[test]
fn recognition_does_not_mutate_table() {
    let router = resources();
    let before = format!("{:?}", router);

    for path in ["/users", "/users/1", "/nope/a/b/c", "/posts/show/1"] {
        let _ = recognize(&router, TestRequest::get().uri(path).to_request());
    }

    assert_eq!(format!("{:?}", router), before);
}

#[test]
fn unaccepted_method_never_matches() {
    let router = resources();

    for path in ["/users", "/users/1", "/posts", "/posts/show/1"] {
        let req = TestRequest::delete().uri(path).to_request();
        assert!(recognize(&router, req).is_none(), "{} matched", path);
    }
}

#[test]
fn generation_is_idempotent() {
    let router = resources();

    let options = Params::from([("controller", "users"), ("action", "show"), ("id", "1")]);
    let recall = Params::from([("format", "json")]);

    let first = router.generate(None, &options, &recall).unwrap();
    let second = router.generate(None, &options, &recall).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.path(), "/users/1");
}

#[test]
fn generate_then_recognize_round_trip() {
    let mut router = Router::build();
    router.add_route(
        (),
        "/{controller}/{action}/{id}",
        Params::new(),
        None,
    );
    let router = router.finish();

    let options = Params::from([("controller", "users"), ("action", "show"), ("id", "1")]);
    let generated = router.generate(None, &options, &Params::new()).unwrap();
    assert_eq!(generated.path(), "/users/show/1");
    assert!(generated.leftovers().is_empty());

    let mut req = TestRequest::get().uri(generated.path()).to_request();
    let (params, _) = router.recognize(&mut req).unwrap();
    assert_eq!(params, options);
}

#[test]
fn tie_goes_to_last_registered() {
    let mut router = Router::build();
    router.add_route("A", "/a/{id}", Params::new(), None);
    router.add_route("B", "/b/{id}", Params::new(), None);
    let router = router.finish();

    let options = Params::from([("id", "7")]);
    assert_eq!(router.routes()[0].score(&options), router.routes()[1].score(&options));

    let generated = router.generate(None, &options, &Params::new()).unwrap();
    assert_eq!(generated.path(), "/b/7");
}

#[test]
fn partial_match_leaves_remainder() {
    let mut router = Router::build();
    router.add_route("blog", PathTemplate::prefix("/blog"), Params::new(), None);
    router.add_route("about", "/about", Params::new(), None);
    let router = router.finish();

    let mut req = TestRequest::get().uri("/blog/2024/hello").to_request();
    let (_, route) = router.recognize(&mut req).unwrap();
    assert_eq!(*route.handler(), "blog");
    assert_eq!(req.path().consumed(), "/blog");
    assert_eq!(req.path().unprocessed(), "/2024/hello");

    // nested pass continues from the remainder
    let mut nested = Router::build();
    nested.add_route("post", "/{year}/{slug}", Params::new(), None);
    let nested = nested.finish();

    let (params, route) = nested.recognize(&mut req).unwrap();
    assert_eq!(*route.handler(), "post");
    assert_eq!(&params["year"], "2024");
    assert_eq!(&params["slug"], "hello");

    // full match: nothing is rewritten
    let mut req = TestRequest::get().uri("/about").to_request();
    router.recognize(&mut req).unwrap();
    assert_eq!(req.path().consumed(), "");
    assert_eq!(req.path().unprocessed(), "/about");
}

#[test]
fn missing_required_part() {
    let router = resources();

    let err = router
        .generate(Some("user"), &Params::new(), &Params::new())
        .unwrap_err();

    match err {
        GenerationError::Routing(err) => {
            assert!(matches!(err, RoutingError::Missing { .. }));
            assert_eq!(err.part(), "id");
        }
        err => panic!("unexpected error: {}", err),
    }
}

#[test]
fn requirement_violation() {
    let router = resources();

    let options = Params::from([("id", "abc")]);
    let err = router
        .generate(Some("user"), &options, &Params::new())
        .unwrap_err();

    assert!(matches!(
        err,
        GenerationError::Routing(RoutingError::Unsatisfied { .. })
    ));
}

#[test]
fn unknown_route_name() {
    let router = resources();

    let err = router
        .generate(Some("posts"), &Params::new(), &Params::new())
        .unwrap_err();
    assert_eq!(err, GenerationError::RouteNotFound("posts".to_owned()));
}

#[test]
fn dispatch_declines_with_cascade() {
    let mut router = Router::build();
    router.add_route(
        |_req: Request| Response::new(String::from("home")),
        "/",
        Params::new(),
        None,
    );
    let router = router.finish();

    let res = router.call(TestRequest::get().uri("/").to_request());
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body(), "home");
    assert!(res.headers().get(X_CASCADE).is_none());

    let res = router.call(TestRequest::get().uri("/missing").to_request());
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()[X_CASCADE], "pass");
    assert_eq!(res.body(), "Not Found");
}

#[test]
fn typed_parameters() {
    #[derive(Debug, serde::Deserialize)]
    struct Show {
        controller: String,
        id: u32,
        format: Option<String>,
    }

    let router = resources();

    let mut req = TestRequest::get().uri("/users/12").to_request();
    let (params, _) = router.recognize(&mut req).unwrap();
    let show: Show = params.load().unwrap();
    assert_eq!(show.controller, "users");
    assert_eq!(show.id, 12);
    assert!(show.format.is_none());
}

#[test]
fn concurrent_readers() {
    let router = resources();

    std::thread::scope(|s| {
        for n in 0..4 {
            let router = &router;
            s.spawn(move || {
                for id in 0..100 {
                    let id = (n * 100 + id).to_string();

                    let options = Params::from([("id", id.as_str())]);
                    let generated = router.generate(Some("user"), &options, &Params::new()).unwrap();
                    assert_eq!(generated.path(), format!("/users/{}", id));

                    let req = TestRequest::get().uri(generated.path()).to_request();
                    let (params, handler) = recognize(router, req).unwrap();
                    assert_eq!(handler, "users#show");
                    assert_eq!(params.get("id"), Some(id.as_str()));
                }
            });
        }
    });
}
