//! Request abstraction consumed by the router.

use std::{borrow::Cow, collections::HashMap, fmt, net::SocketAddr};

use http::{header, request::Parts, HeaderMap, HeaderName, Method, Uri};

use crate::{Params, Path, Resource};

/// Request attribute a route constraint is checked against.
///
/// Attribute keys are typed and resolved when the route is built, so recognition only ever asks
/// the request for the handful of attributes its routes actually constrain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Attribute {
    /// URI scheme, e.g. `https`.
    Scheme,

    /// Host name without port, taken from the `Host` header or the request target.
    Host,

    /// Host labels left of the registrable domain, e.g. `api` for `api.example.com`.
    Subdomain,

    /// Value of a request header.
    Header(HeaderName),
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Scheme => f.write_str("scheme"),
            Attribute::Host => f.write_str("host"),
            Attribute::Subdomain => f.write_str("subdomain"),
            Attribute::Header(name) => write!(f, "header {}", name),
        }
    }
}

/// Request type the router can recognize and dispatch.
///
/// Implementors expose the request method, the client address and any attribute that route
/// constraints refer to. The path is reached through [`Resource`].
pub trait RouteRequest: Resource {
    /// Returns request method.
    fn method(&self) -> &Method;

    /// Returns the client address, if known.
    fn remote_addr(&self) -> Option<Cow<'_, str>>;

    /// Returns value of a request attribute, if present.
    fn attribute(&self, attr: &Attribute) -> Option<Cow<'_, str>>;

    /// Stores recognized parameters in request-scoped context under `key`.
    fn insert_params(&mut self, key: &str, params: Params);
}

/// Routable request built on [`http::Request`] parts.
///
/// Besides the HTTP head and body it carries the [`Path`] used for mounting, the peer address and
/// the parameter sets stored by routers that dispatched it.
pub struct Request<B = ()> {
    head: Parts,
    body: B,
    path: Path<String>,
    peer_addr: Option<SocketAddr>,
    params: HashMap<String, Params>,
}

impl<B> Request<B> {
    /// Wraps an `http` request.
    pub fn new(req: http::Request<B>) -> Self {
        let (head, body) = req.into_parts();
        let path = Path::new(head.uri.path().to_owned());

        Request {
            head,
            body,
            path,
            peer_addr: None,
            params: HashMap::new(),
        }
    }

    /// Sets the peer socket address.
    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.head.headers
    }

    /// Returns the routing path.
    ///
    /// After a partial match its consumed prefix is the mount point and its unprocessed part is
    /// what nested routers see.
    #[inline]
    pub fn path(&self) -> &Path<String> {
        &self.path
    }

    #[inline]
    pub fn path_mut(&mut self) -> &mut Path<String> {
        &mut self.path
    }

    /// Peer socket address.
    #[inline]
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Returns parameters stored under `key` by a router that dispatched this request.
    pub fn params(&self, key: &str) -> Option<&Params> {
        self.params.get(key)
    }

    #[inline]
    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn into_body(self) -> B {
        self.body
    }

    /// Returns the host name without port.
    pub fn host(&self) -> Option<&str> {
        let host = self
            .head
            .headers
            .get(header::HOST)
            .and_then(|val| val.to_str().ok())
            .or_else(|| self.head.uri.authority().map(|auth| auth.as_str()))?;

        Some(strip_port(host))
    }

    /// Returns the subdomain part of the host, or `None` for bare domains and IP addresses.
    pub fn subdomain(&self) -> Option<&str> {
        let host = self.host()?;

        if host.starts_with('[') || host.parse::<std::net::Ipv4Addr>().is_ok() {
            return None;
        }

        // everything left of the last two labels
        let mut dots = host.rmatch_indices('.').map(|(idx, _)| idx);
        dots.next()?;
        let idx = dots.next()?;

        Some(&host[..idx]).filter(|sub| !sub.is_empty())
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // ipv6 literal
        return match host.find(']') {
            Some(idx) => &host[..=idx],
            None => host,
        };
    }

    match host.rfind(':') {
        Some(idx) => &host[..idx],
        None => host,
    }
}

impl<B> Resource for Request<B> {
    type Path = String;

    fn resource_path(&mut self) -> &mut Path<Self::Path> {
        &mut self.path
    }
}

impl<B> RouteRequest for Request<B> {
    fn method(&self) -> &Method {
        &self.head.method
    }

    fn remote_addr(&self) -> Option<Cow<'_, str>> {
        self.peer_addr
            .map(|addr| Cow::Owned(addr.ip().to_string()))
    }

    fn attribute(&self, attr: &Attribute) -> Option<Cow<'_, str>> {
        match attr {
            Attribute::Scheme => Some(Cow::Borrowed(self.head.uri.scheme_str().unwrap_or("http"))),
            Attribute::Host => self.host().map(Cow::Borrowed),
            Attribute::Subdomain => self.subdomain().map(Cow::Borrowed),
            Attribute::Header(name) => self
                .head
                .headers
                .get(name)
                .and_then(|val| val.to_str().ok())
                .map(Cow::Borrowed),
        }
    }

    fn insert_params(&mut self, key: &str, params: Params) {
        self.params.insert(key.to_owned(), params);
    }
}

impl<B> From<http::Request<B>> for Request<B> {
    fn from(req: http::Request<B>) -> Self {
        Request::new(req)
    }
}

impl<B> fmt::Debug for Request<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "\nRequest {:?} {}:{}",
            self.head.version,
            self.head.method,
            self.path.as_str()
        )?;

        if !self.path.consumed().is_empty() {
            writeln!(f, "  mounted at: {:?}", self.path.consumed())?;
        }

        if let Some(addr) = self.peer_addr {
            writeln!(f, "  peer: {}", addr)?;
        }

        for (key, params) in &self.params {
            writeln!(f, "  {}: {:?}", key, params)?;
        }

        writeln!(f, "  headers:")?;
        for (key, val) in self.head.headers.iter() {
            writeln!(f, "    {:?}: {:?}", key, val)?;
        }

        Ok(())
    }
}
