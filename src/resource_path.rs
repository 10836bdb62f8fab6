use crate::Path;

/// Abstraction over types that can provide a mutable [`Path`] for routing.
///
/// The router reads the unprocessed part of the path when matching and, after a partial match,
/// skips the matched prefix so a mounted router can continue from where this one stopped.
pub trait Resource {
    /// Type of resource's path returned in `resource_path`.
    type Path: ResourcePath;

    /// Returns a mutable reference to the path wrapper used by the router.
    fn resource_path(&mut self) -> &mut Path<Self::Path>;
}

pub trait ResourcePath {
    fn path(&self) -> &str;
}

impl ResourcePath for String {
    fn path(&self) -> &str {
        self.as_str()
    }
}

impl ResourcePath for &str {
    fn path(&self) -> &str {
        self
    }
}

impl ResourcePath for http::Uri {
    fn path(&self) -> &str {
        self.path()
    }
}
