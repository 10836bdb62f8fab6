use std::ops::DerefMut;

use crate::{Resource, ResourcePath};

/// Request path as seen by the router.
///
/// A `Path` is split in two by a skip offset: the _consumed_ prefix, which routers higher up the
/// chain already matched (commonly called the script name), and the _unprocessed_ remainder
/// (the path info) which is what the next router matches against.
#[derive(Debug, Clone, Default)]
pub struct Path<T> {
    /// Full path representation.
    path: T,

    /// Number of bytes in `path` that have been consumed by mounting routers.
    pub(crate) skip: u16,
}

impl<T: ResourcePath> Path<T> {
    pub fn new(path: T) -> Path<T> {
        Path { path, skip: 0 }
    }

    /// Returns reference to inner path instance.
    #[inline]
    pub fn get_ref(&self) -> &T {
        &self.path
    }

    /// Returns mutable reference to inner path instance.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.path
    }

    /// Returns full path as a string.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.path.path()
    }

    /// Returns the prefix consumed by mounting routers.
    ///
    /// Returns empty string if nothing was consumed.
    #[inline]
    pub fn consumed(&self) -> &str {
        &self.as_str()[..self.clamped_skip()]
    }

    /// Returns unprocessed part of the path.
    ///
    /// Returns empty string if no more is to be processed.
    #[inline]
    pub fn unprocessed(&self) -> &str {
        &self.as_str()[self.clamped_skip()..]
    }

    /// Set new path.
    #[inline]
    pub fn set(&mut self, path: T) {
        self.path = path;
        self.skip = 0;
    }

    /// Reset state.
    #[inline]
    pub fn reset(&mut self) {
        self.skip = 0;
    }

    /// Skip first `n` bytes of the unprocessed path.
    ///
    /// The path is left untouched if the consumed prefix would outgrow `u16::MAX` bytes.
    #[inline]
    pub fn skip(&mut self, n: u16) {
        self.try_skip(n.into());
    }

    /// Skip first `n` bytes of the unprocessed path, returning `false` without skipping anything
    /// if the consumed prefix would outgrow `u16::MAX` bytes.
    pub fn try_skip(&mut self, n: usize) -> bool {
        match u16::try_from(n).ok().and_then(|n| self.skip.checked_add(n)) {
            Some(skip) => {
                self.skip = skip;
                true
            }
            None => false,
        }
    }

    fn clamped_skip(&self) -> usize {
        let path = self.as_str();
        let mut skip = (self.skip as usize).min(path.len());

        // never split a multi-byte character
        while !path.is_char_boundary(skip) {
            skip -= 1;
        }

        skip
    }
}

impl<T: ResourcePath> Resource for Path<T> {
    type Path = T;

    fn resource_path(&mut self) -> &mut Path<Self::Path> {
        self
    }
}

impl<T, P> Resource for T
where
    T: DerefMut<Target = Path<P>>,
    P: ResourcePath,
{
    type Path = P;

    fn resource_path(&mut self) -> &mut Path<Self::Path> {
        &mut *self
    }
}
