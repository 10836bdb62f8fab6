//! Abstraction over `regex` and `regex-lite` depending on whether we have `unicode` crate feature
//! enabled.

cfg_if::cfg_if! {
    if #[cfg(feature = "unicode")] {
        pub(crate) use regex::{escape, Error, Regex};
    } else {
        pub(crate) use regex_lite::{escape, Error, Regex};
    }
}

/// Regex flags to allow '.' in regex to match '\n'
///
/// See the docs under: https://docs.rs/regex/1/regex/#grouping-and-flags
pub(crate) const REGEX_FLAGS: &str = "(?s-m)";

/// Compiles `pattern` so that it only matches whole input strings.
pub(crate) fn anchored(pattern: &str) -> Result<Regex, Error> {
    Regex::new(&format!(r"{}^(?:{})$", REGEX_FLAGS, pattern))
}
