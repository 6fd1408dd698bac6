//! Common utilities shared by every part of the runner

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};

/// Horizontal rule used in console and report output
pub fn rule(ch: char) -> String {
    std::iter::repeat(ch).take(100).collect()
}

/// Keep the last `n` items of a slice
pub fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}
