//! Common types shared among the shard consumer crates.

#[cfg(any(test, feature = "test-utils"))]
mod test;
#[cfg(any(test, feature = "test-utils"))]
pub use test::*;

pub mod retry;
pub use retry::*;

pub mod time;
