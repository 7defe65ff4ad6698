//! Shared semantic-diff data models consumed by the core library and language crates.

pub mod diff;
pub mod report;
pub mod status;

pub use diff::*;
pub use report::*;
pub use status::*;
