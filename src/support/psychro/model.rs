//! Property-service implementations.

mod ashrae;

pub use ashrae::Ashrae;
