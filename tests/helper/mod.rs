//! Shared helpers for the end-to-end tests

mod github;

pub use github::*;
