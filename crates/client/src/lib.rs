//! Client code for wayside.
//!
//! This crate provides the network-fetch primitive the strategy engine
//! composes with cache reads and writes: the [`Fetch`] trait, the
//! production reqwest-based [`HttpFetcher`], and URL canonicalization.

pub mod fetch;

pub use fetch::{Fetch, FetchConfig, FetchError, HttpFetcher};
