//! URL handling module for Market-Harvest
//!
//! This module provides URL normalization, resolution of relative links against
//! the crawl's fixed base, and query parameter decoding. Every URL that enters
//! the frontier has passed through [`resolve_link`] and [`normalize_url`].

mod normalize;
mod query;
mod resolve;

// Re-export main functions
pub use normalize::normalize_url;
pub use query::{query_param, query_vars};
pub use resolve::{absolute_url, resolve_link};
