//! Wikipedia API clients and services for communicating with MediaWiki
//! over HTTP.

pub mod client;
pub mod edit;
pub mod service;

pub use client::{EditFetcher, Edits, Error, QueryFilters};
pub use edit::Edit;
