// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 The wikiedits developers

//! HTTPS connector for the MediaWiki API.
//!
//! Service structures in this module provide a low-level way to interact
//! with the MediaWiki API over HTTPS, essentially a specialized HTTPS client
//! for `api.php`. They know nothing about pagination; that is handled by
//! [`EditFetcher`](crate::wikipedia::EditFetcher).

use crate::conf;
use crate::http::{HTTPError, HTTPResult, HTTPService};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url, header};

/// A service for retrieving pages of edits from a MediaWiki API.
///
/// Using this trait, clients can implement different ways of connecting
/// to the API, such as an actual connector for production code, and a
/// mocked connector for testing purposes.
pub trait Service {
    /// The `api.php` endpoint that queries are sent to.
    fn endpoint(&self) -> &Url;

    /// Performs a GET request to `uri` and returns the raw body of the
    /// response.
    fn get(&self, uri: &Url) -> HTTPResult<String>;
}

/// A service that contacts the Wikipedia API directly.
#[derive(Debug)]
pub struct WikipediaService {
    client: Client,
    endpoint: Url,
}

impl WikipediaService {
    /// Creates a new service that sends queries to the `endpoint` URL.
    pub fn new(endpoint: Url) -> HTTPResult<Self> {
        let client = Self::client()?;
        Ok(Self { client, endpoint })
    }

    /// Creates a new service for the English Wikipedia, or the wiki named
    /// by `$WIKIEDITS_API_URL`.
    pub fn from_env() -> Result<Self, crate::wikipedia::Error> {
        let endpoint = conf::api_url()?;
        Ok(Self::new(endpoint)?)
    }
}

impl HTTPService for WikipediaService {}

impl Service for WikipediaService {
    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Sends a GET request to the API and returns the raw body.
    fn get(&self, uri: &Url) -> HTTPResult<String> {
        let resp = self
            .client
            .get(uri.clone())
            .send()
            .map_err(HTTPError::Request)?;

        // The API answers every query, including rejected ones, with a 200.
        if resp.status() != StatusCode::OK {
            return Err(HTTPError::Http(resp.status()));
        }

        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .ok_or(HTTPError::MissingContentType)?
            .to_str()?;
        if !content_type.starts_with("application/json") {
            Err(HTTPError::UnexpectedContentType(content_type.to_string()))
        } else {
            resp.text().map_err(HTTPError::Body)
        }
    }
}
