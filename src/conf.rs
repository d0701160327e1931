//! Environment and configuration utilities.

use reqwest::Url;
use std::env;
use thiserror::Error;

/// The MediaWiki API endpoint used when `$WIKIEDITS_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";

/// Name of the environment variable that overrides the API endpoint.
pub const API_URL_ENV: &str = "WIKIEDITS_API_URL";

/// Indicates the configuration in the environment could not be used.
#[derive(Debug, Error)]
pub enum ConfError {
    /// `$WIKIEDITS_API_URL` is set but is not a valid URL.
    #[error("invalid $WIKIEDITS_API_URL {value:?}: {source}")]
    InvalidApiUrl {
        /// The offending value.
        value: String,
        /// Why it could not be parsed.
        source: url::ParseError,
    },
}

/// Returns the MediaWiki API endpoint that edit queries are sent to.
///
/// By default this is the English Wikipedia's `api.php`, but any other
/// MediaWiki installation can be queried by setting `$WIKIEDITS_API_URL`.
/// An empty variable is treated as unset.
///
/// # Examples
///
/// `api_url` returns the English Wikipedia if `$WIKIEDITS_API_URL` is not set:
///
/// ```
/// use wikiedits::conf::api_url;
/// # use temp_env::with_var_unset;
/// # with_var_unset("WIKIEDITS_API_URL", || {
/// let url = api_url().unwrap();
/// assert_eq!(url.as_str(), "https://en.wikipedia.org/w/api.php");
/// # });
/// ```
///
/// Another wiki can be selected through the environment:
///
/// ```
/// use wikiedits::conf::api_url;
/// # use temp_env::with_var;
/// # with_var("WIKIEDITS_API_URL", Some("https://de.wikipedia.org/w/api.php"), || {
/// let url = api_url().unwrap();
/// assert_eq!(url.host_str(), Some("de.wikipedia.org"));
/// # });
/// ```
pub fn api_url() -> Result<Url, ConfError> {
    let value = env::var(API_URL_ENV)
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| String::from(DEFAULT_API_URL));
    Url::parse(&value).map_err(|source| ConfError::InvalidApiUrl { value, source })
}
