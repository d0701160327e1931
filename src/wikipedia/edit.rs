//! Edits and the pages of edits returned by the MediaWiki API.
//!
//! A `list=usercontribs` query returns a JSON envelope like this one
//! (abridged):
//!
//! ```json
//! {
//!   "continue": { "uccontinue": "20200101120000|1001", "continue": "-||" },
//!   "query": {
//!     "usercontribs": [
//!       { "revid": 1002, "title": "Rust", "timestamp": "2020-01-02T09:30:00Z" }
//!     ]
//!   }
//! }
//! ```
//!
//! or, when the request is rejected, an error envelope:
//!
//! ```json
//! { "error": { "code": "baduser_ucuser", "info": "Invalid value for user parameter" } }
//! ```

use crate::clock::{DateTime, Utc};
use crate::count::{HasTimestamp, HasTitle};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A single revision made by a user.
///
/// Only the timestamp and title are interpreted; every other field the API
/// returns (revision IDs, namespace, edit summary, size, ...) is kept as-is
/// and written back out when the edit is printed.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Edit {
    timestamp: String,
    title: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Edit {
    /// Creates an edit of the article `title` made at `timestamp`, with no
    /// other fields.
    pub fn new(timestamp: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            title: title.into(),
            fields: Map::new(),
        }
    }

    /// When the edit was made, as an ISO 8601 UTC string
    /// (e.g., `2017-02-14T18:43:02Z`).
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Title of the edited page.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Any other field the API returned for this edit.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// When the edit was made.
    pub fn created_utc(&self) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(&self.timestamp).map(|dt| dt.with_timezone(&Utc))
    }
}

impl HasTimestamp for Edit {
    fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

impl HasTitle for Edit {
    fn title(&self) -> &str {
        &self.title
    }
}

/// An error reading a page of edits.
#[derive(Debug, Error)]
pub enum Error {
    /// The API rejected the request.
    #[error("API Error: {code}\ninfo: {info}")]
    Api {
        /// Machine-readable error code, e.g. `baduser_ucuser`.
        code: String,
        /// Human-readable description of the error.
        info: String,
    },

    /// The response body was not the JSON the API is documented to return.
    #[error("Could not parse API response: {0}")]
    Json(#[from] serde_json::Error),

    /// The response had neither an error nor a `query` object.
    #[error("API response is missing its query results")]
    MissingQuery,
}

/// One page of a user's contributions.
#[derive(Debug, PartialEq)]
pub struct Page {
    edits: Vec<Edit>,
    continuation: Option<String>,
}

impl Page {
    /// Parses the raw body of a `list=usercontribs` response.
    ///
    /// Returns an [`Error::Api`] if the API sent back an error envelope,
    /// even if the envelope also carries results.
    pub fn parse(body: &str) -> Result<Self, Error> {
        let envelope: Envelope = serde_json::from_str(body)?;

        if let Some(ApiError { code, info }) = envelope.error {
            return Err(Error::Api { code, info });
        }

        let query = envelope.query.ok_or(Error::MissingQuery)?;
        let continuation = envelope.continuation.and_then(|c| c.uccontinue);
        Ok(Self {
            edits: query.usercontribs,
            continuation,
        })
    }

    /// The edits on this page, newest first.
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// The token that must be sent to retrieve the next page, or `None` if
    /// this is the last page.
    pub fn continuation(&self) -> Option<&str> {
        self.continuation.as_deref()
    }

    /// Consumes the page, returning its edits and continuation token.
    pub fn into_parts(self) -> (Vec<Edit>, Option<String>) {
        (self.edits, self.continuation)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    query: Option<Query>,

    #[serde(rename = "continue")]
    continuation: Option<Continuation>,

    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Query {
    #[serde(default)]
    usercontribs: Vec<Edit>,
}

#[derive(Debug, Deserialize)]
struct Continuation {
    uccontinue: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,

    #[serde(default)]
    info: String,
}
