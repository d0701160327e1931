// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 The wikiedits developers

//! Clients for reading a user's edit history from the MediaWiki API.

use crate::clock::{Clock, DateTime, NaiveDate, SystemClock, Utc};
use crate::conf::ConfError;
use crate::count::{ArticleCounter, DailyCounter};
use crate::http::HTTPError;
use crate::wikipedia::edit::{self, Edit, Page};
use crate::wikipedia::service::{Service, WikipediaService};
use log::{debug, info};
use reqwest::Url;
use std::iter::FusedIterator;
use std::{mem, vec};
use thiserror::Error;

/// Query parameters sent with every request.
const STATIC_PARAMS: [(&str, &str); 5] = [
    ("action", "query"),
    ("format", "json"),
    ("list", "usercontribs"),
    ("formatversion", "2"),
    ("uclimit", "max"),
];

/// A client error.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the underlying HTTP service.
    #[error("Service error: {0}")]
    Service(#[from] HTTPError),

    /// The API rejected the request or sent back something unreadable.
    #[error(transparent)]
    Page(#[from] edit::Error),

    /// An edit's timestamp could not be compared against the time limit.
    #[error("Invalid timestamp {timestamp:?} on edit of {title:?}: {source}")]
    Timestamp {
        /// The raw timestamp.
        timestamp: String,
        /// Title of the edited page.
        title: String,
        /// Why the timestamp could not be parsed.
        source: chrono::ParseError,
    },

    /// The service could not be configured from the environment.
    #[error(transparent)]
    Conf(#[from] ConfError),
}

/// Selects which of a user's edits are retrieved.
///
/// Filters are built incrementally:
///
/// ```
/// use chrono::NaiveDate;
/// use wikiedits::wikipedia::QueryFilters;
///
/// let filters = QueryFilters::new("Qwerty0")
///     .date(NaiveDate::from_ymd_opt(2017, 2, 14))
///     .limit(Some(100));
/// assert_eq!(filters.user(), "Qwerty0");
/// assert_eq!(filters.time_limit_days(), None);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub struct QueryFilters {
    user: String,
    date: Option<NaiveDate>,
    limit: Option<usize>,
    time_limit: Option<u32>,
}

impl QueryFilters {
    /// Retrieves every edit made by `user`.
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            date: None,
            limit: None,
            time_limit: None,
        }
    }

    /// Only retrieve edits made on the given day (UTC).
    pub fn date(self, date: Option<NaiveDate>) -> Self {
        Self { date, ..self }
    }

    /// Retrieve at most `limit` edits.
    pub fn limit(self, limit: Option<usize>) -> Self {
        Self { limit, ..self }
    }

    /// Only retrieve edits made within the last `days` days.
    pub fn time_limit(self, days: Option<u32>) -> Self {
        Self {
            time_limit: days,
            ..self
        }
    }

    /// The user whose edits are retrieved.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The day edits are restricted to, if any.
    pub fn day(&self) -> Option<NaiveDate> {
        self.date
    }

    /// The maximum number of edits retrieved, if any.
    pub fn max_edits(&self) -> Option<usize> {
        self.limit
    }

    /// How many days back edits are retrieved, if limited.
    pub fn time_limit_days(&self) -> Option<u32> {
        self.time_limit
    }

    /// Builds the request for one page of edits.
    ///
    /// `continuation` is the token returned with the previous page, or
    /// `None` for the first page.
    ///
    /// # Examples
    ///
    /// ```
    /// use reqwest::Url;
    /// use wikiedits::wikipedia::QueryFilters;
    ///
    /// let endpoint = Url::parse("https://en.wikipedia.org/w/api.php").unwrap();
    /// let uri = QueryFilters::new("Qwerty0").uri(&endpoint, Some("20110307123212|417593116"));
    /// assert_eq!(
    ///     uri.as_str(),
    ///     "https://en.wikipedia.org/w/api.php?action=query&format=json&list=usercontribs\
    ///      &formatversion=2&uclimit=max&ucuser=Qwerty0&uccontinue=20110307123212%7C417593116",
    /// );
    /// ```
    pub fn uri(&self, endpoint: &Url, continuation: Option<&str>) -> Url {
        let mut uri = endpoint.clone();
        {
            let mut query = uri.query_pairs_mut();
            query.extend_pairs(STATIC_PARAMS);
            query.append_pair("ucuser", &self.user);
            if let Some(token) = continuation {
                query.append_pair("uccontinue", token);
            }
            if let Some(date) = self.date {
                // Contributions are listed newest first, so the window
                // starts at the end of the day.
                query.append_pair("ucstart", &format!("{date}T23:59:59Z"));
                query.append_pair("ucend", &format!("{date}T00:00:00Z"));
            }
        }
        uri
    }
}

/// Retrieves users' edit histories.
#[derive(Debug)]
pub struct EditFetcher<S: Service = WikipediaService, C: Clock = SystemClock> {
    service: S,
    clock: C,
}

impl EditFetcher {
    /// Creates a fetcher that queries the English Wikipedia, or the wiki
    /// named by `$WIKIEDITS_API_URL`.
    pub fn new() -> Result<Self, Error> {
        let service = WikipediaService::from_env()?;
        Ok(Self::new_with_service(service, SystemClock))
    }
}

impl<S: Service, C: Clock> EditFetcher<S, C> {
    /// Creates a fetcher that retrieves edits using `service`.
    ///
    /// `clock` is consulted once per fetch to resolve time limits.
    pub fn new_with_service(service: S, clock: C) -> Self {
        Self { service, clock }
    }

    /// The service used to contact the API.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Lazily retrieves the edits selected by `filters`, newest first.
    ///
    /// Pages are requested only as the returned iterator is consumed, and
    /// each call starts again from the first page.
    pub fn fetch(&self, filters: &QueryFilters) -> Edits<'_, S> {
        let cutoff = filters.time_limit.map(|days| self.clock.days_ago(days));
        Edits::new(&self.service, filters.clone(), cutoff)
    }

    /// Lazily counts the edits selected by `filters` per day, newest day
    /// first.
    pub fn edits_per_day(&self, filters: &QueryFilters) -> DailyCounter<Edits<'_, S>> {
        DailyCounter::new(self.fetch(filters))
    }

    /// Counts how many times each article was edited on `date`.
    ///
    /// The other filters still apply, so a limit caps the number of edits
    /// counted.
    pub fn edits_for_day(
        &self,
        filters: &QueryFilters,
        date: NaiveDate,
    ) -> Result<ArticleCounter, Error> {
        let filters = filters.clone().date(Some(date));
        itertools::process_results(self.fetch(&filters), |edits| {
            ArticleCounter::from_iter(edits)
        })
    }
}

#[derive(Debug)]
enum NextPage {
    First,
    Continue(String),
    Done,
}

/// An iterator over a user's edits, following the API's continuation
/// tokens from page to page.
///
/// Iteration ends when the last page is exhausted, when the result limit
/// is reached, or at the first edit older than the time limit. Edits are
/// assumed to arrive newest first, as the API documents; the time limit
/// is not checked against any edit after the first older one.
///
/// After yielding an error, the iterator yields nothing more.
#[derive(Debug)]
pub struct Edits<'a, S: Service> {
    service: &'a S,
    filters: QueryFilters,
    cutoff: Option<DateTime<Utc>>,
    batch: vec::IntoIter<Edit>,
    next_page: NextPage,
    yielded: usize,
}

impl<'a, S: Service> Edits<'a, S> {
    fn new(service: &'a S, filters: QueryFilters, cutoff: Option<DateTime<Utc>>) -> Self {
        Self {
            service,
            filters,
            cutoff,
            batch: Vec::new().into_iter(),
            next_page: NextPage::First,
            yielded: 0,
        }
    }

    /// Number of edits yielded so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    fn finish(&mut self) {
        self.next_page = NextPage::Done;
        self.batch = Vec::new().into_iter();
    }

    fn limit_reached(&self) -> bool {
        self.filters.limit.is_some_and(|limit| self.yielded >= limit)
    }

    fn is_too_old(&self, edit: &Edit) -> Result<bool, Error> {
        let Some(cutoff) = self.cutoff else {
            return Ok(false);
        };
        let created = edit.created_utc().map_err(|source| Error::Timestamp {
            timestamp: edit.timestamp().to_string(),
            title: edit.title().to_string(),
            source,
        })?;
        Ok(created < cutoff)
    }

    fn fetch_page(&self, continuation: Option<&str>) -> Result<Page, Error> {
        let uri = self.filters.uri(self.service.endpoint(), continuation);
        info!("{uri}");
        let body = self.service.get(&uri)?;
        let page = Page::parse(&body)?;
        debug!(
            "received {} edits, continuation: {:?}",
            page.edits().len(),
            page.continuation()
        );
        Ok(page)
    }
}

impl<S: Service> Iterator for Edits<'_, S> {
    type Item = Result<Edit, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.limit_reached() {
                self.finish();
                return None;
            }

            if let Some(edit) = self.batch.next() {
                match self.is_too_old(&edit) {
                    Ok(false) => {
                        self.yielded += 1;
                        return Some(Ok(edit));
                    }
                    Ok(true) => {
                        debug!("{} is past the time limit", edit.timestamp());
                        self.finish();
                        return None;
                    }
                    Err(err) => {
                        self.finish();
                        return Some(Err(err));
                    }
                }
            }

            let continuation = match mem::replace(&mut self.next_page, NextPage::Done) {
                NextPage::Done => return None,
                NextPage::First => None,
                NextPage::Continue(token) => Some(token),
            };

            match self.fetch_page(continuation.as_deref()) {
                Ok(page) => {
                    let (edits, continuation) = page.into_parts();
                    self.batch = edits.into_iter();
                    self.next_page = continuation.map_or(NextPage::Done, NextPage::Continue);
                }
                Err(err) => {
                    self.finish();
                    return Some(Err(err));
                }
            }
        }
    }
}

impl<S: Service> FusedIterator for Edits<'_, S> {}
