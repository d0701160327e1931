//! General-purpose counting capabilities.

use counter::Counter;
use itertools::Itertools;
use serde::Serialize;
use std::iter::FusedIterator;
use std::vec::IntoIter;

/// A thing that happened at a particular moment.
pub trait HasTimestamp {
    /// When the thing happened, as an ISO 8601 string.
    fn timestamp(&self) -> &str;

    /// The date portion of the [timestamp](HasTimestamp::timestamp), i.e.,
    /// everything before the `T`.
    ///
    /// The date is not converted to local time.
    fn date(&self) -> &str {
        let timestamp = self.timestamp();
        timestamp
            .split_once('T')
            .map_or(timestamp, |(date, _)| date)
    }
}

/// A thing that is attached to an article.
pub trait HasTitle {
    /// Title of the article.
    fn title(&self) -> &str;
}

/// A pair of date (`YYYY-MM-DD`) and count.
pub type DailyCount = (String, usize);

/// Counts a sequence of timestamped items by day.
///
/// Items must already be grouped by date, as a user's edits are when
/// they come back from the API newest first. A day's count is emitted
/// as soon as an item from a different day (or the end of the sequence)
/// is reached, so counting is as lazy as the underlying iterator.
///
/// The counter consumes fallible items. When it encounters an error, it
/// discards the count for the day in progress, yields the error, and
/// then stops.
///
/// # Examples
///
/// ```
/// use std::convert::Infallible;
/// use wikiedits::count::DailyCounter;
/// use wikiedits::wikipedia::Edit;
///
/// let edits = [
///     Edit::new("2020-01-02T10:00:00Z", "Rust"),
///     Edit::new("2020-01-01T18:00:00Z", "Ferris"),
///     Edit::new("2020-01-01T09:00:00Z", "Rust"),
/// ];
/// let days: Vec<_> = DailyCounter::new(edits.into_iter().map(Ok::<_, Infallible>))
///     .map(Result::unwrap)
///     .collect();
/// assert_eq!(days, [("2020-01-02".to_string(), 1), ("2020-01-01".to_string(), 2)]);
/// ```
#[derive(Debug)]
pub struct DailyCounter<I> {
    iter: I,
    current: Option<DailyCount>,
    done: bool,
}

impl<I> DailyCounter<I> {
    /// Counts the items in `iter` by day.
    pub fn new(iter: I) -> Self {
        Self {
            iter,
            current: None,
            done: false,
        }
    }
}

impl<I, T, E> Iterator for DailyCounter<I>
where
    I: Iterator<Item = Result<T, E>>,
    T: HasTimestamp,
{
    type Item = Result<DailyCount, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let item = match self.iter.next() {
                Some(Ok(item)) => item,
                Some(Err(err)) => {
                    self.done = true;
                    self.current = None;
                    return Some(Err(err));
                }
                None => {
                    self.done = true;
                    return self.current.take().map(Ok);
                }
            };

            let date = item.date();
            if let Some((current, count)) = self.current.as_mut() {
                if current.as_str() == date {
                    *count += 1;
                    continue;
                }
            }

            if let Some(finished) = self.current.replace((date.to_string(), 1)) {
                return Some(Ok(finished));
            }
        }
    }
}

impl<I, T, E> FusedIterator for DailyCounter<I>
where
    I: Iterator<Item = Result<T, E>>,
    T: HasTimestamp,
{
}

/// The number of times an article was edited.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArticleCount {
    title: String,
    edits: usize,
}

impl ArticleCount {
    /// Title of the article.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of edits made to the article.
    pub fn edits(&self) -> usize {
        self.edits
    }
}

/// Groups edits by article and provides a count of the number of edits
/// made to each article.
///
/// Articles are reported in the order in which they were first seen,
/// not alphabetically or by count.
#[derive(Debug)]
pub struct ArticleCounter {
    titles: Vec<String>,
    counts: Counter<String>,
}

impl ArticleCounter {
    /// Groups and counts edits.
    ///
    /// `iter` is an iterator of [`Edit`](crate::wikipedia::Edit)s, or
    /// anything that has a title attached to it.
    pub fn from_iter<T: HasTitle>(iter: impl IntoIterator<Item = T>) -> Self {
        let seen: Vec<String> = iter
            .into_iter()
            .map(|item| String::from(item.title()))
            .collect();
        let counts = seen.iter().cloned().collect::<Counter<_>>();
        let titles = seen.into_iter().unique().collect();
        ArticleCounter { titles, counts }
    }

    /// Number of distinct articles.
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    /// True if no edits were counted.
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Returns an iterator over the article counts, in first-seen order.
    pub fn counts(&self) -> IntoIter<ArticleCount> {
        self.titles
            .iter()
            .map(|title| ArticleCount {
                title: title.to_owned(),
                edits: self.counts.get(title).copied().unwrap_or_default(),
            })
            .collect::<Vec<_>>()
            .into_iter()
    }
}
