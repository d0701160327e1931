// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 The wikiedits developers

//! wikiedits is a command-line tool for retrieving a Wikipedian's whole
//! edit history. It follows the MediaWiki API's continuation tokens from
//! page to page until every edit has been read, printing edits as they
//! arrive. It can also count a user's edits by day, or count how many
//! times each article was edited on a single day.
//!
//! # Examples
//!
//! (In all examples, replace `UserName` with the actual username of a
//! Wikipedian.)
//!
//! Save every edit a user has ever made, newest first:
//!
//! ```bash
//! wikiedits UserName > edits.txt
//! ```
//!
//! Only retrieve the user's last 500 edits, one per line:
//!
//! ```bash
//! wikiedits --limit 500 --oneline UserName
//! ```
//!
//! Count the user's edits per day over the last 30 days:
//!
//! ```bash
//! wikiedits --daily --days 30 UserName
//! ```
//!
//! Count how many times the user edited each article on Valentine's Day
//! 2017:
//!
//! ```bash
//! wikiedits --date 2017-02-14 UserName
//! ```
//!
//! Log every request sent to the API to a file:
//!
//! ```bash
//! wikiedits --verbose --log requests.log UserName
//! ```
//!
//! Get usage and help for the tool:
//!
//! ```bash
//! wikiedits --help
//! ```
//!
//! # Other wikis
//!
//! By default, edits are retrieved from the English Wikipedia. Set
//! `$WIKIEDITS_API_URL` to the `api.php` endpoint of any other MediaWiki
//! site to query it instead:
//!
//! ```bash
//! WIKIEDITS_API_URL=https://de.wikipedia.org/w/api.php wikiedits UserName
//! ```
//!
//! # License
//!
//! wikiedits is licensed under the terms of the [Apache License 2.0].
//!
//! [Apache License 2.0]: https://www.apache.org/licenses/LICENSE-2.0

pub mod cli;
pub mod clock;
pub mod conf;
pub mod count;
pub mod http;
pub mod view;
pub mod wikipedia;

#[cfg(test)]
mod test_utils;
