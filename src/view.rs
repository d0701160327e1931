//! Draws viewable objects into a terminal window.

use crate::count::{ArticleCount, ArticleCounter, DailyCount};
use crate::wikipedia::Edit;
use itertools::Itertools;

/// View renderer options.
#[derive(Debug, Default)]
pub struct ViewOptions {
    oneline: bool,
}

impl ViewOptions {
    /// Incrementally builds a new set of view options.
    ///
    /// # Examples
    ///
    /// ```
    /// use wikiedits::view::ViewOptions;
    /// let opts = ViewOptions::build().oneline(true).build();
    /// ```
    pub fn build() -> ViewOptionsBuilder {
        ViewOptionsBuilder::default()
    }
}

/// A builder for view options.
///
/// You probably don't want to use this directly; call [`ViewOptions::build()`]
/// and construct it incrementally instead.
#[derive(Debug, Default)]
#[must_use]
pub struct ViewOptionsBuilder {
    oneline: bool,
}

impl ViewOptionsBuilder {
    /// Sets the "oneline" option to true or false.
    pub fn oneline(mut self, oneline: bool) -> Self {
        self.oneline = oneline;
        self
    }

    /// Finalizes the [`ViewOptions`].
    pub fn build(self) -> ViewOptions {
        ViewOptions {
            oneline: self.oneline,
        }
    }
}

/// Marks an item that can be converted into a string for display on a terminal.
pub trait Viewable {
    /// Converts the item into a string for display on a terminal.
    fn view(&self, opts: &ViewOptions) -> String;
}

impl Viewable for Edit {
    /// Shows every field of the edit as pretty-printed JSON, or just its
    /// timestamp and title if `oneline` is set.
    fn view(&self, opts: &ViewOptions) -> String {
        if opts.oneline {
            format!("{}\t{}", self.timestamp(), self.title())
        } else {
            // Serializing a string-keyed JSON map cannot fail.
            serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{self:?}"))
        }
    }
}

impl Viewable for DailyCount {
    fn view(&self, _: &ViewOptions) -> String {
        let (date, count) = self;
        format!("{date}\t{count}")
    }
}

impl Viewable for ArticleCount {
    fn view(&self, _: &ViewOptions) -> String {
        format!("{}:\t{}", self.title(), self.edits())
    }
}

impl Viewable for ArticleCounter {
    fn view(&self, opts: &ViewOptions) -> String {
        self.counts().map(|count| count.view(opts)).join("\n")
    }
}
