//! Drives the command-line program.

use crate::clock::{Clock, NaiveDate, SystemClock};
use crate::view::{ViewOptions, Viewable};
use crate::wikipedia::service::{Service, WikipediaService};
use crate::wikipedia::{self, EditFetcher, QueryFilters};
use clap::{Args, Parser};
use env_logger::Target;
use log::{LevelFilter, error};
use std::fs::File;
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process;
use thiserror::Error;

/// Prints `message` to stderr and exits with `error_code`.
///
/// Only used before logging is set up; afterwards errors are logged.
pub fn die(error_code: i32, message: &str) -> ! {
    eprintln!("{}", message);
    process::exit(error_code);
}

/// Program configuration.
#[derive(Debug, Parser)]
#[command(version)]
#[command(
    about = "Get a user's whole edit history",
    long_about = "Get a user's whole edit history. By default, prints every edit the user has \
                  made, newest first. Edits can also be counted by day, or by article for a \
                  single day.",
    after_help = "Example: wikiedits UserName > edits.txt"
)]
pub struct Config {
    /// The user to query
    user: String,

    /// Limit the number of edits retrieved to this number
    #[arg(short, long, value_name = "N")]
    limit: Option<NonZeroUsize>,

    /// Count how many times each article was edited on this day
    #[arg(short, long, value_name = "YYYY-MM-DD")]
    date: Option<NaiveDate>,

    /// Only retrieve edits made in the last DAYS days
    #[arg(short = 't', long, value_name = "DAYS", value_parser = clap::value_parser!(u32).range(1..))]
    days: Option<u32>,

    /// Count how many edits were made on each day
    #[arg(long, conflicts_with = "date")]
    daily: bool,

    /// Print each edit's timestamp and title on a single line
    #[arg(long, conflicts_with_all = ["date", "daily"])]
    oneline: bool,

    /// Print log messages to this file instead of to stderr. Warning: Will overwrite the file.
    #[arg(short = 'L', long, value_name = "FILE")]
    log: Option<PathBuf>,

    #[command(flatten)]
    volume: Volume,
}

impl Config {
    /// The user whose edits are retrieved.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Filters selected by the command-line options.
    ///
    /// `--date` is not included; it selects the per-article report, which
    /// applies the date itself.
    pub fn filters(&self) -> QueryFilters {
        QueryFilters::new(&self.user)
            .limit(self.limit.map(NonZeroUsize::get))
            .time_limit(self.days)
    }

    /// How much should be logged.
    pub fn level_filter(&self) -> LevelFilter {
        self.volume.level_filter()
    }

    /// Sets up the process-wide logger.
    ///
    /// Messages from this crate are logged at the selected volume;
    /// messages from dependencies only at warning level and above. Only
    /// the message itself is written, one per line.
    ///
    /// Returns an error if the `--log` file cannot be created.
    pub fn init_logging(&self) -> io::Result<()> {
        let level = self.level_filter();
        let mut builder = env_logger::Builder::new();
        builder
            .filter_level(level.min(LevelFilter::Warn))
            .filter_module(env!("CARGO_CRATE_NAME"), level)
            .format(|buf, record| writeln!(buf, "{}", record.args()));

        if let Some(path) = &self.log {
            let file = File::create(path)?;
            builder.target(Target::Pipe(Box::new(file)));
        }

        builder.init();
        Ok(())
    }
}

/// Log volume flags.
///
/// The flags override one another, so the last one given wins.
#[derive(Args, Debug, Default)]
struct Volume {
    /// Only log fatal errors
    #[arg(short, long, overrides_with_all = ["verbose", "debug"])]
    quiet: bool,

    /// Also log every request sent to the API
    #[arg(short, long, overrides_with_all = ["quiet", "debug"])]
    verbose: bool,

    /// Also log debugging information
    #[arg(short = 'D', long, overrides_with_all = ["quiet", "verbose"])]
    debug: bool,
}

impl Volume {
    fn level_filter(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::Debug
        } else if self.verbose {
            LevelFilter::Info
        } else if self.quiet {
            LevelFilter::Error
        } else {
            LevelFilter::Warn
        }
    }
}

/// An error that stops the program.
#[derive(Debug, Error)]
pub enum Error {
    /// Edits could not be retrieved.
    #[error(transparent)]
    Wikipedia(#[from] wikipedia::Error),

    /// Output could not be written.
    #[error("Could not write output: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// True if output could not be written because the reader went away.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, Error::Io(err) if err.kind() == io::ErrorKind::BrokenPipe)
    }
}

/// Runs the command-line program.
#[derive(Debug)]
pub struct Runner<S: Service = WikipediaService, C: Clock = SystemClock> {
    config: Config,
    fetcher: EditFetcher<S, C>,
}

impl Runner {
    /// Create a new program runner using the given `config`.
    ///
    /// Returns an error if the API endpoint is misconfigured or an HTTP
    /// client cannot be created.
    pub fn new(config: Config) -> Result<Runner, Error> {
        let fetcher = EditFetcher::new()?;
        Ok(Self::new_with_fetcher(config, fetcher))
    }
}

impl<S: Service, C: Clock> Runner<S, C> {
    /// Create a new program runner that retrieves edits with `fetcher`.
    pub fn new_with_fetcher(config: Config, fetcher: EditFetcher<S, C>) -> Self {
        Self { config, fetcher }
    }

    /// Run the command-line program, writing to stdout.
    pub fn run(&self) -> Result<(), Error> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.run_to(&mut out)
    }

    /// Run the command-line program, writing to `out`.
    ///
    /// Output is written as edits arrive, so a failure part-way through
    /// leaves everything retrieved before it in `out`.
    pub fn run_to(&self, out: &mut impl Write) -> Result<(), Error> {
        match (self.config.date, self.config.daily) {
            (Some(date), _) => self.run_articles(date, out)?,
            (None, true) => self.run_daily(out)?,
            (None, false) => self.run_log(out)?,
        }
        out.flush()?;
        Ok(())
    }

    fn run_log(&self, out: &mut impl Write) -> Result<(), Error> {
        let opts = ViewOptions::build().oneline(self.config.oneline).build();
        for edit in self.fetcher.fetch(&self.config.filters()) {
            writeln!(out, "{}", edit?.view(&opts))?;
        }
        Ok(())
    }

    fn run_daily(&self, out: &mut impl Write) -> Result<(), Error> {
        let opts = ViewOptions::default();
        for day in self.fetcher.edits_per_day(&self.config.filters()) {
            writeln!(out, "{}", day?.view(&opts))?;
        }
        Ok(())
    }

    fn run_articles(&self, date: NaiveDate, out: &mut impl Write) -> Result<(), Error> {
        let opts = ViewOptions::default();
        let articles = self.fetcher.edits_for_day(&self.config.filters(), date)?;
        for article in articles.counts() {
            writeln!(out, "{}", article.view(&opts))?;
        }
        Ok(())
    }
}

/// Runs the program described by `config` and exits with status 1 on
/// failure.
///
/// A closed pipe on stdout (e.g., `wikiedits User | head`) is not a
/// failure.
pub fn run(config: Config) {
    if let Err(err) = config.init_logging() {
        die(1, &format!("Could not open log file: {err}"));
    }

    match Runner::new(config).and_then(|runner| runner.run()) {
        Ok(()) => {}
        Err(err) if err.is_broken_pipe() => {}
        Err(err) => {
            error!("{err}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    mod config {
        use super::super::*;
        use pretty_assertions::assert_eq;

        fn parse(args: &[&str]) -> Config {
            Config::try_parse_from(std::iter::once("wikiedits").chain(args.iter().copied()))
                .expect("could not parse arguments")
        }

        #[test]
        fn it_requires_a_user() {
            assert!(Config::try_parse_from(["wikiedits"]).is_err());
        }

        #[test]
        fn it_parses_a_user() {
            let config = parse(&["Qwerty0"]);
            assert_eq!(config.user(), "Qwerty0");
            assert_eq!(config.filters(), QueryFilters::new("Qwerty0"));
        }

        #[test]
        fn it_parses_filters() {
            let config = parse(&["Qwerty0", "--limit", "10", "-t", "30"]);
            let expected = QueryFilters::new("Qwerty0")
                .limit(Some(10))
                .time_limit(Some(30));
            assert_eq!(config.filters(), expected);
        }

        #[test]
        fn it_parses_a_date() {
            let config = parse(&["Qwerty0", "-d", "2017-02-14"]);
            assert_eq!(config.date, NaiveDate::from_ymd_opt(2017, 2, 14));
            assert_eq!(config.filters().day(), None);
        }

        #[test]
        fn it_rejects_invalid_dates() {
            assert!(Config::try_parse_from(["wikiedits", "Qwerty0", "-d", "14/02/2017"]).is_err());
        }

        #[test]
        fn it_rejects_a_zero_limit() {
            assert!(Config::try_parse_from(["wikiedits", "Qwerty0", "-l", "0"]).is_err());
        }

        #[test]
        fn it_rejects_a_zero_day_time_limit() {
            assert!(Config::try_parse_from(["wikiedits", "Qwerty0", "--days", "0"]).is_err());
        }

        #[test]
        fn it_rejects_daily_counts_for_a_single_date() {
            let result =
                Config::try_parse_from(["wikiedits", "Qwerty0", "--daily", "-d", "2017-02-14"]);
            assert!(result.is_err());
        }

        #[test]
        fn it_logs_warnings_by_default() {
            assert_eq!(parse(&["Qwerty0"]).level_filter(), LevelFilter::Warn);
        }

        #[test]
        fn it_logs_only_errors_when_quiet() {
            assert_eq!(parse(&["Qwerty0", "-q"]).level_filter(), LevelFilter::Error);
        }

        #[test]
        fn it_logs_requests_when_verbose() {
            assert_eq!(
                parse(&["Qwerty0", "--verbose"]).level_filter(),
                LevelFilter::Info
            );
        }

        #[test]
        fn it_logs_everything_when_debugging() {
            assert_eq!(parse(&["Qwerty0", "-D"]).level_filter(), LevelFilter::Debug);
        }

        #[test]
        fn it_lets_the_last_volume_flag_win() {
            assert_eq!(
                parse(&["Qwerty0", "--debug", "--quiet"]).level_filter(),
                LevelFilter::Error
            );
            assert_eq!(
                parse(&["Qwerty0", "-q", "-v"]).level_filter(),
                LevelFilter::Info
            );
        }

        #[test]
        fn it_parses_a_log_file() {
            let config = parse(&["Qwerty0", "-L", "edits.log"]);
            assert_eq!(config.log, Some(PathBuf::from("edits.log")));
        }
    }

    mod runner {
        use super::super::*;
        use crate::test_utils::{FrozenClock, TestService};
        use indoc::indoc;
        use pretty_assertions::assert_eq;

        fn run(suffix: &'static str, args: &[&str]) -> (Result<(), Error>, String) {
            let config = Config::try_parse_from(std::iter::once("wikiedits").chain(args.iter().copied()))
                .expect("could not parse arguments");
            let runner = Runner::new_with_fetcher(config, EditFetcher::test(suffix));
            let mut out = Vec::new();
            let result = runner.run_to(&mut out);
            (result, String::from_utf8(out).expect("output is not UTF-8"))
        }

        #[test]
        fn it_prints_edits_on_one_line() {
            let (result, output) = run("Qwerty0", &["Qwerty0", "--oneline", "-l", "3"]);
            assert!(result.is_ok());
            let expected = indoc! {"
                2020-01-03T10:00:00Z\tRust (programming language)
                2020-01-03T09:00:00Z\tFerris
                2020-01-02T12:00:00Z\tRust (programming language)
            "};
            assert_eq!(output, expected);
        }

        #[test]
        fn it_prints_every_field_of_each_edit() {
            let (result, output) = run("Qwerty0", &["Qwerty0", "-l", "1"]);
            assert!(result.is_ok());
            assert!(output.starts_with("{\n"), "{output}");
            assert!(output.contains(r#""revid": 1008"#), "{output}");
            assert!(output.contains(r#""comment": "/* History */ copyedit""#), "{output}");
        }

        #[test]
        fn it_prints_edits_per_day() {
            let (result, output) = run("Qwerty0", &["Qwerty0", "--daily"]);
            assert!(result.is_ok());
            let expected = indoc! {"
                2020-01-03\t2
                2020-01-02\t2
                2020-01-01\t3
                2019-12-30\t1
            "};
            assert_eq!(output, expected);
        }

        #[test]
        fn it_prints_edits_per_day_within_the_time_limit() {
            let (result, output) = run("Qwerty0", &["Qwerty0", "--daily", "--days", "3"]);
            assert!(result.is_ok());
            assert_eq!(output, "2020-01-03\t2\n2020-01-02\t1\n");
        }

        #[test]
        fn it_prints_edits_per_article_for_a_day() {
            let (result, output) = run("day", &["Qwerty0", "--date", "2020-01-01"]);
            assert!(result.is_ok());
            assert_eq!(output, "Rust:\t3\nFerris:\t2\nCargo:\t1\n");
        }

        #[test]
        fn it_prints_nothing_for_users_without_edits() {
            let (result, output) = run("empty", &["Nobody", "--daily"]);
            assert!(result.is_ok());
            assert_eq!(output, "");
        }

        #[test]
        fn it_keeps_output_written_before_an_api_error() {
            let (result, output) = run("error", &["Qwerty0", "--oneline"]);
            let err = result.unwrap_err();
            assert!(!err.is_broken_pipe());
            assert!(err.to_string().contains("API Error: x"), "{err}");
            assert_eq!(
                output,
                "2020-01-02T10:00:00Z\tRust\n2020-01-01T10:00:00Z\tFerris\n"
            );
        }

        #[test]
        fn it_prints_no_partial_day_before_an_api_error() {
            let (result, output) = run("error", &["Qwerty0", "--daily"]);
            assert!(result.is_err());
            assert_eq!(output, "2020-01-02\t1\n");
        }

        #[test]
        fn it_prints_no_article_counts_after_an_api_error() {
            let (result, output) = run("error", &["Qwerty0", "--date", "2020-01-01"]);
            assert!(result.is_err());
            assert_eq!(output, "");
        }

        #[test]
        fn it_recognizes_broken_pipes() {
            let err = Error::from(io::Error::from(io::ErrorKind::BrokenPipe));
            assert!(err.is_broken_pipe());

            let err = Error::from(io::Error::from(io::ErrorKind::PermissionDenied));
            assert!(!err.is_broken_pipe());
        }

        #[test]
        fn it_uses_the_frozen_clock() {
            let config = Config::try_parse_from(["wikiedits", "Qwerty0", "--days", "3"]).unwrap();
            let fetcher = EditFetcher::new_with_service(TestService::new("Qwerty0"), FrozenClock::default());
            let runner = Runner::new_with_fetcher(config, fetcher);
            let mut out = Vec::new();
            runner.run_to(&mut out).unwrap();
            assert_eq!(String::from_utf8(out).unwrap().matches("\"revid\"").count(), 3);
        }
    }
}
