use crate::clock::{Clock, DateTime, Utc};
use crate::http::{HTTPError, HTTPResult};
use crate::wikipedia::EditFetcher;
use crate::wikipedia::service::Service;
use log::{Level, LevelFilter, Log, Metadata, Record};
use reqwest::{StatusCode, Url};
use std::cell::RefCell;
use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Once;
use std::thread;

thread_local! {
    static LOGGED: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

/// Records every message logged on the current thread, then hands it to
/// env_logger.
struct CapturingLogger {
    inner: env_logger::Logger,
}

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        LOGGED.with_borrow_mut(|logged| logged.push((record.level(), record.args().to_string())));
        self.inner.log(record);
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

static LOGGER: Once = Once::new();

pub fn do_logging() {
    LOGGER.call_once(|| {
        let inner = env_logger::builder().is_test(true).build();
        if log::set_logger(Box::leak(Box::new(CapturingLogger { inner }))).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
}

/// Messages logged at `level` by the current test, in order.
///
/// Only populated after [`do_logging()`] has been called.
pub fn logged(level: Level) -> Vec<String> {
    LOGGED.with_borrow(|logged| {
        logged
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message.clone())
            .collect()
    })
}

/// Answers the first request made to the returned URL with `response`,
/// written verbatim, and then closes the connection.
pub fn serve_once(response: &'static str) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").expect("could not bind test server");
    let addr = listener.local_addr().expect("test server has no address");
    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut request = Vec::new();
        let mut buf = [0; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let _ = stream.write_all(response.as_bytes());
    });
    Url::parse(&format!("http://{addr}/w/api.php")).expect("invalid test server URL")
}

pub fn load_data(file: &str) -> String {
    let filename = format!("tests/data/{file}.json");
    fs::read_to_string(&filename).expect(&format!("could not load test data from {filename}"))
}

fn test_endpoint() -> Url {
    Url::parse("https://test.wikipedia.invalid/w/api.php").expect("invalid test endpoint")
}

/// Serves pages of edits from `tests/data/usercontribs_<suffix>*.json`.
///
/// The first page is `usercontribs_<suffix>.json`; the page for a
/// continuation token is `usercontribs_<suffix>_<token>.json`, with the
/// `|` in the token replaced by `_`.
#[derive(Debug)]
pub struct TestService<'a> {
    suffix: &'a str,
    endpoint: Url,
    requests: RefCell<Vec<Url>>,
}

impl<'a> TestService<'a> {
    pub fn new(suffix: &'a str) -> Self {
        Self {
            suffix,
            endpoint: test_endpoint(),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Every URI requested so far, in order.
    pub fn requests(&self) -> Vec<Url> {
        self.requests.borrow().clone()
    }
}

impl<'a> Service for TestService<'a> {
    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn get(&self, uri: &Url) -> HTTPResult<String> {
        self.requests.borrow_mut().push(uri.clone());
        let token = uri
            .query_pairs()
            .find(|(key, _)| key == "uccontinue")
            .map(|(_, token)| token.replace('|', "_"));
        let filename = match token {
            Some(token) => format!("usercontribs_{}_{token}", self.suffix),
            None => format!("usercontribs_{}", self.suffix),
        };
        Ok(load_data(&filename))
    }
}

/// Fails every request with the same HTTP status.
#[derive(Debug)]
pub struct FailingService {
    status: StatusCode,
    endpoint: Url,
}

impl FailingService {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            endpoint: test_endpoint(),
        }
    }
}

impl Service for FailingService {
    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn get(&self, _uri: &Url) -> HTTPResult<String> {
        Err(HTTPError::Http(self.status))
    }
}

#[derive(Debug)]
pub struct FrozenClock {
    datetime: DateTime<Utc>,
}

impl FrozenClock {
    pub fn new(datetime: DateTime<Utc>) -> Self {
        FrozenClock { datetime }
    }
}

impl Default for FrozenClock {
    fn default() -> Self {
        let datetime = DateTime::parse_from_rfc3339("2020-01-05T12:00:00Z")
            .expect("invalid date supplied")
            .with_timezone(&Utc);
        Self::new(datetime)
    }
}

impl Clock for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        self.datetime
    }
}

impl EditFetcher<TestService<'static>, FrozenClock> {
    /// Returns a fetcher that serves the pages stored under `suffix` in
    /// `tests/data`, with the clock frozen at 2020-01-05T12:00:00Z.
    pub fn test(suffix: &'static str) -> Self {
        EditFetcher::new_with_service(TestService::new(suffix), FrozenClock::default())
    }
}
