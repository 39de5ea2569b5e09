// src/fetch/mod.rs

pub mod charset;

use anyhow::{Context, Result};
use encoding_rs::{Encoding, SHIFT_JIS};
use reqwest::blocking::Client;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER,
    USER_AGENT,
};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Upper bound on a whole request, connect through body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const BROWSER_REFERER: &str = "https://npb.jp/";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9";
const BROWSER_ACCEPT_ENCODING: &str = "gzip, deflate, br";
const BROWSER_ACCEPT_LANGUAGE: &str = "ja,en-US;q=0.9,en;q=0.8";

/// Headers that make a request look like an ordinary Chrome page load
/// arriving from the league's front page.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(REFERER, HeaderValue::from_static(BROWSER_REFERER));
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(
        ACCEPT_ENCODING,
        HeaderValue::from_static(BROWSER_ACCEPT_ENCODING),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE),
    );
    headers
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub timeout: Duration,
    pub headers: HeaderMap,
    /// Used when neither the response nor the markup names an encoding
    /// and the body is not valid UTF-8.
    pub fallback_encoding: &'static Encoding,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            headers: browser_headers(),
            fallback_encoding: SHIFT_JIS,
        }
    }
}

/// Status, content type and undecoded body of a completed exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Anything that can perform a single GET. Any `Err` is a transport fault;
/// HTTP error statuses come back as `Ok` with the status set.
pub trait Transport {
    fn get(&self, url: &str) -> Result<RawResponse>;
}

/// Blocking reqwest client carrying the configured headers and timeout.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .default_headers(config.headers.clone())
            .timeout(config.timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<RawResponse> {
        let resp = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("GET {} failed", url))?;
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = resp
            .bytes()
            .with_context(|| format!("reading body from {}", url))?
            .to_vec();
        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Retrieves page markup. Every failure ends up as `None` plus an
/// `error!` event; nothing is retried.
#[derive(Debug, Clone)]
pub struct Fetcher<T = ReqwestTransport> {
    transport: T,
    fallback_encoding: &'static Encoding,
}

impl Fetcher<ReqwestTransport> {
    pub fn new() -> Result<Self> {
        Self::with_config(FetcherConfig::default())
    }

    pub fn with_config(config: FetcherConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self {
            transport,
            fallback_encoding: config.fallback_encoding,
        })
    }
}

impl<T: Transport> Fetcher<T> {
    pub fn with_transport(transport: T, fallback_encoding: &'static Encoding) -> Self {
        Self {
            transport,
            fallback_encoding,
        }
    }

    /// GET `url` and return the decoded document, or `None` on any
    /// transport fault or non-2xx status.
    #[instrument(level = "debug", skip(self))]
    pub fn fetch(&self, url: &str) -> Option<String> {
        let resp = match self.transport.get(url) {
            Ok(resp) => resp,
            Err(e) => {
                error!(%url, error = %format!("{:#}", e), "Error fetching URL");
                return None;
            }
        };

        if !resp.status.is_success() {
            error!(%url, status = %resp.status, "Error fetching URL: non-success status");
            return None;
        }

        let (text, encoding) = charset::decode(
            &resp.body,
            resp.content_type.as_deref(),
            self.fallback_encoding,
        );
        debug!(
            %url,
            bytes = resp.body.len(),
            encoding = encoding.name(),
            "fetched page"
        );
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::capture_logs;
    use anyhow::anyhow;
    use std::cell::RefCell;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Instant;

    /// Canned transport: returns `outcome` and remembers requested URLs.
    struct Canned {
        outcome: fn() -> Result<RawResponse>,
        seen: RefCell<Vec<String>>,
    }

    impl Canned {
        fn new(outcome: fn() -> Result<RawResponse>) -> Self {
            Self {
                outcome,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Canned {
        fn get(&self, url: &str) -> Result<RawResponse> {
            self.seen.borrow_mut().push(url.to_string());
            (self.outcome)()
        }
    }

    fn fetcher(outcome: fn() -> Result<RawResponse>) -> Fetcher<Canned> {
        Fetcher::with_transport(Canned::new(outcome), SHIFT_JIS)
    }

    #[test]
    fn test_browser_headers() {
        let h = browser_headers();
        assert!(h[USER_AGENT].to_str().unwrap().starts_with("Mozilla/5.0"));
        assert_eq!(h[REFERER], "https://npb.jp/");
        assert_eq!(h[ACCEPT_ENCODING], "gzip, deflate, br");
        assert_eq!(h[ACCEPT_LANGUAGE], "ja,en-US;q=0.9,en;q=0.8");
        assert!(h[ACCEPT].to_str().unwrap().starts_with("text/html"));
    }

    #[test]
    fn test_default_config() {
        let cfg = FetcherConfig::default();
        assert_eq!(cfg.timeout, Duration::from_secs(10));
        assert_eq!(cfg.headers.len(), 5);
        assert_eq!(cfg.fallback_encoding, SHIFT_JIS);
    }

    #[test]
    fn test_success_decodes_with_declared_charset() {
        let f = fetcher(|| {
            let (body, _, _) = SHIFT_JIS.encode("<td>1位</td>");
            Ok(RawResponse {
                status: StatusCode::OK,
                content_type: Some("text/html; charset=Shift_JIS".into()),
                body: body.into_owned(),
            })
        });
        assert_eq!(f.fetch("https://npb.jp/x").as_deref(), Some("<td>1位</td>"));
        assert_eq!(*f.transport.seen.borrow(), vec!["https://npb.jp/x"]);
    }

    #[test]
    fn test_not_found_is_absent() {
        let f = fetcher(|| {
            Ok(RawResponse {
                status: StatusCode::NOT_FOUND,
                content_type: Some("text/html".into()),
                body: b"<h1>Not Found</h1>".to_vec(),
            })
        });
        let (out, logs) = capture_logs(|| f.fetch("https://npb.jp/missing.html"));
        assert_eq!(out, None);
        assert!(logs.contains("ERROR"));
        assert!(logs.contains("https://npb.jp/missing.html"));
        assert!(logs.contains("404"));
    }

    #[test]
    fn test_timeout_is_absent() {
        let f = fetcher(|| Err(anyhow!("operation timed out").context("GET https://npb.jp/ failed")));
        let (out, logs) = capture_logs(|| f.fetch("https://npb.jp/"));
        assert_eq!(out, None);
        assert!(logs.contains("timed out"));
        assert!(logs.contains("https://npb.jp/"));
    }

    #[test]
    fn test_dns_failure_is_absent() {
        let f = fetcher(|| Err(anyhow!("dns error: failed to lookup address information")));
        let (out, logs) = capture_logs(|| f.fetch("https://no-such-host.invalid/"));
        assert_eq!(out, None);
        assert!(logs.contains("dns error"));
    }

    #[test]
    fn test_server_error_is_absent() {
        let f = fetcher(|| {
            Ok(RawResponse {
                status: StatusCode::SERVICE_UNAVAILABLE,
                content_type: None,
                body: Vec::new(),
            })
        });
        assert_eq!(f.fetch("https://npb.jp/"), None);
    }

    #[test]
    fn test_real_transport_times_out_silent_server() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            // accept and hold the connection without ever replying
            let held: Vec<_> = listener.incoming().take(1).collect();
            thread::sleep(Duration::from_secs(5));
            drop(held);
        });

        let f = Fetcher::with_config(FetcherConfig {
            timeout: Duration::from_millis(200),
            ..FetcherConfig::default()
        })
        .unwrap();
        let url = format!("http://{}/standings.html", addr);
        let start = Instant::now();
        let (out, logs) = capture_logs(|| f.fetch(&url));
        assert_eq!(out, None);
        assert!(start.elapsed() < Duration::from_secs(3));
        assert!(logs.contains("Error fetching URL"));
        assert!(logs.contains(&url));
    }

    #[test]
    fn test_real_transport_connection_refused() {
        let f = Fetcher::with_config(FetcherConfig {
            timeout: Duration::from_secs(2),
            ..FetcherConfig::default()
        })
        .unwrap();
        assert_eq!(f.fetch("http://127.0.0.1:1/standings.html"), None);
    }

    #[test]
    fn test_real_transport_malformed_url() {
        let f = Fetcher::new().unwrap();
        let (out, logs) = capture_logs(|| f.fetch("not a url"));
        assert_eq!(out, None);
        assert!(logs.contains("not a url"));
    }
}
