//! Header options.
//!
//! [`header`] replaces every value of a key, [`header_add`] appends one. The
//! remaining functions are conveniences for standard headers; a few of them return
//! builders that accumulate a value through chained calls:
//!
//! ```
//! use gosub_request::option::header::{accept, cache_control};
//! use std::time::Duration;
//!
//! let accept = accept(["text/html"]).and("application/json", 0.5);
//! let cache = cache_control(["private"]).max_age(Duration::from_secs(60));
//! # let _ = (accept, cache);
//! ```
//!
//! Builders are plain values. Nothing reaches the request until the builder is
//! applied as an option.
use crate::errors::Error;
use crate::option::RequestOption;
use crate::request::Request;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use http::header::{self, HeaderName, HeaderValue};
use std::fmt;
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Set,
    Add,
    Sensitive,
}

/// A single header mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    value: String,
    mode: Mode,
}

impl RequestOption for Header {
    fn apply(&self, request: &mut Request) {
        let name = match HeaderName::from_bytes(self.name.as_bytes()) {
            Ok(name) => name,
            Err(e) => return request.fail(e),
        };
        let mut value = match HeaderValue::from_bytes(self.value.as_bytes()) {
            Ok(value) => value,
            Err(source) => {
                return request.fail(Error::InvalidHeaderValue {
                    name: self.name.clone(),
                    source,
                })
            }
        };

        match self.mode {
            Mode::Set => {
                request.header.insert(name, value);
            }
            Mode::Add => {
                request.header.append(name, value);
            }
            Mode::Sensitive => {
                value.set_sensitive(true);
                request.header.insert(name, value);
            }
        }
    }
}

fn with_mode(name: &str, value: String, mode: Mode) -> Header {
    Header {
        name: name.to_string(),
        value,
        mode,
    }
}

/// Sets a header, replacing all previous values.
pub fn header(name: impl AsRef<str>, value: impl Into<String>) -> Header {
    with_mode(name.as_ref(), value.into(), Mode::Set)
}

/// Appends a value to a header.
pub fn header_add(name: impl AsRef<str>, value: impl Into<String>) -> Header {
    with_mode(name.as_ref(), value.into(), Mode::Add)
}

/// Sets a header whose value must never be logged.
pub fn header_sensitive(name: impl AsRef<str>, value: impl Into<String>) -> Header {
    with_mode(name.as_ref(), value.into(), Mode::Sensitive)
}

pub fn header_int(name: impl AsRef<str>, value: impl Into<i64>) -> Header {
    header(name, value.into().to_string())
}

pub fn header_uint(name: impl AsRef<str>, value: impl Into<u64>) -> Header {
    header(name, value.into().to_string())
}

/// Shortest representation that round-trips at the value's own precision, `1.5`, `2`.
pub fn header_float<F>(name: impl AsRef<str>, value: F) -> Header
where
    F: Into<f64> + fmt::Display,
{
    header(name, value.to_string())
}

pub fn header_bool(name: impl AsRef<str>, value: bool) -> Header {
    header(name, value.to_string())
}

fn join<I, S>(items: I, sep: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

fn quote_etags<I, S>(etags: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    join(etags.into_iter().map(|e| quote_etag(e.as_ref())), ", ")
}

fn quote_etag(etag: &str) -> String {
    if etag == "*" {
        etag.to_string()
    } else {
        format!("\"{}\"", etag)
    }
}

fn push_item(value: &mut String, item: &str) {
    if !value.is_empty() {
        value.push_str(", ");
    }
    value.push_str(item);
}

/// Builder for list headers with optional quality values (`Accept*`).
#[derive(Debug, Clone, PartialEq)]
pub struct QualityList {
    name: HeaderName,
    value: String,
}

impl QualityList {
    fn new<I, S>(name: HeaderName, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name,
            value: join(items, ", "),
        }
    }

    /// Appends an item. A non-zero `q` is written as `;q=0.50`.
    pub fn and(mut self, item: &str, q: f32) -> Self {
        push_item(&mut self.value, item);
        if q != 0.0 {
            self.value.push_str(&format!(";q={:.2}", q));
        }
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl RequestOption for QualityList {
    fn apply(&self, request: &mut Request) {
        header(self.name.as_str(), self.value.clone()).apply(request)
    }
}

pub fn accept<I, S>(media_types: I) -> QualityList
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    QualityList::new(header::ACCEPT, media_types)
}

pub fn accept_charset<I, S>(charsets: I) -> QualityList
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    QualityList::new(header::ACCEPT_CHARSET, charsets)
}

pub fn accept_encoding<I, S>(encodings: I) -> QualityList
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    QualityList::new(header::ACCEPT_ENCODING, encodings)
}

pub fn accept_language<I, S>(languages: I) -> QualityList
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    QualityList::new(header::ACCEPT_LANGUAGE, languages)
}

pub fn allow<I, S>(methods: I) -> Header
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    header(header::ALLOW, join(methods, ", "))
}

pub fn authorization(scheme: &str, credentials: &str) -> Header {
    header_sensitive(header::AUTHORIZATION, format!("{} {}", scheme, credentials))
}

pub fn authorization_basic(username: &str, password: &str) -> Header {
    authorization("Basic", &basic_credentials(username, password))
}

pub fn authorization_bearer(token: &str) -> Header {
    authorization("Bearer", token)
}

fn basic_credentials(username: &str, password: &str) -> String {
    BASE64_STANDARD.encode(format!("{}:{}", username, password))
}

/// Builder for `Cache-Control` request directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    value: String,
}

impl CacheControl {
    fn directive(mut self, directive: &str) -> Self {
        push_item(&mut self.value, directive);
        self
    }

    pub fn no_cache(self) -> Self {
        self.directive("no-cache")
    }

    pub fn no_store(self) -> Self {
        self.directive("no-store")
    }

    pub fn max_age(self, max_age: Duration) -> Self {
        self.directive(&format!("max-age={}", max_age.as_secs()))
    }

    pub fn max_stale(self, max_stale: Duration) -> Self {
        self.directive(&format!("max-stale={}", max_stale.as_secs()))
    }

    pub fn min_fresh(self, min_fresh: Duration) -> Self {
        self.directive(&format!("min-fresh={}", min_fresh.as_secs()))
    }

    pub fn no_transform(self) -> Self {
        self.directive("no-transform")
    }

    pub fn only_if_cached(self) -> Self {
        self.directive("only-if-cached")
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl RequestOption for CacheControl {
    fn apply(&self, request: &mut Request) {
        header(header::CACHE_CONTROL, self.value.clone()).apply(request)
    }
}

pub fn cache_control<I, S>(directives: I) -> CacheControl
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    CacheControl {
        value: join(directives, ", "),
    }
}

pub fn content_encoding<I, S>(encodings: I) -> Header
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    header(header::CONTENT_ENCODING, join(encodings, ", "))
}

pub fn content_language<I, S>(languages: I) -> Header
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    header(header::CONTENT_LANGUAGE, join(languages, ", "))
}

pub fn content_length(bytes: u64) -> Header {
    header_uint(header::CONTENT_LENGTH, bytes)
}

pub fn content_location(location: &str) -> Header {
    header(header::CONTENT_LOCATION, location)
}

/// Builder for `Content-Type` with optional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    value: String,
}

impl ContentType {
    pub fn charset(mut self, charset: &str) -> Self {
        self.value.push_str("; charset=");
        self.value.push_str(charset);
        self
    }

    pub fn boundary(mut self, boundary: &str) -> Self {
        self.value.push_str("; boundary=");
        self.value.push_str(boundary);
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl RequestOption for ContentType {
    fn apply(&self, request: &mut Request) {
        header(header::CONTENT_TYPE, self.value.clone()).apply(request)
    }
}

pub fn content_type(media_type: &str) -> ContentType {
    ContentType {
        value: media_type.to_string(),
    }
}

/// Sets `Cookie` from name/value pairs, `a=1; b=2`.
pub fn cookie<I, N, V>(cookies: I) -> Header
where
    I: IntoIterator<Item = (N, V)>,
    N: AsRef<str>,
    V: AsRef<str>,
{
    let pairs = cookies
        .into_iter()
        .map(|(n, v)| format!("{}={}", n.as_ref(), v.as_ref()));
    header_sensitive(header::COOKIE, join(pairs, "; "))
}

pub fn expect(expect: &str) -> Header {
    header(header::EXPECT, expect)
}

/// Builder for the `Forwarded` header. Empty parameters are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forwarded {
    value: String,
}

impl Forwarded {
    /// Appends another forwarded element.
    pub fn and(mut self, by: &str, for_: &str, host: &str, proto: &str) -> Self {
        let element = [("by", by), ("for", for_), ("host", host), ("proto", proto)]
            .into_iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(";");
        push_item(&mut self.value, &element);
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl RequestOption for Forwarded {
    fn apply(&self, request: &mut Request) {
        header(header::FORWARDED, self.value.clone()).apply(request)
    }
}

pub fn forwarded(by: &str, for_: &str, host: &str, proto: &str) -> Forwarded {
    Forwarded::default().and(by, for_, host, proto)
}

pub fn from(email: &str) -> Header {
    header(header::FROM, email)
}

/// Builder for the `Host` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    value: String,
}

impl Host {
    pub fn port(mut self, port: u16) -> Self {
        self.value.push_str(&format!(":{}", port));
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl RequestOption for Host {
    fn apply(&self, request: &mut Request) {
        header(header::HOST, self.value.clone()).apply(request)
    }
}

pub fn host(host: &str) -> Host {
    Host {
        value: host.to_string(),
    }
}

pub fn if_match<I, S>(etags: I) -> Header
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    header(header::IF_MATCH, quote_etags(etags))
}

pub fn if_modified_since(timestamp: SystemTime) -> Header {
    header(header::IF_MODIFIED_SINCE, httpdate::fmt_http_date(timestamp))
}

pub fn if_none_match<I, S>(etags: I) -> Header
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    header(header::IF_NONE_MATCH, quote_etags(etags))
}

/// Sets `If-Range` to the timestamp, then appends the entity tag as a second value.
pub fn if_range(timestamp: SystemTime, etag: &str) -> [Header; 2] {
    [
        header(header::IF_RANGE, httpdate::fmt_http_date(timestamp)),
        header_add(header::IF_RANGE, quote_etag(etag)),
    ]
}

pub fn if_unmodified_since(timestamp: SystemTime) -> Header {
    header(header::IF_UNMODIFIED_SINCE, httpdate::fmt_http_date(timestamp))
}

pub fn origin(origin: &str) -> Header {
    header(header::ORIGIN, origin)
}

pub fn proxy_authorization(scheme: &str, credentials: &str) -> Header {
    header_sensitive(
        header::PROXY_AUTHORIZATION,
        format!("{} {}", scheme, credentials),
    )
}

pub fn proxy_authorization_basic(username: &str, password: &str) -> Header {
    proxy_authorization("Basic", &basic_credentials(username, password))
}

pub fn proxy_authorization_bearer(token: &str) -> Header {
    proxy_authorization("Bearer", token)
}

/// Builder for byte `Range` requests. `None` leaves that end of a range open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Range {
    ranges: Vec<(Option<u64>, Option<u64>)>,
}

impl Range {
    pub fn and(mut self, start: Option<u64>, end: Option<u64>) -> Self {
        self.ranges.push((start, end));
        self
    }

    pub fn value(&self) -> String {
        let ranges = self.ranges.iter().map(|(start, end)| {
            format!(
                "{}-{}",
                start.map(|s| s.to_string()).unwrap_or_default(),
                end.map(|e| e.to_string()).unwrap_or_default()
            )
        });
        format!("bytes={}", join(ranges, ", "))
    }
}

impl RequestOption for Range {
    fn apply(&self, request: &mut Request) {
        header(header::RANGE, self.value()).apply(request)
    }
}

pub fn range(start: Option<u64>, end: Option<u64>) -> Range {
    Range::default().and(start, end)
}

pub fn referer(referer: &str) -> Header {
    header(header::REFERER, referer)
}

pub fn user_agent(user_agent: &str) -> Header {
    header(header::USER_AGENT, user_agent)
}

pub fn via(via: &str) -> Header {
    header(header::VIA, via)
}

pub fn x_forwarded_for<I, S>(client: &str, proxies: I) -> Header
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut value = client.to_string();
    for proxy in proxies {
        push_item(&mut value, proxy.as_ref());
    }
    header("X-Forwarded-For", value)
}

pub fn x_forwarded_host(host: &str) -> Header {
    header("X-Forwarded-Host", host)
}

pub fn x_forwarded_proto(protocol: &str) -> Header {
    header("X-Forwarded-Proto", protocol)
}
