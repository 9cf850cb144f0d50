//! Builder for [`Request`] values.

use anyhow::{Context, Result, anyhow};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::http::Request;

const APPLICATION_JSON: &str = "application/json";

/// Assembles a request step by step.
///
/// Errors from chained calls are collected and reported together by
/// [`build`](RequestBuilder::build).
#[derive(Debug)]
pub struct RequestBuilder {
    url: String,
    method: Method,
    body: Option<Vec<u8>>,
    headers: Vec<(String, String)>,
    deadline: Option<Instant>,
    errors: Vec<anyhow::Error>,
}

impl RequestBuilder {
    /// Starts a GET request to `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            body: None,
            headers: Vec::new(),
            deadline: None,
            errors: Vec::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn post(self) -> Self {
        self.method(Method::POST)
    }

    pub fn put(self) -> Self {
        self.method(Method::PUT)
    }

    pub fn patch(self) -> Self {
        self.method(Method::PATCH)
    }

    pub fn delete(self) -> Self {
        self.method(Method::DELETE)
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `value` as the JSON body and sets `Content-Type` and `Accept`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Some(bytes);
                self.headers
                    .push((CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()));
                self.headers
                    .push((ACCEPT.to_string(), APPLICATION_JSON.to_string()));
            }
            Err(e) => self
                .errors
                .push(anyhow::Error::from(e).context("Failed to serialize JSON body")),
        }
        self
    }

    /// Adds a header; repeated names keep every value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(values.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Stops retrying once `deadline` passes.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Builds the request, tied to `cancel`.
    pub fn build(self, cancel: CancellationToken) -> Result<Request> {
        let mut errors = self.errors;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            match parse_header(name, value) {
                Ok((name, value)) => {
                    headers.append(name, value);
                }
                Err(e) => errors.push(e),
            }
        }

        if !errors.is_empty() {
            let message = errors
                .iter()
                .map(|e| format!("{:#}", e))
                .collect::<Vec<_>>()
                .join("\n");
            return Err(anyhow!(message));
        }

        let url =
            Url::parse(&self.url).with_context(|| format!("Invalid request URL: {}", self.url))?;

        let mut request = Request::new(self.method, url)
            .with_headers(headers)
            .with_cancellation(cancel);
        if let Some(body) = self.body {
            request = request.with_body(body);
        }
        if let Some(deadline) = self.deadline {
            request = request.with_deadline(deadline);
        }

        Ok(request)
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .with_context(|| format!("Invalid header name: {:?}", name))?;
    let header_value = HeaderValue::from_str(value)
        .with_context(|| format!("Invalid value for header {}", name))?;
    Ok((header_name, header_value))
}
