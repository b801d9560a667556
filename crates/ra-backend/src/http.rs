//! Bearer-token JSON client shared by the HTTP backends.

use std::time::Duration;

use reqwest::header::LOCATION;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{BackendError, BackendResult};
use crate::response::{ApiFailure, ApiResponse, NO_RESPONSE};

/// Raw successful response.
#[derive(Debug)]
struct RawResponse {
    status: u16,
    location: Option<String>,
    text: String,
}

/// Authenticated JSON client rooted at a base URL.
#[derive(Debug, Clone)]
pub struct AdminHttp {
    client: reqwest::Client,
    base_url: Url,
    token: String,
}

impl AdminHttp {
    /// Creates a client. `timeout` of `None` keeps the transport default.
    ///
    /// ## Errors
    ///
    /// Fails when `base_url` is not an absolute `http(s)` URL with a host.
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Option<Duration>) -> BackendResult<Self> {
        let base_url = parse_base_url(base_url)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            token: token.into(),
        })
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds an endpoint URL by appending `segments` to the base path.
    /// Each segment is percent-encoded.
    #[must_use]
    pub fn endpoint<I, S>(&self, segments: I) -> Url
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `GET` returning a JSON body.
    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> ApiResponse<T> {
        decode_json(self.send::<()>(Method::GET, url, None).await)
    }

    /// `POST` returning a JSON body.
    pub async fn post<B, T>(&self, url: Url, body: &B) -> ApiResponse<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        decode_json(self.send(Method::POST, url, Some(body)).await)
    }

    /// `POST` whose response carries no body; returns the `Location` header.
    pub async fn post_location<B>(&self, url: Url, body: &B) -> ApiResponse<Option<String>>
    where
        B: Serialize + Sync + ?Sized,
    {
        match self.send(Method::POST, url, Some(body)).await {
            Ok(raw) => ApiResponse::ok(raw.status, raw.location),
            Err(failure) => failure.into(),
        }
    }

    /// `PUT` returning a JSON body.
    pub async fn put<B, T>(&self, url: Url, body: &B) -> ApiResponse<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        decode_json(self.send(Method::PUT, url, Some(body)).await)
    }

    /// `PUT` ignoring the response body. `body` of `None` sends no payload.
    pub async fn put_empty<B>(&self, url: Url, body: Option<&B>) -> ApiResponse<()>
    where
        B: Serialize + Sync + ?Sized,
    {
        discard_body(self.send(Method::PUT, url, body).await)
    }

    /// `DELETE`; the body is ignored.
    pub async fn delete(&self, url: Url) -> ApiResponse<()> {
        discard_body(self.send::<()>(Method::DELETE, url, None).await)
    }

    async fn send<B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<RawResponse, ApiFailure>
    where
        B: Serialize + Sync + ?Sized,
    {
        debug!(%method, %url, "backend request");

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(%method, %url, error = %e, "backend unreachable");
                return Err(ApiFailure::new(NO_RESPONSE, e.to_string()));
            }
        };

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(%method, %url, status = status.as_u16(), error = %e, "failed to read backend response");
                return Err(ApiFailure::new(NO_RESPONSE, e.to_string()));
            }
        };

        if !status.is_success() {
            warn!(%method, %url, status = status.as_u16(), response = %text, "backend returned an error");
            return Err(ApiFailure::new(status.as_u16(), describe_error(status, &text)));
        }

        Ok(RawResponse {
            status: status.as_u16(),
            location,
            text,
        })
    }
}

/// Parses a configured base URL, requiring an `http(s)` scheme and a host.
pub fn parse_base_url(raw: &str) -> BackendResult<Url> {
    let invalid = |reason: String| BackendError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) || url.cannot_be_a_base() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Builds a failure description, preferring the backend's own message.
fn describe_error(status: reqwest::StatusCode, text: &str) -> String {
    let from_body = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|body| {
            ["errorMessage", "error_description", "error", "message"]
                .iter()
                .find_map(|key| body.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        });

    match from_body {
        Some(message) => message,
        None if !text.trim().is_empty() => text.trim().to_string(),
        None => format!(
            "HTTP {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("error")
        ),
    }
}

fn decode_json<T: DeserializeOwned>(raw: Result<RawResponse, ApiFailure>) -> ApiResponse<T> {
    let raw = match raw {
        Ok(raw) => raw,
        Err(failure) => return failure.into(),
    };

    match serde_json::from_str(&raw.text) {
        Ok(value) => ApiResponse::ok(raw.status, value),
        Err(e) => {
            warn!(status = raw.status, error = %e, "undecodable backend response");
            ApiResponse::error(raw.status, format!("malformed response body: {e}"))
        }
    }
}

fn discard_body(raw: Result<RawResponse, ApiFailure>) -> ApiResponse<()> {
    match raw {
        Ok(raw) => ApiResponse::ok(raw.status, ()),
        Err(failure) => failure.into(),
    }
}

/// Returns the last path segment of a `Location` header.
#[must_use]
pub fn id_from_location(location: &str) -> Option<String> {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
