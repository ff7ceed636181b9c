//! Shared HTTP plumbing for the remote identity and storage services.
//!
//! Every request carries the project id header and, when configured, the
//! environment header. Error responses are read as problem+json when
//! possible.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Deserialize;

/// Header naming the project every request is scoped to.
pub const PROJECT_HEADER: &str = "x-project-id";
/// Header naming the project environment, when one is configured.
pub const ENVIRONMENT_HEADER: &str = "x-environment";

/// HTTP client bound to one project.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: Client,
    project_id: String,
    environment: Option<String>,
}

impl ServiceClient {
    /// Create a client whose requests time out after `timeout`.
    pub fn new(
        project_id: impl Into<String>,
        environment: Option<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            project_id: project_id.into(),
            environment,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Start a request with the project headers applied.
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, url)
            .header(PROJECT_HEADER, &self.project_id);
        if let Some(environment) = &self.environment {
            builder = builder.header(ENVIRONMENT_HEADER, environment);
        }
        builder
    }
}

/// Parse a service base URL.
///
/// Rejects URLs that cannot carry path segments (`mailto:`, `data:`, ...).
pub fn parse_base_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid URL '{}': {}", raw, e))?;
    if url.cannot_be_a_base() {
        return Err(format!("invalid URL '{}': not a base URL", raw));
    }
    Ok(url)
}

/// Append path segments to a base URL, percent-encoding each one.
pub fn join_segments<'a>(base: &Url, segments: impl IntoIterator<Item = &'a str>) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

#[derive(Debug, Deserialize)]
struct ProblemDetails {
    title: String,
    #[serde(default)]
    detail: Option<String>,
}

/// Read the status code and a human readable message from an error response.
pub async fn error_message(response: Response) -> (u16, String) {
    let status = response.status().as_u16();

    match response.json::<ProblemDetails>().await {
        Ok(problem) => (status, problem.detail.unwrap_or(problem.title)),
        Err(_) => (status, format!("HTTP {}", status)),
    }
}
