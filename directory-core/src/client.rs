use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url, header};
use serde::Deserialize;

use crate::capability::DoctorDirectory;
use crate::model::{AuthToken, DoctorFilter, DoctorId, NewDoctor, OperationResult, ProviderRecord};

/// Message reported for any mutation that never got a response.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred.";

/// Privileged calls, each with its own fallback wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Delete,
    Save,
    Update,
}

impl Mutation {
    fn as_str(&self) -> &'static str {
        match self {
            Mutation::Delete => "delete",
            Mutation::Save => "save",
            Mutation::Update => "update",
        }
    }

    fn failure_fallback(&self) -> &'static str {
        match self {
            Mutation::Delete => "Failed to delete doctor.",
            Mutation::Save => "Failed to save doctor.",
            Mutation::Update => "Failed to update doctor.",
        }
    }

    fn success_fallback(&self) -> &'static str {
        match self {
            Mutation::Delete => "Doctor deleted successfully.",
            Mutation::Save => "Doctor added successfully.",
            Mutation::Update => "Doctor updated successfully.",
        }
    }
}

/// HTTP client for the `/doctor` endpoints.
///
/// No call returns an error: reads degrade to an empty list and mutations to
/// a failed [`OperationResult`]. Every absorbed failure is logged.
#[derive(Debug, Clone)]
pub struct DoctorClient {
    endpoint: Url,
    http: Client,
}

impl DoctorClient {
    /// Builds a client for `base_url`, keeping any path prefix it carries.
    pub fn new(base_url: &str) -> Result<Self> {
        let endpoint = endpoint_under(base_url, &["doctor"])?;
        Ok(Self { endpoint, http: Client::new() })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// All doctors. Failure is indistinguishable from an empty directory.
    pub async fn list(&self) -> Vec<ProviderRecord> {
        let request = self.http.get(self.endpoint.clone());
        self.fetch_records(request, "list").await.unwrap_or_else(|err| {
            tracing::error!(error = ?err, "error fetching doctors");
            Vec::new()
        })
    }

    /// Doctors matching the provided criteria; absent criteria are not sent.
    pub async fn filter(&self, filter: &DoctorFilter) -> Vec<ProviderRecord> {
        let url = self.url_with(&["filter"]);
        let request = self.http.get(url).query(&filter.query_pairs());
        self.fetch_records(request, "filter").await.unwrap_or_else(|err| {
            tracing::error!(error = ?err, ?filter, "error filtering doctors");
            Vec::new()
        })
    }

    pub async fn remove(&self, id: &DoctorId, token: &AuthToken) -> OperationResult<String> {
        let request = self
            .http
            .delete(self.url_with(&[id.as_str()]))
            .header(header::CONTENT_TYPE, "application/json");
        self.send_privileged(request, token, Mutation::Delete).await
    }

    pub async fn create(&self, doctor: &NewDoctor, token: &AuthToken) -> OperationResult<String> {
        let request = self.http.post(self.endpoint.clone()).json(doctor);
        self.send_privileged(request, token, Mutation::Save).await
    }

    pub async fn update(&self, doctor: &NewDoctor, token: &AuthToken) -> OperationResult<String> {
        if doctor.id.is_none() {
            return OperationResult::failed("Doctor id is required for update.");
        }
        let request = self.http.put(self.endpoint.clone()).json(doctor);
        self.send_privileged(request, token, Mutation::Update).await
    }

    fn url_with(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        // The endpoint was validated as a base URL in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    async fn fetch_records(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<Vec<ProviderRecord>> {
        let res = request
            .send()
            .await
            .with_context(|| format!("Failed to send doctor {operation} request"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read doctor {operation} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "Doctor {operation} request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: Option<RecordsBody> = serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse doctor {operation} JSON"))?;

        Ok(parsed.map(RecordsBody::into_records).unwrap_or_default())
    }

    async fn send_privileged(
        &self,
        request: RequestBuilder,
        token: &AuthToken,
        mutation: Mutation,
    ) -> OperationResult<String> {
        let res = match request.bearer_auth(token.as_str()).send().await {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(operation = mutation.as_str(), error = %err, "doctor request failed");
                return OperationResult::failed(UNEXPECTED_ERROR);
            }
        };

        let status = res.status();
        let body = match res.text().await {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(
                    operation = mutation.as_str(),
                    %status,
                    error = %err,
                    "failed to read doctor response body"
                );
                return OperationResult::failed(UNEXPECTED_ERROR);
            }
        };
        let server_message = parse_message(&body);

        if !status.is_success() {
            tracing::warn!(
                operation = mutation.as_str(),
                %status,
                body = %truncate_body(&body),
                "doctor request rejected"
            );
            return OperationResult::failed(
                server_message.unwrap_or_else(|| mutation.failure_fallback().to_owned()),
            );
        }

        let message = server_message.unwrap_or_else(|| mutation.success_fallback().to_owned());
        OperationResult::succeeded(message.clone(), message)
    }
}

#[async_trait]
impl DoctorDirectory for DoctorClient {
    async fn remove(&self, id: &DoctorId, token: &AuthToken) -> OperationResult<String> {
        DoctorClient::remove(self, id, token).await
    }
}

/// List payloads come either bare or wrapped as `{"doctors": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordsBody {
    Bare(Vec<ProviderRecord>),
    Wrapped { doctors: Vec<ProviderRecord> },
}

impl RecordsBody {
    fn into_records(self) -> Vec<ProviderRecord> {
        match self {
            RecordsBody::Bare(records) => records,
            RecordsBody::Wrapped { doctors } => doctors,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: Option<String>,
}

/// Best-effort extraction of `{"message": ...}`; non-JSON bodies yield `None`.
pub(crate) fn parse_message(body: &str) -> Option<String> {
    serde_json::from_str::<MessageBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

/// Resolves `segments` beneath the path of `base_url`.
pub(crate) fn endpoint_under(base_url: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base_url.trim())
        .with_context(|| format!("Invalid API base URL: {base_url}"))?;

    url.path_segments_mut()
        .map_err(|_| anyhow!("API base URL cannot carry a path: {base_url}"))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
