use anyhow::Result;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::client::{UNEXPECTED_ERROR, endpoint_under, truncate_body};
use crate::model::{OperationResult, Role};

const LOGIN_FAILED: &str = "Invalid credentials.";
const LOGIN_SUCCEEDED: &str = "Login successful.";
const MISSING_TOKEN: &str = "Login response carried no token.";

/// Body posted to one of the `/{role}/login` endpoints.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Credentials {
    Admin { username: String, password: String },
    Patient { email: String, password: String },
}

impl Credentials {
    /// The role a successful login grants.
    pub fn role(&self) -> Role {
        match self {
            Credentials::Admin { .. } => Role::Admin,
            Credentials::Patient { .. } => Role::LoggedPatient,
        }
    }

    fn path(&self) -> &'static str {
        match self {
            Credentials::Admin { .. } => "admin",
            Credentials::Patient { .. } => "patient",
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Admin { username, .. } => f
                .debug_struct("Admin")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Patient { email, .. } => f
                .debug_struct("Patient")
                .field("email", email)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    token: Option<String>,
    message: Option<String>,
}

/// Exchanges credentials for an auth token.
#[derive(Debug, Clone)]
pub struct AuthClient {
    base: Url,
    http: Client,
}

impl AuthClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = endpoint_under(base_url, &[])?;
        Ok(Self { base, http: Client::new() })
    }

    /// On success the payload is the issued token.
    pub async fn login(&self, credentials: &Credentials) -> OperationResult<String> {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend([credentials.path(), "login"]);
        }

        let res = match self.http.post(url).json(credentials).send().await {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(role = %credentials.role(), error = %err, "login request failed");
                return OperationResult::failed(UNEXPECTED_ERROR);
            }
        };

        let status = res.status();
        let body = match res.text().await {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(role = %credentials.role(), %status, error = %err, "failed to read login response");
                return OperationResult::failed(UNEXPECTED_ERROR);
            }
        };
        let parsed = serde_json::from_str::<LoginBody>(&body).ok();
        let message = parsed
            .as_ref()
            .and_then(|b| b.message.clone())
            .filter(|m| !m.trim().is_empty());

        if !status.is_success() {
            tracing::warn!(role = %credentials.role(), %status, body = %truncate_body(&body), "login rejected");
            return OperationResult::failed(message.unwrap_or_else(|| LOGIN_FAILED.to_owned()));
        }

        match parsed.and_then(|b| b.token).filter(|t| !t.trim().is_empty()) {
            Some(token) => {
                OperationResult::succeeded(token, message.unwrap_or_else(|| LOGIN_SUCCEEDED.to_owned()))
            }
            None => {
                tracing::warn!(role = %credentials.role(), body = %truncate_body(&body), "login response had no token");
                OperationResult::failed(MISSING_TOKEN)
            }
        }
    }
}
