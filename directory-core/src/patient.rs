use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::capability::{CapabilityError, PatientProfileSource};
use crate::client::{endpoint_under, parse_message, truncate_body};
use crate::model::{AuthToken, PatientProfile};

/// Fetches the logged-in patient's profile from `/patient`.
#[derive(Debug, Clone)]
pub struct PatientClient {
    endpoint: Url,
    http: Client,
}

impl PatientClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let endpoint = endpoint_under(base_url, &["patient"])?;
        Ok(Self { endpoint, http: Client::new() })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProfileBody {
    /// Tried first: it needs `name` and `email`, which the wrapper lacks.
    Bare(PatientProfile),
    /// `patient` is `null` or missing when the server has no record for the token.
    Wrapped { patient: Option<PatientProfile> },
}

#[async_trait]
impl PatientProfileSource for PatientClient {
    async fn fetch_profile(&self, token: &AuthToken) -> Result<PatientProfile, CapabilityError> {
        let res = self
            .http
            .get(self.endpoint.clone())
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|err| CapabilityError::Transport(err.to_string()))?;

        let status = res.status();
        let body = res.text().await.map_err(|err| CapabilityError::Transport(err.to_string()))?;

        if !status.is_success() {
            let message = parse_message(&body).unwrap_or_else(|| truncate_body(&body));
            return Err(CapabilityError::Status { status: status.as_u16(), message });
        }

        let parsed: ProfileBody =
            serde_json::from_str(&body).map_err(|err| CapabilityError::Decode(err.to_string()))?;

        match parsed {
            ProfileBody::Wrapped { patient: Some(patient) } | ProfileBody::Bare(patient) => {
                Ok(patient)
            }
            ProfileBody::Wrapped { patient: None } => {
                Err(CapabilityError::Decode("response carried no patient".to_string()))
            }
        }
    }
}
