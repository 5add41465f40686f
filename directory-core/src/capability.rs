//! Seams between the card renderer and the outside world.
//!
//! Every collaborator a card handler touches is injected through one of these
//! traits, so handlers can be exercised without a terminal or a server.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use thiserror::Error;

use crate::card::ActionKind;
use crate::model::{AuthToken, DoctorId, OperationResult, PatientProfile, ProviderRecord};

/// Failure of an external capability call.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("cancelled by user")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The control activation that triggered a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationEvent {
    pub doctor_id: DoctorId,
    pub action: ActionKind,
    pub at: DateTime<Utc>,
}

impl ActivationEvent {
    pub fn now(doctor_id: DoctorId, action: ActionKind) -> Self {
        Self { doctor_id, action, at: Utc::now() }
    }
}

/// Privileged directory mutations a card may trigger.
#[async_trait]
pub trait DoctorDirectory: Send + Sync + Debug {
    async fn remove(&self, id: &DoctorId, token: &AuthToken) -> OperationResult<String>;
}

/// Confirmation and notification surface.
pub trait Prompt: Send + Sync {
    /// Blocks until the user answers. Anything but an explicit yes is `false`.
    fn confirm(&self, question: &str) -> bool;

    fn notify(&self, message: &str);
}

#[async_trait]
pub trait PatientProfileSource: Send + Sync {
    async fn fetch_profile(&self, token: &AuthToken) -> Result<PatientProfile, CapabilityError>;
}

/// Takes over once a logged-in patient decides to book.
#[async_trait]
pub trait BookingOverlay: Send + Sync {
    async fn open(
        &self,
        event: &ActivationEvent,
        doctor: &ProviderRecord,
        patient: &PatientProfile,
    ) -> Result<(), CapabilityError>;
}
