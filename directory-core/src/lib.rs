//! Core library for the `directory` CLI.
//!
//! This crate defines:
//! - Configuration and the stored role/token session
//! - The HTTP data-access layer for logins, doctors and patient profiles
//! - Role-conditional doctor cards and the capabilities their controls use
//!
//! It is used by `directory-cli`, but can also be reused by other front ends.

pub mod auth;
pub mod capability;
pub mod card;
pub mod client;
pub mod config;
pub mod model;
pub mod patient;

#[cfg(test)]
mod test_support;

pub use auth::{AuthClient, Credentials};
pub use capability::{
    ActivationEvent, BookingOverlay, CapabilityError, DoctorDirectory, PatientProfileSource, Prompt,
};
pub use card::{ActionKind, ActionOutcome, Card, CardBoard, CardContext, render_card};
pub use client::DoctorClient;
pub use config::Config;
pub use model::{
    AuthToken, DoctorFilter, DoctorId, NewDoctor, OperationResult, PatientProfile, ProviderRecord,
    Role, Session,
};
pub use patient::PatientClient;
