use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque, server-assigned doctor identifier.
///
/// The server emits numeric ids; the client never interprets them, so both
/// JSON strings and integers are accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DoctorId(String);

impl DoctorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DoctorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DoctorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => DoctorId(s),
            RawId::Number(n) => DoctorId(n.to_string()),
        })
    }
}

/// One directory entry as returned by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: DoctorId,
    pub name: String,
    pub specialty: String,
    pub email: String,

    /// Slot labels in display order.
    #[serde(rename = "availableTimes", alias = "availability", default)]
    pub availability: Vec<String>,
}

/// Body sent when creating or updating a doctor.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDoctor {
    /// Required for update, omitted for create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<DoctorId>,
    pub name: String,
    pub specialty: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub available_times: Vec<String>,
}

impl fmt::Debug for NewDoctor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewDoctor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("specialty", &self.specialty)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("phone", &self.phone)
            .field("available_times", &self.available_times)
            .finish()
    }
}

/// Who is looking at the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// Not signed in and not browsing as a patient.
    #[default]
    Visitor,
    /// Browsing as a patient without having logged in.
    Patient,
    LoggedPatient,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Visitor => "visitor",
            Role::Patient => "patient",
            Role::LoggedPatient => "loggedPatient",
            Role::Admin => "admin",
        }
    }

    pub const fn all() -> &'static [Role] {
        &[Role::Visitor, Role::Patient, Role::LoggedPatient, Role::Admin]
    }

    /// Whether acting in this role needs a stored auth token.
    pub fn needs_token(&self) -> bool {
        matches!(self, Role::LoggedPatient | Role::Admin)
    }

    /// Reads a stored role string. Only the exact [`Role::as_str`] spellings
    /// are recognized.
    ///
    /// Absent or unrecognized values map to [`Role::Visitor`], which renders
    /// cards without any controls.
    pub fn from_stored(value: Option<&str>) -> Role {
        let Some(raw) = value else { return Role::Visitor };

        Role::all().iter().copied().find(|role| role.as_str() == raw).unwrap_or_else(|| {
            tracing::debug!(role = raw, "ignoring unrecognized stored role");
            Role::Visitor
        })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient parse for user input: case-insensitive, trimmed.
impl TryFrom<&str> for Role {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        match lower.as_str() {
            "visitor" => Ok(Role::Visitor),
            "patient" => Ok(Role::Patient),
            "loggedpatient" | "logged-patient" => Ok(Role::LoggedPatient),
            "admin" => Ok(Role::Admin),
            _ => Err(anyhow::anyhow!(
                "Unknown role '{value}'. Supported roles: visitor, patient, loggedPatient, admin."
            )),
        }
    }
}

/// Bearer credential for privileged calls. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Returns `None` for blank input.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// Role and credential of the current viewer, passed explicitly to the
/// renderer instead of being looked up from shared state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub role: Role,
    pub token: Option<AuthToken>,
}

impl Session {
    pub fn new(role: Role, token: Option<AuthToken>) -> Self {
        Self { role, token }
    }
}

/// Optional search criteria for the filter endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorFilter {
    pub name: Option<String>,
    /// Availability slot, e.g. "AM" or "PM".
    pub time: Option<String>,
    pub specialty: Option<String>,
}

impl DoctorFilter {
    /// Query parameters for the criteria that were actually provided.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("name", self.name.as_deref()),
            ("time", self.time.as_deref()),
            ("specialty", self.specialty.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (key, v))
        })
        .collect()
    }
}

/// Uniform outcome of every data-access call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult<T> {
    pub success: bool,
    pub payload: Option<T>,
    pub message: String,
}

impl<T> OperationResult<T> {
    pub fn succeeded(payload: T, message: impl Into<String>) -> Self {
        Self { success: true, payload: Some(payload), message: message.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, payload: None, message: message.into() }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Profile of the logged-in patient, handed to the booking overlay.
///
/// `name` and `email` are required so that arbitrary objects never decode
/// as a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}
