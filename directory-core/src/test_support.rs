//! In-process fixtures shared by the unit tests: a canned-response axum server
//! and recording fakes for every capability.

use async_trait::async_trait;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use crate::capability::{
    ActivationEvent, BookingOverlay, CapabilityError, DoctorDirectory, PatientProfileSource,
    Prompt,
};
use crate::model::{AuthToken, DoctorId, OperationResult, PatientProfile, ProviderRecord};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    body: Arc<str>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Answers every request with the same status and body, recording what it got.
pub struct StubServer {
    addr: std::net::SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub async fn start(status: u16, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let state = StubState {
            status: StatusCode::from_u16(status).unwrap(),
            body: Arc::from(body),
            requests: Arc::clone(&requests),
        };
        let app = Router::new().fallback(record).with_state(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, requests }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn single_request(&self) -> RecordedRequest {
        let requests = self.requests.lock().unwrap();
        assert_eq!(requests.len(), 1, "expected exactly one request, got {requests:?}");
        requests[0].clone()
    }
}

async fn record(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/").to_owned();
    let headers = headers
        .iter()
        .map(|(k, v)| (k.as_str().to_owned(), v.to_str().unwrap_or_default().to_owned()))
        .collect();

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.as_str().to_owned(),
        target,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    (state.status, [(header::CONTENT_TYPE, "application/json")], state.body.to_string())
        .into_response()
}

/// A URL nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn sample_record() -> ProviderRecord {
    ProviderRecord {
        id: DoctorId::new("d1"),
        name: "Dr. A".into(),
        specialty: "Cardiology".into(),
        email: "a@x.com".into(),
        availability: vec!["Mon 9-10".into(), "Wed 2-3".into()],
    }
}

/// Returns a fixed result and counts calls.
#[derive(Debug)]
pub struct FakeDirectory {
    result: OperationResult<String>,
    pub calls: Mutex<Vec<(DoctorId, String)>>,
}

impl FakeDirectory {
    pub fn answering(result: OperationResult<String>) -> Self {
        Self { result, calls: Mutex::new(Vec::new()) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl DoctorDirectory for FakeDirectory {
    async fn remove(&self, id: &DoctorId, token: &AuthToken) -> OperationResult<String> {
        self.calls.lock().unwrap().push((id.clone(), token.as_str().to_owned()));
        tokio::task::yield_now().await;
        self.result.clone()
    }
}

/// Answers confirmations with a fixed value and records everything shown.
pub struct FakePrompt {
    answer: bool,
    pub questions: Mutex<Vec<String>>,
    pub notices: Mutex<Vec<String>>,
}

impl FakePrompt {
    pub fn answering(answer: bool) -> Self {
        Self { answer, questions: Mutex::new(Vec::new()), notices: Mutex::new(Vec::new()) }
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

impl Prompt for FakePrompt {
    fn confirm(&self, question: &str) -> bool {
        self.questions.lock().unwrap().push(question.to_owned());
        self.answer
    }

    fn notify(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_owned());
    }
}

pub struct FakeProfiles {
    fail: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeProfiles {
    pub fn ok() -> Self {
        Self { fail: false, calls: Mutex::new(Vec::new()) }
    }

    pub fn failing() -> Self {
        Self { fail: true, calls: Mutex::new(Vec::new()) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PatientProfileSource for FakeProfiles {
    async fn fetch_profile(&self, token: &AuthToken) -> Result<PatientProfile, CapabilityError> {
        self.calls.lock().unwrap().push(token.as_str().to_owned());
        tokio::task::yield_now().await;
        if self.fail {
            return Err(CapabilityError::Status { status: 401, message: "Invalid token".into() });
        }
        Ok(PatientProfile {
            id: Some(3),
            name: "Pat".into(),
            email: "pat@x.com".into(),
            ..Default::default()
        })
    }
}

#[derive(Default)]
pub struct FakeBooking {
    pub fail: bool,
    pub opened: Mutex<Vec<(ActivationEvent, DoctorId, String)>>,
}

impl FakeBooking {
    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }
}

#[async_trait]
impl BookingOverlay for FakeBooking {
    async fn open(
        &self,
        event: &ActivationEvent,
        doctor: &ProviderRecord,
        patient: &PatientProfile,
    ) -> Result<(), CapabilityError> {
        self.opened.lock().unwrap().push((event.clone(), doctor.id.clone(), patient.name.clone()));
        if self.fail {
            return Err(CapabilityError::Cancelled);
        }
        Ok(())
    }
}
