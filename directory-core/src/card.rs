//! Role-conditional doctor cards.
//!
//! A [`Card`] is built once from a [`ProviderRecord`] and the viewer's
//! [`Role`]. Its controls are fixed at construction; activating one runs the
//! matching handler against the injected capabilities in [`CardContext`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::capability::{ActivationEvent, BookingOverlay, DoctorDirectory, PatientProfileSource, Prompt};
use crate::model::{DoctorId, ProviderRecord, Role, Session};

pub const DELETE_FAILED: &str = "Failed to delete doctor. Try again.";
pub const LOGIN_REQUIRED: &str = "Please login first to book an appointment.";
pub const PROFILE_FAILED: &str = "Failed to fetch patient data. Try again.";
pub const BOOKING_FAILED: &str = "Failed to open booking. Try again.";

/// What a control does when activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Admin-only removal of the doctor.
    Delete,
    /// "Book Now" for a patient who has not logged in.
    LoginToBook,
    /// "Book Now" for a logged-in patient.
    Book,
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Delete => "Delete",
            ActionKind::LoginToBook | ActionKind::Book => "Book Now",
        }
    }
}

/// Result of one control activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The user answered no to the confirmation.
    Declined,
    /// The doctor is gone and the card must leave its parent.
    Deleted,
    /// A user-facing failure notice was shown.
    Failed,
    LoginRequired,
    BookingOpened,
    /// The same control is still handling an earlier activation.
    Busy,
    /// The card has no such control.
    Unavailable,
}

/// The text lines of a card, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoSection {
    pub name: String,
    pub specialty: String,
    pub email: String,
    pub availability: String,
}

impl InfoSection {
    fn from_record(record: &ProviderRecord) -> Self {
        Self {
            name: record.name.clone(),
            specialty: format!("Specialty: {}", record.specialty),
            email: format!("Email: {}", record.email),
            availability: format!("Availability: {}", record.availability.join(", ")),
        }
    }

    pub fn lines(&self) -> [&str; 4] {
        [&self.name, &self.specialty, &self.email, &self.availability]
    }
}

/// One interactive control on a card.
#[derive(Debug)]
pub struct Control {
    kind: ActionKind,
    in_flight: AtomicBool,
}

impl Control {
    fn new(kind: ActionKind) -> Self {
        Self { kind, in_flight: AtomicBool::new(false) }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Marks the control busy until the returned guard drops.
    fn claim(&self) -> Option<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(&self.in_flight))
    }
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Everything a handler may touch.
pub struct CardContext<'a> {
    pub session: &'a Session,
    pub directory: &'a dyn DoctorDirectory,
    pub prompt: &'a dyn Prompt,
    pub profiles: &'a dyn PatientProfileSource,
    pub booking: &'a dyn BookingOverlay,
}

#[derive(Debug)]
pub struct Card {
    record: ProviderRecord,
    info: InfoSection,
    actions: Vec<Control>,
}

/// Builds the card for `record` as seen by `role`.
pub fn render_card(record: ProviderRecord, role: Role) -> Card {
    let info = InfoSection::from_record(&record);

    let actions = match role {
        Role::Admin => vec![Control::new(ActionKind::Delete)],
        Role::Patient => vec![Control::new(ActionKind::LoginToBook)],
        Role::LoggedPatient => vec![Control::new(ActionKind::Book)],
        Role::Visitor => Vec::new(),
    };

    Card { record, info, actions }
}

impl Card {
    pub fn record(&self) -> &ProviderRecord {
        &self.record
    }

    pub fn id(&self) -> &DoctorId {
        &self.record.id
    }

    pub fn info(&self) -> &InfoSection {
        &self.info
    }

    pub fn actions(&self) -> &[Control] {
        &self.actions
    }

    /// Runs the handler of the control with the given kind.
    ///
    /// Never fails: every problem ends as a notification through
    /// `ctx.prompt` and an [`ActionOutcome`] other than success.
    pub async fn activate(&self, action: ActionKind, ctx: &CardContext<'_>) -> ActionOutcome {
        let Some(control) = self.actions.iter().find(|c| c.kind == action) else {
            tracing::debug!(doctor = %self.record.id, ?action, "no such control on card");
            return ActionOutcome::Unavailable;
        };
        let Some(_guard) = control.claim() else {
            tracing::debug!(doctor = %self.record.id, ?action, "control already in flight");
            return ActionOutcome::Busy;
        };

        match action {
            ActionKind::Delete => self.delete(ctx).await,
            ActionKind::LoginToBook => {
                ctx.prompt.notify(LOGIN_REQUIRED);
                ActionOutcome::LoginRequired
            }
            ActionKind::Book => self.book(ctx).await,
        }
    }

    async fn delete(&self, ctx: &CardContext<'_>) -> ActionOutcome {
        let question = format!("Are you sure you want to delete Dr. {}?", self.record.name);
        if !ctx.prompt.confirm(&question) {
            return ActionOutcome::Declined;
        }

        let Some(token) = ctx.session.token.as_ref() else {
            tracing::warn!(doctor = %self.record.id, "delete attempted without a stored token");
            ctx.prompt.notify(DELETE_FAILED);
            return ActionOutcome::Failed;
        };

        let result = ctx.directory.remove(&self.record.id, token).await;
        if result.is_success() {
            tracing::info!(doctor = %self.record.id, "doctor deleted");
            ctx.prompt.notify(&result.message);
            ActionOutcome::Deleted
        } else {
            tracing::warn!(doctor = %self.record.id, message = %result.message, "doctor delete failed");
            ctx.prompt.notify(DELETE_FAILED);
            ActionOutcome::Failed
        }
    }

    async fn book(&self, ctx: &CardContext<'_>) -> ActionOutcome {
        let Some(token) = ctx.session.token.as_ref() else {
            tracing::warn!(doctor = %self.record.id, "booking attempted without a stored token");
            ctx.prompt.notify(LOGIN_REQUIRED);
            return ActionOutcome::LoginRequired;
        };

        let patient = match ctx.profiles.fetch_profile(token).await {
            Ok(patient) => patient,
            Err(err) => {
                tracing::error!(doctor = %self.record.id, error = %err, "failed to fetch patient data");
                ctx.prompt.notify(PROFILE_FAILED);
                return ActionOutcome::Failed;
            }
        };

        let event = ActivationEvent::now(self.record.id.clone(), ActionKind::Book);
        match ctx.booking.open(&event, &self.record, &patient).await {
            Ok(()) => ActionOutcome::BookingOpened,
            Err(err) => {
                tracing::error!(doctor = %self.record.id, error = %err, "booking overlay failed");
                ctx.prompt.notify(BOOKING_FAILED);
                ActionOutcome::Failed
            }
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.info.lines().join("\n"))?;
        let labels: Vec<String> = self.actions.iter().map(|c| format!("[{}]", c.label())).collect();
        if !labels.is_empty() {
            write!(f, "\n{}", labels.join(" "))?;
        }
        Ok(())
    }
}

/// Ordered set of rendered cards; the parent a deleted card detaches from.
#[derive(Debug, Default)]
pub struct CardBoard {
    cards: Vec<Card>,
}

impl CardBoard {
    pub fn render(records: impl IntoIterator<Item = ProviderRecord>, role: Role) -> Self {
        Self { cards: records.into_iter().map(|r| render_card(r, role)).collect() }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn get(&self, id: &DoctorId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id() == id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Activates a control on the card for `id`, detaching the card when the
    /// doctor was deleted. `None` if no such card is attached.
    pub async fn activate(
        &mut self,
        id: &DoctorId,
        action: ActionKind,
        ctx: &CardContext<'_>,
    ) -> Option<ActionOutcome> {
        let outcome = self.get(id)?.activate(action, ctx).await;
        if outcome == ActionOutcome::Deleted {
            self.cards.retain(|c| c.id() != id);
        }
        Some(outcome)
    }
}
