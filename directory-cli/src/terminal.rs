use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Local;
use inquire::{Confirm, Select};

use directory_core::{
    ActivationEvent, BookingOverlay, CapabilityError, CardBoard, PatientProfile, Prompt,
    ProviderRecord,
};

/// Confirmations via `inquire`, notifications on stdout.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn confirm(&self, question: &str) -> bool {
        match Confirm::new(question).with_default(false).prompt() {
            Ok(answer) => answer,
            Err(err) => {
                tracing::debug!(%err, "confirmation aborted");
                false
            }
        }
    }

    fn notify(&self, message: &str) {
        println!("{message}");
    }
}

/// Shows the booking sheet and lets the patient pick one of the doctor's slots.
#[derive(Debug, Default)]
pub struct TerminalBooking;

#[async_trait]
impl BookingOverlay for TerminalBooking {
    async fn open(
        &self,
        event: &ActivationEvent,
        doctor: &ProviderRecord,
        patient: &PatientProfile,
    ) -> Result<(), CapabilityError> {
        println!();
        println!("Book an appointment");
        println!("  Doctor:    {} ({})", doctor.name, doctor.specialty);
        println!("  Patient:   {} <{}>", patient.name, patient.email);
        println!("  Requested: {}", event.at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));

        if doctor.availability.is_empty() {
            return Err(anyhow!("{} has no available slots", doctor.name).into());
        }

        let slot = Select::new("Choose a time slot:", doctor.availability.clone())
            .prompt_skippable()
            .map_err(|err| CapabilityError::Other(err.into()))?
            .ok_or(CapabilityError::Cancelled)?;

        println!("Booking request: {} with {} at {slot}.", patient.name, doctor.name);
        Ok(())
    }
}

pub fn print_board(board: &CardBoard) {
    if board.is_empty() {
        println!("No doctors found.");
        return;
    }

    for card in board.cards() {
        println!("----------------------------------------");
        println!("{card}");
    }
    println!("----------------------------------------");
}
