// libs/appointment-cell/src/services/scheduler.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{AppointmentFilter, SchedulingStore};
use shared_models::{
    Appointment, AppointmentAttachment, AppointmentStatus, AttachmentKind, PaymentStatus,
    SchedulingError,
};

use crate::models::{
    AppointmentSearchQuery, BookAppointmentRequest, RescheduleAppointmentRequest,
    RescheduleOutcome,
};
use crate::services::lifecycle::AppointmentLifecycleService;

/// The transactional core of the engine: the only writer of the
/// reservation ledger and the only component that flips a slot between
/// free and booked.
///
/// Each operation commits through a single atomic store call, so a caller
/// abandoning a request mid-flight can never leave a half-booked slot or a
/// half-created appointment behind. Conflicts are rejected outright with
/// typed errors; the caller re-queries free slots and picks again.
pub struct SchedulerService {
    store: Arc<SchedulingStore>,
    lifecycle: AppointmentLifecycleService,
}

impl SchedulerService {
    pub fn new(store: Arc<SchedulingStore>) -> Self {
        Self {
            store,
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Book a slot for a patient. The appointment starts out `pending` and
    /// holds its coordinate from this moment until a terminal status.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        info!(
            "Booking {} appointment for patient {} with doctor {} at {} {}",
            request.service, request.patient_id, request.doctor_id, request.date, request.time
        );

        if let Some(fee) = request.fee_amount {
            if fee < 0.0 {
                return Err(SchedulingError::Validation(
                    "Fee amount cannot be negative".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            doctor_id: request.doctor_id,
            patient_id: request.patient_id,
            service: request.service,
            scheduled_date: request.date,
            scheduled_time: request.time,
            status: AppointmentStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            fee_amount: request.fee_amount,
            notes: request.notes,
            attachments: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        // The store checks the coordinate and inserts in one atomic unit;
        // a losing racer gets SlotUnavailable and nothing is created.
        self.store.insert_booking(appointment).await
    }

    /// Move an appointment to a new coordinate. The old slot is freed and
    /// the new one booked as one unit; a refused reschedule leaves the
    /// original booking exactly as it was.
    pub async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
    ) -> Result<RescheduleOutcome, SchedulingError> {
        debug!("Rescheduling appointment: {}", appointment_id);

        let current = self.get_appointment(appointment_id).await?;
        if current.status.is_terminal() {
            warn!(
                "Reschedule refused for {}: status is {}",
                appointment_id, current.status
            );
            return Err(SchedulingError::InvalidState {
                status: current.status,
            });
        }

        let previous_date = current.scheduled_date;
        let previous_time = current.scheduled_time.clone();

        let appointment = self
            .store
            .move_booking(appointment_id, request.new_date, request.new_time)
            .await?;

        info!(
            "Appointment {} rescheduled from {} {} to {} {}",
            appointment_id,
            previous_date,
            previous_time,
            appointment.scheduled_date,
            appointment.scheduled_time
        );

        Ok(RescheduleOutcome {
            appointment,
            previous_date,
            previous_time,
        })
    }

    /// Apply a lifecycle transition. Cancelling releases the slot;
    /// completing keeps it occupied and closes further rescheduling.
    pub async fn set_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        let current = self.get_appointment(appointment_id).await?;
        self.lifecycle
            .validate_status_transition(&current.status, &new_status)?;

        // The store revalidates the transition under its own lock, so a
        // racing status change cannot slip through between read and write.
        self.store.update_status(appointment_id, new_status).await
    }

    /// Payment collaborator surface; independent of the scheduling
    /// invariants and legal in any status.
    pub async fn set_payment_status(
        &self,
        appointment_id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Appointment, SchedulingError> {
        self.store
            .update_payment_status(appointment_id, payment_status)
            .await
    }

    /// Attach an ancillary record (lab test, document) owned by an
    /// external subsystem. Never touches slot occupancy.
    pub async fn attach_record(
        &self,
        appointment_id: Uuid,
        kind: AttachmentKind,
        label: String,
    ) -> Result<Appointment, SchedulingError> {
        let attachment = AppointmentAttachment::new(kind, label);
        self.store.add_attachment(appointment_id, attachment).await
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        self.store
            .get_appointment(appointment_id)
            .await
            .ok_or_else(|| SchedulingError::NotFound(format!("No appointment {}", appointment_id)))
    }

    pub async fn search_appointments(&self, query: AppointmentSearchQuery) -> Vec<Appointment> {
        let filter = AppointmentFilter {
            doctor_id: query.doctor_id,
            patient_id: query.patient_id,
            service: query.service,
            status: query.status,
            from_date: query.from,
            to_date: query.to,
        };
        self.store.search_appointments(&filter).await
    }

    /// Next statuses an admin surface may offer for an appointment.
    pub fn valid_transitions(&self, status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        self.lifecycle.valid_transitions(status)
    }
}
