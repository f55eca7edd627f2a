// libs/appointment-cell/src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::{
    Appointment, AppointmentStatus, AttachmentKind, PaymentStatus, ServiceKind, SlotTime,
};

// ==============================================================================
// SCHEDULER REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub service: ServiceKind,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub fee_amount: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub new_date: NaiveDate,
    pub new_time: SlotTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetPaymentStatusRequest {
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachRecordRequest {
    pub kind: AttachmentKind,
    pub label: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentSearchQuery {
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub service: Option<ServiceKind>,
    pub status: Option<AppointmentStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

// ==============================================================================
// SCHEDULER RESPONSES
// ==============================================================================

/// Result of a reschedule, carrying the previous coordinate so callers can
/// show an old-vs-new diff.
#[derive(Debug, Clone, Serialize)]
pub struct RescheduleOutcome {
    pub appointment: Appointment,
    pub previous_date: NaiveDate,
    pub previous_time: SlotTime,
}
