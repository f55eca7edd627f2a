// libs/shared/models/src/scheduling.rs
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SchedulingError;

// ==============================================================================
// SERVICE TYPES
// ==============================================================================

/// The kind of consultation a doctor offers. Each kind has its own calendar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    Video,
    HomeVisit,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Video => write!(f, "video"),
            ServiceKind::HomeVisit => write!(f, "home-visit"),
        }
    }
}

impl FromStr for ServiceKind {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(ServiceKind::Video),
            "home-visit" | "home_visit" => Ok(ServiceKind::HomeVisit),
            other => Err(SchedulingError::Validation(format!(
                "Unknown service type: {}",
                other
            ))),
        }
    }
}

// ==============================================================================
// SLOT TIME
// ==============================================================================

/// A time-of-day slot in 24-hour "HH:MM" form.
///
/// Ordering is plain string ordering, which for this format coincides with
/// chronological ordering. Construction always goes through validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct SlotTime(String);

impl SlotTime {
    pub fn new(raw: &str) -> Result<Self, SchedulingError> {
        raw.parse()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SlotTime {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 5
            && bytes[2] == b':'
            && s[..2].chars().all(|c| c.is_ascii_digit())
            && s[3..].chars().all(|c| c.is_ascii_digit());

        if !well_formed {
            return Err(SchedulingError::Validation(format!(
                "Time must be 24-hour HH:MM, got '{}'",
                s
            )));
        }

        let hour: u32 = s[..2].parse().unwrap_or(24);
        let minute: u32 = s[3..].parse().unwrap_or(60);
        if hour > 23 || minute > 59 {
            return Err(SchedulingError::Validation(format!(
                "Time out of range: '{}'",
                s
            )));
        }

        Ok(SlotTime(s.to_string()))
    }
}

impl TryFrom<String> for SlotTime {
    type Error = SchedulingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotTime> for String {
    fn from(value: SlotTime) -> Self {
        value.0
    }
}

// ==============================================================================
// CALENDAR IDENTITIES
// ==============================================================================

/// Identity of one calendar day: (doctor, service type, date).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DayKey {
    pub doctor_id: Uuid,
    pub service: ServiceKind,
    pub date: NaiveDate,
}

impl DayKey {
    pub fn new(doctor_id: Uuid, service: ServiceKind, date: NaiveDate) -> Self {
        Self {
            doctor_id,
            service,
            date,
        }
    }

    /// Key under which the day is stored, e.g. "a1b2…:video:2024-06-01".
    pub fn storage_key(&self) -> String {
        format!("{}:{}:{}", self.doctor_id, self.service, self.date)
    }

    pub fn at(&self, time: SlotTime) -> SlotCoordinate {
        SlotCoordinate {
            doctor_id: self.doctor_id,
            service: self.service,
            date: self.date,
            time,
        }
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.doctor_id, self.service, self.date)
    }
}

/// The occupancy coordinate: at most one active appointment may hold it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SlotCoordinate {
    pub doctor_id: Uuid,
    pub service: ServiceKind,
    pub date: NaiveDate,
    pub time: SlotTime,
}

impl SlotCoordinate {
    pub fn day_key(&self) -> DayKey {
        DayKey::new(self.doctor_id, self.service, self.date)
    }
}

impl fmt::Display for SlotCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} {}",
            self.doctor_id, self.service, self.date, self.time
        )
    }
}

// ==============================================================================
// AVAILABILITY DAY
// ==============================================================================

/// One doctor's bookable calendar for a single date and service type.
///
/// `booked_slots` is always a subset of `offered_slots`; the store rejects
/// any mutation that would break that containment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityDay {
    pub doctor_id: Uuid,
    pub service: ServiceKind,
    pub date: NaiveDate,
    pub offered_slots: BTreeSet<SlotTime>,
    pub booked_slots: BTreeSet<SlotTime>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AvailabilityDay {
    pub fn new(key: DayKey, offered_slots: BTreeSet<SlotTime>, is_available: bool) -> Self {
        let now = Utc::now();
        Self {
            doctor_id: key.doctor_id,
            service: key.service,
            date: key.date,
            offered_slots,
            booked_slots: BTreeSet::new(),
            is_available,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> DayKey {
        DayKey::new(self.doctor_id, self.service, self.date)
    }

    pub fn is_offered(&self, time: &SlotTime) -> bool {
        self.offered_slots.contains(time)
    }

    pub fn is_booked(&self, time: &SlotTime) -> bool {
        self.booked_slots.contains(time)
    }

    /// Offered slots not currently held by an active appointment, ascending.
    pub fn free_slots(&self) -> impl Iterator<Item = &SlotTime> {
        self.offered_slots
            .iter()
            .filter(|time| !self.booked_slots.contains(*time))
    }
}

// ==============================================================================
// APPOINTMENT LIFECYCLE
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Whether the appointment still occupies its slot coordinate.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    pub fn can_transition_to(&self, new_status: &AppointmentStatus) -> bool {
        match self {
            AppointmentStatus::Pending => matches!(
                new_status,
                AppointmentStatus::Confirmed | AppointmentStatus::Cancelled
            ),
            AppointmentStatus::Confirmed => matches!(
                new_status,
                AppointmentStatus::Completed | AppointmentStatus::Cancelled
            ),
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => false,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(SchedulingError::Validation(format!(
                "Unknown appointment status: {}",
                other
            ))),
        }
    }
}

/// Owned by the payment collaborator; changing it never touches occupancy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Unpaid => write!(f, "unpaid"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

// ==============================================================================
// ATTACHMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    LabTest,
    Document,
}

/// Ancillary record owned by an external subsystem, keyed by appointment id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentAttachment {
    pub id: Uuid,
    pub kind: AttachmentKind,
    pub label: String,
    pub added_at: DateTime<Utc>,
}

impl AppointmentAttachment {
    pub fn new(kind: AttachmentKind, label: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            label,
            added_at: Utc::now(),
        }
    }
}

// ==============================================================================
// APPOINTMENT
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub service: ServiceKind,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: SlotTime,
    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
    pub fee_amount: Option<f64>,
    pub notes: Option<String>,
    pub attachments: Vec<AppointmentAttachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// The occupancy coordinate this appointment holds while active.
    pub fn coordinate(&self) -> SlotCoordinate {
        SlotCoordinate {
            doctor_id: self.doctor_id,
            service: self.service,
            date: self.scheduled_date,
            time: self.scheduled_time.clone(),
        }
    }

    pub fn day_key(&self) -> DayKey {
        DayKey::new(self.doctor_id, self.service, self.scheduled_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_time_accepts_valid_hh_mm() {
        let time = SlotTime::new("09:30").unwrap();
        assert_eq!(time.as_str(), "09:30");
    }

    #[test]
    fn slot_time_rejects_malformed_input() {
        for raw in ["9:30", "09:60", "24:00", "0930", "ab:cd", "09:30:00"] {
            assert!(SlotTime::new(raw).is_err(), "accepted '{}'", raw);
        }
    }

    #[test]
    fn slot_time_orders_lexically() {
        let early = SlotTime::new("09:00").unwrap();
        let late = SlotTime::new("10:30").unwrap();
        assert!(early < late);
    }

    #[test]
    fn status_machine_matches_lifecycle() {
        use AppointmentStatus::*;
        assert!(Pending.can_transition_to(&Confirmed));
        assert!(Pending.can_transition_to(&Cancelled));
        assert!(!Pending.can_transition_to(&Completed));
        assert!(Confirmed.can_transition_to(&Completed));
        assert!(Confirmed.can_transition_to(&Cancelled));
        assert!(!Completed.can_transition_to(&Cancelled));
        assert!(!Cancelled.can_transition_to(&Pending));
    }

    #[test]
    fn service_kind_round_trips_through_display() {
        for kind in [ServiceKind::Video, ServiceKind::HomeVisit] {
            let parsed: ServiceKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }
}
