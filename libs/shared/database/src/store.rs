// libs/shared/database/src/store.rs
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::{
    Appointment, AppointmentAttachment, AppointmentStatus, AvailabilityDay, DayKey, PaymentStatus,
    SchedulingError, ServiceKind, SlotCoordinate, SlotTime,
};

use crate::snapshot;

/// Everything the engine persists: the per-day calendars and the
/// appointment ledger.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct StoreState {
    pub(crate) days: HashMap<String, AvailabilityDay>,
    pub(crate) appointments: HashMap<Uuid, Appointment>,
}

/// Ledger search filter; unset fields match everything.
#[derive(Debug, Default, Clone)]
pub struct AppointmentFilter {
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub service: Option<ServiceKind>,
    pub status: Option<AppointmentStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl AppointmentFilter {
    fn matches(&self, appointment: &Appointment) -> bool {
        self.doctor_id.map_or(true, |id| appointment.doctor_id == id)
            && self.patient_id.map_or(true, |id| appointment.patient_id == id)
            && self.service.map_or(true, |s| appointment.service == s)
            && self.status.map_or(true, |s| appointment.status == s)
            && self.from_date.map_or(true, |d| appointment.scheduled_date >= d)
            && self.to_date.map_or(true, |d| appointment.scheduled_date <= d)
    }
}

/// Shared storage for the availability calendar and the reservation ledger.
///
/// A single lock guards both tables, and every public method performs its
/// whole effect inside one acquisition with no await points held across it.
/// That makes each call the atomic unit the scheduler relies on: a second
/// concurrent booking of the same coordinate is rejected by the store
/// itself, and a failed call leaves nothing half-applied.
pub struct SchedulingStore {
    state: RwLock<StoreState>,
    snapshot_path: Option<PathBuf>,
}

impl SchedulingStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            snapshot_path: None,
        }
    }

    /// Open a store backed by a JSON snapshot file, loading it if present.
    pub fn with_snapshot(path: PathBuf) -> anyhow::Result<Self> {
        let state = snapshot::load(&path)?.unwrap_or_default();
        info!(
            "Scheduling store opened with snapshot at {} ({} days, {} appointments)",
            path.display(),
            state.days.len(),
            state.appointments.len()
        );
        Ok(Self {
            state: RwLock::new(state),
            snapshot_path: Some(path),
        })
    }

    // ==========================================================================
    // AVAILABILITY STORE
    // ==========================================================================

    pub async fn get_day(&self, key: &DayKey) -> Option<AvailabilityDay> {
        let state = self.state.read().await;
        state.days.get(&key.storage_key()).cloned()
    }

    /// Replace a day's offered slots and availability flag as one update.
    ///
    /// The whole update is rejected with a conflict if it would drop any
    /// currently booked slot; booked time is immutable from the editing
    /// surface.
    pub async fn upsert_day(
        &self,
        key: DayKey,
        offered_slots: BTreeSet<SlotTime>,
        is_available: bool,
    ) -> Result<AvailabilityDay, SchedulingError> {
        let mut state = self.state.write().await;

        let day = match state.days.get_mut(&key.storage_key()) {
            Some(day) => {
                if let Some(booked) = day
                    .booked_slots
                    .iter()
                    .find(|time| !offered_slots.contains(*time))
                {
                    warn!("Rejected calendar update for {}: slot {} is booked", key, booked);
                    return Err(SchedulingError::Conflict(format!(
                        "Cannot remove slot {}: it is booked",
                        booked
                    )));
                }
                day.offered_slots = offered_slots;
                day.is_available = is_available;
                day.updated_at = Utc::now();
                day.clone()
            }
            None => {
                let day = AvailabilityDay::new(key, offered_slots, is_available);
                state.days.insert(key.storage_key(), day.clone());
                day
            }
        };

        info!("Calendar day {} updated ({} slots offered)", key, day.offered_slots.len());
        self.persist(&state);
        Ok(day)
    }

    /// Add one offered slot, creating the day if it was never published.
    pub async fn add_slot(
        &self,
        key: &DayKey,
        time: SlotTime,
    ) -> Result<AvailabilityDay, SchedulingError> {
        let mut state = self.state.write().await;

        let day = state
            .days
            .entry(key.storage_key())
            .or_insert_with(|| AvailabilityDay::new(*key, BTreeSet::new(), true));
        day.offered_slots.insert(time.clone());
        day.updated_at = Utc::now();
        let day = day.clone();

        debug!("Slot {} offered on {}", time, key);
        self.persist(&state);
        Ok(day)
    }

    /// Withdraw one offered slot. Booked time cannot be withdrawn.
    pub async fn remove_slot(
        &self,
        key: &DayKey,
        time: &SlotTime,
    ) -> Result<AvailabilityDay, SchedulingError> {
        let mut state = self.state.write().await;

        let day = state
            .days
            .get_mut(&key.storage_key())
            .ok_or_else(|| SchedulingError::NotFound(format!("No calendar day {}", key)))?;

        if day.booked_slots.contains(time) {
            warn!("Rejected slot removal on {}: {} is booked", key, time);
            return Err(SchedulingError::Conflict(format!(
                "Cannot remove slot {}: it is booked",
                time
            )));
        }
        if !day.offered_slots.remove(time) {
            return Err(SchedulingError::NotFound(format!(
                "Slot {} is not offered on {}",
                time, key
            )));
        }
        day.updated_at = Utc::now();
        let day = day.clone();

        debug!("Slot {} withdrawn from {}", time, key);
        self.persist(&state);
        Ok(day)
    }

    /// Toggle a day's visibility to the slot resolver. Existing bookings
    /// are honored either way.
    pub async fn set_day_availability(
        &self,
        key: &DayKey,
        is_available: bool,
    ) -> Result<AvailabilityDay, SchedulingError> {
        let mut state = self.state.write().await;

        let day = state
            .days
            .get_mut(&key.storage_key())
            .ok_or_else(|| SchedulingError::NotFound(format!("No calendar day {}", key)))?;
        day.is_available = is_available;
        day.updated_at = Utc::now();
        let day = day.clone();

        info!("Calendar day {} availability set to {}", key, is_available);
        self.persist(&state);
        Ok(day)
    }

    /// Flip a slot from free to booked. Fails unless the time is offered
    /// and not already held.
    pub async fn mark_booked(&self, key: &DayKey, time: &SlotTime) -> Result<(), SchedulingError> {
        let mut state = self.state.write().await;
        mark_booked_inner(&mut state, key, time)?;
        self.persist(&state);
        Ok(())
    }

    /// Inverse of `mark_booked`; freeing an already-free slot is a no-op.
    pub async fn mark_freed(&self, key: &DayKey, time: &SlotTime) -> Result<(), SchedulingError> {
        let mut state = self.state.write().await;
        mark_freed_inner(&mut state, key, time);
        self.persist(&state);
        Ok(())
    }

    /// Calendar days for one doctor and service within an inclusive date
    /// range, ascending by date.
    pub async fn days_in_range(
        &self,
        doctor_id: Uuid,
        service: ServiceKind,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<AvailabilityDay> {
        let state = self.state.read().await;
        let mut days: Vec<AvailabilityDay> = state
            .days
            .values()
            .filter(|day| {
                day.doctor_id == doctor_id
                    && day.service == service
                    && day.date >= from
                    && day.date <= to
            })
            .cloned()
            .collect();
        days.sort_by_key(|day| day.date);
        days
    }

    // ==========================================================================
    // RESERVATION LEDGER
    // ==========================================================================

    pub async fn get_appointment(&self, id: Uuid) -> Option<Appointment> {
        let state = self.state.read().await;
        state.appointments.get(&id).cloned()
    }

    /// The active (pending or confirmed) appointment holding a coordinate,
    /// if any.
    pub async fn active_appointment_at(&self, coordinate: &SlotCoordinate) -> Option<Appointment> {
        let state = self.state.read().await;
        state
            .appointments
            .values()
            .find(|apt| apt.status.is_active() && apt.coordinate() == *coordinate)
            .cloned()
    }

    pub async fn search_appointments(&self, filter: &AppointmentFilter) -> Vec<Appointment> {
        let state = self.state.read().await;
        let mut found: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|apt| filter.matches(apt))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            (a.scheduled_date, &a.scheduled_time).cmp(&(b.scheduled_date, &b.scheduled_time))
        });
        found
    }

    /// Commit a new booking: check the coordinate is offered and free,
    /// insert the appointment, and mark the slot booked, atomically.
    /// On failure nothing is inserted.
    pub async fn insert_booking(
        &self,
        appointment: Appointment,
    ) -> Result<Appointment, SchedulingError> {
        let mut state = self.state.write().await;

        let key = appointment.day_key();
        mark_booked_inner(&mut state, &key, &appointment.scheduled_time)?;
        state.appointments.insert(appointment.id, appointment.clone());

        info!(
            "Appointment {} booked at {} for patient {}",
            appointment.id,
            appointment.coordinate(),
            appointment.patient_id
        );
        self.persist(&state);
        Ok(appointment)
    }

    /// Commit a reschedule: validate the target slot is free, free the old
    /// coordinate, book the new one, and rewrite the appointment's date and
    /// time as one unit. On failure the original booking is untouched.
    pub async fn move_booking(
        &self,
        id: Uuid,
        new_date: NaiveDate,
        new_time: SlotTime,
    ) -> Result<Appointment, SchedulingError> {
        let mut state = self.state.write().await;

        let appointment = state
            .appointments
            .get(&id)
            .ok_or_else(|| SchedulingError::NotFound(format!("No appointment {}", id)))?;

        if appointment.status.is_terminal() {
            return Err(SchedulingError::InvalidState {
                status: appointment.status,
            });
        }

        let old_key = appointment.day_key();
        let old_time = appointment.scheduled_time.clone();
        let new_key = DayKey::new(appointment.doctor_id, appointment.service, new_date);

        if old_key.date == new_date && old_time == new_time {
            return Ok(appointment.clone());
        }

        // Validate the target before touching the old slot, so a refused
        // reschedule cannot leave the original coordinate freed.
        let target_free = state
            .days
            .get(&new_key.storage_key())
            .map(|day| day.is_offered(&new_time) && !day.is_booked(&new_time))
            .unwrap_or(false);
        if !target_free {
            warn!("Reschedule of {} refused: {} {} not free", id, new_date, new_time);
            return Err(SchedulingError::SlotUnavailable {
                date: new_date,
                time: new_time,
            });
        }

        mark_freed_inner(&mut state, &old_key, &old_time);
        mark_booked_inner(&mut state, &new_key, &new_time)?;

        let appointment = state
            .appointments
            .get_mut(&id)
            .ok_or_else(|| SchedulingError::NotFound(format!("No appointment {}", id)))?;
        appointment.scheduled_date = new_date;
        appointment.scheduled_time = new_time;
        appointment.updated_at = Utc::now();
        let appointment = appointment.clone();

        info!(
            "Appointment {} moved from {} {} to {}",
            id,
            old_key.date,
            old_time,
            appointment.coordinate()
        );
        self.persist(&state);
        Ok(appointment)
    }

    /// Apply a status transition under the appointment state machine.
    /// Cancelling frees the slot; completing keeps it marked.
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        let mut state = self.state.write().await;

        let appointment = state
            .appointments
            .get_mut(&id)
            .ok_or_else(|| SchedulingError::NotFound(format!("No appointment {}", id)))?;

        if !appointment.status.can_transition_to(&new_status) {
            warn!(
                "Invalid status transition for {}: {} -> {}",
                id, appointment.status, new_status
            );
            return Err(SchedulingError::InvalidState {
                status: appointment.status,
            });
        }

        appointment.status = new_status;
        appointment.updated_at = Utc::now();
        let appointment = appointment.clone();

        if new_status == AppointmentStatus::Cancelled {
            let key = appointment.day_key();
            mark_freed_inner(&mut state, &key, &appointment.scheduled_time);
        }

        info!("Appointment {} is now {}", id, new_status);
        self.persist(&state);
        Ok(appointment)
    }

    /// Payment collaborator surface; never touches occupancy.
    pub async fn update_payment_status(
        &self,
        id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Appointment, SchedulingError> {
        let mut state = self.state.write().await;

        let appointment = state
            .appointments
            .get_mut(&id)
            .ok_or_else(|| SchedulingError::NotFound(format!("No appointment {}", id)))?;
        appointment.payment_status = payment_status;
        appointment.updated_at = Utc::now();
        let appointment = appointment.clone();

        debug!("Appointment {} payment status set to {}", id, payment_status);
        self.persist(&state);
        Ok(appointment)
    }

    /// Attachment collaborator surface; never touches occupancy.
    pub async fn add_attachment(
        &self,
        id: Uuid,
        attachment: AppointmentAttachment,
    ) -> Result<Appointment, SchedulingError> {
        let mut state = self.state.write().await;

        let appointment = state
            .appointments
            .get_mut(&id)
            .ok_or_else(|| SchedulingError::NotFound(format!("No appointment {}", id)))?;
        appointment.attachments.push(attachment);
        appointment.updated_at = Utc::now();
        let appointment = appointment.clone();

        self.persist(&state);
        Ok(appointment)
    }

    // ==========================================================================
    // PERSISTENCE
    // ==========================================================================

    /// Best-effort snapshot write after a committed mutation. Failures are
    /// logged and never surfaced as scheduling errors.
    fn persist(&self, state: &StoreState) {
        if let Some(path) = &self.snapshot_path {
            if let Err(e) = snapshot::save(path, state) {
                warn!("Failed to write scheduling snapshot to {}: {}", path.display(), e);
            }
        }
    }
}

impl Default for SchedulingStore {
    fn default() -> Self {
        Self::new()
    }
}

fn mark_booked_inner(
    state: &mut StoreState,
    key: &DayKey,
    time: &SlotTime,
) -> Result<(), SchedulingError> {
    let unavailable = || SchedulingError::SlotUnavailable {
        date: key.date,
        time: time.clone(),
    };

    let day = state.days.get_mut(&key.storage_key()).ok_or_else(unavailable)?;
    if !day.offered_slots.contains(time) || day.booked_slots.contains(time) {
        return Err(unavailable());
    }
    day.booked_slots.insert(time.clone());
    day.updated_at = Utc::now();
    Ok(())
}

fn mark_freed_inner(state: &mut StoreState, key: &DayKey, time: &SlotTime) {
    if let Some(day) = state.days.get_mut(&key.storage_key()) {
        if day.booked_slots.remove(time) {
            day.updated_at = Utc::now();
        }
    }
}
