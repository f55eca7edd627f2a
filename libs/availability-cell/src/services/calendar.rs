// libs/availability-cell/src/services/calendar.rs
use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use shared_database::SchedulingStore;
use shared_models::{AvailabilityDay, DayKey, SchedulingError, SlotTime};

use crate::models::UpsertDayRequest;

/// Administrative mutation path for a doctor's calendar.
///
/// This service owns `offered_slots` and `is_available`; slot occupancy is
/// the scheduler's. Booked time is immutable from here: any edit that would
/// drop a booked slot is refused in full, and day responses always carry
/// `booked_slots` so editing UIs can render those slots as locked.
#[derive(Clone)]
pub struct CalendarEditorService {
    store: Arc<SchedulingStore>,
}

impl CalendarEditorService {
    pub fn new(store: Arc<SchedulingStore>) -> Self {
        Self { store }
    }

    pub async fn get_day(&self, key: &DayKey) -> Result<AvailabilityDay, SchedulingError> {
        debug!("Fetching calendar day {}", key);
        self.store
            .get_day(key)
            .await
            .ok_or_else(|| SchedulingError::NotFound(format!("No calendar day {}", key)))
    }

    /// Publish or replace the offered slots for a day.
    pub async fn upsert_day(
        &self,
        key: DayKey,
        request: UpsertDayRequest,
    ) -> Result<AvailabilityDay, SchedulingError> {
        debug!(
            "Upserting calendar day {} with {} slots",
            key,
            request.offered_slots.len()
        );
        self.store
            .upsert_day(key, request.offered_slots, request.is_available)
            .await
    }

    pub async fn add_slot(
        &self,
        key: &DayKey,
        time: SlotTime,
    ) -> Result<AvailabilityDay, SchedulingError> {
        self.store.add_slot(key, time).await
    }

    /// Withdraw an offered slot; fails with a conflict while it is booked.
    pub async fn remove_slot(
        &self,
        key: &DayKey,
        time: &SlotTime,
    ) -> Result<AvailabilityDay, SchedulingError> {
        self.store.remove_slot(key, time).await
    }

    /// Hide or expose a day to the slot resolver. Existing appointments on
    /// the day are untouched either way.
    pub async fn set_day_availability(
        &self,
        key: &DayKey,
        is_available: bool,
    ) -> Result<AvailabilityDay, SchedulingError> {
        self.store.set_day_availability(key, is_available).await
    }

    /// The slots an editing UI must render as locked for a day.
    pub async fn locked_slots(&self, key: &DayKey) -> Result<BTreeSet<SlotTime>, SchedulingError> {
        Ok(self.get_day(key).await?.booked_slots)
    }
}
