// libs/availability-cell/src/services/slots.rs
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::debug;
use uuid::Uuid;

use shared_database::SchedulingStore;
use shared_models::{AvailabilityDay, SchedulingError, ServiceKind};

use crate::models::{FreeSlot, FreeSlotsResponse, SlotQueryRules};

/// Read path that projects the availability calendar into the bookable
/// slots a patient can pick from.
///
/// Results are recomputed from current store state on every call; nothing
/// is cached between calls.
#[derive(Clone)]
pub struct SlotResolverService {
    store: Arc<SchedulingStore>,
    rules: SlotQueryRules,
}

impl SlotResolverService {
    pub fn new(store: Arc<SchedulingStore>) -> Self {
        Self {
            store,
            rules: SlotQueryRules::default(),
        }
    }

    pub fn with_rules(store: Arc<SchedulingStore>, rules: SlotQueryRules) -> Self {
        Self { store, rules }
    }

    /// Free (date, time) pairs for a doctor and service, ascending by date
    /// then time. Days hidden with `is_available = false` are skipped
    /// entirely; a fully booked day contributes nothing rather than erring.
    pub async fn list_free_slots(
        &self,
        doctor_id: Uuid,
        service: ServiceKind,
        from: NaiveDate,
        to: Option<NaiveDate>,
    ) -> Result<FreeSlotsResponse, SchedulingError> {
        let to = self.resolve_range_end(from, to)?;

        let days = self.store.days_in_range(doctor_id, service, from, to).await;
        let slots: Vec<FreeSlot> = free_slots_in(days).collect();

        debug!(
            "Resolved {} free slots for doctor {} ({}) between {} and {}",
            slots.len(),
            doctor_id,
            service,
            from,
            to
        );
        Ok(FreeSlotsResponse {
            doctor_id,
            service,
            from,
            to,
            slots,
        })
    }

    fn resolve_range_end(
        &self,
        from: NaiveDate,
        to: Option<NaiveDate>,
    ) -> Result<NaiveDate, SchedulingError> {
        let to = to.unwrap_or(from + Duration::days(self.rules.default_range_days));

        if to < from {
            return Err(SchedulingError::Validation(format!(
                "Date range end {} precedes start {}",
                to, from
            )));
        }
        if (to - from).num_days() > self.rules.max_range_days {
            return Err(SchedulingError::Validation(format!(
                "Date range exceeds {} days",
                self.rules.max_range_days
            )));
        }

        Ok(to)
    }
}

/// Lazily walk a set of calendar days and yield their free slots in order.
/// The input days are expected ascending by date; within a day, slot order
/// is the offered set's ascending order.
pub fn free_slots_in(days: Vec<AvailabilityDay>) -> impl Iterator<Item = FreeSlot> {
    days.into_iter()
        .filter(|day| day.is_available)
        .flat_map(|day| {
            let date = day.date;
            let free: Vec<FreeSlot> = day
                .free_slots()
                .cloned()
                .map(|time| FreeSlot { date, time })
                .collect();
            free
        })
}
