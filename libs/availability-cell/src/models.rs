// libs/availability-cell/src/models.rs
use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::{ServiceKind, SlotTime};

// ==============================================================================
// CALENDAR EDITOR REQUESTS
// ==============================================================================

/// Whole-day update: the complete set of offered slots plus the visibility
/// flag. Partial applies are not a thing; the store accepts or rejects the
/// update as one unit.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertDayRequest {
    pub offered_slots: BTreeSet<SlotTime>,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddSlotRequest {
    pub time: SlotTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetDayAvailabilityRequest {
    pub is_available: bool,
}

// ==============================================================================
// SLOT RESOLVER
// ==============================================================================

/// One bookable (date, time) pair, as surfaced to booking UIs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FreeSlot {
    pub date: NaiveDate,
    pub time: SlotTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FreeSlotsQuery {
    pub service: ServiceKind,
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
}

/// Range limits for free-slot queries.
#[derive(Debug, Clone)]
pub struct SlotQueryRules {
    pub default_range_days: i64,
    pub max_range_days: i64,
}

impl Default for SlotQueryRules {
    fn default() -> Self {
        Self {
            default_range_days: 13,
            max_range_days: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FreeSlotsResponse {
    pub doctor_id: Uuid,
    pub service: ServiceKind,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub slots: Vec<FreeSlot>,
}
