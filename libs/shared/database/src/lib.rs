mod snapshot;
pub mod store;

pub use store::{AppointmentFilter, SchedulingStore};
