use std::collections::BTreeSet;
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use uuid::Uuid;

use appointment_cell::models::{BookAppointmentRequest, RescheduleAppointmentRequest};
use appointment_cell::SchedulerService;
use availability_cell::SlotResolverService;
use shared_database::SchedulingStore;
use shared_models::{
    AppointmentStatus, AttachmentKind, DayKey, PaymentStatus, SchedulingError, ServiceKind,
    SlotTime,
};

fn slots(times: &[&str]) -> BTreeSet<SlotTime> {
    times.iter().map(|t| SlotTime::new(t).unwrap()).collect()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

fn time(raw: &str) -> SlotTime {
    SlotTime::new(raw).unwrap()
}

async fn publish(store: &SchedulingStore, doctor_id: Uuid, day: u32, times: &[&str]) -> DayKey {
    let key = DayKey::new(doctor_id, ServiceKind::Video, date(day));
    store.upsert_day(key, slots(times), true).await.unwrap();
    key
}

fn booking(doctor_id: Uuid, day: u32, at: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id,
        patient_id: Uuid::new_v4(),
        service: ServiceKind::Video,
        date: date(day),
        time: time(at),
        fee_amount: Some(40.0),
        notes: None,
    }
}

#[tokio::test]
async fn booking_creates_a_pending_appointment_and_hides_the_slot() {
    let store = Arc::new(SchedulingStore::new());
    let doctor_id = Uuid::new_v4();
    publish(&store, doctor_id, 1, &["09:00", "10:00"]).await;

    let scheduler = SchedulerService::new(store.clone());
    let appointment = scheduler
        .book_appointment(booking(doctor_id, 1, "09:00"))
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Pending);
    assert_eq!(appointment.payment_status, PaymentStatus::Unpaid);
    assert_eq!(appointment.scheduled_time, time("09:00"));

    // Only 10:00 remains listed for that date.
    let resolver = SlotResolverService::new(store);
    let listing = resolver
        .list_free_slots(doctor_id, ServiceKind::Video, date(1), Some(date(1)))
        .await
        .unwrap();
    assert_eq!(listing.slots.len(), 1);
    assert_eq!(listing.slots[0].time, time("10:00"));
}

#[tokio::test]
async fn booking_a_taken_or_unoffered_slot_is_refused() {
    let store = Arc::new(SchedulingStore::new());
    let doctor_id = Uuid::new_v4();
    publish(&store, doctor_id, 1, &["09:00"]).await;

    let scheduler = SchedulerService::new(store);
    scheduler
        .book_appointment(booking(doctor_id, 1, "09:00"))
        .await
        .unwrap();

    assert_matches!(
        scheduler.book_appointment(booking(doctor_id, 1, "09:00")).await,
        Err(SchedulingError::SlotUnavailable { .. })
    );
    assert_matches!(
        scheduler.book_appointment(booking(doctor_id, 1, "11:00")).await,
        Err(SchedulingError::SlotUnavailable { .. })
    );
}

#[tokio::test]
async fn negative_fee_is_a_validation_error() {
    let store = Arc::new(SchedulingStore::new());
    let doctor_id = Uuid::new_v4();
    publish(&store, doctor_id, 1, &["09:00"]).await;

    let scheduler = SchedulerService::new(store);
    let mut request = booking(doctor_id, 1, "09:00");
    request.fee_amount = Some(-1.0);

    assert_matches!(
        scheduler.book_appointment(request).await,
        Err(SchedulingError::Validation(_))
    );
}

#[tokio::test]
async fn reschedule_moves_the_booking_and_reports_the_old_coordinate() {
    let store = Arc::new(SchedulingStore::new());
    let doctor_id = Uuid::new_v4();
    let old_key = publish(&store, doctor_id, 1, &["09:00"]).await;
    let new_key = publish(&store, doctor_id, 2, &["11:00"]).await;

    let scheduler = SchedulerService::new(store.clone());
    let appointment = scheduler
        .book_appointment(booking(doctor_id, 1, "09:00"))
        .await
        .unwrap();

    let outcome = scheduler
        .reschedule_appointment(
            appointment.id,
            RescheduleAppointmentRequest {
                new_date: date(2),
                new_time: time("11:00"),
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.previous_date, date(1));
    assert_eq!(outcome.previous_time, time("09:00"));
    assert_eq!(outcome.appointment.scheduled_date, date(2));
    assert_eq!(outcome.appointment.scheduled_time, time("11:00"));

    let old_day = store.get_day(&old_key).await.unwrap();
    assert!(!old_day.is_booked(&time("09:00")));
    let new_day = store.get_day(&new_key).await.unwrap();
    assert!(new_day.is_booked(&time("11:00")));
}

#[tokio::test]
async fn refused_reschedule_leaves_the_original_booking_untouched() {
    let store = Arc::new(SchedulingStore::new());
    let doctor_id = Uuid::new_v4();
    let key = publish(&store, doctor_id, 1, &["09:00", "10:00"]).await;

    let scheduler = SchedulerService::new(store.clone());
    let appointment = scheduler
        .book_appointment(booking(doctor_id, 1, "09:00"))
        .await
        .unwrap();
    scheduler
        .book_appointment(booking(doctor_id, 1, "10:00"))
        .await
        .unwrap();

    let refused = scheduler
        .reschedule_appointment(
            appointment.id,
            RescheduleAppointmentRequest {
                new_date: date(1),
                new_time: time("10:00"),
            },
        )
        .await;
    assert_matches!(refused, Err(SchedulingError::SlotUnavailable { .. }));

    let unchanged = scheduler.get_appointment(appointment.id).await.unwrap();
    assert_eq!(unchanged.scheduled_time, time("09:00"));
    assert!(store.get_day(&key).await.unwrap().is_booked(&time("09:00")));
}

#[tokio::test]
async fn rescheduling_an_unknown_or_terminal_appointment_fails() {
    let store = Arc::new(SchedulingStore::new());
    let doctor_id = Uuid::new_v4();
    publish(&store, doctor_id, 1, &["09:00", "10:00"]).await;

    let scheduler = SchedulerService::new(store);
    let request = RescheduleAppointmentRequest {
        new_date: date(1),
        new_time: time("10:00"),
    };

    assert_matches!(
        scheduler
            .reschedule_appointment(Uuid::new_v4(), request.clone())
            .await,
        Err(SchedulingError::NotFound(_))
    );

    let appointment = scheduler
        .book_appointment(booking(doctor_id, 1, "09:00"))
        .await
        .unwrap();
    scheduler
        .set_status(appointment.id, AppointmentStatus::Cancelled)
        .await
        .unwrap();

    assert_matches!(
        scheduler.reschedule_appointment(appointment.id, request).await,
        Err(SchedulingError::InvalidState { .. })
    );
}

#[tokio::test]
async fn round_trip_leaves_both_coordinates_free() {
    let store = Arc::new(SchedulingStore::new());
    let doctor_id = Uuid::new_v4();
    let old_key = publish(&store, doctor_id, 1, &["09:00"]).await;
    let new_key = publish(&store, doctor_id, 2, &["11:00"]).await;

    let scheduler = SchedulerService::new(store.clone());
    let appointment = scheduler
        .book_appointment(booking(doctor_id, 1, "09:00"))
        .await
        .unwrap();
    scheduler
        .reschedule_appointment(
            appointment.id,
            RescheduleAppointmentRequest {
                new_date: date(2),
                new_time: time("11:00"),
            },
        )
        .await
        .unwrap();
    scheduler
        .set_status(appointment.id, AppointmentStatus::Cancelled)
        .await
        .unwrap();

    assert!(!store.get_day(&old_key).await.unwrap().is_booked(&time("09:00")));
    assert!(!store.get_day(&new_key).await.unwrap().is_booked(&time("11:00")));
}

#[tokio::test]
async fn status_machine_is_enforced_end_to_end() {
    let store = Arc::new(SchedulingStore::new());
    let doctor_id = Uuid::new_v4();
    publish(&store, doctor_id, 1, &["09:00"]).await;

    let scheduler = SchedulerService::new(store);
    let appointment = scheduler
        .book_appointment(booking(doctor_id, 1, "09:00"))
        .await
        .unwrap();

    // pending cannot jump straight to completed
    assert_matches!(
        scheduler
            .set_status(appointment.id, AppointmentStatus::Completed)
            .await,
        Err(SchedulingError::InvalidState { .. })
    );

    scheduler
        .set_status(appointment.id, AppointmentStatus::Confirmed)
        .await
        .unwrap();
    let done = scheduler
        .set_status(appointment.id, AppointmentStatus::Completed)
        .await
        .unwrap();
    assert_eq!(done.status, AppointmentStatus::Completed);

    // terminal states accept nothing further
    assert_matches!(
        scheduler
            .set_status(appointment.id, AppointmentStatus::Cancelled)
            .await,
        Err(SchedulingError::InvalidState { .. })
    );
}

#[tokio::test]
async fn completing_keeps_the_slot_and_closes_rescheduling() {
    let store = Arc::new(SchedulingStore::new());
    let doctor_id = Uuid::new_v4();
    let key = publish(&store, doctor_id, 1, &["09:00", "10:00"]).await;

    let scheduler = SchedulerService::new(store.clone());
    let appointment = scheduler
        .book_appointment(booking(doctor_id, 1, "09:00"))
        .await
        .unwrap();
    scheduler
        .set_status(appointment.id, AppointmentStatus::Confirmed)
        .await
        .unwrap();
    scheduler
        .set_status(appointment.id, AppointmentStatus::Completed)
        .await
        .unwrap();

    // The coordinate is not released for new bookings.
    assert!(store.get_day(&key).await.unwrap().is_booked(&time("09:00")));
    assert_matches!(
        scheduler.book_appointment(booking(doctor_id, 1, "09:00")).await,
        Err(SchedulingError::SlotUnavailable { .. })
    );

    assert_matches!(
        scheduler
            .reschedule_appointment(
                appointment.id,
                RescheduleAppointmentRequest {
                    new_date: date(1),
                    new_time: time("10:00"),
                },
            )
            .await,
        Err(SchedulingError::InvalidState { .. })
    );
}

#[tokio::test]
async fn cancellation_frees_the_slot_for_rebooking() {
    let store = Arc::new(SchedulingStore::new());
    let doctor_id = Uuid::new_v4();
    publish(&store, doctor_id, 1, &["09:00"]).await;

    let scheduler = SchedulerService::new(store);
    let first = scheduler
        .book_appointment(booking(doctor_id, 1, "09:00"))
        .await
        .unwrap();
    scheduler
        .set_status(first.id, AppointmentStatus::Cancelled)
        .await
        .unwrap();

    let second = scheduler
        .book_appointment(booking(doctor_id, 1, "09:00"))
        .await
        .unwrap();
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn payment_and_attachments_never_touch_occupancy() {
    let store = Arc::new(SchedulingStore::new());
    let doctor_id = Uuid::new_v4();
    let key = publish(&store, doctor_id, 1, &["09:00"]).await;

    let scheduler = SchedulerService::new(store.clone());
    let appointment = scheduler
        .book_appointment(booking(doctor_id, 1, "09:00"))
        .await
        .unwrap();

    let paid = scheduler
        .set_payment_status(appointment.id, PaymentStatus::Paid)
        .await
        .unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);

    let with_attachment = scheduler
        .attach_record(
            appointment.id,
            AttachmentKind::LabTest,
            "CBC panel".to_string(),
        )
        .await
        .unwrap();
    assert_eq!(with_attachment.attachments.len(), 1);
    assert_eq!(with_attachment.attachments[0].label, "CBC panel");

    let day = store.get_day(&key).await.unwrap();
    assert!(day.is_booked(&time("09:00")));
    assert_eq!(day.booked_slots.len(), 1);
}

#[tokio::test]
async fn disabling_a_day_cancels_nothing_and_still_accepts_direct_bookings() {
    let store = Arc::new(SchedulingStore::new());
    let doctor_id = Uuid::new_v4();
    let key = publish(&store, doctor_id, 1, &["09:00", "10:00"]).await;

    let scheduler = SchedulerService::new(store.clone());
    let first = scheduler
        .book_appointment(booking(doctor_id, 1, "09:00"))
        .await
        .unwrap();

    store.set_day_availability(&key, false).await.unwrap();

    // A direct booking of the other offered slot still succeeds.
    let second = scheduler
        .book_appointment(booking(doctor_id, 1, "10:00"))
        .await
        .unwrap();

    // Neither appointment was cancelled, but the day lists nothing.
    assert!(scheduler.get_appointment(first.id).await.unwrap().status.is_active());
    assert!(scheduler.get_appointment(second.id).await.unwrap().status.is_active());

    let resolver = SlotResolverService::new(store);
    let listing = resolver
        .list_free_slots(doctor_id, ServiceKind::Video, date(1), Some(date(1)))
        .await
        .unwrap();
    assert!(listing.slots.is_empty());
}

#[tokio::test]
async fn search_filters_by_patient_doctor_and_status() {
    let store = Arc::new(SchedulingStore::new());
    let doctor_id = Uuid::new_v4();
    publish(&store, doctor_id, 1, &["09:00", "10:00"]).await;

    let scheduler = SchedulerService::new(store);
    let first = scheduler
        .book_appointment(booking(doctor_id, 1, "09:00"))
        .await
        .unwrap();
    let second = scheduler
        .book_appointment(booking(doctor_id, 1, "10:00"))
        .await
        .unwrap();
    scheduler
        .set_status(second.id, AppointmentStatus::Cancelled)
        .await
        .unwrap();

    let pending = scheduler
        .search_appointments(appointment_cell::models::AppointmentSearchQuery {
            doctor_id: Some(doctor_id),
            status: Some(AppointmentStatus::Pending),
            ..Default::default()
        })
        .await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, first.id);

    let by_patient = scheduler
        .search_appointments(appointment_cell::models::AppointmentSearchQuery {
            patient_id: Some(first.patient_id),
            ..Default::default()
        })
        .await;
    assert_eq!(by_patient.len(), 1);
}
