use std::sync::Arc;

use chrono::{Days, NaiveDate, TimeDelta, Utc};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::error::{BookingError, ValidationError};
use crate::policy::{validate_stay, validate_window};
use crate::store::{SlotStore, SlotStoreError};
use crate::types::{Booking, NightSlot};

/// Booking operations over the calendar of per-night slots.
///
/// The service holds no authoritative state of its own: every operation
/// re-reads the store immediately before mutating it, and all cross-request
/// synchronization is delegated to the store's conditional `put`.
pub struct BookingService {
    store: Arc<dyn SlotStore>,
}

impl BookingService {
    /// Creates a service backed by the given slot store.
    pub fn new(store: Arc<dyn SlotStore>) -> Self {
        Self { store }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Reserves the campsite for `[arrival, departure)`, one slot per night.
    ///
    /// The whole set of nights appears or none does: a night lost to another
    /// group rolls back every night already written before the call returns
    /// [`BookingError::Conflict`].
    pub async fn create_booking(
        &self,
        arrival: Option<NaiveDate>,
        departure: Option<NaiveDate>,
        guest_name: &str,
        guest_email: &str,
    ) -> Result<Uuid, BookingError> {
        let (arrival, departure) = validate_stay(arrival, departure, Self::today())?;

        let nights = (departure - arrival).num_days();
        let dates: Vec<NaiveDate> = (0..nights)
            .map(|offset| arrival + Days::new(offset as u64))
            .collect();

        // Re-read the calendar before writing anything; a visibly occupied
        // night fails the request without a single put.
        if let Some(last_night) = dates.last() {
            let occupied = self
                .store
                .find_range(arrival, *last_night)
                .await
                .map_err(internal)?;
            if !occupied.is_empty() {
                return Err(BookingError::Conflict);
            }
        }

        let group_id = Uuid::new_v4();
        let mut written: Vec<NaiveDate> = Vec::with_capacity(dates.len());
        for date in &dates {
            let slot = NightSlot {
                date: *date,
                group_id,
                guest_name: guest_name.to_owned(),
                guest_email: guest_email.to_owned(),
            };
            match self.store.put(slot).await {
                Ok(()) => written.push(*date),
                Err(err) => {
                    self.roll_back_created(group_id, &written).await;
                    return Err(match err {
                        SlotStoreError::AlreadyOccupied(date) => {
                            debug!("night {} lost to another group, allocation of {} rolled back", date, group_id);
                            BookingError::Conflict
                        }
                        other => internal(other),
                    });
                }
            }
        }

        Ok(group_id)
    }

    /// Moves a booking to a new date range of equal length, optionally
    /// rewriting the guest fields.
    ///
    /// On a destination conflict the slots already moved are put back on
    /// their original dates and the call returns [`BookingError::Conflict`];
    /// the booking is never left half-moved unless the restore itself loses
    /// a race, which is surfaced as [`BookingError::Internal`].
    pub async fn relocate_booking(
        &self,
        group_id: Uuid,
        new_arrival: Option<NaiveDate>,
        new_departure: Option<NaiveDate>,
        guest_name: Option<&str>,
        guest_email: Option<&str>,
    ) -> Result<Uuid, BookingError> {
        let slots = self.store.find_by_group(group_id).await.map_err(internal)?;
        if slots.is_empty() {
            return Err(BookingError::NotFound);
        }

        let (new_arrival, new_departure) = validate_stay(new_arrival, new_departure, Self::today())?;
        if (new_departure - new_arrival).num_days() != slots.len() as i64 {
            return Err(ValidationError::DurationMismatch.into());
        }

        let old_arrival = slots[0].date;
        let delta = (new_arrival - old_arrival).num_days();

        if delta == 0 {
            if guest_name.is_none() && guest_email.is_none() {
                return Ok(group_id);
            }
            self.rewrite_guests(slots, guest_name, guest_email).await?;
            return Ok(group_id);
        }

        // Moving earlier walks the group from its earliest night, moving
        // later from its latest, so the frontier always vacates a date
        // before a remaining slot of the same group needs it. Destinations
        // are then only ever blocked by a different group.
        let mut ordered = slots;
        if delta > 0 {
            ordered.reverse();
        }

        let mut moved: Vec<(NightSlot, NaiveDate)> = Vec::with_capacity(ordered.len());
        for slot in &ordered {
            let new_date = slot.date + TimeDelta::days(delta);
            let replacement = NightSlot {
                date: new_date,
                group_id,
                guest_name: field_or(guest_name, &slot.guest_name),
                guest_email: field_or(guest_email, &slot.guest_email),
            };
            match self.move_slot(slot.date, replacement).await {
                Ok(()) => moved.push((slot.clone(), new_date)),
                Err(SlotStoreError::AlreadyOccupied(date)) => {
                    debug!("night {} held by another group, relocation of {} rolled back", date, group_id);
                    self.roll_back_moved(group_id, &moved).await?;
                    return Err(BookingError::Conflict);
                }
                Err(other) => {
                    self.roll_back_moved(group_id, &moved).await?;
                    return Err(internal(other));
                }
            }
        }

        Ok(group_id)
    }

    /// Removes every night of a booking. Cancellation needs no date-rule
    /// checks, and deletion order does not matter.
    pub async fn cancel_booking(&self, group_id: Uuid) -> Result<(), BookingError> {
        let slots = self.store.find_by_group(group_id).await.map_err(internal)?;
        if slots.is_empty() {
            return Err(BookingError::NotFound);
        }

        for slot in slots {
            match self.store.delete(slot.date).await {
                Ok(()) => {}
                // Already freed by a concurrent caller; the night being gone
                // is the goal.
                Err(SlotStoreError::NotFound(_)) => {}
                Err(err) => return Err(internal(err)),
            }
        }

        Ok(())
    }

    /// Occupied nights inside a window, ascending by date. A missing end
    /// defaults to thirty days past the start.
    pub async fn availability(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<NightSlot>, BookingError> {
        let (from, to) = validate_window(from, to)?;
        self.store.find_range(from, to).await.map_err(internal)
    }

    /// Derived view of a single booking.
    pub async fn find_booking(&self, group_id: Uuid) -> Result<Booking, BookingError> {
        let slots = self.store.find_by_group(group_id).await.map_err(internal)?;
        Booking::from_slots(&slots).ok_or(BookingError::NotFound)
    }

    /// Puts the replacement before deleting the source so the group never
    /// drops a night it still owns.
    async fn move_slot(
        &self,
        old_date: NaiveDate,
        replacement: NightSlot,
    ) -> Result<(), SlotStoreError> {
        let new_date = replacement.date;
        self.store.put(replacement).await?;
        match self.store.delete(old_date).await {
            Ok(()) => Ok(()),
            Err(SlotStoreError::NotFound(_)) => {
                warn!("source night {} vanished while moving to {}", old_date, new_date);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn roll_back_created(&self, group_id: Uuid, written: &[NaiveDate]) {
        for date in written {
            if let Err(err) = self.store.delete(*date).await {
                // Only fails if someone else freed the night first.
                warn!("rollback delete of {} for {} failed: {}", date, group_id, err);
            }
        }
    }

    async fn roll_back_moved(
        &self,
        group_id: Uuid,
        moved: &[(NightSlot, NaiveDate)],
    ) -> Result<(), BookingError> {
        for (original, new_date) in moved.iter().rev() {
            if let Err(err) = self.move_slot(*new_date, original.clone()).await {
                error!(
                    "rollback of relocation for {} failed at {}: {}; booking left partially moved",
                    group_id, new_date, err
                );
                return Err(BookingError::Internal("relocation rollback failed".to_string()));
            }
        }
        Ok(())
    }

    /// Rewrites guest fields in place for a `delta == 0` relocation. The
    /// store has no in-place update, so each night is deleted and re-put on
    /// the same date.
    async fn rewrite_guests(
        &self,
        slots: Vec<NightSlot>,
        guest_name: Option<&str>,
        guest_email: Option<&str>,
    ) -> Result<(), BookingError> {
        for slot in slots {
            let rewritten = NightSlot {
                guest_name: field_or(guest_name, &slot.guest_name),
                guest_email: field_or(guest_email, &slot.guest_email),
                ..slot.clone()
            };
            self.store.delete(slot.date).await.map_err(internal)?;
            if let Err(err) = self.store.put(rewritten).await {
                error!("failed to re-put night {} during guest rewrite: {}", slot.date, err);
                return Err(BookingError::Internal("guest rewrite failed".to_string()));
            }
        }
        Ok(())
    }
}

fn internal(err: SlotStoreError) -> BookingError {
    BookingError::Internal(err.to_string())
}

fn field_or(new: Option<&str>, current: &str) -> String {
    new.map_or_else(|| current.to_owned(), str::to_owned)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::memory::MemorySlotStore;

    fn day(offset: i64) -> NaiveDate {
        Utc::now().date_naive() + TimeDelta::days(offset)
    }

    fn service() -> (BookingService, Arc<MemorySlotStore>) {
        let store = Arc::new(MemorySlotStore::new());
        (BookingService::new(store.clone()), store)
    }

    async fn occupied_dates(store: &MemorySlotStore) -> Vec<NaiveDate> {
        store
            .find_range(day(-1), day(60))
            .await
            .unwrap()
            .into_iter()
            .map(|slot| slot.date)
            .collect()
    }

    #[tokio::test]
    async fn create_decomposes_the_stay_into_consecutive_night_slots() {
        let (service, store) = service();

        let group_id = service
            .create_booking(Some(day(2)), Some(day(4)), "Ada", "ada@example.com")
            .await
            .unwrap();

        let slots = store.find_by_group(group_id).await.unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].date, day(2));
        assert_eq!(slots[1].date, day(3));
        assert!(slots.iter().all(|s| s.group_id == group_id));
        assert!(slots.iter().all(|s| s.guest_name == "Ada"));
    }

    #[tokio::test]
    async fn create_propagates_each_date_rule() {
        let (service, _) = service();

        let missing = service
            .create_booking(None, Some(day(4)), "Ada", "ada@example.com")
            .await;
        assert!(matches!(
            missing,
            Err(BookingError::Validation(ValidationError::MissingArrival))
        ));

        let same_day = service
            .create_booking(Some(day(0)), Some(day(2)), "Ada", "ada@example.com")
            .await;
        assert!(matches!(
            same_day,
            Err(BookingError::Validation(ValidationError::LeadTimeTooShort))
        ));

        let too_far = service
            .create_booking(Some(day(45)), Some(day(47)), "Ada", "ada@example.com")
            .await;
        assert!(matches!(
            too_far,
            Err(BookingError::Validation(ValidationError::LeadTimeTooLong))
        ));

        let too_long = service
            .create_booking(Some(day(5)), Some(day(10)), "Ada", "ada@example.com")
            .await;
        assert!(matches!(
            too_long,
            Err(BookingError::Validation(ValidationError::StayTooLong))
        ));
    }

    #[tokio::test]
    async fn create_over_an_occupied_night_conflicts_without_writing() {
        let (service, store) = service();
        let winner = service
            .create_booking(Some(day(3)), Some(day(5)), "Ada", "ada@example.com")
            .await
            .unwrap();

        let loser = service
            .create_booking(Some(day(4)), Some(day(6)), "Bob", "bob@example.com")
            .await;

        assert!(matches!(loser, Err(BookingError::Conflict)));
        let slots = store.find_range(day(2), day(7)).await.unwrap();
        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|s| s.group_id == winner));
    }

    /// Delegates to a [`MemorySlotStore`] but fails the nth `put`, exposing
    /// the compensating-rollback path that a pre-read cannot catch.
    struct FailingPutStore {
        inner: MemorySlotStore,
        fail_on: usize,
        puts: AtomicUsize,
    }

    #[async_trait]
    impl SlotStore for FailingPutStore {
        async fn put(&self, slot: NightSlot) -> Result<(), SlotStoreError> {
            let seen = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
            if seen == self.fail_on {
                return Err(SlotStoreError::AlreadyOccupied(slot.date));
            }
            self.inner.put(slot).await
        }

        async fn delete(&self, date: NaiveDate) -> Result<(), SlotStoreError> {
            self.inner.delete(date).await
        }

        async fn find_by_group(&self, group_id: Uuid) -> Result<Vec<NightSlot>, SlotStoreError> {
            self.inner.find_by_group(group_id).await
        }

        async fn find_range(
            &self,
            from: NaiveDate,
            to: NaiveDate,
        ) -> Result<Vec<NightSlot>, SlotStoreError> {
            self.inner.find_range(from, to).await
        }
    }

    #[tokio::test]
    async fn create_rolls_back_written_nights_when_a_later_put_loses() {
        let store = Arc::new(FailingPutStore {
            inner: MemorySlotStore::new(),
            fail_on: 3,
            puts: AtomicUsize::new(0),
        });
        let service = BookingService::new(store.clone());

        let result = service
            .create_booking(Some(day(2)), Some(day(5)), "Ada", "ada@example.com")
            .await;

        assert!(matches!(result, Err(BookingError::Conflict)));
        let leftovers = store.inner.find_range(day(1), day(6)).await.unwrap();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn concurrent_overlapping_creates_leave_exactly_one_winner() {
        let (service, store) = service();

        let (a, b) = tokio::join!(
            service.create_booking(Some(day(3)), Some(day(5)), "Ada", "ada@example.com"),
            service.create_booking(Some(day(4)), Some(day(6)), "Bob", "bob@example.com"),
        );

        let winners: Vec<Uuid> = [&a, &b].iter().filter_map(|r| r.as_ref().ok().copied()).collect();
        assert_eq!(winners.len(), 1);
        assert!(
            matches!(a, Err(BookingError::Conflict)) || matches!(b, Err(BookingError::Conflict))
        );

        let slots = store.find_range(day(2), day(7)).await.unwrap();
        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|s| s.group_id == winners[0]));
    }

    #[tokio::test]
    async fn relocate_moves_every_night_by_the_delta_and_keeps_guests() {
        let (service, store) = service();
        let group_id = service
            .create_booking(Some(day(3)), Some(day(5)), "Ada", "ada@example.com")
            .await
            .unwrap();

        let result = service
            .relocate_booking(group_id, Some(day(10)), Some(day(12)), None, None)
            .await
            .unwrap();

        assert_eq!(result, group_id);
        let slots = store.find_by_group(group_id).await.unwrap();
        let dates: Vec<NaiveDate> = slots.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![day(10), day(11)]);
        assert!(slots.iter().all(|s| s.guest_name == "Ada"));
        assert!(slots.iter().all(|s| s.guest_email == "ada@example.com"));
        assert_eq!(occupied_dates(&store).await, vec![day(10), day(11)]);
    }

    #[tokio::test]
    async fn relocate_handles_an_overlapping_later_range() {
        let (service, store) = service();
        let group_id = service
            .create_booking(Some(day(2)), Some(day(5)), "Ada", "ada@example.com")
            .await
            .unwrap();

        // New range shares two nights with the old one.
        service
            .relocate_booking(group_id, Some(day(3)), Some(day(6)), None, None)
            .await
            .unwrap();

        assert_eq!(occupied_dates(&store).await, vec![day(3), day(4), day(5)]);
    }

    #[tokio::test]
    async fn relocate_handles_an_overlapping_earlier_range() {
        let (service, store) = service();
        let group_id = service
            .create_booking(Some(day(3)), Some(day(6)), "Ada", "ada@example.com")
            .await
            .unwrap();

        service
            .relocate_booking(group_id, Some(day(2)), Some(day(5)), None, None)
            .await
            .unwrap();

        assert_eq!(occupied_dates(&store).await, vec![day(2), day(3), day(4)]);
    }

    #[tokio::test]
    async fn relocate_rejects_a_changed_night_count() {
        let (service, _) = service();
        let group_id = service
            .create_booking(Some(day(3)), Some(day(5)), "Ada", "ada@example.com")
            .await
            .unwrap();

        let result = service
            .relocate_booking(group_id, Some(day(10)), Some(day(13)), None, None)
            .await;

        assert!(matches!(
            result,
            Err(BookingError::Validation(ValidationError::DurationMismatch))
        ));
    }

    #[tokio::test]
    async fn relocate_of_an_unknown_group_is_not_found() {
        let (service, _) = service();
        let result = service
            .relocate_booking(Uuid::new_v4(), Some(day(10)), Some(day(12)), None, None)
            .await;
        assert!(matches!(result, Err(BookingError::NotFound)));
    }

    #[tokio::test]
    async fn relocate_conflict_restores_the_original_dates() {
        let (service, store) = service();
        let group_id = service
            .create_booking(Some(day(10)), Some(day(12)), "Ada", "ada@example.com")
            .await
            .unwrap();
        let blocker = service
            .create_booking(Some(day(14)), Some(day(15)), "Bob", "bob@example.com")
            .await
            .unwrap();

        // Latest-first processing moves day(11) to day(15) before hitting
        // Bob on day(14); the rollback must undo that first move.
        let result = service
            .relocate_booking(group_id, Some(day(14)), Some(day(16)), None, None)
            .await;

        assert!(matches!(result, Err(BookingError::Conflict)));
        let mine: Vec<NaiveDate> = store
            .find_by_group(group_id)
            .await
            .unwrap()
            .iter()
            .map(|s| s.date)
            .collect();
        assert_eq!(mine, vec![day(10), day(11)]);
        let theirs = store.find_by_group(blocker).await.unwrap();
        assert_eq!(theirs.len(), 1);
        assert_eq!(occupied_dates(&store).await, vec![day(10), day(11), day(14)]);
    }

    #[tokio::test]
    async fn relocate_with_unchanged_dates_rewrites_only_the_given_guest_fields() {
        let (service, store) = service();
        let group_id = service
            .create_booking(Some(day(3)), Some(day(5)), "Ada", "ada@example.com")
            .await
            .unwrap();

        service
            .relocate_booking(group_id, Some(day(3)), Some(day(5)), Some("Grace"), None)
            .await
            .unwrap();

        let slots = store.find_by_group(group_id).await.unwrap();
        let dates: Vec<NaiveDate> = slots.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![day(3), day(4)]);
        assert!(slots.iter().all(|s| s.guest_name == "Grace"));
        assert!(slots.iter().all(|s| s.guest_email == "ada@example.com"));
    }

    #[tokio::test]
    async fn cancel_removes_only_the_named_group() {
        let (service, store) = service();
        let doomed = service
            .create_booking(Some(day(3)), Some(day(5)), "Ada", "ada@example.com")
            .await
            .unwrap();
        let kept = service
            .create_booking(Some(day(6)), Some(day(8)), "Bob", "bob@example.com")
            .await
            .unwrap();

        service.cancel_booking(doomed).await.unwrap();

        assert!(store.find_by_group(doomed).await.unwrap().is_empty());
        assert_eq!(store.find_by_group(kept).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn cancel_of_an_unknown_group_is_not_found() {
        {
            let (service, _) = service();
            let result = service.cancel_booking(Uuid::new_v4()).await;
            assert!(matches!(result, Err(BookingError::NotFound)));
        }

        // A second cancel of a once-existing group reports the same thing.
        let (service, _) = service();
        let group_id = service
            .create_booking(Some(day(3)), Some(day(5)), "Ada", "ada@example.com")
            .await
            .unwrap();
        service.cancel_booking(group_id).await.unwrap();
        assert!(matches!(
            service.cancel_booking(group_id).await,
            Err(BookingError::NotFound)
        ));
    }

    #[tokio::test]
    async fn availability_requires_a_start_and_rejects_inverted_windows() {
        let (service, _) = service();

        assert!(matches!(
            service.availability(None, Some(day(10))).await,
            Err(BookingError::Validation(ValidationError::MissingArrival))
        ));
        assert!(matches!(
            service.availability(Some(day(10)), Some(day(5))).await,
            Err(BookingError::Validation(ValidationError::InvertedRange))
        ));
    }

    #[tokio::test]
    async fn availability_returns_the_window_ascending_with_inclusive_bounds() {
        let (service, _) = service();
        service
            .create_booking(Some(day(3)), Some(day(5)), "Ada", "ada@example.com")
            .await
            .unwrap();
        service
            .create_booking(Some(day(6)), Some(day(7)), "Bob", "bob@example.com")
            .await
            .unwrap();

        let nights = service.availability(Some(day(4)), Some(day(6))).await.unwrap();

        let dates: Vec<NaiveDate> = nights.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![day(4), day(6)]);
    }

    #[tokio::test]
    async fn availability_defaults_the_end_to_thirty_days_out() {
        let (service, store) = service();
        service
            .create_booking(Some(day(2)), Some(day(4)), "Ada", "ada@example.com")
            .await
            .unwrap();
        // Outside the defaulted window.
        store
            .put(NightSlot {
                date: day(40),
                group_id: Uuid::new_v4(),
                guest_name: "Bob".to_string(),
                guest_email: "bob@example.com".to_string(),
            })
            .await
            .unwrap();

        let nights = service.availability(Some(day(1)), None).await.unwrap();

        let dates: Vec<NaiveDate> = nights.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![day(2), day(3)]);
    }

    #[tokio::test]
    async fn find_booking_derives_the_group_view() {
        let (service, _) = service();
        let group_id = service
            .create_booking(Some(day(3)), Some(day(6)), "Ada", "ada@example.com")
            .await
            .unwrap();

        let booking = service.find_booking(group_id).await.unwrap();

        assert_eq!(booking.arrival, day(3));
        assert_eq!(booking.departure, day(6));
        assert_eq!(booking.nights, 3);
        assert_eq!(booking.guest_name, "Ada");

        assert!(matches!(
            service.find_booking(Uuid::new_v4()).await,
            Err(BookingError::NotFound)
        ));
    }
}
