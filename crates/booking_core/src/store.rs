use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::types::NightSlot;

/// Failures surfaced by a slot store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotStoreError {
    /// A slot already exists for the date, regardless of owner.
    #[error("date {0} is already occupied")]
    AlreadyOccupied(NaiveDate),

    /// No slot exists for the date.
    #[error("no slot exists for date {0}")]
    NotFound(NaiveDate),

    /// The storage backend failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Durable mapping from calendar date to the night slot occupying it.
///
/// `put` is the single point of synchronization in the system: it must
/// atomically refuse to overwrite an occupied date. Every multi-slot
/// operation in the service layer is compensation built on that guarantee;
/// the store is never asked to mutate more than one date at a time.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Conditionally creates a slot. Fails with
    /// [`SlotStoreError::AlreadyOccupied`] iff a slot already exists for the
    /// date, no matter which group owns it.
    async fn put(&self, slot: NightSlot) -> Result<(), SlotStoreError>;

    /// Removes the slot for a date. Fails with [`SlotStoreError::NotFound`]
    /// iff no slot exists for the date.
    async fn delete(&self, date: NaiveDate) -> Result<(), SlotStoreError>;

    /// All slots owned by a group, ascending by date. Empty when the group
    /// has none.
    async fn find_by_group(&self, group_id: Uuid) -> Result<Vec<NightSlot>, SlotStoreError>;

    /// All slots with a date in `[from, to]`, both bounds inclusive,
    /// ascending by date.
    async fn find_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NightSlot>, SlotStoreError>;
}
