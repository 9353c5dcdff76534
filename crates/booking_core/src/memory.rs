use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{SlotStore, SlotStoreError};
use crate::types::NightSlot;

/// In-memory [`SlotStore`] keyed by date.
///
/// Backs the unit tests and lets the server run without a database. The
/// ordered map gives range and group scans the same ascending order the
/// Postgres store produces.
pub struct MemorySlotStore {
    slots: RwLock<BTreeMap<NaiveDate, NightSlot>>,
}

impl MemorySlotStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(BTreeMap::new()),
        }
    }
}

#[async_trait]
impl SlotStore for MemorySlotStore {
    async fn put(&self, slot: NightSlot) -> Result<(), SlotStoreError> {
        let mut slots = self.slots.write().await;
        match slots.entry(slot.date) {
            Entry::Occupied(_) => Err(SlotStoreError::AlreadyOccupied(slot.date)),
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
                Ok(())
            }
        }
    }

    async fn delete(&self, date: NaiveDate) -> Result<(), SlotStoreError> {
        let mut slots = self.slots.write().await;
        slots
            .remove(&date)
            .map(|_| ())
            .ok_or(SlotStoreError::NotFound(date))
    }

    async fn find_by_group(&self, group_id: Uuid) -> Result<Vec<NightSlot>, SlotStoreError> {
        let slots = self.slots.read().await;
        Ok(slots
            .values()
            .filter(|slot| slot.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn find_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NightSlot>, SlotStoreError> {
        let slots = self.slots.read().await;
        Ok(slots.range(from..=to).map(|(_, slot)| slot.clone()).collect())
    }
}
