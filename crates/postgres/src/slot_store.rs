use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use booking_core::store::{SlotStore, SlotStoreError};
use booking_core::types::NightSlot;

/// Durable [`SlotStore`] on PostgreSQL.
///
/// Expects the following table; the primary key on `date` is what turns a
/// plain insert into the conditional write the booking core relies on:
///
/// ```sql
/// CREATE TABLE night_slots (
///     date        DATE PRIMARY KEY,
///     group_id    UUID NOT NULL,
///     guest_name  TEXT NOT NULL,
///     guest_email TEXT NOT NULL,
///     created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE INDEX night_slots_group_idx ON night_slots (group_id);
/// ```
pub struct PgSlotStore {
    pool: PgPool,
}

impl PgSlotStore {
    /// Creates a new instance of `PgSlotStore` with the provided database
    /// connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(err: sqlx::Error) -> SlotStoreError {
    SlotStoreError::Backend(err.to_string())
}

fn slot_from_row(row: &sqlx::postgres::PgRow) -> NightSlot {
    NightSlot {
        date: row.get("date"),
        group_id: row.get("group_id"),
        guest_name: row.get("guest_name"),
        guest_email: row.get("guest_email"),
    }
}

#[async_trait]
impl SlotStore for PgSlotStore {
    async fn put(&self, slot: NightSlot) -> Result<(), SlotStoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO night_slots (date, group_id, guest_name, guest_email)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (date) DO NOTHING
            "#,
        )
        .bind(slot.date)
        .bind(slot.group_id)
        .bind(&slot.guest_name)
        .bind(&slot.guest_email)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(SlotStoreError::AlreadyOccupied(slot.date));
        }

        Ok(())
    }

    async fn delete(&self, date: NaiveDate) -> Result<(), SlotStoreError> {
        let result = sqlx::query("DELETE FROM night_slots WHERE date = $1")
            .bind(date)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(SlotStoreError::NotFound(date));
        }

        Ok(())
    }

    async fn find_by_group(&self, group_id: Uuid) -> Result<Vec<NightSlot>, SlotStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT date, group_id, guest_name, guest_email
            FROM night_slots
            WHERE group_id = $1
            ORDER BY date
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.iter().map(slot_from_row).collect())
    }

    async fn find_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NightSlot>, SlotStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT date, group_id, guest_name, guest_email
            FROM night_slots
            WHERE date BETWEEN $1 AND $2
            ORDER BY date
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.iter().map(slot_from_row).collect())
    }
}
