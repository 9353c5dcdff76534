use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single occupied night. The calendar date is the unique key across the
/// whole campsite; a slot belongs to exactly one booking group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightSlot {
    /// Calendar date of the night.
    pub date: NaiveDate,
    /// Booking group that owns the night.
    pub group_id: Uuid,
    /// Guest name carried on the reservation.
    pub guest_name: String,
    /// Guest contact email carried on the reservation.
    pub guest_email: String,
}

/// Derived view of a booking group. Never stored; computed on demand from
/// the group's night slots.
#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    /// Identifier shared by the group's night slots.
    pub group_id: Uuid,
    /// Earliest night of the stay.
    pub arrival: NaiveDate,
    /// One day past the latest night of the stay.
    pub departure: NaiveDate,
    /// Number of nights in the stay.
    pub nights: i64,
    /// Guest name carried on the reservation.
    pub guest_name: String,
    /// Guest contact email carried on the reservation.
    pub guest_email: String,
}

impl Booking {
    /// Builds the derived view from a group's slots. Returns `None` for an
    /// empty set; a group with zero slots does not exist.
    pub fn from_slots(slots: &[NightSlot]) -> Option<Self> {
        let first = slots.first()?;
        let arrival = slots.iter().map(|s| s.date).min()?;
        let latest = slots.iter().map(|s| s.date).max()?;
        Some(Self {
            group_id: first.group_id,
            arrival,
            departure: latest.succ_opt()?,
            nights: slots.len() as i64,
            guest_name: first.guest_name.clone(),
            guest_email: first.guest_email.clone(),
        })
    }
}
