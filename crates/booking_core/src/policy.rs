use chrono::{Days, NaiveDate};

use crate::error::ValidationError;

/// Arrival must be at least this many days out.
pub const MIN_LEAD_DAYS: i64 = 1;
/// Arrival may be at most this many days out.
pub const MAX_LEAD_DAYS: i64 = 30;
/// Longest allowed stay, in nights.
pub const MAX_STAY_NIGHTS: i64 = 3;
/// Window applied to availability queries with no explicit end date.
pub const DEFAULT_WINDOW_DAYS: u64 = 30;

/// Checks a candidate stay against the reservation rules.
///
/// Rules run in a fixed order and the first violation is returned; no
/// aggregation. Pure, no I/O.
pub fn validate_stay(
    arrival: Option<NaiveDate>,
    departure: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let arrival = arrival.ok_or(ValidationError::MissingArrival)?;
    let departure = departure.ok_or(ValidationError::MissingDeparture)?;
    if arrival > departure {
        return Err(ValidationError::InvertedRange);
    }

    let lead = (arrival - today).num_days();
    if lead < MIN_LEAD_DAYS {
        return Err(ValidationError::LeadTimeTooShort);
    }
    if lead > MAX_LEAD_DAYS {
        return Err(ValidationError::LeadTimeTooLong);
    }

    if (departure - arrival).num_days() > MAX_STAY_NIGHTS {
        return Err(ValidationError::StayTooLong);
    }

    Ok((arrival, departure))
}

/// Normalizes an availability window: the start is required and a missing
/// end defaults to [`DEFAULT_WINDOW_DAYS`] past the start.
pub fn validate_window(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let from = from.ok_or(ValidationError::MissingArrival)?;
    match to {
        Some(to) if from > to => Err(ValidationError::InvertedRange),
        Some(to) => Ok((from, to)),
        None => Ok((from, from + Days::new(DEFAULT_WINDOW_DAYS))),
    }
}
