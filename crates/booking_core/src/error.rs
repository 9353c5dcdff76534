/// Date-rule violations. Always caller-fixable; the service never retries
/// them on the caller's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// No arrival date was given.
    #[error("You must specify an arrival date.")]
    MissingArrival,

    /// No departure date was given.
    #[error("You must specify a departure date.")]
    MissingDeparture,

    /// The arrival date falls after the departure date.
    #[error("The arrival date is greater than the departure date.")]
    InvertedRange,

    /// The arrival is today or in the past.
    #[error("The campsite can be reserved minimum 1 day ahead of arrival.")]
    LeadTimeTooShort,

    /// The arrival is more than a month out.
    #[error("The campsite can be reserved up to 1 month in advance.")]
    LeadTimeTooLong,

    /// The stay covers more than three nights.
    #[error("The campsite can be reserved for max 3 days.")]
    StayTooLong,

    /// A relocation tried to change the number of nights.
    #[error("The new dates must keep the same number of nights as the reservation.")]
    DurationMismatch,
}

/// Failures surfaced by booking operations.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// A date rule was violated; only the first violated rule is reported.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A requested night is already owned by another group.
    #[error("The campsite is already reserved for that date range.")]
    Conflict,

    /// The booking group has no night slots.
    #[error("Reservation does not exist.")]
    NotFound,

    /// The slot store failed; not recoverable here. The detail is logged,
    /// never shown to callers.
    #[error("storage failure: {0}")]
    Internal(String),
}
