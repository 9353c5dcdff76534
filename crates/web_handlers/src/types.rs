use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use booking_core::{BookingError, NightSlot};

/// Request structure for reserving the campsite.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    /// Guest name for the reservation
    #[validate(length(min = 1, message = "Guest name is required"))]
    pub guest_name: String,

    /// Guest contact email
    #[validate(email(message = "Guest email must be a valid email address"))]
    pub guest_email: String,

    /// First night of the stay; absence is reported by the booking core
    pub arrival: Option<NaiveDate>,

    /// Day after the last night of the stay
    pub departure: Option<NaiveDate>,
}

/// Request structure for moving an existing reservation to new dates.
#[derive(Debug, Deserialize, Validate)]
pub struct RelocateBookingRequest {
    /// New first night of the stay
    pub arrival: Option<NaiveDate>,

    /// New day after the last night of the stay
    pub departure: Option<NaiveDate>,

    /// Replacement guest name; the stored name is kept when absent
    #[validate(length(min = 1, message = "Guest name must not be empty"))]
    pub guest_name: Option<String>,

    /// Replacement guest email; the stored email is kept when absent
    #[validate(email(message = "Guest email must be a valid email address"))]
    pub guest_email: Option<String>,
}

/// Query parameters for the availability window.
#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    /// Start of the window
    pub arrival: Option<NaiveDate>,
    /// End of the window; defaults to thirty days past the start
    pub departure: Option<NaiveDate>,
}

/// Response structure for a newly created reservation.
#[derive(Debug, Serialize)]
pub struct CreateBookingResponse {
    /// Identifier of the booking group
    pub id: Uuid,
}

/// Response structure for an availability query.
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    /// Occupied nights inside the window, ascending by date
    pub nights: Vec<NightSlot>,
    /// Total count of occupied nights
    pub total: usize,
}

/// Transport-facing error: either a malformed request or a booking failure
/// surfaced by the core.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body failed field validation.
    #[error("{0}")]
    BadRequest(String),

    /// The booking core rejected the operation.
    #[error(transparent)]
    Booking(#[from] BookingError),
}

impl actix_web::ResponseError for ApiError {
    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        match self {
            ApiError::BadRequest(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "validation_error",
                "message": msg
            })),
            ApiError::Booking(BookingError::Validation(err)) => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "validation_error",
                    "message": err.to_string()
                }))
            }
            ApiError::Booking(err @ BookingError::Conflict) => {
                HttpResponse::Conflict().json(serde_json::json!({
                    "error": "date_conflict",
                    "message": err.to_string()
                }))
            }
            ApiError::Booking(err @ BookingError::NotFound) => {
                HttpResponse::NotFound().json(serde_json::json!({
                    "error": "reservation_not_found",
                    "message": err.to_string()
                }))
            }
            ApiError::Booking(BookingError::Internal(_)) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "internal_error",
                    "message": "An internal error occurred"
                }))
            }
        }
    }
}
