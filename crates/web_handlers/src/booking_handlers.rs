use actix_web::{HttpResponse, web};
use uuid::Uuid;
use validator::Validate;

use booking_core::BookingService;

use crate::types::*;

/// Wires the reservation routes into an actix application.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api").service(
            web::scope("/reservations")
                .route("", web::post().to(create_booking))
                .route("", web::get().to(get_availability))
                .route("/{id}", web::get().to(get_booking))
                .route("/{id}", web::patch().to(relocate_booking))
                .route("/{id}", web::delete().to(cancel_booking)),
        ),
    );
}

/// Reserves the campsite for the requested nights and returns the new
/// booking group id with a 201 Created response.
pub async fn create_booking(
    service: web::Data<BookingService>,
    request: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse, ApiError> {
    // Validate the request
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let id = service
        .create_booking(
            request.arrival,
            request.departure,
            &request.guest_name,
            &request.guest_email,
        )
        .await?;

    log::info!("📅 Created reservation {}", id);
    Ok(HttpResponse::Created().json(CreateBookingResponse { id }))
}

/// Returns the occupied nights inside the requested window, ascending by
/// date. A missing end defaults to thirty days past the start.
pub async fn get_availability(
    service: web::Data<BookingService>,
    params: web::Query<AvailabilityParams>,
) -> Result<HttpResponse, ApiError> {
    let nights = service
        .availability(params.arrival, params.departure)
        .await?;

    let total = nights.len();
    Ok(HttpResponse::Ok().json(AvailabilityResponse { nights, total }))
}

/// Returns the derived view of a single reservation.
pub async fn get_booking(
    service: web::Data<BookingService>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let booking = service.find_booking(*id).await?;
    Ok(HttpResponse::Ok().json(booking))
}

/// Moves a reservation to new dates of equal length, optionally rewriting
/// the guest fields.
pub async fn relocate_booking(
    service: web::Data<BookingService>,
    id: web::Path<Uuid>,
    request: web::Json<RelocateBookingRequest>,
) -> Result<HttpResponse, ApiError> {
    // Validate the request
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let id = service
        .relocate_booking(
            *id,
            request.arrival,
            request.departure,
            request.guest_name.as_deref(),
            request.guest_email.as_deref(),
        )
        .await?;

    log::info!("📅 Relocated reservation {}", id);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": id })))
}

/// Cancels a reservation, freeing every night it held.
pub async fn cancel_booking(
    service: web::Data<BookingService>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    service.cancel_booking(*id).await?;

    log::info!("🗑️ Cancelled reservation {}", id);
    Ok(HttpResponse::NoContent().finish())
}

/// Health check endpoint for the booking service.
pub async fn booking_health() -> actix_web::Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "service": "booking",
        "status": "healthy",
        "timestamp": chrono::Utc::now()
    })))
}
