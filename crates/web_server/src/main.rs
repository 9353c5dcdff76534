//! Main entry point for the campsite booking server.
//! This crate wires the Postgres-backed slot store into the booking core and
//! exposes the reservation REST API.

use std::sync::Arc;

use actix_web::{App, HttpResponse, HttpServer, middleware::Logger, web};

use booking_core::BookingService;
use postgres::database::*;
use postgres::PgSlotStore;
use web_handlers::{booking_health, configure};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🚀 Starting campsite booking server...");

    // Create database connection pool
    let pool = match create_connection_pool().await {
        Ok(pool) => {
            log::info!("🗃️ Database pool created successfully");

            if let Err(e) = test_connection(&pool).await {
                log::error!("❌ Database connection test failed: {}", e);
            }
            pool
        }
        Err(e) => {
            log::error!("❌ Failed to create database pool: {}", e);
            log::error!("💡 Make sure PostgreSQL is running and DATABASE_URL is set");
            std::process::exit(1);
        }
    };

    // The booking service shares one slot store across all workers.
    let service = web::Data::new(BookingService::new(Arc::new(PgSlotStore::new(pool))));

    let bind_addr =
        std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    log::info!("🌐 Server will be available at: http://{}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(Logger::default())
            .configure(configure)
            .route("/api/health", web::get().to(booking_health))
            .route(
                "/health",
                web::get().to(|| async { HttpResponse::Ok().body("OK") }),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
