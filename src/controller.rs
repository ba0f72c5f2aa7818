use actix_web::dev::HttpServiceFactory;
use actix_web::web;

/// Subscription lifecycle endpoints
pub mod subscriptions;
/// Current weather endpoint
pub mod weather;

/// All REST endpoints, mounted under `/api`
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/api")
        .configure(subscriptions::configure)
        .configure(weather::configure)
}
