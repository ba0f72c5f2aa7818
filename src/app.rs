use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::{get, HttpResponse, Responder};
use actix_web::{web, App, HttpServer};

use tracing_actix_web::TracingLogger;

use crate::controller;
use crate::service::{SubscriptionService, WeatherService};

/// Simple health-check endpoint
#[tracing::instrument(name = "Health check")]
#[get("/health_check")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().finish()
}

/// Run the application on a specified TCP listener
pub fn run(
    listener: TcpListener,
    subscriptions: SubscriptionService,
    weather: WeatherService,
) -> anyhow::Result<Server> {
    // Wrap application data
    let subscriptions = web::Data::new(subscriptions);
    let weather = web::Data::new(weather);

    // Start the server
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(subscriptions.clone())
            .app_data(weather.clone())
            .service(health_check)
            .service(controller::scope())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
