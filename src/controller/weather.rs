use actix_web::{get, web, HttpResponse, Responder};

use serde::Deserialize;

use crate::domain::CityName;
use crate::error::{RestError, RestResult};
use crate::service::WeatherService;

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    city: Option<String>,
}

/// Current weather for a city, straight from the provider
#[tracing::instrument(name = "Get current weather", skip(service))]
#[get("/weather")]
async fn get_weather(
    service: web::Data<WeatherService>,
    query: web::Query<WeatherQuery>,
) -> RestResult<impl Responder> {
    let city: CityName = query
        .into_inner()
        .city
        .ok_or_else(|| RestError::ParseError("City is required".into()))?
        .parse()
        .map_err(RestError::ParseError)?;

    let weather = service.get_weather(city.as_ref()).await?;

    Ok(HttpResponse::Ok().json(weather))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_weather);
}
