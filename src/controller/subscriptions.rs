use actix_web::{get, post, web, Either, HttpResponse, Responder};

use serde::{Deserialize, Serialize};

use crate::crypto::SubscriptionToken;
use crate::error::{RestError, RestResult};
use crate::model::{NewSubscription, Subscription};
use crate::service::SubscriptionService;

/// Form/JSON deserialization wrapper for parsing new subscriptions
#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    email: Option<String>,
    city: Option<String>,
    frequency: Option<String>,
}

impl TryFrom<SubscribeForm> for NewSubscription {
    type Error = RestError;

    fn try_from(form: SubscribeForm) -> RestResult<Self> {
        let email = required(form.email, "email")?
            .parse()
            .map_err(RestError::ParseError)?;
        let city = required(form.city, "city")?
            .parse()
            .map_err(RestError::ParseError)?;
        let frequency = required(form.frequency, "frequency")?
            .parse()
            .map_err(RestError::ParseError)?;

        Ok(NewSubscription {
            email,
            city,
            frequency,
        })
    }
}

fn required(value: Option<String>, field: &str) -> RestResult<String> {
    value.ok_or_else(|| RestError::ParseError(format!("Missing field {:?}", field)))
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct SubscribeResponse {
    message: &'static str,
    subscription: Subscription,
}

fn parse_token(token: &str) -> RestResult<SubscriptionToken> {
    token
        .parse()
        .map_err(|_| RestError::ParseError("Invalid token".into()))
}

/// Create an unconfirmed subscription and send its confirmation email
#[tracing::instrument(name = "Create a new subscription", skip(service, form))]
#[post("/subscribe")]
async fn subscribe(
    service: web::Data<SubscriptionService>,
    form: Either<web::Form<SubscribeForm>, web::Json<SubscribeForm>>,
) -> RestResult<impl Responder> {
    let form = match form {
        Either::Left(form) => form.into_inner(),
        Either::Right(json) => json.into_inner(),
    };
    let new_subscription: NewSubscription = form.try_into()?;

    let subscription = service.subscribe(new_subscription).await?;

    Ok(HttpResponse::Ok().json(SubscribeResponse {
        message: "Subscription successful. Confirmation email sent.",
        subscription,
    }))
}

/// Subscription confirmation endpoint
#[tracing::instrument(name = "Confirm a subscription by token", skip(service))]
#[get("/confirm/{token}")]
async fn confirm(
    service: web::Data<SubscriptionService>,
    path: web::Path<(String,)>,
) -> RestResult<impl Responder> {
    let (token,) = path.into_inner();
    let token = parse_token(&token)?;

    service.confirm_subscription(token.as_ref()).await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Subscription confirmed successfully",
    }))
}

/// Unsubscribe endpoint, deletes the subscription owning the token
#[tracing::instrument(name = "Unsubscribe by token", skip(service))]
#[get("/unsubscribe/{token}")]
async fn unsubscribe(
    service: web::Data<SubscriptionService>,
    path: web::Path<(String,)>,
) -> RestResult<impl Responder> {
    let (token,) = path.into_inner();
    let token = parse_token(&token)?;

    service.unsubscribe(token.as_ref()).await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Unsubscribed successfully",
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(subscribe)
        .service(confirm)
        .service(unsubscribe);
}
