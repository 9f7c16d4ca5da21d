use actix_web::{web, HttpResponse};

use crate::routes::errors::{parse_email, ApiError};
use crate::subscription_service::{SubscriptionError, SubscriptionService};

/// Web query parameters
#[derive(serde::Deserialize)]
pub struct Parameters {
    email: String,
}

/// List the subscriptions of a user
#[tracing::instrument(name = "Listing subscriptions", skip(parameters, service))]
pub async fn list_subscriptions(
    parameters: web::Query<Parameters>,
    service: web::Data<SubscriptionService>,
) -> Result<HttpResponse, ApiError> {
    let email = parse_email(parameters.into_inner().email)?;

    let subscriptions = service.get_user_subscriptions(&email).await?;
    Ok(HttpResponse::Ok().json(subscriptions))
}

/// List the CRNs a user is subscribed to
#[tracing::instrument(name = "Listing subscribed CRNs", skip(parameters, service))]
pub async fn list_subscribed_crns(
    parameters: web::Query<Parameters>,
    service: web::Data<SubscriptionService>,
) -> Result<HttpResponse, ApiError> {
    let email = parse_email(parameters.into_inner().email)?;

    let crns = service.get_user_subscribed_crns(&email).await?;
    Ok(HttpResponse::Ok().json(crns))
}

/// List the course records a user is subscribed to
#[tracing::instrument(name = "Listing subscribed courses", skip(parameters, service))]
pub async fn list_subscribed_courses(
    parameters: web::Query<Parameters>,
    service: web::Data<SubscriptionService>,
) -> Result<HttpResponse, ApiError> {
    let email = parse_email(parameters.into_inner().email)?;

    let courses = service
        .get_user_subscribed_courses(&email)
        .await?
        .ok_or(SubscriptionError::UnknownUser)?;
    Ok(HttpResponse::Ok().json(courses))
}
