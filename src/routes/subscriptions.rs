use actix_web::{web, HttpResponse};

use crate::domain::Course;
use crate::routes::errors::{parse_email, ApiError};
use crate::subscription_service::SubscriptionService;

/// Subscribe/unsubscribe request body
#[derive(serde::Deserialize)]
pub struct SubscriptionRequest {
    email: String,
    course: Course,
}

/// Unsubscribe-all request body
#[derive(serde::Deserialize)]
pub struct UserRequest {
    email: String,
}

/// Unsubscribe-all response body
#[derive(serde::Serialize)]
struct UnsubscribeAllResponse {
    removed: usize,
}

/// Subscribe handler
#[tracing::instrument(
    name = "Adding a new subscription",
    skip(request, service),
    fields(
        user_email = %request.email,
        crn = %request.course.crn
    )
)]
pub async fn subscribe(
    request: web::Json<SubscriptionRequest>,
    service: web::Data<SubscriptionService>,
) -> Result<HttpResponse, ApiError> {
    let SubscriptionRequest { email, course } = request.into_inner();
    let email = parse_email(email)?;

    let course = service.subscribe_course(&email, course).await?;
    Ok(HttpResponse::Ok().json(course))
}

/// Unsubscribe handler
#[tracing::instrument(
    name = "Removing a subscription",
    skip(request, service),
    fields(
        user_email = %request.email,
        crn = %request.course.crn
    )
)]
pub async fn unsubscribe(
    request: web::Json<SubscriptionRequest>,
    service: web::Data<SubscriptionService>,
) -> Result<HttpResponse, ApiError> {
    let SubscriptionRequest { email, course } = request.into_inner();
    let email = parse_email(email)?;

    let course = service.unsubscribe_course(&email, course).await?;
    Ok(HttpResponse::Ok().json(course))
}

/// Unsubscribe-all handler
#[tracing::instrument(
    name = "Removing all subscriptions",
    skip(request, service),
    fields(user_email = %request.email)
)]
pub async fn unsubscribe_all(
    request: web::Json<UserRequest>,
    service: web::Data<SubscriptionService>,
) -> Result<HttpResponse, ApiError> {
    let email = parse_email(request.into_inner().email)?;

    let removed = service.unsubscribe_all_courses(&email).await?;
    Ok(HttpResponse::Ok().json(UnsubscribeAllResponse { removed }))
}
