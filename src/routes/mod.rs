use actix_web::HttpResponse;

mod errors;
mod subscriptions;
mod user_subscriptions;

pub use errors::*;
pub use subscriptions::*;
pub use user_subscriptions::*;

/// Health check handler
pub async fn healthcheck() -> HttpResponse {
    HttpResponse::Ok().finish()
}
