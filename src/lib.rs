pub mod configuration;
pub mod course_data;
pub mod domain;
pub mod email_client;
pub mod notifications;
pub mod routes;
pub mod startup;
pub mod store;
pub mod subscription_service;
pub mod telemetry;
mod utils;
