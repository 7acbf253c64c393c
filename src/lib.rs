pub mod ai_client;
pub mod auth;
pub mod configuration;
pub mod error;
pub mod logger;
pub mod places_client;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod validators;
