use actix_web::HttpResponse;

pub const APP_NAME: &str = "Dishanveshi – Travel Intelligence API";

pub async fn health_check() -> HttpResponse {
    tracing::debug!("Health check endpoint called");
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "app": APP_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
