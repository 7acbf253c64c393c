use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::ai_client::AiClient;
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::validators::{is_valid_free_text, is_valid_text};

#[derive(Deserialize)]
pub struct AiRequest {
    pub mood: String,
    pub places_list: String,
}

/// POST /api/ai/recommend
pub async fn ai_recommend(
    user: AuthenticatedUser,
    body: web::Json<AiRequest>,
    ai: web::Data<AiClient>,
) -> Result<HttpResponse, AppError> {
    let mood = is_valid_text("mood", &body.mood)?;
    let places_list = is_valid_free_text("places_list", &body.places_list)?;

    let recommendation = ai.recommend(&mood, &places_list).await?;
    tracing::info!(user_id = %user.0.id, "AI recommendation served");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "recommendation": recommendation })))
}
