/// Itinerary Routes
///
/// Generate a plan with the AI service, save it, list saved plans.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::ai_client::{AiClient, DayPlan, ItineraryPrompt};
use crate::auth::AuthenticatedUser;
use crate::error::{AppError, ValidationError};
use crate::store::{ItineraryStore, NewItinerary};
use crate::validators::{is_valid_days, is_valid_text};

#[derive(Deserialize)]
pub struct ItineraryRequest {
    pub destination: String,
    #[serde(default = "default_days")]
    pub days: i32,
    #[serde(default = "default_travel_type")]
    pub travel_type: String,
    #[serde(default = "default_budget")]
    pub budget: String,
    #[serde(default = "default_mood")]
    pub mood: String,
    #[serde(default = "default_include_pois")]
    pub include_pois: bool,
}

fn default_days() -> i32 {
    3
}

fn default_travel_type() -> String {
    "general".to_string()
}

fn default_budget() -> String {
    "medium".to_string()
}

fn default_mood() -> String {
    "relaxed".to_string()
}

fn default_include_pois() -> bool {
    true
}

#[derive(Serialize)]
pub struct ItineraryResponse {
    pub destination: String,
    pub plan: Vec<DayPlan>,
}

#[derive(Deserialize)]
pub struct ItinerarySaveRequest {
    pub destination: String,
    pub days: i32,
    pub plan: Vec<DayPlan>,
}

/// POST /api/itinerary
pub async fn generate_itinerary(
    user: AuthenticatedUser,
    body: web::Json<ItineraryRequest>,
    ai: web::Data<AiClient>,
) -> Result<HttpResponse, AppError> {
    let prompt = ItineraryPrompt {
        destination: is_valid_text("destination", &body.destination)?,
        days: is_valid_days(body.days)?,
        travel_type: is_valid_text("travel_type", &body.travel_type)?,
        budget: is_valid_text("budget", &body.budget)?,
        mood: is_valid_text("mood", &body.mood)?,
        include_pois: body.include_pois,
    };

    let plan = ai.generate_itinerary(&prompt).await?;
    tracing::info!(
        user_id = %user.0.id,
        days = plan.len(),
        "Itinerary generated"
    );

    Ok(HttpResponse::Ok().json(ItineraryResponse {
        destination: prompt.destination,
        plan,
    }))
}

/// POST /api/itinerary/save
pub async fn save_itinerary(
    user: AuthenticatedUser,
    body: web::Json<ItinerarySaveRequest>,
    itineraries: web::Data<dyn ItineraryStore>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let destination = is_valid_text("destination", &body.destination)?;
    let days = is_valid_days(body.days)?;
    if body.plan.is_empty() {
        return Err(ValidationError::EmptyField("plan".to_string()).into());
    }

    let plan = serde_json::to_value(&body.plan)
        .map_err(|e| AppError::Internal(format!("Plan serialization failed: {}", e)))?;

    let saved = itineraries
        .save_itinerary(NewItinerary {
            user_id: user.0.id,
            destination,
            days,
            plan,
        })
        .await?;

    tracing::info!(user_id = %user.0.id, itinerary_id = %saved.id, "Itinerary saved");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Itinerary saved",
        "id": saved.id,
    })))
}

/// GET /api/itinerary/my
pub async fn my_itineraries(
    user: AuthenticatedUser,
    itineraries: web::Data<dyn ItineraryStore>,
) -> Result<HttpResponse, AppError> {
    let saved = itineraries.list_itineraries(user.0.id).await?;
    Ok(HttpResponse::Ok().json(saved))
}
