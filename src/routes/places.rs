use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::places_client::{keyword_for, PlacesClient};
use crate::validators::is_valid_coordinates;

#[derive(Deserialize)]
pub struct LocationSearch {
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// POST /api/places/search
pub async fn search_places(
    user: AuthenticatedUser,
    body: web::Json<LocationSearch>,
    places: web::Data<PlacesClient>,
) -> Result<HttpResponse, AppError> {
    let (lat, lng) = is_valid_coordinates(body.lat, body.lng)?;
    let keyword = keyword_for(&body.kind);

    let results = places.search(lat, lng, keyword).await?;
    tracing::info!(
        user_id = %user.0.id,
        keyword = keyword,
        count = results.len(),
        "Places search served"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({ "results": results })))
}
