mod ai;
mod auth;
mod health_check;
mod itinerary;
mod places;

pub use ai::ai_recommend;
pub use auth::{current_user, login, register};
pub use health_check::health_check;
pub use itinerary::{generate_itinerary, my_itineraries, save_itinerary};
pub use places::search_places;
