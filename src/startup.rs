use actix_cors::Cors;
use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::path::Path;
use std::sync::Arc;

use crate::ai_client::AiClient;
use crate::auth::{PasswordHasher, TokenService};
use crate::configuration::Settings;
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::places_client::PlacesClient;
use crate::routes::{
    ai_recommend, current_user, generate_itinerary, health_check, login, my_itineraries, register,
    save_itinerary, search_places,
};
use crate::store::{ItineraryStore, MemoryStore, PgStore, UserStore};

/// Everything the handlers share. Built once, read-only afterwards.
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub itineraries: Arc<dyn ItineraryStore>,
    pub tokens: TokenService,
    pub hasher: PasswordHasher,
    pub ai: AiClient,
    pub places: PlacesClient,
}

impl AppState {
    /// State over an already constructed store.
    ///
    /// # Errors
    /// Fails on invalid JWT or hashing settings, or if an HTTP client
    /// cannot be built.
    pub fn with_store<S>(settings: &Settings, store: Arc<S>) -> Result<Self, AppError>
    where
        S: UserStore + ItineraryStore + 'static,
    {
        let tokens = TokenService::new(&settings.jwt)
            .map_err(|e| AppError::Internal(format!("Invalid JWT configuration: {}", e)))?;

        let users: Arc<dyn UserStore> = store.clone();
        let itineraries: Arc<dyn ItineraryStore> = store;

        Ok(Self {
            users,
            itineraries,
            tokens,
            hasher: PasswordHasher::new(&settings.hashing)?,
            ai: AiClient::new(&settings.services.ai)?,
            places: PlacesClient::new(&settings.services.places)?,
        })
    }

    /// State backed by Postgres (migrated on connect) or by memory when
    /// `database.in_memory` is set.
    pub async fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        if settings.database.in_memory {
            tracing::warn!("Using in-memory store; data will not survive a restart");
            return Self::with_store(settings, Arc::new(MemoryStore::new()));
        }

        tracing::info!("Attempting to connect to database");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&settings.database.connection_string())
            .await?;

        let store = PgStore::new(pool);
        store.migrate().await?;
        tracing::info!("Database connected and migrated");

        Self::with_store(settings, Arc::new(store))
    }
}

pub fn run(
    listener: TcpListener,
    state: AppState,
    static_dir: Option<String>,
) -> Result<Server, std::io::Error> {
    let users = web::Data::from(state.users);
    let itineraries = web::Data::from(state.itineraries);
    let tokens = web::Data::new(state.tokens);
    let hasher = web::Data::new(state.hasher);
    let ai = web::Data::new(state.ai);
    let places = web::Data::new(state.places);

    let static_dir = static_dir.filter(|dir| {
        let exists = Path::new(dir).is_dir();
        if !exists {
            tracing::warn!(dir = %dir, "Static directory not found; frontend will not be served");
        }
        exists
    });

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let mut app = App::new()
            .wrap(cors)
            .wrap(LoggerMiddleware)
            // Body parse failures go through AppError like everything else
            .app_data(web::JsonConfig::default().error_handler(|err, _| {
                AppError::Validation(ValidationError::InvalidFormat(format!("body: {}", err))).into()
            }))
            .app_data(web::FormConfig::default().error_handler(|err, _| {
                AppError::Validation(ValidationError::InvalidFormat(format!("form: {}", err))).into()
            }))
            // Shared state
            .app_data(users.clone())
            .app_data(itineraries.clone())
            .app_data(tokens.clone())
            .app_data(hasher.clone())
            .app_data(ai.clone())
            .app_data(places.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(health_check))
                    .route("/auth/register", web::post().to(register))
                    .route("/auth/login", web::post().to(login))
                    // Protected routes take an `AuthenticatedUser`
                    .route("/auth/me", web::get().to(current_user))
                    .route("/ai/recommend", web::post().to(ai_recommend))
                    .route("/places/search", web::post().to(search_places))
                    .route("/itinerary", web::post().to(generate_itinerary))
                    .route("/itinerary/save", web::post().to(save_itinerary))
                    .route("/itinerary/my", web::get().to(my_itineraries)),
            );

        // Static file serving (must be last to not override API routes)
        if let Some(dir) = &static_dir {
            app = app.service(fs::Files::new("/", dir).index_file("index.html"));
        }

        app
    })
    .listen(listener)?
    .run();

    Ok(server)
}
