use config::ConfigError;
use jsonwebtoken::Algorithm;
use std::str::FromStr;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub hashing: HashingSettings,
    #[serde(default)]
    pub services: ServiceSettings,
}

impl Settings {
    /// Reject settings the server cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate()?;
        self.hashing.validate()
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory with the web frontend, served at `/` when present
    #[serde(default)]
    pub static_dir: Option<String>,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(serde::Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    /// Keep users and itineraries in process memory instead of Postgres
    pub in_memory: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            username: "postgres".to_string(),
            password: "password".to_string(),
            port: 5432,
            host: "localhost".to_string(),
            database_name: "dishanveshi".to_string(),
            in_memory: false,
        }
    }
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// JWT signing settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default = "default_token_minutes")]
    pub access_token_expire_minutes: i64,
}

impl JwtSettings {
    /// Parse the configured algorithm. Only HMAC algorithms work with a shared secret.
    pub fn algorithm(&self) -> Result<Algorithm, ConfigError> {
        let algorithm = Algorithm::from_str(&self.algorithm).map_err(|_| {
            ConfigError::Message(format!("unknown JWT algorithm: {}", self.algorithm))
        })?;

        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
            other => Err(ConfigError::Message(format!(
                "JWT algorithm {:?} needs a key pair; use HS256, HS384 or HS512",
                other
            ))),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.trim().is_empty() {
            return Err(ConfigError::Message("jwt.secret must be set".to_string()));
        }
        if !(1..=MAX_TOKEN_MINUTES).contains(&self.access_token_expire_minutes) {
            return Err(ConfigError::Message(format!(
                "jwt.access_token_expire_minutes must be between 1 and {}",
                MAX_TOKEN_MINUTES
            )));
        }
        self.algorithm().map(|_| ())
    }
}

/// One year
pub const MAX_TOKEN_MINUTES: i64 = 365 * 24 * 60;

const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

/// bcrypt work factor
#[derive(serde::Deserialize, Clone)]
pub struct HashingSettings {
    #[serde(default = "default_cost")]
    pub cost: u32,
}

impl Default for HashingSettings {
    fn default() -> Self {
        Self { cost: default_cost() }
    }
}

impl HashingSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.cost) {
            return Err(ConfigError::Message(format!(
                "hashing.cost must be between {} and {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }
        Ok(())
    }
}

#[derive(serde::Deserialize, Clone, Default)]
pub struct ServiceSettings {
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub places: PlacesSettings,
}

/// OpenAI-compatible chat completion endpoint
#[derive(serde::Deserialize, Clone)]
#[serde(default)]
pub struct AiSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Google Places web service
#[derive(serde::Deserialize, Clone)]
#[serde(default)]
pub struct PlacesSettings {
    pub base_url: String,
    pub api_key: String,
    pub radius_meters: u32,
    pub timeout_seconds: u64,
}

impl Default for PlacesSettings {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com/maps/api/place".to_string(),
            api_key: String::new(),
            radius_meters: 5000,
            timeout_seconds: 10,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_token_minutes() -> i64 {
    30
}

fn default_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

/// Read `configuration.*` from the working directory, then `APP_*` environment
/// variables (`APP_JWT__SECRET`, `APP_APPLICATION__PORT`, ...).
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
