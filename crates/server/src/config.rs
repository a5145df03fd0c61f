//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GOOGLE_SPREADSHEET_ID` - Spreadsheet holding the booking ledger
//! - `GOOGLE_SERVICE_ACCOUNT_JSON` or `GOOGLE_APPLICATION_CREDENTIALS` -
//!   Service account key, inline JSON or a path to the key file
//!
//! ## Optional
//! - `SALON_HOST` - Bind address (default: 127.0.0.1)
//! - `SALON_PORT` - Listen port (default: 3000)
//! - `SALON_TIMEZONE` - Business timezone, IANA name (default: UTC)
//! - `GOOGLE_SHEET_NAME` - Tab used when daily tabs are off (default: Sheet1)
//! - `USE_DAILY_SHEETS` - One tab per calendar day (default: true)
//! - `BOOKING_ALWAYS_OPEN` - Skip the window check, for testing (default: false)
//! - `BOOKING_CAPACITY` - Bookings accepted per day (default: 20)
//! - `BOOKING_REQUIRE_TIME` - Whether `time` is a required field (default: true)
//! - `GOOGLE_FORM_EMBED_URL` - Hand submissions to an embedded Google Form
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM` -
//!   Confirmation email transport; emails are disabled when `SMTP_HOST` is unset
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};

use chrono_tz::Tz;
use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Application configuration, built once at startup and passed by
/// reference from then on. Business logic never reads the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Google Sheets ledger configuration
    pub sheets: SheetsConfig,
    /// Booking-window and capacity policy
    pub booking: BookingConfig,
    /// SMTP transport for confirmation emails, if configured
    pub email: Option<EmailConfig>,
    /// When set, the frontend embeds this Google Form and `/api/book`
    /// turns submissions away
    pub google_form_embed_url: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Google Sheets backing-store configuration.
///
/// Implements `Debug` manually to redact the service account key.
#[derive(Clone)]
pub struct SheetsConfig {
    /// Spreadsheet ID from the sheet URL
    pub spreadsheet_id: String,
    /// Tab name used when daily tabs are disabled
    pub sheet_name: String,
    /// Service account key JSON (contains the private key)
    pub service_account_json: SecretString,
    /// One tab per calendar day (tab name = YYYY-MM-DD)
    pub use_daily_tabs: bool,
}

impl std::fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("sheet_name", &self.sheet_name)
            .field("service_account_json", &"[REDACTED]")
            .field("use_daily_tabs", &self.use_daily_tabs)
            .finish()
    }
}

/// Booking admission policy.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Maximum bookings accepted per day
    pub capacity: u32,
    /// Keep the window open regardless of the clock (testing)
    pub always_open: bool,
    /// Business timezone; day keys and the window are computed here,
    /// never in the host's local timezone
    pub timezone: Tz,
    /// Whether the `time` field is required on submissions
    pub require_time: bool,
}

/// SMTP configuration for confirmation emails.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("SALON_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SALON_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SALON_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SALON_PORT".to_string(), e.to_string()))?;

        Ok(Self {
            host,
            port,
            sheets: SheetsConfig::from_env()?,
            booking: BookingConfig::from_env()?,
            email: EmailConfig::from_env()?,
            google_form_embed_url: get_optional_env("GOOGLE_FORM_EMBED_URL"),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SheetsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            spreadsheet_id: get_required_env("GOOGLE_SPREADSHEET_ID")?,
            sheet_name: get_env_or_default("GOOGLE_SHEET_NAME", "Sheet1"),
            service_account_json: get_service_account_json()?,
            use_daily_tabs: get_bool_env("USE_DAILY_SHEETS", true),
        })
    }
}

impl BookingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let capacity = get_env_or_default("BOOKING_CAPACITY", "20")
            .parse::<u32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BOOKING_CAPACITY".to_string(), e.to_string())
            })?;
        let timezone = get_env_or_default("SALON_TIMEZONE", "UTC")
            .parse::<Tz>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SALON_TIMEZONE".to_string(), e.to_string())
            })?;

        Ok(Self {
            capacity,
            always_open: get_bool_env("BOOKING_ALWAYS_OPEN", false),
            timezone,
            require_time: get_bool_env("BOOKING_REQUIRE_TIME", true),
        })
    }
}

impl EmailConfig {
    /// Build from `SMTP_*` variables; `None` when `SMTP_HOST` is unset.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(smtp_host) = get_optional_env("SMTP_HOST") else {
            return Ok(None);
        };
        let smtp_port = get_env_or_default("SMTP_PORT", "587")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string()))?;

        Ok(Some(Self {
            smtp_host,
            smtp_port,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: SecretString::from(get_required_env("SMTP_PASSWORD")?),
            from_address: get_required_env("SMTP_FROM")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a boolean environment variable; accepts "true"/"1" and "false"/"0".
fn get_bool_env(key: &str, default: bool) -> bool {
    std::env::var(key).map_or(default, |v| parse_bool(&v, default))
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim() {
        "true" | "1" => true,
        "false" | "0" => false,
        _ => default,
    }
}

/// Service account key: inline JSON wins over a key file path.
fn get_service_account_json() -> Result<SecretString, ConfigError> {
    if let Ok(json) = std::env::var("GOOGLE_SERVICE_ACCOUNT_JSON") {
        return Ok(SecretString::from(json));
    }
    if let Ok(path) = std::env::var("GOOGLE_APPLICATION_CREDENTIALS") {
        let json = std::fs::read_to_string(&path).map_err(|e| {
            ConfigError::InvalidEnvVar(
                "GOOGLE_APPLICATION_CREDENTIALS".to_string(),
                format!("{path}: {e}"),
            )
        })?;
        return Ok(SecretString::from(json));
    }
    Err(ConfigError::MissingEnvVar(
        "GOOGLE_SERVICE_ACCOUNT_JSON or GOOGLE_APPLICATION_CREDENTIALS".to_string(),
    ))
}
