//! Process configuration.
//!
//! Secrets and deployment knobs come from the environment (optionally seeded
//! from a `.env` file); the route and stops the board tracks are embedded.

use std::time::Duration;

/// GTFS-RT feed for the G line.
pub const DEFAULT_FEED_URL: &str =
    "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-g";
pub const DEFAULT_ROUTE_ID: &str = "G";
pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";
pub const DEFAULT_GROUP: &str = "subway_arrivals";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// One travel direction at the station, bound to a single stop id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Direction {
    /// Human-readable name, e.g. "Queens-bound".
    pub name: String,
    /// Catalog item prefix, e.g. "queens" yields `queens_1..queens_3`.
    pub prefix: String,
    pub stop_id: String,
}

impl Direction {
    pub fn new(name: &str, prefix: &str, stop_id: &str) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix.to_string(),
            stop_id: stop_id.to_string(),
        }
    }
}

/// The route and the two directions a board displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub route_id: String,
    pub directions: [Direction; 2],
}

impl Board {
    /// Builds a board, rejecting directions that share a stop id or prefix.
    pub fn new(route_id: &str, directions: [Direction; 2]) -> Result<Self, ConfigError> {
        let [a, b] = &directions;
        if a.stop_id == b.stop_id {
            return Err(ConfigError::DuplicateStop(a.stop_id.clone()));
        }
        if a.prefix == b.prefix {
            return Err(ConfigError::DuplicatePrefix(a.prefix.clone()));
        }
        Ok(Self {
            route_id: route_id.to_string(),
            directions,
        })
    }

    /// Greenpoint Av on the G: northbound platform runs to Queens,
    /// southbound to Brooklyn.
    pub fn greenpoint_av() -> Self {
        Self {
            route_id: DEFAULT_ROUTE_ID.to_string(),
            directions: [
                Direction::new("Queens-bound", "queens", "G26N"),
                Direction::new("Brooklyn-bound", "brooklyn", "G26S"),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub domain: String,
    pub api_key: String,
    pub api_key_header: String,
    pub group: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub feed_url: String,
    pub port: u16,
    pub refresh_interval: Duration,
    pub request_timeout: Duration,
    pub board: Board,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let catalog = CatalogConfig {
            domain: required("CATALOG_DOMAIN")?,
            api_key: required("CATALOG_API_KEY")?,
            api_key_header: or_default("CATALOG_API_KEY_HEADER", DEFAULT_API_KEY_HEADER),
            group: or_default("CATALOG_GROUP", DEFAULT_GROUP),
        };

        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let refresh_secs = parse_or(&lookup, "REFRESH_INTERVAL_SECS", DEFAULT_REFRESH_INTERVAL_SECS)?;
        let timeout_secs = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        for (key, secs) in [
            ("REFRESH_INTERVAL_SECS", refresh_secs),
            ("REQUEST_TIMEOUT_SECS", timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        Ok(Self {
            catalog,
            feed_url: or_default("FEED_URL", DEFAULT_FEED_URL),
            port,
            refresh_interval: Duration::from_secs(refresh_secs),
            request_timeout: Duration::from_secs(timeout_secs),
            board: Board::greenpoint_av(),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("Both directions use stop id '{0}'")]
    DuplicateStop(String),
    #[error("Both directions use item prefix '{0}'")]
    DuplicatePrefix(String),
}
