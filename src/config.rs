use anyhow::{anyhow, Context};
use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Where request and location rows live.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    /// Hosted PostgREST-style endpoint (`{base_url}/rest/v1/{table}`).
    Rest { base_url: String, api_key: String },
    Memory,
}

impl StoreBackend {
    pub fn tag(&self) -> &'static str {
        match self {
            StoreBackend::Postgres { .. } => "postgres",
            StoreBackend::Rest { .. } => "rest",
            StoreBackend::Memory => "memory",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogConfig {
    pub level: String,
    /// Daily rolling file output when set; stdout otherwise.
    pub dir: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub store: StoreBackend,
    pub bind_addr: SocketAddr,
    pub jwt_secret: Option<String>,
    pub auth_disabled: bool,
    pub listing_page_size: usize,
    pub location_cache_ttl: Duration,
    pub request_timeout: Duration,
    pub map_api_token: Option<String>,
    pub log: LogConfig,
}

impl Config {
    /// Load `.env` and read the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let store = match get("STORE_BACKEND").as_deref().unwrap_or("postgres") {
            "postgres" => StoreBackend::Postgres {
                database_url: get("DATABASE_URL")
                    .ok_or_else(|| anyhow!("DATABASE_URL must be set for the postgres store"))?,
            },
            "rest" => StoreBackend::Rest {
                base_url: get("STORE_REST_URL")
                    .ok_or_else(|| anyhow!("STORE_REST_URL must be set for the rest store"))?
                    .trim_end_matches('/')
                    .to_string(),
                api_key: get("STORE_API_KEY")
                    .ok_or_else(|| anyhow!("STORE_API_KEY must be set for the rest store"))?,
            },
            "memory" => StoreBackend::Memory,
            other => return Err(anyhow!("unknown STORE_BACKEND '{other}'")),
        };

        let auth_disabled = get("AUTH_DISABLED").as_deref() == Some("true");
        let jwt_secret = get("JWT_SECRET");
        if jwt_secret.is_none() && !auth_disabled {
            return Err(anyhow!("JWT_SECRET must be set unless AUTH_DISABLED=true"));
        }

        let listing_page_size: usize = parse_or(get("LISTING_PAGE_SIZE"), "LISTING_PAGE_SIZE", 6)?;
        if listing_page_size == 0 {
            return Err(anyhow!("LISTING_PAGE_SIZE must be at least 1"));
        }

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR is not a socket address")?;

        Ok(Self {
            store,
            bind_addr,
            jwt_secret,
            auth_disabled,
            listing_page_size,
            location_cache_ttl: Duration::from_secs(parse_or(
                get("LOCATION_CACHE_TTL_SECS"),
                "LOCATION_CACHE_TTL_SECS",
                60,
            )?),
            request_timeout: Duration::from_secs(parse_or(
                get("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
                30,
            )?),
            map_api_token: get("MAP_API_TOKEN"),
            log: LogConfig {
                level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                dir: get("LOG_DIR").map(PathBuf::from),
            },
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{value}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// In-memory store, auth enabled with a fixed secret.
    pub fn for_tests() -> Self {
        Self {
            store: StoreBackend::Memory,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            jwt_secret: Some("test-secret".to_string()),
            auth_disabled: false,
            listing_page_size: 6,
            location_cache_ttl: Duration::from_secs(60),
            request_timeout: Duration::from_secs(5),
            map_api_token: None,
            log: LogConfig {
                level: "debug".to_string(),
                dir: None,
            },
        }
    }
}
