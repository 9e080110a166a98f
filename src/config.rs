use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tracing_subscriber::EnvFilter;

use crate::error::{internal_error, Error};

pub const DEFAULT_PLACES_API_BASE: &str = "maps.googleapis.com";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Production,
    Development,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub pass: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: Option<String>,
    pub addr: SocketAddr,
    pub mode: Mode,
    pub allowed_origins: AllowedOrigins,
    pub admin_token: Option<String>,
    pub places_api_key: Option<String>,
    pub places_api_base: String,
    pub smtp: SmtpConfig,
    pub contact_to: Option<String>,
    pub contact_from: Option<String>,
}

impl Config {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        // empty values count as unset
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host: IpAddr = match var("HOST") {
            Some(host) => host
                .parse()
                .map_err(|_| internal_error(format!("invalid HOST: {}", host)))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let port = parse_port("PORT", var("PORT"), 8080)?;

        let mode = match var("APP_ENV").as_deref() {
            None | Some("production") => Mode::Production,
            Some("development") => Mode::Development,
            Some(other) => return Err(internal_error(format!("invalid APP_ENV: {}", other))),
        };

        let allowed_origins = match var("CORS_ORIGIN") {
            None => AllowedOrigins::Any,
            Some(origins) if origins == "*" => AllowedOrigins::Any,
            Some(origins) => AllowedOrigins::List(
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(String::from)
                    .collect(),
            ),
        };

        let smtp = SmtpConfig {
            host: var("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".into()),
            port: parse_port("SMTP_PORT", var("SMTP_PORT"), 587)?,
            user: var("SMTP_USER"),
            pass: var("SMTP_PASS"),
        };

        let contact_to = var("CONTACT_TO");
        let contact_from = var("CONTACT_FROM")
            .or_else(|| smtp.user.clone())
            .or_else(|| contact_to.clone());

        Ok(Self {
            database_url: var("DATABASE_URL"),
            addr: SocketAddr::new(host, port),
            mode,
            allowed_origins,
            admin_token: var("ADMIN_TOKEN"),
            places_api_key: var("GOOGLE_PLACES_API_KEY"),
            places_api_base: var("GOOGLE_PLACES_API_BASE")
                .unwrap_or_else(|| DEFAULT_PLACES_API_BASE.into()),
            smtp,
            contact_to,
            contact_from,
        })
    }

    pub fn require_database_url(&self) -> Result<&str, Error> {
        self.database_url
            .as_deref()
            .ok_or_else(|| internal_error("missing DATABASE_URL"))
    }
}

/// Installs the fmt subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn parse_port(key: &str, value: Option<String>, default: u16) -> Result<u16, Error> {
    match value {
        Some(value) => value
            .parse()
            .map_err(|_| internal_error(format!("invalid {}: {}", key, value))),
        None => Ok(default),
    }
}
