use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layers;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/townloop";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_MEDIA_URL: &str = "/media";
const DEFAULT_SESSION_TTL_HOURS: i64 = 168;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub upload_dir: PathBuf,
    /// Prefix of every URL handed out for a stored blob.
    pub public_base_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub media: MediaConfig,
    pub session_ttl_hours: i64,
    pub production: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: parsed_var("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
                port: parsed_var("SERVER_PORT", DEFAULT_PORT),
            },
            media: MediaConfig {
                upload_dir: env::var("UPLOAD_DIR")
                    .unwrap_or_else(|_| DEFAULT_UPLOAD_DIR.to_string())
                    .into(),
                public_base_url: env::var("PUBLIC_MEDIA_URL")
                    .unwrap_or_else(|_| DEFAULT_MEDIA_URL.to_string()),
            },
            session_ttl_hours: parsed_var("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS),
            production: is_production(),
        }
    }

    /// Defaults only, with uploads under `upload_dir`. Used by tests.
    pub fn for_uploads(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_MAX_CONNECTIONS,
            },
            server: ServerConfig {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
            },
            media: MediaConfig {
                upload_dir: upload_dir.into(),
                public_base_url: DEFAULT_MEDIA_URL.to_string(),
            },
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            production: false,
        }
    }
}

pub fn is_production() -> bool {
    env::var("RUST_ENV")
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false)
}

fn parsed_var<T>(name: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => parse_or(name, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T>(name: &str, raw: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    raw.trim().parse().unwrap_or_else(|_| {
        tracing::warn!("Config: {} has invalid value '{}', using {}", name, raw, default);
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_number_falls_back_to_default() {
        assert_eq!(parse_or("SERVER_PORT", "not-a-port", 3001u16), 3001);
        assert_eq!(parse_or("SERVER_PORT", " 8080 ", 3001u16), 8080);
    }

    #[test]
    fn upload_config_uses_defaults() {
        let config = Config::for_uploads("/tmp/uploads");
        assert_eq!(config.media.public_base_url, "/media");
        assert_eq!(config.session_ttl_hours, 168);
        assert_eq!(config.server.addr(), "0.0.0.0:3001");
        assert!(!config.production);
    }
}
