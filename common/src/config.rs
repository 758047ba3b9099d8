// common/src/config.rs
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use config::{Config as ConfigFile, File, Environment};

/// Central configuration for the browser-facing web layer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub web_server_addr: String,
    /// Base URL of the finance backend, without trailing slash
    pub backend_url: String,
    /// Origin the login relay accepts requests from
    pub app_origin: String,

    #[serde(default = "default_backend_timeout")]
    pub backend_timeout_seconds: u64,

    #[serde(default)]
    pub cookies: CookieConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Lifetime of both session cookies
    pub ttl_seconds: i64,
    pub secure: bool,
    /// Keep the CSRF cookie away from page script. Off by default: the
    /// page reads it to sign mutations.
    pub csrf_http_only: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    pub login: String,
    pub landing: String,
    pub public: Vec<String>,
    pub protected: Vec<String>,
    /// Paths under these prefixes never reach the route guard
    pub unguarded_prefixes: Vec<String>,
    pub unguarded_suffixes: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_attempts: usize,
    pub window_seconds: u64,
    pub paths: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub path: String,
    pub index: String,
    pub enable_compression: bool,
}

fn default_backend_timeout() -> u64 {
    10
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 300,
            secure: false,
            csrf_http_only: false,
        }
    }
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            landing: "/".to_string(),
            public: vec!["/login".to_string(), "/signup".to_string()],
            protected: vec!["/".to_string(), "/dashboard".to_string()],
            unguarded_prefixes: vec![
                "/api".to_string(),
                "/_next".to_string(),
                "/static".to_string(),
                "/assets".to_string(),
            ],
            unguarded_suffixes: vec![".png".to_string(), ".ico".to_string(), ".svg".to_string()],
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            window_seconds: 60,
            paths: vec!["/api/login".to_string(), "/api/signup".to_string()],
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            path: "./static".to_string(),
            index: "index.html".to_string(),
            enable_compression: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web_server_addr: "127.0.0.1:3000".to_string(),
            backend_url: "http://localhost:8080".to_string(),
            app_origin: "http://localhost:3000".to_string(),
            backend_timeout_seconds: default_backend_timeout(),
            cookies: CookieConfig::default(),
            routes: RoutesConfig::default(),
            rate_limit: RateLimitConfig::default(),
            static_files: StaticFilesConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        // Get the run mode, defaulting to "development"
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        // Locate the config directory
        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                // Check if we're in the project root or a subcrate
                let mut path = PathBuf::from("./config");
                if !path.exists() {
                    path = PathBuf::from("../config");
                }
                path
            });

        tracing::info!("Loading configuration from {}", config_dir.display());
        tracing::info!("Using run mode: {}", run_mode);

        let config: Self = ConfigFile::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Environment variables with prefix "APP", e.g. APP__COOKIES__SECURE=true
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config.normalized())
    }

    /// Load from files, falling back to plain environment variables
    pub fn from_env() -> Self {
        match Self::load() {
            Ok(config) => {
                tracing::info!("Configuration loaded from files and environment");
                config
            },
            Err(e) => {
                tracing::warn!("Failed to load configuration from files: {}", e);
                tracing::info!("Falling back to environment variables only");
                Self::from_plain_env()
            }
        }
    }

    fn from_plain_env() -> Self {
        let defaults = Self::default();

        let web_server_addr = env::var("WEB_SERVER_ADDR")
            .unwrap_or(defaults.web_server_addr);

        let backend_url = env::var("BACKEND_URL")
            .unwrap_or(defaults.backend_url);

        let app_origin = env::var("APP_ORIGIN")
            .unwrap_or(defaults.app_origin);

        let backend_timeout_seconds = env::var("BACKEND_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.backend_timeout_seconds);

        let cookies = CookieConfig {
            ttl_seconds: env::var("COOKIE_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(defaults.cookies.ttl_seconds),
            secure: env_flag("COOKIE_SECURE", defaults.cookies.secure),
            csrf_http_only: env_flag("CSRF_HTTP_ONLY", defaults.cookies.csrf_http_only),
        };

        let rate_limit = RateLimitConfig {
            max_attempts: env::var("RATE_LIMIT_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults.rate_limit.max_attempts),
            window_seconds: env::var("RATE_LIMIT_WINDOW_SECONDS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.rate_limit.window_seconds),
            paths: defaults.rate_limit.paths,
        };

        let static_files = StaticFilesConfig {
            path: env::var("STATIC_FILES_PATH").unwrap_or(defaults.static_files.path),
            index: env::var("STATIC_FILES_INDEX").unwrap_or(defaults.static_files.index),
            enable_compression: env_flag(
                "ENABLE_COMPRESSION",
                defaults.static_files.enable_compression,
            ),
        };

        Self {
            web_server_addr,
            backend_url,
            app_origin,
            backend_timeout_seconds,
            cookies,
            routes: defaults.routes,
            rate_limit,
            static_files,
        }
        .normalized()
    }

    // Joined paths like "{backend_url}/auth/login" assume no trailing slash.
    fn normalized(mut self) -> Self {
        while self.backend_url.ends_with('/') {
            self.backend_url.pop();
        }
        while self.app_origin.ends_with('/') {
            self.app_origin.pop();
        }
        self
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(default)
}
