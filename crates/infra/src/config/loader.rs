//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `BACKEND_BASE_URL`: Public base URL of this server
//! - `FRONTEND_URL`: Web frontend receiving login redirects
//! - `MONEYMON_DB_PATH`: SQLite database file path
//! - `JWT_SECRET`: Session signing secret (32+ characters)
//!
//! Optional:
//! - `MONEYMON_BIND_ADDR`: Listen address (default `0.0.0.0:5000`)
//! - `PORT`: Overrides the port of the listen address
//! - `MONEYMON_DB_POOL_SIZE`: Connection pool size (default 8)
//! - `JWT_EXPIRES_IN`: Session lifetime, `7d`/`12h`/`30m`/`45s` or seconds
//! - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET`
//! - `FACEBOOK_APP_ID` / `FACEBOOK_APP_SECRET`
//! - `DISCORD_CLIENT_ID` / `DISCORD_CLIENT_SECRET`
//! - `MONEYMON_HTTP_TIMEOUT_SECS`: Provider call timeout (default 8)
//! - `MONEYMON_STORAGE_TIMEOUT_SECS`: User storage timeout (default 5)
//! - `MONEYMON_SESSION_TTL_SECS`: Pending login lifetime (default 600)
//! - `MONEYMON_SWEEP_INTERVAL_SECS`: Pending login sweep period (default 600)
//! - `MONEYMON_MOBILE_REDIRECT_PREFIXES`: Comma-separated deep-link prefixes
//!
//! A provider is enabled only when both its id and secret are set.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./moneymon.json` or `./moneymon.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use moneymon_domain::constants::{
    DEFAULT_BIND_ADDR, PKCE_SESSION_TTL_SECS, PKCE_SWEEP_INTERVAL_SECS, PROVIDER_HTTP_TIMEOUT_SECS,
    SESSION_TOKEN_TTL_SECS, STORAGE_TIMEOUT_SECS,
};
use moneymon_domain::{
    parse_duration_spec, Config, DatabaseConfig, HttpConfig, MoneymonError, PkceConfig,
    ProviderCredentials, ProvidersConfig, Result, ServerConfig, SessionConfig,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `MoneymonError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `MoneymonError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let backend_base_url = env_var("BACKEND_BASE_URL")?;
    let frontend_url = env_var("FRONTEND_URL")?;
    let db_path = env_var("MONEYMON_DB_PATH")?;
    let jwt_secret = env_var("JWT_SECRET")?;

    let bind_addr = bind_addr_from_env();
    let pool_size = env_parse("MONEYMON_DB_POOL_SIZE", 8u32)?;
    let ttl_seconds = match env_opt("JWT_EXPIRES_IN") {
        Some(raw) => parse_duration_spec(&raw)?,
        None => SESSION_TOKEN_TTL_SECS,
    };

    let allowed_mobile_redirects = env_opt("MONEYMON_MOBILE_REDIRECT_PREFIXES")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|prefix| !prefix.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(Config {
        server: ServerConfig {
            bind_addr,
            backend_base_url,
            frontend_url,
            allowed_mobile_redirects,
        },
        database: DatabaseConfig { path: db_path, pool_size },
        session: SessionConfig { jwt_secret, ttl_seconds },
        pkce: PkceConfig {
            session_ttl_seconds: env_parse("MONEYMON_SESSION_TTL_SECS", PKCE_SESSION_TTL_SECS)?,
            sweep_interval_seconds: env_parse(
                "MONEYMON_SWEEP_INTERVAL_SECS",
                PKCE_SWEEP_INTERVAL_SECS,
            )?,
        },
        http: HttpConfig {
            timeout_seconds: env_parse("MONEYMON_HTTP_TIMEOUT_SECS", PROVIDER_HTTP_TIMEOUT_SECS)?,
            storage_timeout_seconds: env_parse(
                "MONEYMON_STORAGE_TIMEOUT_SECS",
                STORAGE_TIMEOUT_SECS,
            )?,
        },
        providers: ProvidersConfig {
            google: credentials_from_env("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
            facebook: credentials_from_env("FACEBOOK_APP_ID", "FACEBOOK_APP_SECRET"),
            discord: credentials_from_env("DISCORD_CLIENT_ID", "DISCORD_CLIENT_SECRET"),
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `MoneymonError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(MoneymonError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            MoneymonError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| MoneymonError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| MoneymonError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| MoneymonError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(MoneymonError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let names = ["config.json", "config.toml", "moneymon.json", "moneymon.toml"];
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(names.iter().map(|name| cwd.join(name)));
        candidates.push(cwd.join("../config.json"));
        candidates.push(cwd.join("../config.toml"));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(names.iter().map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// `MONEYMON_BIND_ADDR`, with its port replaced by `PORT` when set.
fn bind_addr_from_env() -> String {
    let base = env_opt("MONEYMON_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    match env_opt("PORT") {
        Some(port) => {
            let host = base.rsplit_once(':').map_or(base.as_str(), |(host, _)| host);
            format!("{host}:{port}")
        }
        None => base,
    }
}

fn credentials_from_env(id_key: &str, secret_key: &str) -> Option<ProviderCredentials> {
    match (env_opt(id_key), env_opt(secret_key)) {
        (Some(client_id), Some(client_secret)) => {
            Some(ProviderCredentials { client_id, client_secret })
        }
        _ => None,
    }
}

/// Get required environment variable
///
/// # Errors
/// Returns `MoneymonError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        MoneymonError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Optional environment variable; blank values count as unset.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| MoneymonError::Config(format!("Invalid value for {key}: {e}"))),
        None => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
pub(crate) fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const REQUIRED: [(&str, &str); 4] = [
        ("BACKEND_BASE_URL", "http://localhost:5000"),
        ("FRONTEND_URL", "http://localhost:3000"),
        ("MONEYMON_DB_PATH", "/tmp/moneymon-test.db"),
        ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
    ];

    const OPTIONAL: [&str; 12] = [
        "MONEYMON_BIND_ADDR",
        "PORT",
        "MONEYMON_DB_POOL_SIZE",
        "JWT_EXPIRES_IN",
        "GOOGLE_CLIENT_ID",
        "GOOGLE_CLIENT_SECRET",
        "FACEBOOK_APP_ID",
        "FACEBOOK_APP_SECRET",
        "DISCORD_CLIENT_ID",
        "DISCORD_CLIENT_SECRET",
        "MONEYMON_HTTP_TIMEOUT_SECS",
        "MONEYMON_MOBILE_REDIRECT_PREFIXES",
    ];

    fn set_required() {
        for (key, value) in REQUIRED {
            std::env::set_var(key, value);
        }
    }

    fn clear_all() {
        for (key, _) in REQUIRED {
            std::env::remove_var(key);
        }
        for key in OPTIONAL {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("TEST_BOOL_TRUE_1", "1");
        std::env::set_var("TEST_BOOL_TRUE_UPPER", "TRUE");
        std::env::set_var("TEST_BOOL_FALSE_OFF", "off");

        assert!(env_bool("TEST_BOOL_TRUE_1", false));
        assert!(env_bool("TEST_BOOL_TRUE_UPPER", false));
        assert!(!env_bool("TEST_BOOL_FALSE_OFF", true));

        std::env::remove_var("TEST_BOOL_MISSING");
        assert!(env_bool("TEST_BOOL_MISSING", true));
        assert!(!env_bool("TEST_BOOL_MISSING", false));

        std::env::remove_var("TEST_BOOL_TRUE_1");
        std::env::remove_var("TEST_BOOL_TRUE_UPPER");
        std::env::remove_var("TEST_BOOL_FALSE_OFF");
    }

    #[test]
    fn test_load_from_env_defaults() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_all();
        set_required();

        let config = load_from_env().expect("config loads from env");
        assert_eq!(config.server.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.database.pool_size, 8);
        assert_eq!(config.session.ttl_seconds, SESSION_TOKEN_TTL_SECS);
        assert_eq!(config.http.timeout_seconds, PROVIDER_HTTP_TIMEOUT_SECS);
        assert!(config.providers.google.is_none());
        assert!(config.server.allowed_mobile_redirects.is_empty());
        config.validate().expect("defaults validate");

        clear_all();
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_all();
        set_required();
        std::env::set_var("MONEYMON_BIND_ADDR", "127.0.0.1:8080");
        std::env::set_var("PORT", "9000");
        std::env::set_var("JWT_EXPIRES_IN", "12h");
        std::env::set_var("GOOGLE_CLIENT_ID", "gid");
        std::env::set_var("GOOGLE_CLIENT_SECRET", "gsecret");
        std::env::set_var("DISCORD_CLIENT_ID", "did");
        std::env::set_var("MONEYMON_MOBILE_REDIRECT_PREFIXES", "moneymon://, exp://");

        let config = load_from_env().expect("config loads from env");
        assert_eq!(config.server.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.session.ttl_seconds, 43_200);
        assert_eq!(
            config.providers.google.as_ref().map(|c| c.client_id.as_str()),
            Some("gid")
        );
        // Discord has an id but no secret, so it stays disabled.
        assert!(config.providers.discord.is_none());
        assert_eq!(config.server.allowed_mobile_redirects, vec!["moneymon://", "exp://"]);

        clear_all();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_all();

        let err = load_from_env().expect_err("should fail with missing env var");
        assert!(matches!(err, MoneymonError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_all();
        set_required();
        std::env::set_var("MONEYMON_DB_POOL_SIZE", "not-a-number");

        let err = load_from_env().expect_err("should fail with invalid pool size");
        assert!(matches!(err, MoneymonError::Config(_)), "Should be a Config error");

        clear_all();
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "server": {
                "backend_base_url": "https://api.example.com",
                "frontend_url": "https://app.example.com"
            },
            "database": { "path": "test.db", "pool_size": 4 },
            "session": { "jwt_secret": "0123456789abcdef0123456789abcdef" },
            "providers": {
                "facebook": { "client_id": "fb", "client_secret": "fbsecret" }
            }
        }"#;

        let mut temp_file = NamedTempFile::new().expect("temp file");
        temp_file.write_all(json_content.as_bytes()).expect("write config");
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).expect("copy config");

        let config = load_from_file(Some(path.clone())).expect("Should load config from JSON file");
        assert_eq!(config.database.path, "test.db");
        assert_eq!(config.database.pool_size, 4);
        assert!(config.providers.facebook.is_some());
        assert_eq!(config.pkce.session_ttl_seconds, PKCE_SESSION_TTL_SECS);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_missing() {
        let err = load_from_file(Some(PathBuf::from("/definitely/not/here.toml")))
            .expect_err("missing file");
        assert!(matches!(err, MoneymonError::Config(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = parse_config("", Path::new("config.yaml")).expect_err("yaml unsupported");
        assert!(matches!(err, MoneymonError::Config(_)));
    }
}
