use clap::Parser;
use std::fmt;
use std::time::Duration;

pub const CANVA_JWKS_BASE: &str = "https://api.canva.com/rest/v1/apps";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "pitchdeck-proxy")]
#[command(about = "Caching proxy for the pitch deck panel's text and photo vendors")]
pub struct Args {
    // Listen port for the proxy
    #[arg(short, long, env = "CANVA_BACKEND_PORT", default_value_t = 3001)]
    pub port: u16,

    // Host application id, used as the token audience
    #[arg(long, env = "CANVA_APP_ID")]
    pub app_id: String,

    // Text generation key, the /gemini route answers "" without it
    #[arg(long, env = "GEMINI_KEY", hide_env_values = true)]
    pub gemini_key: Option<String>,

    // Photo search key, the /pexel route answers "" without it
    #[arg(long, env = "PEXEL_KEY", hide_env_values = true)]
    pub pexel_key: Option<String>,

    #[arg(long, default_value = DEFAULT_GEMINI_MODEL)]
    pub gemini_model: String,

    // How long a stored answer is served, in seconds
    #[arg(short, long, default_value_t = 60)]
    pub cache_ttl: u64,

    // Upper bound on cached entries, unbounded when absent
    #[arg(long)]
    pub cache_max_entries: Option<usize>,

    // Expired entry sweep interval in seconds
    #[arg(long, default_value_t = 60)]
    pub sweep_interval: u64,

    // Vendor request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub vendor_timeout: u64,

    // Signing key set location, defaults to the host platform's per-app JWKS
    #[arg(long)]
    pub jwks_url: Option<String>,

    // How long fetched signing keys are trusted, in seconds
    #[arg(long, default_value_t = 3600)]
    pub jwks_refresh: u64,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long)]
    pub log_json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("CANVA_APP_ID is empty; set it in the environment or the .env file")]
    MissingAppId,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Host application identifier. Always non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppId(String);

impl AppId {
    pub fn new(value: impl Into<String>) -> Result<Self, ConfigError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ConfigError::MissingAppId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Vendor API key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    // Blank values count as absent
    pub fn from_optional(value: Option<String>) -> Option<Self> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(Self)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub app_id: AppId,
    pub gemini_key: Option<ApiKey>,
    pub pexel_key: Option<ApiKey>,
    pub gemini_model: String,
    pub cache_ttl: Duration,
    pub cache_max_entries: Option<usize>,
    pub sweep_interval: Duration,
    pub vendor_timeout: Duration,
    pub jwks_url: String,
    pub jwks_refresh: Duration,
    pub log_level: String,
    pub log_json: bool,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let app_id = AppId::new(args.app_id)?;
        let jwks_url = args
            .jwks_url
            .unwrap_or_else(|| format!("{}/{}/jwks", CANVA_JWKS_BASE, app_id));

        Ok(Self {
            port: args.port,
            gemini_key: ApiKey::from_optional(args.gemini_key),
            pexel_key: ApiKey::from_optional(args.pexel_key),
            gemini_model: args.gemini_model,
            cache_ttl: non_zero_secs("cache-ttl", args.cache_ttl)?,
            cache_max_entries: args.cache_max_entries,
            sweep_interval: non_zero_secs("sweep-interval", args.sweep_interval)?,
            vendor_timeout: non_zero_secs("vendor-timeout", args.vendor_timeout)?,
            jwks_url,
            jwks_refresh: non_zero_secs("jwks-refresh", args.jwks_refresh)?,
            log_level: args.log_level,
            log_json: args.log_json,
            app_id,
        })
    }
}

fn non_zero_secs(name: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::ZeroDuration(name));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["pitchdeck-proxy", "--app-id", "AAF-test"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_follow_the_panel_backend() {
        let config = Config::from_args(parse(&[])).unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.gemini_model, "gemini-1.5-flash");
        assert_eq!(
            config.jwks_url,
            "https://api.canva.com/rest/v1/apps/AAF-test/jwks"
        );
        assert!(config.cache_max_entries.is_none());
    }

    #[test]
    fn blank_app_id_aborts() {
        let mut args = parse(&[]);
        args.app_id = "  ".to_string();
        assert!(matches!(
            Config::from_args(args),
            Err(ConfigError::MissingAppId)
        ));
    }

    #[test]
    fn blank_vendor_keys_are_absent() {
        let mut args = parse(&[]);
        args.gemini_key = Some("   ".to_string());
        args.pexel_key = Some("px-123".to_string());
        let config = Config::from_args(args).unwrap();
        assert!(config.gemini_key.is_none());
        assert_eq!(config.pexel_key.as_ref().map(ApiKey::expose), Some("px-123"));
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let args = parse(&["--cache-ttl", "0"]);
        assert!(matches!(
            Config::from_args(args),
            Err(ConfigError::ZeroDuration("cache-ttl"))
        ));
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::from_optional(Some("secret".to_string())).unwrap();
        assert_eq!(format!("{key:?}"), "ApiKey(***)");
    }
}
